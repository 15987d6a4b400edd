use serde::{Deserialize, Serialize};

/// The six columns of a YNAB import file, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Date,
    Payee,
    Category,
    Memo,
    Outflow,
    Inflow,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Date,
        Field::Payee,
        Field::Category,
        Field::Memo,
        Field::Outflow,
        Field::Inflow,
    ];

    pub fn heading(&self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::Payee => "Payee",
            Self::Category => "Category",
            Self::Memo => "Memo",
            Self::Outflow => "Outflow",
            Self::Inflow => "Inflow",
        }
    }
}

/// Column index per canonical field. `None` means the source has no such column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    #[serde(default)]
    pub date: Option<usize>,
    #[serde(default)]
    pub payee: Option<usize>,
    #[serde(default)]
    pub category: Option<usize>,
    #[serde(default)]
    pub memo: Option<usize>,
    #[serde(default)]
    pub outflow: Option<usize>,
    #[serde(default)]
    pub inflow: Option<usize>,
}

impl ColumnMap {
    pub fn column(&self, field: Field) -> Option<usize> {
        match field {
            Field::Date => self.date,
            Field::Payee => self.payee,
            Field::Category => self.category,
            Field::Memo => self.memo,
            Field::Outflow => self.outflow,
            Field::Inflow => self.inflow,
        }
    }

    /// True when debits and credits live in one signed amount column.
    pub fn shares_amount_column(&self) -> bool {
        self.outflow.is_some() && self.outflow == self.inflow
    }
}

/// A bank export format: exact header signature plus how to read its rows.
///
/// Field names follow the JSON layout of the custom sources file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub headers: Vec<String>,
    pub map: ColumnMap,
    #[serde(rename = "dateformat")]
    pub date_format: String,
    #[serde(rename = "delimitor", alias = "delimiter", default = "default_delimiter")]
    pub delimiter: char,
}

fn default_delimiter() -> char {
    ';'
}

impl SourceConfig {
    pub fn new(headers: &[&str], map: ColumnMap, date_format: &str, delimiter: char) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            map,
            date_format: date_format.to_string(),
            delimiter,
        }
    }
}

/// One transaction in YNAB's import layout. Every field is already rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalRecord {
    pub date: String,
    pub payee: String,
    pub category: String,
    pub memo: String,
    pub outflow: String,
    pub inflow: String,
}

impl CanonicalRecord {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Date => &self.date,
            Field::Payee => &self.payee,
            Field::Category => &self.category,
            Field::Memo => &self.memo,
            Field::Outflow => &self.outflow,
            Field::Inflow => &self.inflow,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Date => self.date = value,
            Field::Payee => self.payee = value,
            Field::Category => self.category = value,
            Field::Memo => self.memo = value,
            Field::Outflow => self.outflow = value,
            Field::Inflow => self.inflow = value,
        }
    }

    pub fn to_line(&self, delimiter: char) -> String {
        Field::ALL
            .iter()
            .map(|f| self.get(*f))
            .collect::<Vec<_>>()
            .join(&delimiter.to_string())
    }
}

pub fn header_line(delimiter: char) -> String {
    Field::ALL
        .iter()
        .map(|f| f.heading())
        .collect::<Vec<_>>()
        .join(&delimiter.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_line() {
        assert_eq!(header_line(';'), "Date;Payee;Category;Memo;Outflow;Inflow");
        assert_eq!(header_line(','), "Date,Payee,Category,Memo,Outflow,Inflow");
    }

    #[test]
    fn test_record_to_line_keeps_empty_fields() {
        let record = CanonicalRecord {
            date: "01/01/2023".to_string(),
            memo: "Groceries".to_string(),
            outflow: "50".to_string(),
            ..Default::default()
        };
        assert_eq!(record.to_line(';'), "01/01/2023;;;Groceries;50;");
    }

    #[test]
    fn test_shares_amount_column() {
        let shared = ColumnMap { outflow: Some(3), inflow: Some(3), ..Default::default() };
        assert!(shared.shares_amount_column());
        let split = ColumnMap { outflow: Some(3), inflow: Some(4), ..Default::default() };
        assert!(!split.shares_amount_column());
        assert!(!ColumnMap::default().shares_amount_column());
    }

    #[test]
    fn test_source_config_from_json() {
        let json = r#"{
            "headers": ["Date", "Text", "Amount"],
            "map": { "date": 0, "payee": null, "memo": 1, "outflow": 2, "inflow": 2 },
            "dateformat": "YYYY-MM-DD",
            "delimitor": ","
        }"#;
        let config: SourceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.headers.len(), 3);
        assert_eq!(config.map.payee, None);
        assert_eq!(config.map.category, None);
        assert_eq!(config.map.memo, Some(1));
        assert_eq!(config.delimiter, ',');
    }

    #[test]
    fn test_source_config_delimiter_alias_and_default() {
        let json = r#"{"headers": ["A"], "map": {"date": 0}, "dateformat": "DD/MM/YYYY", "delimiter": "|"}"#;
        let config: SourceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.delimiter, '|');

        let json = r#"{"headers": ["A"], "map": {"date": 0}, "dateformat": "DD/MM/YYYY"}"#;
        let config: SourceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.delimiter, ';');
    }
}
