use chrono::NaiveDate;
use regex::{Regex, RegexBuilder};

use crate::dates::DatePattern;
use crate::fmt::{magnitude, parse_amount};
use crate::models::{CanonicalRecord, Field, SourceConfig};

/// Case-insensitive payee pattern tried against the memo cell.
#[derive(Debug, Clone)]
pub struct PayeeMatcher {
    pattern: String,
    regex: Option<Regex>,
}

impl PayeeMatcher {
    /// Patterns that are not valid regexes are matched literally.
    pub fn new(pattern: &str) -> Self {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .or_else(|_| {
                RegexBuilder::new(&regex::escape(pattern))
                    .case_insensitive(true)
                    .build()
            })
            .ok();
        Self {
            pattern: pattern.to_string(),
            regex,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(text))
    }
}

/// Everything a row needs to become a [`CanonicalRecord`]. Built once per
/// conversion and never mutated.
#[derive(Debug)]
pub struct ConversionContext<'a> {
    pub source: &'a SourceConfig,
    pub source_date: DatePattern,
    pub output_date: &'a DatePattern,
    pub payees: &'a [PayeeMatcher],
    pub today: NaiveDate,
}

impl<'a> ConversionContext<'a> {
    pub fn new(
        source: &'a SourceConfig,
        output_date: &'a DatePattern,
        payees: &'a [PayeeMatcher],
        today: NaiveDate,
    ) -> Self {
        Self {
            source,
            source_date: DatePattern::new(&source.date_format),
            output_date,
            payees,
            today,
        }
    }

    fn cell<'c>(&self, cells: &[&'c str], field: Field) -> Option<&'c str> {
        self.source
            .map
            .column(field)
            .map(|col| cells.get(col).copied().unwrap_or(""))
    }

    /// The date cell parsed with the source's pattern, if it parses.
    pub fn parsed_date(&self, cells: &[&str]) -> Option<NaiveDate> {
        self.cell(cells, Field::Date)
            .and_then(|raw| self.source_date.parse_lenient(raw))
    }

    /// The date rendered in the `Date` field. Unparseable or absent dates
    /// fall back to today.
    fn row_date(&self, cells: &[&str]) -> NaiveDate {
        self.parsed_date(cells).unwrap_or(self.today)
    }

    pub fn transform(&self, cells: &[&str]) -> CanonicalRecord {
        let mut record = CanonicalRecord::default();
        for field in Field::ALL {
            record.set(field, self.render(field, cells));
        }
        record
    }

    pub fn render(&self, field: Field, cells: &[&str]) -> String {
        match field {
            Field::Date => self.date(cells),
            Field::Payee => self.payee(cells),
            Field::Category => self.cell(cells, Field::Category).unwrap_or("").to_string(),
            Field::Memo => self.memo(cells),
            Field::Outflow | Field::Inflow => self.amount(field, cells),
        }
    }

    fn date(&self, cells: &[&str]) -> String {
        if self.source.map.date.is_none() {
            return String::new();
        }
        self.output_date.format(self.row_date(cells))
    }

    fn payee(&self, cells: &[&str]) -> String {
        if let Some(value) = self.cell(cells, Field::Payee) {
            return value.to_string();
        }
        let memo = self.cell(cells, Field::Memo).unwrap_or("");
        self.payees
            .iter()
            .find(|p| p.is_match(memo))
            .map(|p| p.pattern().to_string())
            .unwrap_or_default()
    }

    fn memo(&self, cells: &[&str]) -> String {
        match self.cell(cells, Field::Memo) {
            Some(value) => collapse_whitespace(value),
            None => String::new(),
        }
    }

    fn amount(&self, field: Field, cells: &[&str]) -> String {
        let Some(raw) = self.cell(cells, field) else {
            return String::new();
        };
        let raw = raw.replacen(',', ".", 1);
        if self.source.map.shares_amount_column() {
            let negative = raw.starts_with('-');
            match field {
                Field::Inflow if negative => return String::new(),
                Field::Outflow if !negative => return String::new(),
                _ => {}
            }
        }
        parse_amount(&raw).map(magnitude).unwrap_or_default()
    }
}

fn collapse_whitespace(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut run = String::new();
    for c in value.chars() {
        if c.is_whitespace() {
            run.push(c);
            continue;
        }
        flush_whitespace(&mut out, &mut run);
        out.push(c);
    }
    flush_whitespace(&mut out, &mut run);
    out
}

fn flush_whitespace(out: &mut String, run: &mut String) {
    if run.chars().count() >= 2 {
        out.push(' ');
    } else {
        out.push_str(run);
    }
    run.clear();
}
