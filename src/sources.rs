use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ConvertError, Result};
use crate::models::{ColumnMap, SourceConfig};
use crate::settings::custom_sources_path;

// ---------------------------------------------------------------------------
// Built-in sources
// ---------------------------------------------------------------------------

fn nordea() -> SourceConfig {
    SourceConfig::new(
        &["Bogført", "Tekst", "Rentedato", "Beløb", "Saldo"],
        ColumnMap {
            date: Some(0),
            memo: Some(1),
            outflow: Some(3),
            inflow: Some(3),
            ..Default::default()
        },
        "DD-MM-YYYY",
        ';',
    )
}

fn be_kbc() -> SourceConfig {
    SourceConfig::new(
        &[
            "Rekeningnummer",
            "Rubrieknaam",
            "Naam",
            "Munt",
            "Afschriftnummer",
            "Datum",
            "Omschrijving",
            "Valuta",
            "Bedrag",
            "Saldo",
            "credit",
            "debet",
            "rekeningnummer tegenpartij",
            "BIC tegenpartij",
            "Naam tegenpartij",
            "Adres tegenpartij",
            "gestructureerde mededeling",
            "Vrije mededeling",
        ],
        ColumnMap {
            date: Some(7),
            memo: Some(6),
            outflow: Some(8),
            inflow: Some(8),
            ..Default::default()
        },
        "DD/MM/YYYY",
        ';',
    )
}

fn be_kbc_creditcard() -> SourceConfig {
    SourceConfig::new(
        &[
            "Kaartnummer",
            "Naam kaarthouder",
            "Uitgavenstaat",
            "Datum verrichting",
            "Datum verrekening",
            "Handelaar",
            "Omschrijving",
            "Bedrag",
            "Munt",
        ],
        ColumnMap {
            date: Some(3),
            payee: Some(5),
            memo: Some(6),
            outflow: Some(7),
            inflow: Some(7),
            ..Default::default()
        },
        "DD/MM/YYYY",
        ';',
    )
}

fn builtin_sources() -> Vec<(String, SourceConfig)> {
    vec![
        ("nordea".to_string(), nordea()),
        ("be_kbc".to_string(), be_kbc()),
        ("be_kbc_creditcard".to_string(), be_kbc_creditcard()),
    ]
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Named source formats in detection order. Built once at startup and only
/// read afterwards.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    entries: Vec<(String, SourceConfig)>,
}

impl SourceRegistry {
    pub fn builtin() -> Self {
        Self {
            entries: builtin_sources(),
        }
    }

    /// Built-ins, plus the user's custom sources file when `include_custom`.
    pub fn load(include_custom: bool) -> Self {
        let mut registry = Self::builtin();
        if include_custom {
            registry.merge_custom_file(&custom_sources_path());
        }
        tracing::debug!(sources = ?registry.names(), "source registry loaded");
        registry
    }

    /// Merge a JSON file of name -> source. Missing, unreadable or malformed
    /// files leave the registry untouched.
    pub fn merge_custom_file(&mut self, path: &Path) {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                if path.exists() {
                    tracing::warn!("Could not read {}: {e}", path.display());
                }
                return;
            }
        };
        match parse_custom_sources(&content) {
            Ok(custom) => {
                tracing::debug!("merging {} custom sources from {}", custom.len(), path.display());
                self.merge(custom);
            }
            Err(e) => tracing::warn!("Ignoring custom sources in {}: {e}", path.display()),
        }
    }

    /// Entries with a known name replace it in place, new names are appended.
    pub fn merge(&mut self, custom: impl IntoIterator<Item = (String, SourceConfig)>) {
        for (name, config) in custom {
            match self.entries.iter_mut().find(|(n, _)| *n == name) {
                Some(entry) => entry.1 = config,
                None => self.entries.push((name, config)),
            }
        }
    }

    /// Look up a source by name, failing with the list of valid names.
    pub fn require(&self, name: &str) -> Result<(&str, &SourceConfig)> {
        self.iter()
            .find(|(n, _)| *n == name)
            .ok_or_else(|| ConvertError::InvalidSource {
                name: name.to_string(),
                valid: self.names().join(","),
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SourceConfig)> {
        self.entries.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

fn parse_custom_sources(content: &str) -> Result<BTreeMap<String, SourceConfig>> {
    Ok(serde_json::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_order() {
        let registry = SourceRegistry::builtin();
        assert_eq!(registry.names(), vec!["nordea", "be_kbc", "be_kbc_creditcard"]);
    }

    #[test]
    fn test_builtin_columns_within_headers() {
        for (name, config) in SourceRegistry::builtin().iter() {
            let cols = [
                config.map.date,
                config.map.payee,
                config.map.category,
                config.map.memo,
                config.map.outflow,
                config.map.inflow,
            ];
            for col in cols.into_iter().flatten() {
                assert!(col < config.headers.len(), "{name}: column {col} out of range");
            }
        }
    }

    #[test]
    fn test_require_unknown_lists_names() {
        let registry = SourceRegistry::builtin();
        let err = registry.require("chase").unwrap_err();
        assert!(matches!(err, ConvertError::InvalidSource { .. }));
        assert_eq!(
            err.to_string(),
            "Source chase is not valid. List of valid sources: [ nordea,be_kbc,be_kbc_creditcard ]"
        );
    }

    #[test]
    fn test_merge_custom_file_overrides_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("to-ynab-sources.json");
        let json = r#"{
            "zz_bank": {
                "headers": ["When", "What", "How much"],
                "map": {"date": 0, "memo": 1, "outflow": 2, "inflow": 2},
                "dateformat": "YYYY-MM-DD",
                "delimitor": ","
            },
            "nordea": {
                "headers": ["Dato", "Tekst", "Beløb"],
                "map": {"date": 0, "memo": 1, "outflow": 2, "inflow": 2},
                "dateformat": "DD.MM.YYYY",
                "delimitor": ";"
            }
        }"#;
        std::fs::write(&path, json).unwrap();

        let mut registry = SourceRegistry::builtin();
        registry.merge_custom_file(&path);

        assert_eq!(registry.names(), vec!["nordea", "be_kbc", "be_kbc_creditcard", "zz_bank"]);
        assert_eq!(registry.require("nordea").unwrap().1.headers, vec!["Dato", "Tekst", "Beløb"]);
        assert_eq!(registry.require("zz_bank").unwrap().1.delimiter, ',');
    }

    #[test]
    fn test_merge_custom_file_missing_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = SourceRegistry::builtin();
        registry.merge_custom_file(&dir.path().join("nope.json"));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_merge_custom_file_malformed_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("to-ynab-sources.json");
        std::fs::write(&path, "{ not json").unwrap();
        let mut registry = SourceRegistry::builtin();
        registry.merge_custom_file(&path);
        assert_eq!(registry.names(), SourceRegistry::builtin().names());
    }
}
