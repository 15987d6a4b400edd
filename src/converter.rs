use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::dates::{DatePattern, DEFAULT_OUTPUT_FORMAT};
use crate::detect::{detect, detect_source};
use crate::error::{ConvertError, Result};
use crate::models::{header_line, CanonicalRecord, SourceConfig};
use crate::sources::SourceRegistry;
use crate::tokenizer::{tokenize_row, tokenize_text};
use crate::transform::{ConversionContext, PayeeMatcher};

pub const DEFAULT_DELIMITER: char = ';';
pub const DEFAULT_OUTPUT_NAME: &str = "ynab";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Input {
    /// CSV content passed directly.
    Text(String),
    File(PathBuf),
}

impl Input {
    pub fn label(&self) -> String {
        match self {
            Self::Text(_) => "<csv string>".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }

    pub fn load(&self) -> Result<String> {
        match self {
            Self::Text(text) => {
                if text.is_empty() {
                    return Err(ConvertError::MissingInput("csv string"));
                }
                Ok(text.clone())
            }
            Self::File(path) => {
                if path.as_os_str().is_empty() {
                    return Err(ConvertError::MissingInput(".csv file"));
                }
                if !has_csv_extension(path) {
                    return Err(ConvertError::InvalidExtension(path.clone()));
                }
                Ok(std::fs::read_to_string(path)?)
            }
        }
    }
}

pub fn has_csv_extension(path: &Path) -> bool {
    path.to_string_lossy().to_lowercase().ends_with(".csv")
}

fn strip_csv_suffix(name: &str) -> &str {
    let len = name.len();
    if len >= 4 && name.is_char_boundary(len - 4) && name[len - 4..].eq_ignore_ascii_case(".csv") {
        &name[..len - 4]
    } else {
        name
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Options as the caller supplied them, before validation.
#[derive(Debug, Clone)]
pub struct RawOptions {
    /// `None` detects the source from the header row.
    pub source: Option<String>,
    /// Overrides the delimiter recorded in the source.
    pub delimiter: Option<char>,
    pub output_delimiter: char,
    pub date_format: Option<String>,
    pub last_date: Option<String>,
    pub payees: Vec<String>,
    pub output: Option<String>,
    /// Directory the output file lands in unless `output` names a directory.
    pub output_dir: PathBuf,
    pub write: bool,
}

impl Default for RawOptions {
    fn default() -> Self {
        Self {
            source: None,
            delimiter: None,
            output_delimiter: DEFAULT_DELIMITER,
            date_format: None,
            last_date: None,
            payees: Vec::new(),
            output: None,
            output_dir: PathBuf::from("."),
            write: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub dir: PathBuf,
    pub name: String,
}

impl OutputTarget {
    /// A trailing `.csv` is dropped; a name that is an existing directory
    /// becomes the output directory.
    pub fn resolve(output: Option<&str>, default_dir: &Path) -> Self {
        let Some(output) = output else {
            return Self {
                dir: default_dir.to_path_buf(),
                name: DEFAULT_OUTPUT_NAME.to_string(),
            };
        };
        let stripped = strip_csv_suffix(output);
        if Path::new(stripped).is_dir() {
            return Self {
                dir: PathBuf::from(stripped),
                name: DEFAULT_OUTPUT_NAME.to_string(),
            };
        }
        Self {
            dir: default_dir.to_path_buf(),
            name: stripped.to_string(),
        }
    }

    /// `ynab` -> `ynab_<stem>`, used when converting a whole directory.
    pub fn suffixed(&self, stem: &str) -> Self {
        Self {
            dir: self.dir.clone(),
            name: format!("{}_{stem}", self.name),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.csv", self.name))
    }
}

/// Validated, immutable options for one conversion.
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    pub source: Option<String>,
    pub delimiter: Option<char>,
    pub output_delimiter: char,
    pub date_format: DatePattern,
    pub last_date: Option<NaiveDate>,
    pub payees: Vec<PayeeMatcher>,
    pub output: OutputTarget,
    pub write: bool,
}

impl ConversionOptions {
    pub fn validate(raw: RawOptions, registry: &SourceRegistry) -> Result<Self> {
        if let Some(name) = &raw.source {
            registry.require(name)?;
        }

        let date_format =
            DatePattern::output(raw.date_format.as_deref().unwrap_or(DEFAULT_OUTPUT_FORMAT))?;

        let last_date = match &raw.last_date {
            Some(value) => Some(date_format.parse_strict(value).ok_or_else(|| {
                ConvertError::InvalidCutoffDate {
                    date: value.clone(),
                    format: date_format.as_str().to_string(),
                }
            })?),
            None => None,
        };

        let output = OutputTarget::resolve(raw.output.as_deref(), &raw.output_dir);

        Ok(Self {
            source: raw.source,
            delimiter: raw.delimiter,
            output_delimiter: raw.output_delimiter,
            date_format,
            last_date,
            payees: raw.payees.iter().map(|p| PayeeMatcher::new(p)).collect(),
            output,
            write: raw.write,
        })
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Conversion {
    pub source: String,
    pub records: Vec<CanonicalRecord>,
    /// Data rows dropped by the cutoff date.
    pub excluded: usize,
    pub csv: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emitted {
    Returned(String),
    Written(PathBuf),
}

impl fmt::Display for Emitted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Returned(data) => write!(f, "{data}"),
            Self::Written(path) => write!(f, "File {} written successfully!", path.display()),
        }
    }
}

fn resolve_source<'r>(
    registry: &'r SourceRegistry,
    rows: &[&str],
    options: &ConversionOptions,
    label: &str,
) -> Result<(&'r str, &'r SourceConfig)> {
    let Some(first) = rows.first() else {
        return Err(ConvertError::EmptyInput);
    };

    match &options.source {
        Some(name) => {
            let (name, config) = registry.require(name)?;
            let delimiter = options.delimiter.unwrap_or(config.delimiter);
            let header_cells = tokenize_row(first, delimiter);
            if rows.len() < 2 && !header_cells.is_empty() {
                return Err(ConvertError::EmptyHeaderOnly);
            }
            if !detect(&header_cells, config) {
                return Err(ConvertError::HeaderMismatch {
                    expected: config.headers.join(&delimiter.to_string()),
                });
            }
            Ok((name, config))
        }
        None => {
            let delimiter = options.delimiter.unwrap_or(DEFAULT_DELIMITER);
            let header_cells = tokenize_row(first, delimiter);
            let found = detect_source(&header_cells, registry, label)?;
            if rows.len() < 2 && !header_cells.is_empty() {
                return Err(ConvertError::EmptyHeaderOnly);
            }
            Ok(found)
        }
    }
}

/// Header and records, each followed by `\n`, except the row that came from
/// the last input line. When the cutoff drops that line the output keeps its
/// trailing newline.
pub fn serialize(records: &[CanonicalRecord], delimiter: char, last_row_kept: bool) -> String {
    let mut out = header_line(delimiter);
    out.push('\n');
    for record in records {
        out.push_str(&record.to_line(delimiter));
        out.push('\n');
    }
    if last_row_kept && !records.is_empty() {
        out.pop();
    }
    out
}

/// Load, detect or validate the source, filter by cutoff and transform.
/// Nothing is written here.
pub fn convert(
    registry: &SourceRegistry,
    input: &Input,
    options: &ConversionOptions,
    today: NaiveDate,
) -> Result<Conversion> {
    let data = input.load()?;
    let rows = tokenize_text(&data)?;
    let label = input.label();
    let (source, config) = resolve_source(registry, &rows, options, &label)?;

    let delimiter = options.delimiter.unwrap_or(config.delimiter);
    let ctx = ConversionContext::new(config, &options.date_format, &options.payees, today);

    let data_rows = &rows[1..];
    let mut records = Vec::with_capacity(data_rows.len());
    let mut excluded = 0usize;
    let mut last_row_kept = false;
    for (i, line) in data_rows.iter().enumerate() {
        let cells = tokenize_row(line, delimiter);
        if let Some(cutoff) = options.last_date {
            // a date that does not parse never falls on or before the cutoff
            if !ctx.parsed_date(&cells).is_some_and(|date| date <= cutoff) {
                excluded += 1;
                continue;
            }
        }
        records.push(ctx.transform(&cells));
        last_row_kept = i == data_rows.len() - 1;
    }
    tracing::debug!(
        "{label}: {} rows converted as {source}, {excluded} after cutoff",
        records.len()
    );

    let csv = serialize(&records, options.output_delimiter, last_row_kept);
    Ok(Conversion {
        source: source.to_string(),
        records,
        excluded,
        csv,
    })
}

/// Return the CSV, or write it to the resolved output path.
pub fn emit(conversion: &Conversion, options: &ConversionOptions) -> Result<Emitted> {
    if !options.write {
        return Ok(Emitted::Returned(conversion.csv.clone()));
    }
    let path = options.output.path();
    std::fs::write(&path, &conversion.csv).map_err(|source| ConvertError::Write {
        path: path.clone(),
        source,
    })?;
    tracing::info!("wrote {} records to {}", conversion.records.len(), path.display());
    Ok(Emitted::Written(path))
}

pub fn generate(
    registry: &SourceRegistry,
    input: &Input,
    options: &ConversionOptions,
    today: NaiveDate,
) -> Result<(Conversion, Emitted)> {
    let conversion = convert(registry, input, options, today)?;
    let emitted = emit(&conversion, options)?;
    Ok((conversion, emitted))
}
