use crate::error::{ConvertError, Result};

/// Split raw CSV text into its non-empty lines. `\r\n` and bare `\r` count as
/// line breaks.
pub fn tokenize_text(raw: &str) -> Result<Vec<&str>> {
    if raw.is_empty() {
        return Err(ConvertError::EmptyInput);
    }
    Ok(raw
        .split(['\r', '\n'])
        .filter(|line| !line.is_empty())
        .collect())
}

/// Split a line into cells, dropping empty ones.
///
/// An empty field in the middle of a row shifts every later cell one column
/// to the left, so sources must not rely on columns after an optional value.
pub fn tokenize_row(line: &str, delimiter: char) -> Vec<&str> {
    line.split(delimiter).filter(|cell| !cell.is_empty()).collect()
}
