use crate::error::{ConvertError, Result};
use crate::models::SourceConfig;
use crate::sources::SourceRegistry;

/// Exact, positional, case-sensitive header comparison.
pub fn detect(header_cells: &[&str], config: &SourceConfig) -> bool {
    config.headers.len() == header_cells.len()
        && config.headers.iter().zip(header_cells).all(|(h, c)| h == c)
}

/// First registry entry whose header signature matches, in registry order.
/// `file` only labels the error.
pub fn detect_source<'r>(
    header_cells: &[&str],
    registry: &'r SourceRegistry,
    file: &str,
) -> Result<(&'r str, &'r SourceConfig)> {
    for (name, config) in registry.iter() {
        if detect(header_cells, config) {
            tracing::debug!("{file} detected as {name}");
            return Ok((name, config));
        }
    }
    Err(ConvertError::NoMatchingSource {
        file: file.to_string(),
        sources: registry.names().join(","),
    })
}
