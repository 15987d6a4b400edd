use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::models::{Field, SourceConfig};
use crate::sources::SourceRegistry;

fn mapped_columns(config: &SourceConfig) -> String {
    Field::ALL
        .iter()
        .filter_map(|&field| {
            config
                .map
                .column(field)
                .map(|col| format!("{}={col}", field.heading()))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn run(registry: &SourceRegistry) -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Name", "Delimiter", "Date Format", "Columns", "Headers"]);
    for (name, config) in registry.iter() {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(config.delimiter),
            Cell::new(&config.date_format),
            Cell::new(mapped_columns(config)),
            Cell::new(config.headers.join(&config.delimiter.to_string())),
        ]);
    }
    println!("Sources ({})\n{table}", registry.len());
    Ok(())
}
