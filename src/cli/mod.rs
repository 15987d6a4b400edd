pub mod completions;
pub mod convert;
pub mod sources;
#[cfg(feature = "upload")]
pub mod upload;

use clap::{Args, Parser, Subcommand};

use crate::dates::DEFAULT_OUTPUT_FORMAT;

#[derive(Parser)]
#[command(
    name = "csv2ynab",
    version,
    about = "Convert csv files from different sources, like banks, to YNAB ready csv files.",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub convert: ConvertArgs,

    /// Print debug logging to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the known source formats.
    Sources {
        /// Only list the built-in sources
        #[arg(long = "ignore-custom-sources")]
        ignore_custom_sources: bool,
    },
    /// Print shell completions.
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    /// A .csv file, a directory of .csv files, or a csv string with --csvstring.
    /// Default: current directory
    pub path: Option<String>,

    /// Source to read the csv with. Detected from the header row when omitted
    #[arg(short, long)]
    pub source: Option<String>,

    /// Output filename (with or without .csv extension) or directory. Default: ynab
    #[arg(short, long)]
    pub output: Option<String>,

    /// Last date for a transaction to be added to the generated csv
    #[arg(short = 'l', long = "lastdate")]
    pub last_date: Option<String>,

    /// Payees to match in the memo, comma separated
    #[arg(short, long, value_delimiter = ',')]
    pub payees: Vec<String>,

    /// Cell delimiter of the source file. Default: the source's own delimiter
    #[arg(short, long)]
    pub delimiter: Option<char>,

    /// Cell delimiter of the generated file
    #[arg(long = "output-delimiter", default_value_t = ';')]
    pub output_delimiter: char,

    /// Treat PATH as csv content instead of a file
    #[arg(short = 'c', long)]
    pub csvstring: bool,

    /// Print the generated csv instead of writing a file
    #[arg(short = 'n', long = "no-write")]
    pub no_write: bool,

    /// Date format for the generated csv
    #[arg(short = 'f', long = "dateformat", default_value = DEFAULT_OUTPUT_FORMAT)]
    pub date_format: String,

    /// Skip ~/to-ynab-sources.json
    #[arg(long = "ignore-custom-sources")]
    pub ignore_custom_sources: bool,

    /// Upload the converted transactions to YNAB
    #[cfg(feature = "upload")]
    #[arg(long)]
    pub upload: bool,
}
