use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use colored::Colorize;

use crate::cli::ConvertArgs;
use crate::converter::{
    generate, has_csv_extension, Conversion, ConversionOptions, Emitted, Input, RawOptions,
};
use crate::dates::DatePattern;
use crate::error::{ConvertError, Result};
use crate::models::CanonicalRecord;
use crate::settings::shellexpand_path;
use crate::sources::SourceRegistry;

pub struct RunSummary {
    pub converted: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn success(&self) -> bool {
        self.failed == 0 && self.converted > 0
    }
}

fn csv_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && has_csv_extension(path))
        .collect();
    files.sort();
    Ok(files)
}

fn raw_options(args: &ConvertArgs, output_dir: &Path) -> RawOptions {
    RawOptions {
        source: args.source.clone(),
        delimiter: args.delimiter,
        output_delimiter: args.output_delimiter,
        date_format: Some(args.date_format.clone()),
        last_date: args.last_date.clone(),
        payees: args.payees.clone(),
        output: args
            .output
            .as_deref()
            .map(|o| shellexpand_path(o).to_string_lossy().to_string()),
        output_dir: output_dir.to_path_buf(),
        write: !args.no_write,
    }
}

/// Runs after a conversion was reported. Receives the converted records, the
/// output date pattern, the input label and today's date.
pub type UploadStep<'a> = &'a dyn Fn(&[CanonicalRecord], &DatePattern, &str, NaiveDate) -> Result<()>;

/// Convert one input. `stem` is set when scanning a directory so every file
/// gets its own output name.
fn convert_one(
    args: &ConvertArgs,
    registry: &SourceRegistry,
    input: &Input,
    output_dir: &Path,
    stem: Option<&str>,
    today: NaiveDate,
) -> Result<(Conversion, Emitted, DatePattern)> {
    let mut options = ConversionOptions::validate(raw_options(args, output_dir), registry)?;
    if let Some(stem) = stem {
        options.output = options.output.suffixed(stem);
    }

    let (conversion, emitted) = generate(registry, input, &options, today)?;
    tracing::info!(
        source = %conversion.source,
        excluded = conversion.excluded,
        "converted {}",
        input.label()
    );
    Ok((conversion, emitted, options.date_format))
}

struct Driver<'a> {
    args: &'a ConvertArgs,
    registry: &'a SourceRegistry,
    upload: Option<UploadStep<'a>>,
    today: NaiveDate,
    summary: RunSummary,
}

impl Driver<'_> {
    fn fail(&mut self, input: &Input, e: &ConvertError) {
        tracing::debug!("{} failed: {e:?}", input.label());
        eprintln!("{}", e.to_string().red());
        self.summary.failed += 1;
    }

    /// Convert, report the result, then upload. The converted output is
    /// printed or written before the upload starts; an upload error is
    /// counted as a separate failure.
    fn process(&mut self, input: &Input, output_dir: &Path, stem: Option<&str>) {
        let converted = convert_one(self.args, self.registry, input, output_dir, stem, self.today);
        let (conversion, emitted, date_format) = match converted {
            Ok(converted) => converted,
            Err(e) => return self.fail(input, &e),
        };

        match emitted {
            Emitted::Returned(data) => println!("{data}"),
            written => println!("{}", written.to_string().green()),
        }
        self.summary.converted += 1;

        if let Some(upload) = self.upload {
            if let Err(e) = upload(&conversion.records, &date_format, &input.label(), self.today) {
                self.fail(input, &e);
            }
        }
    }
}

/// Convert a csv string, a single file or every csv file in a directory.
/// Files are processed one after another; a failure is reported and the
/// next file is still attempted.
pub fn run(args: &ConvertArgs, registry: &SourceRegistry) -> Result<RunSummary> {
    #[cfg(feature = "upload")]
    if args.upload {
        let step: UploadStep = &crate::cli::upload::run;
        return run_with(args, registry, Some(step));
    }
    run_with(args, registry, None)
}

pub fn run_with(
    args: &ConvertArgs,
    registry: &SourceRegistry,
    upload: Option<UploadStep>,
) -> Result<RunSummary> {
    let mut driver = Driver {
        args,
        registry,
        upload,
        today: chrono::Local::now().date_naive(),
        summary: RunSummary { converted: 0, failed: 0 },
    };

    if args.csvstring {
        let input = Input::Text(args.path.clone().unwrap_or_default());
        driver.process(&input, Path::new("."), None);
        return Ok(driver.summary);
    }

    let path = match args.path.as_deref() {
        Some(p) => shellexpand_path(p),
        None => std::env::current_dir()?,
    };
    if !path.exists() {
        return Err(ConvertError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }

    if path.is_dir() {
        let files = csv_files_in(&path)?;
        if files.is_empty() {
            eprintln!("{}", format!("No CSV files found in {}", path.display()).red());
            return Ok(driver.summary);
        }
        for file in files {
            let stem = file
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            driver.process(&Input::File(file), &path, Some(&stem));
        }
        return Ok(driver.summary);
    }

    let output_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    driver.process(&Input::File(path), &output_dir, None);
    Ok(driver.summary)
}
