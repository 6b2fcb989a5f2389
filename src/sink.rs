use crate::models::{ClassifiedRecord, ScrapeOutcome};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON array
    Json,
    /// One row per record with a header row
    Csv,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

/// A record that can be written as one flat CSV row.
pub trait TabularRecord {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

impl TabularRecord for ScrapeOutcome {
    fn headers() -> Vec<&'static str> {
        ScrapeOutcome::csv_headers().to_vec()
    }

    fn row(&self) -> Vec<String> {
        self.to_csv_record()
    }
}

impl TabularRecord for ClassifiedRecord {
    fn headers() -> Vec<&'static str> {
        ClassifiedRecord::csv_headers().to_vec()
    }

    fn row(&self) -> Vec<String> {
        self.to_csv_record()
    }
}

pub fn write_json<T: Serialize, W: Write>(records: &[T], mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, records).context("Failed to serialize records")?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

pub fn write_csv<T: TabularRecord, W: Write>(records: &[T], writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(T::headers())?;
    for record in records {
        writer.write_record(record.row())?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_records_to_csv<T: TabularRecord>(records: &[T], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create output file: {}", output_path.display()))?;
    write_csv(records, file)?;
    info!("Saved {} records to {}", records.len(), output_path.display());
    Ok(())
}

/// Emit records in `format`, to `output` or stdout.
pub fn emit<T>(records: &[T], format: OutputFormat, output: Option<&Path>) -> Result<()>
where
    T: Serialize + TabularRecord,
{
    match (format, output) {
        (OutputFormat::Json, None) => write_json(records, std::io::stdout().lock()),
        (OutputFormat::Json, Some(path)) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            write_json(records, file)?;
            info!("Saved {} records to {}", records.len(), path.display());
            Ok(())
        }
        (OutputFormat::Csv, None) => write_csv(records, std::io::stdout().lock()),
        (OutputFormat::Csv, Some(path)) => save_records_to_csv(records, path),
    }
}
