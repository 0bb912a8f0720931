//! tabmerge CLI - merge spreadsheets into chunked XLSX outputs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tabmerge::prelude::*;
use tabmerge::{run_merge_with_progress, DEFAULT_MAX_ROWS_PER_FILE};
use tabmerge_sku::{load_sku_file, SkuLoadOptions, DEFAULT_TABLE};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "tabmerge")]
#[command(
    author,
    version,
    about = "Merge CSV and spreadsheet files and load SKU workbooks"
)]
struct Cli {
    /// Log debug detail (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge files into row-limited XLSX parts and a zip of them
    Merge {
        /// Input files (csv, xlsx, xlsm, xls, xlsb)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Directory for the output parts and archive
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Columns to keep, in order (default: all)
        #[arg(short, long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Drop rows that repeat an earlier row
        #[arg(short, long)]
        dedupe: bool,

        /// Column to sort by, or "none"
        #[arg(short, long)]
        sort_by: Option<String>,

        /// Maximum data rows per output file
        #[arg(short, long, default_value_t = DEFAULT_MAX_ROWS_PER_FILE)]
        max_rows: usize,

        /// Write only the parts, without the zip
        #[arg(long)]
        no_archive: bool,
    },

    /// Show the size and first rows of each file
    Inspect {
        /// Input files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Number of rows to preview
        #[arg(long, default_value = "5")]
        head: usize,
    },

    /// Insert the rows of an SKU workbook into a SQLite table
    LoadSku {
        /// SKU workbook (.xlsx)
        input: PathBuf,

        /// SQLite database holding the destination table
        #[arg(long, env = "TABMERGE_DB")]
        db: PathBuf,

        /// Destination table
        #[arg(short, long, default_value = DEFAULT_TABLE)]
        table: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Merge {
            files,
            output_dir,
            columns,
            dedupe,
            sort_by,
            max_rows,
            no_archive,
        } => {
            let options = MergeOptions {
                transform: TransformOptions {
                    columns,
                    dedupe,
                    sort_by,
                },
                max_rows_per_file: max_rows,
                archive_name: if no_archive {
                    None
                } else {
                    MergeOptions::default().archive_name
                },
            };
            merge(&files, &output_dir, &options)
        }
        Commands::Inspect { files, head } => inspect(&files, head),
        Commands::LoadSku { input, db, table } => load_sku(&input, &db, table),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_files(paths: &[PathBuf]) -> Result<Vec<UploadedFile>> {
    paths
        .iter()
        .map(|path| {
            UploadedFile::from_path(path)
                .with_context(|| format!("Failed to read '{}'", path.display()))
        })
        .collect()
}

fn merge(paths: &[PathBuf], output_dir: &Path, options: &MergeOptions) -> Result<()> {
    let files = load_files(paths)?;
    let report = run_merge_with_progress(&files, options, |done, total| {
        eprintln!("Exported part {}/{}", done, total);
    })?;

    for file in &report.merged {
        println!("  {}: {} rows x {} columns", file.name, file.rows, file.columns);
    }
    for err in &report.rejected {
        println!("  skipped {}", err);
    }
    println!("{}", report.summary());

    match &report.outcome {
        MergeOutcome::NoValidData => {
            println!("No valid data to merge");
            return Ok(());
        }
        MergeOutcome::Empty => {
            println!("No rows left after filtering; nothing exported");
            return Ok(());
        }
        MergeOutcome::Exported { .. } => {}
    }
    println!(
        "Final dataset: {} rows x {} columns",
        report.shape.0, report.shape.1
    );

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create '{}'", output_dir.display()))?;
    for part in report.outputs() {
        write_output(output_dir, &part.name, &part.bytes)?;
        println!("Wrote {} ({} rows)", part.name, part.rows);
    }
    if let Some(archive) = report.archive() {
        write_output(output_dir, &archive.name, &archive.bytes)?;
        println!("Wrote {}", archive.name);
    }

    Ok(())
}

fn write_output(dir: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    let path = dir.join(name);
    tracing::debug!("writing {} bytes to {}", bytes.len(), path.display());
    fs::write(&path, bytes).with_context(|| format!("Failed to write '{}'", path.display()))
}

fn inspect(paths: &[PathBuf], head: usize) -> Result<()> {
    for file in load_files(paths)? {
        println!("{}", file.name);
        let table = match read(&file) {
            Ok(table) => table,
            Err(err) => {
                println!("  {}", err);
                continue;
            }
        };

        let (rows, columns) = table.shape();
        println!("  {} rows x {} columns", rows, columns);
        println!("  {}", table.columns().join("\t"));
        for row in table.head(head) {
            let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
            println!("  {}", cells.join("\t"));
        }
    }
    Ok(())
}

fn load_sku(input: &Path, db: &Path, table: String) -> Result<()> {
    let file = UploadedFile::from_path(input)
        .with_context(|| format!("Failed to read '{}'", input.display()))?;
    let report = load_sku_file(&file, db, &SkuLoadOptions { table })
        .with_context(|| format!("Upload of '{}' failed", file.name))?;

    println!(
        "Successfully inserted {} records into database",
        report.success_count
    );
    if !report.errors.is_empty() {
        println!("{} rows failed during upload:", report.failed_count());
        for err in &report.errors {
            println!("  {}", err);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_merge_flags() {
        let cli = Cli::parse_from([
            "tabmerge",
            "merge",
            "a.csv",
            "b.xlsx",
            "--columns",
            "id,name",
            "--sort-by",
            "none",
            "--max-rows",
            "10",
            "--no-archive",
        ]);
        match cli.command {
            Commands::Merge {
                files,
                columns,
                sort_by,
                max_rows,
                no_archive,
                dedupe,
                ..
            } => {
                assert_eq!(files.len(), 2);
                assert_eq!(columns, vec!["id", "name"]);
                assert_eq!(sort_by.as_deref(), Some("none"));
                assert_eq!(max_rows, 10);
                assert!(no_archive);
                assert!(!dedupe);
            }
            _ => panic!("expected merge"),
        }
    }

    #[test]
    fn test_load_sku_defaults() {
        let cli = Cli::parse_from(["tabmerge", "load-sku", "sku.xlsx", "--db", "app.db"]);
        match cli.command {
            Commands::LoadSku { db, table, .. } => {
                assert_eq!(db, PathBuf::from("app.db"));
                assert_eq!(table, "sku");
            }
            _ => panic!("expected load-sku"),
        }
    }
}
