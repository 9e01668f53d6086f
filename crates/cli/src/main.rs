// taxkal - tax-directory record extraction (headless)

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use taxkal_engine::{EngineConfig, Pipeline, RunSummary};
use taxkal_io::CatalogPaths;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_IO: u8 = 3;
pub const EXIT_CONFIG: u8 = 4;

#[derive(Parser)]
#[command(name = "taxkal")]
#[command(about = "Reconstruct records from OCR'd tax-directory scans")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full extraction over one scan
    #[command(after_help = "\
Examples:
  taxkal run --lines lines.csv --surnames surnames.csv \\
      --first-names firstnames.csv --occupations occupations.csv \\
      --parishes parishes.csv --dirty dirty.csv -o records.csv
  RUST_LOG=taxkal_engine=debug taxkal run ... --summary summary.json")]
    Run {
        /// Scan lines CSV (page, column, row, line)
        #[arg(long)]
        lines: PathBuf,

        /// Surname register CSV (last_name)
        #[arg(long)]
        surnames: PathBuf,

        /// First-name list CSV (firstname)
        #[arg(long)]
        first_names: PathBuf,

        /// Occupation lexicon CSV (occ)
        #[arg(long)]
        occupations: PathBuf,

        /// Verified parish reference CSV (parish, municipality, mapped_parish)
        #[arg(long)]
        parishes: PathBuf,

        /// Dirty-surname correction table CSV (raw, clean)
        #[arg(long)]
        dirty: PathBuf,

        /// Engine config TOML (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output records CSV
        #[arg(long, short = 'o', default_value = "records.csv")]
        output: PathBuf,

        /// Write the run summary as JSON
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Parse and validate an engine config file
    ValidateConfig {
        /// Engine config TOML
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Run {
            lines,
            surnames,
            first_names,
            occupations,
            parishes,
            dirty,
            config,
            output,
            summary,
        } => cmd_run(RunArgs {
            lines,
            catalog_paths: CatalogPaths {
                surnames,
                first_names,
                occupations,
                parishes,
                dirty,
            },
            config,
            output,
            summary,
        }),
        Commands::ValidateConfig { config } => cmd_validate_config(&config),
    };
    ExitCode::from(code)
}

struct RunArgs {
    lines: PathBuf,
    catalog_paths: CatalogPaths,
    config: Option<PathBuf>,
    output: PathBuf,
    summary: Option<PathBuf>,
}

fn cmd_run(args: RunArgs) -> u8 {
    let config = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let catalogs = match taxkal_io::load_catalogs(&args.catalog_paths) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return EXIT_IO;
        }
    };
    let lines = match taxkal_io::load_lines(&args.lines) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("error: {e}");
            return EXIT_IO;
        }
    };

    let pipeline = match Pipeline::new(catalogs, config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return EXIT_ERROR;
        }
    };
    let output = pipeline.run(lines);

    if let Err(e) = taxkal_io::write_records(&args.output, &output.records) {
        eprintln!("error: {e}");
        return EXIT_IO;
    }
    if let Some(path) = &args.summary {
        let json = match serde_json::to_string_pretty(&output.summary) {
            Ok(j) => j,
            Err(e) => {
                eprintln!("error: summary serialization: {e}");
                return EXIT_ERROR;
            }
        };
        if let Err(e) = std::fs::write(path, json) {
            eprintln!("error: {}: {e}", path.display());
            return EXIT_IO;
        }
    }

    eprint!("{}", human_summary(&output.summary));
    EXIT_SUCCESS
}

fn cmd_validate_config(path: &std::path::Path) -> u8 {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}: {e}", path.display());
            return EXIT_IO;
        }
    };
    match EngineConfig::from_toml(&content) {
        Ok(_) => {
            println!("{}: ok", path.display());
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            EXIT_CONFIG
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<EngineConfig, u8> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let content = std::fs::read_to_string(path).map_err(|e| {
        eprintln!("error: {}: {e}", path.display());
        EXIT_IO
    })?;
    EngineConfig::from_toml(&content).map_err(|e| {
        eprintln!("error: {e}");
        EXIT_CONFIG
    })
}

fn human_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} lines ({} dropped), {} records\n",
        summary.lines, summary.lines_dropped, summary.records
    ));
    out.push_str(&format!(
        "fields: surname {}, initials {}, occupation {}, income {}, parish {}\n",
        summary.field_counts.surname,
        summary.field_counts.initials,
        summary.field_counts.occupation,
        summary.field_counts.income_primary,
        summary.field_counts.parish,
    ));
    out.push_str(&format!(
        "flags: firm {}, estate {}, v-dash {}\n",
        summary.flags.firm, summary.flags.estate, summary.flags.v_dash
    ));
    for (bucket, count) in &summary.buckets {
        out.push_str(&format!("bucket {bucket}: {count}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxkal_core::{Entry, Line};

    #[test]
    fn human_summary_lists_buckets() {
        let mut e = Entry::new(Line::new(1, 1, 1, "Berg, K., snickare 2100"));
        e.surname = "Berg".into();
        let summary = RunSummary::from_entries(&[e], 2, 1);
        let text = human_summary(&summary);
        assert!(text.starts_with("1 lines (2 dropped), 1 records\n"));
        assert!(text.contains("bucket unclassified: 1"));
    }

    #[test]
    fn missing_config_path_is_io_error() {
        let code = cmd_validate_config(std::path::Path::new("/nonexistent/config.toml"));
        assert_eq!(code, EXIT_IO);
    }

    #[test]
    fn default_config_when_omitted() {
        let config = load_config(None).unwrap();
        assert_eq!(config.pipeline.max_passes, 2);
    }
}
