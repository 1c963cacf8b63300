use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "metar-cleaner")]
#[command(about = "Clean decoded METAR observations into a model-ready feature table")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, help = "TOML settings file")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Parquet,
    Csv,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Parquet => "parquet",
            OutputFormat::Csv => "csv",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean an observation file and write the feature table
    Clean {
        #[arg(short, long, help = "Observation file (.json, .jsonl, .ndjson or .csv)")]
        input: PathBuf,

        #[arg(
            short,
            long,
            help = "Output file path [default: <input>-cleaned.<format>]"
        )]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "parquet")]
        format: OutputFormat,

        #[arg(short, long, help = "Parquet compression: snappy, gzip, lz4, zstd or none")]
        compression: Option<String>,

        #[arg(long)]
        max_workers: Option<usize>,
    },

    /// Run the pipeline and report, without writing output
    Validate {
        #[arg(short, long, help = "Observation file (.json, .jsonl, .ndjson or .csv)")]
        input: PathBuf,

        #[arg(long)]
        max_workers: Option<usize>,

        #[arg(long, default_value = "10", help = "Number of range violations to list")]
        max_violations: usize,
    },

    /// Display information about a cleaned Parquet file
    Info {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value = "5")]
        sample: usize,

        #[arg(long, default_value = "10", help = "Number of range violations to list")]
        max_violations: usize,
    },
}
