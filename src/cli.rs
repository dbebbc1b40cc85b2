use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate labels in a single .drawio file
    Process {
        /// Input diagram file
        #[arg(short, long)]
        input: PathBuf,

        /// Output filename (defaults to the input filename)
        #[arg(long)]
        out_name: Option<String>,

        /// Output directory (defaults to the configured output_dir)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Target languages (comma-separated two-letter codes, overrides config)
        #[arg(short, long)]
        languages: Option<String>,

        /// Do not overwrite existing translation attributes
        #[arg(long)]
        no_overwrite: bool,

        /// Write page XML uncompressed for easier inspection
        #[arg(long)]
        uncompressed: bool,
    },

    /// Translate every .drawio file in a directory (non-recursive)
    Batch {
        /// Input directory containing .drawio files
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Output directory (defaults to the configured output_dir)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Target languages (comma-separated two-letter codes, overrides config)
        #[arg(short, long)]
        languages: Option<String>,

        /// Do not overwrite existing translation attributes
        #[arg(long)]
        no_overwrite: bool,

        /// Write page XML uncompressed for easier inspection
        #[arg(long)]
        uncompressed: bool,
    },
}

/// Split a comma-separated language list from the command line.
pub fn parse_languages(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_languages() {
        assert_eq!(parse_languages("de,fr, it"), vec!["de", "fr", "it"]);
        assert_eq!(parse_languages("de,,"), vec!["de"]);
    }
}
