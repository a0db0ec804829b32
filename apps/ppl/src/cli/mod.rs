//! # ppl CLI Module
//!
//! This module implements the command-line interface for ppl.
//!
//! ## Available Commands
//!
//! - `import` - Import a folder of contact files into the graph
//! - `export` - Write every graph contact to a folder
//! - `list` - List the contacts in the graph
//! - `search` - Find contacts by name, email or organization
//! - `convert` - Import one folder and export the graph to another
//! - `check` - Report drift between the graph and contact folders

mod commands;

use crate::config::Config;
use clap::{Parser, Subcommand};
use ppl_core::{ContactFormat, GraphFormat, PplError, ReportFormat};
use std::path::PathBuf;
use std::process::ExitCode;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// ppl - manage contacts and relationships as a graph
///
/// Contacts are merged into one graph file and mirrored as vCard, YAML or
/// Markdown files in ordinary folders.
#[derive(Parser, Debug)]
#[command(name = "ppl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors and machine output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the graph file (overrides ppl.toml)
    #[arg(short, long, global = true)]
    pub graph: Option<PathBuf>,

    /// Graph codec: "json" or "graphml" (default: from the file extension)
    #[arg(long, global = true)]
    pub graph_format: Option<String>,

    /// Path to a ppl.toml configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import a folder of contact files into the graph
    Import {
        /// Folder holding one contact per file
        folder: PathBuf,

        /// File format (vcard, yaml, markdown)
        #[arg(short, long, default_value = "vcard")]
        format: String,
    },

    /// Export every graph contact to a folder
    Export {
        /// Destination folder (created if missing)
        folder: PathBuf,

        /// File format (vcard, yaml, markdown)
        #[arg(short, long, default_value = "vcard")]
        format: String,

        /// Rewrite every file, even unchanged ones
        #[arg(long)]
        force: bool,
    },

    /// List the contacts in the graph
    List,

    /// Search contacts by name, email or organization
    Search {
        /// Case-insensitive substring
        query: String,
    },

    /// Import a folder into the graph, then export the graph to another folder
    Convert {
        /// Source folder
        source: PathBuf,

        /// Source format (vcard, yaml, markdown)
        source_format: String,

        /// Destination folder
        target: PathBuf,

        /// Destination format (vcard, yaml, markdown)
        target_format: String,
    },

    /// Check the graph against contact folders
    Check {
        /// vCard folder (overrides ppl.toml)
        #[arg(long)]
        vcard: Option<PathBuf>,

        /// Markdown folder (overrides ppl.toml)
        #[arg(long)]
        markdown: Option<PathBuf>,

        /// YAML folder (overrides ppl.toml)
        #[arg(long)]
        yaml: Option<PathBuf>,

        /// Report format (text, json, yaml)
        #[arg(short, long, default_value = "text")]
        output: String,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
///
/// Returns `ExitCode::FAILURE` without an error when `check` finds drift.
pub fn execute(cli: Cli) -> Result<ExitCode, PplError> {
    let config = Config::load(cli.config.as_deref())?;
    let graph = GraphFile {
        path: config.graph_path(cli.graph.as_deref()),
        format: cli.graph_format.as_deref().map(GraphFormat::from_name).transpose()?,
    };
    let output = Output {
        json: cli.json_mode,
        verbose: cli.verbose && !cli.quiet,
        quiet: cli.quiet,
    };

    match cli.command {
        Some(Commands::Import { folder, format }) => {
            cmd_import(&graph, &folder, ContactFormat::from_name(&format)?, output)?;
        }
        Some(Commands::Export {
            folder,
            format,
            force,
        }) => {
            cmd_export(&graph, &folder, ContactFormat::from_name(&format)?, force, output)?;
        }
        Some(Commands::List) => {
            cmd_list(&graph, output)?;
        }
        Some(Commands::Search { query }) => {
            cmd_search(&graph, &query, output)?;
        }
        Some(Commands::Convert {
            source,
            source_format,
            target,
            target_format,
        }) => {
            cmd_convert(
                &graph,
                &source,
                ContactFormat::from_name(&source_format)?,
                &target,
                ContactFormat::from_name(&target_format)?,
                output,
            )?;
        }
        Some(Commands::Check {
            vcard,
            markdown,
            yaml,
            output: report_format,
        }) => {
            let folders = config.check_folders(vcard, markdown, yaml);
            let format = if cli.json_mode {
                ReportFormat::Json
            } else {
                ReportFormat::from_name(&report_format)?
            };
            let report = cmd_check(&graph, &folders, format)?;
            if !report.is_consistent() {
                return Ok(ExitCode::FAILURE);
            }
        }
        None => {
            println!("No command specified. Use --help for usage information.");
        }
    }

    Ok(ExitCode::SUCCESS)
}
