//! # ppl - Personal Contact Graph
//!
//! The command-line front end for ppl-core.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              apps/ppl (THE BINARY)           │
//! │                                              │
//! │   ┌─────────────┐        ┌──────────────┐    │
//! │   │    CLI      │        │   ppl.toml   │    │
//! │   │   (clap)    │        │   (config)   │    │
//! │   └──────┬──────┘        └──────┬───────┘    │
//! │          └───────────┬──────────┘            │
//! │                      ▼                       │
//! │              ┌───────────────┐               │
//! │              │   ppl-core    │               │
//! │              │  (THE LOGIC)  │               │
//! │              └───────────────┘               │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! ppl -g contacts.graphml import ~/contacts/vcf --format vcard
//! ppl -g contacts.graphml export ~/contacts/md --format markdown
//! ppl -g contacts.graphml check --vcard ~/contacts/vcf --markdown ~/contacts/md
//! ```

use clap::Parser;
use ppl::cli;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() -> ExitCode {
    // Parse first so --verbose can raise the default log level
    let cli = cli::Cli::parse();

    // PPL_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("PPL_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "ppl=debug,ppl_core=debug"
    } else if cli.quiet {
        "ppl=error,ppl_core=error"
    } else {
        "ppl=info,ppl_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    match cli::execute(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
