use std::io;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use wxlookup_core::{Config, FileFormat, OutputTarget, provider_from_config};

use crate::{
    prompt::InquirePrompter,
    session::{Session, lookup_once},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wxlookup", version, about = "Current weather and local time for any city")]
pub struct Cli {
    /// Defaults to the interactive loop.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Prompt for an output format and look up cities until `exit`.
    Run,

    /// Look up a single city and exit.
    Show {
        /// City name, optionally with state/country, e.g. "portland or us".
        city: String,

        #[arg(long, value_enum, default_value_t = OutputKind::Console)]
        output: OutputKind,

        /// Output filename for csv/json; the extension is fixed up if needed.
        #[arg(long)]
        file: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputKind {
    Console,
    Csv,
    Json,
}

impl OutputKind {
    /// Build the output target, returning any filename notice alongside it.
    pub fn target(self, file: Option<&str>) -> (OutputTarget, Option<String>) {
        let format = match self {
            OutputKind::Console => return (OutputTarget::Console, None),
            OutputKind::Csv => FileFormat::Csv,
            OutputKind::Json => FileFormat::Json,
        };
        OutputTarget::file(file.unwrap_or_default(), format)
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load().context("Failed to load configuration")?;
        let provider = provider_from_config(&config)?;

        match self.command.unwrap_or(Command::Run) {
            Command::Run => {
                Session::new(provider.as_ref(), InquirePrompter, io::stdout()).run().await
            }
            Command::Show { city, output, file } => {
                let (target, notice) = output.target(file.as_deref());
                if let Some(notice) = notice {
                    println!("{notice}");
                }
                lookup_once(provider.as_ref(), &city, target, &mut io::stdout()).await
            }
        }
    }
}
