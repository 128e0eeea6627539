use std::fmt;

use anyhow::{Context, Result};
use inquire::{InquireError, Select, Text};
use wxlookup_core::FileFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Console,
    Csv,
    Json,
    Exit,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 4] =
        [MenuChoice::Console, MenuChoice::Csv, MenuChoice::Json, MenuChoice::Exit];
}

impl fmt::Display for MenuChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MenuChoice::Console => "Terminal",
            MenuChoice::Csv => "CSV file",
            MenuChoice::Json => "JSON file",
            MenuChoice::Exit => "Exit",
        })
    }
}

/// Source of operator input for the interactive session.
pub trait Prompter {
    fn select_output(&mut self) -> Result<MenuChoice>;

    /// Raw filename; blank means "use the default".
    fn filename(&mut self, format: FileFormat) -> Result<String>;

    fn city(&mut self) -> Result<String>;
}

/// Terminal prompts. Esc and Ctrl-C count as "exit".
#[derive(Debug, Default)]
pub struct InquirePrompter;

fn cancelled(err: &InquireError) -> bool {
    matches!(err, InquireError::OperationCanceled | InquireError::OperationInterrupted)
}

impl Prompter for InquirePrompter {
    fn select_output(&mut self) -> Result<MenuChoice> {
        match Select::new("Choose output format:", MenuChoice::ALL.to_vec()).prompt() {
            Ok(choice) => Ok(choice),
            Err(e) if cancelled(&e) => Ok(MenuChoice::Exit),
            Err(e) => Err(e).context("Failed to read output choice"),
        }
    }

    fn filename(&mut self, format: FileFormat) -> Result<String> {
        let message = format!("Enter {format} filename:");
        match Text::new(&message).with_default(format.default_filename()).prompt() {
            Ok(name) => Ok(name),
            Err(e) if cancelled(&e) => Ok(String::new()),
            Err(e) => Err(e).context("Failed to read filename"),
        }
    }

    fn city(&mut self) -> Result<String> {
        match Text::new("Enter city name, 'exit' or 'return' to re-select output:").prompt() {
            Ok(city) => Ok(city),
            Err(e) if cancelled(&e) => Ok("exit".to_owned()),
            Err(e) => Err(e).context("Failed to read city name"),
        }
    }
}
