//! Interactive lookup loop.
//!
//! The loop is a small state machine:
//!
//! ```text
//! SelectingOutput --(console/csv/json)--> AwaitingCity
//! SelectingOutput --(exit)--------------> Done
//! AwaitingCity ----(city/blank/invalid)-> AwaitingCity
//! AwaitingCity ----(return)-------------> SelectingOutput
//! AwaitingCity ----(exit)---------------> Done
//! ```

use std::io::Write;

use anyhow::{Result, bail};
use tracing::error;
use wxlookup_core::{FileFormat, OutputTarget, Sink, WeatherProvider};

use crate::{
    input::{CityInput, parse_city_input},
    prompt::{MenuChoice, Prompter},
};

const WELCOME: &str = "Welcome to wxlookup!\n\
    Fetch the current weather and local time for any city, and print it\n\
    to the terminal or save it as CSV or JSON.";
const GOODBYE: &str = "Exiting the application. Goodbye!";

pub enum State {
    SelectingOutput,
    AwaitingCity(Box<dyn Sink>),
    Done,
}

impl std::fmt::Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            State::SelectingOutput => f.write_str("SelectingOutput"),
            State::AwaitingCity(sink) => f.debug_tuple("AwaitingCity").field(sink).finish(),
            State::Done => f.write_str("Done"),
        }
    }
}

pub struct Session<'a, P, W> {
    provider: &'a dyn WeatherProvider,
    prompter: P,
    out: W,
}

impl<'a, P: Prompter, W: Write> Session<'a, P, W> {
    pub fn new(provider: &'a dyn WeatherProvider, prompter: P, out: W) -> Self {
        Self { provider, prompter, out }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.out
    }

    /// Run until the operator exits.
    pub async fn run(&mut self) -> Result<()> {
        writeln!(self.out, "{WELCOME}")?;

        let mut state = State::SelectingOutput;
        while !matches!(state, State::Done) {
            state = self.step(state).await?;
        }

        Ok(())
    }

    pub async fn step(&mut self, state: State) -> Result<State> {
        match state {
            State::SelectingOutput => self.select_output(),
            State::AwaitingCity(sink) => self.await_city(sink).await,
            State::Done => Ok(State::Done),
        }
    }

    fn select_output(&mut self) -> Result<State> {
        let target = match self.prompter.select_output()? {
            MenuChoice::Console => OutputTarget::Console,
            MenuChoice::Csv => self.file_target(FileFormat::Csv)?,
            MenuChoice::Json => self.file_target(FileFormat::Json)?,
            MenuChoice::Exit => {
                writeln!(self.out, "{GOODBYE}")?;
                return Ok(State::Done);
            }
        };

        Ok(State::AwaitingCity(target.into_sink()))
    }

    fn file_target(&mut self, format: FileFormat) -> Result<OutputTarget> {
        let name = self.prompter.filename(format)?;
        let (target, notice) = OutputTarget::file(&name, format);
        if let Some(notice) = notice {
            writeln!(self.out, "{notice}")?;
        }
        Ok(target)
    }

    async fn await_city(&mut self, mut sink: Box<dyn Sink>) -> Result<State> {
        let raw = self.prompter.city()?;

        match parse_city_input(&raw) {
            Ok(CityInput::Empty) => {
                writeln!(self.out, "City name cannot be empty. Please try again.")?;
            }
            Ok(CityInput::Exit) => {
                writeln!(self.out, "{GOODBYE}")?;
                return Ok(State::Done);
            }
            Ok(CityInput::Return) => return Ok(State::SelectingOutput),
            Ok(CityInput::Lookup(query)) => self.lookup(&query, sink.as_mut()).await?,
            Err(e) => writeln!(self.out, "{e}")?,
        }

        Ok(State::AwaitingCity(sink))
    }

    /// Fetch and render one city; failures are reported and swallowed.
    async fn lookup(&mut self, query: &str, sink: &mut dyn Sink) -> Result<()> {
        let record = match self.provider.get_weather(query).await {
            Ok(record) => record,
            Err(e) => {
                error!(city = query, error = %e, "weather lookup failed");
                writeln!(self.out, "{e}")?;
                return Ok(());
            }
        };

        match sink.render(&record) {
            Ok(()) => {
                if let Some(path) = sink.path() {
                    writeln!(self.out, "Data saved to {}", path.display())?;
                }
            }
            Err(e) => {
                error!(error = %e, "failed to render weather record");
                writeln!(self.out, "{e}")?;
            }
        }

        Ok(())
    }
}

/// One-shot lookup used by `wxlookup show`.
pub async fn lookup_once(
    provider: &dyn WeatherProvider,
    city: &str,
    target: OutputTarget,
    out: &mut impl Write,
) -> Result<()> {
    let query = match parse_city_input(city)? {
        CityInput::Lookup(query) => query,
        CityInput::Empty => bail!("City name cannot be empty."),
        CityInput::Exit | CityInput::Return => bail!("'{}' is not a city name.", city.trim()),
    };

    let record = provider.get_weather(&query).await?;

    let mut sink = target.into_sink();
    sink.render(&record)?;
    if let Some(path) = sink.path() {
        writeln!(out, "Data saved to {}", path.display())?;
    }

    Ok(())
}
