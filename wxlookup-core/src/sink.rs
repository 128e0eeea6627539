//! Output sinks for finished weather records.
//!
//! Every sink consumes one [`WeatherRecord`] per call. File-backed sinks
//! rewrite their destination from scratch each time, so a file only ever
//! holds the most recent record.

use std::{
    fmt,
    fs::File,
    io::{self, BufWriter, Stdout, Write},
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use thiserror::Error;
use tracing::info;

use crate::WeatherRecord;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("Failed to write console output: {0}")]
    Console(#[source] io::Error),
}

impl SinkError {
    fn write(path: &Path, source: impl Into<io::Error>) -> Self {
        SinkError::Write { path: path.to_path_buf(), source: source.into() }
    }
}

pub trait Sink: fmt::Debug {
    fn render(&mut self, record: &WeatherRecord) -> Result<(), SinkError>;

    /// Destination file, if this sink writes one.
    fn path(&self) -> Option<&Path> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Csv,
    Json,
}

impl FileFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Csv => ".csv",
            FileFormat::Json => ".json",
        }
    }

    pub fn default_filename(&self) -> &'static str {
        match self {
            FileFormat::Csv => "weather_data.csv",
            FileFormat::Json => "weather_data.json",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileFormat::Csv => "CSV",
            FileFormat::Json => "JSON",
        })
    }
}

/// Where a session sends its records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Console,
    File { path: PathBuf, format: FileFormat },
}

impl OutputTarget {
    /// File target with the filename normalized to `format`'s extension.
    pub fn file(name: &str, format: FileFormat) -> (Self, Option<String>) {
        let normalized = normalize_extension(name, format);
        let target = OutputTarget::File { path: PathBuf::from(normalized.filename), format };
        (target, normalized.notice)
    }

    pub fn into_sink(self) -> Box<dyn Sink> {
        match self {
            OutputTarget::Console => Box::new(ConsoleSink::stdout()),
            OutputTarget::File { path, format: FileFormat::Csv } => Box::new(CsvSink::new(path)),
            OutputTarget::File { path, format: FileFormat::Json } => Box::new(JsonSink::new(path)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub filename: String,
    /// Set when the name had to be changed.
    pub notice: Option<String>,
}

/// Make sure `name` ends in the extension for `format`.
pub fn normalize_extension(name: &str, format: FileFormat) -> Normalized {
    let expected = format.extension();
    let name = name.trim();

    if name.is_empty() {
        return Normalized { filename: format.default_filename().to_owned(), notice: None };
    }

    if name.ends_with('/') || name.ends_with(std::path::MAIN_SEPARATOR) {
        let filename = Path::new(name)
            .join(format.default_filename())
            .to_string_lossy()
            .into_owned();
        let notice = format!("'{name}' is a directory, saving to '{filename}'.");
        return Normalized { filename, notice: Some(notice) };
    }

    let path = Path::new(name);
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case(&expected[1..]) => {
            Normalized { filename: name.to_owned(), notice: None }
        }
        Some(ext) => {
            let filename = path.with_extension(&expected[1..]).to_string_lossy().into_owned();
            let notice = format!(
                "Extension '.{ext}' replaced with '{expected}', saving to '{filename}'."
            );
            Normalized { filename, notice: Some(notice) }
        }
        None => {
            let filename = format!("{name}{expected}");
            let notice = format!("Added missing '{expected}' extension, saving to '{filename}'.");
            Normalized { filename, notice: Some(notice) }
        }
    }
}

/// Multi-line block shown on a terminal.
pub fn console_text(record: &WeatherRecord) -> String {
    format!(
        "Weather Data:\n    \
         Location: {}\n    \
         Temperature: {}°C\n    \
         Humidity: {}%\n    \
         Condition: {}\n    \
         Local Time: {}\n    \
         {}\n",
        record.city,
        record.temperature,
        record.humidity,
        record.condition,
        record.local_time,
        "-".repeat(20),
    )
}

/// Writes [`console_text`] to a terminal.
#[derive(Debug)]
pub struct ConsoleSink<W: Write = Stdout> {
    out: W,
}

impl ConsoleSink<Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + fmt::Debug> Sink for ConsoleSink<W> {
    fn render(&mut self, record: &WeatherRecord) -> Result<(), SinkError> {
        self.out
            .write_all(console_text(record).as_bytes())
            .and_then(|_| self.out.flush())
            .map_err(SinkError::Console)
    }
}

/// Header row plus one data row.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Sink for CsvSink {
    fn render(&mut self, record: &WeatherRecord) -> Result<(), SinkError> {
        // from_path truncates; the header comes from the record's field names.
        let mut writer =
            csv::Writer::from_path(&self.path).map_err(|e| SinkError::write(&self.path, e))?;
        writer.serialize(record).map_err(|e| SinkError::write(&self.path, e))?;
        writer.flush().map_err(|e| SinkError::write(&self.path, e))?;

        info!(path = %self.path.display(), "wrote CSV record");
        Ok(())
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// One pretty-printed JSON object with 4-space indentation.
#[derive(Debug, Clone)]
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Sink for JsonSink {
    fn render(&mut self, record: &WeatherRecord) -> Result<(), SinkError> {
        let file = File::create(&self.path).map_err(|e| SinkError::write(&self.path, e))?;
        let mut out = BufWriter::new(file);

        let mut ser =
            serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
        record.serialize(&mut ser).map_err(|e| SinkError::write(&self.path, e))?;
        out.flush().map_err(|e| SinkError::write(&self.path, e))?;

        info!(path = %self.path.display(), "wrote JSON record");
        Ok(())
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}
