//! Leveled logger
//!
//! Formats a message once per sink and dispatches it to a date-stamped log
//! file (`<dir>/twlc_YYYYMMDD.log`) and/or the console.

use chrono::{DateTime, Local, NaiveDate};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, PoisonError};
use tracing::debug;

use crate::config::LoggerConfig;
use crate::error::{LogError, exit_fatal};
use crate::severity::{Palette, Severity, colorize};

/// File name prefix of every log file.
pub const LOG_FILE_PREFIX: &str = "twlc_";

const FILE_DATE_FORMAT: &str = "%Y%m%d";
const LINE_TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S ";

static DEFAULT_LOGGER: LazyLock<Logger> =
    LazyLock::new(|| Logger::beside_executable().unwrap_or_else(|err| exit_fatal(&err)));

/// The process-wide default logger, created on first use.
///
/// Logs everything, colorized and timestamped, into `<executable dir>/logs/`.
/// The process exits if the executable path or the directory can't be resolved.
pub fn logger() -> &'static Logger {
    &DEFAULT_LOGGER
}

/// A single message on its way to the sinks.
#[derive(Debug, Clone)]
pub struct Record<'a> {
    pub severity: Severity,
    pub message: &'a str,
    pub timestamp: DateTime<Local>,
    /// Source file that produced the message, `???` when unknown.
    pub file: &'static str,
    pub line: u32,
}

impl<'a> Record<'a> {
    /// Stamp `message` with the current local time and the caller's location.
    #[track_caller]
    pub fn new(severity: Severity, message: &'a str) -> Self {
        let caller = Location::caller();
        Self {
            severity,
            message,
            timestamp: Local::now(),
            file: caller.file(),
            line: caller.line(),
        }
    }

    pub fn at(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Console stream a logger writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStream {
    Stdout,
    Stderr,
}

pub struct Logger {
    config: LoggerConfig,
    palette: Palette,
    current_log_file: Mutex<Option<PathBuf>>,
}

impl Logger {
    /// Build a logger, creating its log directory (and parents) if absent.
    pub fn try_new(config: LoggerConfig) -> Result<Self, LogError> {
        ensure_log_dir(&config.log_directory)?;
        Ok(Self {
            config,
            palette: Palette::ANSI,
            current_log_file: Mutex::new(None),
        })
    }

    /// Like [`Logger::try_new`], but exits the process if the directory can't be created.
    pub fn new(config: LoggerConfig) -> Self {
        Self::try_new(config).unwrap_or_else(|err| exit_fatal(&err))
    }

    /// Logger with every flag on, writing into `<executable dir>/logs/`.
    pub fn beside_executable() -> Result<Self, LogError> {
        Self::try_new(LoggerConfig::beside_executable()?)
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// Log file that receives messages written on `date`.
    pub fn log_file_path(&self, date: NaiveDate) -> PathBuf {
        let name = format!("{LOG_FILE_PREFIX}{}.log", date.format(FILE_DATE_FORMAT));
        self.config.log_directory.join(name)
    }

    /// Path resolved by the most recent write to the file sink, if any.
    pub fn current_log_file_path(&self) -> Option<PathBuf> {
        self.current_log_file
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Timestamped console lines go to stderr, plain ones to stdout.
    pub fn console_stream(&self) -> ConsoleStream {
        if self.config.include_timestamp {
            ConsoleStream::Stderr
        } else {
            ConsoleStream::Stdout
        }
    }

    /// Write to the enabled sinks.
    ///
    /// Exits the process if the log file can't be created or opened; other
    /// sink failures are reported on stderr.
    #[track_caller]
    pub fn write(&self, severity: Severity, message: &str) {
        settle(self.try_write(severity, message));
    }

    /// Write to the enabled sinks, returning the first I/O failure.
    #[track_caller]
    pub fn try_write(&self, severity: Severity, message: &str) -> Result<(), LogError> {
        self.write_record(&Record::new(severity, message))
    }

    /// Dispatch `record` to the file sink and this logger's console stream.
    pub fn write_record(&self, record: &Record<'_>) -> Result<(), LogError> {
        match self.console_stream() {
            ConsoleStream::Stdout => self.try_write_record(record, &mut io::stdout().lock()),
            ConsoleStream::Stderr => self.try_write_record(record, &mut io::stderr().lock()),
        }
    }

    /// Dispatch `record` to the file sink and then to `console`.
    ///
    /// A fatal file failure returns before anything reaches the console. A
    /// failed append still lets the console write go ahead; the first error
    /// is returned.
    pub fn try_write_record(
        &self,
        record: &Record<'_>,
        console: &mut dyn Write,
    ) -> Result<(), LogError> {
        let mut file_result = Ok(());
        if self.config.persist_to_file {
            if let Err(err) = self.append_to_file(record) {
                if err.is_fatal() {
                    return Err(err);
                }
                file_result = Err(err);
            }
        }

        if !self.config.print_to_console {
            return file_result;
        }

        let (tag, message) = if self.config.colorize {
            colorize(
                &self.palette,
                record.severity,
                record.message,
                self.config.colorize_foreground,
                self.config.colorize_background,
            )
        } else {
            (record.severity.as_str().to_string(), record.message.to_string())
        };

        let line = if self.config.include_timestamp {
            format!("{}[{tag}] {message}\n", record.timestamp.format(LINE_TIMESTAMP_FORMAT))
        } else {
            format!("[{tag}] {message}\n")
        };
        let console_result = console
            .write_all(line.as_bytes())
            .and_then(|()| console.flush())
            .map_err(LogError::Console);
        file_result.and(console_result)
    }

    fn append_to_file(&self, record: &Record<'_>) -> Result<(), LogError> {
        // Recomputed per write so output rolls over at the date boundary.
        let path = self.log_file_path(record.timestamp.date_naive());
        *self
            .current_log_file
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(path.clone());

        create_if_missing(&path)?;

        let mut file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(|source| LogError::OpenFile { path: path.clone(), source })?;

        file.write_all(self.file_line(record).as_bytes())
            .map_err(|source| LogError::WriteFile { path, source })
    }

    fn file_line(&self, record: &Record<'_>) -> String {
        let mut line = record.timestamp.format(LINE_TIMESTAMP_FORMAT).to_string();
        if self.config.include_timestamp {
            let file = Path::new(record.file)
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or(record.file);
            line.push_str(&format!("{file}:{}: ", record.line));
        }
        line.push_str(&format!("[{}] {}\n", record.severity, record.message));
        line
    }

    #[track_caller]
    pub fn error(&self, message: &str) {
        self.write(Severity::Error, message);
    }

    #[track_caller]
    pub fn warning(&self, message: &str) {
        self.write(Severity::Warning, message);
    }

    #[track_caller]
    pub fn info(&self, message: &str) {
        self.write(Severity::Info, message);
    }

    #[track_caller]
    pub fn success(&self, message: &str) {
        self.write(Severity::Success, message);
    }

    #[track_caller]
    pub fn debug(&self, message: &str) {
        self.write(Severity::Debug, message);
    }

    #[track_caller]
    pub fn trace(&self, message: &str) {
        self.write(Severity::Trace, message);
    }
}

/// Exit on fatal errors, report the rest on stderr.
fn settle(result: Result<(), LogError>) {
    if let Err(err) = result {
        if err.is_fatal() {
            exit_fatal(&err);
        }
        eprintln!("twlc: {err}");
    }
}

fn ensure_log_dir(dir: &Path) -> Result<(), LogError> {
    if dir.is_dir() {
        debug!(dir = %dir.display(), "Using existing log directory");
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|source| LogError::CreateDirectory {
        path: dir.to_path_buf(),
        source,
    })?;
    debug!(dir = %dir.display(), "Created log directory");
    Ok(())
}

fn create_if_missing(path: &Path) -> Result<(), LogError> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(source) => Err(LogError::CreateFile {
            path: path.to_path_buf(),
            source,
        }),
    }
}
