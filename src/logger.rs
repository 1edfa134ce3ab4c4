//! Simple logger that can write to stderr or a file.
//!
//! Installed as the `log` backend so the library crates can use the
//! standard macros.

use crate::parse_args::Verbosity;
use log::{LevelFilter, Log, Metadata, Record};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::sync::Mutex;

/// Output destination for logger
enum Output {
    Stderr,
    File(BufWriter<File>),
}

/// Thread-safe logger
pub struct Logger {
    output: Mutex<Output>,
    verbosity: Verbosity,
}

impl Logger {
    /// Create a new logger writing to stderr
    pub fn stderr(verbosity: Verbosity) -> Self {
        Logger {
            output: Mutex::new(Output::Stderr),
            verbosity,
        }
    }

    /// Create a new logger writing to a file
    pub fn file(path: &str, verbosity: Verbosity) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Logger {
            output: Mutex::new(Output::File(BufWriter::new(file))),
            verbosity,
        })
    }

    pub fn level_filter(&self) -> LevelFilter {
        match self.verbosity {
            Verbosity::Quiet => LevelFilter::Info,
            Verbosity::Verbose => LevelFilter::Debug,
            Verbosity::Trace => LevelFilter::Trace,
        }
    }

    /// Make this the global `log` backend
    pub fn install(self) -> Result<(), log::SetLoggerError> {
        let filter = self.level_filter();
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(filter);
        Ok(())
    }

    fn write_line(&self, line: &str) {
        if let Ok(mut output) = self.output.lock() {
            match &mut *output {
                Output::Stderr => {
                    eprintln!("{}", line);
                }
                Output::File(f) => {
                    let _ = writeln!(f, "{}", line);
                    let _ = f.flush();
                }
            }
        }
    }
}

fn format_record(record: &Record) -> String {
    let thread = std::thread::current();
    format!(
        "[{:<5}] [{}] {}",
        record.level(),
        thread.name().unwrap_or("?"),
        record.args()
    )
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level_filter()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.write_line(&format_record(record));
        }
    }

    fn flush(&self) {
        if let Ok(mut output) = self.output.lock() {
            if let Output::File(f) = &mut *output {
                let _ = f.flush();
            }
        }
    }
}
