use std::{
    env,
    fmt,
    io::{stderr, IsTerminal, Write},
    sync::{Arc, Mutex, PoisonError},
};

use anyhow::Result;
use log::{Level, LevelFilter, Metadata, Record};
use termcolor::{BufferedStandardStream, Color, ColorChoice, ColorSpec, WriteColor};
use time::{macros::format_description, OffsetDateTime};

/// Logger for log:: messages. Messages go to stderr, stdout being used for
/// events and command replies.
pub struct Logger {
    /// Max level the logger will output.
    max_level: LevelFilter,
    inner: Mutex<LoggerWriter>,
}

struct LoggerWriter {
    stderr: BufferedStandardStream,
    use_colors: bool,
}

impl Logger {
    /// Install the logger as the global log:: backend.
    pub fn init(max_level: LevelFilter) -> Result<Arc<Self>> {
        let use_colors = Self::check_color_use();
        let logger = Arc::new(Logger {
            max_level,
            inner: Mutex::new(LoggerWriter {
                stderr: BufferedStandardStream::stderr(if use_colors {
                    ColorChoice::Auto
                } else {
                    ColorChoice::Never
                }),
                use_colors,
            }),
        });

        log::set_max_level(max_level);
        log::set_boxed_logger(Box::new(Arc::clone(&logger)))?;

        Ok(logger)
    }

    /// Write a single log line. The time is shown when debug! messages are
    /// enabled; the level is shown for error! and warn!, or when debug!
    /// messages are enabled.
    fn write_line<W: WriteColor>(
        out: &mut W,
        max_level: LevelFilter,
        use_colors: bool,
        level: Level,
        args: &fmt::Arguments,
    ) -> Result<()> {
        let verbose = max_level >= LevelFilter::Debug;

        if verbose {
            OffsetDateTime::now_utc().format_into(
                out,
                format_description!("[hour]:[minute]:[second].[subsecond digits:6] "),
            )?;
        }

        if level <= Level::Warn || verbose {
            let color = match level {
                Level::Error => Color::Red,
                Level::Warn => Color::Yellow,
                Level::Info => Color::Blue,
                Level::Debug => Color::Cyan,
                Level::Trace => Color::White,
            };
            if use_colors {
                out.set_color(ColorSpec::new().set_fg(Some(color)))?;
            }
            write!(out, "{level:5} ")?;
            if use_colors {
                out.reset()?;
            }
        }

        writeln!(out, "{args}")?;
        Ok(out.flush()?)
    }

    fn check_color_use() -> bool {
        stderr().is_terminal() && matches!(env::var("TERM"), Ok(term) if term != "dumb")
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let inner = &mut *self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        // Nowhere to report a failure to.
        let _ = Self::write_line(
            &mut inner.stderr,
            self.max_level,
            inner.use_colors,
            record.level(),
            record.args(),
        );
    }

    fn flush(&self) {
        let _ = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stderr
            .flush();
    }
}
