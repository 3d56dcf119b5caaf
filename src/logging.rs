use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use tracing::{debug, Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{self, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "debug,tiberius=info";
/// Filter used when `RUST_LOG` is unset and verbose output was requested.
pub const VERBOSE_FILTER: &str = "trace";

/// Renders events as `<dd-Mon-yy HH:MM:SS> | <LEVEL> | FUNCTION: <name> | Msgs: <message>`.
///
/// `<name>` is the innermost span, which for `#[tracing::instrument]`ed
/// functions is the function name; events outside any span fall back to the
/// last segment of their target.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditLogFormat;

impl<S, N> FormatEvent<S, N> for AuditLogFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let mut message = String::new();
        ctx.format_fields(Writer::new(&mut message), event)?;

        let level = match *event.metadata().level() {
            Level::TRACE => "TRACE",
            Level::DEBUG => "DEBUG",
            Level::INFO => "INFO",
            Level::WARN => "WARNING",
            Level::ERROR => "ERROR",
        };

        let function = match ctx.lookup_current() {
            Some(span) => span.name().to_string(),
            None => target_leaf(event.metadata().target()).to_string(),
        };

        writeln!(
            writer,
            "{} | {level} | FUNCTION: {function} | Msgs: {message}",
            Local::now().format("%d-%b-%y %H:%M:%S")
        )
    }
}

fn target_leaf(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

/// Name of today's log file, e.g. `2024-05-01_sde_editors.log`.
pub fn log_file_name() -> String {
    format!("{}_sde_editors.log", Local::now().format("%Y-%m-%d"))
}

/// Install the console (stderr) and daily-file sinks.
///
/// Appends to the day's file in `log_dir`, creating the directory if needed.
/// Returns the log file path. Installing twice keeps the first subscriber.
pub fn init(log_dir: &Path, verbose: bool) -> Result<PathBuf> {
    std::fs::create_dir_all(log_dir).map_err(|source| Error::Write {
        path: log_dir.to_path_buf(),
        source,
    })?;
    let path = log_dir.join(log_file_name());
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| Error::Write {
            path: path.clone(),
            source,
        })?;

    let default_filter = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .event_format(AuditLogFormat)
                .with_writer(std::io::stderr),
        )
        .with(
            fmt::layer()
                .event_format(AuditLogFormat)
                .with_writer(Mutex::new(file)),
        )
        .try_init();
    if installed.is_err() {
        debug!("A tracing subscriber is already installed");
    }

    Ok(path)
}
