use std::io;

use chrono::Local;
use fern::Dispatch;
use log::LevelFilter;

pub const LOG_ENV: &str = "DESDEC_LOG";

/// Maps a `DESDEC_LOG` value to a level, defaulting to `Info`.
pub fn parse_level(value: Option<&str>) -> LevelFilter {
    match value.map(str::trim) {
        Some("trace") => LevelFilter::Trace,
        Some("debug") => LevelFilter::Debug,
        Some("info") => LevelFilter::Info,
        Some("warn") => LevelFilter::Warn,
        Some("error") => LevelFilter::Error,
        Some("off") => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

pub fn logging_level() -> LevelFilter {
    parse_level(std::env::var(LOG_ENV).ok().as_deref())
}

/// Routes `log` records to stdout. `verbose` forces at least `Debug`.
pub fn setup_logger(verbose: bool) {
    let mut level_filter = logging_level();
    if verbose && level_filter < LevelFilter::Debug {
        level_filter = LevelFilter::Debug;
    }

    if let Err(e) = Dispatch::new()
        .format(move |out, message, record| {
            if level_filter >= LevelFilter::Debug {
                out.finish(format_args!(
                    "[{}][{}]: {} <{}:{}>",
                    Local::now().format("%b-%d-%Y %H:%M:%S%.3f"),
                    record.level(),
                    message,
                    record.file().unwrap_or("unknown_file"),
                    record.line().unwrap_or(0),
                ));
            } else {
                out.finish(format_args!("[{}]: {}", record.level(), message));
            }
        })
        .level(level_filter)
        .chain(io::stdout())
        .apply()
    {
        eprintln!("Logger initialization failed: {e}");
    }
    log::debug!("Enabled log {level_filter}.");
}
