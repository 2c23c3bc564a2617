//! Session logger: the `log` backend installed by the `canvas-engine` binary.
//!
//! One file per session, **truncated at each launch** so it only ever holds
//! the most recent run. Default location:
//!   Windows:  `%APPDATA%\canvas-engine\session.log`
//!   Linux:    `~/.local/share/canvas-engine/session.log`
//!   macOS:    `~/Library/Application Support/canvas-engine/session.log`
//!
//! Library code never touches this module; it logs through the `log` macros
//! and whichever backend the host installed receives the records.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{Level, LevelFilter, Log, Metadata, Record};

static LOGGER: OnceLock<SessionLogger> = OnceLock::new();

struct SessionLogger {
    file: Option<Mutex<File>>,
    path: Option<PathBuf>,
    echo: bool,
}

impl Log for SessionLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(&timestamp(), record.level(), &record.args().to_string());
        self.write_line(&line);
        // warnings and errors always reach stderr
        if self.echo || record.level() <= Level::Warn {
            eprintln!("{}", line);
        }
    }

    fn flush(&self) {
        if let Some(mutex) = &self.file
            && let Ok(mut file) = mutex.lock()
        {
            let _ = file.flush();
        }
    }
}

impl SessionLogger {
    /// Silently ignores I/O errors so that logging never takes the run down.
    fn write_line(&self, line: &str) {
        if let Some(mutex) = &self.file
            && let Ok(mut file) = mutex.lock()
        {
            let _ = writeln!(file, "{}", line);
        }
    }
}

/// Path of the current session log, if one could be opened.
pub fn log_path() -> Option<&'static Path> {
    LOGGER.get().and_then(|l| l.path.as_deref())
}

/// Install the session logger. Safe to call more than once; only the first
/// call has any effect.
///
/// * `path` overrides the default log location.
/// * `verbose` lowers the level filter to `Debug` and echoes every line to
///   stderr (warnings and errors are always echoed).
/// * A panic hook mirrors panic messages into the log before the default
///   handler runs.
pub fn init(path: Option<&Path>, verbose: bool) {
    if LOGGER.get().is_some() {
        return;
    }

    let path = path.map(Path::to_path_buf).unwrap_or_else(default_log_path);
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&path);

    let logger = match file {
        Ok(f) => SessionLogger {
            file: Some(Mutex::new(f)),
            path: Some(path.clone()),
            echo: verbose,
        },
        Err(e) => {
            // Not fatal: records still reach stderr.
            eprintln!("[logger] failed to open log file {:?}: {}", path, e);
            SessionLogger {
                file: None,
                path: None,
                echo: verbose,
            }
        }
    };

    let logger = LOGGER.get_or_init(|| logger);
    if log::set_logger(logger).is_err() {
        return;
    }
    log::set_max_level(if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });

    logger.write_line(&format!(
        "=== canvas-engine session started (unix {}) ===",
        unix_seconds().unwrap_or(0)
    ));
    if let Some(p) = &logger.path {
        logger.write_line(&format!("Log file: {}", p.display()));
    }
    logger.write_line("");

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if let Some(l) = LOGGER.get() {
            l.write_line(&format_line(&timestamp(), "PANIC", &info.to_string()));
            l.flush();
        }
        prev(info);
    }));
}

fn format_line(ts: &str, level: impl std::fmt::Display, msg: &str) -> String {
    format!("[{}] [{}] {}", ts, level, msg)
}

fn default_log_path() -> PathBuf {
    data_dir().join("canvas-engine").join("session.log")
}

/// Platform data directory (without the app sub-folder).
pub fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata);
        }
    }
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support");
        }
    }
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from(".")
}

fn unix_seconds() -> Option<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| d.as_secs())
}

/// `HH:MM:SS` within the current UTC day.
fn timestamp() -> String {
    match unix_seconds() {
        Some(secs) => clock(secs),
        None => "??:??:??".to_string(),
    }
}

fn clock(secs: u64) -> String {
    let h = (secs % 86400) / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    format!("{:02}:{:02}:{:02}", h, m, s)
}
