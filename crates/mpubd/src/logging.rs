//! Logging setup.
//!
//! Output goes to stderr by default, or to syslog / an append-only file when
//! `--log` is given. The log file is reopened after rotation. Everything is synchronous so the subscriber can be
//! installed before the process forks into the background.

use std::env;
use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use syslog_tracing::{Facility, Options, Syslog};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Crates whose events are shown at the chosen level.
const LOG_TARGETS: &[&str] = &["mdns_publish_cname", "mpubd", "mpub_avahi", "mpub_core"];

// ============================================================================
// Log Target
// ============================================================================

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    Syslog,
    File(PathBuf),
}

impl LogTarget {
    /// Interprets the `--log` argument.
    ///
    /// `syslog` and `/dev/log` (any case) select syslog. Anything else is a
    /// file path, made absolute against the current directory so it still
    /// points at the same place after daemonizing changes directory.
    pub fn from_arg(arg: Option<&str>) -> io::Result<Self> {
        let Some(value) = arg else {
            return Ok(Self::Stderr);
        };

        if value.eq_ignore_ascii_case("syslog") || value.eq_ignore_ascii_case("/dev/log") {
            return Ok(Self::Syslog);
        }

        let path = PathBuf::from(value);
        if path.is_absolute() {
            Ok(Self::File(path))
        } else {
            Ok(Self::File(env::current_dir()?.join(path)))
        }
    }
}

// ============================================================================
// Subscriber Setup
// ============================================================================

/// Builds the filter: `info` (or `debug` when verbose) for this project's
/// crates, refined by `RUST_LOG`.
pub fn build_filter(verbose: bool) -> Result<EnvFilter> {
    let level = if verbose { "debug" } else { "info" };
    let mut filter = EnvFilter::from_default_env();
    for target in LOG_TARGETS {
        filter = filter.add_directive(format!("{target}={level}").parse()?);
    }
    Ok(filter)
}

/// Installs the global subscriber.
///
/// `ident` is the program name reported to syslog. `daemon` selects the
/// `LOG_DAEMON` facility instead of `LOG_USER`.
pub fn init_logging(target: &LogTarget, verbose: bool, ident: &str, daemon: bool) -> Result<()> {
    let filter = build_filter(verbose)?;

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .with_target(false)
                .init();
        }
        LogTarget::File(path) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(WatchedFile::open(path)?)
                .with_ansi(false)
                .init();
        }
        LogTarget::Syslog => {
            let facility = if daemon {
                Facility::Daemon
            } else {
                Facility::User
            };
            let ident = CString::new(ident.replace('\0', ""))
                .context("Invalid syslog identity")?;
            let syslog = Syslog::new(ident, Options::LOG_PID, facility)
                .context("Syslog is already initialized")?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(syslog)
                .with_ansi(false)
                .with_target(false)
                .without_time()
                .init();
        }
    }

    Ok(())
}

/// Opens `path` for appending, creating it if needed.
pub fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

// ============================================================================
// Log File
// ============================================================================

/// A log file that is reopened when it is moved or deleted underneath us,
/// so external log rotation keeps working.
pub struct WatchedFile {
    path: PathBuf,
    current: Mutex<OpenFile>,
}

struct OpenFile {
    file: File,
    id: Option<(u64, u64)>,
}

impl WatchedFile {
    pub fn open(path: &Path) -> Result<Self> {
        let file = open_log_file(path)?;
        let id = file_id(&file);
        Ok(Self {
            path: path.to_path_buf(),
            current: Mutex::new(OpenFile { file, id }),
        })
    }

    fn reopen_if_rotated(&self, current: &mut OpenFile) {
        let on_disk = std::fs::metadata(&self.path).ok().map(|m| (m.dev(), m.ino()));
        if on_disk.is_some() && on_disk == current.id {
            return;
        }
        // Keep writing to the old handle if the path can't be reopened.
        if let Ok(file) = open_log_file(&self.path) {
            current.id = file_id(&file);
            current.file = file;
        }
    }
}

impl<'a> MakeWriter<'a> for WatchedFile {
    type Writer = WatchedFileWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        self.reopen_if_rotated(&mut current);
        WatchedFileWriter { current }
    }
}

/// Writes one event to the current log file.
pub struct WatchedFileWriter<'a> {
    current: MutexGuard<'a, OpenFile>,
}

impl Write for WatchedFileWriter<'_> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.current.file.write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.current.file.flush()
    }
}

fn file_id(file: &File) -> Option<(u64, u64)> {
    file.metadata().ok().map(|m| (m.dev(), m.ino()))
}
