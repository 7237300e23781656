//! ## ntask-telemetry::logging
//! **Switchable log device behind a `tracing` subscriber**
//!
//! The subscriber is installed once per process, but the device it writes to
//! is chosen by configuration and may change: the registry opens the
//! configured device at init and falls back to stderr at release. A
//! `LogRouter` is the `MakeWriter` that makes this possible; every clone
//! shares the same target.

use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt as subscriber_fmt, EnvFilter};

/// Log destination selected by the `log.device` setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDevice {
    Stdout,
    Stderr,
    File(PathBuf),
}

impl LogDevice {
    pub fn parse(device: &str) -> Self {
        match device.trim() {
            "stdout" => LogDevice::Stdout,
            "stderr" => LogDevice::Stderr,
            path => LogDevice::File(PathBuf::from(path)),
        }
    }

    pub fn is_standard(&self) -> bool {
        !matches!(self, LogDevice::File(_))
    }
}

impl fmt::Display for LogDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogDevice::Stdout => f.write_str("stdout"),
            LogDevice::Stderr => f.write_str("stderr"),
            LogDevice::File(path) => write!(f, "{}", path.display()),
        }
    }
}

enum Target {
    Stdout,
    Stderr,
    File { path: PathBuf, file: File },
}

/// Shared, retargetable log sink.
#[derive(Clone)]
pub struct LogRouter {
    target: Arc<Mutex<Target>>,
}

impl LogRouter {
    /// New router writing to stderr.
    pub fn new() -> Self {
        Self {
            target: Arc::new(Mutex::new(Target::Stderr)),
        }
    }

    /// Points the router at `device`. A file device is created or truncated.
    pub fn open(&self, device: &LogDevice) -> io::Result<()> {
        let next = match device {
            LogDevice::Stdout => Target::Stdout,
            LogDevice::Stderr => Target::Stderr,
            LogDevice::File(path) => Target::File {
                path: path.clone(),
                file: File::create(path)?,
            },
        };
        *self.target.lock() = next;
        info!(device = %device, "log device selected");
        Ok(())
    }

    /// Returns to stderr, closing a file device if one is open.
    ///
    /// Returns `true` when a file was closed. The router is back on stderr
    /// even when flushing the file fails.
    pub fn reset(&self) -> io::Result<bool> {
        let previous = std::mem::replace(&mut *self.target.lock(), Target::Stderr);
        match previous {
            Target::File { mut file, .. } => {
                file.flush()?;
                file.sync_all()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn device(&self) -> LogDevice {
        match &*self.target.lock() {
            Target::Stdout => LogDevice::Stdout,
            Target::Stderr => LogDevice::Stderr,
            Target::File { path, .. } => LogDevice::File(path.clone()),
        }
    }
}

impl Default for LogRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LogRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogRouter")
            .field("device", &self.device())
            .finish()
    }
}

/// Writer handed to the subscriber for one event.
pub struct RouterWriter {
    target: Arc<Mutex<Target>>,
}

impl Write for RouterWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut *self.target.lock() {
            Target::Stdout => io::stdout().write(buf),
            Target::Stderr => io::stderr().write(buf),
            Target::File { file, .. } => file.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut *self.target.lock() {
            Target::Stdout => io::stdout().flush(),
            Target::Stderr => io::stderr().flush(),
            Target::File { file, .. } => file.flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for LogRouter {
    type Writer = RouterWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RouterWriter {
            target: Arc::clone(&self.target),
        }
    }
}

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the process-wide fmt subscriber writing through `router`.
    ///
    /// `RUST_LOG` wins over `default_level`. Returns `false` when a global
    /// subscriber was already installed.
    pub fn init(router: LogRouter, default_level: &str) -> bool {
        subscriber_fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new(default_level)),
            )
            .with_thread_names(true)
            .with_ansi(false)
            .with_writer(router)
            .try_init()
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_device_parsing() {
        assert_eq!(LogDevice::parse("stdout"), LogDevice::Stdout);
        assert_eq!(LogDevice::parse(" stderr "), LogDevice::Stderr);
        assert_eq!(
            LogDevice::parse("/tmp/task.log"),
            LogDevice::File(PathBuf::from("/tmp/task.log"))
        );
        assert!(!LogDevice::parse("task.log").is_standard());
    }

    #[test]
    fn test_file_device_receives_writes_until_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("native.log");
        let router = LogRouter::new();

        router.open(&LogDevice::File(path.clone())).unwrap();
        assert_eq!(router.device(), LogDevice::File(path.clone()));
        router.make_writer().write_all(b"first line\n").unwrap();

        assert!(router.reset().unwrap());
        assert_eq!(router.device(), LogDevice::Stderr);
        assert!(!router.reset().unwrap());

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first line\n");
    }

    #[test]
    fn test_unopenable_file_keeps_previous_target() {
        let router = LogRouter::new();
        router.open(&LogDevice::Stdout).unwrap();
        let err = router.open(&LogDevice::File(PathBuf::from("/nonexistent/dir/native.log")));
        assert!(err.is_err());
        assert_eq!(router.device(), LogDevice::Stdout);
    }

    #[traced_test]
    #[test]
    fn test_open_is_logged() {
        let router = LogRouter::new();
        router.open(&LogDevice::Stderr).unwrap();
        assert!(logs_contain("log device selected"));
    }
}
