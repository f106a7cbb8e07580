//! Process-wide logger setup
//!
//! Console output always; with a save path the same events are also written to
//! a freshly truncated file. Only the first call in a process takes effect.

use std::fs::{self, File};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Mutex;

use tracing::{info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::error::{Error, Result};

/// Set once a subscriber is installed; held across the whole init sequence
static INITIALIZED: Mutex<bool> = Mutex::new(false);

/// Initialize logging at INFO level
///
/// See [`init_logger_with_level`].
pub fn init_logger(save_path: Option<&Path>) -> Result<()> {
    init_logger_with_level(save_path, Level::INFO)
}

/// Initialize logging at the given default level
///
/// `RUST_LOG` overrides the level when set. If `save_path` is given its parent
/// directory is created as needed and the file is truncated. A second call
/// returns [`Error::LoggerAlreadyInitialized`] without touching any file.
pub fn init_logger_with_level(save_path: Option<&Path>, level: Level) -> Result<()> {
    let mut initialized = INITIALIZED.lock().unwrap_or_else(|e| e.into_inner());
    if *initialized {
        return Err(Error::LoggerAlreadyInitialized);
    }

    let file = save_path.map(open_log_file).transpose()?;

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();
    let console = fmt::layer()
        .with_target(true)
        .with_ansi(std::io::stdout().is_terminal());
    let file_layer = file.map(|f| {
        fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(Mutex::new(f))
    });

    Registry::default()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|_| Error::LoggerAlreadyInitialized)?;
    *initialized = true;
    drop(initialized);

    info!("Init logger done!");
    Ok(())
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(File::create(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_log_file_creates_parents_and_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("run.log");

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "stale").unwrap();
        drop(open_log_file(&path).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");

        let fresh = dir.path().join("a").join("b.log");
        open_log_file(&fresh).unwrap();
        assert!(fresh.exists());
    }
}
