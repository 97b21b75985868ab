//! Tracing subscriber setup
//!
//! Console output always; a second, non-blocking file layer when
//! `[logging] file` is configured.

use std::fs::OpenOptions;
use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset
pub fn default_filter(level: &str) -> String {
    format!("lfdb_server={level},lfdb_common={level},tower_http=info")
}

/// Open `path` for appending behind a background writer thread
///
/// Parent directories are created. Keep the guard alive for as long as
/// logs should reach the file; dropping it flushes pending lines.
pub fn open_log_file(path: &Path) -> std::io::Result<(NonBlocking, WorkerGuard)> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(tracing_appender::non_blocking(file))
}

/// Install the global subscriber
///
/// Returns the file writer guard when a log file is in use.
pub fn init_tracing(level: &str, log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let (writer, guard) = open_log_file(path)?;
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::info;

    #[test]
    fn test_default_filter_uses_level() {
        assert_eq!(
            default_filter("debug"),
            "lfdb_server=debug,lfdb_common=debug,tower_http=info"
        );
    }

    #[test]
    fn test_log_file_receives_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("lfdb.log");

        let (writer, guard) = open_log_file(&path).unwrap();
        let subscriber = fmt().with_writer(writer).with_ansi(false).finish();
        tracing::subscriber::with_default(subscriber, || {
            info!(youtube_id = %"abc123", "Synced video");
        });
        drop(guard);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("Synced video"), "{}", contents);
        assert!(contents.contains("youtube_id=abc123"), "{}", contents);
    }

    #[test]
    fn test_log_file_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lfdb.log");
        std::fs::write(&path, "earlier line\n").unwrap();

        let (writer, guard) = open_log_file(&path).unwrap();
        let subscriber = fmt().with_writer(writer).with_ansi(false).finish();
        tracing::subscriber::with_default(subscriber, || info!("later line"));
        drop(guard);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("earlier line\n"));
        assert!(contents.contains("later line"));
    }
}
