//! Tracing subscriber setup
//!
//! Configuration is loaded before `[logging]` is known, so that step runs
//! under a scoped stderr subscriber. The global subscriber is installed
//! afterwards from the loaded `LoggingConfig`.

use std::fs::OpenOptions;
use std::sync::Mutex;

use rota_common::config::LoggingConfig;
use rota_common::Result;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Level used before any configuration has been read
pub const BOOTSTRAP_LOG_LEVEL: &str = "info";

/// `RUST_LOG` when set, otherwise `default_level`
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Run `f` with a temporary subscriber writing to `writer`
///
/// Used around config loading so its warnings (missing file, fallbacks)
/// are not dropped for lack of a subscriber.
pub fn with_bootstrap_subscriber<W, T>(writer: W, f: impl FnOnce() -> T) -> T
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter(BOOTSTRAP_LOG_LEVEL))
        .with_ansi(false)
        .with_writer(writer)
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over `[logging].level`; `[logging].file` appends to a file
/// instead of stderr.
pub fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = env_filter(&logging.level);

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_config, TomlConfig};
    use std::io;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
        }
    }

    #[test]
    fn test_missing_config_warning_is_captured_during_bootstrap() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("rota-ingest.toml");
        let buf = SharedBuf::default();
        let writer = buf.clone();

        let config = with_bootstrap_subscriber(move || writer.clone(), || {
            load_config(Some(missing.as_path()))
        })
        .unwrap();

        assert_eq!(config, TomlConfig::default());
        let logged = buf.contents();
        assert!(logged.contains("WARN"), "log output: {}", logged);
        assert!(logged.contains("Config file not found"), "log output: {}", logged);
    }
}
