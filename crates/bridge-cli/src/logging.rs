//! Tracing subscriber setup.
//!
//! Logs always go to stderr or a file, never stdout: `connect` uses stdout
//! as its protocol channel.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use bridge_config::schema::LoggingConfig;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Effective logging options after merging flags and configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: String,
    pub json: bool,
    pub file: Option<PathBuf>,
}

impl LogSettings {
    /// Flags win over configuration; `-v` raises the level past the
    /// configured one.
    pub fn resolve(
        verbose: u8,
        format: &str,
        log_file: Option<&str>,
        config: &LoggingConfig,
    ) -> Self {
        let filter = match verbose {
            0 => config.level.clone(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        };
        Self {
            filter,
            json: format == "json",
            file: log_file.map(PathBuf::from).or_else(|| config.file.clone()),
        }
    }
}

/// Installs the global subscriber.
pub fn init(settings: &LogSettings) -> anyhow::Result<()> {
    let writer = match &settings.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(settings.filter.as_str())
        .with_writer(writer)
        .with_ansi(settings.file.is_none());

    if settings.json {
        builder
            .json()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .init();
    } else {
        builder.init();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_level_used_without_flags() {
        let config = LoggingConfig {
            level: "warn".into(),
            file: None,
        };
        let s = LogSettings::resolve(0, "plain", None, &config);
        assert_eq!(s.filter, "warn");
        assert!(!s.json);
        assert!(s.file.is_none());
    }

    #[test]
    fn verbose_flag_overrides_config_level() {
        let config = LoggingConfig::default();
        assert_eq!(LogSettings::resolve(1, "plain", None, &config).filter, "debug");
        assert_eq!(LogSettings::resolve(3, "json", None, &config).filter, "trace");
    }

    #[test]
    fn log_file_flag_beats_config_file() {
        let config = LoggingConfig {
            level: "info".into(),
            file: Some(PathBuf::from("/var/log/from-config.log")),
        };
        let s = LogSettings::resolve(0, "json", Some("/tmp/flag.log"), &config);
        assert_eq!(s.file, Some(PathBuf::from("/tmp/flag.log")));
        assert!(s.json);

        let s = LogSettings::resolve(0, "plain", None, &config);
        assert_eq!(s.file, Some(PathBuf::from("/var/log/from-config.log")));
    }

    #[test]
    fn unopenable_log_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = LogSettings {
            filter: "info".into(),
            json: false,
            // A directory cannot be opened for appending.
            file: Some(dir.path().to_path_buf()),
        };
        let err = init(&settings).expect_err("directory as log file");
        assert!(err.to_string().contains("cannot open log file"));
    }
}
