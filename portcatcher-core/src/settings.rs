//! C13 — Settings: optional TOML configuration for a compilation run.
//! Read → parse → validate, failing fast with a typed error at each step.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{CompilerError, Result};

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_true")]
    pub emit_tcam: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings { output_dir: default_output_dir(), log_level: default_log_level(), emit_tcam: true }
    }
}

/// Loads settings from a TOML file, falling back to defaults for any field
/// the file omits.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| CompilerError::Settings(format!("failed to read {}: {e}", path.display())))?;

    let settings: Settings =
        toml::from_str(&text).map_err(|e| CompilerError::Settings(format!("failed to parse {}: {e}", path.display())))?;

    validate(&settings)?;
    Ok(settings)
}

fn validate(settings: &Settings) -> Result<()> {
    if settings.output_dir.trim().is_empty() {
        return Err(CompilerError::Settings("output_dir must not be empty".into()));
    }

    const KNOWN_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
    if !KNOWN_LEVELS.contains(&settings.log_level.as_str()) {
        return Err(CompilerError::Settings(format!(
            "unknown log_level {:?}, expected one of {KNOWN_LEVELS:?}",
            settings.log_level
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        file.write_all(contents.as_bytes()).expect("write temp file");
        file
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let file = write_temp("");
        let settings = load_from_path(file.path()).expect("load");
        assert_eq!(settings.output_dir, "output");
        assert_eq!(settings.log_level, "info");
        assert!(settings.emit_tcam);
    }

    #[test]
    fn overrides_are_applied() {
        let file = write_temp("output_dir = \"build\"\nlog_level = \"debug\"\nemit_tcam = false\n");
        let settings = load_from_path(file.path()).expect("load");
        assert_eq!(settings.output_dir, "build");
        assert_eq!(settings.log_level, "debug");
        assert!(!settings.emit_tcam);
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let file = write_temp("log_level = \"verbose\"\n");
        assert!(load_from_path(file.path()).is_err());
    }

    #[test]
    fn missing_file_is_a_compiler_error() {
        assert!(load_from_path("/no/such/settings.toml").is_err());
    }
}
