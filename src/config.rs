//! Optional config file loading. Search order: ./fb2epub-dl.toml, then
//! $XDG_CONFIG_HOME/fb2epub-dl/config.toml (or ~/.config/fb2epub-dl/config.toml).

use crate::model::FileFormat;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file contents. All fields optional; only present keys override defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default, deny_unknown_fields)]
pub struct Config {
    /// Catalog site origin, e.g. a mirror.
    pub base_url: Option<String>,
    /// HTTP User-Agent header.
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Pause after each download, in milliseconds.
    pub download_delay_ms: Option<u64>,
    pub filename_template: Option<String>,
    /// `epub` or `fb2`.
    pub file_format: Option<FileFormat>,
}

fn candidate_paths() -> Result<Vec<PathBuf>, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Cannot determine current directory: {}", e))?;
    let mut paths = vec![cwd.join("fb2epub-dl.toml")];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("fb2epub-dl").join("config.toml"));
    }
    Ok(paths)
}

/// Read and parse one config file.
pub fn load_config_from(path: &Path) -> Result<Config, String> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
    toml::from_str(&s).map_err(|e| format!("Invalid config {}: {}", path.display(), e))
}

/// First existing file in the search order. Missing files return Ok(None).
/// Invalid TOML or an I/O error reading a present file returns Err.
pub fn load_config() -> Result<Option<Config>, String> {
    for path in candidate_paths()? {
        if path.exists() {
            return load_config_from(&path).map(Some);
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let c: Config = toml::from_str("").unwrap();
        assert!(c.base_url.is_none());
        assert!(c.user_agent.is_none());
        assert!(c.timeout_secs.is_none());
        assert!(c.download_delay_ms.is_none());
        assert!(c.filename_template.is_none());
        assert!(c.file_format.is_none());
    }

    #[test]
    fn parse_full_config() {
        let s = r#"
            base_url = "https://mirror.example"
            user_agent = "Custom/1.0"
            timeout_secs = 60
            download_delay_ms = 250
            filename_template = "{title} - {author}"
            file_format = "fb2"
        "#;
        let c: Config = toml::from_str(s).unwrap();
        assert_eq!(c.base_url.as_deref(), Some("https://mirror.example"));
        assert_eq!(c.user_agent.as_deref(), Some("Custom/1.0"));
        assert_eq!(c.timeout_secs, Some(60));
        assert_eq!(c.download_delay_ms, Some(250));
        assert_eq!(c.filename_template.as_deref(), Some("{title} - {author}"));
        assert_eq!(c.file_format, Some(FileFormat::Fb2));
    }

    #[test]
    fn unknown_format_errors() {
        assert!(toml::from_str::<Config>("file_format = \"pdf\"").is_err());
    }

    #[test]
    fn unknown_key_errors() {
        assert!(toml::from_str::<Config>("output_dir = \"out\"").is_err());
    }

    #[test]
    fn load_config_from_reports_path_on_error() -> Result<(), std::io::Error> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timeout_secs = [")?;
        let err = load_config_from(&path).unwrap_err();
        assert!(err.starts_with("Invalid config"));
        assert!(err.contains("config.toml"));
        Ok(())
    }
}
