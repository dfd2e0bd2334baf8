//! Reading widget configuration files.
//!
//! Files are parsed into an order-preserving JSON value regardless of their
//! on-disk format, so section templating and error reporting see fields in
//! the order the user wrote them.
//!
//! Supported formats, chosen by extension:
//!
//! - `.yaml` / `.yml` via `serde_yaml`
//! - `.toml` via `toml`
//! - `.json` via `serde_json`

use std::path::Path;

use serde_json::Value as JsonValue;
use tracing::debug;

use super::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "toml" => Some(ConfigFormat::Toml),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }
}

/// Parse configuration `text` in the given format.
///
/// Errors are returned as plain messages; [`load_config_file`] attaches the
/// file path.
pub fn parse_config_str(text: &str, format: ConfigFormat) -> Result<JsonValue, String> {
    match format {
        ConfigFormat::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
        ConfigFormat::Toml => toml::from_str(text).map_err(|e| e.to_string()),
        ConfigFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
    }
}

/// Read and parse a configuration file.
///
/// # Examples
///
/// ```rust,no_run
/// use std::path::Path;
/// use widgetbar::config::load_config_file;
///
/// # fn example() -> Result<(), widgetbar::config::ConfigError> {
/// let raw = load_config_file(Path::new("widgets/bar.yaml"))?;
/// assert!(raw.is_object());
/// # Ok(())
/// # }
/// ```
pub fn load_config_file(path: &Path) -> Result<JsonValue, ConfigError> {
    let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;

    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("Parsing {:?} config file {}", format, path.display());
    parse_config_str(&text, format).map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_yaml_keeps_field_order() {
        let raw = parse_config_str("zeta: 1\nalpha: '{{ x }}'\nmid: true\n", ConfigFormat::Yaml)
            .unwrap();
        let keys: Vec<_> = raw.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_toml_and_json() {
        let raw = parse_config_str("[\"window/bar\"]\nwidth = \"100%\"\n", ConfigFormat::Toml)
            .unwrap();
        assert_eq!(raw["window/bar"]["width"], "100%");

        let raw = parse_config_str(r#"{"a": [1, 2]}"#, ConfigFormat::Json).unwrap();
        assert_eq!(raw["a"][1], 2);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.YML")), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_path(Path::new("a.txt")), None);
        assert_eq!(ConfigFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_load_errors_carry_path() {
        let err = load_config_file(Path::new("/definitely/missing.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));

        let err = load_config_file(Path::new("bar.ini")).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));

        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = load_config_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
