// ABOUTME: Configuration file loading, validation, and hierarchical merging for the xkcd viewer
// ABOUTME: Supports TOML config files at project, XDG and home locations

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use termimg::ProtocolSelection;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct Config {
    #[serde(default, deserialize_with = "validate_protocol")]
    pub protocol: Option<String>,
    #[serde(default)]
    pub fzf_cmd: Option<String>,
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
    #[serde(default, deserialize_with = "validate_duration")]
    pub cache_timeout: Option<String>,
    #[serde(default)]
    pub scale_up: Option<bool>,
    #[serde(default)]
    pub width: Option<i32>,
    #[serde(default)]
    pub terminal_graphics: Option<bool>,
}

impl Config {
    /// Load configuration from the standard locations
    pub fn load() -> Result<Self> {
        let paths = Self::get_config_paths();
        Self::load_from_paths(&paths)
    }

    /// Load configuration from file paths listed highest precedence first
    pub fn load_from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut config = Config::default();

        for path in paths.iter().rev() {
            let path = path.as_ref();
            if !path.exists() {
                continue;
            }
            let file_config = Self::load_from_file(path)?;
            log::debug!("Loaded config from {}", path.display());
            config = config.merge(file_config);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a single file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse TOML config file: {}",
                path.as_ref().display()
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get standard config file paths in order of precedence (highest first)
    pub fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(current_dir) = std::env::current_dir() {
            paths.push(current_dir.join("xkcd-cli.toml"));
        }

        if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME") {
            paths.push(
                PathBuf::from(config_home)
                    .join("xkcd-cli")
                    .join("config.toml"),
            );
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".config").join("xkcd-cli").join("config.toml"));
        }

        paths
    }

    /// Merge this config with another, giving precedence to the other config
    pub fn merge(self, other: Config) -> Config {
        Config {
            protocol: other.protocol.or(self.protocol),
            fzf_cmd: other.fzf_cmd.or(self.fzf_cmd),
            cache_path: other.cache_path.or(self.cache_path),
            cache_timeout: other.cache_timeout.or(self.cache_timeout),
            scale_up: other.scale_up.or(self.scale_up),
            width: other.width.or(self.width),
            terminal_graphics: other.terminal_graphics.or(self.terminal_graphics),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self.fzf_cmd {
            Some(ref cmd) if cmd.trim().is_empty() => Err(anyhow!("fzf_cmd must not be empty")),
            _ => Ok(()),
        }
    }

    /// Configured protocol selection; `auto` when unset.
    pub fn protocol_selection(&self) -> Result<ProtocolSelection> {
        match self.protocol {
            Some(ref name) => ProtocolSelection::from_str(name)
                .map_err(|e| anyhow!("Invalid protocol in config: {}", e)),
            None => Ok(ProtocolSelection::Auto),
        }
    }

    pub fn cache_timeout(&self) -> Option<Duration> {
        self.cache_timeout.as_deref().and_then(parse_duration)
    }
}

/// Parse `30s`, `30m`, `24h` or `2d`.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let unit = text.chars().last()?;
    let seconds_per_unit = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        _ => return None,
    };
    let amount: u64 = text[..text.len() - 1].parse().ok()?;
    Some(Duration::from_secs(amount.checked_mul(seconds_per_unit)?))
}

fn validate_protocol<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value: Option<String> = Option::deserialize(deserializer)?;

    if let Some(ref name) = value {
        ProtocolSelection::from_str(name).map_err(|_| {
            D::Error::custom(format!(
                "Invalid protocol '{}'. Must be one of: auto, kitty, kitty+, iterm, sixel, none",
                name
            ))
        })?;
    }
    Ok(value)
}

fn validate_duration<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value: Option<String> = Option::deserialize(deserializer)?;

    match value {
        Some(ref duration) if parse_duration(duration).is_none() => Err(D::Error::custom(format!(
            "Invalid duration format '{}'. Expected format like '30m', '24h', '2d'",
            duration
        ))),
        _ => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termimg::Protocol;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.protocol.is_none());
        assert_eq!(config.protocol_selection().unwrap(), ProtocolSelection::Auto);
        assert!(config.cache_timeout().is_none());
    }

    #[test]
    fn test_merge_configs() {
        let base = Config {
            protocol: Some("kitty".to_string()),
            fzf_cmd: Some("sk".to_string()),
            ..Default::default()
        };

        let override_config = Config {
            protocol: Some("sixel".to_string()),
            width: Some(400),
            ..Default::default()
        };

        let merged = base.merge(override_config);
        assert_eq!(merged.protocol, Some("sixel".to_string()));
        assert_eq!(merged.fzf_cmd, Some("sk".to_string()));
        assert_eq!(merged.width, Some(400));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30s"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("30m"), Some(Duration::from_secs(1800)));
        assert_eq!(parse_duration("24h"), Some(Duration::from_secs(86400)));
        assert_eq!(parse_duration("2d"), Some(Duration::from_secs(172800)));
        assert_eq!(parse_duration("2w"), None);
        assert_eq!(parse_duration("h"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn test_protocol_selection() {
        let config = Config {
            protocol: Some("kitty+".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.protocol_selection().unwrap(),
            ProtocolSelection::Fixed(Protocol::KITTY_EXTENDED)
        );

        let config = Config {
            protocol: Some("none".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.protocol_selection().unwrap(),
            ProtocolSelection::Disabled
        );
    }

    #[test]
    fn test_empty_fzf_cmd_is_rejected() {
        let config = Config {
            fzf_cmd: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
