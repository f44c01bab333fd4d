//! Configuration loading and parsing

use anyhow::{Context, Result};
use carstate_decoder::CarStateConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from carstate.toml)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub input: InputConfig,
    pub car: CarStateConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    /// DBC with message layouts and value tables
    pub dbc: PathBuf,
    /// JSON-lines frame log
    pub frames: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReplayConfig {
    /// Control loop rate the replay ticks at
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,
    /// Where to write decoded states (default: stdout)
    pub output: Option<PathBuf>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            tick_hz: default_tick_hz(),
            output: None,
        }
    }
}

fn default_tick_hz() -> u32 {
    100
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if config.replay.tick_hz == 0 {
        anyhow::bail!("replay.tick_hz must be greater than zero");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [input]
            dbc = "byd_general_pt.dbc"
            frames = "drive.jsonl"

            [car]
            variant = "BYD_ATTO3"
            enable_bsm = true
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.input.dbc, PathBuf::from("byd_general_pt.dbc"));
        assert_eq!(config.car.variant, "BYD_ATTO3");
        assert!(config.car.enable_bsm);
        assert_eq!(config.replay.tick_hz, 100);
        assert!(config.replay.output.is_none());
    }

    #[test]
    fn test_missing_car_section_rejected() {
        let toml_content = r#"
            [input]
            dbc = "a.dbc"
            frames = "b.jsonl"
        "#;
        assert!(toml::from_str::<AppConfig>(toml_content).is_err());
    }

    #[test]
    fn test_zero_tick_rate_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[input]\ndbc = \"a.dbc\"\nframes = \"b.jsonl\"\n\n[car]\nvariant = \"BYD_ATTO3\"\n\n[replay]\ntick_hz = 0"
        )
        .unwrap();
        assert!(load_config(file.path()).is_err());
    }
}
