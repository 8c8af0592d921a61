use std::path::Path;

use serde::{Deserialize, Serialize};

/// Runtime configuration loaded from `voltaview.toml`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Segment selected when a file is first loaded. Clamped per file to
    /// `[0, max_segment)`, so small files fall back to their last segment.
    pub default_segment: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Also write the per-segment CSV pairs for every shared segment.
    pub detail: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            analysis: AnalysisConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig { default_segment: 2 }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig { detail: false }
    }
}

const CONFIG_FILE: &str = "voltaview.toml";

impl Config {
    /// Load configuration from `voltaview.toml` in the working directory,
    /// falling back to defaults if the file is missing or invalid.
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("invalid config file, using defaults: {e}");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Persist the current configuration to `voltaview.toml`.
    pub fn save(&self) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(CONFIG_FILE, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_select_segment_two_without_detail() {
        let config = Config::default();
        assert_eq!(config.analysis.default_segment, 2);
        assert!(!config.export.detail);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str("[export]\ndetail = true\n").expect("parses");
        assert_eq!(config.analysis.default_segment, 2);
        assert!(config.export.detail);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load_from_path("/nonexistent/voltaview.toml");
        assert_eq!(config.analysis.default_segment, 2);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"analysis = \"not a table\"").unwrap();
        let config = Config::load_from_path(file.path());
        assert_eq!(config.analysis.default_segment, 2);
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = Config::default();
        config.analysis.default_segment = 5;
        let text = toml::to_string_pretty(&config).expect("serialises");
        let back: Config = toml::from_str(&text).expect("parses");
        assert_eq!(back.analysis.default_segment, 5);
    }
}
