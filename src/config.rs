use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::ai::ProviderKind;

/// Top-level configuration for the image renamer.
///
/// A `Config` is built once (from a file, defaults, and CLI overrides) and
/// then only borrowed by the analyzer and renamer. Nothing in the library
/// mutates it after construction.
///
/// # Loading
///
/// ```rust,no_run
/// use image_renamer::config::{Config, Language};
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or start from defaults
/// let mut config = Config::default();
/// config.api.api_key = "sk-...".into();
/// config.naming.language = Language::En;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote model settings.
    pub api: ApiConfig,
    /// How names are generated.
    pub naming: NamingConfig,
    /// Output behavior.
    pub output: OutputConfig,
}

/// Settings for the remote vision model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub api_key: String,
    /// Chat-completions endpoint used by GLM-style models.
    pub base_url: String,
    /// API root used by Gemini-style models.
    pub gemini_base_url: String,
    /// Model name. Names starting with `glm` use the chat-completions API,
    /// everything else uses the Gemini `generateContent` API.
    pub model_name: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// JPEG quality hint. Carried for shells; the naming pipeline ignores it.
    pub image_quality: u8,
}

/// Settings for name generation and image discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    pub language: Language,
    /// Never call a remote model; derive names from file metadata only.
    pub offline_mode: bool,
    /// Walk directories recursively instead of one level deep.
    pub recursive: bool,
    /// Lowercase extensions (without the dot) that count as images.
    pub supported_extensions: Vec<String>,
}

/// Output and behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// If `true`, report what would be renamed without touching any file.
    pub dry_run: bool,
}

/// Language of generated filenames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Zh,
    En,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Zh => f.write_str("zh"),
            Language::En => f.write_str("en"),
        }
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "zh" | "chinese" => Ok(Language::Zh),
            "en" | "english" => Ok(Language::En),
            other => anyhow::bail!("Unknown language '{other}' (expected 'zh' or 'en')"),
        }
    }
}

/// How the analyzer produces names, resolved once from the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    Offline,
    Online(ProviderKind),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                api_key: String::new(),
                base_url: "https://open.bigmodel.cn/api/paas/v4/chat/completions".to_string(),
                gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                model_name: "glm-4v-flash".to_string(),
                temperature: 0.3,
                max_tokens: 100,
                image_quality: 90,
            },
            naming: NamingConfig {
                language: Language::Zh,
                offline_mode: false,
                recursive: false,
                supported_extensions: ["jpg", "jpeg", "png", "bmp", "tiff", "webp"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
            output: OutputConfig { dry_run: false },
        }
    }
}

impl Config {
    /// Resolve the config file path: same directory as the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Decide once whether names come from a remote provider, and which one.
    pub fn analysis_mode(&self) -> AnalysisMode {
        if self.naming.offline_mode {
            AnalysisMode::Offline
        } else {
            AnalysisMode::Online(ProviderKind::from_model_name(&self.api.model_name))
        }
    }

    /// Whether `ext` (with or without the leading dot, any case) is in the allow-list.
    pub fn is_supported_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.').to_lowercase();
        self.naming.supported_extensions.iter().any(|e| *e == ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_glm_endpoint() {
        let config = Config::default();
        assert_eq!(config.api.model_name, "glm-4v-flash");
        assert_eq!(config.naming.language, Language::Zh);
        assert!(!config.naming.offline_mode);
        assert_eq!(config.naming.supported_extensions.len(), 6);
        assert_eq!(
            config.analysis_mode(),
            AnalysisMode::Online(ProviderKind::Glm)
        );
    }

    #[test]
    fn offline_mode_wins_over_model() {
        let mut config = Config::default();
        config.naming.offline_mode = true;
        assert_eq!(config.analysis_mode(), AnalysisMode::Offline);
    }

    #[test]
    fn non_glm_model_resolves_to_gemini() {
        let mut config = Config::default();
        config.api.model_name = "gemini-1.5-flash".into();
        assert_eq!(
            config.analysis_mode(),
            AnalysisMode::Online(ProviderKind::Gemini)
        );
    }

    #[test]
    fn supported_extension_ignores_case_and_dot() {
        let config = Config::default();
        assert!(config.is_supported_extension("JPG"));
        assert!(config.is_supported_extension(".webp"));
        assert!(config.is_supported_extension("tiff"));
        assert!(!config.is_supported_extension("tif"));
        assert!(!config.is_supported_extension("gif"));
    }

    #[test]
    fn language_parse_and_display() {
        assert_eq!("en".parse::<Language>().unwrap(), Language::En);
        assert_eq!("ZH".parse::<Language>().unwrap(), Language::Zh);
        assert_eq!("english".parse::<Language>().unwrap(), Language::En);
        assert!("fr".parse::<Language>().is_err());
        assert_eq!(Language::En.to_string(), "en");
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.api.api_key = "secret".into();
        config.naming.language = Language::En;
        config.save(Some(&path)).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"language\": \"en\""));

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.api.api_key, "secret");
        assert_eq!(loaded.naming.language, Language::En);
    }

    #[test]
    fn load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(Some(&dir.path().join("nope.json"))).unwrap();
        assert_eq!(config.api.max_tokens, 100);
    }

    #[test]
    fn load_invalid_json_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }
}
