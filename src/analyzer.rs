use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::ai::{self, AiService, GeminiService, GlmService, ProviderKind};
use crate::config::{AnalysisMode, Config, Language};
use crate::naming;
use crate::pipeline::mime_type_for;

/// Where a suggested name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameSource {
    #[serde(rename = "gemini")]
    Gemini,
    #[serde(rename = "glm")]
    Glm,
    #[serde(rename = "offline-heuristic")]
    Offline,
    #[serde(rename = "fallback-timestamp")]
    Fallback,
}

impl From<ProviderKind> for NameSource {
    fn from(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::Gemini => Self::Gemini,
            ProviderKind::Glm => Self::Glm,
        }
    }
}

impl fmt::Display for NameSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Gemini => "Gemini",
            Self::Glm => "GLM",
            Self::Offline => "offline heuristic",
            Self::Fallback => "timestamp fallback",
        };
        f.write_str(s)
    }
}

/// A suggested base name (no extension, already sanitized and dated).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub suggested_base_name: String,
    pub source: NameSource,
}

/// Turns an image into a descriptive base name.
///
/// The analyzer is built once per operation from an immutable [`Config`]:
/// the provider is resolved at construction, not per call. Naming never
/// fails: network, API and I/O problems are logged and answered with a
/// timestamp fallback name.
///
/// # Example
///
/// ```rust,no_run
/// use image_renamer::analyzer::ImageAnalyzer;
/// use image_renamer::config::Config;
/// use std::path::Path;
///
/// # async fn example() {
/// let config = Config::default();
/// let analyzer = ImageAnalyzer::from_config(&config);
/// let result = analyzer.suggest_name(Path::new("photo.jpg")).await;
/// println!("{} ({})", result.suggested_base_name, result.source);
/// # }
/// ```
pub struct ImageAnalyzer {
    language: Language,
    /// `None` means offline: names come from file metadata only.
    service: Option<Box<dyn AiService>>,
}

impl ImageAnalyzer {
    /// Build an analyzer for the provider the configuration resolves to.
    pub fn from_config(config: &Config) -> Self {
        let api = &config.api;
        let service: Option<Box<dyn AiService>> = match config.analysis_mode() {
            AnalysisMode::Offline => None,
            AnalysisMode::Online(ProviderKind::Gemini) => Some(Box::new(
                GeminiService::new(
                    api.api_key.clone(),
                    api.model_name.clone(),
                    api.gemini_base_url.clone(),
                )
                .with_sampling(api.temperature, api.max_tokens),
            )),
            AnalysisMode::Online(ProviderKind::Glm) => Some(Box::new(
                GlmService::new(
                    api.api_key.clone(),
                    api.model_name.clone(),
                    api.base_url.clone(),
                )
                .with_sampling(api.temperature, api.max_tokens),
            )),
        };

        if service.is_some() && api.api_key.is_empty() {
            log::warn!("No API key configured; requests will fail and fall back to timestamp names");
        }

        Self {
            language: config.naming.language,
            service,
        }
    }

    /// An analyzer that never touches the network.
    pub fn offline(language: Language) -> Self {
        Self {
            language,
            service: None,
        }
    }

    /// An analyzer backed by a caller-supplied service.
    pub fn with_service(service: Box<dyn AiService>, language: Language) -> Self {
        Self {
            language,
            service: Some(service),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn is_offline(&self) -> bool {
        self.service.is_none()
    }

    /// Display name of the remote service, if any.
    pub fn service_name(&self) -> Option<&str> {
        self.service.as_deref().map(|s| s.name())
    }

    /// Suggest a dated base name for the image at `path`.
    pub async fn suggest_name(&self, path: &Path) -> AnalysisResult {
        let now = Local::now();

        let Some(service) = self.service.as_deref() else {
            return self.offline_result(path, &now);
        };

        let image_bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Image processing failed for {}: {e}", path.display());
                return fallback_result(&now);
            }
        };
        let image_base64 =
            base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &image_bytes);
        let prompt = ai::build_prompt(self.language);

        log::debug!("Asking {} about {}", service.name(), path.display());
        match service
            .describe(&image_base64, prompt, mime_type_for(path))
            .await
        {
            Ok(raw) => {
                log::debug!("Raw {} response: {raw:?}", service.name());
                let clean = naming::sanitize(&raw, self.language);
                if clean.is_empty() {
                    log::warn!(
                        "{} response for {} was empty after cleaning; using fallback name",
                        service.name(),
                        path.display()
                    );
                    return fallback_result(&now);
                }
                AnalysisResult {
                    suggested_base_name: naming::dated(&clean, &now),
                    source: service.kind().into(),
                }
            }
            Err(e) => {
                log::warn!("Analysis of {} failed: {e}", path.display());
                log::warn!("  {}", e.kind.hint());
                fallback_result(&now)
            }
        }
    }

    fn offline_result(&self, path: &Path, now: &DateTime<Local>) -> AnalysisResult {
        match std::fs::metadata(path) {
            Ok(meta) => AnalysisResult {
                suggested_base_name: naming::offline_name(path, meta.len(), self.language, now),
                source: NameSource::Offline,
            },
            Err(e) => {
                log::warn!("Cannot stat {}: {e}", path.display());
                fallback_result(now)
            }
        }
    }
}

fn fallback_result(now: &DateTime<Local>) -> AnalysisResult {
    AnalysisResult {
        suggested_base_name: naming::fallback_name(now),
        source: NameSource::Fallback,
    }
}
