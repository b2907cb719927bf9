mod gemini;
mod glm;

pub use gemini::GeminiService;
pub use glm::GlmService;

use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::Language;

/// The two remote API shapes the renamer can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google-style `generateContent` with an inline base64 image.
    Gemini,
    /// Chat-completions with a `data:` image URL (Zhipu GLM-4V and compatible).
    Glm,
}

impl ProviderKind {
    /// Pick the API shape for a model name: `glm*` models speak
    /// chat-completions, everything else speaks `generateContent`.
    pub fn from_model_name(model_name: &str) -> Self {
        if model_name.trim().to_lowercase().starts_with("glm") {
            Self::Glm
        } else {
            Self::Gemini
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gemini => f.write_str("Gemini"),
            Self::Glm => f.write_str("GLM"),
        }
    }
}

/// What went wrong talking to a provider. Only used for diagnostics: every
/// kind leads to the same fallback name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Quota,
    ModelNotFound,
    PermissionDenied,
    Network,
    Timeout,
    Http,
    MalformedResponse,
}

impl ProviderErrorKind {
    fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            429 => Self::Quota,
            404 => Self::ModelNotFound,
            401 | 403 => Self::PermissionDenied,
            408 | 504 => Self::Timeout,
            _ => Self::Http,
        }
    }

    /// A short suggestion shown next to the error in logs.
    pub fn hint(&self) -> &'static str {
        match self {
            Self::Quota => "API quota exceeded. Please check your usage limits.",
            Self::ModelNotFound => "Model not found or not available. Please check your model name.",
            Self::PermissionDenied => "Permission denied. Check your API key permissions.",
            Self::Network => "Network error. Please check your internet connection.",
            Self::Timeout => "The request timed out.",
            Self::Http => "The API returned an error status.",
            Self::MalformedResponse => "The API response did not have the expected shape.",
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Quota => "quota exceeded",
            Self::ModelNotFound => "model not found",
            Self::PermissionDenied => "permission denied",
            Self::Network => "network error",
            Self::Timeout => "timeout",
            Self::Http => "http error",
            Self::MalformedResponse => "malformed response",
        };
        f.write_str(s)
    }
}

/// Error returned by an [`AiService`], classified at the source.
#[derive(Debug, thiserror::Error)]
#[error("{provider} {kind}: {message}")]
pub struct ProviderError {
    pub provider: ProviderKind,
    pub kind: ProviderErrorKind,
    /// HTTP status, when the server answered at all.
    pub status: Option<u16>,
    pub message: String,
}

impl ProviderError {
    pub fn new(provider: ProviderKind, kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            provider,
            kind,
            status: None,
            message: message.into(),
        }
    }

    fn http(provider: ProviderKind, status: StatusCode, body: &str) -> Self {
        Self {
            provider,
            kind: ProviderErrorKind::from_status(status),
            status: Some(status.as_u16()),
            message: format!(
                "{} {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status"),
                body.trim()
            ),
        }
    }

    fn transport(provider: ProviderKind, err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ProviderErrorKind::Timeout
        } else if err.is_decode() {
            ProviderErrorKind::MalformedResponse
        } else {
            ProviderErrorKind::Network
        };
        Self {
            provider,
            kind,
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }

    fn malformed(provider: ProviderKind, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::MalformedResponse, message)
    }
}

/// Trait for remote vision models that describe an image in a few words.
///
/// The library ships with [`GeminiService`] and [`GlmService`]. Implement
/// this trait to plug in another backend, or a fake in tests.
///
/// # Example
///
/// ```rust,no_run
/// use image_renamer::ai::{AiService, GlmService, build_prompt};
/// use image_renamer::config::Language;
///
/// # async fn example() -> anyhow::Result<()> {
/// let service = GlmService::new(
///     "key".into(),
///     "glm-4v-flash".into(),
///     "https://open.bigmodel.cn/api/paas/v4/chat/completions".into(),
/// );
/// let text = service
///     .describe("base64data", build_prompt(Language::En), "image/jpeg")
///     .await?;
/// println!("Suggested: {text}");
/// # Ok(())
/// # }
/// ```
#[async_trait::async_trait]
pub trait AiService: Send + Sync {
    /// The display name of this service (e.g., "Gemini", "GLM").
    fn name(&self) -> &str;
    /// Which API shape this service speaks.
    fn kind(&self) -> ProviderKind;
    /// Describe a base64-encoded image, returning the model's trimmed text.
    ///
    /// * `image_base64` - The image bytes encoded as base64
    /// * `prompt` - The instruction (see [`build_prompt`])
    /// * `mime_type` - The MIME type of the image (e.g., `"image/png"`)
    async fn describe(
        &self,
        image_base64: &str,
        prompt: &str,
        mime_type: &str,
    ) -> Result<String, ProviderError>;
}

/// The filename instruction sent with every image.
pub fn build_prompt(language: Language) -> &'static str {
    match language {
        Language::En => {
            "Analyze this image and provide a short, descriptive filename in lowercase with underscores. Return only the filename, nothing else. For example: cat_on_windowsill_sunny_day"
        }
        Language::Zh => {
            "分析这张图片，用简短的中文描述图片内容作为文件名，词语之间用下划线分隔。只返回文件名，不要返回其他内容。例如：猫咪_窗台_阳光明媚"
        }
    }
}

/// Send a request, require a 2xx status, and parse the body as JSON.
async fn send_json(
    provider: ProviderKind,
    request: RequestBuilder,
) -> Result<serde_json::Value, ProviderError> {
    let resp = request
        .send()
        .await
        .map_err(|e| ProviderError::transport(provider, e))?;

    let status = resp.status();
    let text = resp
        .text()
        .await
        .map_err(|e| ProviderError::transport(provider, e))?;

    if !status.is_success() {
        return Err(ProviderError::http(provider, status, &text));
    }

    serde_json::from_str(&text).map_err(|e| {
        ProviderError::malformed(provider, format!("Failed to parse {provider} response JSON: {e}"))
    })
}
