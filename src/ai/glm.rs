use reqwest::Client;
use serde_json::json;

use super::{AiService, ProviderError, ProviderKind, send_json};

/// Provider B: chat-completions with a text part and a `data:` image URL,
/// authenticated with a bearer token.
pub struct GlmService {
    api_key: String,
    model: String,
    endpoint: String,
    temperature: f32,
    max_tokens: u32,
    client: Client,
}

impl GlmService {
    /// `endpoint` is the full chat-completions URL.
    pub fn new(api_key: String, model: String, endpoint: String) -> Self {
        Self {
            api_key,
            model,
            endpoint,
            temperature: 0.3,
            max_tokens: 100,
            client: Client::new(),
        }
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait::async_trait]
impl AiService for GlmService {
    fn name(&self) -> &str {
        "GLM"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Glm
    }

    async fn describe(
        &self,
        image_base64: &str,
        prompt: &str,
        mime_type: &str,
    ) -> Result<String, ProviderError> {
        let body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": [
                        {
                            "type": "text",
                            "text": prompt
                        },
                        {
                            "type": "image_url",
                            "image_url": {
                                "url": format!("data:{mime_type};base64,{image_base64}")
                            }
                        }
                    ]
                }
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens
        });

        let request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body);
        let json = send_json(ProviderKind::Glm, request).await?;

        let message = json["choices"][0]
            .get("message")
            .ok_or_else(|| ProviderError::malformed(ProviderKind::Glm, "No message in GLM response"))?;
        let content = message["content"]
            .as_str()
            .ok_or_else(|| ProviderError::malformed(ProviderKind::Glm, "No content in GLM message"))?;

        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::ProviderErrorKind;
    use crate::ai::test_server::serve_once;

    fn service(base: &str) -> GlmService {
        GlmService::new(
            "sk-test".into(),
            "glm-4v-flash".into(),
            format!("{base}/api/paas/v4/chat/completions"),
        )
        .with_sampling(0.5, 64)
    }

    #[tokio::test]
    async fn sends_chat_completion_with_data_url() {
        let (base, server) = serve_once(
            200,
            r#"{"choices":[{"message":{"role":"assistant","content":" 猫咪_窗台 "}}]}"#,
        )
        .await;

        let text = service(&base).describe("QUJD", "prompt", "image/webp").await.unwrap();
        assert_eq!(text, "猫咪_窗台");

        let captured = server.await.unwrap();
        assert!(captured.head.starts_with("POST /api/paas/v4/chat/completions "));
        assert!(captured
            .head
            .to_lowercase()
            .contains("authorization: bearer sk-test"));

        let body = &captured.body;
        assert_eq!(body["model"], "glm-4v-flash");
        assert_eq!(body["max_tokens"], 64);
        assert!((body["temperature"].as_f64().unwrap() - 0.5).abs() < 1e-6);
        let message = &body["messages"][0];
        assert_eq!(message["role"], "user");
        assert_eq!(message["content"][0]["type"], "text");
        assert_eq!(message["content"][0]["text"], "prompt");
        assert_eq!(message["content"][1]["type"], "image_url");
        assert_eq!(
            message["content"][1]["image_url"]["url"],
            "data:image/webp;base64,QUJD"
        );
    }

    #[tokio::test]
    async fn non_success_status_fails_with_status() {
        let (base, _server) = serve_once(401, r#"{"error":{"message":"bad key"}}"#).await;
        let err = service(&base).describe("QUJD", "p", "image/jpeg").await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::PermissionDenied);
        assert_eq!(err.status, Some(401));
        assert!(err.message.contains("Unauthorized"));
    }

    #[tokio::test]
    async fn quota_status() {
        let (base, _server) = serve_once(429, "{}").await;
        let err = service(&base).describe("QUJD", "p", "image/jpeg").await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Quota);
    }

    #[tokio::test]
    async fn missing_message_is_malformed() {
        let (base, _server) = serve_once(200, r#"{"choices":[]}"#).await;
        let err = service(&base).describe("QUJD", "p", "image/jpeg").await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        // Bind then drop a listener so the port is very likely closed.
        let addr = {
            let l = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            l.local_addr().unwrap()
        };
        let err = service(&format!("http://{addr}"))
            .describe("QUJD", "p", "image/jpeg")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Network);
        assert_eq!(err.status, None);
    }
}
