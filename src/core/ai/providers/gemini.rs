use crate::config::Config;
use crate::core::ai::provider::ReviewModel;
use crate::infrastructure::error::ReviewError;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Google Generative AI 请求
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

/// Gemini 内容
#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

/// Gemini 部分
#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

/// Gemini 生成配置
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: i32,
}

/// Gemini 响应
#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

/// Gemini 候选
#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContentResponse>,
}

/// Gemini 内容响应
#[derive(Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

/// Gemini 部分响应
#[derive(Deserialize)]
struct GeminiPartResponse {
    text: Option<String>,
}

/// 拼接第一个候选的全部文本部分
fn extract_text(response: GeminiResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Gemini (Google) AI 提供商
///
/// 使用 Google Generative AI API，model 嵌入 URL 路径。
/// 默认 URL 前缀: https://generativelanguage.googleapis.com/v1beta
/// 默认 model: gemini-1.5-flash
/// 环境变量: CODE_REVIEW_GEMINI_API_KEY
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    model: String,
    timeout: Duration,
}

impl GeminiProvider {
    /// 凭据缺失时构造失败，而不是等到第一次请求
    pub fn new(
        client: reqwest::Client,
        api_key: impl Into<String>,
        api_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ReviewError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ReviewError::config("Gemini API key is required"));
        }

        Ok(Self {
            client,
            api_key,
            api_url: api_url.into(),
            model: model.into(),
            timeout,
        })
    }

    pub fn from_config(client: reqwest::Client, config: &Config) -> Result<Self, ReviewError> {
        Self::new(
            client,
            config.api_key()?,
            config.gemini_url.clone(),
            config.model.clone(),
            config.review_timeout(),
        )
    }

    /// 构建 Gemini API URL
    ///
    /// URL 格式: {base_url}/models/{model}:generateContent
    fn build_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl ReviewModel for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: 0.7,
                max_output_tokens: 8192,
            },
        };

        let response = self
            .client
            .post(self.build_url())
            .header("content-type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini request failed: {} - {}", status, text);
        }

        let api_response: GeminiResponse = response.json().await?;
        extract_text(api_response)
            .ok_or_else(|| anyhow::anyhow!("Gemini response contained no text"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(api_url: &str) -> GeminiProvider {
        GeminiProvider::new(
            reqwest::Client::new(),
            "test-key",
            api_url,
            "gemini-1.5-flash",
            Duration::from_secs(30),
        )
        .unwrap()
    }

    #[test]
    fn test_gemini_requires_api_key() {
        let result = GeminiProvider::new(
            reqwest::Client::new(),
            "  ",
            "https://generativelanguage.googleapis.com/v1beta",
            "gemini-1.5-flash",
            Duration::from_secs(30),
        );
        assert!(matches!(result, Err(ReviewError::Configuration { .. })));
    }

    #[test]
    fn test_gemini_from_config_without_key() {
        let config = Config::default();
        assert!(GeminiProvider::from_config(reqwest::Client::new(), &config).is_err());
    }

    #[test]
    fn test_gemini_request_serialization() {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: "test prompt",
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: 0.7,
                max_output_tokens: 8192,
            },
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("test prompt"));
        assert!(json.contains("generationConfig"));
        assert!(json.contains("maxOutputTokens"));
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let json = r#"{"candidates": [{"content": {"parts": [{"text": "1. ⭐ "}, {"text": "Good"}]}}]}"#;
        let response: GeminiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(extract_text(response), Some("1. ⭐ Good".to_string()));
    }

    #[test]
    fn test_extract_text_without_candidates() {
        let response: GeminiResponse = serde_json::from_str(r#"{"promptFeedback": {}}"#).unwrap();
        assert_eq!(extract_text(response), None);

        let json = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let response: GeminiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(extract_text(response), None);
    }

    #[test]
    fn test_build_url() {
        let url = provider("https://generativelanguage.googleapis.com/v1beta/").build_url();
        assert_eq!(
            url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert!(!url.contains("key="));
    }
}
