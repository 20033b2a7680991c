use std::sync::Arc;
use std::time::Duration;

pub mod prompt;
pub mod provider;
pub mod providers;

pub use prompt::{PromptBuilder, ReviewPrompt, REVIEW_CHECKLIST};
pub use provider::ReviewModel;
pub use providers::GeminiProvider;

use crate::config::Config;
use crate::infrastructure::error::ReviewError;

/// 审查客户端：调用模型并把所有失败归一为 `ModelInvocation`
pub struct ReviewClient {
    model: Arc<dyn ReviewModel>,
    timeout: Duration,
}

impl ReviewClient {
    /// 创建新的审查客户端
    pub fn new(model: Arc<dyn ReviewModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    /// 按配置创建 Gemini 客户端，凭据缺失时直接失败
    pub fn from_config(http: reqwest::Client, config: &Config) -> Result<Self, ReviewError> {
        let provider = GeminiProvider::from_config(http, config)?;
        Ok(Self::new(Arc::new(provider), config.review_timeout()))
    }

    pub fn provider_name(&self) -> &str {
        self.model.name()
    }

    /// 发送一次请求，返回模型的完整文本
    pub async fn review(&self, prompt: &ReviewPrompt) -> Result<String, ReviewError> {
        let provider = self.model.name().to_string();

        match tokio::time::timeout(self.timeout, self.model.generate(prompt.as_str())).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(ReviewError::model_invocation(provider, format!("{:#}", e))),
            Err(_) => Err(ReviewError::model_invocation(
                provider,
                format!("no response within {}s", self.timeout.as_secs()),
            )),
        }
    }
}
