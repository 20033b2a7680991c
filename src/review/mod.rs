pub mod controller;
pub mod source;

pub use controller::{Notice, RequestController, RequestId, RequestState, ReviewResult};
pub use source::{GitHubFile, RefPolicy, ResolvedSource, ReviewRequest, SourceKind, SourceResolver};

use tracing::Instrument;

use crate::config::Config;
use crate::core::ai::{PromptBuilder, ReviewClient};
use crate::infrastructure::error::ReviewError;
use crate::infrastructure::network::{build_client, NetworkConfig};

/// 审查流水线：来源解析 → 提示词构建 → 模型调用
pub struct ReviewService {
    resolver: SourceResolver,
    prompt_builder: PromptBuilder,
    client: ReviewClient,
}

impl ReviewService {
    pub fn new(resolver: SourceResolver, client: ReviewClient) -> Self {
        Self {
            resolver,
            prompt_builder: PromptBuilder::new(),
            client,
        }
    }

    /// 启动时构建；配置无效（包括缺少凭据）时返回错误，系统不进入就绪状态
    pub fn from_config(config: &Config) -> Result<Self, ReviewError> {
        config.validate()?;

        let http = build_client(&NetworkConfig::default())?;
        let client = ReviewClient::from_config(http.clone(), config)?;
        let resolver = SourceResolver::from_config(http, config);

        Ok(Self::new(resolver, client))
    }

    /// 执行一次审查，两个 I/O 点按顺序等待
    pub async fn run(&self, request_id: RequestId, request: &ReviewRequest) -> Result<String, ReviewError> {
        let span = tracing::info_span!(
            "review",
            request_id,
            source_kind = %request.source_kind,
            provider = self.client.provider_name(),
        );

        async move {
            let source = self.resolver.resolve(&request.raw_input).await?;
            let prompt = self.prompt_builder.build(&source);
            tracing::debug!(prompt_len = prompt.text.len(), "提示词已构建");

            let review = self.client.review(&prompt).await?;
            tracing::debug!(response_len = review.len(), "收到审查结果");
            Ok::<_, ReviewError>(review)
        }
        .instrument(span)
        .await
    }
}
