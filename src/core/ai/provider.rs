use anyhow::Result;
use async_trait::async_trait;

/// 审查模型接口
///
/// 每次调用都是独立、无状态的单轮请求。
#[async_trait]
pub trait ReviewModel: Send + Sync {
    /// 提供商名称，用于日志与错误信息
    fn name(&self) -> &str;

    /// 生成完整响应（非流式）
    async fn generate(&self, prompt: &str) -> Result<String>;
}
