use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use crate::infrastructure::error::ReviewError;

/// 网络客户端配置
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub connect_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub user_agent: String,
    pub max_redirects: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(30),
            user_agent: format!("code-review-ai/{}", env!("CARGO_PKG_VERSION")),
            max_redirects: 10,
        }
    }
}

/// 构建共享 HTTP 客户端
///
/// 请求级超时由调用方通过 `RequestBuilder::timeout` 设置，
/// 这里只约束连接阶段。
pub fn build_client(config: &NetworkConfig) -> Result<Client, ReviewError> {
    ClientBuilder::new()
        .connect_timeout(config.connect_timeout)
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(10)
        .user_agent(&config.user_agent)
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
        .build()
        .map_err(|e| ReviewError::config(format!("Failed to create HTTP client: {}", e)))
}
