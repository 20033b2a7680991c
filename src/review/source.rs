use reqwest::Client;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::config::Config;
use crate::infrastructure::error::ReviewError;

/// GitHub 文件 URL 的固定前缀
pub const GITHUB_PREFIX: &str = "https://github.com/";

/// 输入来源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    GitHubReference,
    InlineCode,
}

impl SourceKind {
    /// 按内容分类：以 GitHub 前缀开头即视为 GitHub 引用
    pub fn classify(input: &str) -> Self {
        if input.starts_with(GITHUB_PREFIX) {
            SourceKind::GitHubReference
        } else {
            SourceKind::InlineCode
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::GitHubReference => "github",
            SourceKind::InlineCode => "direct",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "github" => Ok(SourceKind::GitHubReference),
            "direct" => Ok(SourceKind::InlineCode),
            other => Err(format!("unknown source kind: {}", other)),
        }
    }
}

/// 经过校验的审查请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRequest {
    pub source_kind: SourceKind,
    pub raw_input: String,
}

impl ReviewRequest {
    /// 在任何网络请求之前完成全部输入校验
    ///
    /// 顺序：先判空，再检查声明为 GitHub 的输入是否带有前缀，
    /// 最后对按内容识别为 GitHub 引用的输入解析路径结构。
    pub fn new(source_kind: SourceKind, raw_input: impl Into<String>) -> Result<Self, ReviewError> {
        let raw_input = raw_input.into();

        if raw_input.trim().is_empty() {
            return Err(ReviewError::InvalidInput { kind: source_kind });
        }
        if source_kind == SourceKind::GitHubReference && !raw_input.starts_with(GITHUB_PREFIX) {
            return Err(ReviewError::invalid_url(
                raw_input,
                format!("URL must start with {}", GITHUB_PREFIX),
            ));
        }
        if SourceKind::classify(&raw_input) == SourceKind::GitHubReference {
            GitHubFile::parse(&raw_input)?;
        }

        Ok(Self {
            source_kind,
            raw_input,
        })
    }
}

/// 从 GitHub blob URL 解析出的文件位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubFile {
    pub owner: String,
    pub repo: String,
    pub git_ref: String,
    pub path: String,
}

impl GitHubFile {
    /// 解析 `https://github.com/{owner}/{repo}/blob/{ref}/{path...}`
    pub fn parse(url: &str) -> Result<Self, ReviewError> {
        let rest = url
            .strip_prefix(GITHUB_PREFIX)
            .ok_or_else(|| ReviewError::invalid_url(url, format!("URL must start with {}", GITHUB_PREFIX)))?;

        // 多行代码片段或带换行的 URL 都不是合法的文件地址
        if rest.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ReviewError::invalid_url(url, "invalid character in URL"));
        }

        // 查询串与锚点（如 #L10）不属于文件路径
        let rest = rest.split(['?', '#']).next().unwrap_or_default();

        let segments: Vec<&str> = rest.split('/').collect();
        if segments.len() < 5 {
            return Err(ReviewError::invalid_url(
                url,
                "expected /{owner}/{repo}/blob/{ref}/{path}",
            ));
        }
        if segments[2] != "blob" {
            return Err(ReviewError::invalid_url(url, "missing /blob/ segment"));
        }

        let path_segments = &segments[4..];
        if segments[..4].iter().any(|s| s.is_empty()) || path_segments.iter().any(|s| s.is_empty()) {
            return Err(ReviewError::invalid_url(url, "empty path segment"));
        }

        Ok(Self {
            owner: segments[0].to_string(),
            repo: segments[1].to_string(),
            git_ref: segments[3].to_string(),
            path: path_segments.join("/"),
        })
    }
}

/// 分支选择策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefPolicy {
    /// 始终使用固定分支，忽略 URL 中的分支
    Fixed(String),
    /// 使用 URL 中的分支/标签
    FromUrl,
}

impl RefPolicy {
    fn select<'a>(&'a self, file: &'a GitHubFile) -> &'a str {
        match self {
            RefPolicy::Fixed(git_ref) => git_ref.as_str(),
            RefPolicy::FromUrl => file.git_ref.as_str(),
        }
    }
}

/// 解析后的待审查代码
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub code: String,
    /// 仅 GitHub 来源时设置，保存原始 URL 用于提示词溯源
    pub origin_label: Option<String>,
}

impl ResolvedSource {
    pub fn inline(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            origin_label: None,
        }
    }

    pub fn from_github(url: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            origin_label: Some(url.into()),
        }
    }
}

/// 来源解析器：判断输入类型，必要时抓取 GitHub 原始内容
pub struct SourceResolver {
    client: Client,
    raw_base_url: String,
    ref_policy: RefPolicy,
    timeout: Duration,
    max_bytes: usize,
}

impl SourceResolver {
    pub fn new(
        client: Client,
        raw_base_url: impl Into<String>,
        ref_policy: RefPolicy,
        timeout: Duration,
        max_bytes: usize,
    ) -> Self {
        Self {
            client,
            raw_base_url: raw_base_url.into(),
            ref_policy,
            timeout,
            max_bytes,
        }
    }

    pub fn from_config(client: Client, config: &Config) -> Self {
        let ref_policy = if config.honor_url_ref {
            RefPolicy::FromUrl
        } else {
            RefPolicy::Fixed(config.github_ref.clone())
        };

        Self::new(
            client,
            config.github_raw_url.clone(),
            ref_policy,
            config.fetch_timeout(),
            config.max_source_bytes,
        )
    }

    /// 构建原始内容地址 `{base}/{owner}/{repo}/{ref}/{path}`
    pub fn raw_url(&self, file: &GitHubFile) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.raw_base_url.trim_end_matches('/'),
            file.owner,
            file.repo,
            self.ref_policy.select(file),
            file.path
        )
    }

    pub async fn resolve(&self, input: &str) -> Result<ResolvedSource, ReviewError> {
        if input.trim().is_empty() {
            return Err(ReviewError::InvalidInput {
                kind: SourceKind::classify(input),
            });
        }

        match SourceKind::classify(input) {
            SourceKind::InlineCode => Ok(ResolvedSource::inline(input)),
            SourceKind::GitHubReference => {
                let file = GitHubFile::parse(input)?;
                let raw_url = self.raw_url(&file);
                let code = self.fetch(&raw_url).await?;
                Ok(ResolvedSource::from_github(input, code))
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<String, ReviewError> {
        tracing::debug!("获取 GitHub 原始内容: {}", url);

        let mut response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ReviewError::source_fetch(url, e.to_string()))?;

        if !response.status().is_success() {
            return Err(ReviewError::source_fetch(
                url,
                format!("Failed to fetch code from GitHub: {}", response.status()),
            ));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes as u64 {
                return Err(self.too_large(url));
            }
        }

        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ReviewError::source_fetch(url, e.to_string()))?
        {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(self.too_large(url));
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!("已获取 {} 字节", body.len());
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    fn too_large(&self, url: &str) -> ReviewError {
        ReviewError::source_fetch(
            url,
            format!("file exceeds the {} byte limit", self.max_bytes),
        )
    }
}
