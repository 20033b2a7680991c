use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::review::source::SourceKind;

/// 下游失败时展示给用户的统一文案，避免泄露内部细节
pub const GENERIC_FAILURE_MESSAGE: &str = "Error getting code review";

/// 审查错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("输入为空: {kind} 请求没有可审查的内容")]
    InvalidInput { kind: SourceKind },

    #[error("无效的 GitHub URL: {url} ({reason})")]
    InvalidUrl { url: String, reason: String },

    #[error("GitHub 内容获取失败: {url} - {message}")]
    SourceFetch { url: String, message: String },

    #[error("模型调用失败: {provider} - {message}")]
    ModelInvocation { provider: String, message: String },

    #[error("配置错误: {message}")]
    Configuration { message: String },
}

impl ReviewError {
    /// 获取错误类别
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReviewError::InvalidInput { .. } => ErrorKind::InvalidInput,
            ReviewError::InvalidUrl { .. } => ErrorKind::InvalidUrl,
            ReviewError::SourceFetch { .. } => ErrorKind::SourceFetch,
            ReviewError::ModelInvocation { .. } => ErrorKind::ModelInvocation,
            ReviewError::Configuration { .. } => ErrorKind::Configuration,
        }
    }

    /// 面向用户的提示文案
    ///
    /// 校验错误返回具体提示；网络与模型错误统一折叠为通用文案，
    /// 详细原因只写入日志。
    pub fn user_message(&self) -> &'static str {
        match self {
            ReviewError::InvalidInput {
                kind: SourceKind::GitHubReference,
            } => "Please give a GitHub URL",
            ReviewError::InvalidInput {
                kind: SourceKind::InlineCode,
            } => "Please enter code to review",
            ReviewError::InvalidUrl { .. } => "Please enter a valid GitHub URL",
            ReviewError::SourceFetch { .. }
            | ReviewError::ModelInvocation { .. }
            | ReviewError::Configuration { .. } => GENERIC_FAILURE_MESSAGE,
        }
    }

    /// 创建配置错误
    pub fn config(message: impl Into<String>) -> Self {
        ReviewError::Configuration {
            message: message.into(),
        }
    }

    /// 创建 URL 错误
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        ReviewError::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// 创建内容获取错误
    pub fn source_fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        ReviewError::SourceFetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// 创建模型调用错误
    pub fn model_invocation(provider: impl Into<String>, message: impl Into<String>) -> Self {
        ReviewError::ModelInvocation {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidInput,
    InvalidUrl,
    SourceFetch,
    ModelInvocation,
    Configuration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::InvalidUrl => "invalid_url",
            ErrorKind::SourceFetch => "source_fetch",
            ErrorKind::ModelInvocation => "model_invocation",
            ErrorKind::Configuration => "configuration",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages_are_specific() {
        let github = ReviewError::InvalidInput {
            kind: SourceKind::GitHubReference,
        };
        let direct = ReviewError::InvalidInput {
            kind: SourceKind::InlineCode,
        };
        let url = ReviewError::invalid_url("http://gitlab.com/x", "missing prefix");

        assert_eq!(github.user_message(), "Please give a GitHub URL");
        assert_eq!(direct.user_message(), "Please enter code to review");
        assert_eq!(url.user_message(), "Please enter a valid GitHub URL");
    }

    #[test]
    fn test_downstream_errors_collapse_to_generic_message() {
        let errors = [
            ReviewError::source_fetch("https://raw.githubusercontent.com/a/b/main/c", "404 Not Found"),
            ReviewError::model_invocation("gemini", "401 Unauthorized: API key not valid"),
            ReviewError::config("CODE_REVIEW_GEMINI_API_KEY is not set"),
        ];

        for error in &errors {
            assert_eq!(error.user_message(), GENERIC_FAILURE_MESSAGE);
        }
    }

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(
            ReviewError::source_fetch("u", "m").kind(),
            ErrorKind::SourceFetch
        );
        assert_eq!(
            ReviewError::model_invocation("p", "m").kind(),
            ErrorKind::ModelInvocation
        );
        assert_eq!(ErrorKind::InvalidUrl.to_string(), "invalid_url");
    }

    #[test]
    fn test_display_keeps_detail_for_logs() {
        let error = ReviewError::source_fetch("https://raw.example/x", "503 Service Unavailable");
        let text = error.to_string();
        assert!(text.contains("https://raw.example/x"));
        assert!(text.contains("503"));
    }
}
