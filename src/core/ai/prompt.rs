use crate::review::source::ResolvedSource;

/// 审查清单，顺序固定，模型按此结构组织回复
pub const REVIEW_CHECKLIST: [&str; 6] = [
    "⭐ Code quality",
    "🐞 Potential bugs",
    "🚀 Performance rating",
    "📏 Best practices rating",
    "💡 Improvements suggestions",
    "📝 Improved code snippet",
];

/// 发送给模型的完整提示词
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPrompt {
    pub text: String,
}

impl ReviewPrompt {
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// 提示词构建器
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// 构建审查提示词：清单 → 可选的来源行 → 代码
    pub fn build(&self, source: &ResolvedSource) -> ReviewPrompt {
        let mut text = String::with_capacity(source.code.len() + 256);

        text.push_str("Review this code and provide:\n");
        for (index, item) in REVIEW_CHECKLIST.iter().enumerate() {
            text.push_str(&format!("{}. {}\n", index + 1, item));
        }
        text.push('\n');

        if let Some(origin) = &source.origin_label {
            text.push_str("GitHub Source: ");
            text.push_str(origin);
            text.push('\n');
        }

        text.push_str("Code to review:\n");
        text.push_str(&source.code);

        ReviewPrompt { text }
    }
}
