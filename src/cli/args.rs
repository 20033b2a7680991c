use clap::{ArgGroup, Parser};
use std::path::PathBuf;

use crate::infrastructure::logging::LogFormat;

#[derive(Parser, Debug, Default)]
#[command(
    name = "code-review-ai",
    version,
    about = "AI 代码审查工具 - 审查 GitHub 文件或直接粘贴的代码片段",
    long_about = "code-review-ai 接受一个 GitHub 文件 URL 或一段代码，将其与固定的审查提示词一起发送给 Gemini 模型，并输出模型返回的审查文本。不指定输入时从标准输入读取代码。"
)]
#[command(group(ArgGroup::new("input").args(["github", "code", "file"])))]
pub struct Args {
    /// GitHub 文件 URL（如 https://github.com/owner/repo/blob/main/src/lib.rs）
    #[arg(short = 'g', long, value_name = "URL")]
    pub github: Option<String>,

    /// 直接审查的代码片段
    #[arg(short = 'c', long, value_name = "CODE")]
    pub code: Option<String>,

    /// 从本地文件读取代码片段
    #[arg(short = 'f', long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Model to use (default: gemini-1.5-flash)
    #[arg(short, long)]
    pub model: Option<String>,

    /// 使用 URL 中的分支/标签，而不是固定的 main 分支
    #[arg(long = "honor-ref", default_value_t = false)]
    pub honor_ref: bool,

    /// 将审查结果写入文件而不是标准输出
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// 日志格式 (pretty, compact, json)
    #[arg(long = "log-format", default_value = "compact")]
    pub log_format: String,

    /// 日志追加写入的文件（默认输出到标准错误）
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    pub fn log_format(&self) -> LogFormat {
        self.log_format.parse().unwrap_or(LogFormat::Compact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_github_url() {
        let args = Args::parse_from([
            "code-review-ai",
            "--github",
            "https://github.com/acme/widgets/blob/main/src/index.js",
        ]);
        assert_eq!(
            args.github.as_deref(),
            Some("https://github.com/acme/widgets/blob/main/src/index.js")
        );
        assert!(args.code.is_none());
        assert!(!args.honor_ref);
    }

    #[test]
    fn test_parse_code_with_options() {
        let args = Args::parse_from([
            "code-review-ai",
            "-c",
            "print(1)",
            "-m",
            "gemini-2.0-flash",
            "--verbose",
            "--log-format",
            "json",
        ]);
        assert_eq!(args.code.as_deref(), Some("print(1)"));
        assert_eq!(args.model.as_deref(), Some("gemini-2.0-flash"));
        assert!(args.verbose);
        assert_eq!(args.log_format(), LogFormat::Json);
    }

    #[test]
    fn test_inputs_are_mutually_exclusive() {
        let result = Args::try_parse_from([
            "code-review-ai",
            "--github",
            "https://github.com/a/b/blob/main/c",
            "--code",
            "x",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_log_file_and_output() {
        let args = Args::parse_from([
            "code-review-ai",
            "-f",
            "snippet.py",
            "-o",
            "review.md",
            "--log-file",
            "/tmp/code-review.log",
        ]);
        assert_eq!(args.file, Some(PathBuf::from("snippet.py")));
        assert_eq!(args.output, Some(PathBuf::from("review.md")));
        assert_eq!(args.log_file, Some(PathBuf::from("/tmp/code-review.log")));
    }

    #[test]
    fn test_unknown_log_format_falls_back() {
        let args = Args::parse_from(["code-review-ai", "--log-format", "xml"]);
        assert_eq!(args.log_format(), LogFormat::Compact);
    }
}
