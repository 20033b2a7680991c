use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use tracing::Level;

use crate::infrastructure::error::ReviewError;
use crate::infrastructure::logging::{LogFormat, LogOutput, LoggingConfig};

pub const ENV_API_KEY: &str = "CODE_REVIEW_GEMINI_API_KEY";
pub const ENV_MODEL: &str = "CODE_REVIEW_MODEL";
pub const ENV_GEMINI_URL: &str = "CODE_REVIEW_GEMINI_URL";
pub const ENV_GITHUB_RAW_URL: &str = "CODE_REVIEW_GITHUB_RAW_URL";
pub const ENV_GITHUB_REF: &str = "CODE_REVIEW_GITHUB_REF";
pub const ENV_HONOR_URL_REF: &str = "CODE_REVIEW_HONOR_URL_REF";
pub const ENV_FETCH_TIMEOUT: &str = "CODE_REVIEW_FETCH_TIMEOUT";
pub const ENV_REVIEW_TIMEOUT: &str = "CODE_REVIEW_REVIEW_TIMEOUT";
pub const ENV_MAX_SOURCE_BYTES: &str = "CODE_REVIEW_MAX_SOURCE_BYTES";
pub const ENV_DEBUG: &str = "CODE_REVIEW_DEBUG";
pub const ENV_LOG_FILE: &str = "CODE_REVIEW_LOG_FILE";
pub const ENV_LOG_FILTER: &str = "CODE_REVIEW_LOG_FILTER";

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub model: String,
    pub gemini_url: String,
    pub github_raw_url: String,
    /// 抓取文件时使用的固定分支
    pub github_ref: String,
    /// 为 true 时使用 URL 中的分支/标签，而不是 `github_ref`
    pub honor_url_ref: bool,
    pub fetch_timeout_secs: u64,
    pub review_timeout_secs: u64,
    pub max_source_bytes: usize,
    pub debug: bool,
    /// 日志追加写入的文件，未设置时写到标准错误
    pub log_file: Option<PathBuf>,
    /// 显式的 tracing 过滤指令，覆盖 RUST_LOG
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gemini_api_key: None,
            model: "gemini-1.5-flash".to_string(),
            gemini_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            github_raw_url: "https://raw.githubusercontent.com".to_string(),
            github_ref: "main".to_string(),
            honor_url_ref: false,
            fetch_timeout_secs: 30,
            review_timeout_secs: 120,
            max_source_bytes: 256 * 1024,
            debug: false,
            log_file: None,
            log_filter: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        let mut config = Config::default();

        // 加载配置文件
        #[cfg(not(test))]
        config.load_from_env_file();
        // 加载环境变量（覆盖配置文件）
        config.load_from_env();

        config
    }

    pub fn load_from_env_file(&mut self) {
        let home = env::var_os("HOME").map(PathBuf::from);
        let cwd = env::current_dir().ok();
        self.load_env_files(home.as_deref(), cwd.as_deref());
    }

    /// 依次加载 `{home}/.code-review-ai/.env` 与 `{dir}/.env`，后者覆盖前者
    pub fn load_env_files(&mut self, home: Option<&Path>, dir: Option<&Path>) {
        if let Some(home) = home {
            self.load_env_file(&home.join(".code-review-ai").join(".env"));
        }
        if let Some(dir) = dir {
            self.load_env_file(&dir.join(".env"));
        }
    }

    /// 读取单个 .env 文件，不修改进程环境；返回是否成功加载
    pub fn load_env_file(&mut self, path: &Path) -> bool {
        if !path.exists() {
            return false;
        }

        match dotenvy::from_path_iter(path) {
            Ok(iter) => {
                let vars: HashMap<String, String> = iter.filter_map(Result::ok).collect();
                self.apply_vars(|key| vars.get(key).cloned());
                true
            }
            Err(e) => {
                tracing::warn!("无法读取配置文件 {}: {}", path.display(), e);
                false
            }
        }
    }

    pub fn load_from_env(&mut self) {
        self.apply_vars(|key| env::var(key).ok());
    }

    /// 从任意键值来源覆盖配置，便于测试时不触碰进程环境
    pub fn apply_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_key) = lookup(ENV_API_KEY) {
            self.gemini_api_key = Some(api_key);
        }
        if let Some(model) = lookup(ENV_MODEL) {
            self.model = model;
        }
        if let Some(url) = lookup(ENV_GEMINI_URL) {
            self.gemini_url = url;
        }
        if let Some(url) = lookup(ENV_GITHUB_RAW_URL) {
            self.github_raw_url = url;
        }
        if let Some(git_ref) = lookup(ENV_GITHUB_REF) {
            self.github_ref = git_ref;
        }
        parse_into(&lookup, ENV_HONOR_URL_REF, &mut self.honor_url_ref);
        parse_into(&lookup, ENV_FETCH_TIMEOUT, &mut self.fetch_timeout_secs);
        parse_into(&lookup, ENV_REVIEW_TIMEOUT, &mut self.review_timeout_secs);
        parse_into(&lookup, ENV_MAX_SOURCE_BYTES, &mut self.max_source_bytes);
        parse_into(&lookup, ENV_DEBUG, &mut self.debug);
        if let Some(path) = lookup(ENV_LOG_FILE) {
            self.log_file = Some(PathBuf::from(path));
        }
        if let Some(filter) = lookup(ENV_LOG_FILTER) {
            self.log_filter = Some(filter);
        }
    }

    pub fn update_from_args(&mut self, args: &crate::cli::args::Args) {
        // 命令行参数优先级最高
        if let Some(model) = &args.model {
            self.model = model.clone();
        }
        if args.honor_ref {
            self.honor_url_ref = true;
        }
        if args.verbose {
            self.debug = true;
        }
        if let Some(path) = &args.log_file {
            self.log_file = Some(path.clone());
        }
    }

    /// 根据配置生成日志设置
    pub fn logging_config(&self, format: LogFormat) -> LoggingConfig {
        LoggingConfig {
            level: if self.debug { Level::DEBUG } else { Level::INFO },
            format,
            output: match &self.log_file {
                Some(path) => LogOutput::File(path.clone()),
                None => LogOutput::Stderr,
            },
            include_file_location: self.debug,
            filter: self.log_filter.clone(),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn review_timeout(&self) -> Duration {
        Duration::from_secs(self.review_timeout_secs)
    }

    /// 返回已校验的凭据
    pub fn api_key(&self) -> Result<&str, ReviewError> {
        match self.gemini_api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ReviewError::config(format!(
                "Gemini API key is required but not set. Please set {} environment variable or in .env file",
                ENV_API_KEY
            ))),
        }
    }

    pub fn validate(&self) -> Result<(), ReviewError> {
        self.api_key()?;

        if self.model.trim().is_empty() {
            return Err(ReviewError::config("Model name must not be empty"));
        }
        for (name, value) in [
            (ENV_GEMINI_URL, &self.gemini_url),
            (ENV_GITHUB_RAW_URL, &self.github_raw_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| ReviewError::config(format!("{} is not a valid URL ({}): {}", name, value, e)))?;
        }
        if self.github_ref.trim().is_empty() {
            return Err(ReviewError::config(format!("{} must not be empty", ENV_GITHUB_REF)));
        }
        if self.fetch_timeout_secs == 0 || self.review_timeout_secs == 0 {
            return Err(ReviewError::config("Timeouts must be greater than zero"));
        }
        if self.max_source_bytes == 0 {
            return Err(ReviewError::config(format!(
                "{} must be greater than zero",
                ENV_MAX_SOURCE_BYTES
            )));
        }
        Ok(())
    }
}

/// 解析数值/布尔类环境变量，失败时保留默认值并告警
fn parse_into<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse::<T>() {
            Ok(value) => *target = value,
            Err(_) => tracing::warn!("忽略无效的配置 {}={}，使用默认值", key, raw),
        }
    }
}
