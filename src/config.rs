use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// 程序配置
///
/// 启动时构造一次，之后以只读引用传给各个组件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 提交端点凭据 ---
    pub student_email: String,
    pub student_secret: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- 链路控制 ---
    /// 整条链路的时间预算（秒）
    pub quiz_timeout_secs: u64,
    /// 单个页面加载超时（毫秒）
    pub browser_timeout_ms: u64,
    /// 同一 URL 答错后的最大重试次数
    pub max_retries: u32,
    /// 提交答案的 HTTP 超时（秒）
    pub submit_timeout_secs: u64,
    /// 求解程序内 fetch 的 HTTP 超时（秒）
    pub http_timeout_secs: u64,
    /// 浏览器可执行文件路径，为空时由 chromiumoxide 自动查找
    pub chrome_executable: Option<String>,
    /// 是否输出完整的提示词和求解程序
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            student_email: String::new(),
            student_secret: String::new(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            quiz_timeout_secs: 180,
            browser_timeout_ms: 30_000,
            max_retries: 3,
            submit_timeout_secs: 30,
            http_timeout_secs: 30,
            chrome_executable: None,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            student_email: env_or("STUDENT_EMAIL", default.student_email),
            student_secret: env_or("STUDENT_SECRET", default.student_secret),
            llm_api_key: env_or("OPENAI_API_KEY", default.llm_api_key),
            llm_api_base_url: env_or("OPENAI_BASE_URL", default.llm_api_base_url),
            llm_model_name: env_or("OPENAI_MODEL", default.llm_model_name),
            quiz_timeout_secs: env_or("QUIZ_TIMEOUT_SECONDS", default.quiz_timeout_secs),
            browser_timeout_ms: env_or("BROWSER_TIMEOUT_MS", default.browser_timeout_ms),
            max_retries: env_or("MAX_RETRIES", default.max_retries),
            submit_timeout_secs: env_or("SUBMIT_TIMEOUT_SECONDS", default.submit_timeout_secs),
            http_timeout_secs: env_or("HTTP_TIMEOUT_SECONDS", default.http_timeout_secs),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().filter(|v| !v.is_empty()),
            verbose_logging: env_or("VERBOSE_LOGGING", default.verbose_logging),
        }
    }

    /// 从 TOML 文件加载配置，未出现的字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::InvalidToml { source, .. } => ConfigError::InvalidToml {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::InvalidToml {
            path: String::new(),
            source,
        })
    }

    /// 检查必填项，一次性列出所有缺失的字段
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if self.student_email.is_empty() {
            missing.push("STUDENT_EMAIL");
        }
        if self.student_secret.is_empty() {
            missing.push("STUDENT_SECRET");
        }
        if self.llm_api_key.is_empty() {
            missing.push("OPENAI_API_KEY");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingFields(missing.join(", ")))
        }
    }

    pub fn quiz_timeout(&self) -> Duration {
        Duration::from_secs(self.quiz_timeout_secs)
    }

    pub fn browser_timeout(&self) -> Duration {
        Duration::from_millis(self.browser_timeout_ms)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// 读取环境变量，未设置或无法解析时使用默认值
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    parse_or(std::env::var(key).ok(), default)
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
