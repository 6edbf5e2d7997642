//! 错误类型
//!
//! 按失败的处理方式分层：
//! - `ExtractionError` / `LlmError` / `SandboxError` 在各自组件内部被兜底吸收
//! - `ChainError` 是唯一会传到编排层的错误，直接终止整条链路
//! - `ConfigError` 只在启动阶段出现

use thiserror::Error;

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("缺少必填配置: {0}")]
    MissingFields(String),

    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("配置文件解析失败 ({path}): {source}")]
    InvalidToml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("浏览器配置失败: {0}")]
    ConfigurationFailed(String),

    #[error("启动无头浏览器失败: {source}")]
    LaunchFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },

    #[error("导航到 {url} 失败: {source}")]
    NavigationFailed {
        url: String,
        #[source]
        source: chromiumoxide::error::CdpError,
    },

    #[error("导航到 {url} 超时 ({timeout_ms} ms)")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    #[error("执行脚本失败: {0}")]
    ScriptExecutionFailed(#[from] chromiumoxide::error::CdpError),

    #[error("脚本返回值无法解析: {0}")]
    UnexpectedScriptResult(#[from] serde_json::Error),
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: async_openai::error::OpenAIError,
    },

    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },

    #[error("LLM 服务不可用: {0}")]
    Unavailable(String),
}

/// 题目信息抽取错误，总是被正则兜底吸收
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error(transparent)]
    Completion(#[from] LlmError),

    #[error("抽取结果不是合法 JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("抽取结果缺少字段: {0}")]
    MissingField(&'static str),

    #[error("未知的答案类型: {0}")]
    UnknownAnswerType(String),
}

/// 求解程序执行错误，总是被直接问答兜底吸收
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("求解程序无法解析: {0}")]
    InvalidProgram(#[source] serde_json::Error),

    #[error("JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON Pointer {0} 没有对应的值")]
    PointerNotFound(String),

    #[error("求解程序步骤过多: {count} > {max}")]
    TooManySteps { count: usize, max: usize },

    #[error("未定义的绑定: {0}")]
    UnknownBinding(String),

    #[error("请求 {url} 失败: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("正则表达式无效: {0}")]
    Regex(#[from] regex::Error),

    #[error("CSS 选择器无效: {0}")]
    Selector(String),

    #[error("CSV 解析失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("base64 解码失败: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("步骤 {op} 需要 {expected}")]
    TypeMismatch { op: &'static str, expected: &'static str },
}

impl SandboxError {
    pub fn http(url: impl Into<String>, source: reqwest::Error) -> Self {
        SandboxError::Http {
            url: url.into(),
            source,
        }
    }
}

/// 链路级错误：未被任何组件兜底的失败，终止整条链路
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("加载题目页面 {url} 失败: {source}")]
    Render {
        url: String,
        #[source]
        source: BrowserError,
    },
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, ChainError>;
