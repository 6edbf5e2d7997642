//! 题目链路中流转的数据结构
//!
//! 每一轮迭代各产生一个 `QuizInfo`、`ExecutionResult`、`SubmissionResult`，
//! 都不会跨迭代保存。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::ExtractionError;

/// 答案类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerType {
    Number,
    #[default]
    String,
    Boolean,
    File,
    Json,
}

impl AnswerType {
    pub fn as_str(self) -> &'static str {
        match self {
            AnswerType::Number => "number",
            AnswerType::String => "string",
            AnswerType::Boolean => "boolean",
            AnswerType::File => "file",
            AnswerType::Json => "json",
        }
    }
}

impl FromStr for AnswerType {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "number" => Ok(AnswerType::Number),
            "string" => Ok(AnswerType::String),
            "boolean" => Ok(AnswerType::Boolean),
            "file" => Ok(AnswerType::File),
            "json" => Ok(AnswerType::Json),
            _ => Err(ExtractionError::UnknownAnswerType(s.to_string())),
        }
    }
}

impl fmt::Display for AnswerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 从题目页面抽取出的结构化信息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizInfo {
    pub question: String,
    pub answer_type: AnswerType,
    pub data_sources: Vec<String>,
    pub submit_url: String,
}

/// LLM 返回的原始 JSON，字段全部可选，校验在 `QuizInfo::from_llm_json` 中完成
#[derive(Debug, Deserialize)]
struct RawQuizInfo {
    question: Option<String>,
    answer_type: Option<String>,
    #[serde(default)]
    data_sources: Option<Vec<String>>,
    submit_url: Option<String>,
}

impl QuizInfo {
    /// 解析并校验 LLM 的结构化输出
    ///
    /// - `question`、`submit_url` 必须存在且非空
    /// - `answer_type` 缺省为 `string`，出现未知取值时报错
    pub fn from_llm_json(text: &str) -> Result<Self, ExtractionError> {
        let raw: RawQuizInfo = serde_json::from_str(text)?;

        let question = raw
            .question
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .ok_or(ExtractionError::MissingField("question"))?;

        let submit_url = raw
            .submit_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or(ExtractionError::MissingField("submit_url"))?;

        let answer_type = match raw.answer_type {
            Some(tag) => tag.parse()?,
            None => AnswerType::default(),
        };

        Ok(Self {
            question,
            answer_type,
            data_sources: raw.data_sources.unwrap_or_default(),
            submit_url,
        })
    }
}

/// 浏览器渲染后的页面内容
#[derive(Debug, Clone, Default)]
pub struct RenderedPage {
    /// `document.body.innerText`
    pub text: String,
    /// `document.body.innerHTML`
    pub html: String,
}

/// 求解程序的执行结果
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    /// 输出绑定 `answer` 的值，未赋值时为 `None`
    pub raw: Option<JsonValue>,
    /// 程序本身是否执行成功（走了直接问答兜底时为 false）
    pub succeeded: bool,
}

impl ExecutionResult {
    pub fn succeeded(raw: Option<JsonValue>) -> Self {
        Self {
            raw,
            succeeded: true,
        }
    }

    pub fn fallback(raw: Option<JsonValue>) -> Self {
        Self {
            raw,
            succeeded: false,
        }
    }
}

/// 提交端点的判定结果
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub correct: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl SubmissionResult {
    /// 由传输层失败合成的否定判定
    pub fn transport_failure(reason: impl Into<String>) -> Self {
        Self {
            correct: false,
            reason: Some(reason.into()),
            url: None,
        }
    }

    /// 下一题 URL，空字符串视为没有
    pub fn next_url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}
