//! 求解程序的指令集
//!
//! LLM 产出的"代码"是一个 JSON 文档 `{"steps": [...]}`，由宿主逐条解释执行。
//! 每条指令只能使用固定的能力（HTTP、HTML、JSON、正则、base64、表格、数据处理），
//! 没有任何其他外部访问。

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::SandboxError;

/// 单个程序允许的最大步骤数
pub const MAX_STEPS: usize = 64;

/// 求解程序
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SolverProgram {
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl SolverProgram {
    /// 解析程序文本并检查步骤数
    pub fn parse(code: &str) -> Result<Self, SandboxError> {
        let program: SolverProgram =
            serde_json::from_str(code).map_err(SandboxError::InvalidProgram)?;
        if program.steps.len() > MAX_STEPS {
            return Err(SandboxError::TooManySteps {
                count: program.steps.len(),
                max: MAX_STEPS,
            });
        }
        Ok(program)
    }
}

/// 指令
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// 写入字面量
    Set { value: JsonValue, store_to: String },

    /// HTTP GET
    Fetch {
        url: String,
        #[serde(default)]
        format: FetchFormat,
        store_to: String,
    },

    /// 抓取网页可见文本
    ScrapeText { url: String, store_to: String },

    /// CSS 选择器取文本或属性
    SelectHtml {
        source: String,
        selector: String,
        #[serde(default)]
        attr: Option<String>,
        store_to: String,
    },

    ParseJson { source: String, store_to: String },

    /// RFC 6901 JSON Pointer
    JsonPointer {
        source: String,
        pointer: String,
        store_to: String,
    },

    /// 正则匹配，未匹配时写入 null
    RegexMatch {
        source: String,
        pattern: String,
        #[serde(default)]
        group: usize,
        #[serde(default)]
        all: bool,
        store_to: String,
    },

    ParseCsv { source: String, store_to: String },

    /// 按列过滤行
    Filter {
        source: String,
        column: String,
        cmp: Comparison,
        value: JsonValue,
        store_to: String,
    },

    /// 聚合
    Aggregate {
        source: String,
        #[serde(default)]
        column: Option<String>,
        func: Aggregation,
        store_to: String,
    },

    Base64Encode { source: String, store_to: String },

    Base64Decode { source: String, store_to: String },

    /// 字符串模板，`{name}` 替换为寄存器内容
    Format { template: String, store_to: String },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Set { .. } => "set",
            Step::Fetch { .. } => "fetch",
            Step::ScrapeText { .. } => "scrape_text",
            Step::SelectHtml { .. } => "select_html",
            Step::ParseJson { .. } => "parse_json",
            Step::JsonPointer { .. } => "json_pointer",
            Step::RegexMatch { .. } => "regex_match",
            Step::ParseCsv { .. } => "parse_csv",
            Step::Filter { .. } => "filter",
            Step::Aggregate { .. } => "aggregate",
            Step::Base64Encode { .. } => "base64_encode",
            Step::Base64Decode { .. } => "base64_decode",
            Step::Format { .. } => "format",
        }
    }

    /// 结果写入的寄存器
    pub fn store_to(&self) -> &str {
        match self {
            Step::Set { store_to, .. }
            | Step::Fetch { store_to, .. }
            | Step::ScrapeText { store_to, .. }
            | Step::SelectHtml { store_to, .. }
            | Step::ParseJson { store_to, .. }
            | Step::JsonPointer { store_to, .. }
            | Step::RegexMatch { store_to, .. }
            | Step::ParseCsv { store_to, .. }
            | Step::Filter { store_to, .. }
            | Step::Aggregate { store_to, .. }
            | Step::Base64Encode { store_to, .. }
            | Step::Base64Decode { store_to, .. }
            | Step::Format { store_to, .. } => store_to,
        }
    }
}

/// fetch 结果的形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchFormat {
    #[default]
    Text,
    Json,
    Base64,
    DataUri,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Contains,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Sum,
    Mean,
    Min,
    Max,
    Count,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_program() {
        let program = SolverProgram::parse(
            r#"{"steps": [
                {"op": "fetch", "url": "https://x.test/data.csv", "store_to": "raw"},
                {"op": "parse_csv", "source": "raw", "store_to": "rows"},
                {"op": "aggregate", "source": "rows", "column": "value", "func": "sum", "store_to": "answer"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(program.steps.len(), 3);
        assert_eq!(
            program.steps[0],
            Step::Fetch {
                url: "https://x.test/data.csv".to_string(),
                format: FetchFormat::Text,
                store_to: "raw".to_string(),
            }
        );
        assert_eq!(program.steps[2].name(), "aggregate");
        assert_eq!(program.steps[2].store_to(), "answer");
    }

    #[test]
    fn test_missing_steps_is_empty_program() {
        assert_eq!(SolverProgram::parse("{}").unwrap(), SolverProgram::default());
    }

    #[test]
    fn test_unknown_op_is_rejected() {
        let err = SolverProgram::parse(r#"{"steps": [{"op": "exec", "cmd": "rm -rf /"}]}"#)
            .unwrap_err();
        assert!(matches!(err, SandboxError::InvalidProgram(_)));
    }

    #[test]
    fn test_python_source_is_rejected() {
        let err = SolverProgram::parse("import requests\nanswer = 42").unwrap_err();
        assert!(matches!(err, SandboxError::InvalidProgram(_)));
    }

    #[test]
    fn test_step_limit() {
        let steps: Vec<_> = (0..=MAX_STEPS)
            .map(|i| json!({"op": "set", "value": i, "store_to": "x"}))
            .collect();
        let code = json!({ "steps": steps }).to_string();
        let err = SolverProgram::parse(&code).unwrap_err();
        assert!(matches!(err, SandboxError::TooManySteps { .. }));
    }
}
