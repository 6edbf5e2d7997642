//! 求解程序解释器
//!
//! 寄存器表是程序唯一可见的状态；预置 `question`、`data_sources`，
//! 执行结束后读取 `answer` 作为原始答案。

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value as JsonValue;
use tracing::debug;

use super::program::{Aggregation, Comparison, FetchFormat, SolverProgram, Step};
use crate::error::SandboxError;
use crate::models::QuizInfo;
use crate::services::data_processor::{self, DataProcessor};

/// 输出绑定
pub const ANSWER_BINDING: &str = "answer";

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex"))
}

pub struct Interpreter<'a> {
    data_processor: &'a DataProcessor,
    registers: HashMap<String, JsonValue>,
}

impl<'a> Interpreter<'a> {
    pub fn new(data_processor: &'a DataProcessor, quiz: &QuizInfo) -> Self {
        let mut registers = HashMap::new();
        registers.insert("question".to_string(), JsonValue::from(quiz.question.clone()));
        registers.insert(
            "data_sources".to_string(),
            JsonValue::from(quiz.data_sources.clone()),
        );
        Self {
            data_processor,
            registers,
        }
    }

    /// 依次执行所有步骤，返回 `answer` 的值（未赋值或为 null 时返回 `None`）
    pub async fn run(mut self, program: &SolverProgram) -> Result<Option<JsonValue>, SandboxError> {
        let total = program.steps.len();
        for (index, step) in program.steps.iter().enumerate() {
            debug!("执行步骤 {}/{}: {} → {}", index + 1, total, step.name(), step.store_to());
            let value = self.eval(step).await?;
            self.registers.insert(step.store_to().to_string(), value);
        }

        Ok(self
            .registers
            .remove(ANSWER_BINDING)
            .filter(|value| !value.is_null()))
    }

    async fn eval(&self, step: &Step) -> Result<JsonValue, SandboxError> {
        let value = match step {
            Step::Set { value, .. } => value.clone(),

            Step::Fetch { url, format, .. } => {
                let url = self.interpolate(url)?;
                let bytes = self.data_processor.download_file(&url).await?;
                match format {
                    FetchFormat::Text => JsonValue::from(String::from_utf8_lossy(&bytes).into_owned()),
                    FetchFormat::Json => data_processor::parse_json(&bytes)?,
                    FetchFormat::Base64 => JsonValue::from(BASE64.encode(&bytes)),
                    FetchFormat::DataUri => JsonValue::from(data_processor::encode_file_to_base64(&bytes)),
                }
            }

            Step::ScrapeText { url, .. } => {
                let url = self.interpolate(url)?;
                JsonValue::from(self.data_processor.scrape_website(&url).await?)
            }

            Step::SelectHtml {
                source,
                selector,
                attr,
                ..
            } => select_html(&self.text(source)?, selector, attr.as_deref())?,

            Step::ParseJson { source, .. } => match self.get(source)? {
                JsonValue::String(text) => serde_json::from_str(text)?,
                other => other.clone(),
            },

            Step::JsonPointer {
                source, pointer, ..
            } => self
                .get(source)?
                .pointer(pointer)
                .cloned()
                .ok_or_else(|| SandboxError::PointerNotFound(pointer.clone()))?,

            Step::RegexMatch {
                source,
                pattern,
                group,
                all,
                ..
            } => {
                let text = self.text(source)?;
                let re = Regex::new(pattern)?;
                if *all {
                    let matches: Vec<JsonValue> = re
                        .captures_iter(&text)
                        .filter_map(|caps| caps.get(*group))
                        .map(|m| JsonValue::from(m.as_str()))
                        .collect();
                    JsonValue::Array(matches)
                } else {
                    re.captures(&text)
                        .and_then(|caps| caps.get(*group))
                        .map(|m| JsonValue::from(m.as_str()))
                        .unwrap_or(JsonValue::Null)
                }
            }

            Step::ParseCsv { source, .. } => data_processor::parse_csv(&self.text(source)?)?,

            Step::Filter {
                source,
                column,
                cmp,
                value,
                ..
            } => {
                let rows = self.array(source, "filter")?;
                let kept: Vec<JsonValue> = rows
                    .iter()
                    .filter(|row| {
                        row.get(column.as_str())
                            .is_some_and(|cell| compare(cell, *cmp, value))
                    })
                    .cloned()
                    .collect();
                JsonValue::Array(kept)
            }

            Step::Aggregate {
                source,
                column,
                func,
                ..
            } => aggregate(self.array(source, "aggregate")?, column.as_deref(), *func)?,

            Step::Base64Encode { source, .. } => {
                JsonValue::from(BASE64.encode(self.text(source)?.as_bytes()))
            }

            Step::Base64Decode { source, .. } => {
                let bytes = BASE64.decode(self.text(source)?.trim())?;
                JsonValue::from(String::from_utf8_lossy(&bytes).into_owned())
            }

            Step::Format { template, .. } => JsonValue::from(self.interpolate(template)?),
        };

        Ok(value)
    }

    fn get(&self, name: &str) -> Result<&JsonValue, SandboxError> {
        self.registers
            .get(name)
            .ok_or_else(|| SandboxError::UnknownBinding(name.to_string()))
    }

    /// 字符串取其本身，其他值取 JSON 文本
    fn text(&self, name: &str) -> Result<String, SandboxError> {
        Ok(text_of(self.get(name)?))
    }

    fn array(&self, name: &str, op: &'static str) -> Result<&Vec<JsonValue>, SandboxError> {
        self.get(name)?.as_array().ok_or(SandboxError::TypeMismatch {
            op,
            expected: "an array",
        })
    }

    /// 把 `{name}` 替换为寄存器内容
    fn interpolate(&self, template: &str) -> Result<String, SandboxError> {
        let mut out = String::with_capacity(template.len());
        let mut last = 0;
        for caps in placeholder_regex().captures_iter(template) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&template[last..whole.start()]);
            out.push_str(&self.text(name.as_str())?);
            last = whole.end();
        }
        out.push_str(&template[last..]);
        Ok(out)
    }
}

fn text_of(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// 整数结果存为 JSON 整数
fn number_value(n: f64) -> JsonValue {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 {
        JsonValue::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null)
    }
}

fn select_html(html: &str, selector: &str, attr: Option<&str>) -> Result<JsonValue, SandboxError> {
    let selector = Selector::parse(selector).map_err(|e| SandboxError::Selector(e.to_string()))?;
    let document = Html::parse_document(html);

    let values: Vec<JsonValue> = document
        .select(&selector)
        .filter_map(|element| match attr {
            Some(name) => element.value().attr(name).map(JsonValue::from),
            None => {
                let text = element.text().collect::<Vec<_>>().join(" ");
                Some(JsonValue::from(text.split_whitespace().collect::<Vec<_>>().join(" ")))
            }
        })
        .collect();

    Ok(JsonValue::Array(values))
}

fn compare(cell: &JsonValue, cmp: Comparison, target: &JsonValue) -> bool {
    if cmp == Comparison::Contains {
        return text_of(cell).contains(&text_of(target));
    }

    let ordering = match (as_number(cell), as_number(target)) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => Some(text_of(cell).cmp(&text_of(target))),
    };

    match ordering {
        Some(ordering) => match cmp {
            Comparison::Eq => ordering == Ordering::Equal,
            Comparison::Ne => ordering != Ordering::Equal,
            Comparison::Gt => ordering == Ordering::Greater,
            Comparison::Ge => ordering != Ordering::Less,
            Comparison::Lt => ordering == Ordering::Less,
            Comparison::Le => ordering != Ordering::Greater,
            Comparison::Contains => false,
        },
        None => false,
    }
}

fn aggregate(
    items: &[JsonValue],
    column: Option<&str>,
    func: Aggregation,
) -> Result<JsonValue, SandboxError> {
    let values: Vec<&JsonValue> = items
        .iter()
        .filter_map(|item| match column {
            Some(name) => item.get(name),
            None => Some(item),
        })
        .filter(|value| !value.is_null())
        .collect();

    if func == Aggregation::Count {
        return Ok(JsonValue::from(values.len()));
    }

    let numbers: Vec<f64> = values.iter().filter_map(|v| as_number(v)).collect();
    if numbers.is_empty() {
        return match func {
            Aggregation::Sum => Ok(JsonValue::from(0)),
            _ => Err(SandboxError::TypeMismatch {
                op: "aggregate",
                expected: "at least one numeric value",
            }),
        };
    }

    let result = match func {
        Aggregation::Sum => numbers.iter().sum(),
        Aggregation::Mean => numbers.iter().sum::<f64>() / numbers.len() as f64,
        Aggregation::Min => numbers.iter().copied().fold(f64::INFINITY, f64::min),
        Aggregation::Max => numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Aggregation::Count => values.len() as f64,
    };

    Ok(number_value(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnswerType;
    use crate::utils::test_server::serve;
    use serde_json::json;
    use std::time::Duration;

    fn quiz() -> QuizInfo {
        QuizInfo {
            question: "What is the total?".to_string(),
            answer_type: AnswerType::Number,
            data_sources: vec!["https://x.test/data.csv".to_string()],
            submit_url: "https://x.test/submit".to_string(),
        }
    }

    async fn run(code: &str) -> Result<Option<JsonValue>, SandboxError> {
        let processor = DataProcessor::new(Duration::from_secs(1));
        let program = SolverProgram::parse(code)?;
        Interpreter::new(&processor, &quiz()).run(&program).await
    }

    #[tokio::test]
    async fn test_empty_program_leaves_answer_unset() {
        assert_eq!(run(r#"{"steps": []}"#).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_csv_filter_and_sum() {
        let code = r#"{"steps": [
            {"op": "set", "value": "region,value\nnorth,10\nsouth,5\nnorth,7\n", "store_to": "raw"},
            {"op": "parse_csv", "source": "raw", "store_to": "rows"},
            {"op": "filter", "source": "rows", "column": "region", "cmp": "eq", "value": "north", "store_to": "north"},
            {"op": "aggregate", "source": "north", "column": "value", "func": "sum", "store_to": "answer"}
        ]}"#;
        let answer = run(code).await.unwrap().unwrap();
        assert_eq!(answer, json!(17));
        assert!(answer.is_i64());
    }

    #[tokio::test]
    async fn test_numeric_filter_and_mean() {
        let code = r#"{"steps": [
            {"op": "set", "value": [{"v": 1}, {"v": 2}, {"v": 10}], "store_to": "rows"},
            {"op": "filter", "source": "rows", "column": "v", "cmp": "lt", "value": "5", "store_to": "small"},
            {"op": "aggregate", "source": "small", "column": "v", "func": "mean", "store_to": "answer"}
        ]}"#;
        assert_eq!(run(code).await.unwrap(), Some(json!(1.5)));
    }

    #[tokio::test]
    async fn test_regex_and_format() {
        let code = r#"{"steps": [
            {"op": "set", "value": "The secret code is 48213. Ignore 99.", "store_to": "page"},
            {"op": "regex_match", "source": "page", "pattern": "code is (\\d+)", "group": 1, "store_to": "code"},
            {"op": "format", "template": "code-{code}", "store_to": "answer"}
        ]}"#;
        assert_eq!(run(code).await.unwrap(), Some(json!("code-48213")));
    }

    #[tokio::test]
    async fn test_regex_all_matches() {
        let code = r#"{"steps": [
            {"op": "set", "value": "a1 b22 c333", "store_to": "t"},
            {"op": "regex_match", "source": "t", "pattern": "\\d+", "all": true, "store_to": "answer"}
        ]}"#;
        assert_eq!(run(code).await.unwrap(), Some(json!(["1", "22", "333"])));
    }

    #[tokio::test]
    async fn test_regex_no_match_is_null() {
        let code = r#"{"steps": [
            {"op": "regex_match", "source": "question", "pattern": "zzz", "store_to": "answer"}
        ]}"#;
        assert_eq!(run(code).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_select_html_text_and_attr() {
        let code = r#"{"steps": [
            {"op": "set", "value": "<ul><li><a href='/a'>One</a></li><li><a href='/b'>Two  words</a></li></ul>", "store_to": "html"},
            {"op": "select_html", "source": "html", "selector": "a", "store_to": "texts"},
            {"op": "select_html", "source": "html", "selector": "a", "attr": "href", "store_to": "answer"}
        ]}"#;
        assert_eq!(run(code).await.unwrap(), Some(json!(["/a", "/b"])));
    }

    #[tokio::test]
    async fn test_json_pointer_and_base64() {
        let code = r#"{"steps": [
            {"op": "set", "value": "{\"items\": [{\"name\": \"hello\"}]}", "store_to": "raw"},
            {"op": "parse_json", "source": "raw", "store_to": "doc"},
            {"op": "json_pointer", "source": "doc", "pointer": "/items/0/name", "store_to": "name"},
            {"op": "base64_encode", "source": "name", "store_to": "encoded"},
            {"op": "base64_decode", "source": "encoded", "store_to": "answer"}
        ]}"#;
        assert_eq!(run(code).await.unwrap(), Some(json!("hello")));
    }

    #[tokio::test]
    async fn test_preset_bindings() {
        let code = r#"{"steps": [
            {"op": "json_pointer", "source": "data_sources", "pointer": "/0", "store_to": "answer"}
        ]}"#;
        assert_eq!(run(code).await.unwrap(), Some(json!("https://x.test/data.csv")));
    }

    #[tokio::test]
    async fn test_unknown_binding_fails() {
        let code = r#"{"steps": [{"op": "parse_csv", "source": "missing", "store_to": "answer"}]}"#;
        assert!(matches!(run(code).await, Err(SandboxError::UnknownBinding(_))));

        let code = r#"{"steps": [{"op": "format", "template": "{nope}", "store_to": "answer"}]}"#;
        assert!(matches!(run(code).await, Err(SandboxError::UnknownBinding(_))));
    }

    #[tokio::test]
    async fn test_aggregate_requires_array() {
        let code = r#"{"steps": [{"op": "aggregate", "source": "question", "func": "sum", "store_to": "answer"}]}"#;
        assert!(matches!(run(code).await, Err(SandboxError::TypeMismatch { .. })));
    }

    #[test]
    fn test_aggregate_min_max_count() {
        let items = vec![json!(3), json!("7"), json!(null), json!(-1.5)];
        assert_eq!(aggregate(&items, None, Aggregation::Min).unwrap(), json!(-1.5));
        assert_eq!(aggregate(&items, None, Aggregation::Max).unwrap(), json!(7));
        assert_eq!(aggregate(&items, None, Aggregation::Count).unwrap(), json!(3));
        assert_eq!(aggregate(&[], None, Aggregation::Sum).unwrap(), json!(0));
        tokio_test::assert_err!(aggregate(&[], None, Aggregation::Mean));
    }

    #[test]
    fn test_compare_contains_and_strings() {
        assert!(compare(&json!("north-east"), Comparison::Contains, &json!("east")));
        assert!(compare(&json!("b"), Comparison::Gt, &json!("a")));
        assert!(compare(&json!("10"), Comparison::Gt, &json!(9)));
        assert!(compare(&json!(2), Comparison::Ne, &json!(3)));
    }

    #[tokio::test]
    async fn test_fetch_json_then_pointer() {
        let base = serve(200, "application/json", r#"{"items": [{"v": 2}, {"v": 5}]}"#).await;
        let code = json!({"steps": [
            {"op": "set", "value": base, "store_to": "base"},
            {"op": "fetch", "url": "{base}/data.json", "format": "json", "store_to": "data"},
            {"op": "json_pointer", "source": "data", "pointer": "/items/1/v", "store_to": "answer"}
        ]})
        .to_string();

        assert_eq!(run(&code).await.unwrap(), Some(json!(5)));
    }

    #[tokio::test]
    async fn test_fetch_text_base64_and_data_uri() {
        let base = serve(200, "text/plain", "hi").await;
        let url = format!("{}/file.bin", base);
        let code = json!({"steps": [
            {"op": "fetch", "url": url, "store_to": "text"},
            {"op": "fetch", "url": url, "format": "base64", "store_to": "b64"},
            {"op": "fetch", "url": url, "format": "data_uri", "store_to": "uri"},
            {"op": "format", "template": "{text}|{b64}|{uri}", "store_to": "answer"}
        ]})
        .to_string();

        assert_eq!(
            run(&code).await.unwrap(),
            Some(json!("hi|aGk=|data:application/octet-stream;base64,aGk="))
        );
    }

    #[tokio::test]
    async fn test_scrape_text_drops_scripts() {
        let base = serve(
            200,
            "text/html",
            "<html><body><h1>Secret code</h1><script>var leaked = 1;</script><p>Find 42</p></body></html>",
        )
        .await;
        let code = json!({"steps": [
            {"op": "scrape_text", "url": format!("{}/page", base), "store_to": "answer"}
        ]})
        .to_string();

        let text = run(&code).await.unwrap().unwrap();
        let text = text.as_str().unwrap();
        assert!(text.contains("Find 42"));
        assert!(!text.contains("leaked"));
    }

    #[tokio::test]
    async fn test_fetch_not_found_is_http_error() {
        let base = serve(404, "text/plain", "missing").await;
        let code = json!({"steps": [
            {"op": "fetch", "url": format!("{}/data.csv", base), "store_to": "answer"}
        ]})
        .to_string();

        let err = run(&code).await.unwrap_err();
        assert!(matches!(err, SandboxError::Http { .. }));
    }
}

