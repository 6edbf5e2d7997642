//! 数据处理工具 - 只在求解程序内部被调用
//!
//! 下载文件、抓取网页文本、解析 CSV / JSON、编码 data URI

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use scraper::{ElementRef, Html, Node, Selector};
use serde_json::{Map, Value as JsonValue};
use tracing::{info, warn};

use crate::error::SandboxError;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// 整棵子树都忽略的标签
const SKIP_TAGS: [&str; 4] = ["script", "style", "noscript", "svg"];

/// 数据处理工具
#[derive(Clone)]
pub struct DataProcessor {
    http: reqwest::Client,
}

impl DataProcessor {
    pub fn new(timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("构建 HTTP 客户端失败，使用默认客户端: {}", e);
                reqwest::Client::new()
            });
        Self { http }
    }

    /// 下载文件，非 2xx 视为失败
    pub async fn download_file(&self, url: &str) -> Result<Vec<u8>, SandboxError> {
        info!("下载文件: {}", url);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SandboxError::http(url, e))?;
        let bytes = response.bytes().await.map_err(|e| SandboxError::http(url, e))?;
        Ok(bytes.to_vec())
    }

    /// 抓取网页的可见文本
    pub async fn scrape_website(&self, url: &str) -> Result<String, SandboxError> {
        info!("抓取网页: {}", url);
        let bytes = self.download_file(url).await?;
        Ok(html_to_text(&String::from_utf8_lossy(&bytes)))
    }
}

/// 提取 HTML 中的可读文本，跳过 script/style 等标签
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next());
    let root = body.unwrap_or_else(|| document.root_element());

    let mut parts = Vec::new();
    collect_element_text(root, &mut parts);
    parts.join(" ")
}

fn collect_element_text(element: ElementRef, parts: &mut Vec<String>) {
    if SKIP_TAGS.contains(&element.value().name()) {
        return;
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let t = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if !t.is_empty() {
                    parts.push(t);
                }
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_element_text(child_element, parts);
                }
            }
            _ => {}
        }
    }
}

/// CSV 文本 → 以表头为键的对象数组
///
/// 能解析为数字的单元格存为数字
pub fn parse_csv(content: &str) -> Result<JsonValue, SandboxError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record?;
        let mut row = Map::new();
        for (header, cell) in headers.iter().zip(record.iter()) {
            row.insert(header.to_string(), cell_value(cell));
        }
        rows.push(JsonValue::Object(row));
    }

    Ok(JsonValue::Array(rows))
}

fn cell_value(cell: &str) -> JsonValue {
    if let Ok(i) = cell.parse::<i64>() {
        return JsonValue::from(i);
    }
    cell.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(cell.to_string()))
}

pub fn parse_json(content: &[u8]) -> Result<JsonValue, SandboxError> {
    Ok(serde_json::from_slice(content)?)
}

/// 编码为 `data:application/octet-stream;base64,...`
pub fn encode_file_to_base64(content: &[u8]) -> String {
    format!(
        "data:application/octet-stream;base64,{}",
        BASE64.encode(content)
    )
}
