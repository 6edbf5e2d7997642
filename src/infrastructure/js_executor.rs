//! JS 执行器 - 基础设施层
//!
//! 持有 page 资源，只暴露"执行 JS"的能力

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::BrowserError;

/// 读取页面正文文本
pub const BODY_TEXT_SCRIPT: &str = "document.body ? document.body.innerText : ''";
/// 读取页面正文 HTML
pub const BODY_HTML_SCRIPT: &str = "document.body ? document.body.innerHTML : ''";
/// 读取文档加载状态
pub const READY_STATE_SCRIPT: &str = "document.readyState";

/// JS 执行器
///
/// 职责：
/// - 持有 Page 资源
/// - 暴露 eval() 能力
/// - 不认识 QuizInfo，不处理业务流程
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue, BrowserError> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T, BrowserError> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }
}
