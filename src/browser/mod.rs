pub mod headless;

use async_trait::async_trait;

use crate::error::BrowserError;
use crate::models::RenderedPage;

pub use headless::HeadlessRenderer;

/// 页面渲染能力
///
/// 每次调用独占一个浏览器上下文，返回前释放
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<RenderedPage, BrowserError>;
}
