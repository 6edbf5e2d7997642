use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use super::PageRenderer;
use crate::config::Config;
use crate::error::BrowserError;
use crate::infrastructure::js_executor::{BODY_HTML_SCRIPT, BODY_TEXT_SCRIPT, READY_STATE_SCRIPT};
use crate::infrastructure::JsExecutor;
use crate::models::RenderedPage;

/// 导航完成后等待页面稳定的间隔
const SETTLE_DELAY: Duration = Duration::from_millis(500);
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 无头浏览器渲染器
///
/// 每次 `render` 启动一个新的浏览器，读取页面后立即关闭，不跨迭代复用
pub struct HeadlessRenderer {
    chrome_executable: Option<PathBuf>,
    page_timeout: Duration,
}

impl HeadlessRenderer {
    pub fn new(config: &Config) -> Self {
        Self {
            chrome_executable: config.chrome_executable.as_ref().map(PathBuf::from),
            page_timeout: config.browser_timeout(),
        }
    }

    /// 启动无头浏览器，并在后台处理浏览器事件
    async fn launch(&self) -> Result<(Browser, JoinHandle<()>), BrowserError> {
        debug!("🚀 启动无头浏览器...");

        let mut builder = BrowserConfig::builder().new_headless_mode().args(vec![
            "--disable-gpu",
            "--no-sandbox",
            "--disable-dev-shm-usage",
        ]);
        if let Some(path) = &self.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let browser_config = builder.build().map_err(BrowserError::ConfigurationFailed)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|source| BrowserError::LaunchFailed { source })?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok((browser, handler_task))
    }

    /// 导航到题目页面并读取正文
    async fn load(&self, browser: &Browser, url: &str) -> Result<RenderedPage, BrowserError> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|source| BrowserError::NavigationFailed {
                url: url.to_string(),
                source,
            })?;

        let deadline = Instant::now() + self.page_timeout;
        let navigation = async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        };
        match timeout(self.page_timeout, navigation).await {
            Ok(Ok(())) => {}
            Ok(Err(source)) => {
                return Err(BrowserError::NavigationFailed {
                    url: url.to_string(),
                    source,
                })
            }
            Err(_) => {
                return Err(BrowserError::NavigationTimeout {
                    url: url.to_string(),
                    timeout_ms: self.page_timeout.as_millis() as u64,
                })
            }
        }

        let executor = JsExecutor::new(page);
        wait_until_idle(&executor, deadline).await;

        let text: String = executor.eval_as(BODY_TEXT_SCRIPT).await?;
        let html: String = executor.eval_as(BODY_HTML_SCRIPT).await?;

        info!("已加载题目页面: {}，正文长度: {}", url, text.len());
        Ok(RenderedPage { text, html })
    }
}

/// 等待文档加载完成再留出一段稳定时间，近似"网络空闲"
///
/// 超过截止时间后不再等待，直接读取当前内容
async fn wait_until_idle(executor: &JsExecutor, deadline: Instant) {
    loop {
        match executor.eval_as::<String>(READY_STATE_SCRIPT).await {
            Ok(state) if state == "complete" => break,
            Ok(state) => debug!("页面状态: {}", state),
            Err(e) => {
                debug!("读取页面状态失败: {}", e);
                break;
            }
        }
        if Instant::now() >= deadline {
            warn!("等待页面加载完成超时，直接读取当前内容");
            return;
        }
        sleep(READY_POLL_INTERVAL).await;
    }

    let settle = SETTLE_DELAY.min(deadline.saturating_duration_since(Instant::now()));
    sleep(settle).await;
}

#[async_trait]
impl PageRenderer for HeadlessRenderer {
    async fn render(&self, url: &str) -> Result<RenderedPage, BrowserError> {
        let (mut browser, handler_task) = self.launch().await?;

        let result = self.load(&browser, url).await;

        // 无论成功与否都释放浏览器
        if let Err(e) = browser.close().await {
            warn!("关闭浏览器失败: {}", e);
        }
        if let Err(e) = browser.wait().await {
            debug!("等待浏览器进程退出失败: {}", e);
        }
        handler_task.abort();

        result
    }
}
