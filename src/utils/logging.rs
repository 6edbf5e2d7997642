/// 日志工具模块
///
/// 提供日志初始化和格式化输出的辅助函数
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志，默认级别 info，可用 `RUST_LOG` 覆盖
///
/// 重复调用是安全的（测试里会多次调用）
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录链路启动信息
pub fn log_chain_start(initial_url: &str, timeout: Duration, max_retries: u32) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 开始解题链路 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🔗 起始地址: {}", initial_url);
    info!("⏱️ 时间预算: {} 秒, 单题最多重试 {} 次", timeout.as_secs(), max_retries);
    info!("{}", "=".repeat(60));
}

/// 记录单轮迭代开始
pub fn log_iteration_start(iteration: usize, url: &str, attempt: u32, elapsed: Duration) {
    info!("\n{}", "─".repeat(60));
    info!(
        "📄 第 {} 轮 | 第 {} 次尝试 | 已用时 {:.1}s",
        iteration,
        attempt + 1,
        elapsed.as_secs_f64()
    );
    info!("🔗 {}", url);
}

/// 打印最终统计信息
pub fn print_final_stats(outcome: &str, visited: &[String], iterations: usize, elapsed: Duration) {
    info!("\n{}", "=".repeat(60));
    info!("📊 解题链路结束");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("结果: {}", outcome);
    info!("迭代次数: {}, 用时: {:.1}s", iterations, elapsed.as_secs_f64());
    for (index, url) in visited.iter().enumerate() {
        info!("  {}. {}", index + 1, url);
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
