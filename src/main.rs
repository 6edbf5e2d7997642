use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use quiz_chain_agent::utils::logging;
use quiz_chain_agent::{App, Config};
use tracing::error;

/// 配置文件路径的环境变量，未设置时从环境变量读取配置
const CONFIG_FILE_ENV: &str = "QUIZ_AGENT_CONFIG";

#[tokio::main]
async fn main() -> ExitCode {
    // 初始化日志
    logging::init();

    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<bool> {
    // 加载配置
    let config = match std::env::var(CONFIG_FILE_ENV) {
        Ok(path) => Config::from_toml_file(&PathBuf::from(path))?,
        Err(_) => Config::from_env(),
    };

    let initial_url = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("QUIZ_URL").ok())
        .filter(|url| !url.trim().is_empty())
        .context("用法: quiz_chain_agent <initial_url>（或设置 QUIZ_URL）")?;

    // 初始化并运行应用
    let report = App::initialize(config)?.run(&initial_url).await;

    Ok(report.outcome.is_completed())
}
