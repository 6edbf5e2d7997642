use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::browser::HeadlessRenderer;
use crate::clients::{LlmClient, SubmissionClient};
use crate::config::Config;
use crate::orchestrator::{ChainOrchestrator, ChainReport};
use crate::utils::logging::print_final_stats;
use crate::workflow::QuizFlow;

/// 应用主结构
pub struct App {
    orchestrator: ChainOrchestrator,
}

impl App {
    /// 初始化应用：校验配置并装配真实的协作者
    pub fn initialize(config: Config) -> Result<Self> {
        config.validate().context("配置校验失败")?;

        log_startup(&config);

        let llm = Arc::new(LlmClient::new(&config));
        let renderer = Arc::new(HeadlessRenderer::new(&config));
        let submitter = Arc::new(SubmissionClient::new(&config));

        let flow = QuizFlow::new(&config, llm, renderer, submitter);
        let orchestrator = ChainOrchestrator::new(flow, &config);

        Ok(Self { orchestrator })
    }

    /// 运行应用主逻辑
    pub async fn run(&self, initial_url: &str) -> ChainReport {
        let report = self.orchestrator.run(initial_url).await;

        print_final_stats(
            &report.outcome.to_string(),
            &report.visited,
            report.iterations,
            report.elapsed,
        );

        report
    }
}

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 解题链路模式");
    info!("🤖 模型: {} @ {}", config.llm_model_name, config.llm_api_base_url);
    info!("📧 学生: {}", config.student_email);
    info!("{}", "=".repeat(60));
}
