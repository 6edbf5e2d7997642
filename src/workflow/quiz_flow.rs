//! 单题处理流程 - 流程层
//!
//! 核心职责：定义"一道题"的完整处理流程
//!
//! 流程顺序：
//! 1. 加载页面（失败即终止链路）
//! 2. LLM 抽取题目信息（失败走正则兜底）
//! 3. LLM 生成求解程序（失败得到空程序）
//! 4. 执行求解程序（失败走直接问答兜底）
//! 5. 按答案类型格式化
//! 6. 提交（失败合成否定判定）

use std::sync::Arc;

use tracing::{info, info_span, warn, Instrument};

use crate::browser::PageRenderer;
use crate::clients::{AnswerSubmitter, CompletionService};
use crate::config::Config;
use crate::error::{AppResult, ChainError};
use crate::models::SubmissionResult;
use crate::services::{
    format_answer, DataProcessor, QuizInfoExtractor, SandboxExecutor, SolutionCodeGenerator,
};
use crate::utils::logging::truncate_text;
use crate::workflow::chain_state::ChainStage;

/// 单题处理流程
///
/// - 按固定顺序调用各个服务
/// - 不持有链路状态，不决定下一步去哪
pub struct QuizFlow {
    renderer: Arc<dyn PageRenderer>,
    extractor: QuizInfoExtractor,
    generator: SolutionCodeGenerator,
    executor: SandboxExecutor,
    submitter: Arc<dyn AnswerSubmitter>,
}

impl QuizFlow {
    /// 创建新的单题流程
    pub fn new(
        config: &Config,
        llm: Arc<dyn CompletionService>,
        renderer: Arc<dyn PageRenderer>,
        submitter: Arc<dyn AnswerSubmitter>,
    ) -> Self {
        Self {
            renderer,
            extractor: QuizInfoExtractor::new(llm.clone()),
            generator: SolutionCodeGenerator::new(llm.clone(), config.verbose_logging),
            executor: SandboxExecutor::new(llm, DataProcessor::new(config.http_timeout())),
            submitter,
        }
    }

    /// 完整处理一道题，返回提交判定
    ///
    /// 只有页面加载失败会返回错误，其他失败都在各服务内部兜底
    pub async fn run(&self, quiz_url: &str) -> AppResult<SubmissionResult> {
        let page = self
            .renderer
            .render(quiz_url)
            .instrument(info_span!("stage", name = %ChainStage::Fetching))
            .await
            .map_err(|source| ChainError::Render {
                url: quiz_url.to_string(),
                source,
            })?;
        info!("[{}] 页面正文长度: {}", ChainStage::Fetching, page.text.len());

        let quiz = self
            .extractor
            .extract(&page.text)
            .instrument(info_span!("stage", name = %ChainStage::Extracting))
            .await;
        info!("[{}] 题目: {}", ChainStage::Extracting, truncate_text(&quiz.question, 120));

        let code = self
            .generator
            .generate(&quiz.question)
            .instrument(info_span!("stage", name = %ChainStage::Generating))
            .await;

        let execution = self
            .executor
            .execute(&code, &quiz)
            .instrument(info_span!("stage", name = %ChainStage::Executing))
            .await;
        if !execution.succeeded {
            warn!("[{}] 求解程序未成功，使用直接问答的答案", ChainStage::Executing);
        }

        let answer = format_answer(execution.raw, quiz.answer_type);
        info!(
            "[{}] 答案 ({}): {}",
            ChainStage::Formatting,
            quiz.answer_type,
            answer
                .as_ref()
                .map(|a| truncate_text(&a.to_string(), 200))
                .unwrap_or_else(|| "null".to_string())
        );

        let result = self
            .submitter
            .submit(&quiz.submit_url, quiz_url, answer.as_ref())
            .instrument(info_span!("stage", name = %ChainStage::Submitting))
            .await;

        Ok(result)
    }
}
