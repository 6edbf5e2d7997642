//! 求解程序执行服务 - 业务能力层
//!
//! 在受限的绑定集合上解释执行 LLM 生成的求解程序。
//! 执行失败时改为直接让 LLM 回答题目，错误不会越过这一层。
//!
//! 注意：程序通过 `fetch` / `scrape_text` 仍可访问任意网络地址，
//! 除了链路级的总时间预算之外没有额外的资源限制。

pub mod interpreter;
pub mod program;

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{error, info, warn};

use crate::clients::{CompletionRequest, CompletionService};
use crate::error::SandboxError;
use crate::models::{ExecutionResult, QuizInfo};
use crate::prompts;
use crate::services::data_processor::DataProcessor;
use crate::utils::logging::truncate_text;

pub use interpreter::{Interpreter, ANSWER_BINDING};
pub use program::{SolverProgram, Step, MAX_STEPS};

const DIRECT_ANSWER_TEMPERATURE: f32 = 0.1;

/// 求解程序执行服务
pub struct SandboxExecutor {
    llm: Arc<dyn CompletionService>,
    data_processor: DataProcessor,
}

impl SandboxExecutor {
    pub fn new(llm: Arc<dyn CompletionService>, data_processor: DataProcessor) -> Self {
        Self {
            llm,
            data_processor,
        }
    }

    /// 执行求解程序，从不返回错误
    pub async fn execute(&self, code: &str, quiz: &QuizInfo) -> ExecutionResult {
        match self.run_program(code, quiz).await {
            Ok(raw) => {
                match &raw {
                    Some(answer) => info!("✓ 求解程序执行成功，answer: {}", truncate_text(&answer.to_string(), 200)),
                    None => info!("求解程序执行成功，但未给 answer 赋值"),
                }
                ExecutionResult::succeeded(raw)
            }
            Err(e) => {
                error!("求解程序执行失败: {}", e);
                let answer = self.direct_answer(&quiz.question).await;
                ExecutionResult::fallback(Some(JsonValue::String(answer)))
            }
        }
    }

    async fn run_program(&self, code: &str, quiz: &QuizInfo) -> Result<Option<JsonValue>, SandboxError> {
        let program = SolverProgram::parse(code)?;
        Interpreter::new(&self.data_processor, quiz).run(&program).await
    }

    /// 兜底：不走程序，直接让 LLM 回答，失败时返回空字符串
    async fn direct_answer(&self, question: &str) -> String {
        info!("🤖 改为直接向 LLM 询问答案...");
        let request = CompletionRequest::new(
            prompts::QUIZ_SOLVER_SYSTEM_PROMPT,
            prompts::direct_answer_prompt(question),
            DIRECT_ANSWER_TEMPERATURE,
        );

        match self.llm.complete(request).await {
            Ok(answer) => answer.trim().to_string(),
            Err(e) => {
                warn!("直接问答也失败了: {}", e);
                String::new()
            }
        }
    }
}
