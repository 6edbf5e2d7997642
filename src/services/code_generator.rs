//! 求解程序生成服务 - 业务能力层
//!
//! 让 LLM 把题目转成求解程序（JSON 步骤列表），失败时返回空程序

use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{debug, info, warn};

use crate::clients::{CompletionRequest, CompletionService};
use crate::prompts;
use crate::utils::logging::truncate_text;

/// 不给 `answer` 赋值的空程序
pub const NOOP_PROGRAM: &str = r#"{"steps": []}"#;

const GENERATION_TEMPERATURE: f32 = 0.2;

fn tagged_fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?si)```json\w*[ \t]*\r?\n(.*?)```").expect("tagged fence regex"))
}

fn any_fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```\w*[ \t]*\r?\n(.*?)```").expect("any fence regex"))
}

/// 求解程序生成服务
pub struct SolutionCodeGenerator {
    llm: Arc<dyn CompletionService>,
    verbose_logging: bool,
}

impl SolutionCodeGenerator {
    pub fn new(llm: Arc<dyn CompletionService>, verbose_logging: bool) -> Self {
        Self {
            llm,
            verbose_logging,
        }
    }

    /// 生成求解程序，从不返回错误
    pub async fn generate(&self, question: &str) -> String {
        let request = CompletionRequest::new(
            prompts::QUIZ_SOLVER_SYSTEM_PROMPT,
            prompts::code_generation_prompt(question),
            GENERATION_TEMPERATURE,
        );

        match self.llm.complete(request).await {
            Ok(response) => {
                let code = strip_code_fence(&response).to_string();
                if self.verbose_logging {
                    info!("生成的求解程序:\n{}", code);
                } else {
                    info!("生成的求解程序: {}", truncate_text(&code, 200));
                }
                code
            }
            Err(e) => {
                warn!("⚠️ 生成求解程序失败，使用空程序: {}", e);
                NOOP_PROGRAM.to_string()
            }
        }
    }
}

/// 去掉 markdown 代码围栏
///
/// 优先取带 `json` 标记（不区分大小写）的围栏，其次取任意标记或无标记的围栏，都没有时返回原文
pub fn strip_code_fence(response: &str) -> &str {
    if let Some(caps) = tagged_fence_regex().captures(response) {
        debug!("使用 ```json 围栏中的内容");
        return caps.get(1).map_or(response, |m| m.as_str().trim());
    }
    if let Some(caps) = any_fence_regex().captures(response) {
        debug!("使用其他围栏中的内容");
        return caps.get(1).map_or(response, |m| m.as_str().trim());
    }
    response.trim()
}
