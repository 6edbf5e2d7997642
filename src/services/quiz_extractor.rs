//! 题目信息抽取服务 - 业务能力层
//!
//! 只负责"页面文本 → QuizInfo"，失败时用正则兜底，从不返回错误

use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{debug, info, warn};

use crate::clients::{CompletionRequest, CompletionService};
use crate::error::ExtractionError;
use crate::models::{AnswerType, QuizInfo};
use crate::prompts;
use crate::utils::logging::truncate_text;

/// 送入提示词的页面文本上限（字符）
const MAX_CONTENT_CHARS: usize = 4000;
/// 兜底时作为题目的页面文本长度（字符）
const FALLBACK_QUESTION_CHARS: usize = 500;
const EXTRACTION_TEMPERATURE: f32 = 0.1;

fn submit_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"https?://[^\s<>"]+/submit"#).expect("submit url regex"))
}

/// 题目信息抽取服务
pub struct QuizInfoExtractor {
    llm: Arc<dyn CompletionService>,
}

impl QuizInfoExtractor {
    pub fn new(llm: Arc<dyn CompletionService>) -> Self {
        Self { llm }
    }

    /// 抽取题目信息
    ///
    /// LLM 调用或解析失败时走 [`fallback_quiz_info`]，总能得到一个 `QuizInfo`
    pub async fn extract(&self, page_text: &str) -> QuizInfo {
        match self.extract_with_llm(page_text).await {
            Ok(info) => {
                info!(
                    "✓ 抽取题目信息: answer_type={}, data_sources={}, submit_url={}",
                    info.answer_type,
                    info.data_sources.len(),
                    info.submit_url
                );
                info
            }
            Err(e) => {
                warn!("⚠️ LLM 抽取题目信息失败，使用正则兜底: {}", e);
                let info = fallback_quiz_info(page_text);
                if info.submit_url.is_empty() {
                    warn!("页面中未找到提交地址");
                }
                info
            }
        }
    }

    async fn extract_with_llm(&self, page_text: &str) -> Result<QuizInfo, ExtractionError> {
        let content = take_chars(page_text, MAX_CONTENT_CHARS);
        let request = CompletionRequest::new(
            prompts::EXTRACTION_SYSTEM_PROMPT,
            prompts::extraction_prompt(content),
            EXTRACTION_TEMPERATURE,
        )
        .json();

        let response = self.llm.complete(request).await?;
        debug!("LLM 抽取原始结果: {}", truncate_text(&response, 500));

        QuizInfo::from_llm_json(strip_json_fence(&response))
    }
}

/// 正则兜底：题目取前 500 个字符，答案类型为 string，提交地址取第一个以 `/submit` 结尾的 URL
pub fn fallback_quiz_info(page_text: &str) -> QuizInfo {
    let submit_url = submit_url_regex()
        .find(page_text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    QuizInfo {
        question: take_chars(page_text, FALLBACK_QUESTION_CHARS).to_string(),
        answer_type: AnswerType::String,
        data_sources: Vec::new(),
        submit_url,
    }
}

/// 按字符截取前缀，不会切断多字节字符
fn take_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// 部分模型在 JSON 模式下仍会包一层 ```json 围栏
fn strip_json_fence(response: &str) -> &str {
    let trimmed = response.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 返回固定结果并记录请求的假 LLM
    struct StubLlm {
        response: Result<String, String>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl StubLlm {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(text.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                response: Err("no completion service".to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionService for StubLlm {
        async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
            self.requests.lock().unwrap().push(request);
            self.response.clone().map_err(LlmError::Unavailable)
        }
    }

    #[tokio::test]
    async fn test_fallback_when_llm_unavailable() {
        let extractor = QuizInfoExtractor::new(StubLlm::failing());
        let info = extractor.extract("go to https://x.test/quiz/submit now").await;

        assert_eq!(info.submit_url, "https://x.test/quiz/submit");
        assert_eq!(info.answer_type, AnswerType::String);
        assert!(info.data_sources.is_empty());
        assert_eq!(info.question, "go to https://x.test/quiz/submit now");
    }

    #[tokio::test]
    async fn test_fallback_on_malformed_json() {
        let extractor = QuizInfoExtractor::new(StubLlm::replying("I think the answer is 4"));
        let info = extractor.extract("Post to https://x.test/submit please").await;
        assert_eq!(info.submit_url, "https://x.test/submit");
        assert_eq!(info.answer_type, AnswerType::String);
    }

    #[tokio::test]
    async fn test_fallback_when_llm_omits_submit_url() {
        let extractor =
            QuizInfoExtractor::new(StubLlm::replying(r#"{"question": "q", "answer_type": "number"}"#));
        let info = extractor.extract("no endpoint here").await;
        assert_eq!(info.submit_url, "");
        assert_eq!(info.answer_type, AnswerType::String);
        assert_eq!(info.question, "no endpoint here");
    }

    #[tokio::test]
    async fn test_uses_llm_result_and_json_mode() {
        let llm = StubLlm::replying(
            r#"```json
            {"question": "Sum it", "answer_type": "number", "data_sources": ["https://x.test/a.csv"], "submit_url": "https://x.test/submit"}
            ```"#,
        );
        let extractor = QuizInfoExtractor::new(llm.clone());
        let info = extractor.extract("page").await;

        assert_eq!(info.question, "Sum it");
        assert_eq!(info.answer_type, AnswerType::Number);

        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].json_mode);
        assert_eq!(requests[0].temperature, 0.1);
    }

    #[tokio::test]
    async fn test_prompt_content_is_capped() {
        let llm = StubLlm::failing();
        let extractor = QuizInfoExtractor::new(llm.clone());
        let page = format!("{}{}", "a".repeat(MAX_CONTENT_CHARS), "TAIL_MARKER");
        let info = extractor.extract(&page).await;

        let requests = llm.requests.lock().unwrap();
        assert!(!requests[0].user.contains("TAIL_MARKER"));
        assert_eq!(info.question.chars().count(), FALLBACK_QUESTION_CHARS);
    }

    #[test]
    fn test_take_chars_respects_char_boundaries() {
        assert_eq!(take_chars("题目内容", 2), "题目");
        assert_eq!(take_chars("abc", 10), "abc");
    }

    #[test]
    fn test_fallback_picks_first_submit_url() {
        let info = fallback_quiz_info("a https://one.test/submit b https://two.test/submit");
        assert_eq!(info.submit_url, "https://one.test/submit");
    }
}
