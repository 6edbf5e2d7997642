/// 答案提交客户端
///
/// 所有传输层失败都被合成为 `correct: false` 的判定，
/// 编排层只需要处理"答对/答错"两种情况
use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::SubmissionResult;

/// 答案提交能力，测试中用脚本化的假实现替换
#[async_trait]
pub trait AnswerSubmitter: Send + Sync {
    async fn submit(
        &self,
        submit_url: &str,
        quiz_url: &str,
        answer: Option<&JsonValue>,
    ) -> SubmissionResult;
}

/// 提交客户端
pub struct SubmissionClient {
    http: reqwest::Client,
    email: String,
    secret: String,
}

impl SubmissionClient {
    /// 创建新的提交客户端
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.submit_timeout())
            .build()
            .unwrap_or_else(|e| {
                warn!("构建带超时的 HTTP 客户端失败，使用默认客户端: {}", e);
                reqwest::Client::new()
            });

        Self {
            http,
            email: config.student_email.clone(),
            secret: config.student_secret.clone(),
        }
    }

    /// 构建提交 Payload，固定只有 email / secret / url / answer 四个键
    pub fn build_payload(&self, quiz_url: &str, answer: Option<&JsonValue>) -> JsonValue {
        json!({
            "email": self.email,
            "secret": self.secret,
            "url": quiz_url,
            "answer": answer.cloned().unwrap_or(JsonValue::Null),
        })
    }

    async fn post(&self, submit_url: &str, payload: &JsonValue) -> Result<SubmissionResult, reqwest::Error> {
        let response = self.http.post(submit_url).json(payload).send().await?;
        debug!("提交响应状态: {}", response.status());
        response.json::<SubmissionResult>().await
    }
}

#[async_trait]
impl AnswerSubmitter for SubmissionClient {
    async fn submit(
        &self,
        submit_url: &str,
        quiz_url: &str,
        answer: Option<&JsonValue>,
    ) -> SubmissionResult {
        let payload = self.build_payload(quiz_url, answer);

        info!("📤 提交答案到 {}", submit_url);
        debug!("Payload: {}", redacted(&payload));

        if submit_url.trim().is_empty() {
            warn!("提交地址为空，视为提交失败");
            return SubmissionResult::transport_failure("submit url is empty");
        }

        match self.post(submit_url, &payload).await {
            Ok(result) => {
                info!("提交结果: correct={}, reason={:?}, url={:?}", result.correct, result.reason, result.url);
                result
            }
            Err(e) => {
                warn!("提交答案失败: {}", e);
                SubmissionResult::transport_failure(e.to_string())
            }
        }
    }
}

/// 日志里隐藏 secret
fn redacted(payload: &JsonValue) -> JsonValue {
    let mut shown = payload.clone();
    if shown.get("secret").is_some() {
        shown["secret"] = json!("***");
    }
    shown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_server::serve;

    fn create_test_client() -> SubmissionClient {
        let config = Config {
            student_email: "student@example.com".to_string(),
            student_secret: "hunter2".to_string(),
            submit_timeout_secs: 2,
            ..Config::default()
        };
        SubmissionClient::new(&config)
    }

    #[test]
    fn test_payload_has_exactly_four_keys() {
        let client = create_test_client();
        let payload = client.build_payload("https://x.test/quiz/1", Some(&json!(42)));

        let mut keys: Vec<&str> = payload
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["answer", "email", "secret", "url"]);
        assert_eq!(payload["url"], "https://x.test/quiz/1");
        assert_eq!(payload["answer"], 42);
    }

    #[test]
    fn test_payload_keeps_null_answer() {
        let client = create_test_client();
        let payload = client.build_payload("https://x.test/quiz/1", None);
        assert_eq!(payload.as_object().unwrap().len(), 4);
        assert!(payload["answer"].is_null());
    }

    #[test]
    fn test_redacted_hides_secret() {
        let client = create_test_client();
        let shown = redacted(&client.build_payload("u", None));
        assert_eq!(shown["secret"], "***");
        assert_eq!(shown["email"], "student@example.com");
    }

    #[tokio::test]
    async fn test_empty_submit_url_is_negative_verdict() {
        let client = create_test_client();
        let result = client.submit("", "https://x.test/quiz/1", None).await;
        assert!(!result.correct);
        assert!(result.reason.is_some());
        assert_eq!(result.next_url(), None);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_negative_verdict() {
        let client = create_test_client();
        let result = client
            .submit("http://127.0.0.1:9/submit", "https://x.test/quiz/1", Some(&json!("x")))
            .await;
        assert!(!result.correct);
        assert!(result.reason.is_some());
    }

    #[tokio::test]
    async fn test_html_response_is_negative_verdict() {
        let base = serve(200, "text/html", "<html><body>Server error</body></html>").await;
        let client = create_test_client();

        let result = client
            .submit(&format!("{}/submit", base), "https://x.test/quiz/1", Some(&json!(1)))
            .await;

        assert!(!result.correct);
        assert!(result.reason.as_deref().is_some_and(|r| !r.is_empty()));
        assert_eq!(result.next_url(), None);
    }

    #[tokio::test]
    async fn test_verdict_without_correct_field_is_negative() {
        let base = serve(200, "application/json", r#"{"reason": "x"}"#).await;
        let client = create_test_client();

        let result = client
            .submit(&format!("{}/submit", base), "https://x.test/quiz/1", Some(&json!(1)))
            .await;

        assert!(!result.correct);
        // 原因是解析错误，而不是响应里的 "x"
        assert!(result.reason.is_some());
        assert_ne!(result.reason.as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn test_error_status_with_json_verdict_is_parsed() {
        let base = serve(
            400,
            "application/json",
            r#"{"correct": false, "reason": "Wrong answer", "url": "https://x.test/quiz/2"}"#,
        )
        .await;
        let client = create_test_client();

        let result = client
            .submit(&format!("{}/submit", base), "https://x.test/quiz/1", Some(&json!(1)))
            .await;

        assert!(!result.correct);
        assert_eq!(result.reason.as_deref(), Some("Wrong answer"));
        assert_eq!(result.next_url(), Some("https://x.test/quiz/2"));
    }

    #[tokio::test]
    async fn test_correct_verdict_is_returned() {
        let base = serve(200, "application/json", r#"{"correct": true, "url": null}"#).await;
        let client = create_test_client();

        let result = client
            .submit(&format!("{}/submit", base), "https://x.test/quiz/1", Some(&json!(42)))
            .await;

        assert!(result.correct);
        assert_eq!(result.next_url(), None);
    }
}
