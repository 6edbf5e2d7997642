//! LLM API 客户端
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::LlmError;

/// 一次补全请求
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    /// 要求模型只返回一个 JSON 对象
    pub json_mode: bool,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>, temperature: f32) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature,
            json_mode: false,
        }
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

/// 补全服务
///
/// 抽取、生成代码、直接问答三处共用；测试中用假实现替换
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}

/// OpenAI 兼容的 LLM 客户端
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn api_error(&self, source: async_openai::error::OpenAIError) -> LlmError {
        LlmError::ApiCallFailed {
            model: self.model_name.clone(),
            source,
        }
    }
}

#[async_trait]
impl CompletionService for LlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        debug!(
            "调用 LLM API，模型: {}, temperature: {}, json_mode: {}",
            self.model_name, request.temperature, request.json_mode
        );
        debug!("用户消息长度: {} 字符", request.user.len());

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(request.system)
            .build()
            .map_err(|e| self.api_error(e))?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(request.user)
            .build()
            .map_err(|e| self.api_error(e))?;

        let messages = vec![
            ChatCompletionRequestMessage::System(system_msg),
            ChatCompletionRequestMessage::User(user_msg),
        ];

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model_name)
            .messages(messages)
            .temperature(request.temperature);
        if request.json_mode {
            builder.response_format(ResponseFormat::JsonObject);
        }
        let chat_request = builder.build().map_err(|e| self.api_error(e))?;

        let response = self.client.chat().create(chat_request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            self.api_error(e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_request_json_mode() {
        let request = CompletionRequest::new("sys", "user", 0.1).json();
        assert!(request.json_mode);
        assert_eq!(request.temperature, 0.1);
    }

    #[test]
    fn test_client_uses_configured_model() {
        let config = Config {
            llm_model_name: "test-model".to_string(),
            ..Config::default()
        };
        assert_eq!(LlmClient::new(&config).model_name(), "test-model");
    }

    /// 需要真实的 API Key
    #[tokio::test]
    #[ignore]
    async fn test_complete_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let client = LlmClient::new(&Config::from_env());
        let response = client
            .complete(CompletionRequest::new("你是一个简洁的助手，回答要简短。", "1+1=?", 0.1))
            .await;

        match response {
            Ok(text) => assert!(!text.is_empty()),
            Err(e) => panic!("LLM 调用失败: {}", e),
        }
    }
}
