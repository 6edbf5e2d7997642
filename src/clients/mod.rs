pub mod llm_client;
pub mod submit_client;

pub use llm_client::{CompletionRequest, CompletionService, LlmClient};
pub use submit_client::{AnswerSubmitter, SubmissionClient};
