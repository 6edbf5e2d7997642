pub mod quiz;

pub use quiz::{AnswerType, ExecutionResult, QuizInfo, RenderedPage, SubmissionResult};
