pub mod answer_formatter;
pub mod code_generator;
pub mod data_processor;
pub mod quiz_extractor;
pub mod sandbox;

pub use answer_formatter::format_answer;
pub use code_generator::SolutionCodeGenerator;
pub use data_processor::DataProcessor;
pub use quiz_extractor::QuizInfoExtractor;
pub use sandbox::SandboxExecutor;
