pub mod chain_state;
pub mod quiz_flow;

pub use chain_state::{ChainStage, ChainState};
pub use quiz_flow::QuizFlow;
