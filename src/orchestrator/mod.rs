//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责驱动整条解题链路，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! chain_orchestrator (持有 ChainState，决定前进 / 重试 / 终止)
//!     ↓
//! workflow::QuizFlow (处理单道题)
//!     ↓
//! services (能力层：extract / generate / sandbox / format)
//!     ↓
//! clients / browser / infrastructure
//! ```
//!
//! ## 设计原则
//!
//! 1. **状态集中**：只有编排层持有链路状态
//! 2. **向下依赖**：编排层 → workflow → services → clients
//! 3. **只做判定**：不做具体业务，只根据提交结果决定下一步

pub mod chain_orchestrator;

pub use chain_orchestrator::{ChainOrchestrator, ChainOutcome, ChainReport};
