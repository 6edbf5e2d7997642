//! # Quiz Chain Agent
//!
//! 一个自动解答链式测验的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `browser/` - 每轮迭代启动无头浏览器渲染题目页面，结束即释放
//! - `infrastructure/` - `JsExecutor`，持有 page，只提供 eval() 能力
//! - `clients/` - LLM 客户端与答案提交客户端
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每个服务都自带兜底，不向上抛错
//! - `QuizInfoExtractor` - 从页面文本抽取题目信息
//! - `SolutionCodeGenerator` - 生成声明式求解程序
//! - `SandboxExecutor` - 在受限操作集内解释执行求解程序
//! - `format_answer` - 按答案类型规整结果
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一道题"的完整处理流程
//! - `ChainState` - 链路状态（当前地址 + 尝试次数 + 开始时间）
//! - `QuizFlow` - 流程编排（render → extract → generate → execute → format → submit）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/chain_orchestrator` - 超时守卫、判定前进 / 重试 / 终止
//!
//! ## 模块结构

pub mod app;
pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod prompts;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppResult, ChainError};
pub use models::{AnswerType, QuizInfo, SubmissionResult};
pub use orchestrator::{ChainOrchestrator, ChainOutcome, ChainReport};
pub use workflow::{ChainState, QuizFlow};
