//! 解题链路编排器 - 编排层
//!
//! ## 职责
//!
//! 本模块驱动整条解题链路，是链路级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **超时守卫**：每轮开始前检查时间预算
//! 2. **流程调度**：每轮委托给 `QuizFlow`
//! 3. **结果判定**：根据提交判定决定前进、重定向、重试或放弃
//! 4. **统计输出**：记录访问过的地址、迭代次数、用时

use std::fmt::{self, Display};
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::models::SubmissionResult;
use crate::utils::logging::{log_chain_start, log_iteration_start, truncate_text};
use crate::workflow::{ChainStage, ChainState, QuizFlow};

/// 链路终态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOutcome {
    /// 最后一题答对且没有下一题
    Completed,
    /// 时间预算耗尽
    TimedOut,
    /// 同一题答错次数达到上限
    MaxRetriesExceeded { url: String },
    /// 未被兜底的故障，链路不再继续
    Aborted { url: String, error: String },
}

impl ChainOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ChainOutcome::Completed)
    }
}

impl Display for ChainOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainOutcome::Completed => write!(f, "✅ Completed"),
            ChainOutcome::TimedOut => write!(f, "⏱️ TimedOut"),
            ChainOutcome::MaxRetriesExceeded { url } => {
                write!(f, "❌ MaxRetriesExceeded ({})", url)
            }
            ChainOutcome::Aborted { url, error } => {
                write!(f, "💥 Aborted ({}): {}", url, error)
            }
        }
    }
}

/// 链路运行报告
#[derive(Debug, Clone)]
pub struct ChainReport {
    pub outcome: ChainOutcome,
    /// 每一轮开始时的地址，按顺序
    pub visited: Vec<String>,
    pub iterations: usize,
    pub elapsed: Duration,
}

/// 提交之后的下一步
#[derive(Debug, Clone, PartialEq, Eq)]
enum Decision {
    Completed,
    Advance(String),
    Redirect(String),
    Retry,
}

/// 根据提交判定决定下一步，不修改状态
fn decide(current_url: &str, result: &SubmissionResult) -> Decision {
    match (result.correct, result.next_url()) {
        (true, Some(next)) => Decision::Advance(next.to_string()),
        (true, None) => Decision::Completed,
        (false, Some(next)) if next != current_url => Decision::Redirect(next.to_string()),
        (false, _) => Decision::Retry,
    }
}

/// 解题链路编排器
///
/// 唯一持有 `ChainState` 的地方；严格串行，一轮结束后才开始下一轮
pub struct ChainOrchestrator {
    flow: QuizFlow,
    quiz_timeout: Duration,
    max_retries: u32,
}

impl ChainOrchestrator {
    pub fn new(flow: QuizFlow, config: &Config) -> Self {
        Self {
            flow,
            quiz_timeout: config.quiz_timeout(),
            max_retries: config.max_retries,
        }
    }

    /// 从起始地址开始，跑完整条链路
    pub async fn run(&self, initial_url: &str) -> ChainReport {
        log_chain_start(initial_url, self.quiz_timeout, self.max_retries);

        let mut state = ChainState::new(initial_url);
        let mut visited = Vec::new();
        let mut iterations = 0usize;

        let outcome = loop {
            // 只在两轮之间检查，进行中的一轮不会被打断
            if state.is_timed_out(self.quiz_timeout) {
                warn!(
                    "⏱️ 超出时间预算 {} 秒，停止链路 {}",
                    self.quiz_timeout.as_secs(),
                    state
                );
                break ChainOutcome::TimedOut;
            }

            iterations += 1;
            visited.push(state.current_url().to_string());
            log_iteration_start(
                iterations,
                state.current_url(),
                state.attempt_count(),
                state.elapsed(),
            );

            let result = match self.flow.run(state.current_url()).await {
                Ok(result) => result,
                Err(e) => {
                    error!("💥 {} 处理失败，终止链路: {}", state, e);
                    break ChainOutcome::Aborted {
                        url: state.current_url().to_string(),
                        error: e.to_string(),
                    };
                }
            };

            info!(
                "[{}] 判定: correct={}, reason={}, url={}",
                ChainStage::Deciding,
                result.correct,
                result
                    .reason
                    .as_deref()
                    .map(|r| truncate_text(r, 200))
                    .unwrap_or_default(),
                result.next_url().unwrap_or("-")
            );

            match decide(state.current_url(), &result) {
                Decision::Completed => {
                    info!("🎉 最后一题回答正确，链路完成");
                    break ChainOutcome::Completed;
                }
                Decision::Advance(next) => {
                    info!("✓ 回答正确，进入下一题: {}", next);
                    state.advance_to(next);
                }
                Decision::Redirect(next) => {
                    warn!("✗ 回答错误，但服务端给出新地址，跳转: {}", next);
                    state.advance_to(next);
                }
                Decision::Retry => {
                    let attempts = state.record_wrong_answer();
                    if attempts >= self.max_retries {
                        error!(
                            "❌ {} 已连续答错 {} 次，放弃",
                            state.current_url(),
                            attempts
                        );
                        break ChainOutcome::MaxRetriesExceeded {
                            url: state.current_url().to_string(),
                        };
                    }
                    warn!(
                        "✗ 回答错误 ({}/{})，重试同一题",
                        attempts, self.max_retries
                    );
                }
            }
        };

        ChainReport {
            outcome,
            visited,
            iterations,
            elapsed: state.elapsed(),
        }
    }
}
