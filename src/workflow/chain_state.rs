//! 链路状态
//!
//! 封装"现在在做哪道题、第几次尝试、从什么时候开始"这一信息

use std::fmt::{self, Display};
use std::time::Duration;

use tokio::time::Instant;

/// 单轮迭代内的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainStage {
    Fetching,
    Extracting,
    Generating,
    Executing,
    Formatting,
    Submitting,
    Deciding,
}

impl Display for ChainStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChainStage::Fetching => "fetching",
            ChainStage::Extracting => "extracting",
            ChainStage::Generating => "generating",
            ChainStage::Executing => "executing",
            ChainStage::Formatting => "formatting",
            ChainStage::Submitting => "submitting",
            ChainStage::Deciding => "deciding",
        };
        f.write_str(name)
    }
}

/// 链路状态，只由编排器持有
///
/// - `attempt_count` 在 `current_url` 变化时清零
/// - `start_time` 在链路开始时设置，之后不变
#[derive(Debug, Clone)]
pub struct ChainState {
    current_url: String,
    attempt_count: u32,
    start_time: Instant,
}

impl ChainState {
    pub fn new(initial_url: impl Into<String>) -> Self {
        Self {
            current_url: initial_url.into(),
            attempt_count: 0,
            start_time: Instant::now(),
        }
    }

    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 已用时间是否超过预算
    pub fn is_timed_out(&self, budget: Duration) -> bool {
        self.elapsed() > budget
    }

    /// 切换到下一题，尝试次数清零
    pub fn advance_to(&mut self, url: impl Into<String>) {
        self.current_url = url.into();
        self.attempt_count = 0;
    }

    /// 同一题答错一次，返回累计次数
    pub fn record_wrong_answer(&mut self) -> u32 {
        self.attempt_count += 1;
        self.attempt_count
    }
}

impl Display for ChainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[题目 {} 尝试#{}]",
            self.current_url, self.attempt_count
        )
    }
}
