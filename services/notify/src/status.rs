//! 投递状态追踪
//!
//! 只保留最近一次投递结果，后台诊断卡片据此展示"最后错误"。

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// 单次投递结果分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Sent,
    ConfigIncomplete,
    ConnectionError,
    AuthError,
    Disabled,
}

impl DeliveryOutcome {
    /// 是否属于需要管理员关注的失败
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::ConfigIncomplete | Self::ConnectionError | Self::AuthError
        )
    }
}

/// 一次投递尝试的记录
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryAttempt {
    pub at: DateTime<Utc>,
    pub outcome: DeliveryOutcome,
    /// 技术细节，只在后台诊断界面展示
    pub detail: Option<String>,
}

impl DeliveryAttempt {
    pub fn new(outcome: DeliveryOutcome, detail: Option<String>) -> Self {
        Self {
            at: Utc::now(),
            outcome,
            detail,
        }
    }

    /// 进程启动时的初始状态：未发过任何邮件
    fn startup() -> Self {
        Self::new(DeliveryOutcome::Disabled, None)
    }
}

/// 最近一次投递状态的进程级持有者
///
/// 显式构造、按依赖注入传递，可克隆共享同一份状态。
/// 写入无条件覆盖，读取返回完整快照，读者不会看到半写的值。
#[derive(Debug, Clone)]
pub struct StatusTracker {
    inner: Arc<RwLock<DeliveryAttempt>>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(DeliveryAttempt::startup())),
        }
    }

    /// 覆盖最近一次投递记录
    pub fn record(&self, attempt: DeliveryAttempt) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = attempt;
    }

    /// 最近一次投递记录的快照
    pub fn current(&self) -> DeliveryAttempt {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}
