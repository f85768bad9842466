//! SMTP 适配器
//!
//! 封装 lettre 的投递能力：
//! - 按安全模式建立连接（STARTTLS / 隐式加密 / 明文）
//! - 将底层失败粗分类为连接问题或认证问题
//! - 不做重试，超时等策略交给调用方配置

mod client;

pub use client::SmtpMailer;

use async_trait::async_trait;
use thiserror::Error;

/// 外发邮件（纯文本）
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// 失败阶段分类
///
/// 启发式判断，不是严格契约：认证完成前的失败归为连接问题，
/// 服务器应答后的永久拒绝归为认证/凭据问题。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Connection,
    Auth,
}

/// 结构化投递失败，detail 仅用于后台诊断展示
#[derive(Debug, Clone, Error)]
#[error("smtp delivery failed at {stage:?} stage: {detail}")]
pub struct SmtpFailure {
    pub stage: FailureStage,
    pub detail: String,
}

impl SmtpFailure {
    pub fn connection(detail: impl Into<String>) -> Self {
        Self {
            stage: FailureStage::Connection,
            detail: detail.into(),
        }
    }

    pub fn auth(detail: impl Into<String>) -> Self {
        Self {
            stage: FailureStage::Auth,
            detail: detail.into(),
        }
    }
}

/// 邮件投递接口，通知服务通过它与 SMTP 解耦
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// 投递一封邮件，成功返回 `Ok(())`，失败返回带分类的 [`SmtpFailure`]
    async fn send(&self, email: &OutgoingEmail) -> Result<(), SmtpFailure>;
}
