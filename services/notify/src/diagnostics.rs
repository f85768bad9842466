//! 后台诊断读模型
//!
//! 管理后台"SMTP 状态"卡片的数据来源。技术细节字符串只在
//! 这里暴露，绝不能出现在面向学员的页面上。

use aura_config::{MailConfig, SecurityMode};
use serde::Serialize;

use crate::status::DeliveryAttempt;

/// 卡片顶部的总体状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpStatus {
    /// 配置完整，最近一次投递没有失败
    Ready,
    /// 配置缺失或非法
    Incomplete,
    /// 最近一次投递失败
    Error,
    /// 功能被配置关闭
    Disabled,
}

/// SMTP 诊断卡片
#[derive(Debug, Clone, Serialize)]
pub struct SmtpDiagnostics {
    pub status: SmtpStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<SecurityMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub last_attempt: DeliveryAttempt,
}

impl SmtpDiagnostics {
    /// 配置可用时的卡片：最近一次失败则标红，否则就绪
    pub(crate) fn for_config(config: &MailConfig, last: DeliveryAttempt) -> Self {
        let status = if last.outcome.is_failure() {
            SmtpStatus::Error
        } else {
            SmtpStatus::Ready
        };

        Self {
            status,
            host: Some(config.host.clone()),
            port: Some(config.port),
            security: Some(config.security),
            last_error: last.detail.clone(),
            last_attempt: last,
        }
    }

    /// 配置不完整时的卡片，展示缺失字段说明
    pub(crate) fn incomplete(detail: &str, last: DeliveryAttempt) -> Self {
        Self {
            status: SmtpStatus::Incomplete,
            host: None,
            port: None,
            security: None,
            last_error: Some(detail.to_string()),
            last_attempt: last,
        }
    }

    /// 功能关闭时的卡片
    pub(crate) fn disabled(last: DeliveryAttempt) -> Self {
        Self {
            status: SmtpStatus::Disabled,
            host: None,
            port: None,
            security: None,
            last_error: None,
            last_attempt: last,
        }
    }
}
