//! aura-notify - 通知投递与状态上报
//!
//! 围绕注册、找回密码、后台告警三类邮件的小型服务：
//! 组装模板、调用 SMTP 适配器、把最近一次投递结果
//! 记录到可注入的状态持有者，供后台诊断卡片读取。

pub mod diagnostics;
pub mod service;
pub mod status;
pub mod template;

pub use diagnostics::{SmtpDiagnostics, SmtpStatus};
pub use service::{NotificationService, RegistrationEvent};
pub use status::{DeliveryAttempt, DeliveryOutcome, StatusTracker};
pub use template::MailTemplates;
