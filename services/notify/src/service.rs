//! 通知服务
//!
//! 注册确认、找回密码、后台告警三类邮件的组装与投递。
//! 邮件失败从不打断触发它的用户动作：结果一律先记入
//! [`StatusTracker`]，再以 [`DeliveryOutcome`] 软指示返回，
//! 由调用方决定后续策略（默认记日志后继续）。

use std::sync::Arc;

use aura_adapter_smtp::{FailureStage, MailTransport, OutgoingEmail, SmtpMailer};
use aura_config::{ConfigError, MailConfig, RawSmtpSettings};
use aura_errors::{AppError, AppResult};
use tera::Context;
use tracing::{debug, info, warn};

use crate::diagnostics::SmtpDiagnostics;
use crate::status::{DeliveryAttempt, DeliveryOutcome, StatusTracker};
use crate::template::{
    MailTemplates, TPL_ADMIN_ALERT, TPL_PASSWORD_RESET, TPL_REGISTRATION,
};

const SUBJECT_REGISTRATION: &str = "Solicitud recibida - Aura Calistenia";
const SUBJECT_PASSWORD_RESET: &str = "Recupera tu contraseña - Aura Calistenia";
const SUBJECT_ADMIN_ALERT: &str = "Nueva solicitud de entreno";
const SUBJECT_TEST: &str = "Prueba de configuración SMTP - Aura Calistenia";

/// 报名事件（来自前台表单）
#[derive(Debug, Clone)]
pub struct RegistrationEvent {
    pub username: String,
    pub email: String,
    pub skill: String,
    pub goal: String,
}

/// 配置装配结果决定服务的工作模式
enum ConfigState {
    /// 配置完整且启用，可以投递
    Enabled {
        config: MailConfig,
        transport: Arc<dyn MailTransport>,
    },
    /// 功能被配置关闭
    Disabled,
    /// 配置缺失或非法，只记录状态不投递
    Incomplete { detail: String },
}

/// 通知服务
pub struct NotificationService {
    state: ConfigState,
    templates: MailTemplates,
    status: StatusTracker,
}

impl NotificationService {
    /// 用校验后的配置和注入的传输装配服务
    pub fn new(
        config: MailConfig,
        transport: Arc<dyn MailTransport>,
        status: StatusTracker,
    ) -> AppResult<Self> {
        let state = if config.enabled {
            ConfigState::Enabled { config, transport }
        } else {
            ConfigState::Disabled
        };

        Ok(Self {
            state,
            templates: MailTemplates::new()?,
            status,
        })
    }

    /// 配置加载失败时的降级装配：服务仍然可用，只是不投递
    pub fn degraded(error: &ConfigError, status: StatusTracker) -> AppResult<Self> {
        Ok(Self {
            state: ConfigState::Incomplete {
                detail: error.to_string(),
            },
            templates: MailTemplates::new()?,
            status,
        })
    }

    /// 从环境变量装配，生产路径的入口
    pub fn from_env(status: StatusTracker) -> AppResult<Self> {
        let raw = RawSmtpSettings::load()
            .map_err(|e| AppError::internal(format!("Failed to read SMTP environment: {e}")))?;

        match raw.validate() {
            Ok(config) => {
                let transport = Arc::new(SmtpMailer::new(config.clone()));
                Self::new(config, transport, status)
            }
            Err(error) => Self::degraded(&error, status),
        }
    }

    /// 给报名学员发送确认邮件
    pub async fn notify_registration(
        &self,
        event: &RegistrationEvent,
    ) -> AppResult<DeliveryOutcome> {
        let mut context = Context::new();
        context.insert("skill", &event.skill);
        context.insert("goal", &event.goal);
        let body = self.templates.render(TPL_REGISTRATION, &context)?;

        self.dispatch(&event.email, SUBJECT_REGISTRATION, body).await
    }

    /// 给用户发送找回密码邮件，邮件正文携带恢复码
    pub async fn notify_password_recovery(
        &self,
        username: &str,
        email: &str,
        reset_token: &str,
    ) -> AppResult<DeliveryOutcome> {
        if reset_token.is_empty() {
            return Err(AppError::validation("reset token must not be empty"));
        }

        let mut context = Context::new();
        context.insert("username", username);
        context.insert("reset_token", reset_token);
        let body = self.templates.render(TPL_PASSWORD_RESET, &context)?;

        self.dispatch(email, SUBJECT_PASSWORD_RESET, body).await
    }

    /// 给管理员发送新报名告警
    pub async fn notify_admin(&self, event: &RegistrationEvent) -> AppResult<DeliveryOutcome> {
        let mut context = Context::new();
        context.insert("username", &event.username);
        context.insert("email", &event.email);
        context.insert("skill", &event.skill);
        context.insert("goal", &event.goal);
        let body = self.templates.render(TPL_ADMIN_ALERT, &context)?;

        let admin = self.admin_recipient().to_string();
        self.dispatch(&admin, SUBJECT_ADMIN_ALERT, body).await
    }

    /// 给管理员发送测试邮件，供后台"发送测试"按钮使用
    pub async fn send_test(&self) -> AppResult<DeliveryOutcome> {
        let body = "Si recibes este mensaje, la configuración SMTP funciona.\n".to_string();
        let admin = self.admin_recipient().to_string();
        self.dispatch(&admin, SUBJECT_TEST, body).await
    }

    /// 后台诊断卡片
    pub fn diagnostics(&self) -> SmtpDiagnostics {
        let last = self.status.current();
        match &self.state {
            ConfigState::Enabled { config, .. } => SmtpDiagnostics::for_config(config, last),
            ConfigState::Disabled => SmtpDiagnostics::disabled(last),
            ConfigState::Incomplete { detail } => SmtpDiagnostics::incomplete(detail, last),
        }
    }

    pub fn status(&self) -> &StatusTracker {
        &self.status
    }

    fn admin_recipient(&self) -> &str {
        match &self.state {
            ConfigState::Enabled { config, .. } => &config.admin_recipient,
            _ => "",
        }
    }

    /// 投递并记录结果
    ///
    /// 返回的 Err 只可能来自内部组装错误（模板等）；
    /// 邮件层面的失败都折叠进 `DeliveryOutcome`。
    async fn dispatch(
        &self,
        to: &str,
        subject: &str,
        body: String,
    ) -> AppResult<DeliveryOutcome> {
        let (config, transport) = match &self.state {
            ConfigState::Disabled => {
                debug!(to = %to, "mail delivery disabled, skipping send");
                self.status
                    .record(DeliveryAttempt::new(DeliveryOutcome::Disabled, None));
                return Ok(DeliveryOutcome::Disabled);
            }
            ConfigState::Incomplete { detail } => {
                warn!(to = %to, detail = %detail, "mail config incomplete, cannot send");
                self.status.record(DeliveryAttempt::new(
                    DeliveryOutcome::ConfigIncomplete,
                    Some(detail.clone()),
                ));
                return Ok(DeliveryOutcome::ConfigIncomplete);
            }
            ConfigState::Enabled { config, transport } => (config, transport),
        };

        let email = OutgoingEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body,
        };

        match transport.send(&email).await {
            Ok(()) => {
                info!(to = %to, subject = %subject, host = %config.host, "notification sent");
                self.status
                    .record(DeliveryAttempt::new(DeliveryOutcome::Sent, None));
                Ok(DeliveryOutcome::Sent)
            }
            Err(failure) => {
                let outcome = match failure.stage {
                    FailureStage::Connection => DeliveryOutcome::ConnectionError,
                    FailureStage::Auth => DeliveryOutcome::AuthError,
                };
                warn!(
                    to = %to,
                    subject = %subject,
                    detail = %failure.detail,
                    "notification delivery failed"
                );
                self.status
                    .record(DeliveryAttempt::new(outcome, Some(failure.detail)));
                Ok(outcome)
            }
        }
    }
}
