//! lettre 邮件客户端实现

use std::time::Duration;

use async_trait::async_trait;
use aura_config::{MailConfig, SecurityMode};
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;
use tracing::{debug, info};

use crate::{FailureStage, MailTransport, OutgoingEmail, SmtpFailure};

/// SMTP 邮件客户端
///
/// 每次发送建立一次连接、发完即断，符合请求驱动的使用方式。
pub struct SmtpMailer {
    config: MailConfig,
}

impl SmtpMailer {
    /// 由校验后的配置创建客户端，调用方需保证 `config.enabled == true`
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }

    /// 按安全模式构建 SMTP 传输
    fn build_transport(&self) -> Result<SmtpTransport, SmtpFailure> {
        let credentials = Credentials::new(
            self.config.username.clone(),
            self.config.password.expose_secret().clone(),
        );

        let builder = match self.config.security {
            SecurityMode::StartTls => SmtpTransport::starttls_relay(&self.config.host),
            SecurityMode::Ssl => SmtpTransport::relay(&self.config.host),
            SecurityMode::None => Ok(SmtpTransport::builder_dangerous(&self.config.host)),
        }
        .map_err(|e| SmtpFailure::connection(format!("failed to create SMTP transport: {e}")))?;

        Ok(builder
            .port(self.config.port)
            .credentials(credentials)
            .timeout(Some(Duration::from_secs(self.config.timeout_secs)))
            .build())
    }

    /// 组装邮件消息
    fn build_message(&self, email: &OutgoingEmail) -> Result<Message, SmtpFailure> {
        let from: Mailbox = format!("{} <{}>", self.config.from_name, self.config.username)
            .parse()
            .map_err(|e| SmtpFailure::connection(format!("invalid from address: {e}")))?;

        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| SmtpFailure::connection(format!("invalid to address: {e}")))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(&email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| SmtpFailure::connection(format!("failed to build message: {e}")))
    }
}

/// 将 lettre 的错误粗分类
///
/// 启发式：服务器已应答且为永久拒绝（5xx）⇒ 认证/凭据问题；
/// 超时、网络中断及其余情况 ⇒ 连接问题。
fn classify(err: &lettre::transport::smtp::Error) -> SmtpFailure {
    let stage = if err.is_timeout() {
        FailureStage::Connection
    } else if err.is_permanent() {
        FailureStage::Auth
    } else {
        FailureStage::Connection
    };

    SmtpFailure {
        stage,
        detail: err.to_string(),
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), SmtpFailure> {
        debug!(to = %email.to, subject = %email.subject, "sending email");

        let transport = self.build_transport()?;
        let message = self.build_message(email)?;

        // lettre 的 timeout 管 socket 读写，外层再兜一道整体超时，
        // 防止 DNS 解析或 TLS 握手卡死
        let bound = Duration::from_secs(self.config.timeout_secs + 1);
        let outcome = tokio::time::timeout(
            bound,
            tokio::task::spawn_blocking(move || transport.send(&message)),
        )
        .await;

        match outcome {
            Err(_elapsed) => Err(SmtpFailure::connection(format!(
                "SMTP send timed out after {}s",
                self.config.timeout_secs
            ))),
            Ok(Err(join)) => Err(SmtpFailure::connection(format!("send task failed: {join}"))),
            Ok(Ok(Err(smtp_err))) => Err(classify(&smtp_err)),
            Ok(Ok(Ok(_response))) => {
                info!(to = %email.to, subject = %email.subject, "email sent");
                Ok(())
            }
        }
    }
}
