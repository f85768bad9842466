//! 通知服务测试
//!
//! 用 mock 的传输层覆盖投递结果记录、禁用短路和诊断读模型。

use std::sync::Arc;

use aura_adapter_smtp::{MailTransport, OutgoingEmail, SmtpFailure};
use aura_config::{MailConfig, RawSmtpSettings, SecurityMode};
use aura_notify::{DeliveryOutcome, NotificationService, RegistrationEvent, SmtpStatus, StatusTracker};
use secrecy::Secret;

mockall::mock! {
    pub Transport {}

    #[async_trait::async_trait]
    impl MailTransport for Transport {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), SmtpFailure>;
    }
}

fn enabled_config() -> MailConfig {
    MailConfig {
        enabled: true,
        host: "smtp.gmail.com".to_string(),
        port: 587,
        username: "a@x.com".to_string(),
        password: Secret::new("secret".to_string()),
        from_name: "Aura Calistenia".to_string(),
        admin_recipient: "admin@x.com".to_string(),
        security: SecurityMode::StartTls,
        timeout_secs: 10,
    }
}

fn registration() -> RegistrationEvent {
    RegistrationEvent {
        username: "maria".to_string(),
        email: "maria@example.com".to_string(),
        skill: "Front lever".to_string(),
        goal: "Aguantar 10 segundos".to_string(),
    }
}

fn service_with(
    config: MailConfig,
    transport: MockTransport,
    status: StatusTracker,
) -> NotificationService {
    NotificationService::new(config, Arc::new(transport), status).expect("service assembles")
}

/// 禁用配置：返回成功、不碰传输层、记录 Disabled
#[tokio::test]
async fn test_disabled_config_never_invokes_transport() {
    let mut transport = MockTransport::new();
    transport.expect_send().times(0);

    let status = StatusTracker::new();
    let service = service_with(MailConfig::disabled(), transport, status.clone());

    let outcome = service
        .notify_registration(&registration())
        .await
        .expect("soft result");

    assert_eq!(outcome, DeliveryOutcome::Disabled);
    assert_eq!(status.current().outcome, DeliveryOutcome::Disabled);
    assert_eq!(service.diagnostics().status, SmtpStatus::Disabled);
}

/// 成功投递：收件人和正文来自模板，状态记为 Sent
#[tokio::test]
async fn test_registration_sends_rendered_template() {
    let mut transport = MockTransport::new();
    transport
        .expect_send()
        .withf(|email: &OutgoingEmail| {
            email.to == "maria@example.com"
                && email.subject.contains("Solicitud recibida")
                && email.body.contains("Skill: Front lever")
                && email.body.contains("Objetivo: Aguantar 10 segundos")
        })
        .times(1)
        .returning(|_| Ok(()));

    let status = StatusTracker::new();
    let service = service_with(enabled_config(), transport, status.clone());

    let outcome = service
        .notify_registration(&registration())
        .await
        .expect("soft result");

    assert_eq!(outcome, DeliveryOutcome::Sent);
    let current = status.current();
    assert_eq!(current.outcome, DeliveryOutcome::Sent);
    assert!(current.detail.is_none());
}

/// 认证失败：记录 AuthError 和技术细节
#[tokio::test]
async fn test_auth_failure_is_recorded() {
    let mut transport = MockTransport::new();
    transport
        .expect_send()
        .times(1)
        .returning(|_| Err(SmtpFailure::auth("535 5.7.8 authentication rejected")));

    let status = StatusTracker::new();
    let service = service_with(enabled_config(), transport, status.clone());

    let outcome = service
        .notify_registration(&registration())
        .await
        .expect("soft result");

    assert_eq!(outcome, DeliveryOutcome::AuthError);
    let current = status.current();
    assert_eq!(current.outcome, DeliveryOutcome::AuthError);
    assert!(current.detail.as_deref().unwrap().contains("535"));
}

/// 传输超时按连接错误上报，细节非空
#[tokio::test]
async fn test_timeout_surfaces_as_connection_error() {
    let mut transport = MockTransport::new();
    transport
        .expect_send()
        .times(1)
        .returning(|_| Err(SmtpFailure::connection("SMTP send timed out after 10s")));

    let status = StatusTracker::new();
    let service = service_with(enabled_config(), transport, status.clone());

    let outcome = service
        .notify_registration(&registration())
        .await
        .expect("soft result");

    assert_eq!(outcome, DeliveryOutcome::ConnectionError);
    let current = status.current();
    assert_eq!(current.outcome, DeliveryOutcome::ConnectionError);
    assert!(!current.detail.as_deref().unwrap().is_empty());

    let diagnostics = service.diagnostics();
    assert_eq!(diagnostics.status, SmtpStatus::Error);
    assert!(diagnostics.last_error.unwrap().contains("timed out"));
}

/// 配置不完整：降级服务记录 ConfigIncomplete，不投递
#[tokio::test]
async fn test_incomplete_config_records_config_incomplete() {
    let error = RawSmtpSettings {
        enabled: true,
        host: String::new(),
        ..RawSmtpSettings::default()
    }
    .validate()
    .expect_err("incomplete config");

    let status = StatusTracker::new();
    let service =
        NotificationService::degraded(&error, status.clone()).expect("service assembles");

    let outcome = service
        .notify_registration(&registration())
        .await
        .expect("soft result");

    assert_eq!(outcome, DeliveryOutcome::ConfigIncomplete);
    assert_eq!(status.current().outcome, DeliveryOutcome::ConfigIncomplete);

    let diagnostics = service.diagnostics();
    assert_eq!(diagnostics.status, SmtpStatus::Incomplete);
    assert!(diagnostics.last_error.unwrap().contains("host"));
    assert!(diagnostics.host.is_none());
}

/// 后台告警发往配置的管理员收件人
#[tokio::test]
async fn test_admin_alert_goes_to_admin_recipient() {
    let mut transport = MockTransport::new();
    transport
        .expect_send()
        .withf(|email: &OutgoingEmail| {
            email.to == "admin@x.com"
                && email.subject == "Nueva solicitud de entreno"
                && email.body.contains("Usuario: maria")
                && email.body.contains("Email: maria@example.com")
        })
        .times(1)
        .returning(|_| Ok(()));

    let service = service_with(enabled_config(), transport, StatusTracker::new());

    let outcome = service.notify_admin(&registration()).await.expect("soft result");
    assert_eq!(outcome, DeliveryOutcome::Sent);
}

/// 找回密码邮件携带恢复码
#[tokio::test]
async fn test_password_recovery_carries_token() {
    let mut transport = MockTransport::new();
    transport
        .expect_send()
        .withf(|email: &OutgoingEmail| {
            email.to == "maria@example.com" && email.body.contains("tok-abc123")
        })
        .times(1)
        .returning(|_| Ok(()));

    let service = service_with(enabled_config(), transport, StatusTracker::new());

    let outcome = service
        .notify_password_recovery("maria", "maria@example.com", "tok-abc123")
        .await
        .expect("soft result");
    assert_eq!(outcome, DeliveryOutcome::Sent);
}

/// 空恢复码是调用方错误，直接拒绝且不投递
#[tokio::test]
async fn test_empty_reset_token_is_rejected() {
    let mut transport = MockTransport::new();
    transport.expect_send().times(0);

    let service = service_with(enabled_config(), transport, StatusTracker::new());

    let result = service
        .notify_password_recovery("maria", "maria@example.com", "")
        .await;
    assert!(result.is_err());
}

/// 测试邮件发给管理员
#[tokio::test]
async fn test_send_test_targets_admin() {
    let mut transport = MockTransport::new();
    transport
        .expect_send()
        .withf(|email: &OutgoingEmail| {
            email.to == "admin@x.com" && email.subject.contains("Prueba")
        })
        .times(1)
        .returning(|_| Ok(()));

    let service = service_with(enabled_config(), transport, StatusTracker::new());

    let outcome = service.send_test().await.expect("soft result");
    assert_eq!(outcome, DeliveryOutcome::Sent);
}

/// 尚未发过邮件时，启用配置显示为就绪并带连接参数
#[tokio::test]
async fn test_diagnostics_ready_before_first_send() {
    let transport = MockTransport::new();
    let service = service_with(enabled_config(), transport, StatusTracker::new());

    let diagnostics = service.diagnostics();
    assert_eq!(diagnostics.status, SmtpStatus::Ready);
    assert_eq!(diagnostics.host.as_deref(), Some("smtp.gmail.com"));
    assert_eq!(diagnostics.port, Some(587));
    assert_eq!(diagnostics.security, Some(SecurityMode::StartTls));
    assert!(diagnostics.last_error.is_none());
}

/// 失败后再次成功，卡片恢复就绪
#[tokio::test]
async fn test_diagnostics_recovers_after_success() {
    let mut transport = MockTransport::new();
    let mut failed_once = false;
    transport.expect_send().times(2).returning(move |_| {
        if failed_once {
            Ok(())
        } else {
            failed_once = true;
            Err(SmtpFailure::connection("connection refused"))
        }
    });

    let status = StatusTracker::new();
    let service = service_with(enabled_config(), transport, status.clone());

    let first = service.notify_admin(&registration()).await.expect("soft result");
    assert_eq!(first, DeliveryOutcome::ConnectionError);
    assert_eq!(service.diagnostics().status, SmtpStatus::Error);

    let second = service.notify_admin(&registration()).await.expect("soft result");
    assert_eq!(second, DeliveryOutcome::Sent);
    assert_eq!(service.diagnostics().status, SmtpStatus::Ready);
    assert!(service.diagnostics().last_error.is_none());
}

/// 诊断卡片可序列化为 JSON，供后台页面消费
#[tokio::test]
async fn test_diagnostics_serializes_to_json() {
    let transport = MockTransport::new();
    let service = service_with(enabled_config(), transport, StatusTracker::new());

    let json = serde_json::to_value(service.diagnostics()).expect("serializable");
    assert_eq!(json["status"], "ready");
    assert_eq!(json["host"], "smtp.gmail.com");
    assert_eq!(json["security"], "starttls");
}
