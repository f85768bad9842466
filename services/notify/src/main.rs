//! SMTP 诊断工具
//!
//! 读取环境配置，输出后台状态卡片的 JSON；
//! 带 `--send-test` 时先给管理员发一封测试邮件。

use aura_errors::{AppError, AppResult};
use aura_notify::{NotificationService, StatusTracker};
use aura_telemetry::init_tracing;

#[tokio::main]
async fn main() -> AppResult<()> {
    dotenvy::dotenv().ok();
    init_tracing("info");

    let status = StatusTracker::new();
    let service = NotificationService::from_env(status)?;

    let send_test = std::env::args().any(|arg| arg == "--send-test");
    if send_test {
        let outcome = service.send_test().await?;
        if outcome.is_failure() {
            let detail = service
                .status()
                .current()
                .detail
                .unwrap_or_else(|| "no detail recorded".to_string());
            return Err(AppError::external_service(detail));
        }
    }

    let diagnostics = service.diagnostics();
    let json = serde_json::to_string_pretty(&diagnostics)
        .map_err(|e| AppError::internal(format!("Failed to encode diagnostics: {e}")))?;
    println!("{json}");

    Ok(())
}
