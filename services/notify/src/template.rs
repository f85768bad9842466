//! 邮件模板
//!
//! 模板内嵌在二进制里，文案与前台页面保持一致（西班牙语）。

use aura_errors::{AppError, AppResult};
use tera::{Context, Tera};

pub const TPL_REGISTRATION: &str = "registration.txt";
pub const TPL_PASSWORD_RESET: &str = "password_reset.txt";
pub const TPL_ADMIN_ALERT: &str = "admin_alert.txt";

const REGISTRATION_TXT: &str = "\
Tu solicitud fue recibida.

Skill: {{ skill }}
Objetivo: {{ goal }}
Te contactaremos para confirmar tu acceso.
";

const PASSWORD_RESET_TXT: &str = "\
Hola {{ username }},

Recibimos una solicitud para restablecer tu contraseña.
Tu código de recuperación es: {{ reset_token }}

Si no solicitaste el cambio, ignora este mensaje.
";

const ADMIN_ALERT_TXT: &str = "\
Nueva solicitud registrada:
Usuario: {{ username }}
Email: {{ email }}
Skill: {{ skill }}
Objetivo: {{ goal }}
";

/// 邮件模板管理器
pub struct MailTemplates {
    tera: Tera,
}

impl MailTemplates {
    /// 加载内嵌模板
    pub fn new() -> AppResult<Self> {
        let mut tera = Tera::default();

        for (name, content) in [
            (TPL_REGISTRATION, REGISTRATION_TXT),
            (TPL_PASSWORD_RESET, PASSWORD_RESET_TXT),
            (TPL_ADMIN_ALERT, ADMIN_ALERT_TXT),
        ] {
            tera.add_raw_template(name, content)
                .map_err(|e| AppError::internal(format!("Failed to add template {name}: {e}")))?;
        }

        Ok(Self { tera })
    }

    /// 渲染模板
    pub fn render(&self, template_name: &str, context: &Context) -> AppResult<String> {
        self.tera.render(template_name, context).map_err(|e| {
            AppError::internal(format!("Failed to render template {template_name}: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_template() {
        let templates = MailTemplates::new().unwrap();

        let mut context = Context::new();
        context.insert("skill", "Front lever");
        context.insert("goal", "Aguantar 10 segundos");

        let body = templates.render(TPL_REGISTRATION, &context).unwrap();
        assert!(body.contains("Tu solicitud fue recibida."));
        assert!(body.contains("Skill: Front lever"));
        assert!(body.contains("Objetivo: Aguantar 10 segundos"));
    }

    #[test]
    fn test_password_reset_template() {
        let templates = MailTemplates::new().unwrap();

        let mut context = Context::new();
        context.insert("username", "maria");
        context.insert("reset_token", "abc123");

        let body = templates.render(TPL_PASSWORD_RESET, &context).unwrap();
        assert!(body.contains("Hola maria,"));
        assert!(body.contains("abc123"));
    }

    #[test]
    fn test_admin_alert_template() {
        let templates = MailTemplates::new().unwrap();

        let mut context = Context::new();
        context.insert("username", "maria");
        context.insert("email", "maria@example.com");
        context.insert("skill", "Planche");
        context.insert("goal", "");

        let body = templates.render(TPL_ADMIN_ALERT, &context).unwrap();
        assert!(body.contains("Nueva solicitud registrada:"));
        assert!(body.contains("Usuario: maria"));
        assert!(body.contains("Email: maria@example.com"));
    }

    #[test]
    fn test_unknown_template_is_internal_error() {
        let templates = MailTemplates::new().unwrap();
        let err = templates.render("missing.txt", &Context::new()).unwrap_err();
        assert!(err.to_string().contains("missing.txt"));
    }
}
