//! aura-config - SMTP 配置加载库
//!
//! 从环境变量（`SMTP_` 前缀）读取邮件配置，分两步：
//! 先合并原始键值（[`RawSmtpSettings::load`]），再做纯校验
//! （[`RawSmtpSettings::validate`]），方便测试时不触碰进程环境。

use std::fmt;

use email_address::EmailAddress;
use figment::{
    Figment,
    providers::Env,
};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load SMTP config: {0}")]
    Load(#[from] figment::Error),

    /// 配置不完整或非法，携带出错的字段名清单
    #[error("SMTP configuration incomplete: missing {missing:?}, invalid {invalid:?}")]
    Incomplete {
        missing: Vec<&'static str>,
        invalid: Vec<&'static str>,
    },
}

/// 连接安全模式，校验后取代 tls/ssl 两个布尔开关
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityMode {
    /// 明文连接
    None,
    /// 明文连接后升级（STARTTLS，常见于 587 端口）
    StartTls,
    /// 隐式加密（SMTPS，常见于 465 端口）
    Ssl,
}

impl fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::StartTls => write!(f, "starttls"),
            Self::Ssl => write!(f, "ssl"),
        }
    }
}

/// 环境变量原始值（未校验）
#[derive(Debug, Clone, Deserialize)]
pub struct RawSmtpSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default = "default_pass")]
    pub pass: Secret<String>,
    #[serde(default = "default_from_name")]
    pub from: String,
    #[serde(default)]
    pub admin: String,
    #[serde(default = "default_tls")]
    pub tls: bool,
    #[serde(default)]
    pub ssl: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_port() -> u16 {
    587
}

fn default_pass() -> Secret<String> {
    Secret::new(String::new())
}

fn default_from_name() -> String {
    "Aura Calistenia".to_string()
}

fn default_tls() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for RawSmtpSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            host: String::new(),
            port: default_port(),
            user: String::new(),
            pass: default_pass(),
            from: default_from_name(),
            admin: String::new(),
            tls: default_tls(),
            ssl: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RawSmtpSettings {
    /// 从环境变量加载原始配置（`SMTP_HOST`、`SMTP_PORT`...）
    pub fn load() -> Result<Self, ConfigError> {
        let raw: Self = Figment::new().merge(Env::prefixed("SMTP_")).extract()?;
        Ok(raw)
    }

    /// 校验为 [`MailConfig`]，纯函数
    ///
    /// `enabled=false` 时直接短路为禁用配置，不校验其余字段。
    /// 否则收集缺失与非法的字段名，一次性返回。
    pub fn validate(self) -> Result<MailConfig, ConfigError> {
        if !self.enabled {
            return Ok(MailConfig::disabled());
        }

        let mut missing = Vec::new();
        let mut invalid = Vec::new();

        if self.host.trim().is_empty() {
            missing.push("host");
        }
        if self.user.trim().is_empty() {
            missing.push("user");
        }
        if self.pass.expose_secret().is_empty() {
            missing.push("pass");
        }
        if self.port == 0 {
            invalid.push("port");
        }
        if self.tls && self.ssl {
            invalid.push("tls");
            invalid.push("ssl");
        }

        // admin 为空时退回发件账号，与后台表单的行为一致
        let admin_recipient = if self.admin.trim().is_empty() {
            self.user.clone()
        } else {
            self.admin.clone()
        };
        if !admin_recipient.is_empty() && !EmailAddress::is_valid(&admin_recipient) {
            invalid.push("admin");
        }

        if !missing.is_empty() || !invalid.is_empty() {
            return Err(ConfigError::Incomplete { missing, invalid });
        }

        let security = if self.ssl {
            SecurityMode::Ssl
        } else if self.tls {
            SecurityMode::StartTls
        } else {
            SecurityMode::None
        };

        // 465 端口按惯例走隐式加密，STARTTLS 大概率连不上，仅告警不拒绝
        if self.port == 465 && security == SecurityMode::StartTls {
            warn!(
                port = self.port,
                "port 465 conventionally uses implicit TLS, but STARTTLS is configured"
            );
        }

        Ok(MailConfig {
            enabled: true,
            host: self.host,
            port: self.port,
            username: self.user,
            password: self.pass,
            from_name: self.from,
            admin_recipient,
            security,
            timeout_secs: self.timeout_secs,
        })
    }
}

/// 校验后的邮件配置，启动时装配一次，按引用传给协作方
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Secret<String>,
    pub from_name: String,
    pub admin_recipient: String,
    pub security: SecurityMode,
    pub timeout_secs: u64,
}

impl MailConfig {
    /// 禁用态配置（`enabled=false` 短路时返回）
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            host: String::new(),
            port: default_port(),
            username: String::new(),
            password: default_pass(),
            from_name: default_from_name(),
            admin_recipient: String::new(),
            security: SecurityMode::StartTls,
            timeout_secs: default_timeout_secs(),
        }
    }
}
