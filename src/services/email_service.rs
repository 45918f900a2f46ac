//! 邮件服务模块
//!
//! 通过 SMTP 发送预警通知邮件

use crate::config::{Settings, SmtpSettings};
use crate::errors::AppError;
use crate::services::NotificationChannel;
use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;

/// 邮件服务
pub struct EmailService {
    mailer: Option<AsyncSmtpTransport<Tokio1Executor>>,
    settings: SmtpSettings,
}

impl EmailService {
    /// 创建新的邮件服务实例
    pub fn new(smtp_settings: SmtpSettings) -> Result<Self, AppError> {
        let mailer = if smtp_settings.enabled {
            let password = Settings::smtp_password()
                .ok_or_else(|| AppError::ConfigError("SMTP_PASSWORD 未设置".to_string()))?;

            let creds = Credentials::new(
                smtp_settings.username.clone(),
                password.expose_secret().clone(),
            );

            let transport = if smtp_settings.tls {
                // 465 为隐式 TLS，其余端口走 STARTTLS
                let builder = if smtp_settings.port == 465 {
                    AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp_settings.host)
                } else {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp_settings.host)
                }
                .map_err(|e| AppError::ConfigError(format!("SMTP 配置错误: {}", e)))?;

                builder.port(smtp_settings.port).credentials(creds).build()
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp_settings.host)
                    .port(smtp_settings.port)
                    .credentials(creds)
                    .build()
            };

            Some(transport)
        } else {
            tracing::warn!("SMTP 未启用，邮件功能将不可用");
            None
        };

        Ok(Self {
            mailer,
            settings: smtp_settings,
        })
    }

    /// 检查邮件服务是否可用
    pub fn is_enabled(&self) -> bool {
        self.mailer.is_some()
    }

    fn build_message(&self, to_email: &str, subject: &str, body: &str) -> Result<Message, AppError> {
        let from = format!("{} <{}>", self.settings.from_name, self.settings.from_email);

        Message::builder()
            .from(from.parse().map_err(|e| AppError::ConfigError(format!("发件人地址无效: {}", e)))?)
            .to(to_email
                .parse()
                .map_err(|_| AppError::Dispatch(format!("收件人邮箱格式无效: {}", to_email)))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::Dispatch(format!("邮件构建失败: {}", e)))
    }
}

#[async_trait]
impl NotificationChannel for EmailService {
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<(), AppError> {
        let mailer = self
            .mailer
            .as_ref()
            .ok_or_else(|| AppError::Dispatch("邮件服务未启用".to_string()))?;

        let email = self.build_message(address, subject, body)?;

        mailer.send(email).await.map_err(|e| {
            tracing::error!(error = %e, to = %address, "邮件发送失败");
            AppError::Dispatch(format!("邮件发送失败: {}", e))
        })?;

        tracing::info!(to = %address, "预警邮件已发送");
        Ok(())
    }
}
