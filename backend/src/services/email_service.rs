use crate::config::EmailConfig;
use crate::errors::{ServiceError, ServiceResult};
use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::str::FromStr;

/// Outbound-mail seam for the authentication flows.
///
/// The SMTP transport below is the production implementation; tests substitute
/// recording or failing mailers to observe dispatch behaviour.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Delivers the account-verification email carrying the confirmation link.
    async fn send_verification_email(
        &self,
        recipient_email: &str,
        recipient_name: &str,
        token: &str,
    ) -> ServiceResult<()>;
}

pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    config: EmailConfig,
}

impl EmailService {
    /// Creates a new EmailService instance
    pub fn new(config: EmailConfig) -> ServiceResult<Self> {
        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| ServiceError::validation(format!("Invalid SMTP host: {e}")))?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        Ok(Self { mailer, config })
    }

    /// Sends a generic email
    pub async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> ServiceResult<()> {
        let from_mailbox = Mailbox::from_str(&format!(
            "{} <{}>",
            self.config.from_name, self.config.from_email
        ))
        .map_err(|e| ServiceError::validation(format!("Invalid from email: {e}")))?;

        let to_mailbox = Mailbox::from_str(to_email)
            .map_err(|e| ServiceError::validation(format!("Invalid recipient email: {e}")))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                lettre::message::MultiPart::alternative()
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_content.to_string()),
                    )
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_content.to_string()),
                    ),
            )
            .map_err(|e| ServiceError::validation(format!("Failed to build email: {e}")))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| ServiceError::external_service(format!("Failed to send email: {e}")))?;

        Ok(())
    }

    fn build_verification_html(&self, recipient_name: &str, confirm_url: &str) -> String {
        format!(
            r#"
            <!DOCTYPE html>
            <html>
            <head>
                <meta charset="UTF-8">
                <title>Confirm your email address</title>
            </head>
            <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
                <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
                    <h2 style="color: #2c3e50;">Confirm your email</h2>

                    <p>Hi {},</p>

                    <p>Thank you for registering. Please click the button below to activate your account:</p>

                    <div style="text-align: center; margin: 30px 0;">
                        <a href="{}"
                           style="background-color: #3498db; color: white; padding: 12px 30px;
                                  text-decoration: none; border-radius: 5px; display: inline-block;">
                            Activate Now
                        </a>
                    </div>

                    <p>Or copy and paste this link into your browser:</p>
                    <p style="word-break: break-all; color: #7f8c8d;">{}</p>

                    <hr style="border: none; border-top: 1px solid #ecf0f1; margin: 30px 0;">

                    <p style="font-size: 12px; color: #7f8c8d;">
                        This link will expire in 15 minutes. If you didn't create an account,
                        you can safely ignore this email.
                    </p>
                </div>
            </body>
            </html>
            "#,
            recipient_name, confirm_url, confirm_url
        )
    }

    fn build_verification_text(&self, recipient_name: &str, confirm_url: &str) -> String {
        format!(
            r#"Confirm your email

Hi {},

Thank you for registering. Please click the link below to activate your account:
{}

This link will expire in 15 minutes. If you didn't create an account, you can safely ignore this email.
            "#,
            recipient_name, confirm_url
        )
    }
}

#[async_trait]
impl EmailSender for EmailService {
    async fn send_verification_email(
        &self,
        recipient_email: &str,
        recipient_name: &str,
        token: &str,
    ) -> ServiceResult<()> {
        let subject = "Confirm your email address";
        let confirm_url = format!(
            "{}/api/v1/auth/confirm?token={}",
            self.config.base_url, token
        );

        let html_content = self.build_verification_html(recipient_name, &confirm_url);
        let text_content = self.build_verification_text(recipient_name, &confirm_url);

        self.send_email(recipient_email, subject, &html_content, &text_content)
            .await
    }
}
