use anyhow::{Context, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::slack::render_text;
use super::{MatchNotification, Notifier, MATCH_SUBJECT};
use crate::config::EmailConfig;

pub struct EmailSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailSender {
    pub fn from_config(cfg: &EmailConfig) -> Result<Self> {
        let creds = Credentials::new(cfg.smtp_user.clone(), cfg.smtp_pass.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)
            .context("invalid SMTP_HOST")?
            .credentials(creds)
            .build();

        let from = cfg.from.parse().context("invalid NOTIFY_EMAIL_FROM")?;
        let to = cfg.to.parse().context("invalid NOTIFY_EMAIL_TO")?;

        Ok(Self { mailer, from, to })
    }

    fn build_message(&self, ev: &MatchNotification) -> Result<Message> {
        let body = format!(
            "{}\n\n{}\n",
            render_text(ev),
            serde_json::to_string_pretty(ev).context("serialize match event")?
        );
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(MATCH_SUBJECT)
            .header(header::ContentType::TEXT_PLAIN)
            .body(body)
            .context("build email")
    }
}

#[async_trait::async_trait]
impl Notifier for EmailSender {
    async fn send(&self, ev: &MatchNotification) -> Result<()> {
        let msg = self.build_message(ev)?;
        self.mailer.send(msg).await.context("send email")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email"
    }
}
