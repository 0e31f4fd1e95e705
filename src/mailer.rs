use async_trait::async_trait;

/// Outgoing mail message.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Seam for the mail transport. The real delivery channel lives outside this
/// service; the wired implementation records the message instead of speaking
/// SMTP.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct LogMailer {
    pub from: String,
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        tracing::info!(
            from = %self.from,
            to = %mail.to,
            subject = %mail.subject,
            "outgoing mail"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_mailer_accepts_messages() {
        let mailer = LogMailer {
            from: "noreply@campus.local".into(),
        };
        let result = mailer
            .send(OutgoingMail {
                to: "student@example.com".into(),
                subject: "Email Title".into(),
                body: "hello".into(),
            })
            .await;
        assert!(result.is_ok());
    }
}
