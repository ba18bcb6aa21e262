// SMTP delivery for notification accounts.
//
// Resolution of the server (explicit host/port or suffix table) lives in
// `smtp_table`; `MailerService` only speaks SMTP.

pub mod error;
pub mod models;
pub mod smtp_table;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

pub use error::MailerError;
pub use models::{OutgoingEmail, SmtpCredentials, SmtpTarget};
pub use smtp_table::SmtpTable;

/// Port that expects TLS from the first byte (SMTPS).
const IMPLICIT_TLS_PORT: u16 = 465;
/// Legacy relay port; many providers only offer STARTTLS opportunistically here.
const PLAIN_RELAY_PORT: u16 = 25;

#[derive(Debug, Clone)]
pub struct MailerOptions {
    /// Skip certificate validation. Self-hosted relays often run with
    /// self-signed certificates.
    pub accept_invalid_certs: bool,
}

impl Default for MailerOptions {
    fn default() -> Self {
        Self {
            accept_invalid_certs: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MailerService {
    options: MailerOptions,
}

impl MailerService {
    pub fn new(options: MailerOptions) -> Self {
        Self { options }
    }

    fn transport(
        &self,
        target: &SmtpTarget,
        credentials: &SmtpCredentials,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailerError> {
        let tls_parameters = TlsParameters::builder(target.host.clone())
            .dangerous_accept_invalid_certs(self.options.accept_invalid_certs)
            .build()?;

        let tls = match target.port {
            IMPLICIT_TLS_PORT => Tls::Wrapper(tls_parameters),
            PLAIN_RELAY_PORT => Tls::Opportunistic(tls_parameters),
            _ => Tls::Required(tls_parameters),
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(target.host.as_str())
            .port(target.port)
            .tls(tls)
            .credentials(Credentials::new(
                credentials.username.clone(),
                credentials.password.clone(),
            ))
            .build();

        Ok(transport)
    }

    fn build_message(
        credentials: &SmtpCredentials,
        email: &OutgoingEmail,
    ) -> Result<Message, MailerError> {
        let mut builder = Message::builder()
            .from(parse_mailbox(&credentials.username)?)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_HTML);

        for recipient in &email.to {
            builder = builder.to(parse_mailbox(recipient)?);
        }

        Ok(builder.body(email.html_body.clone())?)
    }

    /// Send an HTML email through `target`, authenticating as `credentials`.
    pub async fn send(
        &self,
        target: &SmtpTarget,
        credentials: &SmtpCredentials,
        email: &OutgoingEmail,
    ) -> Result<(), MailerError> {
        let message = Self::build_message(credentials, email)?;
        let transport = self.transport(target, credentials)?;

        debug!(
            host = %target.host,
            port = target.port,
            recipients = email.to.len(),
            "Sending email"
        );
        transport.send(message).await?;
        Ok(())
    }

    /// Connect and authenticate without sending anything.
    pub async fn verify(
        &self,
        target: &SmtpTarget,
        credentials: &SmtpCredentials,
    ) -> Result<(), MailerError> {
        let transport = self.transport(target, credentials)?;

        debug!(host = %target.host, port = target.port, "Testing SMTP connection");
        if transport.test_connection().await? {
            Ok(())
        } else {
            Err(MailerError::ConnectionRejected {
                host: target.host.clone(),
                port: target.port,
            })
        }
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailerError> {
    address
        .parse::<Mailbox>()
        .map_err(|source| MailerError::InvalidAddress {
            address: address.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> SmtpCredentials {
        SmtpCredentials {
            username: "watcher@example.com".to_string(),
            password: "secret".to_string(),
        }
    }

    #[test]
    fn message_carries_every_recipient() {
        let email = OutgoingEmail {
            to: vec!["a@example.com".to_string(), "b@example.com".to_string()],
            subject: "Price changed".to_string(),
            html_body: "<b>42</b>".to_string(),
        };

        let message = MailerService::build_message(&credentials(), &email).unwrap();
        let envelope = message.envelope();
        assert_eq!(envelope.to().len(), 2);
        assert_eq!(
            envelope.from().map(|a| a.to_string()),
            Some("watcher@example.com".to_string())
        );
    }

    #[test]
    fn malformed_recipient_is_reported() {
        let email = OutgoingEmail {
            to: vec!["not an address".to_string()],
            subject: "x".to_string(),
            html_body: String::new(),
        };

        let err = MailerService::build_message(&credentials(), &email).unwrap_err();
        assert!(matches!(err, MailerError::InvalidAddress { ref address, .. } if address == "not an address"));
    }

    #[test]
    fn credentials_debug_hides_password() {
        let rendered = format!("{:?}", credentials());
        assert!(!rendered.contains("secret"));
    }
}
