use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailerError {
    /// The address has no `@`-separated domain part.
    #[error("Can't parse email suffix of `{0}`")]
    CannotParseSuffix(String),

    /// The domain part is not present in the SMTP table.
    #[error("Can't find target SMTP information for the email suffix `{0}`")]
    NoSmtpEntry(String),

    #[error("Invalid mailbox `{address}`: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("SMTP server at {host}:{port} rejected the connection check")]
    ConnectionRejected { host: String, port: u16 },
}

impl MailerError {
    /// True for the two lookup failures that call for a manual host/port.
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            MailerError::CannotParseSuffix(_) | MailerError::NoSmtpEntry(_)
        )
    }
}
