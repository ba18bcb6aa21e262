//! Suffix → SMTP server lookup.
//!
//! Accounts may carry an explicit host/port. When either half is missing the
//! server is derived from the domain part of the address using a static table
//! of well-known providers.

use std::collections::HashMap;

use crate::{MailerError, SmtpTarget};

const BUILTIN: &[(&str, &str, u16)] = &[
    ("qq.com", "smtp.qq.com", 465),
    ("163.com", "smtp.163.com", 465),
    ("126.com", "smtp.126.com", 465),
    ("139.com", "smtp.139.com", 465),
    ("gmail.com", "smtp.gmail.com", 587),
    ("foxmail.com", "smtp.foxmail.com", 465),
    ("sina.com.cn", "smtp.sina.com.cn", 25),
    ("sohu.com", "smtp.sohu.com", 25),
    ("yahoo.com.cn", "smtp.mail.yahoo.com.cn", 587),
    ("live.com", "smtp.live.com", 587),
    ("263.net", "smtp.263.net", 25),
    ("263.net.cn", "smtp.263.net.cn", 25),
    ("x263.net", "smtp.263.net", 25),
    ("china.com", "smtp.china.com", 25),
    ("tom.com", "smtp.tom.com", 25),
    ("outlook.com", "smtp.office365.com", 587),
    ("hotmail.com", "smtp.live.com", 587),
    ("aol.com", "smtp.aol.com", 587),
    ("zoho.com", "smtp.zoho.com", 465),
    ("mail.com", "smtp.mail.com", 465),
    ("inbox.com", "smtp.inbox.com", 465),
    ("gmx.com", "smtp.gmx.com", 587),
    ("icloud.com", "smtp.mail.me.com", 587),
];

#[derive(Debug, Clone)]
pub struct SmtpTable {
    entries: HashMap<String, SmtpTarget>,
}

impl Default for SmtpTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SmtpTable {
    /// Table pre-filled with the well-known providers.
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(suffix, host, port)| (suffix.to_string(), SmtpTarget::new(*host, *port)))
            .collect();
        Self { entries }
    }

    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, suffix: impl Into<String>, target: SmtpTarget) {
        self.entries.insert(suffix.into().to_lowercase(), target);
    }

    /// Merge entries from a JSON object of the form
    /// `{ "example.com": { "host": "smtp.example.com", "port": 587 } }`.
    ///
    /// Returns the number of entries read.
    pub fn extend_from_json(&mut self, json: &str) -> Result<usize, serde_json::Error> {
        let extra: HashMap<String, SmtpTarget> = serde_json::from_str(json)?;
        let count = extra.len();
        for (suffix, target) in extra {
            self.insert(suffix, target);
        }
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the server for an address by its domain part.
    pub fn lookup(&self, address: &str) -> Result<SmtpTarget, MailerError> {
        let parts: Vec<&str> = address.split('@').collect();
        if parts.len() < 2 {
            return Err(MailerError::CannotParseSuffix(address.to_string()));
        }
        let suffix = parts[parts.len() - 1].trim().to_lowercase();

        self.entries
            .get(&suffix)
            .cloned()
            .ok_or(MailerError::NoSmtpEntry(suffix))
    }

    /// Resolve the server for an account.
    ///
    /// An explicit host/port wins only when both are present; an empty host or
    /// a zero port falls back to the suffix lookup.
    pub fn resolve(
        &self,
        address: &str,
        host_override: Option<&str>,
        port_override: Option<u16>,
    ) -> Result<SmtpTarget, MailerError> {
        match (host_override.map(str::trim), port_override) {
            (Some(host), Some(port)) if !host.is_empty() && port != 0 => {
                Ok(SmtpTarget::new(host, port))
            }
            _ => self.lookup(address),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qq_resolves_to_implicit_tls_port() {
        let table = SmtpTable::builtin();
        let target = table.resolve("a@qq.com", None, None).unwrap();
        assert_eq!(target, SmtpTarget::new("smtp.qq.com", 465));
    }

    #[test]
    fn unknown_suffix_is_not_a_parse_error() {
        let table = SmtpTable::builtin();
        let err = table.resolve("a@unknown-domain.zzz", None, None).unwrap_err();
        assert!(matches!(err, MailerError::NoSmtpEntry(ref s) if s == "unknown-domain.zzz"));
    }

    #[test]
    fn address_without_at_cannot_be_parsed() {
        let table = SmtpTable::builtin();
        let err = table.resolve("not-an-address", None, None).unwrap_err();
        assert!(matches!(err, MailerError::CannotParseSuffix(_)));
        assert!(err.is_resolution_error());
    }

    #[test]
    fn trailing_at_has_empty_suffix() {
        let table = SmtpTable::builtin();
        let err = table.lookup("someone@").unwrap_err();
        assert!(matches!(err, MailerError::NoSmtpEntry(ref s) if s.is_empty()));
    }

    #[test]
    fn explicit_override_skips_lookup() {
        let table = SmtpTable::empty();
        let target = table
            .resolve("a@unknown-domain.zzz", Some("mail.internal"), Some(2525))
            .unwrap();
        assert_eq!(target, SmtpTarget::new("mail.internal", 2525));
    }

    #[test]
    fn partial_override_falls_back_to_suffix() {
        let table = SmtpTable::builtin();

        let zero_port = table.resolve("a@gmail.com", Some("mail.internal"), Some(0)).unwrap();
        assert_eq!(zero_port.host, "smtp.gmail.com");

        let empty_host = table.resolve("a@gmail.com", Some(""), Some(2525)).unwrap();
        assert_eq!(empty_host.port, 587);

        let missing_host = table.resolve("a@163.com", None, Some(2525)).unwrap();
        assert_eq!(missing_host.host, "smtp.163.com");
    }

    #[test]
    fn suffix_lookup_ignores_case() {
        let table = SmtpTable::builtin();
        let target = table.lookup("Someone@Outlook.COM").unwrap();
        assert_eq!(target.host, "smtp.office365.com");
    }

    #[test]
    fn json_entries_extend_and_override() {
        let mut table = SmtpTable::builtin();
        let before = table.len();
        let read = table
            .extend_from_json(
                r#"{
                    "corp.example": { "host": "smtp.corp.example", "port": 587 },
                    "qq.com": { "host": "smtp.exmail.qq.com", "port": 465 }
                }"#,
            )
            .unwrap();

        assert_eq!(read, 2);
        assert_eq!(table.len(), before + 1);
        assert_eq!(table.lookup("x@corp.example").unwrap().port, 587);
        assert_eq!(table.lookup("x@qq.com").unwrap().host, "smtp.exmail.qq.com");
    }
}
