//! Mail notifier and spool-directory transport.

use super::{Notifier, NotifyError};
use crate::context::RequestContext;
use log::{error, info};
use std::fs;
use std::io;
use std::path::PathBuf;
use uuid::Uuid;

/// One outbound HTML mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

impl Mail {
    /// RFC-822 style rendering with headers and an HTML body.
    pub fn to_message(&self) -> String {
        format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\nContent-Type: text/html; charset=\"UTF-8\"\r\n\r\n{}",
            self.from, self.to, self.subject, self.html_body
        )
    }
}

/// Hands a composed mail to a delivery mechanism.
pub trait MailTransport {
    fn send(&self, mail: &Mail) -> io::Result<()>;
}

/// Writes each mail as `<uuid>.eml` into a spool directory for a relay to
/// pick up.
#[derive(Debug, Clone)]
pub struct SpoolTransport {
    dir: PathBuf,
}

impl SpoolTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl MailTransport for SpoolTransport {
    fn send(&self, mail: &Mail) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let id = Uuid::new_v4();
        // Written under a temporary name so a relay never sees a partial file.
        let partial = self.dir.join(format!("{id}.eml.part"));
        fs::write(&partial, mail.to_message())?;
        fs::rename(&partial, self.dir.join(format!("{id}.eml")))
    }
}

/// Notifier that mails the message from a fixed sender.
pub struct MailNotifier<T: MailTransport> {
    sender: String,
    subject: String,
    transport: T,
}

impl<T: MailTransport> MailNotifier<T> {
    pub fn new(sender: impl Into<String>, subject: impl Into<String>, transport: T) -> Self {
        Self {
            sender: sender.into(),
            subject: subject.into(),
            transport,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: MailTransport> Notifier for MailNotifier<T> {
    fn notify(
        &self,
        ctx: &RequestContext,
        message: &str,
        destination: &str,
    ) -> Result<(), NotifyError> {
        ctx.check()?;
        if !is_plausible_address(destination) {
            return Err(NotifyError::InvalidDestination(destination.to_string()));
        }

        let mail = Mail {
            from: self.sender.clone(),
            to: destination.to_string(),
            subject: self.subject.clone(),
            html_body: message.to_string(),
        };

        match self.transport.send(&mail) {
            Ok(()) => {
                info!(
                    "event=mail_send module=notify status=ok bytes={}",
                    mail.html_body.len()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=mail_send module=notify status=error error_code=transport_failed error={err}"
                );
                Err(NotifyError::Delivery {
                    destination: mail.to,
                    source: err,
                })
            }
        }
    }
}

fn is_plausible_address(destination: &str) -> bool {
    match destination.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !destination.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{is_plausible_address, Mail, MailNotifier, MailTransport};
    use crate::context::RequestContext;
    use crate::notify::{Notifier, NotifyError};
    use std::cell::RefCell;
    use std::io;

    #[derive(Default)]
    struct RecordingTransport {
        sent: RefCell<Vec<Mail>>,
        fail: bool,
    }

    impl MailTransport for RecordingTransport {
        fn send(&self, mail: &Mail) -> io::Result<()> {
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "relay down"));
            }
            self.sent.borrow_mut().push(mail.clone());
            Ok(())
        }
    }

    #[test]
    fn notify_composes_mail_from_sender_and_subject() {
        let notifier = MailNotifier::new("ledger@bank.test", "Resume", RecordingTransport::default());
        notifier
            .notify(&RequestContext::background(), "<p>hi</p>", "ana@mail.test")
            .unwrap();

        let sent = notifier.transport().sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from, "ledger@bank.test");
        assert_eq!(sent[0].to, "ana@mail.test");
        assert_eq!(sent[0].subject, "Resume");
        assert_eq!(sent[0].html_body, "<p>hi</p>");
    }

    #[test]
    fn notify_wraps_transport_failure_with_destination() {
        let transport = RecordingTransport {
            fail: true,
            ..RecordingTransport::default()
        };
        let notifier = MailNotifier::new("ledger@bank.test", "Resume", transport);
        let err = notifier
            .notify(&RequestContext::background(), "body", "ana@mail.test")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "unexpected error sending mail to ana@mail.test due to: relay down"
        );
    }

    #[test]
    fn notify_observes_cancellation_before_sending() {
        let notifier = MailNotifier::new("ledger@bank.test", "Resume", RecordingTransport::default());
        let ctx = RequestContext::background();
        ctx.cancel_handle().cancel();

        let err = notifier.notify(&ctx, "body", "ana@mail.test").unwrap_err();
        assert!(matches!(err, NotifyError::Cancelled(_)));
        assert!(notifier.transport().sent.borrow().is_empty());
    }

    #[test]
    fn address_check_rejects_header_injection() {
        assert!(is_plausible_address("ana@mail.test"));
        assert!(!is_plausible_address("ana"));
        assert!(!is_plausible_address("@mail.test"));
        assert!(!is_plausible_address("ana@mail.test\r\nBcc: x@y"));
    }

    #[test]
    fn mail_message_separates_headers_and_body() {
        let mail = Mail {
            from: "a@b".to_string(),
            to: "c@d".to_string(),
            subject: "s".to_string(),
            html_body: "<p>x</p>".to_string(),
        };
        let message = mail.to_message();
        assert!(message.starts_with("From: a@b\r\nTo: c@d\r\nSubject: s\r\n"));
        assert!(message.ends_with("\r\n\r\n<p>x</p>"));
    }
}
