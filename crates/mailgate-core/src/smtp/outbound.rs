//! Single-shot SMTP submission over TLS.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use mailgate_common::{Error, Result};

/// Where and as whom to submit.
#[derive(Debug, Clone)]
pub struct SmtpEndpoint {
    pub host: String,
    pub port: u16,
    pub login: String,
    pub secret: String,
}

/// One outgoing plain-text message. `in_reply_to` carries the original
/// message identifier for replies and populates the reply-linkage
/// headers.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub in_reply_to: Option<String>,
}

/// Send one message. Port 465 uses an implicit TLS wrapper, port 587 a
/// STARTTLS upgrade; any other port is rejected before any connection is
/// attempted.
pub async fn send_mail(endpoint: &SmtpEndpoint, mail: &OutgoingMail) -> Result<()> {
    let transport = build_transport(endpoint)?;

    let from: Mailbox = endpoint
        .login
        .parse()
        .map_err(|e| Error::Validation(format!("invalid sender address: {e}")))?;
    let to: Mailbox = mail
        .to
        .parse()
        .map_err(|e| Error::Validation(format!("invalid recipient address: {e}")))?;

    let mut builder = Message::builder()
        .from(from)
        .to(to)
        .subject(&mail.subject);

    if let Some(ref original) = mail.in_reply_to {
        builder = builder
            .in_reply_to(original.clone())
            .references(original.clone());
    }

    let message = builder
        .header(ContentType::TEXT_PLAIN)
        .body(mail.body.clone())
        .map_err(|e| Error::Smtp(format!("failed to build message: {e}")))?;

    transport
        .send(message)
        .await
        .map_err(|e| Error::Smtp(format!("submission failed: {e}")))?;

    info!("message sent to {} via {}:{}", mail.to, endpoint.host, endpoint.port);
    Ok(())
}

fn build_transport(endpoint: &SmtpEndpoint) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
    let tls = TlsParameters::builder(endpoint.host.clone())
        .build_rustls()
        .map_err(|e| Error::Smtp(format!("TLS parameters: {e}")))?;

    let builder = match endpoint.port {
        465 => AsyncSmtpTransport::<Tokio1Executor>::relay(&endpoint.host)
            .map_err(|e| Error::Smtp(e.to_string()))?
            .port(465)
            .tls(Tls::Wrapper(tls)),
        587 => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&endpoint.host)
            .map_err(|e| Error::Smtp(e.to_string()))?
            .port(587)
            .tls(Tls::Required(tls)),
        other => return Err(Error::UnsupportedPort(other)),
    };

    Ok(builder
        .credentials(Credentials::new(
            endpoint.login.clone(),
            endpoint.secret.clone(),
        ))
        .build())
}
