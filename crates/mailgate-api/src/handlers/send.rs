//! Send and reply handlers

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use mailgate_core::{send_mail, OutgoingMail, SmtpEndpoint};

/// Request body for `POST /send_email`. The legacy wire field names are
/// kept for compatibility with existing clients.
#[derive(Debug, Clone, Deserialize)]
pub struct SendEmailRequest {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub login: String,
    pub password: String,
    #[serde(rename = "titulo")]
    pub subject: String,
    #[serde(rename = "texto")]
    pub body: String,
    #[serde(rename = "destinatario")]
    pub to: String,
}

/// Request body for `POST /reply_email`: send fields plus the original
/// message identifier.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplyEmailRequest {
    #[serde(flatten)]
    pub send: SendEmailRequest,
    pub in_reply_to: String,
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Send an email
///
/// POST /send_email
pub async fn send_email(
    Json(req): Json<SendEmailRequest>,
) -> Result<Json<SendResponse>, (StatusCode, Json<ErrorBody>)> {
    submit(req, None).await
}

/// Reply to an existing email
///
/// POST /reply_email
pub async fn reply_email(
    Json(req): Json<ReplyEmailRequest>,
) -> Result<Json<SendResponse>, (StatusCode, Json<ErrorBody>)> {
    submit(req.send, Some(req.in_reply_to)).await
}

async fn submit(
    req: SendEmailRequest,
    in_reply_to: Option<String>,
) -> Result<Json<SendResponse>, (StatusCode, Json<ErrorBody>)> {
    let endpoint = SmtpEndpoint {
        host: req.smtp_host,
        port: req.smtp_port,
        login: req.login,
        secret: req.password,
    };
    let mail = OutgoingMail {
        to: req.to,
        subject: req.subject,
        body: req.body,
        in_reply_to,
    };

    match send_mail(&endpoint, &mail).await {
        Ok(()) => Ok(Json(SendResponse {
            status: "sent".to_string(),
        })),
        Err(e) => {
            error!("send failed: {}", e);
            let status = StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            Err((
                status,
                Json(ErrorBody {
                    error: e.to_string(),
                }),
            ))
        }
    }
}
