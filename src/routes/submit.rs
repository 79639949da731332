use std::fmt::{Debug, Formatter};

use actix_multipart::Multipart;
use actix_web::http::header::{self, ContentType};
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use futures_util::{StreamExt, TryStreamExt};

use crate::configuration::MailSettings;
use crate::domain::{
    classify, ContactSubmission, CvUpload, JobApplicationSubmission, RawSubmission,
    SubmissionError, SubmissionKind,
};
use crate::mail::{application_email, contact_email, MailTransport, OutgoingEmail};
use crate::routes::error_chain_fmt;

pub const GENERIC_RETRY_MESSAGE: &str =
    "There was a problem with your submission, please try again.";

/// Upper bound on form text: the whole urlencoded body, and each multipart
/// text field. Only the `cv` part may be larger, up to its own cap.
const MAX_TEXT_BODY_BYTES: usize = 64 * 1024;

const CONTACT_SENT_MESSAGE: &str =
    "Thank you! Your message has been sent. We will get back to you soon.";

const APPLICATION_SENT_MESSAGE: &str = "Thank you! Your application has been submitted.";

const APPLICATION_FAILED_MESSAGE: &str =
    "Oops! Something went wrong and we could not send your application.";

#[derive(thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] SubmissionError),
    // Carries the user-facing apology, worded per form
    #[error("{0}")]
    SendFailed(String),
    #[error("{}", GENERIC_RETRY_MESSAGE)]
    Malformed,
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl Debug for SubmitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubmitError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubmitError::Validation(_) | SubmitError::Malformed => StatusCode::BAD_REQUEST,
            SubmitError::SendFailed(_) | SubmitError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Bodies are plain text, rendered directly by the client handler.
        // Internals are never echoed back to the browser.
        let body = match self {
            SubmitError::Unexpected(_) => GENERIC_RETRY_MESSAGE.to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code())
            .content_type(ContentType::plaintext())
            .body(body)
    }
}

/// Catch-all for every method other than POST on the submit resource.
pub async fn reject_non_post() -> HttpResponse {
    HttpResponse::Forbidden()
        .content_type(ContentType::plaintext())
        .body(GENERIC_RETRY_MESSAGE)
}

#[tracing::instrument(
    name = "Handle a form submission",
    skip(req, payload, mailer, settings),
    fields(kind = tracing::field::Empty, submitter_email = tracing::field::Empty)
)]
pub async fn submit_form(
    req: HttpRequest,
    payload: web::Payload,
    mailer: web::Data<dyn MailTransport>,
    settings: web::Data<MailSettings>,
) -> Result<HttpResponse, SubmitError> {
    let raw = extract_submission(&req, payload, settings.max_cv_size_bytes()).await?;

    match classify(&raw) {
        SubmissionKind::Contact => {
            tracing::Span::current().record("kind", &"contact");
            let submission = ContactSubmission::try_from_raw(raw)?;
            tracing::Span::current().record(
                "submitter_email",
                &tracing::field::display(&submission.email),
            );

            let email = contact_email(&submission, &settings.inquiries_recipient);
            deliver(
                mailer.get_ref(),
                &email,
                format!(
                    "Sorry, we could not send your message. Please try again or email us at {}.",
                    settings.fallback_contact
                ),
            )
            .await?;

            Ok(HttpResponse::Ok()
                .content_type(ContentType::plaintext())
                .body(CONTACT_SENT_MESSAGE))
        }
        SubmissionKind::JobApplication => {
            tracing::Span::current().record("kind", &"job_application");
            let submission = JobApplicationSubmission::try_from_raw(
                raw,
                &settings.allowed_cv_extensions,
                settings.max_cv_size_bytes(),
            )?;
            tracing::Span::current().record(
                "submitter_email",
                &tracing::field::display(&submission.email),
            );

            let email = application_email(&submission, &settings.careers_recipient);
            deliver(mailer.get_ref(), &email, APPLICATION_FAILED_MESSAGE.to_string()).await?;

            Ok(HttpResponse::Ok()
                .content_type(ContentType::plaintext())
                .body(APPLICATION_SENT_MESSAGE))
        }
    }
}

async fn deliver(
    mailer: &dyn MailTransport,
    email: &OutgoingEmail,
    failure_message: String,
) -> Result<(), SubmitError> {
    match mailer.send(email).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(SubmitError::SendFailed(failure_message)),
        Err(e) => {
            tracing::error!(
                // Record the error chain as a structured field on the log record
                error.cause_chain = ?e,
                "The mail transport rejected the message"
            );
            Err(SubmitError::SendFailed(failure_message))
        }
    }
}

/// Normalize either supported body encoding into a [`RawSubmission`].
async fn extract_submission(
    req: &HttpRequest,
    payload: web::Payload,
    max_cv_bytes: usize,
) -> Result<RawSubmission, SubmitError> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if content_type.starts_with("multipart/form-data") {
        extract_multipart(Multipart::new(req.headers(), payload), max_cv_bytes).await
    } else {
        extract_urlencoded(payload).await
    }
}

async fn extract_urlencoded(mut payload: web::Payload) -> Result<RawSubmission, SubmitError> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|_| SubmitError::Malformed)?;
        body.extend_from_slice(&chunk);
        if body.len() > MAX_TEXT_BODY_BYTES {
            return Err(SubmitError::Malformed);
        }
    }

    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_bytes(&body).map_err(|_| SubmitError::Malformed)?;

    let mut raw = RawSubmission::default();
    for (name, value) in pairs {
        raw.insert_field(name, value);
    }
    Ok(raw)
}

async fn extract_multipart(
    mut multipart: Multipart,
    max_cv_bytes: usize,
) -> Result<RawSubmission, SubmitError> {
    let mut raw = RawSubmission::default();

    while let Some(mut field) = multipart.try_next().await.map_err(|_| SubmitError::Malformed)? {
        let name = field.name().to_string();
        // A present-but-empty filename still marks a file part: the browser
        // sent the input with no file chosen, which must fail the CV checks
        // rather than read as a missing field
        let filename = field.content_disposition().get_filename().map(basename);

        match filename {
            Some(filename) if name == "cv" => {
                let mut content = Vec::new();
                let mut size = 0usize;
                while let Some(chunk) = field.try_next().await.map_err(|_| {
                    // A stream error mid-file is the transport-reported upload error
                    SubmitError::Validation(SubmissionError::InvalidCv)
                })? {
                    size += chunk.len();
                    // Buffer at most one byte past the cap; the size check only
                    // needs to know the upload exceeded it
                    if content.len() <= max_cv_bytes {
                        let room = (max_cv_bytes + 1).saturating_sub(content.len());
                        content.extend_from_slice(&chunk[..room.min(chunk.len())]);
                    }
                }
                raw.cv = Some(CvUpload { filename, content, size });
            }
            _ => {
                let mut value = Vec::new();
                while let Some(chunk) =
                    field.try_next().await.map_err(|_| SubmitError::Malformed)?
                {
                    value.extend_from_slice(&chunk);
                    if value.len() > MAX_TEXT_BODY_BYTES {
                        return Err(SubmitError::Malformed);
                    }
                }
                let value = String::from_utf8(value).map_err(|_| SubmitError::Malformed)?;
                raw.insert_field(name, value);
            }
        }
    }

    Ok(raw)
}

/// Strip any path components a client may have smuggled into the filename.
fn basename(filename: &str) -> String {
    filename
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(filename)
        .to_string()
}
