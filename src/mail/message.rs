//! Outgoing email composition.
//!
//! Renders an [`OutgoingEmail`] into a full RFC 5322 / MIME message string
//! suitable for handing to the mail transport: a single text/plain message
//! for contact submissions, multipart/mixed with a base64 attachment part
//! for job applications.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

use crate::domain::{ContactSubmission, JobApplicationSubmission};

/// Subject excerpt length for contact messages, in grapheme clusters.
const SUBJECT_EXCERPT_LEN: usize = 50;

/// Base64 line width in the attachment part.
const BASE64_LINE_LEN: usize = 76;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub from_name: String,
    pub from_email: String,
    pub reply_to: String,
    pub subject: String,
    pub content: MessageContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Plain(String),
    Mixed {
        boundary: String,
        text: String,
        attachment: Attachment,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    /// Base64-encoded content.
    pub data_base64: String,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, data: &[u8]) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data_base64: STANDARD.encode(data),
        }
    }
}

/// Compose the plain-text email for a contact submission.
pub fn contact_email(submission: &ContactSubmission, recipient: &str) -> OutgoingEmail {
    let subject = format!("Contact Form – {}", subject_excerpt(&submission.message));

    let mut body = String::new();
    body.push_str("New message from the website contact form.\n\n");
    body.push_str(&format!("Name: {}\n", submission.name.as_ref()));
    body.push_str(&format!("Email: {}\n\n", submission.email.as_ref()));
    body.push_str(&format!("Message:\n{}\n", submission.message));

    OutgoingEmail {
        to: recipient.to_string(),
        from_name: submission.name.as_ref().to_string(),
        from_email: submission.email.as_ref().to_string(),
        reply_to: submission.email.as_ref().to_string(),
        subject,
        content: MessageContent::Plain(body),
    }
}

/// Compose the multipart/mixed email for a job application, with the CV
/// base64-encoded as an attachment part. The attachment content type is
/// detected from the file bytes, falling back to a generic octet-stream.
pub fn application_email(submission: &JobApplicationSubmission, recipient: &str) -> OutgoingEmail {
    let position = submission.position.as_deref();
    let subject = format!(
        "New Job Application – {}",
        position.unwrap_or("Unspecified role")
    );

    let mut body = String::new();
    body.push_str("A new job application has been submitted.\n\n");
    body.push_str(&format!("Applicant name: {}\n", submission.name.as_ref()));
    body.push_str(&format!("Email: {}\n", submission.email.as_ref()));
    body.push_str(&format!("Phone: {}\n", submission.phone));
    body.push_str(&format!("Position: {}\n", position.unwrap_or("Not provided")));
    body.push_str(&format!(
        "Portfolio: {}\n\n",
        submission.portfolio.as_deref().unwrap_or("Not provided")
    ));
    body.push_str(&format!("Cover letter:\n{}\n", submission.cover_letter));

    let content_type = infer::get(&submission.cv.content)
        .map(|kind| kind.mime_type().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    OutgoingEmail {
        to: recipient.to_string(),
        from_name: submission.name.as_ref().to_string(),
        from_email: submission.email.as_ref().to_string(),
        reply_to: submission.email.as_ref().to_string(),
        subject,
        content: MessageContent::Mixed {
            boundary: generate_boundary(),
            text: body,
            attachment: Attachment::new(&submission.cv.filename, content_type, &submission.cv.content),
        },
    }
}

impl OutgoingEmail {
    /// Render the full wire message: headers, then the body, CRLF line endings
    /// throughout the MIME framing.
    pub fn formatted(&self) -> String {
        let mut out = String::new();
        write_header(&mut out, "From", &format!("{} <{}>", self.from_name, self.from_email));
        write_header(&mut out, "Reply-To", &self.reply_to);
        write_header(&mut out, "To", &self.to);
        write_header(&mut out, "Subject", &encode_header_value(&self.subject));

        match &self.content {
            MessageContent::Plain(text) => {
                write_header(&mut out, "Content-Type", "text/plain; charset=UTF-8");
                out.push_str("\r\n");
                out.push_str(text);
            }
            MessageContent::Mixed { boundary, text, attachment } => {
                write_header(&mut out, "MIME-Version", "1.0");
                write_header(
                    &mut out,
                    "Content-Type",
                    &format!("multipart/mixed; boundary=\"{}\"", boundary),
                );
                out.push_str("\r\n");

                out.push_str(&format!("--{}\r\n", boundary));
                write_header(&mut out, "Content-Type", "text/plain; charset=\"UTF-8\"");
                write_header(&mut out, "Content-Transfer-Encoding", "8bit");
                out.push_str("\r\n");
                out.push_str(text);
                out.push_str("\r\n");

                out.push_str(&format!("--{}\r\n", boundary));
                write_header(
                    &mut out,
                    "Content-Type",
                    &format!("{}; name=\"{}\"", attachment.content_type, attachment.filename),
                );
                write_header(&mut out, "Content-Transfer-Encoding", "base64");
                write_header(
                    &mut out,
                    "Content-Disposition",
                    &format!("attachment; filename=\"{}\"", attachment.filename),
                );
                out.push_str("\r\n");
                out.push_str(&chunk_split(&attachment.data_base64));
                out.push_str(&format!("\r\n--{}--", boundary));
            }
        }

        out
    }
}

/// The first 50 graphemes of the message, with an ellipsis when truncated.
/// Grapheme clusters, not bytes, so multi-byte text is never split.
fn subject_excerpt(message: &str) -> String {
    let graphemes: Vec<&str> = message.graphemes(true).collect();
    if graphemes.len() > SUBJECT_EXCERPT_LEN {
        format!("{}…", graphemes[..SUBJECT_EXCERPT_LEN].concat())
    } else {
        message.to_string()
    }
}

/// A fresh boundary token for each message.
fn generate_boundary() -> String {
    format!("==Multipart_Boundary_{}", Uuid::new_v4().to_simple())
}

fn write_header(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push_str(": ");
    out.push_str(value);
    out.push_str("\r\n");
}

/// RFC 2047 Base64 encoding for non-ASCII header values.
fn encode_header_value(value: &str) -> String {
    if value.is_ascii() {
        return value.to_string();
    }
    format!("=?UTF-8?B?{}?=", STANDARD.encode(value.as_bytes()))
}

/// Split a base64 string into CRLF-terminated lines of 76 characters.
fn chunk_split(encoded: &str) -> String {
    encoded
        .as_bytes()
        .chunks(BASE64_LINE_LEN)
        // base64 output is always valid UTF-8
        .map(|chunk| std::str::from_utf8(chunk).unwrap())
        .collect::<Vec<_>>()
        .join("\r\n")
}
