use std::collections::HashMap;
use std::path::Path;

use crate::domain::submitter_email::SubmitterEmail;
use crate::domain::submitter_name::SubmitterName;

/// An incoming form body, before we know which of the two forms it is.
///
/// Field values are trimmed on insertion; the CV (if any) has already been
/// buffered into memory by the extractor.
#[derive(Debug, Default)]
pub struct RawSubmission {
    fields: HashMap<String, String>,
    pub cv: Option<CvUpload>,
}

impl RawSubmission {
    pub fn insert_field(&mut self, name: String, value: String) {
        self.fields.insert(name, value.trim().to_string());
    }

    /// The trimmed value of a field, or "" when the field was absent.
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }
}

/// A file received on the `cv` field. `size` is the number of bytes the
/// client actually sent; `content` may be capped below that by the extractor,
/// which only matters for uploads that fail the size check anyway.
#[derive(Debug)]
pub struct CvUpload {
    pub filename: String,
    pub content: Vec<u8>,
    pub size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    Contact,
    JobApplication,
}

/// The contact-vs-job-application decision rule.
///
/// A submission is a contact message iff it carries a non-empty `message`,
/// no `cv` file, and no (non-empty) `cover_letter`. Everything else goes
/// down the job application path, which has the stricter validation.
pub fn classify(raw: &RawSubmission) -> SubmissionKind {
    let has_message = !raw.field("message").is_empty();
    let has_cover_letter = !raw.field("cover_letter").is_empty();

    if has_message && raw.cv.is_none() && !has_cover_letter {
        SubmissionKind::Contact
    } else {
        SubmissionKind::JobApplication
    }
}

/// Validation failures, each carrying the exact text returned to the browser.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Please fill in all required fields (name, email, and message) with a valid email address.")]
    InvalidContact,
    #[error("Please complete all required fields and attach your CV.")]
    IncompleteApplication,
    #[error("CV upload failed. Please upload a PDF or DOC file up to 8MB.")]
    InvalidCv,
}

#[derive(Debug)]
pub struct ContactSubmission {
    pub name: SubmitterName,
    pub email: SubmitterEmail,
    pub message: String,
}

impl ContactSubmission {
    pub fn try_from_raw(raw: RawSubmission) -> Result<Self, SubmissionError> {
        let name = SubmitterName::parse(raw.field("name").to_string())
            .map_err(|_| SubmissionError::InvalidContact)?;
        let email = SubmitterEmail::parse(raw.field("email").to_string())
            .map_err(|_| SubmissionError::InvalidContact)?;
        let message = raw.field("message").to_string();

        if message.is_empty() {
            return Err(SubmissionError::InvalidContact);
        }

        Ok(Self { name, email, message })
    }
}

/// A validated CV, ready to be attached.
#[derive(Debug)]
pub struct CvFile {
    pub filename: String,
    pub content: Vec<u8>,
}

#[derive(Debug)]
pub struct JobApplicationSubmission {
    pub name: SubmitterName,
    pub email: SubmitterEmail,
    pub phone: String,
    pub cover_letter: String,
    pub position: Option<String>,
    pub portfolio: Option<String>,
    pub cv: CvFile,
}

impl JobApplicationSubmission {
    pub fn try_from_raw(
        raw: RawSubmission,
        allowed_extensions: &[String],
        max_size_bytes: usize,
    ) -> Result<Self, SubmissionError> {
        let name = SubmitterName::parse(raw.field("name").to_string())
            .map_err(|_| SubmissionError::IncompleteApplication)?;
        let email = SubmitterEmail::parse(raw.field("email").to_string())
            .map_err(|_| SubmissionError::IncompleteApplication)?;
        let phone = raw.field("phone").to_string();
        let cover_letter = raw.field("cover_letter").to_string();
        let position = optional(raw.field("position"));
        let portfolio = optional(raw.field("portfolio"));

        if phone.is_empty() || cover_letter.is_empty() {
            return Err(SubmissionError::IncompleteApplication);
        }

        let upload = raw.cv.ok_or(SubmissionError::IncompleteApplication)?;

        let allowed = extension(&upload.filename)
            .map(|ext| allowed_extensions.iter().any(|a| a.eq_ignore_ascii_case(&ext)))
            .unwrap_or(false);
        if !allowed || upload.size > max_size_bytes {
            return Err(SubmissionError::InvalidCv);
        }

        Ok(Self {
            name,
            email,
            phone,
            cover_letter,
            position,
            portfolio,
            cv: CvFile {
                filename: upload.filename,
                content: upload.content,
            },
        })
    }
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
