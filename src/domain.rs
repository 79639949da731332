pub mod submitter_email;
pub mod submitter_name;
pub mod submission;

pub use submission::{
    classify, ContactSubmission, CvFile, CvUpload, JobApplicationSubmission, RawSubmission,
    SubmissionError, SubmissionKind,
};
pub use submitter_email::SubmitterEmail;
pub use submitter_name::SubmitterName;
