pub mod message;
pub mod transport;

pub use message::{application_email, contact_email, Attachment, MessageContent, OutgoingEmail};
pub use transport::{MailTransport, SmtpMailTransport};
