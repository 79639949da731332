use validator::validate_email;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitterEmail(String);

// The character set an email address may legally contain (RFC 5322 atext
// plus the separators); everything else is stripped before validation.
const EMAIL_SPECIALS: &str = "!#$%&'*+-=?^_`{|}~@.[]";

fn is_legal_email_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || EMAIL_SPECIALS.contains(c)
}

impl SubmitterEmail {
    /// Sanitize the raw form value by stripping characters that cannot appear
    /// in an email address, then run the full syntactic validity check.
    pub fn parse(s: String) -> Result<Self, String> {
        let sanitized: String = s.trim().chars().filter(|c| is_legal_email_char(*c)).collect();

        if validate_email(&sanitized) {
            Ok(Self(sanitized))
        } else {
            Err(format!("{} is not a valid email address.", s))
        }
    }
}

impl AsRef<str> for SubmitterEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubmitterEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
