//! Contact form schema: sanitization and field validation
//!
//! A [`RawSubmission`] arrives from an untrusted caller. [`validate`] sanitizes
//! every field and checks it against the schema, yielding either a canonical
//! [`Submission`] or the first violated rule. Fields are checked in declaration
//! order (name, email, subject, message); within a field the order is
//! required, then length, then character class.

use crate::sanitize;
use email_address::{EmailAddress, Options};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

pub const NAME_MAX_CHARS: usize = 100;
pub const EMAIL_MAX_CHARS: usize = 254;
pub const SUBJECT_MAX_CHARS: usize = 200;
pub const MESSAGE_MIN_CHARS: usize = 10;
pub const MESSAGE_MAX_CHARS: usize = 1000;

// Letters of any script (covers ąćęłńóśźż, composed or decomposed), spaces,
// hyphens and apostrophes
static NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\p{M}\s\-'’]+$").unwrap());

/// Form fields as submitted; missing fields deserialize as empty strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSubmission {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// A sanitized submission that satisfies every field rule
///
/// Only [`validate`] constructs this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    name: String,
    email: String,
    subject: String,
    message: String,
}

impl Submission {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<Submission> for RawSubmission {
    fn from(submission: Submission) -> Self {
        Self {
            name: submission.name,
            email: submission.email,
            subject: submission.subject,
            message: submission.message,
        }
    }
}

/// Form field a validation error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Email,
    Subject,
    Message,
}

/// First violated rule; the display text is shown to the user as-is
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Imię jest wymagane.")]
    NameRequired,
    #[error("Imię może mieć maksymalnie 100 znaków.")]
    NameTooLong,
    #[error("Imię może zawierać tylko litery, spacje, myślniki i apostrofy.")]
    NameInvalidCharacters,
    #[error("Adres email jest wymagany.")]
    EmailRequired,
    #[error("Adres email może mieć maksymalnie 254 znaki.")]
    EmailTooLong,
    #[error("Proszę podać prawidłowy adres email.")]
    EmailInvalid,
    #[error("Temat jest wymagany.")]
    SubjectRequired,
    #[error("Temat może mieć maksymalnie 200 znaków.")]
    SubjectTooLong,
    #[error("Wiadomość jest wymagana.")]
    MessageRequired,
    #[error("Wiadomość musi mieć co najmniej 10 znaków.")]
    MessageTooShort,
    #[error("Wiadomość może mieć maksymalnie 1000 znaków.")]
    MessageTooLong,
}

impl SubmissionError {
    pub fn field(&self) -> Field {
        use SubmissionError::*;

        match self {
            NameRequired | NameTooLong | NameInvalidCharacters => Field::Name,
            EmailRequired | EmailTooLong | EmailInvalid => Field::Email,
            SubjectRequired | SubjectTooLong => Field::Subject,
            MessageRequired | MessageTooShort | MessageTooLong => Field::Message,
        }
    }
}

/// Sanitize `raw` and check it against the schema
pub fn validate(raw: &RawSubmission) -> Result<Submission, SubmissionError> {
    let submission = Submission {
        name: sanitize::single_line(&raw.name),
        email: sanitize::email(&raw.email),
        subject: sanitize::single_line(&raw.subject),
        message: sanitize::multi_line(&raw.message),
    };

    let first_violation = [
        check_name(&submission.name),
        check_email(&submission.email),
        check_subject(&submission.subject),
        check_message(&submission.message),
    ]
    .into_iter()
    .flatten()
    .next();

    match first_violation {
        Some(error) => Err(error),
        None => Ok(submission),
    }
}

fn check_name(name: &str) -> Option<SubmissionError> {
    if name.is_empty() {
        Some(SubmissionError::NameRequired)
    } else if name.chars().count() > NAME_MAX_CHARS {
        Some(SubmissionError::NameTooLong)
    } else if !NAME_REGEX.is_match(name) {
        Some(SubmissionError::NameInvalidCharacters)
    } else {
        None
    }
}

fn check_email(email: &str) -> Option<SubmissionError> {
    let options = Options::default()
        .with_required_tld()
        .without_display_text()
        .without_domain_literal();

    if email.is_empty() {
        Some(SubmissionError::EmailRequired)
    } else if email.chars().count() > EMAIL_MAX_CHARS {
        Some(SubmissionError::EmailTooLong)
    } else if EmailAddress::parse_with_options(email, options).is_err()
        || email.parse::<lettre::Address>().is_err()
    {
        // Must also be usable as the Reply-To mailbox
        Some(SubmissionError::EmailInvalid)
    } else {
        None
    }
}

fn check_subject(subject: &str) -> Option<SubmissionError> {
    if subject.is_empty() {
        Some(SubmissionError::SubjectRequired)
    } else if subject.chars().count() > SUBJECT_MAX_CHARS {
        Some(SubmissionError::SubjectTooLong)
    } else {
        None
    }
}

fn check_message(message: &str) -> Option<SubmissionError> {
    let length = message.chars().count();

    if message.is_empty() {
        Some(SubmissionError::MessageRequired)
    } else if length < MESSAGE_MIN_CHARS {
        Some(SubmissionError::MessageTooShort)
    } else if length > MESSAGE_MAX_CHARS {
        Some(SubmissionError::MessageTooLong)
    } else {
        None
    }
}
