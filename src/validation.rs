//! Email classification for lead intake.
//!
//! B2B inquiries require a business-grade address: well-formed, and not from
//! a free/consumer or disposable provider. B2C flows only require the address
//! to be well-formed. Both checks are pure functions over the input and the
//! static deny-list.

use regex::Regex;

/// Free/consumer/disposable email providers rejected for B2B leads.
const FREE_EMAIL_DOMAINS: &[&str] = &[
    // Google
    "gmail.com",
    "googlemail.com",
    // Microsoft
    "hotmail.com",
    "outlook.com",
    "live.com",
    "msn.com",
    "hotmail.co.uk",
    "outlook.co.uk",
    "live.co.uk",
    // Yahoo
    "yahoo.com",
    "yahoo.co.uk",
    "yahoo.in",
    "yahoo.co.in",
    "ymail.com",
    "rocketmail.com",
    // Apple
    "icloud.com",
    "me.com",
    "mac.com",
    // Other popular free providers
    "aol.com",
    "protonmail.com",
    "proton.me",
    "tutanota.com",
    "zoho.com",
    "mail.com",
    "gmx.com",
    "fastmail.com",
    "yandex.com",
    "mail.ru",
    // Indian free email providers
    "rediffmail.com",
    "sify.com",
    "in.com",
    "indiatimes.com",
    // Temporary/disposable email domains
    "10minutemail.com",
    "tempmail.org",
    "guerrillamail.com",
    "mailinator.com",
    "throwaway.email",
    "temp-mail.org",
    "getnada.com",
    "maildrop.cc",
];

/// Substrings that mark a domain as disposable regardless of the deny-list.
const SUSPICIOUS_DOMAIN_FRAGMENTS: &[&str] = &["temp", "disposable", "fake"];

/// `local@domain.tld`: no whitespace, one `@`, at least one dot after it.
const EMAIL_SHAPE: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

pub const MSG_REQUIRED: &str = "Email is required";
pub const MSG_INVALID_FORMAT: &str = "Invalid email format";
pub const MSG_FREE_DOMAIN: &str = "Business email required. Free email domains (Gmail, Yahoo, Hotmail, etc.) are not accepted for business inquiries.";
pub const MSG_DISPOSABLE: &str = "Temporary or disposable email addresses are not accepted.";

/// Outcome of an email classification.
///
/// `message` explains every non-business outcome; a business-grade address
/// carries no message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmailValidation {
    pub is_valid: bool,
    pub is_business: bool,
    pub message: Option<&'static str>,
}

impl EmailValidation {
    fn invalid(message: &'static str) -> Self {
        Self {
            is_valid: false,
            is_business: false,
            message: Some(message),
        }
    }

    fn consumer(message: &'static str) -> Self {
        Self {
            is_valid: true,
            is_business: false,
            message: Some(message),
        }
    }

    fn business() -> Self {
        Self {
            is_valid: true,
            is_business: true,
            message: None,
        }
    }
}

fn well_formed(email: &str) -> bool {
    // The pattern is a literal; compilation cannot fail.
    Regex::new(EMAIL_SHAPE).unwrap().is_match(email)
}

/// Domain of a well-formed address: everything after the last `@`, case-folded.
fn domain_of(email: &str) -> Option<String> {
    email.rsplit('@').next().map(|d| d.to_lowercase())
}

/// Classifies an address for B2B intake: well-formed / free-provider /
/// business-grade.
pub fn validate_business_email(email: &str) -> EmailValidation {
    if email.is_empty() {
        return EmailValidation::invalid(MSG_REQUIRED);
    }
    if !well_formed(email) {
        return EmailValidation::invalid(MSG_INVALID_FORMAT);
    }

    let domain = match domain_of(email) {
        Some(d) if !d.is_empty() => d,
        _ => return EmailValidation::invalid(MSG_INVALID_FORMAT),
    };

    if FREE_EMAIL_DOMAINS.contains(&domain.as_str()) {
        return EmailValidation::consumer(MSG_FREE_DOMAIN);
    }

    if SUSPICIOUS_DOMAIN_FRAGMENTS
        .iter()
        .any(|fragment| domain.contains(fragment))
    {
        return EmailValidation::consumer(MSG_DISPOSABLE);
    }

    EmailValidation::business()
}

/// Shape-only check for B2C intake; any syntactically valid address passes.
pub fn validate_consumer_email(email: &str) -> EmailValidation {
    if email.is_empty() {
        return EmailValidation::invalid(MSG_REQUIRED);
    }
    if !well_formed(email) {
        return EmailValidation::invalid(MSG_INVALID_FORMAT);
    }
    EmailValidation {
        is_valid: true,
        is_business: false,
        message: None,
    }
}

/// True when `domain` belongs to a known free provider.
pub fn is_free_email_domain(domain: &str) -> bool {
    FREE_EMAIL_DOMAINS.contains(&domain.to_lowercase().as_str())
}

/// The deny-list, for reference output (diagnostics, docs).
pub fn free_email_domains() -> Vec<&'static str> {
    let mut domains = FREE_EMAIL_DOMAINS.to_vec();
    domains.sort_unstable();
    domains
}
