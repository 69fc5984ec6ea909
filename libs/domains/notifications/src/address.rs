//! Address syntax helpers shared by every provider.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static DISPLAY_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)\s*<(.+?)>$").expect("valid display-name regex"));

/// An address split into its optional display name and bare mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedAddress {
    pub name: Option<String>,
    pub email: String,
}

/// Syntactic `local@domain.tld` check. Deliverability is the transport's problem.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Splits `"Display Name <addr>"` into name and address.
///
/// Surrounding double quotes on the display name are dropped. Input without the
/// angle-bracket form is returned trimmed with no name.
pub fn parse_email_address(input: &str) -> ParsedAddress {
    let input = input.trim();

    match DISPLAY_NAME_PATTERN.captures(input) {
        Some(caps) => {
            let name = caps[1].trim().trim_matches('"').trim().to_string();
            ParsedAddress {
                name: (!name.is_empty()).then_some(name),
                email: caps[2].trim().to_string(),
            }
        }
        None => ParsedAddress {
            name: None,
            email: input.to_string(),
        },
    }
}
