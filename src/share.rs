//! Sharing a quote: WhatsApp deep links and postal code validation.

use std::fmt;

use reqwest::Url;

use crate::error::{Result, StorefrontError};

const WHATSAPP_BASE: &str = "https://wa.me/";
const DEFAULT_COUNTRY_CODE: &str = "55";

/// Normalize a phone number to the digits-only international form wa.me expects.
///
/// Formatting characters (`+`, spaces, `-`, `(`, `)`, `.`) are ignored.
/// Ten or eleven digit numbers are national numbers and get the default
/// country code prepended.
pub fn normalize_whatsapp_number(raw: &str) -> Result<String> {
    let mut digits = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '0'..='9' => digits.push(ch),
            '+' | ' ' | '-' | '(' | ')' | '.' => {}
            other => {
                return Err(StorefrontError::Validation(format!(
                    "phone number contains invalid character {:?}",
                    other
                )))
            }
        }
    }

    match digits.len() {
        10 | 11 => Ok(format!("{}{}", DEFAULT_COUNTRY_CODE, digits)),
        12..=15 => Ok(digits),
        n => Err(StorefrontError::Validation(format!(
            "phone number must have 10 to 15 digits, got {}",
            n
        ))),
    }
}

/// Build a `https://wa.me/<number>?text=<message>` link.
pub fn whatsapp_link(phone: &str, message: &str) -> Result<Url> {
    if message.trim().is_empty() {
        return Err(StorefrontError::Validation("quote message is empty".into()));
    }
    let number = normalize_whatsapp_number(phone)?;
    Url::parse_with_params(&format!("{}{}", WHATSAPP_BASE, number), &[("text", message)])
        .map_err(|e| StorefrontError::InvalidArgument(format!("Invalid WhatsApp URL: {}", e)))
}

// ---------------------------------------------------------------------------
// Cep
// ---------------------------------------------------------------------------

/// Brazilian postal code, stored as its eight digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cep(String);

impl Cep {
    /// Accepts `NNNNNNNN` or `NNNNN-NNN`, surrounding whitespace ignored.
    pub fn parse(raw: &str) -> Result<Self> {
        let s = raw.trim();
        let digits: String = match s.len() {
            8 => s.to_string(),
            9 if s.as_bytes()[5] == b'-' => format!("{}{}", &s[..5], &s[6..]),
            _ => String::new(),
        };
        if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(StorefrontError::Validation(format!("malformed CEP: {:?}", raw)));
        }
        Ok(Cep(digits))
    }

    pub fn digits(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", &self.0[..5], &self.0[5..])
    }
}
