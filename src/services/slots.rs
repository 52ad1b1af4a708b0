use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Invalid date regex"));

static BOOK_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)book\s+(?:dr\.?\s*)?(.+)").expect("Invalid booking name regex")
});

static DOCTOR_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bdr(?:\.\s*|\s+)([a-z][a-z\s]*)").expect("Invalid doctor name regex")
});

/// Name following "book" / "book dr." in a booking request.
pub fn extract_booking_name(input: &str) -> Option<String> {
    BOOK_NAME_RE
        .captures(input)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|n| !n.is_empty())
}

/// Words following "dr" / "dr." anywhere in the input.
pub fn extract_doctor_name(input: &str) -> Option<String> {
    DOCTOR_NAME_RE
        .captures(input)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|n| !n.is_empty())
}

/// Accepts `YYYY-MM-DD` naming a real calendar day.
pub fn parse_date(input: &str) -> Option<String> {
    let input = input.trim();
    if !DATE_RE.is_match(input) {
        return None;
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

/// Normalizes `H`, `HH`, `Hmm`, `HHmm`, `H:mm`, `HH:mm` and `HH:mm:ss` to
/// `HH:mm:ss` on a 24-hour clock.
pub fn normalize_time(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let parts: Vec<&str> = if input.contains(':') {
        let parts: Vec<&str> = input.split(':').collect();
        let shaped = match parts.as_slice() {
            [h, m] => (1..=2).contains(&h.len()) && m.len() == 2,
            [h, m, s] => (1..=2).contains(&h.len()) && m.len() == 2 && s.len() == 2,
            _ => false,
        };
        if !shaped {
            return None;
        }
        parts
    } else {
        if !input.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        match input.len() {
            1 | 2 => vec![input],
            3 | 4 => {
                let split = input.len() - 2;
                vec![&input[..split], &input[split..]]
            }
            _ => return None,
        }
    };

    if !parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }

    let mut fields = parts.iter().map(|p| p.parse::<u32>().ok());
    let hour = fields.next().flatten()?;
    let minute = fields.next().flatten().unwrap_or(0);
    let second = fields.next().flatten().unwrap_or(0);

    NaiveTime::from_hms_opt(hour, minute, second).map(|t| t.format("%H:%M:%S").to_string())
}
