use chrono::NaiveTime;

use crate::error::{validation_error, Error, FieldError};

pub trait Validate {
    /// Every failing field, empty when the record is valid.
    fn field_errors(&self) -> Vec<FieldError>;

    fn validate(&self) -> Result<(), Error> {
        let fields = self.field_errors();
        if fields.is_empty() {
            return Ok(());
        }

        Err(validation_error(fields))
    }
}

pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

pub fn is_valid_time(s: &str) -> bool {
    NaiveTime::parse_from_str(s, "%H:%M").is_ok()
}

pub fn is_valid_hex_color(s: &str) -> bool {
    match s.strip_prefix('#') {
        Some(hex) => {
            (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

/// Joins prior parse failures with the record's own checks.
pub fn finish<T: Validate>(record: T, mut fields: Vec<FieldError>) -> Result<T, Error> {
    for field in record.field_errors() {
        if !fields.iter().any(|f| f.field == field.field) {
            fields.push(field);
        }
    }

    if fields.is_empty() {
        return Ok(record);
    }

    Err(validation_error(fields))
}

#[test]
fn time_and_color_formats() {
    assert!(is_valid_time("09:00"));
    assert!(is_valid_time("23:59"));
    assert!(!is_valid_time("9am"));

    assert!(is_valid_hex_color("#3b82f6"));
    assert!(is_valid_hex_color("#fff"));
    assert!(!is_valid_hex_color("3b82f6"));
    assert!(!is_valid_hex_color("#3b82g6"));
}
