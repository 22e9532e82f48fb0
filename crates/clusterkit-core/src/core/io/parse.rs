use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("Invalid integer for {field} (value: '{value}')")]
    InvalidInt { field: &'static str, value: String },
    #[error("Invalid float for {field} (value: '{value}')")]
    InvalidFloat { field: &'static str, value: String },
    #[error("Required field '{field}' is missing")]
    MissingField { field: &'static str },
}

pub(crate) fn parse_f64(token: Option<&str>, field: &'static str) -> Result<f64, ParseErrorKind> {
    let token = token.ok_or(ParseErrorKind::MissingField { field })?;
    token.parse().map_err(|_| ParseErrorKind::InvalidFloat {
        field,
        value: token.to_string(),
    })
}

pub(crate) fn parse_usize(token: Option<&str>, field: &'static str) -> Result<usize, ParseErrorKind> {
    let token = token.ok_or(ParseErrorKind::MissingField { field })?;
    token.parse().map_err(|_| ParseErrorKind::InvalidInt {
        field,
        value: token.to_string(),
    })
}

/// Leading alphabetic characters of an atom label (`"Si12"` -> `"Si"`).
pub(crate) fn element_prefix(label: &str) -> &str {
    let end = label
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphabetic())
        .map_or(label.len(), |(i, _)| i);
    &label[..end]
}
