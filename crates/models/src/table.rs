use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    fmt::{Display, Formatter, Result as FmtResult},
};
use uuid::Uuid;

/// Longest label a table may carry
pub const MAX_LABEL_LEN: usize = 32;

/// A table on the restaurant floor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TableSummary {
    pub id: Uuid,
    pub label: String,
}

impl TableSummary {
    pub fn new(id: Uuid, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }

    /// The digits of the label read as one number, e.g. `A12` is 12
    pub fn label_number(&self) -> Option<u64> {
        label_number(&self.label)
    }
}

/// Orders tables by the number in their label. Tables without digits go
/// last; ties fall back to the label itself.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    match (label_number(a), label_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Sorts tables in floor order
pub fn sort_tables(tables: &mut [TableSummary]) {
    tables.sort_by(|a, b| compare_labels(&a.label, &b.label));
}

fn label_number(label: &str) -> Option<u64> {
    let digits: String = label.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Reasons a table label is refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
    Empty,
    TooLong,
    InvalidCharacter(char),
}

impl Display for LabelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Empty => write!(f, "Table label cannot be empty"),
            Self::TooLong => write!(
                f,
                "Table label cannot be longer than {MAX_LABEL_LEN} characters"
            ),
            Self::InvalidCharacter(c) => write!(
                f,
                "Table label may only contain letters, digits, '-' and '_' (found '{c}')"
            ),
        }
    }
}

impl std::error::Error for LabelError {}

/// Trims and checks a label so it can appear as a URL path segment
pub fn normalize_label(label: &str) -> Result<String, LabelError> {
    let label = label.trim();

    if label.is_empty() {
        return Err(LabelError::Empty);
    }
    if label.chars().count() > MAX_LABEL_LEN {
        return Err(LabelError::TooLong);
    }
    if let Some(c) = label
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(LabelError::InvalidCharacter(c));
    }

    Ok(label.to_string())
}
