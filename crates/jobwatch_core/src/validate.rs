use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no document ids given")]
    NoDocumentIds,
    #[error("'{0}' is not a positive document id")]
    InvalidDocumentId(String),
    #[error("'{0}' is not a date in YYYY-MM-DD form")]
    InvalidDate(String),
}

/// Parses document ids separated by commas and/or whitespace.
///
/// Every id must be a positive integer; the first offending token is reported.
pub fn parse_document_ids(raw: &str) -> Result<Vec<u64>, ValidationError> {
    let ids = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| match token.parse::<u64>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(ValidationError::InvalidDocumentId(token.to_string())),
        })
        .collect::<Result<Vec<_>, _>>()?;
    validate_document_ids(&ids)?;
    Ok(ids)
}

pub fn validate_document_ids(ids: &[u64]) -> Result<(), ValidationError> {
    if ids.is_empty() {
        return Err(ValidationError::NoDocumentIds);
    }
    match ids.iter().find(|id| **id == 0) {
        Some(id) => Err(ValidationError::InvalidDocumentId(id.to_string())),
        None => Ok(()),
    }
}

/// Normalizes an optional date filter: blank means "no filter".
pub fn validate_date(raw: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| Some(date.format("%Y-%m-%d").to_string()))
        .map_err(|_| ValidationError::InvalidDate(raw.to_string()))
}
