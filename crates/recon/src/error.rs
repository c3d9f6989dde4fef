use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (zero row limit, empty alias list, etc.).
    ConfigValidation(String),
    /// A cell or column reference that is not valid A1 notation.
    BadReference(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::BadReference(r) => write!(f, "invalid cell reference: '{r}'"),
        }
    }
}

impl std::error::Error for ReconError {}

/// Failures while loading the reference table.
///
/// Every variant is fatal to the request that hit it. Semantic non-matches
/// (invoice column absent, item unmatched) are never errors.
#[derive(Debug)]
pub enum SourceError {
    /// Neither a file path nor a URL was configured for the reference table.
    NotConfigured,
    /// The source needs a credential (env var name) that is not set.
    MissingCredentials(String),
    /// The named sheet does not exist in the reference workbook.
    SheetNotFound(String),
    /// The reference table could not be read or parsed.
    Read(String),
    /// The remote spreadsheet service answered with a failure.
    Remote { status: Option<u16>, message: String },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "reference source not configured (set a path or url)"),
            Self::MissingCredentials(var) => {
                write!(f, "reference source credentials missing (set {var})")
            }
            Self::SheetNotFound(name) => write!(f, "Sheet named \"{name}\" not found"),
            Self::Read(msg) => write!(f, "cannot read reference table: {msg}"),
            Self::Remote { status: Some(code), message } => {
                write!(f, "reference service returned HTTP {code}: {message}")
            }
            Self::Remote { status: None, message } => {
                write!(f, "reference service unreachable: {message}")
            }
        }
    }
}

impl std::error::Error for SourceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_not_found_names_the_sheet() {
        let err = SourceError::SheetNotFound("IN".into());
        assert_eq!(err.to_string(), "Sheet named \"IN\" not found");
    }

    #[test]
    fn remote_error_with_and_without_status() {
        let with = SourceError::Remote { status: Some(403), message: "forbidden".into() };
        assert!(with.to_string().contains("HTTP 403"));
        let without = SourceError::Remote { status: None, message: "timed out".into() };
        assert!(without.to_string().contains("unreachable"));
    }
}
