use thiserror::Error;

/// Section-level extraction failure. Always resolved by the extractor itself
/// (the section comes back empty); it is only logged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SectionError {
    #[error("section `{0}` not found")]
    Missing(&'static str),

    #[error("section `{section}` is malformed: {detail}")]
    Malformed {
        section: &'static str,
        detail: String,
    },
}

impl SectionError {
    pub fn malformed(section: &'static str, detail: impl Into<String>) -> Self {
        Self::Malformed {
            section,
            detail: detail.into(),
        }
    }
}

/// Unwrap a section result, logging the failure and substituting an empty section.
pub(crate) fn isolate<T: Default>(section: &'static str, result: Result<T, SectionError>) -> T {
    match result {
        Ok(v) => v,
        Err(err) => {
            tracing::debug!(section, error = %err, "section extraction failed; continuing without it");
            T::default()
        }
    }
}
