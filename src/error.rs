// src/error.rs

use thiserror::Error;

/// Failures callers need to tell apart. They travel inside `anyhow::Error`
/// and can be recovered with `downcast_ref::<JodiError>()`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JodiError {
    #[error("unknown {vocabulary} code `{code}`")]
    UnknownCode {
        vocabulary: &'static str,
        code: String,
    },

    #[error("archive contains no data file")]
    NoDataFile,

    #[error("unexpected column layout in {file}: {reason}")]
    ColumnLayout { file: String, reason: String },

    #[error("unparseable TIME_PERIOD `{value}`")]
    TimePeriod { value: String },

    #[error("non-integer ASSESSMENT_CODE `{value}`")]
    AssessmentCode { value: String },

    #[error("download of {url} failed: {reason}")]
    Download { url: String, reason: String },
}
