use crate::error::JodiError;

/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

/// OBS_VALUE cell → finite f64. Empty, non-numeric and NaN/inf cells are `None`.
pub fn parse_observation(raw: &str) -> Option<f64> {
    clean_str(raw)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// ASSESSMENT_CODE cell → integer.
pub fn parse_assessment_code(raw: &str) -> Result<u32, JodiError> {
    clean_str(raw)
        .parse::<u32>()
        .map_err(|_| JodiError::AssessmentCode {
            value: raw.to_string(),
        })
}

/// Upper bound on buffer preallocation from an untrusted size hint
/// (`Content-Length`, zip entry header).
pub const PREALLOC_LIMIT: u64 = 64 << 20;

/// Initial capacity for a buffer whose final size is claimed by `hint`.
pub fn capped_capacity(hint: u64) -> usize {
    hint.min(PREALLOC_LIMIT) as usize
}
