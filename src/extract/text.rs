use crate::error::PipelineError;

/// Strict UTF-8, kept verbatim (a byte order mark included); invalid input
/// is an error, never replaced.
pub(crate) fn decode_plain(bytes: &[u8]) -> Result<String, PipelineError> {
    Ok(std::str::from_utf8(bytes)?.to_string())
}
