use std::panic::{self, AssertUnwindSafe};

/// Extracts the text layer of every page. `pdf-extract` panics on some malformed
/// inputs, so the call is unwound here and reported as an ordinary error.
pub(super) fn extract(bytes: &[u8]) -> Result<String, String> {
    match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes))) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("malformed PDF structure".to_string()),
    }
}
