//! Document text extraction
//!
//! PDF parsing is delegated to `pdf-extract`; this module only decides how to
//! read an upload and cleans the resulting lines.

use std::path::Path;

use crate::error::{Error, Result};

/// Extract document text from an uploaded file.
///
/// `.pdf` files go through the PDF extractor, everything else must be UTF-8 text.
pub fn extract_text(filename: &str, data: &[u8]) -> Result<String> {
    let is_pdf = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    let raw = if is_pdf {
        extract_pdf(data)?
    } else {
        String::from_utf8(data.to_vec())
            .map_err(|e| Error::extraction(format!("'{}' is not UTF-8 text: {}", filename, e)))?
    };

    Ok(clean_text(&raw))
}

#[cfg(feature = "pdf")]
fn extract_pdf(data: &[u8]) -> Result<String> {
    if !data.starts_with(b"%PDF-") {
        return Err(Error::extraction("missing %PDF- header"));
    }

    // pdf-extract panics on some malformed font tables
    let data = data.to_vec();
    std::panic::catch_unwind(move || pdf_extract::extract_text_from_mem(&data))
        .map_err(|_| Error::extraction("PDF parser panicked"))?
        .map_err(|e| Error::extraction(e.to_string()))
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(_data: &[u8]) -> Result<String> {
    Err(Error::extraction(
        "PDF support is disabled; rebuild with the `pdf` feature",
    ))
}

/// Drop blank lines and form-fill lines made only of underscores.
///
/// Surviving lines are kept verbatim and joined with `\n`; null characters
/// left behind by some PDF encoders are removed.
pub fn clean_text(raw: &str) -> String {
    raw.replace('\0', "")
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.chars().all(|c| c == '_')
        })
        .collect::<Vec<_>>()
        .join("\n")
}
