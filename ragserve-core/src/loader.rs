//! Document loader: uploaded file blobs → normalized [`Document`]s.
//!
//! Extraction is type-specific: text-ish formats are decoded as strict
//! UTF-8, HTML is tag-stripped, and anything binary is rejected with
//! [`RagError::Load`]. There is no partial-success policy: the first file
//! that fails to parse fails the whole batch.

use std::collections::HashMap;

use uuid::Uuid;

use crate::document::{Document, SOURCE_KEY};
use crate::error::{RagError, Result};

/// A raw uploaded file as received at the HTTP boundary.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// The filename declared in the multipart field.
    pub filename: String,
    /// The declared content type, if any.
    pub content_type: Option<String>,
    /// The raw file bytes.
    pub bytes: Vec<u8>,
}

/// Convert a batch of uploaded files into documents.
///
/// Each document gets a fresh v4 UUID id and a `source` metadata entry
/// equal to the originating filename.
///
/// # Errors
///
/// Returns [`RagError::Load`] if the batch is empty or any file cannot be
/// parsed (unsupported content type, invalid UTF-8).
pub fn load_documents(files: &[UploadedFile]) -> Result<Vec<Document>> {
    if files.is_empty() {
        return Err(RagError::Load("upload contained no files".to_string()));
    }
    files.iter().map(load_one).collect()
}

fn load_one(file: &UploadedFile) -> Result<Document> {
    let content_type = match file.content_type.as_deref().filter(|ct| !ct.is_empty()) {
        Some(ct) => ct.to_string(),
        None => mime_guess::from_path(&file.filename).first_or_octet_stream().essence_str().to_string(),
    };

    let text = extract_text(&content_type, &file.bytes, &file.filename)?;

    let mut metadata = HashMap::new();
    metadata.insert(SOURCE_KEY.to_string(), file.filename.clone());
    metadata.insert("content_type".to_string(), content_type);

    Ok(Document { id: Uuid::new_v4().to_string(), text, metadata })
}

/// Extract plain text from file bytes according to the content type.
fn extract_text(content_type: &str, bytes: &[u8], filename: &str) -> Result<String> {
    // Strip any parameters ("text/plain; charset=utf-8" → "text/plain").
    let essence = content_type.split(';').next().unwrap_or(content_type).trim();

    let decode = |bytes: &[u8]| {
        String::from_utf8(bytes.to_vec())
            .map_err(|_| RagError::Load(format!("file '{filename}' is not valid UTF-8")))
    };

    match essence {
        "text/html" | "application/xhtml+xml" => Ok(strip_html(&decode(bytes)?)),
        "application/json" | "application/x-ndjson" | "application/csv" | "application/xml" => {
            decode(bytes)
        }
        t if t.starts_with("text/") => decode(bytes),
        other => Err(RagError::Load(format!(
            "unsupported content type '{other}' for file '{filename}'"
        ))),
    }
}

/// Reduce an HTML page to its visible text.
///
/// Drops tags, comments, and `script`/`style` element bodies, and
/// collapses runs of whitespace to single spaces.
fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len() / 2);
    let mut rest = html;
    let mut skip_until: Option<&str> = None;

    while let Some(open) = rest.find('<') {
        if skip_until.is_none() {
            push_text(&mut out, &rest[..open]);
        }
        rest = &rest[open..];

        if let Some(closer) = skip_until {
            match rest.to_ascii_lowercase().find(closer) {
                Some(end) => {
                    rest = &rest[end + closer.len()..];
                    skip_until = None;
                    continue;
                }
                None => return out.trim().to_string(),
            }
        }

        if rest.starts_with("<!--") {
            match rest.find("-->") {
                Some(end) => rest = &rest[end + 3..],
                None => break,
            }
            continue;
        }

        let lower = rest.to_ascii_lowercase();
        if lower.starts_with("<script") {
            skip_until = Some("</script>");
        } else if lower.starts_with("<style") {
            skip_until = Some("</style>");
        }

        match rest.find('>') {
            Some(end) => rest = &rest[end + 1..],
            None => break,
        }
    }
    if skip_until.is_none() {
        push_text(&mut out, rest);
    }
    out.trim().to_string()
}

/// Append text, collapsing whitespace runs to single spaces.
fn push_text(out: &mut String, text: &str) {
    for word in text.split_whitespace() {
        if !out.is_empty() && !out.ends_with(' ') {
            out.push(' ');
        }
        out.push_str(word);
    }
}
