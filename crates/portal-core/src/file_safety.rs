//! File name sanitization and content sniffing for uploaded notes.

/// Detect the MIME type of `data` from its magic bytes, if recognizable.
pub fn sniff_content_type(data: &[u8]) -> Option<&'static str> {
    infer::get(data).map(|kind| kind.mime_type())
}

/// Whether the bytes are consistent with the declared MIME type.
///
/// Data without a recognizable signature is accepted; data whose signature
/// names a different type is not.
pub fn content_matches_declared(data: &[u8], declared: &str) -> bool {
    match sniff_content_type(data) {
        Some(detected) => detected.eq_ignore_ascii_case(declared.trim()),
        None => true,
    }
}

/// Strip path components and reserved characters from an uploaded file name.
pub fn sanitize_filename(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\0' | '#' | '%' => '_',
            c if c.is_control() || c.is_whitespace() => '_',
            c => c,
        })
        .collect();

    let sanitized = sanitized.trim_matches(|c| c == '.' || c == '_');
    if sanitized.is_empty() {
        return "unnamed_file".to_string();
    }

    // Truncate if too long (preserve extension)
    if sanitized.chars().count() > 200 {
        let ext: String = sanitized
            .rfind('.')
            .map(|pos| sanitized[pos..].chars().take(16).collect())
            .unwrap_or_default();
        let stem: String = sanitized.chars().take(200 - ext.chars().count()).collect();
        return format!("{}{}", stem.trim_end_matches('.'), ext);
    }

    sanitized.to_string()
}
