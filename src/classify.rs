//! Content-type gating between the HTML and opaque extraction paths.

/// Which extraction path a response takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Opaque,
}

/// Classify a `Content-Type` header value.
///
/// HTML when the value contains `text/html` or `application/xhtml+xml`,
/// compared ASCII case-insensitively. A missing header is opaque.
pub fn classify(content_type: Option<&str>) -> ContentKind {
    let Some(value) = content_type else {
        return ContentKind::Opaque;
    };
    let value = value.to_ascii_lowercase();
    if value.contains("text/html") || value.contains("application/xhtml+xml") {
        ContentKind::Html
    } else {
        ContentKind::Opaque
    }
}
