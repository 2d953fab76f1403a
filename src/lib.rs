//! Shared protocol definitions for the obrow project.
//!
//! This library defines the wire-level contract between the `obrow`
//! client and the `obrowd` daemon: the default listening port, the
//! line-mode acknowledgment, and the classification of a request line.

/// Default TCP port the daemon listens on.
///
/// Shared by the daemon and CLI to avoid configuration drift.
pub const DEFAULT_PORT: u16 = 80;

/// Acknowledgment written for each line-mode request.
pub const OK_REPLY: &str = "OK";

/// One request line, classified.
///
/// Every line yields exactly one variant: a line shaped like a minimal
/// HTTP GET request line becomes [`OpenRequest::HttpGet`]; any other
/// line is taken verbatim as [`OpenRequest::PlainPath`]. Classification
/// is total — there is no malformed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenRequest {
    /// A minimal `GET /<segment> HTTP/1.<digit>` request line.
    HttpGet {
        /// The still-encoded path segment captured from the line.
        raw_segment: String,
    },
    /// Any other line, used verbatim as the path or URL to open.
    PlainPath {
        /// The path exactly as received.
        path: String,
    },
}

impl OpenRequest {
    /// Classify one request line, with its terminator already stripped.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        match http_get_segment(line) {
            Some(segment) => Self::HttpGet {
                raw_segment: segment.to_owned(),
            },
            None => Self::PlainPath {
                path: line.to_owned(),
            },
        }
    }
}

/// Extract the path segment from a minimal HTTP GET request line.
///
/// The line must read `GET /<segment> HTTP/1.<digit>` with nothing after
/// the version digit. The leading slash is optional and not part of the
/// returned segment; the segment must be non-empty and contain no
/// whitespace.
fn http_get_segment(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("GET ")?;
    let rest = rest.strip_prefix('/').unwrap_or(rest);
    let (segment, version) = rest.split_once(' ')?;
    if segment.is_empty() || segment.chars().any(char::is_whitespace) {
        return None;
    }
    let after_prefix = version.strip_prefix("HTTP/1.")?;
    let mut digits = after_prefix.chars();
    match (digits.next(), digits.next()) {
        (Some(d), None) if d.is_ascii_digit() => Some(segment),
        _ => None,
    }
}
