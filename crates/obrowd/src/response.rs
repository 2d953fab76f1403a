//! HTTP-mode response rendering.
//!
//! The daemon answers a minimal GET request line with a fixed HTTP/1.0
//! document. The requested segment is percent-decoded before it reaches
//! the opener and HTML-escaped before it reaches the page; the decoded
//! but unescaped form is never written back to the client.

use percent_encoding::percent_decode_str;

/// Decode an application/x-www-form-urlencoded path segment.
///
/// `+` becomes a space and `%XX` sequences decode to bytes. Decoding
/// never fails: malformed `%` sequences pass through literally and
/// non-UTF-8 bytes are replaced.
#[must_use]
pub fn decode_www_form_component(segment: &str) -> String {
    let plus_decoded = segment.replace('+', " ");
    percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}

/// Escape a string for embedding in HTML text content.
#[must_use]
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Render the single-shot HTTP/1.0 response for an opened path.
///
/// `decoded` is the percent-decoded request path; the page embeds only
/// its HTML-escaped form.
#[must_use]
pub fn http_response(decoded: &str) -> String {
    let escaped = escape_html(decoded);
    format!(
        "HTTP/1.0 200 OK
Content-Type: text/html
Connection: Close

<html>
  <head>
    <title>Opened {escaped}</title>
  </head>
  <body>
    <h1>Opened</h1>
    <p>{escaped}</p>
  </body>
</html>
"
    )
}
