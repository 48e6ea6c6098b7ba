//! Message payload part tree.
//!
//! Mailbox providers deliver a message body as a tree of MIME-typed parts.
//! Leaf parts carry base64url-encoded body data; container parts carry
//! nested parts instead.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

/// One node in a message payload tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePart {
    /// MIME type of this part (e.g. `text/plain`, `multipart/alternative`).
    pub mime_type: String,
    /// Base64url-encoded body data, as delivered by the provider.
    /// `None` for container parts and parts with no decodable body.
    pub body: Option<String>,
    /// Nested parts for `multipart/*` containers.
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

impl MessagePart {
    /// Creates a leaf part from raw bytes, encoding them the way a
    /// provider would.
    #[must_use]
    pub fn leaf(mime_type: impl Into<String>, data: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            body: Some(URL_SAFE_NO_PAD.encode(data)),
            parts: Vec::new(),
        }
    }

    /// Creates a `text/plain` leaf part.
    #[must_use]
    pub fn text_plain(text: &str) -> Self {
        Self::leaf("text/plain", text.as_bytes())
    }

    /// Creates a `text/html` leaf part.
    #[must_use]
    pub fn text_html(html: &str) -> Self {
        Self::leaf("text/html", html.as_bytes())
    }

    /// Creates a `multipart/alternative` container.
    #[must_use]
    pub fn alternative(parts: Vec<Self>) -> Self {
        Self {
            mime_type: "multipart/alternative".to_string(),
            body: None,
            parts,
        }
    }

    /// Creates a `multipart/mixed` container.
    #[must_use]
    pub fn mixed(parts: Vec<Self>) -> Self {
        Self {
            mime_type: "multipart/mixed".to_string(),
            body: None,
            parts,
        }
    }

    /// The MIME type without parameters (`text/plain; charset=utf-8`
    /// becomes `text/plain`).
    #[must_use]
    pub fn essence(&self) -> &str {
        self.mime_type
            .split(';')
            .next()
            .unwrap_or(&self.mime_type)
            .trim()
    }

    /// Checks whether this part is `text/plain`.
    #[must_use]
    pub fn is_text_plain(&self) -> bool {
        self.essence().eq_ignore_ascii_case("text/plain")
    }

    /// Checks whether this part is `text/html`.
    #[must_use]
    pub fn is_text_html(&self) -> bool {
        self.essence().eq_ignore_ascii_case("text/html")
    }

    /// Checks whether this part is any `multipart/*` container.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.essence()
            .get(..10)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("multipart/"))
    }

    /// Checks whether this part is `multipart/alternative`.
    #[must_use]
    pub fn is_alternative(&self) -> bool {
        self.essence().eq_ignore_ascii_case("multipart/alternative")
    }

    /// Decodes the body data to raw bytes.
    ///
    /// Decoding is lenient: embedded whitespace is stripped and trailing
    /// padding is tolerated. Both the URL-safe and standard base64
    /// alphabets are accepted. Returns `None` when there is no body or the
    /// data is not valid base64.
    #[must_use]
    pub fn decoded_bytes(&self) -> Option<Vec<u8>> {
        let data = self.body.as_deref()?;
        let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
        let trimmed = cleaned.trim_end_matches('=');
        URL_SAFE_NO_PAD
            .decode(trimmed)
            .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
            .ok()
    }

    /// Decodes the body data to text, replacing invalid UTF-8 sequences.
    #[must_use]
    pub fn decoded_text(&self) -> Option<String> {
        self.decoded_bytes()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }
}
