//! Assembled multipart/form-data request bodies.

/// A complete `multipart/form-data` body and the content type announcing it.
///
/// The caller sends `content_type` as the request's `Content-Type` header
/// verbatim and `body` as the request entity, unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormBody {
    /// `multipart/form-data; boundary=...`
    pub content_type: String,

    /// The framed body bytes.
    pub body: Vec<u8>,
}

impl FormBody {
    /// The boundary parameter of the content type, without quotes.
    pub fn boundary(&self) -> Option<&str> {
        let (_, rest) = self.content_type.split_once("boundary=")?;
        let rest = rest.split(';').next().unwrap_or(rest).trim();
        Some(
            rest.strip_prefix('"')
                .and_then(|r| r.strip_suffix('"'))
                .unwrap_or(rest),
        )
    }

    /// Body length in bytes.
    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Split into `(content_type, body)`.
    pub fn into_parts(self) -> (String, Vec<u8>) {
        (self.content_type, self.body)
    }
}
