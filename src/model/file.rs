//! File attachments handed to the multipart builder.

use std::fmt;
use std::io::Read;

/// Content type used for attachments that do not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A named attachment backed by a readable byte source.
///
/// The byte source is read exactly once, front to back, while the body is
/// assembled. It can borrow from the caller (`&mut std::fs::File`), in which
/// case the caller keeps ownership and closes it when it goes out of scope.
pub struct File<'a> {
    /// Display name sent as the part's `filename` parameter.
    pub name: String,

    /// Declared content type. Empty means unspecified.
    pub content_type: String,

    /// Source of the attachment bytes.
    pub reader: Box<dyn Read + 'a>,
}

impl<'a> File<'a> {
    /// Create an attachment with no declared content type.
    pub fn new(name: impl Into<String>, reader: impl Read + 'a) -> Self {
        Self {
            name: name.into(),
            content_type: String::new(),
            reader: Box::new(reader),
        }
    }

    /// Create an attachment from an in-memory buffer.
    pub fn from_bytes(name: impl Into<String>, data: impl AsRef<[u8]> + 'a) -> Self {
        Self::new(name, std::io::Cursor::new(data))
    }

    /// Set the declared content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// The content type to put on the wire: the declared one, or
    /// [`DEFAULT_CONTENT_TYPE`] when none was given.
    pub fn effective_content_type(&self) -> &str {
        if self.content_type.is_empty() {
            DEFAULT_CONTENT_TYPE
        } else {
            &self.content_type
        }
    }
}

impl fmt::Debug for File<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}
