//! Streaming multipart framing over any `io::Write` sink.
//!
//! Output layout (RFC 2046 §5.1.1):
//!
//! ```text
//! --BOUNDARY\r\n
//! Header: value\r\n
//! \r\n
//! <body>\r\n
//! --BOUNDARY\r\n
//! ...
//! <body>\r\n
//! --BOUNDARY--\r\n
//! ```

use std::io::{self, Write};

use rand::Rng;

use crate::error::{FormError, Result};

use super::header::PartHeaders;

/// Number of random bytes behind a generated boundary (hex-encoded to 60 chars).
const BOUNDARY_BYTES: usize = 30;

/// Longest boundary RFC 2046 allows.
const MAX_BOUNDARY_LEN: usize = 70;

/// Characters that force the boundary parameter to be quoted in a content type.
const TSPECIALS: &str = "()<>@,;:\\\"/[]?= ";

/// Writes multipart parts into a byte sink.
///
/// Parts are written in order: [`MultipartWriter::create_part`] emits the
/// delimiter and header block, the returned [`Part`] receives the body, and
/// [`MultipartWriter::close`] writes the closing delimiter.
#[derive(Debug)]
pub struct MultipartWriter<W: Write> {
    inner: W,
    boundary: String,
    parts: usize,
    closed: bool,
}

/// Body writer for the part most recently opened on a [`MultipartWriter`].
pub struct Part<'w, W: Write> {
    inner: &'w mut W,
}

impl<W: Write> MultipartWriter<W> {
    /// Create a writer with a freshly generated random boundary.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            boundary: random_boundary(),
            parts: 0,
            closed: false,
        }
    }

    /// Create a writer with a caller-chosen boundary.
    ///
    /// Fails with [`FormError::InvalidBoundary`] if the boundary is empty,
    /// longer than 70 characters, contains characters outside the RFC 2046
    /// set, or ends with a space.
    pub fn with_boundary(inner: W, boundary: impl Into<String>) -> Result<Self> {
        let boundary = boundary.into();
        validate_boundary(&boundary)?;
        Ok(Self {
            inner,
            boundary,
            parts: 0,
            closed: false,
        })
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Number of parts created so far.
    pub fn part_count(&self) -> usize {
        self.parts
    }

    /// `multipart/form-data; boundary=...`, quoting the boundary when needed.
    pub fn form_data_content_type(&self) -> String {
        if self.boundary.contains(|c: char| TSPECIALS.contains(c)) {
            format!("multipart/form-data; boundary=\"{}\"", self.boundary)
        } else {
            format!("multipart/form-data; boundary={}", self.boundary)
        }
    }

    /// Start a new part: write its delimiter and headers, and return a
    /// writer for its body. Any previously returned [`Part`] is finished.
    pub fn create_part(&mut self, headers: &PartHeaders) -> io::Result<Part<'_, W>> {
        if self.closed {
            return Err(io::Error::other("multipart writer is already closed"));
        }

        let mut block = String::new();
        if self.parts > 0 {
            block.push_str("\r\n");
        }
        block.push_str("--");
        block.push_str(&self.boundary);
        block.push_str("\r\n");
        for (name, value) in headers.iter() {
            block.push_str(name);
            block.push_str(": ");
            block.push_str(value);
            block.push_str("\r\n");
        }
        block.push_str("\r\n");

        self.inner.write_all(block.as_bytes())?;
        self.parts += 1;
        Ok(Part {
            inner: &mut self.inner,
        })
    }

    /// Write the closing delimiter. The writer accepts no parts afterwards.
    pub fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::other("multipart writer is already closed"));
        }
        let lead = if self.parts > 0 { "\r\n" } else { "" };
        write!(self.inner, "{lead}--{}--\r\n", self.boundary)?;
        self.inner.flush()?;
        self.closed = true;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Recover the underlying sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for Part<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Generate a random boundary of 60 lowercase hex characters.
pub fn random_boundary() -> String {
    let mut bytes = [0u8; BOUNDARY_BYTES];
    rand::thread_rng().fill(&mut bytes[..]);
    hex::encode(bytes)
}

/// Check a boundary against RFC 2046 `boundary := 0*69<bchars> bcharsnospace`.
pub fn validate_boundary(boundary: &str) -> Result<()> {
    let invalid = || FormError::InvalidBoundary(boundary.to_string());

    if boundary.is_empty() || boundary.len() > MAX_BOUNDARY_LEN || boundary.ends_with(' ') {
        return Err(invalid());
    }

    let allowed = |c: char| c.is_ascii_alphanumeric() || "'()+_,-./:=? ".contains(c);
    if !boundary.chars().all(allowed) {
        return Err(invalid());
    }
    Ok(())
}
