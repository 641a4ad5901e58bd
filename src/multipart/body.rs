//! Assemble a JSON payload plus file attachments into one `multipart/form-data` body.

use std::io::Write;

use serde::Serialize;

use crate::error::{FormError, Result};
use crate::model::file::File;
use crate::model::form::FormBody;

use super::header::form_data_headers;
use super::writer::MultipartWriter;

/// Form field carrying the JSON payload.
pub const PAYLOAD_FIELD: &str = "payload_json";

/// Content type of the payload part.
pub const PAYLOAD_CONTENT_TYPE: &str = "application/json";

/// Form field name for the attachment at `index` in the input list.
pub fn file_field(index: usize) -> String {
    format!("file{index}")
}

/// Build a `multipart/form-data` body from a JSON payload and attachments.
///
/// The first part is `payload_json` (the payload serialized with
/// `serde_json`), followed by one part per file named `file0`, `file1`, ...
/// by position in `files`. Each file's reader is drained into its part and
/// dropped before this function returns.
///
/// Fails without returning any bytes if serialization, part creation,
/// reading a file, or closing the body fails.
pub fn build_body<P>(payload: &P, files: Vec<File<'_>>) -> Result<FormBody>
where
    P: Serialize + ?Sized,
{
    assemble(MultipartWriter::new(Vec::new()), payload, files)
}

/// Same as [`build_body`] with a fixed boundary instead of a random one.
///
/// Output is byte-for-byte reproducible for identical inputs.
pub fn build_body_with_boundary<P>(
    payload: &P,
    files: Vec<File<'_>>,
    boundary: &str,
) -> Result<FormBody>
where
    P: Serialize + ?Sized,
{
    assemble(
        MultipartWriter::with_boundary(Vec::new(), boundary)?,
        payload,
        files,
    )
}

fn assemble<P>(
    mut writer: MultipartWriter<Vec<u8>>,
    payload: &P,
    files: Vec<File<'_>>,
) -> Result<FormBody>
where
    P: Serialize + ?Sized,
{
    let json = serde_json::to_vec(payload).map_err(FormError::Serialization)?;

    let headers = form_data_headers(PAYLOAD_FIELD, None, PAYLOAD_CONTENT_TYPE);
    let mut part = writer
        .create_part(&headers)
        .map_err(|e| FormError::part_creation(PAYLOAD_FIELD, e))?;
    part.write_all(&json).map_err(|e| FormError::io(PAYLOAD_FIELD, e))?;

    let file_count = files.len();
    for (index, mut file) in files.into_iter().enumerate() {
        let field = file_field(index);
        let headers = form_data_headers(&field, Some(&file.name), file.effective_content_type());

        let mut part = writer
            .create_part(&headers)
            .map_err(|e| FormError::part_creation(&field, e))?;
        let copied = std::io::copy(&mut file.reader, &mut part).map_err(|e| {
            tracing::warn!(
                field = %field,
                filename = %file.name,
                error = %e,
                "Failed to copy file"
            );
            FormError::io(&field, e)
        })?;
        tracing::trace!(field = %field, bytes = copied, "Copied attachment");
    }

    writer.close().map_err(FormError::Finalization)?;

    let content_type = writer.form_data_content_type();
    let body = writer.into_inner();
    tracing::debug!(
        files = file_count,
        bytes = body.len(),
        content_type = %content_type,
        "Built multipart body"
    );

    Ok(FormBody { content_type, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::io::{self, Read};

    const BOUNDARY: &str = "TESTBOUNDARY";

    #[test]
    fn test_payload_only() {
        let payload = serde_json::json!({"content": "hi"});
        let form = build_body_with_boundary(&payload, Vec::new(), BOUNDARY).unwrap();
        assert_eq!(form.content_type, "multipart/form-data; boundary=TESTBOUNDARY");
        let expected = "--TESTBOUNDARY\r\n\
            Content-Disposition: form-data; name=\"payload_json\"\r\n\
            Content-Type: application/json\r\n\
            \r\n\
            {\"content\":\"hi\"}\r\n\
            --TESTBOUNDARY--\r\n";
        assert_eq!(String::from_utf8(form.body).unwrap(), expected);
    }

    #[test]
    fn test_file_field_names() {
        assert_eq!(file_field(0), "file0");
        assert_eq!(file_field(12), "file12");
    }

    #[test]
    fn test_serialization_failure() {
        // Maps with non-string keys cannot be represented in JSON.
        let mut bad = BTreeMap::new();
        bad.insert((1, 2), "x");
        let err = build_body(&bad, Vec::new()).unwrap_err();
        assert!(matches!(err, FormError::Serialization(_)));
    }

    #[test]
    fn test_invalid_boundary_rejected() {
        let err = build_body_with_boundary(&(), Vec::new(), "bad;boundary").unwrap_err();
        assert!(matches!(err, FormError::InvalidBoundary(_)));
    }

    struct BrokenReader {
        served: bool,
    }

    impl Read for BrokenReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.served {
                self.served = true;
                buf[..4].copy_from_slice(b"part");
                return Ok(4);
            }
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "source went away"))
        }
    }

    #[test]
    fn test_read_failure_names_field() {
        let files = vec![
            File::from_bytes("ok.txt", b"fine"),
            File::new("bad.bin", BrokenReader { served: false }),
        ];
        match build_body(&serde_json::json!({}), files) {
            Err(FormError::Io { field, source }) => {
                assert_eq!(field, "file1");
                assert_eq!(source.kind(), io::ErrorKind::ConnectionReset);
            }
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_random_boundary_in_content_type() {
        let form = build_body(&serde_json::json!({"a": 1}), Vec::new()).unwrap();
        let boundary = form.boundary().unwrap().to_string();
        assert_eq!(boundary.len(), 60);
        assert!(form.body.starts_with(format!("--{boundary}\r\n").as_bytes()));
        assert!(form.body.ends_with(format!("\r\n--{boundary}--\r\n").as_bytes()));
    }
}
