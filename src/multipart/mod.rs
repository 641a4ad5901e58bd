//! `multipart/form-data` encoding: part headers, the framing writer, and the
//! payload-plus-attachments body builder.

pub mod body;
pub mod header;
pub mod writer;

pub use body::{build_body, build_body_with_boundary, file_field, PAYLOAD_FIELD};
pub use header::{escape_quotes, form_data_headers, PartHeaders};
pub use writer::{MultipartWriter, Part};
