//! Image sniffing by magic number, and data-URI encoding of image bytes.

pub mod data_uri;
pub mod signature;

pub use data_uri::{parse_data_uri, to_data_uri};
pub use signature::{classify, image_mime_type, MIN_SNIFF_LEN};
