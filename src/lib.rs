//! `formwire` — turns binary content into HTTP request material.
//!
//! This crate sniffs image bytes (PNG, JPEG, GIF, WEBP), encodes them as
//! `data:` URIs, and packs a JSON payload plus file attachments into a
//! byte-exact `multipart/form-data` body ready to be sent verbatim.

pub mod config;
pub mod error;
pub mod image;
pub mod model;
pub mod multipart;

pub use error::{FormError, Result};
pub use model::file::File;
pub use model::form::FormBody;
pub use model::image::ImageFormat;
