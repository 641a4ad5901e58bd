//! Core data model types: image formats, file attachments, and assembled form bodies.

pub mod file;
pub mod form;
pub mod image;
