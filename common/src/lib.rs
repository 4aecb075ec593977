//! Shared infrastructure for the speckle workspace.
//!
//! - [`buffer2::Buffer2`]: dense row-major 2D grid
//! - [`bit_buffer2::BitBuffer2`]: row-aligned bit-packed boolean mask
//! - [`file_format`]: YAML/JSON selection and (de)serialization by file name
//! - [`file_utils`]: image file discovery and output naming
//! - [`log_setup`]: tracing subscriber installation

pub mod bit_buffer2;
pub mod buffer2;
pub mod file_format;
pub mod file_utils;
pub mod log_setup;

pub use bit_buffer2::BitBuffer2;
pub use buffer2::Buffer2;
