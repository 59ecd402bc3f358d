//! Row change codec for message queue sinks.
//!
//! [`open`] turns captured row changes into key/value messages and back,
//! [`stream`] and [`sink`] wire the codec into a line-oriented pipeline.

pub mod error;
pub mod open;
pub mod sink;
pub mod stream;

pub use error::{Error, Result};
pub use model;
