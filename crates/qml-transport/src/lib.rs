//! Content-Length message framing over the stdin/stdout transport.
//!
//! Synchronous by design: reading a frame blocks the calling thread until a
//! full `Content-Length` header and body have arrived. The server runs this
//! loop on its own dedicated thread and hands each decoded request off to the
//! async dispatch side.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod framing;

pub use framing::{log_response, read_message, write_message, write_notification, write_request};
