//! Model-generic document access and strict request decoding.

mod decode;
mod documents;
pub use decode::{decode, decode_slice, DecodeError, MAX_BODY_BYTES};
pub use documents::{DocumentService, OPERATION_TIMEOUT};
