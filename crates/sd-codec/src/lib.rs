//! Transport layer for SchemaDelta.
//!
//! Wraps a [`SchemaDelta`](sd_diff::SchemaDelta) in a [`DeltaEnvelope`] that
//! pins it to the digests of its pre-image and post-image, and frames
//! envelopes for the wire with a length prefix and CRC32 checksum.
//!
//! # Key Types
//!
//! - [`DeltaEnvelope`] / [`DeltaPayload`] -- Delta plus snapshot digests
//! - [`DeltaCodec`] -- Framed bincode/JSON encoding
//! - [`CodecConfig`] / [`PayloadFormat`] -- Encoding and verification settings

pub mod codec;
pub mod config;
pub mod envelope;
pub mod error;
pub mod io;

pub use codec::{DeltaCodec, MAX_FRAME_SIZE};
pub use config::{CodecConfig, PayloadFormat};
pub use envelope::{DeltaEnvelope, DeltaPayload, ENVELOPE_VERSION};
pub use error::{CodecError, CodecResult};
pub use io::{read_envelope, read_tree_json, write_envelope, write_tree_json};
