use crc32fast::Hasher;
use tracing::debug;

use crate::config::PayloadFormat;
use crate::envelope::DeltaEnvelope;
use crate::error::{CodecError, CodecResult};

/// Frame magic.
pub const MAGIC: [u8; 4] = *b"SDLT";

/// Header size: 4 bytes magic + 1 byte format + 4 bytes length + 4 bytes CRC.
pub const HEADER_SIZE: usize = 13;

/// Largest payload accepted in a single frame (64 MiB).
pub const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// Codec for framing delta envelopes.
///
/// Wire format:
/// ```text
/// [4 bytes: magic "SDLT"]
/// [1 byte:  payload format tag]
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload]
/// ```
pub struct DeltaCodec;

impl DeltaCodec {
    /// Encode an envelope into a single frame.
    pub fn encode(envelope: &DeltaEnvelope, format: PayloadFormat) -> CodecResult<Vec<u8>> {
        let payload = Self::encode_payload(envelope, format)?;
        if payload.len() > MAX_FRAME_SIZE {
            return Err(CodecError::FrameTooLarge {
                size: payload.len(),
                max: MAX_FRAME_SIZE,
            });
        }
        let mut crc = Hasher::new();
        crc.update(&payload);

        let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
        buf.extend_from_slice(&MAGIC);
        buf.push(format.tag());
        buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(&crc.finalize().to_le_bytes());
        buf.extend_from_slice(&payload);
        debug!(len = payload.len(), ?format, "envelope framed");
        Ok(buf)
    }

    /// Decode one frame. Returns (envelope, bytes_consumed).
    pub fn decode(data: &[u8]) -> CodecResult<(DeltaEnvelope, usize)> {
        if data.len() < HEADER_SIZE {
            return Err(CodecError::TooShort(data.len()));
        }
        let magic = read_array::<4>(data, 0);
        if magic != MAGIC {
            return Err(CodecError::BadMagic(magic));
        }
        let format = PayloadFormat::from_tag(data[4]).ok_or(CodecError::UnknownFormat(data[4]))?;
        let len = u32::from_le_bytes(read_array::<4>(data, 5)) as usize;
        if len > MAX_FRAME_SIZE {
            return Err(CodecError::FrameTooLarge {
                size: len,
                max: MAX_FRAME_SIZE,
            });
        }
        let expected = u32::from_le_bytes(read_array::<4>(data, 9));
        let total = HEADER_SIZE + len;
        if data.len() < total {
            return Err(CodecError::Incomplete {
                have: data.len(),
                need: total,
            });
        }

        let payload = &data[HEADER_SIZE..total];
        let actual = crc32fast::hash(payload);
        if actual != expected {
            return Err(CodecError::CrcMismatch { expected, actual });
        }
        let envelope = Self::decode_payload(payload, format)?;
        Ok((envelope, total))
    }

    /// Encode payload only (no framing).
    pub fn encode_payload(envelope: &DeltaEnvelope, format: PayloadFormat) -> CodecResult<Vec<u8>> {
        match format {
            PayloadFormat::Bincode => bincode::serialize(envelope)
                .map_err(|e| CodecError::Serialization(e.to_string())),
            PayloadFormat::Json => serde_json::to_vec(envelope)
                .map_err(|e| CodecError::Serialization(e.to_string())),
        }
    }

    /// Decode payload only (no framing).
    pub fn decode_payload(data: &[u8], format: PayloadFormat) -> CodecResult<DeltaEnvelope> {
        match format {
            PayloadFormat::Bincode => bincode::deserialize(data)
                .map_err(|e| CodecError::Deserialization(e.to_string())),
            PayloadFormat::Json => serde_json::from_slice(data)
                .map_err(|e| CodecError::Deserialization(e.to_string())),
        }
    }
}

/// Copy `N` bytes at `offset`. Callers have checked the length.
fn read_array<const N: usize>(data: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&data[offset..offset + N]);
    out
}
