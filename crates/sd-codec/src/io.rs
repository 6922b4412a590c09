//! File helpers: trees as JSON documents, envelopes as single frames.

use std::fs;
use std::path::Path;

use sd_tree::SchemaNode;
use tracing::debug;

use crate::codec::DeltaCodec;
use crate::config::PayloadFormat;
use crate::envelope::DeltaEnvelope;
use crate::error::{CodecError, CodecResult};

/// Read a schema tree from a JSON document.
pub fn read_tree_json(path: &Path) -> CodecResult<SchemaNode> {
    let data = fs::read(path)?;
    let tree = serde_json::from_slice(&data)
        .map_err(|e| CodecError::Deserialization(e.to_string()))?;
    debug!(path = %path.display(), "tree loaded");
    Ok(tree)
}

/// Write a schema tree as a pretty-printed JSON document.
pub fn write_tree_json(path: &Path, tree: &SchemaNode) -> CodecResult<()> {
    let data = serde_json::to_vec_pretty(tree)
        .map_err(|e| CodecError::Serialization(e.to_string()))?;
    fs::write(path, data)?;
    Ok(())
}

/// Read a framed envelope. Trailing bytes after the first frame are an error.
pub fn read_envelope(path: &Path) -> CodecResult<DeltaEnvelope> {
    let data = fs::read(path)?;
    let (envelope, consumed) = DeltaCodec::decode(&data)?;
    if consumed != data.len() {
        return Err(CodecError::Deserialization(format!(
            "{} trailing bytes after frame",
            data.len() - consumed
        )));
    }
    Ok(envelope)
}

/// Write an envelope as a single frame.
pub fn write_envelope(
    path: &Path,
    envelope: &DeltaEnvelope,
    format: PayloadFormat,
) -> CodecResult<usize> {
    let frame = DeltaCodec::encode(envelope, format)?;
    fs::write(path, &frame)?;
    debug!(path = %path.display(), bytes = frame.len(), "envelope written");
    Ok(frame.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sd_diff::EngineConfig;

    fn tree(rows: &str) -> SchemaNode {
        SchemaNode::new("table")
            .with_attribute("name", "t")
            .with_attribute("rows", rows)
            .with_child(SchemaNode::new("column").with_attribute("name", "c"))
    }

    #[test]
    fn tree_json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.json");
        write_tree_json(&path, &tree("1")).unwrap();
        assert_eq!(read_tree_json(&path).unwrap(), tree("1"));
    }

    #[test]
    fn envelope_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delta.sdlt");
        let env = DeltaEnvelope::seal(&tree("1"), &tree("2"), &EngineConfig::default()).unwrap();
        let written = write_envelope(&path, &env, PayloadFormat::Bincode).unwrap();
        assert_eq!(written as u64, std::fs::metadata(&path).unwrap().len());
        assert_eq!(read_envelope(&path).unwrap(), env);
    }

    #[test]
    fn trailing_bytes_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delta.sdlt");
        let env = DeltaEnvelope::seal(&tree("1"), &tree("2"), &EngineConfig::default()).unwrap();
        let mut frame = DeltaCodec::encode(&env, PayloadFormat::Json).unwrap();
        frame.push(0);
        std::fs::write(&path, frame).unwrap();
        assert!(matches!(
            read_envelope(&path),
            Err(CodecError::Deserialization(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_tree_json(&dir.path().join("absent.json")),
            Err(CodecError::Io(_))
        ));
    }

    #[test]
    fn malformed_json_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, b"{\"attributes\": {}}").unwrap();
        assert!(matches!(
            read_tree_json(&path),
            Err(CodecError::Deserialization(_))
        ));
    }
}
