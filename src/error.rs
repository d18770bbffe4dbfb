use thiserror::Error;

/// Per-file decoding failure. Callers treat the offending file as absent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("file is {len} bytes, shorter than the 512-byte header")]
    TruncatedHeader { len: usize },
}
