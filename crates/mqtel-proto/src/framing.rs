//! Length-prefix framing for the push transport.
//!
//! Every batch on the wire is `[length (4 bytes BE)][rkyv payload]`. Metric
//! flushes are small; a frame near the limit means label cardinality has run
//! away at the call sites.

use crate::Error;

/// Maximum frame payload size (1 MB).
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Frame a payload with its length prefix.
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, Error> {
    if payload.len() > MAX_FRAME_SIZE {
        return Err(Error::InvalidFrame(format!(
            "payload size {} exceeds maximum {}",
            payload.len(),
            MAX_FRAME_SIZE
        )));
    }

    let mut frame = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Split a complete frame into its payload.
///
/// Fails if the buffer is short, the declared length is oversized, or the
/// buffer does not contain the full payload.
pub fn extract_payload(data: &[u8]) -> Result<&[u8], Error> {
    if data.len() < LENGTH_PREFIX_SIZE {
        return Err(Error::InvalidFrame(format!(
            "buffer too short for length prefix: {} < {}",
            data.len(),
            LENGTH_PREFIX_SIZE
        )));
    }

    let mut header = [0u8; LENGTH_PREFIX_SIZE];
    header.copy_from_slice(&data[..LENGTH_PREFIX_SIZE]);
    let len = u32::from_be_bytes(header) as usize;

    if len > MAX_FRAME_SIZE {
        return Err(Error::InvalidFrame(format!(
            "frame length {} exceeds maximum {}",
            len, MAX_FRAME_SIZE
        )));
    }

    let body = &data[LENGTH_PREFIX_SIZE..];
    if body.len() < len {
        return Err(Error::InvalidFrame(format!(
            "incomplete frame: declared {} bytes, got {}",
            len,
            body.len()
        )));
    }

    Ok(&body[..len])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_roundtrip() {
        let payload = b"metrics batch";
        let framed = encode_frame(payload).unwrap();
        assert_eq!(framed.len(), LENGTH_PREFIX_SIZE + payload.len());
        assert_eq!(extract_payload(&framed).unwrap(), payload);
    }

    #[test]
    fn test_empty_payload() {
        let framed = encode_frame(b"").unwrap();
        assert_eq!(extract_payload(&framed).unwrap(), b"");
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let payload = vec![0u8; MAX_FRAME_SIZE + 1];
        assert!(encode_frame(&payload).is_err());
    }

    #[test]
    fn test_short_buffer_rejected() {
        assert!(extract_payload(&[0, 0]).is_err());
    }

    #[test]
    fn test_truncated_frame_rejected() {
        let mut framed = encode_frame(b"metrics batch").unwrap();
        framed.truncate(framed.len() - 1);
        assert!(extract_payload(&framed).is_err());
    }

    #[test]
    fn test_oversized_declared_length_rejected() {
        let mut framed = vec![0u8; LENGTH_PREFIX_SIZE];
        framed[..LENGTH_PREFIX_SIZE].copy_from_slice(&(u32::MAX).to_be_bytes());
        assert!(extract_payload(&framed).is_err());
    }
}
