//! Element framing inside a shard body.
//!
//! # Binary Format
//!
//! ```text
//! frame = len(u32 LE, 4) + element bytes(len)
//! body  = frame*
//! ```
//!
//! The body is what the shard codec compresses; `ShardDescriptor::byte_size`
//! is the body length before compression. Frames are written to and read
//! from the codec stream one at a time.

use std::io::{self, Read, Write};

/// Size of the length prefix of each frame.
pub const FRAME_HEADER_SIZE: usize = 4;

/// Largest element a single frame can hold.
pub const MAX_FRAME_LEN: usize = u32::MAX as usize;

/// Framing errors.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Element too large for a u32 length prefix.
    #[error("element of {0} bytes exceeds the maximum frame size")]
    TooLarge(usize),

    /// Frame length exceeds what the body can still hold.
    #[error("frame of {len} bytes overruns the body ({remaining} bytes left)")]
    Overrun {
        /// Length read from the frame header
        len: u64,
        /// Body bytes left after the header
        remaining: u64,
    },

    /// Body ended inside a frame.
    #[error("body ended inside a frame: need {needed} bytes, {available} available")]
    Truncated {
        /// Bytes the frame part requires
        needed: usize,
        /// Bytes actually read
        available: usize,
    },

    /// Underlying stream failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Write one framed element, returning the number of bytes written.
pub fn write_frame<W: Write>(out: &mut W, element: &[u8]) -> Result<u64, FrameError> {
    if element.len() > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge(element.len()));
    }
    out.write_all(&(element.len() as u32).to_le_bytes())?;
    out.write_all(element)?;
    Ok((FRAME_HEADER_SIZE + element.len()) as u64)
}

/// Read the next frame from `input`.
///
/// `remaining` is how many body bytes may still follow; a frame claiming
/// more is rejected before anything is allocated for it. Returns `None` at
/// a clean end of input.
pub fn read_frame<R: Read>(input: &mut R, remaining: u64) -> Result<Option<Vec<u8>>, FrameError> {
    let mut header = [0u8; FRAME_HEADER_SIZE];
    match read_full(input, &mut header)? {
        0 => return Ok(None),
        FRAME_HEADER_SIZE => {}
        available => {
            return Err(FrameError::Truncated {
                needed: FRAME_HEADER_SIZE,
                available,
            })
        }
    }

    let len = u32::from_le_bytes(header) as u64;
    let remaining = remaining.saturating_sub(FRAME_HEADER_SIZE as u64);
    if len > remaining {
        return Err(FrameError::Overrun { len, remaining });
    }

    let mut element = vec![0u8; len as usize];
    let available = read_full(input, &mut element)?;
    if available < element.len() {
        return Err(FrameError::Truncated {
            needed: element.len(),
            available,
        });
    }
    Ok(Some(element))
}

// Like `read_exact`, but reports how much was read when input ends early.
fn read_full<R: Read>(input: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(elements: &[&[u8]]) -> Vec<u8> {
        let mut buf = Vec::new();
        for element in elements {
            write_frame(&mut buf, element).unwrap();
        }
        buf
    }

    #[test]
    fn test_frames_in_order() {
        let buf = frames(&[b"one", b"", b"three"]);
        let mut input = &buf[..];
        let limit = buf.len() as u64;

        assert_eq!(read_frame(&mut input, limit).unwrap().unwrap(), b"one");
        assert_eq!(read_frame(&mut input, limit).unwrap().unwrap(), b"");
        assert_eq!(read_frame(&mut input, limit).unwrap().unwrap(), b"three");
        assert!(read_frame(&mut input, limit).unwrap().is_none());
    }

    #[test]
    fn test_frame_layout() {
        let mut buf = Vec::new();
        assert_eq!(write_frame(&mut buf, &[0xAA, 0xBB]).unwrap(), 6);
        assert_eq!(buf, vec![2, 0, 0, 0, 0xAA, 0xBB]);
    }

    #[test]
    fn test_truncated_header() {
        let mut buf = frames(&[b"ok"]);
        buf.extend_from_slice(&[1, 0]);
        let mut input = &buf[..];

        assert_eq!(read_frame(&mut input, 100).unwrap().unwrap(), b"ok");
        assert!(matches!(
            read_frame(&mut input, 100),
            Err(FrameError::Truncated {
                needed: 4,
                available: 2
            })
        ));
    }

    #[test]
    fn test_truncated_payload() {
        let buf = vec![10, 0, 0, 0, 1, 2, 3];
        assert!(matches!(
            read_frame(&mut &buf[..], 14),
            Err(FrameError::Truncated {
                needed: 10,
                available: 3
            })
        ));
    }

    #[test]
    fn test_length_beyond_remaining_is_rejected() {
        // Header claims ~4 GiB; nothing that large may be allocated
        let buf = vec![0xFF, 0xFF, 0xFF, 0xFF, 1, 2, 3];
        assert!(matches!(
            read_frame(&mut &buf[..], 64),
            Err(FrameError::Overrun { len, remaining: 60 }) if len == u32::MAX as u64
        ));
    }
}
