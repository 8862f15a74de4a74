//! Inbound byte accumulator.
//!
//! Bytes are appended as the transport delivers them and nothing is decoded
//! until [`RxBuffer::next_frame`] reports that a whole frame is present. A
//! frame too big to ever fit is skipped by counting its bytes off as they
//! arrive, so the buffer stays aligned on packet boundaries.

use heapless::Vec;

use super::error::ProtocolError;
use super::packet::{self, FrameHeader};

/// Smallest usable capacity: a fixed header byte plus the longest
/// remaining-length encoding.
pub const MIN_CAPACITY: usize = 1 + 4;

/// Fixed-capacity receive buffer.
///
/// `N` must be at least [`MIN_CAPACITY`], otherwise a header with a long
/// remaining length could never be framed.
///
/// ```compile_fail
/// use minimqtt::network::application::mqtt::buffer::RxBuffer;
///
/// let _ = RxBuffer::<4>::new();
/// ```
#[derive(Debug)]
pub struct RxBuffer<const N: usize> {
    data: Vec<u8, N>,
    discard: usize,
}

impl<const N: usize> RxBuffer<N> {
    /// An empty buffer.
    pub const fn new() -> Self {
        const { assert!(N >= MIN_CAPACITY, "receive buffer too small for a fixed header") };
        Self {
            data: Vec::new(),
            discard: 0,
        }
    }

    /// Drop everything, including any pending discard.
    pub fn clear(&mut self) {
        self.data.clear();
        self.discard = 0;
    }

    /// Buffered byte count.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// No bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes still owed to an oversized frame being skipped.
    pub fn discarding(&self) -> usize {
        self.discard
    }

    /// How many bytes the next [`extend`](Self::extend) can take in full.
    pub fn room(&self) -> usize {
        if self.discard > 0 {
            self.discard
        } else {
            N - self.data.len()
        }
    }

    /// Append received bytes, first paying off any pending discard.
    ///
    /// Returns how many bytes of `bytes` were consumed; anything beyond
    /// [`room`](Self::room) is left to the caller.
    pub fn extend(&mut self, bytes: &[u8]) -> usize {
        let skipped = self.discard.min(bytes.len());
        self.discard -= skipped;
        let rest = &bytes[skipped..];
        let taken = rest.len().min(N - self.data.len());
        // cannot fail: `taken` is bounded by the spare capacity
        let _ = self.data.extend_from_slice(&rest[..taken]);
        skipped + taken
    }

    /// The header of the first buffered frame, once all of it is present.
    ///
    /// A frame larger than the buffer is dropped: its buffered bytes are
    /// cleared and the remainder is discarded as it arrives. A malformed
    /// remaining length is returned as an error; the stream cannot be
    /// re-aligned after that.
    pub fn next_frame(&mut self) -> Result<Option<FrameHeader>, ProtocolError> {
        if self.discard > 0 {
            return Ok(None);
        }
        let Some(header) = packet::frame_header(&self.data)? else {
            return Ok(None);
        };
        let total = header.total_len();
        if total > N {
            warn!(
                "dropping {=usize} byte packet 0x{=u8:x}, receive buffer holds {=usize}",
                total,
                self.data[0],
                N
            );
            self.discard = total - self.data.len();
            self.data.clear();
            return Ok(None);
        }
        if self.data.len() < total {
            return Ok(None);
        }
        Ok(Some(header))
    }

    /// The bytes of the frame described by `header`.
    pub fn frame(&self, header: FrameHeader) -> &[u8] {
        &self.data[..header.total_len()]
    }

    /// Remove the first `len` bytes, shifting the rest to the front.
    pub fn consume(&mut self, len: usize) {
        let len = len.min(self.data.len());
        let rest = self.data.len() - len;
        self.data.copy_within(len.., 0);
        self.data.truncate(rest);
    }
}

impl<const N: usize> Default for RxBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
