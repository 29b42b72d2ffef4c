//! Descriptor coalescing for vectored reads.
//!
//! Walks a buffer chain once and emits a bounded, stack-allocated array of
//! `libc::iovec`. Segments whose writable start sits exactly at the end of
//! the previous segment's buffer are merged into one descriptor, so buffers
//! carved from one allocation cost a single iovec.
//!
//! Running out of descriptor slots is not an error: coalescing stops and the
//! rest of the chain is left for the next call.

use crate::buffer::chain::Segment;

/// Maximum iovecs per vectored read.
pub const MAX_IOVECS: usize = 64;

const EMPTY_IOVEC: libc::iovec = libc::iovec {
    iov_base: std::ptr::null_mut(),
    iov_len: 0,
};

/// Coalesced descriptor array borrowed from a buffer chain.
///
/// The iovecs point into the writable ranges of the chain's segments, so the
/// chain stays mutably borrowed for as long as this value lives. A merged
/// descriptor spans several segments, so code that writes from userspace
/// goes through [`scatter`](Self::scatter) and the segments themselves,
/// never through the descriptor pointers.
pub struct IoVecs<'c, 'b> {
    iovecs: [libc::iovec; MAX_IOVECS],
    count: usize,
    /// Sum of all iovec lengths.
    size: usize,
    /// Chain segments visited, including zero-capacity ones.
    segments: usize,
    chain: &'c mut [Segment<'b>],
}

impl<'c, 'b> IoVecs<'c, 'b> {
    /// Coalesce `chain` into at most [`MAX_IOVECS`] descriptors.
    ///
    /// `limit` caps the total byte count; 0 means unlimited.
    pub fn coalesce(chain: &'c mut [Segment<'b>], limit: usize) -> Self {
        Self::coalesce_bounded(chain, limit, MAX_IOVECS)
    }

    /// Like [`coalesce`](Self::coalesce) with a lower descriptor cap.
    /// `max_iovecs` is clamped to `1..=MAX_IOVECS`.
    pub fn coalesce_bounded(chain: &'c mut [Segment<'b>], limit: usize, max_iovecs: usize) -> Self {
        let max_iovecs = max_iovecs.clamp(1, MAX_IOVECS);
        let mut iovecs = [EMPTY_IOVEC; MAX_IOVECS];
        let mut count = 0;
        let mut size = 0;
        let mut segments = 0;

        // End address of the last segment that produced or extended a
        // descriptor. Zero-capacity segments never touch it.
        let mut prev_end: Option<usize> = None;

        for seg in chain.iter_mut() {
            let mut n = seg.capacity();

            if limit > 0 {
                if size >= limit {
                    break;
                }
                if size + n > limit {
                    n = limit - size;
                }
            }

            if n == 0 {
                segments += 1;
                continue;
            }

            if prev_end == Some(seg.cursor_addr()) {
                iovecs[count - 1].iov_len += n;
            } else {
                if count == max_iovecs {
                    break;
                }
                iovecs[count] = libc::iovec {
                    iov_base: seg.cursor_ptr().cast(),
                    iov_len: n,
                };
                count += 1;
            }

            size += n;
            // True buffer end, not the clamped one.
            prev_end = Some(seg.end_addr());
            segments += 1;
        }

        IoVecs {
            iovecs,
            count,
            size,
            segments,
            chain,
        }
    }

    /// Copy `src` into the covered ranges in chain order, through the
    /// segments' own slices. Returns the bytes copied, at most
    /// [`size`](Self::size).
    pub(crate) fn scatter(&mut self, mut src: &[u8]) -> usize {
        let mut room = self.size;
        let mut copied = 0;
        for seg in self.chain[..self.segments].iter_mut() {
            if src.is_empty() || room == 0 {
                break;
            }
            let dst = seg.spare_mut();
            let n = dst.len().min(src.len()).min(room);
            dst[..n].copy_from_slice(&src[..n]);
            src = &src[n..];
            room -= n;
            copied += n;
        }
        copied
    }

    /// The populated descriptors.
    #[inline]
    pub fn as_slice(&self) -> &[libc::iovec] {
        &self.iovecs[..self.count]
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Total bytes the descriptors cover.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of chain segments consumed, counting zero-capacity ones.
    /// Less than the chain length when coalescing stopped early.
    pub fn segments(&self) -> usize {
        self.segments
    }

    /// Length of the last descriptor, 0 if there is none.
    pub fn last_len(&self) -> usize {
        self.as_slice().last().map_or(0, |iov| iov.iov_len)
    }
}

impl std::fmt::Debug for IoVecs<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoVecs")
            .field("count", &self.count)
            .field("size", &self.size)
            .field("segments", &self.segments)
            .finish()
    }
}
