/// A caller-owned contiguous writable byte range.
///
/// `buf[..filled]` holds bytes already received; `buf[filled..]` is the
/// writable capacity a read may land in. The receive pipeline only writes
/// into the writable range and never moves `filled`; the caller advances it
/// after inspecting the outcome (see [`advance_chain`]).
pub struct Segment<'a> {
    buf: &'a mut [u8],
    filled: usize,
}

impl<'a> Segment<'a> {
    /// Wrap an empty buffer (cursor at the start).
    pub fn new(buf: &'a mut [u8]) -> Self {
        Segment { buf, filled: 0 }
    }

    /// Wrap a buffer whose first `filled` bytes are already in use.
    pub fn with_filled(buf: &'a mut [u8], filled: usize) -> Self {
        debug_assert!(
            filled <= buf.len(),
            "filled {filled} exceeds segment length {}",
            buf.len()
        );
        let filled = filled.min(buf.len());
        Segment { buf, filled }
    }

    /// Total length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes written so far (the cursor position).
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Remaining writable bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len() - self.filled
    }

    /// Whether no writable capacity remains.
    pub fn is_full(&self) -> bool {
        self.capacity() == 0
    }

    /// The filled prefix.
    pub fn data(&self) -> &[u8] {
        &self.buf[..self.filled]
    }

    /// Move the cursor forward by up to `n` bytes. Returns the amount moved.
    pub fn advance(&mut self, n: usize) -> usize {
        let n = n.min(self.capacity());
        self.filled += n;
        n
    }

    /// Pointer to the first writable byte.
    #[inline]
    pub(crate) fn cursor_ptr(&mut self) -> *mut u8 {
        self.buf.as_mut_ptr().wrapping_add(self.filled)
    }

    /// The writable range.
    pub(crate) fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.filled..]
    }

    /// Address one past the last byte of the buffer.
    #[inline]
    pub(crate) fn end_addr(&self) -> usize {
        self.buf.as_ptr() as usize + self.buf.len()
    }

    /// Address of the first writable byte.
    #[inline]
    pub(crate) fn cursor_addr(&self) -> usize {
        self.buf.as_ptr() as usize + self.filled
    }
}

impl std::fmt::Debug for Segment<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segment")
            .field("start", &self.buf.as_ptr())
            .field("filled", &self.filled)
            .field("len", &self.buf.len())
            .finish()
    }
}

/// Advance segment cursors in chain order after a read of `n` bytes.
///
/// Full segments are skipped. Returns the number of bytes that did not fit,
/// which is zero whenever `n` came from a read over this same chain.
pub fn advance_chain(chain: &mut [Segment<'_>], mut n: usize) -> usize {
    for seg in chain.iter_mut() {
        if n == 0 {
            break;
        }
        n -= seg.advance(n);
    }
    n
}

/// Total writable capacity of a chain.
pub fn chain_capacity(chain: &[Segment<'_>]) -> usize {
    chain.iter().map(Segment::capacity).sum()
}

/// Carve segments out of one buffer. Each `(len, gap)` entry takes `len`
/// bytes; with `gap` set, one byte is skipped after it so the next segment
/// is not adjacent.
#[cfg(test)]
pub(crate) fn carve<'a>(mut storage: &'a mut [u8], layout: &[(usize, bool)]) -> Vec<Segment<'a>> {
    let mut out = Vec::with_capacity(layout.len());
    for &(len, gap) in layout {
        let (seg, rest) = std::mem::take(&mut storage).split_at_mut(len);
        out.push(Segment::new(seg));
        storage = if gap { rest.split_at_mut(1).1 } else { rest };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_tracks_cursor() {
        let mut storage = [0u8; 8];
        let mut seg = Segment::with_filled(&mut storage, 3);
        assert_eq!(seg.len(), 8);
        assert_eq!(seg.capacity(), 5);
        assert_eq!(seg.advance(10), 5);
        assert!(seg.is_full());
        assert_eq!(seg.filled(), 8);
    }

    #[test]
    fn adjacent_split_shares_boundary() {
        let mut storage = [0u8; 8];
        let (a, b) = storage.split_at_mut(4);
        let a = Segment::new(a);
        let b = Segment::new(b);
        assert_eq!(a.end_addr(), b.cursor_addr());
    }

    #[test]
    fn advance_chain_spills_across_segments() {
        let mut storage = [0u8; 10];
        let (a, rest) = storage.split_at_mut(4);
        let (b, c) = rest.split_at_mut(2);
        let mut chain = [
            Segment::with_filled(a, 2),
            Segment::new(b),
            Segment::new(c),
        ];
        assert_eq!(chain_capacity(&chain), 8);

        assert_eq!(advance_chain(&mut chain, 5), 0);
        assert_eq!(chain[0].filled(), 4);
        assert_eq!(chain[1].filled(), 2);
        assert_eq!(chain[2].filled(), 1);
        assert_eq!(chain_capacity(&chain), 3);
    }

    #[test]
    fn advance_chain_reports_overflow() {
        let mut storage = [0u8; 4];
        let mut chain = [Segment::new(&mut storage)];
        assert_eq!(advance_chain(&mut chain, 6), 2);
        assert!(chain[0].is_full());
    }

    #[test]
    fn data_returns_filled_prefix() {
        let mut storage = *b"abcdef";
        let seg = Segment::with_filled(&mut storage, 3);
        assert_eq!(seg.data(), b"abc");
    }
}
