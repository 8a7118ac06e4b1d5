//! 16-byte alignment helpers.
//!
//! Every region of a packed save (the part table and each part payload) ends
//! on a 16-byte boundary. The gap is not zero-filled: the writer copies the
//! tail of a fixed 16-byte filler pattern, starting at the unaligned remainder,
//! so `len % 16 == 3` is followed by `FILLER[3..16]`.

/// Alignment of every region in a packed save.
pub const ALIGN: u64 = 0x10;

/// Filler pattern used for alignment gaps.
pub const FILLER: &[u8; 16] = b"padding\0padding\0";

/// Round `n` up to the next multiple of 16.
///
/// `None` when the result does not fit, i.e. for `n > u64::MAX - 15`.
#[inline]
pub fn pad16(n: u64) -> Option<u64> {
    match n & (ALIGN - 1) {
        0   => Some(n),
        rem => n.checked_add(ALIGN - rem),
    }
}

/// Signed variant for the header's `part_table_end` field.
///
/// `None` for negative offsets and for `n > i64::MAX - 15`.
#[inline]
pub fn pad16_i64(n: i64) -> Option<i64> {
    if n < 0 {
        return None;
    }
    match n & 0xf {
        0   => Some(n),
        rem => n.checked_add(0x10 - rem),
    }
}

/// Number of filler bytes needed after a region of `len` bytes.
#[inline]
pub fn padding_len(len: usize) -> usize {
    (0x10 - (len & 0xf)) & 0xf
}

/// Filler bytes that follow a region of `len` bytes. Empty when aligned.
#[inline]
pub fn filler(len: usize) -> &'static [u8] {
    match len & 0xf {
        0   => &[],
        rem => &FILLER[rem..],
    }
}
