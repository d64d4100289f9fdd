//! Data path constants.
//!
//! The bus moves one 32-bit word per transfer unit and addresses bytes, so
//! every transfer address must be a multiple of [`WORD_BYTES`].

/// Bytes per bus word; the cursor of a transfer advances by this amount per unit.
pub const WORD_BYTES: u64 = 4;

/// Number of words moved by one burst of the blocking master model.
pub const BURST_WORDS: usize = 16;

/// Returns `true` if `address` is a multiple of [`WORD_BYTES`].
#[inline]
pub const fn is_word_aligned(address: u64) -> bool {
    address % WORD_BYTES == 0
}

/// Returns the address of the last word of a `length`-word transfer starting at `start`.
///
/// A single-word transfer ends where it starts. Returns `None` for a zero
/// length, or if the last word would lie past the top of the address space.
#[inline]
pub const fn burst_end_address(start: u64, length: usize) -> Option<u64> {
    let Some(last) = (length as u64).checked_sub(1) else {
        return None;
    };
    match last.checked_mul(WORD_BYTES) {
        Some(span) => start.checked_add(span),
        None => None,
    }
}
