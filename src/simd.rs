//! 16-lane byte primitives with a vector path per architecture and a
//! portable scalar twin for each.
//!
//! x86_64 uses SSE2 (baseline) for lane equality and SSSE3 (`pshufb`,
//! detected at runtime) for the slot filter. aarch64 uses NEON for both.
//! Every other target runs the scalar versions, which are also what the
//! tests hold the vector paths to.

use crate::config::Backend;

/// Lanes per vector, slots per table, bytes per slot.
pub(crate) const LANES: usize = 16;

/// Shuffle index that gathers a zero byte on every backend (`pshufb`
/// zeroes lanes whose index has the high bit set; `tbl` zeroes lanes whose
/// index is out of range).
pub(crate) const ALWAYS_PASS_INDEX: u8 = 0x80;

/// Mask with every lane set.
pub(crate) const ALL_LANES: u16 = u16::MAX;

/// Sixteen bytes aligned for vector loads.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(C, align(16))]
pub(crate) struct Block(pub(crate) [u8; LANES]);

impl Block {
    /// Copy the first `min(bytes.len(), 16)` bytes into a zeroed block.
    ///
    /// This never reads past the end of `bytes`. A caller's buffer can end
    /// right before an unmapped page, so a short input is never widened to a
    /// 16-byte load in place.
    #[inline]
    pub(crate) fn load_prefix(bytes: &[u8]) -> Self {
        let n = bytes.len().min(LANES);
        let mut block = Self::default();
        block.0[..n].copy_from_slice(&bytes[..n]);
        block
    }

    #[inline]
    pub(crate) fn splat(byte: u8) -> Self {
        Self([byte; LANES])
    }
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02x?}", self.0)
    }
}

/// The three per-slot lanes consulted before any slot is compared.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(C, align(32))]
pub(crate) struct FilterLanes {
    pub(crate) unique_chars: Block,
    pub(crate) unique_index: Block,
    pub(crate) lengths: Block,
}

/// Mask of the lowest `width` lanes.
#[inline]
pub(crate) fn low_lanes(width: usize) -> u16 {
    if width >= LANES {
        ALL_LANES
    } else {
        (1u16 << width) - 1
    }
}

/// Name of the filter implementation `backend` resolves to on this CPU.
pub fn backend_name(backend: Backend) -> &'static str {
    match backend {
        Backend::Scalar => "scalar",
        Backend::Auto => auto_backend_name(),
    }
}

#[cfg(target_arch = "x86_64")]
fn auto_backend_name() -> &'static str {
    if std::is_x86_feature_detected!("ssse3") {
        "ssse3"
    } else {
        "scalar"
    }
}

#[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
fn auto_backend_name() -> &'static str {
    "neon"
}

#[cfg(not(any(
    target_arch = "x86_64",
    all(target_arch = "aarch64", target_feature = "neon")
)))]
fn auto_backend_name() -> &'static str {
    "scalar"
}

// =============================================================================
// Slot filter
// =============================================================================

/// Bit `i` is set iff lane `i` passes both the unique-character test and
/// the length test against a search of `search_width` (<= 16) bytes.
#[inline]
pub(crate) fn filter_mask(
    lanes: &FilterLanes,
    search: &Block,
    search_width: u8,
    backend: Backend,
) -> u16 {
    debug_assert!(usize::from(search_width) <= LANES);
    match backend {
        Backend::Scalar => filter_mask_scalar(lanes, search, search_width),
        Backend::Auto => filter_mask_auto(lanes, search, search_width),
    }
}

/// Lane-by-lane filter. Mirrors the vector shuffle exactly, including the
/// high-bit index rule.
pub(crate) fn filter_mask_scalar(lanes: &FilterLanes, search: &Block, search_width: u8) -> u16 {
    let mut mask = 0u16;
    for lane in 0..LANES {
        let index = lanes.unique_index.0[lane];
        let gathered = if index & 0x80 != 0 {
            0
        } else {
            search.0[usize::from(index & 0x0f)]
        };
        if gathered == lanes.unique_chars.0[lane] && lanes.lengths.0[lane] <= search_width {
            mask |= 1 << lane;
        }
    }
    mask
}

#[cfg(target_arch = "x86_64")]
#[inline]
fn filter_mask_auto(lanes: &FilterLanes, search: &Block, search_width: u8) -> u16 {
    if std::is_x86_feature_detected!("ssse3") {
        // SAFETY: guarded by `is_x86_feature_detected!("ssse3")`.
        unsafe { filter_mask_ssse3(lanes, search, search_width) }
    } else {
        filter_mask_scalar(lanes, search, search_width)
    }
}

#[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
#[inline]
fn filter_mask_auto(lanes: &FilterLanes, search: &Block, search_width: u8) -> u16 {
    // SAFETY: NEON is enabled for this target.
    unsafe { filter_mask_neon(lanes, search, search_width) }
}

#[cfg(not(any(
    target_arch = "x86_64",
    all(target_arch = "aarch64", target_feature = "neon")
)))]
#[inline]
fn filter_mask_auto(lanes: &FilterLanes, search: &Block, search_width: u8) -> u16 {
    filter_mask_scalar(lanes, search, search_width)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "ssse3")]
unsafe fn filter_mask_ssse3(lanes: &FilterLanes, search: &Block, search_width: u8) -> u16 {
    use std::arch::x86_64::*;
    // SAFETY: every load reads one 16-byte `Block`; the caller guarantees
    // SSSE3.
    unsafe {
        let search = _mm_load_si128(search.0.as_ptr() as *const __m128i);
        let index = _mm_load_si128(lanes.unique_index.0.as_ptr() as *const __m128i);
        let chars = _mm_load_si128(lanes.unique_chars.0.as_ptr() as *const __m128i);
        let lengths = _mm_load_si128(lanes.lengths.0.as_ptr() as *const __m128i);

        let gathered = _mm_shuffle_epi8(search, index);
        let by_char = _mm_cmpeq_epi8(gathered, chars);

        // Lengths are at most 127, so the signed compare is exact.
        let too_long = _mm_cmpgt_epi8(lengths, _mm_set1_epi8(search_width as i8));

        _mm_movemask_epi8(_mm_andnot_si128(too_long, by_char)) as u16
    }
}

#[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
#[target_feature(enable = "neon")]
unsafe fn filter_mask_neon(lanes: &FilterLanes, search: &Block, search_width: u8) -> u16 {
    use std::arch::aarch64::*;
    // SAFETY: every load reads one 16-byte `Block`; NEON is enabled.
    unsafe {
        let search = vld1q_u8(search.0.as_ptr());
        let index = vld1q_u8(lanes.unique_index.0.as_ptr());
        let chars = vld1q_u8(lanes.unique_chars.0.as_ptr());
        let lengths = vld1q_u8(lanes.lengths.0.as_ptr());

        let gathered = vqtbl1q_u8(search, index);
        let by_char = vceqq_u8(gathered, chars);
        let fits = vcleq_u8(lengths, vdupq_n_u8(search_width));

        movemask_neon(vandq_u8(by_char, fits))
    }
}

/// Collapse a lane mask of 0x00/0xff bytes into 16 bits.
#[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
#[target_feature(enable = "neon")]
unsafe fn movemask_neon(v: std::arch::aarch64::uint8x16_t) -> u16 {
    use std::arch::aarch64::*;
    const WEIGHTS: [u8; LANES] = [1, 2, 4, 8, 16, 32, 64, 128, 1, 2, 4, 8, 16, 32, 64, 128];
    // SAFETY: `WEIGHTS` is 16 bytes; NEON is enabled.
    unsafe {
        let bits = vandq_u8(v, vld1q_u8(WEIGHTS.as_ptr()));
        let lo = u16::from(vaddv_u8(vget_low_u8(bits)));
        let hi = u16::from(vaddv_u8(vget_high_u8(bits)));
        lo | (hi << 8)
    }
}

// =============================================================================
// Lane equality
// =============================================================================

/// Bit `i` is set iff `a[i] == b[i]`.
#[cfg(all(target_arch = "x86_64", target_feature = "sse2"))]
#[inline]
pub(crate) fn eq_mask(a: &[u8; LANES], b: &[u8; LANES]) -> u16 {
    use std::arch::x86_64::*;
    // SAFETY: SSE2 is enabled for this target; both loads read exactly the
    // 16 bytes of their array.
    unsafe {
        let a = _mm_loadu_si128(a.as_ptr() as *const __m128i);
        let b = _mm_loadu_si128(b.as_ptr() as *const __m128i);
        _mm_movemask_epi8(_mm_cmpeq_epi8(a, b)) as u16
    }
}

#[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
#[inline]
pub(crate) fn eq_mask(a: &[u8; LANES], b: &[u8; LANES]) -> u16 {
    use std::arch::aarch64::*;
    // SAFETY: NEON is enabled for this target; both loads read exactly the
    // 16 bytes of their array.
    unsafe { movemask_neon(vceqq_u8(vld1q_u8(a.as_ptr()), vld1q_u8(b.as_ptr()))) }
}

#[cfg(not(any(
    all(target_arch = "x86_64", target_feature = "sse2"),
    all(target_arch = "aarch64", target_feature = "neon")
)))]
#[inline]
pub(crate) fn eq_mask(a: &[u8; LANES], b: &[u8; LANES]) -> u16 {
    eq_mask_scalar(a, b)
}

pub(crate) fn eq_mask_scalar(a: &[u8; LANES], b: &[u8; LANES]) -> u16 {
    a.iter()
        .zip(b)
        .enumerate()
        .fold(0u16, |mask, (lane, (x, y))| mask | (u16::from(x == y) << lane))
}
