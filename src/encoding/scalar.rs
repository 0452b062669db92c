//! # Fixed-Width Scalar Codec
//!
//! Little-endian encode/decode of the inline scalar kinds. Every kind that can
//! sit in a table slot or a fixed-width array implements [`Scalar`], which is
//! the only place byte order is decided.
//!
//! | Type | Width | Encoding |
//! |------|-------|----------|
//! | `u8` / `bool` | 1 | raw byte, bool is `0` or `1` (any non-zero reads true) |
//! | `u16` | 2 | LE (vtable entries) |
//! | `i32` / `u32` | 4 | LE two's complement |
//! | `f32` | 4 | LE IEEE-754 bits |
//! | `i64` | 8 | LE two's complement |
//! | `f64` | 8 | LE IEEE-754 bits |
//!
//! Callers bounds-check before calling `read_le`; the functions here index
//! directly and expect a slice of at least `WIDTH` bytes.

pub trait Scalar: Copy {
    const WIDTH: usize;

    fn read_le(bytes: &[u8]) -> Self;

    fn write_le(self, out: &mut [u8]);
}

macro_rules! impl_scalar {
    ($($ty:ty => $width:expr),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const WIDTH: usize = $width;

                #[inline]
                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; $width];
                    raw.copy_from_slice(&bytes[..$width]);
                    <$ty>::from_le_bytes(raw)
                }

                #[inline]
                fn write_le(self, out: &mut [u8]) {
                    out[..$width].copy_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_scalar! {
    u8 => 1,
    u16 => 2,
    u32 => 4,
    i32 => 4,
    i64 => 8,
    f32 => 4,
    f64 => 8,
}

impl Scalar for bool {
    const WIDTH: usize = 1;

    #[inline]
    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }

    #[inline]
    fn write_le(self, out: &mut [u8]) {
        out[0] = self as u8;
    }
}
