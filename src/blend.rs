//! Fixed blend modes.
//!
//! Eight pure functions `(src, dst) -> out` over canonical RGBA8, all in
//! integer arithmetic so the scalar and batched paths are bit-identical.

use crate::color::{rgba, Color, ColorBatch};

/// Blend mode selected by
/// [`blend_mode`](crate::context::Context::blend_mode).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BlendMode {
    Average,
    Alpha,
    Additive,
    Subtractive,
    Multiplicative,
    Screen,
    Lighten,
    Darken,
}

impl BlendMode {
    /// Applies the mode to one source/destination pair.
    #[inline]
    pub fn apply(self, src: Color, dst: Color) -> Color {
        match self {
            BlendMode::Average => average(src, dst),
            BlendMode::Alpha => alpha(src, dst),
            BlendMode::Additive => additive(src, dst),
            BlendMode::Subtractive => subtractive(src, dst),
            BlendMode::Multiplicative => multiplicative(src, dst),
            BlendMode::Screen => screen(src, dst),
            BlendMode::Lighten => lighten(src, dst),
            BlendMode::Darken => darken(src, dst),
        }
    }

    /// Batched twin of [`apply`](Self::apply); lane-for-lane identical.
    #[inline]
    pub fn apply_batch(self, src: &ColorBatch, dst: &ColorBatch) -> ColorBatch {
        let mut out = *dst;
        for ((o, s), d) in out.iter_mut().zip(src.iter()).zip(dst.iter()) {
            *o = self.apply(*s, *d);
        }
        out
    }
}

#[inline]
fn average(src: Color, dst: Color) -> Color {
    rgba(
        ((src.r as u16 + dst.r as u16) >> 1) as u8,
        ((src.g as u16 + dst.g as u16) >> 1) as u8,
        ((src.b as u16 + dst.b as u16) >> 1) as u8,
        ((src.a as u16 + dst.a as u16) >> 1) as u8,
    )
}

#[inline]
fn alpha(src: Color, dst: Color) -> Color {
    let a = src.a as u32 + 1;
    let inv = 256 - a;
    rgba(
        ((a * src.r as u32 + inv * dst.r as u32) >> 8) as u8,
        ((a * src.g as u32 + inv * dst.g as u32) >> 8) as u8,
        ((a * src.b as u32 + inv * dst.b as u32) >> 8) as u8,
        ((a * 255 + inv * dst.a as u32) >> 8) as u8,
    )
}

#[inline]
fn additive(src: Color, dst: Color) -> Color {
    rgba(
        (dst.r as u16 + src.r as u16).min(255) as u8,
        (dst.g as u16 + src.g as u16).min(255) as u8,
        (dst.b as u16 + src.b as u16).min(255) as u8,
        (dst.a as u16 + src.a as u16).min(255) as u8,
    )
}

#[inline]
fn subtractive(src: Color, dst: Color) -> Color {
    rgba(
        (dst.r as i16 - src.r as i16).max(0) as u8,
        (dst.g as i16 - src.g as i16).max(0) as u8,
        (dst.b as i16 - src.b as i16).max(0) as u8,
        (dst.a as i16 - src.a as i16).max(0) as u8,
    )
}

#[inline]
fn multiplicative(src: Color, dst: Color) -> Color {
    src.modulate(dst)
}

#[inline]
fn screen(src: Color, dst: Color) -> Color {
    #[inline]
    fn ch(s: u8, d: u8) -> u8 {
        (((d as u32 * (255 - s as u32)) >> 8) + s as u32).min(255) as u8
    }
    rgba(
        ch(src.r, dst.r),
        ch(src.g, dst.g),
        ch(src.b, dst.b),
        ch(src.a, dst.a),
    )
}

#[inline]
fn lighten(src: Color, dst: Color) -> Color {
    rgba(
        src.r.max(dst.r),
        src.g.max(dst.g),
        src.b.max(dst.b),
        src.a.max(dst.a),
    )
}

#[inline]
fn darken(src: Color, dst: Color) -> Color {
    rgba(
        src.r.min(dst.r),
        src.g.min(dst.g),
        src.b.min(dst.b),
        src.a.min(dst.a),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_formula_half_transparent_red() {
        // alpha = 128 + 1 = 129: (129*255) >> 8 = 128.
        let out = BlendMode::Alpha.apply(rgba(255, 0, 0, 128), rgba(0, 0, 0, 255));
        assert_eq!(out.r, 128);
        assert_eq!(out.g, 0);
        assert_eq!(out.b, 0);
        assert_eq!(out.a, 255);
    }

    #[test]
    fn additive_saturates() {
        let out = BlendMode::Additive.apply(rgba(200, 1, 0, 255), rgba(100, 1, 0, 255));
        assert_eq!(out, rgba(255, 2, 0, 255));
    }

    #[test]
    fn subtractive_floors_at_zero() {
        let out = BlendMode::Subtractive.apply(rgba(200, 5, 0, 0), rgba(100, 10, 0, 255));
        assert_eq!(out, rgba(0, 5, 0, 255));
    }

    #[test]
    fn lighten_darken_are_minmax() {
        let s = rgba(10, 200, 30, 255);
        let d = rgba(20, 100, 30, 0);
        assert_eq!(BlendMode::Lighten.apply(s, d), rgba(20, 200, 30, 255));
        assert_eq!(BlendMode::Darken.apply(s, d), rgba(10, 100, 30, 0));
    }

    #[test]
    fn batch_matches_scalar_for_every_mode() {
        let modes = [
            BlendMode::Average,
            BlendMode::Alpha,
            BlendMode::Additive,
            BlendMode::Subtractive,
            BlendMode::Multiplicative,
            BlendMode::Screen,
            BlendMode::Lighten,
            BlendMode::Darken,
        ];
        let src = [
            rgba(255, 0, 0, 128),
            rgba(12, 240, 99, 255),
            rgba(0, 0, 0, 0),
            rgba(77, 77, 77, 77),
        ];
        let dst = [
            rgba(0, 255, 0, 255),
            rgba(250, 3, 17, 4),
            rgba(255, 255, 255, 255),
            rgba(128, 128, 128, 128),
        ];
        for mode in modes {
            let batch = mode.apply_batch(&src, &dst);
            for i in 0..4 {
                assert_eq!(batch[i], mode.apply(src[i], dst[i]), "{:?} lane {}", mode, i);
            }
        }
    }
}
