//! Packed-pixel codec.
//!
//! For every valid [`PixelLayout`](crate::format::PixelLayout) this module
//! widens one packed pixel to a canonical [`Color`] and narrows one back.
//! Reads and writes go through explicit little-endian byte views, so no
//! alignment is required of the underlying store (which may be caller
//! memory). The batch entry points process [`LANES`] adjacent pixels with
//! a write mask and are pixel-exact with their scalar twins.

use crate::color::{rgba, Color, ColorBatch, LANES};
use crate::format::{DataType, PixelFormat, PixelLayout};
use half::f16;

/// Alpha packing threshold for the 5-5-5-1 layout (mid-range).
pub const ALPHA_THRESHOLD_5551: u8 = 128;

// Rec. 601 luma weights.
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

#[inline]
fn luminance_of(color: Color) -> f32 {
    let [r, g, b, _] = color.to_normalized();
    r * LUMA_R + g * LUMA_G + b * LUMA_B
}

#[inline]
fn unorm8(v: f32) -> u8 {
    (v.max(0.0).min(1.0) * 255.0) as u8
}

// 5/6-bit channel widening, exact at the endpoints.
#[inline]
fn expand5(v: u16) -> u8 {
    ((v as u32 * 255) / 31) as u8
}

#[inline]
fn expand6(v: u16) -> u8 {
    ((v as u32 * 255) / 63) as u8
}

#[inline]
fn expand4(v: u16) -> u8 {
    ((v as u32 * 255) / 15) as u8
}

// Round-to-nearest narrowing to an n-bit channel.
#[inline]
fn quant(v: u8, max: u32) -> u16 {
    ((v as u32 * max + 127) / 255) as u16
}

#[inline]
fn read_u16(pixels: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([pixels[offset], pixels[offset + 1]])
}

#[inline]
fn write_u16(pixels: &mut [u8], offset: usize, v: u16) {
    pixels[offset..offset + 2].copy_from_slice(&v.to_le_bytes());
}

#[inline]
fn read_f32(pixels: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([
        pixels[offset],
        pixels[offset + 1],
        pixels[offset + 2],
        pixels[offset + 3],
    ])
}

#[inline]
fn write_f32(pixels: &mut [u8], offset: usize, v: f32) {
    pixels[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
}

#[inline]
fn read_f16(pixels: &[u8], offset: usize) -> f32 {
    f16::from_bits(read_u16(pixels, offset)).to_f32()
}

#[inline]
fn write_f16(pixels: &mut [u8], offset: usize, v: f32) {
    write_u16(pixels, offset, f16::from_f32(v).to_bits());
}

/// Reads the packed pixel at element `index` and widens it to RGBA8.
pub fn get_pixel(layout: PixelLayout, pixels: &[u8], index: usize) -> Color {
    let off = index * layout.bytes_per_pixel();

    match layout.data_type {
        DataType::UnsignedByte => match layout.format {
            // Common fast path: the store already is canonical RGBA8.
            PixelFormat::Rgba => Color::from_le_u32(u32::from_le_bytes([
                pixels[off],
                pixels[off + 1],
                pixels[off + 2],
                pixels[off + 3],
            ])),
            PixelFormat::Bgra => rgba(pixels[off + 2], pixels[off + 1], pixels[off], pixels[off + 3]),
            PixelFormat::Rgb => rgba(pixels[off], pixels[off + 1], pixels[off + 2], 255),
            PixelFormat::Bgr => rgba(pixels[off + 2], pixels[off + 1], pixels[off], 255),
            PixelFormat::Luminance => {
                let l = pixels[off];
                rgba(l, l, l, 255)
            }
            PixelFormat::LuminanceAlpha => {
                let l = pixels[off];
                rgba(l, l, l, pixels[off + 1])
            }
            PixelFormat::Red => rgba(pixels[off], 0, 0, 255),
            PixelFormat::Green => rgba(0, pixels[off], 0, 255),
            PixelFormat::Blue => rgba(0, 0, pixels[off], 255),
            PixelFormat::Alpha => rgba(0, 0, 0, pixels[off]),
        },

        DataType::UnsignedShort565 => {
            let p = read_u16(pixels, off);
            let (c0, c1, c2) = (expand5(p >> 11), expand6((p >> 5) & 0x3F), expand5(p & 0x1F));
            match layout.format {
                PixelFormat::Rgb => rgba(c0, c1, c2, 255),
                _ => rgba(c2, c1, c0, 255), // Bgr
            }
        }

        DataType::UnsignedShort5551 => {
            let p = read_u16(pixels, off);
            let (c0, c1, c2) = (
                expand5(p >> 11),
                expand5((p >> 6) & 0x1F),
                expand5((p >> 1) & 0x1F),
            );
            let a = ((p & 0x1) * 255) as u8;
            match layout.format {
                PixelFormat::Rgba => rgba(c0, c1, c2, a),
                _ => rgba(c2, c1, c0, a), // Bgra
            }
        }

        DataType::UnsignedShort4444 => {
            let p = read_u16(pixels, off);
            let (c0, c1, c2, c3) = (
                expand4(p >> 12),
                expand4((p >> 8) & 0xF),
                expand4((p >> 4) & 0xF),
                expand4(p & 0xF),
            );
            match layout.format {
                PixelFormat::Rgba => rgba(c0, c1, c2, c3),
                _ => rgba(c2, c1, c0, c3), // Bgra
            }
        }

        DataType::HalfFloat => get_float_pixel(layout, off, |o| read_f16(pixels, o), 2),
        DataType::Float => get_float_pixel(layout, off, |o| read_f32(pixels, o), 4),
    }
}

/// Narrows an RGBA8 color into the packed format at element `index`.
pub fn set_pixel(layout: PixelLayout, pixels: &mut [u8], index: usize, color: Color) {
    let off = index * layout.bytes_per_pixel();

    match layout.data_type {
        DataType::UnsignedByte => match layout.format {
            PixelFormat::Rgba => {
                pixels[off..off + 4].copy_from_slice(&color.to_le_u32().to_le_bytes())
            }
            PixelFormat::Bgra => {
                pixels[off] = color.b;
                pixels[off + 1] = color.g;
                pixels[off + 2] = color.r;
                pixels[off + 3] = color.a;
            }
            PixelFormat::Rgb => {
                pixels[off] = color.r;
                pixels[off + 1] = color.g;
                pixels[off + 2] = color.b;
            }
            PixelFormat::Bgr => {
                pixels[off] = color.b;
                pixels[off + 1] = color.g;
                pixels[off + 2] = color.r;
            }
            PixelFormat::Luminance => pixels[off] = unorm8(luminance_of(color)),
            PixelFormat::LuminanceAlpha => {
                pixels[off] = unorm8(luminance_of(color));
                pixels[off + 1] = color.a;
            }
            PixelFormat::Red => pixels[off] = color.r,
            PixelFormat::Green => pixels[off] = color.g,
            PixelFormat::Blue => pixels[off] = color.b,
            PixelFormat::Alpha => pixels[off] = color.a,
        },

        DataType::UnsignedShort565 => {
            let (r, g, b) = match layout.format {
                PixelFormat::Rgb => (color.r, color.g, color.b),
                _ => (color.b, color.g, color.r), // Bgr
            };
            write_u16(
                pixels,
                off,
                quant(r, 31) << 11 | quant(g, 63) << 5 | quant(b, 31),
            );
        }

        DataType::UnsignedShort5551 => {
            let (r, g, b) = match layout.format {
                PixelFormat::Rgba => (color.r, color.g, color.b),
                _ => (color.b, color.g, color.r), // Bgra
            };
            let a = (color.a > ALPHA_THRESHOLD_5551) as u16;
            write_u16(
                pixels,
                off,
                quant(r, 31) << 11 | quant(g, 31) << 6 | quant(b, 31) << 1 | a,
            );
        }

        DataType::UnsignedShort4444 => {
            let (r, g, b) = match layout.format {
                PixelFormat::Rgba => (color.r, color.g, color.b),
                _ => (color.b, color.g, color.r), // Bgra
            };
            write_u16(
                pixels,
                off,
                quant(r, 15) << 12 | quant(g, 15) << 8 | quant(b, 15) << 4 | quant(color.a, 15),
            );
        }

        DataType::HalfFloat => set_float_pixel(layout, color, |i, v| write_f16(pixels, off + i * 2, v)),
        DataType::Float => set_float_pixel(layout, color, |i, v| write_f32(pixels, off + i * 4, v)),
    }
}

fn get_float_pixel(layout: PixelLayout, off: usize, read: impl Fn(usize) -> f32, stride: usize) -> Color {
    let ch = |i: usize| unorm8(read(off + i * stride));
    match layout.format {
        PixelFormat::Red => rgba(ch(0), 0, 0, 255),
        PixelFormat::Green => rgba(0, ch(0), 0, 255),
        PixelFormat::Blue => rgba(0, 0, ch(0), 255),
        PixelFormat::Alpha => rgba(0, 0, 0, ch(0)),
        PixelFormat::Luminance => {
            let l = ch(0);
            rgba(l, l, l, 255)
        }
        PixelFormat::LuminanceAlpha => {
            let l = ch(0);
            rgba(l, l, l, ch(1))
        }
        PixelFormat::Rgb => rgba(ch(0), ch(1), ch(2), 255),
        PixelFormat::Bgr => rgba(ch(2), ch(1), ch(0), 255),
        PixelFormat::Rgba => rgba(ch(0), ch(1), ch(2), ch(3)),
        PixelFormat::Bgra => rgba(ch(2), ch(1), ch(0), ch(3)),
    }
}

fn set_float_pixel(layout: PixelLayout, color: Color, mut write: impl FnMut(usize, f32)) {
    let [r, g, b, a] = color.to_normalized();
    match layout.format {
        PixelFormat::Red => write(0, r),
        PixelFormat::Green => write(0, g),
        PixelFormat::Blue => write(0, b),
        PixelFormat::Alpha => write(0, a),
        PixelFormat::Luminance => write(0, luminance_of(color)),
        PixelFormat::LuminanceAlpha => {
            write(0, luminance_of(color));
            write(1, a);
        }
        PixelFormat::Rgb => {
            write(0, r);
            write(1, g);
            write(2, b);
        }
        PixelFormat::Bgr => {
            write(0, b);
            write(1, g);
            write(2, r);
        }
        PixelFormat::Rgba => {
            write(0, r);
            write(1, g);
            write(2, b);
            write(3, a);
        }
        PixelFormat::Bgra => {
            write(0, b);
            write(1, g);
            write(2, r);
            write(3, a);
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Batched variants

/// Widens [`LANES`] adjacent pixels starting at element `index`.
pub fn get_batch(layout: PixelLayout, pixels: &[u8], index: usize) -> ColorBatch {
    if layout == PixelLayout::RGBA8 {
        // The RGBA8 quad is one aligned-friendly 16-byte read when the
        // store permits it.
        let off = index * 4;
        if let Ok(words) = bytemuck::try_cast_slice::<u8, u32>(&pixels[off..off + 16]) {
            return [
                Color::from_le_u32(words[0]),
                Color::from_le_u32(words[1]),
                Color::from_le_u32(words[2]),
                Color::from_le_u32(words[3]),
            ];
        }
    }
    let mut out = [Color::TRANSPARENT; LANES];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = get_pixel(layout, pixels, index + i);
    }
    out
}

/// Narrows [`LANES`] colors into adjacent pixels starting at element
/// `index`; lanes with a cleared mask bit are left untouched.
pub fn set_batch(
    layout: PixelLayout,
    pixels: &mut [u8],
    index: usize,
    colors: &ColorBatch,
    mask: [bool; LANES],
) {
    if layout == PixelLayout::RGBA8 && mask == [true; LANES] {
        let off = index * 4;
        if let Ok(words) = bytemuck::try_cast_slice_mut::<u8, u32>(&mut pixels[off..off + 16]) {
            for (w, c) in words.iter_mut().zip(colors.iter()) {
                *w = c.to_le_u32();
            }
            return;
        }
    }
    for (i, (color, write)) in colors.iter().zip(mask.iter()).enumerate() {
        if *write {
            set_pixel(layout, pixels, index + i, *color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{DataType, PixelFormat};

    fn layout(f: PixelFormat, t: DataType) -> PixelLayout {
        PixelLayout::new(f, t).unwrap()
    }

    #[test]
    fn rgba8_roundtrip_exact() {
        let l = PixelLayout::RGBA8;
        let mut buf = vec![0u8; 4 * 4];
        let c = rgba(12, 34, 56, 78);
        set_pixel(l, &mut buf, 2, c);
        assert_eq!(get_pixel(l, &buf, 2), c);
    }

    #[test]
    fn bgra8_swizzles() {
        let l = layout(PixelFormat::Bgra, DataType::UnsignedByte);
        let mut buf = vec![0u8; 8];
        set_pixel(l, &mut buf, 0, rgba(1, 2, 3, 4));
        assert_eq!(&buf[..4], &[3, 2, 1, 4]);
        assert_eq!(get_pixel(l, &buf, 0), rgba(1, 2, 3, 4));
    }

    #[test]
    fn packed_565_endpoints() {
        let l = layout(PixelFormat::Rgb, DataType::UnsignedShort565);
        let mut buf = vec![0u8; 4];
        set_pixel(l, &mut buf, 0, rgba(255, 255, 255, 255));
        assert_eq!(get_pixel(l, &buf, 0), rgba(255, 255, 255, 255));
        set_pixel(l, &mut buf, 0, rgba(0, 0, 0, 0));
        assert_eq!(get_pixel(l, &buf, 0), rgba(0, 0, 0, 255));
    }

    #[test]
    fn packed_5551_alpha_threshold() {
        let l = layout(PixelFormat::Rgba, DataType::UnsignedShort5551);
        let mut buf = vec![0u8; 2];
        set_pixel(l, &mut buf, 0, rgba(8, 16, 32, ALPHA_THRESHOLD_5551));
        assert_eq!(get_pixel(l, &buf, 0).a, 0);
        set_pixel(l, &mut buf, 0, rgba(8, 16, 32, ALPHA_THRESHOLD_5551 + 1));
        assert_eq!(get_pixel(l, &buf, 0).a, 255);
    }

    #[test]
    fn luminance_uses_rec601() {
        let l = layout(PixelFormat::Luminance, DataType::UnsignedByte);
        let mut buf = vec![0u8; 1];
        set_pixel(l, &mut buf, 0, rgba(255, 0, 0, 255));
        assert_eq!(buf[0], 76); // 0.299 * 255
        set_pixel(l, &mut buf, 0, rgba(255, 255, 255, 255));
        assert_eq!(buf[0], 255);
    }

    #[test]
    fn half_float_roundtrip_within_quantization() {
        let l = layout(PixelFormat::Rgba, DataType::HalfFloat);
        let mut buf = vec![0u8; 8];
        let c = rgba(200, 100, 50, 25);
        set_pixel(l, &mut buf, 0, c);
        let back = get_pixel(l, &buf, 0);
        assert!((back.r as i32 - c.r as i32).abs() <= 1);
        assert!((back.g as i32 - c.g as i32).abs() <= 1);
        assert!((back.b as i32 - c.b as i32).abs() <= 1);
        assert!((back.a as i32 - c.a as i32).abs() <= 1);
    }

    #[test]
    fn batch_matches_scalar() {
        for &t in &[DataType::UnsignedByte, DataType::UnsignedShort4444, DataType::Float] {
            let l = layout(PixelFormat::Rgba, t);
            let mut a = vec![0u8; 8 * l.bytes_per_pixel()];
            let mut b = a.clone();
            let colors = [
                rgba(255, 0, 0, 255),
                rgba(0, 255, 0, 128),
                rgba(0, 0, 255, 64),
                rgba(10, 20, 30, 40),
            ];
            set_batch(l, &mut a, 2, &colors, [true, false, true, true]);
            for (i, c) in colors.iter().enumerate() {
                if i != 1 {
                    set_pixel(l, &mut b, 2 + i, *c);
                }
            }
            assert_eq!(a, b);
            assert_eq!(get_batch(l, &a, 2)[0], get_pixel(l, &a, 2));
        }
    }
}
