//! Rasterizers for the three primitive classes.

pub(crate) mod line;
pub(crate) mod point;
pub(crate) mod triangle;

use crate::blend::BlendMode;
use crate::codec;
use crate::color::Color;
use crate::depth::DepthMode;
use crate::fog::Fog;
use crate::format::PixelLayout;

/// Depth disposition for one fragment; everything passes while depth
/// testing is disabled.
#[inline]
pub(crate) fn depth_passes(mode: Option<DepthMode>, z: f32, stored: f32) -> bool {
    match mode {
        Some(mode) => mode.test(z, stored),
        None => true,
    }
}

/// Final fragment disposition: fog, blend against the destination,
/// write color and depth. `offset` indexes pixels relative to the given
/// slices, which may be a single row of the target.
#[inline]
pub(crate) fn commit_fragment(
    layout: PixelLayout,
    pixels: &mut [u8],
    depth_buf: &mut [f32],
    offset: usize,
    z: f32,
    mut color: Color,
    blend: Option<BlendMode>,
    fog: Option<&Fog>,
) {
    if let Some(fog) = fog {
        color = fog.apply(color, z);
    }
    if let Some(mode) = blend {
        let dst = codec::get_pixel(layout, pixels, offset);
        color = mode.apply(color, dst);
    }
    codec::set_pixel(layout, pixels, offset, color);
    depth_buf[offset] = z;
}
