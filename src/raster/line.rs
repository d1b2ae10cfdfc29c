//! Line rasterizer.
//!
//! Thin lines run an integer DDA with a 16.16 fixed-point minor-axis
//! increment; thick lines repeat the thin line at parallel offsets along
//! the axis perpendicular to the major axis.

use super::{commit_fragment, depth_passes};
use crate::color;
use crate::framebuffer::Framebuffer;
use crate::pipeline::DrawConfig;
use crate::vertex::Vertex;

/// Width at or below which a line is a single-pixel DDA.
const THIN_WIDTH: f32 = 1.5;

pub(crate) fn rasterize(fb: &mut Framebuffer, cfg: &DrawConfig, v1: &Vertex, v2: &Vertex) {
    if cfg.line_width > THIN_WIDTH {
        thick(fb, cfg, v1, v2);
    } else {
        thin(fb, cfg, v1, v2);
    }
}

fn thin(fb: &mut Framebuffer, cfg: &DrawConfig, v1: &Vertex, v2: &Vertex) {
    let (tex, depth_buf) = fb.parts_mut();
    let layout = tex.layout();
    let (width, height) = (tex.width() as i32, tex.height() as i32);
    let pixels = tex.pixel_bytes_mut();

    let (x1, y1) = (v1.screen.x as i32, v1.screen.y as i32);
    let (x2, y2) = (v2.screen.x as i32, v2.screen.y as i32);
    let (z1, z2) = (v1.homogeneous.z, v2.homogeneous.z);
    let (c1, c2) = (v1.color, v2.color);

    let mut short_len = y2 - y1;
    let mut long_len = x2 - x1;
    let mut y_longer = false;
    if short_len.abs() > long_len.abs() {
        std::mem::swap(&mut short_len, &mut long_len);
        y_longer = true;
    }

    // Coincident endpoints degenerate to a no-op.
    let end_val = long_len;
    if end_val == 0 && short_len == 0 {
        return;
    }

    let inv_end = if long_len != 0 { 1.0 / long_len as f32 } else { 0.0 };
    let sgn_inc = if long_len < 0 { -1 } else { 1 };
    let abs_long = long_len.abs();
    // 16.16 fixed-point step of the minor axis per major-axis pixel.
    let dec_inc = if abs_long == 0 { 0 } else { (short_len << 16) / abs_long };

    let mut j = 0i32;
    let mut i = 0i32;
    while i != end_val {
        let t = i as f32 * inv_end;
        let (x, y) = if y_longer {
            (x1 + (j >> 16), y1 + i)
        } else {
            (x1 + i, y1 + (j >> 16))
        };

        if x >= 0 && x < width && y >= 0 && y < height {
            let z = z1 + t * (z2 - z1);
            let offset = (y * width + x) as usize;
            if depth_passes(cfg.depth, z, depth_buf[offset]) {
                let fragment = color::lerp(c1, c2, t);
                commit_fragment(
                    layout,
                    pixels,
                    depth_buf,
                    offset,
                    z,
                    fragment,
                    cfg.blend,
                    cfg.fog.as_ref(),
                );
            }
        }

        i += sgn_inc;
        j += dec_inc;
    }
}

fn thick(fb: &mut Framebuffer, cfg: &DrawConfig, v1: &Vertex, v2: &Vertex) {
    thin(fb, cfg, v1, v2);

    let offsets = ((cfg.line_width - 1.0) * 0.5).ceil() as i32;
    if offsets <= 0 {
        return;
    }

    let dx = (v2.screen.x - v1.screen.x).abs();
    let dy = (v2.screen.y - v1.screen.y).abs();
    let offset_y = dx >= dy;

    for i in 1..=offsets {
        for side in [-1.0f32, 1.0] {
            let shift = side * i as f32;
            let mut a = *v1;
            let mut b = *v2;
            if offset_y {
                a.screen.y += shift;
                b.screen.y += shift;
            } else {
                a.screen.x += shift;
                b.screen.x += shift;
            }
            thin(fb, cfg, &a, &b);
        }
    }
}
