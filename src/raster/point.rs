//! Point rasterizer.

use super::{commit_fragment, depth_passes};
use crate::framebuffer::Framebuffer;
use crate::pipeline::DrawConfig;
use crate::vertex::Vertex;

/// Rasterizes one projected point. A size of one or less writes a single
/// pixel; larger sizes fill the discrete disk around the centre, clipped
/// to the viewport rectangle. Depth for every covered pixel is the
/// vertex depth.
pub(crate) fn rasterize(fb: &mut Framebuffer, cfg: &DrawConfig, v: &Vertex) {
    let (tex, depth_buf) = fb.parts_mut();
    let layout = tex.layout();
    let width = tex.width() as i32;
    let pixels = tex.pixel_bytes_mut();

    let cx = v.screen.x as i32;
    let cy = v.screen.y as i32;
    let z = v.homogeneous.z;
    let color = v.color;

    let mut plot = |x: i32, y: i32| {
        if x < cfg.vp.min[0] || x > cfg.vp.max[0] || y < cfg.vp.min[1] || y > cfg.vp.max[1] {
            return;
        }
        let offset = (y * width + x) as usize;
        if depth_passes(cfg.depth, z, depth_buf[offset]) {
            commit_fragment(
                layout,
                pixels,
                depth_buf,
                offset,
                z,
                color,
                cfg.blend,
                cfg.fog.as_ref(),
            );
        }
    };

    if cfg.point_size <= 1.0 {
        plot(cx, cy);
        return;
    }

    let radius = cfg.point_size * 0.5;
    let ri = radius as i32;
    let r_sq = radius * radius;
    for dy in -ri..=ri {
        for dx in -ri..=ri {
            if (dx * dx + dy * dy) as f32 <= r_sq {
                plot(cx + dx, cy + dy);
            }
        }
    }
}
