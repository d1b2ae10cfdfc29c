//! Triangle rasterizer.
//!
//! The default filler walks the bounding box with incremental integer
//! edge functions (barycentric weights); the `scanline-raster` feature
//! swaps in a sorted-scanline filler instead. Both run the same fragment
//! stage: interpolated color, perspective-correct texturing, per-light
//! shading, fog, blend, depth.

use super::{commit_fragment, depth_passes};
use crate::blend::BlendMode;
use crate::color::{self, Color};
use crate::context::{Face, ShadeModel};
use crate::depth::DepthMode;
use crate::fog::Fog;
use crate::format::PixelLayout;
use crate::framebuffer::Framebuffer;
use crate::light::{self, Light, Material, MAX_LIGHTS};
use crate::math::{Vec2, Vec3};
use crate::pipeline::DrawConfig;
use crate::texture::Texture;
use crate::vertex::Vertex;

/// Bounding-box pixel count above which scanlines go wide.
#[cfg(feature = "parallel-raster")]
const PARALLEL_THRESHOLD: i64 = 4096;

/// Everything the fragment stage needs, free of interior mutability so
/// rows can shade concurrently.
struct FragmentState<'a> {
    layout: PixelLayout,
    smooth: bool,
    is3d: bool,
    texture: Option<&'a Texture>,
    lights: &'a [Light; MAX_LIGHTS],
    light_head: Option<usize>,
    material: Material,
    view_pos: Vec3,
    blend: Option<BlendMode>,
    depth: Option<DepthMode>,
    fog: Option<Fog>,
}

struct TriangleAttribs {
    z: [f32; 3],
    color: [Color; 3],
    uv: [Vec2; 3],
    position: [Vec3; 3],
    normal: [Vec3; 3],
}

impl TriangleAttribs {
    fn new(v1: &Vertex, v2: &Vertex, v3: &Vertex) -> TriangleAttribs {
        TriangleAttribs {
            z: [v1.homogeneous.z, v2.homogeneous.z, v3.homogeneous.z],
            color: [v1.color, v2.color, v3.color],
            uv: [v1.texcoord, v2.texcoord, v3.texcoord],
            position: [
                v1.position.truncate(),
                v2.position.truncate(),
                v3.position.truncate(),
            ],
            normal: [v1.normal, v2.normal, v3.normal],
        }
    }
}

/// Shades one covered pixel given its normalized barycentric weights,
/// then commits it.
#[inline]
fn shade_and_commit(
    st: &FragmentState<'_>,
    at: &TriangleAttribs,
    row_pixels: &mut [u8],
    row_depth: &mut [f32],
    idx: usize,
    a: [f32; 3],
    z: f32,
) {
    let mut fragment = if st.smooth {
        color::bary(at.color[0], at.color[1], at.color[2], a[0], a[1], a[2])
    } else {
        color::bary_flat(at.color[0], at.color[1], at.color[2], a[0], a[1], a[2])
    };

    if let Some(texture) = st.texture {
        let mut u = a[0] * at.uv[0].x + a[1] * at.uv[1].x + a[2] * at.uv[2].x;
        let mut v = a[0] * at.uv[0].y + a[1] * at.uv[1].y + a[2] * at.uv[2].y;
        if st.is3d {
            // Texcoords were stored as uv/z; the reconstructed z restores
            // perspective correctness.
            u *= z;
            v *= z;
        }
        fragment = texture.sample(u, v).modulate(fragment);
    }

    if st.light_head.is_some() {
        let position = at.position[0] * a[0] + at.position[1] * a[1] + at.position[2] * a[2];
        let normal = at.normal[0] * a[0] + at.normal[1] * a[1] + at.normal[2] * a[2];
        fragment = light::shade(
            st.lights,
            st.light_head,
            &st.material,
            fragment,
            st.view_pos,
            position,
            normal,
        );
    }

    commit_fragment(
        st.layout,
        row_pixels,
        row_depth,
        idx,
        z,
        fragment,
        st.blend,
        st.fog.as_ref(),
    );
}

fn fragment_state<'a>(
    cfg: &'a DrawConfig,
    texture: Option<&'a Texture>,
    face: Face,
    is3d: bool,
    layout: PixelLayout,
) -> FragmentState<'a> {
    FragmentState {
        layout,
        smooth: cfg.shade == ShadeModel::Smooth,
        is3d,
        texture,
        lights: &cfg.lights,
        light_head: cfg.light_head,
        material: cfg.materials[(face as usize).min(1)],
        view_pos: cfg.view_pos,
        blend: cfg.blend,
        depth: cfg.depth,
        fog: cfg.fog,
    }
}

//--------------------------------------------------------------------------------------------------
// Barycentric filler (default)

#[cfg(not(feature = "scanline-raster"))]
pub(crate) fn rasterize(
    fb: &mut Framebuffer,
    cfg: &DrawConfig,
    face: Face,
    is3d: bool,
    v1: &Vertex,
    v2: &Vertex,
    v3: &Vertex,
) {
    let (x1, y1) = (v1.screen.x as i32, v1.screen.y as i32);
    let (x2, y2) = (v2.screen.x as i32, v2.screen.y as i32);
    let (x3, y3) = (v3.screen.x as i32, v3.screen.y as i32);

    // Signed screen area selects the face; degenerate triangles fall out
    // here as well.
    let signed_area = (x2 - x1) * (y3 - y1) - (x3 - x1) * (y2 - y1);
    let front = match face {
        Face::Front if signed_area < 0 => true,
        Face::Back if signed_area > 0 => false,
        _ => return,
    };

    let (tex_store, depth_store) = fb.parts_mut();
    let layout = tex_store.layout();
    let fbw = tex_store.width() as i32;
    let fbh = tex_store.height() as i32;

    let mut x_min = x1.min(x2).min(x3);
    let mut y_min = y1.min(y2).min(y3);
    let mut x_max = x1.max(x2).max(x3);
    let mut y_max = y1.max(y2).max(y3);

    // Pre-projected 2D primitives clip against the viewport here;
    // 3D primitives were already clipped to the volume.
    if !is3d {
        x_min = x_min.max(cfg.vp.min[0]);
        y_min = y_min.max(cfg.vp.min[1]);
        x_max = x_max.min(cfg.vp.max[0]);
        y_max = y_max.min(cfg.vp.max[1]);
    }
    x_min = x_min.max(0);
    y_min = y_min.max(0);
    x_max = x_max.min(fbw - 1);
    y_max = y_max.min(fbh - 1);
    if x_min > x_max || y_min > y_max {
        return;
    }

    // Edge-function steps; reversed for back faces so the interior test
    // keeps its sign.
    let mut sx = [y3 - y2, y1 - y3, y2 - y1];
    let mut sy = [x2 - x3, x3 - x1, x1 - x2];
    if !front {
        for i in 0..3 {
            sx[i] = -sx[i];
            sy[i] = -sy[i];
        }
    }

    // Edge weights at the box origin; stepped incrementally inside the
    // scan loop.
    let w_row = [
        (x_min - x2) * sx[0] + sy[0] * (y_min - y2),
        (x_min - x3) * sx[1] + sy[1] * (y_min - y3),
        (x_min - x1) * sx[2] + sy[2] * (y_min - y1),
    ];

    // The weight sum is a per-triangle constant.
    let w_sum = w_row[0] + w_row[1] + w_row[2];
    if w_sum == 0 {
        return;
    }
    let inv_sum = 1.0 / w_sum as f32;

    let attribs = TriangleAttribs::new(v1, v2, v3);
    let tex_guard = cfg.texture.as_ref().map(|h| h.borrow());
    let st = fragment_state(cfg, tex_guard.as_deref(), face, is3d, layout);

    let row_bytes = fbw as usize * layout.bytes_per_pixel();
    let rows = (y_max - y_min + 1) as usize;

    let fill_row = |y: usize, row_pixels: &mut [u8], row_depth: &mut [f32]| {
        let dy = y as i32 - y_min;
        let mut w = [
            w_row[0] + dy * sy[0],
            w_row[1] + dy * sy[1],
            w_row[2] + dy * sy[2],
        ];
        for x in x_min..=x_max {
            if (w[0] | w[1] | w[2]) >= 0 {
                let a = [
                    w[0] as f32 * inv_sum,
                    w[1] as f32 * inv_sum,
                    w[2] as f32 * inv_sum,
                ];
                let z_dot = a[0] * attribs.z[0] + a[1] * attribs.z[1] + a[2] * attribs.z[2];
                let z = if is3d { 1.0 / z_dot } else { z_dot };
                let idx = x as usize;
                if depth_passes(st.depth, z, row_depth[idx]) {
                    shade_and_commit(&st, &attribs, row_pixels, row_depth, idx, a, z);
                }
            }
            w[0] += sx[0];
            w[1] += sx[1];
            w[2] += sx[2];
        }
    };

    #[cfg(feature = "parallel-raster")]
    {
        let box_area = (x_max - x_min + 1) as i64 * rows as i64;
        if box_area >= PARALLEL_THRESHOLD {
            use rayon::prelude::*;
            tex_store
                .pixel_bytes_mut()
                .par_chunks_mut(row_bytes)
                .zip(depth_store.par_chunks_mut(fbw as usize))
                .enumerate()
                .skip(y_min as usize)
                .take(rows)
                .for_each(|(y, (row_pixels, row_depth))| fill_row(y, row_pixels, row_depth));
            return;
        }
    }

    let pixel_rows = tex_store.pixel_bytes_mut().chunks_mut(row_bytes);
    let depth_rows = depth_store.chunks_mut(fbw as usize);
    for (y, (row_pixels, row_depth)) in pixel_rows
        .zip(depth_rows)
        .enumerate()
        .skip(y_min as usize)
        .take(rows)
    {
        fill_row(y, row_pixels, row_depth);
    }
}

//--------------------------------------------------------------------------------------------------
// Scanline filler (feature `scanline-raster`)

#[cfg(feature = "scanline-raster")]
pub(crate) fn rasterize(
    fb: &mut Framebuffer,
    cfg: &DrawConfig,
    face: Face,
    is3d: bool,
    v1: &Vertex,
    v2: &Vertex,
    v3: &Vertex,
) {
    let signed_area = (v2.screen.x - v1.screen.x) * (v3.screen.y - v1.screen.y)
        - (v3.screen.x - v1.screen.x) * (v2.screen.y - v1.screen.y);
    match face {
        Face::Front if signed_area < 0.0 => {}
        Face::Back if signed_area > 0.0 => {}
        _ => return,
    }

    // Sort by ascending y.
    let mut v = [v1, v2, v3];
    if v[1].screen.y < v[0].screen.y {
        v.swap(0, 1);
    }
    if v[2].screen.y < v[0].screen.y {
        v.swap(0, 2);
    }
    if v[2].screen.y < v[1].screen.y {
        v.swap(1, 2);
    }
    let [v1, v2, v3] = v;

    let (tex_store, depth_store) = fb.parts_mut();
    let layout = tex_store.layout();
    let fbw = tex_store.width() as i32;
    let fbh = tex_store.height() as i32;

    let (x1, y1) = (v1.screen.x as i32, v1.screen.y as i32);
    let (x2, y2) = (v2.screen.x as i32, v2.screen.y as i32);
    let (x3, y3) = (v3.screen.x as i32, v3.screen.y as i32);

    let inv_total = 1.0 / (y3 - y1 + 1) as f32;
    let inv_upper = 1.0 / (y2 - y1 + 1) as f32;
    let inv_lower = 1.0 / (y3 - y2 + 1) as f32;

    let mut y_min = y1;
    let mut y_max = y3;
    if !is3d {
        y_min = y_min.max(cfg.vp.min[1]);
        y_max = y_max.min(cfg.vp.max[1]);
    }
    y_min = y_min.max(0);
    y_max = y_max.min(fbh - 1);

    let attribs = TriangleAttribs::new(v1, v2, v3);
    let tex_guard = cfg.texture.as_ref().map(|h| h.borrow());
    let st = fragment_state(cfg, tex_guard.as_deref(), face, is3d, layout);

    let row_bytes = fbw as usize * layout.bytes_per_pixel();
    let pixel_rows = tex_store.pixel_bytes_mut().chunks_mut(row_bytes);
    let depth_rows = depth_store.chunks_mut(fbw as usize);

    for (y, (row_pixels, row_depth)) in pixel_rows
        .zip(depth_rows)
        .enumerate()
        .skip(y_min as usize)
        .take((y_max - y_min + 1).max(0) as usize)
    {
        let y = y as i32;
        let alpha = (y - y1 + 1) as f32 * inv_total;

        // Endpoints A (long edge v1-v3) and B (short edge of this half),
        // each carried as (from, to, t) over the sorted vertices.
        let (mut xa, mut xb, mut za, mut zb, mut ta, mut tb) = if y < y2 {
            let beta = (y - y1 + 1) as f32 * inv_upper;
            (
                x1 + ((x3 - x1) as f32 * alpha) as i32,
                x1 + ((x2 - x1) as f32 * beta) as i32,
                attribs.z[0] + (attribs.z[2] - attribs.z[0]) * alpha,
                attribs.z[0] + (attribs.z[1] - attribs.z[0]) * beta,
                (0usize, 2usize, alpha),
                (0usize, 1usize, beta),
            )
        } else {
            let beta = (y - y2 + 1) as f32 * inv_lower;
            (
                x1 + ((x3 - x1) as f32 * alpha) as i32,
                x2 + ((x3 - x2) as f32 * beta) as i32,
                attribs.z[0] + (attribs.z[2] - attribs.z[0]) * alpha,
                attribs.z[1] + (attribs.z[2] - attribs.z[1]) * beta,
                (0usize, 2usize, alpha),
                (1usize, 2usize, beta),
            )
        };

        if xa > xb {
            std::mem::swap(&mut xa, &mut xb);
            std::mem::swap(&mut za, &mut zb);
            std::mem::swap(&mut ta, &mut tb);
        }

        let mut x_min = xa;
        let mut x_max = xb;
        if !is3d {
            x_min = x_min.max(cfg.vp.min[0]);
            x_max = x_max.min(cfg.vp.max[0]);
        }
        x_min = x_min.max(0);
        x_max = x_max.min(fbw - 1);

        let inv_len = if xa == xb { 0.0 } else { 1.0 / (xb - xa) as f32 };

        for x in x_min..=x_max {
            let gamma = (x - xa) as f32 * inv_len;
            let z_edge = za + (zb - za) * gamma;
            let z = if is3d { 1.0 / z_edge } else { z_edge };
            let idx = x as usize;
            if !depth_passes(st.depth, z, row_depth[idx]) {
                continue;
            }

            // Convert the two edge parameters into barycentric weights
            // of the sorted vertices, so the shared fragment stage can
            // interpolate every attribute the same way.
            let wa = edge_weights(ta);
            let wb = edge_weights(tb);
            let a = [
                wa[0] + (wb[0] - wa[0]) * gamma,
                wa[1] + (wb[1] - wa[1]) * gamma,
                wa[2] + (wb[2] - wa[2]) * gamma,
            ];
            shade_and_commit(&st, &attribs, row_pixels, row_depth, idx, a, z);
        }
    }
}

/// Barycentric weights of a point sitting on one triangle edge.
#[cfg(feature = "scanline-raster")]
fn edge_weights((i, j, t): (usize, usize, f32)) -> [f32; 3] {
    let mut w = [0.0f32; 3];
    w[i] = 1.0 - t;
    w[j] = t;
    w
}
