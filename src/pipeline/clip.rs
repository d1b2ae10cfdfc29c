//! Homogeneous clipping and the projection helpers.
//!
//! Polygons clip Sutherland-Hodgman style against the near-mirror plane
//! `w >= epsilon` and the six `|x,y,z| <= w` planes. Lines take one of
//! two routes: pre-projected 2D endpoints (`w == 1`) clip against the
//! viewport rectangle in screen space, everything else clips
//! parametrically in 4D. Points are simply accepted or discarded.

use super::Viewport;
use crate::math::Mat4;
use crate::vertex::Vertex;
use smallvec::SmallVec;

/// Near-mirror plane offset.
pub(crate) const CLIP_EPSILON: f32 = 1e-5;

/// Clip scratch capacity: two times the triangle vertex count plus one
/// potential split per plane.
pub(crate) const MAX_CLIPPED_VERTICES: usize = 2 * (3 + 6);

pub(crate) type ClipBuffer = SmallVec<[Vertex; MAX_CLIPPED_VERTICES]>;

/// Viewport mapping of a projected vertex.
///
/// The half-pixel bias rounds toward the pixel centre; without it,
/// vertices produced on the positive clip planes land one pixel short
/// and open gaps between adjacent clipped triangles.
pub(crate) fn homogeneous_to_screen(vp: &Viewport, v: &mut Vertex) {
    v.screen.x = (vp.pos[0] as f32 + (v.homogeneous.x + 1.0) * 0.5 * vp.dim[0] as f32) + 0.5;
    v.screen.y = (vp.pos[1] as f32 + (1.0 - v.homogeneous.y) * 0.5 * vp.dim[1] as f32) + 0.5;
}

//--------------------------------------------------------------------------------------------------
// Point

/// Transforms and projects a point; false when it falls outside the clip
/// volume or the viewport rectangle.
pub(crate) fn project_point(vp: &Viewport, mvp: &Mat4, v: &mut Vertex) -> bool {
    v.homogeneous = mvp.transform(v.position);

    if v.homogeneous.w != 1.0 {
        let w = v.homogeneous.w;
        if v.homogeneous.x < -w
            || v.homogeneous.x > w
            || v.homogeneous.y < -w
            || v.homogeneous.y > w
            || v.homogeneous.z < -w
            || v.homogeneous.z > w
        {
            return false;
        }
        let inv_w = 1.0 / w;
        v.homogeneous.x *= inv_w;
        v.homogeneous.y *= inv_w;
    }

    homogeneous_to_screen(vp, v);

    v.screen.x >= vp.min[0] as f32
        && v.screen.x <= vp.max[0] as f32
        && v.screen.y >= vp.min[1] as f32
        && v.screen.y <= vp.max[1] as f32
}

//--------------------------------------------------------------------------------------------------
// Lines

const CLIP_INSIDE: u8 = 0x00;
const CLIP_LEFT: u8 = 0x01;
const CLIP_RIGHT: u8 = 0x02;
const CLIP_BOTTOM: u8 = 0x04;
const CLIP_TOP: u8 = 0x08;

fn encode_clip_2d(vp: &Viewport, x: f32, y: f32) -> u8 {
    let mut code = CLIP_INSIDE;
    if x < vp.min[0] as f32 {
        code |= CLIP_LEFT;
    }
    if x > vp.max[0] as f32 {
        code |= CLIP_RIGHT;
    }
    if y < vp.min[1] as f32 {
        code |= CLIP_BOTTOM;
    }
    if y > vp.max[1] as f32 {
        code |= CLIP_TOP;
    }
    code
}

/// Cohen-Sutherland against the viewport rectangle, in screen space.
fn clip_line_2d(vp: &Viewport, v1: &mut Vertex, v2: &mut Vertex) -> bool {
    let mut m = 0.0;
    if v1.screen.x != v2.screen.x {
        m = (v2.screen.y - v1.screen.y) / (v2.screen.x - v1.screen.x);
    }

    loop {
        let code0 = encode_clip_2d(vp, v1.screen.x, v1.screen.y);
        let code1 = encode_clip_2d(vp, v2.screen.x, v2.screen.y);

        if code0 | code1 == 0 {
            return true;
        }
        if code0 & code1 != 0 {
            return false;
        }

        // Always rewrite the endpoint that is outside.
        let (out, _other) = if code0 != CLIP_INSIDE {
            (&mut *v1, &mut *v2)
        } else {
            (&mut *v2, &mut *v1)
        };
        let code = if code0 != CLIP_INSIDE { code0 } else { code1 };

        if code & CLIP_LEFT != 0 {
            out.screen.y += (vp.min[0] as f32 - out.screen.x) * m;
            out.screen.x = vp.min[0] as f32;
        } else if code & CLIP_RIGHT != 0 {
            out.screen.y += (vp.max[0] as f32 - out.screen.x) * m;
            out.screen.x = vp.max[0] as f32;
        } else if code & CLIP_BOTTOM != 0 {
            if m != 0.0 {
                out.screen.x += (vp.min[1] as f32 - out.screen.y) / m;
            }
            out.screen.y = vp.min[1] as f32;
        } else if code & CLIP_TOP != 0 {
            if m != 0.0 {
                out.screen.x += (vp.max[1] as f32 - out.screen.y) / m;
            }
            out.screen.y = vp.max[1] as f32;
        }
    }
}

/// One plane of the parametric 4D line clip. `q` is the plane distance
/// at the start point, `p` its delta along the segment.
fn clip_coord_3d(q: f32, p: f32, t1: &mut f32, t2: &mut f32) -> bool {
    if p.abs() < CLIP_EPSILON && q < 0.0 {
        return false;
    }

    let r = q / p;
    if p < 0.0 {
        if r > *t2 {
            return false;
        }
        if r > *t1 {
            *t1 = r;
        }
    } else {
        if r < *t1 {
            return false;
        }
        if r < *t2 {
            *t2 = r;
        }
    }
    true
}

/// Liang-Barsky style clip against the six planes in 4D, rewriting the
/// endpoints at the clipped parameters.
fn clip_line_3d(v1: &mut Vertex, v2: &mut Vertex) -> bool {
    let mut t1 = 0.0f32;
    let mut t2 = 1.0f32;

    let delta = v2.homogeneous - v1.homogeneous;
    let h1 = v1.homogeneous;

    if !clip_coord_3d(h1.w - h1.x, -delta.w + delta.x, &mut t1, &mut t2) {
        return false;
    }
    if !clip_coord_3d(h1.w + h1.x, -delta.w - delta.x, &mut t1, &mut t2) {
        return false;
    }
    if !clip_coord_3d(h1.w - h1.y, -delta.w + delta.y, &mut t1, &mut t2) {
        return false;
    }
    if !clip_coord_3d(h1.w + h1.y, -delta.w - delta.y, &mut t1, &mut t2) {
        return false;
    }
    if !clip_coord_3d(h1.w - h1.z, -delta.w + delta.z, &mut t1, &mut t2) {
        return false;
    }
    if !clip_coord_3d(h1.w + h1.z, -delta.w - delta.z, &mut t1, &mut t2) {
        return false;
    }

    if t2 < 1.0 {
        v2.homogeneous = h1 + delta * t2;
    }
    if t1 > 0.0 {
        v1.homogeneous = h1 + delta * t1;
    }
    true
}

/// Transforms, clips and projects a line segment in place; false when
/// fully rejected.
pub(crate) fn project_and_clip_line(vp: &Viewport, mvp: &Mat4, v1: &mut Vertex, v2: &mut Vertex) -> bool {
    v1.homogeneous = mvp.transform(v1.position);
    v2.homogeneous = mvp.transform(v2.position);

    if v1.homogeneous.w == 1.0 && v2.homogeneous.w == 1.0 {
        homogeneous_to_screen(vp, v1);
        homogeneous_to_screen(vp, v2);
        clip_line_2d(vp, v1, v2)
    } else {
        if !clip_line_3d(v1, v2) {
            return false;
        }
        for v in [&mut *v1, &mut *v2] {
            let inv_w = 1.0 / v.homogeneous.w;
            v.homogeneous.x *= inv_w;
            v.homogeneous.y *= inv_w;
            homogeneous_to_screen(vp, v);
        }
        true
    }
}

//--------------------------------------------------------------------------------------------------
// Polygons

/// Sutherland-Hodgman pass against the `w >= epsilon` near-mirror plane.
fn clip_polygon_w(polygon: &mut ClipBuffer) -> bool {
    let input: ClipBuffer = polygon.clone();
    polygon.clear();

    let mut prev = &input[input.len() - 1];
    let mut prev_inside = prev.homogeneous.w >= CLIP_EPSILON;

    for current in &input {
        let inside = current.homogeneous.w >= CLIP_EPSILON;

        if inside != prev_inside {
            let t = (CLIP_EPSILON - prev.homogeneous.w)
                / (current.homogeneous.w - prev.homogeneous.w);
            polygon.push(prev.lerp(current, t));
        }
        if inside {
            polygon.push(*current);
        }

        prev = current;
        prev_inside = inside;
    }

    !polygon.is_empty()
}

/// Sutherland-Hodgman passes against the six `|coord| <= w` planes.
fn clip_polygon_xyz(polygon: &mut ClipBuffer) -> bool {
    for axis in 0..3usize {
        if polygon.is_empty() {
            return false;
        }

        let coord = |v: &Vertex| match axis {
            0 => v.homogeneous.x,
            1 => v.homogeneous.y,
            _ => v.homogeneous.z,
        };

        // coord <= w, then -coord <= w.
        for sign in [1.0f32, -1.0] {
            let input: ClipBuffer = polygon.clone();
            polygon.clear();
            if input.is_empty() {
                return false;
            }

            let dist = |v: &Vertex| v.homogeneous.w - sign * coord(v);

            let mut prev = &input[input.len() - 1];
            let mut prev_inside = dist(prev) >= 0.0;

            for current in &input {
                let inside = dist(current) >= 0.0;

                if inside != prev_inside {
                    let dp = dist(prev);
                    let t = dp / (dp - dist(current));
                    polygon.push(prev.lerp(current, t));
                }
                if inside {
                    polygon.push(*current);
                }

                prev = current;
                prev_inside = inside;
            }
        }
    }

    !polygon.is_empty()
}

/// Transforms, clips and projects a polygon in place.
///
/// Returns true for the 3D route. A polygon whose vertices all carry
/// `w == 1` skips clipping entirely (pre-projected 2D path); the raster
/// stage clamps those to the viewport instead. On the 3D route the
/// surviving vertices store `1/z` back into `homogeneous.z` and scale
/// the texture coordinates by it for perspective-correct interpolation.
pub(crate) fn project_and_clip_polygon(vp: &Viewport, mvp: &Mat4, polygon: &mut ClipBuffer) -> bool {
    let mut weight_sum = 0.0f32;
    for v in polygon.iter_mut() {
        v.homogeneous = mvp.transform(v.position);
        weight_sum += v.homogeneous.w;
    }

    if (weight_sum - polygon.len() as f32).abs() < CLIP_EPSILON {
        for v in polygon.iter_mut() {
            homogeneous_to_screen(vp, v);
        }
        return false;
    }

    if clip_polygon_w(polygon) && clip_polygon_xyz(polygon) {
        for v in polygon.iter_mut() {
            // Reciprocal of clip z, kept for perspective-correct
            // interpolation in the raster loops.
            v.homogeneous.z = 1.0 / v.homogeneous.z;
            v.texcoord = v.texcoord * v.homogeneous.z;

            let inv_w = 1.0 / v.homogeneous.w;
            v.homogeneous.x *= inv_w;
            v.homogeneous.y *= inv_w;

            homogeneous_to_screen(vp, v);
        }
    }

    true
}
