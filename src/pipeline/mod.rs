//! Geometry pipeline: primitive assembly and dispatch.
//!
//! Runs once per primitive window popped off the context's primitive
//! buffer: snapshots the draw state, decomposes the window into points,
//! lines or triangles, applies face selection and the per-face polygon
//! mode, and hands the results to the rasterizer.

pub(crate) mod clip;

use crate::blend::BlendMode;
use crate::context::{Context, DrawMode, Face, PolygonMode, ShadeModel, StateFlags};
use crate::depth::DepthMode;
use crate::fog::Fog;
use crate::framebuffer::Framebuffer;
use crate::light::{Light, Material, MAX_LIGHTS};
use crate::math::{Mat4, Vec3};
use crate::raster;
use crate::texture::TextureHandle;
use crate::vertex::Vertex;
use smallvec::SmallVec;

/// Viewport rectangle plus the precomputed clip rectangle.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Viewport {
    pub pos: [i32; 2],
    pub dim: [i32; 2],
    pub min: [i32; 2],
    pub max: [i32; 2],
}

/// Immutable snapshot of everything a draw needs from the context, taken
/// once per primitive window so the raster loops never touch the context
/// itself.
pub(crate) struct DrawConfig {
    pub state: StateFlags,
    pub mvp: Mat4,
    pub mat_normal: Mat4,
    pub view_pos: Vec3,
    pub vp: Viewport,
    pub shade: ShadeModel,
    pub polygon_modes: [PolygonMode; 2],
    pub blend: Option<BlendMode>,
    pub depth: Option<DepthMode>,
    pub materials: [Material; 2],
    pub lights: [Light; MAX_LIGHTS],
    pub light_head: Option<usize>,
    pub fog: Option<Fog>,
    pub texture: Option<TextureHandle>,
    pub point_size: f32,
    pub line_width: f32,
}

impl DrawConfig {
    fn snapshot(ctx: &Context) -> DrawConfig {
        let lighting = ctx.state.contains(StateFlags::LIGHTING) && ctx.active_light_head.is_some();
        let texture = if ctx.state.contains(StateFlags::TEXTURE_2D) {
            ctx.current_texture
                .as_ref()
                .filter(|t| t.borrow().is_valid())
                .cloned()
        } else {
            None
        };
        DrawConfig {
            state: ctx.state,
            mvp: ctx.mat_mvp,
            mat_normal: if lighting { ctx.normal_matrix() } else { Mat4::IDENTITY },
            view_pos: if lighting { ctx.view_position() } else { Vec3::ZERO },
            vp: Viewport {
                pos: ctx.vp_pos,
                dim: ctx.vp_dim,
                min: ctx.vp_min,
                max: ctx.vp_max,
            },
            shade: ctx.shade_model,
            polygon_modes: ctx.polygon_modes,
            blend: ctx
                .state
                .contains(StateFlags::BLEND)
                .then(|| ctx.blend_mode),
            depth: ctx
                .state
                .contains(StateFlags::DEPTH_TEST)
                .then(|| ctx.depth_mode),
            materials: ctx.face_materials,
            lights: ctx.lights,
            light_head: if lighting { ctx.active_light_head } else { None },
            fog: ctx.state.contains(StateFlags::FOG).then(|| ctx.fog),
            texture,
            point_size: ctx.point_size,
            line_width: ctx.line_width,
        }
    }

    #[inline]
    pub(crate) fn lighting_active(&self) -> bool {
        self.light_head.is_some()
    }
}

/// Runs `f` against the framebuffer draws currently target.
fn with_target<R>(ctx: &mut Context, f: impl FnOnce(&mut Framebuffer) -> R) -> R {
    match ctx.target_handle() {
        Some(handle) => f(&mut handle.borrow_mut()),
        None => f(&mut ctx.main_framebuffer),
    }
}

/// Faces a polygonal primitive renders to, honoring the cull bit.
fn face_to_render(cfg: &DrawConfig, ctx_cull: Face) -> Face {
    if cfg.state.contains(StateFlags::CULL_FACE) {
        ctx_cull.opposite()
    } else {
        Face::FrontAndBack
    }
}

/// Pipeline entry: processes the primitive window sitting in the
/// context's vertex buffer.
pub(crate) fn process_and_rasterize(ctx: &mut Context, mode: DrawMode) {
    let cfg = DrawConfig::snapshot(ctx);
    let window = ctx.vertex_buffer;
    let cull = ctx.cull_face;

    match mode {
        DrawMode::Points => {
            let mut v = window[0];
            if clip::project_point(&cfg.vp, &cfg.mvp, &mut v) {
                with_target(ctx, |fb| raster::point::rasterize(fb, &cfg, &v));
            }
        }

        DrawMode::Lines => {
            let mut v1 = window[0];
            let mut v2 = window[1];
            if clip::project_and_clip_line(&cfg.vp, &cfg.mvp, &mut v1, &mut v2) {
                with_target(ctx, |fb| raster::line::rasterize(fb, &cfg, &v1, &v2));
            }
        }

        DrawMode::Triangles => {
            polygon_window(ctx, &cfg, cull, &window[..3], &[[0, 1, 2]]);
        }
        DrawMode::TriangleFan | DrawMode::Quads => {
            polygon_window(ctx, &cfg, cull, &window[..4], &[[0, 1, 2], [0, 2, 3]]);
        }
        DrawMode::TriangleStrip => {
            polygon_window(ctx, &cfg, cull, &window[..4], &[[0, 1, 2], [3, 2, 1]]);
        }
        DrawMode::QuadFan => {
            polygon_window(
                ctx,
                &cfg,
                cull,
                &window[..6],
                &[[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 5]],
            );
        }
        DrawMode::QuadStrip => {
            polygon_window(
                ctx,
                &cfg,
                cull,
                &window[..6],
                &[[0, 1, 2], [3, 2, 1], [2, 3, 4], [5, 4, 3]],
            );
        }
    }
}

/// Renders a polygonal window: per selected face, apply its polygon mode
/// (point, outline, or the triangle decomposition given by `tris`).
fn polygon_window(
    ctx: &mut Context,
    cfg: &DrawConfig,
    cull: Face,
    vertices: &[Vertex],
    tris: &[[usize; 3]],
) {
    let face = face_to_render(cfg, cull);
    let faces: &[Face] = match face {
        Face::FrontAndBack => &[Face::Front, Face::Back],
        Face::Front => &[Face::Front],
        Face::Back => &[Face::Back],
    };

    for &face in faces {
        match cfg.polygon_modes[face as usize] {
            PolygonMode::Point => polygon_points(ctx, cfg, vertices),
            PolygonMode::Line => polygon_outline(ctx, cfg, vertices),
            PolygonMode::Fill => {
                for tri in tris {
                    let triangle = [vertices[tri[0]], vertices[tri[1]], vertices[tri[2]]];
                    fill_triangle(ctx, cfg, face, triangle);
                }
            }
        }
    }
}

/// `PolygonMode::Point`: each window vertex as a point.
fn polygon_points(ctx: &mut Context, cfg: &DrawConfig, vertices: &[Vertex]) {
    for v in vertices {
        let mut v = *v;
        if clip::project_point(&cfg.vp, &cfg.mvp, &mut v) {
            with_target(ctx, |fb| raster::point::rasterize(fb, cfg, &v));
        }
    }
}

/// `PolygonMode::Line`: the window's closed outline.
fn polygon_outline(ctx: &mut Context, cfg: &DrawConfig, vertices: &[Vertex]) {
    for i in 0..vertices.len() {
        let mut v1 = vertices[i];
        let mut v2 = vertices[(i + 1) % vertices.len()];
        if clip::project_and_clip_line(&cfg.vp, &cfg.mvp, &mut v1, &mut v2) {
            with_target(ctx, |fb| raster::line::rasterize(fb, cfg, &v1, &v2));
        }
    }
}

/// `PolygonMode::Fill` for one triangle of the decomposition: lighting
/// prep, clip, then fan-emit the clipped polygon to the filler.
fn fill_triangle(ctx: &mut Context, cfg: &DrawConfig, face: Face, triangle: [Vertex; 3]) {
    let mut polygon: clip::ClipBuffer = SmallVec::new();
    polygon.extend_from_slice(&triangle);

    if cfg.lighting_active() {
        for v in polygon.iter_mut() {
            v.normal = cfg.mat_normal.transform_vec3(v.normal).normalized();
            v.color = v.color.modulate(cfg.materials[face as usize].diffuse);
        }
    }

    let is3d = clip::project_and_clip_polygon(&cfg.vp, &cfg.mvp, &mut polygon);
    if polygon.len() < 3 {
        return;
    }

    with_target(ctx, |fb| {
        for i in 0..polygon.len() - 2 {
            raster::triangle::rasterize(
                fb,
                cfg,
                face,
                is3d,
                &polygon[0],
                &polygon[i + 1],
                &polygon[i + 2],
            );
        }
    });
}
