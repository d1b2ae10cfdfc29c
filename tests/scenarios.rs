//! End-to-end pipeline scenarios over small targets.

mod common;

use common::{close_to, TestTarget};
use pixelforge::*;

#[test]
fn clear_fills_every_pixel_with_clear_color() {
    let t = TestTarget::new(2, 2);
    {
        let mut ctx = t.ctx.borrow_mut();
        ctx.clear_color(10, 20, 30, 40);
        ctx.clear(ClearFlags::COLOR);
    }
    for y in 0..2 {
        for x in 0..2 {
            assert_eq!(t.pixel(x, y), [10, 20, 30, 40]);
        }
    }
}

#[test]
fn axis_aligned_triangle_lands_on_expected_corners() {
    let t = TestTarget::new(4, 4);
    {
        let mut ctx = t.ctx.borrow_mut();
        ctx.begin(DrawMode::Triangles);
        ctx.color3ub(255, 0, 0);
        ctx.vertex2f(-1.0, -1.0);
        ctx.color3ub(0, 255, 0);
        ctx.vertex2f(1.0, -1.0);
        ctx.color3ub(0, 0, 255);
        ctx.vertex2f(-1.0, 1.0);
        ctx.end();
    }
    // Bottom-left corner is the red vertex, bottom-right the green one,
    // top-left the blue one; the opposite corner stays background.
    assert!(close_to(t.pixel(0, 3), [255, 0, 0, 255], 8), "{:?}", t.pixel(0, 3));
    assert!(close_to(t.pixel(3, 3), [0, 255, 0, 255], 8), "{:?}", t.pixel(3, 3));
    assert!(close_to(t.pixel(0, 0), [0, 0, 255, 255], 8), "{:?}", t.pixel(0, 0));
    assert_eq!(t.pixel(3, 0), [0, 0, 0, 0]);
}

fn full_viewport_quad(ctx: &mut Context, color: [u8; 3], z: f32) {
    ctx.begin(DrawMode::Quads);
    ctx.color3ub(color[0], color[1], color[2]);
    ctx.vertex3f(-1.0, -1.0, z);
    ctx.vertex3f(1.0, -1.0, z);
    ctx.vertex3f(1.0, 1.0, z);
    ctx.vertex3f(-1.0, 1.0, z);
    ctx.end();
}

#[test]
fn depth_test_keeps_nearer_quad() {
    let t = TestTarget::new(2, 2);
    {
        let mut ctx = t.ctx.borrow_mut();
        ctx.enable(StateFlags::DEPTH_TEST);
        ctx.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
        full_viewport_quad(&mut ctx, [255, 0, 0], 0.5);
        full_viewport_quad(&mut ctx, [0, 0, 255], 0.7);
    }
    for y in 0..2 {
        for x in 0..2 {
            assert_eq!(t.pixel(x, y), [255, 0, 0, 255], "pixel ({}, {})", x, y);
        }
    }
    // The depth buffer holds the nearer value.
    let mut out = [0u8; 4];
    let mut ctx = t.ctx.borrow_mut();
    ctx.read_pixels(0, 0, 1, 1, PixelFormat::Rgba, DataType::UnsignedByte, &mut out);
    assert_eq!(&out[..3], &[255, 0, 0]);
}

#[test]
fn alpha_blend_halves_a_half_transparent_source() {
    let t = TestTarget::new(2, 2);
    {
        let mut ctx = t.ctx.borrow_mut();
        ctx.clear_color(0, 0, 0, 255);
        ctx.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
        ctx.enable(StateFlags::BLEND);
        ctx.blend_mode(BlendMode::Alpha);
        ctx.begin(DrawMode::Quads);
        ctx.color4ub(255, 0, 0, 128);
        ctx.vertex2f(-1.0, -1.0);
        ctx.vertex2f(1.0, -1.0);
        ctx.vertex2f(1.0, 1.0);
        ctx.vertex2f(-1.0, 1.0);
        ctx.end();
    }
    // (129*255 + 127*0) >> 8 = 128 on the red channel.
    let px = t.pixel(0, 0);
    assert_eq!(px[0], 128);
    assert_eq!(px[1], 0);
    assert_eq!(px[2], 0);
    assert_eq!(px[3], 255);
}

#[test]
fn repeat_nearest_sampling_wraps_whole_periods() {
    let t = TestTarget::new(2, 2);
    let mut ctx = t.ctx.borrow_mut();
    let tex = ctx
        .gen_texture_buffer(2, 2, PixelFormat::Rgba, DataType::UnsignedByte)
        .unwrap();
    ctx.set_texture_pixel(&tex, 0, 0, rgba(0, 0, 0, 255));
    ctx.set_texture_pixel(&tex, 1, 0, rgba(255, 255, 255, 255));
    ctx.set_texture_pixel(&tex, 0, 1, rgba(255, 255, 255, 255));
    ctx.set_texture_pixel(&tex, 1, 1, rgba(0, 0, 0, 255));

    let wrapped = tex.borrow().sample(1.5, 0.5);
    let base = tex.borrow().sample(0.5, 0.5);
    assert_eq!(wrapped, base);
    assert_eq!(wrapped, rgba(0, 0, 0, 255));
}

#[test]
fn back_face_culling_drops_clockwise_triangles() {
    let draw = |ctx: &mut Context| {
        ctx.begin(DrawMode::Triangles);
        ctx.color3ub(255, 255, 255);
        ctx.vertex2f(-1.0, -1.0);
        ctx.vertex2f(-1.0, 1.0);
        ctx.vertex2f(1.0, -1.0);
        ctx.end();
    };

    let t = TestTarget::new(4, 4);
    {
        let mut ctx = t.ctx.borrow_mut();
        ctx.enable(StateFlags::CULL_FACE);
        ctx.cull_face(Face::Back);
        draw(&mut ctx);
    }
    for y in 0..4 {
        for x in 0..4 {
            assert_eq!(t.pixel(x, y), [0, 0, 0, 0], "culled draw wrote ({}, {})", x, y);
        }
    }

    {
        let mut ctx = t.ctx.borrow_mut();
        ctx.cull_face(Face::Front);
        draw(&mut ctx);
    }
    let touched = (0..4)
        .flat_map(|y| (0..4).map(move |x| (x, y)))
        .filter(|&(x, y)| t.pixel(x, y) != [0, 0, 0, 0])
        .count();
    assert!(touched > 0, "front culling should leave the back face visible");
}

#[test]
fn textured_quad_modulates_with_vertex_color() {
    let t = TestTarget::new(4, 4);
    {
        let mut ctx = t.ctx.borrow_mut();
        let tex = ctx
            .gen_texture_buffer(1, 1, PixelFormat::Rgba, DataType::UnsignedByte)
            .unwrap();
        ctx.set_texture_pixel(&tex, 0, 0, rgba(255, 128, 0, 255));
        ctx.enable(StateFlags::TEXTURE_2D);
        ctx.bind_texture(Some(&tex));
        ctx.begin(DrawMode::Quads);
        ctx.color3ub(255, 255, 255);
        ctx.texcoord2f(0.0, 0.0);
        ctx.vertex2f(-1.0, -1.0);
        ctx.texcoord2f(1.0, 0.0);
        ctx.vertex2f(1.0, -1.0);
        ctx.texcoord2f(1.0, 1.0);
        ctx.vertex2f(1.0, 1.0);
        ctx.texcoord2f(0.0, 1.0);
        ctx.vertex2f(-1.0, 1.0);
        ctx.end();
    }
    assert!(close_to(t.pixel(1, 1), [255, 128, 0, 255], 4), "{:?}", t.pixel(1, 1));
}

#[test]
fn perspective_triangle_renders_inside_frustum() {
    let t = TestTarget::new(16, 16);
    {
        let mut ctx = t.ctx.borrow_mut();
        ctx.matrix_mode(MatrixMode::Projection);
        ctx.perspective(std::f64::consts::FRAC_PI_3, 1.0, 0.1, 100.0);
        ctx.matrix_mode(MatrixMode::ModelView);
        ctx.translate(0.0, 0.0, -2.0);
        ctx.begin(DrawMode::Triangles);
        ctx.color3ub(0, 255, 0);
        ctx.vertex3f(-1.0, -1.0, 0.0);
        ctx.vertex3f(1.0, -1.0, 0.0);
        ctx.vertex3f(0.0, 1.0, 0.0);
        ctx.end();
    }
    // Centre of the screen is inside the triangle.
    let centre = t.pixel(8, 9);
    assert!(close_to(centre, [0, 255, 0, 255], 8), "{:?}", centre);
    // The far corners are not.
    assert_eq!(t.pixel(0, 0), [0, 0, 0, 0]);
    assert_eq!(t.pixel(15, 0), [0, 0, 0, 0]);
}

#[test]
fn triangle_straddling_the_near_plane_is_clipped_not_dropped() {
    let t = TestTarget::new(16, 16);
    {
        let mut ctx = t.ctx.borrow_mut();
        ctx.matrix_mode(MatrixMode::Projection);
        ctx.perspective(std::f64::consts::FRAC_PI_3, 1.0, 0.5, 100.0);
        ctx.matrix_mode(MatrixMode::ModelView);
        ctx.begin(DrawMode::Triangles);
        ctx.color3ub(255, 0, 255);
        // One vertex behind the eye.
        ctx.vertex3f(0.0, -0.5, 1.0);
        ctx.vertex3f(-2.0, -0.5, -4.0);
        ctx.vertex3f(2.0, -0.5, -4.0);
        ctx.end();
    }
    let touched = (0..16)
        .flat_map(|y| (0..16).map(move |x| (x, y)))
        .filter(|&(x, y)| t.pixel(x, y) != [0, 0, 0, 0])
        .count();
    assert!(touched > 0, "clipped triangle should still rasterize partially");
}

#[test]
fn thick_line_covers_more_pixels_than_thin() {
    let count = |width: f32| {
        let t = TestTarget::new(16, 16);
        {
            let mut ctx = t.ctx.borrow_mut();
            ctx.line_width(width);
            ctx.begin(DrawMode::Lines);
            ctx.color3ub(255, 255, 255);
            ctx.vertex2f(-0.9, 0.0);
            ctx.vertex2f(0.9, 0.0);
            ctx.end();
        }
        (0..16)
            .flat_map(|y| (0..16).map(move |x| (x, y)))
            .filter(|&(x, y)| t.pixel(x, y) != [0, 0, 0, 0])
            .count()
    };
    let thin = count(1.0);
    let thick = count(4.0);
    assert!(thin > 0);
    assert!(thick > 2 * thin, "thin = {}, thick = {}", thin, thick);
}

#[test]
fn points_of_size_one_and_larger() {
    let t = TestTarget::new(9, 9);
    {
        let mut ctx = t.ctx.borrow_mut();
        ctx.begin(DrawMode::Points);
        ctx.color3ub(255, 255, 255);
        ctx.vertex2f(0.0, 0.0);
        ctx.end();
    }
    let single = (0..9)
        .flat_map(|y| (0..9).map(move |x| (x, y)))
        .filter(|&(x, y)| t.pixel(x, y) != [0, 0, 0, 0])
        .count();
    assert_eq!(single, 1);

    {
        let mut ctx = t.ctx.borrow_mut();
        ctx.point_size(5.0);
        ctx.begin(DrawMode::Points);
        ctx.vertex2f(0.0, 0.0);
        ctx.end();
    }
    let disk = (0..9)
        .flat_map(|y| (0..9).map(move |x| (x, y)))
        .filter(|&(x, y)| t.pixel(x, y) != [0, 0, 0, 0])
        .count();
    assert!(disk > 9, "disk covered {} pixels", disk);
}

#[test]
fn flat_shading_uses_dominant_vertex_color() {
    let t = TestTarget::new(8, 8);
    {
        let mut ctx = t.ctx.borrow_mut();
        ctx.shade_model(ShadeModel::Flat);
        ctx.begin(DrawMode::Triangles);
        ctx.color3ub(255, 0, 0);
        ctx.vertex2f(-1.0, -1.0);
        ctx.color3ub(0, 255, 0);
        ctx.vertex2f(1.0, -1.0);
        ctx.color3ub(0, 0, 255);
        ctx.vertex2f(-1.0, 1.0);
        ctx.end();
    }
    // Every covered pixel is exactly one of the three vertex colors.
    for y in 0..8 {
        for x in 0..8 {
            let px = t.pixel(x, y);
            if px != [0, 0, 0, 0] {
                assert!(
                    px == [255, 0, 0, 255] || px == [0, 255, 0, 255] || px == [0, 0, 255, 255],
                    "interpolated color {:?} under flat shading",
                    px
                );
            }
        }
    }
}

#[test]
fn lighting_darkens_a_face_turned_away() {
    let render_with_normal = |nz: f32| {
        let t = TestTarget::new(8, 8);
        {
            let mut ctx = t.ctx.borrow_mut();
            ctx.enable(StateFlags::LIGHTING);
            ctx.enable_light(0);
            ctx.lightfv(0, LightParam::Position, &[0.0, 0.0, 5.0]);
            ctx.begin(DrawMode::Triangles);
            ctx.color3ub(200, 200, 200);
            ctx.normal3f(0.0, 0.0, nz);
            // w != 1 forces the 3D (lit) triangle route.
            ctx.vertex4f(-1.0, -1.0, 0.0, 1.0001);
            ctx.vertex4f(1.0, -1.0, 0.0, 1.0001);
            ctx.vertex4f(-1.0, 1.0, 0.0, 1.0001);
            ctx.end();
        }
        t.pixel(1, 6)
    };
    let lit = render_with_normal(1.0);
    let unlit = render_with_normal(-1.0);
    assert!(lit[0] > unlit[0], "lit = {:?}, unlit = {:?}", lit, unlit);
}

#[test]
fn fog_fades_distant_fragments_toward_fog_color() {
    let t = TestTarget::new(4, 4);
    {
        let mut ctx = t.ctx.borrow_mut();
        ctx.enable(StateFlags::FOG);
        ctx.fogi(FogParam::Mode, 0); // linear
        ctx.fogf(FogParam::Start, 0.0);
        ctx.fogf(FogParam::End, 1.0);
        ctx.fogfv(FogParam::Color, &[0.0, 0.0, 1.0, 1.0]);
        full_viewport_quad(&mut ctx, [255, 0, 0], 1.0);
    }
    // At the fog end distance the fragment is fully fog colored.
    assert_eq!(&t.pixel(1, 1)[..3], &[0, 0, 255]);
}
