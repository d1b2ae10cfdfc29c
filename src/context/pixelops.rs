//! Raster-position pixel transfers and whole-target passes.

use super::{Context, StateFlags};
use crate::codec;
use crate::color::Color;
use crate::error::ErrorCode;
use crate::format::{DataType, PixelFormat, PixelLayout};
use crate::framebuffer::Framebuffer;
use crate::math::{vec2, vec4};

impl Context {
    pub fn pixel_zoom(&mut self, x_factor: f32, y_factor: f32) {
        if x_factor == 0.0 || y_factor == 0.0 {
            return self.record_error(ErrorCode::InvalidValue);
        }
        self.pixel_zoom = vec2(x_factor, y_factor);
    }

    //----------------------------------------------------------------------------------------------
    // Raster position

    pub fn raster_pos2i(&mut self, x: i32, y: i32) {
        self.raster_pos = vec4(x as f32, y as f32, 0.0, 1.0);
    }

    pub fn raster_pos2f(&mut self, x: f32, y: f32) {
        self.raster_pos = vec4(x, y, 0.0, 1.0);
    }

    pub fn raster_pos2fv(&mut self, v: &[f32; 2]) {
        self.raster_pos2f(v[0], v[1]);
    }

    pub fn raster_pos3i(&mut self, x: i32, y: i32, z: i32) {
        self.raster_pos = vec4(x as f32, y as f32, z as f32, 1.0);
    }

    pub fn raster_pos3f(&mut self, x: f32, y: f32, z: f32) {
        self.raster_pos = vec4(x, y, z, 1.0);
    }

    pub fn raster_pos3fv(&mut self, v: &[f32; 3]) {
        self.raster_pos3f(v[0], v[1], v[2]);
    }

    pub fn raster_pos4i(&mut self, x: i32, y: i32, z: i32, w: i32) {
        self.raster_pos = vec4(x as f32, y as f32, z as f32, w as f32);
    }

    pub fn raster_pos4f(&mut self, x: f32, y: f32, z: f32, w: f32) {
        self.raster_pos = vec4(x, y, z, w);
    }

    pub fn raster_pos4fv(&mut self, v: &[f32; 4]) {
        self.raster_pos4f(v[0], v[1], v[2], v[3]);
    }

    //----------------------------------------------------------------------------------------------
    // Pixel transfers

    /// Writes a `width * height` rectangle of packed pixels at the
    /// projected raster position, scaled by the pixel zoom factors.
    /// Every covered destination pixel takes the raster depth, guarded
    /// by the depth test when enabled.
    pub fn draw_pixels(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
        data_type: DataType,
        pixels: &[u8],
    ) {
        let src_layout = match PixelLayout::new(format, data_type) {
            Ok(l) => l,
            Err(code) => return self.record_error(code),
        };
        if pixels.len() < width as usize * height as usize * src_layout.bytes_per_pixel() {
            return self.record_error(ErrorCode::InvalidValue);
        }

        self.update_mvp();
        let raster = self.mat_mvp.transform(vec4(
            self.raster_pos.x,
            self.raster_pos.y,
            self.raster_pos.z,
            1.0,
        ));
        let x_screen = self.vp_pos[0] as f32 + (raster.x + 1.0) * 0.5 * self.vp_dim[0] as f32;
        let y_screen = self.vp_pos[1] as f32 + (1.0 - raster.y) * 0.5 * self.vp_dim[1] as f32;
        let z = raster.z;

        let zoom = self.pixel_zoom;
        let depth_test = self.state.contains(StateFlags::DEPTH_TEST);
        let blend = self
            .state
            .contains(StateFlags::BLEND)
            .then(|| self.blend_mode);
        let depth_mode = self.depth_mode;

        let run = |fb: &mut Framebuffer| {
            let (w_dst, h_dst) = (fb.width() as i32, fb.height() as i32);
            let (tex, depth_buf) = fb.parts_mut();
            let dst_layout = tex.layout();
            let dst_pixels = tex.pixel_bytes_mut();

            // Shrinking zooms step the source more than once per
            // destination pixel; growing zooms replicate.
            let x_src_inc = if zoom.x.abs() < 1.0 { 1.0 / zoom.x.abs() } else { 1.0 };
            let y_src_inc = if zoom.y.abs() < 1.0 { 1.0 / zoom.y.abs() } else { 1.0 };

            let mut y_src = 0.0f32;
            while y_src < height as f32 {
                let y_dst_min = y_screen + y_src * zoom.y;
                let y_dst_max = y_dst_min + zoom.y;

                let mut x_src = 0.0f32;
                while x_src < width as f32 {
                    let src_offset = y_src as usize * width as usize + x_src as usize;
                    let x_dst_min = x_screen + x_src * zoom.x;
                    let x_dst_max = x_dst_min + zoom.x;

                    let mut y_dst = y_dst_min;
                    while y_dst < y_dst_max {
                        let mut x_dst = x_dst_min;
                        while x_dst < x_dst_max {
                            let (xi, yi) = (x_dst as i32, y_dst as i32);
                            if xi >= 0 && xi < w_dst && yi >= 0 && yi < h_dst {
                                let dst_offset = (yi * w_dst + xi) as usize;
                                if !depth_test || depth_mode.test(z, depth_buf[dst_offset]) {
                                    let mut color =
                                        codec::get_pixel(src_layout, pixels, src_offset);
                                    if let Some(mode) = blend {
                                        let dst =
                                            codec::get_pixel(dst_layout, dst_pixels, dst_offset);
                                        color = mode.apply(color, dst);
                                    }
                                    codec::set_pixel(dst_layout, dst_pixels, dst_offset, color);
                                    depth_buf[dst_offset] = z;
                                }
                            }
                            x_dst += 1.0;
                        }
                        y_dst += 1.0;
                    }
                    x_src += x_src_inc;
                }
                y_src += y_src_inc;
            }
        };

        match self.target_handle() {
            Some(h) => run(&mut h.borrow_mut()),
            None => run(&mut self.main_framebuffer),
        }
    }

    /// Reads a rectangle of the current target, converting into the
    /// requested packed layout.
    pub fn read_pixels(
        &mut self,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        format: PixelFormat,
        data_type: DataType,
        pixels: &mut [u8],
    ) {
        let dst_layout = match PixelLayout::new(format, data_type) {
            Ok(l) => l,
            Err(code) => return self.record_error(code),
        };
        if pixels.len() < width as usize * height as usize * dst_layout.bytes_per_pixel() {
            return self.record_error(ErrorCode::InvalidValue);
        }

        let mut run = |fb: &mut Framebuffer| {
            let (w_src, h_src) = (fb.width() as i32, fb.height() as i32);
            for row in 0..height as i32 {
                for col in 0..width as i32 {
                    let sx = (x + col).clamp(0, w_src - 1) as u32;
                    let sy = (y + row).clamp(0, h_src - 1) as u32;
                    let color = fb.get_pixel(sx, sy);
                    let dst_offset = (row * width as i32 + col) as usize;
                    codec::set_pixel(dst_layout, pixels, dst_offset, color);
                }
            }
        };

        match self.target_handle() {
            Some(h) => run(&mut h.borrow_mut()),
            None => run(&mut self.main_framebuffer),
        }
    }

    //----------------------------------------------------------------------------------------------
    // Whole-target passes

    /// Runs `f` over every pixel of the current target with its stored
    /// depth, writing the returned color back.
    pub fn post_process(&mut self, mut f: impl FnMut(i32, i32, f32, Color) -> Color) {
        let mut run = |fb: &mut Framebuffer| {
            let width = fb.width() as i32;
            let height = fb.height() as i32;
            let (tex, depth_buf) = fb.parts_mut();
            let layout = tex.layout();
            let pixels = tex.pixel_bytes_mut();
            for y in 0..height {
                for x in 0..width {
                    let offset = (y * width + x) as usize;
                    let color = codec::get_pixel(layout, pixels, offset);
                    let out = f(x, y, depth_buf[offset], color);
                    if out != color {
                        codec::set_pixel(layout, pixels, offset, out);
                    }
                }
            }
        };
        match self.target_handle() {
            Some(h) => run(&mut h.borrow_mut()),
            None => run(&mut self.main_framebuffer),
        }
    }

    /// Applies the fog equation to every pixel of the current target
    /// using its stored depth. Background pixels (cleared depth) are
    /// untouched.
    pub fn fog_process(&mut self) {
        let fog = self.fog;
        self.post_process(|_x, _y, depth, color| fog.apply(color, depth));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::test_context;
    use crate::context::ClearFlags;

    #[test]
    fn draw_pixels_copies_rect_at_raster_pos() {
        let (ctx, buf) = test_context(4, 4);
        {
            let mut ctx = ctx.borrow_mut();
            // Identity transforms: raster pos (-1, 1) lands at the top
            // left corner.
            ctx.raster_pos2f(-1.0, 1.0);
            let src = [255u8, 0, 0, 255, 0, 255, 0, 255];
            ctx.draw_pixels(2, 1, PixelFormat::Rgba, DataType::UnsignedByte, &src);
        }
        assert_eq!(&buf[0..4], &[255, 0, 0, 255]);
        assert_eq!(&buf[4..8], &[0, 255, 0, 255]);
    }

    #[test]
    fn read_pixels_roundtrips_clear_color() {
        let (ctx, _buf) = test_context(2, 2);
        let mut ctx = ctx.borrow_mut();
        ctx.clear_color(9, 8, 7, 255);
        ctx.clear(ClearFlags::COLOR);
        let mut out = vec![0u8; 2 * 2 * 4];
        ctx.read_pixels(0, 0, 2, 2, PixelFormat::Rgba, DataType::UnsignedByte, &mut out);
        assert_eq!(&out[..4], &[9, 8, 7, 255]);
    }

    #[test]
    fn post_process_sees_coordinates_and_rewrites() {
        let (ctx, buf) = test_context(2, 1);
        {
            let mut ctx = ctx.borrow_mut();
            ctx.post_process(|x, _y, _z, mut c| {
                c.r = 10 * (x as u8 + 1);
                c.a = 255;
                c
            });
        }
        assert_eq!(buf[0], 10);
        assert_eq!(buf[4], 20);
    }
}
