//! Immediate-mode verbs and vertex-array draws.
//!
//! `begin`/`vertex...`/`end` accumulate vertices into the six-slot
//! primitive buffer; a full window drains into the geometry pipeline.
//! While a render list records, the same verbs append to the list
//! instead.

use super::{Context, DrawMode, StateFlags};
use crate::color::{rgba, Color};
use crate::error::ErrorCode;
use crate::math::{vec2, vec4, Vec4};
use crate::pipeline;
use crate::vertex::{ArrayType, AttribArray, IndexType, Vertex};

impl Context {
    //----------------------------------------------------------------------------------------------
    // Begin / end

    pub fn begin(&mut self, mode: DrawMode) {
        if self.current_draw_mode.is_some() {
            return self.record_error(ErrorCode::InvalidOperation);
        }
        if let Some(list) = self.recording.clone() {
            list.borrow_mut()
                .begin_call(self.face_materials, self.current_texture.clone(), mode);
        }
        self.current_draw_mode = Some(mode);
        self.vertex_counter = 0;
    }

    pub fn end(&mut self) {
        if self.current_draw_mode.is_none() {
            self.record_error(ErrorCode::InvalidOperation);
        }
        self.current_draw_mode = None;
        self.vertex_counter = 0;
    }

    //----------------------------------------------------------------------------------------------
    // Vertex entry

    /// The single funnel every vertex verb ends in.
    pub fn vertex4f(&mut self, x: f32, y: f32, z: f32, w: f32) {
        let position = vec4(x, y, z, w);

        if let Some(list) = self.recording.clone() {
            let appended = list.borrow_mut().append_vertex(
                position,
                self.current_texcoord,
                self.current_normal,
                self.current_color,
            );
            if !appended {
                self.record_error(ErrorCode::InvalidOperation);
            }
            return;
        }

        let mode = match self.current_draw_mode {
            Some(mode) => mode,
            None => return self.record_error(ErrorCode::InvalidOperation),
        };

        // Texture coordinates pass through the texture matrix here, so
        // clipping interpolates post-transform values.
        let tc = self.texture_matrix().transform(vec4(
            self.current_texcoord.x,
            self.current_texcoord.y,
            0.0,
            1.0,
        ));

        self.vertex_buffer[self.vertex_counter] = Vertex {
            position,
            homogeneous: position,
            screen: vec2(0.0, 0.0),
            normal: self.current_normal,
            texcoord: vec2(tc.x, tc.y),
            color: self.current_color,
        };
        self.vertex_counter += 1;

        if self.vertex_counter == mode.vertex_window() {
            self.update_mvp();
            self.vertex_counter = 0;
            pipeline::process_and_rasterize(self, mode);
        }
    }

    pub fn vertex2i(&mut self, x: i32, y: i32) {
        self.vertex4f(x as f32, y as f32, 0.0, 1.0);
    }

    pub fn vertex2f(&mut self, x: f32, y: f32) {
        self.vertex4f(x, y, 0.0, 1.0);
    }

    pub fn vertex2fv(&mut self, v: &[f32; 2]) {
        self.vertex4f(v[0], v[1], 0.0, 1.0);
    }

    pub fn vertex3i(&mut self, x: i32, y: i32, z: i32) {
        self.vertex4f(x as f32, y as f32, z as f32, 1.0);
    }

    pub fn vertex3f(&mut self, x: f32, y: f32, z: f32) {
        self.vertex4f(x, y, z, 1.0);
    }

    pub fn vertex3fv(&mut self, v: &[f32; 3]) {
        self.vertex4f(v[0], v[1], v[2], 1.0);
    }

    pub fn vertex4i(&mut self, x: i32, y: i32, z: i32, w: i32) {
        self.vertex4f(x as f32, y as f32, z as f32, w as f32);
    }

    pub fn vertex4fv(&mut self, v: &[f32; 4]) {
        self.vertex4f(v[0], v[1], v[2], v[3]);
    }

    //----------------------------------------------------------------------------------------------
    // Color latches

    fn set_color(&mut self, color: Color) {
        self.current_color = color;
        self.apply_color_material();
    }

    pub fn color4ub(&mut self, r: u8, g: u8, b: u8, a: u8) {
        self.set_color(rgba(r, g, b, a));
    }

    pub fn color4ubv(&mut self, v: &[u8; 4]) {
        self.color4ub(v[0], v[1], v[2], v[3]);
    }

    pub fn color3ub(&mut self, r: u8, g: u8, b: u8) {
        self.set_color(rgba(r, g, b, 255));
    }

    pub fn color3ubv(&mut self, v: &[u8; 3]) {
        self.color3ub(v[0], v[1], v[2]);
    }

    pub fn color3us(&mut self, r: u16, g: u16, b: u16) {
        self.set_color(rgba((r >> 8) as u8, (g >> 8) as u8, (b >> 8) as u8, 255));
    }

    pub fn color3usv(&mut self, v: &[u16; 3]) {
        self.color3us(v[0], v[1], v[2]);
    }

    pub fn color4us(&mut self, r: u16, g: u16, b: u16, a: u16) {
        self.set_color(rgba(
            (r >> 8) as u8,
            (g >> 8) as u8,
            (b >> 8) as u8,
            (a >> 8) as u8,
        ));
    }

    pub fn color4usv(&mut self, v: &[u16; 4]) {
        self.color4us(v[0], v[1], v[2], v[3]);
    }

    pub fn color3ui(&mut self, r: u32, g: u32, b: u32) {
        self.set_color(rgba((r >> 24) as u8, (g >> 24) as u8, (b >> 24) as u8, 255));
    }

    pub fn color3uiv(&mut self, v: &[u32; 3]) {
        self.color3ui(v[0], v[1], v[2]);
    }

    pub fn color4ui(&mut self, r: u32, g: u32, b: u32, a: u32) {
        self.set_color(rgba(
            (r >> 24) as u8,
            (g >> 24) as u8,
            (b >> 24) as u8,
            (a >> 24) as u8,
        ));
    }

    pub fn color4uiv(&mut self, v: &[u32; 4]) {
        self.color4ui(v[0], v[1], v[2], v[3]);
    }

    pub fn color3f(&mut self, r: f32, g: f32, b: f32) {
        self.set_color(Color::from_normalized([r, g, b, 1.0]));
    }

    pub fn color3fv(&mut self, v: &[f32; 3]) {
        self.color3f(v[0], v[1], v[2]);
    }

    pub fn color4f(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.set_color(Color::from_normalized([r, g, b, a]));
    }

    pub fn color4fv(&mut self, v: &[f32; 4]) {
        self.color4f(v[0], v[1], v[2], v[3]);
    }

    //----------------------------------------------------------------------------------------------
    // Texcoord / normal latches

    pub fn texcoord2f(&mut self, u: f32, v: f32) {
        self.current_texcoord = vec2(u, v);
    }

    pub fn texcoordfv(&mut self, v: &[f32; 2]) {
        self.texcoord2f(v[0], v[1]);
    }

    pub fn normal3f(&mut self, x: f32, y: f32, z: f32) {
        self.current_normal = crate::math::vec3(x, y, z);
    }

    pub fn normal3fv(&mut self, v: &[f32; 3]) {
        self.normal3f(v[0], v[1], v[2]);
    }

    //----------------------------------------------------------------------------------------------
    // Rect helpers

    /// Axis-aligned rectangle, emitted as one immediate-mode quad with
    /// the current latches.
    pub fn rectf(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.begin(DrawMode::Quads);
        self.vertex2f(x1, y1);
        self.vertex2f(x2, y1);
        self.vertex2f(x2, y2);
        self.vertex2f(x1, y2);
        self.end();
    }

    pub fn rectfv(&mut self, v1: &[f32; 2], v2: &[f32; 2]) {
        self.rectf(v1[0], v1[1], v2[0], v2[1]);
    }

    pub fn rects(&mut self, x1: i16, y1: i16, x2: i16, y2: i16) {
        self.rectf(x1 as f32, y1 as f32, x2 as f32, y2 as f32);
    }

    pub fn rectsv(&mut self, v1: &[i16; 2], v2: &[i16; 2]) {
        self.rects(v1[0], v1[1], v2[0], v2[1]);
    }

    //----------------------------------------------------------------------------------------------
    // Vertex arrays

    /// Latches the position array.
    ///
    /// # Safety
    ///
    /// `pointer` must stay valid for `size`-component reads at every
    /// index later passed to `draw_arrays`/`draw_elements`.
    pub unsafe fn vertex_pointer(
        &mut self,
        size: usize,
        data_type: ArrayType,
        stride: usize,
        pointer: *const u8,
    ) {
        if !(2..=4).contains(&size) {
            return self.record_error(ErrorCode::InvalidValue);
        }
        self.vertex_arrays.positions = Some(AttribArray { ptr: pointer, stride, size, data_type });
    }

    /// Latches the normal array (always three components).
    ///
    /// # Safety
    ///
    /// Same contract as [`vertex_pointer`](Self::vertex_pointer).
    pub unsafe fn normal_pointer(
        &mut self,
        data_type: ArrayType,
        stride: usize,
        pointer: *const u8,
    ) {
        self.vertex_arrays.normals = Some(AttribArray { ptr: pointer, stride, size: 3, data_type });
    }

    /// Latches the texture-coordinate array (always two components).
    ///
    /// # Safety
    ///
    /// Same contract as [`vertex_pointer`](Self::vertex_pointer).
    pub unsafe fn texcoord_pointer(
        &mut self,
        data_type: ArrayType,
        stride: usize,
        pointer: *const u8,
    ) {
        self.vertex_arrays.texcoords =
            Some(AttribArray { ptr: pointer, stride, size: 2, data_type });
    }

    /// Latches the color array.
    ///
    /// # Safety
    ///
    /// Same contract as [`vertex_pointer`](Self::vertex_pointer).
    pub unsafe fn color_pointer(
        &mut self,
        size: usize,
        data_type: ArrayType,
        stride: usize,
        pointer: *const u8,
    ) {
        if !(3..=4).contains(&size) {
            return self.record_error(ErrorCode::InvalidValue);
        }
        self.vertex_arrays.colors = Some(AttribArray { ptr: pointer, stride, size, data_type });
    }

    /// Feeds one array element through the latches and the vertex
    /// funnel.
    fn emit_array_vertex(&mut self, positions: AttribArray, index: usize) {
        if self.state.contains(StateFlags::COLOR_ARRAY) {
            if let Some(colors) = self.vertex_arrays.colors {
                let mut channels = [255u8; 4];
                for c in 0..colors.size {
                    channels[c] = unsafe { colors.data_type.fetch_channel(colors.component(index, c)) };
                }
                self.color4ub(channels[0], channels[1], channels[2], channels[3]);
            }
        }
        if self.state.contains(StateFlags::NORMAL_ARRAY) {
            if let Some(normals) = self.vertex_arrays.normals {
                let fetch = |c| unsafe { normals.data_type.fetch(normals.component(index, c)) };
                self.normal3f(fetch(0), fetch(1), fetch(2));
            }
        }
        if self.state.contains(StateFlags::TEXTURE_COORD_ARRAY) {
            if let Some(texcoords) = self.vertex_arrays.texcoords {
                let fetch = |c| unsafe { texcoords.data_type.fetch(texcoords.component(index, c)) };
                self.texcoord2f(fetch(0), fetch(1));
            }
        }

        let mut p: Vec4 = vec4(0.0, 0.0, 0.0, 1.0);
        let fetch = |c| unsafe { positions.data_type.fetch(positions.component(index, c)) };
        p.x = fetch(0);
        p.y = fetch(1);
        if positions.size >= 3 {
            p.z = fetch(2);
        }
        if positions.size == 4 {
            p.w = fetch(3);
        }
        self.vertex4f(p.x, p.y, p.z, p.w);
    }

    /// Draws `count` consecutive array elements starting at `first`.
    pub fn draw_arrays(&mut self, mode: DrawMode, first: usize, count: usize) {
        if !self.state.contains(StateFlags::VERTEX_ARRAY) {
            return self.record_error(ErrorCode::InvalidOperation);
        }
        let positions = match self.vertex_arrays.positions {
            Some(p) => p,
            None => return self.record_error(ErrorCode::InvalidOperation),
        };
        self.begin(mode);
        for i in first..first + count {
            self.emit_array_vertex(positions, i);
        }
        self.end();
    }

    /// Draws `count` indexed array elements.
    ///
    /// # Safety
    ///
    /// `indices` must point to `count` readable indices of `index_type`,
    /// each in bounds of the latched arrays.
    pub unsafe fn draw_elements(
        &mut self,
        mode: DrawMode,
        count: usize,
        index_type: IndexType,
        indices: *const u8,
    ) {
        if !self.state.contains(StateFlags::VERTEX_ARRAY) {
            return self.record_error(ErrorCode::InvalidOperation);
        }
        let positions = match self.vertex_arrays.positions {
            Some(p) => p,
            None => return self.record_error(ErrorCode::InvalidOperation),
        };
        self.begin(mode);
        for i in 0..count {
            let index = index_type.fetch(indices.add(i * index_type.size_of()));
            self.emit_array_vertex(positions, index);
        }
        self.end();
    }
}
