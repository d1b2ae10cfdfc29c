//! State query verbs.
//!
//! One name enum serves the boolean/integer/float/double/pointer getter
//! family; a name a given getter cannot express reports `InvalidEnum`.

use super::{Context, Face, MatrixMode, PolygonMode, ShadeModel};
use crate::blend::BlendMode;
use crate::depth::DepthMode;
use crate::error::ErrorCode;
use crate::light::MAX_LIGHTS;
use crate::vertex::AttribArray;

/// Queryable state names.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GetParam {
    Viewport,
    ColorClearValue,
    DepthClearValue,
    CullFaceMode,
    CurrentColor,
    CurrentNormal,
    CurrentTexcoord,
    CurrentRasterPosition,
    BlendFunc,
    DepthFunc,
    PolygonMode,
    PointSize,
    LineWidth,
    MatrixMode,
    ProjectionMatrix,
    ModelviewMatrix,
    TextureMatrix,
    MaxProjectionStackDepth,
    MaxModelviewStackDepth,
    MaxTextureStackDepth,
    ShadeModel,
    MaxLights,
    VertexArraySize,
    VertexArrayStride,
    VertexArrayType,
    NormalArrayStride,
    NormalArrayType,
    TexcoordArrayStride,
    TexcoordArrayType,
    ColorArraySize,
    ColorArrayStride,
    ColorArrayType,
    ZoomX,
    ZoomY,
}

impl Context {
    pub fn get_booleanv(&mut self, pname: GetParam, params: &mut [bool]) {
        match pname {
            GetParam::CullFaceMode => {
                if let Some(p) = params.get_mut(0) {
                    *p = self.cull_face == Face::Back;
                }
            }
            _ => self.record_error(ErrorCode::InvalidEnum),
        }
    }

    pub fn get_integerv(&mut self, pname: GetParam, params: &mut [i32]) {
        let mut fill = |values: &[i32]| {
            for (dst, src) in params.iter_mut().zip(values) {
                *dst = *src;
            }
        };
        match pname {
            GetParam::Viewport => fill(&[
                self.vp_pos[0],
                self.vp_pos[1],
                self.vp_dim[0] + 1,
                self.vp_dim[1] + 1,
            ]),
            GetParam::ColorClearValue => fill(&[
                self.clear_color.r as i32,
                self.clear_color.g as i32,
                self.clear_color.b as i32,
                self.clear_color.a as i32,
            ]),
            GetParam::CullFaceMode => fill(&[self.cull_face as i32]),
            GetParam::CurrentColor => fill(&[
                self.current_color.r as i32,
                self.current_color.g as i32,
                self.current_color.b as i32,
                self.current_color.a as i32,
            ]),
            GetParam::CurrentRasterPosition => {
                fill(&[self.raster_pos.x as i32, self.raster_pos.y as i32])
            }
            GetParam::BlendFunc => fill(&[match self.blend_mode {
                BlendMode::Average => 0,
                BlendMode::Alpha => 1,
                BlendMode::Additive => 2,
                BlendMode::Subtractive => 3,
                BlendMode::Multiplicative => 4,
                BlendMode::Screen => 5,
                BlendMode::Lighten => 6,
                BlendMode::Darken => 7,
            }]),
            GetParam::DepthFunc => fill(&[match self.depth_mode {
                DepthMode::Equal => 0,
                DepthMode::NotEqual => 1,
                DepthMode::Less => 2,
                DepthMode::LessOrEqual => 3,
                DepthMode::Greater => 4,
                DepthMode::GreaterOrEqual => 5,
            }]),
            GetParam::PolygonMode => fill(&[
                polygon_mode_index(self.polygon_modes[0]),
                polygon_mode_index(self.polygon_modes[1]),
            ]),
            GetParam::PointSize => fill(&[self.point_size as i32]),
            GetParam::LineWidth => fill(&[self.line_width as i32]),
            GetParam::MatrixMode => fill(&[match self.matrix_mode {
                MatrixMode::ModelView => 0,
                MatrixMode::Projection => 1,
                MatrixMode::Texture => 2,
            }]),
            GetParam::MaxProjectionStackDepth => fill(&[super::PROJECTION_STACK_DEPTH as i32]),
            GetParam::MaxModelviewStackDepth => fill(&[super::MODELVIEW_STACK_DEPTH as i32]),
            GetParam::MaxTextureStackDepth => fill(&[super::TEXTURE_STACK_DEPTH as i32]),
            GetParam::ShadeModel => fill(&[match self.shade_model {
                ShadeModel::Flat => 0,
                ShadeModel::Smooth => 1,
            }]),
            GetParam::MaxLights => fill(&[MAX_LIGHTS as i32]),
            GetParam::VertexArraySize => {
                fill(&[self.vertex_arrays.positions.map_or(0, |a| a.size as i32)])
            }
            GetParam::VertexArrayStride => {
                fill(&[self.vertex_arrays.positions.map_or(0, |a| a.stride as i32)])
            }
            GetParam::VertexArrayType => {
                fill(&[self.vertex_arrays.positions.map_or(0, array_type_index)])
            }
            GetParam::NormalArrayStride => {
                fill(&[self.vertex_arrays.normals.map_or(0, |a| a.stride as i32)])
            }
            GetParam::NormalArrayType => {
                fill(&[self.vertex_arrays.normals.map_or(0, array_type_index)])
            }
            GetParam::TexcoordArrayStride => {
                fill(&[self.vertex_arrays.texcoords.map_or(0, |a| a.stride as i32)])
            }
            GetParam::TexcoordArrayType => {
                fill(&[self.vertex_arrays.texcoords.map_or(0, array_type_index)])
            }
            GetParam::ColorArraySize => {
                fill(&[self.vertex_arrays.colors.map_or(0, |a| a.size as i32)])
            }
            GetParam::ColorArrayStride => {
                fill(&[self.vertex_arrays.colors.map_or(0, |a| a.stride as i32)])
            }
            GetParam::ColorArrayType => {
                fill(&[self.vertex_arrays.colors.map_or(0, array_type_index)])
            }
            _ => self.record_error(ErrorCode::InvalidEnum),
        }
    }

    pub fn get_floatv(&mut self, pname: GetParam, params: &mut [f32]) {
        const INV_255: f32 = 1.0 / 255.0;
        let mut fill = |values: &[f32]| {
            for (dst, src) in params.iter_mut().zip(values) {
                *dst = *src;
            }
        };
        match pname {
            GetParam::ColorClearValue => fill(&[
                self.clear_color.r as f32 * INV_255,
                self.clear_color.g as f32 * INV_255,
                self.clear_color.b as f32 * INV_255,
                self.clear_color.a as f32 * INV_255,
            ]),
            GetParam::DepthClearValue => fill(&[self.clear_depth]),
            GetParam::CurrentColor => fill(&[
                self.current_color.r as f32 * INV_255,
                self.current_color.g as f32 * INV_255,
                self.current_color.b as f32 * INV_255,
                self.current_color.a as f32 * INV_255,
            ]),
            GetParam::CurrentNormal => fill(&[
                self.current_normal.x,
                self.current_normal.y,
                self.current_normal.z,
            ]),
            GetParam::CurrentTexcoord => {
                fill(&[self.current_texcoord.x, self.current_texcoord.y])
            }
            GetParam::CurrentRasterPosition => fill(&[
                self.raster_pos.x,
                self.raster_pos.y,
                self.raster_pos.z,
                self.raster_pos.w,
            ]),
            GetParam::PointSize => fill(&[self.point_size]),
            GetParam::LineWidth => fill(&[self.line_width]),
            GetParam::ProjectionMatrix => fill(&self.stack_projection.top().0),
            GetParam::ModelviewMatrix => fill(&self.stack_modelview.top().0),
            GetParam::TextureMatrix => fill(&self.stack_texture.top().0),
            GetParam::ZoomX => fill(&[self.pixel_zoom.x]),
            GetParam::ZoomY => fill(&[self.pixel_zoom.y]),
            _ => self.record_error(ErrorCode::InvalidEnum),
        }
    }

    pub fn get_doublev(&mut self, pname: GetParam, params: &mut [f64]) {
        let mut tmp = [0.0f32; 16];
        let len = params.len().min(16);
        self.get_floatv(pname, &mut tmp[..len]);
        for (dst, src) in params.iter_mut().zip(&tmp[..len]) {
            *dst = *src as f64;
        }
    }

    /// Base pointer of a latched vertex array, null when unset.
    pub fn get_pointerv(&mut self, pname: GetParam) -> *const u8 {
        let slot = |array: Option<AttribArray>| array.map_or(std::ptr::null(), |a| a.ptr);
        match pname {
            GetParam::VertexArrayType => slot(self.vertex_arrays.positions),
            GetParam::NormalArrayType => slot(self.vertex_arrays.normals),
            GetParam::ColorArrayType => slot(self.vertex_arrays.colors),
            GetParam::TexcoordArrayType => slot(self.vertex_arrays.texcoords),
            _ => {
                self.record_error(ErrorCode::InvalidEnum);
                std::ptr::null()
            }
        }
    }
}

fn polygon_mode_index(mode: PolygonMode) -> i32 {
    match mode {
        PolygonMode::Point => 0,
        PolygonMode::Line => 1,
        PolygonMode::Fill => 2,
    }
}

fn array_type_index(array: AttribArray) -> i32 {
    use crate::vertex::ArrayType::*;
    match array.data_type {
        Byte => 0,
        UnsignedByte => 1,
        Short => 2,
        UnsignedShort => 3,
        Int => 4,
        UnsignedInt => 5,
        Float => 6,
        Double => 7,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::test_context;

    #[test]
    fn viewport_roundtrip() {
        let (ctx, _buf) = test_context(8, 4);
        let mut ctx = ctx.borrow_mut();
        ctx.viewport(1, 2, 4, 2);
        let mut vp = [0i32; 4];
        ctx.get_integerv(GetParam::Viewport, &mut vp);
        assert_eq!(vp, [1, 2, 4, 2]);
    }

    #[test]
    fn unknown_name_for_getter_kind_sets_invalid_enum() {
        let (ctx, _buf) = test_context(2, 2);
        let mut ctx = ctx.borrow_mut();
        let mut out = [0.0f32; 4];
        ctx.get_floatv(GetParam::MaxLights, &mut out);
        assert_eq!(ctx.get_error(), ErrorCode::InvalidEnum);
    }

    #[test]
    fn stack_depth_limits_are_reported() {
        let (ctx, _buf) = test_context(2, 2);
        let mut ctx = ctx.borrow_mut();
        let mut out = [0i32];
        ctx.get_integerv(GetParam::MaxProjectionStackDepth, &mut out);
        assert_eq!(out[0], 32);
        ctx.get_integerv(GetParam::MaxTextureStackDepth, &mut out);
        assert_eq!(out[0], 8);
        ctx.get_integerv(GetParam::MaxLights, &mut out);
        assert_eq!(out[0], 8);
    }
}
