//! Matrix stacks and the matrix verbs.
//!
//! Three independent bounded stacks (projection, model-view, texture) of
//! column-major matrices. The composed model-view-projection matrix is
//! cached and recomputed lazily at the next draw after either
//! contributing top changes.

use super::Context;
use crate::error::ErrorCode;
use crate::math::{Mat4, Vec3};

pub const PROJECTION_STACK_DEPTH: usize = 32;
pub const MODELVIEW_STACK_DEPTH: usize = 32;
pub const TEXTURE_STACK_DEPTH: usize = 8;

/// Stack selector for [`Context::matrix_mode`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MatrixMode {
    ModelView,
    Projection,
    Texture,
}

/// Fixed-depth matrix stack with a top-of-stack index; overflow is an
/// error, not a grow event.
pub struct MatrixStack<const N: usize> {
    mats: [Mat4; N],
    top: usize,
}

impl<const N: usize> MatrixStack<N> {
    pub fn new() -> Self {
        MatrixStack {
            mats: [Mat4::IDENTITY; N],
            top: 0,
        }
    }

    #[inline]
    pub fn top(&self) -> &Mat4 {
        &self.mats[self.top]
    }

    #[inline]
    pub fn top_mut(&mut self) -> &mut Mat4 {
        &mut self.mats[self.top]
    }

    /// Duplicates the top entry.
    pub fn push(&mut self) -> Result<(), ErrorCode> {
        if self.top + 1 >= N {
            return Err(ErrorCode::StackOverflow);
        }
        self.mats[self.top + 1] = self.mats[self.top];
        self.top += 1;
        Ok(())
    }

    /// Discards the top entry.
    pub fn pop(&mut self) -> Result<(), ErrorCode> {
        if self.top == 0 {
            return Err(ErrorCode::StackUnderflow);
        }
        self.top -= 1;
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.top + 1
    }
}

impl<const N: usize> Default for MatrixStack<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn matrix_mode(&mut self, mode: MatrixMode) {
        self.matrix_mode = mode;
    }

    pub fn push_matrix(&mut self) {
        let result = match self.matrix_mode {
            MatrixMode::ModelView => self.stack_modelview.push(),
            MatrixMode::Projection => self.stack_projection.push(),
            MatrixMode::Texture => self.stack_texture.push(),
        };
        if let Err(code) = result {
            self.record_error(code);
        }
    }

    pub fn pop_matrix(&mut self) {
        let result = match self.matrix_mode {
            MatrixMode::ModelView => self.stack_modelview.pop(),
            MatrixMode::Projection => self.stack_projection.pop(),
            MatrixMode::Texture => self.stack_texture.pop(),
        };
        match result {
            Err(code) => self.record_error(code),
            Ok(()) => self.mark_transform_dirty(),
        }
    }

    /// Applies `f` to the top of the current stack and invalidates the
    /// cached MVP when a contributing stack changed.
    fn mutate_top(&mut self, f: impl FnOnce(&mut Mat4)) {
        match self.matrix_mode {
            MatrixMode::ModelView => f(self.stack_modelview.top_mut()),
            MatrixMode::Projection => f(self.stack_projection.top_mut()),
            MatrixMode::Texture => {
                f(self.stack_texture.top_mut());
                return;
            }
        }
        self.mvp_dirty = true;
    }

    fn mark_transform_dirty(&mut self) {
        if self.matrix_mode != MatrixMode::Texture {
            self.mvp_dirty = true;
        }
    }

    pub fn load_identity(&mut self) {
        self.mutate_top(|m| *m = Mat4::IDENTITY);
    }

    /// Post-multiplies a translation; the offset is in local space.
    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.mutate_top(|m| *m = *m * Mat4::translation(x, y, z));
    }

    /// Post-multiplies a rotation of `angle` radians around `axis`.
    pub fn rotate(&mut self, angle: f32, axis: Vec3) {
        self.mutate_top(|m| *m = *m * Mat4::rotation(angle, axis));
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.mutate_top(|m| *m = *m * Mat4::scaling(x, y, z));
    }

    pub fn mult_matrix(&mut self, mat: &Mat4) {
        self.mutate_top(|m| *m = *m * *mat);
    }

    pub fn frustum(&mut self, left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) {
        self.mutate_top(|m| *m = *m * Mat4::frustum(left, right, bottom, top, near, far));
    }

    pub fn ortho(&mut self, left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) {
        self.mutate_top(|m| *m = *m * Mat4::ortho(left, right, bottom, top, near, far));
    }

    /// Symmetric perspective, derived from `frustum`.
    pub fn perspective(&mut self, fovy: f64, aspect: f64, near: f64, far: f64) {
        self.mutate_top(|m| *m = *m * Mat4::perspective(fovy, aspect, near, far));
    }

    //----------------------------------------------------------------------------------------------
    // Cached transforms

    /// Recomputes the cached MVP if a contributing top changed since the
    /// last draw.
    pub(crate) fn update_mvp(&mut self) {
        if self.mvp_dirty {
            self.mat_mvp = *self.stack_projection.top() * *self.stack_modelview.top();
            self.mvp_dirty = false;
        }
    }

    /// Normal matrix: inverse-transpose of the model-view top. Computed
    /// on demand when lighting runs.
    pub(crate) fn normal_matrix(&self) -> Mat4 {
        self.stack_modelview.top().inverse().transpose()
    }

    /// Eye position for lighting, recovered from the model-view inverse.
    pub(crate) fn view_position(&self) -> Vec3 {
        self.stack_modelview.top().inverse().translation_part()
    }

    pub(crate) fn texture_matrix(&self) -> &Mat4 {
        self.stack_texture.top()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::test_context;
    use crate::math::vec3;

    #[test]
    fn push_pop_restores_top_exactly() {
        let (ctx, _buf) = test_context(2, 2);
        let mut ctx = ctx.borrow_mut();
        ctx.translate(1.0, 2.0, 3.0);
        let before = *ctx.stack_modelview.top();
        ctx.push_matrix();
        ctx.rotate(0.5, vec3(0.0, 1.0, 0.0));
        ctx.scale(2.0, 2.0, 2.0);
        ctx.pop_matrix();
        assert_eq!(before.0, ctx.stack_modelview.top().0);
    }

    #[test]
    fn stack_limits_report_errors() {
        let (ctx, _buf) = test_context(2, 2);
        let mut ctx = ctx.borrow_mut();
        ctx.matrix_mode(MatrixMode::Texture);
        for _ in 0..TEXTURE_STACK_DEPTH {
            ctx.push_matrix();
        }
        assert_eq!(ctx.get_error(), crate::error::ErrorCode::StackOverflow);
        for _ in 0..TEXTURE_STACK_DEPTH {
            ctx.pop_matrix();
        }
        assert_eq!(ctx.get_error(), crate::error::ErrorCode::StackUnderflow);
    }

    #[test]
    fn mvp_cache_tracks_both_stacks() {
        let (ctx, _buf) = test_context(2, 2);
        let mut ctx = ctx.borrow_mut();
        ctx.translate(1.0, 0.0, 0.0);
        ctx.update_mvp();
        let first = ctx.mat_mvp;
        ctx.matrix_mode(MatrixMode::Projection);
        ctx.ortho(-1.0, 1.0, -1.0, 1.0, -1.0, 1.0);
        ctx.update_mvp();
        assert_ne!(first.0, ctx.mat_mvp.0);
    }

    #[test]
    fn texture_matrix_does_not_touch_mvp() {
        let (ctx, _buf) = test_context(2, 2);
        let mut ctx = ctx.borrow_mut();
        ctx.update_mvp();
        ctx.matrix_mode(MatrixMode::Texture);
        ctx.translate(0.5, 0.5, 0.0);
        assert!(!ctx.mvp_dirty);
    }
}
