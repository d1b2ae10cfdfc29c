//! Render lists: capture and replay of draw commands.
//!
//! While a list records, the immediate-mode verbs append to it instead of
//! driving the pipeline; matrix and state verbs keep mutating the context
//! directly. Opening and replaying a list save the latch/material state
//! around the operation so neither leaves lasting side effects.

use crate::color::Color;
use crate::context::{Context, ContextBackup, DrawMode};
use crate::error::ErrorCode;
use crate::light::Material;
use crate::math::{Vec2, Vec3, Vec4};
use crate::texture::TextureHandle;
use std::cell::RefCell;
use std::rc::Rc;

/// One captured draw: the state it ran under plus four parallel
/// attribute sequences (always the same length).
pub struct DrawCall {
    pub face_materials: [Material; 2],
    pub texture: Option<TextureHandle>,
    pub draw_mode: DrawMode,
    pub positions: Vec<Vec4>,
    pub texcoords: Vec<Vec2>,
    pub normals: Vec<Vec3>,
    pub colors: Vec<Color>,
}

/// An ordered sequence of captured draw calls.
#[derive(Default)]
pub struct RenderList {
    pub(crate) calls: Vec<DrawCall>,
}

impl RenderList {
    pub(crate) fn begin_call(
        &mut self,
        face_materials: [Material; 2],
        texture: Option<TextureHandle>,
        draw_mode: DrawMode,
    ) {
        self.calls.push(DrawCall {
            face_materials,
            texture,
            draw_mode,
            positions: Vec::new(),
            texcoords: Vec::new(),
            normals: Vec::new(),
            colors: Vec::new(),
        });
    }

    pub(crate) fn append_vertex(
        &mut self,
        position: Vec4,
        texcoord: Vec2,
        normal: Vec3,
        color: Color,
    ) -> bool {
        match self.calls.last_mut() {
            Some(call) => {
                call.positions.push(position);
                call.texcoords.push(texcoord);
                call.normals.push(normal);
                call.colors.push(color);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// The captured calls, in submission order.
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }
}

/// Shared handle to a render list, as returned by `gen_list`.
#[derive(Clone)]
pub struct ListHandle(pub(crate) Rc<RefCell<RenderList>>);

impl ListHandle {
    pub fn borrow(&self) -> std::cell::Ref<'_, RenderList> {
        self.0.borrow()
    }

    pub(crate) fn borrow_mut(&self) -> std::cell::RefMut<'_, RenderList> {
        self.0.borrow_mut()
    }

    fn ptr_eq(&self, other: &ListHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Context {
    /// Allocates an empty render list.
    pub fn gen_list(&mut self) -> ListHandle {
        ListHandle(Rc::new(RefCell::new(RenderList::default())))
    }

    /// Drops the captured calls of a list; ends recording when the list
    /// was the one being recorded.
    pub fn delete_list(&mut self, list: &ListHandle) {
        if self.recording.as_ref().map_or(false, |r| r.ptr_eq(list)) {
            self.recording = None;
            if let Some(backup) = self.backup.take() {
                self.restore_backup(backup);
            }
        }
        list.borrow_mut().calls.clear();
    }

    /// Starts recording into `list`, reinitializing it. Nested recording
    /// is not supported.
    pub fn new_list(&mut self, list: &ListHandle) {
        if self.recording.is_some() {
            return self.record_error(ErrorCode::InvalidOperation);
        }
        list.borrow_mut().calls.clear();
        self.backup = Some(self.make_backup());
        self.recording = Some(list.clone());
    }

    /// Closes the recording and restores the saved latch state.
    pub fn end_list(&mut self) {
        if self.recording.is_none() {
            self.record_error(ErrorCode::InvalidOperation);
        }
        self.recording = None;
        if let Some(backup) = self.backup.take() {
            self.restore_backup(backup);
        }
    }

    /// Replays a captured list against the current pipeline state.
    pub fn call_list(&mut self, list: &ListHandle) {
        let backup = self.make_backup();

        let count = list.borrow().calls.len();
        for i in 0..count {
            // Pull the call's data out under a short borrow so the draw
            // itself does not hold the list locked.
            let (materials, texture, mode, vertices) = {
                let guard = list.borrow();
                let call = &guard.calls[i];
                let vertices: Vec<_> = call
                    .positions
                    .iter()
                    .zip(call.texcoords.iter())
                    .zip(call.normals.iter())
                    .zip(call.colors.iter())
                    .map(|(((p, t), n), c)| (*p, *t, *n, *c))
                    .collect();
                (call.face_materials, call.texture.clone(), call.draw_mode, vertices)
            };

            self.face_materials = materials;
            self.bind_texture(texture.as_ref());
            self.begin(mode);
            for (position, texcoord, normal, color) in vertices {
                self.current_color = color;
                self.apply_color_material();
                self.current_texcoord = texcoord;
                self.current_normal = normal;
                self.vertex4f(position.x, position.y, position.z, position.w);
            }
            self.end();
        }

        self.restore_backup(backup);
    }

    pub(crate) fn make_backup(&self) -> ContextBackup {
        ContextBackup {
            face_materials: self.face_materials,
            current_texcoord: self.current_texcoord,
            current_normal: self.current_normal,
            current_color: self.current_color,
            current_texture: self.current_texture.clone(),
            state: self.state,
        }
    }

    pub(crate) fn restore_backup(&mut self, backup: ContextBackup) {
        self.face_materials = backup.face_materials;
        self.current_texcoord = backup.current_texcoord;
        self.current_normal = backup.current_normal;
        self.current_color = backup.current_color;
        self.current_texture = backup.current_texture;
        self.state = backup.state;
    }
}
