//! The per-context state machine.
//!
//! A [`Context`] is the only route by which the pipeline is configured:
//! every API verb is a method that reads or writes exactly one context.
//! Contexts are handed out as cheap reference-counted handles, and a
//! thread-local *current context* slot ([`make_current`]) mirrors the
//! classic immediate-mode model: two threads may drive two different
//! contexts, one context must never be driven from two threads.
//!
//! A verb that encounters a disallowed state records an error code in the
//! context's sticky slot and returns without side effect; the first code
//! is kept until [`Context::get_error`] reads and clears it.

mod getters;
mod immediate;
mod matrix;
mod pixelops;

pub use self::getters::GetParam;
pub use self::matrix::{MatrixMode, MatrixStack, MODELVIEW_STACK_DEPTH, PROJECTION_STACK_DEPTH, TEXTURE_STACK_DEPTH};

use crate::blend::BlendMode;
use crate::color::{rgba, Color};
use crate::depth::DepthMode;
use crate::error::{ErrorCode, Result};
use crate::fog::{Fog, FogMode, FogParam};
use crate::format::{DataType, PixelFormat, PixelLayout};
use crate::framebuffer::{Framebuffer, FramebufferHandle, DEPTH_CLEAR};
use crate::light::{Light, LightParam, Material, MaterialParam, MAX_LIGHTS};
use crate::list::ListHandle;
use crate::math::{Mat4, Vec2, Vec3, Vec4};
use crate::texture::{Pixels, Texture, TextureHandle, TextureParameter};
use crate::vertex::{Vertex, VertexArrays};
use bitflags::bitflags;
use log::{debug, warn};
use std::cell::RefCell;
use std::ptr::NonNull;
use std::rc::Rc;

//--------------------------------------------------------------------------------------------------
// Shared vocabulary

bitflags! {
    /// Context enable bits.
    pub struct StateFlags: u32 {
        const TEXTURE_2D          = 0x0001;
        const FRAMEBUFFER         = 0x0002;
        const BLEND               = 0x0004;
        const DEPTH_TEST          = 0x0008;
        const CULL_FACE           = 0x0010;
        const NORMALIZE           = 0x0020;
        const LIGHTING            = 0x0040;
        const COLOR_MATERIAL      = 0x0080;
        const FOG                 = 0x0100;
        const VERTEX_ARRAY        = 0x0200;
        const NORMAL_ARRAY        = 0x0400;
        const COLOR_ARRAY         = 0x0800;
        const TEXTURE_COORD_ARRAY = 0x1000;
    }
}

bitflags! {
    /// Buffer selection for [`Context::clear`].
    pub struct ClearFlags: u32 {
        const COLOR = 0x01;
        const DEPTH = 0x02;
    }
}

/// Primitive draw mode for `begin` and the array draws.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DrawMode {
    Points,
    Lines,
    Triangles,
    TriangleFan,
    TriangleStrip,
    Quads,
    QuadFan,
    QuadStrip,
}

impl DrawMode {
    /// Number of buffered vertices that triggers pipeline processing.
    /// Fans and strips process in windows; the six-slot primitive buffer
    /// bounds the largest window.
    #[inline]
    pub(crate) fn vertex_window(self) -> usize {
        match self {
            DrawMode::Points => 1,
            DrawMode::Lines => 2,
            DrawMode::Triangles => 3,
            DrawMode::TriangleFan | DrawMode::TriangleStrip | DrawMode::Quads => 4,
            DrawMode::QuadFan | DrawMode::QuadStrip => 6,
        }
    }
}

/// Polygon face. `Front` and `Back` double as indices into the per-face
/// tables, and one is the other's toggle.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Face {
    Front = 0,
    Back = 1,
    FrontAndBack = 2,
}

impl Face {
    #[inline]
    pub(crate) fn opposite(self) -> Face {
        match self {
            Face::Front => Face::Back,
            Face::Back => Face::Front,
            Face::FrontAndBack => Face::FrontAndBack,
        }
    }
}

/// Per-face polygon rendering mode.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PolygonMode {
    Point,
    Line,
    Fill,
}

/// Flat or smooth (barycentric) shading.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ShadeModel {
    Flat,
    Smooth,
}

/// Which material color tracks the current vertex color while the
/// `COLOR_MATERIAL` bit is enabled.
#[derive(Copy, Clone, Debug)]
pub struct ColorMaterial {
    pub face: Face,
    pub mode: MaterialParam,
}

/// Six-slot primitive buffer capacity.
pub(crate) const VERTEX_BUFFER_SIZE: usize = 6;

/// Snapshot taken while a render list records or replays; restored
/// afterwards so recording has no lasting latch side effects.
pub(crate) struct ContextBackup {
    pub(crate) face_materials: [Material; 2],
    pub(crate) current_texcoord: Vec2,
    pub(crate) current_normal: Vec3,
    pub(crate) current_color: Color,
    pub(crate) current_texture: Option<TextureHandle>,
    pub(crate) state: StateFlags,
}

//--------------------------------------------------------------------------------------------------
// Context

pub struct Context {
    // Render targets. The main framebuffer's color store usually borrows
    // caller memory; the aux store is an optional second buffer of the
    // same extent that `swap_buffers` exchanges with it.
    pub(crate) main_framebuffer: Framebuffer,
    pub(crate) aux_pixels: Option<Pixels>,
    pub(crate) bound_framebuffer: Option<FramebufferHandle>,
    pub(crate) current_texture: Option<TextureHandle>,

    // Matrix stacks and caches.
    pub(crate) matrix_mode: MatrixMode,
    pub(crate) stack_projection: MatrixStack<PROJECTION_STACK_DEPTH>,
    pub(crate) stack_modelview: MatrixStack<MODELVIEW_STACK_DEPTH>,
    pub(crate) stack_texture: MatrixStack<TEXTURE_STACK_DEPTH>,
    pub(crate) mat_mvp: Mat4,
    pub(crate) mvp_dirty: bool,

    // Viewport rectangle and the precomputed clip rectangle.
    pub(crate) vp_pos: [i32; 2],
    pub(crate) vp_dim: [i32; 2],
    pub(crate) vp_min: [i32; 2],
    pub(crate) vp_max: [i32; 2],

    // Raster configuration.
    pub(crate) polygon_modes: [PolygonMode; 2],
    pub(crate) shade_model: ShadeModel,
    pub(crate) cull_face: Face,
    pub(crate) blend_mode: BlendMode,
    pub(crate) depth_mode: DepthMode,
    pub(crate) clear_color: Color,
    pub(crate) clear_depth: f32,
    pub(crate) point_size: f32,
    pub(crate) line_width: f32,

    // Vertex latches, primitive buffer, vertex arrays.
    pub(crate) current_normal: Vec3,
    pub(crate) current_texcoord: Vec2,
    pub(crate) current_color: Color,
    pub(crate) vertex_buffer: [Vertex; VERTEX_BUFFER_SIZE],
    pub(crate) vertex_counter: usize,
    pub(crate) current_draw_mode: Option<DrawMode>,
    pub(crate) vertex_arrays: VertexArrays,

    // Raster position state for `draw_pixels`.
    pub(crate) raster_pos: Vec4,
    pub(crate) pixel_zoom: Vec2,

    // Material and light tables.
    pub(crate) face_materials: [Material; 2],
    pub(crate) color_material: ColorMaterial,
    pub(crate) lights: [Light; MAX_LIGHTS],
    pub(crate) active_light_head: Option<usize>,

    pub(crate) fog: Fog,

    // Render-list recording.
    pub(crate) recording: Option<ListHandle>,
    pub(crate) backup: Option<ContextBackup>,

    pub(crate) state: StateFlags,
    pub(crate) error: ErrorCode,
}

/// Shared handle to a context.
#[derive(Clone)]
pub struct ContextHandle(pub(crate) Rc<RefCell<Context>>);

impl ContextHandle {
    pub fn borrow_mut(&self) -> std::cell::RefMut<'_, Context> {
        self.0.borrow_mut()
    }

    pub fn borrow(&self) -> std::cell::Ref<'_, Context> {
        self.0.borrow()
    }

    pub fn ptr_eq(&self, other: &ContextHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

thread_local! {
    static CURRENT: RefCell<Option<ContextHandle>> = RefCell::new(None);
}

/// Creates a rendering context over a caller-supplied target buffer and
/// makes it current on this thread.
///
/// # Safety
///
/// `target` must point to `width * height * bytes_per_pixel(layout)`
/// writable bytes that outlive the context (or its next
/// `set_main_buffer`).
pub unsafe fn create_context(
    target: *mut u8,
    width: u32,
    height: u32,
    format: PixelFormat,
    data_type: DataType,
) -> Result<ContextHandle> {
    let layout = PixelLayout::new(format, data_type)?;
    let texture = Texture::from_raw(target, width, height, layout)?;
    let ctx = Context::with_target(Framebuffer::from_texture(texture));
    let handle = ContextHandle(Rc::new(RefCell::new(ctx)));
    make_current(Some(&handle));
    debug!("context created ({}x{}, {:?}/{:?})", width, height, format, data_type);
    Ok(handle)
}

/// Deletes a context; clears the thread-local slot when it was current.
pub fn delete_context(ctx: ContextHandle) {
    let was_current = get_current_context().map_or(false, |c| c.ptr_eq(&ctx));
    if was_current {
        make_current(None);
    }
    debug!("context deleted");
    drop(ctx);
}

/// Switches the thread-local current context.
pub fn make_current(ctx: Option<&ContextHandle>) {
    CURRENT.with(|slot| {
        *slot.borrow_mut() = ctx.cloned();
    });
}

/// Handle of the context currently active on this thread.
pub fn get_current_context() -> Option<ContextHandle> {
    CURRENT.with(|slot| slot.borrow().clone())
}

/// Runs `f` against the current context, if any.
pub fn with_current<R>(f: impl FnOnce(&mut Context) -> R) -> Option<R> {
    get_current_context().map(|handle| f(&mut handle.borrow_mut()))
}

//--------------------------------------------------------------------------------------------------
// Lifecycle and shared plumbing

impl Context {
    pub(crate) fn with_target(main_framebuffer: Framebuffer) -> Context {
        let w = main_framebuffer.width() as i32;
        let h = main_framebuffer.height() as i32;
        let mut ctx = Context {
            main_framebuffer,
            aux_pixels: None,
            bound_framebuffer: None,
            current_texture: None,

            matrix_mode: MatrixMode::ModelView,
            stack_projection: MatrixStack::new(),
            stack_modelview: MatrixStack::new(),
            stack_texture: MatrixStack::new(),
            mat_mvp: Mat4::IDENTITY,
            mvp_dirty: false,

            vp_pos: [0, 0],
            vp_dim: [w - 1, h - 1],
            vp_min: [0, 0],
            vp_max: [w - 1, h - 1],

            polygon_modes: [PolygonMode::Fill; 2],
            shade_model: ShadeModel::Smooth,
            cull_face: Face::Back,
            blend_mode: BlendMode::Alpha,
            depth_mode: DepthMode::Less,
            clear_color: rgba(0, 0, 0, 255),
            clear_depth: DEPTH_CLEAR,
            point_size: 1.0,
            line_width: 1.0,

            current_normal: Vec3 { x: 0.0, y: 0.0, z: 1.0 },
            current_texcoord: Vec2::ZERO,
            current_color: Color::WHITE,
            vertex_buffer: [Vertex::default(); VERTEX_BUFFER_SIZE],
            vertex_counter: 0,
            current_draw_mode: None,
            vertex_arrays: VertexArrays::default(),

            raster_pos: Vec4 { x: 0.0, y: 0.0, z: 0.0, w: 1.0 },
            pixel_zoom: Vec2 { x: 1.0, y: 1.0 },

            face_materials: [Material::default(); 2],
            color_material: ColorMaterial {
                face: Face::FrontAndBack,
                mode: MaterialParam::AmbientAndDiffuse,
            },
            lights: [Light::default(); MAX_LIGHTS],
            active_light_head: None,

            fog: Fog::default(),

            recording: None,
            backup: None,

            state: StateFlags::empty(),
            error: ErrorCode::NoError,
        };
        ctx.update_clip_rect();
        ctx
    }

    /// Records `code` into the sticky slot; the first code wins.
    pub(crate) fn record_error(&mut self, code: ErrorCode) {
        debug!("error recorded: {}", code);
        if self.error == ErrorCode::NoError {
            self.error = code;
        }
    }

    /// Returns and clears the sticky error slot.
    pub fn get_error(&mut self) -> ErrorCode {
        std::mem::replace(&mut self.error, ErrorCode::NoError)
    }

    //----------------------------------------------------------------------------------------------
    // Target buffers

    /// Replaces the main target buffer.
    ///
    /// # Safety
    ///
    /// Same contract as [`create_context`].
    pub unsafe fn set_main_buffer(
        &mut self,
        target: *mut u8,
        width: u32,
        height: u32,
        format: PixelFormat,
        data_type: DataType,
    ) {
        let layout = match PixelLayout::new(format, data_type) {
            Ok(l) => l,
            Err(code) => return self.record_error(code),
        };
        match Texture::from_raw(target, width, height, layout) {
            Ok(texture) => {
                self.main_framebuffer = Framebuffer::from_texture(texture);
                self.aux_pixels = None;
                let (w, h) = (width as i32, height as i32);
                self.vp_pos = [0, 0];
                self.vp_dim = [w - 1, h - 1];
                self.update_clip_rect();
            }
            Err(code) => self.record_error(code),
        }
    }

    /// Registers an auxiliary color buffer with the same extent and
    /// layout as the main target.
    ///
    /// # Safety
    ///
    /// Same contract as [`create_context`].
    pub unsafe fn set_aux_buffer(&mut self, target: *mut u8) {
        match NonNull::new(target) {
            Some(ptr) => {
                let len = self.main_framebuffer.texture().pixel_bytes().len();
                self.aux_pixels = Some(Pixels::Borrowed { ptr, len });
            }
            None => self.aux_pixels = None,
        }
    }

    /// Exchanges the main color store with the auxiliary buffer.
    pub fn swap_buffers(&mut self) {
        match self.aux_pixels.take() {
            Some(aux) => {
                let prev = self.main_framebuffer.texture_mut().replace_pixels(aux);
                self.aux_pixels = Some(prev);
            }
            None => warn!("swap_buffers without an auxiliary buffer"),
        }
    }

    /// Dimensions of the framebuffer draws currently land in.
    pub(crate) fn target_dims(&self) -> (u32, u32) {
        match self.target_handle() {
            Some(h) => {
                let fb = h.borrow();
                (fb.width(), fb.height())
            }
            None => (self.main_framebuffer.width(), self.main_framebuffer.height()),
        }
    }

    /// The bound framebuffer handle, when the `FRAMEBUFFER` bit routes
    /// rendering away from the main target.
    pub(crate) fn target_handle(&self) -> Option<FramebufferHandle> {
        if self.state.contains(StateFlags::FRAMEBUFFER) {
            self.bound_framebuffer.clone()
        } else {
            None
        }
    }

    pub(crate) fn update_clip_rect(&mut self) {
        let (w, h) = self.target_dims();
        self.vp_min = [self.vp_pos[0].max(0), self.vp_pos[1].max(0)];
        self.vp_max = [
            (self.vp_pos[0] + self.vp_dim[0]).min(w as i32 - 1),
            (self.vp_pos[1] + self.vp_dim[1]).min(h as i32 - 1),
        ];
    }

    //----------------------------------------------------------------------------------------------
    // Enable bits

    pub fn enable(&mut self, bits: StateFlags) {
        self.state.insert(bits);
        if bits.contains(StateFlags::FRAMEBUFFER) {
            self.update_clip_rect();
        }
    }

    pub fn disable(&mut self, bits: StateFlags) {
        self.state.remove(bits);
        if bits.contains(StateFlags::FRAMEBUFFER) {
            self.update_clip_rect();
        }
    }

    /// True when every bit of `bits` is enabled.
    pub fn is_enabled(&self, bits: StateFlags) -> bool {
        self.state.contains(bits)
    }

    //----------------------------------------------------------------------------------------------
    // Raster configuration

    pub fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return self.record_error(ErrorCode::InvalidValue);
        }
        self.vp_pos = [x, y];
        self.vp_dim = [width as i32 - 1, height as i32 - 1];
        self.update_clip_rect();
    }

    pub fn polygon_mode(&mut self, face: Face, mode: PolygonMode) {
        match face {
            Face::Front => self.polygon_modes[0] = mode,
            Face::Back => self.polygon_modes[1] = mode,
            Face::FrontAndBack => self.polygon_modes = [mode; 2],
        }
    }

    pub fn shade_model(&mut self, mode: ShadeModel) {
        self.shade_model = mode;
    }

    pub fn line_width(&mut self, width: f32) {
        if width <= 0.0 {
            return self.record_error(ErrorCode::InvalidValue);
        }
        self.line_width = width;
    }

    pub fn point_size(&mut self, size: f32) {
        if size <= 0.0 {
            return self.record_error(ErrorCode::InvalidValue);
        }
        self.point_size = size;
    }

    /// Selects the face to cull while `CULL_FACE` is enabled.
    pub fn cull_face(&mut self, face: Face) {
        if face == Face::FrontAndBack {
            return self.record_error(ErrorCode::InvalidEnum);
        }
        self.cull_face = face;
    }

    pub fn blend_mode(&mut self, mode: BlendMode) {
        self.blend_mode = mode;
    }

    pub fn depth_func(&mut self, func: DepthMode) {
        self.depth_mode = func;
    }

    pub fn bind_framebuffer(&mut self, framebuffer: Option<&FramebufferHandle>) {
        self.bound_framebuffer = framebuffer.cloned();
        self.update_clip_rect();
    }

    pub fn bind_texture(&mut self, texture: Option<&TextureHandle>) {
        self.current_texture = texture.cloned();
    }

    pub fn clear_color(&mut self, r: u8, g: u8, b: u8, a: u8) {
        self.clear_color = rgba(r, g, b, a);
    }

    pub fn clear_depth(&mut self, depth: f32) {
        self.clear_depth = depth;
    }

    /// Clears the current render target's selected buffers.
    pub fn clear(&mut self, flags: ClearFlags) {
        let color = self.clear_color;
        let depth = self.clear_depth;
        let apply = |fb: &mut Framebuffer| {
            if flags.contains(ClearFlags::COLOR) {
                fb.clear_color(color);
            }
            if flags.contains(ClearFlags::DEPTH) {
                fb.clear_depth(depth);
            }
        };
        match self.target_handle() {
            Some(h) => apply(&mut h.borrow_mut()),
            None => apply(&mut self.main_framebuffer),
        }
    }

    //----------------------------------------------------------------------------------------------
    // Lights

    fn check_light(&mut self, index: usize) -> bool {
        if index >= MAX_LIGHTS {
            self.record_error(ErrorCode::InvalidValue);
            return false;
        }
        true
    }

    /// Switches a light on, appending it to the active list. Re-enabling
    /// an active light is a no-op.
    pub fn enable_light(&mut self, index: usize) {
        if !self.check_light(index) || self.lights[index].active {
            return;
        }
        self.lights[index].active = true;
        self.lights[index].next = None;
        match self.active_light_head {
            None => self.active_light_head = Some(index),
            Some(head) => {
                let mut tail = head;
                while let Some(next) = self.lights[tail].next {
                    tail = next;
                }
                self.lights[tail].next = Some(index);
            }
        }
    }

    /// Switches a light off, unlinking it from the active list.
    pub fn disable_light(&mut self, index: usize) {
        if !self.check_light(index) || !self.lights[index].active {
            return;
        }
        self.lights[index].active = false;
        let next = self.lights[index].next.take();
        match self.active_light_head {
            Some(head) if head == index => self.active_light_head = next,
            Some(head) => {
                let mut cursor = head;
                loop {
                    match self.lights[cursor].next {
                        Some(n) if n == index => {
                            self.lights[cursor].next = next;
                            break;
                        }
                        Some(n) => cursor = n,
                        None => break,
                    }
                }
            }
            None => {}
        }
    }

    pub fn is_light_enabled(&mut self, index: usize) -> bool {
        if !self.check_light(index) {
            return false;
        }
        self.lights[index].active
    }

    /// Sets a scalar light parameter.
    pub fn lightf(&mut self, index: usize, param: LightParam, value: f32) {
        if !self.check_light(index) {
            return;
        }
        let light = &mut self.lights[index];
        match param {
            LightParam::SpotInnerCutoff => light.inner_cutoff = value,
            LightParam::SpotOuterCutoff => light.outer_cutoff = value,
            LightParam::ConstantAttenuation => light.attenuation_constant = value,
            LightParam::LinearAttenuation => light.attenuation_linear = value,
            LightParam::QuadraticAttenuation => light.attenuation_quadratic = value,
            _ => self.record_error(ErrorCode::InvalidEnum),
        }
    }

    /// Sets a vector (or scalar) light parameter from normalized floats.
    pub fn lightfv(&mut self, index: usize, param: LightParam, values: &[f32]) {
        if !self.check_light(index) {
            return;
        }
        let need = match param {
            LightParam::Position | LightParam::SpotDirection => 3,
            LightParam::Ambient | LightParam::Diffuse | LightParam::Specular => 4,
            _ => 1,
        };
        if values.len() < need {
            return self.record_error(ErrorCode::InvalidValue);
        }
        let light = &mut self.lights[index];
        match param {
            LightParam::Position => {
                light.position = Vec3 { x: values[0], y: values[1], z: values[2] }
            }
            LightParam::SpotDirection => {
                light.direction = Vec3 { x: values[0], y: values[1], z: values[2] }
            }
            LightParam::Ambient => {
                light.ambient = Color::from_normalized([values[0], values[1], values[2], values[3]])
            }
            LightParam::Diffuse => {
                light.diffuse = Color::from_normalized([values[0], values[1], values[2], values[3]])
            }
            LightParam::Specular => {
                light.specular =
                    Color::from_normalized([values[0], values[1], values[2], values[3]])
            }
            _ => return self.lightf(index, param, values[0]),
        }
    }

    //----------------------------------------------------------------------------------------------
    // Materials

    fn material_faces(&mut self, face: Face) -> std::ops::Range<usize> {
        match face {
            Face::Front => 0..1,
            Face::Back => 1..2,
            Face::FrontAndBack => 0..2,
        }
    }

    /// Sets a scalar material parameter; only shininess is scalar.
    pub fn materialf(&mut self, face: Face, param: MaterialParam, value: f32) {
        if param != MaterialParam::Shininess {
            return self.record_error(ErrorCode::InvalidEnum);
        }
        for i in self.material_faces(face) {
            self.face_materials[i].shininess = value;
        }
    }

    /// Sets a material color (or shininess) from normalized floats.
    pub fn materialfv(&mut self, face: Face, param: MaterialParam, values: &[f32]) {
        let need = if param == MaterialParam::Shininess { 1 } else { 4 };
        if values.len() < need {
            return self.record_error(ErrorCode::InvalidValue);
        }
        if param == MaterialParam::Shininess {
            return self.materialf(face, param, values[0]);
        }
        let color = Color::from_normalized([values[0], values[1], values[2], values[3]]);
        for i in self.material_faces(face) {
            let material = &mut self.face_materials[i];
            match param {
                MaterialParam::Ambient => material.ambient = color,
                MaterialParam::Diffuse => material.diffuse = color,
                MaterialParam::AmbientAndDiffuse => {
                    material.ambient = color;
                    material.diffuse = color;
                }
                MaterialParam::Specular => material.specular = color,
                MaterialParam::Emission => material.emission = color,
                MaterialParam::Shininess => unreachable!(),
            }
        }
    }

    /// Designates the material channel that tracks the current color.
    pub fn color_material(&mut self, face: Face, mode: MaterialParam) {
        if mode == MaterialParam::Shininess {
            return self.record_error(ErrorCode::InvalidEnum);
        }
        self.color_material = ColorMaterial { face, mode };
    }

    /// Applies the tracked color while `COLOR_MATERIAL` is enabled;
    /// called from the color latch verbs.
    pub(crate) fn apply_color_material(&mut self) {
        if !self.state.contains(StateFlags::COLOR_MATERIAL) {
            return;
        }
        let color = self.current_color;
        let ColorMaterial { face, mode } = self.color_material;
        for i in self.material_faces(face) {
            let material = &mut self.face_materials[i];
            match mode {
                MaterialParam::Ambient => material.ambient = color,
                MaterialParam::Diffuse => material.diffuse = color,
                MaterialParam::AmbientAndDiffuse => {
                    material.ambient = color;
                    material.diffuse = color;
                }
                MaterialParam::Specular => material.specular = color,
                MaterialParam::Emission => material.emission = color,
                MaterialParam::Shininess => {}
            }
        }
    }

    //----------------------------------------------------------------------------------------------
    // Fog

    pub fn fogi(&mut self, param: FogParam, value: i32) {
        match param {
            FogParam::Mode => {
                self.fog.mode = match value {
                    0 => FogMode::Linear,
                    1 => FogMode::Exp,
                    2 => FogMode::Exp2,
                    _ => return self.record_error(ErrorCode::InvalidEnum),
                }
            }
            _ => self.fogf(param, value as f32),
        }
    }

    pub fn fogf(&mut self, param: FogParam, value: f32) {
        match param {
            FogParam::Density => {
                if value < 0.0 {
                    return self.record_error(ErrorCode::InvalidValue);
                }
                self.fog.density = value;
            }
            FogParam::Start => self.fog.start = value,
            FogParam::End => self.fog.end = value,
            FogParam::Mode => self.fogi(param, value as i32),
            FogParam::Color => self.record_error(ErrorCode::InvalidEnum),
        }
    }

    pub fn fogfv(&mut self, param: FogParam, values: &[f32]) {
        match param {
            FogParam::Color => {
                if values.len() < 4 {
                    return self.record_error(ErrorCode::InvalidValue);
                }
                self.fog.color =
                    Color::from_normalized([values[0], values[1], values[2], values[3]]);
            }
            _ => {
                if values.is_empty() {
                    return self.record_error(ErrorCode::InvalidValue);
                }
                self.fogf(param, values[0]);
            }
        }
    }

    pub fn fogiv(&mut self, param: FogParam, values: &[i32]) {
        match param {
            FogParam::Color => {
                if values.len() < 4 {
                    return self.record_error(ErrorCode::InvalidValue);
                }
                // Integer fog colors arrive 0..255 per channel.
                self.fog.color = rgba(
                    values[0].clamp(0, 255) as u8,
                    values[1].clamp(0, 255) as u8,
                    values[2].clamp(0, 255) as u8,
                    values[3].clamp(0, 255) as u8,
                );
            }
            _ => {
                if values.is_empty() {
                    return self.record_error(ErrorCode::InvalidValue);
                }
                self.fogi(param, values[0]);
            }
        }
    }

    //----------------------------------------------------------------------------------------------
    // Textures

    /// Creates a texture over caller memory.
    ///
    /// # Safety
    ///
    /// Same contract as [`Texture::from_raw`].
    pub unsafe fn gen_texture(
        &mut self,
        pixels: *mut u8,
        width: u32,
        height: u32,
        format: PixelFormat,
        data_type: DataType,
    ) -> Option<TextureHandle> {
        let layout = match PixelLayout::new(format, data_type) {
            Ok(l) => l,
            Err(code) => {
                self.record_error(code);
                return None;
            }
        };
        match Texture::from_raw(pixels, width, height, layout) {
            Ok(t) => Some(TextureHandle(Rc::new(RefCell::new(t)))),
            Err(code) => {
                self.record_error(code);
                None
            }
        }
    }

    /// Creates a texture owning a zeroed pixel store.
    pub fn gen_texture_buffer(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
        data_type: DataType,
    ) -> Option<TextureHandle> {
        let layout = match PixelLayout::new(format, data_type) {
            Ok(l) => l,
            Err(code) => {
                self.record_error(code);
                return None;
            }
        };
        let overflows = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(layout.bytes_per_pixel()))
            .is_none();
        if overflows {
            self.record_error(ErrorCode::OutOfMemory);
            return None;
        }
        match Texture::new_owned(width, height, layout) {
            Ok(t) => Some(TextureHandle(Rc::new(RefCell::new(t)))),
            Err(code) => {
                self.record_error(code);
                None
            }
        }
    }

    /// Invalidates a texture, unbinding it first when bound.
    pub fn delete_texture(&mut self, texture: &TextureHandle, free_pixels: bool) {
        if self
            .current_texture
            .as_ref()
            .map_or(false, |bound| bound.ptr_eq(texture))
        {
            self.current_texture = None;
        }
        texture.borrow_mut().delete(free_pixels);
    }

    pub fn is_valid_texture(&self, texture: &TextureHandle) -> bool {
        texture.borrow().is_valid()
    }

    /// Copies out a texture's raw pixel bytes.
    pub fn get_texture_pixels(&self, texture: &TextureHandle) -> Vec<u8> {
        texture.borrow().pixel_bytes().to_vec()
    }

    pub fn get_texture_pixel(&mut self, texture: &TextureHandle, x: u32, y: u32) -> Color {
        let t = texture.borrow();
        if x >= t.width() || y >= t.height() {
            drop(t);
            self.record_error(ErrorCode::InvalidValue);
            return Color::TRANSPARENT;
        }
        t.get_pixel(x, y)
    }

    pub fn set_texture_pixel(&mut self, texture: &TextureHandle, x: u32, y: u32, color: Color) {
        let mut t = texture.borrow_mut();
        if x >= t.width() || y >= t.height() {
            drop(t);
            return self.record_error(ErrorCode::InvalidValue);
        }
        t.set_pixel(x, y, color);
    }

    /// Rebinds the sampler of the currently bound texture.
    pub fn set_texture_parameter(&mut self, param: TextureParameter) {
        match self.current_texture.clone() {
            Some(t) => t.borrow_mut().set_parameter(param),
            None => self.record_error(ErrorCode::InvalidOperation),
        }
    }

    //----------------------------------------------------------------------------------------------
    // Framebuffers

    /// Creates a framebuffer with an owned color store and a depth array
    /// cleared to `+inf`.
    pub fn gen_framebuffer(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
        data_type: DataType,
    ) -> Option<FramebufferHandle> {
        let layout = match PixelLayout::new(format, data_type) {
            Ok(l) => l,
            Err(code) => {
                self.record_error(code);
                return None;
            }
        };
        match Framebuffer::new(width, height, layout) {
            Ok(fb) => Some(FramebufferHandle(Rc::new(RefCell::new(fb)))),
            Err(code) => {
                self.record_error(code);
                None
            }
        }
    }

    /// Releases a framebuffer, unbinding it first when bound.
    pub fn delete_framebuffer(&mut self, framebuffer: &FramebufferHandle) {
        if self
            .bound_framebuffer
            .as_ref()
            .map_or(false, |bound| bound.ptr_eq(framebuffer))
        {
            self.bound_framebuffer = None;
            self.update_clip_rect();
        }
        framebuffer.borrow_mut().texture_mut().delete(true);
    }

    pub fn is_valid_framebuffer(&self, framebuffer: &FramebufferHandle) -> bool {
        framebuffer.borrow().is_valid()
    }

    pub fn clear_framebuffer(&mut self, framebuffer: &FramebufferHandle, color: Color) {
        framebuffer.borrow_mut().clear(color, DEPTH_CLEAR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn test_context(w: u32, h: u32) -> (ContextHandle, Vec<u8>) {
        let mut buffer = vec![0u8; (w * h * 4) as usize];
        let ctx = unsafe {
            create_context(buffer.as_mut_ptr(), w, h, PixelFormat::Rgba, DataType::UnsignedByte)
        }
        .unwrap();
        (ctx, buffer)
    }

    #[test]
    fn enable_symmetry() {
        let (ctx, _buf) = test_context(2, 2);
        let mut ctx = ctx.borrow_mut();
        ctx.enable(StateFlags::BLEND);
        assert!(ctx.is_enabled(StateFlags::BLEND));
        ctx.enable(StateFlags::BLEND);
        assert!(ctx.is_enabled(StateFlags::BLEND));
        ctx.disable(StateFlags::BLEND);
        assert!(!ctx.is_enabled(StateFlags::BLEND));
    }

    #[test]
    fn error_slot_is_sticky_and_clears_on_read() {
        let (ctx, _buf) = test_context(2, 2);
        let mut ctx = ctx.borrow_mut();
        ctx.line_width(0.0);
        ctx.cull_face(Face::FrontAndBack);
        assert_eq!(ctx.get_error(), ErrorCode::InvalidValue);
        assert_eq!(ctx.get_error(), ErrorCode::NoError);
    }

    #[test]
    fn light_list_preserves_enable_order() {
        let (ctx, _buf) = test_context(2, 2);
        let mut ctx = ctx.borrow_mut();
        ctx.enable_light(2);
        ctx.enable_light(0);
        ctx.enable_light(5);
        assert_eq!(ctx.active_light_head, Some(2));
        assert_eq!(ctx.lights[2].next, Some(0));
        assert_eq!(ctx.lights[0].next, Some(5));
        ctx.disable_light(0);
        assert_eq!(ctx.lights[2].next, Some(5));
        assert!(ctx.is_light_enabled(2));
        assert!(!ctx.is_light_enabled(0));
    }

    #[test]
    fn make_current_switches_thread_slot() {
        let (a, _ba) = test_context(2, 2);
        let (b, _bb) = test_context(2, 2);
        assert!(get_current_context().unwrap().ptr_eq(&b));
        make_current(Some(&a));
        assert!(get_current_context().unwrap().ptr_eq(&a));
        delete_context(a);
        assert!(get_current_context().is_none());
        delete_context(b);
    }

    #[test]
    fn clear_scenario_s1() {
        let (ctx, buf) = test_context(2, 2);
        {
            let mut ctx = ctx.borrow_mut();
            ctx.clear_color(10, 20, 30, 40);
            ctx.clear(ClearFlags::COLOR);
        }
        for px in buf.chunks(4) {
            assert_eq!(px, &[10, 20, 30, 40]);
        }
    }
}
