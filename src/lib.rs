//! PixelForge: a CPU-resident, fixed-function 3D rasterizer.
//!
//! The crate turns vertex streams into pixel writes against a
//! caller-supplied color buffer plus an auxiliary depth buffer, through
//! a classic immediate-mode state machine: matrix stacks, per-vertex
//! attribute latches, `begin`/`vertex...`/`end`, vertex arrays and
//! render lists.
//!
//! Everything happens on one [`Context`](context::Context). Create one
//! over your target buffer, configure state, draw:
//!
//! ```no_run
//! use pixelforge::*;
//!
//! let (w, h) = (320u32, 240u32);
//! let mut target = vec![0u8; (w * h * 4) as usize];
//! let ctx = unsafe {
//!     create_context(target.as_mut_ptr(), w, h, PixelFormat::Rgba, DataType::UnsignedByte)
//! }
//! .unwrap();
//!
//! let mut ctx = ctx.borrow_mut();
//! ctx.clear_color(0, 0, 0, 255);
//! ctx.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
//! ctx.begin(DrawMode::Triangles);
//! ctx.color3ub(255, 0, 0);
//! ctx.vertex2f(-0.5, -0.5);
//! ctx.color3ub(0, 255, 0);
//! ctx.vertex2f(0.5, -0.5);
//! ctx.color3ub(0, 0, 255);
//! ctx.vertex2f(0.0, 0.5);
//! ctx.end();
//! ```
//!
//! The API is single-threaded per context; two threads may drive two
//! different contexts. The rasterizer interior may fan scanlines out to
//! a thread pool (`parallel-raster`), but a draw returns only after all
//! of its fragments are committed.

pub mod blend;
pub mod codec;
pub mod color;
pub mod context;
pub mod depth;
pub mod error;
pub mod fog;
pub mod format;
pub mod framebuffer;
pub mod light;
pub mod list;
pub mod math;
mod pipeline;
mod raster;
pub mod texture;
pub mod vertex;

pub use crate::blend::BlendMode;
pub use crate::color::{rgba, Color};
pub use crate::context::{
    create_context, delete_context, get_current_context, make_current, with_current, ClearFlags,
    Context, ContextHandle, DrawMode, Face, GetParam, MatrixMode, PolygonMode, ShadeModel,
    StateFlags,
};
pub use crate::depth::DepthMode;
pub use crate::error::ErrorCode;
pub use crate::fog::{FogMode, FogParam};
pub use crate::format::{DataType, PixelFormat, PixelLayout};
pub use crate::framebuffer::{Framebuffer, FramebufferHandle};
pub use crate::light::{LightParam, Material, MaterialParam, MAX_LIGHTS};
pub use crate::list::ListHandle;
pub use crate::math::{vec2, vec3, vec4, Mat4, Vec2, Vec3, Vec4};
pub use crate::texture::{
    Texture, TextureFilter, TextureHandle, TextureParameter, TextureWrap,
};
pub use crate::vertex::{ArrayType, IndexType};
