//! Vertex records and vertex-array descriptors.

use crate::color::Color;
use crate::math::{Vec2, Vec3, Vec4};

/// One pipeline vertex.
///
/// `position`, `normal`, `texcoord` and `color` are caller attributes;
/// `homogeneous` and `screen` are scratch written by the transform and
/// viewport stages.
#[derive(Copy, Clone, Debug)]
pub struct Vertex {
    pub position: Vec4,
    pub homogeneous: Vec4,
    pub screen: Vec2,
    pub normal: Vec3,
    pub texcoord: Vec2,
    pub color: Color,
}

impl Default for Vertex {
    fn default() -> Vertex {
        Vertex {
            position: Vec4 { x: 0.0, y: 0.0, z: 0.0, w: 1.0 },
            homogeneous: Vec4 { x: 0.0, y: 0.0, z: 0.0, w: 1.0 },
            screen: Vec2::ZERO,
            normal: Vec3 { x: 0.0, y: 0.0, z: 1.0 },
            texcoord: Vec2::ZERO,
            color: Color::WHITE,
        }
    }
}

impl Vertex {
    /// Interpolates every attribute at parameter `t`, color included
    /// (channel-wise in 8 bits). Used when clipping splits an edge.
    pub fn lerp(&self, other: &Vertex, t: f32) -> Vertex {
        Vertex {
            position: self.position.lerp(other.position, t),
            homogeneous: self.homogeneous.lerp(other.homogeneous, t),
            screen: self.screen.lerp(other.screen, t),
            normal: self.normal.lerp(other.normal, t),
            texcoord: self.texcoord.lerp(other.texcoord, t),
            color: crate::color::lerp(self.color, other.color, t),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Vertex arrays

/// Element type of a vertex-attribute array.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ArrayType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Float,
    Double,
}

impl ArrayType {
    #[inline]
    pub fn size_of(self) -> usize {
        match self {
            ArrayType::Byte | ArrayType::UnsignedByte => 1,
            ArrayType::Short | ArrayType::UnsignedShort => 2,
            ArrayType::Int | ArrayType::UnsignedInt => 4,
            ArrayType::Float => 4,
            ArrayType::Double => 8,
        }
    }

    /// Reads one component as an `f32`, raw-valued.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a readable value of this type.
    #[inline]
    pub unsafe fn fetch(self, ptr: *const u8) -> f32 {
        match self {
            ArrayType::Byte => (ptr as *const i8).read_unaligned() as f32,
            ArrayType::UnsignedByte => ptr.read_unaligned() as f32,
            ArrayType::Short => (ptr as *const i16).read_unaligned() as f32,
            ArrayType::UnsignedShort => (ptr as *const u16).read_unaligned() as f32,
            ArrayType::Int => (ptr as *const i32).read_unaligned() as f32,
            ArrayType::UnsignedInt => (ptr as *const u32).read_unaligned() as f32,
            ArrayType::Float => (ptr as *const f32).read_unaligned(),
            ArrayType::Double => (ptr as *const f64).read_unaligned() as f32,
        }
    }

    /// Reads one component as an 8-bit color channel; integer types are
    /// taken as already 8-bit-scaled, floats as normalized.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a readable value of this type.
    #[inline]
    pub unsafe fn fetch_channel(self, ptr: *const u8) -> u8 {
        match self {
            ArrayType::UnsignedByte | ArrayType::Byte => ptr.read_unaligned(),
            ArrayType::UnsignedShort | ArrayType::Short => {
                ((ptr as *const u16).read_unaligned() >> 8) as u8
            }
            ArrayType::UnsignedInt | ArrayType::Int => {
                ((ptr as *const u32).read_unaligned() >> 24) as u8
            }
            ArrayType::Float => ((ptr as *const f32).read_unaligned().max(0.0).min(1.0) * 255.0) as u8,
            ArrayType::Double => ((ptr as *const f64).read_unaligned().max(0.0).min(1.0) * 255.0) as u8,
        }
    }
}

/// Index type accepted by `draw_elements`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IndexType {
    UnsignedByte,
    UnsignedShort,
    UnsignedInt,
}

impl IndexType {
    #[inline]
    pub fn size_of(self) -> usize {
        match self {
            IndexType::UnsignedByte => 1,
            IndexType::UnsignedShort => 2,
            IndexType::UnsignedInt => 4,
        }
    }

    /// # Safety
    ///
    /// `ptr` must point to a readable index of this type.
    #[inline]
    pub unsafe fn fetch(self, ptr: *const u8) -> usize {
        match self {
            IndexType::UnsignedByte => ptr.read_unaligned() as usize,
            IndexType::UnsignedShort => (ptr as *const u16).read_unaligned() as usize,
            IndexType::UnsignedInt => (ptr as *const u32).read_unaligned() as usize,
        }
    }
}

/// One latched attribute array: base pointer, byte stride, component
/// count and element type. The memory is caller-owned; the latching
/// verbs carry the validity contract.
#[derive(Copy, Clone, Debug)]
pub struct AttribArray {
    pub ptr: *const u8,
    pub stride: usize,
    pub size: usize,
    pub data_type: ArrayType,
}

impl AttribArray {
    /// Effective byte distance between consecutive elements.
    #[inline]
    pub fn pitch(&self) -> usize {
        if self.stride != 0 {
            self.stride
        } else {
            self.size * self.data_type.size_of()
        }
    }

    /// Pointer to component `component` of element `index`.
    ///
    /// # Safety
    ///
    /// In-bounds per the latching contract.
    #[inline]
    pub unsafe fn component(&self, index: usize, component: usize) -> *const u8 {
        self.ptr
            .add(index * self.pitch() + component * self.data_type.size_of())
    }
}

/// The four vertex-array slots of a context.
#[derive(Copy, Clone, Debug, Default)]
pub struct VertexArrays {
    pub positions: Option<AttribArray>,
    pub normals: Option<AttribArray>,
    pub colors: Option<AttribArray>,
    pub texcoords: Option<AttribArray>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::rgba;
    use crate::math::{vec2, vec3, vec4};

    #[test]
    fn lerp_midpoint() {
        let a = Vertex {
            position: vec4(0.0, 0.0, 0.0, 1.0),
            color: rgba(0, 0, 0, 0),
            ..Vertex::default()
        };
        let b = Vertex {
            position: vec4(2.0, 4.0, 6.0, 1.0),
            normal: vec3(0.0, 2.0, 0.0),
            texcoord: vec2(1.0, 1.0),
            color: rgba(200, 100, 50, 255),
            ..Vertex::default()
        };
        let mid = a.lerp(&b, 0.5);
        assert_eq!(mid.position, vec4(1.0, 2.0, 3.0, 1.0));
        assert_eq!(mid.texcoord, vec2(0.5, 0.5));
        assert_eq!(mid.color.r, 100);
    }

    #[test]
    fn attrib_array_pitch_and_fetch() {
        let data: [f32; 6] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let arr = AttribArray {
            ptr: data.as_ptr() as *const u8,
            stride: 0,
            size: 3,
            data_type: ArrayType::Float,
        };
        assert_eq!(arr.pitch(), 12);
        unsafe {
            assert_eq!(ArrayType::Float.fetch(arr.component(1, 2)), 6.0);
        }
    }

    #[test]
    fn channel_fetch_scales() {
        let v: u16 = 0xFF00;
        unsafe {
            assert_eq!(
                ArrayType::UnsignedShort.fetch_channel(&v as *const u16 as *const u8),
                0xFF
            );
        }
        let f: f32 = 0.5;
        unsafe {
            let c = ArrayType::Float.fetch_channel(&f as *const f32 as *const u8);
            assert!((c as i32 - 127).abs() <= 1);
        }
    }
}
