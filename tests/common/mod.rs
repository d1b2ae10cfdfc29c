//! Shared harness for the integration tests: a context over an owned
//! RGBA8 target buffer we can inspect pixel by pixel.

use pixelforge::*;

pub struct TestTarget {
    pub buf: Vec<u8>,
    pub ctx: ContextHandle,
    pub width: u32,
}

impl TestTarget {
    pub fn new(width: u32, height: u32) -> TestTarget {
        let mut buf = vec![0u8; (width * height * 4) as usize];
        let ctx = unsafe {
            create_context(
                buf.as_mut_ptr(),
                width,
                height,
                PixelFormat::Rgba,
                DataType::UnsignedByte,
            )
        }
        .expect("context creation");
        TestTarget { buf, ctx, width }
    }

    /// Reads the target pixel at screen coordinates; row 0 is the top.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let offset = ((y * self.width + x) * 4) as usize;
        [
            self.buf[offset],
            self.buf[offset + 1],
            self.buf[offset + 2],
            self.buf[offset + 3],
        ]
    }
}

/// Channel-wise comparison with a small tolerance, for interpolated
/// results.
#[allow(dead_code)]
pub fn close_to(actual: [u8; 4], expected: [u8; 4], tolerance: u8) -> bool {
    actual
        .iter()
        .zip(expected.iter())
        .all(|(a, e)| (*a as i32 - *e as i32).abs() <= tolerance as i32)
}
