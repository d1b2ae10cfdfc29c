//! Pixel layout descriptors.
//!
//! A layout pairs a channel arrangement with a data type. Not every pair
//! is storable; the valid combinations are checked once when a texture or
//! framebuffer is created, so the codec itself never has to re-validate.

use crate::error::{ErrorCode, Result};

/// Channel arrangement of a pixel store.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PixelFormat {
    Red,
    Green,
    Blue,
    Alpha,
    Luminance,
    LuminanceAlpha,
    Rgb,
    Rgba,
    Bgr,
    Bgra,
}

/// Element type of a pixel store.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DataType {
    UnsignedByte,
    UnsignedShort565,
    UnsignedShort5551,
    UnsignedShort4444,
    HalfFloat,
    Float,
}

impl PixelFormat {
    /// Number of color channels stored per pixel.
    #[inline]
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Red
            | PixelFormat::Green
            | PixelFormat::Blue
            | PixelFormat::Alpha
            | PixelFormat::Luminance => 1,
            PixelFormat::LuminanceAlpha => 2,
            PixelFormat::Rgb | PixelFormat::Bgr => 3,
            PixelFormat::Rgba | PixelFormat::Bgra => 4,
        }
    }
}

/// A validated (format, type) pair.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct PixelLayout {
    pub format: PixelFormat,
    pub data_type: DataType,
}

impl PixelLayout {
    /// Validates the pair; packed 16-bit types only make sense for the
    /// three- and four-channel arrangements they encode.
    pub fn new(format: PixelFormat, data_type: DataType) -> Result<PixelLayout> {
        let valid = match data_type {
            DataType::UnsignedByte | DataType::HalfFloat | DataType::Float => true,
            DataType::UnsignedShort565 => {
                matches!(format, PixelFormat::Rgb | PixelFormat::Bgr)
            }
            DataType::UnsignedShort5551 | DataType::UnsignedShort4444 => {
                matches!(format, PixelFormat::Rgba | PixelFormat::Bgra)
            }
        };
        if !valid {
            return Err(ErrorCode::InvalidEnum);
        }
        Ok(PixelLayout { format, data_type })
    }

    pub const RGBA8: PixelLayout = PixelLayout {
        format: PixelFormat::Rgba,
        data_type: DataType::UnsignedByte,
    };

    /// Storage footprint of one pixel.
    #[inline]
    pub fn bytes_per_pixel(self) -> usize {
        match self.data_type {
            DataType::UnsignedByte => self.format.channels(),
            DataType::UnsignedShort565
            | DataType::UnsignedShort5551
            | DataType::UnsignedShort4444 => 2,
            DataType::HalfFloat => 2 * self.format.channels(),
            DataType::Float => 4 * self.format.channels(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_types_reject_wrong_arrangements() {
        assert!(PixelLayout::new(PixelFormat::Rgb, DataType::UnsignedShort565).is_ok());
        assert!(PixelLayout::new(PixelFormat::Rgba, DataType::UnsignedShort565).is_err());
        assert!(PixelLayout::new(PixelFormat::Rgba, DataType::UnsignedShort5551).is_ok());
        assert!(PixelLayout::new(PixelFormat::Luminance, DataType::UnsignedShort4444).is_err());
    }

    #[test]
    fn bytes_per_pixel_table() {
        let bpp = |f, t| PixelLayout::new(f, t).unwrap().bytes_per_pixel();
        assert_eq!(bpp(PixelFormat::Rgba, DataType::UnsignedByte), 4);
        assert_eq!(bpp(PixelFormat::Rgb, DataType::UnsignedByte), 3);
        assert_eq!(bpp(PixelFormat::Rgb, DataType::UnsignedShort565), 2);
        assert_eq!(bpp(PixelFormat::Luminance, DataType::Float), 4);
        assert_eq!(bpp(PixelFormat::Rgba, DataType::HalfFloat), 8);
        assert_eq!(bpp(PixelFormat::LuminanceAlpha, DataType::UnsignedByte), 2);
    }
}
