//! Pixel and attribute formats
//!
//! A closed enumeration mapped by each backend to its native triple (GL
//! internal-format/format/type) or `VkFormat`. Other subsystems rely on the
//! aspect and size queries here; the GL/Vulkan lookup tables live in the
//! backends' `convert` modules.

use crate::core::flags::ImageAspectFlags;

/// Closed set of supported formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Format {
    // 8-bit normalized color
    R8Unorm,
    Rg8Unorm,
    Rgba8Unorm,
    Rgba8Srgb,
    Bgra8Unorm,
    Bgra8Srgb,
    // floating point color
    R16Sfloat,
    Rg16Sfloat,
    Rgba16Sfloat,
    R32Sfloat,
    Rg32Sfloat,
    Rgb32Sfloat,
    Rgba32Sfloat,
    // integer color
    R8Uint,
    R32Uint,
    Rgba8Uint,
    Rgba32Uint,
    R32Sint,
    Rgba32Sint,
    // depth / stencil
    D16Unorm,
    D32Sfloat,
    D24UnormS8Uint,
    D32SfloatS8Uint,
    S8Uint,
}

impl Format {
    /// True for formats with a depth component
    pub fn is_depth(self) -> bool {
        matches!(
            self,
            Self::D16Unorm | Self::D32Sfloat | Self::D24UnormS8Uint | Self::D32SfloatS8Uint
        )
    }

    /// True for formats with a stencil component
    pub fn is_stencil(self) -> bool {
        matches!(
            self,
            Self::D24UnormS8Uint | Self::D32SfloatS8Uint | Self::S8Uint
        )
    }

    /// True for pure color formats
    pub fn is_color(self) -> bool {
        !self.is_depth() && !self.is_stencil()
    }

    /// True for unsigned/signed integer (non-normalized) color formats
    pub fn is_integer_color(self) -> bool {
        matches!(
            self,
            Self::R8Uint
                | Self::R32Uint
                | Self::Rgba8Uint
                | Self::Rgba32Uint
                | Self::R32Sint
                | Self::Rgba32Sint
        )
    }

    /// True for signed integer color formats
    pub fn is_signed_integer_color(self) -> bool {
        matches!(self, Self::R32Sint | Self::Rgba32Sint)
    }

    /// Image aspects covered by the format
    pub fn aspects(self) -> ImageAspectFlags {
        let mut aspects = ImageAspectFlags::empty();
        if self.is_depth() {
            aspects |= ImageAspectFlags::DEPTH;
        }
        if self.is_stencil() {
            aspects |= ImageAspectFlags::STENCIL;
        }
        if aspects.is_empty() {
            aspects = ImageAspectFlags::COLOR;
        }
        aspects
    }

    /// Size of one texel in bytes
    pub fn texel_size(self) -> u32 {
        match self {
            Self::R8Unorm | Self::R8Uint | Self::S8Uint => 1,
            Self::Rg8Unorm | Self::R16Sfloat | Self::D16Unorm => 2,
            Self::Rgba8Unorm
            | Self::Rgba8Srgb
            | Self::Bgra8Unorm
            | Self::Bgra8Srgb
            | Self::Rgba8Uint
            | Self::Rg16Sfloat
            | Self::R32Sfloat
            | Self::R32Uint
            | Self::R32Sint
            | Self::D32Sfloat
            | Self::D24UnormS8Uint => 4,
            Self::Rgba16Sfloat | Self::Rg32Sfloat | Self::D32SfloatS8Uint => 8,
            Self::Rgb32Sfloat => 12,
            Self::Rgba32Sfloat | Self::Rgba32Uint | Self::Rgba32Sint => 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_stencil_classification() {
        assert!(Format::D32Sfloat.is_depth());
        assert!(!Format::D32Sfloat.is_stencil());
        assert!(Format::D24UnormS8Uint.is_depth());
        assert!(Format::D24UnormS8Uint.is_stencil());
        assert!(Format::S8Uint.is_stencil());
        assert!(!Format::S8Uint.is_depth());
        assert!(Format::Rgba8Unorm.is_color());
    }

    #[test]
    fn aspects_match_components() {
        assert_eq!(Format::Rgba8Unorm.aspects(), ImageAspectFlags::COLOR);
        assert_eq!(
            Format::D24UnormS8Uint.aspects(),
            ImageAspectFlags::DEPTH | ImageAspectFlags::STENCIL
        );
        assert_eq!(Format::D32Sfloat.aspects(), ImageAspectFlags::DEPTH);
    }

    #[test]
    fn texel_sizes() {
        assert_eq!(Format::Rgba8Unorm.texel_size(), 4);
        assert_eq!(Format::Rgba32Sfloat.texel_size(), 16);
        assert_eq!(Format::D16Unorm.texel_size(), 2);
    }
}
