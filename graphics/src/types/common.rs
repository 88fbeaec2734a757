//! Common types shared across the graphics system.

// ============================================================================
// Viewport
// ============================================================================

/// Viewport configuration for rendering.
///
/// Uses the wgpu convention: `[0, 1]` depth range, origin at the top-left.
/// Projection matrices are built with `glam::Mat4::perspective_rh`, which
/// already targets that range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// X coordinate of the viewport's top-left corner.
    pub x: f32,
    /// Y coordinate of the viewport's top-left corner.
    pub y: f32,
    /// Width of the viewport.
    pub width: f32,
    /// Height of the viewport.
    pub height: f32,
    /// Minimum depth value (default: 0.0).
    pub min_depth: f32,
    /// Maximum depth value (default: 1.0).
    pub max_depth: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

impl Viewport {
    /// Create a new viewport with standard `[0, 1]` depth range.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }

    /// Create a viewport from dimensions with origin at (0, 0).
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f32, height as f32)
    }

    /// Viewport size rounded to whole pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.width.round() as u32, self.height.round() as u32)
    }
}

// ============================================================================
// Extent3d
// ============================================================================

/// 3D extent for textures.
///
/// Cube textures store their six faces as `depth` layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent3d {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Depth or array layer count (1 for 2D textures, 6 for cubes).
    pub depth: u32,
}

impl Extent3d {
    /// Create a new 2D extent.
    pub fn new_2d(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth: 1,
        }
    }

    /// Create a new 3D extent.
    pub fn new_3d(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }
}

// ============================================================================
// ClearValue
// ============================================================================

/// Clear value for render targets.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ClearValue {
    /// No clear operation.
    #[default]
    None,
    /// Clear color attachment with RGBA values.
    Color { r: f32, g: f32, b: f32, a: f32 },
    /// Clear depth attachment.
    Depth(f32),
}

impl ClearValue {
    /// Create a color clear value.
    pub fn color(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self::Color { r, g, b, a }
    }

    /// Create a color clear value from an RGBA array.
    pub fn from_rgba(rgba: [f32; 4]) -> Self {
        Self::color(rgba[0], rgba[1], rgba[2], rgba[3])
    }

    /// Create a depth clear value.
    pub fn depth(value: f32) -> Self {
        Self::Depth(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_from_dimensions() {
        let viewport = Viewport::from_dimensions(1200, 800);
        assert_eq!(viewport.size(), (1200, 800));
        assert_eq!((viewport.min_depth, viewport.max_depth), (0.0, 1.0));
    }
}
