//! Filter, wrap and depth-compare modes.

/// Texture filtering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Nearest neighbor filtering. G-buffer attachments use this.
    #[default]
    Nearest,
    /// Linear filtering.
    Linear,
}

/// Texture address mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    /// Clamp to edge. Every cube and screen-space target uses this.
    #[default]
    ClampToEdge,
    /// Repeat.
    Repeat,
    /// Mirrored repeat.
    MirrorRepeat,
}

/// Depth comparison function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunction {
    /// Pass if the incoming depth is less than the stored one.
    #[default]
    Less,
    /// Pass if less than or equal. The environment backdrop draws at the far
    /// plane and relies on this.
    LessEqual,
    /// Always pass.
    Always,
}

impl CompareFunction {
    /// Evaluate the comparison for an incoming and a stored depth.
    pub fn passes(self, incoming: f32, stored: f32) -> bool {
        match self {
            Self::Less => incoming < stored,
            Self::LessEqual => incoming <= stored,
            Self::Always => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_far_plane_passes_only_with_less_equal() {
        assert!(!CompareFunction::Less.passes(1.0, 1.0));
        assert!(CompareFunction::LessEqual.passes(1.0, 1.0));
        assert!(CompareFunction::Always.passes(2.0, 1.0));
    }
}
