//! Sampler descriptors.

use super::{AddressMode, FilterMode};

/// Descriptor for creating a sampler.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerDescriptor {
    /// Debug label for the sampler.
    pub label: Option<String>,
    /// Address mode for all coordinates.
    pub address_mode: AddressMode,
    /// Magnification filter.
    pub mag_filter: FilterMode,
    /// Minification filter.
    pub min_filter: FilterMode,
    /// Mipmap filter.
    pub mipmap_filter: FilterMode,
    /// Minimum LOD clamp.
    pub lod_min_clamp: f32,
    /// Maximum LOD clamp.
    pub lod_max_clamp: f32,
}

impl SamplerDescriptor {
    /// Create a linear filtering sampler, trilinear across mips.
    pub fn linear() -> Self {
        Self {
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmap_filter: FilterMode::Linear,
            ..Default::default()
        }
    }

    /// Create a nearest neighbor filtering sampler.
    pub fn nearest() -> Self {
        Self::default()
    }

    /// Create a sampler with the same filter in every stage.
    pub fn with_filter(filter: FilterMode) -> Self {
        match filter {
            FilterMode::Linear => Self::linear(),
            FilterMode::Nearest => Self::nearest(),
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the address mode.
    pub fn with_address_mode(mut self, mode: AddressMode) -> Self {
        self.address_mode = mode;
        self
    }
}

impl Default for SamplerDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            address_mode: AddressMode::ClampToEdge,
            mag_filter: FilterMode::Nearest,
            min_filter: FilterMode::Nearest,
            mipmap_filter: FilterMode::Nearest,
            lod_min_clamp: 0.0,
            lod_max_clamp: 32.0,
        }
    }
}
