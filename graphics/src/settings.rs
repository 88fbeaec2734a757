//! User-facing render settings.
//!
//! The UI (or any input handler) mutates a [`RenderSettings`]; the renderer
//! only reads it.

use crate::post::{AntiAliasing, PostProcessFlags};

/// What the deferred combine pass shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeferredView {
    Position,
    Normal,
    Albedo,
    Specular,
    /// Lit result.
    #[default]
    Combined,
}

impl DeferredView {
    /// Map the 0-4 debug index. Out-of-range values select the lit result.
    pub fn from_index(index: u32) -> Self {
        match index {
            0 => Self::Position,
            1 => Self::Normal,
            2 => Self::Albedo,
            3 => Self::Specular,
            _ => Self::Combined,
        }
    }

    pub fn index(self) -> u32 {
        self as u32
    }
}

/// Settings read by the renderer every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub post_flags: PostProcessFlags,
    pub exposure: f32,
    pub gamma: f32,
    pub anti_aliasing: AntiAliasing,
    pub deferred: bool,
    pub deferred_view: DeferredView,
    pub show_backdrop: bool,
    pub show_light_indicator: bool,
    /// Environment map the lighting is precomputed from.
    pub environment_index: usize,
    /// Index into the scene's material list, used by the demo UI.
    pub selected_material: usize,
    pub rotate: bool,
    pub rotation_speed: f32,
    pub clear_color: [f32; 4],
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            post_flags: PostProcessFlags::empty(),
            exposure: 2.2,
            gamma: 2.2,
            anti_aliasing: AntiAliasing::default(),
            deferred: false,
            deferred_view: DeferredView::default(),
            show_backdrop: true,
            show_light_indicator: true,
            environment_index: 0,
            selected_material: 0,
            rotate: false,
            rotation_speed: 1.0,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = RenderSettings::default();
        assert_eq!(settings.exposure, 2.2);
        assert_eq!(settings.gamma, 2.2);
        assert_eq!(settings.anti_aliasing, AntiAliasing::Msaa { samples: 4 });
        assert_eq!(settings.deferred_view, DeferredView::Combined);
    }

    #[test]
    fn test_deferred_view_index() {
        for index in 0..5 {
            assert_eq!(DeferredView::from_index(index).index(), index);
        }
        assert_eq!(DeferredView::from_index(9), DeferredView::Combined);
    }
}
