//! Keyboard bindings for the render settings.

use lumina_app::KeyCode;
use lumina_graphics::{DeferredView, EnvironmentLibrary, PostProcessFlags, RenderSettings};

/// Exposure change per `[` / `]` press.
pub const EXPOSURE_STEP: f32 = 0.1;
pub const MIN_EXPOSURE: f32 = 0.1;

/// What a key press asks the demo to do besides editing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Settings were edited.
    Changed,
    /// The environment index changed; its lighting must be regenerated.
    SwitchEnvironment,
    Exit,
}

/// Apply a fresh key press to `settings`. Returns `None` for unbound keys.
pub fn apply_key(
    settings: &mut RenderSettings,
    environments: &EnvironmentLibrary,
    key: KeyCode,
) -> Option<Command> {
    let flag = match key {
        KeyCode::B => Some(PostProcessFlags::BLOOM),
        KeyCode::G => Some(PostProcessFlags::GAMMA_CORRECTION),
        KeyCode::H => Some(PostProcessFlags::HDR),
        KeyCode::R => Some(PostProcessFlags::REINHARD),
        _ => None,
    };
    if let Some(flag) = flag {
        settings.post_flags.flip_flag(flag);
        return Some(Command::Changed);
    }

    if let Some(index) = key.digit().filter(|&d| d <= 4) {
        settings.deferred_view = DeferredView::from_index(index);
        return Some(Command::Changed);
    }

    match key {
        KeyCode::M => settings.anti_aliasing = settings.anti_aliasing.next(),
        KeyCode::F => settings.deferred = !settings.deferred,
        KeyCode::L => settings.show_light_indicator = !settings.show_light_indicator,
        KeyCode::K => settings.show_backdrop = !settings.show_backdrop,
        KeyCode::T => settings.rotate = !settings.rotate,
        KeyCode::BracketLeft => {
            settings.exposure = (settings.exposure - EXPOSURE_STEP).max(MIN_EXPOSURE);
        }
        KeyCode::BracketRight => settings.exposure += EXPOSURE_STEP,
        KeyCode::N | KeyCode::P => {
            let index = if key == KeyCode::N {
                environments.next_index(settings.environment_index)
            } else {
                environments.previous_index(settings.environment_index)
            };
            if index == settings.environment_index {
                return Some(Command::Changed);
            }
            settings.environment_index = index;
            return Some(Command::SwitchEnvironment);
        }
        KeyCode::Escape => return Some(Command::Exit),
        _ => return None,
    }
    Some(Command::Changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_graphics::AntiAliasing;
    use rstest::rstest;

    fn library(count: usize) -> EnvironmentLibrary {
        EnvironmentLibrary::new((0..count).map(|i| format!("env{i}.hdr").into()))
    }

    #[rstest]
    #[case(KeyCode::B, PostProcessFlags::BLOOM)]
    #[case(KeyCode::G, PostProcessFlags::GAMMA_CORRECTION)]
    #[case(KeyCode::H, PostProcessFlags::HDR)]
    #[case(KeyCode::R, PostProcessFlags::REINHARD)]
    fn test_flag_keys_toggle(#[case] key: KeyCode, #[case] flag: PostProcessFlags) {
        let mut settings = RenderSettings::default();
        let environments = library(1);
        let before = settings.post_flags.has(flag);

        assert_eq!(
            apply_key(&mut settings, &environments, key),
            Some(Command::Changed)
        );
        assert_eq!(settings.post_flags.has(flag), !before);
        apply_key(&mut settings, &environments, key);
        assert_eq!(settings.post_flags.has(flag), before);
    }

    #[test]
    fn test_anti_aliasing_cycles() {
        let mut settings = RenderSettings {
            anti_aliasing: AntiAliasing::None,
            ..Default::default()
        };
        let environments = library(1);
        apply_key(&mut settings, &environments, KeyCode::M);
        assert_eq!(settings.anti_aliasing, AntiAliasing::Msaa { samples: 4 });
        apply_key(&mut settings, &environments, KeyCode::M);
        assert_eq!(settings.anti_aliasing, AntiAliasing::Fxaa);
        apply_key(&mut settings, &environments, KeyCode::M);
        assert_eq!(settings.anti_aliasing, AntiAliasing::None);
    }

    #[rstest]
    #[case(KeyCode::Digit0, DeferredView::Position)]
    #[case(KeyCode::Digit2, DeferredView::Albedo)]
    #[case(KeyCode::Digit4, DeferredView::Combined)]
    fn test_digit_selects_deferred_view(#[case] key: KeyCode, #[case] view: DeferredView) {
        let mut settings = RenderSettings::default();
        apply_key(&mut settings, &library(1), key);
        assert_eq!(settings.deferred_view, view);
    }

    #[test]
    fn test_digits_past_four_are_unbound() {
        let mut settings = RenderSettings::default();
        assert_eq!(apply_key(&mut settings, &library(1), KeyCode::Digit7), None);
        assert_eq!(settings, RenderSettings::default());
    }

    #[test]
    fn test_boolean_toggles() {
        let mut settings = RenderSettings::default();
        let environments = library(1);
        for key in [KeyCode::F, KeyCode::L, KeyCode::K, KeyCode::T] {
            apply_key(&mut settings, &environments, key);
        }
        let defaults = RenderSettings::default();
        assert_eq!(settings.deferred, !defaults.deferred);
        assert_eq!(settings.show_light_indicator, !defaults.show_light_indicator);
        assert_eq!(settings.show_backdrop, !defaults.show_backdrop);
        assert_eq!(settings.rotate, !defaults.rotate);
    }

    #[test]
    fn test_exposure_has_a_floor() {
        let mut settings = RenderSettings::default();
        let environments = library(1);
        apply_key(&mut settings, &environments, KeyCode::BracketRight);
        assert!((settings.exposure - 2.3).abs() < 1e-5);
        for _ in 0..100 {
            apply_key(&mut settings, &environments, KeyCode::BracketLeft);
        }
        assert_eq!(settings.exposure, MIN_EXPOSURE);
    }

    #[test]
    fn test_environment_cycling_wraps() {
        let mut settings = RenderSettings::default();
        let environments = library(3);

        assert_eq!(
            apply_key(&mut settings, &environments, KeyCode::P),
            Some(Command::SwitchEnvironment)
        );
        assert_eq!(settings.environment_index, 2);
        apply_key(&mut settings, &environments, KeyCode::N);
        assert_eq!(settings.environment_index, 0);
    }

    #[test]
    fn test_single_environment_does_not_switch() {
        let mut settings = RenderSettings::default();
        assert_eq!(
            apply_key(&mut settings, &library(1), KeyCode::N),
            Some(Command::Changed)
        );
        assert_eq!(settings.environment_index, 0);
    }

    #[test]
    fn test_escape_exits() {
        let mut settings = RenderSettings::default();
        assert_eq!(
            apply_key(&mut settings, &library(0), KeyCode::Escape),
            Some(Command::Exit)
        );
        assert_eq!(apply_key(&mut settings, &library(0), KeyCode::Q), None);
    }
}
