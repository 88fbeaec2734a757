//! Post-processing switches and the bloom ping-pong schedule.

use bitflags::bitflags;

bitflags! {
    /// Composite-program branches.
    ///
    /// Each bit selects one branch of the composite program; the whole mask
    /// is uploaded as one integer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PostProcessFlags: u32 {
        /// Exposure tone mapping.
        const HDR = 1 << 0;
        /// Gamma correction.
        const GAMMA_CORRECTION = 1 << 1;
        /// Bloom blur and combine.
        const BLOOM = 1 << 2;
        /// Box blur of the final image.
        const BLUR = 1 << 3;
        /// Reinhard tone mapping.
        const REINHARD = 1 << 4;
    }
}

impl PostProcessFlags {
    /// Turn a flag on.
    pub fn set_flag(&mut self, flag: Self) {
        self.insert(flag);
    }

    /// Turn a flag off.
    pub fn unset_flag(&mut self, flag: Self) {
        self.remove(flag);
    }

    /// Invert a flag.
    pub fn flip_flag(&mut self, flag: Self) {
        self.toggle(flag);
    }

    /// Whether every bit of `flag` is on.
    pub fn has(&self, flag: Self) -> bool {
        self.contains(flag)
    }
}

/// Anti-aliasing mode. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AntiAliasing {
    None,
    /// Geometry renders multisampled and is resolved before post-processing.
    Msaa { samples: u32 },
    /// Approximate anti-aliasing on the composited image.
    Fxaa,
}

impl Default for AntiAliasing {
    fn default() -> Self {
        Self::Msaa { samples: 4 }
    }
}

impl AntiAliasing {
    /// MSAA sample count, 1 when MSAA is off.
    pub fn sample_count(self) -> u32 {
        match self {
            Self::Msaa { samples } => samples,
            _ => 1,
        }
    }

    /// None → MSAA ×4 → FXAA → None.
    pub fn next(self) -> Self {
        match self {
            Self::None => Self::Msaa { samples: 4 },
            Self::Msaa { .. } => Self::Fxaa,
            Self::Fxaa => Self::None,
        }
    }
}

/// Number of blur passes in the bloom chain.
pub const BLOOM_ITERATIONS: usize = 10;

/// Ping-pong buffer the composite reads the bloom from.
pub const BLOOM_RESULT_BUFFER: usize = 1;

/// Where a blur pass reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlurSource {
    /// The bright-pass attachment of the scene target.
    BrightPass,
    /// One of the two ping-pong buffers.
    PingPong(usize),
}

/// One pass of the bloom chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlurStep {
    pub iteration: usize,
    /// Blur direction.
    pub horizontal: bool,
    /// Ping-pong buffer written.
    pub write: usize,
    pub read: BlurSource,
}

/// The bloom chain: starting horizontal, pass `i` writes
/// `pingpong[horizontal]` and reads the bright pass (first pass) or
/// `pingpong[!horizontal]`, then the direction flips.
pub fn bloom_schedule() -> [BlurStep; BLOOM_ITERATIONS] {
    let mut horizontal = true;
    std::array::from_fn(|iteration| {
        let write = horizontal as usize;
        let read = if iteration == 0 {
            BlurSource::BrightPass
        } else {
            BlurSource::PingPong(!horizontal as usize)
        };
        let step = BlurStep {
            iteration,
            horizontal,
            write,
            read,
        };
        horizontal = !horizontal;
        step
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_operations() {
        let mut flags = PostProcessFlags::empty();
        flags.set_flag(PostProcessFlags::BLOOM);
        flags.set_flag(PostProcessFlags::HDR);
        assert!(flags.has(PostProcessFlags::BLOOM));
        assert_eq!(flags.bits(), 0b101);

        flags.unset_flag(PostProcessFlags::HDR);
        assert!(!flags.has(PostProcessFlags::HDR));

        flags.flip_flag(PostProcessFlags::GAMMA_CORRECTION);
        flags.flip_flag(PostProcessFlags::BLOOM);
        assert_eq!(flags, PostProcessFlags::GAMMA_CORRECTION);
        assert_eq!(PostProcessFlags::REINHARD.bits(), 16);
    }

    #[test]
    fn test_bloom_schedule_alternates() {
        let steps = bloom_schedule();
        assert_eq!(steps[0].read, BlurSource::BrightPass);
        assert_eq!(steps[0].write, 1);
        for pair in steps.windows(2) {
            assert_ne!(pair[0].horizontal, pair[1].horizontal);
            assert_eq!(pair[1].read, BlurSource::PingPong(pair[0].write));
        }
        assert_eq!(steps[BLOOM_ITERATIONS - 2].write, BLOOM_RESULT_BUFFER);
    }

    #[test]
    fn test_anti_aliasing_cycle() {
        let mode = AntiAliasing::default();
        assert_eq!(mode.sample_count(), 4);
        assert_eq!(mode.next(), AntiAliasing::Fxaa);
        assert_eq!(mode.next().next(), AntiAliasing::None);
        assert_eq!(AntiAliasing::None.sample_count(), 1);
    }
}
