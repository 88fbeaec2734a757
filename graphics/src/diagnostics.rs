//! Log-and-continue failure reporting.
//!
//! The renderer never aborts a frame because a target is incomplete, an
//! environment map failed to decode or a program failed to build. Each of
//! those is reported here, logged, and rendering carries on with whatever
//! state resulted. The sink counts every report and keeps the most recent
//! ones so the policy can be checked.

use std::collections::VecDeque;
use std::fmt;

use parking_lot::Mutex;

/// The category of a reported failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A render target failed its completeness check.
    IncompleteTarget,
    /// An asset could not be loaded and a placeholder was substituted.
    AssetLoad,
    /// A shading program failed to build and will draw nothing.
    ProgramBuild,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::IncompleteTarget => "incomplete target",
            Self::AssetLoad => "asset load",
            Self::ProgramBuild => "program build",
        };
        f.write_str(name)
    }
}

/// One reported failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// What happens after a diagnostic has been recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log and continue.
    #[default]
    Permissive,
    /// Panic on the first report in debug builds. Release builds behave
    /// like [`FailurePolicy::Permissive`].
    Strict,
}

/// Number of reports [`Diagnostics::entries`] keeps.
pub const RECENT_CAPACITY: usize = 64;

#[derive(Debug, Default)]
struct Tally {
    incomplete_target: usize,
    asset_load: usize,
    program_build: usize,
    aborts: usize,
    recent: VecDeque<Diagnostic>,
}

impl Tally {
    fn counter(&mut self, kind: DiagnosticKind) -> &mut usize {
        match kind {
            DiagnosticKind::IncompleteTarget => &mut self.incomplete_target,
            DiagnosticKind::AssetLoad => &mut self.asset_load,
            DiagnosticKind::ProgramBuild => &mut self.program_build,
        }
    }
}

/// Shared diagnostic sink.
#[derive(Debug, Default)]
pub struct Diagnostics {
    policy: FailurePolicy,
    tally: Mutex<Tally>,
}

impl Diagnostics {
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            policy,
            tally: Mutex::new(Tally::default()),
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Record a failure.
    pub fn report(&self, kind: DiagnosticKind, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            kind,
            message: message.into(),
        };
        log::warn!("{diagnostic}");
        {
            let mut tally = self.tally.lock();
            *tally.counter(kind) += 1;
            if tally.recent.len() == RECENT_CAPACITY {
                tally.recent.pop_front();
            }
            tally.recent.push_back(diagnostic.clone());
        }

        if self.policy == FailurePolicy::Strict && cfg!(debug_assertions) {
            panic!("strict failure policy: {diagnostic}");
        }
    }

    /// Record a frame that ended with an error before it was presented.
    pub fn record_abort(&self, message: impl fmt::Display) {
        log::error!("frame aborted: {message}");
        self.tally.lock().aborts += 1;
    }

    /// Total number of reports.
    pub fn count(&self) -> usize {
        let tally = self.tally.lock();
        tally.incomplete_target + tally.asset_load + tally.program_build
    }

    /// Number of reports of one kind.
    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        *self.tally.lock().counter(kind)
    }

    /// Number of frames that ended with an error instead of being presented.
    pub fn aborts(&self) -> usize {
        self.tally.lock().aborts
    }

    /// The most recent reports, oldest first. At most [`RECENT_CAPACITY`].
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.tally.lock().recent.iter().cloned().collect()
    }

    /// Reset every counter and drop the recorded reports.
    pub fn clear(&self) {
        *self.tally.lock() = Tally::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts_by_kind() {
        let diagnostics = Diagnostics::default();
        diagnostics.report(DiagnosticKind::AssetLoad, "missing.hdr");
        diagnostics.report(DiagnosticKind::IncompleteTarget, "scene");
        diagnostics.report(DiagnosticKind::AssetLoad, "other.hdr");

        assert_eq!(diagnostics.count(), 3);
        assert_eq!(diagnostics.count_of(DiagnosticKind::AssetLoad), 2);
        assert_eq!(diagnostics.count_of(DiagnosticKind::ProgramBuild), 0);
        assert_eq!(diagnostics.aborts(), 0);
        assert_eq!(
            diagnostics.entries()[1].to_string(),
            "incomplete target: scene"
        );

        diagnostics.clear();
        assert_eq!(diagnostics.count(), 0);
    }

    #[test]
    fn test_recent_entries_are_capped() {
        let diagnostics = Diagnostics::default();
        for frame in 0..RECENT_CAPACITY + 10 {
            diagnostics.report(DiagnosticKind::IncompleteTarget, format!("frame {frame}"));
        }

        assert_eq!(diagnostics.count(), RECENT_CAPACITY + 10);
        assert_eq!(
            diagnostics.count_of(DiagnosticKind::IncompleteTarget),
            RECENT_CAPACITY + 10
        );
        let entries = diagnostics.entries();
        assert_eq!(entries.len(), RECENT_CAPACITY);
        assert_eq!(entries[0].message, "frame 10");
    }

    #[test]
    fn test_aborts_are_counted() {
        let diagnostics = Diagnostics::default();
        assert_eq!(diagnostics.aborts(), 0);
        diagnostics.record_abort("surface lost");
        diagnostics.record_abort("surface lost");
        assert_eq!(diagnostics.aborts(), 2);
        assert_eq!(diagnostics.count(), 0);

        diagnostics.clear();
        assert_eq!(diagnostics.aborts(), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "strict failure policy")]
    fn test_strict_policy_panics_in_debug() {
        let diagnostics = Diagnostics::new(FailurePolicy::Strict);
        diagnostics.report(DiagnosticKind::ProgramBuild, "composite");
    }
}
