//! The built program catalogue.

use std::ops::Index;
use std::sync::Arc;

use crate::device::GraphicsDevice;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::resources::{Program, ProgramKind};

/// One built program per [`ProgramKind`].
///
/// Programs that fail to build are reported as
/// [`ProgramBuild`](DiagnosticKind::ProgramBuild) diagnostics and replaced by
/// an invalid program, so lookups never fail.
pub struct ProgramSet {
    programs: Vec<Arc<Program>>,
}

impl ProgramSet {
    pub fn build(device: &GraphicsDevice, diagnostics: &Diagnostics) -> Self {
        let programs = ProgramKind::ALL
            .iter()
            .map(|&kind| match device.create_program(kind) {
                Ok(program) => program,
                Err(err) => {
                    diagnostics.report(
                        DiagnosticKind::ProgramBuild,
                        format!("{}: {err}", kind.label()),
                    );
                    device.invalid_program(kind)
                }
            })
            .collect();
        Self { programs }
    }

    pub fn get(&self, kind: ProgramKind) -> &Arc<Program> {
        &self.programs[kind as usize]
    }

    /// Number of programs that failed to build.
    pub fn invalid_count(&self) -> usize {
        self.programs.iter().filter(|p| !p.is_valid()).count()
    }
}

impl Index<ProgramKind> for ProgramSet {
    type Output = Arc<Program>;

    fn index(&self, kind: ProgramKind) -> &Self::Output {
        self.get(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dummy::DummyBackend;
    use crate::instance::GraphicsInstance;

    #[test]
    fn test_failed_program_is_substituted() {
        let backend = Arc::new(DummyBackend::new());
        backend.fail_program(ProgramKind::Prefilter);
        let device = GraphicsInstance::with_backend(backend)
            .create_device()
            .unwrap();
        let diagnostics = Diagnostics::default();

        let programs = ProgramSet::build(&device, &diagnostics);
        assert_eq!(programs.invalid_count(), 1);
        assert!(!programs[ProgramKind::Prefilter].is_valid());
        assert_eq!(programs[ProgramKind::Pbr].kind(), ProgramKind::Pbr);
        assert_eq!(diagnostics.count_of(DiagnosticKind::ProgramBuild), 1);
    }
}
