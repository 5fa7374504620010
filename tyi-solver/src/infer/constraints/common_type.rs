use super::CommonType;
use crate::{
    common::diagnostic::DiagnosticKind,
    infer::{Solver, TypeId, TypeInfo},
    trace::Outcome,
};

impl<'a> Solver<'a> {
    /// Finds the first alternative that every other alternative either equals
    /// or derives from, error and never alternatives are ignored
    fn find_common_type(&mut self, alternatives: &[TypeId]) -> Option<TypeId> {
        let candidates: Vec<_> = alternatives
            .iter()
            .copied()
            .filter(|alt| match self.get(self.get_base(*alt)) {
                TypeInfo::Error | TypeInfo::Never => false,
                _ => true,
            })
            .collect();

        if candidates.is_empty() {
            return alternatives.first().copied();
        }

        for candidate in candidates.iter().copied() {
            let common = candidates.iter().all(|other| {
                self.types_equal(candidate, *other) || self.is_base_of(candidate, *other)
            });

            if common {
                return Some(candidate);
            }
        }

        None
    }

    #[tracing::instrument(skip(self, constraint))]
    pub(in crate::infer) fn solve_common_type(&mut self, constraint: CommonType) -> Outcome {
        tracing::trace!(
            "Solving common type of {}",
            self.display_list(&constraint.alternatives)
        );

        let CommonType {
            mut header,
            common,
            alternatives,
            resolver,
        } = constraint;

        match self.find_common_type(&alternatives) {
            Some(found) if self.unify(common, found) => {
                resolver.resolve(());

                Outcome::Resolved
            },
            Some(found) => {
                self.fill_mismatch(&mut header.diagnostic, common, found);
                resolver.fail((), header.diagnostic, Some(&mut self.diagnostics));

                Outcome::Failed
            },
            None => {
                header
                    .diagnostic
                    .fill(DiagnosticKind::NoCommonType, vec![self.display_list(&alternatives)]);

                let error = self.error_type();
                self.unify(common, error);

                resolver.fail((), header.diagnostic, Some(&mut self.diagnostics));

                Outcome::Failed
            },
        }
    }
}
