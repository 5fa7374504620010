use super::Assignable;
use crate::{infer::Solver, trace::Outcome};

impl<'a> Solver<'a> {
    #[tracing::instrument(
        skip(self, constraint),
        fields(
            target = self.display_type_info(constraint.target).to_string().as_str(),
            assigned = self.display_type_info(constraint.assigned).to_string().as_str()
        )
    )]
    pub(in crate::infer) fn solve_assignable(&mut self, constraint: Assignable) -> Outcome {
        tracing::trace!("Solving assignable constraint");

        let Assignable {
            mut header,
            target,
            assigned,
            resolver,
        } = constraint;

        if self.assign(target, assigned) {
            resolver.resolve(());

            Outcome::Resolved
        } else {
            self.fill_mismatch(&mut header.diagnostic, target, assigned);
            resolver.fail((), header.diagnostic, Some(&mut self.diagnostics));

            Outcome::Failed
        }
    }

    /// Resolves an assignment that still has a type variable on one side by
    /// making both sides equal
    #[tracing::instrument(skip(self, constraint))]
    pub(in crate::infer) fn assume_equal(&mut self, constraint: Assignable) -> Outcome {
        tracing::trace!("Assuming assignment is an equality");

        let Assignable {
            mut header,
            target,
            assigned,
            resolver,
        } = constraint;

        if self.unify(target, assigned) {
            resolver.resolve(());

            Outcome::Resolved
        } else {
            self.fill_mismatch(&mut header.diagnostic, target, assigned);
            resolver.fail((), header.diagnostic, Some(&mut self.diagnostics));

            Outcome::Failed
        }
    }

    /// Replaces assignments sharing the same unresolved target by a common
    /// type constraint over the assigned types plus a single assignment of
    /// that common type to the target
    ///
    /// The promises of the merged constraints follow the new assignment.
    #[tracing::instrument(skip(self, group))]
    pub(in crate::infer) fn merge_assignables(&mut self, group: Vec<Assignable>) {
        debug_assert!(group.len() > 1);

        let target = group[0].target;
        let span = group[0].header.diagnostic.span();

        tracing::trace!(
            "Merging {} assignments to '{}'",
            group.len(),
            self.display_type_info(target)
        );

        let common = self.type_var(span);
        let alternatives = group.iter().map(|constraint| constraint.assigned).collect();

        self.common_type(common, alternatives, span);
        let assigned = self.assignable(target, common, span);

        for constraint in group {
            let span = constraint.header.diagnostic.span();
            self.forward(assigned.clone(), constraint.resolver, span);
        }
    }
}
