use super::SameType;
use crate::{infer::Solver, trace::Outcome};

impl<'a> Solver<'a> {
    #[tracing::instrument(
        skip(self, constraint),
        fields(
            a = self.display_type_info(constraint.a).to_string().as_str(),
            b = self.display_type_info(constraint.b).to_string().as_str()
        )
    )]
    pub(in crate::infer) fn solve_same_type(&mut self, constraint: SameType) -> Outcome {
        tracing::trace!("Solving same type constraint");

        let SameType {
            mut header,
            a,
            b,
            resolver,
        } = constraint;

        if self.unify(a, b) {
            resolver.resolve(());

            Outcome::Resolved
        } else {
            self.fill_mismatch(&mut header.diagnostic, a, b);
            resolver.fail((), header.diagnostic, Some(&mut self.diagnostics));

            Outcome::Failed
        }
    }
}
