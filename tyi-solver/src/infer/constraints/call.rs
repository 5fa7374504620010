use super::{Call, Step};
use crate::{
    common::diagnostic::DiagnosticKind,
    infer::{ScoreVector, Solver, TypeInfo},
    trace::Outcome,
};

impl<'a> Solver<'a> {
    #[tracing::instrument(
        skip(self, constraint),
        fields(called = self.display_type_info(constraint.called).to_string().as_str())
    )]
    pub(in crate::infer) fn solve_call(&mut self, mut constraint: Call) -> Step<Call> {
        tracing::trace!("Solving call constraint");

        let called = self.get_base(constraint.called);

        let (params, ret, variadic) = match self.get(called) {
            TypeInfo::Error | TypeInfo::Never => {
                self.unify(constraint.ret, called);
                constraint.resolver.resolve(());

                return Step::Solved(Outcome::Resolved);
            },
            TypeInfo::Fn {
                params,
                ret,
                variadic,
            } => (params, ret, variadic),
            _ => return Step::Solved(self.fail_call(constraint, DiagnosticKind::CallNonFunction)),
        };

        if !self.matches_parameter_count(params.len(), variadic, constraint.args.len()) {
            return Step::Solved(self.fail_call(constraint, DiagnosticKind::NoMatchingOverload));
        }

        let args = constraint.args.clone();
        let mut scores = constraint
            .scores
            .take()
            .unwrap_or_else(|| ScoreVector::undecided(args.len()));
        let changed = self.refine_scores(&params, variadic, &args, &mut scores);

        if scores.has_rejection() {
            return Step::Solved(self.fail_call(constraint, DiagnosticKind::NoMatchingOverload));
        }

        if !scores.is_well_defined() {
            tracing::debug!("Cannot solve call constraint yet");
            constraint.scores = Some(scores);

            return if changed {
                Step::Advanced(constraint)
            } else {
                Step::Stale(constraint)
            };
        }

        let Call {
            mut header,
            ret: call_ret,
            resolver,
            ..
        } = constraint;

        let bound = self
            .bind_arguments(&params, variadic, &args)
            .and_then(|()| {
                if self.unify(call_ret, ret) {
                    Ok(())
                } else {
                    Err((call_ret, ret))
                }
            });

        match bound {
            Ok(()) => {
                resolver.resolve(());

                Step::Solved(Outcome::Resolved)
            },
            Err((a, b)) => {
                self.fill_mismatch(&mut header.diagnostic, a, b);
                resolver.fail((), header.diagnostic, Some(&mut self.diagnostics));

                Step::Solved(Outcome::Failed)
            },
        }
    }

    fn fail_call(&mut self, constraint: Call, kind: DiagnosticKind) -> Outcome {
        let Call {
            mut header,
            called,
            args,
            ret,
            resolver,
            ..
        } = constraint;

        match kind {
            DiagnosticKind::CallNonFunction => header
                .diagnostic
                .fill(kind, vec![self.display_type_info(called).to_string()]),
            _ => header.diagnostic.fill(kind, vec![
                self.display_type_info(called).to_string(),
                self.display_list(&args),
            ]),
        }

        let error = self.error_type();
        self.unify(ret, error);

        let diagnostics = if self.has_error(&args) {
            None
        } else {
            Some(&mut self.diagnostics)
        };
        resolver.fail((), header.diagnostic, diagnostics);

        Outcome::Failed
    }
}
