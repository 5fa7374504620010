use super::{Candidate, Header, Overload, Step};
use crate::{
    common::{diagnostic::DiagnosticKind, FastHashMap},
    infer::{
        compare, find_best, promise::Resolver, Dominance, FnId, FunctionSymbol, Solver, TypeId,
    },
    trace::Outcome,
};

impl<'a> Solver<'a> {
    #[tracing::instrument(
        skip(self, constraint),
        fields(name = self.rodeo.resolve(&constraint.name))
    )]
    pub(in crate::infer) fn solve_overload(&mut self, mut constraint: Overload) -> Step<Overload> {
        tracing::trace!(
            "Solving overload constraint with {} candidates",
            constraint.candidates.len()
        );

        let args = constraint.args.clone();
        let mut changed = false;

        for candidate in constraint.candidates.iter_mut() {
            if candidate.scores.is_well_defined() || candidate.scores.has_rejection() {
                continue;
            }

            let sig = self.function(candidate.function).sig.clone();
            changed |= self.refine_scores(&sig.params, sig.variadic, &args, &mut candidate.scores);
        }

        let undecided = constraint
            .candidates
            .iter()
            .any(|candidate| !candidate.scores.has_rejection() && !candidate.scores.is_well_defined());

        if undecided {
            tracing::debug!("Cannot solve overload constraint yet");

            return if changed {
                Step::Advanced(constraint)
            } else {
                Step::Stale(constraint)
            };
        }

        let survivors: Vec<&Candidate> = constraint
            .candidates
            .iter()
            .filter(|candidate| !candidate.scores.has_rejection())
            .collect();

        let best = match find_best(survivors.iter().map(|candidate| &candidate.scores)) {
            Some(best) => survivors[best],
            None => {
                return Step::Solved(self.fail_overload(
                    constraint,
                    DiagnosticKind::NoMatchingOverload,
                    Vec::new(),
                ))
            },
        };

        let dominators: Vec<FnId> = survivors
            .iter()
            .filter(|candidate| compare(&candidate.scores, &best.scores) != Dominance::SecondDominates)
            .map(|candidate| candidate.function)
            .collect();

        if dominators.len() != 1 {
            return Step::Solved(self.fail_overload(
                constraint,
                DiagnosticKind::AmbiguousOverload,
                dominators,
            ));
        }

        let Overload {
            header,
            args,
            ret,
            resolver,
            ..
        } = constraint;

        Step::Solved(self.commit_overload(header, dominators[0], &args, ret, resolver))
    }

    /// Instantiates the selected candidate and binds it to the call
    fn commit_overload(
        &mut self,
        mut header: Header,
        function: FnId,
        args: &[TypeId],
        ret: TypeId,
        resolver: Resolver<FunctionSymbol>,
    ) -> Outcome {
        let sig = self.function(function).sig.clone();
        let span = header.diagnostic.span();

        tracing::trace!("Selected '{}'", self.display_type_info(self.function(function).ty));

        let generics: Vec<TypeId> = sig.generics.iter().map(|_| self.type_var(span)).collect();
        let map: FastHashMap<_, _> = sig
            .generics
            .iter()
            .copied()
            .zip(generics.iter().copied())
            .collect();

        let params: Vec<TypeId> = sig
            .params
            .iter()
            .map(|param| self.substitute_generics(*param, &map))
            .collect();
        let fn_ret = self.substitute_generics(sig.ret, &map);

        let bound = self
            .bind_arguments(&params, sig.variadic, args)
            .and_then(|()| {
                if self.unify(ret, fn_ret) {
                    Ok(())
                } else {
                    Err((ret, fn_ret))
                }
            });

        let symbol = FunctionSymbol::Function { function, generics };

        match bound {
            Ok(()) => {
                resolver.resolve(symbol);

                Outcome::Resolved
            },
            Err((a, b)) => {
                self.fill_mismatch(&mut header.diagnostic, a, b);
                resolver.fail(symbol, header.diagnostic, Some(&mut self.diagnostics));

                Outcome::Failed
            },
        }
    }

    fn fail_overload(
        &mut self,
        constraint: Overload,
        kind: DiagnosticKind,
        tied: Vec<FnId>,
    ) -> Outcome {
        let Overload {
            mut header,
            name,
            args,
            ret,
            resolver,
            ..
        } = constraint;

        let name = self.rodeo.resolve(&name).to_string();

        let symbol = match kind {
            DiagnosticKind::AmbiguousOverload => {
                let candidates = tied
                    .iter()
                    .map(|function| {
                        format!("'{}'", self.display_type_info(self.function(*function).ty))
                    })
                    .collect::<Vec<_>>()
                    .join(", ");

                header.diagnostic.fill(kind, vec![name, candidates]);

                FunctionSymbol::Ambiguous(tied)
            },
            _ => {
                header.diagnostic.fill(kind, vec![name, self.display_list(&args)]);

                FunctionSymbol::Error
            },
        };

        let error = self.error_type();
        self.unify(ret, error);

        let diagnostics = if self.has_error(&args) {
            None
        } else {
            Some(&mut self.diagnostics)
        };
        resolver.fail(symbol, header.diagnostic, diagnostics);

        Outcome::Failed
    }
}
