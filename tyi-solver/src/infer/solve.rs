use super::{
    constraints::{Constraint, Step},
    promise::Fallback,
    ConstraintId, FunctionSymbol, MemberSymbol, Solver, TypeId,
};
use crate::{
    common::diagnostic::{Diagnostic, Diagnostics},
    trace::Outcome,
};
use std::mem;

/// How a solve run ended
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SolveState {
    /// Every constraint was settled by its rule
    Complete,
    /// No rule could make progress, `abandoned` constraints were force
    /// failed silently
    Stuck { abandoned: usize },
}

impl<'a> Solver<'a> {
    /// Drives the constraints to a fixpoint
    ///
    /// Constraints left once no rule can make progress are failed without
    /// diagnostics and every type variable still unbound is bound to the
    /// error type.
    #[tracing::instrument(skip(self))]
    pub fn solve(&mut self) -> SolveState {
        tracing::debug!("Starting constraint solver loop");

        loop {
            // All constraints have been settled
            if self.store.is_empty() {
                return SolveState::Complete;
            }

            if let Some(trace) = self.trace.as_mut() {
                trace.next_pass();
            }

            if !self.apply_rules() {
                let abandoned = self.store.len();
                tracing::warn!("Solver is stuck, abandoning {} constraints", abandoned);

                self.force_fail();

                let bound = self.bind_unresolved();
                tracing::debug!("Bound {} unresolved type variables to the error type", bound);

                return SolveState::Stuck { abandoned };
            }
        }
    }

    /// Solves and hands out the diagnostics emitted so far
    pub fn solve_all(&mut self) -> Result<SolveState, Vec<Diagnostic>> {
        let state = self.solve();

        if self.diagnostics.is_empty() {
            Ok(state)
        } else {
            Err(self.diagnostics.take())
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics { &self.diagnostics }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> { self.diagnostics.take() }

    fn with_current<R>(&mut self, id: ConstraintId, f: impl FnOnce(&mut Self) -> R) -> R {
        let parent = self.current.replace(id);
        let res = f(self);
        self.current = parent;
        res
    }

    fn settle(&mut self, id: ConstraintId, outcome: Outcome) {
        if let Some(trace) = self.trace.as_mut() {
            trace.settle(id, outcome);
        }
    }

    fn advance(&mut self, id: ConstraintId) {
        if let Some(trace) = self.trace.as_mut() {
            trace.advance(id);
        }
    }

    /// Applies a partially refining rule to every ready constraint of a list
    ///
    /// Returns the constraints that stay live and whether any rule advanced
    fn drive_all<C: Constraint>(
        &mut self,
        constraints: Vec<C>,
        ready: impl Fn(&Self, &C) -> bool,
        rule: impl Fn(&mut Self, C) -> Step<C>,
    ) -> (Vec<C>, bool) {
        let mut kept = Vec::with_capacity(constraints.len());
        let mut progress = false;

        for constraint in constraints {
            if !ready(self, &constraint) {
                kept.push(constraint);
                continue;
            }

            let id = constraint.header().id;

            match self.with_current(id, |solver| rule(solver, constraint)) {
                Step::Solved(outcome) => {
                    self.settle(id, outcome);
                    progress = true;
                },
                Step::Advanced(constraint) => {
                    self.advance(id);
                    kept.push(constraint);
                    progress = true;
                },
                Step::Stale(constraint) => kept.push(constraint),
            }
        }

        (kept, progress)
    }

    /// One scheduler pass, returns whether any rule made progress
    fn apply_rules(&mut self) -> bool {
        if !self.store.same_types.is_empty() {
            let constraint = self.store.same_types.remove(0);
            let id = constraint.header.id;
            let outcome = self.with_current(id, |solver| solver.solve_same_type(constraint));
            self.settle(id, outcome);

            return true;
        }

        let ready = self.store.assignables.iter().position(|constraint| {
            !self.is_type_variable(constraint.target) && !self.is_type_variable(constraint.assigned)
        });
        if let Some(pos) = ready {
            let constraint = self.store.assignables.remove(pos);
            let id = constraint.header.id;
            let outcome = self.with_current(id, |solver| solver.solve_assignable(constraint));
            self.settle(id, outcome);

            return true;
        }

        let ready = self.store.common_types.iter().position(|constraint| {
            constraint
                .alternatives
                .iter()
                .all(|alt| !self.is_type_variable(*alt))
        });
        if let Some(pos) = ready {
            let constraint = self.store.common_types.remove(pos);
            let id = constraint.header.id;
            let outcome = self.with_current(id, |solver| solver.solve_common_type(constraint));
            self.settle(id, outcome);

            return true;
        }

        let ready = self
            .store
            .members
            .iter()
            .position(|constraint| !self.is_type_variable(constraint.accessed));
        if let Some(pos) = ready {
            let constraint = self.store.members.remove(pos);
            let id = constraint.header.id;
            let outcome = self.with_current(id, |solver| solver.solve_member(constraint));
            self.settle(id, outcome);

            return true;
        }

        let solver = &*self;
        let ready = self
            .store
            .deferred
            .iter()
            .position(|deferred| deferred.task.is_ready(solver));
        if let Some(pos) = ready {
            let deferred = self.store.deferred.remove(pos);
            let id = deferred.header.id;
            let task = deferred.task;
            let outcome = self.with_current(id, |solver| task.run(solver));
            self.settle(id, outcome);

            return true;
        }

        let overloads = mem::take(&mut self.store.overloads);
        let (mut kept, progress) =
            self.drive_all(overloads, |_, _| true, |solver, c| solver.solve_overload(c));
        kept.append(&mut self.store.overloads);
        self.store.overloads = kept;

        if progress {
            return true;
        }

        let calls = mem::take(&mut self.store.calls);
        let (mut kept, progress) = self.drive_all(
            calls,
            |solver, c| !solver.is_type_variable(c.called),
            |solver, c| solver.solve_call(c),
        );
        kept.append(&mut self.store.calls);
        self.store.calls = kept;

        if progress {
            return true;
        }

        let solver = &*self;
        let ready = self
            .store
            .assignables
            .iter()
            .position(|constraint| solver.is_type_variable(constraint.target));
        if let Some(pos) = ready {
            let target = self.get_base(self.store.assignables[pos].target);
            let (mut group, rest): (Vec<_>, Vec<_>) = mem::take(&mut self.store.assignables)
                .into_iter()
                .partition(|constraint| self.get_base(constraint.target) == target);
            self.store.assignables = rest;

            let ids: Vec<_> = group.iter().map(|constraint| constraint.header.id).collect();

            if group.len() > 1 {
                self.with_current(ids[0], |solver| solver.merge_assignables(group));

                for id in ids {
                    self.settle(id, Outcome::Merged);
                }
            } else if let Some(constraint) = group.pop() {
                let outcome = self.with_current(ids[0], |solver| solver.assume_equal(constraint));
                self.settle(ids[0], outcome);
            }

            return true;
        }

        let solver = &*self;
        let ready = self
            .store
            .assignables
            .iter()
            .position(|constraint| solver.is_type_variable(constraint.assigned));
        if let Some(pos) = ready {
            let constraint = self.store.assignables.remove(pos);
            let id = constraint.header.id;
            let outcome = self.with_current(id, |solver| solver.assume_equal(constraint));
            self.settle(id, outcome);

            return true;
        }

        false
    }

    fn bind_error(&mut self, ty: TypeId) {
        let error = self.error_type();
        self.unify(ty, error);
    }

    /// Fails every remaining constraint without diagnostics
    fn force_fail(&mut self) {
        let store = mem::take(&mut self.store);

        for constraint in store.same_types {
            self.settle(constraint.header.id, Outcome::Forced);
            constraint
                .resolver
                .fail((), constraint.header.diagnostic, None);
        }

        for constraint in store.assignables {
            self.settle(constraint.header.id, Outcome::Forced);
            self.bind_error(constraint.target);
            constraint
                .resolver
                .fail((), constraint.header.diagnostic, None);
        }

        for constraint in store.common_types {
            self.settle(constraint.header.id, Outcome::Forced);
            self.bind_error(constraint.common);
            constraint
                .resolver
                .fail((), constraint.header.diagnostic, None);
        }

        for constraint in store.members {
            self.settle(constraint.header.id, Outcome::Forced);
            self.bind_error(constraint.ty);
            constraint.resolver.fail(
                MemberSymbol::fallback(&self.types),
                constraint.header.diagnostic,
                None,
            );
        }

        for deferred in store.deferred {
            self.settle(deferred.header.id, Outcome::Forced);
            deferred.task.abandon(self);
        }

        for constraint in store.overloads {
            self.settle(constraint.header.id, Outcome::Forced);
            self.bind_error(constraint.ret);
            constraint.resolver.fail(
                FunctionSymbol::fallback(&self.types),
                constraint.header.diagnostic,
                None,
            );
        }

        for constraint in store.calls {
            self.settle(constraint.header.id, Outcome::Forced);
            self.bind_error(constraint.ret);
            constraint
                .resolver
                .fail((), constraint.header.diagnostic, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::{diagnostic::DiagnosticKind, new_rodeo, src::Span, Rodeo},
        infer::{FnId, FnSig, Promise, PromiseState},
    };

    struct Fixture<'a> {
        solver: Solver<'a>,
        int: TypeId,
        float: TypeId,
        string: TypeId,
        unit: TypeId,
    }

    impl<'a> Fixture<'a> {
        fn new(rodeo: &'a Rodeo) -> Self {
            let mut solver = Solver::new(rodeo);

            let mut primitive = |name| {
                let decl = solver.add_struct(name, vec![]);
                solver.decl_type(decl)
            };

            let int = primitive("Int");
            let float = primitive("Float");
            let string = primitive("String");
            let unit = primitive("Unit");

            Fixture {
                solver,
                int,
                float,
                string,
                unit,
            }
        }

        fn function(&mut self, name: &str, params: Vec<TypeId>, ret: TypeId) -> FnId {
            let ident = self.solver.intern(name);

            self.solver.add_function(FnSig {
                ident,
                generics: vec![],
                params,
                ret,
                variadic: false,
            })
        }

        fn var(&mut self) -> TypeId { self.solver.type_var(Span::None) }
    }

    #[test]
    fn single_assignment_binds_target() {
        let rodeo = new_rodeo();
        let mut fx = Fixture::new(&rodeo);

        let v1 = fx.var();
        let promise = fx.solver.assignable(v1, fx.int, Span::None);

        assert_eq!(fx.solver.solve_all(), Ok(SolveState::Complete));
        assert_eq!(fx.solver.substitution(v1), fx.int);
        assert_eq!(promise.state(), PromiseState::Resolved(()));
    }

    #[test]
    fn competing_assignments_without_common_type() {
        let rodeo = new_rodeo();
        let mut fx = Fixture::new(&rodeo);

        let v1 = fx.var();
        let first = fx.solver.assignable(v1, fx.int, Span::range(0, 3));
        let second = fx.solver.assignable(v1, fx.float, Span::range(4, 9));

        let diagnostics = fx.solver.solve_all().unwrap_err();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind(), DiagnosticKind::NoCommonType);
        assert_eq!(
            diagnostics[0].message(),
            "No common type between Int, Float"
        );
        assert!(fx.solver.is_error(v1));
        assert!(first.is_resolved());
        assert!(second.is_resolved());
    }

    #[test]
    fn competing_assignments_with_common_base() {
        let rodeo = new_rodeo();
        let mut fx = Fixture::new(&rodeo);

        let base = fx.solver.add_struct("Base", vec![]);
        let base = fx.solver.decl_type(base);
        let derived = fx.solver.add_struct("Derived", vec![]);
        fx.solver.add_base(derived, base);
        let derived = fx.solver.decl_type(derived);

        let v1 = fx.var();
        fx.solver.assignable(v1, derived, Span::None);
        fx.solver.assignable(v1, base, Span::None);

        assert_eq!(fx.solver.solve_all(), Ok(SolveState::Complete));
        assert_eq!(fx.solver.substitution(v1), base);
    }

    #[test]
    fn member_with_single_match() {
        let rodeo = new_rodeo();
        let mut fx = Fixture::new(&rodeo);

        let bool_decl = fx.solver.add_struct("Bool", vec![]);
        let boolean = fx.solver.decl_type(bool_decl);
        let foo = fx.solver.add_struct("Foo", vec![]);
        let bar = fx.solver.add_field(foo, "bar", boolean);
        let foo = fx.solver.decl_type(foo);

        let slot = fx.var();
        let name = fx.solver.intern("bar");
        let promise = fx.solver.member(foo, name, slot, Span::None);

        assert_eq!(fx.solver.solve_all(), Ok(SolveState::Complete));
        assert_eq!(promise.result(), MemberSymbol::Member(bar));
        assert_eq!(fx.solver.substitution(slot), boolean);
    }

    #[test]
    fn missing_member() {
        let rodeo = new_rodeo();
        let mut fx = Fixture::new(&rodeo);

        let foo = fx.solver.add_struct("Foo", vec![]);
        let foo = fx.solver.decl_type(foo);

        let slot = fx.var();
        let name = fx.solver.intern("baz");
        let promise = fx.solver.member(foo, name, slot, Span::single(2));

        let diagnostics = fx.solver.solve_all().unwrap_err();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message(),
            "No member named 'baz' in type 'Foo'"
        );
        assert_eq!(diagnostics[0].spans(), &[Span::single(2)]);
        assert_eq!(promise.state(), PromiseState::Failed {
            value: MemberSymbol::Undefined,
            reported: true,
        });
        assert!(fx.solver.is_error(slot));
    }

    #[test]
    fn overload_picks_exact_match() {
        let rodeo = new_rodeo();
        let mut fx = Fixture::new(&rodeo);

        let f_int = fx.function("f", vec![fx.int], fx.unit);
        let f_string = fx.function("f", vec![fx.string], fx.unit);

        let ret = fx.var();
        let promise = fx
            .solver
            .overload(vec![f_int, f_string], vec![fx.int], ret, Span::None);

        assert_eq!(fx.solver.solve_all(), Ok(SolveState::Complete));
        assert_eq!(promise.result().function(), Some(f_int));
        assert_eq!(fx.solver.substitution(ret), fx.unit);
    }

    #[test]
    fn overload_accepts_derived_argument() {
        let rodeo = new_rodeo();
        let mut fx = Fixture::new(&rodeo);

        let base = fx.solver.add_struct("Base", vec![]);
        let base = fx.solver.decl_type(base);
        let derived = fx.solver.add_struct("Derived", vec![]);
        fx.solver.add_base(derived, base);
        let derived = fx.solver.decl_type(derived);

        let f_int = fx.function("f", vec![fx.int], fx.unit);
        let f_base = fx.function("f", vec![base], fx.unit);

        let ret = fx.var();
        let promise = fx
            .solver
            .overload(vec![f_int, f_base], vec![derived], ret, Span::None);

        assert_eq!(fx.solver.solve_all(), Ok(SolveState::Complete));
        assert_eq!(promise.result().function(), Some(f_base));
        assert_eq!(fx.solver.substitution(ret), fx.unit);
    }

    #[test]
    fn arity_filters_candidates() {
        let rodeo = new_rodeo();
        let mut fx = Fixture::new(&rodeo);

        let unary = fx.function("f", vec![fx.int], fx.unit);
        let binary = fx.function("f", vec![fx.int, fx.int], fx.float);

        let ret = fx.var();
        let promise = fx
            .solver
            .overload(vec![unary, binary], vec![fx.int, fx.int], ret, Span::None);

        assert_eq!(fx.solver.solve_all(), Ok(SolveState::Complete));
        assert_eq!(promise.result().function(), Some(binary));
        assert_eq!(fx.solver.substitution(ret), fx.float);
    }

    #[test]
    fn exact_arity_beats_variadic() {
        let rodeo = new_rodeo();
        let mut fx = Fixture::new(&rodeo);

        let ints = fx.solver.array(1, fx.int);
        let exact = fx.function("f", vec![fx.int], fx.unit);
        let ident = fx.solver.intern("f");
        let variadic = fx.solver.add_function(FnSig {
            ident,
            generics: vec![],
            params: vec![ints],
            ret: fx.float,
            variadic: true,
        });

        let ret = fx.var();
        let promise = fx
            .solver
            .overload(vec![variadic, exact], vec![fx.int], ret, Span::None);

        let many = fx.var();
        let variadic_only = fx.solver.overload(
            vec![variadic, exact],
            vec![fx.int, fx.int, fx.int],
            many,
            Span::None,
        );

        assert_eq!(fx.solver.solve_all(), Ok(SolveState::Complete));
        assert_eq!(promise.result().function(), Some(exact));
        assert_eq!(variadic_only.result().function(), Some(variadic));
        assert_eq!(fx.solver.substitution(many), fx.float);
    }

    #[test]
    fn ambiguous_overload() {
        let rodeo = new_rodeo();
        let mut fx = Fixture::new(&rodeo);

        let left = fx.solver.add_struct("Left", vec![]);
        let left = fx.solver.decl_type(left);
        let right = fx.solver.add_struct("Right", vec![]);
        let right = fx.solver.decl_type(right);
        let both = fx.solver.add_struct("Both", vec![]);
        fx.solver.add_base(both, left);
        fx.solver.add_base(both, right);
        let both = fx.solver.decl_type(both);

        let f_left = fx.function("f", vec![left], fx.unit);
        let f_right = fx.function("f", vec![right], fx.unit);

        let ret = fx.var();
        let promise = fx
            .solver
            .overload(vec![f_left, f_right], vec![both], ret, Span::None);

        let diagnostics = fx.solver.solve_all().unwrap_err();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message(),
            "Ambiguous call to 'f', candidates are 'fn(Left) -> Unit', 'fn(Right) -> Unit'"
        );
        assert_eq!(
            promise.result(),
            FunctionSymbol::Ambiguous(vec![f_left, f_right])
        );
        assert!(fx.solver.is_error(ret));
    }

    #[test]
    fn no_matching_overload() {
        let rodeo = new_rodeo();
        let mut fx = Fixture::new(&rodeo);

        let f_int = fx.function("f", vec![fx.int], fx.unit);

        let ret = fx.var();
        let promise = fx
            .solver
            .overload(vec![f_int], vec![fx.string], ret, Span::None);

        let diagnostics = fx.solver.solve_all().unwrap_err();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message(),
            "No overload of 'f' accepts arguments (String)"
        );
        assert_eq!(promise.result(), FunctionSymbol::Error);
        assert!(fx.solver.is_error(ret));
    }

    #[test]
    fn error_arguments_fail_silently() {
        let rodeo = new_rodeo();
        let mut fx = Fixture::new(&rodeo);

        let f_int = fx.function("f", vec![fx.int], fx.unit);
        let f_string = fx.function("f", vec![fx.string], fx.unit);
        let error = fx.solver.error_type();

        let ret = fx.var();
        let promise = fx
            .solver
            .overload(vec![f_int, f_string], vec![error], ret, Span::None);

        assert_eq!(fx.solver.solve_all(), Ok(SolveState::Complete));
        assert_eq!(promise.state(), PromiseState::Failed {
            value: FunctionSymbol::Ambiguous(vec![f_int, f_string]),
            reported: false,
        });
    }

    #[test]
    fn generic_candidates_are_instantiated() {
        let rodeo = new_rodeo();
        let mut fx = Fixture::new(&rodeo);

        let t = fx.solver.add_generic("T");
        let t_ty = fx.solver.param(t).ty;
        let ident = fx.solver.intern("identity");
        let identity = fx.solver.add_function(FnSig {
            ident,
            generics: vec![t],
            params: vec![t_ty],
            ret: t_ty,
            variadic: false,
        });

        let first = fx.var();
        let second = fx.var();
        fx.solver
            .overload(vec![identity], vec![fx.int], first, Span::None);
        let promise = fx
            .solver
            .overload(vec![identity], vec![fx.string], second, Span::None);

        assert_eq!(fx.solver.solve_all(), Ok(SolveState::Complete));
        assert_eq!(fx.solver.substitution(first), fx.int);
        assert_eq!(fx.solver.substitution(second), fx.string);

        match promise.result() {
            FunctionSymbol::Function { function, generics } => {
                assert_eq!(function, identity);
                assert_eq!(generics.len(), 1);
                assert_eq!(fx.solver.substitution(generics[0]), fx.string);
            },
            other => panic!("Unexpected symbol {:?}", other),
        }
    }

    #[test]
    fn call_waits_for_function_type() {
        let rodeo = new_rodeo();
        let mut fx = Fixture::new(&rodeo);

        let called = fx.var();
        let ret = fx.var();
        let fun = fx.solver.fn_type(vec![fx.int], fx.float, false);

        let call = fx.solver.call(called, vec![fx.int], ret, Span::None);
        fx.solver.assignable(called, fun, Span::None);

        assert_eq!(fx.solver.solve_all(), Ok(SolveState::Complete));
        assert_eq!(call.state(), PromiseState::Resolved(()));
        assert_eq!(fx.solver.substitution(ret), fx.float);
    }

    #[test]
    fn call_on_non_function() {
        let rodeo = new_rodeo();
        let mut fx = Fixture::new(&rodeo);

        let ret = fx.var();
        fx.solver.call(fx.int, vec![], ret, Span::range(1, 4));

        let diagnostics = fx.solver.solve_all().unwrap_err();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind(), DiagnosticKind::CallNonFunction);
        assert_eq!(diagnostics[0].message(), "Type 'Int' cannot be called");
        assert!(fx.solver.is_error(ret));
    }

    #[test]
    fn stuck_constraints_fail_silently() {
        let rodeo = new_rodeo();
        let mut fx = Fixture::new(&rodeo);

        let called = fx.var();
        let ret = fx.var();
        let call = fx.solver.call(called, vec![fx.int], ret, Span::None);

        let accessed = fx.var();
        let slot = fx.var();
        let name = fx.solver.intern("field");
        let member = fx.solver.member(accessed, name, slot, Span::None);

        assert_eq!(
            fx.solver.solve_all(),
            Ok(SolveState::Stuck { abandoned: 2 })
        );
        assert_eq!(call.state(), PromiseState::Failed {
            value: (),
            reported: false
        });
        assert_eq!(member.result(), MemberSymbol::Undefined);
        assert!(fx.solver.is_error(ret));
        assert!(fx.solver.is_error(slot));
        assert!(fx.solver.is_error(called));
        assert!(fx.solver.is_error(accessed));
    }

    #[test]
    fn stuck_overload_fails_silently() {
        let rodeo = new_rodeo();
        let mut fx = Fixture::new(&rodeo);

        let f_int = fx.function("f", vec![fx.int], fx.unit);
        let f_string = fx.function("f", vec![fx.string], fx.unit);

        let arg = fx.var();
        let ret = fx.var();
        let promise = fx
            .solver
            .overload(vec![f_int, f_string], vec![arg], ret, Span::None);

        assert_eq!(
            fx.solver.solve_all(),
            Ok(SolveState::Stuck { abandoned: 1 })
        );
        assert_eq!(promise.state(), PromiseState::Failed {
            value: FunctionSymbol::Error,
            reported: false
        });
        assert!(fx.solver.is_error(ret));
        assert!(fx.solver.take_diagnostics().is_empty());
    }

    #[test]
    fn never_argument_is_not_silent() {
        let rodeo = new_rodeo();
        let mut fx = Fixture::new(&rodeo);

        let f_int = fx.function("f", vec![fx.int], fx.unit);
        let f_string = fx.function("f", vec![fx.string], fx.unit);

        let never = fx.solver.never_type();
        let ret = fx.var();
        let promise = fx
            .solver
            .overload(vec![f_int, f_string], vec![never], ret, Span::None);

        let diagnostics = fx.solver.solve_all().unwrap_err();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind(), DiagnosticKind::AmbiguousOverload);
        assert_eq!(
            promise.result(),
            FunctionSymbol::Ambiguous(vec![f_int, f_string])
        );
        assert!(fx.solver.is_error(ret));
    }

    #[test]
    fn mismatch_is_reported_once() {
        let rodeo = new_rodeo();
        let mut fx = Fixture::new(&rodeo);

        let v = fx.var();
        let error = fx.solver.error_type();
        fx.solver.same_type(fx.int, fx.float, Span::range(0, 5));
        fx.solver.same_type(v, error, Span::None);
        fx.solver.same_type(v, fx.string, Span::None);

        let diagnostics = fx.solver.solve_all().unwrap_err();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].to_string(),
            "error[TypeMismatch]: Type mismatch between 'Int' and 'Float'"
        );
    }

    #[test]
    fn plain_derived_types_are_not_assignable() {
        let rodeo = new_rodeo();
        let mut fx = Fixture::new(&rodeo);

        let base = fx.solver.add_struct("Base", vec![]);
        let base = fx.solver.decl_type(base);
        let derived = fx.solver.add_struct("Derived", vec![]);
        fx.solver.add_base(derived, base);
        let derived = fx.solver.decl_type(derived);

        fx.solver.assignable(base, derived, Span::None);

        let diagnostics = fx.solver.solve_all().unwrap_err();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind(), DiagnosticKind::TypeMismatch);
    }

    #[test]
    fn member_overload_set_feeds_overload() {
        let rodeo = new_rodeo();
        let mut fx = Fixture::new(&rodeo);

        let foo = fx.solver.add_struct("Foo", vec![]);
        let get_int = fx.function("get", vec![fx.int], fx.int);
        let get_string = fx.function("get", vec![fx.string], fx.string);
        fx.solver.add_method(foo, get_int);
        fx.solver.add_method(foo, get_string);
        let foo_ty = fx.solver.decl_type(foo);

        let accessed = fx.var();
        let slot = fx.var();
        let ret = fx.var();
        let arg = fx.var();
        let name = fx.solver.intern("get");

        let member = fx.solver.member(accessed, name, slot, Span::None);
        let selected = fx.solver.await_then(
            member.clone(),
            move |solver, symbol| match symbol {
                MemberSymbol::OverloadSet(candidates) => {
                    solver.overload(candidates, vec![arg], ret, Span::None)
                },
                _ => Promise::resolved(FunctionSymbol::Error),
            },
            Span::None,
        );

        fx.solver.same_type(accessed, foo_ty, Span::None);
        fx.solver.same_type(arg, fx.string, Span::None);

        assert_eq!(fx.solver.solve_all(), Ok(SolveState::Complete));
        assert_eq!(
            member.result(),
            MemberSymbol::OverloadSet(vec![get_int, get_string])
        );
        assert_eq!(selected.result().function(), Some(get_string));
        assert_eq!(fx.solver.substitution(ret), fx.string);
    }

    #[test]
    fn await_and_substituted_run_in_order() {
        let rodeo = new_rodeo();
        let mut fx = Fixture::new(&rodeo);

        let v = fx.var();
        let assigned = fx.solver.assignable(v, fx.int, Span::None);
        let doubled = fx.solver.await_promise(assigned, |_, ()| Some(2u32), Span::None);
        let substitution = fx.solver.substituted(v, |_, ty| Some(ty), Span::None);
        let never = fx.var();
        let parked = fx.solver.substituted(never, |_, ty| Some(ty), Span::None);

        assert_eq!(
            fx.solver.solve_all(),
            Ok(SolveState::Stuck { abandoned: 1 })
        );
        assert_eq!(doubled.result(), Some(2));
        assert_eq!(substitution.result(), Some(fx.int));
        assert_eq!(parked.state(), PromiseState::Failed {
            value: None,
            reported: false
        });
    }

    #[test]
    fn common_type_ignores_absorbing_alternatives() {
        let rodeo = new_rodeo();
        let mut fx = Fixture::new(&rodeo);

        let common = fx.var();
        let never = fx.solver.never_type();
        let error = fx.solver.error_type();
        fx.solver
            .common_type(common, vec![never, fx.int, error, fx.int], Span::None);

        assert_eq!(fx.solver.solve_all(), Ok(SolveState::Complete));
        assert_eq!(fx.solver.substitution(common), fx.int);
    }
}
