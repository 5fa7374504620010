use crate::{
    common::diagnostic::DiagnosticBuilder,
    infer::{
        promise::{Fallback, Promise, PromiseState, Resolver},
        Solver, TypeId,
    },
    trace::Outcome,
};

/// Continuation parked until its ready predicate holds
pub(crate) trait Task<'a> {
    fn is_ready(&self, solver: &Solver<'a>) -> bool;

    /// Runs the continuation, only called once `is_ready` returned true
    fn run(self: Box<Self>, solver: &mut Solver<'a>) -> Outcome;

    /// Fails the task silently when solving stopped before it was ready
    fn abandon(self: Box<Self>, solver: &mut Solver<'a>);
}

fn settled_outcome<T>(state: &PromiseState<T>) -> Outcome {
    match state {
        PromiseState::Failed { .. } => Outcome::Failed,
        _ => Outcome::Resolved,
    }
}

pub(super) struct Await<'a, T, U> {
    pub awaited: Promise<T>,
    pub map: Box<dyn FnOnce(&mut Solver<'a>, T) -> U + 'a>,
    pub resolver: Resolver<U>,
}

impl<'a, T, U> Task<'a> for Await<'a, T, U>
where
    T: Clone + 'static,
    U: Fallback,
{
    fn is_ready(&self, _: &Solver<'a>) -> bool { self.awaited.is_resolved() }

    fn run(self: Box<Self>, solver: &mut Solver<'a>) -> Outcome {
        let Await {
            awaited,
            map,
            resolver,
        } = *self;

        match awaited.state() {
            PromiseState::Resolved(value) => {
                resolver.resolve(map(solver, value));
                Outcome::Resolved
            },
            PromiseState::Failed { value, .. } => {
                resolver.fail(map(solver, value), DiagnosticBuilder::default(), None);
                Outcome::Failed
            },
            PromiseState::Unresolved => {
                tracing::error!("Await ran before its promise was settled");
                unreachable!()
            },
        }
    }

    fn abandon(self: Box<Self>, solver: &mut Solver<'a>) {
        self.resolver
            .fail(U::fallback(solver), DiagnosticBuilder::default(), None)
    }
}

pub(super) struct Substituted<'a, U> {
    pub original: TypeId,
    pub map: Box<dyn FnOnce(&mut Solver<'a>, TypeId) -> U + 'a>,
    pub resolver: Resolver<U>,
}

impl<'a, U: Fallback> Task<'a> for Substituted<'a, U> {
    fn is_ready(&self, solver: &Solver<'a>) -> bool { !solver.is_type_variable(self.original) }

    fn run(self: Box<Self>, solver: &mut Solver<'a>) -> Outcome {
        let Substituted {
            original,
            map,
            resolver,
        } = *self;

        let substitution = solver.get_base(original);
        resolver.resolve(map(solver, substitution));

        Outcome::Resolved
    }

    fn abandon(self: Box<Self>, solver: &mut Solver<'a>) {
        self.resolver
            .fail(U::fallback(solver), DiagnosticBuilder::default(), None)
    }
}

pub(super) struct Forward<T> {
    pub source: Promise<T>,
    pub resolver: Resolver<T>,
}

impl<'a, T> Task<'a> for Forward<T>
where
    T: Clone + Fallback + 'static,
{
    fn is_ready(&self, _: &Solver<'a>) -> bool { self.source.is_resolved() }

    fn run(self: Box<Self>, _: &mut Solver<'a>) -> Outcome {
        let state = self.source.state();
        let outcome = settled_outcome(&state);

        self.resolver.mirror(state);

        outcome
    }

    fn abandon(self: Box<Self>, solver: &mut Solver<'a>) {
        self.resolver
            .fail(T::fallback(solver), DiagnosticBuilder::default(), None)
    }
}

/// Follows the promise produced by an await continuation
pub(super) struct Flatten<T> {
    pub outer: Promise<Promise<T>>,
    pub resolver: Resolver<T>,
}

impl<'a, T> Task<'a> for Flatten<T>
where
    T: Clone + Fallback + 'static,
{
    fn is_ready(&self, _: &Solver<'a>) -> bool {
        self.outer
            .try_result()
            .map_or(false, |inner| inner.is_resolved())
    }

    fn run(self: Box<Self>, _: &mut Solver<'a>) -> Outcome {
        let state = self.outer.result().state();
        let outcome = settled_outcome(&state);

        self.resolver.mirror(state);

        outcome
    }

    fn abandon(self: Box<Self>, solver: &mut Solver<'a>) {
        self.resolver
            .fail(T::fallback(solver), DiagnosticBuilder::default(), None)
    }
}
