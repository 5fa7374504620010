use super::{
    promise::{Fallback, Promise, Resolver},
    score::ScoreVector,
    ConstraintId, FnId, FunctionSymbol, MemberSymbol, Solver, TypeId,
};
use crate::{
    common::{
        diagnostic::{DiagnosticBuilder, DiagnosticKind},
        src::Span,
        Symbol,
    },
    trace::Outcome,
};
use std::fmt;

mod assignable;
mod call;
mod common_type;
mod deferred;
mod member;
mod overload;
mod same_type;

pub(super) use deferred::Task;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    SameType,
    Assignable,
    CommonType,
    Member,
    Call,
    Overload,
    Await,
    Substituted,
    Forward,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:?}", self) }
}

#[derive(Debug)]
pub(super) struct Header {
    pub id: ConstraintId,
    pub diagnostic: DiagnosticBuilder,
}

pub(super) trait Constraint {
    fn header(&self) -> &Header;
}

macro_rules! impl_constraint {
    ($($name:ty),*) => {
        $(
            impl Constraint for $name {
                fn header(&self) -> &Header { &self.header }
            }
        )*
    };
}

#[derive(Debug)]
pub(super) struct SameType {
    pub header: Header,
    pub a: TypeId,
    pub b: TypeId,
    pub resolver: Resolver<()>,
}

#[derive(Debug)]
pub(super) struct Assignable {
    pub header: Header,
    pub target: TypeId,
    pub assigned: TypeId,
    pub resolver: Resolver<()>,
}

#[derive(Debug)]
pub(super) struct CommonType {
    pub header: Header,
    pub common: TypeId,
    pub alternatives: Vec<TypeId>,
    pub resolver: Resolver<()>,
}

#[derive(Debug)]
pub(super) struct Member {
    pub header: Header,
    pub accessed: TypeId,
    pub name: Symbol,
    /// Slot unified with the type of the member
    pub ty: TypeId,
    pub resolver: Resolver<MemberSymbol>,
}

#[derive(Debug)]
pub(super) struct Call {
    pub header: Header,
    pub called: TypeId,
    pub args: Vec<TypeId>,
    pub ret: TypeId,
    pub scores: Option<ScoreVector>,
    pub resolver: Resolver<()>,
}

#[derive(Debug)]
pub(super) struct Candidate {
    pub function: FnId,
    pub scores: ScoreVector,
}

#[derive(Debug)]
pub(super) struct Overload {
    pub header: Header,
    pub name: Symbol,
    pub candidates: Vec<Candidate>,
    pub args: Vec<TypeId>,
    pub ret: TypeId,
    pub resolver: Resolver<FunctionSymbol>,
}

pub(super) struct Deferred<'a> {
    pub header: Header,
    pub task: Box<dyn Task<'a> + 'a>,
}

impl<'a> fmt::Debug for Deferred<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("header", &self.header)
            .finish()
    }
}

impl_constraint!(SameType, Assignable, CommonType, Member, Call, Overload, Deferred<'_>);

/// Result of applying a rule that may only partially refine its constraint
pub(super) enum Step<C> {
    Solved(Outcome),
    Advanced(C),
    Stale(C),
}

/// Live constraints, one insertion ordered list per kind
#[derive(Debug, Default)]
pub(super) struct ConstraintStore<'a> {
    pub same_types: Vec<SameType>,
    pub assignables: Vec<Assignable>,
    pub common_types: Vec<CommonType>,
    pub members: Vec<Member>,
    pub deferred: Vec<Deferred<'a>>,
    pub overloads: Vec<Overload>,
    pub calls: Vec<Call>,
}

impl<'a> ConstraintStore<'a> {
    pub fn len(&self) -> usize {
        self.same_types.len()
            + self.assignables.len()
            + self.common_types.len()
            + self.members.len()
            + self.deferred.len()
            + self.overloads.len()
            + self.calls.len()
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl<'a> Solver<'a> {
    fn header(&mut self, kind: ConstraintKind, span: Span) -> Header {
        let id = self.constraint_id_counter.new_id();

        tracing::trace!("Registering {} constraint {}", kind, id.index());

        if let Some(trace) = self.trace.as_mut() {
            trace.register(id, kind, self.current);
        }

        Header {
            id,
            diagnostic: DiagnosticBuilder::new(span),
        }
    }

    pub(super) fn fill_mismatch(&self, diagnostic: &mut DiagnosticBuilder, a: TypeId, b: TypeId) {
        diagnostic.fill(DiagnosticKind::TypeMismatch, vec![
            self.display_type_info(a).to_string(),
            self.display_type_info(b).to_string(),
        ])
    }

    pub(super) fn has_error(&self, types: &[TypeId]) -> bool {
        types.iter().any(|ty| self.is_error(*ty))
    }

    /// Requires `a` and `b` to be the same type
    pub fn same_type(&mut self, a: TypeId, b: TypeId, span: Span) -> Promise<()> {
        let header = self.header(ConstraintKind::SameType, span);
        let (resolver, promise) = Promise::pending();

        self.store.same_types.push(SameType {
            header,
            a,
            b,
            resolver,
        });

        promise
    }

    /// Requires a value of type `assigned` to be assignable to `target`
    pub fn assignable(&mut self, target: TypeId, assigned: TypeId, span: Span) -> Promise<()> {
        let header = self.header(ConstraintKind::Assignable, span);
        let (resolver, promise) = Promise::pending();

        self.store.assignables.push(Assignable {
            header,
            target,
            assigned,
            resolver,
        });

        promise
    }

    /// Binds `common` to the type every alternative converts to
    ///
    /// # Panics
    ///
    /// If `alternatives` is empty
    pub fn common_type(&mut self, common: TypeId, alternatives: Vec<TypeId>, span: Span) -> Promise<()> {
        assert!(!alternatives.is_empty(), "Common type of no alternatives");

        let header = self.header(ConstraintKind::CommonType, span);
        let (resolver, promise) = Promise::pending();

        self.store.common_types.push(CommonType {
            header,
            common,
            alternatives,
            resolver,
        });

        promise
    }

    /// Looks up the member `name` of `accessed`, its type is unified with `ty`
    pub fn member(&mut self, accessed: TypeId, name: Symbol, ty: TypeId, span: Span) -> Promise<MemberSymbol> {
        let header = self.header(ConstraintKind::Member, span);
        let (resolver, promise) = Promise::pending();

        self.store.members.push(Member {
            header,
            accessed,
            name,
            ty,
            resolver,
        });

        promise
    }

    /// Calls a value of type `called`, its return type is unified with `ret`
    pub fn call(&mut self, called: TypeId, args: Vec<TypeId>, ret: TypeId, span: Span) -> Promise<()> {
        let header = self.header(ConstraintKind::Call, span);
        let (resolver, promise) = Promise::pending();

        self.store.calls.push(Call {
            header,
            called,
            args,
            ret,
            scores: None,
            resolver,
        });

        promise
    }

    /// Selects the candidate that best matches `args`
    ///
    /// Candidates whose arity can't match are discarded right away.
    ///
    /// # Panics
    ///
    /// If `candidates` is empty
    pub fn overload(
        &mut self,
        candidates: Vec<FnId>,
        args: Vec<TypeId>,
        ret: TypeId,
        span: Span,
    ) -> Promise<FunctionSymbol> {
        let name = match candidates.first() {
            Some(function) => self.function(*function).sig.ident,
            None => {
                tracing::error!("Overload constraint without candidates");
                panic!("Overload constraint requires at least one candidate")
            },
        };

        let candidates = candidates
            .into_iter()
            .filter(|function| {
                let sig = &self.function(*function).sig;
                self.matches_parameter_count(sig.params.len(), sig.variadic, args.len())
            })
            .map(|function| Candidate {
                function,
                scores: ScoreVector::undecided(args.len()),
            })
            .collect();

        let header = self.header(ConstraintKind::Overload, span);
        let (resolver, promise) = Promise::pending();

        self.store.overloads.push(Overload {
            header,
            name,
            candidates,
            args,
            ret,
            resolver,
        });

        promise
    }

    fn defer(&mut self, kind: ConstraintKind, span: Span, task: Box<dyn Task<'a> + 'a>) {
        let header = self.header(kind, span);

        self.store.deferred.push(Deferred { header, task });
    }

    /// Runs `map` once `awaited` is settled
    ///
    /// A failed `awaited` still runs `map` with its placeholder but the
    /// resulting promise is failed silently
    pub fn await_promise<T, U>(
        &mut self,
        awaited: Promise<T>,
        map: impl FnOnce(&mut Solver<'a>, T) -> U + 'a,
        span: Span,
    ) -> Promise<U>
    where
        T: Clone + 'static,
        U: Clone + Fallback + 'static,
    {
        let (resolver, promise) = Promise::pending();

        self.defer(
            ConstraintKind::Await,
            span,
            Box::new(deferred::Await {
                awaited,
                map: Box::new(map),
                resolver,
            }),
        );

        promise
    }

    /// Like [`await_promise`](Self::await_promise) but `continuation` returns
    /// a promise, typically one of a constraint it registered, which the
    /// result follows
    pub fn await_then<T, U>(
        &mut self,
        awaited: Promise<T>,
        continuation: impl FnOnce(&mut Solver<'a>, T) -> Promise<U> + 'a,
        span: Span,
    ) -> Promise<U>
    where
        T: Clone + 'static,
        U: Clone + Fallback + 'static,
    {
        let outer = self.await_promise(awaited, continuation, span);
        let (resolver, promise) = Promise::pending();

        self.defer(
            ConstraintKind::Await,
            span,
            Box::new(deferred::Flatten { outer, resolver }),
        );

        promise
    }

    /// Runs `map` with the substitution of `original` once it's no longer a
    /// type variable
    pub fn substituted<U>(
        &mut self,
        original: TypeId,
        map: impl FnOnce(&mut Solver<'a>, TypeId) -> U + 'a,
        span: Span,
    ) -> Promise<U>
    where
        U: Clone + Fallback + 'static,
    {
        let (resolver, promise) = Promise::pending();

        self.defer(
            ConstraintKind::Substituted,
            span,
            Box::new(deferred::Substituted {
                original,
                map: Box::new(map),
                resolver,
            }),
        );

        promise
    }

    /// Settles `resolver` with the state of `source` once it settles
    pub(super) fn forward<T>(&mut self, source: Promise<T>, resolver: Resolver<T>, span: Span)
    where
        T: Clone + Fallback + 'static,
    {
        self.defer(
            ConstraintKind::Forward,
            span,
            Box::new(deferred::Forward { source, resolver }),
        );
    }
}
