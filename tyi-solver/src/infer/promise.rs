use super::{FunctionSymbol, MemberSymbol, TypeId, TypeTable};
use crate::common::diagnostic::{DiagnosticBuilder, Diagnostics};
use std::{cell::RefCell, fmt, rc::Rc};

#[derive(Debug, Clone, PartialEq)]
pub enum PromiseState<T> {
    Unresolved,
    Resolved(T),
    /// Settled with a placeholder value, `reported` tells whether a
    /// diagnostic was emitted for the failure
    Failed {
        value: T,
        reported: bool,
    },
}

impl<T> PromiseState<T> {
    pub fn is_settled(&self) -> bool { !matches!(self, PromiseState::Unresolved) }

    fn map<U>(self, f: impl FnOnce(T) -> U) -> PromiseState<U> {
        match self {
            PromiseState::Unresolved => PromiseState::Unresolved,
            PromiseState::Resolved(value) => PromiseState::Resolved(f(value)),
            PromiseState::Failed { value, reported } => PromiseState::Failed {
                value: f(value),
                reported,
            },
        }
    }
}

/// Value used when a constraint is abandoned without ever running
pub trait Fallback {
    fn fallback(types: &TypeTable) -> Self;
}

impl Fallback for () {
    fn fallback(_: &TypeTable) -> Self {}
}

impl Fallback for TypeId {
    fn fallback(types: &TypeTable) -> Self { types.error_type() }
}

impl Fallback for MemberSymbol {
    fn fallback(_: &TypeTable) -> Self { MemberSymbol::Undefined }
}

impl Fallback for FunctionSymbol {
    fn fallback(_: &TypeTable) -> Self { FunctionSymbol::Error }
}

impl<T> Fallback for Option<T> {
    fn fallback(_: &TypeTable) -> Self { None }
}

impl<T: Clone + Fallback + 'static> Fallback for Promise<T> {
    fn fallback(types: &TypeTable) -> Self {
        Promise {
            source: Rc::new(RefCell::new(PromiseState::Failed {
                value: T::fallback(types),
                reported: false,
            })),
        }
    }
}

trait Source<T> {
    fn state(&self) -> PromiseState<T>;
}

impl<T: Clone> Source<T> for RefCell<PromiseState<T>> {
    fn state(&self) -> PromiseState<T> { self.borrow().clone() }
}

struct Mapped<S, T> {
    source: Promise<S>,
    map: Box<dyn Fn(S) -> T>,
}

impl<S: Clone + 'static, T> Source<T> for Mapped<S, T> {
    fn state(&self) -> PromiseState<T> { self.source.state().map(&self.map) }
}

/// Read side of a single assignment cell
///
/// Cloning a promise shares the underlying cell
pub struct Promise<T> {
    source: Rc<dyn Source<T>>,
}

impl<T: Clone + 'static> Promise<T> {
    /// A promise that is already resolved
    pub fn resolved(value: T) -> Self {
        Promise {
            source: Rc::new(RefCell::new(PromiseState::Resolved(value))),
        }
    }

    /// Creates an unresolved promise together with the only handle able to
    /// settle it
    pub fn pending() -> (Resolver<T>, Self) {
        let cell = Rc::new(RefCell::new(PromiseState::Unresolved));

        (Resolver { cell: cell.clone() }, Promise { source: cell })
    }

    pub fn state(&self) -> PromiseState<T> { self.source.state() }

    /// True once the promise was either resolved or failed
    pub fn is_resolved(&self) -> bool { self.state().is_settled() }

    pub fn is_failed(&self) -> bool { matches!(self.state(), PromiseState::Failed { .. }) }

    /// Reads the settled value, failed promises yield their placeholder
    ///
    /// # Panics
    ///
    /// If the promise is still unresolved
    pub fn result(&self) -> T {
        match self.state() {
            PromiseState::Resolved(value) | PromiseState::Failed { value, .. } => value,
            PromiseState::Unresolved => {
                tracing::error!("Read of an unresolved promise");
                panic!("Promise read before being resolved")
            },
        }
    }

    pub fn try_result(&self) -> Option<T> {
        match self.state() {
            PromiseState::Resolved(value) | PromiseState::Failed { value, .. } => Some(value),
            PromiseState::Unresolved => None,
        }
    }

    /// Derives a promise settled whenever this one is, through `f`
    pub fn map<U: 'static>(&self, f: impl Fn(T) -> U + 'static) -> Promise<U> {
        Promise {
            source: Rc::new(Mapped {
                source: self.clone(),
                map: Box::new(f),
            }),
        }
    }
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Promise {
            source: self.source.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Promise").field(&self.source.state()).finish()
    }
}

/// Write side of a promise, owned by the constraint that created it
pub struct Resolver<T> {
    cell: Rc<RefCell<PromiseState<T>>>,
}

impl<T> Resolver<T> {
    pub fn is_settled(&self) -> bool { self.cell.borrow().is_settled() }

    fn settle(&self, state: PromiseState<T>) {
        let mut cell = self.cell.borrow_mut();

        if cell.is_settled() {
            tracing::error!("Promise settled twice");
            panic!("Promise was already resolved");
        }

        *cell = state;
    }

    pub fn resolve(&self, value: T) { self.settle(PromiseState::Resolved(value)) }

    /// Settles the promise with a placeholder value
    ///
    /// The diagnostic filled in the builder is pushed to `diagnostics` if
    /// one is given, otherwise the failure is silent
    pub fn fail(&self, value: T, diagnostic: DiagnosticBuilder, diagnostics: Option<&mut Diagnostics>) {
        let reported = match (diagnostics, diagnostic.finish()) {
            (Some(diagnostics), Some(diagnostic)) => {
                diagnostics.push(diagnostic);
                true
            },
            _ => false,
        };

        self.settle(PromiseState::Failed { value, reported })
    }

    /// Copies a settled state from another promise
    pub(crate) fn mirror(&self, state: PromiseState<T>) {
        debug_assert!(state.is_settled());
        self.settle(state)
    }
}

impl<T: Clone + 'static> Resolver<T> {
    pub fn promise(&self) -> Promise<T> {
        Promise {
            source: self.cell.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Resolver").field(&*self.cell.borrow()).finish()
    }
}
