use crate::{
    common::{diagnostic::Diagnostics, src::Span, Rodeo},
    trace::SolverTrace,
};
use std::{
    fmt,
    ops::{Deref, DerefMut},
};

mod constraints;
mod promise;
mod reconstruct;
mod score;
mod solve;
mod symbols;
mod unify;

pub use constraints::ConstraintKind;
pub use promise::{Fallback, Promise, PromiseState, Resolver};
pub use score::{
    compare, find_best, Dominance, ScoreVector, FULL_SCORE, HALF_SCORE, ZERO_SCORE,
};
pub use solve::SolveState;
pub use symbols::{
    FnSig, Function, FunctionSymbol, GenericParam, MemberDecl, MemberKind, MemberSymbol, TypeDecl,
};

macro_rules! new_type_id {
    ($name:ident) => {
        #[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            pub fn index(self) -> usize { self.0 }
        }
    };
    ($name:ident, $counter:ident) => {
        new_type_id!($name);

        #[derive(Debug, Copy, Clone, Default)]
        pub struct $counter(usize);

        impl $counter {
            pub fn new_id(&mut self) -> $name {
                let id = self.0;
                self.0 += 1;
                $name(id)
            }
        }
    };
}

new_type_id!(TypeId);
new_type_id!(DeclId);
new_type_id!(ParamId);
new_type_id!(MemberId);
new_type_id!(FnId);
new_type_id!(ConstraintId, ConstraintIdCounter);

/// A slot of the type term arena
///
/// `Unknown` is an unbound type variable and `Ref` a type variable that was
/// substituted, every other variant is a concrete type
#[derive(Clone, Debug, PartialEq)]
pub enum TypeInfo {
    Unknown,
    Ref(TypeId),
    Error,
    Never,
    Nominal(DeclId),
    Param(ParamId),
    Instance {
        def: TypeId,
        args: Vec<TypeId>,
    },
    Fn {
        params: Vec<TypeId>,
        ret: TypeId,
        variadic: bool,
    },
    Array {
        rank: u32,
        elem: TypeId,
    },
    ArrayDef(u32),
}

impl From<TypeId> for TypeInfo {
    fn from(ty: TypeId) -> Self { TypeInfo::Ref(ty) }
}

/// Arena of type terms together with the declarations they refer to
#[derive(Debug)]
pub struct TypeTable {
    types: Vec<TypeInfo>,
    spans: Vec<Span>,

    error: TypeId,
    never: TypeId,

    params: Vec<GenericParam>,
    decls: Vec<TypeDecl>,
    members: Vec<MemberDecl>,
    functions: Vec<Function>,
}

impl TypeTable {
    fn new() -> Self {
        let mut table = TypeTable {
            types: Vec::new(),
            spans: Vec::new(),

            error: TypeId(0),
            never: TypeId(0),

            params: Vec::new(),
            decls: Vec::new(),
            members: Vec::new(),
            functions: Vec::new(),
        };

        table.error = table.insert(TypeInfo::Error, Span::None);
        table.never = table.insert(TypeInfo::Never, Span::None);

        table
    }

    pub fn insert(&mut self, ty: impl Into<TypeInfo>, span: Span) -> TypeId {
        let id = TypeId(self.types.len());
        self.types.push(ty.into());
        self.spans.push(span);
        id
    }

    /// Allocates a fresh unbound type variable
    pub fn type_var(&mut self, span: Span) -> TypeId { self.insert(TypeInfo::Unknown, span) }

    pub fn error_type(&self) -> TypeId { self.error }

    pub fn never_type(&self) -> TypeId { self.never }

    pub fn fn_type(&mut self, params: Vec<TypeId>, ret: TypeId, variadic: bool) -> TypeId {
        self.insert(
            TypeInfo::Fn {
                params,
                ret,
                variadic,
            },
            Span::None,
        )
    }

    pub fn array(&mut self, rank: u32, elem: TypeId) -> TypeId {
        self.insert(TypeInfo::Array { rank, elem }, Span::None)
    }

    pub fn array_def(&mut self, rank: u32) -> TypeId {
        self.insert(TypeInfo::ArrayDef(rank), Span::None)
    }

    pub fn len(&self) -> usize { self.types.len() }

    pub fn is_empty(&self) -> bool { self.types.is_empty() }

    pub fn span(&self, id: TypeId) -> Span { self.spans[id.0] }

    pub fn get(&self, id: TypeId) -> TypeInfo { self.types[id.0].clone() }

    /// Follows the substitution chain of `id` until an unbound variable or a
    /// concrete type is reached
    pub fn get_base(&self, mut id: TypeId) -> TypeId {
        while let TypeInfo::Ref(next) = self.types[id.0] {
            id = next;
        }

        id
    }

    /// Alias of [`get_base`](Self::get_base) for readers of a solved table
    pub fn substitution(&self, id: TypeId) -> TypeId { self.get_base(id) }

    pub fn is_type_variable(&self, id: TypeId) -> bool {
        matches!(self.types[self.get_base(id).0], TypeInfo::Unknown)
    }

    pub fn is_error(&self, id: TypeId) -> bool {
        matches!(self.types[self.get_base(id).0], TypeInfo::Error)
    }

    fn link(&mut self, var: TypeId, to: TypeId) {
        let var = self.get_base(var);

        if var != self.get_base(to) {
            debug_assert_eq!(self.types[var.0], TypeInfo::Unknown);
            self.types[var.0] = TypeInfo::Ref(to);
        }
    }

    /// Binds every variable still unbound to the error type
    pub(crate) fn bind_unresolved(&mut self) -> usize {
        let error = self.error;
        let mut bound = 0;

        for ty in self.types.iter_mut() {
            if let TypeInfo::Unknown = ty {
                *ty = TypeInfo::Ref(error);
                bound += 1;
            }
        }

        bound
    }
}

/// The constraint solver
///
/// Owns the type term arena, the declarations and the live constraints.
/// Binding code allocates type variables and registers constraints through
/// the factory methods, [`solve_all`](Solver::solve_all) then drives the
/// constraints to a fixpoint.
#[derive(Debug)]
pub struct Solver<'a> {
    rodeo: &'a Rodeo,
    types: TypeTable,

    constraint_id_counter: ConstraintIdCounter,
    store: constraints::ConstraintStore<'a>,
    current: Option<ConstraintId>,

    diagnostics: Diagnostics,
    trace: Option<SolverTrace>,
}

impl<'a> Solver<'a> {
    pub fn new(rodeo: &'a Rodeo) -> Self {
        Solver {
            rodeo,
            types: TypeTable::new(),

            constraint_id_counter: ConstraintIdCounter::default(),
            store: constraints::ConstraintStore::default(),
            current: None,

            diagnostics: Diagnostics::new(),
            trace: None,
        }
    }

    /// Records which constraints spawned which while solving
    pub fn with_trace(mut self) -> Self {
        self.trace = Some(SolverTrace::default());
        self
    }

    pub fn rodeo(&self) -> &'a Rodeo { self.rodeo }

    pub fn types(&self) -> &TypeTable { &self.types }

    pub fn trace(&self) -> Option<&SolverTrace> { self.trace.as_ref() }

    /// Number of constraints still waiting in the store
    pub fn pending(&self) -> usize { self.store.len() }

    pub fn display_type_info(&self, id: TypeId) -> impl fmt::Display + '_ {
        #[derive(Copy, Clone)]
        struct TypeInfoDisplay<'b> {
            table: &'b TypeTable,
            rodeo: &'b Rodeo,
            id: TypeId,
        }

        impl<'b> TypeInfoDisplay<'b> {
            fn with_id(mut self, id: TypeId) -> Self {
                self.id = id;
                self
            }

            fn list(self, f: &mut fmt::Formatter, ids: &[TypeId]) -> fmt::Result {
                for (i, id) in ids.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }

                    write!(f, "{}", self.with_id(*id))?;
                }

                Ok(())
            }
        }

        impl<'b> fmt::Display for TypeInfoDisplay<'b> {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                use TypeInfo::*;
                match self.table.get(self.id) {
                    Unknown => write!(f, "?"),
                    Ref(id) => self.with_id(id).fmt(f),
                    Error => write!(f, "{{error}}"),
                    Never => write!(f, "!"),
                    Nominal(decl) => {
                        write!(f, "{}", self.rodeo.resolve(&self.table.decl(decl).ident))
                    },
                    Param(param) => {
                        write!(f, "{}", self.rodeo.resolve(&self.table.param(param).ident))
                    },
                    Instance { def, args } => {
                        write!(f, "{}<", self.with_id(def))?;
                        self.list(f, &args)?;
                        write!(f, ">")
                    },
                    Fn {
                        params,
                        ret,
                        variadic,
                    } => {
                        write!(f, "fn(")?;
                        match params.split_last() {
                            Some((last, fixed)) if variadic => {
                                self.list(f, fixed)?;
                                if !fixed.is_empty() {
                                    write!(f, ", ")?;
                                }
                                write!(f, "...{}", self.with_id(*last))?;
                            },
                            _ => self.list(f, &params)?,
                        }
                        write!(f, ") -> {}", self.with_id(ret))
                    },
                    Array { rank, elem } => {
                        write!(f, "{}[{}]", self.with_id(elem), rank_commas(rank))
                    },
                    ArrayDef(rank) => write!(f, "Array[{}]", rank_commas(rank)),
                }
            }
        }

        TypeInfoDisplay {
            table: &self.types,
            rodeo: self.rodeo,
            id,
        }
    }

    /// Displays a comma separated list of types
    pub(crate) fn display_list(&self, ids: &[TypeId]) -> String {
        ids.iter()
            .map(|id| self.display_type_info(*id).to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub(crate) fn rank_commas(rank: u32) -> String {
    ",".repeat(rank.saturating_sub(1) as usize)
}

impl<'a> Deref for Solver<'a> {
    type Target = TypeTable;

    fn deref(&self) -> &Self::Target { &self.types }
}

impl<'a> DerefMut for Solver<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target { &mut self.types }
}
