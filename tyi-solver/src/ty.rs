use crate::{
    common::{src::Span, Rodeo, Symbol},
    infer::rank_commas,
};
use std::fmt;

/// A solved type with every substitution applied
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type {
    pub kind: TypeKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Error,
    Never,
    Named(Symbol),
    Param(Symbol),
    Instance(Symbol, Vec<Type>),
    Fn {
        params: Vec<Type>,
        ret: Box<Type>,
        variadic: bool,
    },
    Array {
        rank: u32,
        elem: Box<Type>,
    },
    ArrayDef(u32),
}

impl Type {
    pub fn is_error(&self) -> bool { matches!(self.kind, TypeKind::Error) }

    pub fn display<'a>(&'a self, rodeo: &'a Rodeo) -> impl fmt::Display + 'a {
        struct TypeDisplay<'a> {
            ty: &'a TypeKind,
            rodeo: &'a Rodeo,
        }

        impl<'a> TypeDisplay<'a> {
            fn scoped(&self, ty: &'a TypeKind) -> Self {
                TypeDisplay {
                    ty,
                    rodeo: self.rodeo,
                }
            }

            fn list(&self, f: &mut fmt::Formatter<'_>, types: &'a [Type]) -> fmt::Result {
                for (i, ty) in types.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }

                    write!(f, "{}", self.scoped(&ty.kind))?;
                }

                Ok(())
            }
        }

        impl<'a> fmt::Display for TypeDisplay<'a> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.ty {
                    TypeKind::Error => write!(f, "{{error}}"),
                    TypeKind::Never => write!(f, "!"),
                    TypeKind::Named(name) | TypeKind::Param(name) => {
                        write!(f, "{}", self.rodeo.resolve(name))
                    },
                    TypeKind::Instance(name, args) => {
                        write!(f, "{}<", self.rodeo.resolve(name))?;
                        self.list(f, args)?;
                        write!(f, ">")
                    },
                    TypeKind::Fn {
                        params,
                        ret,
                        variadic,
                    } => {
                        write!(f, "fn(")?;
                        match params.split_last() {
                            Some((last, fixed)) if *variadic => {
                                self.list(f, fixed)?;
                                if !fixed.is_empty() {
                                    write!(f, ", ")?;
                                }
                                write!(f, "...{}", self.scoped(&last.kind))?;
                            },
                            _ => self.list(f, params)?,
                        }
                        write!(f, ") -> {}", self.scoped(&ret.kind))
                    },
                    TypeKind::Array { rank, elem } => {
                        write!(f, "{}[{}]", self.scoped(&elem.kind), rank_commas(*rank))
                    },
                    TypeKind::ArrayDef(rank) => write!(f, "Array[{}]", rank_commas(*rank)),
                }
            }
        }

        TypeDisplay {
            ty: &self.kind,
            rodeo,
        }
    }
}

impl std::ops::Deref for Type {
    type Target = TypeKind;

    fn deref(&self) -> &Self::Target { &self.kind }
}
