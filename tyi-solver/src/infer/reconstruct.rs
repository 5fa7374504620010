use super::{Solver, TypeId, TypeInfo};
use crate::{
    common::{
        diagnostic::{Diagnostic, DiagnosticKind},
        src::Span,
    },
    ty::{Type, TypeKind},
};

const MAX_RECONSTRUCTION_DEPTH: usize = 1024;

enum ReconstructError {
    Unknown(TypeId),
    Recursive,
}

impl<'a> Solver<'a> {
    fn reconstruct_inner(&self, iter: usize, id: TypeId) -> Result<Type, ReconstructError> {
        if iter > MAX_RECONSTRUCTION_DEPTH {
            return Err(ReconstructError::Recursive);
        }

        let kind = match self.get(id) {
            TypeInfo::Unknown => return Err(ReconstructError::Unknown(id)),
            TypeInfo::Ref(id) => self.reconstruct_inner(iter + 1, id)?.kind,
            TypeInfo::Error => TypeKind::Error,
            TypeInfo::Never => TypeKind::Never,
            TypeInfo::Nominal(decl) => TypeKind::Named(self.decl(decl).ident),
            TypeInfo::Param(param) => TypeKind::Param(self.param(param).ident),
            TypeInfo::Instance { def, args } => {
                let ident = match self.get(self.get_base(def)) {
                    TypeInfo::Nominal(decl) => self.decl(decl).ident,
                    _ => return Err(ReconstructError::Unknown(def)),
                };

                TypeKind::Instance(
                    ident,
                    args.into_iter()
                        .map(|arg| self.reconstruct_inner(iter + 1, arg))
                        .collect::<Result<_, _>>()?,
                )
            },
            TypeInfo::Fn {
                params,
                ret,
                variadic,
            } => TypeKind::Fn {
                params: params
                    .into_iter()
                    .map(|param| self.reconstruct_inner(iter + 1, param))
                    .collect::<Result<_, _>>()?,
                ret: Box::new(self.reconstruct_inner(iter + 1, ret)?),
                variadic,
            },
            TypeInfo::Array { rank, elem } => TypeKind::Array {
                rank,
                elem: Box::new(self.reconstruct_inner(iter + 1, elem)?),
            },
            TypeInfo::ArrayDef(rank) => TypeKind::ArrayDef(rank),
        };

        Ok(Type {
            kind,
            span: self.span(id),
        })
    }

    /// Builds the solved type of `id`, without any substitution left
    #[tracing::instrument(skip(self, id, span))]
    pub fn reconstruct(&self, id: TypeId, span: Span) -> Result<Type, Diagnostic> {
        tracing::trace!("Reconstructing type");

        self.reconstruct_inner(0, id).map_err(|err| match err {
            ReconstructError::Recursive => {
                tracing::warn!("Recursive type");

                Diagnostic::new(DiagnosticKind::RecursiveType).with_span(self.span(id))
            },
            ReconstructError::Unknown(a) => {
                tracing::warn!("Cannot infer type");

                Diagnostic::new(DiagnosticKind::CannotInfer)
                    .with_arg(self.display_type_info(a))
                    .with_span(span)
                    .with_span(self.span(id))
                    .with_hint(String::from("Specify all missing types"))
            },
        })
    }
}
