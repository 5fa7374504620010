use super::{TypeId, TypeInfo, TypeTable};

const MAX_UNIFICATION_DEPTH: usize = 1024;

impl TypeTable {
    /// Unifies two type terms, binding type variables as a side effect
    ///
    /// Substitutions made before a failing component are kept
    pub fn unify(&mut self, a: TypeId, b: TypeId) -> bool { self.unify_inner(0, a, b) }

    fn unify_inner(&mut self, iter: usize, a: TypeId, b: TypeId) -> bool {
        if iter > MAX_UNIFICATION_DEPTH {
            tracing::error!("Maximum unification depth reached");
            panic!(
                "Maximum unification depth reached (this error should not occur without extremely \
                 large types)"
            );
        }

        let a = self.get_base(a);
        let b = self.get_base(b);

        if a == b {
            return true;
        }

        use TypeInfo::*;
        match (self.get(a), self.get(b)) {
            (Unknown, Unknown) => {
                self.link(b, a);
                true
            },
            (Unknown, _) => self.bind(iter, a, b),
            (_, Unknown) => self.bind(iter, b, a),

            (Error, _) | (_, Error) | (Never, _) | (_, Never) => true,

            (
                Fn {
                    params: a_params,
                    ret: a_ret,
                    ..
                },
                Fn {
                    params: b_params,
                    ret: b_ret,
                    ..
                },
            ) => {
                if a_params.len() != b_params.len() {
                    return false;
                }

                for (a, b) in a_params.into_iter().zip(b_params) {
                    if !self.unify_inner(iter + 1, a, b) {
                        return false;
                    }
                }

                self.unify_inner(iter + 1, a_ret, b_ret)
            },
            (ArrayDef(a_rank), ArrayDef(b_rank)) => a_rank == b_rank,
            (
                Array {
                    rank: a_rank,
                    elem: a_elem,
                },
                Array {
                    rank: b_rank,
                    elem: b_elem,
                },
            ) => a_rank == b_rank && self.unify_inner(iter + 1, a_elem, b_elem),
            (
                Instance {
                    def: a_def,
                    args: a_args,
                },
                Instance {
                    def: b_def,
                    args: b_args,
                },
            ) if a_args.len() == b_args.len() => {
                if !self.unify_inner(iter + 1, a_def, b_def) {
                    return false;
                }

                for (a, b) in a_args.into_iter().zip(b_args) {
                    if !self.unify_inner(iter + 1, a, b) {
                        return false;
                    }
                }

                true
            },
            (Nominal(a_decl), Nominal(b_decl)) => a_decl == b_decl,
            (Param(a_param), Param(b_param)) => a_param == b_param,
            (_, _) => false,
        }
    }

    fn bind(&mut self, iter: usize, var: TypeId, ty: TypeId) -> bool {
        if self.occurs(iter, var, ty) {
            return false;
        }

        self.link(var, ty);
        true
    }

    fn occurs(&self, iter: usize, var: TypeId, ty: TypeId) -> bool {
        if iter > MAX_UNIFICATION_DEPTH {
            return true;
        }

        let ty = self.get_base(ty);

        if ty == var {
            return true;
        }

        match self.get(ty) {
            TypeInfo::Instance { def, args } => {
                self.occurs(iter + 1, var, def)
                    || args.into_iter().any(|arg| self.occurs(iter + 1, var, arg))
            },
            TypeInfo::Fn { params, ret, .. } => {
                params
                    .into_iter()
                    .any(|param| self.occurs(iter + 1, var, param))
                    || self.occurs(iter + 1, var, ret)
            },
            TypeInfo::Array { elem, .. } => self.occurs(iter + 1, var, elem),
            _ => false,
        }
    }

    /// Unification used by assignments
    ///
    /// When both sides are generic instances the assigned type's bases are
    /// searched for one sharing the target's generic definition. Otherwise
    /// this is plain unification.
    pub fn assign(&mut self, target: TypeId, assigned: TypeId) -> bool {
        match (
            self.get(self.get_base(target)),
            self.get(self.get_base(assigned)),
        ) {
            (
                TypeInfo::Instance { def, .. },
                TypeInfo::Instance {
                    def: assigned_def, ..
                },
            ) if !self.types_equal(def, assigned_def) => match self.find_base(assigned, def) {
                Some(base) => self.unify(target, base),
                None => self.unify(target, assigned),
            },
            // TODO: non generic derived types should go through `is_base_of` as well
            _ => self.unify(target, assigned),
        }
    }
}
