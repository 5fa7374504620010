use super::{DeclId, FnId, MemberId, ParamId, Solver, TypeId, TypeInfo, TypeTable};
use crate::common::{src::Span, FastHashMap, Symbol};

/// Upper bound on the number of base types visited by a base search, a
/// malformed (cyclic) hierarchy stops here instead of looping forever
const MAX_BASE_SEARCH: usize = 1024;

#[derive(Debug, Clone)]
pub struct GenericParam {
    pub ident: Symbol,
    pub ty: TypeId,
}

#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub ident: Symbol,
    pub generics: Vec<ParamId>,
    pub bases: Vec<TypeId>,
    pub members: Vec<MemberId>,
    pub ty: TypeId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MemberKind {
    Field(TypeId),
    Method(FnId),
}

#[derive(Debug, Clone)]
pub struct MemberDecl {
    pub ident: Symbol,
    pub owner: DeclId,
    pub kind: MemberKind,
}

/// Signature of a function symbol
///
/// For a variadic function the last parameter is the variadic one, its
/// element type is the element of an array type or the parameter itself
#[derive(Debug, Clone)]
pub struct FnSig {
    pub ident: Symbol,
    pub generics: Vec<ParamId>,
    pub params: Vec<TypeId>,
    pub ret: TypeId,
    pub variadic: bool,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub sig: FnSig,
    pub ty: TypeId,
}

/// Result of a member lookup
#[derive(Debug, Clone, PartialEq)]
pub enum MemberSymbol {
    Member(MemberId),
    /// Placeholder for a member that doesn't exist
    Undefined,
    /// More than one method shares the name, selection is left to an
    /// overload constraint
    OverloadSet(Vec<FnId>),
}

impl Default for MemberSymbol {
    fn default() -> Self { MemberSymbol::Undefined }
}

/// Result of an overload resolution
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionSymbol {
    Function {
        function: FnId,
        /// Type variables allocated for the generic parameters of the
        /// function, in declaration order
        generics: Vec<TypeId>,
    },
    Ambiguous(Vec<FnId>),
    Error,
}

impl Default for FunctionSymbol {
    fn default() -> Self { FunctionSymbol::Error }
}

impl FunctionSymbol {
    pub fn function(&self) -> Option<FnId> {
        match self {
            FunctionSymbol::Function { function, .. } => Some(*function),
            _ => None,
        }
    }
}

impl TypeTable {
    pub fn param(&self, id: ParamId) -> &GenericParam { &self.params[id.0] }

    pub fn decl(&self, id: DeclId) -> &TypeDecl { &self.decls[id.0] }

    pub fn member(&self, id: MemberId) -> &MemberDecl { &self.members[id.0] }

    pub fn function(&self, id: FnId) -> &Function { &self.functions[id.0] }

    pub fn decl_type(&self, id: DeclId) -> TypeId { self.decls[id.0].ty }

    pub fn add_base(&mut self, decl: DeclId, base: TypeId) { self.decls[decl.0].bases.push(base) }

    /// Returns the generic instance of `decl` with the given arguments
    pub fn instance(&mut self, decl: DeclId, args: Vec<TypeId>) -> TypeId {
        let def = self.decl_type(decl);
        self.insert(TypeInfo::Instance { def, args }, Span::None)
    }

    /// Returns the declaration a nominal or instance type refers to together
    /// with its generic arguments
    pub fn decl_of(&self, ty: TypeId) -> Option<(DeclId, Vec<TypeId>)> {
        match self.get(self.get_base(ty)) {
            TypeInfo::Nominal(decl) => Some((decl, Vec::new())),
            TypeInfo::Instance { def, args } => match self.get(self.get_base(def)) {
                TypeInfo::Nominal(decl) => Some((decl, args)),
                _ => None,
            },
            _ => None,
        }
    }

    fn generic_map(&self, decl: DeclId, args: &[TypeId]) -> FastHashMap<ParamId, TypeId> {
        self.decl(decl)
            .generics
            .iter()
            .copied()
            .zip(args.iter().copied())
            .collect()
    }

    /// Rewrites `ty` replacing the generic parameters found in `map`
    ///
    /// New terms are only allocated where the structure changed, an
    /// untouched term is returned as is
    pub fn substitute_generics(&mut self, ty: TypeId, map: &FastHashMap<ParamId, TypeId>) -> TypeId {
        if map.is_empty() {
            return ty;
        }

        let base = self.get_base(ty);

        match self.get(base) {
            TypeInfo::Param(param) => map.get(&param).copied().unwrap_or(ty),
            TypeInfo::Instance { def, args } => {
                let new_args: Vec<_> = args
                    .iter()
                    .map(|arg| self.substitute_generics(*arg, map))
                    .collect();

                if new_args == args {
                    ty
                } else {
                    let span = self.span(base);
                    self.insert(TypeInfo::Instance {
                        def,
                        args: new_args,
                    }, span)
                }
            },
            TypeInfo::Fn {
                params,
                ret,
                variadic,
            } => {
                let new_params: Vec<_> = params
                    .iter()
                    .map(|param| self.substitute_generics(*param, map))
                    .collect();
                let new_ret = self.substitute_generics(ret, map);

                if new_params == params && new_ret == ret {
                    ty
                } else {
                    let span = self.span(base);
                    self.insert(
                        TypeInfo::Fn {
                            params: new_params,
                            ret: new_ret,
                            variadic,
                        },
                        span,
                    )
                }
            },
            TypeInfo::Array { rank, elem } => {
                let new_elem = self.substitute_generics(elem, map);

                if new_elem == elem {
                    ty
                } else {
                    let span = self.span(base);
                    self.insert(TypeInfo::Array {
                        rank,
                        elem: new_elem,
                    }, span)
                }
            },
            _ => ty,
        }
    }

    /// Direct base types of `ty`, specialized by its generic arguments
    pub fn bases_of(&mut self, ty: TypeId) -> Vec<TypeId> {
        let (decl, args) = match self.decl_of(ty) {
            Some(decl) => decl,
            None => return Vec::new(),
        };

        let map = self.generic_map(decl, &args);

        self.decl(decl)
            .bases
            .clone()
            .into_iter()
            .map(|base| self.substitute_generics(base, &map))
            .collect()
    }

    /// Walks the transitive bases of `ty` in breadth first order until
    /// `pred` accepts one
    fn search_bases(
        &mut self,
        ty: TypeId,
        mut pred: impl FnMut(&Self, TypeId) -> bool,
    ) -> Option<TypeId> {
        let mut queue = self.bases_of(ty);
        let mut visited = 0;

        while visited < queue.len() && visited < MAX_BASE_SEARCH {
            let base = queue[visited];
            visited += 1;

            if pred(self, base) {
                return Some(base);
            }

            let next = self.bases_of(base);
            queue.extend(next);
        }

        None
    }

    /// Checks whether `base` appears in the transitive base list of `derived`
    pub fn is_base_of(&mut self, base: TypeId, derived: TypeId) -> bool {
        self.search_bases(derived, |table, candidate| table.types_equal(candidate, base))
            .is_some()
    }

    /// Finds the base of `ty` that is an instance of the generic definition
    /// `def`
    pub fn find_base(&mut self, ty: TypeId, def: TypeId) -> Option<TypeId> {
        self.search_bases(ty, |table, candidate| {
            match table.get(table.get_base(candidate)) {
                TypeInfo::Instance { def: base_def, .. } => table.types_equal(base_def, def),
                _ => false,
            }
        })
    }

    /// Structural equality without side effects, unbound type variables are
    /// only equal to themselves
    pub fn types_equal(&self, a: TypeId, b: TypeId) -> bool {
        let a = self.get_base(a);
        let b = self.get_base(b);

        if a == b {
            return true;
        }

        use TypeInfo::*;
        match (self.get(a), self.get(b)) {
            (Error, Error) | (Never, Never) => true,
            (Nominal(a), Nominal(b)) => a == b,
            (Param(a), Param(b)) => a == b,
            (ArrayDef(a), ArrayDef(b)) => a == b,
            (
                Instance {
                    def: a_def,
                    args: a_args,
                },
                Instance {
                    def: b_def,
                    args: b_args,
                },
            ) => {
                a_args.len() == b_args.len()
                    && self.types_equal(a_def, b_def)
                    && a_args
                        .iter()
                        .zip(b_args.iter())
                        .all(|(a, b)| self.types_equal(*a, *b))
            },
            (
                Fn {
                    params: a_params,
                    ret: a_ret,
                    variadic: a_variadic,
                },
                Fn {
                    params: b_params,
                    ret: b_ret,
                    variadic: b_variadic,
                },
            ) => {
                a_variadic == b_variadic
                    && a_params.len() == b_params.len()
                    && a_params
                        .iter()
                        .zip(b_params.iter())
                        .all(|(a, b)| self.types_equal(*a, *b))
                    && self.types_equal(a_ret, b_ret)
            },
            (
                Array {
                    rank: a_rank,
                    elem: a_elem,
                },
                Array {
                    rank: b_rank,
                    elem: b_elem,
                },
            ) => a_rank == b_rank && self.types_equal(a_elem, b_elem),
            _ => false,
        }
    }

    /// Checks that no unbound type variable is reachable from `ty`
    pub fn is_ground(&self, ty: TypeId) -> bool {
        match self.get(self.get_base(ty)) {
            TypeInfo::Unknown => false,
            TypeInfo::Instance { def, args } => {
                self.is_ground(def) && args.iter().all(|arg| self.is_ground(*arg))
            },
            TypeInfo::Fn { params, ret, .. } => {
                params.iter().all(|param| self.is_ground(*param)) && self.is_ground(ret)
            },
            TypeInfo::Array { elem, .. } => self.is_ground(elem),
            _ => true,
        }
    }

    /// Element type matched by the arguments of a variadic parameter
    pub fn element_type(&self, ty: TypeId) -> TypeId {
        match self.get(self.get_base(ty)) {
            TypeInfo::Array { elem, .. } => elem,
            _ => ty,
        }
    }

    /// Own members of the declaration behind `ty` named `name`
    pub fn members_named(&self, ty: TypeId, name: Symbol) -> Vec<MemberId> {
        match self.decl_of(ty) {
            Some((decl, _)) => self
                .decl(decl)
                .members
                .iter()
                .copied()
                .filter(|member| self.member(*member).ident == name)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Type of `member` as seen through `accessed`, generic parameters of
    /// the owner are replaced by the arguments of the accessed instance
    pub fn member_type(&mut self, accessed: TypeId, member: MemberId) -> TypeId {
        let ty = match self.member(member).kind {
            MemberKind::Field(ty) => ty,
            MemberKind::Method(function) => self.function(function).ty,
        };

        match self.decl_of(accessed) {
            Some((decl, args)) => {
                let map = self.generic_map(decl, &args);
                self.substitute_generics(ty, &map)
            },
            None => ty,
        }
    }
}

impl<'a> Solver<'a> {
    pub fn intern(&self, name: &str) -> Symbol { self.rodeo.get_or_intern(name) }

    pub fn add_generic(&mut self, name: &str) -> ParamId {
        let ident = self.intern(name);
        let id = ParamId(self.params.len());
        let ty = self.insert(TypeInfo::Param(id), Span::None);

        self.params.push(GenericParam { ident, ty });

        id
    }

    /// Declares a nominal type, primitives are nominal types without members
    pub fn add_struct(&mut self, name: &str, generics: Vec<ParamId>) -> DeclId {
        let ident = self.intern(name);
        let id = DeclId(self.decls.len());
        let ty = self.insert(TypeInfo::Nominal(id), Span::None);

        self.decls.push(TypeDecl {
            ident,
            generics,
            bases: Vec::new(),
            members: Vec::new(),
            ty,
        });

        id
    }

    pub fn add_field(&mut self, decl: DeclId, name: &str, ty: TypeId) -> MemberId {
        let ident = self.intern(name);
        self.push_member(decl, ident, MemberKind::Field(ty))
    }

    pub fn add_method(&mut self, decl: DeclId, function: FnId) -> MemberId {
        let ident = self.function(function).sig.ident;
        self.push_member(decl, ident, MemberKind::Method(function))
    }

    fn push_member(&mut self, owner: DeclId, ident: Symbol, kind: MemberKind) -> MemberId {
        let id = MemberId(self.members.len());

        self.members.push(MemberDecl { ident, owner, kind });
        self.decls[owner.0].members.push(id);

        id
    }

    pub fn add_function(&mut self, sig: FnSig) -> FnId {
        debug_assert!(!sig.variadic || !sig.params.is_empty());

        let id = FnId(self.functions.len());
        let ty = self.fn_type(sig.params.clone(), sig.ret, sig.variadic);

        self.functions.push(Function { sig, ty });

        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::new_rodeo;

    #[test]
    fn transitive_bases() {
        let rodeo = new_rodeo();
        let mut solver = Solver::new(&rodeo);

        let base = solver.add_struct("Base", vec![]);
        let middle = solver.add_struct("Middle", vec![]);
        let derived = solver.add_struct("Derived", vec![]);
        let other = solver.add_struct("Other", vec![]);

        let base_ty = solver.decl_type(base);
        let middle_ty = solver.decl_type(middle);
        let derived_ty = solver.decl_type(derived);
        let other_ty = solver.decl_type(other);

        solver.add_base(middle, base_ty);
        solver.add_base(derived, middle_ty);

        assert!(solver.is_base_of(base_ty, derived_ty));
        assert!(solver.is_base_of(middle_ty, derived_ty));
        assert!(!solver.is_base_of(derived_ty, base_ty));
        assert!(!solver.is_base_of(other_ty, derived_ty));
        assert!(!solver.is_base_of(derived_ty, derived_ty));
    }

    #[test]
    fn cyclic_hierarchy_terminates() {
        let rodeo = new_rodeo();
        let mut solver = Solver::new(&rodeo);

        let a = solver.add_struct("A", vec![]);
        let b = solver.add_struct("B", vec![]);
        let c = solver.add_struct("C", vec![]);
        let (a_ty, b_ty, c_ty) = (
            solver.decl_type(a),
            solver.decl_type(b),
            solver.decl_type(c),
        );

        solver.add_base(a, b_ty);
        solver.add_base(b, a_ty);

        assert!(!solver.is_base_of(c_ty, a_ty));
    }

    #[test]
    fn generic_bases_are_specialized() {
        let rodeo = new_rodeo();
        let mut solver = Solver::new(&rodeo);

        let int = solver.add_struct("Int", vec![]);
        let int = solver.decl_type(int);

        let t = solver.add_generic("T");
        let t_ty = solver.param(t).ty;
        let seq = solver.add_struct("Seq", vec![t]);
        let u = solver.add_generic("U");
        let u_ty = solver.param(u).ty;
        let list = solver.add_struct("List", vec![u]);

        let seq_u = solver.instance(seq, vec![u_ty]);
        solver.add_base(list, seq_u);

        let list_int = solver.instance(list, vec![int]);
        let seq_int = solver.instance(seq, vec![int]);
        let seq_t = solver.instance(seq, vec![t_ty]);

        assert!(solver.is_base_of(seq_int, list_int));
        assert!(!solver.is_base_of(seq_t, list_int));

        let seq_def = solver.decl_type(seq);
        let found = solver.find_base(list_int, seq_def).unwrap();
        assert!(solver.types_equal(found, seq_int));
    }

    #[test]
    fn substitution_only_allocates_on_change() {
        let rodeo = new_rodeo();
        let mut solver = Solver::new(&rodeo);

        let int = solver.add_struct("Int", vec![]);
        let int = solver.decl_type(int);
        let t = solver.add_generic("T");
        let t_ty = solver.param(t).ty;
        let list = solver.add_struct("List", vec![t]);
        let list_int = solver.instance(list, vec![int]);
        let list_t = solver.instance(list, vec![t_ty]);

        let mut map = FastHashMap::default();
        map.insert(t, int);

        let before = solver.len();
        assert_eq!(solver.substitute_generics(list_int, &map), list_int);
        assert_eq!(solver.len(), before);

        let substituted = solver.substitute_generics(list_t, &map);
        assert_ne!(substituted, list_t);
        assert!(solver.types_equal(substituted, list_int));

        // Substituting an already substituted term is a no-op
        assert_eq!(solver.substitute_generics(substituted, &map), substituted);
    }

    #[test]
    fn member_lookup() {
        let rodeo = new_rodeo();
        let mut solver = Solver::new(&rodeo);

        let t = solver.add_generic("T");
        let t_ty = solver.param(t).ty;
        let boxed = solver.add_struct("Box", vec![t]);
        let int = solver.add_struct("Int", vec![]);
        let int = solver.decl_type(int);

        let value = solver.add_field(boxed, "value", t_ty);
        let boxed_int = solver.instance(boxed, vec![int]);

        let name = solver.intern("value");
        assert_eq!(solver.members_named(boxed_int, name), vec![value]);

        let ty = solver.member_type(boxed_int, value);
        assert_eq!(solver.get_base(ty), int);

        let missing = solver.intern("missing");
        assert!(solver.members_named(boxed_int, missing).is_empty());
    }
}
