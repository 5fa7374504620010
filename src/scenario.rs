//! RON description of declarations and constraints fed to the solver
//!
//! A scenario is loaded in a fixed order: declaration headers, type
//! variables, free functions, declaration bodies and finally the constraints
//! in the order they are listed. Names that can't be resolved are reported
//! with a custom diagnostic and lowered to the error type so the rest of the
//! scenario still solves.
use serde::Deserialize;
use std::mem;
use tyi_common::{diagnostic::Diagnostic, src::Span, FastHashMap};
use tyi_solver::infer::{
    DeclId, FnId, FnSig, FunctionSymbol, MemberKind, MemberSymbol, ParamId, Promise, Solver,
    TypeId,
};

/// Byte range in the scenario source
pub type SpanDef = (usize, usize);

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub decls: Vec<DeclDef>,
    #[serde(default)]
    pub functions: Vec<FnDef>,
    #[serde(default)]
    pub vars: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<ConstraintDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeclDef {
    pub name: String,
    #[serde(default)]
    pub generics: Vec<String>,
    #[serde(default)]
    pub bases: Vec<TypeExpr>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub methods: Vec<FnDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FnDef {
    pub name: String,
    #[serde(default)]
    pub generics: Vec<String>,
    #[serde(default)]
    pub params: Vec<TypeExpr>,
    pub ret: TypeExpr,
    #[serde(default)]
    pub variadic: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub enum TypeExpr {
    /// A declared type, generic declarations yield their definition
    Named(String),
    /// One of the scenario's type variables
    Var(String),
    /// A generic parameter of the enclosing declaration or function
    Param(String),
    Instance(String, Vec<TypeExpr>),
    Fn {
        params: Vec<TypeExpr>,
        ret: Box<TypeExpr>,
        #[serde(default)]
        variadic: bool,
    },
    Array(u32, Box<TypeExpr>),
    ArrayDef(u32),
    Error,
    Never,
}

#[derive(Debug, Clone, Deserialize)]
pub enum ConstraintDef {
    SameType {
        a: TypeExpr,
        b: TypeExpr,
        #[serde(default)]
        span: Option<SpanDef>,
    },
    Assignable {
        target: TypeExpr,
        assigned: TypeExpr,
        #[serde(default)]
        span: Option<SpanDef>,
    },
    CommonType {
        common: TypeExpr,
        alternatives: Vec<TypeExpr>,
        #[serde(default)]
        span: Option<SpanDef>,
    },
    Member {
        accessed: TypeExpr,
        name: String,
        ty: TypeExpr,
        #[serde(default)]
        span: Option<SpanDef>,
    },
    Call {
        called: TypeExpr,
        args: Vec<TypeExpr>,
        ret: TypeExpr,
        #[serde(default)]
        span: Option<SpanDef>,
    },
    /// Call of a free function, every function with that name is a candidate
    Overload {
        function: String,
        args: Vec<TypeExpr>,
        ret: TypeExpr,
        #[serde(default)]
        span: Option<SpanDef>,
    },
    /// Member lookup followed by a call of the member once it's known
    MethodCall {
        receiver: TypeExpr,
        method: String,
        args: Vec<TypeExpr>,
        ret: TypeExpr,
        #[serde(default)]
        span: Option<SpanDef>,
    },
}

impl ConstraintDef {
    pub fn span(&self) -> Span {
        let span = match self {
            ConstraintDef::SameType { span, .. }
            | ConstraintDef::Assignable { span, .. }
            | ConstraintDef::CommonType { span, .. }
            | ConstraintDef::Member { span, .. }
            | ConstraintDef::Call { span, .. }
            | ConstraintDef::Overload { span, .. }
            | ConstraintDef::MethodCall { span, .. } => *span,
        };

        span.map_or(Span::None, |(start, end)| Span::range(start, end))
    }
}

impl Scenario {
    pub fn parse(src: &str) -> Result<Self, Diagnostic> {
        ron::de::from_str(src).map_err(|e| Diagnostic::custom(format!("Invalid scenario: {}", e)))
    }
}

/// Symbol promise kept to be reported once solving ends
pub(crate) enum Tracked {
    Member {
        label: String,
        promise: Promise<MemberSymbol>,
    },
    Overload {
        label: String,
        promise: Promise<FunctionSymbol>,
    },
    /// `None` when the method turned out to be a field holding a function
    Method {
        label: String,
        /// Type of the member once specialized to the receiver
        slot: TypeId,
        promise: Promise<Option<FunctionSymbol>>,
    },
}

pub(crate) struct Loader<'s, 'a> {
    pub solver: Solver<'a>,
    pub vars: Vec<(&'s str, TypeId)>,
    pub tracked: Vec<Tracked>,
    pub diagnostics: Vec<Diagnostic>,

    decls: FastHashMap<&'s str, DeclId>,
    functions: FastHashMap<&'s str, Vec<FnId>>,
    var_ids: FastHashMap<&'s str, TypeId>,
    scope: FastHashMap<&'s str, ParamId>,
}

impl<'s, 'a> Loader<'s, 'a> {
    pub fn new(solver: Solver<'a>) -> Self {
        Loader {
            solver,
            vars: Vec::new(),
            tracked: Vec::new(),
            diagnostics: Vec::new(),

            decls: FastHashMap::default(),
            functions: FastHashMap::default(),
            var_ids: FastHashMap::default(),
            scope: FastHashMap::default(),
        }
    }

    pub fn load(&mut self, scenario: &'s Scenario) {
        let mut headers = Vec::with_capacity(scenario.decls.len());

        for def in scenario.decls.iter() {
            if self.decls.contains_key(def.name.as_str()) {
                self.error(format!("Type '{}' is declared more than once", def.name));
                continue;
            }

            let generics = def
                .generics
                .iter()
                .map(|name| self.solver.add_generic(name))
                .collect();
            let decl = self.solver.add_struct(&def.name, generics);

            self.decls.insert(def.name.as_str(), decl);
            headers.push((decl, def));
        }

        for name in scenario.vars.iter() {
            if self.var_ids.contains_key(name.as_str()) {
                self.error(format!("Type variable '{}' is declared more than once", name));
                continue;
            }

            let var = self.solver.type_var(Span::None);

            self.var_ids.insert(name.as_str(), var);
            self.vars.push((name.as_str(), var));
        }

        for def in scenario.functions.iter() {
            let function = self.function(def);

            self.functions
                .entry(def.name.as_str())
                .or_default()
                .push(function);
        }

        for (decl, def) in headers {
            self.decl_body(decl, def);
        }

        for (index, constraint) in scenario.constraints.iter().enumerate() {
            self.constrain(index, constraint);
        }

        tracing::debug!(
            "Loaded {} declarations, {} functions and {} constraints",
            scenario.decls.len(),
            scenario.functions.len(),
            scenario.constraints.len()
        );
    }

    fn error(&mut self, msg: String) { self.diagnostics.push(Diagnostic::custom(msg)) }

    fn undefined(&mut self, what: &str, name: &str) -> TypeId {
        self.error(format!("Undefined {} '{}'", what, name));
        self.solver.error_type()
    }

    /// Runs `f` with extra generic parameters in scope
    fn scoped<R>(
        &mut self,
        generics: Vec<(&'s str, ParamId)>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let mut scope = self.scope.clone();
        scope.extend(generics);

        let outer = mem::replace(&mut self.scope, scope);
        let res = f(self);
        self.scope = outer;

        res
    }

    fn function(&mut self, def: &'s FnDef) -> FnId {
        let generics: Vec<_> = def
            .generics
            .iter()
            .map(|name| (name.as_str(), self.solver.add_generic(name)))
            .collect();

        let variadic = def.variadic && !def.params.is_empty();

        if def.variadic && !variadic {
            self.error(format!("Function '{}' is variadic but has no parameters", def.name));
        }

        self.scoped(generics.clone(), |loader| {
            let params = def.params.iter().map(|param| loader.lower(param)).collect();
            let ret = loader.lower(&def.ret);
            let ident = loader.solver.intern(&def.name);

            loader.solver.add_function(FnSig {
                ident,
                generics: generics.iter().map(|(_, param)| *param).collect(),
                params,
                ret,
                variadic,
            })
        })
    }

    fn decl_body(&mut self, decl: DeclId, def: &'s DeclDef) {
        let generics = def
            .generics
            .iter()
            .map(String::as_str)
            .zip(self.solver.decl(decl).generics.iter().copied())
            .collect();

        self.scoped(generics, |loader| {
            for base in def.bases.iter() {
                let base = loader.lower(base);
                loader.solver.add_base(decl, base);
            }

            for field in def.fields.iter() {
                let ty = loader.lower(&field.ty);
                loader.solver.add_field(decl, &field.name, ty);
            }

            for method in def.methods.iter() {
                let function = loader.function(method);
                loader.solver.add_method(decl, function);
            }
        })
    }

    fn lower(&mut self, expr: &'s TypeExpr) -> TypeId {
        match expr {
            TypeExpr::Named(name) => match self.decls.get(name.as_str()) {
                Some(decl) => self.solver.decl_type(*decl),
                None => self.undefined("type", name),
            },
            TypeExpr::Var(name) => match self.var_ids.get(name.as_str()) {
                Some(var) => *var,
                None => self.undefined("type variable", name),
            },
            TypeExpr::Param(name) => match self.scope.get(name.as_str()) {
                Some(param) => self.solver.param(*param).ty,
                None => self.undefined("generic parameter", name),
            },
            TypeExpr::Instance(name, args) => {
                let decl = match self.decls.get(name.as_str()) {
                    Some(decl) => *decl,
                    None => return self.undefined("type", name),
                };
                let args: Vec<_> = args.iter().map(|arg| self.lower(arg)).collect();
                let expected = self.solver.decl(decl).generics.len();

                if expected != args.len() {
                    self.error(format!(
                        "Type '{}' expects {} generic arguments but got {}",
                        name,
                        expected,
                        args.len()
                    ));

                    return self.solver.error_type();
                }

                self.solver.instance(decl, args)
            },
            TypeExpr::Fn {
                params,
                ret,
                variadic,
            } => {
                if *variadic && params.is_empty() {
                    self.error(String::from("Variadic function type has no parameters"));
                    return self.solver.error_type();
                }

                let params = params.iter().map(|param| self.lower(param)).collect();
                let ret = self.lower(ret);

                self.solver.fn_type(params, ret, *variadic)
            },
            TypeExpr::Array(rank, elem) => {
                let elem = self.lower(elem);
                self.solver.array(*rank, elem)
            },
            TypeExpr::ArrayDef(rank) => self.solver.array_def(*rank),
            TypeExpr::Error => self.solver.error_type(),
            TypeExpr::Never => self.solver.never_type(),
        }
    }

    fn lower_all(&mut self, exprs: &'s [TypeExpr]) -> Vec<TypeId> {
        exprs.iter().map(|expr| self.lower(expr)).collect()
    }

    fn constrain(&mut self, index: usize, constraint: &'s ConstraintDef) {
        let span = constraint.span();

        match constraint {
            ConstraintDef::SameType { a, b, .. } => {
                let a = self.lower(a);
                let b = self.lower(b);

                self.solver.same_type(a, b, span);
            },
            ConstraintDef::Assignable {
                target, assigned, ..
            } => {
                let target = self.lower(target);
                let assigned = self.lower(assigned);

                self.solver.assignable(target, assigned, span);
            },
            ConstraintDef::CommonType {
                common,
                alternatives,
                ..
            } => {
                let common = self.lower(common);

                if alternatives.is_empty() {
                    self.error(format!("Common type #{} has no alternatives", index));
                    return;
                }

                let alternatives = self.lower_all(alternatives);
                self.solver.common_type(common, alternatives, span);
            },
            ConstraintDef::Member {
                accessed, name, ty, ..
            } => {
                let accessed = self.lower(accessed);
                let ty = self.lower(ty);
                let symbol = self.solver.intern(name);

                let promise = self.solver.member(accessed, symbol, ty, span);
                self.tracked.push(Tracked::Member {
                    label: format!("#{} member '{}'", index, name),
                    promise,
                });
            },
            ConstraintDef::Call {
                called, args, ret, ..
            } => {
                let called = self.lower(called);
                let args = self.lower_all(args);
                let ret = self.lower(ret);

                self.solver.call(called, args, ret, span);
            },
            ConstraintDef::Overload {
                function,
                args,
                ret,
                ..
            } => {
                let args = self.lower_all(args);
                let ret = self.lower(ret);

                let candidates = match self.functions.get(function.as_str()) {
                    Some(candidates) => candidates.clone(),
                    None => {
                        let error = self.undefined("function", function);
                        self.solver.same_type(ret, error, span);
                        return;
                    },
                };

                let promise = self.solver.overload(candidates, args, ret, span);
                self.tracked.push(Tracked::Overload {
                    label: format!("#{} overload '{}'", index, function),
                    promise,
                });
            },
            ConstraintDef::MethodCall {
                receiver,
                method,
                args,
                ret,
                ..
            } => {
                let receiver = self.lower(receiver);
                let args = self.lower_all(args);
                let ret = self.lower(ret);
                let symbol = self.solver.intern(method);
                let slot = self.solver.type_var(span);

                let member = self.solver.member(receiver, symbol, slot, span);
                let promise = self.solver.await_then(
                    member,
                    move |solver, member| match member {
                        MemberSymbol::OverloadSet(candidates) => {
                            solver.overload(candidates, args, ret, span).map(Some)
                        },
                        MemberSymbol::Member(member) => {
                            let kind = solver.types().member(member).kind;

                            match kind {
                                // The slot holds the signature specialized to the receiver
                                MemberKind::Method(function)
                                    if solver.types().function(function).sig.generics.is_empty() =>
                                {
                                    solver.call(slot, args, ret, span).map(move |()| {
                                        Some(FunctionSymbol::Function {
                                            function,
                                            generics: Vec::new(),
                                        })
                                    })
                                },
                                MemberKind::Method(function) => {
                                    solver.overload(vec![function], args, ret, span).map(Some)
                                },
                                MemberKind::Field(_) => {
                                    solver.call(slot, args, ret, span).map(|()| None)
                                },
                            }
                        },
                        MemberSymbol::Undefined => {
                            let error = solver.error_type();
                            solver.same_type(ret, error, span);

                            Promise::resolved(None)
                        },
                    },
                    span,
                );

                self.tracked.push(Tracked::Method {
                    label: format!("#{} method '{}'", index, method),
                    slot,
                    promise,
                });
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_optional() {
        let scenario = Scenario::parse(
            r#"(
                decls: [(name: "Int")],
                vars: ["x"],
                constraints: [
                    Assignable(target: Var("x"), assigned: Named("Int"), span: Some((0, 3))),
                ],
            )"#,
        )
        .unwrap();

        assert_eq!(scenario.decls[0].generics.len(), 0);
        assert!(scenario.functions.is_empty());
        assert_eq!(scenario.constraints[0].span(), Span::range(0, 3));
    }

    #[test]
    fn syntax_errors_become_diagnostics() {
        let diagnostic = Scenario::parse("(decls: [").unwrap_err();

        assert!(diagnostic.message().starts_with("Invalid scenario: "));
    }
}
