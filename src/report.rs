use crate::scenario::{Loader, Tracked};
use std::fmt;
use tyi_common::{diagnostic::Diagnostic, src::Span};
use tyi_solver::infer::{
    FunctionSymbol, MemberKind, MemberSymbol, PromiseState, SolveState, Solver, TypeId, TypeInfo,
};

#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Status {
    /// The scenario couldn't be parsed
    Invalid,
    Complete,
    Stuck { abandoned: usize },
}

impl From<SolveState> for Status {
    fn from(state: SolveState) -> Self {
        match state {
            SolveState::Complete => Status::Complete,
            SolveState::Stuck { abandoned } => Status::Stuck { abandoned },
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Invalid => write!(f, "invalid"),
            Status::Complete => write!(f, "complete"),
            Status::Stuck { abandoned } => write!(f, "stuck ({} abandoned)", abandoned),
        }
    }
}

/// Symbol selected by a member or overload constraint
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub label: String,
    pub symbol: String,
    pub failed: bool,
}

/// Outcome of solving a scenario with every type rendered
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub status: Status,
    /// Final type of each scenario variable, in declaration order
    pub vars: Vec<(String, String)>,
    pub resolutions: Vec<Resolution>,
    pub diagnostics: Vec<Diagnostic>,
    /// Graphviz rendering of the solver trace, when tracing was requested
    #[cfg_attr(feature = "serialize", serde(skip))]
    pub dot: Option<String>,
}

impl Report {
    pub(crate) fn invalid(diagnostics: Vec<Diagnostic>) -> Self {
        Report {
            status: Status::Invalid,
            vars: Vec::new(),
            resolutions: Vec::new(),
            diagnostics,
            dot: None,
        }
    }

    pub(crate) fn collect(loader: Loader<'_, '_>, state: SolveState) -> Self {
        let Loader {
            mut solver,
            vars,
            tracked,
            mut diagnostics,
            ..
        } = loader;

        diagnostics.extend(solver.take_diagnostics());

        let vars = vars
            .into_iter()
            .map(|(name, var)| {
                let ty = match solver.reconstruct(var, Span::None) {
                    Ok(ty) => ty.display(solver.rodeo()).to_string(),
                    Err(diagnostic) => {
                        diagnostics.push(diagnostic);
                        String::from("?")
                    },
                };

                (name.to_string(), ty)
            })
            .collect();

        let resolutions = tracked
            .into_iter()
            .map(|tracked| match tracked {
                Tracked::Member { label, promise } => {
                    resolution(label, promise.state(), |symbol| member_symbol(&solver, symbol))
                },
                Tracked::Overload { label, promise } => {
                    resolution(label, promise.state(), |symbol| {
                        function_symbol(&solver, symbol)
                    })
                },
                Tracked::Method {
                    label,
                    slot,
                    promise,
                } => resolution(label, promise.state(), |symbol| match symbol {
                    Some(FunctionSymbol::Function { generics, .. })
                        if generics.is_empty() && is_fn(&solver, slot) =>
                    {
                        solver.display_type_info(slot).to_string()
                    },
                    Some(symbol) => function_symbol(&solver, symbol),
                    None => String::from("field call"),
                }),
            })
            .collect();

        Report {
            status: state.into(),
            vars,
            resolutions,
            diagnostics,
            dot: solver.trace().map(|trace| trace.to_dot()),
        }
    }

    pub fn has_errors(&self) -> bool { !self.diagnostics.is_empty() }
}

fn resolution<T>(
    label: String,
    state: PromiseState<T>,
    display: impl FnOnce(T) -> String,
) -> Resolution {
    match state {
        PromiseState::Resolved(symbol) => Resolution {
            label,
            symbol: display(symbol),
            failed: false,
        },
        PromiseState::Failed { value, .. } => Resolution {
            label,
            symbol: display(value),
            failed: true,
        },
        PromiseState::Unresolved => Resolution {
            label,
            symbol: String::from("unresolved"),
            failed: true,
        },
    }
}

fn is_fn(solver: &Solver<'_>, ty: TypeId) -> bool {
    matches!(solver.get(solver.get_base(ty)), TypeInfo::Fn { .. })
}

fn member_symbol(solver: &Solver<'_>, symbol: MemberSymbol) -> String {
    match symbol {
        MemberSymbol::Member(member) => {
            let member = solver.types().member(member);
            let owner = solver.rodeo().resolve(&solver.types().decl(member.owner).ident);
            let name = solver.rodeo().resolve(&member.ident);

            match member.kind {
                MemberKind::Field(ty) => {
                    format!("field {}.{}: {}", owner, name, solver.display_type_info(ty))
                },
                MemberKind::Method(function) => format!(
                    "method {}.{}: {}",
                    owner,
                    name,
                    solver.display_type_info(solver.types().function(function).ty)
                ),
            }
        },
        MemberSymbol::OverloadSet(functions) => {
            format!("overload set of {} methods", functions.len())
        },
        MemberSymbol::Undefined => String::from("undefined"),
    }
}

fn function_symbol(solver: &Solver<'_>, symbol: FunctionSymbol) -> String {
    match symbol {
        FunctionSymbol::Function { function, generics } => {
            let function = solver.types().function(function);
            let mut out = solver.display_type_info(function.ty).to_string();

            if !generics.is_empty() {
                let bindings: Vec<_> = function
                    .sig
                    .generics
                    .iter()
                    .zip(generics.iter())
                    .map(|(param, ty)| {
                        format!(
                            "{} = {}",
                            solver.rodeo().resolve(&solver.types().param(*param).ident),
                            solver.display_type_info(*ty)
                        )
                    })
                    .collect();

                out.push_str(&format!(" with {}", bindings.join(", ")));
            }

            out
        },
        FunctionSymbol::Ambiguous(functions) => {
            format!("ambiguous between {} candidates", functions.len())
        },
        FunctionSymbol::Error => String::from("error"),
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status: {}", self.status)?;

        if !self.vars.is_empty() {
            write!(f, "\nvars:")?;

            for (name, ty) in self.vars.iter() {
                write!(f, "\n  {} = {}", name, ty)?;
            }
        }

        if !self.resolutions.is_empty() {
            write!(f, "\nresolutions:")?;

            for resolution in self.resolutions.iter() {
                write!(f, "\n  {} -> {}", resolution.label, resolution.symbol)?;

                if resolution.failed {
                    write!(f, " (failed)")?;
                }
            }
        }

        if !self.diagnostics.is_empty() {
            write!(f, "\ndiagnostics:")?;

            for diagnostic in self.diagnostics.iter() {
                write!(f, "\n  {}", diagnostic)?;
            }
        }

        Ok(())
    }
}
