//! Solves type inference scenarios
//!
//! A scenario is a RON document listing declarations, free functions, type
//! variables and constraints. It's loaded into a [`Solver`](solver::infer::Solver),
//! solved to a fixpoint and rendered into a [`Report`].
pub use tyi_common as common;
pub use tyi_solver as solver;

mod report;
mod scenario;

pub use report::{Report, Resolution, Status};
pub use scenario::{ConstraintDef, DeclDef, FieldDef, FnDef, Scenario, SpanDef, TypeExpr};

use common::new_rodeo;
use scenario::Loader;
use solver::infer::Solver;

pub fn solve_scenario(src: &str) -> Report { run(src, false) }

/// Like [`solve_scenario`] but also renders the solver trace
pub fn solve_scenario_traced(src: &str) -> Report { run(src, true) }

fn run(src: &str, trace: bool) -> Report {
    match Scenario::parse(src) {
        Ok(scenario) => scenario.solve(trace),
        Err(diagnostic) => Report::invalid(vec![diagnostic]),
    }
}

impl Scenario {
    pub fn solve(&self, trace: bool) -> Report {
        let rodeo = new_rodeo();

        let mut solver = Solver::new(&rodeo);
        if trace {
            solver = solver.with_trace();
        }

        let mut loader = Loader::new(solver);
        loader.load(self);

        let state = loader.solver.solve();

        Report::collect(loader, state)
    }
}
