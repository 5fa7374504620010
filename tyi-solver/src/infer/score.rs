use super::{TypeId, TypeInfo, TypeTable};

pub const FULL_SCORE: u32 = 16;
pub const HALF_SCORE: u32 = 8;
pub const ZERO_SCORE: u32 = 0;

/// Per argument match quality of a candidate
///
/// Holds one slot per argument and a trailing arity slot. A `None` slot is
/// still undecided, a zero slot rejects the candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreVector(Vec<Option<u32>>);

impl ScoreVector {
    pub fn undecided(args: usize) -> Self { ScoreVector(vec![None; args + 1]) }

    pub fn slots(&self) -> &[Option<u32>] { &self.0 }

    pub fn is_well_defined(&self) -> bool { self.0.iter().all(Option::is_some) }

    pub fn has_rejection(&self) -> bool { self.0.iter().any(|slot| *slot == Some(ZERO_SCORE)) }
}

impl From<Vec<Option<u32>>> for ScoreVector {
    fn from(slots: Vec<Option<u32>>) -> Self { ScoreVector(slots) }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Dominance {
    FirstDominates,
    SecondDominates,
    Equal,
    NoDominance,
    Undetermined,
}

impl Dominance {
    pub fn mirror(self) -> Self {
        match self {
            Dominance::FirstDominates => Dominance::SecondDominates,
            Dominance::SecondDominates => Dominance::FirstDominates,
            other => other,
        }
    }
}

/// Elementwise comparison of two score vectors of equal length
pub fn compare(a: &ScoreVector, b: &ScoreVector) -> Dominance {
    assert_eq!(a.0.len(), b.0.len(), "Score vectors of different lengths");

    if !a.is_well_defined() || !b.is_well_defined() {
        return Dominance::Undetermined;
    }

    let mut better = false;
    let mut worse = false;

    for (a, b) in a.0.iter().zip(b.0.iter()) {
        better |= a > b;
        worse |= a < b;
    }

    match (better, worse) {
        (true, false) => Dominance::FirstDominates,
        (false, true) => Dominance::SecondDominates,
        (false, false) => Dominance::Equal,
        (true, true) => Dominance::NoDominance,
    }
}

/// Index of the best vector, the running best is only replaced by a vector
/// that strictly dominates it
///
/// Returns `None` for an empty sequence or as soon as a comparison is
/// undetermined. Under mutual non dominance the earliest vector wins.
pub fn find_best<'a>(vectors: impl IntoIterator<Item = &'a ScoreVector>) -> Option<usize> {
    let mut vectors = vectors.into_iter().enumerate();
    let (mut best, mut best_vector) = vectors.next()?;

    for (i, vector) in vectors {
        match compare(best_vector, vector) {
            Dominance::Undetermined => return None,
            Dominance::SecondDominates => {
                best = i;
                best_vector = vector;
            },
            _ => {},
        }
    }

    Some(best)
}

impl TypeTable {
    /// Scores an argument against a parameter, `None` while either side is
    /// not ground yet
    pub fn score_argument(&mut self, param: TypeId, arg: TypeId) -> Option<u32> {
        let param = self.get_base(param);
        let arg = self.get_base(arg);

        use TypeInfo::*;
        match (self.get(param), self.get(arg)) {
            (Unknown, _) | (_, Unknown) => return None,
            (Error, _) | (_, Error) | (Never, _) | (_, Never) => return Some(FULL_SCORE),
            (
                Instance {
                    def: param_def,
                    args: param_args,
                },
                Instance {
                    def: arg_def,
                    args: arg_args,
                },
            ) if param_args.len() == arg_args.len() && self.types_equal(param_def, arg_def) => {
                let mut score = FULL_SCORE;

                for (param, arg) in param_args.into_iter().zip(arg_args) {
                    score = score.min(self.score_argument(param, arg)?);

                    if score == ZERO_SCORE {
                        break;
                    }
                }

                return Some(score);
            },
            (
                Array {
                    rank: param_rank,
                    elem: param_elem,
                },
                Array {
                    rank: arg_rank,
                    elem: arg_elem,
                },
            ) if param_rank == arg_rank => return self.score_argument(param_elem, arg_elem),
            (ArrayDef(param_rank), Array { rank, .. }) if param_rank == rank => {
                return Some(HALF_SCORE)
            },
            _ => {},
        }

        if !self.is_ground(param) || !self.is_ground(arg) {
            None
        } else if self.types_equal(param, arg) {
            Some(FULL_SCORE)
        } else if self.is_base_of(param, arg) {
            Some(HALF_SCORE)
        } else if let Param(_) = self.get(param) {
            Some(HALF_SCORE)
        } else {
            Some(ZERO_SCORE)
        }
    }

    /// Whether a candidate with `params` can be called with `args` arguments
    ///
    /// A variadic candidate without any parameter never matches
    pub fn matches_parameter_count(&self, params: usize, variadic: bool, args: usize) -> bool {
        if variadic {
            params > 0 && args + 1 >= params
        } else {
            args == params
        }
    }

    /// Fills the undecided slots of `scores` that can be decided now
    ///
    /// Returns whether any slot changed
    pub(crate) fn refine_scores(
        &mut self,
        params: &[TypeId],
        variadic: bool,
        args: &[TypeId],
        scores: &mut ScoreVector,
    ) -> bool {
        let fixed = if variadic {
            params.len() - 1
        } else {
            params.len()
        };
        let arity = args.len();
        let mut changed = false;

        for (i, (param, arg)) in params.iter().zip(args).take(fixed).enumerate() {
            if scores.0[i].is_none() {
                if let Some(score) = self.score_argument(*param, *arg) {
                    scores.0[i] = Some(score);
                    changed = true;
                }
            }
        }

        if scores.0[arity].is_some() {
            return changed;
        }

        if variadic {
            let elem = self.element_type(params[fixed]);
            let mut combined = FULL_SCORE / 2;

            for arg in args[fixed..].iter() {
                match self.score_argument(elem, *arg) {
                    Some(score) => combined = combined.min(score / 2),
                    None => return changed,
                }
            }

            for slot in scores.0[fixed..].iter_mut() {
                *slot = Some(combined);
            }
        } else {
            scores.0[arity] = Some(FULL_SCORE);
        }

        true
    }

    /// Binds call arguments to already instantiated parameters, the last
    /// parameter of a variadic candidate is matched by its element type
    /// against the remaining arguments
    pub(crate) fn bind_arguments(
        &mut self,
        params: &[TypeId],
        variadic: bool,
        args: &[TypeId],
    ) -> Result<(), (TypeId, TypeId)> {
        let fixed = if variadic {
            params.len() - 1
        } else {
            params.len()
        };

        for (param, arg) in params.iter().zip(args).take(fixed) {
            self.bind_argument(*param, *arg)?;
        }

        if variadic {
            let elem = self.element_type(params[fixed]);

            for arg in args[fixed..].iter() {
                self.bind_argument(elem, *arg)?;
            }
        }

        Ok(())
    }

    fn bind_argument(&mut self, param: TypeId, arg: TypeId) -> Result<(), (TypeId, TypeId)> {
        if self.is_base_of(param, arg) || self.assign(param, arg) {
            Ok(())
        } else {
            Err((param, arg))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::{new_rodeo, src::Span},
        infer::Solver,
    };

    fn vector(slots: &[u32]) -> ScoreVector {
        ScoreVector(slots.iter().copied().map(Some).collect())
    }

    #[test]
    fn dominance() {
        let a = vector(&[16, 16]);
        let b = vector(&[8, 16]);
        let c = vector(&[16, 8]);

        assert_eq!(compare(&a, &b), Dominance::FirstDominates);
        assert_eq!(compare(&b, &a), Dominance::SecondDominates);
        assert_eq!(compare(&b, &c), Dominance::NoDominance);
        assert_eq!(compare(&a, &a.clone()), Dominance::Equal);
        assert_eq!(
            compare(&a, &ScoreVector(vec![Some(16), None])),
            Dominance::Undetermined
        );
    }

    #[test]
    fn dominance_is_mirrored() {
        let vectors = [
            vector(&[16, 8, 16]),
            vector(&[8, 8, 16]),
            vector(&[16, 16, 8]),
            vector(&[8, 16, 16]),
            vector(&[16, 8, 16]),
        ];

        for a in vectors.iter() {
            for b in vectors.iter() {
                let result = compare(a, b);

                assert_ne!(result, Dominance::Undetermined);
                assert_eq!(result.mirror(), compare(b, a));
            }
        }
    }

    #[test]
    fn best_is_order_dependent_under_non_dominance() {
        let a = vector(&[16, 8]);
        let b = vector(&[8, 16]);
        let c = vector(&[16, 16]);

        assert_eq!(find_best(vec![&a, &b]), Some(0));
        assert_eq!(find_best(vec![&b, &a]), Some(0));
        assert_eq!(find_best(vec![&a, &b, &c]), Some(2));
        assert_eq!(find_best(Vec::<&ScoreVector>::new()), None);
        assert_eq!(
            find_best(vec![&a, &ScoreVector(vec![None, Some(16)])]),
            None
        );
    }

    #[test]
    fn well_defined_and_rejection() {
        let undecided = ScoreVector::undecided(2);
        assert_eq!(undecided.slots().len(), 3);
        assert!(!undecided.is_well_defined());
        assert!(!undecided.has_rejection());

        let rejected = ScoreVector(vec![Some(0), None, Some(16)]);
        assert!(rejected.has_rejection());
        assert!(!rejected.is_well_defined());
    }

    #[test]
    fn argument_scores() {
        let rodeo = new_rodeo();
        let mut solver = Solver::new(&rodeo);

        let int = solver.add_struct("Int", vec![]);
        let int = solver.decl_type(int);
        let string = solver.add_struct("String", vec![]);
        let string = solver.decl_type(string);
        let base = solver.add_struct("Base", vec![]);
        let base = solver.decl_type(base);
        let derived = solver.add_struct("Derived", vec![]);
        let derived_ty = solver.decl_type(derived);
        solver.add_base(derived, base);

        let t = solver.add_generic("T");
        let t_ty = solver.param(t).ty;
        let list = solver.add_struct("List", vec![t]);
        let list_int = solver.instance(list, vec![int]);
        let list_string = solver.instance(list, vec![string]);
        let list_t = solver.instance(list, vec![t_ty]);
        let var = solver.type_var(Span::None);
        let list_var = solver.instance(list, vec![var]);
        let error = solver.error_type();

        for ty in [int, string, base, derived_ty, list_int].iter() {
            assert_eq!(solver.score_argument(*ty, *ty), Some(FULL_SCORE));
        }

        assert_eq!(solver.score_argument(base, derived_ty), Some(HALF_SCORE));
        assert_eq!(solver.score_argument(derived_ty, base), Some(ZERO_SCORE));
        assert_eq!(solver.score_argument(int, string), Some(ZERO_SCORE));
        assert_eq!(solver.score_argument(t_ty, int), Some(HALF_SCORE));
        assert_eq!(solver.score_argument(list_t, list_int), Some(HALF_SCORE));
        assert_eq!(solver.score_argument(list_int, list_string), Some(ZERO_SCORE));
        assert_eq!(solver.score_argument(list_int, list_var), None);
        assert_eq!(solver.score_argument(int, var), None);
        assert_eq!(solver.score_argument(int, error), Some(FULL_SCORE));
    }

    #[test]
    fn parameter_count() {
        let rodeo = new_rodeo();
        let solver = Solver::new(&rodeo);

        assert!(solver.matches_parameter_count(2, false, 2));
        assert!(!solver.matches_parameter_count(1, false, 2));
        assert!(!solver.matches_parameter_count(2, false, 1));

        // fn(Int, ...Int)
        assert!(!solver.matches_parameter_count(2, true, 0));
        assert!(solver.matches_parameter_count(2, true, 1));
        assert!(solver.matches_parameter_count(2, true, 2));
        assert!(solver.matches_parameter_count(2, true, 5));
        assert!(!solver.matches_parameter_count(0, true, 0));
        assert!(!solver.matches_parameter_count(0, true, 3));
    }

    #[test]
    fn variadic_tail_scores_at_most_half() {
        let rodeo = new_rodeo();
        let mut solver = Solver::new(&rodeo);

        let int = solver.add_struct("Int", vec![]);
        let int = solver.decl_type(int);
        let ints = solver.array(1, int);

        let mut exact = ScoreVector::undecided(2);
        assert!(solver.refine_scores(&[int, int], false, &[int, int], &mut exact));
        assert_eq!(exact, vector(&[16, 16, 16]));

        let mut variadic = ScoreVector::undecided(2);
        assert!(solver.refine_scores(&[ints], true, &[int, int], &mut variadic));
        assert_eq!(variadic, vector(&[8, 8, 8]));

        let mut empty = ScoreVector::undecided(0);
        assert!(solver.refine_scores(&[ints], true, &[], &mut empty));
        assert_eq!(empty, vector(&[8]));

        assert_eq!(compare(&exact, &variadic), Dominance::FirstDominates);

        // Decided vectors don't change anymore
        assert!(!solver.refine_scores(&[ints], true, &[int, int], &mut variadic));
    }

    #[test]
    fn refinement_waits_for_variables() {
        let rodeo = new_rodeo();
        let mut solver = Solver::new(&rodeo);

        let int = solver.add_struct("Int", vec![]);
        let int = solver.decl_type(int);
        let var = solver.type_var(Span::None);

        let mut scores = ScoreVector::undecided(2);
        assert!(solver.refine_scores(&[int, int], false, &[int, var], &mut scores));
        assert_eq!(scores, ScoreVector(vec![Some(16), None, Some(16)]));
        assert!(!solver.refine_scores(&[int, int], false, &[int, var], &mut scores));

        solver.unify(var, int);
        assert!(solver.refine_scores(&[int, int], false, &[int, var], &mut scores));
        assert!(scores.is_well_defined());
    }
}
