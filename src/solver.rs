use crate::{
    dense::DenseMat,
    helpers::{dot, min_idx},
    lu::{lu_factorize, solve_least_squares, LuFactors, SingularMatrix},
    Error,
};

/// Residual above which a column counts as independent of the others.
const LIN_DEP_TOL: f64 = 1e-10;
/// Tolerance on xb being non-negative for a feasible basis.
const INIT_POS_TOL: f64 = 1e-14;
/// The objective must never grow by more than this between iterations.
const COST_INCREASE_TOL: f64 = 1e-10;
/// Reduced-cost negativity cutoff under Bland's rule.
const BLAND_NEG_TOL: f64 = 1e-14;
/// Optimality tolerance for the auxiliary problem.
const PHASE_ONE_TOL: f64 = 1e-14;

/// Solves the standard-form LP
///
///   minimize c·x  subject to  a·x = b, x >= 0
///
/// and returns `(objective, x, basic_idxs)`.
///
/// With `initial_basic` the caller asserts that those columns form a
/// feasible basis; a basis that fails verification is a caller bug and
/// panics. Without it a feasible basis is constructed, solving an
/// auxiliary LP if the first linearly independent column set is not
/// feasible on its own.
pub(crate) fn simplex(
    initial_basic: Option<&[usize]>,
    c: &[f64],
    a: &DenseMat,
    b: &[f64],
    tol: f64,
) -> Result<(f64, Vec<f64>, Vec<usize>), Error> {
    verify_inputs(initial_basic, c, a, b)?;

    let (basic_idxs, basic_mat, basic_var_vals) = if let Some(initial) = initial_basic {
        let basic_mat = a.select_cols(initial);
        let xb = basic_var_values(&basic_mat, b)
            .unwrap_or_else(|_| panic!("lp: supplied basis columns are linearly dependent"));
        if !is_feasible(&xb) {
            panic!("lp: supplied basis is not a feasible solution");
        }
        (initial.to_vec(), basic_mat, xb)
    } else {
        find_initial_basic(a, b)?
    };

    let mut solver = Solver::new(c, a, b, tol, basic_idxs, basic_mat, basic_var_vals);
    solver.optimize()?;
    Ok(solver.into_solution())
}

fn verify_inputs(
    initial_basic: Option<&[usize]>,
    c: &[f64],
    a: &DenseMat,
    b: &[f64],
) -> Result<(), Error> {
    let m = a.rows();
    let n = a.cols();
    assert!(m <= n, "lp: more rows than columns");
    assert_eq!(c.len(), n, "lp: c vector incorrect length");
    assert_eq!(b.len(), m, "lp: b vector incorrect length");
    if let Some(initial) = initial_basic {
        assert_eq!(initial.len(), m, "lp: initial basis incorrect length");
    }

    // A row of zeros makes the constraint either contradictory or vacuous;
    // both must be resolved by the caller before solving.
    for r in 0..m {
        if (0..n).all(|col| a.at(r, col) == 0.0) {
            if b[r] != 0.0 {
                return Err(Error::Infeasible);
            }
            return Err(Error::ZeroRow);
        }
    }

    // A column of zeros is a variable without constraints: driving it up
    // is free, so a negative cost means the objective has no lower bound.
    for j in 0..n {
        if a.col(j).iter().all(|&v| v == 0.0) {
            if c[j] < 0.0 {
                return Err(Error::Unbounded);
            }
            return Err(Error::ZeroColumn);
        }
    }

    Ok(())
}

/// Basic variable values for a candidate basis: solves basic_mat·xb = b.
/// Fails iff the basis columns are not linearly independent.
fn basic_var_values(basic_mat: &DenseMat, b: &[f64]) -> Result<Vec<f64>, SingularMatrix> {
    let lu = lu_factorize(basic_mat)?;
    let mut xb = b.to_vec();
    lu.solve(&mut xb);
    Ok(xb)
}

fn is_feasible(xb: &[f64]) -> bool {
    xb.iter().all(|&v| v >= -INIT_POS_TOL)
}

/// Whether `col` can be reproduced as a weighted sum of the already
/// admitted columns, up to `LIN_DEP_TOL`.
fn linearly_dependent(cols: &DenseMat, col: &[f64]) -> bool {
    // Admitted columns are mutually independent, so the least-squares
    // system cannot be singular.
    let weights = solve_least_squares(cols, col)
        .unwrap_or_else(|_| panic!("lp: unexpected linear solve failure"));
    let mut reproduced = vec![0.0; col.len()];
    cols.mul_vec(&weights, &mut reproduced);
    reproduced
        .iter()
        .zip(col)
        .all(|(&rep, &v)| f64::abs(rep - v) <= LIN_DEP_TOL)
}

/// Collects up to m mutually linearly independent columns of `a`, scanning
/// right to left: slack columns usually sit at the end, which yields an
/// identity-like submatrix early.
fn find_linearly_independent(a: &DenseMat) -> Vec<usize> {
    let m = a.rows();
    let mut idxs = Vec::with_capacity(m);
    let mut columns = DenseMat::with_capacity(m, m);
    for i in (0..a.cols()).rev() {
        let col = a.col(i);
        if col.iter().all(|&v| v == 0.0) {
            continue;
        }
        if !idxs.is_empty() && linearly_dependent(&columns, col) {
            continue;
        }
        columns.push_col(col);
        idxs.push(i);
        if idxs.len() == m {
            break;
        }
    }
    idxs
}

/// Finds a feasible basis for phase 2, or proves there is none.
fn find_initial_basic(a: &DenseMat, b: &[f64]) -> Result<(Vec<usize>, DenseMat, Vec<f64>), Error> {
    let m = a.rows();
    let n = a.cols();

    let mut basic_idxs = find_linearly_independent(a);
    if basic_idxs.len() != m {
        return Err(Error::Singular);
    }

    let basic_mat = a.select_cols(&basic_idxs);
    let mut xb = basic_var_values(&basic_mat, b)
        .unwrap_or_else(|_| panic!("lp: unexpected linear solve failure"));
    if is_feasible(&xb) {
        return Ok((basic_idxs, basic_mat, xb));
    }

    debug!("initial basis infeasible, starting phase 1");

    // One artificial variable with index n. Its column is chosen so that
    // after it replaces the most negative basic variable, the all-ones
    // vector is a basic solution of the augmented basis:
    //   a_n = b - sum of the other basic columns.
    let replaced = min_idx(&xb);
    let mut art_col = b.to_vec();
    for (i, &idx) in basic_idxs.iter().enumerate() {
        if i == replaced {
            continue;
        }
        for (r, v) in art_col.iter_mut().enumerate() {
            *v -= a.at(r, idx);
        }
    }

    let mut a_aug = a.clone();
    a_aug.push_col(&art_col);
    basic_idxs[replaced] = n;

    // Minimizing the artificial variable drives it to zero exactly when
    // the original problem is feasible.
    let mut c_aug = vec![0.0; n + 1];
    c_aug[n] = 1.0;

    let aug_basis = a_aug.select_cols(&basic_idxs);
    let ones = vec![1.0; m];
    let mut check = vec![0.0; m];
    aug_basis.mul_vec(&ones, &mut check);
    for (&val, &rhs) in check.iter().zip(b) {
        if f64::abs(val - rhs) > 1e-10 {
            panic!("lp: artificial basis does not reproduce the right-hand side");
        }
    }

    // The auxiliary problem starts from a feasible basis and its objective
    // is bounded below by zero, so any error out of it is a bug.
    let (_, x_aux, new_basic) = simplex(Some(&basic_idxs), &c_aug, &a_aug, b, PHASE_ONE_TOL)
        .unwrap_or_else(|err| panic!("lp: auxiliary problem failed: {}", err));

    if new_basic.iter().any(|&idx| idx == n) {
        return Err(Error::Infeasible);
    }

    debug!("phase 1 done, artificial variable left the basis");

    for (i, &idx) in new_basic.iter().enumerate() {
        xb[i] = x_aux[idx];
    }
    let basic_mat = a.select_cols(&new_basic);
    Ok((new_basic, basic_mat, xb))
}

/// Simplex iteration state: the current basis and everything reordered to
/// match it. Position i of `basic_idxs`, `basic_obj`, `basic_var_vals` and
/// column i of `basic_mat` all describe the same basic variable.
struct Solver<'a> {
    a: &'a DenseMat,
    b: &'a [f64],
    tol: f64,

    basic_idxs: Vec<usize>,
    nb_idxs: Vec<usize>,
    basic_mat: DenseMat,
    nb_mat: DenseMat,
    basic_obj: Vec<f64>,
    nb_obj: Vec<f64>,
    basic_var_vals: Vec<f64>,
    cur_obj_val: f64,
}

impl<'a> Solver<'a> {
    fn new(
        c: &[f64],
        a: &'a DenseMat,
        b: &'a [f64],
        tol: f64,
        basic_idxs: Vec<usize>,
        basic_mat: DenseMat,
        basic_var_vals: Vec<f64>,
    ) -> Solver<'a> {
        let n = a.cols();
        let mut in_basis = vec![false; n];
        for &i in &basic_idxs {
            in_basis[i] = true;
        }
        let nb_idxs: Vec<usize> = (0..n).filter(|&i| !in_basis[i]).collect();
        let nb_mat = a.select_cols(&nb_idxs);
        let basic_obj: Vec<f64> = basic_idxs.iter().map(|&i| c[i]).collect();
        let nb_obj: Vec<f64> = nb_idxs.iter().map(|&i| c[i]).collect();
        let cur_obj_val = dot(&basic_obj, &basic_var_vals);

        Solver {
            a,
            b,
            tol,
            basic_idxs,
            nb_idxs,
            basic_mat,
            nb_mat,
            basic_obj,
            nb_obj,
            basic_var_vals,
            cur_obj_val,
        }
    }

    fn optimize(&mut self) -> Result<(), Error> {
        let m = self.a.rows();
        let mut last_cost = f64::INFINITY;
        let mut multipliers = vec![0.0; m];
        let mut reduced_costs = vec![0.0; self.nb_idxs.len()];
        let mut moves = vec![0.0; m];

        for iter in 0.. {
            // One factorization per iteration serves the multiplier solve,
            // the direction solve, and the basic-value refresh.
            let lu = match lu_factorize(&self.basic_mat) {
                Ok(lu) => lu,
                Err(_) => panic!("lp: unexpected linear solve failure"),
            };

            self.basic_var_vals.copy_from_slice(self.b);
            lu.solve(&mut self.basic_var_vals);

            let cost = dot(&self.basic_obj, &self.basic_var_vals);
            if cost - last_cost > COST_INCREASE_TOL {
                panic!("lp: objective increased from {} to {}", last_cost, cost);
            }
            last_cost = cost;
            self.cur_obj_val = cost;

            if iter % 100 == 0 {
                debug!("optimize iter {}: objective: {}", iter, cost);
            }

            // Reduced costs r = cn - an^T·y where ab^T·y = cb. Each entry
            // is the marginal objective change per unit of its non-basic
            // variable.
            multipliers.copy_from_slice(&self.basic_obj);
            lu.solve_transp(&mut multipliers);
            for (j, r) in reduced_costs.iter_mut().enumerate() {
                *r = self.nb_obj[j] - dot(self.nb_mat.col(j), &multipliers);
            }

            let (entering, leaving) = match self.choose_pivot(&lu, &reduced_costs, &mut moves, false)? {
                Some(pivot) => pivot,
                None => {
                    debug!("found optimum: {} in {} iterations", cost, iter + 1);
                    break;
                }
            };

            let (entering, leaving) = if moves[leaving] == 0.0 {
                // Degenerate step: redo the selection under Bland's rule so
                // the basis cannot start cycling. The Bland step may itself
                // be degenerate; that is fine, the rule still terminates.
                match self.choose_pivot(&lu, &reduced_costs, &mut moves, true)? {
                    Some(pivot) => pivot,
                    None => panic!("lp: optimum signalled under Bland's rule"),
                }
            } else {
                (entering, leaving)
            };

            std::mem::swap(&mut self.basic_idxs[leaving], &mut self.nb_idxs[entering]);
            std::mem::swap(&mut self.basic_obj[leaving], &mut self.nb_obj[entering]);
            self.basic_mat
                .swap_col_with(leaving, &mut self.nb_mat, entering);
        }

        Ok(())
    }

    /// Selects the entering and leaving variables: `(non-basic position,
    /// basic position)`. `None` certifies optimality (never under Bland's
    /// rule). The step length of the chosen pivot is left in `moves`.
    fn choose_pivot(
        &self,
        lu: &LuFactors,
        reduced_costs: &[f64],
        moves: &mut [f64],
        bland: bool,
    ) -> Result<Option<(usize, usize)>, Error> {
        if reduced_costs.is_empty() {
            // Square basis, nothing to enter.
            return Ok(None);
        }

        let entering = if bland {
            // First negative entry, not the most negative one.
            match reduced_costs.iter().position(|&r| r < -BLAND_NEG_TOL) {
                Some(j) => j,
                None => panic!("lp: no negative reduced cost under Bland's rule"),
            }
        } else {
            let j = min_idx(reduced_costs);
            if reduced_costs[j] >= -self.tol {
                return Ok(None);
            }
            j
        };

        // d[i] is the rate of change of basic variable i as the entering
        // variable grows.
        let mut direction = self.a.col(self.nb_idxs[entering]).to_vec();
        lu.solve(&mut direction);
        for d in direction.iter_mut() {
            *d = -*d;
        }

        // No basic variable decreases, so the entering variable can grow
        // forever.
        if direction.iter().all(|&d| d >= 0.0) {
            return Err(Error::Unbounded);
        }

        for (i, &d) in direction.iter().enumerate() {
            moves[i] = if d < 0.0 {
                self.basic_var_vals[i] / -d
            } else {
                f64::INFINITY
            };
        }
        let leaving = min_idx(moves);

        Ok(Some((entering, leaving)))
    }

    fn into_solution(self) -> (f64, Vec<f64>, Vec<usize>) {
        // All non-basic variables are zero.
        let mut x = vec![0.0; self.a.cols()];
        for (i, &idx) in self.basic_idxs.iter().enumerate() {
            x[idx] = self.basic_var_vals[i];
        }
        (self.cur_obj_val, x, self.basic_idxs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::assert_vec_approx_eq;

    #[test]
    fn verify_inputs_zero_rows_and_cols() {
        let zero_row = DenseMat::from_rows(&[vec![0.0, 0.0], vec![1.0, 1.0]]);
        assert_eq!(
            verify_inputs(None, &[1.0, 1.0], &zero_row, &[0.0, 1.0]),
            Err(Error::ZeroRow)
        );
        assert_eq!(
            verify_inputs(None, &[1.0, 1.0], &zero_row, &[2.0, 1.0]),
            Err(Error::Infeasible)
        );

        let zero_col = DenseMat::from_rows(&[vec![1.0, 0.0]]);
        assert_eq!(
            verify_inputs(None, &[1.0, 1.0], &zero_col, &[1.0]),
            Err(Error::ZeroColumn)
        );
        assert_eq!(
            verify_inputs(None, &[1.0, -1.0], &zero_col, &[1.0]),
            Err(Error::Unbounded)
        );

        let ok = DenseMat::from_rows(&[vec![1.0, 1.0]]);
        assert_eq!(verify_inputs(None, &[1.0, 1.0], &ok, &[1.0]), Ok(()));
    }

    #[test]
    #[should_panic(expected = "c vector incorrect length")]
    fn verify_inputs_bad_obj_len() {
        let a = DenseMat::from_rows(&[vec![1.0, 1.0]]);
        let _ = verify_inputs(None, &[1.0], &a, &[1.0]);
    }

    #[test]
    fn rank_scan_prefers_trailing_columns() {
        let a = DenseMat::from_rows(&[vec![1.0, 2.0, 1.0, 0.0], vec![3.0, 4.0, 0.0, 1.0]]);
        assert_eq!(find_linearly_independent(&a), vec![3, 2]);
    }

    #[test]
    fn rank_scan_skips_dependent_and_zero_columns() {
        let dependent = DenseMat::from_rows(&[vec![1.0, 1.0], vec![1.0, 1.0]]);
        assert_eq!(find_linearly_independent(&dependent), vec![1]);

        // Column 3 = column 4 doubled, column 1 is zero.
        let a = DenseMat::from_rows(&[
            vec![1.0, 0.0, 5.0, 2.0, 1.0],
            vec![0.0, 0.0, 6.0, 0.0, 0.0],
        ]);
        assert_eq!(find_linearly_independent(&a), vec![4, 2]);
    }

    #[test]
    fn feasibility_probe() {
        let a = DenseMat::from_rows(&[vec![1.0, 0.0, 1.0], vec![0.0, 1.0, 1.0]]);

        let feasible = a.select_cols(&[0, 1]);
        let xb = basic_var_values(&feasible, &[2.0, 3.0]).unwrap();
        assert_vec_approx_eq(&xb, &[2.0, 3.0], 1e-12);
        assert!(is_feasible(&xb));

        let infeasible = a.select_cols(&[0, 2]);
        let xb = basic_var_values(&infeasible, &[-1.0, 3.0]).unwrap();
        assert!(!is_feasible(&xb));

        let singular = DenseMat::from_rows(&[vec![1.0, 2.0], vec![2.0, 4.0]]);
        assert!(basic_var_values(&singular, &[1.0, 2.0]).is_err());
    }

    #[test]
    fn initial_basis_without_auxiliary_problem() {
        let a = DenseMat::from_rows(&[vec![1.0, 1.0, 1.0, 0.0], vec![1.0, 0.0, 0.0, 1.0]]);
        let (idxs, _, xb) = find_initial_basic(&a, &[2.0, 1.0]).unwrap();
        assert_eq!(idxs, vec![3, 2]);
        assert_vec_approx_eq(&xb, &[1.0, 2.0], 1e-12);
    }

    #[test]
    fn initial_basis_through_auxiliary_problem() {
        // The right-to-left scan picks columns {2, 1}, whose basic values
        // are [-2, 3]: phase 1 has to run and must end with the artificial
        // variable non-basic.
        let a = DenseMat::from_rows(&[vec![-1.0, 0.0, 1.0], vec![0.0, 1.0, 1.0]]);
        let b = [-2.0, 1.0];
        let (idxs, basic_mat, xb) = find_initial_basic(&a, &b).unwrap();

        assert!(idxs.iter().all(|&i| i < 3));
        assert!(is_feasible(&xb));
        let mut prod = vec![0.0; 2];
        basic_mat.mul_vec(&xb, &mut prod);
        assert_vec_approx_eq(&prod, &b, 1e-9);
    }

    #[test]
    fn rank_deficient_is_singular() {
        let a = DenseMat::from_rows(&[vec![1.0, 1.0], vec![1.0, 1.0]]);
        assert_eq!(find_initial_basic(&a, &[1.0, 2.0]).unwrap_err(), Error::Singular);
    }

    #[test]
    fn infeasible_through_artificial_variable() {
        // x0 + x1 = -1 has no non-negative solution, and A has full rank,
        // so only the auxiliary problem can detect it.
        let a = DenseMat::from_rows(&[vec![1.0, 1.0]]);
        assert_eq!(find_initial_basic(&a, &[-1.0]).unwrap_err(), Error::Infeasible);
    }

    #[test]
    fn unbounded_in_loop() {
        // x = [1 + t, t] stays feasible for every t >= 0 while the
        // objective -x1 falls without bound; detected by the direction
        // vector, not the validator.
        let a = DenseMat::from_rows(&[vec![1.0, -1.0]]);
        assert_eq!(
            simplex(None, &[0.0, -1.0], &a, &[1.0], 1e-9).unwrap_err(),
            Error::Unbounded
        );
    }

    #[test]
    #[should_panic(expected = "supplied basis is not a feasible solution")]
    fn supplied_infeasible_basis_panics() {
        let a = DenseMat::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0]]);
        // The identity basis solves to xb = [-1, 1]: not feasible.
        let _ = simplex(Some(&[0, 1]), &[1.0, 1.0], &a, &[-1.0, 1.0], 1e-9);
    }

    #[test]
    #[should_panic(expected = "supplied basis columns are linearly dependent")]
    fn supplied_singular_basis_panics() {
        let a = DenseMat::from_rows(&[vec![1.0, 2.0, 0.0], vec![2.0, 4.0, 1.0]]);
        let _ = simplex(Some(&[0, 1]), &[1.0, 1.0, 1.0], &a, &[1.0, 2.0], 1e-9);
    }
}
