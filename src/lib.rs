#[macro_use]
extern crate log;

mod dense;
mod helpers;
mod lu;
mod solver;

pub use dense::DenseMat;

#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// The feasible region is empty.
    Infeasible,
    /// The objective decreases without bound over the feasible region.
    Unbounded,
    /// The constraint matrix has rank less than its row count.
    Singular,
    /// A row of all zeros (with a zero right-hand side) was found.
    ZeroRow,
    /// A column of all zeros (with a non-negative cost) was found.
    ZeroColumn,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let msg = match self {
            Error::Infeasible => "problem is infeasible",
            Error::Unbounded => "problem is unbounded",
            Error::Singular => "constraint matrix is rank-deficient",
            Error::ZeroRow => "constraint matrix has a row of all zeros",
            Error::ZeroColumn => "constraint matrix has a column of all zeros",
        };
        msg.fmt(f)
    }
}

impl std::error::Error for Error {}

#[derive(Clone, Debug)]
pub struct Solution {
    objective: f64,
    x: Vec<f64>,
    basic_idxs: Vec<usize>,
}

impl Solution {
    pub fn objective(&self) -> f64 {
        self.objective
    }

    /// Optimal values for all n variables. Non-basic variables are
    /// exactly zero.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Column indices of the variables that are basic at the final vertex;
    /// entry i holds the variable whose value sits in row i of the basis.
    pub fn basic_idxs(&self) -> &[usize] {
        &self.basic_idxs
    }
}

impl std::ops::Index<usize> for Solution {
    type Output = f64;

    fn index(&self, var: usize) -> &Self::Output {
        &self.x[var]
    }
}

/// Solves a linear program in standard form:
///
/// ```text
/// minimize    c·x
/// subject to  a·x = b,  x >= 0
/// ```
///
/// `a` is a dense m×n matrix with m <= n. Rows or columns of all zeros are
/// rejected up front with the matching [`Error`] kind so that the basis
/// matrices stay non-singular; rank-deficient inputs fail with
/// [`Error::Singular`].
///
/// `initial_basic`, when given, must hold m column indices forming a
/// feasible basis. The basis is verified, and one that fails verification
/// panics: only a caller bug can produce it. When `None`, a feasible basis
/// is found automatically, solving an auxiliary phase-1 problem with a
/// single artificial variable if the first linearly independent column set
/// is not feasible by itself.
///
/// Reduced costs above `-tol` count as non-negative, so `tol` decides when
/// the current vertex is declared optimal.
pub fn simplex(
    initial_basic: Option<&[usize]>,
    c: &[f64],
    a: &DenseMat,
    b: &[f64],
    tol: f64,
) -> Result<Solution, Error> {
    let (objective, x, basic_idxs) = solver::simplex(initial_basic, c, a, b, tol)?;
    Ok(Solution {
        objective,
        x,
        basic_idxs,
    })
}
