use crate::dense::DenseMat;
use crate::helpers::dot;

/// Elimination could not find a usable pivot: the matrix is singular
/// (or close enough to it that the factors would be garbage).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SingularMatrix;

#[derive(Clone)]
pub struct LuFactors {
    /// L (unit diagonal, strictly below) and U (diagonal and above)
    /// packed into one matrix, rows in pivot order.
    lu: DenseMat,
    /// new2orig: row `i` of the factors is row `perm[i]` of the input.
    perm: Vec<usize>,
}

/// Factorizes a square matrix as P·A = L·U with partial pivoting.
pub fn lu_factorize(mat: &DenseMat) -> Result<LuFactors, SingularMatrix> {
    let n = mat.rows();
    assert_eq!(n, mat.cols());

    trace!("lu_factorize: starting, size: {}", n);

    let mut lu = mat.clone();
    let mut perm: Vec<usize> = (0..n).collect();

    for k in 0..n {
        let mut pivot_row = k;
        let mut max_abs = f64::abs(lu.at(k, k));
        for i in (k + 1)..n {
            let abs = f64::abs(lu.at(i, k));
            if abs > max_abs {
                max_abs = abs;
                pivot_row = i;
            }
        }
        if !max_abs.is_normal() {
            return Err(SingularMatrix);
        }

        if pivot_row != k {
            for c in 0..n {
                let tmp = lu.at(k, c);
                lu.set(k, c, lu.at(pivot_row, c));
                lu.set(pivot_row, c, tmp);
            }
            perm.swap(k, pivot_row);
        }

        let pivot = lu.at(k, k);
        for i in (k + 1)..n {
            let factor = lu.at(i, k) / pivot;
            lu.set(i, k, factor);
            for j in (k + 1)..n {
                lu.set(i, j, lu.at(i, j) - factor * lu.at(k, j));
            }
        }
    }

    trace!("lu_factorize: done");

    Ok(LuFactors { lu, perm })
}

impl LuFactors {
    /// Solves A·x = rhs in place.
    pub fn solve(&self, rhs: &mut [f64]) {
        let n = self.perm.len();
        assert_eq!(rhs.len(), n);

        let mut y: Vec<f64> = self.perm.iter().map(|&p| rhs[p]).collect();

        for i in 1..n {
            let mut val = y[i];
            for j in 0..i {
                val -= self.lu.at(i, j) * y[j];
            }
            y[i] = val;
        }

        for i in (0..n).rev() {
            let mut val = y[i];
            for j in (i + 1)..n {
                val -= self.lu.at(i, j) * y[j];
            }
            y[i] = val / self.lu.at(i, i);
        }

        rhs.copy_from_slice(&y);
    }

    /// Solves Aᵀ·x = rhs in place.
    pub fn solve_transp(&self, rhs: &mut [f64]) {
        let n = self.perm.len();
        assert_eq!(rhs.len(), n);

        // Aᵀ = Uᵀ·Lᵀ·P, so substitute through Uᵀ, then Lᵀ, then un-permute.
        let mut y = vec![0.0; n];
        for i in 0..n {
            let mut val = rhs[i];
            for j in 0..i {
                val -= self.lu.at(j, i) * y[j];
            }
            y[i] = val / self.lu.at(i, i);
        }

        for i in (0..n).rev() {
            let mut val = y[i];
            for j in (i + 1)..n {
                val -= self.lu.at(j, i) * y[j];
            }
            y[i] = val;
        }

        for (i, &p) in self.perm.iter().enumerate() {
            rhs[p] = y[i];
        }
    }
}

/// Least-squares solution of the over-determined system `cols`·w = rhs,
/// computed from the normal equations.
pub fn solve_least_squares(cols: &DenseMat, rhs: &[f64]) -> Result<Vec<f64>, SingularMatrix> {
    assert_eq!(cols.rows(), rhs.len());
    let k = cols.cols();

    let mut gram = DenseMat::zeros(k, k);
    for i in 0..k {
        for j in i..k {
            let val = dot(cols.col(i), cols.col(j));
            gram.set(i, j, val);
            gram.set(j, i, val);
        }
    }

    let mut w: Vec<f64> = (0..k).map(|i| dot(cols.col(i), rhs)).collect();
    lu_factorize(&gram)?.solve(&mut w);
    Ok(w)
}
