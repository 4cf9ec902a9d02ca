/// Dense matrix with elements stored by columns.
#[derive(Clone, PartialEq)]
pub struct DenseMat {
    n_rows: usize,
    n_cols: usize,
    data: Vec<f64>,
}

impl DenseMat {
    pub fn zeros(n_rows: usize, n_cols: usize) -> DenseMat {
        DenseMat {
            n_rows,
            n_cols,
            data: vec![0.0; n_rows * n_cols],
        }
    }

    pub fn with_capacity(n_rows: usize, n_cols: usize) -> DenseMat {
        DenseMat {
            n_rows,
            n_cols: 0,
            data: Vec::with_capacity(n_rows * n_cols),
        }
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> DenseMat {
        let n_rows = rows.len();
        let n_cols = if n_rows == 0 { 0 } else { rows[0].len() };
        let mut mat = DenseMat::zeros(n_rows, n_cols);
        for (r, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), n_cols, "rows of unequal length");
            for (c, &val) in row.iter().enumerate() {
                mat.set(r, c, val);
            }
        }
        mat
    }

    pub fn rows(&self) -> usize {
        self.n_rows
    }

    pub fn cols(&self) -> usize {
        self.n_cols
    }

    #[inline]
    pub fn at(&self, r: usize, c: usize) -> f64 {
        self.data[c * self.n_rows + r]
    }

    #[inline]
    pub fn set(&mut self, r: usize, c: usize, val: f64) {
        self.data[c * self.n_rows + r] = val;
    }

    #[inline]
    pub fn col(&self, c: usize) -> &[f64] {
        &self.data[c * self.n_rows..(c + 1) * self.n_rows]
    }

    #[inline]
    pub fn col_mut(&mut self, c: usize) -> &mut [f64] {
        &mut self.data[c * self.n_rows..(c + 1) * self.n_rows]
    }

    pub fn push_col(&mut self, col: &[f64]) {
        assert_eq!(col.len(), self.n_rows);
        self.data.extend_from_slice(col);
        self.n_cols += 1;
    }

    /// New matrix out of the columns at `idxs`, in that order.
    pub fn select_cols(&self, idxs: &[usize]) -> DenseMat {
        let mut sub = DenseMat::with_capacity(self.n_rows, idxs.len());
        for &c in idxs {
            sub.push_col(self.col(c));
        }
        sub
    }

    /// Exchange column `c` of `self` with column `other_c` of `other`.
    pub fn swap_col_with(&mut self, c: usize, other: &mut DenseMat, other_c: usize) {
        assert_eq!(self.n_rows, other.n_rows);
        self.col_mut(c).swap_with_slice(other.col_mut(other_c));
    }

    /// out = self * x
    pub fn mul_vec(&self, x: &[f64], out: &mut [f64]) {
        assert_eq!(x.len(), self.n_cols);
        assert_eq!(out.len(), self.n_rows);
        for v in out.iter_mut() {
            *v = 0.0;
        }
        for (c, &xc) in x.iter().enumerate() {
            if xc == 0.0 {
                continue;
            }
            for (r, &val) in self.col(c).iter().enumerate() {
                out[r] += val * xc;
            }
        }
    }
}

impl std::fmt::Debug for DenseMat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for r in 0..self.n_rows {
            let row: Vec<f64> = (0..self.n_cols).map(|c| self.at(r, c)).collect();
            writeln!(f, "{:?}", row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construct_and_access() {
        let mat = DenseMat::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        assert_eq!(mat.rows(), 2);
        assert_eq!(mat.cols(), 3);
        assert_eq!(mat.at(0, 1), 2.0);
        assert_eq!(mat.at(1, 2), 6.0);
        assert_eq!(mat.col(1), &[2.0, 5.0]);
    }

    #[test]
    fn select_cols() {
        let mat = DenseMat::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let sub = mat.select_cols(&[2, 0]);
        assert_eq!(sub.cols(), 2);
        assert_eq!(sub.col(0), &[3.0, 6.0]);
        assert_eq!(sub.col(1), &[1.0, 4.0]);
    }

    #[test]
    fn swap_col_with() {
        let mut a = DenseMat::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]);
        let mut b = DenseMat::from_rows(&[vec![5.0], vec![6.0]]);
        a.swap_col_with(1, &mut b, 0);
        assert_eq!(a.col(1), &[5.0, 6.0]);
        assert_eq!(b.col(0), &[2.0, 4.0]);
    }

    #[test]
    fn mul_vec() {
        let mat = DenseMat::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let mut out = vec![0.0; 2];
        mat.mul_vec(&[1.0, 0.0, -1.0], &mut out);
        assert_eq!(&out, &[-2.0, -2.0]);
    }
}
