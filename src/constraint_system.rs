use std::collections::HashMap;

use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix};

use crate::datatypes::{ConstraintEquation, Dof};

/// The periodicity equations as a sparse system `C u = 0`
///
/// Rows follow the equation order; columns are the `(label, dof)` pairs in
/// order of first appearance.
pub struct ConstraintSystem {
    pub matrix: CsrMatrix<f64>,
    pub columns: Vec<(u64, Dof)>,
}

impl ConstraintSystem {
    /// Assembles the coefficient matrix of a set of equations
    ///
    /// # Arguments
    /// * `equations` - The equations to assemble
    pub fn assemble(equations: &[ConstraintEquation]) -> ConstraintSystem {
        let mut column_of: HashMap<(u64, Dof), usize> = HashMap::new();
        let mut columns: Vec<(u64, Dof)> = Vec::new();
        let mut entries: Vec<(usize, usize, f64)> = Vec::new();

        for (row, equation) in equations.iter().enumerate() {
            for term in &equation.terms {
                let key = (term.label, term.dof);
                let col = *column_of.entry(key).or_insert_with(|| {
                    columns.push(key);
                    columns.len() - 1
                });
                entries.push((row, col, term.coefficient));
            }
        }

        let mut coo = CooMatrix::new(equations.len(), columns.len());
        for (row, col, value) in entries {
            coo.push(row, col, value);
        }

        ConstraintSystem {
            matrix: CsrMatrix::from(&coo),
            columns,
        }
    }

    /// Evaluates `C u` for a nodal displacement field
    ///
    /// # Arguments
    /// * `displacement` - Displacement of a node label along a degree of freedom
    ///
    /// # Returns
    /// One residual per equation
    pub fn residual<F>(&self, displacement: F) -> DVector<f64>
    where
        F: Fn(u64, Dof) -> f64,
    {
        let u = DVector::from_iterator(
            self.columns.len(),
            self.columns
                .iter()
                .map(|(label, dof)| displacement(*label, *dof)),
        );

        &self.matrix * &u
    }

    /// Largest absolute residual of a displacement field
    pub fn max_residual<F>(&self, displacement: F) -> f64
    where
        F: Fn(u64, Dof) -> f64,
    {
        self.residual(displacement).amax()
    }
}
