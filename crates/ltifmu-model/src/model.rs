//! The canonical state-space model every input form is reduced to.

use ndarray::{Array1, Array2};

use crate::error::{ModelError, Result};
use crate::layout::VariableLayout;

/// A continuous-time LTI system `x' = A x + B u`, `y = C x + D u`.
///
/// Construction validates every dimension against `nx`, `nu`, `ny`; once built
/// the model is immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct LtiModel {
    a: Array2<f64>,
    b: Array2<f64>,
    c: Array2<f64>,
    d: Array2<f64>,
    x0: Array1<f64>,
    u0: Array1<f64>,
}

impl LtiModel {
    /// Build a model from explicit matrices.
    ///
    /// `x0` and `u0` default to zero vectors of the inferred length.
    pub fn new(
        a: Array2<f64>,
        b: Array2<f64>,
        c: Array2<f64>,
        d: Array2<f64>,
        x0: Option<Array1<f64>>,
        u0: Option<Array1<f64>>,
    ) -> Result<Self> {
        let nx = a.nrows();
        if a.ncols() != nx {
            return Err(ModelError::shape("A columns", nx, a.ncols()));
        }
        if b.nrows() != nx {
            return Err(ModelError::shape("B rows", nx, b.nrows()));
        }
        let nu = b.ncols();
        if c.ncols() != nx {
            return Err(ModelError::shape("C columns", nx, c.ncols()));
        }
        let ny = c.nrows();
        if d.nrows() != ny {
            return Err(ModelError::shape("D rows", ny, d.nrows()));
        }
        if d.ncols() != nu {
            return Err(ModelError::shape("D columns", nu, d.ncols()));
        }

        let x0 = x0.unwrap_or_else(|| Array1::zeros(nx));
        if x0.len() != nx {
            return Err(ModelError::shape("x0 length", nx, x0.len()));
        }
        let u0 = u0.unwrap_or_else(|| Array1::zeros(nu));
        if u0.len() != nu {
            return Err(ModelError::shape("u0 length", nu, u0.len()));
        }

        for (name, finite) in [
            ("A", a.iter().all(|v| v.is_finite())),
            ("B", b.iter().all(|v| v.is_finite())),
            ("C", c.iter().all(|v| v.is_finite())),
            ("D", d.iter().all(|v| v.is_finite())),
            ("x0", x0.iter().all(|v| v.is_finite())),
            ("u0", u0.iter().all(|v| v.is_finite())),
        ] {
            if !finite {
                return Err(ModelError::NonFinite { what: name.into() });
            }
        }

        Ok(Self { a, b, c, d, x0, u0 })
    }

    /// Number of states.
    pub fn nx(&self) -> usize {
        self.a.nrows()
    }

    /// Number of inputs.
    pub fn nu(&self) -> usize {
        self.b.ncols()
    }

    /// Number of outputs.
    pub fn ny(&self) -> usize {
        self.c.nrows()
    }

    pub fn a(&self) -> &Array2<f64> {
        &self.a
    }

    pub fn b(&self) -> &Array2<f64> {
        &self.b
    }

    pub fn c(&self) -> &Array2<f64> {
        &self.c
    }

    pub fn d(&self) -> &Array2<f64> {
        &self.d
    }

    /// Start values of the states.
    pub fn x0(&self) -> &Array1<f64> {
        &self.x0
    }

    /// Start values of the inputs.
    pub fn u0(&self) -> &Array1<f64> {
        &self.u0
    }

    /// Register layout for this model's dimensions.
    pub fn layout(&self) -> VariableLayout {
        VariableLayout::allocate(self.nx(), self.nu(), self.ny())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn defaults_start_vectors_to_zero() {
        let m = LtiModel::new(
            array![[1.0, 2.0], [3.0, 4.0]],
            Array2::zeros((2, 1)),
            Array2::eye(2),
            Array2::zeros((2, 1)),
            None,
            None,
        )
        .unwrap();
        assert_eq!((m.nx(), m.nu(), m.ny()), (2, 1, 2));
        assert_eq!(m.x0(), &array![0.0, 0.0]);
        assert_eq!(m.u0(), &array![0.0]);
    }

    #[test]
    fn rejects_non_square_a() {
        let err = LtiModel::new(
            Array2::zeros((2, 3)),
            Array2::zeros((2, 0)),
            Array2::zeros((0, 2)),
            Array2::zeros((0, 0)),
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err, ModelError::shape("A columns", 2, 3));
    }

    #[test]
    fn rejects_wrong_x0_length() {
        let err = LtiModel::new(
            Array2::zeros((1, 1)),
            Array2::zeros((1, 1)),
            Array2::eye(1),
            Array2::zeros((1, 1)),
            Some(array![1.0, 2.0]),
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("x0 length expected 1, found 2"));
    }

    #[test]
    fn rejects_nan_coefficients() {
        let err = LtiModel::new(
            array![[f64::NAN]],
            Array2::zeros((1, 0)),
            Array2::eye(1),
            Array2::zeros((1, 0)),
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err, ModelError::NonFinite { what: "A".into() });
    }

    #[test]
    fn all_zero_dimensions_are_valid() {
        let m = LtiModel::new(
            Array2::zeros((0, 0)),
            Array2::zeros((0, 0)),
            Array2::zeros((0, 0)),
            Array2::zeros((0, 0)),
            None,
            None,
        )
        .unwrap();
        assert_eq!(m.layout().register_count(), 0);
    }
}
