//! Raw state-space input with missing-matrix inference.

use ndarray::Array2;

use crate::error::{ModelError, Result};
use crate::model::LtiModel;
use crate::spec::{matrix_from_rows, vector, StateSpaceSpec};

/// Fill in omitted matrices and validate the result.
///
/// - A absent: zero `nx x nx`, with `nx` taken from B's rows (0 without B).
/// - B absent: zero `nx x nu`, with `nu` taken from D's columns (0 without D).
/// - C absent: identity when D is also absent, otherwise zero `ny x nx`.
/// - D absent: zero `ny x nu`.
///
/// C without A or D cannot be sized and is rejected.
pub fn realize(spec: &StateSpaceSpec) -> Result<LtiModel> {
    let parse = |name, rows: &Option<Vec<Vec<f64>>>| {
        rows.as_deref()
            .map(|r| matrix_from_rows(name, r))
            .transpose()
    };
    let a = parse("A", &spec.a)?;
    let b = parse("B", &spec.b)?;
    let c = parse("C", &spec.c)?;
    let d = parse("D", &spec.d)?;

    if a.is_none() && b.is_none() && c.is_none() && d.is_none() {
        return Err(ModelError::NoMatrices);
    }
    if c.is_some() && a.is_none() && d.is_none() {
        return Err(ModelError::shape("C", "A or D to size the system", "C without A or D"));
    }

    let nx = a.as_ref().or(b.as_ref()).map_or(0, |m| m.nrows());
    let a = a.unwrap_or_else(|| Array2::zeros((nx, nx)));

    let nu = b.as_ref().or(d.as_ref()).map_or(0, |m| m.ncols());
    let b = b.unwrap_or_else(|| Array2::zeros((nx, nu)));

    let c = match (c, &d) {
        (Some(c), _) => c,
        (None, None) => Array2::eye(nx),
        (None, Some(d)) => Array2::zeros((d.nrows(), nx)),
    };
    let d = d.unwrap_or_else(|| Array2::zeros((c.nrows(), nu)));

    LtiModel::new(a, b, c, d, vector(&spec.x0), vector(&spec.u0))
}
