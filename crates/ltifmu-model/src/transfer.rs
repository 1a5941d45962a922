//! Transfer-function and zero-pole-gain realization in controllable companion form.

use ndarray::{Array1, Array2};

use crate::error::{ModelError, Result};
use crate::model::LtiModel;
use crate::spec::{scalar_vector, vector, TransferFunctionSpec, ZeroPoleGainSpec};

static ZERO_POLY: [f64; 1] = [0.0];

/// Realize a SISO transfer function.
pub fn realize(spec: &TransferFunctionSpec) -> Result<LtiModel> {
    from_polynomials(&spec.num, &spec.den, vector(&spec.x0), scalar_vector(spec.u0))
}

/// Expand zeros, poles and gain into polynomials, then realize.
pub fn realize_zpk(spec: &ZeroPoleGainSpec) -> Result<LtiModel> {
    check_finite("zeros", &spec.zeros)?;
    check_finite("poles", &spec.poles)?;
    check_finite("gain", &[spec.gain])?;

    let num: Vec<f64> = poly_from_roots(&spec.zeros)
        .into_iter()
        .map(|c| c * spec.gain)
        .collect();
    let den = poly_from_roots(&spec.poles);
    tracing::debug!(?num, ?den, "expanded zero-pole-gain form");

    from_polynomials(&num, &den, vector(&spec.x0), scalar_vector(spec.u0))
}

/// Realize `num(s) / den(s)` with the given start vectors.
pub(crate) fn from_polynomials(
    num: &[f64],
    den: &[f64],
    x0: Option<Array1<f64>>,
    u0: Option<Array1<f64>>,
) -> Result<LtiModel> {
    let (a, b, c, d) = companion(num, den)?;
    LtiModel::new(a, b, c, d, x0, u0)
}

/// Controllable companion form of `num(s) / den(s)`.
///
/// With `den` normalized to `s^n + a1 s^(n-1) + ... + an` and `num` padded on
/// the left to `b0 s^n + ... + bn`:
///
/// ```text
/// A = | 0    1    ...  0   |   B = | 0 |   C = [bn - b0 an, ..., b1 - b0 a1]
///     | :         ⋱    :   |       | : |   D = b0
///     | 0    0    ...  1   |       | 0 |
///     | -an  ...  -a2  -a1 |       | 1 |
/// ```
///
/// `b0` is non-zero only when numerator and denominator have equal degree.
pub(crate) fn companion(
    num: &[f64],
    den: &[f64],
) -> Result<(Array2<f64>, Array2<f64>, Array2<f64>, Array2<f64>)> {
    check_finite("numerator", num)?;
    check_finite("denominator", den)?;

    let den = strip_leading_zeros(den);
    if den.is_empty() {
        return Err(ModelError::EmptyDenominator);
    }
    let num = match strip_leading_zeros(num) {
        [] => &ZERO_POLY[..],
        trimmed => trimmed,
    };

    let n = den.len() - 1;
    let m = num.len() - 1;
    if m > n {
        return Err(ModelError::ImproperTransferFunction {
            num_degree: m,
            den_degree: n,
        });
    }

    let lead = den[0];
    let a: Vec<f64> = den.iter().map(|v| v / lead).collect();
    let mut b = vec![0.0; n - m];
    b.extend(num.iter().map(|v| v / lead));

    let d0 = b[0];
    let a_mat = Array2::from_shape_fn((n, n), |(i, j)| {
        if i + 1 == n {
            -a[n - j]
        } else if j == i + 1 {
            1.0
        } else {
            0.0
        }
    });
    let b_mat = Array2::from_shape_fn((n, 1), |(i, _)| if i + 1 == n { 1.0 } else { 0.0 });
    let c_mat = Array2::from_shape_fn((1, n), |(_, j)| b[n - j] - d0 * a[n - j]);
    let d_mat = Array2::from_elem((1, 1), d0);

    Ok((a_mat, b_mat, c_mat, d_mat))
}

/// Coefficients of `prod (s - r)`, highest degree first.
pub(crate) fn poly_from_roots(roots: &[f64]) -> Vec<f64> {
    let mut coeffs = vec![1.0];
    for &root in roots {
        let mut next = vec![0.0; coeffs.len() + 1];
        for (i, &c) in coeffs.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c * root;
        }
        coeffs = next;
    }
    coeffs
}

fn strip_leading_zeros(coeffs: &[f64]) -> &[f64] {
    let start = coeffs.iter().position(|&c| c != 0.0).unwrap_or(coeffs.len());
    &coeffs[start..]
}

fn check_finite(what: &str, values: &[f64]) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ModelError::NonFinite { what: what.into() })
    }
}
