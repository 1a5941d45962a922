//! Numeric literal rendering.

use ndarray::{Array1, ArrayView1};

/// Render `value` as a C `double` literal that parses back to the same bits.
///
/// Uses the shortest round-trip representation, which always carries a
/// decimal point or an exponent.
pub fn c_double(value: f64) -> String {
    format!("{value:?}")
}

/// Comma-separated literals of a row.
pub fn c_row(row: ArrayView1<'_, f64>) -> String {
    row.iter()
        .map(|&v| c_double(v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Comma-separated literals of a vector.
pub fn c_vector(values: &Array1<f64>) -> String {
    c_row(values.view())
}

/// Comma-separated integers.
pub fn c_indices(indices: impl IntoIterator<Item = usize>) -> String {
    indices
        .into_iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
