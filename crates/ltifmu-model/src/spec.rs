//! User-facing model descriptions, one variant per supported input form.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::model::LtiModel;
use crate::{pid, statespace, transfer};

/// A model in any of the supported forms.
///
/// Deserializes from a table tagged by `kind`:
///
/// ```toml
/// kind = "tf"
/// num = [1.0]
/// den = [1.0, 10.0]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ModelSpec {
    #[serde(rename = "ss")]
    StateSpace(StateSpaceSpec),
    #[serde(rename = "tf")]
    TransferFunction(TransferFunctionSpec),
    #[serde(rename = "zpk")]
    ZeroPoleGain(ZeroPoleGainSpec),
    #[serde(rename = "pid")]
    Pid(PidSpec),
}

impl ModelSpec {
    /// Reduce this description to canonical state-space form.
    pub fn realize(&self) -> Result<LtiModel> {
        let model = match self {
            ModelSpec::StateSpace(spec) => statespace::realize(spec)?,
            ModelSpec::TransferFunction(spec) => transfer::realize(spec)?,
            ModelSpec::ZeroPoleGain(spec) => transfer::realize_zpk(spec)?,
            ModelSpec::Pid(spec) => pid::realize(spec)?,
        };
        tracing::debug!(
            form = self.form_name(),
            nx = model.nx(),
            nu = model.nu(),
            ny = model.ny(),
            "realized model"
        );
        Ok(model)
    }

    /// Short tag of the input form.
    pub fn form_name(&self) -> &'static str {
        match self {
            ModelSpec::StateSpace(_) => "ss",
            ModelSpec::TransferFunction(_) => "tf",
            ModelSpec::ZeroPoleGain(_) => "zpk",
            ModelSpec::Pid(_) => "pid",
        }
    }
}

/// Raw state-space matrices, any of which may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateSpaceSpec {
    #[serde(rename = "A", alias = "a")]
    pub a: Option<Vec<Vec<f64>>>,
    #[serde(rename = "B", alias = "b")]
    pub b: Option<Vec<Vec<f64>>>,
    #[serde(rename = "C", alias = "c")]
    pub c: Option<Vec<Vec<f64>>>,
    #[serde(rename = "D", alias = "d")]
    pub d: Option<Vec<Vec<f64>>>,
    pub x0: Option<Vec<f64>>,
    pub u0: Option<Vec<f64>>,
}

/// Transfer function with coefficients ordered from highest degree down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferFunctionSpec {
    pub num: Vec<f64>,
    pub den: Vec<f64>,
    #[serde(default)]
    pub x0: Option<Vec<f64>>,
    #[serde(default)]
    pub u0: Option<f64>,
}

/// Real zeros, real poles and a gain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZeroPoleGainSpec {
    #[serde(default)]
    pub zeros: Vec<f64>,
    #[serde(default)]
    pub poles: Vec<f64>,
    #[serde(default = "unit_gain")]
    pub gain: f64,
    #[serde(default)]
    pub x0: Option<Vec<f64>>,
    #[serde(default)]
    pub u0: Option<f64>,
}

fn unit_gain() -> f64 {
    1.0
}

/// PID controller `kp + ki/s + kd s / (T s + 1)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidSpec {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Derivative filter time constant.
    #[serde(rename = "T", alias = "t")]
    pub t: f64,
    pub x0: Option<Vec<f64>>,
    pub u0: Option<f64>,
}

/// Build a matrix from row-major nested vectors.
///
/// An empty outer vector is a 0x0 matrix; rows must all have the same length.
pub(crate) fn matrix_from_rows(name: &'static str, rows: &[Vec<f64>]) -> Result<Array2<f64>> {
    let ncols = rows.first().map_or(0, Vec::len);
    if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != ncols) {
        return Err(ModelError::RaggedMatrix {
            name,
            row,
            len: r.len(),
            expected: ncols,
        });
    }
    Ok(Array2::from_shape_fn((rows.len(), ncols), |(i, j)| rows[i][j]))
}

pub(crate) fn vector(values: &Option<Vec<f64>>) -> Option<Array1<f64>> {
    values.as_ref().map(|v| Array1::from_vec(v.clone()))
}

pub(crate) fn scalar_vector(value: Option<f64>) -> Option<Array1<f64>> {
    value.map(|v| Array1::from_elem(1, v))
}
