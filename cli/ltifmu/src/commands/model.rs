//! Model arguments: JSON matrices on the command line, or a model file.

use std::path::Path;

use anyhow::{bail, Context, Result};
use ltifmu_model::{ModelSpec, PidSpec, StateSpaceSpec, TransferFunctionSpec, ZeroPoleGainSpec};
use serde::Deserialize;

/// Parse a JSON matrix such as `[[1,2],[3,4]]`.
pub fn parse_matrix(name: &str, text: &str) -> Result<Vec<Vec<f64>>> {
    serde_json::from_str(text)
        .with_context(|| format!("{name}: expected a JSON matrix like [[1, 2], [3, 4]]"))
}

/// Parse a JSON vector; a bare number is a vector of one.
pub fn parse_vector(name: &str, text: &str) -> Result<Vec<f64>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(f64),
        Many(Vec<f64>),
    }
    let parsed: OneOrMany = serde_json::from_str(text)
        .with_context(|| format!("{name}: expected a JSON list like [0.5, 1] or a number"))?;
    Ok(match parsed {
        OneOrMany::One(v) => vec![v],
        OneOrMany::Many(v) => v,
    })
}

/// Parse a single-input start value.
pub fn parse_scalar(name: &str, text: &str) -> Result<f64> {
    match parse_vector(name, text)?.as_slice() {
        [v] => Ok(*v),
        other => bail!("{name}: single-input models take one value, found {}", other.len()),
    }
}

fn optional<T>(text: Option<&str>, parse: impl FnOnce(&str) -> Result<T>) -> Result<Option<T>> {
    text.map(parse).transpose()
}

/// Raw JSON arguments of the `ss` subcommand.
#[derive(Debug, Default)]
pub struct StateSpaceArgs<'a> {
    pub a: Option<&'a str>,
    pub b: Option<&'a str>,
    pub c: Option<&'a str>,
    pub d: Option<&'a str>,
}

pub fn state_space(args: StateSpaceArgs<'_>) -> Result<ModelSpec> {
    Ok(ModelSpec::StateSpace(StateSpaceSpec {
        a: optional(args.a, |t| parse_matrix("A", t))?,
        b: optional(args.b, |t| parse_matrix("B", t))?,
        c: optional(args.c, |t| parse_matrix("C", t))?,
        d: optional(args.d, |t| parse_matrix("D", t))?,
        x0: None,
        u0: None,
    }))
}

pub fn transfer_function(num: &str, den: &str) -> Result<ModelSpec> {
    Ok(ModelSpec::TransferFunction(TransferFunctionSpec {
        num: parse_vector("num", num)?,
        den: parse_vector("den", den)?,
        x0: None,
        u0: None,
    }))
}

pub fn zero_pole_gain(zeros: &str, poles: &str, gain: f64) -> Result<ModelSpec> {
    Ok(ModelSpec::ZeroPoleGain(ZeroPoleGainSpec {
        zeros: parse_vector("zeros", zeros)?,
        poles: parse_vector("poles", poles)?,
        gain,
        x0: None,
        u0: None,
    }))
}

pub fn pid(kp: f64, ki: f64, kd: f64, t: f64) -> ModelSpec {
    ModelSpec::Pid(PidSpec {
        kp,
        ki,
        kd,
        t,
        x0: None,
        u0: None,
    })
}

/// Read a `kind`-tagged model from TOML, or JSON when the extension is `.json`.
pub fn load_model_file(path: &Path) -> Result<ModelSpec> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let spec = if path.extension().is_some_and(|e| e == "json") {
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?
    } else {
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?
    };
    Ok(spec)
}

/// Apply `--x0`/`--u0` to a model, replacing values it already carries.
pub fn with_start_values(
    mut spec: ModelSpec,
    x0: Option<&str>,
    u0: Option<&str>,
) -> Result<ModelSpec> {
    let x0 = optional(x0, |t| parse_vector("x0", t))?;
    match &mut spec {
        ModelSpec::StateSpace(s) => {
            if x0.is_some() {
                s.x0 = x0;
            }
            if let Some(u0) = optional(u0, |t| parse_vector("u0", t))? {
                s.u0 = Some(u0);
            }
        }
        ModelSpec::TransferFunction(TransferFunctionSpec { x0: sx, u0: su, .. })
        | ModelSpec::ZeroPoleGain(ZeroPoleGainSpec { x0: sx, u0: su, .. })
        | ModelSpec::Pid(PidSpec { x0: sx, u0: su, .. }) => {
            if x0.is_some() {
                *sx = x0;
            }
            if let Some(u0) = optional(u0, |t| parse_scalar("u0", t))? {
                *su = Some(u0);
            }
        }
    }
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrices_and_vectors() {
        assert_eq!(
            parse_matrix("A", "[[1,2],[3,4]]").unwrap(),
            vec![vec![1.0, 2.0], vec![3.0, 4.0]]
        );
        assert_eq!(parse_vector("x0", "[0.5, 1]").unwrap(), vec![0.5, 1.0]);
        assert_eq!(parse_vector("u0", "2").unwrap(), vec![2.0]);
        assert!(parse_matrix("A", "[1,2]").is_err());
        assert!(parse_vector("x0", "abc").is_err());
        assert!(parse_scalar("u0", "[1, 2]").is_err());
        assert_eq!(parse_scalar("u0", "[3]").unwrap(), 3.0);
    }

    #[test]
    fn error_names_the_argument() {
        let err = parse_matrix("B", "[[1,").unwrap_err();
        assert!(format!("{err:#}").starts_with("B: expected a JSON matrix"));
    }

    #[test]
    fn state_space_from_json() {
        let spec = state_space(StateSpaceArgs {
            a: Some("[[1,2],[3,4]]"),
            ..StateSpaceArgs::default()
        })
        .unwrap();
        let model = spec.realize().unwrap();
        assert_eq!((model.nx(), model.nu(), model.ny()), (2, 0, 2));
    }

    #[test]
    fn start_values_override() {
        let spec = with_start_values(pid(1.0, 1.0, 0.0, 0.0), Some("[0.25]"), Some("3")).unwrap();
        match spec {
            ModelSpec::Pid(p) => {
                assert_eq!(p.x0, Some(vec![0.25]));
                assert_eq!(p.u0, Some(3.0));
            }
            other => panic!("unexpected {other:?}"),
        }

        let spec = state_space(StateSpaceArgs {
            b: Some("[[1],[0]]"),
            ..StateSpaceArgs::default()
        })
        .unwrap();
        let spec = with_start_values(spec, None, Some("[5]")).unwrap();
        let model = spec.realize().unwrap();
        assert_eq!(model.u0().to_vec(), vec![5.0]);
    }

    #[test]
    fn model_files() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("plant.toml");
        std::fs::write(&toml_path, "kind = \"tf\"\nnum = [1.0]\nden = [1.0, 10.0]\n").unwrap();
        assert_eq!(
            load_model_file(&toml_path).unwrap(),
            transfer_function("[1]", "[1, 10]").unwrap()
        );

        let json_path = dir.path().join("ctl.json");
        std::fs::write(&json_path, r#"{"kind": "pid", "kp": 2.0, "ki": 0.5}"#).unwrap();
        assert_eq!(
            load_model_file(&json_path).unwrap(),
            pid(2.0, 0.5, 0.0, 0.0)
        );

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "kind = \"nope\"\n").unwrap();
        assert!(load_model_file(&bad).is_err());
    }
}
