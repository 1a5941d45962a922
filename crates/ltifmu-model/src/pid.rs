//! PID controller realization.

use crate::error::{ModelError, Result};
use crate::model::LtiModel;
use crate::spec::{scalar_vector, vector, PidSpec};
use crate::transfer::from_polynomials;

/// Gains with magnitude at or below this are treated as absent.
pub const NEGLIGIBLE_GAIN: f64 = 1e-12;

/// Which of the proportional, integral and derivative terms are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainPresence {
    P,
    I,
    D,
    PI,
    PD,
    ID,
    PID,
}

impl GainPresence {
    /// Classify the gains once; fails when every gain is negligible.
    pub fn classify(kp: f64, ki: f64, kd: f64) -> Result<Self> {
        let active = |g: f64| g.abs() > NEGLIGIBLE_GAIN;
        match (active(kp), active(ki), active(kd)) {
            (true, false, false) => Ok(GainPresence::P),
            (false, true, false) => Ok(GainPresence::I),
            (false, false, true) => Ok(GainPresence::D),
            (true, true, false) => Ok(GainPresence::PI),
            (true, false, true) => Ok(GainPresence::PD),
            (false, true, true) => Ok(GainPresence::ID),
            (true, true, true) => Ok(GainPresence::PID),
            (false, false, false) => Err(ModelError::NoActiveGain),
        }
    }

    /// Whether the filtered derivative term is present.
    pub fn has_derivative(self) -> bool {
        matches!(
            self,
            GainPresence::D | GainPresence::PD | GainPresence::ID | GainPresence::PID
        )
    }

    /// Order of the minimal realization.
    pub fn state_count(self) -> usize {
        match self {
            GainPresence::P => 0,
            GainPresence::I | GainPresence::D | GainPresence::PI | GainPresence::PD => 1,
            GainPresence::ID | GainPresence::PID => 2,
        }
    }
}

/// Realize `kp + ki/s + kd s / (T s + 1)` using only the active terms over
/// their common denominator, so no uncontrollable or unobservable states
/// are introduced.
pub fn realize(spec: &PidSpec) -> Result<LtiModel> {
    for (what, value) in [("kp", spec.kp), ("ki", spec.ki), ("kd", spec.kd), ("T", spec.t)] {
        if !value.is_finite() {
            return Err(ModelError::NonFinite { what: what.into() });
        }
    }

    let presence = GainPresence::classify(spec.kp, spec.ki, spec.kd)?;
    let PidSpec { kp, ki, kd, t, .. } = *spec;
    if presence.has_derivative() && t <= 0.0 {
        return Err(ModelError::TimeConstant { value: t });
    }

    let (num, den): (Vec<f64>, Vec<f64>) = match presence {
        GainPresence::P => (vec![kp], vec![1.0]),
        GainPresence::I => (vec![ki], vec![1.0, 0.0]),
        GainPresence::D => (vec![kd, 0.0], vec![t, 1.0]),
        GainPresence::PI => (vec![kp, ki], vec![1.0, 0.0]),
        GainPresence::PD => (vec![kp * t + kd, kp], vec![t, 1.0]),
        GainPresence::ID => (vec![kd, ki * t, ki], vec![t, 1.0, 0.0]),
        GainPresence::PID => (vec![kp * t + kd, kp + ki * t, ki], vec![t, 1.0, 0.0]),
    };
    tracing::debug!(?presence, ?num, ?den, "combined PID terms");

    from_polynomials(&num, &den, vector(&spec.x0), scalar_vector(spec.u0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn pid(kp: f64, ki: f64, kd: f64, t: f64) -> Result<LtiModel> {
        realize(&PidSpec {
            kp,
            ki,
            kd,
            t,
            ..PidSpec::default()
        })
    }

    #[test]
    fn state_counts_match_active_terms() {
        let cases = [
            ((1.0, 0.0, 0.0, 0.0), 0),
            ((0.0, 1.0, 0.0, 0.0), 1),
            ((0.0, 0.0, 1.0, 0.5), 1),
            ((2.0, 3.0, 0.0, 0.0), 1),
            ((2.0, 0.0, 3.0, 0.5), 1),
            ((0.0, 1.0, 1.0, 1.0), 2),
            ((1.0, 1.0, 1.0, 1.0), 2),
        ];
        for ((kp, ki, kd, t), nx) in cases {
            let m = pid(kp, ki, kd, t).unwrap();
            assert_eq!(m.nx(), nx, "kp={kp} ki={ki} kd={kd}");
            assert_eq!((m.nu(), m.ny()), (1, 1));
            let presence = GainPresence::classify(kp, ki, kd).unwrap();
            assert_eq!(presence.state_count(), nx);
        }
    }

    #[test]
    fn proportional_only_is_pure_feedthrough() {
        let m = pid(4.0, 0.0, 0.0, 0.0).unwrap();
        assert_eq!(m.d(), &array![[4.0]]);
        assert_eq!(m.c().dim(), (1, 0));
    }

    #[test]
    fn integral_only() {
        let m = pid(0.0, 2.0, 0.0, 0.0).unwrap();
        assert_eq!(m.a(), &array![[0.0]]);
        assert_eq!(m.c(), &array![[2.0]]);
        assert_eq!(m.d(), &array![[0.0]]);
    }

    #[test]
    fn filtered_derivative() {
        // kd s / (T s + 1) = kd/T - (kd/T^2) / (s + 1/T)
        let m = pid(0.0, 0.0, 2.0, 0.5).unwrap();
        assert_relative_eq!(m.a()[[0, 0]], -2.0);
        assert_relative_eq!(m.c()[[0, 0]], -8.0);
        assert_relative_eq!(m.d()[[0, 0]], 4.0);
    }

    #[test]
    fn proportional_derivative_uses_kp_in_constant_term() {
        // kp + kd s / (T s + 1) = ((kp T + kd) s + kp) / (T s + 1)
        let m = pid(1.0, 0.0, 1.0, 1.0).unwrap();
        assert_relative_eq!(m.a()[[0, 0]], -1.0);
        assert_relative_eq!(m.d()[[0, 0]], 2.0);
        assert_relative_eq!(m.c()[[0, 0]], 1.0 - 2.0);
    }

    #[test]
    fn derivative_requires_positive_time_constant() {
        assert_eq!(
            pid(0.0, 0.0, 1.0, 0.0).unwrap_err(),
            ModelError::TimeConstant { value: 0.0 }
        );
        assert_eq!(
            pid(1.0, 1.0, 1.0, -1.0).unwrap_err(),
            ModelError::TimeConstant { value: -1.0 }
        );
    }

    #[test]
    fn all_zero_gains() {
        assert_eq!(pid(0.0, 0.0, 0.0, 1.0).unwrap_err(), ModelError::NoActiveGain);
    }

    #[test]
    fn x0_length_follows_realized_order() {
        let err = realize(&PidSpec {
            kp: 1.0,
            ki: 1.0,
            kd: 1.0,
            t: 1.0,
            x0: Some(vec![1.0]),
            u0: None,
        })
        .unwrap_err();
        assert_eq!(err, ModelError::shape("x0 length", 2, 1));

        let ok = realize(&PidSpec {
            kp: 1.0,
            ki: 1.0,
            kd: 1.0,
            t: 1.0,
            x0: Some(vec![2.0, 2.0]),
            u0: Some(8.0),
        })
        .unwrap();
        assert_eq!(ok.u0(), &array![8.0]);
    }
}
