//! Cooling curves toward absolute zero.
//!
//! Three variants of the same exponential decay: plain, with a damped
//! thermal rebound riding on top of it, and with an active controller
//! draining the positive half of that rebound. Every curve is clamped at a
//! zero-point energy floor, so 0 K is approached but never reached.

use crate::error::{ensure_finite, ensure_positive, FieldError, FieldResult};
use ndarray::{Array1, Zip};

/// Boltzmann constant (J/K).
pub const BOLTZMANN: f64 = 1.380649e-23;

/// Lowest temperature reached in a laboratory (K), used as a reference
/// line when comparing the field model against physical scale.
pub const LAB_RECORD_KELVIN: f64 = 3.8e-11;

/// Damped oscillation superimposed on the decay: β sin(ωt) e^(-γt).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rebound {
    pub amplitude: f64, // β
    pub frequency: f64, // ω
    pub damping: f64,   // γ
}

impl Rebound {
    pub fn at(&self, t: f64) -> f64 {
        self.amplitude * (self.frequency * t).sin() * (-self.damping * t).exp()
    }
}

impl Default for Rebound {
    fn default() -> Self {
        Self {
            amplitude: 0.3,
            frequency: 4.0,
            damping: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoolingModel {
    /// E0 e^(-αt)
    Exponential,
    /// E0 e^(-αt) (1 + r(t))
    Bounce(Rebound),
    /// E0 e^(-αt) (1 + r(t) - K max(r(t), 0))
    ActiveControl { rebound: Rebound, gain: f64 },
}

impl CoolingModel {
    pub fn name(&self) -> &'static str {
        match self {
            CoolingModel::Exponential => "exponential",
            CoolingModel::Bounce(_) => "bounce",
            CoolingModel::ActiveControl { .. } => "active_control",
        }
    }

    /// Multiplicative modulation applied to the base decay at time `t`.
    fn modulation(&self, t: f64) -> f64 {
        match self {
            CoolingModel::Exponential => 1.0,
            CoolingModel::Bounce(rebound) => 1.0 + rebound.at(t),
            CoolingModel::ActiveControl { rebound, gain } => {
                let r = rebound.at(t);
                1.0 + r - gain * r.max(0.0)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoolingParams {
    pub initial_energy: f64, // E0 (J)
    pub rate: f64,           // α
    pub floor: f64,          // zero-point energy (J)
    pub model: CoolingModel,
}

impl CoolingParams {
    /// Plain exponential dissipation, α = 1, floor 1e-30 J.
    pub fn exponential() -> Self {
        Self {
            initial_energy: 1e-20,
            rate: 1.0,
            floor: 1e-30,
            model: CoolingModel::Exponential,
        }
    }

    /// Slower decay (α = 0.4) with a thermal rebound, floor 1e-30 J.
    pub fn bounce() -> Self {
        Self {
            initial_energy: 1e-20,
            rate: 0.4,
            floor: 1e-30,
            model: CoolingModel::Bounce(Rebound::default()),
        }
    }

    /// Rebound drained by a controller with gain 0.6, floor 1e-32 J.
    pub fn active_control() -> Self {
        Self {
            initial_energy: 1e-20,
            rate: 0.4,
            floor: 1e-32,
            model: CoolingModel::ActiveControl {
                rebound: Rebound::default(),
                gain: 0.6,
            },
        }
    }

    pub fn validate(&self) -> FieldResult<()> {
        ensure_positive("initial_energy", self.initial_energy)?;
        ensure_positive("floor", self.floor)?;
        ensure_finite("rate", self.rate)?;
        if self.rate < 0.0 {
            return Err(FieldError::invalid(
                "rate",
                format!("must be non-negative, got {}", self.rate),
            ));
        }
        let rebound = match self.model {
            CoolingModel::Exponential => return Ok(()),
            CoolingModel::Bounce(rebound) => rebound,
            CoolingModel::ActiveControl { rebound, gain } => {
                ensure_finite("control_gain", gain)?;
                if !(0.0..=1.0).contains(&gain) {
                    return Err(FieldError::invalid(
                        "control_gain",
                        format!("must be in [0, 1], got {}", gain),
                    ));
                }
                rebound
            }
        };
        ensure_finite("rebound_amplitude", rebound.amplitude)?;
        ensure_finite("rebound_frequency", rebound.frequency)?;
        ensure_finite("rebound_damping", rebound.damping)?;
        if rebound.damping < 0.0 {
            return Err(FieldError::invalid(
                "rebound_damping",
                format!("must be non-negative, got {}", rebound.damping),
            ));
        }
        Ok(())
    }

    /// Energy at time `t`, clamped at the floor.
    pub fn energy_at(&self, t: f64) -> f64 {
        let base = self.initial_energy * (-self.rate * t).exp();
        (base * self.model.modulation(t)).max(self.floor)
    }
}

#[derive(Debug, Clone)]
pub struct CoolingCurve {
    pub times: Array1<f64>,
    pub energy: Array1<f64>,      // J
    pub temperature: Array1<f64>, // K
}

impl CoolingCurve {
    pub fn final_temperature(&self) -> Option<f64> {
        self.temperature.last().copied()
    }

    pub fn min_temperature(&self) -> Option<f64> {
        self.temperature.iter().copied().reduce(f64::min)
    }
}

/// Sample a cooling model over `times`.
pub fn simulate_cooling(params: &CoolingParams, times: &Array1<f64>) -> FieldResult<CoolingCurve> {
    params.validate()?;

    let energy = times.mapv(|t| params.energy_at(t));
    let mut temperature = Array1::<f64>::zeros(times.len());
    Zip::from(&mut temperature)
        .and(&energy)
        .for_each(|kelvin, &e| *kelvin = e / BOLTZMANN);

    tracing::debug!(
        model = params.model.name(),
        samples = times.len(),
        "cooling curve simulated"
    );

    Ok(CoolingCurve {
        times: times.clone(),
        energy,
        temperature,
    })
}
