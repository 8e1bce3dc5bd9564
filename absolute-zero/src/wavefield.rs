use crate::error::{ensure_finite, ensure_positive, FieldResult};
use crate::grid::Grid;
use ndarray::{Array1, Array2, Axis, Zip};
use std::f64::consts::PI;

/// Amplitude, frequency and wavelength of the two coherent waves.
///
/// Only constructible through [`FieldParams::new`], so every value held
/// here has a positive frequency and wavelength.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldParams {
    amplitude: f64,
    frequency: f64,
    wavelength: f64,
}

impl FieldParams {
    pub fn new(amplitude: f64, frequency: f64, wavelength: f64) -> FieldResult<Self> {
        ensure_finite("amplitude", amplitude)?;
        ensure_positive("frequency", frequency)?;
        ensure_positive("wavelength", wavelength)?;
        Ok(Self {
            amplitude,
            frequency,
            wavelength,
        })
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn wavelength(&self) -> f64 {
        self.wavelength
    }

    /// ω = 2πf
    pub fn angular_frequency(&self) -> f64 {
        2.0 * PI * self.frequency
    }

    /// k = 2π/λ
    pub fn wavenumber(&self) -> f64 {
        2.0 * PI / self.wavelength
    }

    /// Temporal period 1/f.
    pub fn period(&self) -> f64 {
        1.0 / self.frequency
    }

    /// Propagation speed v = fλ.
    pub fn phase_velocity(&self) -> f64 {
        self.frequency * self.wavelength
    }
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            amplitude: 1.0,
            frequency: 1.0,
            wavelength: 1.0,
        }
    }
}

/// Standing-wave displacement, its analytic derivatives and the energy
/// densities derived from them. Every array is `[nt, nx]`.
#[derive(Debug, Clone)]
pub struct EnergyField {
    pub displacement: Array2<f64>, // Y
    pub slope: Array2<f64>,        // ∂Y/∂x
    pub velocity: Array2<f64>,     // ∂Y/∂t
    pub potential: Array2<f64>,
    pub kinetic: Array2<f64>,
    pub total: Array2<f64>,
    pub positions: Array1<f64>,
    pub times: Array1<f64>,
}

/// Evaluate the superposition of two counter-propagating waves on `grid`.
///
/// Y = 2A sin(kx) cos(ωt), with both derivatives taken in closed form.
/// Points are independent, so the evaluation runs in parallel.
pub fn evaluate_energy(grid: &Grid, params: &FieldParams) -> EnergyField {
    let shape = grid.shape();
    let two_a = 2.0 * params.amplitude();
    let k = params.wavenumber();
    let omega = params.angular_frequency();

    let mut displacement = Array2::<f64>::zeros(shape);
    let mut slope = Array2::<f64>::zeros(shape);
    let mut velocity = Array2::<f64>::zeros(shape);

    Zip::from(&mut displacement)
        .and(&mut slope)
        .and(&mut velocity)
        .and(&grid.xx)
        .and(&grid.tt)
        .par_for_each(|y, dy_dx, dy_dt, &x, &t| {
            let (sin_kx, cos_kx) = (k * x).sin_cos();
            let (sin_wt, cos_wt) = (omega * t).sin_cos();
            *y = two_a * sin_kx * cos_wt;
            *dy_dx = two_a * k * cos_kx * cos_wt;
            *dy_dt = -two_a * omega * sin_kx * sin_wt;
        });

    let potential = slope.mapv(|v| 0.5 * v * v);
    let kinetic = velocity.mapv(|v| 0.5 * v * v);
    let total = &potential + &kinetic;

    tracing::debug!(
        nt = shape.0,
        nx = shape.1,
        k,
        omega,
        "energy field evaluated"
    );

    EnergyField {
        displacement,
        slope,
        velocity,
        potential,
        kinetic,
        total,
        positions: grid.positions.clone(),
        times: grid.times.clone(),
    }
}

impl EnergyField {
    pub fn dim(&self) -> (usize, usize) {
        self.total.dim()
    }

    pub fn max_energy(&self) -> f64 {
        self.total.iter().copied().fold(0.0_f64, f64::max)
    }

    /// Total energy scaled to a peak of 1. An all-zero field stays zero.
    pub fn normalized(&self) -> Array2<f64> {
        normalize(&self.total)
    }

    /// |∂E_norm/∂t| normalised to a peak of 1.
    ///
    /// Central differences in the interior of the time axis, one-sided at
    /// its two ends.
    pub fn energy_rate(&self) -> Array2<f64> {
        let norm = self.normalized();
        let (nt, nx) = norm.dim();
        let mut rate = Array2::<f64>::zeros((nt, nx));
        if nt < 2 {
            return rate;
        }
        let dt = self.times[1] - self.times[0];

        for i in 0..nx {
            for j in 1..nt - 1 {
                rate[[j, i]] = (norm[[j + 1, i]] - norm[[j - 1, i]]) / (2.0 * dt);
            }
            rate[[0, i]] = (norm[[1, i]] - norm[[0, i]]) / dt;
            rate[[nt - 1, i]] = (norm[[nt - 1, i]] - norm[[nt - 2, i]]) / dt;
        }

        rate.mapv_inplace(f64::abs);
        normalize(&rate)
    }

    /// Rest region: points whose normalised energy lies below `threshold`.
    pub fn skeleton(&self, threshold: f64) -> Array2<bool> {
        self.normalized().mapv(|e| e < threshold)
    }

    /// Normalised energy rescaled so the smallest non-zero value sits at
    /// `reference_kelvin`. `None` when the field carries no energy.
    pub fn equivalent_temperature(&self, reference_kelvin: f64) -> Option<Array2<f64>> {
        let norm = self.normalized();
        let smallest = norm
            .iter()
            .copied()
            .filter(|&e| e > 0.0)
            .fold(f64::INFINITY, f64::min);
        if !smallest.is_finite() {
            return None;
        }
        let scale = reference_kelvin / smallest;
        Some(norm.mapv(|e| e * scale))
    }

    /// Energy along one time row, e.g. the mid-period profile.
    pub fn profile_at(&self, j: usize) -> Array1<f64> {
        self.total.index_axis(Axis(0), j).to_owned()
    }
}

fn normalize(data: &Array2<f64>) -> Array2<f64> {
    let peak = data.iter().copied().fold(0.0_f64, f64::max);
    if peak > 0.0 {
        data.mapv(|v| v / peak)
    } else {
        data.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_field(nx: usize, nt: usize) -> EnergyField {
        let grid = Grid::new(0.0, 2.0, nx, 0.0, 2.0, nt).unwrap();
        evaluate_energy(&grid, &FieldParams::default())
    }

    #[test]
    fn params_reject_non_positive_frequency_and_wavelength() {
        assert!(FieldParams::new(1.0, 0.0, 1.0).is_err());
        assert!(FieldParams::new(1.0, 1.0, -1.0).is_err());
        assert!(FieldParams::new(f64::NAN, 1.0, 1.0).is_err());
        let p = FieldParams::new(0.5, 2.0, 4.0).unwrap();
        assert_relative_eq!(p.angular_frequency(), 4.0 * PI);
        assert_relative_eq!(p.wavenumber(), PI / 2.0);
        assert_relative_eq!(p.phase_velocity(), 8.0);
        assert_relative_eq!(p.period(), 0.5);
    }

    #[test]
    fn energy_is_sum_of_components() {
        let field = unit_field(40, 30);
        assert_eq!(field.dim(), (30, 40));
        Zip::from(&field.total)
            .and(&field.potential)
            .and(&field.kinetic)
            .for_each(|&e, &p, &k| {
                assert!(e >= 0.0);
                assert_relative_eq!(e, p + k);
            });
    }

    #[test]
    fn origin_carries_pure_potential_energy() {
        // sin(0) = 0 kills the kinetic term, cos(0) = 1 leaves 2Ak.
        let field = unit_field(11, 11);
        let k = 2.0 * PI;
        assert_eq!(field.displacement[[0, 0]], 0.0);
        assert_eq!(field.kinetic[[0, 0]], 0.0);
        assert_relative_eq!(field.total[[0, 0]], 0.5 * (2.0 * k).powi(2), max_relative = 1e-12);
    }

    #[test]
    fn normalized_peak_is_one() {
        let field = unit_field(50, 50);
        let norm = field.normalized();
        let peak = norm.iter().copied().fold(0.0_f64, f64::max);
        assert_relative_eq!(peak, 1.0);
        assert!(norm.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn zero_amplitude_stays_zero() {
        let grid = Grid::new(0.0, 1.0, 8, 0.0, 1.0, 8).unwrap();
        let params = FieldParams::new(0.0, 1.0, 1.0).unwrap();
        let field = evaluate_energy(&grid, &params);
        assert!(field.normalized().iter().all(|&v| v == 0.0));
        assert!(field.energy_rate().iter().all(|&v| v == 0.0));
        assert!(field.equivalent_temperature(3.8e-11).is_none());
    }

    #[test]
    fn energy_rate_is_bounded_and_handles_single_time() {
        let field = unit_field(20, 40);
        let rate = field.energy_rate();
        assert_eq!(rate.dim(), (40, 20));
        let peak = rate.iter().copied().fold(0.0_f64, f64::max);
        assert_relative_eq!(peak, 1.0);

        let grid = Grid::new(0.0, 1.0, 5, 0.3, 0.3, 1).unwrap();
        let flat = evaluate_energy(&grid, &FieldParams::default());
        assert!(flat.energy_rate().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn skeleton_marks_low_energy_points() {
        let field = unit_field(100, 100);
        let mask = field.skeleton(0.05);
        let norm = field.normalized();
        let count = mask.iter().filter(|&&m| m).count();
        assert!(count > 0 && count < mask.len());
        Zip::from(&mask).and(&norm).for_each(|&m, &e| assert_eq!(m, e < 0.05));
    }

    #[test]
    fn equivalent_temperature_anchors_smallest_value() {
        let field = unit_field(30, 30);
        let kelvin = field.equivalent_temperature(3.8e-11).unwrap();
        let smallest = kelvin
            .iter()
            .copied()
            .filter(|&v| v > 0.0)
            .fold(f64::INFINITY, f64::min);
        assert_relative_eq!(smallest, 3.8e-11, max_relative = 1e-12);
    }

    #[test]
    fn profile_is_one_time_row() {
        let field = unit_field(16, 9);
        let row = field.profile_at(4);
        assert_eq!(row.len(), 16);
        assert_eq!(row[3], field.total[[4, 3]]);
    }
}
