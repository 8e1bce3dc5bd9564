use crate::config::{Config, CoolingKind, FieldView};
use crate::cooling::{simulate_cooling, CoolingCurve};
use crate::extremum::{find_minimum, find_rest_point, Extremum};
use crate::grid::{linspace, Grid};
use crate::interference::sample_frames;
use crate::visualisation::{ColourScale, FieldVisualiser};
use crate::wavefield::{evaluate_energy, EnergyField, FieldParams};
use anyhow::Result;
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use std::time::Instant;

/// What a standing-wave run located.
#[derive(Debug, Clone)]
pub struct FieldReport {
    pub shape: (usize, usize),
    pub minimum: Extremum,
    pub rest_point: Option<Extremum>,
    pub max_energy: f64,
    pub skeleton_points: usize,
    /// Equivalent temperature at the minimum, `None` for an energy-free field.
    pub minimum_kelvin: Option<f64>,
}

pub struct Simulation {
    pub grid: Grid,
    pub params: FieldParams,
    pub config: Config,
}

impl Simulation {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let grid = config.grid.build()?;
        let params = config.field.params()?;
        Ok(Self {
            grid,
            params,
            config,
        })
    }

    /// Evaluate the energy field and run both extremum policies.
    pub fn run_field(&self) -> Result<(EnergyField, FieldReport)> {
        let (nt, nx) = self.grid.shape();
        tracing::info!(
            nt,
            nx,
            period = self.params.period(),
            phase_velocity = self.params.phase_velocity(),
            "evaluating standing-wave energy field"
        );

        let started = Instant::now();
        let field = evaluate_energy(&self.grid, &self.params);
        tracing::debug!(elapsed = ?started.elapsed(), "field ready");

        let minimum = find_minimum(&field);
        let rest_point = find_rest_point(&field, self.config.search.epsilon)?;
        if rest_point.is_none() {
            tracing::warn!(
                epsilon = self.config.search.epsilon,
                "no exact rest point on this grid; refine the resolution or relax epsilon"
            );
        }

        let skeleton_points = field
            .skeleton(self.config.search.skeleton_threshold)
            .iter()
            .filter(|&&inside| inside)
            .count();
        let minimum_kelvin = field
            .equivalent_temperature(self.config.search.reference_kelvin)
            .map(|kelvin| kelvin[[minimum.j, minimum.i]]);

        let report = FieldReport {
            shape: (nt, nx),
            minimum,
            rest_point,
            max_energy: field.max_energy(),
            skeleton_points,
            minimum_kelvin,
        };
        Ok((field, report))
    }

    /// Run the field and save the configured view as a heat map.
    pub fn run_field_with_visualisation(&self) -> Result<FieldReport> {
        let (field, report) = self.run_field()?;
        let vis = &self.config.visualization;

        match FieldVisualiser::new(&vis.output_dir, vis.image_width, vis.image_height) {
            Ok(visualiser) => self.visualise_field(&visualiser, &field, &report),
            Err(e) => tracing::warn!("Failed to create output directory: {}", e),
        }
        Ok(report)
    }

    fn visualise_field(
        &self,
        visualiser: &FieldVisualiser,
        field: &EnergyField,
        report: &FieldReport,
    ) {
        let view = self.config.visualization.field;
        let data: Array2<f64> = match view {
            FieldView::Total => field.total.clone(),
            FieldView::Potential => field.potential.clone(),
            FieldView::Kinetic => field.kinetic.clone(),
            FieldView::Displacement => field.displacement.clone(),
            FieldView::Normalized => field.normalized(),
            FieldView::EnergyRate => field.energy_rate(),
            FieldView::Skeleton => field
                .skeleton(self.config.search.skeleton_threshold)
                .mapv(|inside| if inside { 1.0 } else { 0.0 }),
            FieldView::KelvinProfile => {
                self.visualise_profile(visualiser, field);
                return;
            }
        };
        let scale = match view {
            FieldView::Displacement => ColourScale::Diverging,
            v if v.log_scale() => ColourScale::Log {
                floor: self.config.visualization.log_floor,
            },
            _ => ColourScale::Linear,
        };

        if let Err(e) = visualiser.plot_field(
            &data,
            &field.positions,
            &field.times,
            view.name(),
            scale,
            Some(&report.minimum),
        ) {
            tracing::warn!("Failed to visualise: {}", e);
        }
    }

    fn visualise_profile(&self, visualiser: &FieldVisualiser, field: &EnergyField) {
        let Some(kelvin) = field.equivalent_temperature(self.config.search.reference_kelvin)
        else {
            tracing::warn!("field carries no energy; skipping temperature profile");
            return;
        };
        let j = mid_period_row(&field.times, self.params.period());
        let row = kelvin.row(j).to_owned();
        let name = FieldView::KelvinProfile.name();
        if let Err(e) = visualiser.plot_profile(&field.positions, &row, field.times[j], name) {
            tracing::warn!("Failed to visualise: {}", e);
        }
    }

    /// Sample a cooling curve for `kind` (the configured model when `None`).
    pub fn run_cooling(&self, kind: Option<CoolingKind>, render: bool) -> Result<CoolingCurve> {
        let cooling = &self.config.cooling;
        let kind = kind.unwrap_or(cooling.model);
        let params = cooling.params(kind);
        let times = linspace(0.0, cooling.t_end, cooling.samples);

        tracing::info!(
            model = params.model.name(),
            samples = cooling.samples,
            "simulating cooling"
        );
        let curve = simulate_cooling(&params, &times)?;

        if render {
            let vis = &self.config.visualization;
            let name = format!("cooling_{}", params.model.name());
            let rendered = FieldVisualiser::new(&vis.output_dir, vis.image_width, vis.image_height)
                .and_then(|visualiser| visualiser.plot_cooling(&curve, &name));
            if let Err(e) = rendered {
                tracing::warn!("Failed to visualise: {}", e);
            }
        }
        Ok(curve)
    }

    /// Render sampled interference frames; returns how many were written.
    pub fn run_interference(&self) -> Result<usize> {
        let vis = &self.config.visualization;
        let frames = sample_frames(
            &self.params,
            &self.grid.positions,
            &self.grid.times,
            vis.frames,
        );
        tracing::info!(frames = frames.len(), "rendering interference frames");

        let visualiser =
            match FieldVisualiser::new(&vis.output_dir, vis.image_width, vis.image_height) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!("Failed to create output directory: {}", e);
                    return Ok(0);
                }
            };

        // Frames are independent files, so render them in parallel
        let written = frames
            .par_iter()
            .enumerate()
            .filter(|&(index, frame)| {
                let amplitude = self.params.amplitude();
                match visualiser.plot_interference(frame, &self.grid.positions, amplitude, index) {
                    Ok(_) => true,
                    Err(e) => {
                        tracing::warn!(index, "Failed to visualise frame: {}", e);
                        false
                    }
                }
            })
            .count();
        tracing::info!(
            dir = %visualiser.output_dir().display(),
            "frames saved; assemble with ffmpeg -framerate 30 -pattern_type glob -i 'interference_*.png'"
        );
        Ok(written)
    }
}

/// Time row closest to half a period after the first sample.
fn mid_period_row(times: &Array1<f64>, period: f64) -> usize {
    let Some(&t0) = times.first() else {
        return 0;
    };
    let target = t0 + 0.5 * period;
    times
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |(best, gap), (j, &t)| {
            let d = (t - target).abs();
            if d < gap {
                (j, d)
            } else {
                (best, gap)
            }
        })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;

    fn small_config() -> Config {
        Config {
            grid: GridConfig {
                x_count: 81,
                t_count: 81,
                ..GridConfig::default()
            },
            ..Config::default()
        }
    }

    #[test]
    fn field_run_finds_node() {
        // 81 samples over [0, 2] hit x = 0 and t = 0.25 exactly.
        let sim = Simulation::new(small_config()).unwrap();
        let (field, report) = sim.run_field().unwrap();
        assert_eq!(report.shape, (81, 81));
        assert_eq!(field.dim(), (81, 81));
        assert!(report.minimum.energy < 1e-20);
        let rest = report.rest_point.unwrap();
        assert_eq!((rest.j, rest.i), (10, 0));
        assert!(report.skeleton_points > 0);
        assert!(report.max_energy > 0.0);

        // The node carries the smallest non-zero energy, so it sits exactly
        // at the reference temperature.
        let kelvin = report.minimum_kelvin.unwrap();
        approx::assert_relative_eq!(kelvin, 3.8e-11, max_relative = 1e-9);
    }

    #[test]
    fn skeleton_count_tracks_threshold() {
        let mut config = small_config();
        config.search.skeleton_threshold = 0.01;
        let narrow = Simulation::new(config.clone()).unwrap().run_field().unwrap().1;
        config.search.skeleton_threshold = 0.2;
        let wide = Simulation::new(config).unwrap().run_field().unwrap().1;
        assert!(narrow.skeleton_points < wide.skeleton_points);
    }

    #[test]
    fn mid_period_row_is_nearest_half_period() {
        let times = crate::grid::linspace(0.0, 2.0, 81);
        assert_eq!(mid_period_row(&times, 1.0), 20);
        assert_eq!(mid_period_row(&crate::grid::linspace(0.3, 0.3, 1), 1.0), 0);
    }

    #[test]
    fn cooling_run_uses_requested_model() {
        let sim = Simulation::new(Config::default()).unwrap();
        let curve = sim.run_cooling(Some(CoolingKind::Exponential), false).unwrap();
        assert_eq!(curve.times.len(), 1000);
        let expected = 1e-20 * (-10.0_f64).exp() / crate::cooling::BOLTZMANN;
        approx::assert_relative_eq!(curve.final_temperature().unwrap(), expected, max_relative = 1e-12);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = Config::default();
        config.field.wavelength = 0.0;
        assert!(Simulation::new(config).is_err());
    }
}
