use crate::cooling::{CoolingModel, CoolingParams, Rebound};
use crate::extremum::DEFAULT_EPSILON;
use crate::grid::{check_bounds, Grid};
use crate::wavefield::FieldParams;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Space-time grid configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub x_min: f64,
    pub x_max: f64,
    pub x_count: usize,
    pub t_min: f64,
    pub t_max: f64,
    pub t_count: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        // Two wavelengths by two periods of the unit wave
        Self {
            x_min: 0.0,
            x_max: 2.0,
            x_count: 500,
            t_min: 0.0,
            t_max: 2.0,
            t_count: 400,
        }
    }
}

impl GridConfig {
    fn validate(&self) -> Result<()> {
        check_bounds(
            self.x_min,
            self.x_max,
            self.x_count,
            self.t_min,
            self.t_max,
            self.t_count,
        )
        .context("Invalid [grid] section")
    }

    pub fn build(&self) -> Result<Grid> {
        Grid::new(
            self.x_min,
            self.x_max,
            self.x_count,
            self.t_min,
            self.t_max,
            self.t_count,
        )
        .context("Invalid [grid] section")
    }
}

/// Wave parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub amplitude: f64,
    pub frequency: f64,  // Hz
    pub wavelength: f64, // same length unit as the grid
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            amplitude: 1.0,
            frequency: 1.0,
            wavelength: 1.0,
        }
    }
}

impl FieldConfig {
    pub fn params(&self) -> Result<FieldParams> {
        FieldParams::new(self.amplitude, self.frequency, self.wavelength)
            .context("Invalid [field] section")
    }
}

/// Extremum search and field diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub epsilon: f64,
    pub skeleton_threshold: f64,
    pub reference_kelvin: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            skeleton_threshold: 0.05,
            reference_kelvin: crate::cooling::LAB_RECORD_KELVIN,
        }
    }
}

impl SearchConfig {
    fn validate(&self) -> Result<()> {
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(anyhow!("epsilon must be positive, got {}", self.epsilon));
        }
        if !(self.skeleton_threshold > 0.0 && self.skeleton_threshold <= 1.0) {
            return Err(anyhow!(
                "skeleton_threshold must be in (0, 1], got {}",
                self.skeleton_threshold
            ));
        }
        if !(self.reference_kelvin.is_finite() && self.reference_kelvin > 0.0) {
            return Err(anyhow!(
                "reference_kelvin must be positive, got {}",
                self.reference_kelvin
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CoolingKind {
    Exponential,
    Bounce,
    ActiveControl,
}

/// Cooling curve configuration. Unset values fall back to the preset of
/// the chosen model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoolingConfig {
    #[serde(default = "default_cooling_kind")]
    pub model: CoolingKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_energy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebound_amplitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebound_frequency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebound_damping: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_gain: Option<f64>,
    #[serde(default = "default_t_end")]
    pub t_end: f64,
    #[serde(default = "default_samples")]
    pub samples: usize,
}

fn default_cooling_kind() -> CoolingKind {
    CoolingKind::Bounce
}

fn default_t_end() -> f64 {
    10.0
}

fn default_samples() -> usize {
    1000
}

impl Default for CoolingConfig {
    fn default() -> Self {
        Self {
            model: default_cooling_kind(),
            initial_energy: None,
            rate: None,
            floor: None,
            rebound_amplitude: None,
            rebound_frequency: None,
            rebound_damping: None,
            control_gain: None,
            t_end: default_t_end(),
            samples: default_samples(),
        }
    }
}

impl CoolingConfig {
    fn validate(&self) -> Result<()> {
        if !(self.t_end.is_finite() && self.t_end > 0.0) {
            return Err(anyhow!("t_end must be positive, got {}", self.t_end));
        }
        if self.samples == 0 {
            return Err(anyhow!("samples must be at least 1"));
        }
        self.params(self.model)
            .validate()
            .context("Invalid [cooling] section")?;
        Ok(())
    }

    /// Preset for `kind` with any configured overrides applied.
    pub fn params(&self, kind: CoolingKind) -> CoolingParams {
        let mut params = match kind {
            CoolingKind::Exponential => CoolingParams::exponential(),
            CoolingKind::Bounce => CoolingParams::bounce(),
            CoolingKind::ActiveControl => CoolingParams::active_control(),
        };
        if let Some(e0) = self.initial_energy {
            params.initial_energy = e0;
        }
        if let Some(rate) = self.rate {
            params.rate = rate;
        }
        if let Some(floor) = self.floor {
            params.floor = floor;
        }

        let rebound = |base: Rebound| Rebound {
            amplitude: self.rebound_amplitude.unwrap_or(base.amplitude),
            frequency: self.rebound_frequency.unwrap_or(base.frequency),
            damping: self.rebound_damping.unwrap_or(base.damping),
        };
        params.model = match params.model {
            CoolingModel::Exponential => CoolingModel::Exponential,
            CoolingModel::Bounce(base) => CoolingModel::Bounce(rebound(base)),
            CoolingModel::ActiveControl { rebound: base, gain } => CoolingModel::ActiveControl {
                rebound: rebound(base),
                gain: self.control_gain.unwrap_or(gain),
            },
        };
        params
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FieldView {
    Total,
    Potential,
    Kinetic,
    Displacement,
    Normalized,
    EnergyRate,
    /// Rest region below `skeleton_threshold`, drawn as a 0/1 mask.
    Skeleton,
    /// Equivalent temperature along the mid-period time row.
    KelvinProfile,
}

impl FieldView {
    pub fn name(&self) -> &'static str {
        match self {
            FieldView::Total => "total",
            FieldView::Potential => "potential",
            FieldView::Kinetic => "kinetic",
            FieldView::Displacement => "displacement",
            FieldView::Normalized => "normalized",
            FieldView::EnergyRate => "energy_rate",
            FieldView::Skeleton => "skeleton",
            FieldView::KelvinProfile => "kelvin_profile",
        }
    }

    /// Energies span many decades; displacement is signed.
    pub fn log_scale(&self) -> bool {
        matches!(
            self,
            FieldView::Total | FieldView::Potential | FieldView::Kinetic | FieldView::Normalized
        )
    }
}

/// Visualization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizationConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_image_width")]
    pub image_width: u32,
    #[serde(default = "default_image_height")]
    pub image_height: u32,
    #[serde(default = "default_field")]
    pub field: FieldView,
    #[serde(default = "default_log_floor")]
    pub log_floor: f64,
    #[serde(default = "default_frames")]
    pub frames: usize,
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_image_width() -> u32 {
    1200
}

fn default_image_height() -> u32 {
    800
}

fn default_field() -> FieldView {
    FieldView::Total
}

fn default_log_floor() -> f64 {
    1e-6
}

fn default_frames() -> usize {
    40
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            image_width: default_image_width(),
            image_height: default_image_height(),
            field: default_field(),
            log_floor: default_log_floor(),
            frames: default_frames(),
        }
    }
}

impl VisualizationConfig {
    fn validate(&self) -> Result<()> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(anyhow!(
                "Image dimensions must be positive (width={}, height={})",
                self.image_width,
                self.image_height
            ));
        }
        if !(self.log_floor.is_finite() && self.log_floor > 0.0) {
            return Err(anyhow!("log_floor must be positive, got {}", self.log_floor));
        }
        if self.frames == 0 {
            return Err(anyhow!("frames must be at least 1"));
        }
        Ok(())
    }
}

/// Complete run configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub field: FieldConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub cooling: CoolingConfig,
    #[serde(default)]
    pub visualization: VisualizationConfig,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse TOML config")?;

        // Validate before returning
        config.validate()?;

        Ok(config)
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        self.field.params()?;
        self.search.validate()?;
        self.cooling.validate()?;
        self.visualization.validate()?;

        let cells = self.grid.x_count.saturating_mul(self.grid.t_count);
        if cells > 25_000_000 {
            tracing::warn!(cells, "grid is very large, evaluation may be slow");
        }

        Ok(())
    }

    /// Log configuration summary
    pub fn log_summary(&self) {
        tracing::info!(
            x = ?(self.grid.x_min, self.grid.x_max),
            nx = self.grid.x_count,
            t = ?(self.grid.t_min, self.grid.t_max),
            nt = self.grid.t_count,
            "grid"
        );
        tracing::info!(
            amplitude = self.field.amplitude,
            frequency = self.field.frequency,
            wavelength = self.field.wavelength,
            "field"
        );
        tracing::info!(
            epsilon = self.search.epsilon,
            skeleton_threshold = self.search.skeleton_threshold,
            reference_kelvin = self.search.reference_kelvin,
            "search"
        );
        tracing::info!(
            output_dir = %self.visualization.output_dir,
            field = self.visualization.field.name(),
            width = self.visualization.image_width,
            height = self.visualization.image_height,
            "visualization"
        );
    }
}
