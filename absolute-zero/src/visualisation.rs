use crate::cooling::{CoolingCurve, LAB_RECORD_KELVIN};
use crate::extremum::Extremum;
use crate::interference::InterferenceFrame;
use ndarray::{Array1, Array2};
use plotters::prelude::*;
use std::error::Error;
use std::path::{Path, PathBuf};

type RenderResult<T> = Result<T, Box<dyn Error>>;

/// How a 2-D field is mapped onto colours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColourScale {
    /// log10 of the value, with everything below `floor` drawn as `floor`.
    Log { floor: f64 },
    /// Linear between the field's min and max.
    Linear,
    /// Linear and symmetric about zero, for signed fields.
    Diverging,
}

pub struct FieldVisualiser {
    output_dir: PathBuf,
    width: u32,
    height: u32,
}

impl FieldVisualiser {
    pub fn new(output_dir: impl AsRef<Path>, width: u32, height: u32) -> RenderResult<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self {
            output_dir,
            width,
            height,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Heat map of a `[nt, nx]` field over position (horizontal) and time
    /// (vertical), optionally marking one located point.
    pub fn plot_field(
        &self,
        data: &Array2<f64>,
        positions: &Array1<f64>,
        times: &Array1<f64>,
        name: &str,
        scale: ColourScale,
        marker: Option<&Extremum>,
    ) -> RenderResult<PathBuf> {
        let filename = self.output_dir.join(format!("{}.png", name));
        // The backend borrows `filename` until the drawing area is dropped.
        {
            let root = BitMapBackend::new(&filename, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE)?;

            let x_edges = cell_edges(positions);
            let t_edges = cell_edges(times);
            let x_range = x_edges[0]..x_edges[x_edges.len() - 1];
            let t_range = t_edges[0]..t_edges[t_edges.len() - 1];

            let caption = match scale {
                ColourScale::Log { .. } => format!("{} (log10)", name),
                _ => name.to_string(),
            };
            let mut chart = ChartBuilder::on(&root)
                .caption(&caption, ("sans-serif", 30))
                .margin(10)
                .x_label_area_size(40)
                .y_label_area_size(50)
                .build_cartesian_2d(x_range, t_range)?;

            chart
                .configure_mesh()
                .disable_mesh()
                .x_desc("Position (x)")
                .y_desc("Time (t)")
                .draw()?;

            let mapper = ColourMapper::new(data, scale);
            let (nt, nx) = data.dim();
            let (x_edges, t_edges, mapper) = (&x_edges, &t_edges, &mapper);
            chart.draw_series((0..nt).flat_map(move |j| {
                (0..nx).map(move |i| {
                    Rectangle::new(
                        [(x_edges[i], t_edges[j]), (x_edges[i + 1], t_edges[j + 1])],
                        mapper.colour(data[[j, i]]).filled(),
                    )
                })
            }))?;

            if let Some(point) = marker {
                chart
                    .draw_series(std::iter::once(Circle::new(
                        (point.x, point.t),
                        8,
                        CYAN.stroke_width(3),
                    )))?
                    .label("minimum")
                    .legend(|(x, y)| Circle::new((x, y), 5, CYAN.filled()));
                chart
                    .configure_series_labels()
                    .background_style(WHITE.mix(0.8))
                    .border_style(BLACK)
                    .draw()?;
            }

            root.present()?;
        }
        tracing::info!(file = %filename.display(), "saved field plot");
        Ok(filename)
    }

    /// Temperature against time on a logarithmic axis, with the laboratory
    /// record drawn for reference.
    pub fn plot_cooling(&self, curve: &CoolingCurve, name: &str) -> RenderResult<PathBuf> {
        let filename = self.output_dir.join(format!("{}.png", name));
        {
            let root = BitMapBackend::new(&filename, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE)?;

            let t_min = curve.times.first().copied().unwrap_or(0.0);
            let t_max = curve.times.last().copied().unwrap_or(1.0).max(t_min + f64::EPSILON);
            let k_max = curve.temperature.iter().copied().fold(LAB_RECORD_KELVIN, f64::max);
            let k_min = curve
                .temperature
                .iter()
                .copied()
                .fold(LAB_RECORD_KELVIN, f64::min);

            let mut chart = ChartBuilder::on(&root)
                .caption(name, ("sans-serif", 30))
                .margin(10)
                .x_label_area_size(40)
                .y_label_area_size(80)
                .build_cartesian_2d(t_min..t_max, (k_min * 0.5..k_max * 2.0).log_scale())?;

            chart
                .configure_mesh()
                .x_desc("Time (arbitrary units)")
                .y_desc("Temperature (K)")
                .y_label_formatter(&|v| format!("{:.0e}", v))
                .draw()?;

            chart
                .draw_series(LineSeries::new(
                    curve
                        .times
                        .iter()
                        .zip(curve.temperature.iter())
                        .map(|(&t, &k)| (t, k)),
                    BLUE.stroke_width(2),
                ))?
                .label("temperature")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

            chart
                .draw_series(LineSeries::new(
                    vec![(t_min, LAB_RECORD_KELVIN), (t_max, LAB_RECORD_KELVIN)],
                    RED.stroke_width(2),
                ))?
                .label("laboratory record")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;

            root.present()?;
        }
        tracing::info!(file = %filename.display(), "saved cooling plot");
        Ok(filename)
    }

    /// One numbered frame of the interference sequence.
    pub fn plot_interference(
        &self,
        frame: &InterferenceFrame,
        positions: &Array1<f64>,
        amplitude: f64,
        index: usize,
    ) -> RenderResult<PathBuf> {
        let filename = self
            .output_dir
            .join(format!("interference_{:06}.png", index));
        {
            let root = BitMapBackend::new(&filename, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE)?;

            let x_min = positions.first().copied().unwrap_or(0.0);
            let x_max = positions.last().copied().unwrap_or(1.0).max(x_min + f64::EPSILON);
            let y_lim = (2.0 * amplitude.abs()).max(f64::EPSILON) * 1.05;

            let title = format!("Coherent interference at t={:.4}", frame.time);
            let mut chart = ChartBuilder::on(&root)
                .caption(&title, ("sans-serif", 30))
                .margin(10)
                .x_label_area_size(40)
                .y_label_area_size(50)
                .build_cartesian_2d(x_min..x_max, -y_lim..y_lim)?;

            chart
                .configure_mesh()
                .x_desc("Position (x)")
                .y_desc("Amplitude")
                .draw()?;

            let series = [
                (&frame.forward, BLUE, 2, "forward wave"),
                (&frame.backward, RGBColor(255, 165, 0), 2, "backward wave"),
                (&frame.superposition, BLACK, 3, "superposition"),
            ];
            for (values, colour, width, label) in series {
                chart
                    .draw_series(LineSeries::new(
                        positions.iter().zip(values.iter()).map(|(&x, &y)| (x, y)),
                        colour.stroke_width(width),
                    ))?
                    .label(label)
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], colour));
            }

            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;

            root.present()?;
        }
        tracing::debug!(file = %filename.display(), "saved frame");
        Ok(filename)
    }

    /// Equivalent temperature along one time row on a logarithmic axis,
    /// against the laboratory record. Zero-temperature samples are skipped.
    pub fn plot_profile(
        &self,
        positions: &Array1<f64>,
        kelvin: &Array1<f64>,
        time: f64,
        name: &str,
    ) -> RenderResult<PathBuf> {
        let filename = self.output_dir.join(format!("{}.png", name));
        {
            let root = BitMapBackend::new(&filename, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE)?;

            let x_min = positions.first().copied().unwrap_or(0.0);
            let x_max = positions.last().copied().unwrap_or(1.0).max(x_min + f64::EPSILON);
            let positive = || kelvin.iter().copied().filter(|&k| k > 0.0 && k.is_finite());
            let k_min = positive().fold(LAB_RECORD_KELVIN, f64::min);
            let k_max = positive().fold(LAB_RECORD_KELVIN, f64::max);

            let title = format!("Equivalent temperature at t={:.4}", time);
            let mut chart = ChartBuilder::on(&root)
                .caption(&title, ("sans-serif", 30))
                .margin(10)
                .x_label_area_size(40)
                .y_label_area_size(80)
                .build_cartesian_2d(x_min..x_max, (k_min * 0.5..k_max * 2.0).log_scale())?;

            chart
                .configure_mesh()
                .x_desc("Position (x)")
                .y_desc("Temperature (K)")
                .y_label_formatter(&|v| format!("{:.0e}", v))
                .draw()?;

            chart
                .draw_series(LineSeries::new(
                    positions
                        .iter()
                        .zip(kelvin.iter())
                        .filter(|&(_, &k)| k > 0.0 && k.is_finite())
                        .map(|(&x, &k)| (x, k)),
                    RGBColor(255, 140, 0).stroke_width(2),
                ))?
                .label("equivalent temperature")
                .legend(|(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], RGBColor(255, 140, 0))
                });

            chart
                .draw_series(LineSeries::new(
                    vec![(x_min, LAB_RECORD_KELVIN), (x_max, LAB_RECORD_KELVIN)],
                    RED.stroke_width(2),
                ))?
                .label("laboratory record")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;

            root.present()?;
        }
        tracing::info!(file = %filename.display(), "saved temperature profile");
        Ok(filename)
    }
}

struct ColourMapper {
    gradient: Box<dyn colorgrad::Gradient>,
    scale: ColourScale,
    min_val: f64,
    max_val: f64,
}

impl ColourMapper {
    fn new(data: &Array2<f64>, scale: ColourScale) -> Self {
        let gradient: Box<dyn colorgrad::Gradient> = match scale {
            ColourScale::Diverging => Box::new(colorgrad::preset::rd_yl_bu()),
            _ => Box::new(colorgrad::preset::inferno()),
        };

        let finite = || data.iter().copied().filter(|v| v.is_finite());
        let (min_val, max_val) = match scale {
            ColourScale::Log { floor } => (floor.log10(), finite().fold(floor, f64::max).log10()),
            ColourScale::Linear => (
                finite().fold(f64::INFINITY, f64::min),
                finite().fold(f64::NEG_INFINITY, f64::max),
            ),
            ColourScale::Diverging => {
                let max_abs = finite().map(f64::abs).fold(0.0_f64, f64::max);
                (-max_abs, max_abs)
            }
        };

        Self {
            gradient,
            scale,
            min_val,
            max_val,
        }
    }

    fn colour(&self, value: f64) -> RGBColor {
        let value = match self.scale {
            ColourScale::Log { floor } => value.max(floor).log10(),
            _ => value,
        };
        let normalized = normalise(value, self.min_val, self.max_val);
        let rgba = self.gradient.at(normalized as f32).to_rgba8();
        RGBColor(rgba[0], rgba[1], rgba[2])
    }
}

fn normalise(value: f64, min_val: f64, max_val: f64) -> f64 {
    let normalized = if max_val > min_val {
        (value - min_val) / (max_val - min_val)
    } else {
        0.5
    };
    if normalized.is_nan() {
        0.0
    } else {
        normalized.clamp(0.0, 1.0)
    }
}

/// Boundaries of the cells centred on each sample; a lone sample gets a
/// unit-wide cell.
fn cell_edges(samples: &Array1<f64>) -> Vec<f64> {
    let n = samples.len();
    if n == 0 {
        return vec![0.0, 1.0];
    }
    if n == 1 {
        return vec![samples[0] - 0.5, samples[0] + 0.5];
    }
    let mut edges = Vec::with_capacity(n + 1);
    edges.push(samples[0] - 0.5 * (samples[1] - samples[0]));
    for i in 0..n - 1 {
        edges.push(0.5 * (samples[i] + samples[i + 1]));
    }
    edges.push(samples[n - 1] + 0.5 * (samples[n - 1] - samples[n - 2]));
    edges
}
