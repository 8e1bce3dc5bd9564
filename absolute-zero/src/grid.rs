use crate::error::{ensure_finite, FieldError, FieldResult};
use ndarray::{Array1, Array2};

/// Rectangular (position, time) sample lattice.
///
/// Two-dimensional arrays derived from a grid are laid out `[nt, nx]`:
/// the row is the time index, the column the position index.
#[derive(Debug, Clone)]
pub struct Grid {
    pub positions: Array1<f64>, // x samples [nx]
    pub times: Array1<f64>,     // t samples [nt]
    pub xx: Array2<f64>,        // meshgrid x [nt, nx]
    pub tt: Array2<f64>,        // meshgrid t [nt, nx]
}

impl Grid {
    pub fn new(
        x_min: f64,
        x_max: f64,
        x_count: usize,
        t_min: f64,
        t_max: f64,
        t_count: usize,
    ) -> FieldResult<Self> {
        let positions = axis("x", x_min, x_max, x_count)?;
        let times = axis("t", t_min, t_max, t_count)?;

        let (nt, nx) = (times.len(), positions.len());
        let mut xx = Array2::<f64>::zeros((nt, nx));
        let mut tt = Array2::<f64>::zeros((nt, nx));
        for j in 0..nt {
            for i in 0..nx {
                xx[[j, i]] = positions[i];
                tt[[j, i]] = times[j];
            }
        }

        Ok(Grid {
            positions,
            times,
            xx,
            tt,
        })
    }

    pub fn nx(&self) -> usize {
        self.positions.len()
    }

    pub fn nt(&self) -> usize {
        self.times.len()
    }

    /// Shape of every field evaluated on this grid.
    pub fn shape(&self) -> (usize, usize) {
        (self.nt(), self.nx())
    }

    pub fn x_coord(&self, i: usize) -> f64 {
        self.positions[i]
    }

    pub fn t_coord(&self, j: usize) -> f64 {
        self.times[j]
    }

    /// Time step between consecutive samples, 0 for a single-sample axis.
    pub fn dt(&self) -> f64 {
        spacing(&self.times)
    }

    pub fn dx(&self) -> f64 {
        spacing(&self.positions)
    }
}

/// Free-function form of [`Grid::new`].
pub fn build_grid(
    x_min: f64,
    x_max: f64,
    x_count: usize,
    t_min: f64,
    t_max: f64,
    t_count: usize,
) -> FieldResult<Grid> {
    Grid::new(x_min, x_max, x_count, t_min, t_max, t_count)
}

/// Evenly spaced samples over `[start, end]`, both endpoints included.
///
/// The last sample is pinned to `end` so callers can rely on the exact
/// bound (ndarray's `linspace` accumulates rounding into it).
pub fn linspace(start: f64, end: f64, count: usize) -> Array1<f64> {
    if count == 1 {
        return Array1::from_elem(1, start);
    }
    let last = (count - 1) as f64;
    Array1::from_shape_fn(count, |i| {
        if i + 1 == count {
            end
        } else {
            start + (end - start) * (i as f64 / last)
        }
    })
}

/// Validate grid bounds without allocating any samples.
pub fn check_bounds(
    x_min: f64,
    x_max: f64,
    x_count: usize,
    t_min: f64,
    t_max: f64,
    t_count: usize,
) -> FieldResult<()> {
    check_axis("x", x_min, x_max, x_count)?;
    check_axis("t", t_min, t_max, t_count)
}

fn axis(name: &'static str, min: f64, max: f64, count: usize) -> FieldResult<Array1<f64>> {
    check_axis(name, min, max, count)?;
    let samples = linspace(min, max, count);
    if samples.windows(2).into_iter().any(|w| w[1] <= w[0]) {
        return Err(FieldError::invalid(
            axis_names(name).2,
            format!("samples over [{}, {}] are not strictly increasing", min, max),
        ));
    }
    Ok(samples)
}

fn axis_names(name: &str) -> (&'static str, &'static str, &'static str) {
    match name {
        "x" => ("x_min", "x_max", "x_count"),
        _ => ("t_min", "t_max", "t_count"),
    }
}

fn check_axis(name: &'static str, min: f64, max: f64, count: usize) -> FieldResult<()> {
    let (min_name, max_name, count_name) = axis_names(name);
    ensure_finite(min_name, min)?;
    ensure_finite(max_name, max)?;
    if count == 0 {
        return Err(FieldError::invalid(count_name, "must be at least 1"));
    }
    if count > 1 && max <= min {
        return Err(FieldError::invalid(
            max_name,
            format!(
                "must exceed {} when {} > 1 ({} <= {})",
                min_name, count_name, max, min
            ),
        ));
    }
    if count > 1 {
        let span = max - min;
        if !span.is_finite() {
            return Err(FieldError::invalid(
                max_name,
                format!("range {} - {} overflows", max, min),
            ));
        }
        // Spacing must stay a few ulps wide at the larger bound.
        let step = span / (count - 1) as f64;
        let ulp = min.abs().max(max.abs()) * f64::EPSILON;
        if step <= 4.0 * ulp {
            return Err(FieldError::invalid(
                count_name,
                format!(
                    "spacing {:e} over [{}, {}] is below floating-point resolution",
                    step, min, max
                ),
            ));
        }
    }
    Ok(())
}

fn spacing(samples: &Array1<f64>) -> f64 {
    if samples.len() > 1 {
        samples[1] - samples[0]
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn endpoints_are_inclusive() {
        let grid = Grid::new(0.0, 2.0, 500, 0.0, 2.0, 400).unwrap();
        assert_eq!(grid.shape(), (400, 500));
        assert_eq!(grid.x_coord(0), 0.0);
        assert_eq!(grid.x_coord(499), 2.0);
        assert_eq!(grid.t_coord(399), 2.0);
        assert_relative_eq!(grid.dx(), 2.0 / 499.0, epsilon = 1e-15);
    }

    #[test]
    fn meshgrid_follows_time_major_layout() {
        let grid = Grid::new(0.0, 1.0, 3, 10.0, 12.0, 2).unwrap();
        assert_eq!(grid.xx.dim(), (2, 3));
        assert_eq!(grid.xx[[1, 2]], 1.0);
        assert_eq!(grid.tt[[1, 2]], 12.0);
        assert_eq!(grid.tt[[0, 2]], 10.0);
    }

    #[test]
    fn single_sample_axis_is_allowed() {
        let grid = Grid::new(0.5, 0.5, 1, 0.0, 1.0, 5).unwrap();
        assert_eq!(grid.nx(), 1);
        assert_eq!(grid.x_coord(0), 0.5);
        assert_eq!(grid.dx(), 0.0);
    }

    #[test]
    fn rejects_malformed_bounds() {
        assert!(Grid::new(1.0, 1.0, 2, 0.0, 1.0, 2).is_err());
        assert!(Grid::new(0.0, 1.0, 2, 1.0, 0.0, 2).is_err());
        assert!(Grid::new(0.0, 1.0, 0, 0.0, 1.0, 2).is_err());
        assert!(Grid::new(0.0, f64::INFINITY, 2, 0.0, 1.0, 2).is_err());
        match Grid::new(0.0, 1.0, 2, 0.0, 1.0, 0) {
            Err(FieldError::InvalidArgument { name, .. }) => assert_eq!(name, "t_count"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_overflowing_range() {
        match Grid::new(-1e308, 1e308, 5, 0.0, 1.0, 2) {
            Err(FieldError::InvalidArgument { name, .. }) => assert_eq!(name, "x_max"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(check_bounds(0.0, 1.0, 2, -f64::MAX, f64::MAX, 3).is_err());
    }

    #[test]
    fn rejects_spacing_below_resolution() {
        match Grid::new(1.0, 1.0 + 1e-15, 100, 0.0, 1.0, 2) {
            Err(FieldError::InvalidArgument { name, .. }) => assert_eq!(name, "x_count"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(check_bounds(0.0, 1.0, 2, 1e6, 1e6 + 1e-9, 10).is_err());
        // A narrow but resolvable axis is still fine.
        let grid = Grid::new(1.0, 1.0 + 1e-9, 100, 0.0, 1.0, 2).unwrap();
        for w in grid.positions.windows(2) {
            assert!(w[1] > w[0]);
        }
    }
}
