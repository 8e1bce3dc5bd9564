use crate::error::{ensure_positive, FieldResult};
use crate::wavefield::EnergyField;
use ndarray::Array2;
use std::fmt;

/// Default tolerance for the rest-point search.
pub const DEFAULT_EPSILON: f64 = 1e-5;

/// A single located grid point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extremum {
    pub j: usize, // time index (row)
    pub i: usize, // position index (column)
    pub x: f64,
    pub t: f64,
    pub energy: f64,
}

impl fmt::Display for Extremum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x = {:.6}  |  t = {:.6}  |  total energy ≈ {:.6e}",
            self.x, self.t, self.energy
        )
    }
}

/// Row-major argmin: the first occurrence of the smallest value, scanning
/// time rows outermost and positions innermost.
///
/// Returns `None` only for an empty array. NaN entries never win.
pub fn argmin_row_major(data: &Array2<f64>) -> Option<(usize, usize)> {
    let mut best: Option<((usize, usize), f64)> = None;
    for ((j, i), &value) in data.indexed_iter() {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if value >= current => {}
            _ => best = Some(((j, i), value)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Global-minimum policy: the point of smallest total energy.
pub fn find_minimum(field: &EnergyField) -> Extremum {
    // A grid always has at least one sample, so the scan finds something
    // unless every value is NaN; fall back to the origin sample then.
    let (j, i) = argmin_row_major(&field.total).unwrap_or((0, 0));
    extremum_at(field, j, i)
}

/// Threshold policy: the first point in row-major order where the
/// displacement and both derivatives are all below `epsilon` in magnitude.
///
/// `Ok(None)` means no point qualifies, which is expected on coarse grids.
pub fn find_rest_point(field: &EnergyField, epsilon: f64) -> FieldResult<Option<Extremum>> {
    ensure_positive("epsilon", epsilon)?;
    let found = field
        .displacement
        .indexed_iter()
        .find(|&((j, i), &y)| {
            y.abs() < epsilon
                && field.slope[[j, i]].abs() < epsilon
                && field.velocity[[j, i]].abs() < epsilon
        })
        .map(|((j, i), _)| extremum_at(field, j, i));
    Ok(found)
}

fn extremum_at(field: &EnergyField, j: usize, i: usize) -> Extremum {
    Extremum {
        j,
        i,
        x: field.positions[i],
        t: field.times[j],
        energy: field.total[[j, i]],
    }
}
