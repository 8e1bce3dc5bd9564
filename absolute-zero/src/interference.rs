use crate::wavefield::FieldParams;
use ndarray::Array1;

/// Two identical waves travelling in opposite directions and their sum at
/// one instant.
#[derive(Debug, Clone)]
pub struct InterferenceFrame {
    pub time: f64,
    pub forward: Array1<f64>,       // A sin(kx - ωt)
    pub backward: Array1<f64>,      // A sin(kx + ωt)
    pub superposition: Array1<f64>, // forward + backward
}

pub fn interference_frame(
    params: &FieldParams,
    positions: &Array1<f64>,
    time: f64,
) -> InterferenceFrame {
    let a = params.amplitude();
    let k = params.wavenumber();
    let wt = params.angular_frequency() * time;

    let forward = positions.mapv(|x| a * (k * x - wt).sin());
    let backward = positions.mapv(|x| a * (k * x + wt).sin());
    let superposition = &forward + &backward;

    InterferenceFrame {
        time,
        forward,
        backward,
        superposition,
    }
}

/// `count` frames spread evenly over `times` (first and last included).
pub fn sample_frames(
    params: &FieldParams,
    positions: &Array1<f64>,
    times: &Array1<f64>,
    count: usize,
) -> Vec<InterferenceFrame> {
    frame_indices(times.len(), count)
        .into_iter()
        .map(|j| interference_frame(params, positions, times[j]))
        .collect()
}

/// Evenly spread, de-duplicated indices into an axis of length `len`.
pub fn frame_indices(len: usize, count: usize) -> Vec<usize> {
    if len == 0 || count == 0 {
        return Vec::new();
    }
    if count == 1 || len == 1 {
        return vec![0];
    }
    let last = (len - 1) as f64;
    let steps = (count - 1) as f64;
    let mut indices: Vec<usize> = (0..count)
        .map(|n| (n as f64 * last / steps).round() as usize)
        .collect();
    indices.dedup();
    indices
}
