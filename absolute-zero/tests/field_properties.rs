//! Property-based tests for the standing-wave energy field.
//!
//! Covers: grid shape and spacing, closed-form agreement, temporal
//! periodicity, and both extremum policies.

use absolute_zero::{
    argmin_row_major, build_grid, evaluate_energy, find_minimum, find_rest_point, FieldError,
    FieldParams, DEFAULT_EPSILON,
};
use approx::assert_relative_eq;
use ndarray::Array2;
use proptest::prelude::*;
use std::f64::consts::PI;

fn close(a: f64, b: f64, rel: f64) -> bool {
    (a - b).abs() <= rel * a.abs().max(b.abs()).max(1e-300) || (a - b).abs() < 1e-300
}

// ── Grid and field shape ─────────────────────────────────────────────

proptest! {
    /// Every field comes back [t_count, x_count] with non-negative energy.
    #[test]
    fn energy_shape_and_sign(
        nx in 1usize..60,
        nt in 1usize..60,
        x_min in -5.0f64..5.0,
        t_min in -5.0f64..5.0,
        width in 0.1f64..10.0,
        amplitude in -3.0f64..3.0,
        frequency in 0.05f64..10.0,
        wavelength in 0.05f64..10.0,
    ) {
        let grid = build_grid(x_min, x_min + width, nx, t_min, t_min + width, nt).unwrap();
        let params = FieldParams::new(amplitude, frequency, wavelength).unwrap();
        let field = evaluate_energy(&grid, &params);

        prop_assert_eq!(field.total.dim(), (nt, nx));
        prop_assert_eq!(field.displacement.dim(), (nt, nx));
        prop_assert_eq!(field.potential.dim(), (nt, nx));
        prop_assert_eq!(field.kinetic.dim(), (nt, nx));
        prop_assert!(field.total.iter().all(|&e| e >= 0.0));
    }

    /// Axes are strictly increasing and hit both bounds.
    #[test]
    fn grid_axes_monotone(n in 2usize..200, lo in -10.0f64..10.0, span in 0.01f64..20.0) {
        let grid = build_grid(lo, lo + span, n, lo, lo + span, n).unwrap();
        prop_assert_eq!(grid.positions[0], lo);
        prop_assert_eq!(grid.positions[n - 1], lo + span);
        for i in 1..n {
            prop_assert!(grid.positions[i] > grid.positions[i - 1]);
            prop_assert!(grid.times[i] > grid.times[i - 1]);
        }
    }

    /// Samples reconstructed straight from the closed form agree with the
    /// evaluator at randomly chosen grid points.
    #[test]
    fn closed_form_agreement(
        amplitude in 0.1f64..5.0,
        frequency in 0.1f64..5.0,
        wavelength in 0.1f64..5.0,
        picks in prop::collection::vec((0usize..97, 0usize..83), 100..140),
    ) {
        let grid = build_grid(0.0, 3.0, 97, 0.0, 2.5, 83).unwrap();
        let params = FieldParams::new(amplitude, frequency, wavelength).unwrap();
        let field = evaluate_energy(&grid, &params);

        let w = 2.0 * PI * frequency;
        let k = 2.0 * PI / wavelength;
        for (i, j) in picks {
            let x = grid.positions[i];
            let t = grid.times[j];
            let y = 2.0 * amplitude * (k * x).sin() * (w * t).cos();
            let dy_dx = 2.0 * amplitude * k * (k * x).cos() * (w * t).cos();
            let dy_dt = -2.0 * amplitude * w * (k * x).sin() * (w * t).sin();
            let total = 0.5 * dy_dx * dy_dx + 0.5 * dy_dt * dy_dt;

            prop_assert!(close(field.displacement[[j, i]], y, 1e-10));
            prop_assert!(close(field.slope[[j, i]], dy_dx, 1e-10));
            prop_assert!(close(field.velocity[[j, i]], dy_dt, 1e-10));
            prop_assert!(close(field.total[[j, i]], total, 1e-10));
        }
    }

    /// The tie-break picks the first occurrence in row-major order.
    #[test]
    fn tie_break_prefers_lowest_row_major_index(
        nt in 2usize..20,
        nx in 2usize..20,
        a in (0usize..400),
        b in (0usize..400),
    ) {
        let cells = nt * nx;
        let (a, b) = (a % cells, b % cells);
        prop_assume!(a != b);
        let mut data = Array2::<f64>::from_elem((nt, nx), 1.0);
        data[[a / nx, a % nx]] = -2.0;
        data[[b / nx, b % nx]] = -2.0;
        let first = a.min(b);
        prop_assert_eq!(argmin_row_major(&data), Some((first / nx, first % nx)));
    }
}

// ── Periodicity ──────────────────────────────────────────────────────

#[test]
fn energy_repeats_after_one_period() {
    let params = FieldParams::new(1.0, 1.0, 1.0).unwrap();
    // Times t and t + 1/f share a grid: 0..2 with 201 samples puts them 100 apart.
    let grid = build_grid(0.0, 1.0, 11, 0.0, 2.0, 201).unwrap();
    let field = evaluate_energy(&grid, &params);

    for &i in &[1usize, 3, 4, 7, 9] {
        for j in [5usize, 17, 40, 63, 99] {
            let now = field.total[[j, i]];
            let later = field.total[[j + 100, i]];
            assert_relative_eq!(now, later, epsilon = 1e-9, max_relative = 1e-9);
        }
    }
}

// ── Extremum policies ────────────────────────────────────────────────

#[test]
fn global_minimum_at_exact_node() {
    // sin(kx) = 0 at x = 0 and cos(ωt) = 0 at t = 1/(4f): both energy terms vanish.
    let params = FieldParams::new(1.0, 1.0, 1.0).unwrap();
    let grid = build_grid(0.0, 0.4, 5, 0.0, 0.25, 6).unwrap();
    let field = evaluate_energy(&grid, &params);

    let min = find_minimum(&field);
    assert_eq!((min.j, min.i), (5, 0));
    assert_eq!((min.x, min.t), (0.0, 0.25));
    assert!(min.energy < 1e-25, "energy {}", min.energy);
}

#[test]
fn threshold_policy_reports_not_found() {
    let params = FieldParams::new(1.0, 1.0, 1.0).unwrap();
    let grid = build_grid(0.0, 2.0, 500, 0.1, 0.2, 120).unwrap();
    let field = evaluate_energy(&grid, &params);

    assert_eq!(find_rest_point(&field, DEFAULT_EPSILON).unwrap(), None);
    // The global policy still answers on the same grid.
    let min = find_minimum(&field);
    assert!(min.t >= 0.1 && min.t <= 0.2);
}

#[test]
fn threshold_policy_finds_first_node() {
    let params = FieldParams::new(1.0, 1.0, 1.0).unwrap();
    let grid = build_grid(0.0, 2.0, 81, 0.0, 2.0, 81).unwrap();
    let field = evaluate_energy(&grid, &params);

    let rest = find_rest_point(&field, DEFAULT_EPSILON).unwrap().unwrap();
    assert_eq!((rest.x, rest.t), (0.0, 0.25));
    assert!(rest.energy < 1e-20);
}

#[test]
fn invalid_arguments_surface_immediately() {
    assert!(matches!(
        FieldParams::new(1.0, 0.0, 1.0),
        Err(FieldError::InvalidArgument { name: "frequency", .. })
    ));
    assert!(matches!(
        FieldParams::new(1.0, 1.0, -1.0),
        Err(FieldError::InvalidArgument { name: "wavelength", .. })
    ));
    assert!(matches!(
        build_grid(0.0, 0.0, 3, 0.0, 1.0, 3),
        Err(FieldError::InvalidArgument { name: "x_max", .. })
    ));
    assert!(build_grid(0.0, 0.0, 1, 0.0, 0.0, 1).is_ok());
}

#[test]
fn degenerate_axes_are_rejected_before_evaluation() {
    // Overflowing span would otherwise leave NaN/inf samples in the axis.
    assert!(matches!(
        build_grid(-1e308, 1e308, 5, 0.0, 1.0, 3),
        Err(FieldError::InvalidArgument { name: "x_max", .. })
    ));
    // Spacing below one ulp would otherwise repeat samples.
    assert!(matches!(
        build_grid(0.0, 1.0, 3, 1.0, 1.0 + 1e-15, 100),
        Err(FieldError::InvalidArgument { name: "t_count", .. })
    ));
}
