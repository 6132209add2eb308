//! Derives the per-column and per-row coordinate values from the
//! requested bounds and pixel dimensions.  A one-pixel axis gets a
//! step of zero rather than a division fault, so the single sample
//! sits on the minimum bound.

/// Evenly spaced sample coordinates along one axis, endpoints
/// inclusive when there are at least two samples.
pub fn axis_coordinates(range: (f64, f64), samples: usize) -> Vec<f64> {
    let step = if samples > 1 {
        (range.1 - range.0) / (samples - 1) as f64
    } else {
        0.0
    };
    (0..samples).map(|i| range.0 + step * i as f64).collect()
}

/// The X and Y coordinate grids for a `width x height` image over the
/// given real and imaginary bounds.
pub fn coordinate_grid(
    x_range: (f64, f64),
    y_range: (f64, f64),
    dimensions: (usize, usize),
) -> (Vec<f64>, Vec<f64>) {
    (
        axis_coordinates(x_range, dimensions.0),
        axis_coordinates(y_range, dimensions.1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_inclusive() {
        let xs = axis_coordinates((-2.25, 0.75), 4);
        assert_eq!(xs.len(), 4);
        assert_eq!(xs[0], -2.25);
        assert_eq!(xs[3], 0.75);
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn single_sample_axis_does_not_fault() {
        let xs = axis_coordinates((-1.0, 1.0), 1);
        assert_eq!(xs, vec![-1.0]);
    }

    #[test]
    fn unit_interval_spacing() {
        let xs = axis_coordinates((-1.0, 1.0), 5);
        assert_eq!(xs, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn grid_matches_dimensions() {
        let (xs, ys) = coordinate_grid((-2.25, 0.75), (-1.25, 1.25), (640, 480));
        assert_eq!(xs.len(), 640);
        assert_eq!(ys.len(), 480);
    }
}
