// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The Mandelbrot variant: the one concrete implementor of the
//! [`Fractal`] contract.  Owns the default view of the set, the
//! escape horizon, and the wiring that turns a configuration into
//! buffers and tasks.

use num::Complex;

use errors::FractalError;
use fractal::Fractal;
use grid;
use partition;
use shm::{self, BlobList, FlagList, ShmContext};
use task::{FractalTask, SharedBuffers, TaskBuffers};

/// Default view on the real axis.
const X_BOUNDARY: (f64, f64) = (-2.25, 0.75);
/// Default view on the imaginary axis.
const Y_BOUNDARY: (f64, f64) = (-1.25, 1.25);
/// Default escape threshold, 0x1000000000.  Far beyond the classic
/// radius of 2 so the smoothing term keeps several bits of precision.
const HORIZON: f64 = 68_719_476_736.0;

/// Configuration for one Mandelbrot computation.  Mutable so a viewer
/// can re-zoom or change resolution; every mutation is followed by a
/// fresh `generate_tasks`.
pub struct Mandelbrot {
    x_range: (f64, f64),
    y_range: (f64, f64),
    dimensions: (usize, usize),
    iterations: usize,
    horizon: f64,
}

impl Mandelbrot {
    /// A spec over the default boundary with the given resolution and
    /// iteration budget.  Rejects non-positive dimensions or budget.
    pub fn new(
        image_width: usize,
        image_height: usize,
        iterations: usize,
    ) -> Result<Mandelbrot, FractalError> {
        let spec = Mandelbrot {
            x_range: X_BOUNDARY,
            y_range: Y_BOUNDARY,
            dimensions: (image_width, image_height),
            iterations,
            horizon: HORIZON,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// The escape threshold.
    pub fn horizon(&self) -> f64 {
        self.horizon
    }

    /// Replaces the escape threshold.
    pub fn set_horizon(&mut self, horizon: f64) {
        self.horizon = horizon;
    }

    fn validate(&self) -> Result<(), FractalError> {
        if self.dimensions.0 == 0 {
            return Err(FractalError::Configuration(
                "image width must be positive".to_string(),
            ));
        }
        if self.dimensions.1 == 0 {
            return Err(FractalError::Configuration(
                "image height must be positive".to_string(),
            ));
        }
        if self.iterations == 0 {
            return Err(FractalError::Configuration(
                "iteration budget must be positive".to_string(),
            ));
        }
        if self.horizon <= 0.0 {
            return Err(FractalError::Configuration(
                "horizon must be positive".to_string(),
            ));
        }
        if self.x_range.0 >= self.x_range.1 {
            return Err(FractalError::Configuration(format!(
                "x range {}..{} must satisfy min < max",
                self.x_range.0, self.x_range.1
            )));
        }
        if self.y_range.0 >= self.y_range.1 {
            return Err(FractalError::Configuration(format!(
                "y range {}..{} must satisfy min < max",
                self.y_range.0, self.y_range.1
            )));
        }
        Ok(())
    }
}

impl Fractal for Mandelbrot {
    fn x_range(&self) -> (f64, f64) {
        self.x_range
    }

    fn set_x_range(&mut self, range: (f64, f64)) {
        self.x_range = range;
    }

    fn y_range(&self) -> (f64, f64) {
        self.y_range
    }

    fn set_y_range(&mut self, range: (f64, f64)) {
        self.y_range = range;
    }

    fn dimensions(&self) -> (usize, usize) {
        self.dimensions
    }

    fn set_dimensions(&mut self, dimensions: (usize, usize)) {
        self.dimensions = dimensions;
    }

    fn iterations(&self) -> usize {
        self.iterations
    }

    fn set_iterations(&mut self, iterations: usize) {
        self.iterations = iterations;
    }

    fn generate_tasks(
        &self,
        shm: &ShmContext,
        num_tasks: usize,
    ) -> Result<(Vec<FractalTask>, SharedBuffers), FractalError> {
        self.validate()?;
        if num_tasks == 0 {
            return Err(FractalError::Configuration(
                "at least one task is required".to_string(),
            ));
        }

        let (width, height) = self.dimensions;
        let (xs, ys) = grid::coordinate_grid(self.x_range, self.y_range, self.dimensions);

        let seed_rows: Vec<Vec<u8>> = ys
            .iter()
            .map(|&imag| {
                let seeds: Vec<Complex<f64>> =
                    xs.iter().map(|&real| Complex::new(real, imag)).collect();
                shm::pack_complexes(&seeds)
            })
            .collect();
        let zero_complex = shm::pack_complexes(&vec![Complex::new(0.0, 0.0); width]);
        let zero_real = shm::pack_reals(&vec![0.0; width]);

        let c = shm.blob_list("C", width * shm::COMPLEX_WIDTH, seed_rows)?;
        let z = shm.blob_list("Z", width * shm::COMPLEX_WIDTH, vec![zero_complex; height])?;
        let n = shm.blob_list("N", width * shm::REAL_WIDTH, vec![zero_real.clone(); height])?;
        let q = shm.blob_list("Q", width * shm::REAL_WIDTH, vec![zero_real; height])?;
        let flags = shm.flag_list("D", num_tasks);

        let ranges = partition::row_ranges(height, num_tasks);
        let c_views = BlobList::partition(&c, &ranges)?;
        let z_views = BlobList::partition(&z, &ranges)?;
        let n_views = BlobList::partition(&n, &ranges)?;
        let q_views = BlobList::partition(&q, &ranges)?;
        let slots = FlagList::slots(&flags);

        info!(
            "generated {} task(s) over a {}x{} grid, {} iterations",
            num_tasks, width, height, self.iterations
        );

        let tasks: Vec<FractalTask> =
            izip!(ranges, c_views, z_views, n_views, q_views, slots)
                .enumerate()
                .map(|(id, (range, cv, zv, nv, qv, slot))| {
                    FractalTask::new(
                        id,
                        range,
                        self.horizon,
                        self.iterations,
                        TaskBuffers {
                            c: cv,
                            z: zv,
                            n: nv,
                            q: qv,
                        },
                        slot,
                    )
                })
                .collect();

        let handle = SharedBuffers {
            c,
            z,
            n,
            q,
            flags,
            width,
            height,
        };
        Ok((tasks, handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn run_all(tasks: &mut Vec<FractalTask>) {
        for task in tasks.iter_mut() {
            task.run().unwrap();
        }
    }

    #[test]
    fn construction_rejects_bad_config() {
        assert!(Mandelbrot::new(0, 10, 10).is_err());
        assert!(Mandelbrot::new(10, 0, 10).is_err());
        assert!(Mandelbrot::new(10, 10, 0).is_err());
        assert!(Mandelbrot::new(10, 10, 10).is_ok());
    }

    #[test]
    fn degenerate_bounds_rejected_before_tasks() {
        let mut spec = Mandelbrot::new(8, 8, 16).unwrap();
        spec.set_x_range((1.0, 1.0));
        let shm = ShmContext::new();
        assert!(spec.generate_tasks(&shm, 2).is_err());
    }

    #[test]
    fn zero_tasks_rejected() {
        let spec = Mandelbrot::new(8, 8, 16).unwrap();
        let shm = ShmContext::new();
        assert!(spec.generate_tasks(&shm, 0).is_err());
    }

    #[test]
    fn default_boundary_and_horizon() {
        let spec = Mandelbrot::new(8, 8, 16).unwrap();
        assert_eq!(spec.x_range(), (-2.25, 0.75));
        assert_eq!(spec.y_range(), (-1.25, 1.25));
        assert_eq!(spec.horizon(), 68_719_476_736.0);
    }

    #[test]
    fn end_to_end_two_tasks() {
        let mut spec = Mandelbrot::new(4, 2, 10).unwrap();
        spec.set_x_range((-1.0, 1.0));
        spec.set_y_range((-1.0, 1.0));
        spec.set_horizon((2.0_f64).powi(40));

        let shm = ShmContext::new();
        let (mut tasks, buffers) = spec.generate_tasks(&shm, 2).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].rows(), 0..1);
        assert_eq!(tasks[1].rows(), 1..2);

        run_all(&mut tasks);
        drop(tasks);
        let matrix = spec.data_to_image_matrix(buffers).unwrap();
        assert_eq!(matrix.len(), 2);
        assert!(matrix.iter().all(|row| row.len() == 4));
        assert!(matrix.iter().flat_map(|row| row.iter()).all(|v| v.is_finite()));

        // Seed (1, 1) diverges quickly; its smoothed value is a real
        // escape measurement, not the interior sentinel.
        let divergent = matrix[1][3];
        assert!(divergent > 0.0);
    }

    #[test]
    fn interior_point_sentinel() {
        // 3x3 grid over (-1,1)^2 puts the origin at the center pixel.
        // Its iterate never moves, so the raw count hits the budget
        // and both n and q collapse to the interior sentinel.
        let mut spec = Mandelbrot::new(3, 3, 10).unwrap();
        spec.set_x_range((-1.0, 1.0));
        spec.set_y_range((-1.0, 1.0));

        let shm = ShmContext::new();
        let (mut tasks, buffers) = spec.generate_tasks(&shm, 1).unwrap();
        run_all(&mut tasks);
        drop(tasks);

        let SharedBuffers { c, z, n, q, flags, .. } = buffers;
        drop(c);
        drop(z);
        drop(flags);
        let n_rows = Arc::try_unwrap(n).ok().unwrap().into_rows();
        let q_rows = Arc::try_unwrap(q).ok().unwrap().into_rows();
        let n_center = shm::unpack_reals(&n_rows[1])[1];
        let q_center = shm::unpack_reals(&q_rows[1])[1];
        assert_eq!(n_center, 0.0);
        assert_eq!(q_center, 0.0);
    }

    #[test]
    fn seed_buffer_survives_the_kernel() {
        let mut spec = Mandelbrot::new(4, 2, 8).unwrap();
        spec.set_x_range((-1.0, 1.0));
        spec.set_y_range((-1.0, 1.0));

        let shm = ShmContext::new();
        let (mut tasks, buffers) = spec.generate_tasks(&shm, 1).unwrap();
        run_all(&mut tasks);
        drop(tasks);

        let SharedBuffers { c, z, n, q, flags, .. } = buffers;
        drop(z);
        drop(n);
        drop(q);
        drop(flags);
        let c_rows = Arc::try_unwrap(c).ok().unwrap().into_rows();
        let seeds = shm::unpack_complexes(&c_rows[1]);
        assert_eq!(seeds[0], Complex::new(-1.0, 1.0));
        assert_eq!(seeds[3], Complex::new(1.0, 1.0));
    }

    #[test]
    fn double_execution_is_rejected() {
        let spec = Mandelbrot::new(4, 4, 8).unwrap();
        let shm = ShmContext::new();
        let (mut tasks, buffers) = spec.generate_tasks(&shm, 1).unwrap();

        tasks[0].run().unwrap();
        match tasks[0].run() {
            Err(FractalError::DoubleExecution(0)) => {}
            other => panic!("expected double-execution fault, got {:?}", other),
        }

        // The failed second call must not have disturbed anything.
        drop(tasks);
        let matrix = spec.data_to_image_matrix(buffers).unwrap();
        assert_eq!(matrix.len(), 4);
    }

    #[test]
    fn decode_refuses_incomplete_work() {
        let spec = Mandelbrot::new(4, 4, 8).unwrap();
        let shm = ShmContext::new();
        let (mut tasks, buffers) = spec.generate_tasks(&shm, 2).unwrap();
        tasks[0].run().unwrap();
        drop(tasks);
        match spec.data_to_image_matrix(buffers) {
            Err(FractalError::IncompleteWork(1)) => {}
            other => panic!("expected incomplete-work fault, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn decode_refuses_while_workers_hold_buffers() {
        let spec = Mandelbrot::new(4, 4, 8).unwrap();
        let shm = ShmContext::new();
        let (mut tasks, buffers) = spec.generate_tasks(&shm, 2).unwrap();
        tasks[0].run().unwrap();
        // Task 1 still holds its views.
        match spec.data_to_image_matrix(buffers) {
            Err(FractalError::BuffersInUse(_)) => {}
            other => panic!("expected buffers-in-use fault, got {:?}", other.map(|_| ())),
        }
        drop(tasks);
    }

    #[test]
    fn mutation_reconfigures_the_next_run() {
        let mut spec = Mandelbrot::new(4, 4, 8).unwrap();
        spec.set_dimensions((5, 3));
        spec.set_iterations(12);
        assert_eq!(spec.dimensions(), (5, 3));
        assert_eq!(spec.iterations(), 12);

        let shm = ShmContext::new();
        let (mut tasks, buffers) = spec.generate_tasks(&shm, 3).unwrap();
        run_all(&mut tasks);
        drop(tasks);
        let matrix = spec.data_to_image_matrix(buffers).unwrap();
        assert_eq!(matrix.len(), 3);
        assert!(matrix.iter().all(|row| row.len() == 5));
    }
}
