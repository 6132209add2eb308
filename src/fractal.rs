// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The capability contract every escape-time variant exposes.
//!
//! Mandelbrot is the only concrete variant today; a future family
//! (Julia sets, say) is another implementor selected by configuration,
//! not a subclass of anything.

use errors::FractalError;
use matrix::{self, ImageMatrix};
use shm::ShmContext;
use task::{FractalTask, SharedBuffers};

/// Coordinate bounds, dimensions, iteration budget, and the two
/// operations the outside world calls: task generation and matrix
/// decoding.  Every setter invalidates previously computed buffers;
/// mutate, then recompute.
pub trait Fractal {
    /// Bounds on the real axis, `(min, max)`.
    fn x_range(&self) -> (f64, f64);
    /// Replaces the real-axis bounds.
    fn set_x_range(&mut self, range: (f64, f64));
    /// Bounds on the imaginary axis, `(min, max)`.
    fn y_range(&self) -> (f64, f64);
    /// Replaces the imaginary-axis bounds.
    fn set_y_range(&mut self, range: (f64, f64));
    /// Image dimensions, `(width, height)` in pixels.
    fn dimensions(&self) -> (usize, usize);
    /// Replaces the image dimensions.
    fn set_dimensions(&mut self, dimensions: (usize, usize));
    /// The per-pixel iteration budget.
    fn iterations(&self) -> usize;
    /// Replaces the iteration budget.
    fn set_iterations(&mut self, iterations: usize);

    /// Allocates the shared row buffers and produces one task per
    /// partitioned row range.  The caller runs each task in its own
    /// worker and joins all of them before decoding.
    fn generate_tasks(
        &self,
        shm: &ShmContext,
        num_tasks: usize,
    ) -> Result<(Vec<FractalTask>, SharedBuffers), FractalError>;

    /// Decodes the smoothed-value buffer into the final matrix.  Only
    /// valid after every task has completed and released its buffers.
    fn data_to_image_matrix(&self, buffers: SharedBuffers) -> Result<ImageMatrix, FractalError> {
        matrix::data_to_image_matrix(buffers)
    }
}
