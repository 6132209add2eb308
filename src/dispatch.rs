// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The fork-join driver: one scoped worker per task, join everything,
//! then decode.  No partial result is observable before the join, and
//! the join is the only synchronization barrier in the pipeline.

use crossbeam;

use errors::FractalError;
use fractal::Fractal;
use matrix::ImageMatrix;
use shm::ShmContext;

/// Runs the whole pipeline for `fractal`: allocate the buffers,
/// dispatch one worker per task, join all of them, decode.  A worker
/// that fails or panics surfaces as a hard error rather than a
/// partially-zeroed matrix.
pub fn compute<F: Fractal>(
    fractal: &F,
    shm: &ShmContext,
    num_tasks: usize,
) -> Result<ImageMatrix, FractalError> {
    let (tasks, buffers) = fractal.generate_tasks(shm, num_tasks)?;

    let outcome = crossbeam::scope(|spawner| {
        let handles: Vec<_> = tasks
            .into_iter()
            .map(|mut task| spawner.spawn(move |_| task.run()))
            .collect();
        handles
            .into_iter()
            .enumerate()
            .map(|(id, handle)| match handle.join() {
                Ok(result) => result,
                Err(_) => Err(FractalError::WorkerFailure(id)),
            })
            .collect::<Vec<Result<(), FractalError>>>()
    });

    let joined = match outcome {
        Ok(joined) => joined,
        // Unreachable while every handle above is joined, but a
        // detached panic must still be fatal.
        Err(_) => return Err(FractalError::WorkerFailure(num_tasks)),
    };
    for result in joined {
        result?;
    }

    debug!("all {} worker(s) joined, decoding", num_tasks);
    fractal.data_to_image_matrix(buffers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fractal::Fractal;
    use mandelbrot::Mandelbrot;

    #[test]
    fn computes_the_requested_shape() {
        let spec = Mandelbrot::new(32, 16, 25).unwrap();
        let shm = ShmContext::new();
        let matrix = compute(&spec, &shm, 4).unwrap();
        assert_eq!(matrix.len(), 16);
        assert!(matrix.iter().all(|row| row.len() == 32));
        assert!(matrix
            .iter()
            .flat_map(|row| row.iter())
            .all(|v| v.is_finite()));
    }

    #[test]
    fn task_count_does_not_change_the_result() {
        let spec = Mandelbrot::new(24, 18, 40).unwrap();
        let shm = ShmContext::new();
        let serial = compute(&spec, &shm, 1).unwrap();
        let parallel = compute(&spec, &shm, 5).unwrap();
        assert_eq!(serial, parallel);
    }

    #[test]
    fn degenerate_single_row_image() {
        let mut spec = Mandelbrot::new(8, 1, 16).unwrap();
        spec.set_y_range((-1.0, 1.0));
        let shm = ShmContext::new();
        let matrix = compute(&spec, &shm, 1).unwrap();
        assert_eq!(matrix.len(), 1);
        assert_eq!(matrix[0].len(), 8);
    }
}
