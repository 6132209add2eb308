//! Decodes the final smoothed-value buffer into a plain numeric
//! matrix for the rendering collaborator.

use std::sync::Arc;

use errors::FractalError;
use shm;
use task::SharedBuffers;

/// A row-major `height x width` matrix of smoothed escape values.
/// Interior points are exactly `0.0`.
pub type ImageMatrix = Vec<Vec<f64>>;

/// Consumes the buffer handle and decodes the `Q` buffer.
///
/// Fails if any worker still holds a reference to the buffers (the
/// join has not completed) or if any completion flag is unset (a
/// worker crashed or was never dispatched); a partially-computed
/// matrix is never returned.
pub fn data_to_image_matrix(buffers: SharedBuffers) -> Result<ImageMatrix, FractalError> {
    let SharedBuffers {
        c,
        z,
        n,
        q,
        flags,
        width,
        height,
    } = buffers;
    drop(c);
    drop(z);
    drop(n);

    let flags = Arc::try_unwrap(flags)
        .map_err(|shared| FractalError::BuffersInUse(Arc::strong_count(&shared) - 1))?;
    let values = flags.into_values();
    if let Some(task) = values.iter().position(|flag| *flag == 0) {
        return Err(FractalError::IncompleteWork(task));
    }

    let q = Arc::try_unwrap(q)
        .map_err(|shared| FractalError::BuffersInUse(Arc::strong_count(&shared) - 1))?;
    let matrix: ImageMatrix = q.into_rows().iter().map(|blob| shm::unpack_reals(blob)).collect();
    debug_assert_eq!(matrix.len(), height);
    debug_assert!(matrix.iter().all(|row| row.len() == width));
    Ok(matrix)
}
