// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Task descriptors and the double-execution guard.
//!
//! A task is a zero-argument unit of work bound to one exclusive row
//! range and the buffer views for it.  The caller dispatches each task
//! to its own worker and joins all of them before decoding.  Running a
//! task marks its completion flag and releases its buffer references,
//! so the decoder can later take sole ownership of the arena.

use std::ops::Range;
use std::sync::Arc;

use errors::FractalError;
use kernel;
use shm::{BlobList, FlagList, FlagSlot, RowRange};

/// The four per-row buffer views a task may touch.  All share the
/// task's row range.
pub struct TaskBuffers {
    /// Seed coordinates; rewritten unchanged.
    pub c: RowRange,
    /// Current iterates.
    pub z: RowRange,
    /// Raw iteration counts.
    pub n: RowRange,
    /// Smoothed escape values.
    pub q: RowRange,
}

impl TaskBuffers {
    /// The row interval all four views share.
    pub fn rows(&self) -> Range<usize> {
        self.c.rows()
    }
}

/// One unit of work over an exclusive row range.
pub struct FractalTask {
    id: usize,
    rows: Range<usize>,
    horizon: f64,
    iterations: usize,
    buffers: Option<TaskBuffers>,
    flag: Option<FlagSlot>,
}

impl FractalTask {
    pub(crate) fn new(
        id: usize,
        rows: Range<usize>,
        horizon: f64,
        iterations: usize,
        buffers: TaskBuffers,
        flag: FlagSlot,
    ) -> FractalTask {
        FractalTask {
            id,
            rows,
            horizon,
            iterations,
            buffers: Some(buffers),
            flag: Some(flag),
        }
    }

    /// The task id, which is also its completion-flag index.
    pub fn id(&self) -> usize {
        self.id
    }

    /// The row range this task owns.
    pub fn rows(&self) -> Range<usize> {
        self.rows.clone()
    }

    /// Runs the kernel over the task's rows, at most once.  A second
    /// invocation fails with [`FractalError::DoubleExecution`] and
    /// leaves all buffer state from the first run intact.
    pub fn run(&mut self) -> Result<(), FractalError> {
        let already_done = match self.flag {
            Some(ref flag) => flag.is_set(),
            None => true,
        };
        if already_done {
            return Err(FractalError::DoubleExecution(self.id));
        }
        {
            let buffers = match self.buffers {
                Some(ref buffers) => buffers,
                None => return Err(FractalError::DoubleExecution(self.id)),
            };
            kernel::row_set_calc(self.horizon, self.iterations, buffers)?;
        }
        if let Some(flag) = self.flag.take() {
            flag.mark();
        }
        // Release the arena references so decode can take ownership.
        self.buffers = None;
        debug!("task {} completed rows {}..{}", self.id, self.rows.start, self.rows.end);
        Ok(())
    }
}

/// The opaque handle over the allocated buffer set, returned alongside
/// the tasks and consumed by the decoder after the join.  Dropping it
/// (together with the finished tasks) is the single teardown point of
/// the arena.
pub struct SharedBuffers {
    pub(crate) c: Arc<BlobList>,
    pub(crate) z: Arc<BlobList>,
    pub(crate) n: Arc<BlobList>,
    pub(crate) q: Arc<BlobList>,
    pub(crate) flags: Arc<FlagList>,
    pub(crate) width: usize,
    pub(crate) height: usize,
}

impl SharedBuffers {
    /// Columns per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }
}
