// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Everything that can go wrong between configuration and decode.
//!
//! Per-pixel math faults are *not* here: an undefined smoothing
//! expression is masked to `0.0` inside the kernel and never surfaces.
//! Everything below is a hard failure of the pipeline.

/// Failures surfaced by the fractal pipeline.
#[derive(Debug, Fail)]
pub enum FractalError {
    /// The spec was rejected before any task was generated.
    #[fail(display = "invalid configuration: {}", _0)]
    Configuration(String),

    /// A task descriptor was invoked after its completion flag was
    /// already set.  Always a scheduling bug in the caller.
    #[fail(display = "task {} was already completed", _0)]
    DoubleExecution(usize),

    /// A row blob of the wrong length was handed to a buffer slot.
    #[fail(display = "blob of {} bytes does not fit row stride of {} bytes", _0, _1)]
    StrideMismatch(usize, usize),

    /// A task touched a row outside the range it owns.
    #[fail(display = "row {} is outside the assigned range {}..{}", _0, _1, _2)]
    RowOutOfRange(usize, usize, usize),

    /// The requested row ranges do not exactly tile the image.
    #[fail(display = "row ranges do not tile 0..{}: {}", _0, _1)]
    BadPartition(usize, String),

    /// Decode was requested while workers still hold buffer references.
    #[fail(display = "{} outstanding reference(s) to the row buffers", _0)]
    BuffersInUse(usize),

    /// A task never ran to completion; decoding would silently yield a
    /// partially-zeroed matrix, so we refuse instead.
    #[fail(display = "task {} never completed; refusing to decode a partial result", _0)]
    IncompleteWork(usize),

    /// A worker panicked before finishing its row range.
    #[fail(display = "worker for task {} crashed before completing", _0)]
    WorkerFailure(usize),
}
