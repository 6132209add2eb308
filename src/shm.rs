// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The shared buffer layer: allocation and binary encoding of the
//! per-row numeric state the workers trade in.
//!
//! Wire format: a row blob is a fixed-stride sequence of IEEE-754
//! doubles, 8 bytes each, packed little-endian in column order.
//! Complex rows interleave the real and imaginary parts, so their
//! stride is `16 * width`.  The element count is known from the
//! stride, so there is no terminator or sentinel byte.  This encoding
//! is the only contract that crosses the worker boundary and it must
//! round-trip bit-exactly.
//!
//! Mutation goes through [`RowRange`] views.  Views are minted exactly
//! once per list, from ranges that are checked to tile `0..height`
//! with no gap or overlap, which is the entire soundness argument for
//! the lock-free interior mutability below: no two views can ever
//! address the same row.

use std::cell::{Cell, UnsafeCell};
use std::ops::Range;
use std::sync::Arc;

use itertools::Itertools;
use num::Complex;

use errors::FractalError;

/// Bytes occupied by one packed real value.
pub const REAL_WIDTH: usize = 8;
/// Bytes occupied by one packed complex value (real part, then
/// imaginary part).
pub const COMPLEX_WIDTH: usize = 16;

/// Packs real values into the little-endian row encoding.
pub fn pack_reals(values: &[f64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * REAL_WIDTH);
    for value in values {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

/// Unpacks a real row blob back into its values.
pub fn unpack_reals(bytes: &[u8]) -> Vec<f64> {
    let mut raw = [0u8; REAL_WIDTH];
    bytes
        .chunks_exact(REAL_WIDTH)
        .map(|chunk| {
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect()
}

/// Packs complex values, interleaving real and imaginary parts in
/// column order.
pub fn pack_complexes(values: &[Complex<f64>]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * COMPLEX_WIDTH);
    for value in values {
        out.extend_from_slice(&value.re.to_le_bytes());
        out.extend_from_slice(&value.im.to_le_bytes());
    }
    out
}

/// Unpacks a complex row blob back into its values.
pub fn unpack_complexes(bytes: &[u8]) -> Vec<Complex<f64>> {
    unpack_reals(bytes)
        .into_iter()
        .tuples()
        .map(|(re, im)| Complex::new(re, im))
        .collect()
}

/// A named, fixed-capacity list of fixed-stride byte blobs, one blob
/// per image row.  This is the arena the workers share.
pub struct BlobList {
    name: String,
    stride: usize,
    cells: Vec<UnsafeCell<Vec<u8>>>,
}

// Rows are only touched through RowRange views, and views are minted
// once per list from ranges proven to tile the row space.  No two
// views address the same cell.
unsafe impl Send for BlobList {}
unsafe impl Sync for BlobList {}

impl BlobList {
    pub(crate) fn new(
        name: String,
        stride: usize,
        entries: Vec<Vec<u8>>,
    ) -> Result<Arc<BlobList>, FractalError> {
        for entry in &entries {
            if entry.len() != stride {
                return Err(FractalError::StrideMismatch(entry.len(), stride));
            }
        }
        debug!("allocated segment {} ({} rows of {} bytes)", name, entries.len(), stride);
        Ok(Arc::new(BlobList {
            name,
            stride,
            cells: entries.into_iter().map(UnsafeCell::new).collect(),
        }))
    }

    /// The segment name this list was allocated under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows in the list.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when the list holds no rows.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Mints one view per range after checking that the ranges exactly
    /// tile `0..len`.  The check is what makes the views' unguarded
    /// row access sound, so a bad partition is rejected here rather
    /// than detected (or not) at runtime.
    pub(crate) fn partition(
        list: &Arc<BlobList>,
        ranges: &[Range<usize>],
    ) -> Result<Vec<RowRange>, FractalError> {
        let mut expected = 0;
        for range in ranges {
            if range.end < range.start || range.start != expected {
                return Err(FractalError::BadPartition(
                    list.len(),
                    format!("range {}..{} does not continue at row {}", range.start, range.end, expected),
                ));
            }
            expected = range.end;
        }
        if expected != list.len() {
            return Err(FractalError::BadPartition(
                list.len(),
                format!("ranges cover {} of {} rows", expected, list.len()),
            ));
        }
        Ok(ranges
            .iter()
            .map(|range| RowRange {
                list: list.clone(),
                range: range.clone(),
            })
            .collect())
    }

    /// Tears the list down into its row blobs.  Only reachable once
    /// the caller holds the sole reference, i.e. after every worker
    /// has dropped its views.
    pub(crate) fn into_rows(self) -> Vec<Vec<u8>> {
        self.cells.into_iter().map(|cell| cell.into_inner()).collect()
    }

    unsafe fn read_row(&self, row: usize) -> Vec<u8> {
        (*self.cells[row].get()).clone()
    }

    unsafe fn write_row(&self, row: usize, bytes: &[u8]) {
        (*self.cells[row].get()).copy_from_slice(bytes);
    }
}

/// An exclusive view over a contiguous range of rows of one
/// [`BlobList`].  A view can read and rewrite its own rows and nothing
/// else.
pub struct RowRange {
    list: Arc<BlobList>,
    range: Range<usize>,
}

impl RowRange {
    /// The half-open row interval this view owns.
    pub fn rows(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Reads one owned row out of the arena.
    pub fn read(&self, row: usize) -> Result<Vec<u8>, FractalError> {
        self.check(row)?;
        Ok(unsafe { self.list.read_row(row) })
    }

    /// Rewrites one owned row.  The blob must match the list stride.
    pub fn write(&self, row: usize, bytes: &[u8]) -> Result<(), FractalError> {
        self.check(row)?;
        if bytes.len() != self.list.stride() {
            return Err(FractalError::StrideMismatch(bytes.len(), self.list.stride()));
        }
        unsafe { self.list.write_row(row, bytes) };
        Ok(())
    }

    fn check(&self, row: usize) -> Result<(), FractalError> {
        if row < self.range.start || row >= self.range.end {
            return Err(FractalError::RowOutOfRange(
                row,
                self.range.start,
                self.range.end,
            ));
        }
        Ok(())
    }
}

/// Completion flags, one per task.  Purely an assertion against
/// double execution; never an inter-task coordination signal.  Each
/// flag has exactly one writer (its task's slot), and the flags are
/// only read back once the decoder holds the sole reference.
pub struct FlagList {
    name: String,
    cells: Vec<UnsafeCell<u8>>,
}

unsafe impl Send for FlagList {}
unsafe impl Sync for FlagList {}

impl FlagList {
    pub(crate) fn new(name: String, len: usize) -> Arc<FlagList> {
        debug!("allocated segment {} ({} flags)", name, len);
        Arc::new(FlagList {
            name,
            cells: (0..len).map(|_| UnsafeCell::new(0)).collect(),
        })
    }

    /// The segment name this list was allocated under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of flags.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when there are no flags.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Mints the one-and-only slot for each flag index.
    pub(crate) fn slots(list: &Arc<FlagList>) -> Vec<FlagSlot> {
        (0..list.len())
            .map(|index| FlagSlot {
                list: list.clone(),
                index,
            })
            .collect()
    }

    pub(crate) fn into_values(self) -> Vec<u8> {
        self.cells.into_iter().map(|cell| cell.into_inner()).collect()
    }
}

/// The single writer handle for one completion flag.
pub struct FlagSlot {
    list: Arc<FlagList>,
    index: usize,
}

impl FlagSlot {
    /// The task id this slot belongs to.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether the flag has been set.
    pub fn is_set(&self) -> bool {
        unsafe { *self.list.cells[self.index].get() != 0 }
    }

    /// Marks the task complete.
    pub fn mark(&self) {
        unsafe {
            *self.list.cells[self.index].get() = 1;
        }
    }
}

/// Allocator for the named shared segments.  Fills the role the
/// shared-memory manager plays for a multi-process caller: it hands
/// out fixed-capacity lists of byte blobs and integers under unique
/// segment names.
pub struct ShmContext {
    prefix: String,
    segments: Cell<usize>,
}

impl ShmContext {
    /// A context with the default segment-name prefix.
    pub fn new() -> ShmContext {
        ShmContext::with_prefix("mandelgrid")
    }

    /// A context whose segments are named under `prefix`.
    pub fn with_prefix(prefix: &str) -> ShmContext {
        ShmContext {
            prefix: prefix.to_string(),
            segments: Cell::new(0),
        }
    }

    fn next_name(&self, label: &str) -> String {
        let n = self.segments.get();
        self.segments.set(n + 1);
        format!("{}/{}-{}", self.prefix, label, n)
    }

    /// Allocates a named blob list, pre-filled with `entries`, each of
    /// which must already match `stride`.
    pub fn blob_list(
        &self,
        label: &str,
        stride: usize,
        entries: Vec<Vec<u8>>,
    ) -> Result<Arc<BlobList>, FractalError> {
        BlobList::new(self.next_name(label), stride, entries)
    }

    /// Allocates a named, zeroed flag list.
    pub fn flag_list(&self, label: &str, len: usize) -> Arc<FlagList> {
        FlagList::new(self.next_name(label), len)
    }
}

impl Default for ShmContext {
    fn default() -> ShmContext {
        ShmContext::new()
    }
}
