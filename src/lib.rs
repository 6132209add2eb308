#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Row-partitioned escape-time Mandelbrot engine
//!
//! The Mandelbrot set is computed over a rectangular coordinate grid
//! that is split into contiguous, disjoint row ranges, one per worker.
//! Workers never share a row: each task decodes its rows from a set of
//! pre-allocated binary row buffers, runs the escape-time recurrence
//! and smoothing formula, and writes its rows back.  The caller
//! dispatches one worker per task, joins all of them, and only then
//! decodes the smoothed-value buffer into a plain `height x width`
//! matrix for whatever wants to render it.
//!
//! Everything lives or dies by the partitioning: because the row
//! ranges exactly tile the image, there is nothing to lock and nothing
//! to order.  The join is the only synchronization barrier.

extern crate crossbeam;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate itertools;
#[macro_use]
extern crate log;
extern crate num;

pub mod dispatch;
pub mod errors;
pub mod fractal;
pub mod grid;
pub mod kernel;
pub mod mandelbrot;
pub mod matrix;
pub mod partition;
pub mod shm;
pub mod task;

pub use dispatch::compute;
pub use errors::FractalError;
pub use fractal::Fractal;
pub use mandelbrot::Mandelbrot;
pub use matrix::{data_to_image_matrix, ImageMatrix};
pub use shm::ShmContext;
pub use task::{FractalTask, SharedBuffers};
