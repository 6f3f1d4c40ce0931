// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The parallel escape-time engine.
//!
//! A build cuts the image into horizontal bands, one per worker.  Each
//! worker is an independent task: it receives the plane mapping and its
//! row range, computes escape counts into a buffer it owns, and hands
//! that buffer back over a channel.  The thread that started the build
//! is the only one that touches shared state.  It counts finished rows,
//! reports progress, copies each finished band into the escape buffer,
//! and notices when every band is in.
//!
//! Every build takes a new generation number from the engine.  Workers
//! check the number between rows and give up as soon as a newer build
//! (or an explicit `cancel`) has replaced theirs, so a stale band can
//! never end up in a newer buffer.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crossbeam::channel;
use tracing::{debug, info, warn};

use crate::config::ViewConfig;
use crate::error::{try_alloc, MandelError, Result};
use crate::escape::escape_time;
use crate::planes::{Pixel, PlaneMapper};

/// A horizontal slice of the image assigned to one worker.
#[derive(Clone, Debug, PartialEq)]
pub struct Band {
    /// Position of the band, top to bottom.
    pub index: usize,
    /// The rows the band covers.
    pub rows: Range<usize>,
}

/// Split `height` rows into contiguous bands, one per worker.  Every band
/// gets `height / n` rows and the last one also takes the remaining
/// `height % n`, so every row is covered exactly once.  No more bands
/// are made than there are rows.
pub fn partition(height: usize, threads: usize) -> Vec<Band> {
    let count = threads.min(height).max(1);
    let size = height / count;
    (0..count)
        .map(|index| {
            let start = index * size;
            let end = if index + 1 == count { height } else { start + size };
            Band {
                index,
                rows: start..end,
            }
        })
        .collect()
}

/// Escape counts for every pixel of a view, in row-major order.  Only
/// ever handed out once every band has been merged.
#[derive(Clone, Debug, PartialEq)]
pub struct EscapeBuffer {
    width: usize,
    height: usize,
    max_iterations: u32,
    counts: Vec<u32>,
}

impl EscapeBuffer {
    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The iteration bound the counts were computed with.
    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// True only for an image without pixels, which cannot be built.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The escape count at a pixel, if it lies within the image.
    pub fn get(&self, column: usize, row: usize) -> Option<u32> {
        if column < self.width && row < self.height {
            Some(self.counts[row * self.width + column])
        } else {
            None
        }
    }

    /// All counts, row-major.
    pub fn as_slice(&self) -> &[u32] {
        &self.counts
    }

    /// Sum of every escape count.
    pub fn total_iterations(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// Number of pixels that never escaped.
    pub fn in_set_count(&self) -> usize {
        self.counts
            .iter()
            .filter(|&&c| c == self.max_iterations)
            .count()
    }
}

/// Summary of a finished build.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildStats {
    /// Wall-clock time from the start of the build to the merge of the
    /// last band.
    pub elapsed: Duration,
    /// Number of pixels computed.
    pub pixels: usize,
    /// Sum of all escape counts.
    pub total_iterations: u64,
    /// Number of pixels that never escaped.
    pub in_set: usize,
}

impl BuildStats {
    fn new(buffer: &EscapeBuffer, elapsed: Duration) -> BuildStats {
        BuildStats {
            elapsed,
            pixels: buffer.len(),
            total_iterations: buffer.total_iterations(),
            in_set: buffer.in_set_count(),
        }
    }

    /// Average escape count per pixel.
    pub fn average_iterations(&self) -> f64 {
        if self.pixels == 0 {
            0.0
        } else {
            self.total_iterations as f64 / self.pixels as f64
        }
    }
}

/// Receives the progress and completion events of a build.  Both are
/// delivered on the thread that called `build_with`, never on a worker.
pub trait BuildObserver {
    /// Called once per finished row with the cumulative percentage of
    /// rows done.  Values never decrease and the last one is `100.0`.
    fn on_progress(&mut self, _percentage: f64) {}

    /// Called exactly once, after every band has been merged.  Not
    /// called when the build fails or is cancelled.
    fn on_complete(&mut self, _stats: &BuildStats) {}
}

impl BuildObserver for () {}

/// A `BuildObserver` made of two closures.
pub struct FnObserver<P, C> {
    progress: P,
    complete: C,
}

/// Adapt a progress closure and a completion closure into an observer.
pub fn observer_fn<P, C>(progress: P, complete: C) -> FnObserver<P, C>
where
    P: FnMut(f64),
    C: FnMut(&BuildStats),
{
    FnObserver { progress, complete }
}

impl<P, C> BuildObserver for FnObserver<P, C>
where
    P: FnMut(f64),
    C: FnMut(&BuildStats),
{
    fn on_progress(&mut self, percentage: f64) {
        (self.progress)(percentage)
    }

    fn on_complete(&mut self, stats: &BuildStats) {
        (self.complete)(stats)
    }
}

/// Rows completed so far in one build.
#[derive(Debug)]
struct ProgressState {
    rows_completed: usize,
    height: usize,
}

impl ProgressState {
    fn new(height: usize) -> Self {
        ProgressState {
            rows_completed: 0,
            height,
        }
    }

    /// Count one more row and return the new percentage.
    fn complete_row(&mut self) -> f64 {
        self.rows_completed = (self.rows_completed + 1).min(self.height);
        self.percentage()
    }

    fn percentage(&self) -> f64 {
        100.0 * self.rows_completed as f64 / self.height as f64
    }
}

/// What a worker tells the coordinator.
enum Report {
    Row,
    Finished { band: usize, result: Result<Vec<u32>> },
}

/// Computes escape buffers with a fixed number of worker threads.
#[derive(Debug)]
pub struct RasterEngine {
    threads: usize,
    generation: AtomicUsize,
}

impl Default for RasterEngine {
    fn default() -> Self {
        RasterEngine::new()
    }
}

impl RasterEngine {
    /// An engine with one worker per logical CPU.
    pub fn new() -> Self {
        RasterEngine::with_threads(num_cpus::get())
    }

    /// An engine with a given number of workers (at least one).
    pub fn with_threads(threads: usize) -> Self {
        RasterEngine {
            threads: threads.max(1),
            generation: AtomicUsize::new(0),
        }
    }

    /// The number of workers a build may use.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Abandon any build in flight.  Its workers stop after their
    /// current row and the build returns `MandelError::Cancelled`.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn is_current(&self, generation: usize) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Compute the escape buffer for a view without observing progress.
    pub fn build(&self, view: &ViewConfig) -> Result<EscapeBuffer> {
        self.build_with(view, &mut ())
    }

    /// Compute the escape buffer for a view, reporting progress and
    /// completion to `observer`.  Starting a build cancels any build
    /// still running on this engine.
    pub fn build_with(
        &self,
        view: &ViewConfig,
        observer: &mut dyn BuildObserver,
    ) -> Result<EscapeBuffer> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let started = Instant::now();

        let width = view.width();
        let height = view.height();
        let len = width
            .checked_mul(height)
            .ok_or(MandelError::ResourceExhaustion {
                pixels: usize::max_value(),
            })?;
        let mut counts: Vec<u32> = try_alloc(len)?;

        let plane = PlaneMapper::new(view);
        let limit = view.max_iterations();
        let bands = partition(height, self.threads);
        let abort = AtomicBool::new(false);
        let mut progress = ProgressState::new(height);
        let (sender, receiver) = channel::unbounded();

        debug!(generation, width, height, bands = bands.len(), "starting build");

        let coordinated = crossbeam::scope(|spawner| {
            for band in &bands {
                let sender = sender.clone();
                let abort = &abort;
                spawner.spawn(move |_| {
                    let live = || self.is_current(generation) && !abort.load(Ordering::SeqCst);
                    let result = compute_band(&plane, band.rows.clone(), limit, live, || {
                        let _ = sender.send(Report::Row);
                    });
                    let _ = sender.send(Report::Finished {
                        band: band.index,
                        result,
                    });
                });
            }
            drop(sender);

            let mut finished = 0;
            let mut failure: Option<MandelError> = None;
            while finished < bands.len() {
                match receiver.recv() {
                    Ok(Report::Row) => {
                        if failure.is_none() {
                            observer.on_progress(progress.complete_row());
                        }
                    }
                    Ok(Report::Finished { band, result }) => {
                        finished += 1;
                        match result {
                            Ok(part) => {
                                if failure.is_none() {
                                    let rows = &bands[band].rows;
                                    counts[rows.start * width..rows.end * width]
                                        .copy_from_slice(&part);
                                    debug!(band, rows = ?rows, "band merged");
                                }
                            }
                            Err(e) => {
                                abort.store(true, Ordering::SeqCst);
                                debug!(band, error = %e, "band failed");
                                if failure.is_none() {
                                    failure = Some(e);
                                }
                            }
                        }
                    }
                    Err(_) => {
                        // Every sender is gone but some band never reported.
                        failure.get_or_insert_with(|| {
                            MandelError::WorkerFailed("a worker exited without its band".into())
                        });
                        break;
                    }
                }
            }

            match failure {
                Some(e) => Err(e),
                None => Ok(()),
            }
        })
        .map_err(|_| MandelError::WorkerFailed("a worker thread panicked".to_string()))?;

        if let Err(e) = coordinated {
            warn!(generation, error = %e, "build aborted");
            return Err(e);
        }

        if !self.is_current(generation) {
            warn!(generation, "build superseded");
            return Err(MandelError::Cancelled);
        }

        let buffer = EscapeBuffer {
            width,
            height,
            max_iterations: limit,
            counts,
        };
        let stats = BuildStats::new(&buffer, started.elapsed());
        info!(
            elapsed_ms = stats.elapsed.as_millis() as u64,
            total_iterations = stats.total_iterations,
            average = stats.average_iterations(),
            "build complete"
        );
        observer.on_complete(&stats);
        Ok(buffer)
    }
}

/// Compute one band of rows into a buffer of its own.  `live` is polled
/// before every row; `row_done` is called after each.
fn compute_band<L, R>(
    plane: &PlaneMapper,
    rows: Range<usize>,
    limit: u32,
    live: L,
    mut row_done: R,
) -> Result<Vec<u32>>
where
    L: Fn() -> bool,
    R: FnMut(),
{
    let width = plane.bounds.0;
    let mut part: Vec<u32> = try_alloc(rows.len() * width)?;
    for (line, row) in part.chunks_mut(width).zip(rows) {
        if !live() {
            return Err(MandelError::Cancelled);
        }
        for (column, cell) in line.iter_mut().enumerate() {
            *cell = escape_time(plane.pixel_to_point(&Pixel(column, row)), limit);
        }
        row_done();
    }
    Ok(part)
}
