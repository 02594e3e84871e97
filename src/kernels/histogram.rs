use crate::exec::scratch::ThreadScratch;
use crate::exec::work_item::{Kernel, Tile, WorkItem};
use crate::foundation::geometry::padded_size;

/// Luminance weights used by [`crate::Toolkit::histogram_dot`] when none are given.
pub const DEFAULT_DOT_COEFFICIENTS: [f32; 4] = [0.299, 0.587, 0.114, 0.0];

/// Per-channel histogram. Bins are interleaved by channel: the count of value `v` in
/// channel `c` lives at `v * padded_size(cell_size) + c`.
pub(crate) struct HistogramKernel<'a> {
    input: &'a [u8],
    size_x: usize,
    cell_size: usize,
    sums: ThreadScratch<Vec<u32>>,
}

pub(crate) fn histogram_item(
    input: &[u8],
    size_x: usize,
    size_y: usize,
    cell_size: usize,
    threads: usize,
) -> WorkItem<HistogramKernel<'_>> {
    let bins = 256 * padded_size(cell_size);
    let kernel = HistogramKernel {
        input,
        size_x,
        cell_size,
        sums: ThreadScratch::new(threads, || vec![0u32; bins]),
    };
    WorkItem::new(kernel, size_x, size_y, cell_size).prefers_one_row(true)
}

impl HistogramKernel<'_> {
    /// Add up the per-thread partial counts.
    pub(crate) fn collate(self) -> Vec<u32> {
        collate(self.sums.into_inner(), 256 * padded_size(self.cell_size))
    }
}

impl Kernel for HistogramKernel<'_> {
    fn process_data(&self, tile: Tile) {
        let stride = padded_size(self.cell_size);
        let channels = self.cell_size;
        self.sums.with(tile.thread_index, |sums| {
            for y in tile.start_y..tile.end_y {
                let start = (y * self.size_x + tile.start_x) * stride;
                let end = start + tile.width() * stride;
                for cell in self.input[start..end].chunks_exact(stride) {
                    for (c, &v) in cell[..channels].iter().enumerate() {
                        sums[usize::from(v) * stride + c] += 1;
                    }
                }
            }
        });
    }
}

/// Histogram of a weighted sum of channels, e.g. luminance.
pub(crate) struct HistogramDotKernel<'a> {
    input: &'a [u8],
    size_x: usize,
    cell_size: usize,
    dot: [u32; 4],
    sums: ThreadScratch<Vec<u32>>,
}

pub(crate) fn histogram_dot_item(
    input: &[u8],
    size_x: usize,
    size_y: usize,
    cell_size: usize,
    coefficients: [f32; 4],
    threads: usize,
) -> WorkItem<HistogramDotKernel<'_>> {
    let kernel = HistogramDotKernel {
        input,
        size_x,
        cell_size,
        dot: coefficients.map(|c| (c * 256.0 + 0.5) as u32),
        sums: ThreadScratch::new(threads, || vec![0u32; 256]),
    };
    WorkItem::new(kernel, size_x, size_y, cell_size).prefers_one_row(true)
}

impl HistogramDotKernel<'_> {
    /// Add up the per-thread partial counts.
    pub(crate) fn collate(self) -> Vec<u32> {
        collate(self.sums.into_inner(), 256)
    }
}

impl Kernel for HistogramDotKernel<'_> {
    fn process_data(&self, tile: Tile) {
        let stride = padded_size(self.cell_size);
        let weights = &self.dot[..self.cell_size];
        self.sums.with(tile.thread_index, |sums| {
            for y in tile.start_y..tile.end_y {
                let start = (y * self.size_x + tile.start_x) * stride;
                let end = start + tile.width() * stride;
                for cell in self.input[start..end].chunks_exact(stride) {
                    let t: u32 = weights
                        .iter()
                        .zip(cell)
                        .map(|(&w, &v)| w * u32::from(v))
                        .sum();
                    // Rounded weights can add up past 256, so white may land above 255.
                    let bin = ((t + 0x7f) >> 8).min(255) as usize;
                    sums[bin] += 1;
                }
            }
        });
    }
}

fn collate(partials: Vec<Vec<u32>>, bins: usize) -> Vec<u32> {
    let mut out = vec![0u32; bins];
    for part in partials {
        for (o, v) in out.iter_mut().zip(part) {
            *o += v;
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/histogram.rs"]
mod tests;
