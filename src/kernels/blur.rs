use crate::exec::scratch::ThreadScratch;
use crate::exec::shared::SharedOut;
use crate::exec::work_item::{Kernel, Tile, WorkItem};
use crate::foundation::error::{TilekitError, TilekitResult};

/// Largest radius accepted by [`crate::Toolkit::blur`].
pub const MAX_BLUR_RADIUS: usize = 25;

/// Gaussian sigma used for a given radius.
pub fn blur_sigma(radius: usize) -> f32 {
    0.4 * radius as f32 + 0.6
}

/// Separable Gaussian blur over 1- or 4-channel cells with border repeat.
///
/// Each tile row is produced by blurring the needed input columns vertically into the
/// executing thread's scratch row, then blurring that row horizontally into the output.
pub(crate) struct BlurKernel<'a> {
    input: &'a [u8],
    output: SharedOut<'a>,
    size_x: usize,
    size_y: usize,
    cell_size: usize,
    weights: Vec<u32>,
    rows: ThreadScratch<Vec<u8>>,
}

pub(crate) fn blur_item<'a>(
    input: &'a [u8],
    output: &'a mut [u8],
    size_x: usize,
    size_y: usize,
    cell_size: usize,
    radius: usize,
    threads: usize,
) -> TilekitResult<WorkItem<BlurKernel<'a>>> {
    let weights = gaussian_kernel_q16(radius, blur_sigma(radius))?;
    let row_len = size_x * cell_size;
    let kernel = BlurKernel {
        input,
        output: SharedOut::new(output),
        size_x,
        size_y,
        cell_size,
        weights,
        rows: ThreadScratch::new(threads, || vec![0u8; row_len]),
    };
    Ok(WorkItem::new(kernel, size_x, size_y, cell_size))
}

impl Kernel for BlurKernel<'_> {
    fn process_data(&self, tile: Tile) {
        let cs = self.cell_size;
        let radius = self.weights.len() / 2;
        let last_x = self.size_x - 1;
        let last_y = self.size_y - 1;
        let x0 = tile.start_x.saturating_sub(radius);
        let x1 = (tile.end_x + radius).min(self.size_x);

        self.rows.with(tile.thread_index, |row| {
            for y in tile.start_y..tile.end_y {
                for x in x0..x1 {
                    let mut acc = [0u64; 4];
                    for (ki, &kw) in self.weights.iter().enumerate() {
                        let sy = (y + ki).saturating_sub(radius).min(last_y);
                        let idx = (sy * self.size_x + x) * cs;
                        for c in 0..cs {
                            acc[c] += u64::from(kw) * u64::from(self.input[idx + c]);
                        }
                    }
                    for c in 0..cs {
                        row[x * cs + c] = q16_to_u8(acc[c]);
                    }
                }

                let start = (y * self.size_x + tile.start_x) * cs;
                let end = start + tile.width() * cs;
                // SAFETY: the byte range maps to this tile's cells only.
                let out = unsafe { self.output.range_mut(start, end) };
                for (i, px) in out.chunks_exact_mut(cs).enumerate() {
                    let x = tile.start_x + i;
                    let mut acc = [0u64; 4];
                    for (ki, &kw) in self.weights.iter().enumerate() {
                        let sx = (x + ki).saturating_sub(radius).min(last_x);
                        for c in 0..cs {
                            acc[c] += u64::from(kw) * u64::from(row[sx * cs + c]);
                        }
                    }
                    for c in 0..cs {
                        px[c] = q16_to_u8(acc[c]);
                    }
                }
            }
        });
    }
}

/// Normalized Gaussian weights in Q16 fixed point; they always sum to exactly `1 << 16`.
pub(crate) fn gaussian_kernel_q16(radius: usize, sigma: f32) -> TilekitResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(TilekitError::validation("blur sigma must be > 0"));
    }

    let r = radius as i64;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = i as f64;
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(TilekitError::validation("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = (((wf / sum) * 65536.0).round() as i64).clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    Ok(weights)
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/blur.rs"]
mod tests;
