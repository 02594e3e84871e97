use crate::exec::shared::SharedOut;
use crate::exec::work_item::{Kernel, Tile, WorkItem};
use crate::foundation::geometry::padded_size;

/// 3x3 convolution over 1..=4 channel cells. Reads beyond the grid edge repeat the border.
pub(crate) struct Convolve3x3Kernel<'a> {
    input: &'a [u8],
    output: SharedOut<'a>,
    size_x: usize,
    size_y: usize,
    cell_size: usize,
    coefficients: [f32; 9],
}

pub(crate) fn convolve3x3_item<'a>(
    input: &'a [u8],
    output: &'a mut [u8],
    cell_size: usize,
    size_x: usize,
    size_y: usize,
    coefficients: [f32; 9],
) -> WorkItem<Convolve3x3Kernel<'a>> {
    let kernel = Convolve3x3Kernel {
        input,
        output: SharedOut::new(output),
        size_x,
        size_y,
        cell_size,
        coefficients,
    };
    WorkItem::new(kernel, size_x, size_y, cell_size)
}

impl Kernel for Convolve3x3Kernel<'_> {
    fn process_data(&self, tile: Tile) {
        let stride = padded_size(self.cell_size);
        let row_bytes = self.size_x * stride;
        for y in tile.start_y..tile.end_y {
            let rows = [y.saturating_sub(1), y, (y + 1).min(self.size_y - 1)]
                .map(|ry| &self.input[ry * row_bytes..(ry + 1) * row_bytes]);

            let start = y * row_bytes + tile.start_x * stride;
            let end = start + tile.width() * stride;
            // SAFETY: the byte range maps to this tile's cells only.
            let out = unsafe { self.output.range_mut(start, end) };

            for (i, px) in out.chunks_exact_mut(stride).enumerate() {
                let x = tile.start_x + i;
                let cols = [x.saturating_sub(1), x, (x + 1).min(self.size_x - 1)];
                for c in 0..self.cell_size {
                    let mut acc = 0.0f32;
                    for (ky, row) in rows.iter().enumerate() {
                        for (kx, &cx) in cols.iter().enumerate() {
                            acc += self.coefficients[ky * 3 + kx] * f32::from(row[cx * stride + c]);
                        }
                    }
                    px[c] = (acc + 0.5).clamp(0.0, 255.0) as u8;
                }
                if stride > self.cell_size {
                    px[stride - 1] = rows[1][x * stride + stride - 1];
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/convolve.rs"]
mod tests;
