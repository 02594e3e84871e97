use crate::exec::shared::SharedOut;
use crate::exec::work_item::{Kernel, Tile, WorkItem};

/// Per-channel 256-entry lookup tables for RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LutTables {
    /// Red table.
    pub red: [u8; 256],
    /// Green table.
    pub green: [u8; 256],
    /// Blue table.
    pub blue: [u8; 256],
    /// Alpha table.
    pub alpha: [u8; 256],
}

impl Default for LutTables {
    /// Identity mapping on every channel.
    fn default() -> Self {
        let identity = std::array::from_fn(|i| i as u8);
        Self {
            red: identity,
            green: identity,
            blue: identity,
            alpha: identity,
        }
    }
}

impl LutTables {
    /// Tables that invert color and keep alpha.
    pub fn invert_rgb() -> Self {
        let inverted = std::array::from_fn(|i| 255 - i as u8);
        Self {
            red: inverted,
            green: inverted,
            blue: inverted,
            ..Self::default()
        }
    }

    fn map(&self, px: &[u8], out: &mut [u8]) {
        out[0] = self.red[usize::from(px[0])];
        out[1] = self.green[usize::from(px[1])];
        out[2] = self.blue[usize::from(px[2])];
        out[3] = self.alpha[usize::from(px[3])];
    }
}

pub(crate) struct LutKernel<'a> {
    input: &'a [u8],
    output: SharedOut<'a>,
    tables: &'a LutTables,
    size_x: usize,
}

pub(crate) fn lut_item<'a>(
    input: &'a [u8],
    output: &'a mut [u8],
    size_x: usize,
    size_y: usize,
    tables: &'a LutTables,
) -> WorkItem<LutKernel<'a>> {
    let kernel = LutKernel {
        input,
        output: SharedOut::new(output),
        tables,
        size_x,
    };
    WorkItem::new(kernel, size_x, size_y, 4).prefers_one_row(true)
}

impl Kernel for LutKernel<'_> {
    fn process_data(&self, tile: Tile) {
        for y in tile.start_y..tile.end_y {
            let start = (y * self.size_x + tile.start_x) * 4;
            let end = start + tile.width() * 4;
            // SAFETY: the byte range maps to this tile's cells only.
            let out = unsafe { self.output.range_mut(start, end) };
            for (px, o) in self.input[start..end]
                .chunks_exact(4)
                .zip(out.chunks_exact_mut(4))
            {
                self.tables.map(px, o);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/lut.rs"]
mod tests;
