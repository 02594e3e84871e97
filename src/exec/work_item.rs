use crate::foundation::geometry::Restriction;

/// Smallest tile target honored by [`WorkItem::compute_tiling`]. Below this, synchronization
/// dominates the work done per tile.
pub const MIN_TILE_BYTES: usize = 1000;

/// Arguments of one kernel invocation: an end-exclusive rectangle plus the calling thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    /// Dense index of the executing thread, in `0..Scheduler::thread_count()`.
    pub thread_index: usize,
    /// First column.
    pub start_x: usize,
    /// First row.
    pub start_y: usize,
    /// One past the last column.
    pub end_x: usize,
    /// One past the last row.
    pub end_y: usize,
    /// Whether the scheduler's host supports SIMD.
    pub uses_simd: bool,
}

impl Tile {
    /// Columns in this call.
    pub fn width(&self) -> usize {
        self.end_x - self.start_x
    }

    /// Rows in this call.
    pub fn height(&self) -> usize {
        self.end_y - self.start_y
    }
}

/// Per-operation logic executed once per tile.
///
/// `process_data` receives a rectangle contained in the work item's working rectangle, except
/// for collapsed full-width tiles (see [`WorkItem::prefers_one_row`]), where several physical
/// rows arrive as one logical row `[0, size_x * rows) x [start_y, start_y + 1)`.
///
/// Tiles of one run never overlap, so writes confined to the tile's own cells never race.
pub trait Kernel: Sync {
    /// Process the cells of `tile`.
    fn process_data(&self, tile: Tile);
}

impl<F> Kernel for F
where
    F: Fn(Tile) + Sync,
{
    fn process_data(&self, tile: Tile) {
        self(tile)
    }
}

/// Tile grid derived for one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tiling {
    /// Tile width in cells (the last column of tiles may be narrower).
    pub cells_per_tile_x: usize,
    /// Tile height in cells (the last row of tiles may be shorter).
    pub cells_per_tile_y: usize,
    /// Tiles across the working rectangle.
    pub tiles_per_row: usize,
    /// Tiles down the working rectangle.
    pub tiles_per_column: usize,
}

impl Tiling {
    /// Total number of tiles.
    pub fn tile_count(&self) -> usize {
        self.tiles_per_row * self.tiles_per_column
    }
}

/// One operation's geometry bound to its kernel.
///
/// Built right before handing it to [`crate::Scheduler::run`] and used for exactly one run.
pub struct WorkItem<K> {
    size_x: usize,
    size_y: usize,
    cell_size: usize,
    prefers_one_row: bool,
    restriction: Option<Restriction>,
    uses_simd: bool,
    tiling: Tiling,
    kernel: K,
}

impl<K: Kernel> WorkItem<K> {
    /// Describe a `size_x` x `size_y` grid of `cell_size`-byte cells processed by `kernel`.
    ///
    /// # Panics
    ///
    /// If either dimension is zero or `cell_size` is outside `1..=4`.
    pub fn new(kernel: K, size_x: usize, size_y: usize, cell_size: usize) -> Self {
        assert!(size_x > 0 && size_y > 0, "work item grid must be non-empty");
        assert!(
            (1..=4).contains(&cell_size),
            "cell size must be 1..=4, got {cell_size}"
        );
        Self {
            size_x,
            size_y,
            cell_size,
            prefers_one_row: false,
            restriction: None,
            uses_simd: false,
            tiling: Tiling::default(),
            kernel,
        }
    }

    /// Declare that the kernel has no vertical data dependency, so full-width tiles may be
    /// collapsed into one long row.
    pub fn prefers_one_row(mut self, yes: bool) -> Self {
        self.prefers_one_row = yes;
        self
    }

    /// Limit processing to a sub-rectangle. The caller validates it beforehand.
    pub fn restricted_to(mut self, restriction: Option<Restriction>) -> Self {
        if let Some(r) = &restriction {
            debug_assert!(
                r.fits(self.size_x, self.size_y),
                "restriction {r:?} outside {}x{} grid",
                self.size_x,
                self.size_y
            );
        }
        self.restriction = restriction;
        self
    }

    /// Grid width in cells.
    pub fn size_x(&self) -> usize {
        self.size_x
    }

    /// Grid height in cells.
    pub fn size_y(&self) -> usize {
        self.size_y
    }

    /// Bytes per cell before padding.
    pub fn cell_size(&self) -> usize {
        self.cell_size
    }

    /// Whether the host supports SIMD, as recorded by the scheduler for this run.
    pub fn uses_simd(&self) -> bool {
        self.uses_simd
    }

    /// Tiling computed by the most recent [`WorkItem::compute_tiling`].
    pub fn tiling(&self) -> Tiling {
        self.tiling
    }

    /// The kernel, e.g. to collect per-thread results after the run.
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Consume the item and hand back its kernel.
    pub fn into_kernel(self) -> K {
        self.kernel
    }

    pub(crate) fn set_uses_simd(&mut self, uses: bool) {
        self.uses_simd = uses;
    }

    /// The rectangle actually processed: the restriction, or the whole grid.
    pub fn working_rect(&self) -> Restriction {
        self.restriction
            .unwrap_or_else(|| Restriction::new(0, self.size_x, 0, self.size_y))
    }

    /// Split the working rectangle into tiles of roughly `target_tile_bytes` and return how
    /// many there are.
    ///
    /// Rows are kept as wide as possible; the remainder of a row is spread evenly over its
    /// tiles instead of leaving a thin trailing tile.
    pub fn compute_tiling(&mut self, target_tile_bytes: usize) -> usize {
        let target_tile_bytes = target_tile_bytes.max(MIN_TILE_BYTES);
        let cells_per_target = target_tile_bytes / self.cell_size;
        assert!(cells_per_target > 0);

        let work = self.working_rect();
        let (work_x, work_y) = (work.width(), work.height());

        let tiles_per_row = work_x.div_ceil(cells_per_target);
        let cells_per_tile_x = work_x.div_ceil(tiles_per_row);

        let target_rows_per_tile = cells_per_target.div_ceil(cells_per_tile_x);
        let tiles_per_column = work_y.div_ceil(target_rows_per_tile);
        let cells_per_tile_y = work_y.div_ceil(tiles_per_column);

        self.tiling = Tiling {
            cells_per_tile_x,
            cells_per_tile_y,
            tiles_per_row,
            tiles_per_column,
        };
        self.tiling.tile_count()
    }

    /// Rectangle of tile `tile_index`, clipped to the working rectangle.
    pub fn tile_rect(&self, tile_index: usize) -> Restriction {
        let t = &self.tiling;
        debug_assert!(tile_index < t.tile_count());
        let work = self.working_rect();

        let tile_y = tile_index / t.tiles_per_row;
        let tile_x = tile_index % t.tiles_per_row;
        let start_x = work.start_x + tile_x * t.cells_per_tile_x;
        let start_y = work.start_y + tile_y * t.cells_per_tile_y;
        Restriction {
            start_x,
            end_x: (start_x + t.cells_per_tile_x).min(work.end_x),
            start_y,
            end_y: (start_y + t.cells_per_tile_y).min(work.end_y),
        }
    }

    /// Execute the kernel on tile `tile_index`.
    pub fn run_tile(&self, thread_index: usize, tile_index: usize) {
        let r = self.tile_rect(tile_index);
        let tile = if self.prefers_one_row && r.start_x == 0 && r.end_x == self.size_x {
            Tile {
                thread_index,
                start_x: 0,
                start_y: r.start_y,
                end_x: self.size_x * r.height(),
                end_y: r.start_y + 1,
                uses_simd: self.uses_simd,
            }
        } else {
            Tile {
                thread_index,
                start_x: r.start_x,
                start_y: r.start_y,
                end_x: r.end_x,
                end_y: r.end_y,
                uses_simd: self.uses_simd,
            }
        };
        self.kernel.process_data(tile);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/exec/work_item.rs"]
mod tests;
