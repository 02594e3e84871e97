use crate::foundation::error::{TilekitError, TilekitResult};

/// Half-open sub-rectangle `[start_x, end_x) x [start_y, end_y)` of a cell grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Restriction {
    /// Inclusive first column.
    pub start_x: usize,
    /// Exclusive last column.
    pub end_x: usize,
    /// Inclusive first row.
    pub start_y: usize,
    /// Exclusive last row.
    pub end_y: usize,
}

impl Restriction {
    /// Build a restriction from its bounds. No validation happens here, see
    /// [`validate_restriction`].
    pub fn new(start_x: usize, end_x: usize, start_y: usize, end_y: usize) -> Self {
        Self {
            start_x,
            end_x,
            start_y,
            end_y,
        }
    }

    /// Number of columns covered.
    pub fn width(&self) -> usize {
        self.end_x.saturating_sub(self.start_x)
    }

    /// Number of rows covered.
    pub fn height(&self) -> usize {
        self.end_y.saturating_sub(self.start_y)
    }

    /// Return `true` when cell `(x, y)` lies inside the rectangle.
    pub fn contains(&self, x: usize, y: usize) -> bool {
        self.start_x <= x && x < self.end_x && self.start_y <= y && y < self.end_y
    }

    /// Return `true` when the rectangle is non-empty and fits a `size_x` x `size_y` grid.
    pub fn fits(&self, size_x: usize, size_y: usize) -> bool {
        self.start_x < self.end_x
            && self.end_x <= size_x
            && self.start_y < self.end_y
            && self.end_y <= size_y
    }
}

/// Bytes a cell of `cell_size` channels occupies in memory. Three-channel cells are stored
/// with a fourth padding byte.
#[inline]
pub const fn padded_size(cell_size: usize) -> usize {
    if cell_size == 3 { 4 } else { cell_size }
}

/// Check that `cell_size` is one of the supported 1..=4 channel counts.
pub fn validate_cell_size(cell_size: usize) -> TilekitResult<()> {
    if !(1..=4).contains(&cell_size) {
        return Err(TilekitError::validation(format!(
            "cell size must be between 1 and 4, got {cell_size}"
        )));
    }
    Ok(())
}

/// Check that an optional restriction is non-empty and wholly inside the grid.
pub fn validate_restriction(
    op: &str,
    size_x: usize,
    size_y: usize,
    restriction: Option<&Restriction>,
) -> TilekitResult<()> {
    let Some(r) = restriction else {
        return Ok(());
    };
    if r.start_x >= size_x || r.end_x > size_x {
        return Err(TilekitError::validation(format!(
            "{op}: restriction x range [{}, {}) exceeds grid width {size_x}",
            r.start_x, r.end_x
        )));
    }
    if r.start_y >= size_y || r.end_y > size_y {
        return Err(TilekitError::validation(format!(
            "{op}: restriction y range [{}, {}) exceeds grid height {size_y}",
            r.start_y, r.end_y
        )));
    }
    if r.start_x >= r.end_x {
        return Err(TilekitError::validation(format!(
            "{op}: restriction start_x {} must be < end_x {}",
            r.start_x, r.end_x
        )));
    }
    if r.start_y >= r.end_y {
        return Err(TilekitError::validation(format!(
            "{op}: restriction start_y {} must be < end_y {}",
            r.start_y, r.end_y
        )));
    }
    Ok(())
}

/// Byte length of a tightly packed `size_x` x `size_y` buffer of `cell_size` cells.
pub fn buffer_len(size_x: usize, size_y: usize, cell_size: usize) -> TilekitResult<usize> {
    if size_x == 0 || size_y == 0 {
        return Err(TilekitError::validation(format!(
            "grid must be non-empty, got {size_x}x{size_y}"
        )));
    }
    size_x
        .checked_mul(size_y)
        .and_then(|v| v.checked_mul(padded_size(cell_size)))
        .ok_or_else(|| TilekitError::validation("buffer size overflow"))
}

/// Check that `buf` holds exactly one grid of `cell_size` cells.
pub(crate) fn expect_buffer(
    op: &str,
    what: &str,
    buf_len: usize,
    size_x: usize,
    size_y: usize,
    cell_size: usize,
) -> TilekitResult<()> {
    let expected = buffer_len(size_x, size_y, cell_size)?;
    if buf_len != expected {
        return Err(TilekitError::validation(format!(
            "{op}: {what} buffer is {buf_len} bytes, expected {expected} ({size_x}x{size_y}x{})",
            padded_size(cell_size)
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/geometry.rs"]
mod tests;
