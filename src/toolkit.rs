use crate::exec::scheduler::{Scheduler, SchedulerOpts};
use crate::foundation::error::{TilekitError, TilekitResult};
use crate::foundation::geometry::{
    Restriction, expect_buffer, validate_cell_size, validate_restriction,
};
use crate::kernels::blend::{BlendMode, blend_item};
use crate::kernels::blur::{MAX_BLUR_RADIUS, blur_item};
use crate::kernels::convolve::convolve3x3_item;
use crate::kernels::histogram::{DEFAULT_DOT_COEFFICIENTS, histogram_dot_item, histogram_item};
use crate::kernels::lut::{LutTables, lut_item};

/// Tolerance on the coefficient sum accepted by [`Toolkit::histogram_dot`].
const DOT_SUM_EPSILON: f32 = 1e-4;

/// Image operations executed on a shared [`Scheduler`].
///
/// Every operation checks its arguments, builds a work item and runs it to completion before
/// returning. Buffers are tightly packed rows of `size_x` cells; three-channel cells take four
/// bytes.
pub struct Toolkit {
    scheduler: Scheduler,
}

impl Toolkit {
    /// Start a toolkit with its own scheduler.
    pub fn new(opts: SchedulerOpts) -> TilekitResult<Self> {
        Ok(Self::from_scheduler(Scheduler::new(opts)?))
    }

    /// Wrap an existing scheduler.
    pub fn from_scheduler(scheduler: Scheduler) -> Self {
        Self { scheduler }
    }

    /// The scheduler, e.g. to run custom work items on the same pool.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Composite `src` onto `dst` in place. Both are premultiplied RGBA8.
    #[tracing::instrument(skip(self, src, dst))]
    pub fn blend(
        &self,
        mode: BlendMode,
        src: &[u8],
        dst: &mut [u8],
        size_x: usize,
        size_y: usize,
        restriction: Option<Restriction>,
    ) -> TilekitResult<()> {
        expect_buffer("blend", "src", src.len(), size_x, size_y, 4)?;
        expect_buffer("blend", "dst", dst.len(), size_x, size_y, 4)?;
        validate_restriction("blend", size_x, size_y, restriction.as_ref())?;

        let mut item = blend_item(mode, src, dst, size_x, size_y).restricted_to(restriction);
        self.scheduler.run(&mut item);
        Ok(())
    }

    /// Map every RGBA8 channel of `input` through `tables` into `output`.
    #[tracing::instrument(skip(self, input, output, tables))]
    pub fn lut(
        &self,
        input: &[u8],
        output: &mut [u8],
        size_x: usize,
        size_y: usize,
        tables: &LutTables,
        restriction: Option<Restriction>,
    ) -> TilekitResult<()> {
        expect_buffer("lut", "input", input.len(), size_x, size_y, 4)?;
        expect_buffer("lut", "output", output.len(), size_x, size_y, 4)?;
        validate_restriction("lut", size_x, size_y, restriction.as_ref())?;

        let mut item = lut_item(input, output, size_x, size_y, tables).restricted_to(restriction);
        self.scheduler.run(&mut item);
        Ok(())
    }

    /// Count channel values. Returns `256 * padded_size(cell_size)` bins where the count of
    /// value `v` in channel `c` is at `v * padded_size(cell_size) + c`.
    #[tracing::instrument(skip(self, input))]
    pub fn histogram(
        &self,
        input: &[u8],
        size_x: usize,
        size_y: usize,
        cell_size: usize,
        restriction: Option<Restriction>,
    ) -> TilekitResult<Vec<u32>> {
        validate_cell_size(cell_size)?;
        expect_buffer("histogram", "input", input.len(), size_x, size_y, cell_size)?;
        validate_restriction("histogram", size_x, size_y, restriction.as_ref())?;

        let mut item = histogram_item(
            input,
            size_x,
            size_y,
            cell_size,
            self.scheduler.thread_count(),
        )
        .restricted_to(restriction);
        self.scheduler.run(&mut item);
        Ok(item.into_kernel().collate())
    }

    /// Histogram of `sum(coefficients[c] * cell[c])` in 256 bins.
    ///
    /// `None` uses [`DEFAULT_DOT_COEFFICIENTS`]. Coefficients must be non-negative and add up
    /// to at most 1; those past `cell_size` are ignored.
    #[tracing::instrument(skip(self, input))]
    pub fn histogram_dot(
        &self,
        input: &[u8],
        size_x: usize,
        size_y: usize,
        cell_size: usize,
        coefficients: Option<[f32; 4]>,
        restriction: Option<Restriction>,
    ) -> TilekitResult<Vec<u32>> {
        validate_cell_size(cell_size)?;
        expect_buffer("histogram_dot", "input", input.len(), size_x, size_y, cell_size)?;
        validate_restriction("histogram_dot", size_x, size_y, restriction.as_ref())?;
        let coefficients = coefficients.unwrap_or(DEFAULT_DOT_COEFFICIENTS);
        validate_dot_coefficients(&coefficients[..cell_size])?;

        let mut item = histogram_dot_item(
            input,
            size_x,
            size_y,
            cell_size,
            coefficients,
            self.scheduler.thread_count(),
        )
        .restricted_to(restriction);
        self.scheduler.run(&mut item);
        Ok(item.into_kernel().collate())
    }

    /// Apply a 3x3 filter, row-major `coefficients`, repeating border cells.
    #[tracing::instrument(skip(self, input, output))]
    #[allow(clippy::too_many_arguments)]
    pub fn convolve3x3(
        &self,
        input: &[u8],
        output: &mut [u8],
        cell_size: usize,
        size_x: usize,
        size_y: usize,
        coefficients: &[f32; 9],
        restriction: Option<Restriction>,
    ) -> TilekitResult<()> {
        validate_cell_size(cell_size)?;
        expect_buffer("convolve3x3", "input", input.len(), size_x, size_y, cell_size)?;
        expect_buffer("convolve3x3", "output", output.len(), size_x, size_y, cell_size)?;
        validate_restriction("convolve3x3", size_x, size_y, restriction.as_ref())?;
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(TilekitError::validation(
                "convolve3x3: coefficients must be finite",
            ));
        }

        let mut item = convolve3x3_item(input, output, cell_size, size_x, size_y, *coefficients)
            .restricted_to(restriction);
        self.scheduler.run(&mut item);
        Ok(())
    }

    /// Gaussian blur with `sigma = 0.4 * radius + 0.6`, for 1- or 4-channel cells.
    #[tracing::instrument(skip(self, input, output))]
    #[allow(clippy::too_many_arguments)]
    pub fn blur(
        &self,
        input: &[u8],
        output: &mut [u8],
        size_x: usize,
        size_y: usize,
        cell_size: usize,
        radius: usize,
        restriction: Option<Restriction>,
    ) -> TilekitResult<()> {
        if cell_size != 1 && cell_size != 4 {
            return Err(TilekitError::validation(format!(
                "blur: cell size must be 1 or 4, got {cell_size}"
            )));
        }
        if !(1..=MAX_BLUR_RADIUS).contains(&radius) {
            return Err(TilekitError::validation(format!(
                "blur: radius must be in 1..={MAX_BLUR_RADIUS}, got {radius}"
            )));
        }
        expect_buffer("blur", "input", input.len(), size_x, size_y, cell_size)?;
        expect_buffer("blur", "output", output.len(), size_x, size_y, cell_size)?;
        validate_restriction("blur", size_x, size_y, restriction.as_ref())?;

        let mut item = blur_item(
            input,
            output,
            size_x,
            size_y,
            cell_size,
            radius,
            self.scheduler.thread_count(),
        )?
        .restricted_to(restriction);
        self.scheduler.run(&mut item);
        Ok(())
    }
}

fn validate_dot_coefficients(coefficients: &[f32]) -> TilekitResult<()> {
    if coefficients.iter().any(|c| !c.is_finite() || *c < 0.0) {
        return Err(TilekitError::validation(format!(
            "histogram_dot: coefficients must be finite and non-negative, got {coefficients:?}"
        )));
    }
    let sum: f32 = coefficients.iter().sum();
    if sum > 1.0 + DOT_SUM_EPSILON {
        return Err(TilekitError::validation(format!(
            "histogram_dot: coefficients add up to {sum}, must be <= 1"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/toolkit.rs"]
mod tests;
