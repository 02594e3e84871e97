use crate::exec::shared::SharedOut;
use crate::exec::work_item::{Kernel, Tile, WorkItem};

/// Compositing rule applied by [`crate::Toolkit::blend`]. `src` is the incoming image, `dst`
/// the buffer that is read and overwritten in place. Channels are premultiplied RGBA8.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// `dst = 0`
    Clear,
    /// `dst = src`
    Src,
    /// `dst` is left untouched.
    Dst,
    /// `dst = src + dst * (1 - src.a)`
    SrcOver,
    /// `dst = dst + src * (1 - dst.a)`
    DstOver,
    /// `dst = src * dst.a`
    SrcIn,
    /// `dst = dst * src.a`
    DstIn,
    /// `dst = src * (1 - dst.a)`
    SrcOut,
    /// `dst = dst * (1 - src.a)`
    DstOut,
    /// `dst.rgb = src.rgb * dst.a + dst.rgb * (1 - src.a)`, alpha kept.
    SrcAtop,
    /// `dst.rgb = dst.rgb * src.a + src.rgb * (1 - dst.a)`, `dst.a = src.a`
    DstAtop,
    /// `dst = src ^ dst`, bitwise.
    Xor,
    /// `dst = src * dst`
    Multiply,
    /// `dst = min(src + dst, 255)`
    Add,
    /// `dst = max(dst - src, 0)`
    Subtract,
}

pub(crate) struct BlendKernel<'a> {
    mode: BlendMode,
    src: &'a [u8],
    dst: SharedOut<'a>,
    size_x: usize,
}

pub(crate) fn blend_item<'a>(
    mode: BlendMode,
    src: &'a [u8],
    dst: &'a mut [u8],
    size_x: usize,
    size_y: usize,
) -> WorkItem<BlendKernel<'a>> {
    let kernel = BlendKernel {
        mode,
        src,
        dst: SharedOut::new(dst),
        size_x,
    };
    WorkItem::new(kernel, size_x, size_y, 4).prefers_one_row(true)
}

impl Kernel for BlendKernel<'_> {
    fn process_data(&self, tile: Tile) {
        for y in tile.start_y..tile.end_y {
            let start = (y * self.size_x + tile.start_x) * 4;
            let end = start + tile.width() * 4;
            // SAFETY: the byte range maps to this tile's cells only.
            let out = unsafe { self.dst.range_mut(start, end) };
            blend_span(self.mode, &self.src[start..end], out);
        }
    }
}

/// Blend one contiguous run of RGBA8 pixels.
pub(crate) fn blend_span(mode: BlendMode, src: &[u8], dst: &mut [u8]) {
    debug_assert_eq!(src.len(), dst.len());
    match mode {
        BlendMode::Clear => dst.fill(0),
        BlendMode::Src => dst.copy_from_slice(src),
        BlendMode::Dst => {}
        BlendMode::SrcOver => {
            for_each_pixel(src, dst, |s, d| {
                let inv = 255 - u32::from(s[3]);
                for c in 0..4 {
                    d[c] = clip(u32::from(s[c]) + ((u32::from(d[c]) * inv) >> 8));
                }
            });
        }
        BlendMode::DstOver => {
            for_each_pixel(src, dst, |s, d| {
                let inv = 255 - u32::from(d[3]);
                for c in 0..4 {
                    d[c] = clip(u32::from(d[c]) + ((u32::from(s[c]) * inv) >> 8));
                }
            });
        }
        BlendMode::SrcIn => {
            for_each_pixel(src, dst, |s, d| {
                let a = u32::from(d[3]);
                for c in 0..4 {
                    d[c] = ((u32::from(s[c]) * a) >> 8) as u8;
                }
            });
        }
        BlendMode::DstIn => {
            for_each_pixel(src, dst, |s, d| {
                let a = u32::from(s[3]);
                for c in 0..4 {
                    d[c] = ((u32::from(d[c]) * a) >> 8) as u8;
                }
            });
        }
        BlendMode::SrcOut => {
            for_each_pixel(src, dst, |s, d| {
                let inv = 255 - u32::from(d[3]);
                for c in 0..4 {
                    d[c] = ((u32::from(s[c]) * inv) >> 8) as u8;
                }
            });
        }
        BlendMode::DstOut => {
            for_each_pixel(src, dst, |s, d| {
                let inv = 255 - u32::from(s[3]);
                for c in 0..4 {
                    d[c] = ((u32::from(d[c]) * inv) >> 8) as u8;
                }
            });
        }
        BlendMode::SrcAtop => {
            for_each_pixel(src, dst, |s, d| {
                let (sa, da) = (u32::from(s[3]), u32::from(d[3]));
                for c in 0..3 {
                    d[c] = clip((u32::from(s[c]) * da + u32::from(d[c]) * (255 - sa)) >> 8);
                }
            });
        }
        BlendMode::DstAtop => {
            for_each_pixel(src, dst, |s, d| {
                let (sa, da) = (u32::from(s[3]), u32::from(d[3]));
                for c in 0..3 {
                    d[c] = clip((u32::from(d[c]) * sa + u32::from(s[c]) * (255 - da)) >> 8);
                }
                d[3] = s[3];
            });
        }
        BlendMode::Xor => {
            for (s, d) in src.iter().zip(dst.iter_mut()) {
                *d ^= s;
            }
        }
        BlendMode::Multiply => {
            for (s, d) in src.iter().zip(dst.iter_mut()) {
                *d = ((u32::from(*s) * u32::from(*d)) >> 8) as u8;
            }
        }
        BlendMode::Add => {
            for (s, d) in src.iter().zip(dst.iter_mut()) {
                *d = d.saturating_add(*s);
            }
        }
        BlendMode::Subtract => {
            for (s, d) in src.iter().zip(dst.iter_mut()) {
                *d = d.saturating_sub(*s);
            }
        }
    }
}

fn for_each_pixel(src: &[u8], dst: &mut [u8], mut f: impl FnMut(&[u8], &mut [u8])) {
    for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        f(s, d);
    }
}

#[inline]
fn clip(v: u32) -> u8 {
    v.min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/blend.rs"]
mod tests;
