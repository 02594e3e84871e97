use super::*;
use crate::exec::scheduler::Scheduler;
use crate::foundation::geometry::Restriction;

const IDENTITY: [f32; 9] = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
const BOX: [f32; 9] = [1.0 / 9.0; 9];

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 37 + i / 7) % 256) as u8).collect()
}

/// Straightforward single-threaded evaluation of the same filter.
fn reference(input: &[u8], cell: usize, sx: usize, sy: usize, k: &[f32; 9]) -> Vec<u8> {
    let stride = padded_size(cell);
    let mut out = input.to_vec();
    for y in 0..sy {
        for x in 0..sx {
            for c in 0..cell {
                let mut acc = 0.0f32;
                for ky in 0..3 {
                    for kx in 0..3 {
                        let yy = (y + ky).saturating_sub(1).min(sy - 1);
                        let xx = (x + kx).saturating_sub(1).min(sx - 1);
                        acc += k[ky * 3 + kx] * f32::from(input[(yy * sx + xx) * stride + c]);
                    }
                }
                out[(y * sx + x) * stride + c] = (acc + 0.5).clamp(0.0, 255.0) as u8;
            }
        }
    }
    out
}

fn run(input: &[u8], cell: usize, sx: usize, sy: usize, k: [f32; 9], threads: usize) -> Vec<u8> {
    let sched = Scheduler::with_threads(threads).unwrap();
    let mut out = vec![0u8; input.len()];
    let mut item = convolve3x3_item(input, &mut out, cell, sx, sy, k);
    sched.run(&mut item);
    drop(item);
    out
}

#[test]
fn identity_kernel_copies_input() {
    let (sx, sy) = (97, 61);
    let input = pattern(sx * sy * 4);
    assert_eq!(run(&input, 4, sx, sy, IDENTITY, 4), input);
}

#[test]
fn box_filter_matches_reference_for_every_cell_size() {
    let (sx, sy) = (131, 45);
    for cell in 1..=4 {
        let input = pattern(sx * sy * padded_size(cell));
        let expected = reference(&input, cell, sx, sy, &BOX);
        assert_eq!(run(&input, cell, sx, sy, BOX, 3), expected, "cell size {cell}");
    }
}

#[test]
fn single_pixel_grid_uses_clamped_neighbors() {
    let out = run(&[10, 20], 2, 1, 1, BOX, 2);
    assert_eq!(out, vec![10, 20]);
}

#[test]
fn negative_results_clamp_to_zero() {
    let k = [0.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0];
    let out = run(&[200u8; 16], 1, 4, 4, k, 2);
    assert!(out.iter().all(|&v| v == 0));
}

#[test]
fn restriction_leaves_outside_untouched() {
    let (sx, sy) = (40, 30);
    let input = pattern(sx * sy);
    let r = Restriction::new(5, 15, 10, 20);
    let sched = Scheduler::with_threads(4).unwrap();
    let mut out = vec![0xAAu8; input.len()];
    let mut item = convolve3x3_item(&input, &mut out, 1, sx, sy, BOX).restricted_to(Some(r));
    sched.run(&mut item);
    drop(item);

    let expected = reference(&input, 1, sx, sy, &BOX);
    for y in 0..sy {
        for x in 0..sx {
            let i = y * sx + x;
            if r.contains(x, y) {
                assert_eq!(out[i], expected[i], "({x},{y})");
            } else {
                assert_eq!(out[i], 0xAA, "({x},{y})");
            }
        }
    }
}
