use super::*;
use std::sync::Mutex;

struct Recorder {
    calls: Mutex<Vec<Tile>>,
}

impl Recorder {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl Kernel for Recorder {
    fn process_data(&self, tile: Tile) {
        self.calls.lock().unwrap().push(tile);
    }
}

fn run_serial(item: &mut WorkItem<Recorder>, target: usize) -> Vec<Tile> {
    let n = item.compute_tiling(target);
    for i in 0..n {
        item.run_tile(0, i);
    }
    std::mem::take(&mut *item.kernel().calls.lock().unwrap())
}

/// Expand each call back into grid cells, undoing row collapse.
fn visited_cells(calls: &[Tile], size_x: usize, size_y: usize) -> Vec<u32> {
    let mut hits = vec![0u32; size_x * size_y];
    for t in calls {
        if t.end_y == t.start_y + 1 && t.end_x > size_x {
            assert_eq!(t.start_x, 0);
            for x in t.start_x..t.end_x {
                let (cx, cy) = (x % size_x, t.start_y + x / size_x);
                hits[cy * size_x + cx] += 1;
            }
        } else {
            for y in t.start_y..t.end_y {
                for x in t.start_x..t.end_x {
                    hits[y * size_x + x] += 1;
                }
            }
        }
    }
    hits
}

#[test]
fn tiling_example_wide_grid() {
    let mut item = WorkItem::new(Recorder::new(), 100, 50, 4);
    let n = item.compute_tiling(1000);
    assert_eq!(n, 17);
    let t = item.tiling();
    assert_eq!(t.tiles_per_row, 1);
    assert_eq!(t.cells_per_tile_x, 100);
    assert_eq!(t.tiles_per_column, 17);
    assert_eq!(t.cells_per_tile_y, 3);

    let last = item.tile_rect(16);
    assert_eq!(last.start_y, 48);
    assert_eq!(last.height(), 2);
}

#[test]
fn single_cell_grid_is_one_tile() {
    for cell_size in 1..=4 {
        for target in [0, 1000, 16 * 1024, 1 << 30] {
            let mut item = WorkItem::new(Recorder::new(), 1, 1, cell_size);
            assert_eq!(item.compute_tiling(target), 1);
        }
    }
}

#[test]
fn targets_below_floor_are_clamped() {
    let mut a = WorkItem::new(Recorder::new(), 640, 480, 4);
    let mut b = WorkItem::new(Recorder::new(), 640, 480, 4);
    assert_eq!(a.compute_tiling(1), b.compute_tiling(MIN_TILE_BYTES));
    assert_eq!(a.tiling(), b.tiling());
}

#[test]
fn remainder_is_spread_across_row() {
    // 1000 cells with 250 cells per target -> 4 tiles of exactly 250.
    let mut item = WorkItem::new(Recorder::new(), 1000, 3, 4);
    item.compute_tiling(1000);
    assert_eq!(item.tiling().tiles_per_row, 4);
    assert_eq!(item.tiling().cells_per_tile_x, 250);

    // 1001 cells -> 5 tiles of 201, the last one 197.
    let mut item = WorkItem::new(Recorder::new(), 1001, 3, 4);
    item.compute_tiling(1000);
    assert_eq!(item.tiling().tiles_per_row, 5);
    assert_eq!(item.tiling().cells_per_tile_x, 201);
    assert_eq!(item.tile_rect(4).width(), 1001 - 4 * 201);
}

#[test]
fn tiles_cover_grid_exactly_once() {
    let shapes = [
        (1, 1),
        (1, 120_000),
        (120_000, 1),
        (400, 300),
        (37, 91),
        (1023, 17),
        (3, 5000),
    ];
    for &(sx, sy) in &shapes {
        for cell_size in 1..=4 {
            for target in [1000, 4096, 16 * 1024] {
                for one_row in [false, true] {
                    let mut item =
                        WorkItem::new(Recorder::new(), sx, sy, cell_size).prefers_one_row(one_row);
                    let calls = run_serial(&mut item, target);
                    let hits = visited_cells(&calls, sx, sy);
                    assert!(
                        hits.iter().all(|&h| h == 1),
                        "{sx}x{sy} cell={cell_size} target={target} one_row={one_row}"
                    );
                }
            }
        }
    }
}

#[test]
fn restricted_tiles_stay_inside_and_cover_it() {
    let r = Restriction::new(10, 20, 0, 5);
    let mut item = WorkItem::new(Recorder::new(), 100, 100, 4).restricted_to(Some(r));
    let calls = run_serial(&mut item, 1000);
    assert!(!calls.is_empty());
    for t in &calls {
        assert!(t.start_x >= 10 && t.end_x <= 20, "{t:?}");
        assert!(t.start_y < t.end_y && t.end_y <= 5, "{t:?}");
    }
    let hits = visited_cells(&calls, 100, 100);
    for y in 0..100 {
        for x in 0..100 {
            let expected = u32::from(r.contains(x, y));
            assert_eq!(hits[y * 100 + x], expected, "cell ({x},{y})");
        }
    }
}

#[test]
fn restricted_full_width_band_still_collapses() {
    let r = Restriction::new(0, 64, 10, 30);
    let mut item = WorkItem::new(Recorder::new(), 64, 40, 4)
        .prefers_one_row(true)
        .restricted_to(Some(r));
    let calls = run_serial(&mut item, 16 * 1024);
    for t in &calls {
        assert_eq!(t.end_y, t.start_y + 1);
        assert!(t.start_y >= 10);
    }
    let hits = visited_cells(&calls, 64, 40);
    assert_eq!(hits.iter().sum::<u32>(), 64 * 20);
}

#[test]
fn collapsed_rows_use_logical_single_row() {
    let mut item = WorkItem::new(Recorder::new(), 100, 50, 4).prefers_one_row(true);
    let calls = run_serial(&mut item, 1000);
    for t in &calls {
        assert_eq!(t.start_x, 0);
        assert_eq!(t.end_y, t.start_y + 1);
        assert_eq!(t.end_x % 100, 0);
        assert!(t.end_x == 300 || t.end_x == 200);
    }
}

#[test]
fn partial_width_tiles_are_not_collapsed() {
    let mut item = WorkItem::new(Recorder::new(), 1001, 4, 4).prefers_one_row(true);
    let calls = run_serial(&mut item, 1000);
    assert!(calls.iter().all(|t| t.end_x <= 1001 && t.height() >= 1));
    assert!(calls.iter().any(|t| t.start_x > 0));
}

#[test]
fn uses_simd_flag_reaches_kernel() {
    let mut item = WorkItem::new(Recorder::new(), 8, 8, 1);
    item.set_uses_simd(true);
    let calls = run_serial(&mut item, 1000);
    assert!(calls.iter().all(|t| t.uses_simd));
}

#[test]
fn closures_are_kernels() {
    let seen = Mutex::new(0usize);
    let mut item = WorkItem::new(
        |t: Tile| *seen.lock().unwrap() += t.width() * t.height(),
        30,
        30,
        2,
    );
    let n = item.compute_tiling(1000);
    for i in 0..n {
        item.run_tile(0, i);
    }
    drop(item);
    assert_eq!(seen.into_inner().unwrap(), 900);
}

#[test]
#[should_panic(expected = "cell size")]
fn rejects_wide_cells() {
    let _ = WorkItem::new(Recorder::new(), 1, 1, 5);
}
