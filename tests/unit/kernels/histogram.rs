use super::*;
use crate::exec::scheduler::Scheduler;
use crate::foundation::geometry::Restriction;

fn run_histogram(input: &[u8], sx: usize, sy: usize, cell: usize, r: Option<Restriction>) -> Vec<u32> {
    let sched = Scheduler::with_threads(4).unwrap();
    let mut item = histogram_item(input, sx, sy, cell, sched.thread_count()).restricted_to(r);
    sched.run(&mut item);
    item.into_kernel().collate()
}

#[test]
fn counts_every_channel_of_rgba() {
    let (sx, sy) = (300usize, 200usize);
    let input: Vec<u8> = (0..sx * sy * 4).map(|i| (i % 256) as u8).collect();
    let hist = run_histogram(&input, sx, sy, 4, None);
    assert_eq!(hist.len(), 1024);
    assert_eq!(hist.iter().map(|&v| u64::from(v)).sum::<u64>(), (sx * sy * 4) as u64);

    let mut expected = vec![0u32; 1024];
    for cell in input.chunks_exact(4) {
        for (c, &v) in cell.iter().enumerate() {
            expected[usize::from(v) * 4 + c] += 1;
        }
    }
    assert_eq!(hist, expected);
}

#[test]
fn three_channel_cells_skip_padding_byte() {
    let input = [1u8, 2, 3, 99, 1, 2, 3, 99];
    let hist = run_histogram(&input, 2, 1, 3, None);
    assert_eq!(hist.len(), 1024);
    assert_eq!(hist[4], 2);
    assert_eq!(hist[2 * 4 + 1], 2);
    assert_eq!(hist[3 * 4 + 2], 2);
    assert_eq!(hist.iter().sum::<u32>(), 6);
}

#[test]
fn restriction_limits_counted_cells() {
    let (sx, sy) = (50usize, 40usize);
    let input = vec![7u8; sx * sy];
    let r = Restriction::new(10, 20, 5, 9);
    let hist = run_histogram(&input, sx, sy, 1, Some(r));
    assert_eq!(hist[7], 40);
    assert_eq!(hist.iter().sum::<u32>(), 40);
}

#[test]
fn dot_histogram_buckets_luminance() {
    let input = [
        0u8, 0, 0, 255, //
        255, 255, 255, 255, //
        255, 0, 0, 255, //
    ];
    let sched = Scheduler::with_threads(2).unwrap();
    let mut item =
        histogram_dot_item(&input, 3, 1, 4, DEFAULT_DOT_COEFFICIENTS, sched.thread_count());
    sched.run(&mut item);
    let hist = item.into_kernel().collate();
    assert_eq!(hist.len(), 256);
    assert_eq!(hist[0], 1);
    assert_eq!(hist[255], 1);
    // 77 * 255 = 19635 -> (19635 + 127) >> 8 = 77
    assert_eq!(hist[77], 1);
}
