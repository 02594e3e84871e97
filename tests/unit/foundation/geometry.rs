use super::*;

#[test]
fn padded_size_only_widens_three() {
    assert_eq!(padded_size(1), 1);
    assert_eq!(padded_size(2), 2);
    assert_eq!(padded_size(3), 4);
    assert_eq!(padded_size(4), 4);
}

#[test]
fn restriction_accessors() {
    let r = Restriction::new(10, 20, 0, 5);
    assert_eq!(r.width(), 10);
    assert_eq!(r.height(), 5);
    assert!(r.contains(10, 0));
    assert!(r.contains(19, 4));
    assert!(!r.contains(20, 4));
    assert!(!r.contains(15, 5));
    assert!(r.fits(100, 100));
    assert!(!r.fits(15, 100));
}

#[test]
fn validate_restriction_accepts_none_and_inner_rects() {
    validate_restriction("t", 4, 4, None).unwrap();
    validate_restriction("t", 4, 4, Some(&Restriction::new(0, 4, 0, 4))).unwrap();
    validate_restriction("t", 4, 4, Some(&Restriction::new(1, 2, 3, 4))).unwrap();
}

#[test]
fn validate_restriction_rejects_out_of_grid_and_empty() {
    let bad = [
        Restriction::new(4, 5, 0, 1),
        Restriction::new(0, 5, 0, 1),
        Restriction::new(0, 1, 4, 4),
        Restriction::new(0, 1, 0, 5),
        Restriction::new(2, 2, 0, 1),
        Restriction::new(3, 1, 0, 1),
        Restriction::new(0, 1, 2, 1),
    ];
    for r in bad {
        let err = validate_restriction("blend", 4, 4, Some(&r)).unwrap_err();
        assert!(matches!(err, TilekitError::Validation(_)), "{r:?}");
        assert!(err.to_string().contains("blend"));
    }
}

#[test]
fn cell_size_bounds() {
    for v in 1..=4 {
        validate_cell_size(v).unwrap();
    }
    assert!(validate_cell_size(0).is_err());
    assert!(validate_cell_size(5).is_err());
}

#[test]
fn buffer_len_uses_padded_stride() {
    assert_eq!(buffer_len(3, 2, 3).unwrap(), 3 * 2 * 4);
    assert_eq!(buffer_len(3, 2, 1).unwrap(), 6);
    assert!(buffer_len(0, 2, 1).is_err());
    assert!(buffer_len(usize::MAX, 2, 4).is_err());
}

#[test]
fn expect_buffer_reports_mismatch() {
    expect_buffer("lut", "input", 16, 2, 2, 4).unwrap();
    let err = expect_buffer("lut", "input", 15, 2, 2, 4).unwrap_err();
    assert!(err.to_string().contains("expected 16"));
}
