use super::*;

#[test]
fn same_seed_same_sequence() {
    let mut a = Rng64::new(123);
    let mut b = Rng64::new(123);
    for _ in 0..16 {
        assert_eq!(a.next_u64(), b.next_u64());
    }
}

#[test]
fn range_stays_inside_bounds() {
    let mut r = Rng64::new(7);
    for _ in 0..1000 {
        let v = r.range_f64(1.5, 3.0);
        assert!((1.5..=3.0).contains(&v));
    }
    assert_eq!(r.range_f64(4.0, 4.0), 4.0);
    assert_eq!(r.range_f64(5.0, 1.0), 5.0);
}
