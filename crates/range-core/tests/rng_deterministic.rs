use range_core::rng::{RngHandle, DEFAULT_SEED};
use range_core::Sign;

#[test]
fn rng_emits_reproducible_sequence() {
    let mut rng_a = RngHandle::from_seed(1234);
    let mut rng_b = RngHandle::from_seed(1234);

    let seq_a: Vec<f64> = (0..100).map(|_| rng_a.unit()).collect();
    let seq_b: Vec<f64> = (0..100).map(|_| rng_b.unit()).collect();

    assert_eq!(seq_a, seq_b);
    assert_ne!(seq_a, (0..100).map(|_| RngHandle::from_seed(1235).unit()).collect::<Vec<_>>());
}

#[test]
fn unit_draws_stay_in_half_open_interval() {
    let mut rng = RngHandle::from_seed(DEFAULT_SEED);
    for _ in 0..10_000 {
        let u = rng.unit();
        assert!((0.0..1.0).contains(&u));
    }
    assert_eq!(rng.draws(), 10_000);
}

#[test]
fn signs_use_both_polarities() {
    let mut rng = RngHandle::from_seed(7);
    let signs: Vec<Sign> = (0..256).map(|_| rng.sign()).collect();
    assert!(signs.contains(&Sign::Plus));
    assert!(signs.contains(&Sign::Minus));
}

#[test]
fn exponential_draws_are_finite_and_non_negative() {
    let mut rng = RngHandle::from_seed(99);
    let draws: Vec<f64> = (0..4_096).map(|_| rng.exponential(10.0)).collect();
    assert_eq!(rng.draws(), 4_096);
    assert!(draws.iter().all(|x| x.is_finite() && *x >= 0.0));
    let mean = draws.iter().sum::<f64>() / draws.len() as f64;
    assert!(mean > 5.0 && mean < 15.0, "mean {mean}");
}
