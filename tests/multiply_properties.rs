use num_complex::Complex64;
use proptest::prelude::*;
use pvmult::{
    add_scalar_in_place, multiply_in_place, MultiplierConfig, ParallelMultiplier, PartitionPlan,
    RemainderPolicy,
};

fn engine(workers: usize, remainder: RemainderPolicy) -> ParallelMultiplier {
    ParallelMultiplier::new(
        MultiplierConfig::new(workers)
            .with_threads(2)
            .with_remainder(remainder),
    )
    .expect("pool")
}

fn policy(truncate: bool) -> RemainderPolicy {
    if truncate {
        RemainderPolicy::Truncate
    } else {
        RemainderPolicy::AbsorbIntoLast
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn covered_indices_hold_product_and_multiplier_is_untouched(
        pairs in prop::collection::vec((-1000i64..1000, -1000i64..1000), 1..300),
        workers in 1usize..32,
        truncate in any::<bool>(),
    ) {
        let workers = workers.min(pairs.len());
        let (original, factors): (Vec<i64>, Vec<i64>) = pairs.into_iter().unzip();
        let mut acc = original.clone();
        let mult = factors.clone();

        let report = engine(workers, policy(truncate))
            .multiply_in_place(&mut acc, &mult)
            .unwrap();

        prop_assert_eq!(&mult, &factors);
        prop_assert_eq!(report.workers_completed, workers);
        for i in 0..acc.len() {
            if report.uncovered.contains(&i) {
                prop_assert_eq!(acc[i], original[i]);
            } else {
                prop_assert_eq!(acc[i], original[i] * factors[i]);
            }
        }
    }

    #[test]
    fn divisible_lengths_are_covered_exactly_once(
        workers in 1usize..64,
        per_worker in 1usize..64,
        truncate in any::<bool>(),
    ) {
        let length = workers * per_worker;
        let plan = PartitionPlan::new(length, workers, policy(truncate)).unwrap();

        let mut hits = vec![0u32; length];
        for partition in plan.partitions() {
            prop_assert_eq!(partition.len(), per_worker);
            for i in partition.range() {
                hits[i] += 1;
            }
        }
        prop_assert!(hits.iter().all(|&h| h == 1));
        prop_assert!(plan.coverage().all());
    }

    #[test]
    fn remainder_policy_decides_tail(
        workers in 2usize..40,
        per_worker in 1usize..20,
        extra in 1usize..40,
    ) {
        let extra = extra % workers;
        prop_assume!(extra != 0);
        let length = workers * per_worker + extra;

        let truncated = PartitionPlan::new(length, workers, RemainderPolicy::Truncate).unwrap();
        prop_assert_eq!(truncated.uncovered(), (length - extra)..length);
        prop_assert_eq!(truncated.coverage().count_zeros(), extra);

        let absorbed = PartitionPlan::new(length, workers, RemainderPolicy::AbsorbIntoLast).unwrap();
        prop_assert!(absorbed.uncovered().is_empty());
        prop_assert_eq!(absorbed.partitions()[workers - 1].len(), per_worker + extra);
    }
}

#[test]
fn twelve_elements_three_workers() {
    let mut acc = vec![0i64; 12];
    let mut mult = vec![0i64; 12];
    add_scalar_in_place(&mut acc, 6);
    add_scalar_in_place(&mut mult, 4);

    multiply_in_place(&mut acc, &mult, 3).unwrap();
    assert_eq!(acc, vec![24; 12]);
}

#[test]
fn ten_elements_three_workers_both_policies() {
    let mut truncated = vec![6i64; 10];
    let report = engine(3, RemainderPolicy::Truncate)
        .multiply_in_place(&mut truncated, &[4; 10])
        .unwrap();
    assert_eq!(report.stride, 3);
    assert_eq!(&truncated[..9], &[24; 9]);
    assert_eq!(truncated[9], 6);

    let mut absorbed = vec![6i64; 10];
    engine(3, RemainderPolicy::AbsorbIntoLast)
        .multiply_in_place(&mut absorbed, &[4; 10])
        .unwrap();
    assert_eq!(absorbed, vec![24; 10]);
}

#[test]
fn complex_elements() {
    let mut acc = vec![Complex64::new(1.0, 2.0); 8];
    let mult = vec![Complex64::new(3.0, 4.0); 8];
    multiply_in_place(&mut acc, &mult, 4).unwrap();
    assert!(acc.iter().all(|&z| z == Complex64::new(-5.0, 10.0)));
}

#[test]
fn more_workers_than_threads() {
    let length = 10_000;
    let mut acc: Vec<i64> = (0..length).collect();
    let mult = vec![2i64; length as usize];
    let report = engine(1_000, RemainderPolicy::default())
        .multiply_in_place(&mut acc, &mult)
        .unwrap();
    assert_eq!(report.workers_completed, 1_000);
    assert!(acc.iter().enumerate().all(|(i, &v)| v == 2 * i as i64));
}
