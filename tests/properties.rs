//! Property tests for sampling and unit normalization.

use equationer::{
    sampling::{PointsSpacing, RangeSampler},
    units::{
        get_units_scaling_ratio,
        normalize::{tag_micro_units, untag_micro_units},
    },
};
use proptest::prelude::*;

const PREFIXED: &[&str] = &["m", "km", "cm", "mm", "nm", "g", "kg", "mg", "s", "ms", "min", "h", "Pa", "kPa", "bar"];

proptest! {
    #[test]
    fn linear_samples_span_the_range(low in -1e6f64..1e6, width in 0.0f64..1e6, n in 2usize..200) {
        let high = low + width;
        let samples = RangeSampler::new([low, high], n).sample().unwrap();

        prop_assert_eq!(samples.len(), n);
        prop_assert_eq!(samples[0], low);
        prop_assert_eq!(samples[n - 1], high);

        let eps = 1e-9 * (low.abs() + high.abs() + 1.0);
        prop_assert!(samples.windows(2).all(|w| w[0] <= w[1] + eps));
    }

    #[test]
    fn log_samples_are_positive(low in 1e-6f64..1e3, factor in 1.0f64..1e6, n in 1usize..100) {
        let samples = RangeSampler::new([low, low * factor], n)
            .spacing(PointsSpacing::Logarithmic)
            .sample()
            .unwrap();

        prop_assert_eq!(samples.len(), n);
        prop_assert!(samples.iter().all(|v| *v > 0.0));
    }

    #[test]
    fn reversing_mirrors_the_samples(low in -1e3f64..1e3, width in 0.0f64..1e3, n in 1usize..50) {
        let forward = RangeSampler::new([low, low + width], n).sample().unwrap();
        let mut backward = RangeSampler::new([low, low + width], n).reversed(true).sample().unwrap();
        backward.reverse();
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn micro_tagging_round_trips(units in "(µ|μ)?[a-zA-Z]{1,5}(\\*\\*[0-9])?(/(µ|μ)?[a-zA-Z]{1,5})?") {
        prop_assert_eq!(untag_micro_units(&tag_micro_units(&units)), units);
    }

    #[test]
    fn ratio_to_itself_is_one(units in prop::sample::select(PREFIXED)) {
        prop_assert_eq!(get_units_scaling_ratio(units, units).unwrap(), 1.0);
    }

    #[test]
    fn ratios_are_reciprocal(
        a in prop::sample::select(&PREFIXED[..5]),
        b in prop::sample::select(&PREFIXED[..5]),
    ) {
        let there = get_units_scaling_ratio(a, b).unwrap();
        let back = get_units_scaling_ratio(b, a).unwrap();
        prop_assert!((there * back - 1.0).abs() < 1e-12);
    }
}
