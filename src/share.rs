// src/share.rs
//
// Vehicle-type share synthesis. Each region carries a static base profile;
// the displayed distribution rotates with (hour + weekday) and gets a small
// bounded perturbation so the pie is not frozen between data refreshes.
//
// The output always sums to exactly 100: the rounding remainder is assigned
// wholly to the last category. That biases the last slice and is kept as-is;
// it matches the production behavior this engine replaces.

use chrono::Weekday;
use rand::Rng;
use tracing::debug;

pub const CATEGORY_COUNT: usize = 4;

pub const CATEGORY_LABELS: [&str; CATEGORY_COUNT] = ["Car", "Bus", "Truck", "Motorcycle"];
pub const CATEGORY_ICONS: [&str; CATEGORY_COUNT] = ["🚗", "🚌", "🚚", "🏍️"];

pub const DEFAULT_REGION: &str = "서울";

/// Static base distribution per region. Weights are percentages summing to 100.
const REGION_PROFILES: &[(&str, [i64; CATEGORY_COUNT])] = &[
    ("서울", [45, 20, 20, 15]),
    ("청주", [40, 20, 25, 15]),
    ("전주", [40, 25, 20, 15]),
    ("광주", [40, 20, 25, 15]),
    ("서해안", [35, 15, 40, 10]),
    ("부산", [25, 25, 15, 35]),
    ("강원", [30, 20, 35, 15]),
    ("경기", [45, 15, 30, 10]),
    ("대전", [40, 25, 20, 15]),
    ("대구", [40, 20, 25, 15]),
    ("천안", [35, 20, 30, 15]),
];

/// One pie slice: category label, integer percentage and the legend icon.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareSlice {
    pub label: &'static str,
    pub percent: i64,
    pub icon: &'static str,
}

/// A synthesized, time-varying categorical share. Percentages are
/// non-negative integers summing to exactly 100.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareDistribution {
    pub slices: [ShareSlice; CATEGORY_COUNT],
}

impl ShareDistribution {
    pub fn percents(&self) -> [i64; CATEGORY_COUNT] {
        let mut out = [0; CATEGORY_COUNT];
        for (slot, slice) in out.iter_mut().zip(self.slices.iter()) {
            *slot = slice.percent;
        }
        out
    }

    pub fn total(&self) -> i64 {
        self.slices.iter().map(|s| s.percent).sum()
    }

    fn from_percents(percents: [i64; CATEGORY_COUNT]) -> Self {
        let mut slices = Vec::with_capacity(CATEGORY_COUNT);
        for (i, percent) in percents.into_iter().enumerate() {
            slices.push(ShareSlice {
                label: CATEGORY_LABELS[i],
                percent,
                icon: CATEGORY_ICONS[i],
            });
        }
        Self {
            slices: slices.try_into().expect("exactly CATEGORY_COUNT slices"),
        }
    }
}

pub struct ShareSynthesizer {
    noise_amplitude: i64,
}

impl ShareSynthesizer {
    pub fn new(noise_amplitude: i64) -> Self {
        Self {
            noise_amplitude: noise_amplitude.abs(),
        }
    }

    /// Base profile for `region`, falling back to the default region when the
    /// region is unknown.
    pub fn base_profile(region: &str) -> [i64; CATEGORY_COUNT] {
        REGION_PROFILES
            .iter()
            .find(|(name, _)| *name == region)
            .or_else(|| {
                debug!("unknown region '{}', using {} profile", region, DEFAULT_REGION);
                REGION_PROFILES.iter().find(|(name, _)| *name == DEFAULT_REGION)
            })
            .map(|(_, weights)| *weights)
            .expect("default region profile present")
    }

    /// Synthesize the distribution for (region, hour, weekday) using the
    /// supplied RNG. Recomputed fresh on every call; no caching.
    pub fn synthesize<R: Rng>(
        &self,
        region: &str,
        hour: u32,
        weekday: Weekday,
        rng: &mut R,
    ) -> ShareDistribution {
        let base = Self::base_profile(region);
        let rotated = rotate(base, rotation_offset(hour, weekday));
        let perturbed = self.perturb(rotated, rng);
        ShareDistribution::from_percents(normalize_to_100(perturbed))
    }

    fn perturb<R: Rng>(
        &self,
        weights: [i64; CATEGORY_COUNT],
        rng: &mut R,
    ) -> [i64; CATEGORY_COUNT] {
        let mut out = weights;
        for w in out.iter_mut() {
            let noise = if self.noise_amplitude == 0 {
                0
            } else {
                rng.gen_range(-self.noise_amplitude..=self.noise_amplitude)
            };
            *w = (*w + noise).max(0);
        }
        out
    }
}

/// Rotation offset for the given hour and weekday. Weekday is counted from
/// Sunday so Tuesday = 2.
pub fn rotation_offset(hour: u32, weekday: Weekday) -> usize {
    ((hour + weekday.num_days_from_sunday()) as usize) % CATEGORY_COUNT
}

/// Cyclic left rotation. Rotation, not shuffling: relative adjacency of the
/// categories is preserved.
fn rotate(weights: [i64; CATEGORY_COUNT], offset: usize) -> [i64; CATEGORY_COUNT] {
    let mut out = weights;
    out.rotate_left(offset % CATEGORY_COUNT);
    out
}

/// Scale integer weights to percentages summing to exactly 100. A zero sum is
/// substituted with 1 to avoid division by zero; the signed rounding
/// remainder lands on the last category.
fn normalize_to_100(weights: [i64; CATEGORY_COUNT]) -> [i64; CATEGORY_COUNT] {
    let sum = weights.iter().sum::<i64>().max(1);

    let mut percents = [0i64; CATEGORY_COUNT];
    for (slot, w) in percents.iter_mut().zip(weights.iter()) {
        *slot = ((*w as f64) * 100.0 / sum as f64).round() as i64;
    }

    let remainder = 100 - percents.iter().sum::<i64>();
    percents[CATEGORY_COUNT - 1] += remainder;
    percents
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_busan_tuesday_14h_rotation_is_zero() {
        // (14 + 2) mod 4 == 0: the base profile order survives untouched
        assert_eq!(rotation_offset(14, Weekday::Tue), 0);
        assert_eq!(ShareSynthesizer::base_profile("부산"), [25, 25, 15, 35]);
        assert_eq!(rotate([25, 25, 15, 35], 0), [25, 25, 15, 35]);
    }

    #[test]
    fn test_rotation_preserves_adjacency() {
        assert_eq!(rotate([25, 25, 15, 35], 1), [25, 15, 35, 25]);
        assert_eq!(rotate([25, 25, 15, 35], 3), [35, 25, 25, 15]);
    }

    #[test]
    fn test_unknown_region_falls_back_to_default() {
        assert_eq!(
            ShareSynthesizer::base_profile("제주"),
            ShareSynthesizer::base_profile(DEFAULT_REGION)
        );
    }

    #[test]
    fn test_normalize_exact_hundred() {
        assert_eq!(normalize_to_100([25, 25, 15, 35]).iter().sum::<i64>(), 100);
        assert_eq!(normalize_to_100([1, 1, 1, 1]).iter().sum::<i64>(), 100);
        assert_eq!(normalize_to_100([33, 33, 33, 1]).iter().sum::<i64>(), 100);
    }

    #[test]
    fn test_normalize_zero_sum_does_not_divide_by_zero() {
        let percents = normalize_to_100([0, 0, 0, 0]);
        // everything rounds to 0, the remainder lands on the last category
        assert_eq!(percents, [0, 0, 0, 100]);
    }

    #[test]
    fn test_normalize_single_surviving_category() {
        // adversarial clamp: noise drove every category but one to 0
        assert_eq!(normalize_to_100([0, 0, 0, 7]), [0, 0, 0, 100]);
        assert_eq!(normalize_to_100([9, 0, 0, 0]), [100, 0, 0, 0]);
    }

    #[test]
    fn test_synthesized_shares_always_sum_to_100() {
        let synth = ShareSynthesizer::new(5);
        let weekdays = [
            Weekday::Sun,
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
        ];

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            for (region, _) in super::REGION_PROFILES {
                for hour in 0..24 {
                    for weekday in weekdays {
                        let dist = synth.synthesize(region, hour, weekday, &mut rng);
                        assert_eq!(dist.total(), 100, "{} h{} {:?}", region, hour, weekday);
                        assert!(dist.percents().iter().all(|p| *p >= 0));
                    }
                }
            }
        }
    }

    #[test]
    fn test_large_amplitude_still_sums_to_100() {
        // amplitude far above every weight: clamping at 0 is routine here
        let synth = ShareSynthesizer::new(100);
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let dist = synth.synthesize("부산", 14, Weekday::Tue, &mut rng);
            assert_eq!(dist.total(), 100);
            assert!(dist.percents().iter().all(|p| *p >= 0));
        }
    }

    #[test]
    fn test_zero_amplitude_is_deterministic() {
        let synth = ShareSynthesizer::new(0);
        let mut rng = StdRng::seed_from_u64(1);
        let a = synth.synthesize("부산", 14, Weekday::Tue, &mut rng);
        let b = synth.synthesize("부산", 14, Weekday::Tue, &mut rng);
        assert_eq!(a, b);
        assert_eq!(a.percents(), [25, 25, 15, 35]);
    }

    #[test]
    fn test_slice_labels_and_icons() {
        let synth = ShareSynthesizer::new(0);
        let mut rng = StdRng::seed_from_u64(1);
        let dist = synth.synthesize("서울", 0, Weekday::Sun, &mut rng);
        assert_eq!(dist.slices[0].label, "Car");
        assert_eq!(dist.slices[0].icon, "🚗");
        assert_eq!(dist.slices[3].label, "Motorcycle");
    }
}
