// src/otsu.rs - Histogram thresholding for depth foreground separation
use std::collections::BTreeMap;

/// Depth histogram as parallel arrays: `values[i]` (ascending) occurs
/// `counts[i]` times.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Histogram {
    values: Vec<i32>,
    counts: Vec<u64>,
}

impl Histogram {
    /// Builds a histogram from parallel arrays, `counts[i]` occurrences of
    /// `values[i]`. Extra entries in the longer array are ignored; pairs are
    /// put in ascending value order.
    pub fn from_parts(counts: &[u64], values: &[i32]) -> Self {
        let mut pairs: Vec<(i32, u64)> = values
            .iter()
            .copied()
            .zip(counts.iter().copied())
            .collect();
        pairs.sort_by_key(|&(value, _)| value);

        let (values, counts) = pairs.into_iter().unzip();
        Self { values, counts }
    }

    pub fn from_samples(samples: impl IntoIterator<Item = i32>) -> Self {
        let mut buckets: BTreeMap<i32, u64> = BTreeMap::new();
        for sample in samples {
            *buckets.entry(sample).or_insert(0) += 1;
        }

        let (values, counts): (Vec<i32>, Vec<u64>) = buckets.into_iter().unzip();
        Self { values, counts }
    }

    pub fn values(&self) -> &[i32] {
        &self.values
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Otsu's threshold: the value `values[t]` whose split
    /// `[0..=t] | [t+1..]` maximizes the between-class variance.
    ///
    /// Splits leaving either class without pixels are skipped. Ties keep
    /// the lowest split. Returns `None` if no split has pixels on both sides.
    pub fn otsu_threshold(&self) -> Option<i32> {
        let len = self.values.len();
        if len < 2 {
            return None;
        }

        // prefix sums of population and of population * value
        let mut sum = Vec::with_capacity(len);
        let mut expected = Vec::with_capacity(len);
        let mut running_sum = 0.0;
        let mut running_expected = 0.0;
        for (count, value) in self.counts.iter().zip(&self.values) {
            running_sum += *count as f64;
            running_expected += *count as f64 * *value as f64;
            sum.push(running_sum);
            expected.push(running_expected);
        }

        let total = sum[len - 1];
        let total_expected = expected[len - 1];
        let mut best: Option<(f64, i32)> = None;

        for t in 0..len - 1 {
            let total_bg = sum[t];
            let total_fg = total - sum[t];
            if total_bg <= 0.0 || total_fg <= 0.0 {
                continue;
            }

            let w_bg = total_bg / total;
            let w_fg = total_fg / total;
            let mean_bg = expected[t] / total_bg;
            let mean_fg = (total_expected - expected[t]) / total_fg;
            let variance_between = w_bg * w_fg * (mean_bg - mean_fg).powi(2);

            match best {
                Some((max, _)) if variance_between <= max => {}
                _ => best = Some((variance_between, self.values[t])),
            }
        }

        best.map(|(_, threshold)| threshold)
    }
}

/// Convenience over [`Histogram::otsu_threshold`] for parallel slices.
pub fn otsu_threshold(counts: &[u64], values: &[i32]) -> Option<i32> {
    Histogram::from_parts(counts, values).otsu_threshold()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bimodal(low: i32, high: i32) -> (Vec<u64>, Vec<i32>) {
        let values: Vec<i32> = (0..=100).collect();
        let counts = values
            .iter()
            .map(|&v| if v == low || v == high { 500 } else { 0 })
            .collect();
        (counts, values)
    }

    #[test]
    fn test_clean_bimodal_split_is_deterministic() {
        let (counts, values) = bimodal(10, 90);
        let threshold = otsu_threshold(&counts, &values).unwrap();

        // every split between the modes is equally good; the first wins
        assert_eq!(threshold, 10);
        assert_eq!(otsu_threshold(&counts, &values), Some(threshold));
    }

    #[test]
    fn test_noisy_bimodal_split_lands_between_modes() {
        let values: Vec<i32> = (0..=100).collect();
        let counts: Vec<u64> = values
            .iter()
            .map(|&v| {
                let near = (v - 10).abs();
                let far = (v - 90).abs();
                if near <= 5 {
                    (600 - near * 100) as u64
                } else if far <= 5 {
                    (600 - far * 100) as u64
                } else {
                    1
                }
            })
            .collect();

        let threshold = otsu_threshold(&counts, &values).unwrap();
        assert!(threshold > 10 && threshold < 90, "threshold {}", threshold);
    }

    #[test]
    fn test_single_bucket_has_no_threshold() {
        assert_eq!(otsu_threshold(&[42], &[800]), None);

        // several buckets, but only one populated
        let (counts, values) = (vec![0, 0, 7, 0], vec![1, 2, 3, 4]);
        assert_eq!(otsu_threshold(&counts, &values), None);
    }

    #[test]
    fn test_empty_histogram() {
        assert_eq!(Histogram::default().otsu_threshold(), None);
    }

    #[test]
    fn test_leading_empty_buckets_are_skipped() {
        let counts = vec![0, 0, 10, 10];
        let values = vec![100, 200, 300, 400];
        assert_eq!(otsu_threshold(&counts, &values), Some(300));
    }

    #[test]
    fn test_from_samples_sorts_and_counts() {
        let histogram = Histogram::from_samples([900, 850, 900, 1200, 850, 900]);
        assert_eq!(histogram.values(), &[850, 900, 1200]);
        assert_eq!(histogram.counts(), &[2, 3, 1]);
        assert_eq!(histogram.total(), 6);
    }

    #[test]
    fn test_from_parts_orders_pairs_by_value() {
        let histogram = Histogram::from_parts(&[10, 0, 10, 0], &[400, 200, 300, 100]);
        assert_eq!(histogram.values(), &[100, 200, 300, 400]);
        assert_eq!(histogram.counts(), &[0, 0, 10, 10]);

        assert_eq!(otsu_threshold(&[10, 0, 10, 0], &[400, 200, 300, 100]), Some(300));
    }
}
