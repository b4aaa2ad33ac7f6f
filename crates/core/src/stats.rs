//! Arithmetic shared by the counters and the result summary.

/// Division with the harness-wide zero policy: a zero denominator yields 0.
///
/// Used for every derived rate (GB/sec, IOPS, GB per IO-second) so that a run
/// too fast to register any elapsed or I/O time never aborts the benchmark.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator). NaN for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn safe_div_zero_denominator() {
        assert_eq!(safe_div(5.0, 0.0), 0.0);
        assert_eq!(safe_div(0.0, 0.0), 0.0);
        assert_eq!(safe_div(3.0, 2.0), 1.5);
    }

    #[test]
    fn mean_and_std_of_known_series() {
        let runtimes = [1.0, 2.0, 3.0];
        assert_eq!(mean(&runtimes), Some(2.0));
        assert!((sample_std(&runtimes) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_inputs() {
        assert_eq!(mean(&[]), None);
        assert!(sample_std(&[]).is_nan());
        assert!(sample_std(&[4.2]).is_nan());
    }

    proptest! {
        #[test]
        fn safe_div_matches_plain_division_for_nonzero(n in -1e12f64..1e12, d in 1e-9f64..1e9) {
            prop_assert_eq!(safe_div(n, d), n / d);
        }

        #[test]
        fn std_of_constant_series_is_zero(v in -1e6f64..1e6, len in 2usize..20) {
            let values = vec![v; len];
            prop_assert!(sample_std(&values).abs() < 1e-6);
        }
    }
}
