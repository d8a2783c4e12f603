//! Running cross track error statistics

use serde::Serialize;

/// Running mean of the cross track error over the enabled control cycles.
///
/// This is diagnostic only and never read back by the controllers.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CteStats {
    /// Number of enabled cycles seen
    pub num_samples: u64,

    /// Mean cross track error over those cycles
    ///
    /// Units: meters
    pub mean_cte_m: f64,
}

impl CteStats {
    /// Add a sample to the running mean.
    pub fn update(&mut self, cte_m: f64) {
        self.num_samples += 1;
        self.mean_cte_m += (cte_m - self.mean_cte_m) / self.num_samples as f64;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_running_mean() {
        let mut stats = CteStats::default();
        assert_eq!(stats.num_samples, 0);
        assert_eq!(stats.mean_cte_m, 0.0);

        let samples = [0.5, -1.0, 2.0, 0.25, 3.0];
        for (i, s) in samples.iter().enumerate() {
            stats.update(*s);

            let expected: f64 = samples[..=i].iter().sum::<f64>() / (i + 1) as f64;
            assert!((stats.mean_cte_m - expected).abs() < 1e-12);
        }

        assert_eq!(stats.num_samples, samples.len() as u64);
    }
}
