//! Reconstruction error statistics reported by the `error_stat` plugin

use crate::pipeline::compression::library::Metrics;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorStats {
    pub n: usize,
    pub min: f64,
    pub max: f64,
    pub value_range: f64,
    pub max_error: f64,
    pub mse: f64,
    pub rmse: f64,
    /// Peak signal-to-noise ratio in dB; infinite for a lossless reconstruction
    pub psnr: f64,
}

impl ErrorStats {
    /// Compares `decoded` against `original` sample by sample.
    ///
    /// Returns `None` when the lengths differ or there is nothing to compare.
    pub fn compute(original: &[f64], decoded: &[f64]) -> Option<Self> {
        if original.len() != decoded.len() || original.is_empty() {
            return None;
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut max_error = 0.0f64;
        let mut sum_squared = 0.0f64;
        for (&o, &d) in original.iter().zip(decoded) {
            min = min.min(o);
            max = max.max(o);
            let diff = (o - d).abs();
            max_error = max_error.max(diff);
            sum_squared += diff * diff;
        }

        let n = original.len();
        let value_range = max - min;
        let mse = sum_squared / n as f64;
        let psnr = if mse == 0.0 {
            f64::INFINITY
        } else {
            20.0 * value_range.log10() - 10.0 * mse.log10()
        };

        Some(Self {
            n,
            min,
            max,
            value_range,
            max_error,
            mse,
            rmse: mse.sqrt(),
            psnr,
        })
    }

    pub fn insert_into(&self, metrics: &mut Metrics) {
        metrics.insert("error_stat:n".into(), (self.n as i64).into());
        metrics.insert("error_stat:min".into(), self.min.into());
        metrics.insert("error_stat:max".into(), self.max.into());
        metrics.insert("error_stat:value_range".into(), self.value_range.into());
        metrics.insert("error_stat:max_error".into(), self.max_error.into());
        metrics.insert("error_stat:mse".into(), self.mse.into());
        metrics.insert("error_stat:rmse".into(), self.rmse.into());
        metrics.insert("error_stat:psnr".into(), self.psnr.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        let original = [0.0, 10.0, 5.0, 5.0];
        let decoded = [1.0, 9.0, 5.0, 5.0];

        let stats = ErrorStats::compute(&original, &decoded).unwrap();

        assert_eq!(stats.n, 4);
        assert_eq!(stats.value_range, 10.0);
        assert_eq!(stats.max_error, 1.0);
        assert_eq!(stats.mse, 0.5);
        assert!((stats.rmse - 0.5f64.sqrt()).abs() < 1e-12);
        // 20*log10(10) - 10*log10(0.5)
        assert!((stats.psnr - (20.0 + 3.010299956639812)).abs() < 1e-9);
    }

    #[test]
    fn test_lossless_has_infinite_psnr() {
        let data = [1.0, 2.0, 3.0];

        let stats = ErrorStats::compute(&data, &data).unwrap();

        assert_eq!(stats.mse, 0.0);
        assert!(stats.psnr.is_infinite() && stats.psnr > 0.0);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(ErrorStats::compute(&[1.0], &[1.0, 2.0]).is_none());
        assert!(ErrorStats::compute(&[], &[]).is_none());
    }
}
