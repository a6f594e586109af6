//! Standard errors for aggregated metrics.

use rand::Rng;

use crate::metrics::mean;

/// Sample variance (n - 1 denominator). 0 for fewer than two values.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Sample standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Standard error of the mean.
pub fn standard_error(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    std_dev(values) / (values.len() as f64).sqrt()
}

/// Bootstrap estimate of the standard error of `statistic`.
///
/// Draws `iters` resamples of `items` with replacement and returns the sample
/// standard deviation of the statistic over the resamples.
pub fn bootstrap_stderr<T, F, R>(items: &[T], statistic: F, iters: usize, rng: &mut R) -> f64
where
    T: Clone,
    F: Fn(&[T]) -> f64,
    R: Rng + ?Sized,
{
    if items.is_empty() || iters < 2 {
        return 0.0;
    }

    let mut resample = Vec::with_capacity(items.len());
    let estimates: Vec<f64> = (0..iters)
        .map(|_| {
            resample.clear();
            for _ in 0..items.len() {
                let i = rng.random_range(0..items.len());
                resample.push(items[i].clone());
            }
            statistic(&resample)
        })
        .collect();

    std_dev(&estimates)
}
