use crate::utils::safe_cast::count_to_f64;

/// Removes slow illumination drift with a centered moving average, then
/// subtracts the mean of the result.
///
/// Samples near either end average over a truncated window instead of padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detrender {
    window_size: usize,
}

impl Detrender {
    /// Create a detrender averaging over `window_size` samples
    ///
    /// # Panics
    ///
    /// Panics if `window_size` is zero
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        assert!(window_size > 0, "Window size must be greater than 0");
        Self { window_size }
    }

    #[must_use]
    pub const fn window_size(&self) -> usize {
        self.window_size
    }

    /// Subtract the centered moving average from every sample
    #[must_use]
    pub fn detrend(&self, values: &[f64]) -> Vec<f64> {
        let n = values.len();
        let half = self.window_size / 2;

        // prefix[i] = sum of values[..i]
        let mut prefix = Vec::with_capacity(n + 1);
        prefix.push(0.0);
        for value in values {
            let last = prefix.last().copied().unwrap_or(0.0);
            prefix.push(last + value);
        }

        values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let lo = i.saturating_sub(half);
                let hi = (i + half + 1).min(n);
                let average = (prefix[hi] - prefix[lo]) / count_to_f64(hi - lo);
                value - average
            })
            .collect()
    }

    /// Detrend and shift to zero mean
    #[must_use]
    pub fn apply(&self, values: &[f64]) -> Vec<f64> {
        let mut detrended = self.detrend(values);
        zero_mean(&mut detrended);
        detrended
    }
}

/// Subtract the mean in place
pub fn zero_mean(values: &mut [f64]) {
    if values.is_empty() {
        return;
    }
    let mean = values.iter().sum::<f64>() / count_to_f64(values.len());
    for value in values.iter_mut() {
        *value -= mean;
    }
}
