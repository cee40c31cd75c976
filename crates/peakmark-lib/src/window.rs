use serde::Serialize;
use std::ops::Range;

/// Arithmetic between sample indices, seconds and window indices.
///
/// Window `w` covers samples `[w * W, (w + 1) * W)` where `W` is
/// [`WindowIndexer::window_samples`]. Window indices live in
/// `[0, num_windows - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowIndexer {
    fs: f64,
    window_samples: usize,
    num_windows: usize,
}

impl Default for WindowIndexer {
    fn default() -> Self {
        Self::new(125.0, 1250, 180)
    }
}

impl WindowIndexer {
    pub fn new(fs: f64, window_samples: usize, num_windows: usize) -> Self {
        Self {
            fs,
            window_samples: window_samples.max(1),
            num_windows: num_windows.max(1),
        }
    }

    pub fn from_seconds(fs: f64, window_seconds: f64, num_windows: usize) -> Self {
        let window_samples = (window_seconds * fs).round().max(1.0) as usize;
        Self::new(fs, window_samples, num_windows)
    }

    pub fn fs(&self) -> f64 {
        self.fs
    }

    pub fn window_samples(&self) -> usize {
        self.window_samples
    }

    pub fn num_windows(&self) -> usize {
        self.num_windows
    }

    pub fn last_window(&self) -> usize {
        self.num_windows - 1
    }

    pub fn window_seconds(&self) -> f64 {
        self.window_samples as f64 / self.fs
    }

    /// Sample bounds of `window`; saturates instead of overflowing for
    /// absurd indices.
    pub fn bounds(&self, window: usize) -> (usize, usize) {
        let start = window.saturating_mul(self.window_samples);
        (start, start.saturating_add(self.window_samples))
    }

    pub fn range(&self, window: usize) -> Range<usize> {
        let (start, end) = self.bounds(window);
        start..end
    }

    pub fn contains(&self, window: usize, sample: usize) -> bool {
        self.range(window).contains(&sample)
    }

    pub fn sample_to_window(&self, sample: usize) -> usize {
        sample / self.window_samples
    }

    /// Window holding `seconds`, clamped into the valid index range.
    pub fn time_to_window(&self, seconds: f64) -> usize {
        if seconds.is_nan() || seconds <= 0.0 {
            return 0;
        }
        let window = (seconds * self.fs / self.window_samples as f64).floor();
        if window >= self.num_windows as f64 {
            self.last_window()
        } else {
            window as usize
        }
    }

    pub fn clamp(&self, index: i64) -> usize {
        index.clamp(0, self.last_window() as i64) as usize
    }

    pub fn local_to_sample(&self, window: usize, local: usize) -> usize {
        self.bounds(window).0.saturating_add(local)
    }

    pub fn sample_to_time(&self, sample: usize) -> f64 {
        sample as f64 / self.fs
    }

    pub fn window_start_time(&self, window: usize) -> f64 {
        self.sample_to_time(self.bounds(window).0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_follow_window_length() {
        let ix = WindowIndexer::default();
        assert_eq!(ix.window_samples(), 1250);
        assert_eq!(ix.bounds(0), (0, 1250));
        assert_eq!(ix.bounds(4), (5000, 6250));
        assert!(ix.contains(4, 5000));
        assert!(!ix.contains(4, 6250));
        assert!(ix.contains(5, 6250));
    }

    #[test]
    fn huge_indices_saturate() {
        let ix = WindowIndexer::default();
        assert_eq!(ix.bounds(usize::MAX), (usize::MAX, usize::MAX));
        assert!(ix.range(usize::MAX).is_empty());
        assert_eq!(ix.local_to_sample(usize::MAX, 3), usize::MAX);
    }

    #[test]
    fn sample_and_time_map_to_windows() {
        let ix = WindowIndexer::default();
        assert_eq!(ix.sample_to_window(0), 0);
        assert_eq!(ix.sample_to_window(1249), 0);
        assert_eq!(ix.sample_to_window(1250), 1);
        assert_eq!(ix.time_to_window(9.99), 0);
        assert_eq!(ix.time_to_window(10.0), 1);
        assert_eq!(ix.time_to_window(40.0), 4);
        assert_eq!(ix.time_to_window(1.0e9), 179);
        assert_eq!(ix.time_to_window(f64::NAN), 0);
        assert_eq!(ix.time_to_window(f64::INFINITY), 179);
    }

    #[test]
    fn clamp_handles_both_ends() {
        let ix = WindowIndexer::default();
        assert_eq!(ix.clamp(-3), 0);
        assert_eq!(ix.clamp(17), 17);
        assert_eq!(ix.clamp(180), 179);
    }

    #[test]
    fn from_seconds_rounds_to_whole_samples() {
        let ix = WindowIndexer::from_seconds(125.0, 10.0, 180);
        assert_eq!(ix.window_samples(), 1250);
        assert!((ix.window_seconds() - 10.0).abs() < 1e-12);
        assert_eq!(ix.local_to_sample(2, 10), 2510);
        assert!((ix.window_start_time(3) - 30.0).abs() < 1e-12);
    }
}
