//! Manual peak annotations and window labels for one subject.
//!
//! Every channel keeps its peaks as two parallel lists, sample indices and
//! times, sorted by sample index with no duplicates. [`PeakList`] owns that
//! invariant: the only ways to change a list are its insert and removal
//! methods, and deserialization re-sorts whatever it is handed.

pub mod click;

pub use click::{resolve_click, ClickEvent, ClickMode, ClickOutcome, NoOpReason};

use crate::signal::Channel;
use crate::window::WindowIndexer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;

/// Peaks of one channel, ordered by sample index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PeakListRepr", into = "PeakListRepr")]
pub struct PeakList {
    samples: Vec<usize>,
    times: Vec<f64>,
}

#[derive(Serialize, Deserialize)]
struct PeakListRepr {
    #[serde(default)]
    sample_peak_positions: Vec<usize>,
    #[serde(default)]
    time_peak_positions: Vec<f64>,
}

impl TryFrom<PeakListRepr> for PeakList {
    type Error = String;

    fn try_from(repr: PeakListRepr) -> Result<Self, Self::Error> {
        if repr.sample_peak_positions.len() != repr.time_peak_positions.len() {
            return Err(format!(
                "{} sample positions paired with {} time positions",
                repr.sample_peak_positions.len(),
                repr.time_peak_positions.len()
            ));
        }
        let mut pairs: Vec<(usize, f64)> = repr
            .sample_peak_positions
            .into_iter()
            .zip(repr.time_peak_positions)
            .collect();
        // stable, so the first of any duplicate survives dedup
        pairs.sort_by_key(|(s, _)| *s);
        pairs.dedup_by_key(|(s, _)| *s);
        Ok(pairs.into_iter().collect())
    }
}

impl From<PeakList> for PeakListRepr {
    fn from(list: PeakList) -> Self {
        Self {
            sample_peak_positions: list.samples,
            time_peak_positions: list.times,
        }
    }
}

impl FromIterator<(usize, f64)> for PeakList {
    fn from_iter<I: IntoIterator<Item = (usize, f64)>>(iter: I) -> Self {
        let mut list = PeakList::new();
        for (sample, time) in iter {
            list.insert(sample, time);
        }
        list
    }
}

impl PeakList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[usize] {
        &self.samples
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.samples.iter().copied().zip(self.times.iter().copied())
    }

    pub fn contains(&self, sample: usize) -> bool {
        self.samples.binary_search(&sample).is_ok()
    }

    /// Insert a peak at its sorted position. Returns `false` when a peak
    /// already sits on `sample`; the stored time is then left alone.
    pub fn insert(&mut self, sample: usize, time: f64) -> bool {
        match self.samples.binary_search(&sample) {
            Ok(_) => false,
            Err(pos) => {
                self.samples.insert(pos, sample);
                self.times.insert(pos, time);
                true
            }
        }
    }

    /// Remove every peak within `tolerance` samples of `sample`.
    pub fn remove_near(&mut self, sample: usize, tolerance: usize) -> usize {
        let lo = sample.saturating_sub(tolerance);
        let hi = sample.saturating_add(tolerance).saturating_add(1);
        self.remove_range(lo..hi)
    }

    /// Remove every peak whose sample index lies in `range`.
    pub fn remove_range(&mut self, range: Range<usize>) -> usize {
        let span = self.span(&range);
        let removed = span.len();
        self.samples.drain(span.clone());
        self.times.drain(span);
        removed
    }

    /// Copy of the peaks whose sample index lies in `range`.
    pub fn in_range(&self, range: Range<usize>) -> PeakList {
        let span = self.span(&range);
        PeakList {
            samples: self.samples[span.clone()].to_vec(),
            times: self.times[span].to_vec(),
        }
    }

    fn span(&self, range: &Range<usize>) -> Range<usize> {
        let lo = self.samples.partition_point(|s| *s < range.start);
        let hi = self.samples.partition_point(|s| *s < range.end).max(lo);
        lo..hi
    }
}

/// Everything the user has marked for the active subject.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDocument {
    /// Label per window index
    #[serde(default)]
    pub window_labels: BTreeMap<usize, String>,
    #[serde(default)]
    pub ecg: PeakList,
    #[serde(default)]
    pub ppg: PeakList,
    #[serde(default)]
    pub abp: PeakList,
}

impl AnnotationDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to the empty template.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn peaks(&self, channel: Channel) -> &PeakList {
        match channel {
            Channel::Ecg => &self.ecg,
            Channel::Ppg => &self.ppg,
            Channel::Abp => &self.abp,
        }
    }

    fn peaks_mut(&mut self, channel: Channel) -> &mut PeakList {
        match channel {
            Channel::Ecg => &mut self.ecg,
            Channel::Ppg => &mut self.ppg,
            Channel::Abp => &mut self.abp,
        }
    }

    pub fn add_peak(&mut self, channel: Channel, sample: usize, time: f64) -> bool {
        self.peaks_mut(channel).insert(sample, time)
    }

    pub fn remove_peaks_near(&mut self, channel: Channel, sample: usize, tolerance: usize) -> usize {
        self.peaks_mut(channel).remove_near(sample, tolerance)
    }

    /// Drop the peaks of every channel inside `window`. Labels are kept.
    pub fn clear_window(&mut self, indexer: &WindowIndexer, window: usize) -> usize {
        let range = indexer.range(window);
        Channel::ALL
            .iter()
            .map(|ch| self.peaks_mut(*ch).remove_range(range.clone()))
            .sum()
    }

    /// Label `window`; an empty value removes its label.
    pub fn set_window_label(&mut self, window: usize, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.window_labels.remove(&window);
        } else {
            self.window_labels.insert(window, value);
        }
    }

    pub fn clear_window_label(&mut self, window: usize) -> Option<String> {
        self.window_labels.remove(&window)
    }

    pub fn window_label(&self, window: usize) -> Option<&str> {
        self.window_labels.get(&window).map(String::as_str)
    }

    pub fn filter_for_window(&self, indexer: &WindowIndexer, window: usize) -> WindowAnnotations {
        let range = indexer.range(window);
        WindowAnnotations {
            window_index: window,
            window_label: self.window_label(window).unwrap_or_default().to_string(),
            signals: Channel::ALL
                .iter()
                .map(|ch| (*ch, self.peaks(*ch).in_range(range.clone())))
                .collect(),
        }
    }

    pub fn total_peaks(&self) -> usize {
        Channel::ALL.iter().map(|ch| self.peaks(*ch).len()).sum()
    }
}

/// Read-only view of one window: its label and the peaks inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowAnnotations {
    pub window_index: usize,
    /// Empty when the window carries no label
    pub window_label: String,
    pub signals: BTreeMap<Channel, PeakList>,
}

impl WindowAnnotations {
    pub fn peaks(&self, channel: Channel) -> Option<&PeakList> {
        self.signals.get(&channel)
    }

    pub fn is_empty(&self) -> bool {
        self.signals.values().all(PeakList::is_empty)
    }
}
