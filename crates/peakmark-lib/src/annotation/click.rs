use super::AnnotationDocument;
use crate::error::{Error, Result};
use crate::signal::Channel;
use crate::window::WindowIndexer;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickMode {
    #[default]
    Add,
    Remove,
}

/// A click on a rendered window, as reported by the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    /// Channel or series name the click landed on, if the UI could tell.
    #[serde(default)]
    pub channel: Option<String>,
    /// Point index within the displayed window.
    pub local_index: usize,
    /// Time coordinate of the clicked point; derived from the sample when absent.
    #[serde(default)]
    pub time: Option<f64>,
    #[serde(default)]
    pub mode: ClickMode,
}

impl ClickEvent {
    pub fn new(channel: Channel, local_index: usize, mode: ClickMode) -> Self {
        Self {
            channel: Some(channel.name().to_string()),
            local_index,
            time: None,
            mode,
        }
    }

    /// Channel the click belongs to. Series names such as `ppg-base` or
    /// `ppg-manual-peaks` attribute to their channel.
    pub fn attributed_channel(&self) -> Option<Channel> {
        let name = self.channel.as_deref()?;
        let prefix = name.split('-').next().unwrap_or(name);
        prefix.parse().ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoOpReason {
    UnattributedClick,
    DuplicatePeak,
    NothingNearby,
    NoSubjectLoaded,
    UnknownLabel,
    WindowOutOfRange,
}

impl fmt::Display for NoOpReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            NoOpReason::UnattributedClick => "click is not on a channel",
            NoOpReason::DuplicatePeak => "a peak already exists at that sample",
            NoOpReason::NothingNearby => "no peak within tolerance",
            NoOpReason::NoSubjectLoaded => "no subject loaded",
            NoOpReason::UnknownLabel => "label is not in the vocabulary",
            NoOpReason::WindowOutOfRange => "window index is past the last window",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClickOutcome {
    Added {
        channel: Channel,
        sample: usize,
        time: f64,
    },
    Removed {
        channel: Channel,
        sample: usize,
        count: usize,
    },
    NoOp {
        reason: NoOpReason,
    },
}

impl ClickOutcome {
    pub fn is_noop(&self) -> bool {
        matches!(self, ClickOutcome::NoOp { .. })
    }
}

/// Apply `click` on `window` to the document.
///
/// Clicks that cannot be attributed to a channel, duplicate adds and
/// removals with nothing in reach are no-ops. A local index past the end of
/// the window is an error.
pub fn resolve_click(
    doc: &mut AnnotationDocument,
    indexer: &WindowIndexer,
    window: usize,
    click: &ClickEvent,
    tolerance: usize,
) -> Result<ClickOutcome> {
    let Some(channel) = click.attributed_channel() else {
        return Ok(ClickOutcome::NoOp {
            reason: NoOpReason::UnattributedClick,
        });
    };
    if click.local_index >= indexer.window_samples() {
        return Err(Error::InvalidClick {
            local_index: click.local_index,
            window_samples: indexer.window_samples(),
        });
    }
    let sample = indexer.local_to_sample(window, click.local_index);
    Ok(match click.mode {
        ClickMode::Add => {
            let time = click
                .time
                .filter(|t| t.is_finite())
                .unwrap_or_else(|| indexer.sample_to_time(sample));
            if doc.add_peak(channel, sample, time) {
                ClickOutcome::Added {
                    channel,
                    sample,
                    time,
                }
            } else {
                ClickOutcome::NoOp {
                    reason: NoOpReason::DuplicatePeak,
                }
            }
        }
        ClickMode::Remove => match doc.remove_peaks_near(channel, sample, tolerance) {
            0 => ClickOutcome::NoOp {
                reason: NoOpReason::NothingNearby,
            },
            count => ClickOutcome::Removed {
                channel,
                sample,
                count,
            },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ix() -> WindowIndexer {
        WindowIndexer::default()
    }

    #[test]
    fn add_maps_local_index_into_window() {
        let mut doc = AnnotationDocument::new();
        let mut click = ClickEvent::new(Channel::Ppg, 10, ClickMode::Add);
        click.time = Some(20.08);
        let out = resolve_click(&mut doc, &ix(), 2, &click, 1).unwrap();
        assert_eq!(
            out,
            ClickOutcome::Added {
                channel: Channel::Ppg,
                sample: 2510,
                time: 20.08
            }
        );
        assert_eq!(doc.ppg.samples(), &[2510]);

        let again = resolve_click(&mut doc, &ix(), 2, &click, 1).unwrap();
        assert_eq!(
            again,
            ClickOutcome::NoOp {
                reason: NoOpReason::DuplicatePeak
            }
        );
    }

    #[test]
    fn missing_time_falls_back_to_sample_time() {
        let mut doc = AnnotationDocument::new();
        let click = ClickEvent::new(Channel::Ecg, 125, ClickMode::Add);
        resolve_click(&mut doc, &ix(), 0, &click, 1).unwrap();
        assert_eq!(doc.ecg.times(), &[1.0]);
    }

    #[test]
    fn remove_reports_count_or_noop() {
        let mut doc = AnnotationDocument::new();
        doc.add_peak(Channel::Abp, 1300, 10.4);
        doc.add_peak(Channel::Abp, 1301, 10.408);
        let click = ClickEvent::new(Channel::Abp, 50, ClickMode::Remove);
        let out = resolve_click(&mut doc, &ix(), 1, &click, 1).unwrap();
        assert_eq!(
            out,
            ClickOutcome::Removed {
                channel: Channel::Abp,
                sample: 1300,
                count: 2
            }
        );
        let out = resolve_click(&mut doc, &ix(), 1, &click, 1).unwrap();
        assert!(out.is_noop());
    }

    #[test]
    fn unattributed_click_is_noop() {
        let mut doc = AnnotationDocument::new();
        let mut click = ClickEvent::new(Channel::Ecg, 3, ClickMode::Add);
        click.channel = None;
        let out = resolve_click(&mut doc, &ix(), 0, &click, 1).unwrap();
        assert_eq!(
            out,
            ClickOutcome::NoOp {
                reason: NoOpReason::UnattributedClick
            }
        );
        click.channel = Some("respiration".into());
        assert!(resolve_click(&mut doc, &ix(), 0, &click, 1).unwrap().is_noop());
        assert_eq!(doc.total_peaks(), 0);
    }

    #[test]
    fn series_names_attribute_to_channel() {
        let mut click = ClickEvent::new(Channel::Ecg, 0, ClickMode::Add);
        click.channel = Some("ppg-manual-peaks".into());
        assert_eq!(click.attributed_channel(), Some(Channel::Ppg));
        click.channel = Some("bp".into());
        assert_eq!(click.attributed_channel(), Some(Channel::Abp));
    }

    #[test]
    fn index_past_window_is_error() {
        let mut doc = AnnotationDocument::new();
        let click = ClickEvent::new(Channel::Ecg, 1250, ClickMode::Add);
        let err = resolve_click(&mut doc, &ix(), 0, &click, 1).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidClick {
                local_index: 1250,
                window_samples: 1250
            }
        ));
    }

    #[test]
    fn click_json_defaults() {
        let click: ClickEvent =
            serde_json::from_str(r#"{"channel":"ecg","local_index":4}"#).unwrap();
        assert_eq!(click.mode, ClickMode::Add);
        assert_eq!(click.time, None);
        let outcome = serde_json::to_value(ClickOutcome::NoOp {
            reason: NoOpReason::NothingNearby,
        })
        .unwrap();
        assert_eq!(
            outcome,
            serde_json::json!({"outcome": "no_op", "reason": "nothing_nearby"})
        );
    }
}
