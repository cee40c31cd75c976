//! Per-session annotator state and the UI event dispatcher.
//!
//! A [`Session`] owns everything one user is looking at: the selected
//! subject, the window index, the annotation document, the navigation
//! controls and a bounded cache of fetched windows. Sessions never share
//! mutable state; several of them may read from one backend through
//! `Arc<S>`.

use crate::annotation::{
    resolve_click, AnnotationDocument, ClickEvent, ClickOutcome, NoOpReason, WindowAnnotations,
};
use crate::config::AnnotatorConfig;
use crate::error::{Result, SerializeError};
use crate::io::source::SignalSource;
use crate::navigation::{Direction, NavEvent, Navigator, Timestamp};
use crate::plot::{overlay_annotations, window_figure, Figure};
use crate::signal::WindowSlice;
use crate::value::SubjectMetadata;
use crate::window::WindowIndexer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Discrete events emitted by a front end.
///
/// Navigation timestamps are optional; events without one are stamped by
/// the session in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UiEvent {
    LoadSubject {
        subject_id: String,
    },
    Navigate {
        direction: Direction,
        #[serde(default)]
        timestamp: Option<Timestamp>,
    },
    Jump {
        #[serde(default)]
        seconds: Option<f64>,
        #[serde(default)]
        timestamp: Option<Timestamp>,
    },
    Click(ClickEvent),
    /// Remove every peak in a window (the current one when omitted).
    ClearAll {
        #[serde(default)]
        window: Option<usize>,
    },
    SetLabel {
        #[serde(default)]
        window: Option<usize>,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EventOutcome {
    SubjectLoaded { subject_id: String, window: usize },
    Navigated { from: usize, to: usize },
    Annotated { click: ClickOutcome },
    Cleared { window: usize, removed: usize },
    Labelled { window: usize, label: String },
    NoOp { reason: NoOpReason },
}

impl EventOutcome {
    fn noop(reason: NoOpReason) -> Self {
        EventOutcome::NoOp { reason }
    }
}

/// Everything a front end needs to redraw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub subject_id: Option<String>,
    pub window_index: usize,
    pub document: AnnotationDocument,
    pub inspection: WindowAnnotations,
}

#[derive(Debug, Default)]
struct SubjectCache {
    metadata: Option<SubjectMetadata>,
    windows: BTreeMap<usize, Arc<WindowSlice>>,
}

pub struct Session<S: SignalSource> {
    source: S,
    config: AnnotatorConfig,
    indexer: WindowIndexer,
    subject: Option<String>,
    window: usize,
    document: AnnotationDocument,
    navigator: Navigator,
    clock: Timestamp,
    cache: HashMap<String, SubjectCache>,
}

impl<S: SignalSource> Session<S> {
    pub fn new(source: S, config: AnnotatorConfig) -> Self {
        let indexer = config.indexer();
        let navigator = Navigator::new(config.on_load);
        Self {
            source,
            config,
            indexer,
            subject: None,
            window: 0,
            document: AnnotationDocument::new(),
            navigator,
            clock: 0,
            cache: HashMap::new(),
        }
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    pub fn indexer(&self) -> &WindowIndexer {
        &self.indexer
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn document(&self) -> &AnnotationDocument {
        &self.document
    }

    pub fn subject_ids(&self) -> Result<Vec<String>> {
        Ok(self.source.subject_ids()?)
    }

    /// Apply one UI event.
    pub fn dispatch(&mut self, event: UiEvent) -> Result<EventOutcome> {
        log::debug!("dispatch {:?}", event);
        let subject = match (&event, self.subject.clone()) {
            (UiEvent::LoadSubject { subject_id }, _) => return self.load_subject(subject_id),
            (_, Some(subject)) => subject,
            (_, None) => {
                log::debug!("ignoring event: no subject loaded");
                return Ok(EventOutcome::noop(NoOpReason::NoSubjectLoaded));
            }
        };
        match event {
            UiEvent::LoadSubject { subject_id } => self.load_subject(&subject_id),
            UiEvent::Navigate {
                direction,
                timestamp,
            } => {
                let timestamp = self.stamp(timestamp);
                self.navigate(&subject, NavEvent::step(direction, timestamp))
            }
            UiEvent::Jump { seconds, timestamp } => {
                let timestamp = self.stamp(timestamp);
                self.navigate(&subject, NavEvent::Jump { seconds, timestamp })
            }
            UiEvent::Click(click) => {
                let outcome = resolve_click(
                    &mut self.document,
                    &self.indexer,
                    self.window,
                    &click,
                    self.config.remove_tolerance,
                )?;
                if let ClickOutcome::NoOp { reason } = &outcome {
                    log::debug!("click ignored: {}", reason);
                }
                Ok(EventOutcome::Annotated { click: outcome })
            }
            UiEvent::ClearAll { window } => {
                let window = window.unwrap_or(self.window);
                if window >= self.indexer.num_windows() {
                    log::warn!("clear_all: window {} is out of range", window);
                    return Ok(EventOutcome::noop(NoOpReason::WindowOutOfRange));
                }
                let removed = self.document.clear_window(&self.indexer, window);
                log::debug!("cleared {} peaks from window {}", removed, window);
                Ok(EventOutcome::Cleared { window, removed })
            }
            UiEvent::SetLabel { window, value } => {
                let window = window.unwrap_or(self.window);
                if window >= self.indexer.num_windows() {
                    log::warn!("set_label: window {} is out of range", window);
                    return Ok(EventOutcome::noop(NoOpReason::WindowOutOfRange));
                }
                if !value.is_empty() && !self.config.accepts_label(&value) {
                    log::warn!(
                        "label '{}' is not one of {:?}; window {} unchanged",
                        value,
                        self.config.labels,
                        window
                    );
                    return Ok(EventOutcome::noop(NoOpReason::UnknownLabel));
                }
                self.document.set_window_label(window, value.clone());
                Ok(EventOutcome::Labelled {
                    window,
                    label: value,
                })
            }
        }
    }

    /// Select `subject_id`, discarding every annotation of the previous one.
    ///
    /// The first window is fetched before any state changes, so a failed
    /// load leaves the session as it was.
    pub fn load_subject(&mut self, subject_id: &str) -> Result<EventOutcome> {
        let mut navigator = self.navigator.clone();
        let target = navigator.apply(NavEvent::SubjectLoaded, self.window, &self.indexer);
        self.fetch_window(subject_id, target)?;
        self.navigator = navigator;
        self.subject = Some(subject_id.to_string());
        self.window = target;
        self.document.reset();
        log::info!("subject '{}' loaded at window {}", subject_id, target);
        Ok(EventOutcome::SubjectLoaded {
            subject_id: subject_id.to_string(),
            window: target,
        })
    }

    fn navigate(&mut self, subject: &str, event: NavEvent) -> Result<EventOutcome> {
        let from = self.window;
        let to = self.navigator.apply(event, from, &self.indexer);
        if to != from {
            self.fetch_window(subject, to)?;
            self.window = to;
        }
        log::debug!("window {} -> {}", from, to);
        Ok(EventOutcome::Navigated { from, to })
    }

    /// Show `window` directly, clamped into range. Navigation controls keep
    /// their timestamps.
    pub fn go_to_window(&mut self, window: usize) -> Result<EventOutcome> {
        let Some(subject) = self.subject.clone() else {
            return Ok(EventOutcome::noop(NoOpReason::NoSubjectLoaded));
        };
        let from = self.window;
        let to = window.min(self.indexer.last_window());
        self.fetch_window(&subject, to)?;
        self.window = to;
        Ok(EventOutcome::Navigated { from, to })
    }

    fn stamp(&mut self, timestamp: Option<Timestamp>) -> Timestamp {
        let stamps = self.navigator.stamps();
        let latest = stamps.prev.max(stamps.next).max(stamps.jump).max(self.clock);
        let ts = timestamp.unwrap_or(latest + 1);
        self.clock = latest.max(ts);
        ts
    }

    fn fetch_window(&mut self, subject: &str, window: usize) -> Result<Arc<WindowSlice>> {
        let entry = self.cache.entry(subject.to_string()).or_default();
        if let Some(hit) = entry.windows.get(&window) {
            log::debug!("cache hit: '{}' window {}", subject, window);
            return Ok(Arc::clone(hit));
        }
        let slice = Arc::new(self.source.load_window(subject, window, &self.indexer)?);
        entry.windows.insert(window, Arc::clone(&slice));
        while entry.windows.len() > self.config.cache_windows {
            let farthest = entry
                .windows
                .keys()
                .copied()
                .max_by_key(|k| k.abs_diff(window));
            match farthest {
                Some(k) if k != window => {
                    entry.windows.remove(&k);
                }
                _ => break,
            }
        }
        Ok(slice)
    }

    /// Slice of the window on screen, if a subject is loaded.
    pub fn current_window(&mut self) -> Result<Option<Arc<WindowSlice>>> {
        match self.subject.clone() {
            Some(subject) => Ok(Some(self.fetch_window(&subject, self.window)?)),
            None => Ok(None),
        }
    }

    pub fn cached_windows(&self, subject: &str) -> usize {
        self.cache.get(subject).map_or(0, |c| c.windows.len())
    }

    /// Label and peaks of the window on screen.
    pub fn inspection(&self) -> WindowAnnotations {
        self.document.filter_for_window(&self.indexer, self.window)
    }

    /// Current window with its peak markers.
    pub fn figure(&mut self) -> Result<Option<Figure>> {
        let Some(slice) = self.current_window()? else {
            return Ok(None);
        };
        let mut fig = window_figure(&slice);
        overlay_annotations(&mut fig, &self.inspection(), slice.start);
        Ok(Some(fig))
    }

    pub fn subject_metadata(&mut self, subject: &str) -> Result<Value> {
        let entry = self.cache.entry(subject.to_string()).or_default();
        let metadata = match entry.metadata.take() {
            Some(meta) => meta,
            None => self.source.load_subject_metadata(subject)?,
        };
        let json = metadata.to_json();
        entry.metadata = Some(metadata);
        Ok(json?)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            subject_id: self.subject.clone(),
            window_index: self.window,
            document: self.document.clone(),
            inspection: self.inspection(),
        }
    }

    pub fn snapshot_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.snapshot()).map_err(SerializeError::from)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::ClickMode;
    use crate::config::LoadNavigation;
    use crate::error::{DataError, Error};
    use crate::io::source::{MemorySource, Recording};
    use crate::signal::Channel;
    use serde_json::json;

    fn config() -> AnnotatorConfig {
        AnnotatorConfig {
            fs: 10.0,
            window_seconds: 1.0,
            num_windows: 5,
            cache_windows: 2,
            ..AnnotatorConfig::default()
        }
    }

    fn recording(n: usize) -> Recording {
        let ramp = |k: f64| (0..n).map(|i| i as f64 * k).collect::<Vec<_>>();
        Recording::from_samples(10.0, ramp(1.0), ramp(2.0), ramp(3.0))
    }

    fn source() -> MemorySource {
        MemorySource::new()
            .with_subject("s1", recording(45))
            .with_subject("s2", recording(25))
    }

    fn next() -> UiEvent {
        UiEvent::Navigate {
            direction: Direction::Next,
            timestamp: None,
        }
    }

    fn click(channel: &str, local_index: usize, mode: ClickMode) -> UiEvent {
        UiEvent::Click(ClickEvent {
            channel: Some(channel.into()),
            local_index,
            time: None,
            mode,
        })
    }

    fn load(id: &str) -> UiEvent {
        UiEvent::LoadSubject {
            subject_id: id.into(),
        }
    }

    #[test]
    fn events_without_subject_are_noops() {
        let mut session = Session::new(source(), config());
        let noop = EventOutcome::noop(NoOpReason::NoSubjectLoaded);
        assert_eq!(session.dispatch(next()).unwrap(), noop);
        assert_eq!(session.dispatch(click("ecg", 1, ClickMode::Add)).unwrap(), noop);
        assert_eq!(session.figure().unwrap(), None);
        assert_eq!(session.document().total_peaks(), 0);
    }

    #[test]
    fn load_resets_document_and_window() {
        let mut session = Session::new(source(), config());
        session.dispatch(load("s1")).unwrap();
        session.dispatch(next()).unwrap();
        session.dispatch(next()).unwrap();
        session.dispatch(click("ecg", 3, ClickMode::Add)).unwrap();
        session
            .dispatch(UiEvent::SetLabel {
                window: None,
                value: "noisy".into(),
            })
            .unwrap();
        assert_eq!(session.window(), 2);

        let outcome = session.dispatch(load("s2")).unwrap();
        assert_eq!(
            outcome,
            EventOutcome::SubjectLoaded {
                subject_id: "s2".into(),
                window: 0
            }
        );
        assert_eq!(session.window(), 0);
        assert_eq!(session.document(), &AnnotationDocument::new());
    }

    #[test]
    fn advance_policy_steps_on_load() {
        let cfg = AnnotatorConfig {
            on_load: LoadNavigation::Advance,
            ..config()
        };
        let mut session = Session::new(source(), cfg);
        session.dispatch(load("s1")).unwrap();
        assert_eq!(session.window(), 1);
    }

    #[test]
    fn navigation_with_and_without_timestamps() {
        let mut session = Session::new(source(), config());
        session.dispatch(load("s1")).unwrap();
        assert_eq!(
            session.dispatch(next()).unwrap(),
            EventOutcome::Navigated { from: 0, to: 1 }
        );
        session
            .dispatch(UiEvent::Jump {
                seconds: Some(3.5),
                timestamp: None,
            })
            .unwrap();
        assert_eq!(session.window(), 3);
        session
            .dispatch(UiEvent::Jump {
                seconds: Some(-5.0),
                timestamp: None,
            })
            .unwrap();
        assert_eq!(session.window(), 3);
        session
            .dispatch(UiEvent::Navigate {
                direction: Direction::Prev,
                timestamp: None,
            })
            .unwrap();
        assert_eq!(session.window(), 2);

        // explicit stale timestamp: the jump stays the latest control
        session
            .dispatch(UiEvent::Jump {
                seconds: Some(40.0),
                timestamp: Some(1_000),
            })
            .unwrap();
        assert_eq!(session.window(), 4);
        session
            .dispatch(UiEvent::Navigate {
                direction: Direction::Prev,
                timestamp: Some(10),
            })
            .unwrap();
        assert_eq!(session.window(), 4);
    }

    #[test]
    fn click_flow_updates_inspection() {
        let mut session = Session::new(source(), config());
        session.dispatch(load("s1")).unwrap();
        session.dispatch(next()).unwrap();
        let out = session.dispatch(click("ppg-base", 4, ClickMode::Add)).unwrap();
        assert_eq!(
            out,
            EventOutcome::Annotated {
                click: ClickOutcome::Added {
                    channel: Channel::Ppg,
                    sample: 14,
                    time: 1.4
                }
            }
        );
        session.dispatch(click("ppg", 6, ClickMode::Add)).unwrap();
        let view = session.inspection();
        assert_eq!(view.window_index, 1);
        assert_eq!(view.peaks(Channel::Ppg).unwrap().samples(), &[14, 16]);

        session.dispatch(click("ppg", 5, ClickMode::Remove)).unwrap();
        assert!(session.inspection().is_empty());

        let err = session.dispatch(click("ecg", 10, ClickMode::Add)).unwrap_err();
        assert!(matches!(err, Error::InvalidClick { .. }));
        let ignored = session
            .dispatch(UiEvent::Click(ClickEvent {
                channel: None,
                local_index: 1,
                time: None,
                mode: ClickMode::Add,
            }))
            .unwrap();
        assert_eq!(
            ignored,
            EventOutcome::Annotated {
                click: ClickOutcome::NoOp {
                    reason: NoOpReason::UnattributedClick
                }
            }
        );
    }

    #[test]
    fn clear_all_only_touches_target_window() {
        let mut session = Session::new(source(), config());
        session.dispatch(load("s1")).unwrap();
        session.dispatch(click("abp", 2, ClickMode::Add)).unwrap();
        session.dispatch(next()).unwrap();
        session.dispatch(click("abp", 2, ClickMode::Add)).unwrap();
        session.dispatch(click("ecg", 9, ClickMode::Add)).unwrap();
        let out = session.dispatch(UiEvent::ClearAll { window: None }).unwrap();
        assert_eq!(out, EventOutcome::Cleared { window: 1, removed: 2 });
        assert_eq!(session.document().abp.samples(), &[2]);
    }

    #[test]
    fn window_targets_past_the_end_are_ignored() {
        let mut session = Session::new(source(), config());
        session.dispatch(load("s1")).unwrap();
        session.dispatch(click("ppg", 3, ClickMode::Add)).unwrap();
        let out_of_range = EventOutcome::noop(NoOpReason::WindowOutOfRange);
        for window in [5, 999, usize::MAX] {
            let clear = UiEvent::ClearAll {
                window: Some(window),
            };
            assert_eq!(session.dispatch(clear).unwrap(), out_of_range);
            let label = UiEvent::SetLabel {
                window: Some(window),
                value: "noisy".into(),
            };
            assert_eq!(session.dispatch(label).unwrap(), out_of_range);
        }
        assert!(session.document().window_labels.is_empty());
        assert_eq!(session.document().ppg.samples(), &[3]);

        let parsed: UiEvent =
            serde_json::from_str(r#"{"event":"clear_all","window":18446744073709551615}"#).unwrap();
        assert_eq!(session.dispatch(parsed).unwrap(), out_of_range);
    }

    #[test]
    fn labels_validate_against_vocabulary() {
        let mut session = Session::new(source(), config());
        session.dispatch(load("s1")).unwrap();
        let label = |window, value: &str| UiEvent::SetLabel {
            window,
            value: value.into(),
        };
        assert_eq!(
            session.dispatch(label(None, "artifact")).unwrap(),
            EventOutcome::noop(NoOpReason::UnknownLabel)
        );
        session.dispatch(label(Some(3), "motion")).unwrap();
        session.dispatch(label(None, "clean")).unwrap();
        assert_eq!(session.document().window_label(3), Some("motion"));
        assert_eq!(session.inspection().window_label, "clean");
        session.dispatch(label(None, "")).unwrap();
        assert_eq!(session.inspection().window_label, "");
    }

    #[test]
    fn storage_failures_propagate_and_keep_state() {
        let mut session = Session::new(source(), config());
        session.dispatch(load("s2")).unwrap();
        session.dispatch(next()).unwrap();
        session.dispatch(next()).unwrap();
        let err = session.dispatch(next()).unwrap_err();
        assert!(matches!(
            err,
            Error::DataUnavailable(DataError::WindowOutOfRange { index: 3, .. })
        ));
        assert_eq!(session.window(), 2);

        session.dispatch(click("ecg", 1, ClickMode::Add)).unwrap();
        let err = session.dispatch(load("missing")).unwrap_err();
        assert!(matches!(
            err,
            Error::DataUnavailable(DataError::SubjectNotFound(_))
        ));
        assert_eq!(session.subject(), Some("s2"));
        assert_eq!(session.document().total_peaks(), 1);
    }

    #[test]
    fn direct_window_selection_clamps() {
        let mut session = Session::new(source(), config());
        assert_eq!(
            session.go_to_window(2).unwrap(),
            EventOutcome::noop(NoOpReason::NoSubjectLoaded)
        );
        session.dispatch(load("s1")).unwrap();
        assert_eq!(
            session.go_to_window(99).unwrap(),
            EventOutcome::Navigated { from: 0, to: 4 }
        );
        session.dispatch(next()).unwrap();
        assert_eq!(session.window(), 4);
        session.go_to_window(1).unwrap();
        session.dispatch(next()).unwrap();
        assert_eq!(session.window(), 2);
    }

    #[test]
    fn window_cache_stays_bounded() {
        let mut session = Session::new(source(), config());
        session.dispatch(load("s1")).unwrap();
        for _ in 0..4 {
            session.dispatch(next()).unwrap();
            assert!(session.cached_windows("s1") <= 2);
        }
        assert_eq!(session.window(), 4);
        assert_eq!(session.current_window().unwrap().unwrap().len(), 5);
    }

    #[test]
    fn sessions_share_a_source_independently() {
        let shared = Arc::new(source());
        let mut a = Session::new(Arc::clone(&shared), config());
        let mut b = Session::new(Arc::clone(&shared), config());
        a.dispatch(load("s1")).unwrap();
        b.dispatch(load("s1")).unwrap();
        a.dispatch(click("ecg", 2, ClickMode::Add)).unwrap();
        a.dispatch(next()).unwrap();
        assert_eq!(a.document().total_peaks(), 1);
        assert_eq!(b.document().total_peaks(), 0);
        assert_eq!(b.window(), 0);
    }

    #[test]
    fn figure_carries_markers() {
        let mut session = Session::new(source(), config());
        session.dispatch(load("s1")).unwrap();
        session.dispatch(click("abp", 2, ClickMode::Add)).unwrap();
        let fig = session.figure().unwrap().unwrap();
        let markers = fig
            .panel(Channel::Abp)
            .unwrap()
            .series_named("abp-manual-peaks")
            .unwrap();
        assert_eq!(markers.points(), &[[0.2, 6.0]]);
    }

    #[test]
    fn metadata_and_snapshot_serialize() {
        let mut session = Session::new(source(), config());
        let meta = session.subject_metadata("s1").unwrap();
        assert_eq!(meta["ppg"]["fs"], json!(10.0));
        assert!(session.subject_metadata("nobody").is_err());

        session.dispatch(load("s1")).unwrap();
        session.dispatch(click("ecg", 1, ClickMode::Add)).unwrap();
        let snap = session.snapshot_json().unwrap();
        assert_eq!(snap["subject_id"], "s1");
        assert_eq!(snap["window_index"], 0);
        assert_eq!(
            snap["inspection"]["signals"]["ecg"]["sample_peak_positions"],
            json!([1])
        );
        assert_eq!(snap["inspection"]["window_label"], "");
    }

    #[test]
    fn events_parse_from_json_lines() {
        let lines = [
            r#"{"event":"load_subject","subject_id":"s1"}"#,
            r#"{"event":"navigate","direction":"next","timestamp":5}"#,
            r#"{"event":"jump","seconds":null,"timestamp":6}"#,
            r#"{"event":"click","channel":"ecg","local_index":3,"time":0.3,"mode":"remove"}"#,
            r#"{"event":"clear_all","window":2}"#,
            r#"{"event":"set_label","value":"noisy"}"#,
        ];
        let events: Vec<UiEvent> = lines
            .iter()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(events[0], load("s1"));
        assert_eq!(
            events[1],
            UiEvent::Navigate {
                direction: Direction::Next,
                timestamp: Some(5)
            }
        );
        assert_eq!(
            events[2],
            UiEvent::Jump {
                seconds: None,
                timestamp: Some(6)
            }
        );
        assert!(matches!(
            &events[3],
            UiEvent::Click(c) if c.mode == ClickMode::Remove && c.time == Some(0.3)
        ));
        assert_eq!(events[4], UiEvent::ClearAll { window: Some(2) });
        assert!(serde_json::from_str::<UiEvent>(r#"{"event":"zoom"}"#).is_err());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn event() -> impl Strategy<Value = UiEvent> {
            prop_oneof![
                Just(next()),
                Just(UiEvent::Navigate {
                    direction: Direction::Prev,
                    timestamp: None
                }),
                (0usize..10).prop_map(|i| click("ecg", i, ClickMode::Add)),
                (0usize..10).prop_map(|i| click("ppg", i, ClickMode::Remove)),
                (0.0f64..4.0).prop_map(|s| UiEvent::Jump {
                    seconds: Some(s),
                    timestamp: None
                }),
                Just(UiEvent::SetLabel {
                    window: None,
                    value: "motion".into()
                }),
            ]
        }

        proptest! {
            #[test]
            fn load_always_yields_empty_template(events in prop::collection::vec(event(), 0..30)) {
                let mut session = Session::new(source(), config());
                session.dispatch(load("s1")).unwrap();
                for e in events {
                    let _ = session.dispatch(e);
                    prop_assert!(session.window() < 5);
                }
                session.dispatch(load("s1")).unwrap();
                prop_assert_eq!(session.window(), 0);
                prop_assert_eq!(session.document(), &AnnotationDocument::new());
            }
        }
    }
}
