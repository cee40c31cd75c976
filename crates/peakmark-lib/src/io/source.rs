//! Read-only access to recorded subjects, sliced by window.

use crate::error::{DataError, Result};
use crate::io::text::{format_f64_series, parse_f64_series};
use crate::signal::{Channel, TimeSeries, WindowSlice};
use crate::value::{from_storage_json, to_storage_json, RawValue, SubjectMetadata};
use crate::window::WindowIndexer;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const SUBJECTS_DIR: &str = "subjects";
const SAMPLES_FILE: &str = "v.txt";
const ATTRS_FILE: &str = "attrs.json";
/// Subject-level fields live in their own group next to the channels.
pub const FIX_GROUP: &str = "fix";

/// Backend the annotator reads waveforms and static fields from.
pub trait SignalSource {
    fn subject_ids(&self) -> Result<Vec<String>, DataError>;

    /// Slice `window` of every channel.
    ///
    /// Fails with [`DataError::WindowOutOfRange`] when the window index is
    /// past the configured count or starts beyond the recorded samples. A
    /// window running past the end of the recording comes back short, with
    /// every channel cut to the shortest one.
    fn load_window(
        &self,
        subject: &str,
        window: usize,
        indexer: &WindowIndexer,
    ) -> Result<WindowSlice, DataError>;

    fn load_subject_metadata(&self, subject: &str) -> Result<SubjectMetadata, DataError>;
}

impl<T: SignalSource + ?Sized> SignalSource for Arc<T> {
    fn subject_ids(&self) -> Result<Vec<String>, DataError> {
        (**self).subject_ids()
    }

    fn load_window(
        &self,
        subject: &str,
        window: usize,
        indexer: &WindowIndexer,
    ) -> Result<WindowSlice, DataError> {
        (**self).load_window(subject, window, indexer)
    }

    fn load_subject_metadata(&self, subject: &str) -> Result<SubjectMetadata, DataError> {
        (**self).load_subject_metadata(subject)
    }
}

impl<T: SignalSource + ?Sized> SignalSource for &T {
    fn subject_ids(&self) -> Result<Vec<String>, DataError> {
        (**self).subject_ids()
    }

    fn load_window(
        &self,
        subject: &str,
        window: usize,
        indexer: &WindowIndexer,
    ) -> Result<WindowSlice, DataError> {
        (**self).load_window(subject, window, indexer)
    }

    fn load_subject_metadata(&self, subject: &str) -> Result<SubjectMetadata, DataError> {
        (**self).load_subject_metadata(subject)
    }
}

/// All channels of one subject plus its static fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub ecg: TimeSeries,
    pub ppg: TimeSeries,
    pub abp: TimeSeries,
    /// Groups `fix`, `ecg`, `ppg`, `abp`
    pub metadata: SubjectMetadata,
}

impl Recording {
    /// Recording sampled at a single rate, with `fs` recorded on every
    /// channel group.
    pub fn from_samples(fs: f64, ecg: Vec<f64>, ppg: Vec<f64>, abp: Vec<f64>) -> Self {
        let mut metadata = SubjectMetadata::new();
        for ch in Channel::ALL {
            let mut fields = BTreeMap::new();
            fields.insert("fs".to_string(), RawValue::Float(fs));
            metadata.insert_group(ch.name(), fields);
        }
        Self {
            ecg: TimeSeries::new(fs, ecg),
            ppg: TimeSeries::new(fs, ppg),
            abp: TimeSeries::new(fs, abp),
            metadata,
        }
    }

    pub fn channel(&self, channel: Channel) -> &TimeSeries {
        match channel {
            Channel::Ecg => &self.ecg,
            Channel::Ppg => &self.ppg,
            Channel::Abp => &self.abp,
        }
    }

    /// The PPG rate drives the time axis of every channel.
    pub fn fs(&self) -> f64 {
        self.ppg.fs
    }

    /// Samples available on every channel.
    pub fn available(&self) -> usize {
        Channel::ALL
            .iter()
            .map(|ch| self.channel(*ch).len())
            .min()
            .unwrap_or(0)
    }

    pub fn slice(
        &self,
        subject: &str,
        window: usize,
        indexer: &WindowIndexer,
    ) -> Result<WindowSlice, DataError> {
        let available = self.available();
        let (start, end) = indexer.bounds(window);
        if window >= indexer.num_windows() || start >= available {
            return Err(DataError::WindowOutOfRange {
                subject: subject.to_string(),
                index: window,
                available,
            });
        }
        let end = end.min(available);
        let cut = |ch: Channel| -> Vec<f32> {
            self.channel(ch).data[start..end]
                .iter()
                .map(|v| *v as f32)
                .collect()
        };
        let fs = self.fs();
        Ok(WindowSlice {
            subject: subject.to_string(),
            index: window,
            start,
            end,
            fs,
            ecg: cut(Channel::Ecg),
            ppg: cut(Channel::Ppg),
            abp: cut(Channel::Abp),
            t: (start..end).map(|i| (i as f64 / fs) as f32).collect(),
        })
    }
}

/// Subjects held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    subjects: BTreeMap<String, Arc<Recording>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, subject: impl Into<String>, recording: Recording) {
        self.subjects.insert(subject.into(), Arc::new(recording));
    }

    pub fn with_subject(mut self, subject: impl Into<String>, recording: Recording) -> Self {
        self.insert(subject, recording);
        self
    }

    fn recording(&self, subject: &str) -> Result<&Recording, DataError> {
        self.subjects
            .get(subject)
            .map(|r| r.as_ref())
            .ok_or_else(|| DataError::SubjectNotFound(subject.to_string()))
    }
}

impl SignalSource for MemorySource {
    fn subject_ids(&self) -> Result<Vec<String>, DataError> {
        Ok(self.subjects.keys().cloned().collect())
    }

    fn load_window(
        &self,
        subject: &str,
        window: usize,
        indexer: &WindowIndexer,
    ) -> Result<WindowSlice, DataError> {
        self.recording(subject)?.slice(subject, window, indexer)
    }

    fn load_subject_metadata(&self, subject: &str) -> Result<SubjectMetadata, DataError> {
        Ok(self.recording(subject)?.metadata.clone())
    }
}

/// Subjects stored on disk as
/// `<root>/subjects/<id>/<group>/{v.txt,attrs.json}`.
///
/// Sample files are parsed on first access and kept for the lifetime of the
/// source.
#[derive(Debug)]
pub struct DirectorySource {
    root: PathBuf,
    loaded: Mutex<HashMap<String, Arc<Recording>>>,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            loaded: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn subject_dir(&self, subject: &str) -> PathBuf {
        self.root.join(SUBJECTS_DIR).join(subject)
    }

    fn recording(&self, subject: &str) -> Result<Arc<Recording>, DataError> {
        let mut loaded = self.loaded.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(rec) = loaded.get(subject) {
            return Ok(Arc::clone(rec));
        }
        let rec = Arc::new(self.read_recording(subject)?);
        log::info!(
            "loaded subject '{}' ({} samples at {} Hz)",
            subject,
            rec.available(),
            rec.fs()
        );
        loaded.insert(subject.to_string(), Arc::clone(&rec));
        Ok(rec)
    }

    fn read_recording(&self, subject: &str) -> Result<Recording, DataError> {
        let dir = self.subject_dir(subject);
        if subject.is_empty() || !dir.is_dir() {
            return Err(DataError::SubjectNotFound(subject.to_string()));
        }
        let mut metadata = SubjectMetadata::new();
        metadata.insert_group(FIX_GROUP, read_attrs(&dir.join(FIX_GROUP).join(ATTRS_FILE))?);
        let mut samples = BTreeMap::new();
        for ch in Channel::ALL {
            let group = dir.join(ch.group());
            let path = group.join(SAMPLES_FILE);
            if !path.is_file() {
                return Err(DataError::ChannelNotFound {
                    subject: subject.to_string(),
                    channel: ch.group().to_string(),
                });
            }
            let text = fs::read_to_string(&path).map_err(|source| DataError::Io {
                path: path.clone(),
                source,
            })?;
            let data = parse_f64_series(&text).map_err(|e| DataError::Parse {
                path: path.clone(),
                reason: format!("{e:#}"),
            })?;
            samples.insert(ch, data);
            metadata.insert_group(ch.name(), read_attrs(&group.join(ATTRS_FILE))?);
        }
        let fs = match metadata.field(Channel::Ppg.name(), "fs") {
            Some(RawValue::Float(f)) if *f > 0.0 => *f,
            Some(RawValue::Int(i)) if *i > 0 => *i as f64,
            _ => {
                return Err(DataError::ChannelNotFound {
                    subject: subject.to_string(),
                    channel: format!("{}/fs", Channel::Ppg.group()),
                })
            }
        };
        let mut take = |ch: Channel| TimeSeries::new(fs, samples.remove(&ch).unwrap_or_default());
        let recording = Recording {
            ecg: take(Channel::Ecg),
            ppg: take(Channel::Ppg),
            abp: take(Channel::Abp),
            metadata,
        };
        log::debug!(
            "read '{}': {:.1} s of ppg at {} Hz",
            subject,
            recording.ppg.duration(),
            fs
        );
        Ok(recording)
    }
}

impl SignalSource for DirectorySource {
    fn subject_ids(&self) -> Result<Vec<String>, DataError> {
        let dir = self.root.join(SUBJECTS_DIR);
        let entries = fs::read_dir(&dir).map_err(|source| DataError::Io {
            path: dir.clone(),
            source,
        })?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| DataError::Io {
                path: dir.clone(),
                source,
            })?;
            if entry.path().is_dir() {
                ids.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn load_window(
        &self,
        subject: &str,
        window: usize,
        indexer: &WindowIndexer,
    ) -> Result<WindowSlice, DataError> {
        self.recording(subject)?.slice(subject, window, indexer)
    }

    fn load_subject_metadata(&self, subject: &str) -> Result<SubjectMetadata, DataError> {
        Ok(self.recording(subject)?.metadata.clone())
    }
}

fn read_attrs(path: &Path) -> Result<BTreeMap<String, RawValue>, DataError> {
    if !path.is_file() {
        return Ok(BTreeMap::new());
    }
    let text = fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: Value = serde_json::from_str(&text).map_err(|e| DataError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    match from_storage_json(&parsed) {
        RawValue::Map(fields) => Ok(fields),
        _ => Err(DataError::Parse {
            path: path.to_path_buf(),
            reason: "attributes must be a JSON object".into(),
        }),
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> DataError + '_ {
    move |source| DataError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write `recording` in the layout [`DirectorySource`] reads.
pub fn write_subject(root: &Path, subject: &str, recording: &Recording) -> Result<()> {
    let dir = root.join(SUBJECTS_DIR).join(subject);
    let write_attrs = |group_dir: &Path, fields: BTreeMap<String, RawValue>| -> Result<()> {
        fs::create_dir_all(group_dir).map_err(io_err(group_dir))?;
        let json = to_storage_json(&RawValue::Map(fields))?;
        let path = group_dir.join(ATTRS_FILE);
        let text = serde_json::to_string_pretty(&json).map_err(crate::SerializeError::from)?;
        fs::write(&path, text).map_err(io_err(&path))?;
        Ok(())
    };

    let fix = recording.metadata.group(FIX_GROUP).cloned().unwrap_or_default();
    write_attrs(&dir.join(FIX_GROUP), fix)?;
    for ch in Channel::ALL {
        let series = recording.channel(ch);
        let group_dir = dir.join(ch.group());
        let mut fields = recording.metadata.group(ch.name()).cloned().unwrap_or_default();
        fields.insert("fs".into(), RawValue::Float(series.fs));
        write_attrs(&group_dir, fields)?;
        let path = group_dir.join(SAMPLES_FILE);
        fs::write(&path, format_f64_series(&series.data, Some(ch.title())))
            .map_err(io_err(&path))?;
    }
    log::debug!("wrote subject '{}' to {}", subject, dir.display());
    Ok(())
}
