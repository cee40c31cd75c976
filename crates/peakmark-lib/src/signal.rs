use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Physiological channels shown side by side in the annotator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Ecg,
    Ppg,
    Abp,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Ecg, Channel::Ppg, Channel::Abp];

    pub fn name(&self) -> &'static str {
        match self {
            Channel::Ecg => "ecg",
            Channel::Ppg => "ppg",
            Channel::Abp => "abp",
        }
    }

    /// Group name the channel is stored under in a subject recording.
    pub fn group(&self) -> &'static str {
        match self {
            Channel::Ecg => "ekg",
            Channel::Ppg => "ppg",
            Channel::Abp => "bp",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Channel::Ecg => "Electro-Cardiogram (ECG)",
            Channel::Ppg => "Photo-Plethysmography (PPG)",
            Channel::Abp => "Arterial Blood Pressure (ABP)",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Channel::Ecg => "mV",
            Channel::Ppg => "a.u.",
            Channel::Abp => "mmHg",
        }
    }

    /// Row position when the channels are stacked top to bottom.
    pub fn row(&self) -> usize {
        match self {
            Channel::Ecg => 0,
            Channel::Ppg => 1,
            Channel::Abp => 2,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown channel '{0}'")]
pub struct UnknownChannel(pub String);

impl FromStr for Channel {
    type Err = UnknownChannel;

    /// Accepts both channel names and their storage group names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ecg" | "ekg" => Ok(Channel::Ecg),
            "ppg" => Ok(Channel::Ppg),
            "abp" | "bp" => Ok(Channel::Abp),
            _ => Err(UnknownChannel(s.to_string())),
        }
    }
}

/// Basic typed time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Uniform sampling frequency in Hz
    pub fs: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl TimeSeries {
    pub fn new(fs: f64, data: Vec<f64>) -> Self {
        Self { fs, data }
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn duration(&self) -> f64 {
        self.data.len() as f64 / self.fs
    }
}

/// One window of samples for every channel, plus its time axis.
///
/// All series have the same length. `end - start` equals that length, which
/// is shorter than the configured window only for the recording's tail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSlice {
    pub subject: String,
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub fs: f64,
    pub ecg: Vec<f32>,
    pub ppg: Vec<f32>,
    pub abp: Vec<f32>,
    pub t: Vec<f32>,
}

impl WindowSlice {
    pub fn channel(&self, channel: Channel) -> &[f32] {
        match channel {
            Channel::Ecg => &self.ecg,
            Channel::Ppg => &self.ppg,
            Channel::Abp => &self.abp,
        }
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_channel_and_group_names() {
        assert_eq!("ecg".parse::<Channel>().unwrap(), Channel::Ecg);
        assert_eq!("EKG".parse::<Channel>().unwrap(), Channel::Ecg);
        assert_eq!("bp".parse::<Channel>().unwrap(), Channel::Abp);
        assert_eq!(" ppg ".parse::<Channel>().unwrap(), Channel::Ppg);
        assert!("resp".parse::<Channel>().is_err());
    }

    #[test]
    fn channel_serializes_lowercase() {
        let js = serde_json::to_string(&Channel::Abp).unwrap();
        assert_eq!(js, "\"abp\"");
        for ch in Channel::ALL {
            assert_eq!(ch.name().parse::<Channel>().unwrap(), ch);
            assert_eq!(ch.group().parse::<Channel>().unwrap(), ch);
        }
    }

    #[test]
    fn time_series_duration() {
        let ts = TimeSeries::new(125.0, vec![0.0; 250]);
        assert_eq!(ts.len(), 250);
        assert!((ts.duration() - 2.0).abs() < 1e-12);
    }
}
