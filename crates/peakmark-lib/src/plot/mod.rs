//! Display-ready figures for one window.
//!
//! A [`Figure`] stacks one [`Panel`] per channel over a shared time axis.
//! Front ends draw it through [`PlotBackend`].

use crate::annotation::WindowAnnotations;
use crate::signal::{Channel, WindowSlice};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
    pub range: Option<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub dash: Option<[f32; 2]>,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub size: u32,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
    Scatter(ScatterSeries),
}

impl Series {
    pub fn name(&self) -> &str {
        match self {
            Series::Line(s) => &s.name,
            Series::Scatter(s) => &s.name,
        }
    }

    pub fn points(&self) -> &[[f64; 2]] {
        match self {
            Series::Line(s) => &s.points,
            Series::Scatter(s) => &s.points,
        }
    }
}

/// One channel's subplot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub channel: Channel,
    pub title: String,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Panel {
    pub fn series_named(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.name() == name)
    }

    /// The waveform line the panel was built from.
    pub fn base(&self) -> Option<&LineSeries> {
        let name = base_name(self.channel);
        self.series.iter().find_map(|s| match s {
            Series::Line(line) if line.name == name => Some(line),
            _ => None,
        })
    }

    /// Overall y extent across every series.
    pub fn y_bounds(&self) -> Option<[f64; 2]> {
        self.series
            .iter()
            .flat_map(|s| s.points().iter().map(|p| p[1]))
            .filter(|y| y.is_finite())
            .fold(None, |acc, y| match acc {
                None => Some([y, y]),
                Some([lo, hi]) => Some([lo.min(y), hi.max(y)]),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    /// Shared time axis
    pub x: Axis,
    pub panels: Vec<Panel>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis::default(),
            panels: Vec::new(),
        }
    }

    pub fn add_panel(&mut self, panel: Panel) {
        self.panels.push(panel);
    }

    pub fn panel(&self, channel: Channel) -> Option<&Panel> {
        self.panels.iter().find(|p| p.channel == channel)
    }

    pub fn panel_mut(&mut self, channel: Channel) -> Option<&mut Panel> {
        self.panels.iter_mut().find(|p| p.channel == channel)
    }
}

pub trait PlotBackend {
    fn draw(&mut self, fig: &Figure) -> anyhow::Result<()>;
}

pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    let bucket_size = points.len() as f64 / max_points as f64;
    let mut result = Vec::with_capacity(max_points);
    for i in 0..max_points {
        let start = (i as f64 * bucket_size).floor() as usize;
        if start >= points.len() {
            break;
        }
        result.push(points[start]);
    }
    result
}

pub fn base_name(channel: Channel) -> String {
    format!("{}-base", channel.name())
}

pub fn peaks_name(channel: Channel) -> String {
    format!("{}-manual-peaks", channel.name())
}

pub fn line_color(channel: Channel) -> Color {
    match channel {
        Channel::Ecg => Color(0x636EFA),
        Channel::Ppg => Color(0xEF553B),
        Channel::Abp => Color(0x00CC96),
    }
}

pub fn peak_color(channel: Channel) -> Color {
    match channel {
        Channel::Ecg => Color(0xFF0000),
        Channel::Ppg => Color(0x0000FF),
        Channel::Abp => Color(0x000000),
    }
}

/// Three stacked panels holding the window's waveforms.
///
/// The x range runs from the first sample to one sample past the last, so
/// the final point is not drawn on the frame.
pub fn window_figure(slice: &WindowSlice) -> Figure {
    let mut fig = Figure::new(Some(format!(
        "{} window {}",
        slice.subject, slice.index
    )));
    fig.x.label = Some("Time (s)".into());
    if let (Some(first), Some(last)) = (slice.t.first(), slice.t.last()) {
        let dt = 1.0 / slice.fs;
        fig.x.range = Some([*first as f64, *last as f64 + dt]);
    }
    for ch in Channel::ALL {
        let points = slice
            .t
            .iter()
            .zip(slice.channel(ch))
            .map(|(t, v)| [*t as f64, *v as f64])
            .collect();
        fig.add_panel(Panel {
            channel: ch,
            title: ch.title().into(),
            y: Axis {
                label: Some(ch.unit().into()),
                range: None,
            },
            series: vec![Series::Line(LineSeries {
                name: base_name(ch),
                points,
                style: Style {
                    width: 1.2,
                    dash: None,
                    color: line_color(ch),
                },
            })],
        });
    }
    fig
}

/// Add a marker series per channel for the peaks in `view`.
///
/// Marker heights come from the panel's base line at
/// `sample - window_start`. Peaks without a matching point are skipped with
/// a warning. Markers from an earlier overlay are replaced. Returns the
/// number of markers placed.
pub fn overlay_annotations(
    fig: &mut Figure,
    view: &WindowAnnotations,
    window_start: usize,
) -> usize {
    let mut placed = 0;
    for (channel, peaks) in &view.signals {
        let Some(panel) = fig.panel_mut(*channel) else {
            log::warn!("figure has no panel for {}; peaks not drawn", channel);
            continue;
        };
        let name = peaks_name(*channel);
        panel.series.retain(|s| s.name() != name);
        let Some(base) = panel.base() else {
            log::warn!("panel {} has no base series; peaks not drawn", channel);
            continue;
        };
        let mut points = Vec::with_capacity(peaks.len());
        for (sample, time) in peaks.iter() {
            let y = sample
                .checked_sub(window_start)
                .and_then(|local| base.points.get(local))
                .map(|p| p[1]);
            match y {
                Some(y) => points.push([time, y]),
                None => log::warn!(
                    "{} peak at sample {} lies outside the displayed window starting at {}",
                    channel,
                    sample,
                    window_start
                ),
            }
        }
        if points.is_empty() {
            continue;
        }
        placed += points.len();
        panel.series.push(Series::Scatter(ScatterSeries {
            name,
            points,
            size: 10,
            color: peak_color(*channel),
        }));
    }
    placed
}
