use anyhow::{Context, Result};
use peakmark_lib::plot::{self, Figure, Panel, PlotBackend, Series};
use plotters::prelude::*;
use std::path::PathBuf;

/// Writes figures as PNG bitmaps, one row per panel.
pub struct PngBackend {
    path: PathBuf,
    size: (u32, u32),
}

impl PngBackend {
    pub fn new(path: impl Into<PathBuf>, size: (u32, u32)) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }
}

impl PlotBackend for PngBackend {
    fn draw(&mut self, fig: &Figure) -> Result<()> {
        let root = BitMapBackend::new(&self.path, self.size).into_drawing_area();
        root.fill(&WHITE)?;
        let root = match &fig.title {
            Some(title) => root.titled(title, ("sans-serif", 22))?,
            None => root,
        };
        let rows = fig.panels.len().max(1);
        let areas = root.split_evenly((rows, 1));
        let x_range = x_bounds(fig);
        for (area, panel) in areas.iter().zip(&fig.panels) {
            let [y0, y1] = y_bounds(panel);
            let mut chart = ChartBuilder::on(area)
                .margin(8)
                .caption(&panel.title, ("sans-serif", 16))
                .x_label_area_size(25)
                .y_label_area_size(50)
                .build_cartesian_2d(x_range[0]..x_range[1], y0..y1)?;
            {
                let mut mesh = chart.configure_mesh();
                if let Some(label) = &panel.y.label {
                    mesh.y_desc(label.as_str());
                }
                if let Some(label) = &fig.x.label {
                    mesh.x_desc(label.as_str());
                }
                mesh.draw()?;
            }
            for series in &panel.series {
                match series {
                    Series::Line(line) => {
                        chart.draw_series(LineSeries::new(
                            line.points.iter().map(|p| (p[0], p[1])),
                            rgb(line.style.color).stroke_width(line.style.width.round() as u32),
                        ))?;
                    }
                    Series::Scatter(scatter) => {
                        let style = rgb(scatter.color).stroke_width(2);
                        let size = scatter.size / 2;
                        chart.draw_series(
                            scatter
                                .points
                                .iter()
                                .map(|p| Cross::new((p[0], p[1]), size, style)),
                        )?;
                    }
                }
            }
        }
        root.present()
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}

fn rgb(color: plot::Color) -> RGBColor {
    let (r, g, b) = color.rgb();
    RGBColor(r, g, b)
}

fn x_bounds(fig: &Figure) -> [f64; 2] {
    if let Some(range) = fig.x.range {
        if range[1] > range[0] {
            return range;
        }
    }
    let xs = fig
        .panels
        .iter()
        .flat_map(|p| p.series.iter())
        .flat_map(|s| s.points().iter().map(|p| p[0]));
    padded(xs)
}

fn y_bounds(panel: &Panel) -> [f64; 2] {
    match panel.y.range.or_else(|| panel.y_bounds()) {
        Some([lo, hi]) if hi > lo => {
            let pad = (hi - lo) * 0.05;
            [lo - pad, hi + pad]
        }
        Some([lo, _]) => [lo - 1.0, lo + 1.0],
        None => [0.0, 1.0],
    }
}

fn padded(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo.is_finite() && hi > lo {
        [lo, hi]
    } else if lo.is_finite() {
        [lo - 1.0, lo + 1.0]
    } else {
        [0.0, 1.0]
    }
}
