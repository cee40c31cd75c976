use peakmark_lib::{
    io::source::SignalSource,
    plot::{self, decimate_points, Series},
    Channel,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{mode_name, App, Focus};

pub fn draw<S: SignalSource>(f: &mut Frame, app: &mut App<S>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.size());
    draw_header(f, rows[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(0)])
        .split(rows[1]);
    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(9),
            Constraint::Length(3),
        ])
        .split(body[0]);
    draw_subjects(f, side[0], app);
    draw_inspection(f, side[1], app);
    draw_jump(f, side[2], app);
    draw_charts(f, body[1], app);
    draw_status(f, rows[2], app);
}

fn draw_header<S: SignalSource>(f: &mut Frame, area: Rect, app: &App<S>) {
    let subject = app.session.subject().unwrap_or("-");
    let indexer = app.session.indexer();
    let label = app.selected_label().unwrap_or("-");
    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", subject),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "window {}/{} ({:.1} s) | mode: {} | label: {}",
            app.session.window(),
            indexer.last_window(),
            indexer.window_start_time(app.session.window()),
            mode_name(app.mode),
            label,
        )),
    ]);
    let header =
        Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("peakmark"));
    f.render_widget(header, area);
}

fn draw_subjects<S: SignalSource>(f: &mut Frame, area: Rect, app: &App<S>) {
    let loaded = app.session.subject();
    let items: Vec<ListItem> = app
        .subjects
        .iter()
        .map(|id| {
            let marker = if Some(id.as_str()) == loaded { "● " } else { "  " };
            ListItem::new(format!("{}{}", marker, id))
        })
        .collect();
    let list = List::new(items)
        .block(focus_block("Subjects", app.focus == Focus::Subjects))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    let mut state = ListState::default();
    if !app.subjects.is_empty() {
        state.select(Some(app.subject_cursor));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_inspection<S: SignalSource>(f: &mut Frame, area: Rect, app: &App<S>) {
    let view = app.session.inspection();
    let label = if view.window_label.is_empty() {
        "(none)"
    } else {
        view.window_label.as_str()
    };
    let mut lines = vec![Line::from(format!("label: {}", label))];
    for ch in Channel::ALL {
        let samples = view
            .peaks(ch)
            .map(|p| {
                p.samples()
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();
        lines.push(Line::from(format!("{}: {}", ch.name(), samples)));
    }
    let panel = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Window"));
    f.render_widget(panel, area);
}

fn draw_jump<S: SignalSource>(f: &mut Frame, area: Rect, app: &App<S>) {
    let focused = app.focus == Focus::Jump;
    let paragraph = Paragraph::new(app.jump.value.as_str())
        .block(focus_block("Jump to (s)", focused));
    f.render_widget(paragraph, area);
    if focused {
        let x = area.x + 1 + app.jump.cursor as u16;
        f.set_cursor(x.min(area.right().saturating_sub(2)), area.y + 1);
    }
}

fn draw_charts<S: SignalSource>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    app.refresh();
    app.chart_areas.clear();
    let Some(fig) = app.figure.as_ref() else {
        let hint = Paragraph::new("Select a subject with ↑/↓ and Enter.")
            .block(focus_block("Signals", app.focus == Focus::Chart));
        f.render_widget(hint, area);
        return;
    };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Ratio(1, fig.panels.len().max(1) as u32);
            fig.panels.len()
        ])
        .split(area);
    // Charts without axis labels draw straight onto the block's inner area,
    // which is what mouse clicks are mapped against.
    let width = rows.first().map_or(0, |r| r.width.saturating_sub(2) as usize);
    let x_range = fig.x.range.unwrap_or([0.0, 1.0]);
    let mut areas = Vec::with_capacity(fig.panels.len());
    for (row, panel) in rows.iter().zip(&fig.panels) {
        let owned: Vec<(String, Vec<(f64, f64)>, Style, bool)> = panel
            .series
            .iter()
            .map(|series| match series {
                Series::Line(line) => (
                    line.name.clone(),
                    decimate_points(&line.points, width.max(1) * 2)
                        .into_iter()
                        .map(|p| (p[0], p[1]))
                        .collect(),
                    Style::default().fg(tui_color(line.style.color)),
                    false,
                ),
                Series::Scatter(scatter) => (
                    scatter.name.clone(),
                    scatter.points.iter().map(|p| (p[0], p[1])).collect(),
                    Style::default()
                        .fg(tui_color(scatter.color))
                        .add_modifier(Modifier::BOLD),
                    true,
                ),
            })
            .collect();
        let datasets: Vec<Dataset> = owned
            .iter()
            .map(|(name, points, style, is_peaks)| {
                let dataset = Dataset::default().name(name.as_str()).style(*style).data(points);
                if *is_peaks {
                    dataset.marker(symbols::Marker::Dot).graph_type(GraphType::Scatter)
                } else {
                    dataset.marker(symbols::Marker::Braille).graph_type(GraphType::Line)
                }
            })
            .collect();
        let [y0, y1] = match panel.y_bounds() {
            Some([lo, hi]) if hi > lo => [lo, hi],
            Some([lo, _]) => [lo - 1.0, lo + 1.0],
            None => [0.0, 1.0],
        };
        let title = match &panel.y.label {
            Some(unit) => format!("{} ({})", panel.title, unit),
            None => panel.title.clone(),
        };
        let block = focus_block(&title, app.focus == Focus::Chart);
        areas.push((panel.channel, block.inner(*row)));
        let chart = Chart::new(datasets)
            .block(block)
            .hidden_legend_constraints((Constraint::Length(0), Constraint::Length(0)))
            .x_axis(Axis::default().bounds(x_range))
            .y_axis(Axis::default().bounds([y0, y1]));
        f.render_widget(chart, *row);
    }
    app.chart_areas = areas;
}

fn draw_status<S: SignalSource>(f: &mut Frame, area: Rect, app: &App<S>) {
    let status = Paragraph::new(app.status.as_str())
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .wrap(Wrap { trim: true });
    f.render_widget(status, area);
}

fn focus_block(title: &str, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title.to_string())
}

/// Terminal colour for a figure colour. Black markers would vanish on a
/// dark terminal, so they are drawn white.
fn tui_color(color: plot::Color) -> Color {
    match color.rgb() {
        (0, 0, 0) => Color::White,
        (r, g, b) => Color::Rgb(r, g, b),
    }
}
