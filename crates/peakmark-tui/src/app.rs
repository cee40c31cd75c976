use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use peakmark_lib::{
    io::source::SignalSource,
    navigation::{Direction as NavDirection, Timestamp},
    plot::Figure,
    Channel, ClickEvent, ClickMode, ClickOutcome, EventOutcome, Session, UiEvent,
};
use ratatui::layout::Rect;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Focus {
    Subjects,
    Chart,
    Jump,
}

#[derive(Default)]
pub struct TextField {
    pub value: String,
    pub cursor: usize,
}

impl TextField {
    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// `cursor` counts characters; `String` edits take byte offsets.
    fn byte_offset(&self, cursor: usize) -> usize {
        self.value
            .char_indices()
            .nth(cursor)
            .map_or(self.value.len(), |(i, _)| i)
    }

    fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    fn handle_key(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(c)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                let at = self.byte_offset(self.cursor);
                self.value.insert(at, c);
                self.cursor += 1;
                true
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_offset(self.cursor);
                    self.value.remove(at);
                }
                true
            }
            KeyCode::Delete => {
                if self.cursor < self.char_len() {
                    let at = self.byte_offset(self.cursor);
                    self.value.remove(at);
                }
                true
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                true
            }
            KeyCode::Right => {
                if self.cursor < self.char_len() {
                    self.cursor += 1;
                }
                true
            }
            KeyCode::Home => {
                self.cursor = 0;
                true
            }
            KeyCode::End => {
                self.cursor = self.char_len();
                true
            }
            _ => false,
        }
    }
}

pub struct App<S: SignalSource> {
    pub session: Session<S>,
    pub subjects: Vec<String>,
    pub subject_cursor: usize,
    pub focus: Focus,
    pub mode: ClickMode,
    pub label_cursor: usize,
    pub jump: TextField,
    pub status: String,
    pub figure: Option<Figure>,
    /// Plot areas of the channel charts from the last draw
    pub chart_areas: Vec<(Channel, Rect)>,
    pub should_quit: bool,
}

impl<S: SignalSource> App<S> {
    pub fn new(session: Session<S>) -> Result<Self> {
        let subjects = session.subject_ids()?;
        let mut app = Self {
            session,
            subjects,
            subject_cursor: 0,
            focus: Focus::Subjects,
            mode: ClickMode::Add,
            label_cursor: 0,
            jump: TextField::default(),
            status: "s: subjects | ←/→: window | g: jump | m: mode | c: clear | l/Enter: label | q: quit"
                .into(),
            figure: None,
            chart_areas: Vec::new(),
            should_quit: false,
        };
        let default_label = app.session.config().default_label.clone();
        if let Some(pos) = app.labels().iter().position(|l| *l == default_label) {
            app.label_cursor = pos;
        }
        Ok(app)
    }

    pub fn labels(&self) -> &[String] {
        &self.session.config().labels
    }

    pub fn selected_label(&self) -> Option<&str> {
        self.labels().get(self.label_cursor).map(String::as_str)
    }

    pub fn select_subject(&mut self, subject: &str) {
        if let Some(pos) = self.subjects.iter().position(|s| s == subject) {
            self.subject_cursor = pos;
        }
        self.send(UiEvent::LoadSubject {
            subject_id: subject.to_string(),
        });
        if self.session.subject().is_some() {
            self.focus = Focus::Chart;
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if self.focus == Focus::Jump {
            self.on_jump_key(&key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('s') => self.focus = Focus::Subjects,
            KeyCode::Char('g') => {
                self.jump.clear();
                self.focus = Focus::Jump;
            }
            KeyCode::Char('m') => {
                self.mode = match self.mode {
                    ClickMode::Add => ClickMode::Remove,
                    ClickMode::Remove => ClickMode::Add,
                };
                self.status = format!("click mode: {}", mode_name(self.mode));
            }
            KeyCode::Char('c') => self.send(UiEvent::ClearAll { window: None }),
            KeyCode::Char('l') => {
                if !self.labels().is_empty() {
                    self.label_cursor = (self.label_cursor + 1) % self.labels().len();
                }
            }
            KeyCode::Left => self.send(UiEvent::Navigate {
                direction: NavDirection::Prev,
                timestamp: Some(now_millis()),
            }),
            KeyCode::Right => self.send(UiEvent::Navigate {
                direction: NavDirection::Next,
                timestamp: Some(now_millis()),
            }),
            KeyCode::Up if self.focus == Focus::Subjects => {
                self.subject_cursor = self.subject_cursor.saturating_sub(1);
            }
            KeyCode::Down if self.focus == Focus::Subjects => {
                if self.subject_cursor + 1 < self.subjects.len() {
                    self.subject_cursor += 1;
                }
            }
            KeyCode::Enter => match self.focus {
                Focus::Subjects => {
                    if let Some(id) = self.subjects.get(self.subject_cursor).cloned() {
                        self.select_subject(&id);
                    }
                }
                _ => {
                    if let Some(label) = self.selected_label().map(str::to_string) {
                        self.send(UiEvent::SetLabel {
                            window: None,
                            value: label,
                        });
                    }
                }
            },
            _ => {}
        }
    }

    fn on_jump_key(&mut self, key: &KeyEvent) {
        match key.code {
            KeyCode::Esc => self.focus = Focus::Chart,
            KeyCode::Enter => {
                let text = self.jump.value.trim();
                let seconds = if text.is_empty() {
                    None
                } else {
                    match text.parse::<f64>() {
                        Ok(v) => Some(v),
                        Err(_) => {
                            self.status = format!("'{}' is not a number of seconds", text);
                            return;
                        }
                    }
                };
                self.focus = Focus::Chart;
                self.send(UiEvent::Jump {
                    seconds,
                    timestamp: Some(now_millis()),
                });
            }
            _ => {
                self.jump.handle_key(key);
            }
        }
    }

    pub fn on_mouse(&mut self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let hit = self.chart_areas.iter().copied().find(|(_, area)| {
            mouse.column >= area.x
                && mouse.column < area.right()
                && mouse.row >= area.y
                && mouse.row < area.bottom()
        });
        let Some((channel, area)) = hit else {
            return;
        };
        let Some(base) = self
            .figure
            .as_ref()
            .and_then(|fig| fig.panel(channel))
            .and_then(|panel| panel.base())
        else {
            return;
        };
        let Some(local) = column_to_local_index(mouse.column, area.x, area.width, base.points.len())
        else {
            return;
        };
        let time = base.points.get(local).map(|p| p[0]);
        self.send(UiEvent::Click(ClickEvent {
            channel: Some(channel.name().to_string()),
            local_index: local,
            time,
            mode: self.mode,
        }));
    }

    /// Dispatch `event` and report the result in the status bar.
    pub fn send(&mut self, event: UiEvent) {
        match self.session.dispatch(event) {
            Ok(outcome) => self.status = describe(&outcome),
            Err(err) => {
                log::error!("{}", err);
                self.status = format!("error: {}", err);
            }
        }
    }

    /// Recompute the figure of the current window.
    pub fn refresh(&mut self) {
        match self.session.figure() {
            Ok(fig) => self.figure = fig,
            Err(err) => {
                self.figure = None;
                self.status = format!("error: {}", err);
            }
        }
    }
}

/// Sample index within a window for a click on terminal column `column` of a
/// plot spanning `width` cells from `left`. Each cell covers an equal share
/// of the window; the cell centre decides the sample.
pub fn column_to_local_index(column: u16, left: u16, width: u16, samples: usize) -> Option<usize> {
    if width == 0 || samples == 0 || column < left || column >= left + width {
        return None;
    }
    let offset = (column - left) as f64 + 0.5;
    let local = (offset * samples as f64 / width as f64).floor() as usize;
    Some(local.min(samples - 1))
}

fn now_millis() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as Timestamp)
        .unwrap_or(1)
}

pub fn mode_name(mode: ClickMode) -> &'static str {
    match mode {
        ClickMode::Add => "add",
        ClickMode::Remove => "remove",
    }
}

fn describe(outcome: &EventOutcome) -> String {
    match outcome {
        EventOutcome::SubjectLoaded { subject_id, window } => {
            format!("loaded {} at window {}", subject_id, window)
        }
        EventOutcome::Navigated { from, to } if from == to => format!("window {}", to),
        EventOutcome::Navigated { from, to } => format!("window {} → {}", from, to),
        EventOutcome::Annotated { click } => match click {
            ClickOutcome::Added {
                channel,
                sample,
                time,
            } => format!("{} peak added at sample {} ({:.3} s)", channel, sample, time),
            ClickOutcome::Removed {
                channel, count, ..
            } => format!("{} {} peak(s) removed", count, channel),
            ClickOutcome::NoOp { reason } => format!("click ignored: {}", reason),
        },
        EventOutcome::Cleared { window, removed } => {
            format!("cleared {} peak(s) from window {}", removed, window)
        }
        EventOutcome::Labelled { window, label } if label.is_empty() => {
            format!("window {} unlabelled", window)
        }
        EventOutcome::Labelled { window, label } => format!("window {} labelled {}", window, label),
        EventOutcome::NoOp { reason } => format!("ignored: {}", reason),
    }
}
