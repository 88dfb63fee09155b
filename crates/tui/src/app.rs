use std::{cmp, io, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ledger_core::{
    parse::{format_job, format_lines, format_resource, parse_job, parse_resource},
    AppConfig, Command, GameRecord, Ledger, LedgerError, Persistence, ShoppingTarget, Store,
    TotalsView,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_INPUT_LEN: usize = 256;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Resources,
    Jobs,
}

impl Focus {
    fn toggled(self) -> Self {
        match self {
            Focus::Resources => Focus::Jobs,
            Focus::Jobs => Focus::Resources,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PromptKind {
    RenameTab { original: String },
    AddResource,
    EditResource { original: String },
    AddJob,
    EditJob { original: String },
}

impl PromptKind {
    fn title(&self) -> String {
        match self {
            PromptKind::RenameTab { original } => format!("Rename tab - {original}"),
            PromptKind::AddResource => "Add resource".to_string(),
            PromptKind::EditResource { original } => format!("Edit - {original}"),
            PromptKind::AddJob => "Add job".to_string(),
            PromptKind::EditJob { original } => format!("Edit job - {original}"),
        }
    }

    fn instruction(&self) -> &'static str {
        match self {
            PromptKind::RenameTab { .. } => "New tab name",
            PromptKind::AddResource | PromptKind::EditResource { .. } => {
                "Name, or Name = Input x2, Other"
            }
            PromptKind::AddJob | PromptKind::EditJob { .. } => "Name = Product x3, Other",
        }
    }
}

#[derive(Debug, Clone)]
struct PromptModal {
    input: String,
    cursor: usize,
    kind: PromptKind,
}

impl PromptModal {
    fn new(kind: PromptKind, initial: String) -> Self {
        let cursor = initial.chars().count();
        Self {
            input: initial,
            cursor,
            kind,
        }
    }

    fn char_len(&self) -> usize {
        self.input.chars().count()
    }

    /// Byte offset of the character at `index`, or the end of the input.
    fn byte_offset(&self, index: usize) -> usize {
        self.input
            .char_indices()
            .nth(index)
            .map(|(offset, _)| offset)
            .unwrap_or(self.input.len())
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.char_len() as isize;
        let next = (self.cursor as isize + delta).clamp(0, len);
        self.cursor = next as usize;
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    fn insert(&mut self, ch: char) {
        if self.char_len() >= MAX_INPUT_LEN || ch.is_control() {
            return;
        }
        let offset = self.byte_offset(self.cursor);
        self.input.insert(offset, ch);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let offset = self.byte_offset(self.cursor);
            self.input.remove(offset);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let offset = self.byte_offset(self.cursor);
            self.input.remove(offset);
        }
    }

    /// Command for the typed text against `tab`.
    fn submit(&self, tab: &str) -> Result<Command, LedgerError> {
        let tab = tab.to_string();
        let text = self.input.as_str();
        let command = match &self.kind {
            PromptKind::RenameTab { original } => Command::RenameTab {
                from: original.clone(),
                to: text.trim().to_string(),
            },
            PromptKind::AddResource => Command::AddResource {
                tab,
                resource: parse_resource(text)?,
            },
            PromptKind::EditResource { original } => Command::EditResource {
                tab,
                original: original.clone(),
                replacement: parse_resource(text)?,
            },
            PromptKind::AddJob => Command::AddJob {
                tab,
                job: parse_job(text)?,
            },
            PromptKind::EditJob { original } => Command::EditJob {
                tab,
                original: original.clone(),
                replacement: parse_job(text)?,
            },
        };
        Ok(command)
    }
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// Terminal front-end over a [`Ledger`].
pub struct LedgerApp<S> {
    ledger: Ledger<S>,
    config: AppConfig,
    state: UiState,
    prompt: Option<PromptModal>,
    theme: Theme,
}

impl<S: Store> LedgerApp<S> {
    pub fn new(ledger: Ledger<S>, config: AppConfig) -> Self {
        let mut state = UiState::default();
        if config.exploded_totals {
            state.view = TotalsView::Exploded;
        }
        Self {
            ledger,
            config,
            state,
            prompt: None,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let status = match self.ledger.persistence() {
            Persistence::Online => format!("Loaded {} tab(s)", self.ledger.tabs().len()),
            Persistence::Degraded { reason } => {
                format!("Store unavailable, working in memory: {reason}")
            }
        };
        self.state.set_status(status);

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }
            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event).await {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        if self.ledger.is_degraded() {
            warn!("exiting with unsaved in-memory changes");
        }
        Ok(())
    }

    async fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                if self.prompt.is_some() {
                    self.handle_prompt_key(key).await;
                } else if let Some(command) = self.handle_key(key) {
                    self.execute(command).await;
                }
                true
            }
            Some(AppEvent::Input(_)) | Some(AppEvent::Tick) => true,
            None => false,
        }
    }

    /// Dispatch `command`, reporting the outcome in the status line.
    async fn execute(&mut self, command: Command) -> bool {
        let switching = matches!(command, Command::SwitchTab(_) | Command::CreateTab);
        let result = self.ledger.dispatch(command).await;
        if switching {
            self.state.reset_cursors();
        }
        self.state.clamp_cursors(self.ledger.active_record());
        match result {
            Ok(outcome) => {
                self.state.set_status(outcome.describe());
                true
            }
            Err(err) => {
                if err.is_store_failure() {
                    error!(%err, "store operation failed");
                }
                self.state.set_status(format!("Error: {err}"));
                false
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.state.should_quit = true;
            return None;
        }
        let tab = self.ledger.active_tab().to_string();
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.state.should_quit = true;
                None
            }
            KeyCode::Char('t') => Some(Command::CreateTab),
            KeyCode::Char(']') | KeyCode::Right => self.neighbour_tab(1).map(Command::SwitchTab),
            KeyCode::Char('[') | KeyCode::Left => self.neighbour_tab(-1).map(Command::SwitchTab),
            KeyCode::Char('R') => {
                self.open_prompt(PromptKind::RenameTab { original: tab.clone() }, tab);
                None
            }
            KeyCode::Char('a') => {
                self.focus(Focus::Resources);
                self.open_prompt(PromptKind::AddResource, String::new());
                None
            }
            KeyCode::Char('j') => {
                self.focus(Focus::Jobs);
                self.open_prompt(PromptKind::AddJob, String::new());
                None
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                self.prompt_edit_selected();
                None
            }
            KeyCode::Char('d') | KeyCode::Delete => self.remove_selected(tab),
            KeyCode::Tab | KeyCode::BackTab => {
                self.state.focus = self.state.focus.toggled();
                None
            }
            KeyCode::Up => {
                self.state.move_cursor(-1, self.ledger.active_record());
                None
            }
            KeyCode::Down => {
                self.state.move_cursor(1, self.ledger.active_record());
                None
            }
            KeyCode::Char('x') => {
                self.state.view = self.state.view.toggled();
                self.state
                    .set_status(format!("Showing {} totals", self.state.view.label()));
                None
            }
            KeyCode::Char('s') => Some(Command::Flush),
            _ => None,
        }
    }

    async fn handle_prompt_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.prompt = None;
                self.state.set_status("Cancelled".to_string());
            }
            KeyCode::Enter => {
                let submitted = prompt.submit(self.ledger.active_tab());
                match submitted {
                    Ok(command) => {
                        if self.execute(command).await {
                            self.prompt = None;
                        }
                    }
                    Err(err) => self.state.set_status(format!("Error: {err}")),
                }
            }
            KeyCode::Left => prompt.move_cursor(-1),
            KeyCode::Right => prompt.move_cursor(1),
            KeyCode::Home => prompt.move_home(),
            KeyCode::End => prompt.move_end(),
            KeyCode::Backspace => prompt.backspace(),
            KeyCode::Delete => prompt.delete(),
            KeyCode::Char(ch) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    prompt.insert(ch);
                }
            }
            _ => {}
        }
    }

    fn open_prompt(&mut self, kind: PromptKind, initial: String) {
        self.prompt = Some(PromptModal::new(kind, initial));
    }

    fn focus(&mut self, focus: Focus) {
        self.state.focus = focus;
    }

    fn neighbour_tab(&self, delta: isize) -> Option<String> {
        let tabs = self.ledger.tabs();
        if tabs.is_empty() {
            return None;
        }
        let len = tabs.len() as isize;
        let next = (self.ledger.active_index() as isize + delta).rem_euclid(len) as usize;
        tabs.get(next).cloned()
    }

    fn prompt_edit_selected(&mut self) {
        let record = self.ledger.active_record();
        let prompt = match self.state.focus {
            Focus::Resources => record.resources.get(self.state.resource_cursor).map(|resource| {
                PromptModal::new(
                    PromptKind::EditResource {
                        original: resource.name.clone(),
                    },
                    format_resource(resource),
                )
            }),
            Focus::Jobs => record.jobs.get(self.state.job_cursor).map(|job| {
                PromptModal::new(
                    PromptKind::EditJob {
                        original: job.name.clone(),
                    },
                    format_job(job),
                )
            }),
        };
        match prompt {
            Some(prompt) => self.prompt = Some(prompt),
            None => self.state.set_status("Nothing selected".to_string()),
        }
    }

    fn remove_selected(&mut self, tab: String) -> Option<Command> {
        let record = self.ledger.active_record();
        let command = match self.state.focus {
            Focus::Resources => record
                .resources
                .get(self.state.resource_cursor)
                .map(|resource| Command::RemoveResource {
                    tab,
                    name: resource.name.clone(),
                }),
            Focus::Jobs => record
                .jobs
                .get(self.state.job_cursor)
                .map(|job| Command::RemoveJob {
                    tab,
                    name: job.name.clone(),
                }),
        };
        if command.is_none() {
            self.state.set_status("Nothing selected".to_string());
        }
        command
    }

    fn shopping_target(&self) -> Option<ShoppingTarget> {
        let record = self.ledger.active_record();
        match self.state.focus {
            Focus::Resources => record
                .resources
                .get(self.state.resource_cursor)
                .filter(|resource| resource.is_product())
                .map(|resource| ShoppingTarget::Product(resource.name.clone())),
            Focus::Jobs => record
                .jobs
                .get(self.state.job_cursor)
                .map(|job| ShoppingTarget::Job(job.name.clone())),
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(5),
            ])
            .split(frame.size());

        self.render_tabs(frame, layout[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(layout[1]);
        let lists = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(body[0]);

        self.render_resources(frame, lists[0]);
        self.render_jobs(frame, lists[1]);
        self.render_shopping(frame, body[1]);
        self.render_status(frame, layout[2]);

        if let Some(prompt) = &self.prompt {
            self.render_prompt(frame, prompt);
        }
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = self
            .ledger
            .tabs()
            .iter()
            .map(|name| Line::from(name.clone()))
            .collect();
        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title("Games"))
            .select(self.ledger.active_index())
            .style(Style::default().fg(self.theme.muted))
            .highlight_style(
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn render_resources(&self, frame: &mut Frame, area: Rect) {
        let record = self.ledger.active_record();
        let items: Vec<ListItem> = record
            .resources
            .iter()
            .map(|resource| {
                let mut line = vec![Span::styled(
                    resource.name.clone(),
                    Style::default()
                        .fg(self.theme.primary_fg)
                        .add_modifier(Modifier::BOLD),
                )];
                let detail = if resource.is_product() {
                    format!(" = {}", format_lines(&resource.inputs))
                } else {
                    " (resource)".to_string()
                };
                line.push(Span::styled(detail, Style::default().fg(self.theme.muted)));
                ListItem::new(Line::from(line))
            })
            .collect();
        let selected = (!record.resources.is_empty()).then_some(self.state.resource_cursor);
        self.render_list(
            frame,
            area,
            items,
            selected,
            "Resources",
            self.state.focus == Focus::Resources,
        );
    }

    fn render_jobs(&self, frame: &mut Frame, area: Rect) {
        let record = self.ledger.active_record();
        let items: Vec<ListItem> = record
            .jobs
            .iter()
            .map(|job| {
                let detail = if job.products.is_empty() {
                    " (empty)".to_string()
                } else {
                    format!(" = {}", format_lines(&job.products))
                };
                ListItem::new(Line::from(vec![
                    Span::styled(
                        job.name.clone(),
                        Style::default()
                            .fg(self.theme.primary_fg)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(detail, Style::default().fg(self.theme.muted)),
                ]))
            })
            .collect();
        let selected = (!record.jobs.is_empty()).then_some(self.state.job_cursor);
        self.render_list(
            frame,
            area,
            items,
            selected,
            "Jobs",
            self.state.focus == Focus::Jobs,
        );
    }

    fn render_list(
        &self,
        frame: &mut Frame,
        area: Rect,
        items: Vec<ListItem>,
        selected: Option<usize>,
        title: &str,
        focused: bool,
    ) {
        let mut list_state = ListState::default();
        list_state.select(selected);
        let border = if focused {
            Style::default().fg(self.theme.accent)
        } else {
            Style::default().fg(self.theme.muted)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(title.to_string());
        let highlight = if focused {
            Style::default().bg(self.theme.selection_bg)
        } else {
            Style::default()
        };
        let list = List::new(items)
            .block(block)
            .highlight_symbol("▶ ")
            .highlight_style(highlight);
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_shopping(&self, frame: &mut Frame, area: Rect) {
        let title = format!("Shopping list ({})", self.state.view.label());
        let block = Block::default().borders(Borders::ALL).title(title);

        let lines: Vec<Line> = match self.shopping_target() {
            None => vec![Line::from(Span::styled(
                "Select a product or job",
                Style::default().fg(self.theme.muted),
            ))],
            Some(target) => {
                let heading = match &target {
                    ShoppingTarget::Product(name) => format!("1 x {name}"),
                    ShoppingTarget::Job(name) => format!("Job {name}"),
                };
                let mut lines = vec![
                    Line::from(Span::styled(
                        heading,
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(""),
                ];
                let computed =
                    self.ledger
                        .shopping_list(self.ledger.active_tab(), &target, self.state.view);
                match computed {
                    Ok(list) if list.is_empty() => lines.push(Line::from(Span::styled(
                        "Nothing to buy",
                        Style::default().fg(self.theme.muted),
                    ))),
                    Ok(list) => {
                        let width = list.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
                        lines.extend(list.iter().map(|(name, quantity)| {
                            Line::from(vec![
                                Span::raw(format!("{name:<width$}  ")),
                                Span::styled(
                                    quantity.to_string(),
                                    Style::default().fg(self.theme.success),
                                ),
                            ])
                        }));
                    }
                    Err(err) => lines.push(Line::from(Span::styled(
                        err.to_string(),
                        Style::default().fg(self.theme.danger),
                    ))),
                }
                lines
            }
        };

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let primary = Line::from(self.state.status.clone());
        let persistence = match self.ledger.persistence() {
            Persistence::Online => {
                let saved = self
                    .ledger
                    .last_saved()
                    .map(|at| at.with_timezone(&Local).format("%H:%M:%S").to_string())
                    .unwrap_or_else(|| "never".to_string());
                Line::from(Span::styled(
                    format!(
                        "Store: {}  (last saved {saved})",
                        self.config.store_path().display()
                    ),
                    Style::default().fg(self.theme.muted),
                ))
            }
            Persistence::Degraded { reason } => Line::from(Span::styled(
                format!("Memory only: {reason}  (s to retry)"),
                Style::default().fg(self.theme.warning),
            )),
        };
        let help = Line::from(Span::styled(
            "t new tab  [ ] switch  R rename  a add  j job  e edit  d delete  Tab focus  x totals  s save  q quit",
            Style::default().fg(self.theme.muted),
        ));
        let paragraph = Paragraph::new(vec![primary, persistence, help])
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_prompt(&self, frame: &mut Frame, prompt: &PromptModal) {
        let frame_area = frame.size();
        let mut width = cmp::min(70_u16, frame_area.width.saturating_sub(4));
        width = cmp::max(width, 24_u16);
        let height = 7_u16.min(frame_area.height.saturating_sub(2)).max(5_u16);
        let x = frame_area.x + (frame_area.width.saturating_sub(width)) / 2;
        let y = frame_area.y + (frame_area.height.saturating_sub(height)) / 2;
        let area = Rect::new(x, y, width, height);

        frame.render_widget(Clear, area);

        let input_line = Line::from(vec![
            Span::styled("> ", Style::default().fg(self.theme.accent)),
            Span::raw(prompt.input.clone()),
        ]);
        let helper = Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" confirm  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" cancel"),
        ]);

        let paragraph = Paragraph::new(vec![
            Line::from(prompt.kind.instruction()),
            input_line,
            Line::from(""),
            helper,
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(prompt.kind.title()),
        )
        .wrap(Wrap { trim: true });

        frame.render_widget(paragraph, area);

        let cursor_x =
            (area.x + 3 + prompt.cursor as u16).min(area.x + area.width.saturating_sub(2));
        let cursor_y = area.y + 2;
        frame.set_cursor(cursor_x, cursor_y);
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    info!("terminal restored");
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

struct UiState {
    focus: Focus,
    resource_cursor: usize,
    job_cursor: usize,
    view: TotalsView,
    status: String,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            focus: Focus::Resources,
            resource_cursor: 0,
            job_cursor: 0,
            view: TotalsView::Direct,
            status: "Ready".to_string(),
            should_quit: false,
        }
    }
}

impl UiState {
    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    fn reset_cursors(&mut self) {
        self.resource_cursor = 0;
        self.job_cursor = 0;
    }

    fn move_cursor(&mut self, delta: isize, record: &GameRecord) {
        let (cursor, len) = match self.focus {
            Focus::Resources => (&mut self.resource_cursor, record.resources.len()),
            Focus::Jobs => (&mut self.job_cursor, record.jobs.len()),
        };
        if len == 0 {
            *cursor = 0;
            return;
        }
        let next = (*cursor as isize + delta).clamp(0, len as isize - 1);
        *cursor = next as usize;
    }

    fn clamp_cursors(&mut self, record: &GameRecord) {
        self.resource_cursor = self
            .resource_cursor
            .min(record.resources.len().saturating_sub(1));
        self.job_cursor = self.job_cursor.min(record.jobs.len().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{InputLine, Job, Resource};

    #[test]
    fn prompt_edits_at_cursor() {
        let mut prompt = PromptModal::new(PromptKind::AddResource, "Gar".to_string());
        prompt.move_cursor(-2);
        prompt.insert('e');
        assert_eq!(prompt.input, "Gear");
        prompt.move_end();
        prompt.backspace();
        prompt.move_home();
        prompt.delete();
        assert_eq!(prompt.input, "ea");
        prompt.move_cursor(-5);
        assert_eq!(prompt.cursor, 0);
    }

    #[test]
    fn prompt_edits_non_ascii_names_by_character() {
        let mut prompt = PromptModal::new(
            PromptKind::RenameTab {
                original: "Café".to_string(),
            },
            "Café".to_string(),
        );
        assert_eq!(prompt.cursor, 4);
        prompt.backspace();
        assert_eq!(prompt.input, "Caf");
        prompt.insert('é');
        prompt.insert('s');
        assert_eq!(prompt.input, "Cafés");
        prompt.move_cursor(-2);
        prompt.delete();
        assert_eq!(prompt.input, "Cafs");
        prompt.move_home();
        prompt.insert('Ü');
        assert_eq!(prompt.input, "ÜCafs");
        prompt.move_end();
        assert_eq!(prompt.cursor, 5);
    }

    #[test]
    fn prompt_builds_commands_for_the_active_tab() {
        let prompt = PromptModal::new(PromptKind::AddResource, "Gear = Iron x2".to_string());
        assert_eq!(
            prompt.submit("Mars").unwrap(),
            Command::AddResource {
                tab: "Mars".to_string(),
                resource: Resource::product("Gear", vec![InputLine::new("Iron", 2)]),
            }
        );

        let prompt = PromptModal::new(
            PromptKind::EditJob {
                original: "Old".to_string(),
            },
            "New = Gear x5".to_string(),
        );
        assert_eq!(
            prompt.submit("Mars").unwrap(),
            Command::EditJob {
                tab: "Mars".to_string(),
                original: "Old".to_string(),
                replacement: Job::new("New", vec![InputLine::new("Gear", 5)]),
            }
        );

        let prompt = PromptModal::new(PromptKind::AddResource, "Gear = ".to_string());
        assert!(prompt.submit("Mars").is_err());
    }

    #[test]
    fn cursors_stay_inside_lists() {
        let mut record = GameRecord::default();
        record.resources.push(Resource::raw("Iron"));
        record.resources.push(Resource::raw("Copper"));

        let mut state = UiState::default();
        state.move_cursor(5, &record);
        assert_eq!(state.resource_cursor, 1);
        record.resources.pop();
        state.clamp_cursors(&record);
        assert_eq!(state.resource_cursor, 0);

        state.focus = Focus::Jobs;
        state.move_cursor(1, &record);
        assert_eq!(state.job_cursor, 0);
    }
}
