//! Rendering of the browser screens

use std::collections::BTreeMap;

use chrono::NaiveDate;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::api::{SeatMap, SeatStatus, Section, Session};
use crate::catalog::{seats, SeatCount};
use crate::tui::{App, FilterList, ListItem, Subscription};

use super::app::{BrowserApp, State};
use super::models::Screen;

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

fn faint() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

pub fn render(state: &mut State, frame: &mut Frame) {
    let area = frame.area();
    let header = header_lines(state);
    let [header_area, body_area] =
        Layout::vertical([Constraint::Length(header.len() as u16 + 1), Constraint::Min(0)]).areas(area);
    frame.render_widget(Paragraph::new(header), header_area);

    match &state.screen {
        Screen::LoadingCities | Screen::LoadingTheaters | Screen::LoadingSessions | Screen::LoadingSeatMap { .. } => {
            render_loading(state, frame, body_area)
        }
        Screen::SelectCity => render_list(frame, body_area, &state.city_list),
        Screen::SelectTheater => render_list(frame, body_area, &state.theater_list),
        Screen::ManageTheaters => render_list(frame, body_area, &state.visibility_list),
        Screen::SelectMovie { cross_theater } => {
            let body_area = if *cross_theater {
                render_catalog_summary(state, frame, body_area)
            } else {
                body_area
            };
            render_list(frame, body_area, &state.movie_list)
        }
        Screen::ShowSessions { .. } => render_list(frame, body_area, &state.session_list),
        Screen::SelectSection { .. } => render_list(frame, body_area, &state.section_list),
        Screen::SelectDate { .. } => render_list(frame, body_area, &state.date_list),
        Screen::ShowSeatMap { seat_map, .. } => render_seat_map(frame, body_area, seat_map, state.show_seat_numbers),
        Screen::Error {
            message,
            suggest_next_day,
            ..
        } => {
            if *suggest_next_day {
                render_next_day_panel(frame, body_area, state.date)
            } else {
                render_error(frame, body_area, message)
            }
        }
    }
}

fn header_lines(state: &State) -> Vec<Line<'static>> {
    let mut lines = vec![Line::styled(BrowserApp::title(), bold())];

    let mut meta = Vec::new();
    if let Some(city) = &state.city {
        meta.push(format!("City: {}", city.name));
    }
    if let Some(theater) = &state.theater {
        meta.push(format!("Theater: {}", theater.name));
    }
    if state.cross_theater {
        meta.push("Mode: movie across theaters".to_string());
    }
    if let Some(location) = &state.location {
        let label = location.label();
        if !label.is_empty() {
            meta.push(format!("Location: {}", label));
        }
    }
    if state.screen.shows_date() {
        meta.push(format!("Date: {}", state.date.format("%Y-%m-%d")));
    }
    if let Some((session, section)) = seat_context(&state.screen) {
        if let Some(at) = session.starts_at() {
            meta.push(format!("Session: {}", at.format("%H:%M")));
        }
        if let Some(section) = section.filter(|section| !section.name.is_empty()) {
            meta.push(format!("Section: {}", section.name));
        }
    }
    if !meta.is_empty() {
        lines.push(Line::styled(meta.join(" • "), faint()));
    }

    if let Some(list) = state.active_list() {
        if list.is_filtered() {
            lines.push(Line::styled(format!("Filter: {}", list.filter()), faint()));
        }
    }

    lines.push(Line::styled(key_hints(state), faint()));
    lines
}

fn seat_context(screen: &Screen) -> Option<(&Session, Option<&Section>)> {
    match screen {
        Screen::SelectSection { session } => Some((session, None)),
        Screen::ShowSeatMap { session, section, .. } => Some((session, Some(section))),
        _ => None,
    }
}

/// Help line built from the subscriptions active on this screen
fn key_hints(state: &State) -> String {
    let mut hints: Vec<String> = BrowserApp::subscriptions(state)
        .into_iter()
        .filter_map(|sub| match sub {
            Subscription::Keyboard { key, description, .. } => Some(format!("{} {}", key.label(), description)),
            Subscription::Timer { .. } => None,
        })
        .collect();
    if state.active_list().is_some_and(|list| list.filtering_enabled()) {
        let at = hints.len().min(2);
        hints.insert(at, "type to filter".to_string());
    }
    hints.join(" • ")
}

fn render_loading(state: &State, frame: &mut Frame, area: Rect) {
    let spinner = SPINNER_FRAMES[state.spinner_frame % SPINNER_FRAMES.len()];
    let lines = vec![
        Line::from(vec![
            Span::styled(spinner, Style::default().fg(Color::Magenta)),
            Span::raw(" "),
            Span::raw(state.screen.loading_title()),
        ]),
        Line::default(),
        Line::styled("Fetching data...", faint()),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_list<T: ListItem>(frame: &mut Frame, area: Rect, list: &FilterList<T>) {
    let mut lines = vec![
        Line::styled(
            format!(" {} ", list.title()),
            Style::default().fg(Color::Black).bg(Color::Magenta).add_modifier(Modifier::BOLD),
        ),
        Line::default(),
    ];

    if list.visible_len() == 0 {
        let text = if list.is_filtered() { "No matches." } else { "No items." };
        lines.push(Line::styled(text, faint()));
        frame.render_widget(Paragraph::new(lines), area);
        return;
    }

    let range = list.visible_range();
    let selected = list.selected_index();
    for (offset, item) in list.page_items().into_iter().enumerate() {
        let is_selected = selected == Some(range.start + offset);
        let (marker, title_style, description_style) = if is_selected {
            ("│ ", Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD), Style::default().fg(Color::Magenta))
        } else {
            ("  ", Style::default(), faint())
        };
        lines.push(Line::from(vec![
            Span::styled(marker, title_style),
            Span::styled(item.title(), title_style),
        ]));
        lines.push(Line::from(vec![
            Span::styled(marker, title_style),
            Span::styled(item.description(), description_style),
        ]));
    }

    if range.end < list.visible_len() || range.start > 0 {
        lines.push(Line::default());
        lines.push(Line::styled(
            format!("{}-{} of {}", range.start + 1, range.end, list.visible_len()),
            faint(),
        ));
    }
    frame.render_widget(Paragraph::new(lines), area);
}

/// Partial failures of the aggregation, shown above the movie list.
/// Returns the area left for the list.
fn render_catalog_summary(state: &State, frame: &mut Frame, area: Rect) -> Rect {
    let summary = state.catalog_summary;
    if summary.failed == 0 && summary.ignored == 0 {
        return area;
    }
    let [summary_area, rest] = Layout::vertical([Constraint::Length(2), Constraint::Min(0)]).areas(area);
    let text = format!(
        "{} theaters failed • {} theaters without sessions",
        summary.failed, summary.ignored
    );
    frame.render_widget(Paragraph::new(Line::styled(text, faint())), summary_area);
    rest
}

fn render_error(frame: &mut Frame, area: Rect, message: &str) {
    let lines = vec![
        Line::styled(message.to_string(), Style::default().fg(Color::Red)),
        Line::default(),
        Line::styled("Press esc to go back or ctrl+c to quit.", faint()),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_next_day_panel(frame: &mut Frame, area: Rect, date: NaiveDate) {
    let next = date.succ_opt().unwrap_or(date);
    let chip = Style::default().fg(Color::Black).bg(Color::Indexed(63)).add_modifier(Modifier::BOLD);

    let lines = vec![
        Line::styled(
            format!("No sessions were found for {}.", date.format("%Y-%m-%d")),
            Style::default().fg(Color::Indexed(203)).add_modifier(Modifier::BOLD),
        ),
        Line::default(),
        Line::styled("Press ENTER to try the next day, or CTRL+D to pick another date.", faint()),
        Line::default(),
        Line::from(vec![
            Span::styled("  ENTER   ", chip),
            Span::raw("  "),
            Span::styled(format!("Try {} (tomorrow)", next.format("%Y-%m-%d")), bold()),
        ]),
        Line::default(),
        Line::from(vec![
            Span::styled("  CTRL+D  ", chip),
            Span::raw("  "),
            Span::raw("Pick any other date"),
        ]),
        Line::default(),
        Line::styled("ESC back • CTRL+C quit", faint()),
    ];

    let width = area.width.saturating_sub(8).clamp(40, 84).min(area.width);
    let height = (lines.len() as u16 + 4).min(area.height);
    let panel = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + 1u16.min(area.height.saturating_sub(height)),
        width,
        height,
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Indexed(63)))
        .title(Span::styled(" No sessions ", chip));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        panel,
    );
}

/// How one seat is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatToken {
    Available,
    Accessible,
    Occupied,
    Blocked,
    Unknown,
}

impl SeatToken {
    fn for_seat(status: SeatStatus, accessible: bool) -> Self {
        match status {
            SeatStatus::Available if accessible => SeatToken::Accessible,
            SeatStatus::Available => SeatToken::Available,
            SeatStatus::Occupied => SeatToken::Occupied,
            SeatStatus::Blocked => SeatToken::Blocked,
            SeatStatus::Unknown => SeatToken::Unknown,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            SeatToken::Available => "[]",
            SeatToken::Accessible => "DD",
            SeatToken::Occupied => "XX",
            SeatToken::Blocked => "##",
            SeatToken::Unknown => "  ",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeatCell {
    pub token: SeatToken,
    pub label: String,
    pub front: bool,
}

/// Seats placed on their grid positions, trimmed to the occupied bounds
#[derive(Debug, Clone, PartialEq)]
pub struct SeatGrid {
    /// One entry per row from the first to the last occupied one
    pub rows: Vec<(String, Vec<Option<SeatCell>>)>,
    /// Statistics of the whole map, as shown in the session list
    pub counts: SeatCount,
}

impl SeatGrid {
    /// None when the map has no bounds or no seat falls inside them
    pub fn build(seat_map: &SeatMap) -> Option<Self> {
        let rows = seat_map.bounds.lines;
        let columns = seat_map.bounds.columns;
        if rows <= 0 || columns <= 0 {
            return None;
        }

        let front = seats::front_lines(seat_map, seats::FRONT_ROWS);
        let mut cells: BTreeMap<(i32, i32), SeatCell> = BTreeMap::new();
        let mut row_labels: BTreeMap<i32, String> = BTreeMap::new();
        for seat in seat_map.lines.iter().flat_map(|line| line.seats.iter()) {
            let (row, column) = (seat.line - 1, seat.column - 1);
            if row < 0 || column < 0 || row >= rows || column >= columns {
                continue;
            }

            let is_front = front.contains(&seat.line);
            row_labels.entry(row).or_insert_with(|| seat.row_label());
            cells.insert(
                (row, column),
                SeatCell {
                    token: SeatToken::for_seat(seat.status(), seat.is_accessible()),
                    label: seat.number_label(),
                    front: is_front,
                },
            );
        }

        let first_row = cells.keys().map(|(row, _)| *row).min()?;
        let last_row = cells.keys().map(|(row, _)| *row).max()?;
        let first_column = cells.keys().map(|(_, column)| *column).min()?;
        let last_column = cells.keys().map(|(_, column)| *column).max()?;

        let rows = (first_row..=last_row)
            .map(|row| {
                let label = row_labels
                    .get(&row)
                    .filter(|label| !label.is_empty())
                    .cloned()
                    .unwrap_or_else(|| (row + 1).to_string());
                let row_cells = (first_column..=last_column)
                    .map(|column| cells.get(&(row, column)).cloned())
                    .collect();
                (label, row_cells)
            })
            .collect();

        Some(Self {
            rows,
            counts: seats::score(seat_map),
        })
    }

    pub fn column_count(&self) -> usize {
        self.rows.first().map(|(_, cells)| cells.len()).unwrap_or(0)
    }
}

/// Center `text` in `width` columns, truncating when it does not fit
fn pad_cell(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.chars().take(width).collect();
    }
    let padding = width - len;
    let left = padding / 2;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(padding - left))
}

fn seat_style(cell: &SeatCell) -> Style {
    match cell.token {
        SeatToken::Available if cell.front => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        SeatToken::Available => Style::default().fg(Color::Green),
        SeatToken::Occupied => Style::default().fg(Color::Red),
        SeatToken::Blocked => Style::default().fg(Color::DarkGray),
        SeatToken::Accessible => Style::default().fg(Color::Yellow),
        SeatToken::Unknown => Style::default(),
    }
}

fn render_seat_map(frame: &mut Frame, area: Rect, seat_map: &SeatMap, show_numbers: bool) {
    let Some(grid) = SeatGrid::build(seat_map) else {
        frame.render_widget(Paragraph::new("No seat map data."), area);
        return;
    };

    let row_width = grid.rows.iter().map(|(label, _)| label.chars().count()).max().unwrap_or(0).max(2);
    let label_width = if show_numbers {
        grid.rows
            .iter()
            .flat_map(|(_, cells)| cells.iter().flatten())
            .map(|cell| cell.label.chars().count())
            .max()
            .unwrap_or(0)
    } else {
        0
    };
    let cell_width = label_width.max(2);

    let mut lines: Vec<Line> = Vec::with_capacity(grid.rows.len() + 8);
    for (label, cells) in &grid.rows {
        let mut spans = vec![Span::raw(format!("{:>width$} ", label, width = row_width))];
        for (index, cell) in cells.iter().enumerate() {
            if index > 0 {
                spans.push(Span::raw(" "));
            }
            match cell {
                Some(cell) => {
                    let text = if show_numbers && !cell.label.is_empty() {
                        cell.label.as_str()
                    } else {
                        cell.token.symbol()
                    };
                    spans.push(Span::styled(pad_cell(text, cell_width), seat_style(cell)));
                }
                None => spans.push(Span::raw(" ".repeat(cell_width))),
            }
        }
        spans.push(Span::raw(format!(" {:>width$}", label, width = row_width)));
        lines.push(Line::from(spans));
    }

    let grid_width = (grid.column_count() * (cell_width + 1)).saturating_sub(1);
    let indent = " ".repeat(row_width + 1);
    let border = Style::default().fg(Color::Indexed(214)).bg(Color::Indexed(236));
    let screen = Style::default().fg(Color::Black).bg(Color::Indexed(214)).add_modifier(Modifier::BOLD);
    let [top, middle, bottom] = screen_bar(grid_width, "SCREEN");
    lines.push(Line::default());
    lines.push(Line::from(vec![Span::raw(indent.clone()), Span::styled(top, border)]));
    lines.push(Line::from(vec![Span::raw(indent.clone()), Span::styled(middle, screen)]));
    lines.push(Line::from(vec![Span::raw(indent.clone()), Span::styled(bottom, border)]));
    lines.push(Line::from(vec![Span::raw(indent), Span::styled("Front / Screen", faint())]));
    lines.push(Line::default());

    let legend = if show_numbers {
        "Legend: color shows status • numbers are seat labels • front rows in yellow"
    } else {
        "Legend: [] available • XX occupied • DD accessibility • ## blocked • front rows (not ideal)"
    };
    lines.push(Line::styled(legend, faint()));
    lines.push(Line::styled(counts_line(&grid.counts), faint()));

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Left), area);
}

fn counts_line(counts: &SeatCount) -> String {
    let percent = f64::from(counts.available) / f64::from(counts.total.max(1)) * 100.0;
    format!(
        "Available: {} • Ideal: {} • Front: {} • Pairs: {} • Occupied: {} • Blocked: {} • Total: {} • {:.0}% available",
        counts.available,
        counts.ideal_available,
        counts.non_ideal_available,
        counts.pair_available,
        counts.occupied,
        counts.blocked,
        counts.total,
        percent
    )
}

/// Three-line rounded box with a centered label
fn screen_bar(width: usize, label: &str) -> [String; 3] {
    let label = format!(" {} ", label);
    let width = width.max(label.chars().count() + 2).max(10);
    let inner = width - 2;
    let left = (inner - label.chars().count()) / 2;
    let right = inner - label.chars().count() - left;
    [
        format!("╭{}╮", "─".repeat(inner)),
        format!("│{}{}{}│", " ".repeat(left), label, " ".repeat(right)),
        format!("╰{}╯", "─".repeat(inner)),
    ]
}
