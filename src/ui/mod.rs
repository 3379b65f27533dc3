pub mod admin;
pub mod checkin;
pub mod confirm_dialog;
pub mod register;
mod status_bar;

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Tabs},
};

use crate::app::{App, Tab};

pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Main layout: tab strip + content + status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_tabs(frame, app, chunks[0]);

    match app.tab {
        Tab::Register => register::render(frame, &app.register, chunks[1]),
        Tab::Checkin => checkin::render(frame, &mut app.checkin, chunks[1]),
        Tab::Admin => admin::render(frame, &mut app.admin, &app.session, chunks[1]),
    }

    status_bar::render(frame, app, chunks[2]);

    if let Some(ref dialog) = app.confirm_dialog {
        confirm_dialog::render(frame, dialog, area);
    }
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles = vec![" Register ", " Check-in ", " Admin "];
    let selected = match app.tab {
        Tab::Register => 0,
        Tab::Checkin => 1,
        Tab::Admin => 2,
    };
    let tabs = Tabs::new(titles)
        .select(selected)
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).title(" ponto "));
    frame.render_widget(tabs, area);
}
