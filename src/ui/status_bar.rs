use ratatui::{prelude::*, widgets::Paragraph};

use crate::app::{App, Tab};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    // A status message takes over the whole bar until the next action.
    if let Some(ref message) = app.status_message {
        let line = Line::from(Span::styled(
            format!(" {} ", message),
            Style::default().fg(Color::Yellow).bg(Color::DarkGray),
        ));
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let counts = format!(" {} users | {} check-ins ", app.user_total, app.checkin_total);
    let hints = match app.tab {
        Tab::Register => " Tab: next tab  Ctrl+q: quit ",
        Tab::Checkin => " Tab: next tab  Ctrl+q: quit ",
        Tab::Admin => " Tab: next tab  L: lock  Ctrl+q: quit ",
    };

    let mut spans = vec![Span::styled(
        counts.clone(),
        Style::default().fg(Color::White).bg(Color::DarkGray),
    )];

    let available = area.width as usize;
    let used = counts.len() + hints.len();
    if available > used {
        spans.push(Span::raw(" ".repeat(available - used)));
    }
    spans.push(Span::styled(
        hints,
        Style::default().fg(Color::White).bg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
