//! Registration tab: the four-field employee form.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

/// Field order in the form.
pub const FIELD_COUNT: usize = 4;

const LABELS: [&str; FIELD_COUNT] = ["Name*", "Role", "Phone", "Email"];
const HINTS: [&str; FIELD_COUNT] = [
    "Ex.: Maria Silva",
    "Ex.: Produção",
    "(xx) xxxxx-xxxx",
    "email@company.com",
];

/// State for the registration form.
#[derive(Debug, Default)]
pub struct RegisterForm {
    pub values: [String; FIELD_COUNT],
    pub focus: usize,
    /// Inline validation error, shown until the next edit.
    pub error: Option<String>,
}

impl RegisterForm {
    pub fn name(&self) -> &str {
        &self.values[0]
    }

    pub fn role(&self) -> &str {
        &self.values[1]
    }

    pub fn phone(&self) -> &str {
        &self.values[2]
    }

    pub fn email(&self) -> &str {
        &self.values[3]
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % FIELD_COUNT;
    }

    pub fn prev_field(&mut self) {
        self.focus = (self.focus + FIELD_COUNT - 1) % FIELD_COUNT;
    }

    pub fn handle_char(&mut self, c: char) {
        self.values[self.focus].push(c);
        self.error = None;
    }

    pub fn backspace(&mut self) {
        self.values[self.focus].pop();
        self.error = None;
    }

    pub fn clear(&mut self) {
        self.values = Default::default();
        self.focus = 0;
        self.error = None;
    }
}

pub fn render(frame: &mut Frame, form: &RegisterForm, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    for i in 0..FIELD_COUNT {
        let focused = form.focus == i;
        let border_style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let content = if form.values[i].is_empty() && !focused {
            Span::styled(HINTS[i], Style::default().fg(Color::DarkGray))
        } else {
            Span::raw(form.values[i].as_str())
        };
        let input = Paragraph::new(Line::from(content)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(format!(" {} ", LABELS[i])),
        );
        frame.render_widget(input, chunks[i]);
    }

    let footer = match &form.error {
        Some(error) => Line::from(Span::styled(
            format!(" {} ", error),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(Span::styled(
            " ↑↓: field  Enter: save  Esc: clear form ",
            Style::default().fg(Color::Gray),
        )),
    };
    frame.render_widget(Paragraph::new(footer), chunks[4]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_cycling_wraps() {
        let mut form = RegisterForm::default();
        for _ in 0..FIELD_COUNT {
            form.next_field();
        }
        assert_eq!(form.focus, 0);

        form.prev_field();
        assert_eq!(form.focus, FIELD_COUNT - 1);
    }

    #[test]
    fn test_editing_clears_error() {
        let mut form = RegisterForm::default();
        form.error = Some("name is required".into());
        form.handle_char('A');
        assert!(form.error.is_none());
        assert_eq!(form.name(), "A");
    }
}
