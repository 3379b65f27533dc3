//! Check-in tab: pick a name, point at a capture file, confirm.

use image::DynamicImage;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::db::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckinFocus {
    Users,
    PhotoPath,
}

/// A decoded capture waiting for the user's confirmation.
pub struct PendingCapture {
    pub image: DynamicImage,
    pub width: u32,
    pub height: u32,
    pub source: String,
}

/// State for the check-in tab.
pub struct CheckinView {
    pub users: Vec<User>,
    pub list_state: ListState,
    pub focus: CheckinFocus,
    pub photo_path: String,
    pub pending: Option<PendingCapture>,
}

impl CheckinView {
    pub fn new() -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            users: Vec::new(),
            list_state,
            focus: CheckinFocus::Users,
            photo_path: String::new(),
            pending: None,
        }
    }

    pub fn refresh_users(&mut self, users: Vec<User>) {
        self.users = users;
        let selected = self.list_state.selected().unwrap_or(0);
        if self.users.is_empty() {
            self.list_state.select(None);
        } else if selected >= self.users.len() {
            self.list_state.select(Some(self.users.len() - 1));
        } else {
            self.list_state.select(Some(selected));
        }
    }

    pub fn selected_user(&self) -> Option<&User> {
        self.users.get(self.list_state.selected()?)
    }

    pub fn move_down(&mut self) {
        if let Some(selected) = self.list_state.selected() {
            if selected + 1 < self.users.len() {
                self.list_state.select(Some(selected + 1));
            }
        }
    }

    pub fn move_up(&mut self) {
        if let Some(selected) = self.list_state.selected() {
            if selected > 0 {
                self.list_state.select(Some(selected - 1));
            }
        }
    }

    pub fn handle_char(&mut self, c: char) {
        self.photo_path.push(c);
        // Editing the path invalidates a previously loaded capture.
        self.pending = None;
    }

    pub fn backspace(&mut self) {
        self.photo_path.pop();
        self.pending = None;
    }
}

pub fn render(frame: &mut Frame, view: &mut CheckinView, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    render_user_list(frame, view, columns[0]);
    render_detail(frame, view, columns[1]);
}

fn render_user_list(frame: &mut Frame, view: &mut CheckinView, area: Rect) {
    let focused = view.focus == CheckinFocus::Users;
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    if view.users.is_empty() {
        let empty = Paragraph::new("  No one registered yet.\n  Use the Register tab first.")
            .style(Style::default().fg(Color::DarkGray))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title(" Who are you? "),
            );
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = view
        .users
        .iter()
        .map(|u| ListItem::new(format!(" {}", u.display_label())))
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(" Who are you? "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));
    frame.render_stateful_widget(list, area, &mut view.list_state);
}

fn render_detail(frame: &mut Frame, view: &CheckinView, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(0),
        ])
        .split(area);

    // Selected user details, like the original's email/phone echo.
    let detail = match view.selected_user() {
        Some(user) => format!(
            " Email: {}\n Phone: {}",
            user.email.as_deref().unwrap_or("—"),
            user.phone.as_deref().unwrap_or("—"),
        ),
        None => " Select a name on the left.".to_string(),
    };
    frame.render_widget(
        Paragraph::new(detail).block(Block::default().borders(Borders::ALL).title(" Details ")),
        chunks[0],
    );

    let path_focused = view.focus == CheckinFocus::PhotoPath;
    let path_style = if path_focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    frame.render_widget(
        Paragraph::new(view.photo_path.as_str()).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(path_style)
                .title(" Photo file "),
        ),
        chunks[1],
    );

    let preview = match &view.pending {
        Some(capture) => Paragraph::new(format!(
            " {} — {}x{}\n Press Enter to confirm the check-in.",
            capture.source, capture.width, capture.height
        ))
        .style(Style::default().fg(Color::Green)),
        None => Paragraph::new(" No capture loaded.")
            .style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(
        preview.block(Block::default().borders(Borders::ALL).title(" Preview ")),
        chunks[2],
    );

    let hint = Paragraph::new(
        " ↑↓: pick name  ←→: switch focus  Enter: load, then confirm  Esc: discard ",
    )
    .style(Style::default().fg(Color::Gray));
    frame.render_widget(hint, chunks[3]);
}
