//! Admin tab: password gate, grouped record browser, deletion marking.

use chrono::NaiveDate;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

use crate::grouping::GroupedView;
use crate::selection::DeletionSelection;
use crate::session::AdminSession;

/// One visual row of the grouped record browser. The grouped view is
/// flattened so a single cursor can walk headers and entries alike.
#[derive(Debug, Clone)]
pub enum AdminRow {
    User {
        name: String,
        role: Option<String>,
        count: usize,
    },
    Day {
        day: NaiveDate,
        count: usize,
    },
    Entry {
        checkin_id: i64,
        photo_path: String,
        time: String,
    },
}

/// State for the admin tab.
pub struct AdminView {
    pub rows: Vec<AdminRow>,
    pub list_state: ListState,
    pub password_input: String,
    /// Total records behind the current rows.
    pub total: usize,
}

impl AdminView {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            list_state: ListState::default(),
            password_input: String::new(),
            total: 0,
        }
    }

    /// Flatten a freshly computed grouped view into rows.
    pub fn rebuild(&mut self, view: &GroupedView) {
        self.rows.clear();
        for user in &view.users {
            self.rows.push(AdminRow::User {
                name: user.name.clone(),
                role: user.role.clone(),
                count: user.total_entries(),
            });
            for day in &user.days {
                self.rows.push(AdminRow::Day { day: day.day, count: day.entries.len() });
                for entry in &day.entries {
                    self.rows.push(AdminRow::Entry {
                        checkin_id: entry.checkin_id,
                        photo_path: entry.photo_path.clone(),
                        time: entry.created_at.format("%H:%M:%S").to_string(),
                    });
                }
            }
        }
        self.total = view.total_entries();

        let selected = self.list_state.selected().unwrap_or(0);
        if self.rows.is_empty() {
            self.list_state.select(None);
        } else {
            self.list_state.select(Some(selected.min(self.rows.len() - 1)));
        }
    }

    pub fn move_down(&mut self) {
        if let Some(selected) = self.list_state.selected() {
            if selected + 1 < self.rows.len() {
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

    /// The entry under the cursor, if the cursor is on an entry row.
    pub fn current_entry(&self) -> Option<(i64, &str)> {
        match self.rows.get(self.list_state.selected()?) {
            Some(AdminRow::Entry { checkin_id, photo_path, .. }) => {
                Some((*checkin_id, photo_path.as_str()))
            }
            _ => None,
        }
    }
}

pub fn render(frame: &mut Frame, view: &mut AdminView, session: &AdminSession, area: Rect) {
    if !session.is_authenticated() {
        render_gate(frame, view, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)])
        .split(area);

    render_records(frame, view, &session.selection, chunks[0]);
    render_footer(frame, view, session, chunks[1]);
}

fn render_gate(frame: &mut Frame, view: &AdminView, area: Rect) {
    let width = 50.min(area.width.saturating_sub(4));
    let height = 5;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let dialog_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, dialog_area);

    let masked = "*".repeat(view.password_input.chars().count());
    let prompt = Paragraph::new(format!("\n {}", masked)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Admin password "),
    );
    frame.render_widget(prompt, dialog_area);
}

fn render_records(
    frame: &mut Frame,
    view: &mut AdminView,
    selection: &DeletionSelection,
    area: Rect,
) {
    if view.rows.is_empty() {
        let empty = Paragraph::new("  No check-ins recorded yet.")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" Check-ins "));
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = view
        .rows
        .iter()
        .map(|row| match row {
            AdminRow::User { name, role, count } => {
                let role = role.as_deref().unwrap_or("—");
                ListItem::new(format!(" {} ({}) — {} check-ins", name, role, count)).style(
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )
            }
            AdminRow::Day { day, count } => {
                ListItem::new(format!("   {} — {}", day, count))
                    .style(Style::default().fg(Color::Yellow))
            }
            AdminRow::Entry { checkin_id, photo_path, time } => {
                let mark = if selection.is_marked(*checkin_id) { "[x]" } else { "[ ]" };
                ListItem::new(format!("     {} {}  {}", mark, time, photo_path))
            }
        })
        .collect();

    let title = format!(" Check-ins ({}) ", view.total);
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::DarkGray));
    frame.render_stateful_widget(list, area, &mut view.list_state);
}

fn render_footer(frame: &mut Frame, view: &AdminView, session: &AdminSession, area: Rect) {
    let marked = session.selection.len();
    let confirm = if session.confirm_armed() {
        Span::styled(
            " CONFIRMED — d deletes ",
            Style::default().fg(Color::Black).bg(Color::Red),
        )
    } else {
        Span::styled(" c: arm deletion ", Style::default().fg(Color::Gray))
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} marked of {} ", marked, view.total),
            Style::default().fg(Color::White),
        ),
        confirm,
        Span::styled(
            " space: mark  r: reload  o: sweep  m: migrate keys  L: lock ",
            Style::default().fg(Color::Gray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CheckinWithUser;
    use crate::grouping::group_records;
    use chrono::{TimeZone, Utc};
    use chrono_tz::America::Belem;

    #[test]
    fn test_rebuild_flattens_headers_and_entries() {
        let records = vec![
            CheckinWithUser {
                id: 2,
                user_id: 1,
                photo_path: "1/2026-08-07/120000000000.jpg".into(),
                created_at: "2026-08-07T15:00:00.000000Z".into(),
                user_name: Some("Ana".into()),
                user_role: None,
            },
            CheckinWithUser {
                id: 1,
                user_id: 1,
                photo_path: "1/2026-08-06/120000000000.jpg".into(),
                created_at: "2026-08-06T15:00:00.000000Z".into(),
                user_name: Some("Ana".into()),
                user_role: None,
            },
        ];
        let view = group_records(&records, Belem, Utc.with_ymd_and_hms(2026, 8, 7, 16, 0, 0).unwrap());

        let mut admin = AdminView::new();
        admin.rebuild(&view);

        // One user header, two day headers, two entries.
        assert_eq!(admin.rows.len(), 5);
        assert_eq!(admin.total, 2);
        assert!(matches!(admin.rows[0], AdminRow::User { .. }));
        assert!(matches!(admin.rows[1], AdminRow::Day { .. }));
        assert!(matches!(admin.rows[2], AdminRow::Entry { .. }));

        // Cursor starts on the first row; entries are reachable.
        admin.list_state.select(Some(2));
        assert_eq!(admin.current_entry().map(|(id, _)| id), Some(2));
        admin.list_state.select(Some(1));
        assert!(admin.current_entry().is_none());
    }
}
