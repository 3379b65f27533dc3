//! Confirmation dialog for destructive actions.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::PendingAction;

/// Dialog state for an action pending a final yes/no.
pub struct ConfirmDialog {
    pub action: PendingAction,
    pub message: String,
}

impl ConfirmDialog {
    pub fn new(action: PendingAction, message: String) -> Self {
        Self { action, message }
    }
}

pub fn render(frame: &mut Frame, dialog: &ConfirmDialog, area: Rect) {
    let width = 60.min(area.width.saturating_sub(4));
    let height = 8.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let dialog_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, dialog_area);

    let text = format!("\n{}\n\n[y] confirm    [n/Esc] cancel", dialog.message);
    let body = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" Confirm "),
        );
    frame.render_widget(body, dialog_area);
}
