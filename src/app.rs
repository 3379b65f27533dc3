use anyhow::Result;
use chrono::Utc;
use chrono_tz::Tz;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::prelude::*;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::checkin::submit_checkin;
use crate::config::Config;
use crate::db::{Database, Registration};
use crate::grouping::group_records;
use crate::maintenance::{self, MigrationPlan, SweepPreview};
use crate::photo;
use crate::session::AdminSession;
use crate::storage::PhotoStore;
use crate::ui;
use crate::ui::admin::AdminView;
use crate::ui::checkin::{CheckinFocus, CheckinView, PendingCapture};
use crate::ui::confirm_dialog::ConfirmDialog;
use crate::ui::register::RegisterForm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Register,
    Checkin,
    Admin,
}

/// Destructive actions parked behind the confirmation dialog.
pub enum PendingAction {
    CommitDeletion,
    SweepOrphans(SweepPreview),
    MigrateLegacy(MigrationPlan),
}

pub struct App {
    pub config: Config,
    pub db: Database,
    pub store: PhotoStore,
    pub tz: Tz,
    pub tab: Tab,
    pub should_quit: bool,
    pub status_message: Option<String>,
    pub register: RegisterForm,
    pub checkin: CheckinView,
    pub admin: AdminView,
    pub session: AdminSession,
    pub confirm_dialog: Option<ConfirmDialog>,
    pub user_total: i64,
    pub checkin_total: i64,
}

impl App {
    pub fn new(config: Config, db: Database, store: PhotoStore) -> Result<Self> {
        let tz = config.tz()?;
        info!(
            policy = ?config.checkin.policy,
            timezone = %config.timezone,
            "check-in policy active"
        );

        let mut app = Self {
            config,
            db,
            store,
            tz,
            tab: Tab::Register,
            should_quit: false,
            status_message: None,
            register: RegisterForm::default(),
            checkin: CheckinView::new(),
            admin: AdminView::new(),
            session: AdminSession::new(),
            confirm_dialog: None,
            user_total: 0,
            checkin_total: 0,
        };
        app.refresh_users();
        app.refresh_counts();
        Ok(app)
    }

    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            terminal.draw(|frame| ui::render(frame, self))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }

            if self.should_quit {
                return Ok(());
            }
        }
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c'))
        {
            self.should_quit = true;
            return;
        }

        if self.confirm_dialog.is_some() {
            self.handle_dialog_key(key);
            return;
        }

        match key.code {
            KeyCode::Tab => {
                self.next_tab();
                return;
            }
            KeyCode::BackTab => {
                self.prev_tab();
                return;
            }
            _ => {}
        }

        match self.tab {
            Tab::Register => self.handle_register_key(key),
            Tab::Checkin => self.handle_checkin_key(key),
            Tab::Admin => self.handle_admin_key(key),
        }
    }

    // ========================================================================
    // Tab switching
    // ========================================================================

    fn next_tab(&mut self) {
        self.switch_tab(match self.tab {
            Tab::Register => Tab::Checkin,
            Tab::Checkin => Tab::Admin,
            Tab::Admin => Tab::Register,
        });
    }

    fn prev_tab(&mut self) {
        self.switch_tab(match self.tab {
            Tab::Register => Tab::Admin,
            Tab::Checkin => Tab::Register,
            Tab::Admin => Tab::Checkin,
        });
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.status_message = None;
        match tab {
            Tab::Checkin => self.refresh_users(),
            Tab::Admin if self.session.is_authenticated() => self.refresh_admin(),
            _ => {}
        }
    }

    // ========================================================================
    // Register tab
    // ========================================================================

    fn handle_register_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.register.prev_field(),
            KeyCode::Down => self.register.next_field(),
            KeyCode::Enter => self.submit_registration(),
            KeyCode::Backspace => self.register.backspace(),
            KeyCode::Esc => self.register.clear(),
            KeyCode::Char(c) => self.register.handle_char(c),
            _ => {}
        }
    }

    fn submit_registration(&mut self) {
        let registration = Registration::normalized(
            self.register.name(),
            self.register.role(),
            self.register.phone(),
            self.register.email(),
        );
        let Some(registration) = registration else {
            // Inline validation: nothing is mutated.
            self.register.error = Some("name is required".to_string());
            return;
        };

        match self.db.upsert_user(&registration) {
            Ok(user) => {
                self.set_status(format!("registered: {}", user.name));
                self.register.clear();
                self.refresh_users();
                self.refresh_counts();
            }
            Err(e) => self.set_status(format!("registration failed: {:#}", e)),
        }
    }

    // ========================================================================
    // Check-in tab
    // ========================================================================

    fn handle_checkin_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.checkin.pending = None;
                self.status_message = None;
            }
            KeyCode::Left => self.checkin.focus = CheckinFocus::Users,
            KeyCode::Right => self.checkin.focus = CheckinFocus::PhotoPath,
            KeyCode::Up => self.checkin.move_up(),
            KeyCode::Down => self.checkin.move_down(),
            KeyCode::Enter => match self.checkin.focus {
                CheckinFocus::Users => self.checkin.focus = CheckinFocus::PhotoPath,
                CheckinFocus::PhotoPath => {
                    if self.checkin.pending.is_some() {
                        self.confirm_checkin();
                    } else {
                        self.load_capture();
                    }
                }
            },
            KeyCode::Backspace if self.checkin.focus == CheckinFocus::PhotoPath => {
                self.checkin.backspace()
            }
            KeyCode::Char(c) if self.checkin.focus == CheckinFocus::PhotoPath => {
                self.checkin.handle_char(c)
            }
            _ => {}
        }
    }

    fn load_capture(&mut self) {
        let path = self.checkin.photo_path.trim().to_string();
        if path.is_empty() {
            self.set_status("enter the photo file path");
            return;
        }

        match photo::load_capture(Path::new(&path)) {
            Ok(image) => {
                let source = Path::new(&path)
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.clone());
                self.checkin.pending = Some(PendingCapture {
                    width: image.width(),
                    height: image.height(),
                    image,
                    source,
                });
                self.status_message = None;
            }
            Err(e) => self.set_status(format!("{:#}", e)),
        }
    }

    fn confirm_checkin(&mut self) {
        let Some(user_id) = self.checkin.selected_user().map(|u| u.id) else {
            self.set_status("select a name first");
            return;
        };
        let now_local = Utc::now().with_timezone(&self.tz);

        let result = match &self.checkin.pending {
            Some(capture) => submit_checkin(
                &self.db,
                &self.store,
                &self.config.checkin,
                user_id,
                &capture.image,
                now_local,
            ),
            None => {
                self.set_status("load a capture first");
                return;
            }
        };

        match result {
            Ok(record) => {
                self.set_status(format!("check-in recorded ({})", record.photo_path));
                self.checkin.pending = None;
                self.checkin.photo_path.clear();
                self.refresh_counts();
            }
            // The capture stays loaded so a transient failure can be retried.
            Err(e) => self.set_status(e.to_string()),
        }
    }

    // ========================================================================
    // Admin tab
    // ========================================================================

    fn handle_admin_key(&mut self, key: KeyEvent) {
        if !self.session.is_authenticated() {
            self.handle_gate_key(key);
            return;
        }

        match key.code {
            KeyCode::Up => self.admin.move_up(),
            KeyCode::Down => self.admin.move_down(),
            KeyCode::Char(' ') => {
                if let Some((checkin_id, photo_path)) = self.admin.current_entry() {
                    let photo_path = photo_path.to_string();
                    self.session.selection.toggle(checkin_id, &photo_path);
                }
            }
            KeyCode::Char('c') => self.session.toggle_confirm(),
            KeyCode::Char('d') => self.request_deletion(),
            KeyCode::Char('r') => self.refresh_admin(),
            KeyCode::Char('o') => self.request_sweep(),
            KeyCode::Char('m') => self.request_migration(),
            KeyCode::Char('L') => {
                self.session.lock();
                self.set_status("admin locked");
            }
            _ => {}
        }
    }

    fn handle_gate_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) => self.admin.password_input.push(c),
            KeyCode::Backspace => {
                self.admin.password_input.pop();
            }
            KeyCode::Esc => self.admin.password_input.clear(),
            KeyCode::Enter => {
                let configured = self.config.admin_password();
                let attempt = std::mem::take(&mut self.admin.password_input);
                if configured.is_none() {
                    self.set_status(
                        "admin password not configured; set admin.password or PONTO_ADMIN_PASSWORD",
                    );
                } else if self.session.authenticate(&attempt, configured.as_deref()) {
                    self.status_message = None;
                    self.refresh_admin();
                } else {
                    self.set_status("wrong password");
                }
            }
            _ => {}
        }
    }

    fn request_deletion(&mut self) {
        if !self.session.can_commit() {
            self.set_status("mark records with space and arm with c first");
            return;
        }
        let count = self.session.selection.len();
        self.confirm_dialog = Some(ConfirmDialog::new(
            PendingAction::CommitDeletion,
            format!("Delete {} check-in(s)? Records go first, then photos.", count),
        ));
    }

    fn request_sweep(&mut self) {
        match maintenance::preview_sweep(&self.db, &self.store) {
            Ok(preview) if preview.orphans.is_empty() => {
                self.set_status("no orphaned photos found")
            }
            Ok(preview) => {
                let count = preview.orphans.len();
                self.confirm_dialog = Some(ConfirmDialog::new(
                    PendingAction::SweepOrphans(preview),
                    format!("Remove {} orphaned photo(s) with no record?", count),
                ));
            }
            Err(e) => self.set_status(format!("sweep preview failed: {:#}", e)),
        }
    }

    fn request_migration(&mut self) {
        match maintenance::plan_migration(&self.db, self.tz) {
            Ok(plan) if plan.moves.is_empty() && plan.skipped.is_empty() => {
                self.set_status("all photo keys already follow the current scheme")
            }
            Ok(plan) => {
                let count = plan.moves.len();
                self.confirm_dialog = Some(ConfirmDialog::new(
                    PendingAction::MigrateLegacy(plan),
                    format!("Re-key {} legacy photo(s) into the current scheme?", count),
                ));
            }
            Err(e) => self.set_status(format!("migration plan failed: {:#}", e)),
        }
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                if let Some(dialog) = self.confirm_dialog.take() {
                    self.execute_action(dialog.action);
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.confirm_dialog = None;
                self.set_status("cancelled");
            }
            _ => {}
        }
    }

    fn execute_action(&mut self, action: PendingAction) {
        match action {
            PendingAction::CommitDeletion => {
                match self.session.selection.commit(&self.db, &self.store) {
                    Ok(outcome) => {
                        self.session.disarm_confirm();
                        self.set_status(format!(
                            "deleted {} record(s) and {} photo(s)",
                            outcome.rows_deleted, outcome.objects_removed
                        ));
                    }
                    Err(e) => self.set_status(format!("{}; selection kept for retry", e)),
                }
                self.refresh_admin();
                self.refresh_counts();
            }
            PendingAction::SweepOrphans(preview) => {
                match maintenance::execute_sweep(&self.store, &preview) {
                    Ok(removed) => self.set_status(format!("removed {} orphaned photo(s)", removed)),
                    Err(e) => self.set_status(format!("sweep failed: {:#}", e)),
                }
            }
            PendingAction::MigrateLegacy(plan) => {
                match maintenance::execute_migration(&self.db, &self.store, &plan) {
                    Ok(result) => {
                        self.set_status(format!(
                            "migrated {} photo(s), {} failed",
                            result.succeeded.len(),
                            result.failed.len()
                        ));
                        self.refresh_admin();
                    }
                    Err(e) => self.set_status(format!("migration failed: {:#}", e)),
                }
            }
        }
    }

    // ========================================================================
    // Shared refresh helpers
    // ========================================================================

    fn refresh_users(&mut self) {
        match self.db.list_users() {
            Ok(users) => self.checkin.refresh_users(users),
            Err(e) => self.set_status(format!("failed to load users: {:#}", e)),
        }
    }

    fn refresh_admin(&mut self) {
        match self.db.recent_checkins_with_users(self.config.admin.view_limit) {
            Ok(records) => {
                let view = group_records(&records, self.tz, Utc::now());
                self.admin.rebuild(&view);
            }
            Err(e) => self.set_status(format!("failed to load check-ins: {:#}", e)),
        }
    }

    fn refresh_counts(&mut self) {
        self.user_total = self.db.user_count().unwrap_or(0);
        self.checkin_total = self.db.checkin_count().unwrap_or(0);
    }
}
