use crate::application::{App, AppMode};
use crossterm::event::{KeyCode, KeyModifiers};

pub struct InputHandler;

impl InputHandler {
    pub fn handle_key_event(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        match app.mode {
            AppMode::Normal => Self::handle_normal_mode(app, key),
            AppMode::ClassForm | AppMode::CheckInForm => Self::handle_form_mode(app, key, modifiers),
            AppMode::Attendees => Self::handle_attendees_mode(app, key),
            AppMode::AdminLogin | AppMode::ChangeCredential => Self::handle_secret_input_mode(app, key),
            AppMode::AdminPanel => Self::handle_admin_panel_mode(app, key),
            AppMode::Confirm => Self::handle_confirm_mode(app, key),
            AppMode::Help => Self::handle_help_mode(app, key),
        }
    }

    fn handle_normal_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Char('c') => app.start_class_form(),
            KeyCode::Char('i') => app.start_check_in(),
            KeyCode::Char('l') => app.show_attendees(),
            KeyCode::Char('e') => app.export_csv(),
            KeyCode::Char('a') => app.start_admin_login(),
            KeyCode::F(1) | KeyCode::Char('?') => app.show_help(),
            KeyCode::Esc => app.status_message = None,
            KeyCode::Char('q') => {
                // Will be handled by main loop
            }
            _ => {}
        }
    }

    fn handle_form_mode(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        match key {
            KeyCode::Enter => app.submit_form(),
            KeyCode::Esc => app.go_home(),
            KeyCode::Tab | KeyCode::Down => app.form.next_field(),
            KeyCode::BackTab | KeyCode::Up => app.form.previous_field(),
            KeyCode::Backspace => app.form.backspace(),
            KeyCode::Delete => app.form.delete(),
            KeyCode::Left => app.form.move_left(),
            KeyCode::Right => app.form.move_right(),
            KeyCode::Home => app.form.move_home(),
            KeyCode::End => app.form.move_end(),
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                app.form.insert_char(c);
            }
            _ => {}
        }
    }

    fn handle_attendees_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Char('q') => app.go_home(),
            KeyCode::Up | KeyCode::Char('k') => app.scroll_up(),
            KeyCode::Down | KeyCode::Char('j') => app.scroll_down(),
            KeyCode::Char('e') => app.export_csv(),
            KeyCode::Char('a') => app.start_admin_login(),
            KeyCode::Char('i') => app.start_check_in(),
            _ => {}
        }
    }

    fn handle_secret_input_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Enter => {
                if app.mode == AppMode::AdminLogin {
                    app.submit_admin_login();
                } else {
                    app.submit_change_credential();
                }
            }
            KeyCode::Esc => {
                if app.mode == AppMode::ChangeCredential {
                    app.secret_input.clear();
                    app.mode = AppMode::AdminPanel;
                } else {
                    app.go_home();
                }
            }
            KeyCode::Backspace => {
                app.secret_input.pop();
            }
            KeyCode::Char(c) => app.secret_input.push(c),
            _ => {}
        }
    }

    fn handle_admin_panel_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Char('q') => app.go_home(),
            KeyCode::Up | KeyCode::Char('k') => app.scroll_up(),
            KeyCode::Down | KeyCode::Char('j') => app.scroll_down(),
            KeyCode::Char('r') => app.request_reset_session(),
            KeyCode::Char('w') => app.request_wipe_all(),
            KeyCode::Char('p') => app.start_change_credential(),
            _ => {}
        }
    }

    fn handle_confirm_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.decline(),
            _ => {}
        }
    }

    fn handle_help_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Char('q') => {
                app.mode = AppMode::Normal;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if app.help_scroll > 0 {
                    app.help_scroll -= 1;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.help_scroll += 1;
            }
            KeyCode::PageUp => {
                app.help_scroll = app.help_scroll.saturating_sub(5);
            }
            KeyCode::PageDown => {
                app.help_scroll += 5;
            }
            KeyCode::Home => {
                app.help_scroll = 0;
            }
            _ => {}
        }
    }
}
