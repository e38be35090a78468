use crate::application::{App, AppMode, FieldValue, Form, PendingAction};
use crate::domain::{ClassSession, format_date, format_time_range, format_timestamp};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
};

const LABEL_WIDTH: usize = 32;

fn to_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

pub fn render_ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_body(f, app, chunks[1]);
    render_status_bar(f, app, chunks[2]);

    match app.mode {
        AppMode::Help => render_help_popup(f, app.help_scroll),
        AppMode::Confirm => render_confirm_popup(f, app),
        _ => {}
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let class = match app.service.active_session() {
        Some(session) => format!("{} ({} attendees)", session.name, session.attendee_count()),
        None => "no active class".to_string(),
    };
    let admin = if app.is_admin() { " | admin" } else { "" };
    let header = Paragraph::new(format!("checkin - Class Check-In | {}{}", class, admin))
        .style(Style::default().fg(Color::Cyan));
    f.render_widget(header, area);
}

fn render_body(f: &mut Frame, app: &App, area: Rect) {
    match app.mode {
        AppMode::Normal | AppMode::Help => render_home(f, app, area),
        AppMode::ClassForm => render_form(f, &app.form, "New Class", area),
        AppMode::CheckInForm => render_form(f, &app.form, "Attendee Check-In", area),
        AppMode::Attendees => render_attendees(f, app, area),
        AppMode::AdminLogin => render_secret_prompt(f, "Admin Login", "Password", &app.secret_input, area),
        AppMode::ChangeCredential => {
            render_secret_prompt(f, "Change Admin Password", "New password", &app.secret_input, area)
        }
        AppMode::AdminPanel => render_admin_panel(f, app, area),
        AppMode::Confirm => match app.pending {
            Some(PendingAction::ReplaceClass(_)) => render_form(f, &app.form, "New Class", area),
            _ => render_admin_panel(f, app, area),
        },
    }
}

fn session_lines(session: &ClassSession, in_progress: bool) -> Vec<Line<'static>> {
    let status = if in_progress {
        Span::styled("In progress", Style::default().fg(Color::Green))
    } else {
        Span::styled("Scheduled", Style::default().fg(Color::Yellow))
    };
    let mut lines = vec![
        Line::from(Span::styled(
            session.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format_date(session.date)),
        Line::from(format_time_range(session.start_time, session.end_time)),
        Line::from(vec![Span::raw("Status: "), status]),
        Line::from(format!("Attendees checked in: {}", session.attendee_count())),
    ];
    if let Some(description) = &session.description {
        lines.push(Line::from(""));
        lines.push(Line::from(description.clone()));
    }
    lines
}

fn render_home(f: &mut Frame, app: &App, area: Rect) {
    let lines = match app.service.active_session() {
        Some(session) => session_lines(&session, app.service.class_in_progress()),
        None => vec![
            Line::from("No active class."),
            Line::from(""),
            Line::from("Press c to create a class, then i to check attendees in."),
        ],
    };
    let home = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Current Class"))
        .wrap(Wrap { trim: false });
    f.render_widget(home, area);
}

fn render_form(f: &mut Frame, form: &Form, title: &str, area: Rect) {
    let lines: Vec<Line> = form
        .fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let marker = if field.required { " *" } else { "" };
            let label = format!("{:<width$}", format!("{}{}", field.label, marker), width = LABEL_WIDTH);
            let style = if index == form.focused {
                Style::default().bg(Color::Blue).fg(Color::White)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(label, Style::default().fg(Color::Yellow)),
                Span::styled(field.display_value(), style),
            ])
        })
        .collect();

    let widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title.to_string()));
    f.render_widget(widget, area);

    if let Some(field) = form.focused_field() {
        if matches!(field.value, FieldValue::Text(_)) {
            let x = area.x.saturating_add(1).saturating_add(to_u16(LABEL_WIDTH + form.cursor_position));
            let y = area.y.saturating_add(1).saturating_add(to_u16(form.focused));
            if x < area.right().saturating_sub(1) && y < area.bottom().saturating_sub(1) {
                f.set_cursor_position((x, y));
            }
        }
    }
}

fn render_attendees(f: &mut Frame, app: &App, area: Rect) {
    let session = app.service.active_session();
    let attendees = session.as_ref().map(|s| s.attendees.as_slice()).unwrap_or_default();
    let title = match &session {
        Some(session) => format!("Attendees - {} ({})", session.name, attendees.len()),
        None => "Attendees".to_string(),
    };

    let header = Row::new(
        ["#", "Full Name", "Company", "Email", "Phone", "Future Interest", "Checked In"]
            .into_iter()
            .map(|h| Cell::from(h).style(Style::default().fg(Color::Yellow))),
    )
    .height(1);

    let visible_rows = area.height.saturating_sub(3) as usize;
    let start = app.list_scroll.min(attendees.len().saturating_sub(visible_rows));
    let mut rows = vec![header];
    rows.extend(
        attendees
            .iter()
            .enumerate()
            .skip(start)
            .take(visible_rows)
            .map(|(index, attendee)| {
                Row::new(vec![
                    Cell::from((index + 1).to_string()),
                    Cell::from(attendee.full_name.clone()),
                    Cell::from(attendee.company.clone().unwrap_or_else(|| "-".to_string())),
                    Cell::from(attendee.email.clone()),
                    Cell::from(attendee.phone.clone().unwrap_or_else(|| "-".to_string())),
                    Cell::from(if attendee.future_interest { "Yes" } else { "No" }),
                    Cell::from(format_timestamp(attendee.check_in_time)),
                ])
            }),
    );
    if attendees.is_empty() {
        rows.push(Row::new(vec![Cell::from(""), Cell::from("No attendees have checked in yet.")]));
    }

    let widths = [
        Constraint::Length(4),
        Constraint::Percentage(20),
        Constraint::Percentage(15),
        Constraint::Percentage(25),
        Constraint::Length(16),
        Constraint::Length(15),
        Constraint::Length(16),
    ];
    let table = Table::new(rows, widths)
        .block(Block::default().borders(Borders::ALL).title(title))
        .column_spacing(1);
    f.render_widget(table, area);
}

fn render_secret_prompt(f: &mut Frame, title: &str, label: &str, input: &str, area: Rect) {
    let masked = "*".repeat(input.chars().count());
    let prompt = format!("{}: ", label);
    let x = area
        .x
        .saturating_add(1)
        .saturating_add(to_u16(prompt.chars().count() + masked.len()));
    let widget = Paragraph::new(Line::from(vec![
        Span::styled(prompt, Style::default().fg(Color::Yellow)),
        Span::raw(masked),
    ]))
    .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    f.render_widget(widget, area);
    if x < area.right().saturating_sub(1) {
        f.set_cursor_position((x, area.y + 1));
    }
}

fn render_admin_panel(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(0)])
        .split(area);

    let current = match app.service.active_session() {
        Some(session) => session_lines(&session, app.service.class_in_progress()),
        None => vec![Line::from("No active class.")],
    };
    let current = Paragraph::new(current)
        .block(Block::default().borders(Borders::ALL).title("Current Class"))
        .wrap(Wrap { trim: false });
    f.render_widget(current, chunks[0]);

    let history = app.service.history();
    let header = Row::new(
        ["Class", "Date", "Time", "Attendees", "Archived"]
            .into_iter()
            .map(|h| Cell::from(h).style(Style::default().fg(Color::Yellow))),
    );
    let visible_rows = chunks[1].height.saturating_sub(3) as usize;
    let start = app.list_scroll.min(history.len().saturating_sub(visible_rows));
    let mut rows = vec![header];
    rows.extend(history.iter().rev().skip(start).take(visible_rows).map(|session| {
        Row::new(vec![
            Cell::from(session.name.clone()),
            Cell::from(format_date(session.date)),
            Cell::from(format_time_range(session.start_time, session.end_time)),
            Cell::from(session.attendee_count().to_string()),
            Cell::from(
                session
                    .archived_at
                    .map(format_timestamp)
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ])
    }));
    if history.is_empty() {
        rows.push(Row::new(vec![Cell::from("No archived classes.")]));
    }

    let widths = [
        Constraint::Percentage(30),
        Constraint::Percentage(25),
        Constraint::Percentage(20),
        Constraint::Length(10),
        Constraint::Min(16),
    ];
    let table = Table::new(rows, widths)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Class History ({})", history.len())),
        )
        .column_spacing(1);
    f.render_widget(table, chunks[1]);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let hints = match app.mode {
        AppMode::Normal => "c: new class | i: check in | l: attendees | e: export CSV | a: admin | F1/?: help | q: quit",
        AppMode::ClassForm | AppMode::CheckInForm => {
            "Tab/↑↓: next/prev field | Space: toggle checkbox | Enter: submit | Esc: cancel"
        }
        AppMode::Attendees => "↑↓/jk: scroll | i: check in | e: export CSV | a: admin | Esc: back",
        AppMode::AdminLogin => "Enter: log in | Esc: cancel",
        AppMode::ChangeCredential => "Enter: save | Esc: back to admin panel",
        AppMode::AdminPanel => "r: reset class | w: clear all data | p: change password | ↑↓: scroll | Esc: log out",
        AppMode::Confirm => "y/Enter: yes | n/Esc: no",
        AppMode::Help => "↑↓/jk: scroll | PgUp/PgDn: fast scroll | Home: top | Esc/q: close help",
    };
    let text = match (&app.status_message, app.mode) {
        (Some(status), mode) if mode != AppMode::Confirm && mode != AppMode::Help => status.clone(),
        _ => hints.to_string(),
    };
    let style = match &app.status_message {
        Some(status) if status.starts_with("Error:") => Style::default().fg(Color::Red),
        _ => match app.mode {
            AppMode::ClassForm | AppMode::CheckInForm => Style::default().fg(Color::Green),
            AppMode::AdminLogin | AppMode::AdminPanel | AppMode::ChangeCredential => {
                Style::default().fg(Color::Magenta)
            }
            AppMode::Help => Style::default().fg(Color::Cyan),
            _ => Style::default(),
        },
    };

    let status = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(style);
    f.render_widget(status, area);
}

fn popup_area(area: Rect, width_percent: u16, height: u16) -> Rect {
    let width = area.width * width_percent / 100;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_confirm_popup(f: &mut Frame, app: &App) {
    let area = popup_area(f.area(), 60, 7);
    f.render_widget(Clear, area);

    let question = app.status_message.clone().unwrap_or_else(|| "Are you sure?".to_string());
    let dialog = Paragraph::new(vec![
        Line::from(question),
        Line::from(""),
        Line::from(Span::styled("y: yes    n: no", Style::default().fg(Color::Yellow))),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Confirm")
            .style(Style::default().fg(Color::Red)),
    );
    f.render_widget(dialog, area);
}

fn render_help_popup(f: &mut Frame, scroll: usize) {
    let area = f.area();
    let popup_area = Rect {
        x: area.width / 10,
        y: area.height / 10,
        width: area.width * 4 / 5,
        height: area.height * 4 / 5,
    };

    f.render_widget(Clear, popup_area);

    let help_lines: Vec<&str> = HELP_TEXT.lines().collect();
    let visible_height = popup_area.height.saturating_sub(2) as usize;

    let start_line = scroll.min(help_lines.len().saturating_sub(visible_height));
    let end_line = (start_line + visible_height).min(help_lines.len());

    let visible_text = help_lines[start_line..end_line].join("\n");

    let help_widget = Paragraph::new(visible_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("checkin Help (Line {}/{})", start_line + 1, help_lines.len()))
                .style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White));

    f.render_widget(help_widget, popup_area);
}

const HELP_TEXT: &str = r#"CLASS CHECK-IN

=== CLASSES ===
c               Create a new class (name, date, start and end time)
                Date and times are prefilled with the next whole hour
                The date cannot be in the past
                Today's start time may be at most 15 minutes ago
                Creating a class while one is active archives the old one
                after you confirm

=== CHECK-IN ===
i               Open the check-in form for the active class
                Full name and email are required
                Company, phone and the future interest box are optional
                Each email can check in once per class (case-insensitive)
Space           Toggle the future interest checkbox
l               Show the attendee list

=== EXPORT ===
e               Write the attendee list to a CSV file
                Named <class>_<date>_attendees.csv in the export directory

=== ADMIN ===
a               Log in with the admin password (default: admin123)
r               Move the active class to history
w               Clear all data (asks twice, cannot be undone)
p               Change the admin password
Esc             Log out and return home

=== FORMS ===
Tab / ↓         Next field
Shift+Tab / ↑   Previous field
←→ Home End     Move the cursor
Enter           Submit
Esc             Cancel

=== HELP NAVIGATION ===
↑↓ or j/k       Scroll help text up/down one line
Page Up/Down    Scroll help text up/down 5 lines
Home            Jump to top of help text
Esc/F1/?/q      Close this help window

q               Quit (from the home screen)"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{CheckInService, Confirmation};
    use crate::domain::{AttendeeDraft, ClassDraft, FixedClock, SequentialIds};
    use crate::infrastructure::StateStore;
    use chrono::NaiveDate;
    use ratatui::{Terminal, backend::TestBackend};
    use std::path::PathBuf;

    fn app() -> App {
        let now = NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let service = CheckInService::new(
            StateStore::in_memory().unwrap(),
            FixedClock::at(now),
            SequentialIds::new("id"),
        );
        App::new(service, PathBuf::from("."))
    }

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| render_ui(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_home_without_class() {
        let app = app();
        let text = screen(&app);
        assert!(text.contains("no active class"));
        assert!(text.contains("Press c to create a class"));
    }

    #[test]
    fn test_attendee_list_rendering() {
        let mut app = app();
        app.service
            .create_class(
                &ClassDraft::new("Intro to Welding", "2026-10-16", "18:00", "20:00"),
                Confirmation::Pending,
            )
            .unwrap();
        app.service
            .check_in(&AttendeeDraft::new("Ada Lovelace", "ada@x.com").with_future_interest(true))
            .unwrap();
        app.show_attendees();

        let text = screen(&app);
        assert!(text.contains("Attendees - Intro to Welding (1)"));
        assert!(text.contains("Ada Lovelace"));
        assert!(text.contains("ada@x.com"));
        assert!(text.contains("Yes"));
    }

    #[test]
    fn test_secret_input_is_masked() {
        let mut app = app();
        app.start_admin_login();
        app.secret_input = "hunter2".to_string();

        let text = screen(&app);
        assert!(text.contains("Password: *******"));
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn test_very_long_input_renders() {
        let mut app = app();
        app.start_class_form();
        app.form.fields[0].value = FieldValue::Text("x".repeat(70_000));
        app.form.move_end();
        assert!(screen(&app).contains("New Class"));

        app.start_admin_login();
        app.secret_input = "y".repeat(70_000);
        assert!(screen(&app).contains("Password: ***"));
    }

    #[test]
    fn test_help_popup_title() {
        let mut app = app();
        app.show_help();
        assert!(screen(&app).contains("checkin Help (Line 1/"));
    }
}
