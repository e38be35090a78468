//! Editable form buffers backing the class setup and check-in screens.

use crate::domain::{AttendeeDraft, ClassDraft};

/// The value held by one form field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub key: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub value: FieldValue,
}

impl FormField {
    fn text(key: &'static str, label: &'static str, required: bool, value: impl Into<String>) -> Self {
        Self {
            key,
            label,
            required,
            value: FieldValue::Text(value.into()),
        }
    }

    fn flag(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            required: false,
            value: FieldValue::Flag(false),
        }
    }

    /// The text to display for this field.
    pub fn display_value(&self) -> String {
        match &self.value {
            FieldValue::Text(text) => text.clone(),
            FieldValue::Flag(true) => "[x]".to_string(),
            FieldValue::Flag(false) => "[ ]".to_string(),
        }
    }
}

/// A list of fields with one focused field and a cursor inside it.
///
/// The cursor counts characters, not bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Form {
    pub fields: Vec<FormField>,
    pub focused: usize,
    pub cursor_position: usize,
}

impl Form {
    /// Class setup form, prefilled from `defaults`.
    pub fn class(defaults: &ClassDraft) -> Self {
        Self::with_fields(vec![
            FormField::text("name", "Class name", true, defaults.name.clone()),
            FormField::text("date", "Date (YYYY-MM-DD)", true, defaults.date.clone()),
            FormField::text("startTime", "Start time (HH:MM)", true, defaults.start_time.clone()),
            FormField::text("endTime", "End time (HH:MM)", true, defaults.end_time.clone()),
            FormField::text("description", "Description", false, defaults.description.clone()),
        ])
    }

    /// Empty attendee check-in form.
    pub fn attendee() -> Self {
        Self::with_fields(vec![
            FormField::text("fullName", "Full name", true, ""),
            FormField::text("company", "Company", false, ""),
            FormField::text("email", "Email", true, ""),
            FormField::text("phone", "Phone", false, ""),
            FormField::flag("futureInterest", "Interested in future classes"),
        ])
    }

    fn with_fields(fields: Vec<FormField>) -> Self {
        let mut form = Self {
            fields,
            focused: 0,
            cursor_position: 0,
        };
        form.cursor_to_end();
        form
    }

    pub fn text(&self, key: &str) -> String {
        self.fields
            .iter()
            .find(|field| field.key == key)
            .and_then(|field| match &field.value {
                FieldValue::Text(text) => Some(text.clone()),
                FieldValue::Flag(_) => None,
            })
            .unwrap_or_default()
    }

    pub fn flag(&self, key: &str) -> bool {
        self.fields
            .iter()
            .any(|field| field.key == key && field.value == FieldValue::Flag(true))
    }

    pub fn class_draft(&self) -> ClassDraft {
        ClassDraft::new(
            self.text("name"),
            self.text("date"),
            self.text("startTime"),
            self.text("endTime"),
        )
        .with_description(self.text("description"))
    }

    pub fn attendee_draft(&self) -> AttendeeDraft {
        AttendeeDraft::new(self.text("fullName"), self.text("email"))
            .with_company(self.text("company"))
            .with_phone(self.text("phone"))
            .with_future_interest(self.flag("futureInterest"))
    }

    pub fn focused_field(&self) -> Option<&FormField> {
        self.fields.get(self.focused)
    }

    fn focused_text_mut(&mut self) -> Option<&mut String> {
        match self.fields.get_mut(self.focused).map(|field| &mut field.value) {
            Some(FieldValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    fn focused_len(&self) -> usize {
        match self.focused_field().map(|field| &field.value) {
            Some(FieldValue::Text(text)) => text.chars().count(),
            _ => 0,
        }
    }

    fn cursor_to_end(&mut self) {
        self.cursor_position = self.focused_len();
    }

    pub fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.focused = (self.focused + 1) % self.fields.len();
            self.cursor_to_end();
        }
    }

    pub fn previous_field(&mut self) {
        if !self.fields.is_empty() {
            self.focused = (self.focused + self.fields.len() - 1) % self.fields.len();
            self.cursor_to_end();
        }
    }

    /// Types `c` into a text field; toggles a flag field on space.
    pub fn insert_char(&mut self, c: char) {
        let cursor = self.cursor_position;
        if let Some(text) = self.focused_text_mut() {
            let offset = byte_offset(text, cursor);
            text.insert(offset, c);
            self.cursor_position += 1;
        } else if c == ' ' {
            self.toggle_flag();
        }
    }

    pub fn toggle_flag(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focused) {
            if let FieldValue::Flag(value) = &mut field.value {
                *value = !*value;
            }
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor_position == 0 {
            return;
        }
        let cursor = self.cursor_position;
        if let Some(text) = self.focused_text_mut() {
            let offset = byte_offset(text, cursor - 1);
            text.remove(offset);
            self.cursor_position -= 1;
        }
    }

    pub fn delete(&mut self) {
        let cursor = self.cursor_position;
        if let Some(text) = self.focused_text_mut() {
            if cursor < text.chars().count() {
                let offset = byte_offset(text, cursor);
                text.remove(offset);
            }
        }
    }

    pub fn move_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor_position < self.focused_len() {
            self.cursor_position += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor_to_end();
    }
}

fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_form_prefills_defaults() {
        let defaults = ClassDraft::new("", "2026-10-16", "15:00", "16:00");
        let form = Form::class(&defaults);

        assert_eq!(form.fields.len(), 5);
        assert_eq!(form.text("date"), "2026-10-16");
        assert_eq!(form.focused, 0);
        assert_eq!(form.cursor_position, 0);
        assert_eq!(form.class_draft(), defaults);
    }

    #[test]
    fn test_typing_and_editing() {
        let mut form = Form::attendee();
        for c in "Ada".chars() {
            form.insert_char(c);
        }
        assert_eq!(form.text("fullName"), "Ada");

        form.move_home();
        form.insert_char('>');
        form.move_end();
        form.backspace();
        assert_eq!(form.text("fullName"), ">Ad");

        form.move_home();
        form.delete();
        assert_eq!(form.text("fullName"), "Ad");
        assert_eq!(form.cursor_position, 0);
    }

    #[test]
    fn test_multibyte_editing() {
        let mut form = Form::attendee();
        for c in "Zoë".chars() {
            form.insert_char(c);
        }
        form.move_left();
        form.insert_char('ï');
        assert_eq!(form.text("fullName"), "Zoïë");

        form.move_end();
        form.backspace();
        assert_eq!(form.text("fullName"), "Zoï");
    }

    #[test]
    fn test_field_navigation_wraps() {
        let mut form = Form::attendee();
        form.previous_field();
        assert_eq!(form.focused_field().unwrap().key, "futureInterest");
        form.next_field();
        assert_eq!(form.focused_field().unwrap().key, "fullName");
    }

    #[test]
    fn test_flag_toggles_with_space() {
        let mut form = Form::attendee();
        form.focused = 4;
        form.insert_char('x');
        assert!(!form.flag("futureInterest"));

        form.insert_char(' ');
        assert!(form.flag("futureInterest"));
        assert_eq!(form.focused_field().unwrap().display_value(), "[x]");
        assert!(form.attendee_draft().future_interest);
    }

    #[test]
    fn test_attendee_draft_collects_fields() {
        let mut form = Form::attendee();
        for (index, value) in ["Grace", "Navy", "grace@navy.mil", "555-123-4567"].iter().enumerate() {
            form.focused = index;
            form.move_end();
            for c in value.chars() {
                form.insert_char(c);
            }
        }
        let draft = form.attendee_draft();

        assert_eq!(draft.full_name, "Grace");
        assert_eq!(draft.company, "Navy");
        assert_eq!(draft.email, "grace@navy.mil");
        assert_eq!(draft.phone, "555-123-4567");
        assert!(!draft.future_interest);
    }
}
