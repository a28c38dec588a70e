//! Form field descriptors and edit operations

/// Static description of a single form field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    /// Short input hint shown when the field is empty
    pub hint: &'static str,
}

impl FieldSpec {
    pub const fn new(name: &'static str, label: &'static str, hint: &'static str) -> Self {
        Self { name, label, hint }
    }
}

/// A single keystroke-level edit applied to a text value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEdit {
    Push(char),
    Pop,
    Clear,
}

impl FieldEdit {
    /// Apply the edit to `value`, returning the new value
    pub fn apply(&self, value: &str) -> String {
        let mut next = value.to_string();
        match self {
            FieldEdit::Push(c) => next.push(*c),
            FieldEdit::Pop => {
                next.pop();
            }
            FieldEdit::Clear => next.clear(),
        }
        next
    }
}

/// Display value for rendering an input
pub fn display_value<'a>(value: &'a str, spec: &'a FieldSpec, is_active: bool) -> &'a str {
    if value.is_empty() && !is_active {
        spec.hint
    } else {
        value
    }
}
