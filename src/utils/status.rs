//! Glyph-prefixed status lines shown to the operator.
//!
//! These lines are informational only and mirror what goes to the tracing
//! subscriber; nothing parses them.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Info,
    Success,
    Warning,
    Failure,
    Hint,
}

impl Status {
    pub fn glyph(self) -> &'static str {
        match self {
            Status::Info => "ℹ️",
            Status::Success => "✅",
            Status::Warning => "⚠️",
            Status::Failure => "❌",
            Status::Hint => "💡",
        }
    }

    fn to_stderr(self) -> bool {
        matches!(self, Status::Failure | Status::Hint)
    }
}

pub fn format_line(status: Status, message: &str) -> String {
    format!("{} {}", status.glyph(), message)
}

pub fn emit(status: Status, message: &str) {
    let line = format_line(status, message);
    if status.to_stderr() {
        eprintln!("{}", line);
    } else {
        println!("{}", line);
    }
}

pub fn info(message: &str) {
    emit(Status::Info, message);
}

pub fn success(message: &str) {
    emit(Status::Success, message);
}

pub fn warning(message: &str) {
    emit(Status::Warning, message);
}

pub fn failure(message: &str) {
    emit(Status::Failure, message);
}

pub fn hint(message: &str) {
    emit(Status::Hint, message);
}
