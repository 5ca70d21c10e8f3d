use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Pass,
    /// Usable, but not what we'd recommend. Doesn't fail the check.
    Warn,
    Fail,
}

impl Status {
    pub fn icon(self) -> &'static str {
        match self {
            Self::Pass => "✅",
            Self::Warn => "⚠️ ",
            Self::Fail => "❌",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckLine {
    /// `None` for plain informational lines.
    pub status: Option<Status>,
    pub text: String,
}

impl fmt::Display for CheckLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} {}", status.icon(), self.text),
            None => f.write_str(&self.text),
        }
    }
}

/// Outcome of one check. A check passes unless it reported a failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckReport {
    pub title: &'static str,
    pub lines: Vec<CheckLine>,
}

impl CheckReport {
    pub fn new(title: &'static str) -> Self {
        Self {
            title,
            lines: vec![],
        }
    }

    fn push(&mut self, status: Option<Status>, text: impl Into<String>) {
        self.lines.push(CheckLine {
            status,
            text: text.into(),
        });
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(None, text);
    }

    pub fn pass(&mut self, text: impl Into<String>) {
        self.push(Some(Status::Pass), text);
    }

    pub fn warn(&mut self, text: impl Into<String>) {
        self.push(Some(Status::Warn), text);
    }

    pub fn fail(&mut self, text: impl Into<String>) {
        self.push(Some(Status::Fail), text);
    }

    pub fn passed(&self) -> bool {
        !self.lines.iter().any(|l| l.status == Some(Status::Fail))
    }

    pub fn count(&self, status: Status) -> usize {
        self.lines
            .iter()
            .filter(|l| l.status == Some(status))
            .count()
    }
}
