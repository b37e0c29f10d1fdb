use std::collections::VecDeque;

/// Default maximum entries kept in a session's history window
pub const DEFAULT_WINDOW_ENTRIES: usize = 20;

/// Character budget per entry when rendering history into a prompt
pub const RENDER_CHAR_BUDGET: usize = 300;

/// Rendered in place of an empty window so the prompt's history section is
/// always well-formed
pub const EMPTY_HISTORY_SENTINEL: &str = "(New conversation)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

/// Bounded per-session conversation buffer
///
/// Owned exclusively by one session loop: created on connect, dropped on
/// close. Appending beyond the window capacity evicts the oldest entry.
#[derive(Debug)]
pub struct HistoryWindow {
    entries: VecDeque<HistoryEntry>,
    max_entries: usize,
}

impl HistoryWindow {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_entries),
            max_entries,
        }
    }

    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        if self.entries.len() == self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry {
            role,
            content: content.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Render the whole window for prompting
    pub fn render(&self) -> String {
        self.render_last(self.entries.len())
    }

    /// Render the most recent `max_entries` entries as `Role: content` lines
    pub fn render_last(&self, max_entries: usize) -> String {
        let skip = self.entries.len().saturating_sub(max_entries);
        let lines: Vec<String> = self
            .entries
            .iter()
            .skip(skip)
            .map(|entry| format!("{}: {}", entry.role.label(), clip(&entry.content)))
            .collect();

        if lines.is_empty() {
            return EMPTY_HISTORY_SENTINEL.to_string();
        }
        lines.join("\n")
    }
}

/// Truncate an entry to the render budget, character-wise
fn clip(content: &str) -> String {
    match content.char_indices().nth(RENDER_CHAR_BUDGET) {
        Some((idx, _)) => format!("{}...", &content[..idx]),
        None => content.to_string(),
    }
}
