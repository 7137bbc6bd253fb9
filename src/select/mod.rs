/// Keys that drive a dropdown-style picker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavKey {
    Down,
    Up,
    Confirm,
    Cancel,
}

impl NavKey {
    /// Map a DOM `KeyboardEvent.key` value. Anything else is not ours to handle.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowDown" => Some(Self::Down),
            "ArrowUp" => Some(Self::Up),
            "Enter" => Some(Self::Confirm),
            "Escape" => Some(Self::Cancel),
            _ => None,
        }
    }
}

/// Result of feeding a key into [`SelectState::handle_key`].
///
/// Every variant except `Ignored` means the caller should suppress the
/// browser's default action for the event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    Moved,
    /// Index into the filtered sequence the key was handled against.
    Select(usize),
    Cleared,
}

/// Case-insensitive substring filter over `items`, preserving source order.
///
/// A trimmed query shorter than `min_len` characters matches nothing.
pub fn filter_items<'a, T>(
    items: &'a [T],
    query: &str,
    min_len: usize,
    label: impl Fn(&T) -> String,
) -> Vec<&'a T> {
    let q = query.trim();
    if q.chars().count() < min_len {
        return Vec::new();
    }

    let needle = q.to_lowercase();
    items
        .iter()
        .filter(|item| label(item).to_lowercase().contains(&needle))
        .collect()
}

/// Query + highlight state of a filtered picker.
///
/// The item list itself is owned by the caller; the state only remembers what
/// the user typed and which row of the current filtered view is highlighted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectState {
    query: String,
    highlight: Option<usize>,
    min_len: usize,
}

impl SelectState {
    pub fn new(min_len: usize) -> Self {
        Self {
            query: String::new(),
            highlight: None,
            min_len,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn highlight(&self) -> Option<usize> {
        self.highlight
    }

    /// The highlight as seen against a filtered view of `filtered_len` rows:
    /// clamped to the last row, `None` when the view is empty.
    pub fn highlight_within(&self, filtered_len: usize) -> Option<usize> {
        let i = self.highlight?;
        filtered_len.checked_sub(1).map(|last| i.min(last))
    }

    /// Any edit to the query drops the highlight.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.highlight = None;
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.highlight = None;
    }

    pub fn filter<'a, T>(&self, items: &'a [T], label: impl Fn(&T) -> String) -> Vec<&'a T> {
        filter_items(items, &self.query, self.min_len, label)
    }

    /// Apply a navigation key against a filtered view of `filtered_len` rows.
    pub fn handle_key(&mut self, key: NavKey, filtered_len: usize) -> KeyOutcome {
        // Escape clears even a query that matches nothing.
        if key == NavKey::Cancel {
            self.clear();
            return KeyOutcome::Cleared;
        }
        let Some(last) = filtered_len.checked_sub(1) else {
            return KeyOutcome::Ignored;
        };

        // The list may have shrunk under us (source list changed without a query edit).
        self.highlight = self.highlight_within(filtered_len);

        match (key, self.highlight) {
            (NavKey::Down, Some(i)) => self.highlight = Some((i + 1).min(last)),
            (NavKey::Down, None) => self.highlight = Some(0),
            (NavKey::Up, Some(i)) => self.highlight = i.checked_sub(1),
            (NavKey::Up, None) => {}
            (NavKey::Confirm, Some(i)) => return KeyOutcome::Select(i),
            (NavKey::Confirm, None) | (NavKey::Cancel, _) => return KeyOutcome::Ignored,
        }
        KeyOutcome::Moved
    }
}

impl Default for SelectState {
    fn default() -> Self {
        Self::new(1)
    }
}
