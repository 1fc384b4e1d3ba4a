use crossterm::event::KeyCode;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::ops::Range;

/// Trait for items that can be displayed in a list
pub trait ListItem {
    fn title(&self) -> String;

    /// Optional second line
    fn description(&self) -> String {
        String::new()
    }

    /// Text the filter matches against
    fn filter_value(&self) -> String {
        self.title().to_lowercase()
    }
}

/// Manages list selection and scrolling state
#[derive(Debug, Clone)]
pub struct ListState {
    selected: Option<usize>,
    scroll_offset: usize,
    scroll_off: usize, // Rows from edge before scrolling (like vim scrolloff)
    wrap_around: bool, // Wrap to bottom/top when reaching edges
    viewport_height: Option<usize>, // Last known viewport height, in items
}

impl Default for ListState {
    fn default() -> Self {
        Self::new()
    }
}

impl ListState {
    /// Create a new ListState with no selection
    pub fn new() -> Self {
        Self {
            selected: None,
            scroll_offset: 0,
            scroll_off: 3,
            wrap_around: true,
            viewport_height: None,
        }
    }

    /// Create a new ListState with first item selected
    pub fn with_selection() -> Self {
        Self {
            selected: Some(0),
            ..Self::new()
        }
    }

    /// Set the viewport height in items
    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = Some(height.max(1));
    }

    pub fn viewport_height(&self) -> Option<usize> {
        self.viewport_height
    }

    /// Get currently selected index
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Get current scroll offset
    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Set selected index and adjust scroll to ensure it's visible
    pub fn select_and_scroll(&mut self, index: Option<usize>, item_count: usize) {
        self.selected = index;
        if index.is_none() {
            self.scroll_offset = 0;
        }
        if let Some(height) = self.viewport_height {
            self.update_scroll(height, item_count);
        }
    }

    /// Handle navigation key, returns true if handled
    /// Uses stored viewport_height if available, otherwise falls back to provided visible_height
    pub fn handle_key(&mut self, key: KeyCode, item_count: usize, visible_height: usize) -> bool {
        if item_count == 0 {
            return false;
        }

        let height = self.viewport_height.unwrap_or(visible_height).max(1);

        match key {
            KeyCode::Up => self.move_up(item_count),
            KeyCode::Down => self.move_down(item_count),
            KeyCode::PageUp => {
                let sel = self.selected.unwrap_or(0);
                self.selected = Some(sel.saturating_sub(height));
            }
            KeyCode::PageDown => {
                let new_sel = self.selected.map_or(0, |sel| (sel + height).min(item_count - 1));
                self.selected = Some(new_sel);
            }
            KeyCode::Home => self.selected = Some(0),
            KeyCode::End => self.selected = Some(item_count - 1),
            _ => return false,
        }

        // Ensure the new selection is visible
        self.update_scroll(height, item_count);
        true
    }

    fn move_up(&mut self, item_count: usize) {
        self.selected = match self.selected {
            Some(sel) if sel > 0 => Some(sel - 1),
            // At top, wrap to bottom
            Some(_) if self.wrap_around => Some(item_count - 1),
            Some(sel) => Some(sel),
            None => Some(0),
        };
    }

    fn move_down(&mut self, item_count: usize) {
        self.selected = match self.selected {
            Some(sel) if sel + 1 < item_count => Some(sel + 1),
            // At bottom, wrap to top
            Some(_) if self.wrap_around => Some(0),
            Some(sel) => Some(sel),
            None => Some(0),
        };
    }

    /// Update scroll offset based on selection and visible height
    pub fn update_scroll(&mut self, visible_height: usize, item_count: usize) {
        if let Some(sel) = self.selected {
            // Calculate ideal scroll range to keep selection visible with scrolloff
            let min_scroll = sel.saturating_sub(visible_height.saturating_sub(self.scroll_off + 1));
            let max_scroll = sel.saturating_sub(self.scroll_off);

            if self.scroll_offset < min_scroll {
                self.scroll_offset = min_scroll;
            } else if self.scroll_offset > max_scroll {
                self.scroll_offset = max_scroll;
            }
        }

        // Clamp to valid range
        let max_offset = item_count.saturating_sub(visible_height);
        self.scroll_offset = self.scroll_offset.min(max_offset);
    }
}

/// A titled list with a type-to-filter query layered over its items
///
/// Indices handed out by `selected_index` and `visible_range` refer to the
/// filtered view, never to the underlying item vector.
#[derive(Debug, Clone)]
pub struct FilterList<T> {
    title: String,
    items: Vec<T>,
    filter: String,
    filtering_enabled: bool,
    /// Indices into `items` that match the filter, best match first
    matches: Vec<usize>,
    state: ListState,
}

impl<T: ListItem> FilterList<T> {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
            filter: String::new(),
            filtering_enabled: true,
            matches: Vec::new(),
            state: ListState::with_selection(),
        }
    }

    pub fn without_filtering(mut self) -> Self {
        self.filtering_enabled = false;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Replace the items, keeping the filter and clamping the cursor
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.refilter();
        let count = self.matches.len();
        let selected = match self.state.selected() {
            _ if count == 0 => None,
            Some(index) => Some(index.min(count - 1)),
            None => Some(0),
        };
        self.state.select_and_scroll(selected, count);
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Mutate one item in place; the filter is re-applied afterwards
    pub fn update_item(&mut self, predicate: impl Fn(&T) -> bool, apply: impl FnOnce(&mut T)) -> bool {
        let Some(item) = self.items.iter_mut().find(|item| predicate(item)) else {
            return false;
        };
        apply(item);
        let selected = self.selected_raw_index();
        self.refilter();
        if let Some(raw) = selected {
            if let Some(position) = self.matches.iter().position(|index| *index == raw) {
                self.state.select_and_scroll(Some(position), self.matches.len());
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items passing the filter, in display order
    pub fn visible_items(&self) -> Vec<&T> {
        self.matches.iter().map(|index| &self.items[*index]).collect()
    }

    pub fn visible_len(&self) -> usize {
        self.matches.len()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.state.selected().filter(|index| *index < self.matches.len())
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.selected_raw_index().map(|index| &self.items[index])
    }

    fn selected_raw_index(&self) -> Option<usize> {
        self.selected_index().map(|index| self.matches[index])
    }

    pub fn select(&mut self, index: usize) {
        if self.matches.is_empty() {
            return;
        }
        let index = index.min(self.matches.len() - 1);
        self.state.select_and_scroll(Some(index), self.matches.len());
    }

    pub fn scroll_offset(&self) -> usize {
        self.state.scroll_offset()
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        self.state.set_viewport_height(height);
        self.state.update_scroll(height.max(1), self.matches.len());
    }

    /// Window of the filtered view currently on screen
    pub fn visible_range(&self) -> Range<usize> {
        let count = self.matches.len();
        let height = self.state.viewport_height().unwrap_or(count);
        let start = self.state.scroll_offset().min(count);
        start..(start + height).min(count)
    }

    /// Items currently on screen
    pub fn page_items(&self) -> Vec<&T> {
        self.matches[self.visible_range()]
            .iter()
            .map(|index| &self.items[*index])
            .collect()
    }

    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        let count = self.matches.len();
        let height = self.state.viewport_height().unwrap_or(count.max(1));
        self.state.handle_key(key, count, height)
    }

    pub fn filtering_enabled(&self) -> bool {
        self.filtering_enabled
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn is_filtered(&self) -> bool {
        !self.filter.is_empty()
    }

    pub fn push_filter(&mut self, text: &str) {
        if text.is_empty() || !self.filtering_enabled {
            return;
        }
        self.filter.push_str(text);
        self.apply_filter();
    }

    /// Drop the last character of the filter; false when it was already empty
    pub fn pop_filter(&mut self) -> bool {
        if self.filter.pop().is_none() {
            return false;
        }
        self.apply_filter();
        true
    }

    pub fn reset_filter(&mut self) {
        self.filter.clear();
        self.apply_filter();
    }

    /// Refilter and move the cursor back to the best match
    fn apply_filter(&mut self) {
        self.refilter();
        let selected = if self.matches.is_empty() { None } else { Some(0) };
        self.state.select_and_scroll(selected, self.matches.len());
    }

    fn refilter(&mut self) {
        let query = self.filter.trim().to_lowercase();
        if query.is_empty() {
            self.matches = (0..self.items.len()).collect();
            return;
        }

        let matcher = SkimMatcherV2::default().ignore_case();
        let mut scored: Vec<(i64, usize)> = self
            .items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                matcher
                    .fuzzy_match(&item.filter_value(), &query)
                    .map(|score| (score, index))
            })
            .collect();
        // Best score first; ties keep the original order
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        self.matches = scored.into_iter().map(|(_, index)| index).collect();
    }
}

/// Type-erased access to the filter and cursor of a [`FilterList`], so the
/// focused list can be driven without knowing its item type
pub trait FilterableList {
    fn filtering_enabled(&self) -> bool;
    fn filter(&self) -> &str;
    fn is_filtered(&self) -> bool;
    fn push_filter(&mut self, text: &str);
    fn pop_filter(&mut self) -> bool;
    fn reset_filter(&mut self);
    fn handle_key(&mut self, key: KeyCode) -> bool;
    fn visible_len(&self) -> usize;
}

impl<T: ListItem> FilterableList for FilterList<T> {
    fn filtering_enabled(&self) -> bool {
        FilterList::filtering_enabled(self)
    }

    fn filter(&self) -> &str {
        FilterList::filter(self)
    }

    fn is_filtered(&self) -> bool {
        FilterList::is_filtered(self)
    }

    fn push_filter(&mut self, text: &str) {
        FilterList::push_filter(self, text)
    }

    fn pop_filter(&mut self) -> bool {
        FilterList::pop_filter(self)
    }

    fn reset_filter(&mut self) {
        FilterList::reset_filter(self)
    }

    fn handle_key(&mut self, key: KeyCode) -> bool {
        FilterList::handle_key(self, key)
    }

    fn visible_len(&self) -> usize {
        FilterList::visible_len(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Name(&'static str);

    impl ListItem for Name {
        fn title(&self) -> String {
            self.0.to_string()
        }
    }

    fn names() -> Vec<Name> {
        ["Recife", "Rio de Janeiro", "Salvador", "Sao Paulo", "Natal"]
            .into_iter()
            .map(Name)
            .collect()
    }

    #[test]
    fn test_navigation_wraps() {
        let mut state = ListState::with_selection();
        assert!(state.handle_key(KeyCode::Up, 5, 3));
        assert_eq!(state.selected(), Some(4));
        assert!(state.handle_key(KeyCode::Down, 5, 3));
        assert_eq!(state.selected(), Some(0));
        assert!(!state.handle_key(KeyCode::Left, 5, 3));
    }

    #[test]
    fn test_scroll_keeps_selection_visible() {
        let mut state = ListState::with_selection();
        state.set_viewport_height(4);
        state.handle_key(KeyCode::End, 20, 4);
        assert_eq!(state.selected(), Some(19));
        assert_eq!(state.scroll_offset(), 16);

        state.handle_key(KeyCode::Home, 20, 4);
        assert_eq!(state.scroll_offset(), 0);
    }

    #[test]
    fn test_filter_narrows_and_resets_cursor() {
        let mut list = FilterList::new("Cities");
        list.set_items(names());
        list.handle_key(KeyCode::Down);
        list.handle_key(KeyCode::Down);
        assert_eq!(list.selected_item().map(|n| n.0), Some("Salvador"));

        list.push_filter("re");
        let visible: Vec<_> = list.visible_items().iter().map(|n| n.0).collect();
        assert!(visible.contains(&"Recife"));
        assert!(!visible.contains(&"Natal"));
        assert_eq!(list.selected_index(), Some(0));

        assert!(list.pop_filter());
        assert!(list.pop_filter());
        assert!(!list.pop_filter());
        assert_eq!(list.visible_len(), 5);
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let mut list = FilterList::new("Cities");
        list.set_items(names());
        list.push_filter("SAO");
        assert_eq!(list.selected_item().map(|n| n.0), Some("Sao Paulo"));
    }

    #[test]
    fn test_set_items_clamps_selection() {
        let mut list = FilterList::new("Cities");
        list.set_items(names());
        list.select(4);
        list.set_items(names().into_iter().take(2).collect());
        assert_eq!(list.selected_index(), Some(1));

        list.set_items(Vec::new());
        assert_eq!(list.selected_item().map(|n| n.0), None);
    }

    #[test]
    fn test_visible_range_follows_scroll() {
        let mut list = FilterList::new("Cities");
        list.set_items(names());
        list.set_viewport_height(2);
        assert_eq!(list.visible_range(), 0..2);

        list.handle_key(KeyCode::End);
        assert_eq!(list.visible_range(), 3..5);
        assert_eq!(list.page_items().len(), 2);
    }
}
