use crate::select::{KeyOutcome, NavKey, SelectState};
use leptos::html;
use leptos::prelude::*;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::closure::Closure;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;

/// Reactive handle returned by [`use_filtered_select`].
///
/// Rows rendered inside `container` should carry `data-select-index="{i}"`
/// (their index in `filtered`) so the highlighted row can be scrolled into view.
pub struct FilteredSelect<T: Send + Sync + 'static> {
    state: RwSignal<SelectState>,
    pub filtered: Signal<Vec<T>>,
    pub container: NodeRef<html::Div>,
    on_select: Callback<T>,
}

impl<T: Send + Sync + 'static> Clone for FilteredSelect<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Send + Sync + 'static> Copy for FilteredSelect<T> {}

impl<T: Clone + Send + Sync + 'static> FilteredSelect<T> {
    pub fn query(&self) -> Signal<String> {
        let state = self.state;
        Signal::derive(move || state.with(|s| s.query().to_string()))
    }

    /// Highlighted row of `filtered`, never past its end.
    pub fn highlight(&self) -> Signal<Option<usize>> {
        let state = self.state;
        let filtered = self.filtered;
        Signal::derive(move || {
            let len = filtered.with(Vec::len);
            state.with(|s| s.highlight_within(len))
        })
    }

    pub fn set_query(&self, query: String) {
        self.state.update(|s| s.set_query(query));
    }

    pub fn clear(&self) {
        self.state.update(|s| s.clear());
    }

    /// Feed a keydown from the query input. Handled keys have their default
    /// action suppressed; `Enter` on a highlighted row runs the select callback.
    pub fn on_keydown(&self, ev: &web_sys::KeyboardEvent) -> KeyOutcome {
        let Some(key) = NavKey::from_key(&ev.key()) else {
            return KeyOutcome::Ignored;
        };

        let outcome = self.handle_nav(key);
        if outcome != KeyOutcome::Ignored {
            ev.prevent_default();
        }
        outcome
    }

    /// Apply a navigation key to the current filtered view, running the
    /// select callback on `Select`.
    pub fn handle_nav(&self, key: NavKey) -> KeyOutcome {
        let filtered = self.filtered.get_untracked();
        let outcome = self
            .state
            .try_update(|s| s.handle_key(key, filtered.len()))
            .unwrap_or(KeyOutcome::Ignored);

        if let KeyOutcome::Select(i) = outcome {
            if let Some(item) = filtered.get(i) {
                self.on_select.run(item.clone());
            }
        }
        outcome
    }
}

/// Filter `items` by `label` as the user types, with keyboard highlight.
///
/// Queries shorter than `min_len` (after trimming) show nothing.
pub fn use_filtered_select<T, L>(
    items: Signal<Vec<T>>,
    label: L,
    on_select: Callback<T>,
    min_len: usize,
) -> FilteredSelect<T>
where
    T: Clone + Send + Sync + 'static,
    L: Fn(&T) -> String + Send + Sync + 'static,
{
    let state = RwSignal::new(SelectState::new(min_len));
    let container: NodeRef<html::Div> = NodeRef::new();

    let filtered = Signal::derive(move || {
        items.with(|items| {
            state.with(|s| s.filter(items, &label).into_iter().cloned().collect::<Vec<T>>())
        })
    });

    scroll_highlight_into_view(state, filtered, container);

    FilteredSelect {
        state,
        filtered,
        container,
        on_select,
    }
}

/// Keep the highlighted row visible while navigating with ArrowUp/ArrowDown.
#[cfg(target_arch = "wasm32")]
fn scroll_highlight_into_view<T: Send + Sync + 'static>(
    state: RwSignal<SelectState>,
    filtered: Signal<Vec<T>>,
    container: NodeRef<html::Div>,
) {
    Effect::new(move |_| {
        let len = filtered.with(Vec::len);
        let Some(index) = state.with(|s| s.highlight_within(len)) else {
            return;
        };
        let Some(list_el) = container.get() else {
            return;
        };
        let Some(window) = web_sys::window() else {
            return;
        };

        // Defer to next tick so DOM updates have applied.
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            Closure::once_into_js(move || {
                scroll_row_into_view(list_el.unchecked_into(), index);
            })
            .as_ref()
            .unchecked_ref(),
            0,
        );
    });
}

// No DOM to scroll outside the browser.
#[cfg(not(target_arch = "wasm32"))]
fn scroll_highlight_into_view<T: Send + Sync + 'static>(
    _state: RwSignal<SelectState>,
    _filtered: Signal<Vec<T>>,
    _container: NodeRef<html::Div>,
) {
}

#[cfg(target_arch = "wasm32")]
fn scroll_row_into_view(list: web_sys::HtmlElement, index: usize) {
    let Ok(Some(row)) = list.query_selector(&format!("[data-select-index='{index}']")) else {
        return;
    };
    let row: web_sys::HtmlElement = row.unchecked_into();

    let row_top = row.offset_top();
    let row_bottom = row_top + row.offset_height();

    let view_top = list.scroll_top();
    let view_bottom = view_top + list.client_height();

    if row_top < view_top {
        list.set_scroll_top(row_top);
    } else if row_bottom > view_bottom {
        list.set_scroll_top(row_bottom - list.client_height());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ores() -> Vec<String> {
        ["Iron Ingot", "Iron Block", "Iron Nugget", "Iron Ore", "Iron Bars", "Gold Ingot"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Hook over `items` whose select callback records every picked label.
    fn picker(
        items: RwSignal<Vec<String>>,
    ) -> (FilteredSelect<String>, RwSignal<Vec<String>>) {
        let picked: RwSignal<Vec<String>> = RwSignal::new(vec![]);
        let on_select = Callback::new(move |s: String| picked.update(|p| p.push(s)));
        let select = use_filtered_select(items.into(), |s: &String| s.clone(), on_select, 1);
        (select, picked)
    }

    #[test]
    fn test_filtered_follows_query_and_items() {
        let owner = Owner::new();
        owner.with(|| {
            let items = RwSignal::new(ores());
            let (select, _) = picker(items);

            assert!(select.filtered.get().is_empty());
            select.set_query("ingot".to_string());
            assert_eq!(select.filtered.get(), vec!["Iron Ingot", "Gold Ingot"]);

            items.update(|v| v.push("Copper Ingot".to_string()));
            assert_eq!(
                select.filtered.get(),
                vec!["Iron Ingot", "Gold Ingot", "Copper Ingot"]
            );
        });
    }

    #[test]
    fn test_set_query_resets_highlight() {
        let owner = Owner::new();
        owner.with(|| {
            let (select, _) = picker(RwSignal::new(ores()));
            select.set_query("iron".to_string());
            select.handle_nav(NavKey::Down);
            select.handle_nav(NavKey::Down);
            assert_eq!(select.highlight().get(), Some(1));

            select.set_query("iron i".to_string());
            assert_eq!(select.highlight().get(), None);
            assert_eq!(select.query().get(), "iron i");
        });
    }

    #[test]
    fn test_enter_runs_on_select_once_with_highlighted_item() {
        let owner = Owner::new();
        owner.with(|| {
            let (select, picked) = picker(RwSignal::new(ores()));
            select.set_query("iron".to_string());

            assert_eq!(select.handle_nav(NavKey::Confirm), KeyOutcome::Ignored);
            assert!(picked.get().is_empty());

            select.handle_nav(NavKey::Down);
            select.handle_nav(NavKey::Down);
            select.handle_nav(NavKey::Down);
            assert_eq!(select.handle_nav(NavKey::Confirm), KeyOutcome::Select(2));
            assert_eq!(picked.get(), vec!["Iron Nugget"]);
        });
    }

    #[test]
    fn test_highlight_stays_in_range_when_source_shrinks() {
        let owner = Owner::new();
        owner.with(|| {
            let items = RwSignal::new(ores());
            let (select, picked) = picker(items);
            select.set_query("iron".to_string());
            for _ in 0..4 {
                select.handle_nav(NavKey::Down);
            }
            assert_eq!(select.highlight().get(), Some(3));

            // e.g. a catalog reload returning fewer items
            items.set(vec!["Iron Ingot".to_string(), "Iron Ore".to_string()]);
            let len = select.filtered.get().len();
            assert_eq!(len, 2);
            assert_eq!(select.highlight().get(), Some(1));

            assert_eq!(select.handle_nav(NavKey::Confirm), KeyOutcome::Select(1));
            assert_eq!(picked.get(), vec!["Iron Ore"]);

            items.set(vec![]);
            assert_eq!(select.highlight().get(), None);
        });
    }

    #[test]
    fn test_escape_clears_unmatched_query() {
        let owner = Owner::new();
        owner.with(|| {
            let (select, picked) = picker(RwSignal::new(ores()));
            select.set_query("zzz".to_string());
            assert!(select.filtered.get().is_empty());

            assert_eq!(select.handle_nav(NavKey::Cancel), KeyOutcome::Cleared);
            assert_eq!(select.query().get(), "");
            assert!(picked.get().is_empty());
        });
    }
}
