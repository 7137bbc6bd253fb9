use crate::components::hooks::use_filtered_select;
use crate::components::ui::Input;
use crate::models::CatalogItem;
use crate::select::KeyOutcome;
use crate::util::format_price;
use leptos::html;
use leptos::prelude::*;

/// Type-ahead picker over the catalog. Picking (Enter or click) runs
/// `on_pick` and clears the query.
#[component]
pub fn ItemPicker(
    #[prop(into)] items: Signal<Vec<CatalogItem>>,
    #[prop(into)] on_pick: Callback<CatalogItem>,
    #[prop(default = 1)] min_len: usize,
    #[prop(into, optional)] placeholder: String,
    #[prop(optional)] input_ref: NodeRef<html::Input>,
) -> impl IntoView {
    let picker = use_filtered_select(
        items,
        |item: &CatalogItem| item.name.clone(),
        on_pick,
        min_len,
    );
    let filtered = picker.filtered;
    let highlight = picker.highlight();
    let container = picker.container;

    let on_input = Callback::new(move |v: String| picker.set_query(v));
    let on_keydown = Callback::new(move |ev: web_sys::KeyboardEvent| {
        if let KeyOutcome::Select(_) = picker.on_keydown(&ev) {
            picker.clear();
        }
    });

    view! {
        <div data-name="ItemPicker" class="relative w-full">
            <Input
                placeholder=placeholder
                value=picker.query()
                on_input=on_input
                on_keydown=on_keydown
                node_ref=input_ref
            />

            <Show when=move || !filtered.get().is_empty() fallback=|| ().into_view()>
                <div
                    node_ref=container
                    role="listbox"
                    class="absolute z-20 mt-1 max-h-64 w-full overflow-y-auto rounded-md border bg-background p-1 shadow-md"
                >
                    {move || {
                        filtered
                            .get()
                            .into_iter()
                            .enumerate()
                            .map(move |(i, item)| {
                                let is_selected = move || highlight.get() == Some(i);
                                let price = item
                                    .price
                                    .map(format_price)
                                    .unwrap_or_else(|| "-".to_string());
                                let name = item.name.clone();
                                let category = item.category.clone().unwrap_or_default();
                                view! {
                                    <div
                                        role="option"
                                        data-select-index=i.to_string()
                                        aria-selected=move || is_selected().to_string()
                                        class="flex cursor-pointer items-center justify-between gap-2 rounded-sm px-2 py-1.5 text-sm hover:bg-muted aria-selected:bg-accent aria-selected:text-accent-foreground"
                                        on:mousedown=move |ev: web_sys::MouseEvent| {
                                            // Keep input focus; mousedown fires before blur.
                                            ev.prevent_default();
                                            picker.clear();
                                            on_pick.run(item.clone());
                                        }
                                    >
                                        <span class="truncate">{name}</span>
                                        <span class="flex items-center gap-2 text-xs text-muted-foreground">
                                            <span>{category}</span>
                                            <span class="font-medium text-foreground">{price}</span>
                                        </span>
                                    </div>
                                }
                            })
                            .collect_view()
                    }}
                </div>
            </Show>
        </div>
    }
}
