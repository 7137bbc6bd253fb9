use crate::catalog::load_catalog;
use crate::components::ui::{
    Alert, Button, ButtonSize, ButtonVariant, Card, CardContent, CardHeader, CardItem, CardList,
    CardTitle, Input, Notice, Spinner,
};
use crate::components::ItemPicker;
use crate::firestore::Fields;
use crate::models::{CatalogItem, Suggestion, ThreadEntry};
use crate::notifications::{load_user_suggestions, NotificationTracker};
use crate::state::AppContext;
use crate::storage::{write_recent_item, BrowserStorage};
use crate::threads::{format_timestamp_now, ThreadCollection, COMMENTS, SUGGESTION_MESSAGES};
use crate::util::format_price;
use leptos::ev;
use leptos::html;
use leptos::logging::{error, log};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::window_event_listener;
use leptos_router::params::Params;
use wasm_bindgen::JsCast;

#[component]
pub fn AppLayout(children: Children) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let store = app_state.0.store;
    let user_id = app_state.0.current_user_id;
    let has_unread = app_state.0.has_unread;

    Effect::new(move |_| {
        let uid = user_id.get();
        let client = store.get_untracked();
        spawn_local(async move {
            let storage = BrowserStorage;
            let unread = NotificationTracker::new(&client, &storage)
                .check_updates(uid.as_deref())
                .await;
            has_unread.set(unread);
        });
    });

    view! {
        <div class="min-h-screen bg-background text-foreground">
            <header class="border-b">
                <nav class="mx-auto flex max-w-3xl items-center gap-4 px-4 py-3 text-sm">
                    <a href="/" class="font-semibold">"McPrice"</a>
                    <a href="/" class="text-muted-foreground hover:text-foreground">"Catalog"</a>
                    <a href="/suggestions" class="relative text-muted-foreground hover:text-foreground">
                        "Suggestions"
                        <Show when=move || has_unread.get()>
                            <span
                                class="absolute -right-2 -top-1 size-2 rounded-full bg-destructive"
                                aria-label="New activity"
                            ></span>
                        </Show>
                    </a>
                </nav>
            </header>
            <main class="mx-auto max-w-3xl space-y-4 px-4 py-6">{children()}</main>
        </div>
    }
}

#[component]
pub fn CatalogPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let store = app_state.0.store;
    let catalog = app_state.0.catalog;
    let loading = app_state.0.catalog_loading;
    let load_error = app_state.0.catalog_error;
    let recent = app_state.0.recent_items;

    let picked: RwSignal<Option<CatalogItem>> = RwSignal::new(None);
    let search_ref: NodeRef<html::Input> = NodeRef::new();

    // The catalog is cached in app state; `force` refetches it.
    let load = move |force: bool| {
        if loading.get_untracked() || (!force && !catalog.with_untracked(|c| c.is_empty())) {
            return;
        }
        let client = store.get_untracked();
        if !client.is_configured() {
            load_error.set(Some(
                "No Firestore project configured (window.ENV.FIREBASE_PROJECT_ID).".to_string(),
            ));
            return;
        }

        loading.set(true);
        load_error.set(None);
        spawn_local(async move {
            match load_catalog(&client).await {
                Ok(items) => {
                    log!("catalog loaded: {} items", items.len());
                    catalog.set(items);
                }
                Err(e) => {
                    error!("catalog load failed: {e}");
                    load_error.set(Some(e.to_string()));
                }
            }
            loading.set(false);
        });
    };

    Effect::new(move |_| load(false));

    // "/" jumps to the search box unless the user is already typing.
    let key_handle = window_event_listener(ev::keydown, move |ev: web_sys::KeyboardEvent| {
        if ev.key() != "/" || ev.meta_key() || ev.ctrl_key() {
            return;
        }
        let typing = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
            .map(|el| matches!(el.tag_name().to_lowercase().as_str(), "input" | "textarea"))
            .unwrap_or(false);
        if typing {
            return;
        }
        if let Some(input) = search_ref.get_untracked() {
            ev.prevent_default();
            let _ = input.focus();
        }
    });
    on_cleanup(move || key_handle.remove());

    let on_pick = Callback::new(move |item: CatalogItem| {
        let next = write_recent_item(&BrowserStorage, &item.id, &item.name);
        recent.set(next);
        picked.set(Some(item));
    });

    let pick_recent = move |id: String| {
        let item = catalog.with_untracked(|c| c.iter().find(|i| i.id == id).cloned());
        if let Some(item) = item {
            on_pick.run(item);
        }
    };

    view! {
        <Card>
            <CardHeader>
                <CardTitle>"Item prices"</CardTitle>
                <div class="flex items-center gap-2">
                    <Show when=move || loading.get()>
                        <Spinner />
                    </Show>
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Xs
                        on:click=move |_| load(true)
                        attr:disabled=move || loading.get()
                    >
                        "Reload"
                    </Button>
                </div>
            </CardHeader>
            <CardContent class="space-y-3">
                {move || load_error.get().map(|e| view! { <Alert>{e}</Alert> })}
                <ItemPicker
                    items=Signal::derive(move || catalog.get())
                    on_pick=on_pick
                    placeholder="Search items (press / to focus)"
                    input_ref=search_ref
                />
                {move || {
                    picked
                        .get()
                        .map(|item| {
                            let price = item
                                .price
                                .map(format_price)
                                .unwrap_or_else(|| "no price yet".to_string());
                            view! {
                                <div class="flex items-baseline justify-between rounded-md border px-3 py-2">
                                    <div class="space-y-0.5">
                                        <div class="text-sm font-medium">{item.name.clone()}</div>
                                        <div class="text-xs text-muted-foreground">
                                            {item.category.clone().unwrap_or_default()}
                                        </div>
                                    </div>
                                    <div class="text-lg font-semibold">{price}</div>
                                </div>
                            }
                        })
                }}
            </CardContent>
        </Card>

        <Show when=move || !recent.with(|r| r.is_empty())>
            <Card>
                <CardHeader>
                    <CardTitle>"Recently picked"</CardTitle>
                </CardHeader>
                <CardContent>
                    <CardList>
                        {move || {
                            recent
                                .get()
                                .into_iter()
                                .map(|r| {
                                    let id = r.id.clone();
                                    let picked_at = format_timestamp_now(Some(r.picked_ms));
                                    view! {
                                        <CardItem>
                                            <button
                                                class="flex w-full items-center justify-between text-left text-sm hover:underline"
                                                on:click=move |_| pick_recent(id.clone())
                                            >
                                                <span class="truncate">{r.name.clone()}</span>
                                                <span class="text-xs text-muted-foreground">{picked_at}</span>
                                            </button>
                                        </CardItem>
                                    }
                                })
                                .collect_view()
                        }}
                    </CardList>
                </CardContent>
            </Card>
        </Show>
    }
}

#[component]
pub fn SuggestionsPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let store = app_state.0.store;
    let user_id = app_state.0.current_user_id;
    let has_unread = app_state.0.has_unread;

    let suggestions: RwSignal<Vec<Suggestion>> = RwSignal::new(vec![]);
    let loading: RwSignal<bool> = RwSignal::new(false);
    let load_error: RwSignal<Option<String>> = RwSignal::new(None);

    // Opening the list counts as seeing every thread in it.
    Effect::new(move |_| {
        let Some(uid) = user_id.get() else {
            return;
        };
        let client = store.get_untracked();
        NotificationTracker::new(&client, &BrowserStorage).mark_seen(Some(&uid));
        has_unread.set(false);

        loading.set(true);
        load_error.set(None);
        spawn_local(async move {
            match load_user_suggestions(&client, &uid).await {
                Ok(list) => suggestions.set(list),
                Err(e) => {
                    error!("suggestions load failed for {uid}: {e}");
                    load_error.set(Some(e.to_string()));
                }
            }
            loading.set(false);
        });
    });

    view! {
        <Show
            when=move || user_id.with(|u| u.is_some())
            fallback=|| view! { <Notice>"Sign in to see your suggestions."</Notice> }
        >
            <Card>
                <CardHeader>
                    <CardTitle>"Your suggestions"</CardTitle>
                    <Show when=move || loading.get()>
                        <Spinner />
                    </Show>
                </CardHeader>
                <CardContent>
                    {move || load_error.get().map(|e| view! { <Alert>{e}</Alert> })}
                    <Show
                        when=move || !suggestions.with(|s| s.is_empty())
                        fallback=move || {
                            view! {
                                <Show when=move || !loading.get()>
                                    <div class="text-sm text-muted-foreground">"No suggestions yet."</div>
                                </Show>
                            }
                        }
                    >
                        <CardList>
                            {move || {
                                suggestions
                                    .get()
                                    .into_iter()
                                    .map(|s| {
                                        let title = if s.title.trim().is_empty() {
                                            "Untitled suggestion".to_string()
                                        } else {
                                            s.title.clone()
                                        };
                                        let activity = format_timestamp_now(s.last_activity_ms);
                                        view! {
                                            <CardItem>
                                                <a
                                                    href=format!("/suggestions/{}", urlencoding::encode(&s.id))
                                                    class="flex items-center justify-between text-sm hover:underline"
                                                >
                                                    <span class="truncate">{title}</span>
                                                    <span class="text-xs text-muted-foreground">{activity}</span>
                                                </a>
                                            </CardItem>
                                        }
                                    })
                                    .collect_view()
                            }}
                        </CardList>
                    </Show>
                </CardContent>
            </Card>
        </Show>
    }
}

#[derive(Params, PartialEq, Clone, Debug)]
pub struct SuggestionRouteParams {
    pub id: Option<String>,
}

#[component]
pub fn SuggestionThreadPage() -> impl IntoView {
    let params = leptos_router::hooks::use_params::<SuggestionRouteParams>();
    let suggestion_id = move || params.get().ok().and_then(|p| p.id).unwrap_or_default();

    view! {
        <a href="/suggestions" class="text-xs text-muted-foreground hover:underline">
            "Back to suggestions"
        </a>
        {move || {
            let id = suggestion_id();
            if id.trim().is_empty() {
                view! { <Notice>"Unknown suggestion."</Notice> }.into_any()
            } else {
                view! {
                    <ThreadPanel suggestion_id=id.clone() thread=SUGGESTION_MESSAGES title="Messages" />
                    <ThreadPanel suggestion_id=id thread=COMMENTS title="Comments" />
                }
                    .into_any()
            }
        }}
    }
}

/// Create, edit and delete entries of one thread collection under a
/// suggestion.
#[component]
fn ThreadPanel(
    suggestion_id: String,
    thread: ThreadCollection,
    #[prop(into)] title: String,
) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let store = app_state.0.store;
    let user_id = app_state.0.current_user_id;
    let suggestion_id = StoredValue::new(suggestion_id);

    let entries: RwSignal<Vec<ThreadEntry>> = RwSignal::new(vec![]);
    let loading: RwSignal<bool> = RwSignal::new(false);
    let busy: RwSignal<bool> = RwSignal::new(false);
    let load_error: RwSignal<Option<String>> = RwSignal::new(None);
    let draft: RwSignal<String> = RwSignal::new(String::new());
    // (entry id, edited text) while an entry is being edited.
    let editing: RwSignal<Option<(String, String)>> = RwSignal::new(None);
    // Bumped after each successful write to refetch the thread.
    let version: RwSignal<u64> = RwSignal::new(0);

    Effect::new(move |_| {
        let _ = version.get();
        let client = store.get_untracked();
        let sid = suggestion_id.get_value();
        loading.set(true);
        spawn_local(async move {
            match thread.load(&client, &sid).await {
                Ok(list) => {
                    entries.set(list);
                    load_error.set(None);
                }
                Err(e) => {
                    error!("loading {} for {sid} failed: {e}", thread.collection_id());
                    load_error.set(Some(e.to_string()));
                }
            }
            loading.set(false);
        });
    });

    let on_post = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let text = draft.get_untracked().trim().to_string();
        if text.is_empty() || busy.get_untracked() {
            return;
        }
        let client = store.get_untracked();
        let sid = suggestion_id.get_value();
        let author = user_id.get_untracked();

        busy.set(true);
        spawn_local(async move {
            let mut payload = Fields::new();
            payload.insert("text".to_string(), text.into());
            if let Some(author) = author {
                payload.insert("authorName".to_string(), author.into());
            }
            match thread.create(&client, &sid, payload).await {
                Ok(doc) => {
                    log!("posted {doc}");
                    draft.set(String::new());
                    version.update(|v| *v += 1);
                }
                Err(e) => {
                    error!("posting to {} failed: {e}", thread.collection_id());
                    load_error.set(Some(e.to_string()));
                }
            }
            busy.set(false);
        });
    };

    let save_edit = move || {
        let Some((id, text)) = editing.get_untracked() else {
            return;
        };
        let text = text.trim().to_string();
        if text.is_empty() || busy.get_untracked() {
            return;
        }
        let client = store.get_untracked();
        let sid = suggestion_id.get_value();

        busy.set(true);
        spawn_local(async move {
            let mut partial = Fields::new();
            partial.insert("text".to_string(), text.into());
            match thread.update(&client, &sid, &id, partial).await {
                Ok(()) => {
                    editing.set(None);
                    version.update(|v| *v += 1);
                }
                Err(e) => {
                    error!("editing {id} failed: {e}");
                    load_error.set(Some(e.to_string()));
                }
            }
            busy.set(false);
        });
    };

    let remove = move |id: String| {
        if busy.get_untracked() {
            return;
        }
        let client = store.get_untracked();
        let sid = suggestion_id.get_value();

        busy.set(true);
        spawn_local(async move {
            match thread.delete(&client, &sid, &id).await {
                Ok(()) => version.update(|v| *v += 1),
                Err(e) => {
                    error!("deleting {id} failed: {e}");
                    load_error.set(Some(e.to_string()));
                }
            }
            busy.set(false);
        });
    };

    let edit_value = Signal::derive(move || {
        editing.with(|e| e.as_ref().map(|(_, t)| t.clone()).unwrap_or_default())
    });
    let on_edit_input = Callback::new(move |v: String| {
        editing.update(|e| {
            if let Some((_, t)) = e {
                *t = v;
            }
        })
    });

    view! {
        <Card>
            <CardHeader>
                <CardTitle>{title}</CardTitle>
                <Show when=move || loading.get()>
                    <Spinner />
                </Show>
            </CardHeader>
            <CardContent class="space-y-3">
                {move || load_error.get().map(|e| view! { <Alert>{e}</Alert> })}
                <CardList>
                    {move || {
                        entries
                            .get()
                            .into_iter()
                            .map(|entry| {
                                let id = entry.id.clone();
                                let author = entry
                                    .author
                                    .clone()
                                    .unwrap_or_else(|| "Anonymous".to_string());
                                let stamp = format_timestamp_now(entry.created_ms);
                                let edited = entry.is_edited().then_some(" (edited)");
                                let text = entry.text.clone();

                                let is_editing = {
                                    let id = id.clone();
                                    move || editing.with(|e| e.as_ref().is_some_and(|(eid, _)| *eid == id))
                                };

                                view! {
                                    <CardItem>
                                        <div class="flex items-center justify-between text-xs text-muted-foreground">
                                            <span>{author}</span>
                                            <span>{stamp}{edited}</span>
                                        </div>
                                        {move || {
                                            if is_editing() {
                                                view! {
                                                    <div class="flex items-center gap-2">
                                                        <Input value=edit_value on_input=on_edit_input />
                                                        <Button
                                                            size=ButtonSize::Sm
                                                            on:click=move |_| save_edit()
                                                            attr:disabled=move || busy.get()
                                                        >
                                                            "Save"
                                                        </Button>
                                                        <Button
                                                            variant=ButtonVariant::Ghost
                                                            size=ButtonSize::Sm
                                                            on:click=move |_| editing.set(None)
                                                        >
                                                            "Cancel"
                                                        </Button>
                                                    </div>
                                                }
                                                    .into_any()
                                            } else {
                                                let id_edit = id.clone();
                                                let id_remove = id.clone();
                                                let text_edit = text.clone();
                                                view! {
                                                    <div class="flex items-start justify-between gap-2">
                                                        <p class="whitespace-pre-wrap text-sm">{text.clone()}</p>
                                                        <div class="flex shrink-0 gap-1">
                                                            <Button
                                                                variant=ButtonVariant::Ghost
                                                                size=ButtonSize::Xs
                                                                on:click=move |_| {
                                                                    editing.set(Some((id_edit.clone(), text_edit.clone())))
                                                                }
                                                            >
                                                                "Edit"
                                                            </Button>
                                                            <Button
                                                                variant=ButtonVariant::Ghost
                                                                size=ButtonSize::Xs
                                                                class="text-destructive"
                                                                on:click=move |_| remove(id_remove.clone())
                                                                attr:disabled=move || busy.get()
                                                            >
                                                                "Delete"
                                                            </Button>
                                                        </div>
                                                    </div>
                                                }
                                                    .into_any()
                                            }
                                        }}
                                    </CardItem>
                                }
                            })
                            .collect_view()
                    }}
                </CardList>

                <form class="flex items-center gap-2" on:submit=on_post>
                    <Input
                        placeholder="Write a reply"
                        value=draft
                        on_input=Callback::new(move |v: String| draft.set(v))
                    />
                    <Button attr:disabled=move || busy.get()>
                        "Post"
                    </Button>
                </form>
            </CardContent>
        </Card>
    }
}
