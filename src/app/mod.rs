use crate::pages::{AppLayout, CatalogPage, SuggestionThreadPage, SuggestionsPage};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    provide_context(AppContext(AppState::new()));

    view! {
        <Router>
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                <Route path=path!("suggestions") view=move || view! {
                    <AppLayout>
                        <SuggestionsPage />
                    </AppLayout>
                } />
                <Route path=path!("suggestions/:id") view=move || view! {
                    <AppLayout>
                        <SuggestionThreadPage />
                    </AppLayout>
                } />
                <Route path=path!("") view=move || view! {
                    <AppLayout>
                        <CatalogPage />
                    </AppLayout>
                } />
            </Routes>
        </Router>
    }
}
