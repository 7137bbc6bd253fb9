use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Alert, div, "w-full rounded-md border border-destructive/40 bg-destructive/5 px-3 py-2 text-sm text-destructive"}
    clx! {Notice, div, "w-full rounded-md border bg-muted px-3 py-2 text-sm text-muted-foreground"}
}

pub use components::*;
