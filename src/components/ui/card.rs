use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Card, section, "bg-card text-card-foreground flex flex-col gap-3 rounded-lg border py-4 shadow-sm"}
    clx! {CardHeader, div, "flex items-center justify-between gap-2 px-4"}
    clx! {CardTitle, h2, "text-sm font-semibold leading-none"}
    clx! {CardContent, div, "px-4"}
    clx! {CardList, ul, "flex flex-col divide-y"}
    clx! {CardItem, li, "flex flex-col gap-1 py-2"}
}

pub use components::*;
