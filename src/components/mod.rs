pub mod hooks;
pub mod item_picker;
pub mod ui;

pub use item_picker::ItemPicker;
