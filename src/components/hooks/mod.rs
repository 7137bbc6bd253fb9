pub mod use_filtered_select;

pub use use_filtered_select::use_filtered_select;
