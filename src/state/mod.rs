pub mod add_form;
pub mod column;
pub mod column_menu;
pub mod data_model;
pub mod filter;
pub mod format;
pub mod patterns;
pub mod reorder;
pub mod resize;
pub mod sorter;
pub mod table_state;
pub mod view_state;
