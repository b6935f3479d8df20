pub mod action;
pub mod batch;
pub mod column;
pub mod entry;
pub mod grid_state;
pub mod selection;
