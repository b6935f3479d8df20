pub mod batch_coordinator;
pub mod entry_service;
pub mod grid_controller;
pub mod layered;
pub mod selection_resolver;
pub mod state_resolver;
