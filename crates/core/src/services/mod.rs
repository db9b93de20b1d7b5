pub mod drag_interpreter;
pub mod hierarchy_service;
pub mod mutation_gateway;
pub mod tree_projector;
