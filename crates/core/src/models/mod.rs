pub mod display;
pub mod gesture;
pub mod group;
pub mod path;
pub mod settings;
