pub mod config;
pub mod movement;
pub mod plugins;
