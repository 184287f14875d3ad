pub mod locomotion_plugin;
pub mod movement_plugin;
