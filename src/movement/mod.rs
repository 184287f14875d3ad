pub mod ability;
pub mod actions;
pub mod animation;
pub mod authority;
pub mod components;
pub mod controller;
pub mod environment;
pub mod events;
pub mod fuel;
pub mod gate;
pub mod kinematic;
pub mod probe;
pub mod replication;
pub mod settings;
pub mod speed;
pub mod tick;
pub mod timers;
pub mod types;

#[cfg(test)]
mod testing;
