//! Read-only observed state. The authority publishes a snapshot after each
//! step; replicas copy it verbatim without re-validation.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::ability::AbilityState;
use super::components::{AdvancedMovement, SavedLocomotion};
use super::timers::TimerSet;
use super::types::{MovementAnimTag, MovementMode, SlopeDegrees};

/// Every replicated field of one actor's movement state.
#[derive(Component, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementSnapshot {
    pub initialized: bool,
    pub mode: MovementMode,
    pub previous_mode: MovementMode,
    pub anim_tag: MovementAnimTag,
    pub abilities: AbilityState,
    pub timers: TimerSet,
    pub fuel: f32,
    pub last_ground_location: Vec3,
    pub last_air_location: Vec3,
    pub velocity: Vec3,
    pub current_speed: f32,
    pub slope_angle: SlopeDegrees,
    pub slope_scalar: f32,
    pub saved: SavedLocomotion,
}

impl MovementSnapshot {
    pub fn to_wire(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_wire(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

impl AdvancedMovement {
    pub fn snapshot(&self) -> MovementSnapshot {
        MovementSnapshot {
            initialized: self.initialized,
            mode: self.modes.current(),
            previous_mode: self.modes.previous(),
            anim_tag: self.anim_tag,
            abilities: self.abilities.clone(),
            timers: self.timers,
            fuel: self.fuel.level(),
            last_ground_location: self.last_ground_location,
            last_air_location: self.last_air_location,
            velocity: self.velocity,
            current_speed: self.current_speed,
            slope_angle: self.slope.angle,
            slope_scalar: self.slope.scalar,
            saved: self.saved,
        }
    }
}

/// Emitted whenever an actor's snapshot changed this step.
#[derive(Message, Debug, Clone)]
pub struct SnapshotPublished {
    pub actor: Entity,
    pub snapshot: MovementSnapshot,
}

/// Marks an observer entity mirroring another actor's movement.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicaOf(pub Entity);

/// The mirrored copy held by a replica.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct ObservedMovement(pub MovementSnapshot);

/// Refresh snapshots and publish the ones that changed.
pub fn publish_snapshots(
    mut actors: Query<(Entity, &AdvancedMovement, &mut MovementSnapshot)>,
    mut published: MessageWriter<SnapshotPublished>,
) {
    for (entity, movement, mut snapshot) in &mut actors {
        let next = movement.snapshot();
        if *snapshot == next {
            continue;
        }
        *snapshot = next.clone();
        published.write(SnapshotPublished {
            actor: entity,
            snapshot: next,
        });
    }
}

/// Copy published snapshots onto their replicas.
pub fn mirror_replicas(
    mut published: MessageReader<SnapshotPublished>,
    mut replicas: Query<(&ReplicaOf, &mut ObservedMovement)>,
) {
    for msg in published.read() {
        for (source, mut observed) in &mut replicas {
            if source.0 == msg.actor {
                observed.0 = msg.snapshot.clone();
            }
        }
    }
}
