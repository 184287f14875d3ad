use bevy::prelude::*;

use super::movement_plugin::MovementSet;
use crate::movement::kinematic;

/// Installs the reference kinematic collaborator. Hosts with their own
/// locomotion solver read `PhysicsDirective`s and write `LocomotionReport`s instead.
pub struct KinematicLocomotionPlugin;

impl Plugin for KinematicLocomotionPlugin {
    fn build(&self, app: &mut App) {
        // Chained: directives land before the body integrates
        app.add_systems(
            FixedUpdate,
            (kinematic::apply_directives, kinematic::integrate_bodies)
                .chain()
                .in_set(MovementSet::Locomotion),
        );
    }
}
