//! Shared fixtures for unit tests.

use bevy::prelude::*;

use super::authority::AuthorityRole;
use super::components::{
    ActorAnchors, ActorContext, AdvancedMovement, Anchor, Capabilities, LocomotionReport, OwnerCapability,
    OwnerState,
};
use super::events::MovementOutput;
use super::probe::{FloorHit, PlaneWorld};
use super::settings::MovementSettings;
use super::types::WallSide;

pub fn wall_anchors() -> ActorAnchors {
    let forward = Vec3::NEG_Z;
    ActorAnchors::default()
        .with(
            WallSide::Front.anchor_name(),
            Anchor {
                offset: Vec3::new(0.0, 0.0, -50.0),
                forward,
            },
        )
        .with(
            WallSide::Left.anchor_name(),
            Anchor {
                offset: Vec3::new(-50.0, 0.0, 0.0),
                forward,
            },
        )
        .with(
            WallSide::Right.anchor_name(),
            Anchor {
                offset: Vec3::new(50.0, 0.0, 0.0),
                forward,
            },
        )
}

/// One actor standing in (or above) a plane world.
pub struct Rig {
    pub world: PlaneWorld,
    pub report: LocomotionReport,
    pub owner: Option<OwnerState>,
    pub position: Vec3,
    pub rotation: Quat,
    pub role: AuthorityRole,
}

impl Rig {
    pub fn grounded() -> Self {
        Self {
            world: PlaneWorld::flat(0.0),
            report: LocomotionReport {
                floor: Some(FloorHit {
                    normal: Vec3::Y,
                    distance: 0.0,
                }),
                ..default()
            },
            owner: Some(OwnerState::default()),
            position: Vec3::new(0.0, 96.0, 0.0),
            rotation: Quat::IDENTITY,
            role: AuthorityRole::Standalone,
        }
    }

    pub fn airborne() -> Self {
        let mut rig = Self::grounded();
        rig.position = Vec3::new(0.0, 500.0, 0.0);
        rig.report.airborne = true;
        rig.report.floor = None;
        rig.report.locomotion = super::types::LocomotionMode::Falling;
        if let Some(owner) = &mut rig.owner {
            owner.falling = true;
        }
        rig
    }

    pub fn ctx(&self) -> ActorContext<'_> {
        ActorContext {
            position: self.position,
            rotation: self.rotation,
            report: &self.report,
            probe: &self.world,
            owner: self.owner.as_ref().map(|o| o as &dyn OwnerCapability),
            role: self.role,
        }
    }

    pub fn initialized(&self, settings: MovementSettings) -> AdvancedMovement {
        self.initialized_as(settings, Capabilities::CHARACTER)
    }

    pub fn initialized_as(&self, settings: MovementSettings, capabilities: Capabilities) -> AdvancedMovement {
        let mut movement = AdvancedMovement::new(settings);
        let mut out = MovementOutput::default();
        movement
            .initialize(capabilities, Some(&wall_anchors()), None, None, &mut out)
            .expect("fixture anchors are complete");
        movement
    }
}
