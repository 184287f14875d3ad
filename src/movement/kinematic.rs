//! Reference locomotion collaborator: a capsule that integrates directives,
//! gravity and a probed floor. Enough to drive the controller end to end,
//! not a physics solver.

use bevy::prelude::*;

use super::authority::{MovementCommand, MovementRequest};
use super::components::{LocomotionReport, OwnerState};
use super::events::{Directive, PhysicsDirective, SpeedSlot};
use super::probe::{EnvironmentProbe, FloorHit, SpatialProbe, probe_or_null};
use super::types::LocomotionMode;
use crate::config::tuning::MovementTuning;

/// Distance below the capsule bottom still counted as standing.
const FLOOR_SNAP: f32 = 2.0;
/// Floor search below the capsule bottom, for the reported floor distance.
const FLOOR_SEARCH: f32 = 100_000.0;

#[derive(Component, Debug, Clone, PartialEq)]
pub struct KinematicBody {
    pub velocity: Vec3,
    pub gravity: f32,
    pub jump_speed: f32,
    pub max_walk_speed: f32,
    pub max_walk_speed_crouched: f32,
    pub max_fly_speed: f32,
    pub max_acceleration: f32,
    pub braking_friction: f32,
    pub half_height: f32,
    pub locomotion: LocomotionMode,
    pub crouched: bool,
    pub orient_to_movement: bool,
    /// Set by `DisableMovement`; cleared by the next locomotion change.
    pub disabled: bool,
    pending_input: Vec3,
    pending_force: Vec3,
}

impl Default for KinematicBody {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            gravity: 980.0,
            jump_speed: 420.0,
            max_walk_speed: 600.0,
            max_walk_speed_crouched: 300.0,
            max_fly_speed: 600.0,
            max_acceleration: 2048.0,
            braking_friction: 2.0,
            half_height: 96.0,
            locomotion: LocomotionMode::Walking,
            crouched: false,
            orient_to_movement: false,
            disabled: false,
            pending_input: Vec3::ZERO,
            pending_force: Vec3::ZERO,
        }
    }
}

impl KinematicBody {
    pub fn is_airborne(&self) -> bool {
        self.locomotion == LocomotionMode::Falling
    }

    fn max_speed(&self) -> f32 {
        match self.locomotion {
            LocomotionMode::Flying => self.max_fly_speed,
            _ if self.crouched => self.max_walk_speed_crouched,
            _ => self.max_walk_speed,
        }
    }

    /// Apply one directive to the body and its transform.
    pub fn apply(&mut self, transform: &mut Transform, directive: Directive) {
        match directive {
            Directive::Launch {
                velocity,
                xy_override,
                z_override,
            } => {
                let planar = Vec3::new(velocity.x, 0.0, velocity.z);
                if xy_override {
                    self.velocity.x = planar.x;
                    self.velocity.z = planar.z;
                } else {
                    self.velocity += planar;
                }
                if z_override {
                    self.velocity.y = velocity.y;
                } else {
                    self.velocity.y += velocity.y;
                }
                if self.locomotion != LocomotionMode::Flying {
                    self.locomotion = LocomotionMode::Falling;
                }
            }
            Directive::AddOffset(offset) => transform.translation += offset,
            Directive::AddForce(force) => self.pending_force += force,
            Directive::AddInput { direction, scale } => self.pending_input += direction * scale,
            Directive::SetVelocity(velocity) => self.velocity = velocity,
            Directive::SetPosition(position) => transform.translation = position,
            Directive::SetMaxSpeed { slot, speed } => match slot {
                SpeedSlot::Walk => self.max_walk_speed = speed,
                SpeedSlot::Crouched => self.max_walk_speed_crouched = speed,
                SpeedSlot::Fly => self.max_fly_speed = speed,
            },
            Directive::SetBrakingFriction(friction) => self.braking_friction = friction,
            Directive::SetMaxAcceleration(acceleration) => self.max_acceleration = acceleration,
            Directive::SetLocomotion(mode) => {
                self.locomotion = mode;
                self.disabled = false;
            }
            Directive::SetOrientToMovement(orient) => self.orient_to_movement = orient,
            Directive::Jump => {
                if self.locomotion == LocomotionMode::Walking {
                    self.velocity.y = self.jump_speed;
                    self.locomotion = LocomotionMode::Falling;
                }
            }
            // No variable-height jump; nothing to cut short.
            Directive::StopJumping => {}
            Directive::Crouch => self.crouched = true,
            Directive::UnCrouch => self.crouched = false,
            Directive::SetCapsule { half_height, .. } => self.half_height = half_height,
            Directive::DisableMovement => {
                self.disabled = true;
                self.velocity = Vec3::ZERO;
            }
        }
    }

    /// Integrate one step. Returns the floor under the capsule and whether
    /// the body touched down this step.
    pub fn step(&mut self, transform: &mut Transform, probe: &dyn EnvironmentProbe, dt: f32) -> (Option<FloorHit>, bool) {
        let input = std::mem::take(&mut self.pending_input);
        let force = std::mem::take(&mut self.pending_force);
        if self.disabled {
            return (self.floor_below(transform, probe), false);
        }

        // Input accelerates toward the slot's max speed.
        let desired = input.clamp_length_max(1.0) * self.max_speed();
        if input != Vec3::ZERO {
            let flying = self.locomotion == LocomotionMode::Flying;
            let current = if flying {
                self.velocity
            } else {
                Vec3::new(self.velocity.x, 0.0, self.velocity.z)
            };
            let target = if flying { desired } else { Vec3::new(desired.x, 0.0, desired.z) };
            let delta = (target - current).clamp_length_max(self.max_acceleration * dt);
            self.velocity += delta;
        } else if self.locomotion == LocomotionMode::Walking {
            let keep = (1.0 - self.braking_friction * dt).max(0.0);
            self.velocity.x *= keep;
            self.velocity.z *= keep;
        }
        self.velocity += force * dt;
        if self.locomotion == LocomotionMode::Falling {
            self.velocity.y -= self.gravity * dt;
        }
        transform.translation += self.velocity * dt;

        let gap = self.floor_gap(transform, probe);
        let was_airborne = self.is_airborne();
        let standing = gap.is_some_and(|g| g <= FLOOR_SNAP) && self.velocity.y <= 0.0;
        let mut touched_down = false;
        match self.locomotion {
            LocomotionMode::Flying | LocomotionMode::None => {}
            _ if standing => {
                transform.translation -= Vec3::Y * gap.unwrap_or(0.0);
                self.velocity.y = 0.0;
                self.locomotion = LocomotionMode::Walking;
                touched_down = was_airborne;
            }
            _ => self.locomotion = LocomotionMode::Falling,
        }
        (self.floor_below(transform, probe), touched_down)
    }

    /// Signed distance from the capsule bottom down to the floor.
    /// Negative when the capsule sank into it.
    fn floor_gap(&self, transform: &Transform, probe: &dyn EnvironmentProbe) -> Option<f32> {
        probe
            .sweep_floor(transform.translation, Vec3::NEG_Y, self.half_height + FLOOR_SEARCH)
            .map(|hit| hit.distance - self.half_height)
    }

    /// Floor under the capsule bottom. Distance is measured from the bottom.
    fn floor_below(&self, transform: &Transform, probe: &dyn EnvironmentProbe) -> Option<FloorHit> {
        probe
            .sweep_floor(transform.translation, Vec3::NEG_Y, self.half_height + FLOOR_SEARCH)
            .map(|hit| FloorHit {
                normal: hit.normal,
                distance: (hit.distance - self.half_height).max(0.0),
            })
    }

    fn report(&self, floor: Option<FloorHit>) -> LocomotionReport {
        LocomotionReport {
            velocity: self.velocity,
            airborne: self.is_airborne(),
            floor: if self.is_airborne() { None } else { floor },
            braking_friction: self.braking_friction,
            max_acceleration: self.max_acceleration,
            locomotion: self.locomotion,
        }
    }
}

/// Locomotion: apply directives emitted this step.
pub fn apply_directives(
    mut directives: MessageReader<PhysicsDirective>,
    mut bodies: Query<(&mut KinematicBody, &mut Transform)>,
) {
    for msg in directives.read() {
        if let Ok((mut body, mut transform)) = bodies.get_mut(msg.actor) {
            body.apply(&mut transform, msg.directive);
        }
    }
}

/// Locomotion: integrate bodies, refresh reports and report landings.
pub fn integrate_bodies(
    tuning: Res<MovementTuning>,
    probe: Option<Res<SpatialProbe>>,
    mut bodies: Query<(Entity, &mut KinematicBody, &mut Transform, &mut LocomotionReport, Option<&mut OwnerState>)>,
    mut requests: MessageWriter<MovementRequest>,
) {
    let dt = tuning.dt;
    let probe = probe_or_null(probe.as_deref());
    for (entity, mut body, mut transform, mut report, owner) in &mut bodies {
        let (floor, touched_down) = body.step(&mut transform, probe, dt);
        *report = body.report(floor);
        if let Some(mut owner) = owner {
            owner.falling = body.is_airborne();
            owner.speed = Vec3::new(body.velocity.x, 0.0, body.velocity.z).length();
            owner.direction = transform.rotation * Vec3::NEG_Z;
        }
        if touched_down {
            debug!("actor {entity:?} landed at {:?}", transform.translation);
            requests.write(MovementRequest::local(entity, MovementCommand::Landed));
        }
    }
}
