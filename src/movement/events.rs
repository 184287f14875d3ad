use bevy::prelude::*;

use super::ability::Ability;
use super::types::{LocomotionMode, MovementMode, WallSide};

/// Typed notification emitted by a committed operation.
///
/// Ability notifications fire on every press and release that reaches the
/// commit stage, including a release that found the ability already inactive.
/// Animation and UI consumers rely on that.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    ModeChanged {
        current: MovementMode,
        previous: MovementMode,
    },
    Ability {
        ability: Ability,
        active: bool,
    },
    Jumped {
        custom: bool,
        double: bool,
    },
    Climbed {
        side: WallSide,
    },
    FuelChanged {
        level: f32,
    },
    SpeedsUpdated,
    AnimationsUpdated,
    AutoRunChanged {
        enabled: bool,
    },
    /// Attach (or detach) the optional parachute visual at `socket`.
    ParachuteVisual {
        attached: bool,
        socket: String,
    },
}

/// Which max-speed slot of the locomotion solver a speed applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedSlot {
    Walk,
    Crouched,
    Fly,
}

impl SpeedSlot {
    pub fn for_mode(mode: MovementMode) -> Self {
        match mode {
            MovementMode::Fly => Self::Fly,
            MovementMode::Crouch => Self::Crouched,
            _ => Self::Walk,
        }
    }
}

/// Physical effect handed to the external locomotion collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Directive {
    /// Character relaunch. Override flags replace instead of add per axis group.
    Launch {
        velocity: Vec3,
        xy_override: bool,
        z_override: bool,
    },
    AddOffset(Vec3),
    AddForce(Vec3),
    AddInput {
        direction: Vec3,
        scale: f32,
    },
    SetVelocity(Vec3),
    SetPosition(Vec3),
    SetMaxSpeed {
        slot: SpeedSlot,
        speed: f32,
    },
    SetBrakingFriction(f32),
    SetMaxAcceleration(f32),
    SetLocomotion(LocomotionMode),
    SetOrientToMovement(bool),
    Jump,
    StopJumping,
    Crouch,
    UnCrouch,
    SetCapsule {
        radius: f32,
        half_height: f32,
        mesh_offset: Vec3,
    },
    DisableMovement,
}

/// "Play timed cue" request for the animation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct CueRequest {
    pub id: String,
    pub rate: f32,
    pub start: f32,
    pub stop_competing: bool,
}

/// Everything one operation or tick produced, in order.
#[derive(Debug, Clone, Default)]
pub struct MovementOutput {
    pub notifications: Vec<Notification>,
    pub directives: Vec<Directive>,
    pub cues: Vec<CueRequest>,
}

impl MovementOutput {
    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    pub fn direct(&mut self, directive: Directive) {
        self.directives.push(directive);
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty() && self.directives.is_empty() && self.cues.is_empty()
    }

    pub fn clear(&mut self) {
        self.notifications.clear();
        self.directives.clear();
        self.cues.clear();
    }
}

// ── Messages ────────────────────────────────────────────────────────

#[derive(Message, Debug, Clone)]
pub struct MovementEvent {
    pub actor: Entity,
    pub notification: Notification,
}

#[derive(Message, Debug, Clone)]
pub struct PhysicsDirective {
    pub actor: Entity,
    pub directive: Directive,
}

#[derive(Message, Debug, Clone)]
pub struct AnimationCue {
    pub actor: Entity,
    pub cue: CueRequest,
}
