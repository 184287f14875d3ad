//! Request / commit boundary.
//!
//! Input owners send `MovementRequest`s. The authoritative process validates
//! them against the actor's input owner and readiness, then commits them onto
//! the `AdvancedMovement` component. A client only forwards.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::actions::{InputAxis, MovementError};
use super::components::{ActorContext, AdvancedMovement};
use super::events::MovementOutput;
use super::types::MovementMode;

/// Role of this process in a (possibly networked) deployment.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AuthorityRole {
    /// Sole local process. Always authoritative.
    #[default]
    Standalone,
    Server,
    Client,
}

impl AuthorityRole {
    pub fn is_authoritative(self) -> bool {
        !matches!(self, Self::Client)
    }
}

/// Identity of an input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(pub Uuid);

impl PeerId {
    /// The authoritative process itself.
    pub const LOCAL: Self = Self(Uuid::nil());

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if *self == Self::LOCAL {
            write!(f, "local")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Peer allowed to drive this actor. Actors without one accept only local requests.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputOwner(pub PeerId);

/// Every mutating entry point an input owner may request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MovementCommand {
    Axis { axis: InputAxis, value: f32 },
    Jump { pressed: bool },
    Crouch { pressed: bool },
    Sprint { pressed: bool },
    Dash { pressed: bool, direction: Vec3, force_end: bool },
    Blink { pressed: bool, direction: Vec3, force_end: bool },
    Roll { pressed: bool, direction: Vec3, force_end: bool },
    Hover { pressed: bool, force_end: bool },
    Prone { pressed: bool },
    ZeroG { pressed: bool },
    Jetpack { pressed: bool },
    AutoRun { pressed: bool },
    DeployParachute,
    ReleaseParachute,
    /// Ground contact reported by the locomotion solver.
    Landed,
    MoveToLastGroundLocation,
    MoveToLastAirLocation,
    SetJetpackFuel(f32),
    SetMode(MovementMode),
    RestorePrevious,
}

impl MovementCommand {
    /// Every float the command carries is finite.
    pub fn is_finite(&self) -> bool {
        match *self {
            Self::Axis { value, .. } => value.is_finite(),
            Self::Dash { direction, .. } | Self::Blink { direction, .. } | Self::Roll { direction, .. } => {
                direction.is_finite()
            }
            Self::SetJetpackFuel(level) => level.is_finite(),
            _ => true,
        }
    }
}

#[derive(Message, Debug, Clone)]
pub struct MovementRequest {
    pub actor: Entity,
    /// Stamped by the transport from the connection the request arrived
    /// on. A remote peer's own claim to be `PeerId::LOCAL` must never be
    /// trusted: local senders skip the ownership check.
    pub sender: PeerId,
    pub command: MovementCommand,
}

impl MovementRequest {
    pub fn local(actor: Entity, command: MovementCommand) -> Self {
        Self {
            actor,
            sender: PeerId::LOCAL,
            command,
        }
    }
}

/// A request the authority refused, with the reason.
#[derive(Message, Debug, Clone)]
pub struct RequestRejected {
    pub request: MovementRequest,
    pub reason: RejectReason,
}

/// A request a client hands to its transport for the authority.
#[derive(Message, Debug, Clone)]
pub struct OutgoingRequest(pub MovementRequest);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("actor is not initialized")]
    Unready,
    #[error("peer {0} does not own this actor")]
    NotAuthorized(PeerId),
    #[error("no movement controller on the target actor")]
    UnknownActor,
    #[error("command carries a non-finite value")]
    InvalidPayload,
}

impl From<MovementError> for RejectReason {
    fn from(err: MovementError) -> Self {
        match err {
            MovementError::Unready => Self::Unready,
            MovementError::NonFinite => Self::InvalidPayload,
        }
    }
}

/// What the gateway does with a request in the current role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Commit,
    Forward,
}

/// Decide how to handle a request. Clients forward everything; the
/// authority checks ownership, then readiness.
pub fn route(
    role: AuthorityRole,
    sender: PeerId,
    owner: Option<&InputOwner>,
    movement: &AdvancedMovement,
) -> Result<Route, RejectReason> {
    if !role.is_authoritative() {
        return Ok(Route::Forward);
    }
    if role == AuthorityRole::Server && sender != PeerId::LOCAL {
        let owned = owner.is_some_and(|o| o.0 == sender);
        if !owned {
            return Err(RejectReason::NotAuthorized(sender));
        }
    }
    if !movement.is_initialized() {
        return Err(RejectReason::Unready);
    }
    Ok(Route::Commit)
}

/// Apply a validated command.
pub fn commit(
    movement: &mut AdvancedMovement,
    ctx: &ActorContext,
    command: MovementCommand,
    out: &mut MovementOutput,
) -> Result<(), MovementError> {
    use MovementCommand as C;
    if !command.is_finite() {
        return Err(MovementError::NonFinite);
    }
    match command {
        C::Axis { axis, value } => movement.set_axis(ctx, axis, value, out),
        C::Jump { pressed } => movement.jump(ctx, pressed, out),
        C::Crouch { pressed } => movement.crouch(ctx, pressed, out),
        C::Sprint { pressed } => movement.sprint(pressed, out),
        C::Dash {
            pressed,
            direction,
            force_end,
        } => movement.dash(pressed, direction, force_end, out),
        C::Blink {
            pressed,
            direction,
            force_end,
        } => movement.blink(pressed, direction, force_end, out),
        C::Roll {
            pressed,
            direction,
            force_end,
        } => movement.roll(pressed, direction, force_end, out),
        C::Hover { pressed, force_end } => movement.hover(ctx, pressed, force_end, out),
        C::Prone { pressed } => movement.prone(pressed, out),
        C::ZeroG { pressed } => movement.zero_g(pressed, out),
        C::Jetpack { pressed } => movement.jetpack(pressed, out),
        C::AutoRun { pressed } => movement.auto_run(pressed, out),
        C::DeployParachute => movement.deploy_parachute(ctx, out),
        C::ReleaseParachute => movement.release_parachute(out),
        C::Landed => movement.landed(ctx, out),
        C::MoveToLastGroundLocation => movement.move_to_last_ground_location(out),
        C::MoveToLastAirLocation => movement.move_to_last_air_location(out),
        C::SetJetpackFuel(level) => movement.set_jetpack_fuel(level, out),
        C::SetMode(mode) => movement.request_mode(mode, out).map(|_| ()),
        C::RestorePrevious => movement.restore_previous(out).map(|_| ()),
    }
}
