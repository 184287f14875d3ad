use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::ability::AbilityState;
use super::animation::MovementAnimations;
use super::authority::AuthorityRole;
use super::controller::ModeController;
use super::events::SpeedSlot;
use super::fuel::FuelState;
use super::gate::{AbilityGate, GroundContact};
use super::probe::{EnvironmentProbe, FloorHit};
use super::settings::MovementSettings;
use super::speed::{SlopeCurve, SpeedProfile};
use super::timers::TimerSet;
use super::types::{LocomotionMode, MovementAnimTag, MovementMode, SlopeDegrees};

// ── Collaborator-facing components ──────────────────────────────────

/// Written by the external locomotion solver every fixed step.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct LocomotionReport {
    pub velocity: Vec3,
    pub airborne: bool,
    /// Floor the solver is standing on, if any.
    pub floor: Option<FloorHit>,
    pub braking_friction: f32,
    pub max_acceleration: f32,
    pub locomotion: LocomotionMode,
}

impl Default for LocomotionReport {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            airborne: false,
            floor: None,
            braking_friction: 0.0,
            max_acceleration: 2048.0,
            locomotion: LocomotionMode::Walking,
        }
    }
}

/// Capability the owning actor may expose. Missing => auto-run and
/// ground/air bookkeeping are skipped.
pub trait OwnerCapability {
    fn is_falling(&self) -> bool;
    fn speed(&self) -> f32;
    fn movement_direction(&self) -> Vec3;
}

/// Plain-data owner capability, filled in by gameplay code.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct OwnerState {
    pub falling: bool,
    pub speed: f32,
    pub direction: Vec3,
}

impl OwnerCapability for OwnerState {
    fn is_falling(&self) -> bool {
        self.falling
    }

    fn speed(&self) -> f32 {
        self.speed
    }

    fn movement_direction(&self) -> Vec3 {
        self.direction
    }
}

/// How the controller may move this actor. Chosen once at initialization.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Character-style relaunch with velocity overrides.
    pub launchable: bool,
    /// Accepts movement input vectors (pawn-like).
    pub input_driven: bool,
    /// Root body is simulated; thrust becomes a force instead of an offset.
    pub simulates_physics: bool,
}

impl Capabilities {
    pub const CHARACTER: Self = Self {
        launchable: true,
        input_driven: true,
        simulates_physics: false,
    };

    pub const PAWN: Self = Self {
        launchable: false,
        input_driven: true,
        simulates_physics: false,
    };

    /// Generic actor: only direct offsets.
    pub const OFFSET_ONLY: Self = Self {
        launchable: false,
        input_driven: false,
        simulates_physics: false,
    };
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::CHARACTER
    }
}

/// A named point on the actor, in actor-local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub offset: Vec3,
    pub forward: Vec3,
}

/// Named anchors attached to the actor (wall probe points among them).
#[derive(Component, Debug, Clone, Default)]
pub struct ActorAnchors(pub HashMap<String, Anchor>);

impl ActorAnchors {
    pub fn with(mut self, name: &str, anchor: Anchor) -> Self {
        self.0.insert(name.into(), anchor);
        self
    }

    pub fn get(&self, name: &str) -> Option<Anchor> {
        self.0.get(name).copied()
    }
}

/// The three wall probe anchors resolved during initialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallProbes {
    pub front: Anchor,
    pub left: Anchor,
    pub right: Anchor,
}

/// Input axes last committed for this actor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputAxes {
    pub forward: f32,
    pub right: f32,
    pub up: f32,
}

/// Side state captured on activation and written back on deactivation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedLocomotion {
    pub braking_friction: f32,
    pub max_acceleration: f32,
    pub locomotion: LocomotionMode,
}

/// Last slope reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlopeReading {
    pub angle: SlopeDegrees,
    pub scalar: f32,
}

impl Default for SlopeReading {
    fn default() -> Self {
        Self {
            angle: SlopeDegrees(0.0),
            scalar: 1.0,
        }
    }
}

/// Per-step environment results, kept for observers and debugging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WallResult {
    pub hit: bool,
    pub launch_velocity: Vec3,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    pub floor: Option<FloorHit>,
    pub slope: SlopeDegrees,
    pub front: WallResult,
    pub left: WallResult,
    pub right: WallResult,
}

// ── Step context ────────────────────────────────────────────────────

/// Everything an operation may read about the actor and its world this step.
pub struct ActorContext<'a> {
    pub position: Vec3,
    pub rotation: Quat,
    pub report: &'a LocomotionReport,
    pub probe: &'a dyn EnvironmentProbe,
    pub owner: Option<&'a dyn OwnerCapability>,
    pub role: AuthorityRole,
}

impl ActorContext<'_> {
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn local_to_world(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }
}

// ── The controller component ────────────────────────────────────────

/// Movement-ability controller attached to one actor.
///
/// Created uninitialized; `initialize` must succeed before any mutating
/// operation has an effect.
#[derive(Component, Debug, Clone)]
pub struct AdvancedMovement {
    pub settings: MovementSettings,
    pub(crate) initialized: bool,
    pub(crate) capabilities: Capabilities,
    pub(crate) modes: ModeController,
    pub(crate) abilities: AbilityState,
    pub(crate) timers: TimerSet,
    pub(crate) fuel: FuelState,
    pub(crate) speeds: SpeedProfile,
    pub(crate) slope_curve: Option<SlopeCurve>,
    pub(crate) animations: MovementAnimations,
    pub(crate) probes: Option<WallProbes>,
    pub(crate) saved: SavedLocomotion,
    pub(crate) env: EnvironmentSnapshot,
    pub(crate) anim_tag: MovementAnimTag,
    pub(crate) input: InputAxes,
    pub(crate) current_speed: f32,
    /// Solver slot `current_speed` was last applied to.
    pub(crate) speed_slot: Option<SpeedSlot>,
    pub(crate) slope: SlopeReading,
    pub(crate) velocity: Vec3,
    pub(crate) last_ground_location: Vec3,
    pub(crate) last_air_location: Vec3,
}

impl AdvancedMovement {
    pub fn new(settings: MovementSettings) -> Self {
        let mut fuel = FuelState::full(
            settings.max_fuel,
            settings.fuel_drain_rate,
            settings.fuel_refill_rate,
            settings.fuel_required,
        );
        fuel.refill_when_inactive = settings.refill_fuel_when_inactive;
        let slope_curve =
            (!settings.slope_curve.is_empty()).then(|| SlopeCurve::new(settings.slope_curve.clone()));

        Self {
            modes: ModeController::new(settings.default_mode, settings.history),
            initialized: false,
            capabilities: Capabilities::default(),
            abilities: AbilityState::default(),
            timers: TimerSet::default(),
            fuel,
            speeds: SpeedProfile::default(),
            slope_curve,
            animations: MovementAnimations::default(),
            probes: None,
            saved: SavedLocomotion::default(),
            env: EnvironmentSnapshot::default(),
            anim_tag: MovementAnimTag::None,
            input: InputAxes::default(),
            current_speed: 0.0,
            speed_slot: None,
            slope: SlopeReading::default(),
            velocity: Vec3::ZERO,
            last_ground_location: Vec3::ZERO,
            last_air_location: Vec3::ZERO,
            settings,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn mode(&self) -> MovementMode {
        self.modes.current()
    }

    pub fn previous_mode(&self) -> MovementMode {
        self.modes.previous()
    }

    pub fn abilities(&self) -> &AbilityState {
        &self.abilities
    }

    pub fn timers(&self) -> &TimerSet {
        &self.timers
    }

    pub fn fuel(&self) -> &FuelState {
        &self.fuel
    }

    pub fn speeds(&self) -> &SpeedProfile {
        &self.speeds
    }

    pub fn animations(&self) -> &MovementAnimations {
        &self.animations
    }

    pub fn environment(&self) -> &EnvironmentSnapshot {
        &self.env
    }

    pub fn anim_tag(&self) -> MovementAnimTag {
        self.anim_tag
    }

    pub fn input(&self) -> InputAxes {
        self.input
    }

    pub fn current_speed(&self) -> f32 {
        self.current_speed
    }

    pub fn slope(&self) -> SlopeReading {
        self.slope
    }

    pub fn saved_locomotion(&self) -> SavedLocomotion {
        self.saved
    }

    pub fn last_ground_location(&self) -> Vec3 {
        self.last_ground_location
    }

    pub fn last_air_location(&self) -> Vec3 {
        self.last_air_location
    }

    pub fn gate(&self) -> AbilityGate<'_> {
        AbilityGate::new(&self.abilities, &self.timers, &self.settings)
    }

    /// Ground facts for the slide gate, from the solver's report.
    pub(crate) fn ground_contact(ctx: &ActorContext) -> GroundContact {
        GroundContact {
            speed: ctx.report.velocity.length(),
            airborne: ctx.report.airborne,
            floor: ctx.report.floor,
            up: ctx.up(),
        }
    }
}
