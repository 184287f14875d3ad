//! Committed operations: initialization, mode requests, and the
//! activation/termination rules for every ability.

use bevy::prelude::*;
use thiserror::Error;

use super::ability::Ability;
use super::animation::{MovementAnimations, play_animation};
use super::components::{ActorAnchors, ActorContext, AdvancedMovement, Capabilities, WallProbes};
use super::events::{Directive, MovementOutput, Notification, SpeedSlot};
use super::speed::SpeedEntry;
use super::timers::TimedAbility;
use super::types::{LocomotionMode, MovementAnimTag, MovementMode, WallSide};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    #[error("wall probe anchor '{0}' not found on actor")]
    MissingAnchor(&'static str),
    #[error("actor has no anchors")]
    NoAnchors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MovementError {
    #[error("movement controller used before initialize")]
    Unready,
    #[error("command carries a non-finite value")]
    NonFinite,
}

/// Movement input axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum InputAxis {
    Forward,
    Right,
    Up,
}

/// Outcome of a press/release on a toggle-or-momentary ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Activated,
    Deactivated,
    Unchanged,
}

impl AdvancedMovement {
    // ── Lifecycle ───────────────────────────────────────────────────

    /// Resolve wall probe anchors and load optional tables. Fails soft:
    /// on a missing anchor the actor stays uninitialized.
    pub fn initialize(
        &mut self,
        capabilities: Capabilities,
        anchors: Option<&ActorAnchors>,
        speeds: Option<&[SpeedEntry]>,
        animations: Option<MovementAnimations>,
        out: &mut MovementOutput,
    ) -> Result<(), InitError> {
        self.capabilities = capabilities;
        let anchors = anchors.ok_or(InitError::NoAnchors)?;
        let find = |side: WallSide| {
            anchors
                .get(side.anchor_name())
                .ok_or(InitError::MissingAnchor(side.anchor_name()))
        };
        self.probes = Some(WallProbes {
            front: find(WallSide::Front)?,
            left: find(WallSide::Left)?,
            right: find(WallSide::Right)?,
        });

        if let Some(rows) = speeds {
            self.apply_speeds(rows.to_vec(), self.settings.default_mode, true, out);
        }
        if let Some(set) = animations {
            self.apply_animations(set, out);
        }
        self.initialized = true;
        Ok(())
    }

    fn ensure_ready(&self) -> Result<(), MovementError> {
        if self.initialized {
            Ok(())
        } else {
            Err(MovementError::Unready)
        }
    }

    // ── Mode bookkeeping ────────────────────────────────────────────

    pub(crate) fn commit_mode(&mut self, mode: MovementMode, out: &mut MovementOutput) -> MovementMode {
        let commit = self.modes.request(mode);
        debug!("movement mode {:?} -> {:?}", commit.previous, commit.current);
        out.notify(Notification::ModeChanged {
            current: commit.current,
            previous: commit.previous,
        });
        commit.current
    }

    pub(crate) fn restore_mode(&mut self, out: &mut MovementOutput) -> MovementMode {
        let commit = self.modes.restore_previous();
        debug!("movement mode restored to {:?}", commit.current);
        out.notify(Notification::ModeChanged {
            current: commit.current,
            previous: commit.previous,
        });
        commit.current
    }

    /// Commit `mode` unconditionally. Legality is the caller's concern.
    pub fn request_mode(&mut self, mode: MovementMode, out: &mut MovementOutput) -> Result<MovementMode, MovementError> {
        self.ensure_ready()?;
        Ok(self.commit_mode(mode, out))
    }

    pub fn restore_previous(&mut self, out: &mut MovementOutput) -> Result<MovementMode, MovementError> {
        self.ensure_ready()?;
        Ok(self.restore_mode(out))
    }

    fn apply_speeds(&mut self, rows: Vec<SpeedEntry>, mode: MovementMode, force_mode: bool, out: &mut MovementOutput) {
        self.speeds.entries = rows;
        if force_mode {
            self.commit_mode(mode, out);
        }
        out.notify(Notification::SpeedsUpdated);
    }

    pub fn set_speeds(
        &mut self,
        rows: Vec<SpeedEntry>,
        mode: MovementMode,
        force_mode: bool,
        out: &mut MovementOutput,
    ) -> Result<(), MovementError> {
        self.ensure_ready()?;
        self.apply_speeds(rows, mode, force_mode, out);
        Ok(())
    }

    fn apply_animations(&mut self, set: MovementAnimations, out: &mut MovementOutput) {
        self.animations = set;
        out.notify(Notification::AnimationsUpdated);
    }

    pub fn set_animations(&mut self, set: MovementAnimations, out: &mut MovementOutput) -> Result<(), MovementError> {
        self.ensure_ready()?;
        self.apply_animations(set, out);
        Ok(())
    }

    // ── Toggle / momentary core ─────────────────────────────────────

    /// Press flips the flag when `allowed`; otherwise a release (or refused
    /// press) deactivates if the ability is momentary or `force_end` is set.
    fn press_release(&mut self, ability: Ability, pressed: bool, toggle: bool, force_end: bool, allowed: bool) -> Transition {
        let was_active = self.abilities.is_active(ability);
        if pressed && allowed {
            return if self.abilities.toggle(ability) {
                Transition::Activated
            } else {
                Transition::Deactivated
            };
        }
        if (!toggle || force_end) && was_active {
            self.abilities.set_active(ability, false);
            return Transition::Deactivated;
        }
        Transition::Unchanged
    }

    fn notify_ability(&self, ability: Ability, out: &mut MovementOutput) {
        out.notify(Notification::Ability {
            ability,
            active: self.abilities.is_active(ability),
        });
    }

    /// Shared shape of dash, blink and roll.
    fn burst(
        &mut self,
        ability: Ability,
        pressed: bool,
        direction: Vec3,
        force_end: bool,
        out: &mut MovementOutput,
    ) -> Result<(), MovementError> {
        self.ensure_ready()?;
        let (toggle, allowed, mode, timer) = match ability {
            Ability::Dash => (self.settings.toggles.dash, self.gate().can_dash(), MovementMode::Dash, TimedAbility::Dash),
            Ability::Blink => (self.settings.toggles.blink, self.gate().can_blink(), MovementMode::Blink, TimedAbility::Blink),
            _ => (self.settings.toggles.roll, self.gate().can_roll(), MovementMode::Roll, TimedAbility::Roll),
        };
        if pressed && allowed {
            match ability {
                Ability::Dash => self.abilities.dash_direction = direction,
                Ability::Blink => self.abilities.blink_direction = direction,
                _ => self.abilities.roll_direction = direction,
            }
        }
        match self.press_release(ability, pressed, toggle, force_end, allowed) {
            Transition::Activated => {
                self.commit_mode(mode, out);
            }
            Transition::Deactivated => {
                self.restore_mode(out);
                self.timers.reset(timer);
            }
            Transition::Unchanged => {}
        }
        self.notify_ability(ability, out);
        Ok(())
    }

    pub fn dash(&mut self, pressed: bool, direction: Vec3, force_end: bool, out: &mut MovementOutput) -> Result<(), MovementError> {
        self.burst(Ability::Dash, pressed, direction, force_end, out)
    }

    pub fn blink(&mut self, pressed: bool, direction: Vec3, force_end: bool, out: &mut MovementOutput) -> Result<(), MovementError> {
        self.burst(Ability::Blink, pressed, direction, force_end, out)
    }

    pub fn roll(&mut self, pressed: bool, direction: Vec3, force_end: bool, out: &mut MovementOutput) -> Result<(), MovementError> {
        self.burst(Ability::Roll, pressed, direction, force_end, out)
    }

    /// Simple mode-only abilities: sprint, zero-g, jetpack.
    fn simple_toggle(
        &mut self,
        ability: Ability,
        mode: MovementMode,
        toggle: bool,
        pressed: bool,
        out: &mut MovementOutput,
    ) -> Result<Transition, MovementError> {
        self.ensure_ready()?;
        let transition = self.press_release(ability, pressed, toggle, false, true);
        match transition {
            Transition::Activated => {
                self.commit_mode(mode, out);
            }
            Transition::Deactivated => {
                self.restore_mode(out);
            }
            Transition::Unchanged => {}
        }
        self.notify_ability(ability, out);
        Ok(transition)
    }

    pub fn sprint(&mut self, pressed: bool, out: &mut MovementOutput) -> Result<(), MovementError> {
        let toggle = self.settings.toggles.sprint;
        self.simple_toggle(Ability::Sprint, MovementMode::Sprint, toggle, pressed, out)
            .map(|_| ())
    }

    pub fn zero_g(&mut self, pressed: bool, out: &mut MovementOutput) -> Result<(), MovementError> {
        let toggle = self.settings.toggles.zero_g;
        self.simple_toggle(Ability::ZeroG, MovementMode::ZeroG, toggle, pressed, out)
            .map(|_| ())
    }

    pub fn jetpack(&mut self, pressed: bool, out: &mut MovementOutput) -> Result<(), MovementError> {
        let toggle = self.settings.toggles.jetpack;
        self.simple_toggle(Ability::Jetpack, MovementMode::Jetpack, toggle, pressed, out)
            .map(|_| ())
    }

    /// Auto-run rides on Sprint mode while enabled.
    pub fn auto_run(&mut self, pressed: bool, out: &mut MovementOutput) -> Result<(), MovementError> {
        let toggle = self.settings.toggles.auto_run;
        self.simple_toggle(Ability::AutoRun, MovementMode::Sprint, toggle, pressed, out)?;
        out.notify(Notification::AutoRunChanged {
            enabled: self.abilities.is_active(Ability::AutoRun),
        });
        Ok(())
    }

    pub fn prone(&mut self, pressed: bool, out: &mut MovementOutput) -> Result<(), MovementError> {
        self.ensure_ready()?;
        let toggle = self.settings.toggles.prone;
        let launchable = self.capabilities.launchable;
        match self.press_release(Ability::Prone, pressed, toggle, false, true) {
            Transition::Activated => {
                self.commit_mode(MovementMode::Prone, out);
                if launchable {
                    let c = self.settings.prone_capsule;
                    out.direct(Directive::SetCapsule {
                        radius: c.radius,
                        half_height: c.half_height,
                        mesh_offset: c.mesh_offset,
                    });
                    play_animation(out, &self.animations.prone);
                }
            }
            Transition::Deactivated => {
                self.restore_mode(out);
                if launchable {
                    let c = self.settings.default_capsule;
                    out.direct(Directive::SetCapsule {
                        radius: c.radius,
                        half_height: c.half_height,
                        mesh_offset: c.mesh_offset,
                    });
                }
            }
            Transition::Unchanged => {}
        }
        self.notify_ability(Ability::Prone, out);
        Ok(())
    }

    pub fn hover(&mut self, ctx: &ActorContext, pressed: bool, force_end: bool, out: &mut MovementOutput) -> Result<(), MovementError> {
        self.ensure_ready()?;
        let toggle = self.settings.toggles.hover;
        let allowed = self.gate().can_hover();
        match self.press_release(Ability::Hover, pressed, toggle, force_end, allowed) {
            Transition::Activated => {
                if self.capabilities.launchable {
                    self.saved.locomotion = ctx.report.locomotion;
                    out.direct(Directive::SetLocomotion(LocomotionMode::Flying));
                }
                self.commit_mode(MovementMode::Hover, out);
            }
            Transition::Deactivated => {
                self.timers.reset(TimedAbility::Hover);
                self.restore_mode(out);
                if self.capabilities.launchable {
                    out.direct(Directive::SetLocomotion(self.saved.locomotion));
                }
            }
            Transition::Unchanged => {}
        }
        self.notify_ability(Ability::Hover, out);
        Ok(())
    }

    // ── Crouch / slide ──────────────────────────────────────────────

    /// Crouch key. Press slides when sliding is possible, blinks forward
    /// while airborne, otherwise crouches. Only a launchable actor without
    /// `force_custom_crouch` gets the solver's crouch directives; flags,
    /// mode and restore behave the same for every actor.
    pub fn crouch(&mut self, ctx: &ActorContext, pressed: bool, out: &mut MovementOutput) -> Result<(), MovementError> {
        self.ensure_ready()?;
        let solver_crouch = self.capabilities.launchable && !self.settings.force_custom_crouch;

        if pressed {
            if self.gate().can_slide(Self::ground_contact(ctx)) {
                let toggle = self.settings.toggles.slide;
                match self.press_release(Ability::Slide, true, toggle, false, true) {
                    Transition::Activated => self.begin_slide(ctx, out),
                    Transition::Deactivated => self.end_slide(out),
                    Transition::Unchanged => {}
                }
                self.notify_ability(Ability::Slide, out);
            } else if ctx.report.airborne {
                self.blink(true, ctx.forward(), false, out)?;
            } else {
                let toggle = self.settings.toggles.crouch;
                match self.press_release(Ability::Crouch, true, toggle, false, true) {
                    Transition::Activated => {
                        self.commit_mode(MovementMode::Crouch, out);
                        if solver_crouch {
                            out.direct(Directive::Crouch);
                        }
                    }
                    Transition::Deactivated => {
                        self.restore_mode(out);
                        if solver_crouch {
                            out.direct(Directive::UnCrouch);
                        }
                    }
                    Transition::Unchanged => {}
                }
                self.notify_ability(Ability::Crouch, out);
            }
            return Ok(());
        }

        let toggle_crouch = self.settings.toggles.crouch;
        if self.press_release(Ability::Crouch, false, toggle_crouch, false, true) == Transition::Deactivated {
            self.restore_mode(out);
            if solver_crouch {
                out.direct(Directive::UnCrouch);
            }
        }
        self.notify_ability(Ability::Crouch, out);

        let toggle_slide = self.settings.toggles.slide;
        if self.press_release(Ability::Slide, false, toggle_slide, false, true) == Transition::Deactivated {
            self.end_slide(out);
        }
        self.notify_ability(Ability::Slide, out);
        Ok(())
    }

    fn begin_slide(&mut self, ctx: &ActorContext, out: &mut MovementOutput) {
        self.saved.braking_friction = ctx.report.braking_friction;
        self.commit_mode(MovementMode::Slide, out);
        play_animation(out, &self.animations.slide);
    }

    /// Write back pre-slide state. The slide flag is already cleared.
    pub(crate) fn end_slide(&mut self, out: &mut MovementOutput) {
        self.restore_mode(out);
        self.timers.reset(TimedAbility::Slide);
        if self.anim_tag == MovementAnimTag::Sliding {
            self.anim_tag = MovementAnimTag::None;
        }
        if self.capabilities.launchable {
            out.direct(Directive::SetBrakingFriction(self.saved.braking_friction));
            out.direct(Directive::SetOrientToMovement(self.settings.orient_rotation_to_movement));
            out.direct(Directive::SetLocomotion(LocomotionMode::Walking));
        }
    }

    // ── Jump ────────────────────────────────────────────────────────

    pub fn jump(&mut self, ctx: &ActorContext, pressed: bool, out: &mut MovementOutput) -> Result<(), MovementError> {
        self.ensure_ready()?;
        if !pressed {
            self.restore_mode(out);
            out.direct(Directive::StopJumping);
            return Ok(());
        }
        let double = self.gate().can_double_jump();
        if self.capabilities.launchable && !self.settings.force_custom_jump {
            self.commit_mode(MovementMode::Jump, out);
            if double {
                self.abilities.double_jumps += 1;
                out.direct(Directive::Launch {
                    velocity: self.settings.double_jump_velocity + ctx.report.velocity,
                    xy_override: self.settings.double_jump_xy_override,
                    z_override: self.settings.double_jump_z_override,
                });
                play_animation(out, &self.animations.double_jump);
            } else {
                out.direct(Directive::Jump);
                self.abilities.jumped = true;
            }
            out.notify(Notification::Jumped { custom: false, double });
            return Ok(());
        }
        if double {
            self.abilities.double_jumps += 1;
        } else {
            self.abilities.jumped = true;
        }
        self.custom_jump(true, double, out);
        Ok(())
    }

    /// Jump for actors that cannot be relaunched: offset by the custom jump velocity.
    pub(crate) fn custom_jump(&mut self, pressed: bool, double: bool, out: &mut MovementOutput) {
        if !pressed {
            return;
        }
        self.commit_mode(MovementMode::Jump, out);
        out.direct(Directive::AddOffset(self.settings.custom_jump_velocity));
        out.notify(Notification::Jumped { custom: true, double });
    }

    /// Ground contact reported by the locomotion solver.
    pub fn landed(&mut self, ctx: &ActorContext, out: &mut MovementOutput) -> Result<(), MovementError> {
        self.ensure_ready()?;
        self.abilities.land();
        self.timers.reset(TimedAbility::Climb);
        self.restore_mode(out);
        self.blink(false, Vec3::ZERO, true, out)?;
        self.hover(ctx, false, true, out)?;
        Ok(())
    }

    // ── Parachute ───────────────────────────────────────────────────

    pub fn deploy_parachute(&mut self, ctx: &ActorContext, out: &mut MovementOutput) -> Result<(), MovementError> {
        self.ensure_ready()?;
        let floor = self.find_floor(ctx);
        if !self.gate().can_deploy_parachute(floor) {
            debug!("parachute refused, floor at {:?}", floor.map(|f| f.distance));
            self.notify_ability(Ability::Parachute, out);
            return Ok(());
        }
        self.commit_mode(MovementMode::Parachute, out);
        self.abilities.set_active(Ability::Parachute, true);
        if self.capabilities.launchable {
            self.saved.max_acceleration = ctx.report.max_acceleration;
            self.saved.locomotion = ctx.report.locomotion;
            out.direct(Directive::DisableMovement);
            if self.settings.parachute_visual.is_some() {
                out.notify(Notification::ParachuteVisual {
                    attached: true,
                    socket: self.settings.parachute_socket.clone(),
                });
            }
            play_animation(out, &self.animations.parachute);
            out.direct(Directive::SetLocomotion(LocomotionMode::Falling));
            out.direct(Directive::SetMaxAcceleration(self.settings.parachute_max_acceleration));
        }
        self.notify_ability(Ability::Parachute, out);
        Ok(())
    }

    pub fn release_parachute(&mut self, out: &mut MovementOutput) -> Result<(), MovementError> {
        self.ensure_ready()?;
        if self.abilities.is_active(Ability::Parachute) {
            self.abilities.set_active(Ability::Parachute, false);
            self.restore_mode(out);
            if self.capabilities.launchable {
                out.direct(Directive::SetLocomotion(self.saved.locomotion));
                if self.settings.parachute_visual.is_some() {
                    out.notify(Notification::ParachuteVisual {
                        attached: false,
                        socket: self.settings.parachute_socket.clone(),
                    });
                }
                out.direct(Directive::SetMaxAcceleration(self.saved.max_acceleration));
            }
        }
        self.notify_ability(Ability::Parachute, out);
        Ok(())
    }

    // ── Inputs and misc ─────────────────────────────────────────────

    /// Store an axis and forward it as movement input. Ignored while a
    /// locomotion override runs.
    pub fn set_axis(&mut self, ctx: &ActorContext, axis: InputAxis, value: f32, out: &mut MovementOutput) -> Result<(), MovementError> {
        self.ensure_ready()?;
        if !self.gate().can_move() {
            return Ok(());
        }
        let direction = match axis {
            InputAxis::Forward => {
                self.input.forward = value;
                ctx.forward()
            }
            InputAxis::Right => {
                self.input.right = value;
                ctx.right()
            }
            InputAxis::Up => {
                self.input.up = value;
                ctx.up()
            }
        };
        if self.capabilities.input_driven {
            out.direct(Directive::AddInput { direction, scale: value });
        } else {
            out.direct(Directive::AddOffset(self.input_direction(ctx)));
        }
        Ok(())
    }

    /// Input axes rotated into world space.
    pub(crate) fn input_direction(&self, ctx: &ActorContext) -> Vec3 {
        ctx.forward() * self.input.forward + ctx.right() * self.input.right + ctx.up() * self.input.up
    }

    pub fn set_jetpack_fuel(&mut self, value: f32, out: &mut MovementOutput) -> Result<(), MovementError> {
        self.ensure_ready()?;
        if !value.is_finite() {
            return Err(MovementError::NonFinite);
        }
        self.fuel.set_level(value);
        out.notify(Notification::FuelChanged {
            level: self.fuel.level(),
        });
        Ok(())
    }

    pub fn move_to_last_ground_location(&self, out: &mut MovementOutput) -> Result<(), MovementError> {
        self.ensure_ready()?;
        out.direct(Directive::SetPosition(self.last_ground_location));
        Ok(())
    }

    pub fn move_to_last_air_location(&self, out: &mut MovementOutput) -> Result<(), MovementError> {
        self.ensure_ready()?;
        out.direct(Directive::SetPosition(self.last_air_location));
        Ok(())
    }

    /// Apply the resolved speed to the solver's slot for the current mode.
    pub(crate) fn apply_speed(&mut self, speed: f32, out: &mut MovementOutput) {
        let slot = SpeedSlot::for_mode(self.modes.current());
        if speed == self.current_speed && self.speed_slot == Some(slot) {
            return;
        }
        self.current_speed = speed;
        self.speed_slot = Some(slot);
        if self.capabilities.launchable {
            out.direct(Directive::SetMaxSpeed { slot, speed });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::settings::{MovementSettings, ToggleFlags};
    use crate::movement::testing::{Rig, wall_anchors};
    use crate::movement::types::Seconds;

    fn toggles(dash: bool) -> MovementSettings {
        MovementSettings {
            toggles: ToggleFlags { dash, ..default() },
            ..default()
        }
    }

    #[test]
    fn uninitialized_actor_rejects_mutation() {
        let mut movement = AdvancedMovement::new(MovementSettings::default());
        let mut out = MovementOutput::default();
        assert_eq!(movement.dash(true, Vec3::X, false, &mut out), Err(MovementError::Unready));
        assert_eq!(movement.request_mode(MovementMode::Fly, &mut out), Err(MovementError::Unready));
        assert!(!movement.abilities().is_active(Ability::Dash));
        assert_eq!(movement.mode(), MovementMode::Walk);
        assert!(out.is_empty());
    }

    #[test]
    fn initialize_fails_soft_without_anchor() {
        let mut movement = AdvancedMovement::new(MovementSettings::default());
        let mut anchors = wall_anchors();
        anchors.0.remove("LeftWallCheck");
        let mut out = MovementOutput::default();
        let err = movement
            .initialize(Capabilities::CHARACTER, Some(&anchors), None, None, &mut out)
            .unwrap_err();
        assert_eq!(err, InitError::MissingAnchor("LeftWallCheck"));
        assert!(!movement.is_initialized());
    }

    #[test]
    fn initialize_with_speed_table_forces_default_mode() {
        let mut movement = AdvancedMovement::new(MovementSettings::default());
        let rows = vec![SpeedEntry::new("walk", MovementMode::Walk, 600.0)];
        let mut out = MovementOutput::default();
        movement
            .initialize(Capabilities::CHARACTER, Some(&wall_anchors()), Some(rows.as_slice()), None, &mut out)
            .expect("anchors present");
        assert!(movement.is_initialized());
        assert_eq!(movement.speeds().speed_for(MovementMode::Walk), Some(600.0));
        assert!(out.notifications.contains(&Notification::SpeedsUpdated));
    }

    #[test]
    fn momentary_dash_press_then_release() {
        let rig = Rig::grounded();
        let mut movement = rig.initialized(toggles(false));
        let mut out = MovementOutput::default();
        let before = movement.mode();

        movement.dash(true, Vec3::X, false, &mut out).unwrap();
        assert!(movement.abilities().is_active(Ability::Dash));
        assert_eq!(movement.mode(), MovementMode::Dash);
        assert_eq!(movement.abilities().dash_direction, Vec3::X);

        movement.timers.dash = Seconds(0.4);
        movement.dash(false, Vec3::ZERO, false, &mut out).unwrap();
        assert!(!movement.abilities().is_active(Ability::Dash));
        assert_eq!(movement.mode(), before);
        assert!(movement.timers().dash.is_zero());
    }

    #[test]
    fn toggle_dash_survives_release() {
        let rig = Rig::grounded();
        let mut movement = rig.initialized(toggles(true));
        let mut out = MovementOutput::default();
        movement.dash(true, Vec3::X, false, &mut out).unwrap();
        movement.dash(false, Vec3::ZERO, false, &mut out).unwrap();
        assert!(movement.abilities().is_active(Ability::Dash));
        assert_eq!(movement.mode(), MovementMode::Dash);

        movement.dash(true, Vec3::X, false, &mut out).unwrap();
        assert!(!movement.abilities().is_active(Ability::Dash));
    }

    #[test]
    fn deactivation_notification_fires_when_already_inactive() {
        let rig = Rig::grounded();
        let mut movement = rig.initialized(toggles(false));
        let mut out = MovementOutput::default();
        movement.roll(false, Vec3::ZERO, true, &mut out).unwrap();
        movement.roll(false, Vec3::ZERO, true, &mut out).unwrap();
        let fired = out
            .notifications
            .iter()
            .filter(|n| **n == Notification::Ability { ability: Ability::Roll, active: false })
            .count();
        assert_eq!(fired, 2);
        assert_eq!(movement.mode(), MovementMode::Walk);
    }

    #[test]
    fn bursts_are_mutually_exclusive() {
        let rig = Rig::grounded();
        let mut movement = rig.initialized(MovementSettings::default());
        let mut out = MovementOutput::default();
        movement.dash(true, Vec3::X, false, &mut out).unwrap();
        movement.roll(true, Vec3::Z, false, &mut out).unwrap();
        assert!(!movement.abilities().is_active(Ability::Roll));
        assert_eq!(movement.mode(), MovementMode::Dash);
    }

    #[test]
    fn restore_after_nested_activations_returns_one_level() {
        let rig = Rig::grounded();
        let mut movement = rig.initialized(toggles(false));
        let mut out = MovementOutput::default();
        movement.sprint(true, &mut out).unwrap();
        movement.dash(true, Vec3::X, false, &mut out).unwrap();
        movement.dash(false, Vec3::ZERO, false, &mut out).unwrap();
        assert_eq!(movement.mode(), MovementMode::Sprint);
    }

    #[test]
    fn double_jump_sequence() {
        let rig = Rig::airborne();
        let mut movement = rig.initialized(MovementSettings {
            allowed_double_jumps: 1,
            ..default()
        });
        let mut out = MovementOutput::default();

        movement.jump(&rig.ctx(), true, &mut out).unwrap();
        assert!(movement.abilities().jumped);
        assert_eq!(movement.abilities().double_jumps, 0);
        assert!(out.directives.contains(&Directive::Jump));

        assert!(movement.gate().can_double_jump());
        movement.jump(&rig.ctx(), true, &mut out).unwrap();
        assert_eq!(movement.abilities().double_jumps, 1);
        assert!(out.notifications.contains(&Notification::Jumped { custom: false, double: true }));

        assert!(!movement.gate().can_double_jump());
        movement.jump(&rig.ctx(), true, &mut out).unwrap();
        assert_eq!(movement.abilities().double_jumps, 1);
    }

    #[test]
    fn landing_resets_jump_climb_hover_and_blink() {
        let rig = Rig::airborne();
        let mut movement = rig.initialized(MovementSettings::default());
        let mut out = MovementOutput::default();
        movement.jump(&rig.ctx(), true, &mut out).unwrap();
        movement.jump(&rig.ctx(), true, &mut out).unwrap();
        movement.timers.climb = Seconds(2.0);
        movement.hover(&rig.ctx(), true, false, &mut out).unwrap();
        movement.timers.hover = Seconds(1.0);
        movement.abilities.set_active(Ability::Blink, true);

        movement.landed(&rig.ctx(), &mut out).unwrap();

        let abilities = movement.abilities();
        assert!(!abilities.jumped);
        assert_eq!(abilities.double_jumps, 0);
        assert!(movement.timers().climb.is_zero());
        assert!(!abilities.is_active(Ability::Hover));
        assert!(!abilities.is_active(Ability::Blink));
        assert!(movement.timers().hover.is_zero());
        assert!(movement.timers().blink.is_zero());
    }

    #[test]
    fn slide_saves_and_restores_braking_friction() {
        let mut rig = Rig::grounded();
        rig.report.velocity = Vec3::new(0.0, 0.0, -900.0);
        rig.report.braking_friction = 2.5;
        let mut movement = rig.initialized(MovementSettings::default());
        let mut out = MovementOutput::default();

        movement.crouch(&rig.ctx(), true, &mut out).unwrap();
        assert!(movement.abilities().is_active(Ability::Slide));
        assert_eq!(movement.mode(), MovementMode::Slide);
        assert_eq!(movement.saved_locomotion().braking_friction, 2.5);

        out.clear();
        movement.crouch(&rig.ctx(), false, &mut out).unwrap();
        assert!(!movement.abilities().is_active(Ability::Slide));
        assert_eq!(movement.mode(), MovementMode::Walk);
        assert!(out.directives.contains(&Directive::SetBrakingFriction(2.5)));
    }

    #[test]
    fn slow_crouch_press_crouches() {
        let rig = Rig::grounded();
        let mut movement = rig.initialized(MovementSettings::default());
        let mut out = MovementOutput::default();
        movement.crouch(&rig.ctx(), true, &mut out).unwrap();
        assert!(movement.abilities().is_active(Ability::Crouch));
        assert_eq!(movement.mode(), MovementMode::Crouch);
        assert!(out.directives.contains(&Directive::Crouch));

        movement.crouch(&rig.ctx(), false, &mut out).unwrap();
        assert!(!movement.abilities().is_active(Ability::Crouch));
        assert!(out.directives.contains(&Directive::UnCrouch));
    }

    #[test]
    fn pawn_crouch_and_slide_are_momentary() {
        let mut rig = Rig::grounded();
        let mut movement = rig.initialized_as(MovementSettings::default(), Capabilities::PAWN);
        let mut out = MovementOutput::default();

        movement.crouch(&rig.ctx(), true, &mut out).unwrap();
        assert!(movement.abilities().is_active(Ability::Crouch));
        assert_eq!(movement.mode(), MovementMode::Crouch);
        movement.crouch(&rig.ctx(), false, &mut out).unwrap();
        assert!(!movement.abilities().is_active(Ability::Crouch));
        assert_eq!(movement.mode(), MovementMode::Walk);
        assert!(!out.directives.contains(&Directive::Crouch));
        assert!(!out.directives.contains(&Directive::UnCrouch));

        rig.report.velocity = Vec3::new(0.0, 0.0, -900.0);
        movement.crouch(&rig.ctx(), true, &mut out).unwrap();
        assert!(movement.abilities().is_active(Ability::Slide));
        assert_eq!(movement.mode(), MovementMode::Slide);
        movement.crouch(&rig.ctx(), false, &mut out).unwrap();
        assert!(!movement.abilities().is_active(Ability::Slide));
        assert_eq!(movement.mode(), MovementMode::Walk);
    }

    #[test]
    fn airborne_crouch_blinks_forward() {
        let rig = Rig::airborne();
        let mut movement = rig.initialized(MovementSettings::default());
        let mut out = MovementOutput::default();
        movement.crouch(&rig.ctx(), true, &mut out).unwrap();
        assert!(movement.abilities().is_active(Ability::Blink));
        assert_eq!(movement.abilities().blink_direction, Vec3::NEG_Z);
    }

    #[test]
    fn hover_saves_locomotion_mode() {
        let rig = Rig::airborne();
        let mut movement = rig.initialized(MovementSettings::default());
        let mut out = MovementOutput::default();
        movement.hover(&rig.ctx(), true, false, &mut out).unwrap();
        assert_eq!(movement.mode(), MovementMode::Hover);
        assert!(out.directives.contains(&Directive::SetLocomotion(LocomotionMode::Flying)));

        out.clear();
        // Momentary by default: release ends it.
        movement.hover(&rig.ctx(), false, false, &mut out).unwrap();
        assert!(!movement.abilities().is_active(Ability::Hover));
        assert!(out.directives.contains(&Directive::SetLocomotion(LocomotionMode::Falling)));
    }

    #[test]
    fn parachute_deploy_and_release_restore_acceleration() {
        let mut rig = Rig::airborne();
        rig.report.max_acceleration = 1800.0;
        let mut movement = rig.initialized(MovementSettings {
            parachute_visual: Some("chute".into()),
            ..default()
        });
        let mut out = MovementOutput::default();

        movement.deploy_parachute(&rig.ctx(), &mut out).unwrap();
        assert_eq!(movement.mode(), MovementMode::Parachute);
        assert!(movement.abilities().is_active(Ability::Parachute));
        assert!(out.directives.contains(&Directive::SetMaxAcceleration(2500.0)));
        assert!(out.notifications.iter().any(|n| matches!(n, Notification::ParachuteVisual { attached: true, .. })));

        out.clear();
        movement.release_parachute(&mut out).unwrap();
        assert!(!movement.abilities().is_active(Ability::Parachute));
        assert!(out.directives.contains(&Directive::SetMaxAcceleration(1800.0)));
        assert!(out.directives.contains(&Directive::SetLocomotion(LocomotionMode::Falling)));
    }

    #[test]
    fn parachute_refused_near_floor() {
        let mut rig = Rig::airborne();
        rig.report.floor = Some(crate::movement::probe::FloorHit {
            normal: Vec3::Y,
            distance: 200.0,
        });
        let mut movement = rig.initialized(MovementSettings::default());
        let mut out = MovementOutput::default();
        movement.deploy_parachute(&rig.ctx(), &mut out).unwrap();
        assert!(!movement.abilities().is_active(Ability::Parachute));
        assert_ne!(movement.mode(), MovementMode::Parachute);
    }

    #[test]
    fn axes_ignored_while_overriding() {
        let rig = Rig::grounded();
        let mut movement = rig.initialized(MovementSettings::default());
        let mut out = MovementOutput::default();
        movement.set_axis(&rig.ctx(), InputAxis::Forward, 1.0, &mut out).unwrap();
        assert_eq!(movement.input().forward, 1.0);
        assert!(out.directives.contains(&Directive::AddInput {
            direction: Vec3::NEG_Z,
            scale: 1.0
        }));

        movement.dash(true, Vec3::X, false, &mut out).unwrap();
        out.clear();
        movement.set_axis(&rig.ctx(), InputAxis::Right, 1.0, &mut out).unwrap();
        assert_eq!(movement.input().right, 0.0);
        assert!(out.directives.is_empty());
    }

    #[test]
    fn prone_swaps_capsule() {
        let rig = Rig::grounded();
        let mut movement = rig.initialized(MovementSettings::default());
        let mut out = MovementOutput::default();
        movement.prone(true, &mut out).unwrap();
        assert_eq!(movement.mode(), MovementMode::Prone);
        movement.prone(false, &mut out).unwrap();
        // Toggle by default: release keeps prone.
        assert!(movement.abilities().is_active(Ability::Prone));
        movement.prone(true, &mut out).unwrap();
        assert!(!movement.abilities().is_active(Ability::Prone));
        assert!(out.directives.contains(&Directive::SetCapsule {
            radius: 35.0,
            half_height: 96.0,
            mesh_offset: Vec3::new(0.0, -98.0, 0.0),
        }));
    }

    #[test]
    fn auto_run_enters_sprint() {
        let rig = Rig::grounded();
        let mut movement = rig.initialized(MovementSettings::default());
        let mut out = MovementOutput::default();
        movement.auto_run(true, &mut out).unwrap();
        assert_eq!(movement.mode(), MovementMode::Sprint);
        assert!(out.notifications.contains(&Notification::AutoRunChanged { enabled: true }));
        movement.auto_run(true, &mut out).unwrap();
        assert_eq!(movement.mode(), MovementMode::Walk);
    }

    #[test]
    fn fuel_setter_clamps() {
        let rig = Rig::grounded();
        let mut movement = rig.initialized(MovementSettings::default());
        let mut out = MovementOutput::default();
        movement.set_jetpack_fuel(250.0, &mut out).unwrap();
        assert_eq!(movement.fuel().level(), 100.0);
        movement.set_jetpack_fuel(-3.0, &mut out).unwrap();
        assert_eq!(movement.fuel().level(), 0.0);
    }
}
