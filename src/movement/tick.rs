//! Per-step continuation. Stage order is fixed: later stages read state
//! that earlier ones wrote.

use bevy::prelude::*;

use super::ability::Ability;
use super::actions::MovementError;
use super::components::{ActorContext, AdvancedMovement};
use super::events::{Directive, MovementOutput, Notification};
use super::fuel::FuelStep;
use super::speed::SpeedResolver;
use super::timers::TimedAbility;
use super::types::{LocomotionMode, MovementAnimTag};

impl AdvancedMovement {
    /// Advance one fixed step of `dt` seconds.
    pub fn tick(&mut self, ctx: &ActorContext, dt: f32, out: &mut MovementOutput) -> Result<(), MovementError> {
        if !self.initialized {
            return Err(MovementError::Unready);
        }
        self.velocity = ctx.report.velocity;
        self.env.floor = ctx.report.floor;

        self.read_slope(ctx);
        self.resolve_speed(out);
        self.inject_auto_run(ctx, out);
        self.continue_climb(ctx, dt, out);
        if ctx.role.is_authoritative() {
            self.continue_slide(ctx, dt, out);
        }
        self.continue_dash(dt, out)?;
        self.continue_blink(dt, out)?;
        self.continue_roll(dt, out)?;
        self.continue_hover(ctx, dt, out)?;
        self.integrate_zero_g(ctx, dt, out);
        self.run_jetpack(out);
        self.record_location(ctx);
        Ok(())
    }

    /// Stage 2.
    fn resolve_speed(&mut self, out: &mut MovementOutput) {
        if !self.settings.manage_custom_speed || self.speeds.is_empty() {
            return;
        }
        let resolved = SpeedResolver::new(&self.speeds).resolve(self.modes.current(), self.slope.scalar);
        if let Some(speed) = resolved {
            self.apply_speed(speed, out);
        }
    }

    /// Stage 3. Needs the owner capability.
    fn inject_auto_run(&self, ctx: &ActorContext, out: &mut MovementOutput) {
        if !self.abilities.is_active(Ability::AutoRun) {
            return;
        }
        let Some(owner) = ctx.owner else {
            return;
        };
        if self.capabilities.input_driven {
            out.direct(Directive::AddInput {
                direction: owner.movement_direction(),
                scale: 1.0,
            });
        } else {
            out.direct(Directive::AddOffset(ctx.forward() * owner.speed()));
        }
    }

    /// Stage 5, authority only.
    fn continue_slide(&mut self, ctx: &ActorContext, dt: f32, out: &mut MovementOutput) {
        if !self.settings.can_slide {
            if self.anim_tag == MovementAnimTag::Sliding {
                self.anim_tag = MovementAnimTag::None;
            }
            self.timers.reset(TimedAbility::Slide);
            return;
        }
        if !self.abilities.is_active(Ability::Slide) {
            return;
        }
        if !self.gate().can_slide(Self::ground_contact(ctx)) {
            self.abilities.set_active(Ability::Slide, false);
            self.end_slide(out);
            out.notify(Notification::Ability {
                ability: Ability::Slide,
                active: false,
            });
            return;
        }

        self.timers.advance(TimedAbility::Slide, dt);
        self.anim_tag = MovementAnimTag::Sliding;
        let push = ctx.forward().normalize_or_zero() * self.settings.slide_force;
        if self.capabilities.launchable {
            out.direct(Directive::SetOrientToMovement(false));
            out.direct(Directive::SetLocomotion(LocomotionMode::Falling));
            out.direct(Directive::SetBrakingFriction(self.settings.slide_braking_friction));
            out.direct(Directive::AddForce(push));
        } else {
            out.direct(Directive::AddOffset(push));
        }
    }

    /// Stage 6.
    fn continue_dash(&mut self, dt: f32, out: &mut MovementOutput) -> Result<(), MovementError> {
        let active = self.abilities.is_active(Ability::Dash);
        if active && self.gate().can_dash() {
            let direction = self.abilities.dash_direction;
            self.burst_effect(direction, self.settings.dash_force, true, out);
            self.timers.advance(TimedAbility::Dash, dt);
            return Ok(());
        }
        self.timers.reset(TimedAbility::Dash);
        if active {
            debug!("dash budget spent after {:.2}s", self.settings.max_dash_time.0);
            self.dash(false, Vec3::ZERO, true, out)?;
        }
        Ok(())
    }

    /// Stage 7.
    fn continue_blink(&mut self, dt: f32, out: &mut MovementOutput) -> Result<(), MovementError> {
        let active = self.abilities.is_active(Ability::Blink);
        if active && self.gate().can_blink() {
            let direction = self.abilities.blink_direction;
            self.burst_effect(direction, self.settings.blink_force, true, out);
            self.timers.advance(TimedAbility::Blink, dt);
            return Ok(());
        }
        self.timers.reset(TimedAbility::Blink);
        if active {
            self.blink(false, Vec3::ZERO, true, out)?;
        }
        Ok(())
    }

    /// Stage 8. Rolls steer through movement input rather than a relaunch.
    fn continue_roll(&mut self, dt: f32, out: &mut MovementOutput) -> Result<(), MovementError> {
        let active = self.abilities.is_active(Ability::Roll);
        if active && self.gate().can_roll() {
            let direction = self.abilities.roll_direction;
            self.burst_effect(direction, self.settings.roll_force, false, out);
            self.timers.advance(TimedAbility::Roll, dt);
            return Ok(());
        }
        self.timers.reset(TimedAbility::Roll);
        if active {
            self.roll(false, Vec3::ZERO, true, out)?;
        }
        Ok(())
    }

    fn burst_effect(&self, direction: Vec3, force: f32, relaunch: bool, out: &mut MovementOutput) {
        if !self.capabilities.launchable {
            out.direct(Directive::AddOffset(direction * self.current_speed));
        } else if relaunch {
            out.direct(Directive::Launch {
                velocity: direction * force,
                xy_override: true,
                z_override: true,
            });
        } else {
            out.direct(Directive::AddInput {
                direction: direction * force,
                scale: 1.0,
            });
        }
    }

    /// Stage 9.
    fn continue_hover(&mut self, ctx: &ActorContext, dt: f32, out: &mut MovementOutput) -> Result<(), MovementError> {
        let active = self.abilities.is_active(Ability::Hover);
        if active && self.gate().can_hover() {
            self.timers.advance(TimedAbility::Hover, dt);
        } else if active {
            self.hover(ctx, false, true, out)?;
        }
        Ok(())
    }

    /// Stage 10: integrate the input axes straight into the position.
    fn integrate_zero_g(&self, ctx: &ActorContext, dt: f32, out: &mut MovementOutput) {
        if !self.abilities.is_active(Ability::ZeroG) {
            return;
        }
        let local = Vec3::new(self.input.right, self.input.up, -self.input.forward).clamp_length_max(1.0);
        let world = ctx.rotation * local;
        out.direct(Directive::SetPosition(ctx.position + world * self.current_speed * dt));
    }

    /// Stage 11.
    fn run_jetpack(&mut self, out: &mut MovementOutput) {
        let active = self.abilities.is_active(Ability::Jetpack);
        match self.fuel.step(active) {
            FuelStep::Thrust { drained } => {
                let thrust = Vec3::Y * self.settings.jetpack_force + self.velocity;
                let directive = if self.capabilities.launchable {
                    Directive::SetVelocity(thrust)
                } else if self.capabilities.simulates_physics {
                    Directive::AddForce(thrust)
                } else {
                    Directive::AddOffset(thrust)
                };
                out.direct(directive);
                if drained {
                    out.notify(Notification::FuelChanged {
                        level: self.fuel.level(),
                    });
                }
            }
            FuelStep::Refilled => out.notify(Notification::FuelChanged {
                level: self.fuel.level(),
            }),
            FuelStep::Idle => {}
        }
    }

    /// Stage 12. Needs the owner capability.
    fn record_location(&mut self, ctx: &ActorContext) {
        let Some(owner) = ctx.owner else {
            return;
        };
        if owner.is_falling() {
            self.last_air_location = ctx.position;
        } else {
            self.last_ground_location = ctx.position;
        }
    }
}
