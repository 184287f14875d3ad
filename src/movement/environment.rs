//! Probe consumers: slope reading, floor lookup and the wall climb check.

use bevy::prelude::*;

use super::components::{ActorContext, AdvancedMovement, WallResult};
use super::events::{Directive, MovementOutput, Notification};
use super::probe::{FloorHit, slope_from_normal};
use super::timers::TimedAbility;
use super::types::{MovementAnimTag, MovementMode, SlopeDegrees, WallSide};

impl AdvancedMovement {
    /// Stage 1: slope angle and speed scalar. Skipped without a curve.
    pub(crate) fn read_slope(&mut self, ctx: &ActorContext) {
        if !self.settings.adjust_speed_to_slope {
            return;
        }
        let Some(curve) = &self.slope_curve else {
            return;
        };
        let up = ctx.up();
        let angle = if self.capabilities.launchable && !self.settings.force_custom_slope_trace {
            ctx.report
                .floor
                .map(|f| slope_from_normal(f.normal, up))
                .unwrap_or_default()
        } else {
            // No hit: assume an even plane.
            ctx.probe
                .sweep_floor(ctx.position, -up, self.settings.slope_trace_distance)
                .map(|f| slope_from_normal(f.normal, up))
                .unwrap_or(SlopeDegrees(0.0))
        };
        self.slope.angle = angle;
        self.slope.scalar = curve.sample(angle);
        self.env.slope = angle;
    }

    /// Floor under the actor: the solver's floor for launchable actors,
    /// otherwise a sweep down to the floor check distance.
    pub fn find_floor(&self, ctx: &ActorContext) -> Option<FloorHit> {
        if self.capabilities.launchable {
            return ctx.report.floor;
        }
        ctx.probe
            .sweep_floor(ctx.position, -ctx.up(), self.settings.floor_check_distance)
    }

    /// Launch velocity hint for a wall side.
    pub(crate) fn climb_launch_velocity(&self, ctx: &ActorContext, side: WallSide) -> Vec3 {
        let scalar = self.settings.climb_launch_scalar;
        let Some(probes) = &self.probes else {
            return Vec3::ZERO;
        };
        match side {
            WallSide::Front => ctx.up() * scalar,
            WallSide::Left => (ctx.rotation * probes.left.forward).normalize_or_zero() * scalar,
            WallSide::Right => (ctx.rotation * probes.right.forward).normalize_or_zero() * scalar,
        }
    }

    /// Sweep toward one wall probe anchor and climb on a hit when the climb
    /// budget allows. Returns whether a wall was found, regardless of budget.
    pub fn climb_check(
        &mut self,
        ctx: &ActorContext,
        side: WallSide,
        dt: f32,
        launch_velocity: Vec3,
        out: &mut MovementOutput,
    ) -> bool {
        let Some(probes) = self.probes else {
            return false;
        };
        if !self.abilities.jumped {
            return false;
        }
        let anchor = match side {
            WallSide::Front => probes.front,
            WallSide::Left => probes.left,
            WallSide::Right => probes.right,
        };
        let target = ctx.local_to_world(anchor.offset);
        let hit = ctx
            .probe
            .sweep_obstruction(ctx.position, target, self.settings.wall_probe_radius);

        let result = WallResult {
            hit,
            launch_velocity,
        };
        match side {
            WallSide::Front => self.env.front = result,
            WallSide::Left => self.env.left = result,
            WallSide::Right => self.env.right = result,
        }

        if hit && self.settings.max_climb_time.allows(self.timers.climb) {
            self.do_climb(side, launch_velocity, dt, out);
        }
        hit
    }

    fn do_climb(&mut self, side: WallSide, launch_velocity: Vec3, dt: f32, out: &mut MovementOutput) {
        if self.capabilities.launchable {
            out.direct(Directive::Launch {
                velocity: launch_velocity,
                xy_override: true,
                z_override: true,
            });
        } else {
            self.custom_jump(true, true, out);
        }
        self.commit_mode(MovementMode::Climb, out);
        self.anim_tag = side.anim_tag();
        self.timers.advance(TimedAbility::Climb, dt);
        out.notify(Notification::Climbed { side });
    }

    /// Stage 4: front, left, right; first hit wins. Clears the climb tag
    /// only when all three miss.
    pub(crate) fn continue_climb(&mut self, ctx: &ActorContext, dt: f32, out: &mut MovementOutput) {
        if !self.settings.enable_climbing || !self.abilities.jumped || !ctx.report.airborne {
            return;
        }
        for side in WallSide::ALL {
            let launch = self.climb_launch_velocity(ctx, side);
            if self.climb_check(ctx, side, dt, launch, out) {
                return;
            }
        }
        if self.anim_tag.is_climb() {
            self.anim_tag = MovementAnimTag::None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::probe::Plane;
    use crate::movement::settings::MovementSettings;
    use crate::movement::testing::Rig;
    use crate::movement::types::{Seconds, TimeBudget};

    fn wall_ahead() -> Rig {
        // Actor faces -Z; wall 20 units in front, high above the floor.
        let mut rig = Rig::airborne();
        rig.world = rig
            .world
            .clone()
            .with_wall(Plane::new(Vec3::new(0.0, 0.0, -20.0), Vec3::Z));
        rig
    }

    #[test]
    fn front_wall_commits_climb_and_launches_up() {
        let rig = wall_ahead();
        let mut movement = rig.initialized(MovementSettings::default());
        movement.abilities.jumped = true;
        let mut out = MovementOutput::default();

        movement.continue_climb(&rig.ctx(), 0.1, &mut out);

        assert_eq!(movement.mode(), MovementMode::Climb);
        assert_eq!(movement.anim_tag(), MovementAnimTag::ClimbFront);
        assert_eq!(movement.timers().climb, Seconds(0.1));
        assert!(out.directives.contains(&Directive::Launch {
            velocity: Vec3::Y * 600.0,
            xy_override: true,
            z_override: true,
        }));
        assert!(out.notifications.contains(&Notification::Climbed { side: WallSide::Front }));
    }

    #[test]
    fn exhausted_budget_still_reports_wall() {
        let rig = wall_ahead();
        let mut movement = rig.initialized(MovementSettings {
            max_climb_time: TimeBudget(1.0),
            ..default()
        });
        movement.abilities.jumped = true;
        movement.timers.climb = Seconds(1.0);
        let before = movement.mode();
        let mut out = MovementOutput::default();

        let launch = movement.climb_launch_velocity(&rig.ctx(), WallSide::Front);
        assert!(movement.climb_check(&rig.ctx(), WallSide::Front, 0.1, launch, &mut out));
        assert_eq!(movement.mode(), before);
        assert!(out.is_empty());
    }

    #[test]
    fn all_sides_missing_clears_climb_tag_only() {
        let rig = Rig::airborne();
        let mut movement = rig.initialized(MovementSettings::default());
        movement.abilities.jumped = true;
        movement.anim_tag = MovementAnimTag::ClimbLeft;
        let mut out = MovementOutput::default();
        movement.continue_climb(&rig.ctx(), 0.1, &mut out);
        assert_eq!(movement.anim_tag(), MovementAnimTag::None);

        movement.anim_tag = MovementAnimTag::Sliding;
        movement.continue_climb(&rig.ctx(), 0.1, &mut out);
        assert_eq!(movement.anim_tag(), MovementAnimTag::Sliding);
    }

    #[test]
    fn climb_requires_jump_and_air() {
        let rig = wall_ahead();
        let mut movement = rig.initialized(MovementSettings::default());
        let mut out = MovementOutput::default();
        movement.continue_climb(&rig.ctx(), 0.1, &mut out);
        assert_ne!(movement.mode(), MovementMode::Climb);

        let mut grounded = wall_ahead();
        grounded.report.airborne = false;
        movement.abilities.jumped = true;
        movement.continue_climb(&grounded.ctx(), 0.1, &mut out);
        assert_ne!(movement.mode(), MovementMode::Climb);
    }

    #[test]
    fn non_launchable_climb_uses_custom_jump() {
        let rig = wall_ahead();
        let mut movement = rig.initialized_as(MovementSettings::default(), crate::movement::components::Capabilities::PAWN);
        movement.abilities.jumped = true;
        let mut out = MovementOutput::default();
        movement.continue_climb(&rig.ctx(), 0.1, &mut out);
        assert!(out.directives.contains(&Directive::AddOffset(Vec3::new(0.0, 500.0, 0.0))));
        assert_eq!(movement.mode(), MovementMode::Climb);
    }

    #[test]
    fn slope_reading_uses_curve_and_floor() {
        let mut rig = Rig::grounded();
        rig.report.floor = Some(FloorHit {
            normal: Vec3::new(1.0, 1.0, 0.0).normalize(),
            distance: 0.0,
        });
        let mut movement = rig.initialized(MovementSettings {
            slope_curve: vec![(0.0, 1.0), (90.0, 0.0)],
            ..default()
        });
        movement.read_slope(&rig.ctx());
        assert!((movement.slope().angle.0 - 45.0).abs() < 1e-3);
        assert!((movement.slope().scalar - 0.5).abs() < 1e-3);
    }

    #[test]
    fn slope_without_curve_is_skipped() {
        let mut rig = Rig::grounded();
        rig.report.floor = Some(FloorHit {
            normal: Vec3::new(1.0, 1.0, 0.0).normalize(),
            distance: 0.0,
        });
        let mut movement = rig.initialized(MovementSettings::default());
        movement.read_slope(&rig.ctx());
        assert_eq!(movement.slope().scalar, 1.0);
        assert_eq!(movement.slope().angle, SlopeDegrees(0.0));
    }
}
