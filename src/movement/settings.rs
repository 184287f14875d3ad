use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::controller::HistoryMode;
use super::types::{MovementMode, TimeBudget};

/// Capsule dimensions handed to the locomotion solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapsuleShape {
    pub radius: f32,
    pub half_height: f32,
    pub mesh_offset: Vec3,
}

/// Per-ability toggle configuration. `true` = press toggles, `false` = hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToggleFlags {
    pub crouch: bool,
    pub slide: bool,
    pub sprint: bool,
    pub prone: bool,
    pub dash: bool,
    pub blink: bool,
    pub roll: bool,
    pub hover: bool,
    pub zero_g: bool,
    pub jetpack: bool,
    pub auto_run: bool,
}

impl Default for ToggleFlags {
    fn default() -> Self {
        Self {
            crouch: false,
            slide: false,
            sprint: false,
            prone: true,
            dash: true,
            blink: true,
            roll: true,
            hover: false,
            zero_g: true,
            jetpack: false,
            auto_run: true,
        }
    }
}

/// Per-actor movement configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementSettings {
    pub default_mode: MovementMode,
    pub history: HistoryMode,
    pub toggles: ToggleFlags,

    // ── Speed ──
    pub manage_custom_speed: bool,
    pub adjust_speed_to_slope: bool,
    /// Sweep for the slope even when the solver reports a floor.
    pub force_custom_slope_trace: bool,
    pub slope_trace_distance: f32,
    /// (angle in degrees, scalar) keys. Empty = no slope curve.
    pub slope_curve: Vec<(f32, f32)>,

    // ── Jump ──
    pub allowed_double_jumps: u32,
    pub double_jump_velocity: Vec3,
    pub double_jump_xy_override: bool,
    pub double_jump_z_override: bool,
    pub force_custom_jump: bool,
    pub custom_jump_velocity: Vec3,

    // ── Climb / wall-run ──
    pub enable_climbing: bool,
    pub max_climb_time: TimeBudget,
    pub climb_launch_scalar: f32,
    pub wall_probe_radius: f32,

    // ── Slide / crouch / prone ──
    pub can_slide: bool,
    pub force_custom_crouch: bool,
    pub ignore_slide_angle: bool,
    pub required_slide_speed: f32,
    pub required_slide_angle: f32,
    pub max_slide_time: TimeBudget,
    pub slide_force: f32,
    pub slide_braking_friction: f32,
    pub orient_rotation_to_movement: bool,
    pub default_capsule: CapsuleShape,
    pub prone_capsule: CapsuleShape,

    // ── Bursts ──
    pub max_dash_time: TimeBudget,
    pub max_blink_time: TimeBudget,
    pub max_roll_time: TimeBudget,
    pub dash_force: f32,
    pub blink_force: f32,
    pub roll_force: f32,

    // ── Hover ──
    pub enable_hover: bool,
    pub max_hover_time: TimeBudget,

    // ── Parachute ──
    pub required_deploy_distance: f32,
    pub floor_check_distance: f32,
    pub parachute_max_acceleration: f32,
    pub parachute_socket: String,
    /// Visual spawned while the parachute is deployed. `None` = no visual.
    pub parachute_visual: Option<String>,

    // ── Jetpack ──
    pub max_fuel: f32,
    pub jetpack_force: f32,
    pub fuel_drain_rate: f32,
    pub fuel_refill_rate: f32,
    pub fuel_required: f32,
    pub refill_fuel_when_inactive: bool,

    /// Row of the animation table used by this actor.
    pub animation_row: Option<String>,
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            default_mode: MovementMode::Walk,
            history: HistoryMode::SingleLevel,
            toggles: ToggleFlags::default(),

            manage_custom_speed: true,
            adjust_speed_to_slope: true,
            force_custom_slope_trace: false,
            slope_trace_distance: 100.0,
            slope_curve: Vec::new(),

            allowed_double_jumps: 1,
            double_jump_velocity: Vec3::new(0.0, 500.0, 0.0),
            double_jump_xy_override: true,
            double_jump_z_override: true,
            force_custom_jump: false,
            custom_jump_velocity: Vec3::new(0.0, 500.0, 0.0),

            enable_climbing: true,
            max_climb_time: TimeBudget(10.0),
            climb_launch_scalar: 600.0,
            wall_probe_radius: 15.0,

            can_slide: true,
            force_custom_crouch: false,
            ignore_slide_angle: true,
            required_slide_speed: 800.0,
            required_slide_angle: 30.0,
            max_slide_time: TimeBudget(10.0),
            slide_force: 600.0,
            slide_braking_friction: 0.0,
            orient_rotation_to_movement: false,
            default_capsule: CapsuleShape {
                radius: 35.0,
                half_height: 96.0,
                mesh_offset: Vec3::new(0.0, -98.0, 0.0),
            },
            prone_capsule: CapsuleShape {
                radius: 40.0,
                half_height: 20.0,
                mesh_offset: Vec3::new(0.0, -40.0, 0.0),
            },

            max_dash_time: TimeBudget(3.0),
            max_blink_time: TimeBudget(3.0),
            max_roll_time: TimeBudget(1.0),
            dash_force: 1500.0,
            blink_force: 1500.0,
            roll_force: 500.0,

            enable_hover: true,
            max_hover_time: TimeBudget(10.0),

            required_deploy_distance: 10_000.0,
            floor_check_distance: 100_000.0,
            parachute_max_acceleration: 2500.0,
            parachute_socket: "ParachuteSocket".into(),
            parachute_visual: None,

            max_fuel: 100.0,
            jetpack_force: 10_000.0,
            fuel_drain_rate: 1.0,
            fuel_refill_rate: 0.5,
            fuel_required: 0.1,
            refill_fuel_when_inactive: true,

            animation_row: None,
        }
    }
}
