use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;

use advanced_movement::config::tuning::MovementTuning;
use advanced_movement::movement::{
    actions::InputAxis,
    authority::{MovementCommand, MovementRequest, RequestRejected},
    components::{ActorAnchors, Anchor, Capabilities},
    events::MovementEvent,
    kinematic::KinematicBody,
    probe::{Plane, PlaneWorld, SpatialProbe},
    types::WallSide,
};
use advanced_movement::plugins::{
    locomotion_plugin::KinematicLocomotionPlugin,
    movement_plugin::{MovementPlugin, MovementSet, movement_actor},
};

/// Scripted input, keyed by fixed step.
const SCRIPT: &[(u32, MovementCommand)] = &[
    (10, MovementCommand::Axis { axis: InputAxis::Forward, value: 1.0 }),
    (30, MovementCommand::Sprint { pressed: true }),
    (60, MovementCommand::Jump { pressed: true }),
    (70, MovementCommand::Jump { pressed: true }),
    (140, MovementCommand::Sprint { pressed: false }),
    (150, MovementCommand::Dash { pressed: true, direction: Vec3::X, force_end: false }),
    (170, MovementCommand::Dash { pressed: true, direction: Vec3::X, force_end: false }),
    (200, MovementCommand::Jetpack { pressed: true }),
    (230, MovementCommand::Jetpack { pressed: false }),
    (300, MovementCommand::Prone { pressed: true }),
    (330, MovementCommand::Prone { pressed: true }),
];
const LAST_STEP: u32 = 400;

#[derive(Component)]
struct Runner;

fn main() {
    let tuning = MovementTuning::load_or_default();

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f32(tuning.dt))))
        .add_plugins(LogPlugin::default())
        .insert_resource(Time::<Fixed>::from_seconds(tuning.dt as f64))
        .insert_resource(SpatialProbe::new(demo_world()))
        .insert_resource(tuning)
        .add_plugins(MovementPlugin)
        .add_plugins(KinematicLocomotionPlugin)
        .add_systems(Startup, spawn_runner)
        .add_systems(FixedUpdate, drive_script.before(MovementSet::Gateway))
        .add_systems(FixedUpdate, log_outcomes.after(MovementSet::Publish))
        .run();
}

/// Flat floor with a wall far ahead of the runner.
fn demo_world() -> PlaneWorld {
    PlaneWorld::flat(0.0).with_wall(Plane::new(Vec3::new(0.0, 0.0, -1200.0), Vec3::Z))
}

fn spawn_runner(mut commands: Commands, tuning: Res<MovementTuning>) {
    let anchors = [
        (WallSide::Front, Vec3::new(0.0, 0.0, -60.0)),
        (WallSide::Left, Vec3::new(-60.0, 0.0, 0.0)),
        (WallSide::Right, Vec3::new(60.0, 0.0, 0.0)),
    ]
    .into_iter()
    .fold(ActorAnchors::default(), |acc, (side, offset)| {
        acc.with(
            side.anchor_name(),
            Anchor {
                offset,
                forward: Vec3::NEG_Z,
            },
        )
    });

    commands.spawn((
        Runner,
        movement_actor(tuning.settings.clone(), Capabilities::CHARACTER, anchors),
        KinematicBody::default(),
        Transform::from_xyz(0.0, 96.0, 0.0),
    ));
}

fn drive_script(
    runner: Query<Entity, With<Runner>>,
    mut requests: MessageWriter<MovementRequest>,
    mut exit: MessageWriter<AppExit>,
    mut step: Local<u32>,
) {
    *step += 1;
    let Ok(actor) = runner.single() else {
        return;
    };
    for (_, command) in SCRIPT.iter().filter(|(at, _)| *at == *step) {
        info!("[step {}] {:?}", *step, command);
        requests.write(MovementRequest::local(actor, *command));
    }
    if *step >= LAST_STEP {
        info!("Demo finished after {} steps", *step);
        exit.write(AppExit::Success);
    }
}

fn log_outcomes(
    mut events: MessageReader<MovementEvent>,
    mut rejected: MessageReader<RequestRejected>,
    runner: Query<&Transform, With<Runner>>,
) {
    for event in events.read() {
        let height = runner.get(event.actor).map(|t| t.translation.y).unwrap_or_default();
        info!("{:?} at y={height:.1}: {:?}", event.actor, event.notification);
    }
    for r in rejected.read() {
        warn!("{:?} rejected: {}", r.request.command, r.reason);
    }
}
