use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::config::tables::{AnimationTable, SpeedTable, load_table};
use crate::config::tuning::MovementTuning;
use crate::movement::{
    authority::{
        self, AuthorityRole, InputOwner, MovementRequest, OutgoingRequest, RejectReason, RequestRejected, Route,
    },
    components::{
        ActorAnchors, ActorContext, AdvancedMovement, Capabilities, LocomotionReport, OwnerCapability, OwnerState,
    },
    events::{AnimationCue, MovementEvent, MovementOutput, PhysicsDirective},
    probe::{EnvironmentProbe, SpatialProbe, probe_or_null},
    replication::{self, MovementSnapshot, SnapshotPublished},
    settings::MovementSettings,
};

// ── SystemSets (strict FixedUpdate ordering) ────────────────────────

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum MovementSet {
    /// Initialization, then validate and commit requests.
    Gateway,
    /// Per-step continuation of every initialized actor.
    Continuation,
    /// Locomotion collaborator consumes directives.
    Locomotion,
    /// Snapshots out to observers.
    Publish,
}

/// Actors carrying this are initialized on the next fixed step, then it is removed.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct AutoInitialize;

/// Ask for `movement_tuning.ron` to be re-read.
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct ReloadTuning;

/// Everything a movement actor needs besides its `Transform`.
pub fn movement_actor(settings: MovementSettings, capabilities: Capabilities, anchors: ActorAnchors) -> impl Bundle {
    (
        AdvancedMovement::new(settings),
        capabilities,
        anchors,
        LocomotionReport::default(),
        OwnerState::default(),
        AutoInitialize,
    )
}

pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<MovementRequest>();
        app.add_message::<RequestRejected>();
        app.add_message::<OutgoingRequest>();
        app.add_message::<MovementEvent>();
        app.add_message::<PhysicsDirective>();
        app.add_message::<AnimationCue>();
        app.add_message::<SnapshotPublished>();
        app.add_message::<ReloadTuning>();

        if !app.world().contains_resource::<MovementTuning>() {
            app.insert_resource(MovementTuning::load_or_default());
        }
        let tuning = app.world().resource::<MovementTuning>().clone();
        if !app.world().contains_resource::<AuthorityRole>() {
            app.insert_resource(tuning.role);
        }
        let speeds = tuning
            .speed_table
            .as_deref()
            .and_then(|name| load_table::<SpeedTable>(&MovementTuning::table_path(name)));
        if let Some(table) = speeds {
            info!("Loaded {} speed rows", table.rows.len());
            app.insert_resource(table);
        }
        let animations = tuning
            .animation_table
            .as_deref()
            .and_then(|name| load_table::<AnimationTable>(&MovementTuning::table_path(name)));
        if let Some(table) = animations {
            info!("Loaded {} animation rows", table.rows.len());
            app.insert_resource(table);
        }

        app.configure_sets(
            FixedUpdate,
            (
                MovementSet::Gateway,
                MovementSet::Continuation,
                MovementSet::Locomotion,
                MovementSet::Publish,
            )
                .chain(),
        );

        // Gateway: chained so freshly initialized actors accept requests this step
        app.add_systems(
            FixedUpdate,
            (initialize_actors, process_requests)
                .chain()
                .in_set(MovementSet::Gateway),
        );

        app.add_systems(
            FixedUpdate,
            advance_movement.in_set(MovementSet::Continuation),
        );

        app.add_systems(
            FixedUpdate,
            (replication::publish_snapshots, replication::mirror_replicas)
                .chain()
                .in_set(MovementSet::Publish),
        );

        app.add_systems(Update, reload_tuning);
    }
}

/// The three output channels of every operation and tick.
#[derive(SystemParam)]
pub struct MovementWriters<'w> {
    events: MessageWriter<'w, MovementEvent>,
    directives: MessageWriter<'w, PhysicsDirective>,
    cues: MessageWriter<'w, AnimationCue>,
}

impl MovementWriters<'_> {
    /// Drain `out` into messages tagged with `actor`.
    pub fn flush(&mut self, actor: Entity, out: &mut MovementOutput) {
        for notification in out.notifications.drain(..) {
            self.events.write(MovementEvent { actor, notification });
        }
        for directive in out.directives.drain(..) {
            self.directives.write(PhysicsDirective { actor, directive });
        }
        for cue in out.cues.drain(..) {
            self.cues.write(AnimationCue { actor, cue });
        }
    }
}

fn actor_context<'a>(
    transform: &Transform,
    report: &'a LocomotionReport,
    probe: &'a dyn EnvironmentProbe,
    owner: Option<&'a OwnerState>,
    role: AuthorityRole,
) -> ActorContext<'a> {
    ActorContext {
        position: transform.translation,
        rotation: transform.rotation,
        report,
        probe,
        owner: owner.map(|o| o as &dyn OwnerCapability),
        role,
    }
}

/// Gateway: initialize marked actors with the shared tables.
pub fn initialize_actors(
    mut commands: Commands,
    speeds: Option<Res<SpeedTable>>,
    animations: Option<Res<AnimationTable>>,
    mut actors: Query<
        (Entity, &mut AdvancedMovement, Option<&Capabilities>, Option<&ActorAnchors>),
        With<AutoInitialize>,
    >,
    mut writers: MovementWriters,
) {
    let mut out = MovementOutput::default();
    for (entity, mut movement, capabilities, anchors) in &mut actors {
        let rows = speeds.as_deref().map(|t| t.rows.as_slice());
        let row = movement
            .settings
            .animation_row
            .as_deref()
            .and_then(|name| animations.as_deref()?.row(name))
            .cloned();
        let capabilities = capabilities.copied().unwrap_or_default();

        match movement.initialize(capabilities, anchors, rows, row, &mut out) {
            Ok(()) => {
                info!("Movement ready on {entity:?}");
                commands.entity(entity).insert(MovementSnapshot::default());
            }
            Err(e) => warn!("Movement init failed on {entity:?}: {e}"),
        }
        commands.entity(entity).remove::<AutoInitialize>();
        writers.flush(entity, &mut out);
    }
}

/// Gateway: validate each request, then commit it or forward it.
pub fn process_requests(
    role: Res<AuthorityRole>,
    probe: Option<Res<SpatialProbe>>,
    mut requests: MessageReader<MovementRequest>,
    mut actors: Query<(
        &mut AdvancedMovement,
        &Transform,
        &LocomotionReport,
        Option<&OwnerState>,
        Option<&InputOwner>,
    )>,
    mut rejected: MessageWriter<RequestRejected>,
    mut outgoing: MessageWriter<OutgoingRequest>,
    mut writers: MovementWriters,
) {
    let probe = probe_or_null(probe.as_deref());
    let mut out = MovementOutput::default();
    for request in requests.read() {
        let Ok((mut movement, transform, report, owner_state, input_owner)) = actors.get_mut(request.actor) else {
            warn!("Rejected {:?} for {:?}: unknown actor", request.command, request.actor);
            rejected.write(RequestRejected {
                request: request.clone(),
                reason: RejectReason::UnknownActor,
            });
            continue;
        };

        match authority::route(*role, request.sender, input_owner, &movement) {
            Ok(Route::Forward) => {
                outgoing.write(OutgoingRequest(request.clone()));
            }
            Ok(Route::Commit) => {
                let ctx = actor_context(transform, report, probe, owner_state, *role);
                if let Err(e) = authority::commit(&mut movement, &ctx, request.command, &mut out) {
                    rejected.write(RequestRejected {
                        request: request.clone(),
                        reason: e.into(),
                    });
                }
                writers.flush(request.actor, &mut out);
            }
            Err(reason) => {
                warn!("Rejected {:?} from {}: {reason}", request.command, request.sender);
                rejected.write(RequestRejected {
                    request: request.clone(),
                    reason,
                });
            }
        }
    }
}

/// Continuation: one fixed step for every initialized actor.
pub fn advance_movement(
    tuning: Res<MovementTuning>,
    role: Res<AuthorityRole>,
    probe: Option<Res<SpatialProbe>>,
    mut actors: Query<(Entity, &mut AdvancedMovement, &Transform, &LocomotionReport, Option<&OwnerState>)>,
    mut writers: MovementWriters,
) {
    let dt = tuning.dt;
    let probe = probe_or_null(probe.as_deref());
    let mut out = MovementOutput::default();
    for (entity, mut movement, transform, report, owner) in &mut actors {
        if !movement.is_initialized() {
            continue;
        }
        let ctx = actor_context(transform, report, probe, owner, *role);
        if let Err(e) = movement.tick(&ctx, dt, &mut out) {
            warn!("Movement tick skipped on {entity:?}: {e}");
        }
        writers.flush(entity, &mut out);
    }
}

/// Re-read the tuning file and retime the fixed step.
pub fn reload_tuning(
    mut reloads: MessageReader<ReloadTuning>,
    mut tuning: ResMut<MovementTuning>,
    fixed: Option<ResMut<Time<Fixed>>>,
) {
    if reloads.read().count() == 0 {
        return;
    }
    tuning.reload();
    if let Some(mut fixed) = fixed {
        fixed.set_timestep_seconds(tuning.dt as f64);
    }
}
