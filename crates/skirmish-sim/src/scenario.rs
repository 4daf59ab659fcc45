//! Headless arena runs.
//!
//! A [`Scenario`] owns the simulation and a tile-grid world built from a
//! [`SimConfig`]. Each step it:
//! - asks the [`Autopilot`] for the player's input
//! - syncs collider snapshots into the grid
//! - ticks the simulation at a fixed rate
//! - hands drained events to an [`EventHandler`]

use glam::{IVec2, Vec2};
use serde::Serialize;
use skirmish_common::{ActorId, Cardinal, SkirmishResult};
use skirmish_core::{
    CombatEvent, EventBus, EventHandler, GridSpatial, PlayerInput, Simulation, SpatialQuery,
};
use tracing::{debug, info, trace};

use crate::config::SimConfig;

/// Distance beyond which the autopilot considers dashing.
const DASH_DISTANCE: f32 = 4.0;

/// The autopilot tries a dash at most once per this many ticks.
const DASH_INTERVAL: u64 = 96;

/// Tallies combat events and logs them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventLog {
    /// Actors spawned
    pub spawned: u32,
    /// Damage events
    pub hits: u32,
    /// Sum of damage dealt
    pub total_damage: i64,
    /// Deaths
    pub deaths: u32,
    /// Removals after the death delay
    pub removals: u32,
    /// Combo steps executed
    pub combo_steps: u32,
    /// Dashes started
    pub dashes: u32,
    /// Enemy state transitions
    pub state_changes: u32,
}

impl EventHandler for EventLog {
    fn handle(&mut self, event: &CombatEvent) {
        match event {
            CombatEvent::Spawned { actor, layer, position } => {
                self.spawned += 1;
                trace!(%actor, ?layer, ?position, "spawned");
            },
            CombatEvent::Damaged {
                actor,
                amount,
                kind,
                remaining,
                ..
            } => {
                self.hits += 1;
                self.total_damage += i64::from(*amount);
                debug!(%actor, amount, ?kind, remaining, "damaged");
            },
            CombatEvent::Died { actor, position } => {
                self.deaths += 1;
                info!(%actor, ?position, "died");
            },
            CombatEvent::Removed { actor } => {
                self.removals += 1;
                debug!(%actor, "removed");
            },
            CombatEvent::ComboStep {
                actor,
                step,
                damage,
                hits,
            } => {
                self.combo_steps += 1;
                debug!(%actor, step, damage, hits, "combo step");
            },
            CombatEvent::DashStarted {
                actor,
                direction,
                from,
                to,
            } => {
                self.dashes += 1;
                debug!(%actor, ?direction, ?from, ?to, "dash");
            },
            CombatEvent::EnemyStateChanged { actor, from, to } => {
                self.state_changes += 1;
                trace!(%actor, ?from, ?to, "enemy state");
            },
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Ticks simulated
    pub ticks: u64,
    /// Simulated seconds
    pub elapsed: f32,
    /// Player health at the end (0 once removed)
    pub player_health: i32,
    /// Whether the player survived
    pub player_alive: bool,
    /// Enemies still in the arena and alive
    pub enemies_alive: usize,
    /// Event tallies
    pub events: EventLog,
    /// Events lost to a full bus
    pub dropped_events: u64,
}

/// Scripted player: walks toward the nearest live enemy, swings when it is
/// in reach and now and then double-taps to close distance.
#[derive(Debug, Default)]
pub struct Autopilot {
    ticks: u64,
    pending_tap: Option<Cardinal>,
}

impl Autopilot {
    /// Decides this tick's input; `None` once the player is gone or dead.
    pub fn plan<S: SpatialQuery>(
        &mut self,
        sim: &Simulation,
        player_id: ActorId,
        spatial: &S,
        tile_size: f32,
    ) -> Option<PlayerInput> {
        self.ticks += 1;

        let actor = sim.actor(player_id).filter(|a| !a.is_dead())?;
        let player = actor.as_player()?;

        if let Some(direction) = self.pending_tap.take() {
            return Some(PlayerInput::tap(direction));
        }

        let position = actor.position();
        let Some(nearest) = sim
            .actors()
            .filter(|a| a.as_enemy().is_some() && !a.is_dead())
            .min_by(|a, b| {
                a.position()
                    .distance_squared(position)
                    .total_cmp(&b.position().distance_squared(position))
            })
        else {
            return Some(PlayerInput::default());
        };

        let target = nearest.position();
        let reach = player.config().attack_range + nearest.stats().body_radius;
        if player.attack_point(position).distance(target) <= reach {
            return Some(PlayerInput::attack());
        }

        let Some(direction) = heading(position, target, spatial, tile_size) else {
            return Some(PlayerInput::default());
        };

        if position.distance(target) > DASH_DISTANCE
            && self.ticks % DASH_INTERVAL == 0
            && !player.dash().is_dashing()
        {
            self.pending_tap = Some(direction);
            return Some(PlayerInput::tap(direction));
        }

        Some(PlayerInput::moving(direction.to_vec2()))
    }
}

/// Picks a walkable cardinal direction toward `target`.
///
/// Prefers the dominant axis, then the other axis, then any open side that
/// does not double back.
pub fn heading<S: SpatialQuery>(
    position: Vec2,
    target: Vec2,
    spatial: &S,
    tile_size: f32,
) -> Option<Cardinal> {
    let delta = target - position;
    let horizontal = Cardinal::from_intent(Vec2::new(delta.x, 0.0));
    let vertical = Cardinal::from_intent(Vec2::new(0.0, delta.y));
    let (primary, secondary) = if delta.x.abs() >= delta.y.abs() {
        (horizontal, vertical)
    } else {
        (vertical, horizontal)
    };

    let open = |dir: Cardinal| spatial.is_walkable(position + dir.to_vec2() * tile_size);

    let preferred = [primary, secondary].into_iter().flatten();
    if let Some(dir) = preferred.clone().find(|&dir| open(dir)) {
        return Some(dir);
    }

    let back = primary.map(Cardinal::opposite);
    Cardinal::all()
        .into_iter()
        .filter(|&dir| Some(dir) != back && !preferred.clone().any(|p| p == dir))
        .find(|&dir| open(dir))
}

/// A configured arena ready to run.
#[derive(Debug)]
pub struct Scenario {
    sim: Simulation,
    spatial: GridSpatial,
    player: ActorId,
    enemies: Vec<ActorId>,
    autopilot: Autopilot,
    tile_size: f32,
    dt: f32,
    total_ticks: u64,
}

impl Scenario {
    /// Builds the arena and spawns every actor the config lists.
    pub fn from_config(config: &SimConfig) -> SkirmishResult<Self> {
        config.check_presets()?;

        let mut spatial = GridSpatial::new(config.tile_size).with_bounds(
            IVec2::ZERO,
            IVec2::new(config.arena_width - 1, config.arena_height - 1),
        );
        for [x, y] in &config.walls {
            spatial.block_tile(*x, *y);
        }

        let mut sim = Simulation::with_events(config.seed, EventBus::new(config.event_capacity));

        let mut player_config = config.player_preset.config();
        player_config.dash.tile_size = config.tile_size;
        let player = sim.spawn_player(player_config, config.player_spawn);

        let enemies: Vec<ActorId> = config
            .enemies
            .iter()
            .map(|spawn| sim.spawn_enemy(spawn.preset.config(), spawn.position, Some(player)))
            .collect();

        info!(
            width = config.arena_width,
            height = config.arena_height,
            walls = spatial.blocked_count(),
            enemies = enemies.len(),
            "arena ready"
        );

        Ok(Self {
            sim,
            spatial,
            player,
            enemies,
            autopilot: Autopilot::default(),
            tile_size: config.tile_size,
            dt: config.dt(),
            total_ticks: config.total_ticks(),
        })
    }

    /// The simulation being driven.
    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// The player's actor ID.
    #[must_use]
    pub fn player(&self) -> ActorId {
        self.player
    }

    /// Runs one fixed tick and forwards its events to `handler`.
    pub fn step<H: EventHandler>(&mut self, handler: &mut H) -> SkirmishResult<()> {
        if let Some(input) =
            self.autopilot
                .plan(&self.sim, self.player, &self.spatial, self.tile_size)
        {
            self.sim.submit_input(self.player, input)?;
        }

        self.spatial.sync_bodies(self.sim.bodies());
        self.sim.tick(self.dt, &self.spatial);
        self.sim.events().dispatch(handler);
        Ok(())
    }

    /// Runs the configured duration.
    pub fn run(mut self, log: &mut EventLog) -> SkirmishResult<RunSummary> {
        // Spawn events were published before the first tick.
        self.sim.events().dispatch(log);

        for _ in 0..self.total_ticks {
            self.step(log)?;
        }

        let player = self.sim.actor(self.player);
        let summary = RunSummary {
            ticks: self.sim.tick_count(),
            elapsed: self.sim.now(),
            player_health: player.map_or(0, |p| p.health().current().max(0)),
            player_alive: player.is_some_and(|p| !p.is_dead()),
            enemies_alive: self
                .enemies
                .iter()
                .filter(|id| self.sim.actor(**id).is_some_and(|a| !a.is_dead()))
                .count(),
            events: log.clone(),
            dropped_events: self.sim.events().dropped(),
        };

        info!(
            ticks = summary.ticks,
            player_health = summary.player_health,
            enemies_alive = summary.enemies_alive,
            deaths = summary.events.deaths,
            dropped_events = summary.dropped_events,
            "run finished"
        );
        Ok(summary)
    }
}
