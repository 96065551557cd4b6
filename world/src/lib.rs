#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative simulation state for Pursuit.
//!
//! The [`World`] owns the grid, both agents, and the live apples. Moves are
//! decided elsewhere and submitted through [`apply_move`] (or [`apply`] with a
//! [`Command::MoveAgent`]); once both agents have moved, [`tick`] closes the
//! turn by resolving collisions, apples, scores and win conditions.

use pursuit_core::{
    AgentRole, AgentSnapshot, Command, ConfigError, Event, GameConfig, Grid, IllegalMove,
    OutcomeReason, Position, TurnStatus, WELCOME_BANNER,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Represents the authoritative Pursuit world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: GameConfig,
    grid: Grid,
    pursuer: Agent,
    evader: Agent,
    apples: Vec<Apple>,
    rng: ChaCha8Rng,
    tick_index: u64,
    status: TurnStatus,
}

impl World {
    /// Creates a world from a validated configuration.
    ///
    /// Configured apples are placed first; the remaining apples up to the
    /// target count are scattered randomly. Construction emits no events; use
    /// [`World::with_events`] to observe the initial spawns.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Self::with_events(config, &mut Vec::new())
    }

    /// Creates a world like [`World::new`], reporting an
    /// [`Event::AppleSpawned`] for every apple the initial replenishment
    /// scatters. Configured apples are not reported.
    pub fn with_events(
        config: GameConfig,
        out_events: &mut Vec<Event>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let apples = config
            .apples
            .iter()
            .map(|apple| Apple {
                position: apple.position,
                remaining_life: apple.remaining_life,
            })
            .collect();

        let mut world = Self {
            banner: WELCOME_BANNER,
            grid: config.grid(),
            pursuer: Agent::from_config(&config, AgentRole::Pursuer),
            evader: Agent::from_config(&config, AgentRole::Evader),
            apples,
            rng,
            tick_index: 0,
            status: TurnStatus::Continuing,
            config,
        };

        world.replenish_apples(out_events);
        Ok(world)
    }

    fn agent(&self, role: AgentRole) -> &Agent {
        match role {
            AgentRole::Pursuer => &self.pursuer,
            AgentRole::Evader => &self.evader,
        }
    }

    fn agent_mut(&mut self, role: AgentRole) -> &mut Agent {
        match role {
            AgentRole::Pursuer => &mut self.pursuer,
            AgentRole::Evader => &mut self.evader,
        }
    }

    fn has_apple(&self, cell: Position) -> bool {
        self.apples.iter().any(|apple| apple.position == cell)
    }

    fn replenish_apples(&mut self, out_events: &mut Vec<Event>) {
        let target = self.config.apple_target_count;
        if self.apples.len() >= target {
            return;
        }

        let mut free: Vec<Position> = self
            .grid
            .open_cells()
            .filter(|cell| !self.has_apple(*cell))
            .collect();

        while self.apples.len() < target && !free.is_empty() {
            let index = self.rng.gen_range(0..free.len());
            let position = free.swap_remove(index);
            let remaining_life = self.config.apple_lifetime;
            self.apples.push(Apple {
                position,
                remaining_life,
            });
            tracing::debug!(%position, remaining_life, "apple spawned");
            out_events.push(Event::AppleSpawned {
                position,
                remaining_life,
            });
        }
    }

    fn resolve_apples(&mut self, out_events: &mut Vec<Event>) {
        let pursuer_cell = self.pursuer.position;
        let evader_cell = self.evader.position;
        let mut retained = Vec::with_capacity(self.apples.len());

        for mut apple in std::mem::take(&mut self.apples) {
            let mut consumed = false;
            for (role, cell) in [
                (AgentRole::Pursuer, pursuer_cell),
                (AgentRole::Evader, evader_cell),
            ] {
                if cell != apple.position {
                    continue;
                }
                let agent = self.agent_mut(role);
                agent.score = agent.score.saturating_add(1);
                consumed = true;
                out_events.push(Event::AppleConsumed {
                    role,
                    position: apple.position,
                    score: agent.score,
                });
            }

            if consumed {
                continue;
            }

            match apple.remaining_life.checked_sub(1) {
                Some(remaining_life) => {
                    apple.remaining_life = remaining_life;
                    retained.push(apple);
                }
                None => out_events.push(Event::AppleSpoiled {
                    position: apple.position,
                }),
            }
        }

        self.apples = retained;
    }

    fn score_winner(&self) -> Option<TurnStatus> {
        let threshold = self.config.win_score_threshold;
        if self.pursuer.score >= threshold {
            return Some(TurnStatus::PursuerWins(OutcomeReason::ScoreThreshold {
                score: self.pursuer.score,
            }));
        }
        if self.evader.score >= threshold {
            return Some(TurnStatus::EvaderWins(OutcomeReason::ScoreThreshold {
                score: self.evader.score,
            }));
        }
        None
    }

    fn finish(&mut self, status: TurnStatus, out_events: &mut Vec<Event>) -> TurnStatus {
        self.status = status;
        tracing::debug!(?status, tick = self.tick_index, "encounter finished");
        out_events.push(Event::EncounterFinished { status });
        status
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Rejected moves leave the world untouched and are reported through
/// [`Event::MoveRejected`].
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::MoveAgent { role, to } => {
            if let Err(reason) = apply_move(world, role, to, out_events) {
                out_events.push(Event::MoveRejected { role, to, reason });
            }
        }
        Command::Tick => {
            let _ = tick(world, out_events);
        }
    }
}

/// Moves an agent to `to` after checking the move is legal.
///
/// A legal move travels along a single axis, covers at most the agent's step
/// budget, and ends on an open cell of the grid. A zero-length move is a legal
/// way of staying put and produces no event.
pub fn apply_move(
    world: &mut World,
    role: AgentRole,
    to: Position,
    out_events: &mut Vec<Event>,
) -> Result<(), IllegalMove> {
    if world.status.is_terminal() {
        return Err(IllegalMove::EncounterFinished);
    }

    let agent = world.agent(role);
    let from = agent.position;
    let x_diff = from.x().abs_diff(to.x());
    let y_diff = from.y().abs_diff(to.y());

    if x_diff != 0 && y_diff != 0 {
        return Err(IllegalMove::Diagonal);
    }

    let attempted = x_diff.max(y_diff);
    if attempted > agent.step_budget {
        return Err(IllegalMove::ExceedsStepBudget {
            attempted,
            budget: agent.step_budget,
        });
    }
    if !world.grid.contains(to) {
        return Err(IllegalMove::OutOfBounds);
    }
    if world.grid.is_obstacle(to) {
        return Err(IllegalMove::Obstructed);
    }

    if attempted == 0 {
        return Ok(());
    }

    world.agent_mut(role).position = to;
    out_events.push(Event::AgentMoved { role, from, to });
    Ok(())
}

/// Closes the current turn and reports whether the encounter continues.
///
/// Steps, in order: a shared cell ends the encounter in the pursuer's favour;
/// agents eat the apples they stand on (both score when they share the
/// cell) and every other apple loses one unit of life, spoiling once it would
/// drop below zero; the apple supply is replenished; finally the score
/// threshold is checked, pursuer before evader. Once terminal, the status is
/// sticky and further ticks change nothing.
pub fn tick(world: &mut World, out_events: &mut Vec<Event>) -> TurnStatus {
    if world.status.is_terminal() {
        return world.status;
    }

    world.tick_index = world.tick_index.saturating_add(1);
    out_events.push(Event::TimeAdvanced {
        tick: world.tick_index,
    });

    if world.pursuer.position == world.evader.position {
        return world.finish(TurnStatus::PursuerWins(OutcomeReason::Caught), out_events);
    }

    world.resolve_apples(out_events);
    world.replenish_apples(out_events);

    match world.score_winner() {
        Some(status) => world.finish(status, out_events),
        None => TurnStatus::Continuing,
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use pursuit_core::{AgentRole, AgentSnapshot, AppleSnapshot, GameConfig, Grid, TurnStatus};

    use super::World;

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the configuration the world was built from.
    #[must_use]
    pub fn config(world: &World) -> &GameConfig {
        &world.config
    }

    /// Provides read-only access to the grid geometry.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Captures a snapshot of the agent playing `role`.
    #[must_use]
    pub fn agent(world: &World, role: AgentRole) -> AgentSnapshot {
        world.agent(role).snapshot()
    }

    /// Captures snapshots of the live apples in creation order.
    #[must_use]
    pub fn apples(world: &World) -> Vec<AppleSnapshot> {
        world
            .apples
            .iter()
            .map(|apple| AppleSnapshot {
                position: apple.position,
                remaining_life: apple.remaining_life,
            })
            .collect()
    }

    /// Status reported by the most recent tick.
    #[must_use]
    pub fn status(world: &World) -> TurnStatus {
        world.status
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}

#[derive(Clone, Debug)]
struct Agent {
    role: AgentRole,
    position: Position,
    step_budget: u32,
    score: u32,
}

impl Agent {
    fn from_config(config: &GameConfig, role: AgentRole) -> Self {
        let agent = config.agent(role);
        Self {
            role,
            position: agent.start,
            step_budget: agent.step_budget,
            score: 0,
        }
    }

    fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            role: self.role,
            position: self.position,
            step_budget: self.step_budget,
            score: self.score,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Apple {
    position: Position,
    remaining_life: u32,
}
