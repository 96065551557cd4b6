#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Decision making for the two agents.
//!
//! A [`Policy`] reads the world through its query surface, picks a target
//! cell, and asks its own [`PathPlanner`] how to get there. The cell it
//! returns is always reachable with one legal move because it is taken from
//! the planned path.

use std::collections::HashSet;

use pursuit_core::{distance, AgentRole, AgentSnapshot, Position};
use pursuit_system_pathfinding::{Interruption, Path, PathPlanner, PathRequest, SearchObserver};
use pursuit_world::{query, World};

/// Decision maker for a single agent.
#[derive(Debug)]
pub enum Policy {
    /// Chases the evader, detouring for apples that are closer.
    Pursuer(PursuerPolicy),
    /// Collects apples while steering clear of the pursuer.
    Evader(EvaderPolicy),
}

impl Policy {
    /// Creates the default policy for `role`.
    #[must_use]
    pub fn for_role(role: AgentRole) -> Self {
        match role {
            AgentRole::Pursuer => Self::Pursuer(PursuerPolicy::default()),
            AgentRole::Evader => Self::Evader(EvaderPolicy::default()),
        }
    }

    /// Role of the agent driven by this policy.
    #[must_use]
    pub const fn role(&self) -> AgentRole {
        match self {
            Self::Pursuer(_) => AgentRole::Pursuer,
            Self::Evader(_) => AgentRole::Evader,
        }
    }

    /// Cell the agent wants to reach this turn, or `None` to stay idle.
    #[must_use]
    pub fn choose_target(&self, world: &World) -> Option<Position> {
        match self {
            Self::Pursuer(policy) => policy.choose_target(world),
            Self::Evader(policy) => policy.choose_target(world),
        }
    }

    /// Decides where the agent moves this turn.
    ///
    /// Returns `None` when the agent has nothing to do or the encounter is
    /// over. Otherwise the returned cell is the next node of the planned path,
    /// which equals the agent's own cell when no progress is possible.
    pub fn decide(&mut self, world: &World, observer: &mut dyn SearchObserver) -> Option<Position> {
        if query::status(world).is_terminal() {
            return None;
        }

        let role = self.role();
        let target = self.choose_target(world);
        tracing::debug!(%role, target = ?target, "target chosen");

        let Some(target) = target else {
            self.navigator_mut().idle();
            return None;
        };

        match self {
            Self::Pursuer(policy) => Some(policy.navigate(world, target, observer)),
            Self::Evader(policy) => Some(policy.navigate(world, target, observer)),
        }
    }

    /// Path returned by the most recent call to [`Policy::decide`].
    #[must_use]
    pub fn last_path(&self) -> Option<&Path> {
        self.navigator().last_path.as_ref()
    }

    /// Planner owned by this policy.
    #[must_use]
    pub fn planner(&self) -> &PathPlanner {
        &self.navigator().planner
    }

    fn navigator(&self) -> &Navigator {
        match self {
            Self::Pursuer(policy) => &policy.navigator,
            Self::Evader(policy) => &policy.navigator,
        }
    }

    fn navigator_mut(&mut self) -> &mut Navigator {
        match self {
            Self::Pursuer(policy) => &mut policy.navigator,
            Self::Evader(policy) => &mut policy.navigator,
        }
    }
}

/// Pursuer behaviour: head for the evader unless a viable apple is nearer.
#[derive(Debug, Default)]
pub struct PursuerPolicy {
    navigator: Navigator,
}

impl PursuerPolicy {
    fn choose_target(&self, world: &World) -> Option<Position> {
        let me = query::agent(world, AgentRole::Pursuer);
        let evader = query::agent(world, AgentRole::Evader);
        let to_evader = distance(me.position, evader.position, me.step_budget);

        match nearest_viable_apple(world, &me) {
            Some((apple, to_apple)) if to_apple < to_evader => Some(apple),
            _ => Some(evader.position),
        }
    }

    fn navigate(
        &mut self,
        world: &World,
        target: Position,
        observer: &mut dyn SearchObserver,
    ) -> Position {
        let me = query::agent(world, AgentRole::Pursuer);
        let avoid = HashSet::new();
        let interruptions = [Interruption::TargetMoved { current: target }];

        self.navigator
            .navigate(world, &me, target, &avoid, &interruptions, observer)
    }
}

/// Evader behaviour: collect the nearest viable apple, routing around the
/// pursuer's danger zone.
#[derive(Debug, Default)]
pub struct EvaderPolicy {
    navigator: Navigator,
}

impl EvaderPolicy {
    fn choose_target(&self, world: &World) -> Option<Position> {
        let me = query::agent(world, AgentRole::Evader);
        nearest_viable_apple(world, &me).map(|(apple, _)| apple)
    }

    fn navigate(
        &mut self,
        world: &World,
        target: Position,
        observer: &mut dyn SearchObserver,
    ) -> Position {
        let me = query::agent(world, AgentRole::Evader);
        let threat = query::agent(world, AgentRole::Pursuer).position;
        let radius = query::config(world).danger_radius;

        let avoid = danger_zone(world, threat, radius);
        let interruptions = [
            Interruption::TargetMoved { current: target },
            Interruption::DangerZone {
                requester: me.position,
                threat,
                radius,
            },
        ];

        self.navigator
            .navigate(world, &me, target, &avoid, &interruptions, observer)
    }
}

/// Cells within `radius` of the pursuer that the evader must not plan through.
#[must_use]
pub fn danger_zone(world: &World, threat: Position, radius: u32) -> HashSet<Position> {
    query::grid(world)
        .cells_within(threat, radius)
        .into_iter()
        .collect()
}

/// Nearest apple `agent` can reach before it spoils, with its distance.
///
/// An apple is viable when the agent's turn count to it does not exceed its
/// remaining life. Ties go to the apple that was created first.
#[must_use]
pub fn nearest_viable_apple(world: &World, agent: &AgentSnapshot) -> Option<(Position, u32)> {
    query::apples(world)
        .into_iter()
        .map(|apple| {
            let turns = distance(agent.position, apple.position, agent.step_budget);
            (apple, turns)
        })
        .filter(|(apple, turns)| *turns <= apple.remaining_life)
        .min_by_key(|(_, turns)| *turns)
        .map(|(apple, turns)| (apple.position, turns))
}

#[derive(Debug, Default)]
struct Navigator {
    planner: PathPlanner,
    last_path: Option<Path>,
}

impl Navigator {
    fn navigate(
        &mut self,
        world: &World,
        me: &AgentSnapshot,
        target: Position,
        avoid: &HashSet<Position>,
        interruptions: &[Interruption],
        observer: &mut dyn SearchObserver,
    ) -> Position {
        let request = PathRequest {
            grid: query::grid(world),
            start: me.position,
            target,
            step_budget: me.step_budget,
            avoid,
        };
        let searches = self.planner.searches();
        let path = self.planner.find_path(&request, interruptions, observer);
        if self.planner.searches() != searches {
            tracing::debug!(
                role = %me.role,
                from = %me.position,
                %target,
                nodes = path.len(),
                "replanned"
            );
        }

        let next = path.next_position();
        self.last_path = Some(path);
        next
    }

    fn idle(&mut self) {
        self.planner.reset();
        self.last_path = None;
    }
}
