#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turn sequencing for an encounter between the pursuer and the evader.
//!
//! Within a turn the agents act one after another in the configured
//! [`ResolutionOrder`]. The second agent decides against the world as left by
//! the first, so it sees its opponent's new position. Once both have moved
//! the world ticks and reports the resulting [`TurnStatus`].

use pursuit_core::{AgentRole, Command, Event, ResolutionOrder, TurnStatus};
use pursuit_system_pathfinding::{NoopObserver, SearchObserver};
use pursuit_system_policy::Policy;
use pursuit_world::{self as world, query, World};

/// Drives both policies against a world, one turn at a time.
#[derive(Debug)]
pub struct Encounter<O = NoopObserver> {
    pursuer: Policy,
    evader: Policy,
    order: ResolutionOrder,
    observer: O,
}

impl Encounter {
    /// Creates an encounter resolving agents in `order`.
    #[must_use]
    pub fn new(order: ResolutionOrder) -> Self {
        Self {
            pursuer: Policy::for_role(AgentRole::Pursuer),
            evader: Policy::for_role(AgentRole::Evader),
            order,
            observer: NoopObserver,
        }
    }

    /// Creates an encounter using the resolution order configured for `world`.
    #[must_use]
    pub fn for_world(world: &World) -> Self {
        Self::new(query::config(world).resolution_order)
    }
}

impl<O> Encounter<O>
where
    O: SearchObserver,
{
    /// Replaces the search observer notified while the policies plan.
    #[must_use]
    pub fn with_observer<P>(self, observer: P) -> Encounter<P>
    where
        P: SearchObserver,
    {
        Encounter {
            pursuer: self.pursuer,
            evader: self.evader,
            order: self.order,
            observer,
        }
    }

    /// Policy controlling the agent playing `role`.
    #[must_use]
    pub const fn policy(&self, role: AgentRole) -> &Policy {
        match role {
            AgentRole::Pursuer => &self.pursuer,
            AgentRole::Evader => &self.evader,
        }
    }

    /// Observer notified while the policies plan.
    #[must_use]
    pub const fn observer(&self) -> &O {
        &self.observer
    }

    /// Order in which agents act within a turn.
    #[must_use]
    pub const fn order(&self) -> ResolutionOrder {
        self.order
    }

    /// Plays a single turn: each agent decides and moves in order, then the
    /// world ticks.
    ///
    /// Moves the world rejects are reported as [`Event::MoveRejected`] and the
    /// agent stays put. A finished encounter is left untouched.
    pub fn play_turn(&mut self, world: &mut World, out_events: &mut Vec<Event>) -> TurnStatus {
        let status = query::status(world);
        if status.is_terminal() {
            return status;
        }

        for role in self.order.roles() {
            let policy = match role {
                AgentRole::Pursuer => &mut self.pursuer,
                AgentRole::Evader => &mut self.evader,
            };
            let Some(to) = policy.decide(world, &mut self.observer) else {
                tracing::debug!(%role, "idle");
                continue;
            };
            world::apply(world, Command::MoveAgent { role, to }, out_events);
        }

        world::tick(world, out_events)
    }
}
