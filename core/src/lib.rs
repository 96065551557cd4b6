#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Pursuit engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Agent policies read immutable
//! snapshots and answer with [`Command`] values, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that adapters may log or render. Grid geometry lives in the [`grid`] module
//! because both the world and the planning systems depend on it.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod grid;

pub use grid::{direction, distance, next_pos, step, Bearing, Grid};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Pursuit.";

/// Location of a single grid cell expressed as x and y coordinates.
///
/// The y axis grows towards the south, so [`Direction::North`] decreases `y`.
/// Coordinates are signed because stepping is allowed to leave the grid; bounds
/// are only enforced by [`Grid::contains`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    x: i32,
    y: i32,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based column of the position.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based row of the position.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Computes the Manhattan offset between two positions.
    #[must_use]
    pub fn manhattan_distance(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal movement directions. Diagonals do not exist on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing y.
    North,
    /// Movement toward increasing x.
    East,
    /// Movement toward increasing y.
    South,
    /// Movement toward decreasing x.
    West,
}

impl Direction {
    /// Returns the direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }
}

/// The two competing sides of an encounter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentRole {
    /// Chases the evader and wins by landing on it.
    Pursuer,
    /// Runs from the pursuer while collecting apples.
    Evader,
}

impl AgentRole {
    /// Returns the role of the opposing agent.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Pursuer => Self::Evader,
            Self::Evader => Self::Pursuer,
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pursuer => f.write_str("pursuer"),
            Self::Evader => f.write_str("evader"),
        }
    }
}

/// Order in which the two agents are resolved within a turn.
///
/// The second agent observes the first agent's already updated position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionOrder {
    /// The pursuer decides and moves before the evader.
    #[default]
    PursuerFirst,
    /// The evader decides and moves before the pursuer.
    EvaderFirst,
}

impl ResolutionOrder {
    /// Roles in the order they are resolved.
    #[must_use]
    pub const fn roles(self) -> [AgentRole; 2] {
        match self {
            Self::PursuerFirst => [AgentRole::Pursuer, AgentRole::Evader],
            Self::EvaderFirst => [AgentRole::Evader, AgentRole::Pursuer],
        }
    }
}

/// Start parameters for a single agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Cell the agent occupies before the first turn.
    pub start: Position,
    /// Maximum number of cells the agent may move along one axis per turn.
    pub step_budget: u32,
}

impl AgentConfig {
    /// Creates an agent configuration.
    #[must_use]
    pub const fn new(start: Position, step_budget: u32) -> Self {
        Self { start, step_budget }
    }
}

/// Apple placed explicitly at construction, before random replenishment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppleConfig {
    /// Cell holding the apple.
    pub position: Position,
    /// Ticks left before the apple spoils.
    pub remaining_life: u32,
}

/// Immutable construction parameters of an encounter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of columns in the grid.
    pub width: u32,
    /// Number of rows in the grid.
    pub height: u32,
    /// Statically blocked cells.
    pub obstacles: Vec<Position>,
    /// Start parameters of the pursuer.
    pub pursuer: AgentConfig,
    /// Start parameters of the evader.
    pub evader: AgentConfig,
    /// Number of live apples the world keeps on the grid.
    pub apple_target_count: usize,
    /// Lifetime assigned to replenished apples.
    pub apple_lifetime: u32,
    /// Apples placed before the first replenishment.
    pub apples: Vec<AppleConfig>,
    /// Radius around the pursuer the evader treats as dangerous.
    pub danger_radius: u32,
    /// Score at which an agent wins.
    pub win_score_threshold: u32,
    /// Seed for apple placement. `None` draws one from the operating system.
    pub seed: Option<u64>,
    /// Order in which agents are resolved each turn.
    pub resolution_order: ResolutionOrder,
}

impl GameConfig {
    /// Builds the divided field: two wall columns split the grid in half,
    /// leaving a single gap in the middle row.
    #[must_use]
    pub fn divided_field() -> Self {
        let width: u32 = 80;
        let height: u32 = 45;
        let wall_x = (width / 2) as i32;
        let gap_y = (height / 2) as i32;
        let obstacles = (0..height as i32)
            .filter(|&y| y != gap_y)
            .flat_map(|y| [Position::new(wall_x, y), Position::new(wall_x - 1, y)])
            .collect();

        Self {
            width,
            height,
            obstacles,
            pursuer: AgentConfig::new(Position::new(width as i32 - 1, 0), 1),
            evader: AgentConfig::new(Position::new(0, height as i32 - 1), 2),
            apple_target_count: 2,
            apple_lifetime: 160,
            apples: Vec::new(),
            danger_radius: 3,
            win_score_threshold: 100,
            seed: None,
            resolution_order: ResolutionOrder::PursuerFirst,
        }
    }

    /// Returns the start parameters of the agent with the provided role.
    #[must_use]
    pub const fn agent(&self, role: AgentRole) -> &AgentConfig {
        match role {
            AgentRole::Pursuer => &self.pursuer,
            AgentRole::Evader => &self.evader,
        }
    }

    /// Builds the grid geometry described by the configuration.
    #[must_use]
    pub fn grid(&self) -> Grid {
        Grid::new(self.width, self.height, self.obstacles.iter().copied())
    }

    /// Checks that every configured position is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0
            || self.height == 0
            || self.width > i32::MAX as u32
            || self.height > i32::MAX as u32
        {
            return Err(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }

        let grid = self.grid();
        if let Some(&obstacle) = self.obstacles.iter().find(|cell| !grid.contains(**cell)) {
            return Err(ConfigError::ObstacleOutOfBounds { position: obstacle });
        }

        for role in [AgentRole::Pursuer, AgentRole::Evader] {
            let agent = self.agent(role);
            if agent.step_budget == 0 {
                return Err(ConfigError::ZeroStepBudget { role });
            }
            if !grid.is_open(agent.start) {
                return Err(ConfigError::BlockedStart {
                    role,
                    position: agent.start,
                });
            }
        }

        for (index, apple) in self.apples.iter().enumerate() {
            if !grid.is_open(apple.position) {
                return Err(ConfigError::BlockedApple {
                    position: apple.position,
                });
            }
            if self.apples[..index]
                .iter()
                .any(|other| other.position == apple.position)
            {
                return Err(ConfigError::DuplicateApple {
                    position: apple.position,
                });
            }
        }

        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::divided_field()
    }
}

/// Reasons a [`GameConfig`] cannot be turned into a world.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The grid has no cells or cannot be addressed with signed coordinates.
    #[error("grid dimensions {width}x{height} are not usable")]
    InvalidDimensions {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
    },
    /// An obstacle lies outside the grid.
    #[error("obstacle {position} lies outside the grid")]
    ObstacleOutOfBounds {
        /// Offending obstacle.
        position: Position,
    },
    /// An agent was configured to move zero cells per turn.
    #[error("{role} step budget must be at least 1")]
    ZeroStepBudget {
        /// Agent with the invalid budget.
        role: AgentRole,
    },
    /// An agent starts outside the grid or on an obstacle.
    #[error("{role} cannot start at {position}")]
    BlockedStart {
        /// Agent with the invalid start.
        role: AgentRole,
        /// Configured start cell.
        position: Position,
    },
    /// An initial apple lies outside the grid or on an obstacle.
    #[error("apple cannot be placed at {position}")]
    BlockedApple {
        /// Configured apple cell.
        position: Position,
    },
    /// Two initial apples share a cell.
    #[error("more than one apple configured at {position}")]
    DuplicateApple {
        /// Shared cell.
        position: Position,
    },
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Requests that an agent move to the provided cell.
    MoveAgent {
        /// Agent attempting to move.
        role: AgentRole,
        /// Destination cell.
        to: Position,
    },
    /// Closes the turn: collisions, apples, scores and win conditions.
    Tick,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that an agent moved between two cells.
    AgentMoved {
        /// Agent that moved.
        role: AgentRole,
        /// Cell occupied before the move.
        from: Position,
        /// Cell occupied after the move.
        to: Position,
    },
    /// Reports that a move request was rejected and state left unchanged.
    MoveRejected {
        /// Agent that attempted the move.
        role: AgentRole,
        /// Requested destination.
        to: Position,
        /// Why the move is illegal.
        reason: IllegalMove,
    },
    /// Announces that the turn counter advanced.
    TimeAdvanced {
        /// Number of completed ticks.
        tick: u64,
    },
    /// An agent ate an apple and scored.
    AppleConsumed {
        /// Agent that ate the apple.
        role: AgentRole,
        /// Cell of the eaten apple.
        position: Position,
        /// Score of the agent after eating.
        score: u32,
    },
    /// An uneaten apple ran out of life and disappeared.
    AppleSpoiled {
        /// Cell of the spoiled apple.
        position: Position,
    },
    /// A new apple was placed on the grid.
    AppleSpawned {
        /// Cell of the new apple.
        position: Position,
        /// Lifetime of the new apple.
        remaining_life: u32,
    },
    /// The encounter reached a terminal status.
    EncounterFinished {
        /// Terminal status.
        status: TurnStatus,
    },
}

/// Reasons a move request is rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum IllegalMove {
    /// The move changes both axes.
    #[error("cannot move along two axes in one turn")]
    Diagonal,
    /// The move covers more cells than the agent may travel.
    #[error("cannot move more than {budget} cells in one turn (tried {attempted})")]
    ExceedsStepBudget {
        /// Cells the move would cover.
        attempted: u32,
        /// Cells the agent may cover.
        budget: u32,
    },
    /// The destination lies outside the grid.
    #[error("cannot move off the grid")]
    OutOfBounds,
    /// The destination is a static obstacle.
    #[error("cannot move onto an obstacle")]
    Obstructed,
    /// The encounter already reached a terminal status.
    #[error("the encounter is already finished")]
    EncounterFinished,
}

/// Why an encounter ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeReason {
    /// The pursuer landed on the evader.
    Caught,
    /// The winner reached the score threshold.
    ScoreThreshold {
        /// Winning score.
        score: u32,
    },
}

/// Result of closing a turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnStatus {
    /// Neither side has won yet.
    #[default]
    Continuing,
    /// The pursuer won.
    PursuerWins(OutcomeReason),
    /// The evader won.
    EvaderWins(OutcomeReason),
}

impl TurnStatus {
    /// Reports whether the encounter is over.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Continuing)
    }

    /// Role of the winning agent, if any.
    #[must_use]
    pub const fn winner(&self) -> Option<AgentRole> {
        match self {
            Self::Continuing => None,
            Self::PursuerWins(_) => Some(AgentRole::Pursuer),
            Self::EvaderWins(_) => Some(AgentRole::Evader),
        }
    }

    /// Human-readable explanation of a terminal status.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        let (winner, reason) = match self {
            Self::Continuing => return None,
            Self::PursuerWins(reason) => (AgentRole::Pursuer, reason),
            Self::EvaderWins(reason) => (AgentRole::Evader, reason),
        };

        Some(match reason {
            OutcomeReason::Caught => "the evader was caught by the pursuer".to_owned(),
            OutcomeReason::ScoreThreshold { score } => format!("the {winner} ate {score} apples"),
        })
    }
}

/// Immutable representation of a single agent used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AgentSnapshot {
    /// Side the agent plays.
    pub role: AgentRole,
    /// Cell currently occupied by the agent.
    pub position: Position,
    /// Maximum single-axis distance the agent may move per turn.
    pub step_budget: u32,
    /// Apples eaten so far.
    pub score: u32,
}

/// Immutable representation of a single live apple used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AppleSnapshot {
    /// Cell holding the apple.
    pub position: Position,
    /// Ticks left before the apple spoils.
    pub remaining_life: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = Position::new(1, 1);
        let destination = Position::new(4, -3);
        assert_eq!(origin.manhattan_distance(destination), 7);
        assert_eq!(destination.manhattan_distance(origin), 7);
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn game_config_round_trips_through_bincode() {
        let mut config = GameConfig::divided_field();
        config.seed = Some(7);
        assert_round_trip(&config);
    }

    #[test]
    fn turn_status_round_trips_through_bincode() {
        assert_round_trip(&TurnStatus::EvaderWins(OutcomeReason::ScoreThreshold {
            score: 3,
        }));
    }

    #[test]
    fn divided_field_leaves_single_gap() {
        let config = GameConfig::divided_field();
        let grid = config.grid();
        let open_in_wall: Vec<_> = (0..45)
            .map(|y| Position::new(40, y))
            .filter(|cell| grid.is_open(*cell))
            .collect();

        assert_eq!(open_in_wall, vec![Position::new(40, 22)]);
        assert!(grid.is_open(Position::new(39, 22)));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_zero_step_budget() {
        let mut config = GameConfig::divided_field();
        config.evader.step_budget = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroStepBudget {
                role: AgentRole::Evader
            })
        );
    }

    #[test]
    fn validate_rejects_start_on_obstacle() {
        let mut config = GameConfig::divided_field();
        config.pursuer.start = Position::new(40, 0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BlockedStart {
                role: AgentRole::Pursuer,
                ..
            })
        ));
    }

    #[test]
    fn validate_rejects_duplicate_apples() {
        let mut config = GameConfig::divided_field();
        let apple = AppleConfig {
            position: Position::new(3, 3),
            remaining_life: 4,
        };
        config.apples = vec![apple, apple];
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateApple {
                position: Position::new(3, 3)
            })
        );
    }

    #[test]
    fn status_reason_describes_outcome() {
        assert_eq!(TurnStatus::Continuing.reason(), None);
        assert_eq!(
            TurnStatus::PursuerWins(OutcomeReason::Caught).reason(),
            Some("the evader was caught by the pursuer".to_owned())
        );
        assert_eq!(
            TurnStatus::EvaderWins(OutcomeReason::ScoreThreshold { score: 5 }).reason(),
            Some("the evader ate 5 apples".to_owned())
        );
    }

    #[test]
    fn resolution_order_lists_both_roles() {
        assert_eq!(
            ResolutionOrder::EvaderFirst.roles(),
            [AgentRole::Evader, AgentRole::Pursuer]
        );
        assert_eq!(AgentRole::Pursuer.opponent(), AgentRole::Evader);
        assert_eq!(Direction::West.opposite(), Direction::East);
    }
}
