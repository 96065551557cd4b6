//! Grid geometry shared by the world and the planning systems.
//!
//! Everything here is pure: the [`Grid`] only describes bounds and static
//! obstacles, and the free functions operate on bare positions.

use std::collections::HashSet;

use crate::{Direction, Position};

/// Bounds and static obstacles of the playing field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
    obstacles: HashSet<Position>,
}

impl Grid {
    /// Creates a grid with the provided dimensions and obstacles.
    #[must_use]
    pub fn new<I>(width: u32, height: u32, obstacles: I) -> Self
    where
        I: IntoIterator<Item = Position>,
    {
        Self {
            width,
            height,
            obstacles: obstacles.into_iter().collect(),
        }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells, obstacles included.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let count = u64::from(self.width) * u64::from(self.height);
        usize::try_from(count).unwrap_or(usize::MAX)
    }

    /// Reports whether `pos` lies within the grid bounds.
    #[must_use]
    pub fn contains(&self, pos: Position) -> bool {
        pos.x() >= 0
            && pos.y() >= 0
            && pos.x().unsigned_abs() < self.width
            && pos.y().unsigned_abs() < self.height
    }

    /// Reports whether `pos` is a static obstacle.
    #[must_use]
    pub fn is_obstacle(&self, pos: Position) -> bool {
        self.obstacles.contains(&pos)
    }

    /// Reports whether an agent or apple may occupy `pos`.
    #[must_use]
    pub fn is_open(&self, pos: Position) -> bool {
        self.contains(pos) && !self.is_obstacle(pos)
    }

    /// Iterates over every open cell in row-major order.
    pub fn open_cells(&self) -> impl Iterator<Item = Position> + '_ {
        let width = self.width as i32;
        let height = self.height as i32;
        (0..height)
            .flat_map(move |y| (0..width).map(move |x| Position::new(x, y)))
            .filter(move |cell| !self.is_obstacle(*cell))
    }

    /// Enumerates the cells reachable by a single straight move of up to
    /// `radius` cells.
    ///
    /// Only the four axis rays are considered, ring by ring: for every ring
    /// `i` the cells `1 + i` away to the east, west, south and north are
    /// produced in that order. Cells outside the grid, static obstacles and
    /// members of `avoid` are skipped. Rays are not occluded, so a cell behind
    /// an obstacle is still produced. Rings longer than the grid's widest side
    /// cannot land on the grid from an in-bounds `pos` and are not walked.
    #[must_use]
    pub fn neighbors(&self, pos: Position, radius: u32, avoid: &HashSet<Position>) -> Vec<Position> {
        let rings = radius.min(self.width.max(self.height));
        let mut cells = Vec::with_capacity(4 * rings as usize);

        for ring in 1..=rings {
            for direction in RAY_ORDER {
                let cell = step(pos, direction, ring);
                if self.is_open(cell) && !avoid.contains(&cell) {
                    cells.push(cell);
                }
            }
        }

        cells
    }

    /// Lists the in-bounds cells whose Manhattan offset from `center` is at
    /// most `radius`, in row-major order. `center` itself is included when it
    /// lies on the grid.
    #[must_use]
    pub fn cells_within(&self, center: Position, radius: u32) -> Vec<Position> {
        let reach = i64::from(radius);
        let (cx, cy) = (i64::from(center.x()), i64::from(center.y()));
        let max_x = (i64::from(self.width) - 1).min(i64::from(i32::MAX));
        let max_y = (i64::from(self.height) - 1).min(i64::from(i32::MAX));
        let mut cells = Vec::new();

        // Only the part of the diamond that overlaps the grid is visited.
        for y in (cy - reach).max(0)..=(cy + reach).min(max_y) {
            let span = reach - (y - cy).abs();
            for x in (cx - span).max(0)..=(cx + span).min(max_x) {
                cells.push(Position::new(x as i32, y as i32));
            }
        }

        cells
    }

    /// Returns the nearest grid edge and the number of cells separating `pos`
    /// from it. Ties resolve in north, east, south, west order.
    #[must_use]
    pub fn distance_to_wall(&self, pos: Position) -> (Direction, u32) {
        let width = i64::from(self.width);
        let height = i64::from(self.height);
        let x = i64::from(pos.x());
        let y = i64::from(pos.y());

        let candidates = [
            (Direction::North, y),
            (Direction::East, width - 1 - x),
            (Direction::South, height - 1 - y),
            (Direction::West, x),
        ];

        let mut nearest = candidates[0];
        for candidate in &candidates[1..] {
            if candidate.1 < nearest.1 {
                nearest = *candidate;
            }
        }

        let cells = u32::try_from(nearest.1.max(0)).unwrap_or(u32::MAX);
        (nearest.0, cells)
    }
}

const RAY_ORDER: [Direction; 4] = [
    Direction::East,
    Direction::West,
    Direction::South,
    Direction::North,
];

/// Primary and secondary heading from one cell towards another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Bearing {
    /// Heading along the axis with the larger offset.
    pub primary: Direction,
    /// Heading along the other axis, absent when that offset is zero.
    pub secondary: Option<Direction>,
}

/// Number of turns needed to cover the Manhattan offset between `a` and `b`
/// when moving `step_budget` cells per turn.
///
/// This is a turn-count estimate, not a path length: obstacles and the
/// single-axis restriction are ignored. A zero budget is treated as one.
#[must_use]
pub fn distance(a: Position, b: Position, step_budget: u32) -> u32 {
    a.manhattan_distance(b).div_ceil(step_budget.max(1))
}

/// Heading from `a` towards `b`. Equal offsets favour the east-west axis.
///
/// Returns `None` when both positions coincide.
#[must_use]
pub fn direction(a: Position, b: Position) -> Option<Bearing> {
    let dx = i64::from(b.x()) - i64::from(a.x());
    let dy = i64::from(b.y()) - i64::from(a.y());

    let horizontal = match dx.signum() {
        1 => Some(Direction::East),
        -1 => Some(Direction::West),
        _ => None,
    };
    let vertical = match dy.signum() {
        1 => Some(Direction::South),
        -1 => Some(Direction::North),
        _ => None,
    };

    if dx.abs() >= dy.abs() {
        horizontal.map(|primary| Bearing {
            primary,
            secondary: vertical,
        })
    } else {
        vertical.map(|primary| Bearing {
            primary,
            secondary: horizontal,
        })
    }
}

/// Moves `n` cells from `pos` in `direction`. Bounds are not checked.
#[must_use]
pub fn step(pos: Position, direction: Direction, n: u32) -> Position {
    let n = i32::try_from(n).unwrap_or(i32::MAX);
    match direction {
        Direction::North => Position::new(pos.x(), pos.y().saturating_sub(n)),
        Direction::East => Position::new(pos.x().saturating_add(n), pos.y()),
        Direction::South => Position::new(pos.x(), pos.y().saturating_add(n)),
        Direction::West => Position::new(pos.x().saturating_sub(n), pos.y()),
    }
}

/// Single greedy move from `a` towards `b`, ignoring obstacles.
///
/// The axis with the larger remaining offset is travelled, vertical first when
/// both offsets are equal, and the move is capped at `step_budget` cells.
#[must_use]
pub fn next_pos(a: Position, b: Position, step_budget: u32) -> Position {
    let diff_x = a.x().abs_diff(b.x());
    let diff_y = a.y().abs_diff(b.y());

    if diff_y >= diff_x {
        let moves = diff_y.min(step_budget);
        if a.y() < b.y() {
            step(a, Direction::South, moves)
        } else {
            step(a, Direction::North, moves)
        }
    } else {
        let moves = diff_x.min(step_budget);
        if a.x() < b.x() {
            step(a, Direction::East, moves)
        } else {
            step(a, Direction::West, moves)
        }
    }
}
