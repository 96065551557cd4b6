use std::collections::HashSet;

use pursuit_core::{AgentRole, Position};
use pursuit_world::{query, World};

const EMPTY: char = '.';
const OBSTACLE: char = '#';
const APPLE: char = 'o';
const PURSUER: char = 'P';
const EVADER: char = 'E';
const BOTH: char = 'X';

/// Draws the grid as text, one row per line.
pub(crate) fn render(world: &World) -> String {
    let grid = query::grid(world);
    let pursuer = query::agent(world, AgentRole::Pursuer).position;
    let evader = query::agent(world, AgentRole::Evader).position;
    let apples: HashSet<Position> = query::apples(world)
        .into_iter()
        .map(|apple| apple.position)
        .collect();

    let columns = i32::try_from(grid.width()).unwrap_or(i32::MAX);
    let rows = i32::try_from(grid.height()).unwrap_or(i32::MAX);
    let mut board = String::with_capacity(grid.cell_count() + grid.height() as usize);

    for y in 0..rows {
        for x in 0..columns {
            let cell = Position::new(x, y);
            let glyph = match (cell == pursuer, cell == evader) {
                (true, true) => BOTH,
                (true, false) => PURSUER,
                (false, true) => EVADER,
                (false, false) if grid.is_obstacle(cell) => OBSTACLE,
                (false, false) if apples.contains(&cell) => APPLE,
                (false, false) => EMPTY,
            };
            board.push(glyph);
        }
        board.push('\n');
    }

    board
}
