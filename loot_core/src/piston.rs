//! Piston displacement of ledger-tracked blocks

use crate::types::BlockPos;

/// Convert a piston `facing_direction` state (0-5) to a unit offset.
/// 0=down, 1=up, 2=north(z-), 3=south(z+), 4=west(x-), 5=east(x+)
pub fn facing_vector(facing: u8) -> (i32, i32, i32) {
    match facing {
        0 => (0, -1, 0),
        1 => (0, 1, 0),
        2 => (0, 0, -1),
        3 => (0, 0, 1),
        4 => (-1, 0, 0),
        5 => (1, 0, 0),
        _ => (0, 0, 0),
    }
}

/// Where a block attached to a piston ends up after the move.
///
/// A piston's facing state points away from the blocks it pushes, so an
/// extending piston moves them against the facing vector and a retracting
/// sticky piston moves them along it.
pub fn displaced(pos: BlockPos, facing: u8, extending: bool) -> BlockPos {
    let step = if extending { -1 } else { 1 };
    pos.offset(facing_vector(facing), step)
}
