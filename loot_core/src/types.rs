//! Core value types shared by the loot engine and its hosts

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Block type id of the containers that receive injected loot
pub const CHEST_BLOCK: &str = "minecraft:chest";

/// Integer block position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        BlockPos { x, y, z }
    }

    /// Offset this position by `(dx, dy, dz) * amount`
    pub fn offset(self, (dx, dy, dz): (i32, i32, i32), amount: i32) -> Self {
        BlockPos {
            x: self.x + dx * amount,
            y: self.y + dy * amount,
            z: self.z + dz * amount,
        }
    }

    /// Parse the `x,y,z` form produced by `Display`
    pub fn parse(key: &str) -> Option<Self> {
        let mut parts = key.split(',').map(|p| p.trim().parse::<i32>());
        let x = parts.next()?.ok()?;
        let y = parts.next()?.ok()?;
        let z = parts.next()?.ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(BlockPos { x, y, z })
    }

    /// Center of the block, used when spawning items on it
    pub fn center(self) -> Vec3 {
        Vec3::new(self.x as f64 + 0.5, self.y as f64 + 0.5, self.z as f64 + 0.5)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

/// Continuous world position or direction
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Vec3 { x, y, z }
    }
}

/// A stack of items occupying one container slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub type_id: String,
    pub amount: u32,
}

impl ItemStack {
    pub fn new(type_id: impl Into<String>, amount: u32) -> Self {
        ItemStack {
            type_id: type_id.into(),
            amount,
        }
    }

    /// A single unit of the given item
    pub fn single(type_id: impl Into<String>) -> Self {
        Self::new(type_id, 1)
    }
}

/// Roll a probability. Chances at or above 1.0 always succeed, 0.0 never does.
pub fn roll_chance<R: Rng + ?Sized>(rng: &mut R, chance: f64) -> bool {
    rng.gen::<f64>() < chance
}
