//! StatSource - Trait and implementations for stat providers

mod defaults;
mod trinket;

pub use defaults::DefaultsSource;
pub use trinket::TrinketSource;

use crate::sheet::StatAccumulator;

/// Trait for anything that contributes to a resolved sheet
pub trait StatSource {
    /// Unique identifier for this source
    fn id(&self) -> &str;

    /// Priority for application order (higher = applied later)
    /// Suggested priorities:
    /// - Configured defaults: -100
    /// - Trinkets: 0
    fn priority(&self) -> i32 {
        0
    }

    /// Apply this source's contributions to the accumulator
    fn apply(&self, acc: &mut StatAccumulator);
}
