//! Shuffle selection
//!
//! Shuffle never reorders the queue. Each advance draws the next index
//! uniformly at random, optionally excluding the index that is playing now.

use rand::Rng;

/// Pick a random queue index
///
/// With `avoid_current` and more than one track, the current index is never
/// returned and every other index is equally likely. A single-track queue
/// always yields index 0.
pub fn pick_index<R: Rng + ?Sized>(
    len: usize,
    current: Option<usize>,
    avoid_current: bool,
    rng: &mut R,
) -> Option<usize> {
    if len == 0 {
        return None;
    }

    match current {
        Some(current) if avoid_current && len > 1 && current < len => {
            // Draw from the other len - 1 slots and skip over the current one
            let index = rng.gen_range(0..len - 1);
            Some(if index >= current { index + 1 } else { index })
        }
        _ => Some(rng.gen_range(0..len)),
    }
}
