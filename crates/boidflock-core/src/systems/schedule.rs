//! Staggered recalculation windows.
//!
//! Recalculating steering for every agent every tick is the dominant cost
//! (one neighbor query per agent). A flock instead gives a full
//! recalculation to `per_update` consecutive agents starting at a rotating
//! cursor, and moves the rest with their last direction.
//!
//! # Coverage
//!
//! Over `agent_count` ticks every agent is recalculated exactly
//! `per_update` times whatever the two numbers are. What coprimality buys
//! is phase mixing: the cursor advances by `per_update` each tick, so the
//! set of window start offsets it visits has size `agent_count / gcd`.
//! With a shared factor the same cohorts are always recalculated together
//! on a short, fixed cycle, and most start offsets are never used.
//!
//! ```
//! use boidflock_core::systems::{coverage, window_starts_visited};
//!
//! assert!(coverage(50, 11, 50).iter().all(|&n| n == 11));
//! assert_eq!(window_starts_visited(50, 11), 50);
//! assert_eq!(window_starts_visited(50, 10), 5);
//! ```

/// Greatest common divisor. `gcd(0, n) == n`.
pub fn gcd(a: usize, b: usize) -> usize {
    let (mut a, mut b) = (a, b);
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

pub fn is_coprime(a: usize, b: usize) -> bool {
    gcd(a, b) == 1
}

/// Agent indices for one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleWindow {
    /// Agents given recalculate + move, in cursor order.
    pub recalculate: Vec<usize>,
    /// Remaining agents given move only, continuing in cursor order.
    pub move_only: Vec<usize>,
    /// Cursor for the next tick.
    pub next_cursor: usize,
}

/// Split `count` agents into this tick's recalculation window and the
/// move-only remainder. `per_update` is clamped to `count`.
pub fn schedule_window(cursor: usize, per_update: usize, count: usize) -> ScheduleWindow {
    if count == 0 {
        return ScheduleWindow {
            recalculate: Vec::new(),
            move_only: Vec::new(),
            next_cursor: 0,
        };
    }

    let per_update = per_update.min(count);
    let mut cursor = cursor % count;

    let mut recalculate = Vec::with_capacity(per_update);
    for _ in 0..per_update {
        recalculate.push(cursor);
        cursor = (cursor + 1) % count;
    }

    let move_only = (0..count - per_update)
        .map(|offset| (cursor + offset) % count)
        .collect();

    ScheduleWindow {
        recalculate,
        move_only,
        next_cursor: cursor,
    }
}

/// Recalculations received by each agent over `ticks` ticks from cursor 0.
pub fn coverage(count: usize, per_update: usize, ticks: usize) -> Vec<u32> {
    let mut counts = vec![0u32; count];
    let mut cursor = 0;
    for _ in 0..ticks {
        let window = schedule_window(cursor, per_update, count);
        for i in window.recalculate {
            counts[i] += 1;
        }
        cursor = window.next_cursor;
    }
    counts
}

/// Ticks before the window sequence repeats.
pub fn cycle_period(count: usize, per_update: usize) -> usize {
    if count == 0 || per_update == 0 {
        return 0;
    }
    count / gcd(count, per_update.min(count))
}

/// Distinct cursor positions a window ever starts at.
pub fn window_starts_visited(count: usize, per_update: usize) -> usize {
    let mut seen = vec![false; count];
    let mut cursor = 0;
    for _ in 0..count {
        let window = schedule_window(cursor, per_update, count);
        if let Some(&start) = window.recalculate.first() {
            seen[start] = true;
        }
        cursor = window.next_cursor;
    }
    seen.into_iter().filter(|&s| s).count()
}
