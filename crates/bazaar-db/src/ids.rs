//! # Clock and Identifier Generation
//!
//! The two sources of nondeterminism in this crate, behind trait seams so
//! tests can pin them down.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Production                      Tests                                  │
//! │  ──────────                      ─────                                  │
//! │  SystemClock (Utc::now)          FixedClock (a chosen instant)          │
//! │  TimestampOrderNumbers           FixedOrderNumbers / sequences          │
//! │  (ORD + unix millis)             (deterministic values)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both are held by [`Database`](crate::Database) and handed to the
//! repositories, so no repository ever calls `Utc::now()` directly.

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use uuid::Uuid;

// =============================================================================
// Clock
// =============================================================================

/// Source of "now" for created/updated timestamps.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// The production clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// =============================================================================
// Order Numbers
// =============================================================================

/// Generates the human-readable order numbers customers quote.
///
/// Implementations must produce globally unique values; the order engine
/// treats a collision as fatal rather than retrying.
pub trait OrderNumberGenerator: Send + Sync + Debug {
    fn next(&self, now: DateTime<Utc>) -> String;
}

/// Time-derived order numbers: `ORD` + unix milliseconds.
///
/// Example: `ORD1754464158123`. Monotonic for any realistic order rate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimestampOrderNumbers;

impl OrderNumberGenerator for TimestampOrderNumbers {
    fn next(&self, now: DateTime<Utc>) -> String {
        format!("ORD{}", now.timestamp_millis())
    }
}

// =============================================================================
// Row Ids
// =============================================================================

/// Generates a fresh row id (UUID v4).
pub fn new_row_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Test Fakes
// =============================================================================


// =============================================================================
// Unit Tests
// =============================================================================
