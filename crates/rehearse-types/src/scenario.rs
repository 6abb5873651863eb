//! Scenario catalog entry.
//!
//! Scenarios are static reference data seeded by migration: the set of
//! scripted situations a trainee can practice against. They are read at
//! runtime but never mutated.

use crate::Track;
use serde::{Deserialize, Serialize};

/// A catalog entry describing one practice scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Internal database ID.
    pub id: i64,
    /// The track this scenario belongs to.
    pub track: Track,
    /// Display title, e.g. "Delivering critical feedback".
    pub title: String,
    /// Longer description shown before the session starts.
    pub description: String,
    /// Whether the scenario is currently offered.
    pub available: bool,
    /// Allowed role pairings as a JSON array of `[trainee, counterpart]`
    /// label pairs, e.g. `[["manager", "report"]]`.
    #[serde(rename = "rolePairings")]
    pub role_pairings_json: String,
}
