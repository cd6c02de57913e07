//! Records exchanged with the matchmaking backend.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::extensions::Extensions;

/// A player (or party) waiting to be matched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment: Option<Assignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_fields: Option<SearchFields>,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
}

/// Indexed ticket attributes used by pool filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFields {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub double_args: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub string_args: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Connection details handed to the tickets of a match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub connection: String,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

/// A group of tickets the backend proposes to play together.
///
/// Opaque to the director: it is forwarded to the assigner untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub match_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub match_profile: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub match_function: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tickets: Vec<Ticket>,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

impl Match {
    /// Ids of every ticket in this match, in order.
    pub fn ticket_ids(&self) -> Vec<String> {
        self.tickets.iter().map(|t| t.id.clone()).collect()
    }
}

/// Tickets paired with the assignment they should receive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignmentGroup {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ticket_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment: Option<Assignment>,
}

/// Describes which matches to request from the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pools: Vec<Pool>,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

/// A set of filters selecting tickets for a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub double_range_filters: Vec<DoubleRangeFilter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub string_equals_filters: Vec<StringEqualsFilter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_present_filters: Vec<TagPresentFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_before: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_after: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoubleRangeFilter {
    pub double_arg: String,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringEqualsFilter {
    pub string_arg: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPresentFilter {
    pub tag: String,
}

/// Transport used to reach the match function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionKind {
    #[default]
    Grpc,
    Rest,
}

/// Identifies the match function the backend should invoke.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub kind: FunctionKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchMatchesRequest {
    pub config: FunctionConfig,
    pub profile: MatchProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchMatchesResponse {
    pub r#match: Match,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignTicketsRequest {
    pub assignments: Vec<AssignmentGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignTicketsResponse {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<AssignmentFailure>,
}

/// A ticket the backend could not assign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentFailure {
    pub ticket_id: String,
    pub cause: FailureCause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    Unknown,
    TicketNotFound,
}
