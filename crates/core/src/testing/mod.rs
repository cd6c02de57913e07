//! Testing utilities and mock implementations.
//!
//! Mock implementations of the backend and assigner traits, so a director can
//! be driven end to end without a real matchmaking deployment.
//!
//! # Example
//!
//! ```rust,ignore
//! use omtools_core::testing::{fixtures, MockAssigner, MockBackend};
//!
//! let backend = Arc::new(MockBackend::new());
//! let assigner = Arc::new(MockAssigner::new());
//!
//! // Configure mock responses
//! backend.push_fetch_ok(vec![fixtures::match_record("m1")]).await;
//!
//! // Build a Director over them...
//! ```

mod mock_assigner;
mod mock_backend;

pub use mock_assigner::MockAssigner;
pub use mock_backend::MockBackend;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, Utc};

    use crate::backend::{
        FunctionConfig, FunctionKind, Match, MatchProfile, Pool, TagPresentFilter, Ticket,
    };

    /// Create a profile with a single tag-filtered pool.
    pub fn match_profile(name: &str) -> MatchProfile {
        MatchProfile {
            name: name.to_string(),
            pools: vec![Pool {
                name: format!("{}-pool", name),
                tag_present_filters: vec![TagPresentFilter {
                    tag: "mode.ranked".to_string(),
                }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    /// Create a match function config pointing at a local gRPC function.
    pub fn function_config() -> FunctionConfig {
        FunctionConfig {
            host: "mmf.local".to_string(),
            port: 50502,
            kind: FunctionKind::Grpc,
        }
    }

    /// Create a match with no tickets.
    pub fn match_record(match_id: &str) -> Match {
        Match {
            match_id: match_id.to_string(),
            match_profile: "test-profile".to_string(),
            match_function: "test-mmf".to_string(),
            ..Default::default()
        }
    }

    /// Create a match holding tickets with the given ids.
    pub fn match_with_tickets(match_id: &str, ticket_ids: &[&str]) -> Match {
        Match {
            tickets: ticket_ids.iter().map(|id| ticket(id, None)).collect(),
            ..match_record(match_id)
        }
    }

    /// Create a ticket, optionally with a creation time.
    pub fn ticket(id: &str, create_time: Option<DateTime<Utc>>) -> Ticket {
        Ticket {
            id: id.to_string(),
            create_time,
            ..Default::default()
        }
    }
}
