//! Matchmaking backend abstraction.
//!
//! The backend forms matches and records assignments. The director only talks
//! to it through the `Backend` trait, so the transport (gRPC, in-process mock)
//! is chosen by whoever embeds the director.

mod status;
mod types;

pub use status::{Code, Status};
pub use types::*;

use async_trait::async_trait;
use futures::stream::BoxStream;

/// Stream of match records returned by a fetch call.
///
/// The stream ending is the normal end-of-stream marker; an `Err` item is a
/// failure while receiving.
pub type MatchStream = BoxStream<'static, Result<FetchMatchesResponse, Status>>;

/// Calls the director makes against the matchmaking backend.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Open a server-streaming fetch for the given profile.
    async fn fetch_matches(&self, request: FetchMatchesRequest) -> Result<MatchStream, Status>;

    /// Record assignments for the given ticket groups.
    async fn assign_tickets(
        &self,
        request: AssignTicketsRequest,
    ) -> Result<AssignTicketsResponse, Status>;
}
