//! Mock assigner for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::backend::{Assignment, AssignmentGroup, Match};
use crate::director::{Assigner, AssignerError};

/// Mock implementation of the Assigner trait.
///
/// Produces one assignment group per match, with the connection
/// `<connection>/<match_id>`, and records the match ids of every call.
#[derive(Debug, Clone)]
pub struct MockAssigner {
    /// Match ids passed to each call, in call order.
    calls: Arc<RwLock<Vec<Vec<String>>>>,
    /// If set, the next call will fail with this error.
    next_error: Arc<RwLock<Option<AssignerError>>>,
    /// Connection prefix for produced assignments.
    connection: Arc<RwLock<String>>,
}

impl Default for MockAssigner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAssigner {
    /// Create a new mock assigner.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            connection: Arc::new(RwLock::new("gameserver:7777".to_string())),
        }
    }

    /// Make the next call fail.
    pub async fn set_next_error(&self, error: AssignerError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set the connection prefix for produced assignments.
    pub async fn set_connection(&self, connection: &str) {
        *self.connection.write().await = connection.to_string();
    }

    /// Number of calls made.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Match ids passed to each call.
    pub async fn calls(&self) -> Vec<Vec<String>> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl Assigner for MockAssigner {
    async fn assign(&self, matches: &[Match]) -> Result<Vec<AssignmentGroup>, AssignerError> {
        self.calls
            .write()
            .await
            .push(matches.iter().map(|m| m.match_id.clone()).collect());

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let connection = self.connection.read().await.clone();
        Ok(matches
            .iter()
            .map(|m| AssignmentGroup {
                ticket_ids: m.ticket_ids(),
                assignment: Some(Assignment {
                    connection: format!("{}/{}", connection, m.match_id),
                    ..Default::default()
                }),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_one_group_per_match() {
        let assigner = MockAssigner::new();
        let groups = assigner
            .assign(&[fixtures::match_with_tickets("m1", &["a", "b"])])
            .await
            .unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].ticket_ids, vec!["a", "b"]);
        assert_eq!(
            groups[0].assignment.as_ref().unwrap().connection,
            "gameserver:7777/m1"
        );
        assert_eq!(assigner.calls().await, vec![vec!["m1".to_string()]]);
    }

    #[tokio::test]
    async fn test_next_error_is_consumed() {
        let assigner = MockAssigner::new();
        assigner
            .set_next_error(AssignerError::NoCapacity("full".into()))
            .await;

        assert!(assigner.assign(&[]).await.is_err());
        assert!(assigner.assign(&[]).await.is_ok());
        assert_eq!(assigner.call_count().await, 2);
    }
}
