use async_trait::async_trait;

use crate::domain::ids::{StateId, TicketId};
use crate::domain::ticket::{Ticket, WorkflowState};
use crate::error::AppResult;

#[async_trait]
pub trait IssueTrackerService: Send + Sync {
    async fn list_tickets(&self) -> AppResult<Vec<Ticket>>;
    async fn list_workflow_states(&self) -> AppResult<Vec<WorkflowState>>;
    async fn update_ticket_state(&self, ticket: &TicketId, state: &StateId) -> AppResult<()>;
    /// `None` clears the parent.
    async fn update_ticket_parent(
        &self,
        ticket: &TicketId,
        parent: Option<&TicketId>,
    ) -> AppResult<()>;
}
