use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ids::{StateId, TicketId};
use crate::domain::ticket::{Ticket, WorkflowState};
use crate::error::{AppError, AppResult};
use crate::services::IssueTrackerService;

/// In-memory tracker that records every update and can be told to reject them.
#[derive(Default)]
pub struct FakeTracker {
    pub states: Vec<WorkflowState>,
    pub tickets: Mutex<Vec<Ticket>>,
    pub state_updates: Mutex<Vec<(TicketId, StateId)>>,
    pub parent_updates: Mutex<Vec<(TicketId, Option<TicketId>)>>,
    pub fail_updates: bool,
}

impl FakeTracker {
    pub fn new(states: Vec<WorkflowState>, tickets: Vec<Ticket>) -> Self {
        Self {
            states,
            tickets: Mutex::new(tickets),
            ..Self::default()
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail_updates = true;
        self
    }

    pub fn state_updates(&self) -> Vec<(TicketId, StateId)> {
        self.state_updates.lock().unwrap().clone()
    }

    pub fn parent_updates(&self) -> Vec<(TicketId, Option<TicketId>)> {
        self.parent_updates.lock().unwrap().clone()
    }

    fn check_failure(&self) -> AppResult<()> {
        if self.fail_updates {
            return Err(AppError::IssueTracker(
                "API responded with 500 Internal Server Error".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl IssueTrackerService for FakeTracker {
    async fn list_tickets(&self) -> AppResult<Vec<Ticket>> {
        Ok(self.tickets.lock().unwrap().clone())
    }

    async fn list_workflow_states(&self) -> AppResult<Vec<WorkflowState>> {
        Ok(self.states.clone())
    }

    async fn update_ticket_state(&self, ticket: &TicketId, state: &StateId) -> AppResult<()> {
        self.state_updates
            .lock()
            .unwrap()
            .push((ticket.clone(), state.clone()));
        self.check_failure()?;
        if let Some(stored) = self
            .tickets
            .lock()
            .unwrap()
            .iter_mut()
            .find(|stored| stored.id == *ticket)
        {
            stored.state_id = Some(state.clone());
        }
        Ok(())
    }

    async fn update_ticket_parent(
        &self,
        ticket: &TicketId,
        parent: Option<&TicketId>,
    ) -> AppResult<()> {
        self.parent_updates
            .lock()
            .unwrap()
            .push((ticket.clone(), parent.cloned()));
        self.check_failure()?;
        if let Some(stored) = self
            .tickets
            .lock()
            .unwrap()
            .iter_mut()
            .find(|stored| stored.id == *ticket)
        {
            stored.parent_ticket_id = parent.cloned();
        }
        Ok(())
    }
}
