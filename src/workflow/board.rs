use std::mem;

use crate::cache::WorkflowStateCache;
use crate::context::AppContext;
use crate::domain::board::{BoardLayout, BoardView, DragLocation, project};
use crate::domain::ids::{StateId, TicketId};
use crate::domain::ticket::{Ticket, WorkflowState};
use crate::error::{AppError, AppResult};
use crate::services::IssueTrackerService;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Dragging { ticket_id: TicketId },
}

/// End of a drag gesture as reported by the board surface.
#[derive(Debug, Clone)]
pub struct DragEnd {
    pub ticket_id: TicketId,
    pub source: DragLocation,
    /// `None` when the ticket was released outside any container.
    pub destination: Option<DragLocation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    /// Dropped nowhere or back where it started.
    Ignored,
    Aborted { reason: String },
    Moved { ticket_id: TicketId, state_id: StateId },
    /// Persistence failed and the board was re-projected from the last known tickets.
    RolledBack { ticket_id: TicketId },
}

/// A move that has been applied to the view but not yet persisted.
#[derive(Debug)]
struct PendingMove {
    ticket_id: TicketId,
    state_id: StateId,
}

/// Board state for one client: the authoritative ticket list, the layout
/// derived from the workflow states, and the projected view.
///
/// A session only exists once its view has been projected, so drags never
/// see a partially built board.
pub struct BoardSession {
    states: Vec<WorkflowState>,
    layout: BoardLayout,
    tickets: Vec<Ticket>,
    view: BoardView,
    phase: DragPhase,
}

impl BoardSession {
    pub fn new(states: Vec<WorkflowState>, tickets: Vec<Ticket>) -> Self {
        let layout = BoardLayout::from_states(&states);
        let view = project(&tickets, &layout);
        tracing::debug!(
            states = states.len(),
            tickets = tickets.len(),
            "board projected"
        );
        Self {
            states,
            layout,
            tickets,
            view,
            phase: DragPhase::Idle,
        }
    }

    pub fn view(&self) -> &BoardView {
        &self.view
    }

    #[cfg(test)]
    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn layout(&self) -> &BoardLayout {
        &self.layout
    }

    pub fn states(&self) -> &[WorkflowState] {
        &self.states
    }

    #[cfg(test)]
    pub fn phase(&self) -> &DragPhase {
        &self.phase
    }

    /// Swaps in a fresh ticket list and re-projects the view from it.
    pub fn replace_tickets(&mut self, tickets: Vec<Ticket>) {
        self.tickets = tickets;
        self.resync();
    }

    pub fn begin_drag(&mut self, ticket_id: &TicketId) -> AppResult<()> {
        if let DragPhase::Dragging { ticket_id: current } = &self.phase {
            return Err(AppError::Board(format!(
                "ticket {current} is already being dragged"
            )));
        }
        self.phase = DragPhase::Dragging {
            ticket_id: ticket_id.clone(),
        };
        Ok(())
    }

    /// Finishes the drag started with [`BoardSession::begin_drag`]. The view is
    /// updated before the tracker is called and restored if the call fails.
    pub async fn end_drag(
        &mut self,
        tracker: &dyn IssueTrackerService,
        drag: DragEnd,
    ) -> AppResult<DragOutcome> {
        match mem::replace(&mut self.phase, DragPhase::Idle) {
            DragPhase::Dragging { ticket_id } if ticket_id == drag.ticket_id => {}
            DragPhase::Dragging { ticket_id } => {
                return Err(AppError::Board(format!(
                    "drag of ticket {} ended while ticket {ticket_id} was being dragged",
                    drag.ticket_id
                )));
            }
            DragPhase::Idle => {
                return Err(AppError::Board("no drag in progress".to_string()));
            }
        }

        let Some(destination) = drag.destination else {
            return Ok(DragOutcome::Ignored);
        };
        if destination == drag.source {
            return Ok(DragOutcome::Ignored);
        }

        let Some(ticket) = self.tickets.iter().find(|t| t.id == drag.ticket_id).cloned() else {
            tracing::warn!(ticket = %drag.ticket_id, "dragged ticket not found in ticket list");
            return Ok(DragOutcome::Aborted {
                reason: format!("ticket {} not found", drag.ticket_id),
            });
        };

        let located = self.view.locate(&ticket.id).map(|at| at.container);
        if located != Some(drag.source.container) {
            tracing::warn!(
                ticket = %ticket.id,
                source = %drag.source.container,
                "dragged ticket is not in its reported source container"
            );
            return Ok(DragOutcome::Aborted {
                reason: format!(
                    "ticket {} is not in {}",
                    ticket.id, drag.source.container
                ),
            });
        }

        let Some(state_id) = self.layout.canonical_state(destination.container).cloned() else {
            tracing::warn!(
                destination = %destination.container,
                "no workflow state maps to drop target"
            );
            return Ok(DragOutcome::Aborted {
                reason: format!("no workflow state maps to {}", destination.container),
            });
        };

        self.warn_on_disallowed_transition(&ticket, &state_id);

        let pending = PendingMove {
            ticket_id: ticket.id.clone(),
            state_id,
        };
        self.apply_tentative(ticket, drag.source, destination);

        match tracker
            .update_ticket_state(&pending.ticket_id, &pending.state_id)
            .await
        {
            Ok(()) => Ok(self.confirm(pending)),
            Err(err) => {
                tracing::error!(ticket = %pending.ticket_id, error = %err, "failed to persist ticket move");
                Ok(self.compensate(pending))
            }
        }
    }

    fn apply_tentative(&mut self, ticket: Ticket, source: DragLocation, destination: DragLocation) {
        let mut view = self.view.clone();
        if let Some(bucket) = view.bucket_mut(source.container) {
            bucket.retain(|candidate| candidate.id != ticket.id);
        }
        if let Some(bucket) = view.bucket_mut(destination.container) {
            let index = destination.index.min(bucket.len());
            bucket.insert(index, ticket);
        }
        self.view = view;
    }

    fn confirm(&mut self, pending: PendingMove) -> DragOutcome {
        if let Some(ticket) = self.tickets.iter_mut().find(|t| t.id == pending.ticket_id) {
            ticket.state_id = Some(pending.state_id.clone());
        }
        if let Some(ticket) = self.view.ticket_mut(&pending.ticket_id) {
            ticket.state_id = Some(pending.state_id.clone());
        }
        tracing::info!(ticket = %pending.ticket_id, state = %pending.state_id, "ticket moved");
        DragOutcome::Moved {
            ticket_id: pending.ticket_id,
            state_id: pending.state_id,
        }
    }

    fn compensate(&mut self, pending: PendingMove) -> DragOutcome {
        self.resync();
        DragOutcome::RolledBack {
            ticket_id: pending.ticket_id,
        }
    }

    fn resync(&mut self) {
        self.view = project(&self.tickets, &self.layout);
    }

    fn warn_on_disallowed_transition(&self, ticket: &Ticket, target: &StateId) {
        let Some(current) = ticket
            .state_id
            .as_ref()
            .and_then(|id| self.states.iter().find(|state| state.id == *id))
        else {
            return;
        };
        if !current.allows_transition_to(target) {
            tracing::warn!(
                ticket = %ticket.id,
                from = %current.id,
                to = %target,
                "move is outside the workflow of the current state"
            );
        }
    }
}

/// Fetches tickets and workflow states and projects the board. Workflow
/// states come from `cache` unless `refresh` is set or nothing is cached yet.
pub async fn open_session(
    ctx: &AppContext,
    cache: &mut WorkflowStateCache,
    refresh: bool,
) -> AppResult<BoardSession> {
    let states = load_workflow_states(ctx, cache, refresh).await?;
    let tickets = ctx.issue_tracker.list_tickets().await?;
    Ok(BoardSession::new(states, tickets))
}

pub async fn load_workflow_states(
    ctx: &AppContext,
    cache: &mut WorkflowStateCache,
    refresh: bool,
) -> AppResult<Vec<WorkflowState>> {
    let key = ctx
        .config
        .api_base_url
        .as_deref()
        .map(WorkflowStateCache::compute_key);

    if !refresh {
        if let Some(states) = key.as_deref().and_then(|key| cache.get(key)) {
            tracing::debug!(count = states.len(), "using cached workflow states");
            return Ok(states);
        }
    }

    let states = ctx.issue_tracker.list_workflow_states().await?;
    if let Some(key) = key.filter(|_| !states.is_empty()) {
        cache.insert(key, &states);
        if let Err(err) = cache.save() {
            tracing::warn!(path = %cache.path().display(), error = %err, "failed to save workflow state cache");
        }
    }
    Ok(states)
}
