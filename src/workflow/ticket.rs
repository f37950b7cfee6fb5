use crate::context::AppContext;
use crate::domain::ids::TicketId;
use crate::domain::ticket::parent_chain_has_cycle;
use crate::error::{AppError, AppResult};

pub struct ParentChangeOutcome {
    pub ticket: TicketId,
    pub parent: Option<TicketId>,
}

pub async fn change_parent(
    ctx: &AppContext,
    ticket: TicketId,
    parent: Option<TicketId>,
) -> AppResult<ParentChangeOutcome> {
    let tickets = ctx.issue_tracker.list_tickets().await?;

    if !tickets.iter().any(|candidate| candidate.id == ticket) {
        return Err(AppError::IssueTracker(format!("ticket {ticket} not found")));
    }

    if let Some(parent) = &parent {
        if !tickets.iter().any(|candidate| candidate.id == *parent) {
            return Err(AppError::IssueTracker(format!(
                "parent ticket {parent} not found"
            )));
        }
        if parent_chain_has_cycle(&tickets, &ticket, parent) {
            return Err(AppError::Board(format!(
                "making {parent} the parent of {ticket} would create a cycle"
            )));
        }
    }

    ctx.issue_tracker
        .update_ticket_parent(&ticket, parent.as_ref())
        .await?;
    tracing::info!(%ticket, parent = ?parent.as_ref().map(TicketId::as_str), "parent updated");

    Ok(ParentChangeOutcome { ticket, parent })
}
