use crate::cache::WorkflowStateCache;
use crate::context::AppContext;
use crate::domain::board::{ContainerId, DragLocation};
use crate::domain::ids::TicketId;
use crate::error::{AppError, AppResult};
use crate::workflow::board::{BoardSession, DragEnd, DragOutcome, open_session};
use crate::workflow::ticket::{ParentChangeOutcome, change_parent};

#[derive(Debug, Clone)]
pub struct MoveCommandArgs {
    pub ticket: TicketId,
    pub destination: ContainerId,
    pub index: Option<usize>,
    pub refresh: bool,
}

#[derive(Debug, Clone)]
pub struct ParentCommandArgs {
    pub ticket: TicketId,
    pub parent: Option<TicketId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReport {
    pub outcome: DragOutcome,
    /// Where the board shows the ticket once the move has settled.
    pub placed_in: Option<ContainerId>,
}

pub async fn run_move(ctx: &AppContext, args: MoveCommandArgs) -> AppResult<MoveReport> {
    let mut cache = WorkflowStateCache::load()?;
    let mut session = open_session(ctx, &mut cache, args.refresh).await?;
    move_and_refresh(ctx, &mut session, args).await
}

/// Runs the move, then re-projects from the tracker's ticket list after a
/// successful write so the reported placement matches what the board shows.
pub async fn move_and_refresh(
    ctx: &AppContext,
    session: &mut BoardSession,
    args: MoveCommandArgs,
) -> AppResult<MoveReport> {
    let ticket = args.ticket.clone();
    let outcome = move_ticket(ctx, session, args).await?;
    if matches!(outcome, DragOutcome::Moved { .. }) {
        session.replace_tickets(ctx.issue_tracker.list_tickets().await?);
    }
    let placed_in = session.view().locate(&ticket).map(|at| at.container);
    Ok(MoveReport { outcome, placed_in })
}

/// Replays a move as a single drag gesture: picked up where the board shows the
/// ticket, dropped at `index` in the destination (end of the bucket when unset).
pub async fn move_ticket(
    ctx: &AppContext,
    session: &mut BoardSession,
    args: MoveCommandArgs,
) -> AppResult<DragOutcome> {
    let source = session.view().locate(&args.ticket).ok_or_else(|| {
        AppError::Board(format!("ticket {} is not on the board", args.ticket))
    })?;

    let bucket_len = session
        .view()
        .tickets_in(args.destination)
        .map(<[_]>::len)
        .ok_or_else(|| AppError::Board(format!("{} is not on the board", args.destination)))?;
    let index = args.index.unwrap_or(bucket_len);

    session.begin_drag(&args.ticket)?;
    session
        .end_drag(
            ctx.issue_tracker.as_ref(),
            DragEnd {
                ticket_id: args.ticket,
                source,
                destination: Some(DragLocation::new(args.destination, index)),
            },
        )
        .await
}

pub async fn run_parent(ctx: &AppContext, args: ParentCommandArgs) -> AppResult<ParentChangeOutcome> {
    change_parent(ctx, args.ticket, args.parent).await
}

pub fn describe_outcome(outcome: &DragOutcome) -> String {
    match outcome {
        DragOutcome::Ignored => "Nothing to do: the ticket is already there.".to_string(),
        DragOutcome::Aborted { reason } => format!("Move aborted: {reason}."),
        DragOutcome::Moved {
            ticket_id,
            state_id,
        } => format!("Ticket {ticket_id} moved to state {state_id}."),
        DragOutcome::RolledBack { ticket_id } => {
            format!("Ticket {ticket_id} could not be saved; the board was restored.")
        }
    }
}

pub fn describe_report(report: &MoveReport) -> String {
    let summary = describe_outcome(&report.outcome);
    match (&report.outcome, report.placed_in) {
        (DragOutcome::Moved { .. }, Some(container)) => {
            format!("{summary} It now shows in {container}.")
        }
        _ => summary,
    }
}
