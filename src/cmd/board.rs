use std::fmt::Write as _;

use crate::cache::WorkflowStateCache;
use crate::context::AppContext;
use crate::domain::board::{BoardView, ContainerId};
use crate::domain::ticket::{Ticket, WorkflowState};
use crate::error::AppResult;
use crate::workflow::board::{BoardSession, load_workflow_states, open_session};

#[derive(Debug, Clone)]
pub struct BoardCommandArgs {
    pub refresh: bool,
}

pub async fn run(ctx: &AppContext, args: BoardCommandArgs) -> AppResult<String> {
    let mut cache = WorkflowStateCache::load()?;
    let session = open_session(ctx, &mut cache, args.refresh).await?;
    Ok(render_board(session.view()))
}

pub async fn run_states(ctx: &AppContext, args: BoardCommandArgs) -> AppResult<String> {
    let mut cache = WorkflowStateCache::load()?;
    let states = load_workflow_states(ctx, &mut cache, args.refresh).await?;
    let session = BoardSession::new(states, Vec::new());
    Ok(render_states(&session))
}

pub fn render_board(view: &BoardView) -> String {
    if view.is_empty() {
        return "No workflow states configured; the board is empty.\n".to_string();
    }

    let mut out = String::new();
    for column in &view.columns {
        let count = column.tickets.len()
            + column
                .swimlanes
                .iter()
                .map(|lane| lane.tickets.len())
                .sum::<usize>();
        let _ = writeln!(out, "{} [{}] ({count})", column.id.title(), column.id.as_str());
        for ticket in &column.tickets {
            let _ = writeln!(out, "  {}", ticket_line(ticket));
        }
        for lane in &column.swimlanes {
            let _ = writeln!(
                out,
                "  {} [{}] ({})",
                lane.id.title(),
                lane.id.as_str(),
                lane.tickets.len()
            );
            for ticket in &lane.tickets {
                let _ = writeln!(out, "    {}", ticket_line(ticket));
            }
        }
    }
    let _ = writeln!(out, "{} tickets on the board", view.total_tickets());
    out
}

fn ticket_line(ticket: &Ticket) -> String {
    let title = if ticket.title.trim().is_empty() {
        "(untitled)"
    } else {
        ticket.title.trim()
    };
    match ticket.story_points {
        Some(points) => format!("#{} {title} ({points} pts)", ticket.id),
        None => format!("#{} {title}", ticket.id),
    }
}

pub fn render_states(session: &BoardSession) -> String {
    let states: &[WorkflowState] = session.states();
    if states.is_empty() {
        return "No workflow states configured.\n".to_string();
    }

    let mut out = String::new();
    for state in states {
        let container = session
            .layout()
            .container_for(&state.id)
            .unwrap_or(ContainerId::BACKLOG);
        let transitions = if state.workflow.is_empty() {
            "any".to_string()
        } else {
            state
                .workflow
                .iter()
                .map(|id| id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let _ = writeln!(
            out,
            "{:>4}  {:<16} {:<7} {:<15} -> {transitions}",
            state.id.as_str(),
            state.name,
            state.disposition.as_str(),
            container.as_str(),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::StateId;

    fn states() -> Vec<WorkflowState> {
        let mut closed = WorkflowState::new(StateId::well_known(5), "Closed");
        closed.disposition = crate::domain::ticket::Disposition::Closed;
        closed.workflow = vec![StateId::well_known(2)];
        vec![
            WorkflowState::new(StateId::well_known(1), "Created"),
            WorkflowState::new(StateId::well_known(2), "To Do"),
            closed,
        ]
    }

    #[test]
    fn renders_columns_and_lanes() {
        let mut sized = Ticket::new("3", "Write docs", Some(StateId::well_known(2)));
        sized.story_points = Some(3.0);
        let tickets = vec![
            Ticket::new("1", "Set up CI", Some(StateId::well_known(1))),
            sized,
            Ticket::new("9", " ", Some(StateId::well_known(5))),
        ];
        let session = BoardSession::new(states(), tickets);
        let rendered = render_board(session.view());

        assert!(rendered.contains("Backlog [backlog] (1)\n  #1 Set up CI\n"));
        assert!(rendered.contains("To Do [todo] (1)\n  #3 Write docs (3 pts)\n"));
        assert!(rendered.contains("Done [done] (1)\n  Completed [done-completed] (1)\n    #9 (untitled)\n"));
        assert!(rendered.contains("  Duplicate [done-duplicate] (0)\n"));
        assert!(rendered.ends_with("3 tickets on the board\n"));
    }

    #[test]
    fn renders_empty_board() {
        let session = BoardSession::new(Vec::new(), vec![Ticket::new("1", "Orphan", None)]);
        assert!(render_board(session.view()).starts_with("No workflow states"));
    }

    #[test]
    fn renders_state_placement() {
        let session = BoardSession::new(states(), Vec::new());
        let rendered = render_states(&session);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Created") && lines[0].contains("backlog") && lines[0].ends_with("-> any"));
        assert!(lines[2].contains("closed") && lines[2].contains("done-completed") && lines[2].ends_with("-> 2"));
    }
}
