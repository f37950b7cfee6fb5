//! Column and swimlane projection of the flat ticket list.
//!
//! The board has four fixed columns. `done` is further split into swimlanes so
//! that completed, abandoned and duplicate work can share a column while staying
//! distinguishable. Workflow states are placed into containers through a fixed
//! table keyed by the seeded state ids; anything the table does not know about
//! lands in `backlog`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::ids::{StateId, TicketId};
use crate::domain::ticket::{Ticket, WorkflowState};
use crate::error::AppError;

const SWIMLANE_SEPARATOR: char = '-';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnId {
    Backlog,
    Todo,
    InProgress,
    Done,
}

impl ColumnId {
    /// Display order, left to right.
    pub const ORDER: [ColumnId; 4] = [
        ColumnId::Backlog,
        ColumnId::Todo,
        ColumnId::InProgress,
        ColumnId::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnId::Backlog => "backlog",
            ColumnId::Todo => "todo",
            ColumnId::InProgress => "inprogress",
            ColumnId::Done => "done",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ColumnId::Backlog => "Backlog",
            ColumnId::Todo => "To Do",
            ColumnId::InProgress => "In Progress",
            ColumnId::Done => "Done",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_lowercase();
        ColumnId::ORDER
            .into_iter()
            .find(|column| column.as_str() == value)
    }

    pub fn swimlanes(&self) -> &'static [SwimlaneId] {
        match self {
            ColumnId::Done => &SwimlaneId::ALL,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SwimlaneId {
    Completed,
    WontFix,
    Duplicate,
}

impl SwimlaneId {
    pub const ALL: [SwimlaneId; 3] = [
        SwimlaneId::Completed,
        SwimlaneId::WontFix,
        SwimlaneId::Duplicate,
    ];

    pub fn column(&self) -> ColumnId {
        ColumnId::Done
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SwimlaneId::Completed => "done-completed",
            SwimlaneId::WontFix => "done-wontfix",
            SwimlaneId::Duplicate => "done-duplicate",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SwimlaneId::Completed => "Completed",
            SwimlaneId::WontFix => "Won't Fix",
            SwimlaneId::Duplicate => "Duplicate",
        }
    }
}

/// A drop target: either a plain column or a swimlane inside one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContainerId {
    Column(ColumnId),
    Swimlane(SwimlaneId),
}

impl ContainerId {
    pub const BACKLOG: ContainerId = ContainerId::Column(ColumnId::Backlog);

    pub fn column(&self) -> ColumnId {
        match self {
            ContainerId::Column(column) => *column,
            ContainerId::Swimlane(lane) => lane.column(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerId::Column(column) => column.as_str(),
            ContainerId::Swimlane(lane) => lane.as_str(),
        }
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim().to_lowercase();
        let unknown = || AppError::Board(format!("unknown column or swimlane '{value}'"));

        match value.split_once(SWIMLANE_SEPARATOR) {
            Some((column, _)) => {
                let column = ColumnId::parse(column).ok_or_else(unknown)?;
                column
                    .swimlanes()
                    .iter()
                    .find(|lane| lane.as_str() == value)
                    .map(|lane| ContainerId::Swimlane(*lane))
                    .ok_or_else(unknown)
            }
            None => ColumnId::parse(&value)
                .map(ContainerId::Column)
                .ok_or_else(unknown),
        }
    }
}

/// Position of a ticket inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragLocation {
    pub container: ContainerId,
    pub index: usize,
}

impl DragLocation {
    pub fn new(container: ContainerId, index: usize) -> Self {
        Self { container, index }
    }
}

/// Placement of the seeded workflow states: Created, To Do, In Progress,
/// In Review, Closed, Won't Fix, Duplicate.
const PLACEMENT: [(u8, ContainerId); 7] = [
    (1, ContainerId::Column(ColumnId::Backlog)),
    (2, ContainerId::Column(ColumnId::Todo)),
    (3, ContainerId::Column(ColumnId::InProgress)),
    (4, ContainerId::Column(ColumnId::InProgress)),
    (5, ContainerId::Swimlane(SwimlaneId::Completed)),
    (6, ContainerId::Swimlane(SwimlaneId::WontFix)),
    (7, ContainerId::Swimlane(SwimlaneId::Duplicate)),
];

fn placement_for(state: &StateId) -> ContainerId {
    PLACEMENT
        .iter()
        .find(|(seed, _)| StateId::well_known(*seed) == *state)
        .map(|(_, container)| *container)
        .unwrap_or(ContainerId::BACKLOG)
}

/// Static skeleton of the board plus both lookup directions between workflow
/// states and containers. Rebuilt whenever the workflow state list changes.
#[derive(Debug, Clone, Default)]
pub struct BoardLayout {
    state_ids: HashMap<ContainerId, Vec<StateId>>,
    state_to_container: HashMap<StateId, ContainerId>,
    container_to_state: HashMap<ContainerId, StateId>,
}

impl BoardLayout {
    pub fn from_states(states: &[WorkflowState]) -> Self {
        let mut layout = Self::default();
        if states.is_empty() {
            return layout;
        }

        for column in ColumnId::ORDER {
            layout.state_ids.insert(ContainerId::Column(column), Vec::new());
            for lane in column.swimlanes() {
                layout.state_ids.insert(ContainerId::Swimlane(*lane), Vec::new());
            }
        }

        for state in states {
            let container = placement_for(&state.id);
            layout.state_to_container.insert(state.id.clone(), container);
            layout.assign(container, &state.id);
            if let ContainerId::Swimlane(lane) = container {
                layout.assign(ContainerId::Column(lane.column()), &state.id);
            }
        }

        layout
    }

    fn assign(&mut self, container: ContainerId, state: &StateId) {
        let ids = self.state_ids.entry(container).or_default();
        if !ids.contains(state) {
            ids.push(state.clone());
        }
        // First state assigned to a container is the one written back on drop.
        self.container_to_state
            .entry(container)
            .or_insert_with(|| state.clone());
    }

    pub fn is_empty(&self) -> bool {
        self.state_ids.is_empty()
    }

    /// Container a state is shown in, if the state is known to the layout.
    pub fn container_for(&self, state: &StateId) -> Option<ContainerId> {
        self.state_to_container.get(state).copied()
    }

    /// State written to a ticket dropped into `container`.
    pub fn canonical_state(&self, container: ContainerId) -> Option<&StateId> {
        self.container_to_state.get(&container)
    }

    pub fn state_ids(&self, container: ContainerId) -> &[StateId] {
        self.state_ids
            .get(&container)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn skeleton(&self) -> BoardView {
        if self.is_empty() {
            return BoardView::default();
        }

        let columns = ColumnId::ORDER
            .into_iter()
            .map(|column| Column {
                id: column,
                state_ids: self.state_ids(ContainerId::Column(column)).to_vec(),
                tickets: Vec::new(),
                swimlanes: column
                    .swimlanes()
                    .iter()
                    .map(|lane| Swimlane {
                        id: *lane,
                        state_ids: self.state_ids(ContainerId::Swimlane(*lane)).to_vec(),
                        tickets: Vec::new(),
                    })
                    .collect(),
            })
            .collect();

        BoardView { columns }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub id: ColumnId,
    pub state_ids: Vec<StateId>,
    /// Tickets held directly by the column. Columns with swimlanes keep their
    /// tickets in the lanes instead.
    pub tickets: Vec<Ticket>,
    pub swimlanes: Vec<Swimlane>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Swimlane {
    pub id: SwimlaneId,
    pub state_ids: Vec<StateId>,
    pub tickets: Vec<Ticket>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardView {
    pub columns: Vec<Column>,
}

impl BoardView {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Every bucket in display order, lanes directly after their column.
    pub fn buckets(&self) -> impl Iterator<Item = (ContainerId, &[Ticket])> {
        self.columns.iter().flat_map(|column| {
            std::iter::once((ContainerId::Column(column.id), column.tickets.as_slice())).chain(
                column
                    .swimlanes
                    .iter()
                    .map(|lane| (ContainerId::Swimlane(lane.id), lane.tickets.as_slice())),
            )
        })
    }

    pub fn tickets_in(&self, container: ContainerId) -> Option<&[Ticket]> {
        self.buckets()
            .find(|(id, _)| *id == container)
            .map(|(_, tickets)| tickets)
    }

    pub fn total_tickets(&self) -> usize {
        self.buckets().map(|(_, tickets)| tickets.len()).sum()
    }

    pub fn locate(&self, ticket_id: &TicketId) -> Option<DragLocation> {
        self.buckets().find_map(|(container, tickets)| {
            tickets
                .iter()
                .position(|ticket| ticket.id == *ticket_id)
                .map(|index| DragLocation::new(container, index))
        })
    }

    pub(crate) fn bucket_mut(&mut self, container: ContainerId) -> Option<&mut Vec<Ticket>> {
        let column = self
            .columns
            .iter_mut()
            .find(|column| column.id == container.column())?;
        match container {
            ContainerId::Column(_) => Some(&mut column.tickets),
            ContainerId::Swimlane(lane) => column
                .swimlanes
                .iter_mut()
                .find(|candidate| candidate.id == lane)
                .map(|lane| &mut lane.tickets),
        }
    }

    pub(crate) fn ticket_mut(&mut self, ticket_id: &TicketId) -> Option<&mut Ticket> {
        self.columns.iter_mut().find_map(|column| {
            column
                .tickets
                .iter_mut()
                .chain(column.swimlanes.iter_mut().flat_map(|lane| lane.tickets.iter_mut()))
                .find(|ticket| ticket.id == *ticket_id)
        })
    }
}

/// Partitions `tickets` into the layout's buckets by state, preserving source
/// order inside each bucket. Tickets without a known state go to `backlog`.
pub fn project(tickets: &[Ticket], layout: &BoardLayout) -> BoardView {
    let mut view = layout.skeleton();
    if view.is_empty() {
        return view;
    }

    for ticket in tickets {
        let container = ticket
            .state_id
            .as_ref()
            .and_then(|state| layout.container_for(state))
            .unwrap_or(ContainerId::BACKLOG);
        if let Some(bucket) = view.bucket_mut(container) {
            bucket.push(ticket.clone());
        }
    }

    view
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(id: u8, name: &str) -> WorkflowState {
        WorkflowState::new(StateId::well_known(id), name)
    }

    fn seeded_states() -> Vec<WorkflowState> {
        vec![
            state(1, "Created"),
            state(2, "To Do"),
            state(3, "In Progress"),
            state(4, "In Review"),
            state(5, "Closed"),
            state(6, "Won't Fix"),
            state(7, "Duplicate"),
        ]
    }

    fn ticket(id: &str, state: &str) -> Ticket {
        Ticket::new(id, format!("Ticket {id}"), Some(StateId::from(state)))
    }

    fn ids(tickets: &[Ticket]) -> Vec<&str> {
        tickets.iter().map(|ticket| ticket.id.as_str()).collect()
    }

    #[test]
    fn parses_container_ids() {
        assert_eq!(
            "inprogress".parse::<ContainerId>().unwrap(),
            ContainerId::Column(ColumnId::InProgress)
        );
        assert_eq!(
            "done-wontfix".parse::<ContainerId>().unwrap(),
            ContainerId::Swimlane(SwimlaneId::WontFix)
        );
        assert_eq!(
            "Done".parse::<ContainerId>().unwrap(),
            ContainerId::Column(ColumnId::Done)
        );
        assert!("done-archived".parse::<ContainerId>().is_err());
        assert!("todo-later".parse::<ContainerId>().is_err());
        assert!("review".parse::<ContainerId>().is_err());
    }

    #[test]
    fn places_seeded_states() {
        let layout = BoardLayout::from_states(&seeded_states());
        let in_progress = ContainerId::Column(ColumnId::InProgress);

        assert_eq!(
            layout.state_ids(in_progress),
            &[StateId::well_known(3), StateId::well_known(4)]
        );
        assert_eq!(layout.canonical_state(in_progress), Some(&StateId::well_known(3)));
        assert_eq!(
            layout.container_for(&StateId::well_known(6)),
            Some(ContainerId::Swimlane(SwimlaneId::WontFix))
        );
        assert_eq!(
            layout.state_ids(ContainerId::Column(ColumnId::Done)),
            &[
                StateId::well_known(5),
                StateId::well_known(6),
                StateId::well_known(7)
            ]
        );
        assert_eq!(
            layout.canonical_state(ContainerId::Column(ColumnId::Done)),
            Some(&StateId::well_known(5))
        );
    }

    #[test]
    fn unknown_states_fall_back_to_backlog() {
        let mut states = seeded_states();
        states.push(state(42, "Blocked"));
        states.push(WorkflowState::new(StateId::from("64f1c2"), "Imported"));
        let layout = BoardLayout::from_states(&states);

        assert_eq!(
            layout.container_for(&StateId::well_known(42)),
            Some(ContainerId::BACKLOG)
        );
        assert_eq!(
            layout.state_ids(ContainerId::BACKLOG),
            &[
                StateId::well_known(1),
                StateId::well_known(42),
                StateId::from("64f1c2")
            ]
        );
        assert_eq!(
            layout.canonical_state(ContainerId::BACKLOG),
            Some(&StateId::well_known(1))
        );
    }

    #[test]
    fn first_assigned_state_is_canonical() {
        let states = vec![state(9, "Triage"), state(1, "Created")];
        let layout = BoardLayout::from_states(&states);
        assert_eq!(
            layout.canonical_state(ContainerId::BACKLOG),
            Some(&StateId::well_known(9))
        );
    }

    #[test]
    fn empty_state_list_gives_empty_board() {
        let layout = BoardLayout::from_states(&[]);
        assert!(layout.is_empty());

        let view = project(&[ticket("1", "1")], &layout);
        assert!(view.is_empty());
        assert_eq!(view.total_tickets(), 0);
    }

    #[test]
    fn every_ticket_lands_in_exactly_one_bucket() {
        let layout = BoardLayout::from_states(&seeded_states());
        let tickets = vec![
            ticket("1", "1"),
            ticket("2", "4"),
            ticket("3", "5"),
            ticket("4", "7"),
            ticket("5", "99"),
            Ticket::new("6", "No state", None),
        ];
        let view = project(&tickets, &layout);

        assert_eq!(view.total_tickets(), tickets.len());
        for ticket in &tickets {
            let hits = view
                .buckets()
                .filter(|(_, bucket)| bucket.iter().any(|t| t.id == ticket.id))
                .count();
            assert_eq!(hits, 1, "ticket {} placed {hits} times", ticket.id);
        }

        let backlog = view.tickets_in(ContainerId::BACKLOG).unwrap();
        assert_eq!(ids(backlog), vec!["1", "5", "6"]);
        assert!(view.tickets_in(ContainerId::Column(ColumnId::Done)).unwrap().is_empty());
        assert_eq!(
            view.locate(&TicketId::from("4")),
            Some(DragLocation::new(ContainerId::Swimlane(SwimlaneId::Duplicate), 0))
        );
    }

    #[test]
    fn projection_is_stable_and_idempotent() {
        let layout = BoardLayout::from_states(&seeded_states());
        let tickets = vec![
            ticket("10", "3"),
            ticket("11", "2"),
            ticket("12", "4"),
            ticket("13", "3"),
        ];

        let first = project(&tickets, &layout);
        let second = project(&tickets, &layout);
        assert_eq!(first, second);

        let in_progress = first
            .tickets_in(ContainerId::Column(ColumnId::InProgress))
            .unwrap();
        assert_eq!(ids(in_progress), vec!["10", "12", "13"]);
    }

    #[test]
    fn places_ticket_from_minimal_state_list() {
        let states = vec![state(1, "Created"), state(5, "Closed")];
        let layout = BoardLayout::from_states(&states);
        let view = project(&[ticket("7", "1")], &layout);

        assert_eq!(ids(view.tickets_in(ContainerId::BACKLOG).unwrap()), vec!["7"]);
        assert_eq!(view.total_tickets(), 1);
        assert_eq!(
            layout.canonical_state(ContainerId::Swimlane(SwimlaneId::Completed)),
            Some(&StateId::well_known(5))
        );
        assert_eq!(layout.canonical_state(ContainerId::Column(ColumnId::Todo)), None);
    }
}
