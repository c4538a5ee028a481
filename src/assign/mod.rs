pub mod engine;
pub mod selection;
pub mod slots;
pub mod state;
pub mod types;

pub use engine::perform_auto_assignment;
pub use selection::select_best_team;
pub use slots::{Availability, HalfDay, TimeSlot};
pub use types::{
    AssignedBy, Assignment, AssignmentRun, AssignmentStats, Participant, Team,
    DEFAULT_TEAM_CAPACITY, SENIOR_GRADE,
};
