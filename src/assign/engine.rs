use std::collections::HashSet;

use chrono::{DateTime, Utc};
use log::debug;

use super::selection::select_best_team;
use super::slots::{Availability, HalfDay, TimeSlot};
use super::state::BalanceState;
use super::types::{AssignedBy, Assignment, AssignmentRun, Participant, Team};

/// Teams usable by the run, split by covered slot. PR teams never enter a
/// pool (they are filled through their own manual workflow); `other` teams
/// only when the run enables them.
struct TeamPools<'a> {
    morning: Vec<&'a Team>,
    afternoon: Vec<&'a Team>,
    all_day: Vec<&'a Team>,
    other: Vec<&'a Team>,
}

fn partition_teams(teams: &[Team], include_other_teams: bool) -> TeamPools<'_> {
    let mut pools = TeamPools {
        morning: Vec::new(),
        afternoon: Vec::new(),
        all_day: Vec::new(),
        other: Vec::new(),
    };
    for team in teams {
        match team.time_slot {
            Some(TimeSlot::Morning) => pools.morning.push(team),
            Some(TimeSlot::Afternoon) => pools.afternoon.push(team),
            Some(TimeSlot::AllDay) => pools.all_day.push(team),
            Some(TimeSlot::Other) if include_other_teams => pools.other.push(team),
            Some(TimeSlot::Other) | Some(TimeSlot::Pr) | None => {}
        }
    }
    pools
}

/// Placement order: seniors before juniors, then volunteers locked to a
/// single slot before full-day ones, then response id. The hard-to-place go
/// first while team slack remains; the id tail makes the order, and with it
/// the whole run, independent of how the input array happened to be sorted.
fn placement_order(participants: &[Participant]) -> Vec<&Participant> {
    let mut ordered: Vec<&Participant> = participants.iter().collect();
    ordered.sort_by(|a, b| {
        let a_junior = !a.is_senior();
        let b_junior = !b.is_senior();
        let a_flexible = a.availability == Some(Availability::Both);
        let b_flexible = b.availability == Some(Availability::Both);
        a_junior
            .cmp(&b_junior)
            .then_with(|| a_flexible.cmp(&b_flexible))
            .then_with(|| a.response_id.cmp(&b.response_id))
    });
    ordered
}

/// For a full-day volunteer, picks the half-day currently holding fewer of
/// their section, so one club doesn't cluster into a single slot. Ties go to
/// the morning.
fn spread_slot(participant: &Participant, state: &BalanceState) -> HalfDay {
    let morning = state.section_in_slot(&participant.section, HalfDay::Morning);
    let afternoon = state.section_in_slot(&participant.section, HalfDay::Afternoon);
    if afternoon < morning {
        HalfDay::Afternoon
    } else {
        HalfDay::Morning
    }
}

/// Places every participant it can into a distribution team, balancing team
/// size, section mix, grade mix and senior coverage as it goes.
///
/// A participant with no feasible team (no candidate pool for their slot, or
/// every candidate full) lands in `unassigned`; that is a normal outcome,
/// not an error. `assigned_at` is stamped onto every assignment, so a run is
/// a pure function of its arguments.
pub fn perform_auto_assignment(
    participants: &[Participant],
    teams: &[Team],
    include_other_teams: bool,
    assigned_at: DateTime<Utc>,
) -> AssignmentRun {
    let pools = partition_teams(teams, include_other_teams);
    let mut state = BalanceState::new();
    let mut assignments = Vec::new();
    let mut unassigned = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for participant in placement_order(participants) {
        // Duplicate ids shouldn't reach the engine; never place one twice
        if !seen.insert(participant.response_id.as_str()) {
            continue;
        }

        let slot = match participant.availability {
            Some(Availability::Morning) => HalfDay::Morning,
            Some(Availability::Afternoon) => HalfDay::Afternoon,
            Some(Availability::Both) => spread_slot(participant, &state),
            // Unrecognized answer: unassignable, not an error
            None => {
                unassigned.push(participant.response_id.clone());
                continue;
            }
        };

        let mut candidates: Vec<&Team> = match slot {
            HalfDay::Morning => pools.morning.clone(),
            HalfDay::Afternoon => pools.afternoon.clone(),
        };
        candidates.extend(&pools.all_day);
        candidates.extend(&pools.other);

        match select_best_team(&candidates, participant, &state) {
            Some(team) => {
                debug!(
                    "placed {} into {} ({})",
                    participant.response_id,
                    team.team_id,
                    slot.as_str()
                );
                state.record(participant, team, slot);
                assignments.push(Assignment {
                    response_id: participant.response_id.clone(),
                    team_id: team.team_id.clone(),
                    assigned_at,
                    assigned_by: AssignedBy::Auto,
                    time_slot: slot,
                });
            }
            None => unassigned.push(participant.response_id.clone()),
        }
    }

    AssignmentRun {
        assignments,
        unassigned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn run_at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-08-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn participant(id: &str, grade: u8, section: &str, availability: &str) -> Participant {
        Participant {
            response_id: id.into(),
            name: format!("Volunteer {}", id),
            section: section.into(),
            grade,
            availability: Availability::parse(availability),
        }
    }

    fn team(id: &str, slot: &str) -> Team {
        Team {
            team_id: id.into(),
            team_code: id.to_uppercase(),
            team_name: format!("Team {}", id),
            time_slot: TimeSlot::parse(slot),
            assigned_area: String::new(),
            adjacent_areas: vec![],
            max_members: None,
            preferred_grades: vec![],
        }
    }

    fn team_with_cap(id: &str, slot: &str, cap: u32) -> Team {
        let mut t = team(id, slot);
        t.max_members = Some(cap);
        t
    }

    fn by_response<'a>(run: &'a AssignmentRun) -> HashMap<&'a str, &'a Assignment> {
        run.assignments
            .iter()
            .map(|a| (a.response_id.as_str(), a))
            .collect()
    }

    #[test]
    fn splits_fixed_volunteers_across_matching_slots() {
        let participants = vec![
            participant("1001", 2, "a", "morning"),
            participant("1002", 2, "b", "afternoon"),
        ];
        let teams = vec![team("t-am", "morning"), team("t-pm", "afternoon")];

        let run = perform_auto_assignment(&participants, &teams, false, run_at());
        assert_eq!(run.assignments.len(), 2);
        assert!(run.unassigned.is_empty());

        let placed = by_response(&run);
        assert_eq!(placed["1001"].team_id, "t-am");
        assert_eq!(placed["1001"].time_slot, HalfDay::Morning);
        assert_eq!(placed["1002"].team_id, "t-pm");
        assert_eq!(placed["1002"].time_slot, HalfDay::Afternoon);
    }

    #[test]
    fn capacity_overflow_leaves_the_rest_unassigned() {
        let participants = vec![
            participant("1001", 1, "a", "morning"),
            participant("1002", 1, "b", "morning"),
            participant("1003", 1, "c", "morning"),
        ];
        let teams = vec![team_with_cap("t-am", "morning", 2)];

        let run = perform_auto_assignment(&participants, &teams, false, run_at());
        assert_eq!(run.assignments.len(), 2);
        assert_eq!(run.unassigned.len(), 1);

        let stats = run.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.assigned, 2);
        assert_eq!(stats.unassigned, 1);
    }

    #[test]
    fn full_day_volunteers_of_one_section_spread_over_both_slots() {
        let participants = vec![
            participant("1001", 2, "brass band", "both"),
            participant("1002", 2, "brass band", "both"),
        ];
        let teams = vec![team("t-am", "morning"), team("t-pm", "afternoon")];

        let run = perform_auto_assignment(&participants, &teams, false, run_at());
        assert_eq!(run.assignments.len(), 2);

        let placed = by_response(&run);
        assert_eq!(placed["1001"].time_slot, HalfDay::Morning);
        assert_eq!(placed["1002"].time_slot, HalfDay::Afternoon);
    }

    #[test]
    fn senior_is_placed_before_and_spread_apart_from_juniors() {
        // The junior comes first in the input; the senior must still be
        // placed first and the junior balances onto the other team
        let participants = vec![
            participant("1001", 1, "a", "both"),
            participant("1002", 3, "b", "both"),
        ];
        let teams = vec![team("t-01", "both"), team("t-02", "both")];

        let run = perform_auto_assignment(&participants, &teams, false, run_at());
        let placed = by_response(&run);
        assert_eq!(placed["1002"].team_id, "t-01");
        assert_eq!(placed["1001"].team_id, "t-02");
    }

    #[test]
    fn seniors_outrank_slot_locked_juniors_for_scarce_capacity() {
        let participants = vec![
            participant("1001", 1, "s", "morning"),
            participant("1002", 4, "s", "both"),
        ];
        let teams = vec![team_with_cap("t-am", "morning", 1)];

        let run = perform_auto_assignment(&participants, &teams, false, run_at());
        let placed = by_response(&run);
        assert_eq!(placed["1002"].team_id, "t-am");
        assert_eq!(run.unassigned, vec!["1001".to_string()]);
    }

    #[test]
    fn slot_locked_volunteers_go_before_flexible_ones_of_equal_grade() {
        let participants = vec![
            participant("1001", 2, "s", "both"),
            participant("1002", 2, "s", "morning"),
        ];
        let teams = vec![
            team_with_cap("t-am", "morning", 1),
            team_with_cap("t-pm", "afternoon", 1),
        ];

        let run = perform_auto_assignment(&participants, &teams, false, run_at());
        let placed = by_response(&run);
        // The locked volunteer takes the morning seat; the flexible one sees
        // their section already in the morning and flows to the afternoon
        assert_eq!(placed["1002"].team_id, "t-am");
        assert_eq!(placed["1001"].team_id, "t-pm");
    }

    #[test]
    fn pr_teams_are_never_assignment_targets() {
        let participants = vec![participant("1001", 2, "a", "morning")];
        let teams = vec![team("t-pr", "pr")];

        let run = perform_auto_assignment(&participants, &teams, true, run_at());
        assert!(run.assignments.is_empty());
        assert_eq!(run.unassigned, vec!["1001".to_string()]);
    }

    #[test]
    fn other_teams_only_count_when_enabled() {
        let participants = vec![participant("1001", 2, "a", "morning")];
        let teams = vec![team("t-x", "other")];

        let run = perform_auto_assignment(&participants, &teams, false, run_at());
        assert!(run.assignments.is_empty());
        assert_eq!(run.unassigned, vec!["1001".to_string()]);

        let run = perform_auto_assignment(&participants, &teams, true, run_at());
        assert_eq!(run.assignments.len(), 1);
        assert_eq!(run.assignments[0].team_id, "t-x");
        assert_eq!(run.assignments[0].time_slot, HalfDay::Morning);
    }

    #[test]
    fn unrecognized_availability_is_unassignable() {
        let participants = vec![
            participant("1001", 2, "a", "whenever"),
            participant("1002", 2, "a", "morning"),
        ];
        let teams = vec![team("t-am", "morning")];

        let run = perform_auto_assignment(&participants, &teams, false, run_at());
        assert_eq!(run.assignments.len(), 1);
        assert_eq!(run.unassigned, vec!["1001".to_string()]);
    }

    #[test]
    fn no_team_exceeds_its_capacity_and_no_volunteer_repeats() {
        let mut participants = Vec::new();
        for i in 0..30 {
            let sections = ["brass band", "drama club", "art circle"];
            let availabilities = ["morning", "afternoon", "both"];
            participants.push(participant(
                &format!("{:04}", 1000 + i),
                (i % 4 + 1) as u8,
                sections[i % 3],
                availabilities[i % 3],
            ));
        }
        let teams = vec![
            team_with_cap("t-01", "morning", 4),
            team_with_cap("t-02", "afternoon", 4),
            team_with_cap("t-03", "both", 6),
            team_with_cap("t-04", "both", 3),
        ];

        let run = perform_auto_assignment(&participants, &teams, false, run_at());

        let mut per_team: HashMap<&str, u32> = HashMap::new();
        let mut ids = HashSet::new();
        for a in &run.assignments {
            *per_team.entry(a.team_id.as_str()).or_insert(0) += 1;
            assert!(ids.insert(a.response_id.as_str()), "duplicate assignment");
        }
        let caps: HashMap<&str, u32> = teams
            .iter()
            .map(|t| (t.team_id.as_str(), t.capacity()))
            .collect();
        for (team_id, count) in &per_team {
            assert!(count <= &caps[team_id], "{} over capacity", team_id);
        }
        assert_eq!(run.stats().total, participants.len());
    }

    #[test]
    fn assigned_slot_never_contradicts_the_team_slot() {
        let participants: Vec<Participant> = (0..12)
            .map(|i| {
                let availabilities = ["morning", "afternoon", "both"];
                participant(
                    &format!("{:04}", 2000 + i),
                    (i % 4 + 1) as u8,
                    "s",
                    availabilities[i % 3],
                )
            })
            .collect();
        let teams = vec![
            team_with_cap("t-am", "morning", 3),
            team_with_cap("t-pm", "afternoon", 3),
            team("t-all", "both"),
        ];

        let run = perform_auto_assignment(&participants, &teams, false, run_at());
        let slots: HashMap<&str, Option<TimeSlot>> = teams
            .iter()
            .map(|t| (t.team_id.as_str(), t.time_slot))
            .collect();
        for a in &run.assignments {
            match slots[a.team_id.as_str()] {
                Some(TimeSlot::Morning) => assert_eq!(a.time_slot, HalfDay::Morning),
                Some(TimeSlot::Afternoon) => assert_eq!(a.time_slot, HalfDay::Afternoon),
                _ => {}
            }
        }
    }

    #[test]
    fn output_does_not_depend_on_input_order() {
        use rand::seq::SliceRandom;
        use rand::SeedableRng;

        let mut participants = Vec::new();
        for i in 0..24 {
            let sections = ["brass band", "drama club", "art circle", "choir"];
            let availabilities = ["morning", "afternoon", "both", "both"];
            participants.push(participant(
                &format!("{:04}", 3000 + i),
                (i % 4 + 1) as u8,
                sections[i % 4],
                availabilities[i % 4],
            ));
        }
        let mut teams = vec![
            team_with_cap("t-01", "morning", 5),
            team_with_cap("t-02", "afternoon", 5),
            team_with_cap("t-03", "both", 8),
            team_with_cap("t-04", "other", 4),
        ];

        let reference = perform_auto_assignment(&participants, &teams, true, run_at());

        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..5 {
            participants.shuffle(&mut rng);
            teams.shuffle(&mut rng);
            let shuffled = perform_auto_assignment(&participants, &teams, true, run_at());

            let mut left = reference.assignments.clone();
            let mut right = shuffled.assignments.clone();
            left.sort_by(|a, b| a.response_id.cmp(&b.response_id));
            right.sort_by(|a, b| a.response_id.cmp(&b.response_id));
            assert_eq!(left, right);

            let mut left_un = reference.unassigned.clone();
            let mut right_un = shuffled.unassigned.clone();
            left_un.sort();
            right_un.sort();
            assert_eq!(left_un, right_un);
        }
    }

    #[test]
    fn empty_input_produces_empty_output() {
        let run = perform_auto_assignment(&[], &[], false, run_at());
        assert!(run.assignments.is_empty());
        assert!(run.unassigned.is_empty());
        assert_eq!(run.stats().total, 0);
    }
}
