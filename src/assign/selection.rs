use super::state::BalanceState;
use super::types::{Participant, Team};

/// Picks the best team for one participant from the candidate pool, or None
/// when every candidate is full.
///
/// The pool narrows in order: capacity, then minimum current load, then
/// minimum count of the participant's section, then minimum count of the
/// participant's grade. Survivors are ordered by the soft preferences
/// (teams still without a senior come first when placing a senior, then
/// teams whose preferred grades include the participant's) and finally by
/// team id, so identical input always produces the same pick.
pub fn select_best_team<'a>(
    candidates: &[&'a Team],
    participant: &Participant,
    state: &BalanceState,
) -> Option<&'a Team> {
    // Capacity is the only step allowed to empty the pool
    let mut pool: Vec<&Team> = candidates
        .iter()
        .copied()
        .filter(|t| state.team_total(&t.team_id) < t.capacity())
        .collect();
    if pool.is_empty() {
        return None;
    }

    keep_minimum(&mut pool, |t| state.team_total(&t.team_id));
    keep_minimum(&mut pool, |t| {
        state.section_in_team(&t.team_id, &participant.section)
    });
    keep_minimum(&mut pool, |t| {
        state.grade_in_team(&t.team_id, participant.grade)
    });

    let placing_senior = participant.is_senior();
    pool.sort_by(|a, b| {
        // Every team should get one senior before any team gets a second
        let a_senior_taken = placing_senior && state.team_seniors(&a.team_id) > 0;
        let b_senior_taken = placing_senior && state.team_seniors(&b.team_id) > 0;
        a_senior_taken
            .cmp(&b_senior_taken)
            .then_with(|| {
                let a_off_grade = !a.prefers_grade(participant.grade);
                let b_off_grade = !b.prefers_grade(participant.grade);
                a_off_grade.cmp(&b_off_grade)
            })
            .then_with(|| a.team_id.cmp(&b.team_id))
    });
    pool.first().copied()
}

/// Keeps only the candidates whose metric equals the pool minimum
fn keep_minimum<F>(pool: &mut Vec<&Team>, metric: F)
where
    F: Fn(&Team) -> u32,
{
    if let Some(min) = pool.iter().map(|t| metric(t)).min() {
        pool.retain(|t| metric(t) == min);
    }
}
