use std::collections::HashMap;

use super::slots::HalfDay;
use super::types::{Participant, Team};

/// Running counters for one assignment run. Created empty at the start of a
/// run, mutated after every placement, discarded at the end; nothing here is
/// persisted.
#[derive(Debug, Default)]
pub struct BalanceState {
    /// team_id -> members placed so far
    team_totals: HashMap<String, u32>,
    /// team_id -> seniors placed so far
    team_seniors: HashMap<String, u32>,
    /// (team_id, section) -> members of that section in that team
    team_sections: HashMap<(String, String), u32>,
    /// (team_id, grade) -> members of that grade in that team
    team_grades: HashMap<(String, u8), u32>,
    /// (section, half-day) -> members of that section placed into that slot
    section_slots: HashMap<(String, HalfDay), u32>,
}

impl BalanceState {
    pub fn new() -> BalanceState {
        BalanceState::default()
    }

    pub fn team_total(&self, team_id: &str) -> u32 {
        self.team_totals.get(team_id).copied().unwrap_or(0)
    }

    pub fn team_seniors(&self, team_id: &str) -> u32 {
        self.team_seniors.get(team_id).copied().unwrap_or(0)
    }

    pub fn section_in_team(&self, team_id: &str, section: &str) -> u32 {
        self.team_sections
            .get(&(team_id.to_string(), section.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn grade_in_team(&self, team_id: &str, grade: u8) -> u32 {
        self.team_grades
            .get(&(team_id.to_string(), grade))
            .copied()
            .unwrap_or(0)
    }

    pub fn section_in_slot(&self, section: &str, slot: HalfDay) -> u32 {
        self.section_slots
            .get(&(section.to_string(), slot))
            .copied()
            .unwrap_or(0)
    }

    /// Records one placement into every counter the selection cascade reads
    pub fn record(&mut self, participant: &Participant, team: &Team, slot: HalfDay) {
        *self.team_totals.entry(team.team_id.clone()).or_insert(0) += 1;
        if participant.is_senior() {
            *self.team_seniors.entry(team.team_id.clone()).or_insert(0) += 1;
        }
        *self
            .team_sections
            .entry((team.team_id.clone(), participant.section.clone()))
            .or_insert(0) += 1;
        *self
            .team_grades
            .entry((team.team_id.clone(), participant.grade))
            .or_insert(0) += 1;
        *self
            .section_slots
            .entry((participant.section.clone(), slot))
            .or_insert(0) += 1;
    }
}
