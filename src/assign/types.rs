use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::slots::{Availability, HalfDay, TimeSlot};

/// Teams without an explicit capacity take this many members
pub const DEFAULT_TEAM_CAPACITY: u32 = 10;

/// Grade at and above which a volunteer counts as senior
pub const SENIOR_GRADE: u8 = 3;

/// One survey respondent, as handed to the assignment engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub response_id: String,
    pub name: String,
    /// Organizational sub-group (club or committee division)
    pub section: String,
    /// School year, 1-4
    pub grade: u8,
    /// None when the survey answer was missing or unrecognized; such a
    /// volunteer is never placeable and ends up in the unassigned list
    #[serde(
        default,
        deserialize_with = "availability_from_str",
        serialize_with = "availability_to_str"
    )]
    pub availability: Option<Availability>,
}

impl Participant {
    pub fn is_senior(&self) -> bool {
        self.grade >= SENIOR_GRADE
    }
}

/// A distribution team covering one geographic area for one time slot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub team_id: String,
    pub team_code: String,
    pub team_name: String,
    #[serde(
        default,
        deserialize_with = "time_slot_from_str",
        serialize_with = "time_slot_to_str"
    )]
    pub time_slot: Option<TimeSlot>,
    #[serde(default)]
    pub assigned_area: String,
    #[serde(default)]
    pub adjacent_areas: Vec<String>,
    #[serde(default)]
    pub max_members: Option<u32>,
    #[serde(default)]
    pub preferred_grades: Vec<u8>,
}

impl Team {
    pub fn capacity(&self) -> u32 {
        self.max_members.unwrap_or(DEFAULT_TEAM_CAPACITY)
    }

    pub fn prefers_grade(&self, grade: u8) -> bool {
        self.preferred_grades.contains(&grade)
    }
}

/// Who placed a volunteer into a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignedBy {
    Auto,
    Manual,
}

/// The record linking one volunteer to one team for one resolved slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub response_id: String,
    pub team_id: String,
    pub assigned_at: DateTime<Utc>,
    pub assigned_by: AssignedBy,
    pub time_slot: HalfDay,
}

/// Result of one assignment run
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentRun {
    pub assignments: Vec<Assignment>,
    /// Response IDs that couldn't be placed
    pub unassigned: Vec<String>,
}

impl AssignmentRun {
    pub fn stats(&self) -> AssignmentStats {
        let assigned = self.assignments.len();
        let unassigned = self.unassigned.len();
        AssignmentStats {
            total: assigned + unassigned,
            assigned,
            unassigned,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AssignmentStats {
    pub total: usize,
    pub assigned: usize,
    pub unassigned: usize,
}

fn availability_from_str<'de, D>(de: D) -> Result<Option<Availability>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(de)?;
    Ok(raw.as_deref().and_then(Availability::parse))
}

fn availability_to_str<S>(value: &Option<Availability>, ser: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(a) => ser.serialize_str(a.as_str()),
        None => ser.serialize_none(),
    }
}

fn time_slot_from_str<'de, D>(de: D) -> Result<Option<TimeSlot>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(de)?;
    Ok(raw.as_deref().and_then(TimeSlot::parse))
}

fn time_slot_to_str<S>(value: &Option<TimeSlot>, ser: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(s) => ser.serialize_str(s.as_str()),
        None => ser.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_json_uses_camel_case_and_legacy_slot_spelling() {
        let team: Team = serde_json::from_str(
            r#"{
                "teamId": "t-03",
                "teamCode": "C3",
                "teamName": "Station East",
                "timeSlot": "all",
                "assignedArea": "east-gate",
                "adjacentAreas": ["riverside"],
                "maxMembers": 8,
                "preferredGrades": [1, 2]
            }"#,
        )
        .unwrap();
        assert_eq!(team.time_slot, Some(TimeSlot::AllDay));
        assert_eq!(team.capacity(), 8);
        assert!(team.prefers_grade(2));
        assert!(!team.prefers_grade(4));
    }

    #[test]
    fn team_capacity_defaults_to_ten() {
        let team: Team = serde_json::from_str(
            r#"{"teamId": "t-01", "teamCode": "A1", "teamName": "North", "timeSlot": "morning"}"#,
        )
        .unwrap();
        assert_eq!(team.capacity(), DEFAULT_TEAM_CAPACITY);
        assert!(team.adjacent_areas.is_empty());
    }

    #[test]
    fn unknown_availability_becomes_none() {
        let p: Participant = serde_json::from_str(
            r#"{"responseId": "1001", "name": "A", "section": "brass band", "grade": 2, "availability": "evening"}"#,
        )
        .unwrap();
        assert_eq!(p.availability, None);
    }

    #[test]
    fn seniority_threshold_is_third_year() {
        let mk = |grade| Participant {
            response_id: "1".into(),
            name: "A".into(),
            section: "s".into(),
            grade,
            availability: Some(Availability::Both),
        };
        assert!(!mk(2).is_senior());
        assert!(mk(3).is_senior());
        assert!(mk(4).is_senior());
    }

    #[test]
    fn assignment_serializes_with_contract_field_names() {
        let a = Assignment {
            response_id: "1001".into(),
            team_id: "t-01".into(),
            assigned_at: DateTime::parse_from_rfc3339("2026-08-01T09:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            assigned_by: AssignedBy::Auto,
            time_slot: HalfDay::Morning,
        };
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["responseId"], "1001");
        assert_eq!(json["assignedBy"], "auto");
        assert_eq!(json["timeSlot"], "morning");
    }

    #[test]
    fn run_stats_add_up() {
        let run = AssignmentRun {
            assignments: vec![],
            unassigned: vec!["1001".into(), "1002".into()],
        };
        let stats = run.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.assigned, 0);
        assert_eq!(stats.unassigned, 2);
    }
}
