use serde::{Deserialize, Serialize};

/// Time slot a team covers on distribution day.
/// Survey exports and older team sheets write the full day as either "both"
/// or "all"; both spellings normalize to `AllDay`. String conversion goes
/// through `parse`/`as_str` so the vocabulary lives in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeSlot {
    Morning,
    Afternoon,
    AllDay,
    Pr,
    Other,
}

/// Time-slot preference stated by a volunteer on the survey form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Availability {
    Morning,
    Afternoon,
    Both,
}

/// The resolved slot carried on an assignment (never a full day)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HalfDay {
    Morning,
    Afternoon,
}

/// Strips a trailing parenthesized note (e.g. "Morning (9:00-12:00)") and
/// normalizes case, so survey labels and raw keywords match the same way
fn clean_keyword(raw: &str) -> String {
    raw.split('(').next().unwrap_or(raw).trim().to_lowercase()
}

impl TimeSlot {
    /// Parses a team's time-slot string. Returns None for unrecognized
    /// values; a team without a recognized slot is never a candidate.
    pub fn parse(raw: &str) -> Option<TimeSlot> {
        match clean_keyword(raw).as_str() {
            "morning" => Some(TimeSlot::Morning),
            "afternoon" => Some(TimeSlot::Afternoon),
            "both" | "all" => Some(TimeSlot::AllDay),
            "pr" => Some(TimeSlot::Pr),
            "other" => Some(TimeSlot::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSlot::Morning => "morning",
            TimeSlot::Afternoon => "afternoon",
            TimeSlot::AllDay => "both",
            TimeSlot::Pr => "pr",
            TimeSlot::Other => "other",
        }
    }
}

impl Availability {
    /// Parses a volunteer's availability answer. Returns None for
    /// unrecognized values; such a volunteer stays unassigned.
    pub fn parse(raw: &str) -> Option<Availability> {
        match clean_keyword(raw).as_str() {
            "morning" => Some(Availability::Morning),
            "afternoon" => Some(Availability::Afternoon),
            "both" => Some(Availability::Both),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Morning => "morning",
            Availability::Afternoon => "afternoon",
            Availability::Both => "both",
        }
    }
}

impl HalfDay {
    pub fn as_str(&self) -> &'static str {
        match self {
            HalfDay::Morning => "morning",
            HalfDay::Afternoon => "afternoon",
        }
    }

    /// Display label used on rosters and the schedule pages
    pub fn label(&self) -> &'static str {
        match self {
            HalfDay::Morning => "Morning",
            HalfDay::Afternoon => "Afternoon",
        }
    }
}
