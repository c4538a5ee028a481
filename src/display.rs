use std::collections::HashMap;
use std::fs::File;
use std::io::Write;

use crate::assign::{Assignment, AssignmentRun, Participant, Team};

/// Formats a volunteer name with their section tag
pub fn format_volunteer_name(section: &str, name: &str) -> String {
    if section.is_empty() {
        name.to_string()
    } else {
        format!("[{}] {}", section, name)
    }
}

fn members_of<'a>(run: &'a AssignmentRun, team: &Team) -> Vec<&'a Assignment> {
    run.assignments
        .iter()
        .filter(|a| a.team_id == team.team_id)
        .collect()
}

/// Prints an assignment run in a readable format
pub fn print_assignment_summary(run: &AssignmentRun, participants: &[Participant], teams: &[Team]) {
    let stats = run.stats();
    println!("\n=== Auto-Assignment Result ===");
    println!(
        "Placed {} of {} volunteers, {} unassigned",
        stats.assigned, stats.total, stats.unassigned
    );

    let by_id: HashMap<&str, &Participant> = participants
        .iter()
        .map(|p| (p.response_id.as_str(), p))
        .collect();

    if !run.unassigned.is_empty() {
        println!("⚠️  Unassigned volunteers ({}):", run.unassigned.len());
        for response_id in &run.unassigned {
            if let Some(p) = by_id.get(response_id.as_str()) {
                let availability = p
                    .availability
                    .map(|a| a.as_str())
                    .unwrap_or("unrecognized availability");
                println!(
                    "  - {} (ID: {}, grade {}, {})",
                    format_volunteer_name(&p.section, &p.name),
                    response_id,
                    p.grade,
                    availability
                );
            }
        }
    }

    println!("\nRosters by team:");
    for team in teams {
        let members = members_of(run, team);
        println!(
            "  {} ({}) - {} - {}/{} members",
            team.team_name,
            team.team_code,
            if team.assigned_area.is_empty() {
                "no area"
            } else {
                &team.assigned_area
            },
            members.len(),
            team.capacity()
        );
        for assignment in members {
            if let Some(p) = by_id.get(assignment.response_id.as_str()) {
                println!(
                    "    {} {} (grade {})",
                    assignment.time_slot.label(),
                    format_volunteer_name(&p.section, &p.name),
                    p.grade
                );
            }
        }
    }
}

/// Writes every team roster to a file in the format: slot [section] name
pub fn write_rosters_to_file(
    run: &AssignmentRun,
    participants: &[Participant],
    teams: &[Team],
    filename: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = File::create(filename)?;

    let by_id: HashMap<&str, &Participant> = participants
        .iter()
        .map(|p| (p.response_id.as_str(), p))
        .collect();

    for team in teams {
        writeln!(
            file,
            "** {} ({}) - {} **",
            team.team_name, team.team_code, team.assigned_area
        )?;
        let members = members_of(run, team);
        if members.is_empty() {
            writeln!(file, "[EMPTY]")?;
        }
        for assignment in members {
            if let Some(p) = by_id.get(assignment.response_id.as_str()) {
                writeln!(
                    file,
                    "{} {}",
                    assignment.time_slot.label(),
                    format_volunteer_name(&p.section, &p.name)
                )?;
            }
        }
        writeln!(file)?;
    }

    if !run.unassigned.is_empty() {
        writeln!(file, "** Unassigned **")?;
        for response_id in &run.unassigned {
            if let Some(p) = by_id.get(response_id.as_str()) {
                writeln!(file, "{}", format_volunteer_name(&p.section, &p.name))?;
            }
        }
    }

    Ok(())
}
