mod assign;
mod display;
mod form;
mod parser;
mod web;

use chrono::Utc;

use assign::{perform_auto_assignment, Team};
use display::{print_assignment_summary, write_rosters_to_file};
use parser::{active_roster, load_responses};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Check if we should run in web mode
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "web" {
        let port = args
            .get(2)
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8080);
        let password = std::env::var("ADMIN_PASSWORD")
            .unwrap_or_else(|_| "admin123".to_string()); // Default password, change this!

        println!("Starting web server on port {}...", port);
        println!("Access the site at http://localhost:{}", port);

        web::start_server(port, password).await?;
        return Ok(());
    }

    // CLI mode: participants CSV + teams JSON in, rosters out
    let csv_path = args
        .get(1)
        .map(String::as_str)
        .unwrap_or("data/participants.csv");
    let teams_path = args
        .get(2)
        .map(String::as_str)
        .unwrap_or("data/teams.json");
    let include_other = args.iter().any(|a| a == "--include-other");

    println!("Loading survey responses from CSV...");
    let responses = load_responses(csv_path)?;
    println!(
        "Loaded {} survey responses (re-submissions merged)",
        responses.len()
    );

    let teams: Vec<Team> = serde_json::from_reader(std::fs::File::open(teams_path)?)?;
    println!("Loaded {} teams", teams.len());

    let roster = active_roster(&responses);
    let standby = responses.len() - roster.len();
    if standby > 0 {
        println!("{} volunteers opted for headquarters standby", standby);
    }

    println!("\n=== Running Auto-Assignment ===");
    let run = perform_auto_assignment(&roster, &teams, include_other, Utc::now());

    print_assignment_summary(&run, &roster, &teams);

    println!("\n=== Writing Rosters to File ===");
    write_rosters_to_file(&run, &roster, &teams, "rosters.txt")?;
    println!("Rosters saved to rosters.txt");

    Ok(())
}
