use actix_files::Files;
use actix_web::{middleware, web, App, HttpRequest, HttpResponse, HttpServer, Result};
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use crate::assign::{
    perform_auto_assignment, AssignedBy, Assignment, AssignmentRun, AssignmentStats, HalfDay,
    Team, TimeSlot,
};
use crate::display::format_volunteer_name;
use crate::form::{
    export_submission_to_csv, validate_submission, FormSubmission, FormSubmissionRequest,
};
use crate::parser::{active_roster, load_responses, SurveyResponse};

/// Survey responses submitted through the form are appended here, in the
/// same layout the admin CSV upload uses
const SURVEY_CSV_PATH: &str = "participants.csv";

// In-memory storage for survey data and the latest run (in production, use a
// database)
pub struct AppState {
    pub responses: Mutex<Vec<SurveyResponse>>,
    pub teams: Mutex<Vec<Team>>,
    pub last_run: Mutex<Option<AssignmentRun>>,
    pub admin_password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrChoice {
    response_id: String,
    #[serde(default)]
    choice: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    #[serde(default)]
    include_other: bool,
    /// Consumed here, never by the engine: a "none" choice parks the
    /// volunteer at headquarters and keeps them out of the run
    #[serde(default)]
    pr_choices: Vec<PrChoice>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualAssignRequest {
    response_id: String,
    team_id: String,
    time_slot: HalfDay,
}

#[derive(Serialize, Default)]
pub struct SectionStats {
    morning: u32,
    afternoon: u32,
    both: u32,
    unrecognized: u32,
    total: u32,
}

#[derive(Serialize)]
pub struct StatsResponse {
    section_counts: HashMap<String, SectionStats>,
    availability_counts: HashMap<String, u32>,
    assignment: Option<AssignmentStats>,
}

#[derive(Serialize)]
pub struct RosterMember {
    slot: String,
    volunteer: String,
    grade: u8,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterResponse {
    team_name: String,
    team_code: String,
    assigned_area: String,
    members: Vec<RosterMember>,
}

fn is_admin(req: &HttpRequest, state: &AppState) -> bool {
    let password = req
        .headers()
        .get("X-Admin-Password")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    password == state.admin_password
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(serde_json::json!({
        "success": false,
        "error": "Unauthorized"
    }))
}

// Admin login endpoint
async fn admin_login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if req.password == state.admin_password {
        Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
    } else {
        Ok(HttpResponse::Unauthorized()
            .json(serde_json::json!({"success": false, "error": "Invalid password"})))
    }
}

// Volunteer survey submission endpoint
async fn submit_form(
    req: web::Json<FormSubmissionRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if let Err(error) = validate_submission(&req) {
        return Ok(
            HttpResponse::BadRequest().json(serde_json::json!({"success": false, "error": error}))
        );
    }

    let submission = FormSubmission::from_request(&req);
    if let Err(e) = export_submission_to_csv(&submission, Path::new(SURVEY_CSV_PATH)) {
        return Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": format!("Failed to save submission: {}", e)
        })));
    }

    let response = submission.to_response();
    let mut responses = state.responses.lock().unwrap();
    // A repeated student ID replaces the earlier answers, like the importer
    match responses
        .iter_mut()
        .find(|r| r.participant.response_id == response.participant.response_id)
    {
        Some(existing) => *existing = response,
        None => responses.push(response),
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Submission recorded"
    })))
}

// Admin CSV upload endpoint
async fn admin_upload(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if !is_admin(&req, &state) {
        return Ok(unauthorized());
    }

    // Save uploaded CSV, then parse it from disk
    let csv_path = "uploaded_data.csv";
    std::fs::write(csv_path, &body)
        .map_err(|e| actix_web::error::ErrorInternalServerError(format!("Failed to save file: {}", e)))?;

    match load_responses(csv_path) {
        Ok(responses) => {
            let count = responses.len();
            *state.responses.lock().unwrap() = responses;
            // Survey data changed; any previous run is stale
            *state.last_run.lock().unwrap() = None;

            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": format!("Imported {} survey responses", count)
            })))
        }
        Err(e) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": format!("Failed to process CSV: {}", e)
        }))),
    }
}

// Admin team list replacement endpoint
async fn set_teams(
    req: HttpRequest,
    teams: web::Json<Vec<Team>>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if !is_admin(&req, &state) {
        return Ok(unauthorized());
    }

    let teams = teams.into_inner();
    let count = teams.len();
    *state.teams.lock().unwrap() = teams;
    *state.last_run.lock().unwrap() = None;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": format!("Stored {} teams", count)
    })))
}

// Team list read endpoint
async fn get_teams(state: web::Data<AppState>) -> Result<HttpResponse> {
    let teams = state.teams.lock().unwrap();
    Ok(HttpResponse::Ok().json(&*teams))
}

// Auto-assignment trigger endpoint
async fn run_assignment(
    req: HttpRequest,
    body: web::Json<AssignRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if !is_admin(&req, &state) {
        return Ok(unauthorized());
    }

    let responses = state.responses.lock().unwrap();
    let teams = state.teams.lock().unwrap();

    if responses.is_empty() {
        return Ok(HttpResponse::BadRequest()
            .json(serde_json::json!({"success": false, "error": "No survey responses loaded"})));
    }
    if teams.is_empty() {
        return Ok(HttpResponse::BadRequest()
            .json(serde_json::json!({"success": false, "error": "No teams defined"})));
    }

    // PR opt-outs are filtered here; the engine has no PR branch
    let opt_outs: HashSet<&str> = body
        .pr_choices
        .iter()
        .filter(|c| {
            c.choice
                .as_deref()
                .map(|v| v.trim().eq_ignore_ascii_case("none"))
                .unwrap_or(false)
        })
        .map(|c| c.response_id.as_str())
        .collect();
    let roster: Vec<_> = active_roster(&responses)
        .into_iter()
        .filter(|p| !opt_outs.contains(p.response_id.as_str()))
        .collect();

    let run = perform_auto_assignment(&roster, &teams, body.include_other, Utc::now());
    let stats = run.stats();
    info!(
        "auto-assignment placed {}/{} volunteers",
        stats.assigned, stats.total
    );

    let response = serde_json::json!({
        "assignments": &run.assignments,
        "stats": stats,
    });
    // Replaces any previous run; re-running starts from a clean slate
    *state.last_run.lock().unwrap() = Some(run);

    Ok(HttpResponse::Ok().json(response))
}

// Clear stored assignments endpoint
async fn clear_assignments(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    if !is_admin(&req, &state) {
        return Ok(unauthorized());
    }

    *state.last_run.lock().unwrap() = None;
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
}

// Manual placement endpoint, for the volunteers the run couldn't seat
async fn manual_assign(
    req: HttpRequest,
    body: web::Json<ManualAssignRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if !is_admin(&req, &state) {
        return Ok(unauthorized());
    }

    let responses = state.responses.lock().unwrap();
    if !responses
        .iter()
        .any(|r| r.participant.response_id == body.response_id)
    {
        return Ok(HttpResponse::BadRequest()
            .json(serde_json::json!({"success": false, "error": "Unknown response ID"})));
    }
    drop(responses);

    let teams = state.teams.lock().unwrap();
    let team = match teams.iter().find(|t| t.team_id == body.team_id) {
        Some(team) => team,
        None => {
            return Ok(HttpResponse::BadRequest()
                .json(serde_json::json!({"success": false, "error": "Unknown team"})))
        }
    };

    // PR teams are filled through their own workflow; a team without a
    // recognized slot can't be matched to one
    match team.time_slot {
        Some(TimeSlot::Pr) | None => {
            return Ok(HttpResponse::BadRequest()
                .json(serde_json::json!({"success": false, "error": "Team cannot be assigned to"})))
        }
        Some(TimeSlot::Morning) if body.time_slot != HalfDay::Morning => {
            return Ok(HttpResponse::BadRequest()
                .json(serde_json::json!({"success": false, "error": "Team only covers the morning"})))
        }
        Some(TimeSlot::Afternoon) if body.time_slot != HalfDay::Afternoon => {
            return Ok(HttpResponse::BadRequest().json(
                serde_json::json!({"success": false, "error": "Team only covers the afternoon"}),
            ))
        }
        _ => {}
    }

    let mut last_run = state.last_run.lock().unwrap();
    let run = last_run.get_or_insert_with(|| AssignmentRun {
        assignments: Vec::new(),
        unassigned: Vec::new(),
    });

    if run
        .assignments
        .iter()
        .any(|a| a.response_id == body.response_id)
    {
        return Ok(HttpResponse::BadRequest()
            .json(serde_json::json!({"success": false, "error": "Volunteer is already assigned"})));
    }

    let members = run
        .assignments
        .iter()
        .filter(|a| a.team_id == team.team_id)
        .count() as u32;
    if members >= team.capacity() {
        return Ok(HttpResponse::BadRequest()
            .json(serde_json::json!({"success": false, "error": "Team is full"})));
    }

    let assignment = Assignment {
        response_id: body.response_id.clone(),
        team_id: team.team_id.clone(),
        assigned_at: Utc::now(),
        assigned_by: AssignedBy::Manual,
        time_slot: body.time_slot,
    };
    run.unassigned.retain(|id| id != &body.response_id);
    run.assignments.push(assignment.clone());

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "assignment": assignment,
        "stats": run.stats(),
    })))
}

// Stats endpoint for the dashboard
async fn get_stats(state: web::Data<AppState>) -> Result<HttpResponse> {
    let responses = state.responses.lock().unwrap();

    if responses.is_empty() {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({"error": "No data available"})));
    }

    let mut section_counts: HashMap<String, SectionStats> = HashMap::new();
    let mut availability_counts: HashMap<String, u32> = HashMap::new();

    for response in responses.iter() {
        let p = &response.participant;
        let label = p
            .availability
            .map(|a| a.as_str())
            .unwrap_or("unrecognized");
        *availability_counts.entry(label.to_string()).or_insert(0) += 1;

        let stats = section_counts.entry(p.section.clone()).or_default();
        stats.total += 1;
        match label {
            "morning" => stats.morning += 1,
            "afternoon" => stats.afternoon += 1,
            "both" => stats.both += 1,
            _ => stats.unrecognized += 1,
        }
    }

    let assignment = state.last_run.lock().unwrap().as_ref().map(|run| run.stats());

    Ok(HttpResponse::Ok().json(StatsResponse {
        section_counts,
        availability_counts,
        assignment,
    }))
}

// Latest assignment run endpoint
async fn get_assignments(state: web::Data<AppState>) -> Result<HttpResponse> {
    let last_run = state.last_run.lock().unwrap();

    if let Some(ref run) = *last_run {
        Ok(HttpResponse::Ok().json(serde_json::json!({
            "assignments": &run.assignments,
            "unassigned": &run.unassigned,
            "stats": run.stats(),
        })))
    } else {
        Ok(HttpResponse::NotFound()
            .json(serde_json::json!({"error": "No assignment run available"})))
    }
}

// Single team roster endpoint
async fn get_roster(
    team_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let teams = state.teams.lock().unwrap();
    let team = match teams.iter().find(|t| t.team_id == *team_id) {
        Some(team) => team.clone(),
        None => {
            return Ok(
                HttpResponse::NotFound().json(serde_json::json!({"error": "Unknown team"}))
            )
        }
    };
    drop(teams);

    // Lock order: responses before last_run
    let responses = state.responses.lock().unwrap();
    let last_run = state.last_run.lock().unwrap();
    let run = match *last_run {
        Some(ref run) => run,
        None => {
            return Ok(HttpResponse::NotFound()
                .json(serde_json::json!({"error": "No assignment run available"})))
        }
    };
    let members = run
        .assignments
        .iter()
        .filter(|a| a.team_id == team.team_id)
        .map(|a| {
            let volunteer = responses
                .iter()
                .map(|r| &r.participant)
                .find(|p| p.response_id == a.response_id);
            RosterMember {
                slot: a.time_slot.label().to_string(),
                volunteer: volunteer
                    .map(|p| format_volunteer_name(&p.section, &p.name))
                    .unwrap_or_else(|| a.response_id.clone()),
                grade: volunteer.map(|p| p.grade).unwrap_or(0),
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(RosterResponse {
        team_name: team.team_name,
        team_code: team.team_code,
        assigned_area: team.assigned_area,
        members,
    }))
}

// HTML page handlers
async fn index() -> Result<HttpResponse> {
    let html = include_str!("../templates/index.html");
    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}

async fn admin_page() -> Result<HttpResponse> {
    let html = include_str!("../templates/admin.html");
    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}

async fn stats_page() -> Result<HttpResponse> {
    let html = include_str!("../templates/stats.html");
    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}

async fn teams_page() -> Result<HttpResponse> {
    let html = include_str!("../templates/teams.html");
    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}

pub async fn start_server(port: u16, admin_password: String) -> std::io::Result<()> {
    let app_state = web::Data::new(AppState {
        responses: Mutex::new(Vec::new()),
        teams: Mutex::new(Vec::new()),
        last_run: Mutex::new(None),
        admin_password,
    });

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .service(Files::new("/static", "static"))
            .route("/", web::get().to(index))
            .route("/admin", web::get().to(admin_page))
            .route("/stats", web::get().to(stats_page))
            .route("/teams", web::get().to(teams_page))
            .route("/api/login", web::post().to(admin_login))
            .route("/api/submit", web::post().to(submit_form))
            .route("/api/upload", web::post().to(admin_upload))
            .route("/api/teams", web::post().to(set_teams))
            .route("/api/teams", web::get().to(get_teams))
            .route("/api/assign", web::post().to(run_assignment))
            .route("/api/assignments/clear", web::post().to(clear_assignments))
            .route("/api/assignments/manual", web::post().to(manual_assign))
            .route("/api/assignments", web::get().to(get_assignments))
            .route("/api/stats", web::get().to(get_stats))
            .service(web::resource("/api/roster/{team_id}").route(web::get().to(get_roster)))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
