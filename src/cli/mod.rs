//! Command-line front end.
//!
//! Each subcommand renders its output as plain text and reports an exit
//! code through [`CliResult`]; `main` only prints and exits.

use anyhow::{bail, Context};
use clap::Subcommand;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::assessment::{AssessmentReport, AssessmentService, SaveStatus};
use crate::config::Config;
use crate::doctors::{
    route_url, Coordinates, NominatimClient, Provider, DEFAULT_CITY_RADIUS_KM,
    DEFAULT_NEARBY_RADIUS_KM, FALLBACK_LOCATION,
};
use crate::prediction::{HealthProfile, HttpPredictionClient, PredictionGateway};
use crate::questionnaire::{AssessmentType, QuestionSet};
use crate::session::AssessmentSession;
use crate::storage::{AssessmentRecord, AssessmentRecorder, RestRecorder, SqliteStorage};

const RULE: &str =
    "═══════════════════════════════════════════════════════════════════════════════\n";

/// CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the questions of an assessment
    Questions {
        /// Assessment type: menopause, pcos, menstrual
        #[arg(long = "type")]
        assessment_type: AssessmentType,
    },

    /// Score a completed questionnaire and record it
    Assess {
        /// Assessment type: menopause, pcos, menstrual
        #[arg(long = "type")]
        assessment_type: AssessmentType,

        /// User the assessment belongs to
        #[arg(long)]
        user: String,

        /// JSON file mapping question id to chosen weight, e.g. {"1": 2}
        #[arg(long)]
        answers: PathBuf,

        /// JSON file with measurements for the remote predictor
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Skip the remote predictor
        #[arg(long)]
        local_only: bool,
    },

    /// Show a user's past assessments from the local database
    ///
    /// Only the local SQLite database is read. Assessments written to the
    /// REST store (SUPABASE_URL set) do not appear here.
    History {
        /// User to list
        #[arg(long)]
        user: String,

        /// Maximum number of assessments to show
        #[arg(long, default_value = "10")]
        limit: u32,
    },

    /// Find hospitals and clinics nearby
    Doctors {
        /// Place name to search around
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        city: Option<String>,

        /// Latitude of the search center
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude of the search center
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Search radius in kilometres
        #[arg(long)]
        radius: Option<f64>,

        /// Maximum number of providers to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

/// Result of CLI command execution.
#[derive(Debug)]
pub struct CliResult {
    /// Exit code (0 = success)
    pub exit_code: i32,
    /// Output message
    pub message: String,
}

impl CliResult {
    /// Create a success result with the given message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            message: message.into(),
        }
    }

    /// Create an error result with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            message: message.into(),
        }
    }
}

impl From<anyhow::Result<String>> for CliResult {
    fn from(result: anyhow::Result<String>) -> Self {
        match result {
            Ok(output) => CliResult::success(output),
            Err(e) => CliResult::error(format!("Error: {:#}", e)),
        }
    }
}

/// Execute a CLI command.
pub async fn execute_command(command: Commands, config: &Config) -> CliResult {
    match command {
        Commands::Questions { assessment_type } => {
            CliResult::success(render_questions(&assessment_type.question_set()))
        }
        Commands::Assess {
            assessment_type,
            user,
            answers,
            profile,
            local_only,
        } => execute_assess(
            config,
            assessment_type,
            &user,
            &answers,
            profile.as_deref(),
            local_only,
        )
        .await
        .into(),
        Commands::History { user, limit } => execute_history(config, &user, limit).await.into(),
        Commands::Doctors {
            city,
            lat,
            lon,
            radius,
            limit,
        } => {
            let center = match (lat, lon) {
                (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
                _ => None,
            };
            execute_doctors(config, city.as_deref(), center, radius, limit)
                .await
                .into()
        }
    }
}

/// Execute assess command.
async fn execute_assess(
    config: &Config,
    assessment_type: AssessmentType,
    user: &str,
    answers_path: &Path,
    profile_path: Option<&Path>,
    local_only: bool,
) -> anyhow::Result<String> {
    let answers: BTreeMap<u32, u8> = read_json(answers_path)?;
    let profile: HealthProfile = match profile_path {
        Some(path) => read_json(path)?,
        None => HealthProfile::default(),
    };

    let mut session = AssessmentSession::for_type(assessment_type);
    fill_session(&mut session, &answers)?;

    let gateway = if local_only {
        None
    } else {
        build_gateway(config, assessment_type)?
    };
    let recorder = build_recorder(config).await?;

    let service =
        AssessmentService::new(gateway, recorder, config.prediction.confidence_scale);
    let report = service.finalize(&mut session, user, &profile).await?;

    Ok(render_report(&report))
}

/// Execute history command.
async fn execute_history(config: &Config, user: &str, limit: u32) -> anyhow::Result<String> {
    let storage = SqliteStorage::new(&config.database)
        .await
        .context("Failed to open assessment database")?;
    let records = storage.list_assessments(user, limit).await?;
    Ok(render_history(user, &records))
}

/// Execute doctors command.
async fn execute_doctors(
    config: &Config,
    city: Option<&str>,
    center: Option<Coordinates>,
    radius: Option<f64>,
    limit: usize,
) -> anyhow::Result<String> {
    let client = NominatimClient::new(&config.geo, &config.request)?;

    let (center, radius_km) = match (city, center) {
        (Some(city), _) => {
            let center = client
                .geocode(city)
                .await
                .with_context(|| format!("Could not locate '{}'", city))?;
            (center, radius.unwrap_or(DEFAULT_CITY_RADIUS_KM))
        }
        (None, Some(center)) => (center, radius.unwrap_or(DEFAULT_NEARBY_RADIUS_KM)),
        (None, None) => {
            info!("No location given, searching around the default location");
            (FALLBACK_LOCATION, radius.unwrap_or(DEFAULT_NEARBY_RADIUS_KM))
        }
    };

    if radius_km.is_nan() || radius_km <= 0.0 {
        bail!("Radius must be positive, got {}", radius_km);
    }

    let providers = client.search_nearby(center, radius_km).await?;
    Ok(render_providers(center, radius_km, &providers, limit))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Record every answer in the session, in question order.
fn fill_session(
    session: &mut AssessmentSession,
    answers: &BTreeMap<u32, u8>,
) -> anyhow::Result<()> {
    for (&question_id, &weight) in answers {
        session
            .answer(question_id, weight)
            .with_context(|| format!("Rejected answer for question {}", question_id))?;
    }

    if !session.is_complete() {
        let (answered, total) = session.progress();
        let missing: Vec<String> = session
            .questions()
            .questions()
            .iter()
            .filter(|q| session.answers().get(q.id).is_none())
            .map(|q| q.id.to_string())
            .collect();
        bail!(
            "Answered {} of {} questions; missing: {}",
            answered,
            total,
            missing.join(", ")
        );
    }
    Ok(())
}

fn build_gateway(
    config: &Config,
    assessment_type: AssessmentType,
) -> anyhow::Result<Option<Arc<dyn PredictionGateway>>> {
    let client = HttpPredictionClient::new(&config.prediction, config.request.clone())?;
    if !client.supports(assessment_type) {
        return Ok(None);
    }
    Ok(Some(Arc::new(client)))
}

async fn build_recorder(config: &Config) -> anyhow::Result<Arc<dyn AssessmentRecorder>> {
    match &config.remote_store {
        Some(remote) => Ok(Arc::new(RestRecorder::new(remote, &config.request)?)),
        None => {
            let storage = SqliteStorage::new(&config.database)
                .await
                .context("Failed to open assessment database")?;
            Ok(Arc::new(storage))
        }
    }
}

/// Render a question set with the weight of each option.
pub fn render_questions(questions: &QuestionSet) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n{} assessment ({} questions)\n",
        capitalize(questions.assessment_type().as_str()),
        questions.len()
    ));
    output.push_str(RULE);
    output.push('\n');

    for question in questions.questions() {
        output.push_str(&format!("{}. {}\n", question.id, question.text));
        for option in &question.options {
            output.push_str(&format!("    [{}] {}\n", option.weight, option.label));
        }
        output.push('\n');
    }

    output.push_str("Answer with a JSON object of question id to weight, e.g. {\"1\": 2}\n");
    output
}

/// Render the outcome of an assessment.
pub fn render_report(report: &AssessmentReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n{} Assessment Result\n",
        capitalize(report.assessment_type.as_str())
    ));
    output.push_str(RULE);
    output.push('\n');

    output.push_str(&format!("Risk Score: {:.0}/100\n", report.risk_score));
    output.push_str(&format!(
        "Risk Level: {} ({})\n",
        report.risk_category.as_str().to_uppercase(),
        report.risk_category.summary()
    ));
    output.push_str(&format!("Questionnaire Score: {}\n", report.local_score));

    let prediction = match (report.prediction, report.remote_label.as_deref()) {
        ("remote_success", Some(label)) => format!("remote model ({})", label),
        ("remote_failure", _) => "unavailable, questionnaire score used".to_string(),
        _ => "not requested".to_string(),
    };
    output.push_str(&format!("Prediction: {}\n", prediction));

    if let Some(stage) = report.estimated_stage {
        output.push_str(&format!("Estimated Stage: {}\n", stage));
    }

    output.push('\n');
    match &report.save {
        SaveStatus::Saved { id } => output.push_str(&format!("Saved as {}\n", id)),
        SaveStatus::Failed { reason } => {
            output.push_str(&format!("Not saved: {}\n", reason));
        }
    }

    output
}

/// Render a user's assessment history.
pub fn render_history(user: &str, records: &[AssessmentRecord]) -> String {
    let mut output = String::new();

    output.push_str(&format!("\nAssessment History for {}\n", user));
    output.push_str(RULE);
    output.push('\n');

    if records.is_empty() {
        output.push_str("No assessments recorded.\n");
        return output;
    }

    output.push_str(&format!("Showing {} assessment(s):\n\n", records.len()));
    for record in records {
        output.push_str(&format!(
            "{} | {:<9} | {:>5.1} | {}\n",
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            record.assessment_type,
            record.risk_score,
            record.risk_category.as_str().to_uppercase()
        ));
    }

    output
}

/// Render nearby providers, nearest first.
pub fn render_providers(
    center: Coordinates,
    radius_km: f64,
    providers: &[Provider],
    limit: usize,
) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\nProviders within {:.0} km of {:.4}, {:.4}\n",
        radius_km, center.lat, center.lon
    ));
    output.push_str(RULE);
    output.push('\n');

    if providers.is_empty() {
        output.push_str("No hospitals or clinics found.\n");
        return output;
    }

    let shown = providers.len().min(limit);
    output.push_str(&format!(
        "Showing {} of {} provider(s):\n\n",
        shown,
        providers.len()
    ));

    for (i, provider) in providers.iter().take(limit).enumerate() {
        output.push_str(&format!(
            "{}. {} ({:.1} km, ~{} min)\n",
            i + 1,
            provider.name,
            provider.distance_km,
            provider.travel_minutes()
        ));
        output.push_str(&format!("    {}\n", provider.address));
        output.push_str(&format!("    {}\n", route_url(center, provider.location)));
    }

    output
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
