//! LearnSmart CLI - Command-line interface for the LearnSmart engine
//!
//! Commands:
//! - analyze: Score, assess and store keyed daily submissions (batch mode)
//! - score: Analyze a single day given on the command line
//! - validate: Validate submission schema
//! - doctor: Diagnose configuration and classifier artifact health
//! - config: Print the default engine configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use learnsmart_engine::classifier::{ArtifactClassifier, BurnoutClassifier};
use learnsmart_engine::encoder::{DailyReport, ReportEncoder};
use learnsmart_engine::schema::{MetricsSubmission, SubmissionAdapter};
use learnsmart_engine::types::FEATURE_NAMES;
use learnsmart_engine::{
    DailyMetrics, EngineConfig, LearnSmartEngine, MoodLevel, StudyProcessor, ENGINE_VERSION,
    PRODUCER_NAME,
};

/// LearnSmart - Productivity scoring, burnout risk and study suggestions
#[derive(Parser)]
#[command(name = "learnsmart")]
#[command(author = "LearnSmart Contributors")]
#[command(version = ENGINE_VERSION)]
#[command(
    about = "Turn daily study metrics into scores, burnout risk and suggestions",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze keyed daily submissions and emit one report per submission
    Analyze {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, value_enum, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, value_enum, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Engine configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Load record history from file
        #[arg(long)]
        load_history: Option<PathBuf>,

        /// Save record history to file after processing
        #[arg(long)]
        save_history: Option<PathBuf>,
    },

    /// Analyze one day of metrics given as arguments
    Score {
        /// Hours spent studying
        #[arg(long)]
        study: f64,

        /// Hours slept
        #[arg(long)]
        sleep: f64,

        /// Hours of breaks
        #[arg(long = "break")]
        break_time: f64,

        /// Hours of screen time
        #[arg(long)]
        screen: f64,

        /// Mood level (Low, Medium or High)
        #[arg(long, value_parser = parse_mood)]
        mood: MoodLevel,

        /// Engine configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pretty-print the analysis
        #[arg(long)]
        pretty: bool,
    },

    /// Validate submissions without analyzing them
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, value_enum, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose engine health and configuration
    Doctor {
        /// Engine configuration file to check
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Classifier artifact to check (overrides the configured one)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the default engine configuration as TOML
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one submission per line)
    Ndjson,
    /// JSON array of submissions
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one report per line)
    Ndjson,
    /// JSON array of reports
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let error = serde_json::to_string(&CliError::from(e))
                .unwrap_or_else(|_| "Unknown error".to_string());
            eprintln!("{}", error);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), LearnSmartCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            output,
            input_format,
            output_format,
            config,
            load_history,
            save_history,
        } => cmd_analyze(
            &input,
            &output,
            input_format,
            output_format,
            config.as_deref(),
            load_history.as_deref(),
            save_history.as_deref(),
        ),

        Commands::Score {
            study,
            sleep,
            break_time,
            screen,
            mood,
            config,
            pretty,
        } => {
            let metrics = DailyMetrics::new(study, sleep, break_time, screen, mood);
            cmd_score(&metrics, config.as_deref(), pretty)
        }

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor {
            config,
            model,
            json,
        } => cmd_doctor(config.as_deref(), model.as_deref(), json),

        Commands::Config => cmd_config(),
    }
}

fn cmd_analyze(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    config: Option<&Path>,
    load_history: Option<&Path>,
    save_history: Option<&Path>,
) -> Result<(), LearnSmartCliError> {
    let input_data = read_input(input)?;
    let submissions = parse_submissions(&input_data, input_format)?;

    if submissions.is_empty() {
        return Err(LearnSmartCliError::NoSubmissions);
    }

    let config = load_config(config)?;
    let mut processor = StudyProcessor::with_config(&config);

    if let Some(history_path) = load_history {
        let history_json = fs::read_to_string(history_path)?;
        processor.load_history(&history_json)?;
    }

    let reports = analyze_submissions(&mut processor, &submissions)?;
    info!("Analyzed {} submissions", reports.len());

    if let Some(history_path) = save_history {
        let history_json = processor.save_history()?;
        fs::write(history_path, history_json)?;
    }

    let output_data = format_output(&reports, output_format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_score(
    metrics: &DailyMetrics,
    config: Option<&Path>,
    pretty: bool,
) -> Result<(), LearnSmartCliError> {
    let config = load_config(config)?;
    let analysis = LearnSmartEngine::from_config(&config).analyze(metrics)?;

    if pretty {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        println!("{}", serde_json::to_string(&analysis)?);
    }
    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), LearnSmartCliError> {
    let input_data = read_input(input)?;
    let submissions = parse_submissions(&input_data, input_format)?;
    let report = build_validation_report(&submissions);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total submissions:   {}", report.total_submissions);
        println!("Valid submissions:   {}", report.valid_submissions);
        println!("Invalid submissions: {}", report.invalid_submissions);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - {} on {} (index {}): {}",
                    err.user_id.as_deref().unwrap_or("unknown"),
                    err.study_date.as_deref().unwrap_or("unknown date"),
                    err.index,
                    err.error
                );
            }
        }
    }

    if report.invalid_submissions > 0 {
        Err(LearnSmartCliError::ValidationFailed(report.invalid_submissions))
    } else {
        Ok(())
    }
}

fn cmd_doctor(
    config: Option<&Path>,
    model: Option<&Path>,
    json: bool,
) -> Result<(), LearnSmartCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck::ok(
        "engine_version",
        format!("LearnSmart engine version {}", ENGINE_VERSION),
    ));

    let (config_check, loaded) = check_config(config);
    checks.push(config_check);

    let mut engine_config = loaded.unwrap_or_default();
    if let Some(model) = model {
        engine_config.classifier.model_path = Some(model.to_path_buf());
    }
    checks.push(check_model(engine_config.classifier.model_path.as_deref()));
    checks.push(check_engine(&engine_config));

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck::ok("stdin", "stdin is a TTY (interactive mode)".to_string())
    } else {
        DoctorCheck::ok("stdin", "stdin is a pipe (batch input ready)".to_string())
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("LearnSmart Doctor Report");
        println!("========================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    if report.has_errors() {
        Err(LearnSmartCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_config() -> Result<(), LearnSmartCliError> {
    print!("{}", EngineConfig::default().to_toml_string()?);
    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, LearnSmartCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_submissions(
    data: &str,
    format: InputFormat,
) -> Result<Vec<MetricsSubmission>, LearnSmartCliError> {
    let submissions = match format {
        InputFormat::Ndjson => SubmissionAdapter::parse_ndjson(data)?,
        InputFormat::Json => SubmissionAdapter::parse_array(data)?,
    };
    debug!("Parsed {} submissions", submissions.len());
    Ok(submissions)
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, LearnSmartCliError> {
    match path {
        Some(path) => Ok(EngineConfig::load_from_path(path)?),
        None => Ok(EngineConfig::default()),
    }
}

fn parse_mood(label: &str) -> Result<MoodLevel, String> {
    MoodLevel::parse(label).ok_or_else(|| {
        format!("invalid mood level '{}' (expected Low, Medium or High)", label)
    })
}

fn analyze_submissions(
    processor: &mut StudyProcessor,
    submissions: &[MetricsSubmission],
) -> Result<Vec<DailyReport>, LearnSmartCliError> {
    let encoder = ReportEncoder::new();
    let records = processor.record_batch(submissions)?;
    let mut reports = Vec::with_capacity(records.len());
    for record in &records {
        reports.push(encoder.encode(record)?);
    }
    Ok(reports)
}

fn format_output(
    reports: &[DailyReport],
    format: OutputFormat,
) -> Result<String, LearnSmartCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for report in reports {
                lines.push(serde_json::to_string(report)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(reports)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(reports)?),
    }
}

fn build_validation_report(submissions: &[MetricsSubmission]) -> ValidationReport {
    let results = SubmissionAdapter::validate_all(submissions);

    ValidationReport {
        total_submissions: submissions.len(),
        valid_submissions: submissions.len() - results.len(),
        invalid_submissions: results.len(),
        errors: results
            .into_iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                user_id: r.user_id,
                study_date: r.study_date,
                error: r.error.to_string(),
            })
            .collect(),
    }
}

fn check_config(path: Option<&Path>) -> (DoctorCheck, Option<EngineConfig>) {
    let Some(path) = path else {
        return (
            DoctorCheck::ok("config", "Using built-in defaults".to_string()),
            Some(EngineConfig::default()),
        );
    };

    if !path.exists() {
        return (
            DoctorCheck::error("config", format!("Config file {} does not exist", path.display())),
            None,
        );
    }

    match EngineConfig::load_from_path(path) {
        Ok(config) => (
            DoctorCheck::ok("config", format!("Config file {} is valid", path.display())),
            Some(config),
        ),
        Err(e) => (DoctorCheck::error("config", e.to_string()), None),
    }
}

fn check_model(path: Option<&Path>) -> DoctorCheck {
    let Some(path) = path else {
        return DoctorCheck::warning(
            "classifier",
            "No classifier artifact configured (rules-only mode)".to_string(),
        );
    };

    if !path.exists() {
        return DoctorCheck::warning(
            "classifier",
            format!(
                "Artifact {} does not exist (assessments will degrade to rules only)",
                path.display()
            ),
        );
    }

    let classifier = match ArtifactClassifier::load(path) {
        Ok(classifier) => classifier,
        Err(e) => return DoctorCheck::error("classifier", e.to_string()),
    };

    let sample = DailyMetrics::new(6.0, 8.0, 2.0, 5.0, MoodLevel::High).features();
    match classifier.predict_proba(&sample) {
        Ok(probabilities) => DoctorCheck::ok(
            "classifier",
            format!(
                "Loaded {} (sample prediction: {})",
                classifier.describe(),
                probabilities.most_likely()
            ),
        ),
        Err(e) => DoctorCheck::error("classifier", format!("Sample prediction failed: {}", e)),
    }
}

fn check_engine(config: &EngineConfig) -> DoctorCheck {
    let engine = LearnSmartEngine::from_config(config);
    let mode = if engine.risk_engine().has_classifier() {
        "classifier-assisted"
    } else {
        "rules-only"
    };
    DoctorCheck::ok(
        "risk_engine",
        format!(
            "Burnout risk engine is {} (features: {})",
            mode,
            FEATURE_NAMES.join(", ")
        ),
    )
}

// Error types

#[derive(Debug)]
enum LearnSmartCliError {
    Io(io::Error),
    Compute(learnsmart_engine::ComputeError),
    Json(serde_json::Error),
    NoSubmissions,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for LearnSmartCliError {
    fn from(e: io::Error) -> Self {
        LearnSmartCliError::Io(e)
    }
}

impl From<learnsmart_engine::ComputeError> for LearnSmartCliError {
    fn from(e: learnsmart_engine::ComputeError) -> Self {
        LearnSmartCliError::Compute(e)
    }
}

impl From<serde_json::Error> for LearnSmartCliError {
    fn from(e: serde_json::Error) -> Self {
        LearnSmartCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<LearnSmartCliError> for CliError {
    fn from(e: LearnSmartCliError) -> Self {
        use learnsmart_engine::ComputeError;

        match e {
            LearnSmartCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            LearnSmartCliError::Compute(e) => {
                let (code, hint) = match &e {
                    ComputeError::InvalidInput(_) => {
                        ("VALIDATION_ERROR", "Run 'learnsmart validate' for details")
                    }
                    ComputeError::ConfigError(_) => {
                        ("CONFIG_ERROR", "Run 'learnsmart config' to see the expected layout")
                    }
                    ComputeError::HistoryError(_) => (
                        "HISTORY_ERROR",
                        "Check that the history file was written by 'learnsmart analyze'",
                    ),
                    ComputeError::ClassifierUnavailable(_) => {
                        ("CLASSIFIER_ERROR", "Run 'learnsmart doctor' to check the artifact")
                    }
                    ComputeError::EncodingError(_) => ("ENCODING_ERROR", "Report this as a bug"),
                    ComputeError::ParseError(_) | ComputeError::JsonError(_) => {
                        ("PARSE_ERROR", "Ensure input matches the submission schema")
                    }
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            LearnSmartCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            LearnSmartCliError::NoSubmissions => CliError {
                code: "NO_SUBMISSIONS".to_string(),
                message: "No submissions found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            LearnSmartCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} submissions failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            LearnSmartCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_submissions: usize,
    valid_submissions: usize,
    invalid_submissions: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    user_id: Option<String>,
    study_date: Option<String>,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    fn has_errors(&self) -> bool {
        self.checks.iter().any(|c| matches!(c.status, CheckStatus::Error))
    }
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

impl DoctorCheck {
    fn ok(name: &str, message: String) -> Self {
        Self::with_status(name, CheckStatus::Ok, message)
    }

    fn warning(name: &str, message: String) -> Self {
        Self::with_status(name, CheckStatus::Warning, message)
    }

    fn error(name: &str, message: String) -> Self {
        Self::with_status(name, CheckStatus::Error, message)
    }

    fn with_status(name: &str, status: CheckStatus, message: String) -> Self {
        Self {
            name: name.to_string(),
            status,
            message,
        }
    }
}

#[derive(Debug, PartialEq, serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use learnsmart_engine::RecordStore;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const NDJSON: &str = r#"{"user_id": "s1", "study_date": "2024-03-01", "study_hours": 6, "sleep_hours": 8, "break_time": 2, "screen_time": 5, "mood_level": "High"}
{"user_id": "s1", "study_date": "2024-03-02", "study_hours": "9.5", "sleep_hours": 4, "break_time": 0.5, "screen_time": 11, "mood_level": "Low"}
"#;

    fn bundled_model() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("models/burnout_tree.json")
    }

    #[test]
    fn test_parse_mood() {
        assert_eq!(parse_mood("High").unwrap(), MoodLevel::High);
        assert!(parse_mood("ecstatic").unwrap_err().contains("ecstatic"));
    }

    #[test]
    fn test_analyze_submissions_ndjson_output() {
        let submissions = parse_submissions(NDJSON, InputFormat::Ndjson).unwrap();
        let mut processor = StudyProcessor::new();
        let reports = analyze_submissions(&mut processor, &submissions).unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(processor.store().len(), 2);
        assert_eq!(reports[0].engine.instance_id, reports[1].engine.instance_id);

        let output = format_output(&reports, OutputFormat::Ndjson).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["record"]["study_date"], "2024-03-02");
        assert_eq!(second["record"]["assessment"]["risk_level"], "High");
    }

    #[test]
    fn test_analyze_stops_on_invalid_submission() {
        let data = r#"[{"user_id": "s1", "study_date": "2024-03-01", "study_hours": 30, "sleep_hours": 8, "break_time": 2, "screen_time": 5, "mood_level": "High"}]"#;
        let submissions = parse_submissions(data, InputFormat::Json).unwrap();
        let result = analyze_submissions(&mut StudyProcessor::new(), &submissions);

        let error = CliError::from(result.unwrap_err());
        assert_eq!(error.code, "VALIDATION_ERROR");
    }

    #[test]
    fn test_validation_report_counts() {
        let data = r#"[
            {"user_id": "s1", "study_date": "2024-03-01", "study_hours": 6, "sleep_hours": 8, "break_time": 2, "screen_time": 5, "mood_level": "High"},
            {"user_id": "s1", "study_date": "03/02/2024", "study_hours": 6, "sleep_hours": 8, "break_time": 2, "screen_time": 5, "mood_level": "High"},
            {"study_date": "2024-03-03", "study_hours": 6, "sleep_hours": 8, "break_time": 2, "screen_time": 5, "mood_level": "High"}
        ]"#;
        let submissions = parse_submissions(data, InputFormat::Json).unwrap();
        let report = build_validation_report(&submissions);

        assert_eq!(report.total_submissions, 3);
        assert_eq!(report.valid_submissions, 1);
        assert_eq!(report.invalid_submissions, 2);
        assert_eq!(report.errors[0].index, 1);
        assert!(report.errors[0].error.contains("03/02/2024"));
        assert_eq!(report.errors[1].user_id, None);
    }

    #[test]
    fn test_check_config() {
        let (check, config) = check_config(None);
        assert_eq!(check.status, CheckStatus::Ok);
        assert!(config.is_some());

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[suggestions]\nmax_suggestions = 0").unwrap();
        let (check, config) = check_config(Some(file.path()));
        assert_eq!(check.status, CheckStatus::Error);
        assert!(config.is_none());

        let (check, _) = check_config(Some(Path::new("/nonexistent/learnsmart.toml")));
        assert_eq!(check.status, CheckStatus::Error);
    }

    #[test]
    fn test_check_model() {
        assert_eq!(check_model(None).status, CheckStatus::Warning);
        assert_eq!(
            check_model(Some(Path::new("/nonexistent/model.json"))).status,
            CheckStatus::Warning
        );

        let check = check_model(Some(&bundled_model()));
        assert_eq!(check.status, CheckStatus::Ok);
        assert!(check.message.contains("decision_tree"));

        let mut corrupt = NamedTempFile::new().unwrap();
        write!(corrupt, "{{\"kind\": \"decision_tree\"}}").unwrap();
        assert_eq!(check_model(Some(corrupt.path())).status, CheckStatus::Error);
    }

    #[test]
    fn test_check_engine_reports_mode_and_features() {
        let check = check_engine(&EngineConfig::default());
        assert_eq!(check.status, CheckStatus::Ok);
        assert!(check.message.contains("rules-only"));
        assert!(check
            .message
            .contains("study_hours, sleep_hours, break_time, screen_time, mood_score"));

        let mut config = EngineConfig::default();
        config.classifier.model_path = Some(bundled_model());
        assert!(check_engine(&config).message.contains("classifier-assisted"));
    }

    #[test]
    fn test_analyze_failure_leaves_history_empty() {
        let data = format!(
            "{}\n{}",
            NDJSON.lines().next().unwrap(),
            r#"{"user_id": "s1", "study_date": "2024-03-02", "study_hours": 6, "sleep_hours": 8, "break_time": 2, "screen_time": 5, "mood_level": "Tired"}"#
        );
        let submissions = parse_submissions(&data, InputFormat::Ndjson).unwrap();
        let mut processor = StudyProcessor::new();

        assert!(analyze_submissions(&mut processor, &submissions).is_err());
        assert!(processor.store().is_empty());
    }

    #[test]
    fn test_cli_error_codes() {
        let error = CliError::from(LearnSmartCliError::ValidationFailed(2));
        assert_eq!(error.code, "VALIDATION_FAILED");
        assert!(error.message.contains('2'));

        let error = CliError::from(LearnSmartCliError::Compute(
            learnsmart_engine::ComputeError::ConfigError("bad".to_string()),
        ));
        assert_eq!(error.code, "CONFIG_ERROR");
    }
}
