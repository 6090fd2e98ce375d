// logsift CLI - rule-based log alerting

mod analyze;

use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use logsift_core::{AlertRecord, LogEntry, Severity};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::analyze::{read_log_file, severity_colored, truncate};

const DEFAULT_API_URL: &str = "http://localhost:3000";

#[derive(Parser)]
#[command(name = "logsift")]
#[command(version = "0.1.0")]
#[command(about = "Rule-based log alerting CLI", long_about = None)]
struct Cli {
    /// API server URL
    #[arg(short, long, env = "LOGSIFT_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// API key for authentication (or set LOGSIFT_API_KEY env var)
    #[arg(short = 'k', long, env = "LOGSIFT_API_KEY")]
    api_key: Option<String>,

    /// User id sent as X-User-Id
    #[arg(short, long, env = "LOGSIFT_USER", default_value = "local")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate alert rules over local log files
    Analyze {
        /// Log files, evaluated together in this order
        #[arg(required = true)]
        files: Vec<String>,

        /// TOML rule file (default: built-in ingestion rules)
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Print alerts as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how a local file is parsed
    Parse {
        file: String,

        /// Maximum records to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Create a project from log files on the server
    Upload {
        /// Project name
        name: String,

        /// .log files to upload
        #[arg(required = true)]
        files: Vec<String>,
    },

    /// List your projects
    Projects,

    /// Show parsed logs of a project
    Logs {
        project_id: String,

        /// Number of records to show per file
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// List alerts detected for a project
    Alerts { project_id: String },

    /// Run ingestion for a project now
    Ingest { project_id: String },

    /// Find alerts similar to a question
    Search {
        project_id: String,

        /// Search query
        query: String,

        /// Maximum results to return
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Ask a question about a project's alerts
    Chat {
        project_id: String,

        /// Question for the assistant
        question: String,
    },

    /// Check that the API server is up
    Status,
}

// API Response types
#[derive(Deserialize)]
struct CreateProjectResponse {
    project_id: String,
}

#[derive(Deserialize)]
struct ProjectsResponse {
    projects: Vec<ProjectItem>,
}

#[derive(Deserialize)]
struct ProjectItem {
    project_id: String,
    name: String,
    created_at: String,
}

#[derive(Deserialize)]
struct ProjectLogsResponse {
    files: Vec<LogFileItem>,
}

#[derive(Deserialize)]
struct LogFileItem {
    filename: String,
    logs: Vec<LogEntry>,
}

#[derive(Deserialize)]
struct AlertsResponse {
    alerts: Vec<AlertRecord>,
}

#[derive(Deserialize)]
struct IngestResponse {
    status: String,
    alerts: usize,
    embeddings: usize,
}

#[derive(Deserialize)]
struct SearchResult {
    score: f32,
    alert_name: String,
    severity: Severity,
    reason: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: String,
    context: Vec<ChatContext>,
}

#[derive(Deserialize)]
struct ChatContext {
    text: String,
    score: f32,
}

/// HTTP client bound to one server and user
struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    fn new(
        base_url: &str,
        user: &str,
        api_key: Option<&str>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        // Build client with user and optional API key headers
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("X-User-Id", reqwest::header::HeaderValue::from_str(user)?);
        if let Some(key) = api_key {
            headers.insert("X-API-Key", reqwest::header::HeaderValue::from_str(key)?);
        }
        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { files, rules, json } => {
            return analyze::analyze_files(&files, rules.as_deref(), json);
        }
        Commands::Parse { file, limit } => {
            return analyze::parse_file(&file, limit);
        }
        _ => {}
    }

    let api = ApiClient::new(&cli.api_url, &cli.user, cli.api_key.as_deref())?;

    match cli.command {
        Commands::Upload { name, files } => upload_project(&api, &name, &files).await?,
        Commands::Projects => list_projects(&api).await?,
        Commands::Logs { project_id, limit } => show_logs(&api, &project_id, limit).await?,
        Commands::Alerts { project_id } => show_alerts(&api, &project_id).await?,
        Commands::Ingest { project_id } => run_ingest(&api, &project_id).await?,
        Commands::Search {
            project_id,
            query,
            limit,
        } => search_alerts(&api, &project_id, &query, limit).await?,
        Commands::Chat {
            project_id,
            question,
        } => ask_project(&api, &project_id, &question).await?,
        Commands::Status => check_status(&api).await?,
        Commands::Analyze { .. } | Commands::Parse { .. } => {}
    }

    Ok(())
}

/// Print the error body and return None when the call failed
async fn ensure_success(
    response: reqwest::Response,
) -> Result<Option<reqwest::Response>, reqwest::Error> {
    if response.status().is_success() {
        return Ok(Some(response));
    }
    let status = response.status();
    let error = response.text().await?;
    println!("{} {} {}", "Error:".red().bold(), status, error);
    Ok(None)
}

async fn upload_project(
    api: &ApiClient,
    name: &str,
    files: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    println!("\n{} {}", "Uploading:".cyan().bold(), name);
    println!("{}", "─".repeat(40).dimmed());

    let mut form = Form::new().text("name", name.to_string());
    for file in files {
        let path = Path::new(file);
        let content = read_log_file(path)?;
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.clone());
        println!("  {} {} ({} bytes)", "File:".dimmed(), filename, content.len());
        form = form.part("files", Part::text(content).file_name(filename));
    }

    let response = api
        .client
        .post(api.url("/api/projects"))
        .multipart(form)
        .send()
        .await?;

    let Some(response) = ensure_success(response).await? else {
        return Ok(());
    };

    let created: CreateProjectResponse = response.json().await?;
    println!("\n{} Project created: {}", "✓".green().bold(), created.project_id.cyan());
    println!("  {}", "Alert detection is running in the background".dimmed());
    Ok(())
}

async fn list_projects(api: &ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    let response = api.client.get(api.url("/api/projects")).send().await?;
    let Some(response) = ensure_success(response).await? else {
        return Ok(());
    };

    let data: ProjectsResponse = response.json().await?;
    if data.projects.is_empty() {
        println!("{}", "No projects yet.".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Project", "Name", "Created"]);

    for p in &data.projects {
        let created = chrono::DateTime::parse_from_rfc3339(&p.created_at)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|_| p.created_at.clone());
        table.add_row(vec![p.project_id.clone(), p.name.clone(), created]);
    }

    println!("{table}");
    Ok(())
}

async fn show_logs(
    api: &ApiClient,
    project_id: &str,
    limit: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let url = api.url(&format!("/api/projects/{}/logs", urlencoding::encode(project_id)));
    let response = api.client.get(url).send().await?;
    let Some(response) = ensure_success(response).await? else {
        return Ok(());
    };

    let data: ProjectLogsResponse = response.json().await?;
    for file in &data.files {
        println!("\n{} {} ({} records)", "File:".cyan().bold(), file.filename, file.logs.len());
        println!("{}", "─".repeat(80).dimmed());

        for entry in file.logs.iter().take(limit) {
            println!(
                "{} {} {} {}",
                format!("{} {}", entry.date, entry.time).dimmed(),
                format!("[{}]", entry.level.as_str()),
                entry.category.cyan(),
                entry.message
            );
        }
    }

    Ok(())
}

async fn show_alerts(api: &ApiClient, project_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("\n{}", "Project Alerts".cyan().bold());
    println!("{}", "─".repeat(60).dimmed());

    let url = api.url(&format!("/api/projects/{}/alerts", urlencoding::encode(project_id)));
    let response = api.client.get(url).send().await?;
    let Some(response) = ensure_success(response).await? else {
        return Ok(());
    };

    let data: AlertsResponse = response.json().await?;
    if data.alerts.is_empty() {
        println!("  {} No alerts (ingestion may still be running)", "✓".green());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Severity", "Rule", "Reason", "Logs", "Detected"]);

    for record in &data.alerts {
        table.add_row(vec![
            severity_colored(record.alert.severity),
            record.alert.name.clone(),
            truncate(&record.alert.reason, 45),
            record.alert.stats.count.to_string(),
            record.time_detected.clone(),
        ]);
    }

    println!("{table}");
    println!("\n{} {} alerts", "Total:".dimmed(), data.alerts.len().to_string().yellow());
    Ok(())
}

async fn run_ingest(api: &ApiClient, project_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let url = api.url(&format!("/api/projects/{}/ingest", urlencoding::encode(project_id)));
    let response = api.client.post(url).send().await?;
    let Some(response) = ensure_success(response).await? else {
        return Ok(());
    };

    let result: IngestResponse = response.json().await?;
    println!(
        "{} {} | {} {} | {} {}",
        "Status:".dimmed(),
        result.status.cyan(),
        "Alerts:".dimmed(),
        result.alerts.to_string().yellow(),
        "Embeddings:".dimmed(),
        result.embeddings.to_string().magenta()
    );
    Ok(())
}

async fn search_alerts(
    api: &ApiClient,
    project_id: &str,
    query: &str,
    limit: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("\n{} \"{}\"", "Searching:".cyan().bold(), query);
    println!("{}", "─".repeat(60).dimmed());

    let url = api.url(&format!(
        "/api/projects/{}/search?q={}&limit={}",
        urlencoding::encode(project_id),
        urlencoding::encode(query),
        limit
    ));
    let response = api.client.get(url).send().await?;
    let Some(response) = ensure_success(response).await? else {
        return Ok(());
    };

    let results: Vec<SearchResult> = response.json().await?;
    if results.is_empty() {
        println!("{}", "No results found.".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Score", "Severity", "Rule", "Reason"]);

    for r in &results {
        table.add_row(vec![
            format!("{:.2}", r.score),
            severity_colored(r.severity),
            r.alert_name.clone(),
            truncate(&r.reason, 50),
        ]);
    }

    println!("{table}");
    println!("\n{} {}", "Found:".dimmed(), results.len().to_string().green());
    Ok(())
}

async fn ask_project(
    api: &ApiClient,
    project_id: &str,
    question: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("\n{} \"{}\"", "Asking:".cyan().bold(), question);
    println!("{}", "─".repeat(60).dimmed());

    let url = api.url(&format!("/api/projects/{}/chat", urlencoding::encode(project_id)));
    let body = serde_json::json!({ "messages": [{ "role": "user", "content": question }] });
    let response = api.client.post(url).json(&body).send().await?;
    let Some(response) = ensure_success(response).await? else {
        return Ok(());
    };

    let answer: ChatResponse = response.json().await?;
    println!("{}", answer.response);

    if !answer.context.is_empty() {
        println!("\n{}", "Based on:".dimmed());
        for c in &answer.context {
            println!("  {} {}", format!("{:.2}", c.score).green(), truncate(&c.text, 80));
        }
    }
    Ok(())
}

async fn check_status(api: &ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    print!("  API Server ({})... ", api.base_url);
    io::stdout().flush()?;

    match api.client.get(api.url("/health")).send().await {
        Ok(resp) if resp.status().is_success() => println!("{}", "✓ Running".green()),
        Ok(resp) => println!("{} ({})", "✗ Error".red(), resp.status()),
        Err(e) => println!("{} ({})", "✗ Down".red(), e),
    }

    Ok(())
}
