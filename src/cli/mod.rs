//! CLI command implementations for aihub.
//!
//! Provides subcommand handlers for:
//! - `aihub preview <file>` / `aihub columns <file>`: local parsing and stats
//! - `aihub analyze <file> --column <name>`: upload, classify, report
//! - `aihub download <result_id>`: fetch a result artifact
//! - `aihub init` / `status` / `watch` / `info`: classifier model lifecycle
//! - `aihub health`: config and service reachability
//! - `aihub history`: past analysis runs
//! - `aihub config show|init|set|reset`: configuration management

use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use colored::Colorize;

use crate::classifier::{ClassifierClient, ModelState, ModelStatus};
use crate::config;
use crate::history::reporter::{self, HistoryStats};
use crate::history::{HistoryEntry, HistoryLog};
use crate::ingest::stats::{self, ColumnStats, DatasetOverview};
use crate::ingest::{SpreadsheetParser, UploadedData};
use crate::report::{self, ResultView};
use crate::workflow::{AnalysisResult, Workflow};

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// Widest a preview cell is allowed to render in table output.
const MAX_CELL_WIDTH: usize = 24;

/// Width of the terminal bar chart.
const BAR_WIDTH: usize = 30;

// ---------------------------------------------------------------------------
// aihub preview
// ---------------------------------------------------------------------------

/// Parse a spreadsheet locally and show the header row and preview rows.
pub fn run_preview(file: &Path, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let data = SpreadsheetParser::from_config(&cfg.upload).parse_path(file)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&data)?),
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            writer.write_record(&data.headers)?;
            for row in &data.rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        OutputFormat::Table => print_preview_table(&data),
    }

    Ok(())
}

fn print_preview_table(data: &UploadedData) {
    println!(
        "{}",
        format!("Preview: {} ({})", data.file_name, data.kind)
            .bold()
            .cyan()
    );
    println!(
        "  {} {}   {} {}   {} {}",
        "Columns:".bold(),
        data.headers.len(),
        "Rows:".bold(),
        format_number(data.total_rows as u64),
        "Showing:".bold(),
        data.rows.len(),
    );
    println!();

    if data.headers.is_empty() {
        return;
    }

    let widths: Vec<usize> = (0..data.headers.len())
        .map(|i| {
            data.rows
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(data.headers[i].chars().count()))
                .max()
                .unwrap_or(0)
                .min(MAX_CELL_WIDTH)
        })
        .collect();

    let header = format_row(&data.headers, &widths);
    println!("  {}", header.bold());
    println!("  {}", "-".repeat(header.chars().count()));

    for (i, row) in data.rows.iter().enumerate() {
        let line = format_row(row, &widths);
        if i % 2 == 0 {
            println!("  {line}");
        } else {
            println!("  {}", line.dimmed());
        }
    }

    if data.total_rows > data.rows.len() {
        println!();
        println!(
            "  {}",
            format!(
                "… {} more rows not shown",
                format_number((data.total_rows - data.rows.len()) as u64)
            )
            .dimmed()
        );
    }
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{:<width$}", truncate(cell, width)))
        .collect::<Vec<_>>()
        .join(" | ")
}

// ---------------------------------------------------------------------------
// aihub columns
// ---------------------------------------------------------------------------

/// Show per-column statistics and the dataset overview.
///
/// Uses every data row unless `preview_only` is set.
pub fn run_columns(file: &Path, preview_only: bool, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let data = SpreadsheetParser::from_config(&cfg.upload).parse_path(file)?;

    let rows = if preview_only {
        data.rows.as_slice()
    } else {
        data.all_rows()
    };
    let columns = stats::column_stats(&data.headers, rows);
    let overview = stats::overview(&columns, rows.len());

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "file": data.file_name,
                "preview_only": preview_only,
                "overview": overview,
                "columns": columns,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Csv => print_columns_csv(&columns)?,
        OutputFormat::Table => print_columns_table(&data, &overview, &columns, preview_only),
    }

    Ok(())
}

fn print_columns_table(
    data: &UploadedData,
    overview: &DatasetOverview,
    columns: &[ColumnStats],
    preview_only: bool,
) {
    println!("{}", format!("Column Statistics: {}", data.file_name).bold().cyan());
    println!("{}", "=".repeat(60));
    if preview_only {
        println!("  {}", "(computed over preview rows only)".dimmed());
    }
    println!("  {} {}", "Columns:     ".bold(), overview.total_columns);
    println!(
        "  {} {}",
        "Rows:        ".bold(),
        format_number(overview.total_rows as u64)
    );
    println!("  {} {:.1}%", "Completeness:".bold(), overview.completeness);
    println!("  {} {}", "Numeric:     ".bold(), overview.numeric_columns);
    println!();

    println!(
        "  {:<24} {:>8} {:>8} {:>12} {:>12} {:>12}",
        "Column", "Filled", "Empty", "Min", "Max", "Avg"
    );
    println!("  {}", "-".repeat(80));

    for column in columns {
        let (min, max, avg) = if column.is_numeric {
            (
                format_stat(column.min),
                format_stat(column.max),
                format_stat(column.avg),
            )
        } else {
            ("-".to_string(), "-".to_string(), "-".to_string())
        };
        println!(
            "  {:<24} {:>8} {:>8} {:>12} {:>12} {:>12}",
            truncate(&column.name, 24),
            column.total_values,
            column.empty_values,
            min,
            max,
            avg,
        );
    }
}

fn print_columns_csv(columns: &[ColumnStats]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record(["column", "filled", "empty", "numeric", "min", "max", "avg"])?;
    for c in columns {
        writer.write_record([
            c.name.clone(),
            c.total_values.to_string(),
            c.empty_values.to_string(),
            c.is_numeric.to_string(),
            c.min.map(|v| v.to_string()).unwrap_or_default(),
            c.max.map(|v| v.to_string()).unwrap_or_default(),
            c.avg.map(|v| v.to_string()).unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn format_stat(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{v:.0}"),
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}

// ---------------------------------------------------------------------------
// aihub analyze
// ---------------------------------------------------------------------------

/// Options for `aihub analyze`.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub column: String,
    pub download: bool,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
}

/// Run the full workflow: parse locally, upload, classify, report, and
/// optionally download the result artifact.
pub fn run_analyze(file: &Path, opts: &AnalyzeOptions) -> Result<()> {
    let cfg = config::load();
    let client = ClassifierClient::new(&cfg.classifier);
    let history = HistoryLog::from_config(&cfg.history);

    let mut workflow = Workflow::new(SpreadsheetParser::from_config(&cfg.upload));
    workflow.select_path(file)?;
    workflow.select_column(&opts.column)?;

    let file_name = workflow.file_name().unwrap_or_default().to_string();
    let total_rows = workflow.data().map(|d| d.total_rows).unwrap_or(0);

    let started = Instant::now();
    let spinner = Spinner::start(format!(
        "Analyzing '{}' in {} ({} rows)",
        opts.column,
        file_name,
        format_number(total_rows as u64)
    ));
    let outcome = workflow.analyze(&client).map(|r| r.clone());
    spinner.stop();
    let latency_ms = started.elapsed().as_millis() as u64;

    let result = match outcome {
        Ok(result) => {
            history.record(&HistoryEntry::success(&result, &file_name, total_rows, latency_ms));
            result
        }
        Err(e) => {
            history.record(&HistoryEntry::failure(
                &file_name,
                &opts.column,
                total_rows,
                &format!("{e:#}"),
                latency_ms,
            ));
            return Err(e.into());
        }
    };

    let view = report::render(&result.summary);
    match opts.format {
        OutputFormat::Json => print_result_json(&file_name, &result, &view)?,
        OutputFormat::Csv => print_result_csv(&view)?,
        OutputFormat::Table => print_result_table(&file_name, &result, &view),
    }

    if opts.download {
        let (name, bytes) = workflow.download(&client)?;
        let path = resolve_output(opts.output.as_deref(), &cfg.output.download_dir, &name);
        let saved = save_to(&path, &bytes)?;
        eprintln!("{} Saved results to {}", "✓".green().bold(), saved.display());
    } else if opts.format == OutputFormat::Table {
        println!();
        println!(
            "  {} aihub download {}",
            "Download:".dimmed(),
            result.result_id
        );
    }

    Ok(())
}

fn print_result_table(file_name: &str, result: &AnalysisResult, view: &ResultView) {
    println!("{}", "Complaint Analysis Results".bold().cyan());
    println!("{}", "=".repeat(60));
    println!("  {} {}", "File:           ".bold(), file_name);
    println!("  {} {}", "Column:         ".bold(), result.text_column);
    println!(
        "  {} {}",
        "Total processed:".bold(),
        format_number(view.total_processed)
    );
    println!(
        "  {} {} ({:.1}%)",
        "Complaints:     ".bold(),
        format_number(view.complaints().count).red(),
        view.complaints().percentage
    );
    println!(
        "  {} {} ({:.1}%)",
        "Non-complaints: ".bold(),
        format_number(view.non_complaints().count).green(),
        view.non_complaints().percentage
    );
    println!("  {} {:.1}%", "Accuracy:       ".bold(), view.accuracy);
    if let Some(confidence) = view.average_confidence {
        println!("  {} {:.2}", "Avg confidence: ".bold(), confidence);
    }
    if let Some(seconds) = view.processing_time {
        println!("  {} {:.1}s", "Processing time:".bold(), seconds);
    }
    println!("  {} {}", "Result id:      ".bold(), result.result_id);
    println!();

    println!("{}", "Distribution".bold().cyan());
    for (line, class) in report::bar_chart_lines(view, BAR_WIDTH)
        .into_iter()
        .zip(&view.classes)
    {
        if class.color == report::COMPLAINT_COLOR {
            println!("  {}", line.red());
        } else {
            println!("  {}", line.green());
        }
    }

    if !view.partition_consistent {
        println!();
        println!(
            "  {} complaints ({}) + non-complaints ({}) != total processed ({})",
            "Warning:".yellow().bold(),
            view.complaints().count,
            view.non_complaints().count,
            view.total_processed,
        );
    }
}

fn print_result_json(file_name: &str, result: &AnalysisResult, view: &ResultView) -> Result<()> {
    let value = serde_json::json!({
        "file": file_name,
        "text_column": result.text_column,
        "result_id": result.result_id,
        "filename": result.filename,
        "summary": result.summary,
        "chart": view.classes,
        "partition_consistent": view.partition_consistent,
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_result_csv(view: &ResultView) -> Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record(["label", "count", "percentage", "color"])?;
    for class in &view.classes {
        writer.write_record([
            class.label.to_string(),
            class.count.to_string(),
            format!("{:.1}", class.percentage),
            class.color.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// aihub download
// ---------------------------------------------------------------------------

/// Fetch a result artifact by id.
pub fn run_download(result_id: &str, output: Option<&Path>, name: Option<&str>) -> Result<()> {
    use crate::classifier::ClassifierApi;

    let cfg = config::load();
    let client = ClassifierClient::new(&cfg.classifier);

    let bytes = client.download(result_id)?;
    let file_name = name
        .map(str::to_string)
        .unwrap_or_else(|| report::result_id_file_name(result_id));
    let path = resolve_output(output, &cfg.output.download_dir, &file_name);
    let saved = save_to(&path, &bytes)?;

    println!(
        "{} Saved {} to {}",
        "✓".green().bold(),
        format_bytes(bytes.len()),
        saved.display()
    );
    Ok(())
}

/// Where a download goes.
///
/// An explicit `output` that is an existing directory (or ends in a path
/// separator) receives `file_name`; any other explicit `output` is the file
/// path itself. Without `output`, the file lands in the configured download
/// directory, or the working directory when that is empty.
pub fn resolve_output(output: Option<&Path>, download_dir: &str, file_name: &str) -> PathBuf {
    match output {
        Some(path) => {
            let text = path.to_string_lossy();
            if path.is_dir() || text.ends_with('/') || text.ends_with('\\') {
                path.join(file_name)
            } else {
                path.to_path_buf()
            }
        }
        None => match config::schema::expand_home(download_dir) {
            Some(dir) if !download_dir.is_empty() => dir.join(file_name),
            _ => PathBuf::from(file_name),
        },
    }
}

fn save_to(path: &Path, bytes: &[u8]) -> Result<PathBuf> {
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("download path has no file name")?;
    report::save_artifact(bytes, dir, file_name)
}

// ---------------------------------------------------------------------------
// aihub init | status | watch | info
// ---------------------------------------------------------------------------

/// Ask the classifier service to load its model.
pub fn run_init_model() -> Result<()> {
    let cfg = config::load();
    let client = ClassifierClient::new(&cfg.classifier);

    let resp = client.initialize()?;
    let message = if resp.message.is_empty() {
        "initialization requested"
    } else {
        resp.message.as_str()
    };
    println!("{} {}", "✓".green().bold(), message);
    println!(
        "  {}",
        "Run `aihub watch` to follow the model until it is ready.".dimmed()
    );
    Ok(())
}

/// Print a single model status snapshot.
pub fn run_status(format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let client = ClassifierClient::new(&cfg.classifier);
    let status = client.status()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        OutputFormat::Csv => {
            println!("status,model_loaded,device,memory_usage,predictions_today");
            println!(
                "{},{},{},{},{}",
                status.status,
                status.model_loaded,
                status.device.as_deref().unwrap_or(""),
                status.memory_usage_display().unwrap_or_default(),
                status
                    .predictions_today
                    .map(|p| p.to_string())
                    .unwrap_or_default(),
            );
        }
        OutputFormat::Table => print_status_table(client.base_url(), &status),
    }
    Ok(())
}

fn print_status_table(base_url: &str, status: &ModelStatus) {
    println!("{}", "Classifier Model Status".bold().cyan());
    println!("{}", "=".repeat(40));
    println!("  {} {}", "Service:     ".bold(), base_url);
    println!("  {} {}", "Status:      ".bold(), colorize_state(status.status));
    println!(
        "  {} {}",
        "Model loaded:".bold(),
        if status.model_loaded { "yes".green() } else { "no".yellow() }
    );
    if let Some(device) = &status.device {
        println!("  {} {}", "Device:      ".bold(), device);
    }
    if let Some(memory) = status.memory_usage_display() {
        println!("  {} {}", "Memory:      ".bold(), memory);
    }
    if let Some(count) = status.predictions_today {
        println!("  {} {}", "Predictions: ".bold(), format_number(count));
    }
}

/// Poll `/status` on the configured interval.
///
/// Stops after `count` polls when given; otherwise runs until interrupted.
/// A failed poll is reported and the loop carries on.
pub fn run_watch(count: Option<u32>) -> Result<()> {
    let cfg = config::load();
    let client = ClassifierClient::new(&cfg.classifier);
    let interval = client.poll_interval();

    println!(
        "{} {} every {}s (Ctrl+C to stop)",
        "Watching".bold().cyan(),
        client.base_url(),
        interval.as_secs()
    );

    let mut polls = 0u32;
    loop {
        let time = chrono::Local::now().format("%H:%M:%S");
        match client.status() {
            Ok(status) => {
                let mut line = format!(
                    "{} model_loaded={}",
                    colorize_state(status.status),
                    status.model_loaded
                );
                if let Some(device) = &status.device {
                    line.push_str(&format!(" device={device}"));
                }
                if let Some(memory) = status.memory_usage_display() {
                    line.push_str(&format!(" memory={memory}"));
                }
                if let Some(predictions) = status.predictions_today {
                    line.push_str(&format!(" predictions_today={predictions}"));
                }
                println!("  {} {}", time.to_string().dimmed(), line);
            }
            Err(e) => println!("  {} {}", time.to_string().dimmed(), format!("{e:#}").red()),
        }

        polls += 1;
        if count.is_some_and(|n| polls >= n) {
            break;
        }
        thread::sleep(interval);
    }

    Ok(())
}

/// Print the service's `/info` document.
pub fn run_info() -> Result<()> {
    let cfg = config::load();
    let client = ClassifierClient::new(&cfg.classifier);
    let info = client.service_info()?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

fn colorize_state(state: ModelState) -> colored::ColoredString {
    let text = state.to_string();
    match state {
        ModelState::Ready => text.green(),
        ModelState::Loading => text.yellow(),
        ModelState::Error => text.red(),
        ModelState::Unknown => text.normal(),
    }
}

// ---------------------------------------------------------------------------
// aihub health
// ---------------------------------------------------------------------------

/// Check config files, classifier reachability, and the history log.
pub fn run_health() -> Result<()> {
    println!("{}", "aihub Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let cfg = config::load();
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.aihub/config.toml found"
        } else {
            "not found (run `aihub config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".aihub.toml found"
        } else {
            "none (optional)"
        },
    );

    let client = ClassifierClient::new(&cfg.classifier);
    let reachable = client.is_healthy();
    print_health_item(
        "Classifier service",
        reachable,
        &if reachable {
            format!("reachable at {}", client.base_url())
        } else {
            format!("not reachable at {} (is the service running?)", client.base_url())
        },
    );

    if reachable {
        match client.status() {
            Ok(status) => print_health_item(
                "Model",
                status.status == ModelState::Ready,
                &if status.status == ModelState::Ready {
                    "ready".to_string()
                } else {
                    format!("{} (run `aihub init` to load it)", status.status)
                },
            ),
            Err(e) => print_health_item("Model", false, &format!("{e:#}")),
        }
    }

    print_health_item(
        "Upload formats",
        !cfg.upload.allowed_extensions.is_empty(),
        &cfg.upload.allowed_extensions.join(", "),
    );

    let history = HistoryLog::from_config(&cfg.history);
    match history.path() {
        Some(path) if path.exists() => print_health_item(
            "History log",
            true,
            &format!("{} entries", history.read_all().len()),
        ),
        Some(_) => print_health_item("History log", true, "no log file yet"),
        None => print_health_item("History log", false, "disabled"),
    }

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// aihub history
// ---------------------------------------------------------------------------

/// Summarize past analysis runs.
pub fn run_history(format: OutputFormat, days: Option<u32>) -> Result<()> {
    let cfg = config::load();
    let log = HistoryLog::from_config(&cfg.history);
    let stats = reporter::compute_stats(&log, days);

    if stats.total_runs == 0 {
        println!(
            "{}",
            "No analysis history yet. Run `aihub analyze` to record some.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Csv => print_history_csv(&stats)?,
        OutputFormat::Table => print_history_table(&stats, days),
    }

    Ok(())
}

fn print_history_table(stats: &HistoryStats, days: Option<u32>) {
    let title = match days {
        Some(d) => format!("Analysis History (last {d} days)"),
        None => "Analysis History".to_string(),
    };
    println!("{}", title.bold().cyan());
    println!("{}", "=".repeat(60));
    println!(
        "  {} {} ({} ok, {} failed)",
        "Runs:           ".bold(),
        stats.total_runs,
        stats.successful_runs,
        stats.failed_runs
    );
    println!(
        "  {} {}",
        "Rows processed: ".bold(),
        format_number(stats.total_processed)
    );
    println!(
        "  {} {} ({:.1}%)",
        "Complaints:     ".bold(),
        format_number(stats.total_complaints),
        stats.complaint_rate
    );
    println!("  {} {:.1}%", "Avg accuracy:   ".bold(), stats.avg_accuracy);
    println!("  {} {}ms", "Avg latency:    ".bold(), stats.avg_latency_ms);
    println!();

    if !stats.files.is_empty() {
        println!("{}", "By File".bold().cyan());
        println!(
            "  {:<28} {:>5} {:>10} {:>10} {:>8}",
            "File", "Runs", "Processed", "Complaints", "Rate"
        );
        println!("  {}", "-".repeat(65));
        for (i, file) in stats.files.iter().take(15).enumerate() {
            let line = format!(
                "  {:<28} {:>5} {:>10} {:>10} {:>7.1}%",
                truncate(&file.file_name, 28),
                file.runs,
                format_number(file.total_processed),
                format_number(file.total_complaints),
                file.complaint_rate,
            );
            if i % 2 == 0 {
                println!("{line}");
            } else {
                println!("{}", line.dimmed());
            }
        }
        println!();
    }

    if !stats.daily.is_empty() {
        println!("{}", "Daily".bold().cyan());
        println!(
            "  {:<12} {:>5} {:>10} {:>10}",
            "Date", "Runs", "Processed", "Complaints"
        );
        println!("  {}", "-".repeat(40));
        for day in &stats.daily {
            println!(
                "  {:<12} {:>5} {:>10} {:>10}",
                day.date,
                day.runs,
                format_number(day.total_processed),
                format_number(day.total_complaints),
            );
        }
    }
}

fn print_history_csv(stats: &HistoryStats) -> Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record([
        "file_name",
        "runs",
        "total_processed",
        "total_complaints",
        "complaint_rate",
        "last_run",
    ])?;
    for file in &stats.files {
        writer.write_record([
            file.file_name.clone(),
            file.runs.to_string(),
            file.total_processed.to_string(),
            file.total_complaints.to_string(),
            format!("{:.1}", file.complaint_rate),
            file.last_run.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// aihub config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective aihub Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source(global_exists, "~/.aihub/config.toml");
    print_source(project_exists, ".aihub.toml");
    println!("  {} {}", "·".dimmed(), "AIHUB_* environment variables".dimmed());

    Ok(())
}

fn print_source(exists: bool, label: &str) {
    if exists {
        println!("  {} {}", "✓".green(), label.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{label} (not found)").dimmed());
    }
}

/// Write a default config file to `~/.aihub/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!(
        "  {}",
        "Set classifier.base_url to point at your classifier service.".dimmed()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Spinner
// ---------------------------------------------------------------------------

/// Indeterminate progress indicator on stderr.
///
/// Silent when stderr is not a terminal, so piped output stays clean.
struct Spinner {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Spinner {
    const FRAMES: [&'static str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

    fn start(message: String) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        if !std::io::stderr().is_terminal() {
            return Self { stop, handle: None };
        }

        let flag = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            let started = Instant::now();
            let mut frame = 0;
            while !flag.load(Ordering::Relaxed) {
                let mut stderr = std::io::stderr();
                let _ = write!(
                    stderr,
                    "\r{} {} {}",
                    Self::FRAMES[frame % Self::FRAMES.len()].cyan(),
                    message,
                    format!("{}s", started.elapsed().as_secs()).dimmed()
                );
                let _ = stderr.flush();
                frame += 1;
                thread::sleep(Duration::from_millis(100));
            }
            let _ = write!(std::io::stderr(), "\r\x1b[2K");
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }

    fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format a number with comma separators for readability.
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Human-readable byte count.
fn format_bytes(n: usize) -> String {
    const KB: f64 = 1024.0;
    let n = n as f64;
    if n < KB {
        format!("{n} B")
    } else if n < KB * KB {
        format!("{:.1} KB", n / KB)
    } else {
        format!("{:.1} MB", n / (KB * KB))
    }
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("réclamation", 4), "réc…");
    }

    #[test]
    fn test_format_stat() {
        assert_eq!(format_stat(Some(12.0)), "12");
        assert_eq!(format_stat(Some(2.5)), "2.50");
        assert_eq!(format_stat(None), "-");
    }

    #[test]
    fn test_format_row_pads_and_truncates() {
        let cells = vec!["id".to_string(), "a very long complaint text".to_string()];
        let row = format_row(&cells, &[3, 6]);
        assert_eq!(row, "id  | a ver…");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("csv")), OutputFormat::Csv);
        assert_eq!(
            OutputFormat::from_str_opt(Some("unknown")),
            OutputFormat::Table
        );
    }

    #[test]
    fn test_resolve_output() {
        assert_eq!(
            resolve_output(None, "", "complaint_analysis_a.csv"),
            PathBuf::from("complaint_analysis_a.csv")
        );
        assert_eq!(
            resolve_output(None, "/srv/out", "r.xlsx"),
            PathBuf::from("/srv/out/r.xlsx")
        );
        assert_eq!(
            resolve_output(Some(Path::new("/srv/custom.xlsx")), "/srv/out", "r.xlsx"),
            PathBuf::from("/srv/custom.xlsx")
        );
        assert_eq!(
            resolve_output(Some(Path::new("reports/")), "", "r.xlsx"),
            PathBuf::from("reports/r.xlsx")
        );
        let tmp = std::env::temp_dir();
        assert_eq!(resolve_output(Some(&tmp), "", "r.xlsx"), tmp.join("r.xlsx"));
    }
}
