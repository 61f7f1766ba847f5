use clap::{Parser, Subcommand};
use report_core::constants::DEFAULT_REPORT_DATA_DIR;
use report_core::{
    io_timeout_from_env_value, resolve_template_dir, ConsultationId, CoreConfig, ExamType,
    FileReportStore, ReportService, ResetOutcome, Resolution, SubType, TemplateCatalog,
    YamlTemplateCatalog,
};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "report")]
#[command(about = "Clinical exam report CLI")]
struct Cli {
    /// Report data directory (default: $REPORT_DATA_DIR or ./report_data)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Template catalog directory (default: $REPORT_TEMPLATE_DIR or the bundled templates)
    #[arg(long, global = true)]
    template_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the template fields of an exam type's subtypes
    Templates {
        /// Exam type (echography, doppler, thyroid, ecg)
        exam_type: String,
        /// Only this subtype
        #[arg(long)]
        sub_type: Option<String>,
    },
    /// Resolve a report and show where its content came from
    Resolve {
        consultation_id: String,
        exam_type: String,
        #[arg(long)]
        sub_type: Option<String>,
    },
    /// Print the printable snapshot of a report as JSON
    Print {
        consultation_id: String,
        exam_type: String,
        #[arg(long)]
        sub_type: Option<String>,
    },
    /// Add a custom field and save the report
    AddField {
        consultation_id: String,
        exam_type: String,
        /// Label of the new field
        label: String,
        /// Initial content (optional)
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        sub_type: Option<String>,
    },
    /// Hide a field and save the report; its content is left out of the saved document
    Hide {
        consultation_id: String,
        exam_type: String,
        /// Field key
        key: String,
        #[arg(long)]
        sub_type: Option<String>,
    },
    /// Reset a template field to its default content and save the report
    Reset {
        consultation_id: String,
        exam_type: String,
        /// Field key
        key: String,
        #[arg(long)]
        sub_type: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("report_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'report --help' for commands");
        return Ok(());
    };

    let cfg = Arc::new(config(cli.data_dir, cli.template_dir)?);
    let catalog = Arc::new(YamlTemplateCatalog::new(cfg.template_dir()));
    let store = Arc::new(FileReportStore::new(cfg.reports_dir()));
    let service = ReportService::new(Arc::clone(&cfg), Arc::clone(&catalog), store);

    match command {
        Commands::Templates {
            exam_type,
            sub_type,
        } => {
            let exam_type: ExamType = exam_type.parse()?;
            let sub_types = match sub_type {
                Some(code) => vec![SubType::parse(exam_type, &code)?],
                None => exam_type
                    .sub_types()
                    .iter()
                    .map(|code| SubType::parse(exam_type, code))
                    .collect::<Result<_, _>>()?,
            };
            for sub_type in sub_types {
                match catalog.get_templates(sub_type).await {
                    Ok(templates) if templates.is_empty() => {
                        println!("{exam_type}/{sub_type}: no template");
                    }
                    Ok(templates) => {
                        println!("{exam_type}/{sub_type}:");
                        for field in templates.fields() {
                            println!(
                                "  {} ({}): {} default line(s)",
                                field.key,
                                field.label.as_str(),
                                field.lines.len()
                            );
                        }
                    }
                    Err(e) => {
                        eprintln!("Error reading templates for {exam_type}/{sub_type}: {}", e)
                    }
                }
            }
        }
        Commands::Resolve {
            consultation_id,
            exam_type,
            sub_type,
        } => {
            let resolution = open_report(&service, &consultation_id, &exam_type, sub_type).await?;
            let report = &resolution.report;
            println!(
                "Resolved {}/{}/{} from {:?}",
                report.consultation_id(),
                report.exam_type(),
                report.sub_type(),
                resolution.source
            );
            for notice in &resolution.notices {
                println!("  notice: {notice}");
            }
            for key in report.keys() {
                let mut flags = Vec::new();
                if report.is_bold(key.as_str()) {
                    flags.push("bold");
                }
                if report.is_hidden(key.as_str()) {
                    flags.push("hidden");
                }
                if report.is_custom(key.as_str()) {
                    flags.push("custom");
                }
                println!(
                    "  {} [{}] {}",
                    key,
                    flags.join(","),
                    report.label(key.as_str()).unwrap_or("")
                );
                for line in report.lines(key.as_str())? {
                    println!("    | {line}");
                }
            }
        }
        Commands::Print {
            consultation_id,
            exam_type,
            sub_type,
        } => {
            let resolution = open_report(&service, &consultation_id, &exam_type, sub_type).await?;
            let snapshot = service.print_snapshot(&resolution.report);
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Commands::AddField {
            consultation_id,
            exam_type,
            label,
            content,
            sub_type,
        } => {
            let mut report = open_report(&service, &consultation_id, &exam_type, sub_type)
                .await?
                .report;
            let key = report.add_custom_field(&label, content.as_deref())?;
            service.save(&mut report).await?;
            println!("Added custom field {key} ({label})");
        }
        Commands::Hide {
            consultation_id,
            exam_type,
            key,
            sub_type,
        } => {
            let mut report = open_report(&service, &consultation_id, &exam_type, sub_type)
                .await?
                .report;
            report.hide_field(&key)?;
            service.save(&mut report).await?;
            println!("Hid field {key}");
        }
        Commands::Reset {
            consultation_id,
            exam_type,
            key,
            sub_type,
        } => {
            let mut report = open_report(&service, &consultation_id, &exam_type, sub_type)
                .await?
                .report;
            match report.reset_field_to_template(&key)? {
                ResetOutcome::Reset => {
                    service.save(&mut report).await?;
                    println!("Reset field {key} to its template default");
                }
                ResetOutcome::NoTemplateContent => {
                    println!("Template has no default content for {key}; nothing changed");
                }
            }
        }
    }

    Ok(())
}

fn config(
    data_dir: Option<PathBuf>,
    template_dir: Option<PathBuf>,
) -> Result<CoreConfig, Box<dyn Error>> {
    let data_dir = data_dir
        .or_else(|| std::env::var("REPORT_DATA_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_DATA_DIR));
    let template_dir = template_dir
        .or_else(|| std::env::var("REPORT_TEMPLATE_DIR").ok().map(PathBuf::from));
    let template_dir = resolve_template_dir(template_dir)?;
    let io_timeout = io_timeout_from_env_value(std::env::var("REPORT_IO_TIMEOUT_MS").ok())?;
    Ok(CoreConfig::new(data_dir, template_dir, io_timeout)?)
}

/// Opens the requested subtype, or the last saved one when no subtype is given.
async fn open_report(
    service: &ReportService<YamlTemplateCatalog, FileReportStore>,
    consultation_id: &str,
    exam_type: &str,
    sub_type: Option<String>,
) -> Result<Resolution, Box<dyn Error>> {
    let consultation_id = ConsultationId::parse(consultation_id)?;
    let exam_type: ExamType = exam_type.parse()?;
    let resolution = match sub_type {
        Some(code) => {
            let sub_type = SubType::parse(exam_type, &code)?;
            service.open(&consultation_id, sub_type).await
        }
        None => service.open_latest(&consultation_id, exam_type).await,
    };
    Ok(resolution)
}
