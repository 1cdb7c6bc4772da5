use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use feedback_tools::config::ClientConfig;
use feedback_tools::export::{self, ExportFormat, ExportOutcome};
use feedback_tools::flatten::Projection;
use feedback_tools::model::Params;
use feedback_tools::{RemoteResult, Result, SurveyClient, ToolError};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_tracing() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| ToolError::Logging(err.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::from_env()?,
    };
    let client = SurveyClient::connect(&config)?;

    match cli.command {
        Command::Count(args) => {
            let count = if args.participants {
                client.get_authorized_participant_count(&args.survey)
            } else {
                client.get_response_count(&args.survey, !args.all)
            };
            print_json(&require(count)?.unwrap_or(0))
        }
        Command::Export(args) => {
            let mut query = feedback_tools::client::SurveyDataQuery::new(args.survey.clone())
                .completed_only(!args.all);
            if let Some(filter) = &args.filter {
                query = query.with_filter(std::fs::read_to_string(filter)?);
            }
            if args.report_values {
                if let Some(data_map) = require(client.get_report_data_map(&args.survey))? {
                    query = query.with_data_map(data_map);
                }
            }

            if let Some(field) = &args.field {
                let projection = Projection::Fields(field.clone());
                let records = require(client.get_complete_array(&query, &projection))?;
                return print_json(&records.unwrap_or_default());
            }

            let Some(output) = &args.output else {
                let records = require(client.get_complete_records(&query))?;
                return print_json(&records.unwrap_or_default());
            };
            match export::export_survey_data(&client, &query, output, args.format.into())? {
                ExportOutcome::Written(count) => {
                    eprintln!("wrote {count} records to {}", output.display());
                }
                ExportOutcome::NoData => eprintln!("no records to export"),
            }
            Ok(())
        }
        Command::Participants(args) => {
            let participants =
                require(client.get_participant_data(&args.survey, args.status.as_deref()))?;
            print_json(&participants.unwrap_or_default())
        }
        Command::Preload(args) => {
            let projection = if args.field.is_empty() {
                Projection::All
            } else {
                Projection::Fields(args.field)
            };
            let rows = require(client.get_preload_data(&args.survey, &projection))?;
            print_json(&rows.unwrap_or_default())
        }
        Command::Columns(args) => {
            let columns = require(client.get_column_list(&args.survey))?;
            let columns: Vec<(String, String)> = columns
                .map(|columns| {
                    columns
                        .iter()
                        .map(|(name, type_name)| (name.to_string(), type_name.to_string()))
                        .collect()
                })
                .unwrap_or_default();
            print_json(&columns)
        }
        Command::CampaignStatus(args) => {
            let status = require(client.get_campaign_status(&args.survey, &args.record))?;
            print_json(&status.map(|status| status.code()))
        }
        Command::Participant(args) => {
            let info = require(client.get_single_participant(&args.survey, &args.record))?;
            print_json(&info)
        }
        Command::Enroll(args) => {
            let attributes = parse_pairs(&args.attribute)?;
            let prepop = parse_pairs(&args.prepop)?;
            let prepop = (!prepop.is_empty()).then_some(&prepop);
            let record_id = require(client.add_participant(&args.survey, &attributes, prepop))?;
            print_json(&record_id)
        }
    }
}

/// Turns a remote error into a command failure; empty answers stay `None`.
fn require<T>(result: RemoteResult<T>) -> Result<Option<T>> {
    Ok(result.into_result()?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_pairs(pairs: &[String]) -> Result<Params> {
    let mut params = Params::new();
    for pair in pairs {
        let (name, value) = pair.split_once('=').ok_or_else(|| {
            ToolError::InvalidConfig(format!("expected NAME=VALUE, found '{pair}'"))
        })?;
        params.insert(name.trim(), value);
    }
    Ok(params)
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Query and export data from the survey web service."
)]
struct Cli {
    /// JSON configuration file. Without it settings come from FEEDBACK_* variables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the number of responses or authorized participants.
    Count(CountArgs),
    /// Fetch every response of a survey.
    Export(ExportArgs),
    /// List the participants of a survey.
    Participants(ParticipantsArgs),
    /// Print the preload data of every participant.
    Preload(PreloadArgs),
    /// Print the declared column types of a survey.
    Columns(SurveyArgs),
    /// Print the delivery status code of a participant.
    CampaignStatus(RecordArgs),
    /// Print progress details of a participant.
    Participant(RecordArgs),
    /// Authorize a participant for a survey.
    Enroll(EnrollArgs),
}

#[derive(clap::Args)]
struct SurveyArgs {
    /// Survey (project) identifier.
    #[arg(long)]
    survey: String,
}

#[derive(clap::Args)]
struct RecordArgs {
    #[arg(long)]
    survey: String,

    /// Participant record identifier.
    #[arg(long)]
    record: String,
}

#[derive(clap::Args)]
struct CountArgs {
    #[arg(long)]
    survey: String,

    /// Count authorized participants instead of responses.
    #[arg(long)]
    participants: bool,

    /// Include incomplete responses.
    #[arg(long)]
    all: bool,
}

#[derive(clap::Args)]
struct ExportArgs {
    #[arg(long)]
    survey: String,

    /// Output file. Records are printed as JSON when omitted.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Output file format.
    #[arg(long, value_enum, default_value = "csv")]
    format: FormatKind,

    /// File holding a CriteriaCollection filter document.
    #[arg(long)]
    filter: Option<PathBuf>,

    /// Export report values instead of raw values.
    #[arg(long)]
    report_values: bool,

    /// Include incomplete responses.
    #[arg(long)]
    all: bool,

    /// Only print these fields of each record.
    #[arg(long)]
    field: Option<Vec<String>>,
}

#[derive(clap::Args)]
struct ParticipantsArgs {
    #[arg(long)]
    survey: String,

    /// Survey status filter; defaults to any status.
    #[arg(long)]
    status: Option<String>,
}

#[derive(clap::Args)]
struct PreloadArgs {
    #[arg(long)]
    survey: String,

    /// Only print these preload fields.
    #[arg(long)]
    field: Vec<String>,
}

#[derive(clap::Args)]
struct EnrollArgs {
    #[arg(long)]
    survey: String,

    /// Participant attribute as NAME=VALUE, e.g. email=a@example.com.
    #[arg(long, required = true)]
    attribute: Vec<String>,

    /// Preload value as NAME=VALUE.
    #[arg(long)]
    prepop: Vec<String>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FormatKind {
    Csv,
    Xlsx,
    Json,
}

impl From<FormatKind> for ExportFormat {
    fn from(kind: FormatKind) -> Self {
        match kind {
            FormatKind::Csv => ExportFormat::Csv,
            FormatKind::Xlsx => ExportFormat::Excel,
            FormatKind::Json => ExportFormat::Json,
        }
    }
}
