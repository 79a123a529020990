use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand};
use vitals_monitor::{
    api::types::IngestVitalRequest,
    client::{ApiClient, format_alert, format_message, format_stored_vital, format_vital},
};

#[derive(Debug, Parser)]
#[command(about = "Command line client for the vitals server")]
struct Args {
    /// Server address (host:port or URL)
    #[arg(long, global = true, default_value = "127.0.0.1:5000")]
    addr: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Submit a blood-pressure reading
    InsertVital {
        #[arg(long = "patient")]
        patient_id: String,
        #[arg(long)]
        systolic: i32,
        #[arg(long)]
        diastolic: i32,
        /// Unix seconds (default: now)
        #[arg(long)]
        taken_at: Option<i64>,
    },
    /// List alerts, optionally for one patient
    ListAlerts {
        #[arg(long = "patient")]
        patient_id: Option<String>,
    },
    /// List stored readings, optionally for one patient
    ListVitals {
        #[arg(long = "patient")]
        patient_id: Option<String>,
    },
    /// List patient messages
    ListMessages,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::InsertVital { .. } => "insert-vital",
            Command::ListAlerts { .. } => "list-alerts",
            Command::ListVitals { .. } => "list-vitals",
            Command::ListMessages => "list-messages",
        }
    }
}

/// Missing or zero `--taken-at` means now
fn taken_at_or_now(taken_at: Option<i64>) -> i64 {
    taken_at
        .filter(|t| *t > 0)
        .unwrap_or_else(|| Utc::now().timestamp())
}

async fn run(client: &ApiClient, command: Command) -> anyhow::Result<()> {
    match command {
        Command::InsertVital {
            patient_id,
            systolic,
            diastolic,
            taken_at,
        } => {
            let request = IngestVitalRequest {
                patient_id,
                systolic,
                diastolic,
                taken_at: taken_at_or_now(taken_at),
            };
            let vital = client.insert_vital(&request).await?;
            println!("{}", format_stored_vital(&vital));
        }
        Command::ListAlerts { patient_id } => {
            let alerts = client.list_alerts(patient_id.as_deref()).await?;
            if alerts.is_empty() {
                println!("no alerts");
            }
            for alert in &alerts {
                println!("{}", format_alert(alert));
            }
        }
        Command::ListVitals { patient_id } => {
            let vitals = client.list_vitals(patient_id.as_deref()).await?;
            if vitals.is_empty() {
                println!("no vitals");
            }
            for vital in &vitals {
                println!("{}", format_vital(vital));
            }
        }
        Command::ListMessages => {
            let messages = client.list_messages().await?;
            if messages.is_empty() {
                println!("no messages");
            }
            for message in &messages {
                println!("{}", format_message(message));
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let name = args.command.name();

    let result = match ApiClient::new(&args.addr) {
        Ok(client) => run(&client, args.command).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{name} failed: {e}");
            ExitCode::FAILURE
        }
    }
}
