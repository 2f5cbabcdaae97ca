use clap::{Parser, Subcommand};
use clinic_core::{
    CoreConfig, DayOfWeek, DaySlot, EntityKind, FileStore, FormService, ScheduleDraft,
    ToggleOutcome,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Clinic patient and doctor records CLI")]
struct Cli {
    /// Data directory (defaults to CLINIC_DATA_DIR, then "clinic_data")
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Visibility configuration namespace (defaults to CLINIC_CONFIG_NAMESPACE, then "clinic")
    #[arg(long, global = true)]
    namespace: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the fields a new form shows
    Fields {
        /// patient or doctor
        kind: EntityKind,
    },
    /// List the wizard steps of a new form
    Steps {
        /// patient or doctor
        kind: EntityKind,
    },
    /// Show the stored visibility of every field
    Visibility {
        /// patient or doctor
        kind: EntityKind,
    },
    /// Show or hide an optional field on future forms
    Toggle {
        /// patient or doctor
        kind: EntityKind,
        /// Field id, e.g. allergies
        field_id: String,
    },
    /// List stored records
    Records {
        /// patient or doctor
        kind: EntityKind,
    },
    /// Show a doctor's weekly schedule
    Schedule {
        /// Doctor record id
        owner_id: String,
    },
    /// Print the rows a weekly schedule would be stored as
    EncodeSchedule {
        /// Owner id written into each row
        owner_id: String,
        /// Day hours as DAY=HH:MM-HH:MM, e.g. Monday=09:00-17:00 (repeatable)
        #[arg(long = "day")]
        days: Vec<String>,
    },
}

/// Parses `Monday=09:00-17:00`. An empty range (`Sunday=`) marks the day off.
fn parse_day(spec: &str) -> Result<(DayOfWeek, DaySlot), String> {
    let (day, hours) = spec
        .split_once('=')
        .ok_or_else(|| format!("expected DAY=HH:MM-HH:MM, got '{spec}'"))?;
    let day: DayOfWeek = day.parse()?;
    if hours.trim().is_empty() {
        return Ok((day, DaySlot::off()));
    }
    let (start, end) = hours
        .split_once('-')
        .ok_or_else(|| format!("expected HH:MM-HH:MM for {day}, got '{hours}'"))?;
    Ok((day, DaySlot::new(start.trim(), end.trim())))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'clinic --help' for commands");
        return Ok(());
    };

    let data_dir = cli
        .data_dir
        .map(|dir| dir.display().to_string())
        .or_else(|| std::env::var("CLINIC_DATA_DIR").ok());
    let namespace = cli
        .namespace
        .or_else(|| std::env::var("CLINIC_CONFIG_NAMESPACE").ok());
    let cfg = CoreConfig::from_env_values(data_dir, namespace)?;
    let service = FormService::new(Arc::new(FileStore::new(Arc::new(cfg))));

    match command {
        Commands::Fields { kind } => {
            for field in service.active_fields(kind).await {
                let marker = if field.mandatory { "*" } else { " " };
                println!(
                    "{marker} {:<28} {:<10} {:<14} {}",
                    field.id,
                    field.kind.type_name(),
                    field.category,
                    field.label
                );
            }
        }
        Commands::Steps { kind } => {
            for step in service.steps(kind).await {
                println!("Step {}: {}", step.index, step.title);
                for field in &step.fields {
                    let marker = if field.mandatory { " (required)" } else { "" };
                    println!("    {}{}", field.label, marker);
                }
                if step.schedule {
                    println!("    Weekly schedule");
                }
            }
        }
        Commands::Visibility { kind } => match service.visibility(kind).await {
            Ok(config) => {
                let schema = service.schema(kind);
                for field in schema.fields {
                    let state = if field.mandatory {
                        "always"
                    } else if config.is_enabled(field.id) {
                        "shown"
                    } else {
                        "hidden"
                    };
                    println!("{:<28} {}", field.id, state);
                }
            }
            Err(e) => eprintln!("Error loading visibility: {}", e),
        },
        Commands::Toggle { kind, field_id } => {
            match service.toggle_field_visibility(kind, &field_id).await {
                Ok(ToggleOutcome::Applied(config)) => {
                    let state = if config.is_enabled(&field_id) {
                        "shown"
                    } else {
                        "hidden"
                    };
                    println!("{kind} field {field_id} is now {state}");
                }
                Ok(ToggleOutcome::Rejected(lock)) => eprintln!("Not changed: {}", lock),
                Err(e) => eprintln!("Error toggling {}: {}", field_id, e),
            }
        }
        Commands::Records { kind } => match service.list_records(kind).await {
            Ok(records) if records.is_empty() => println!("No {kind} records found."),
            Ok(records) => {
                for record in records {
                    println!(
                        "ID: {}, Name: {} {}, Created: {}",
                        record.id,
                        record.value("first_name").unwrap_or("-"),
                        record.value("last_name").unwrap_or("-"),
                        record.created_at.to_rfc3339()
                    );
                }
            }
            Err(e) => eprintln!("Error listing records: {}", e),
        },
        Commands::Schedule { owner_id } => match service.schedule_for(&owner_id).await {
            Ok(decoded) => {
                for (day, slot) in decoded.draft.iter() {
                    if slot.start.trim().is_empty() && slot.end.trim().is_empty() {
                        println!("{:<10} off", day.name());
                    } else {
                        println!("{:<10} {} - {}", day.name(), slot.start, slot.end);
                    }
                }
                if !decoded.unrecognised.is_empty() {
                    eprintln!(
                        "Skipped {} row(s) with an unrecognised day index",
                        decoded.unrecognised.len()
                    );
                }
            }
            Err(e) => eprintln!("Error loading schedule: {}", e),
        },
        Commands::EncodeSchedule { owner_id, days } => {
            let mut draft = ScheduleDraft::new();
            for spec in &days {
                let (day, slot) = parse_day(spec)?;
                draft.set(day, slot);
            }
            for row in service.encode_schedule(&draft, &owner_id) {
                println!(
                    "{} {} {}-{} {}",
                    row.owner_id, row.day_index, row.start_time, row.end_time, row.slot_type
                );
            }
        }
    }

    Ok(())
}
