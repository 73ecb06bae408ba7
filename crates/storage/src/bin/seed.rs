use std::fmt;

use chrono::{DateTime, Duration, Utc};
use literacy_core::catalog::default_activities;
use literacy_core::model::{ActivityId, Avatar, Child, ChildId, MasteryLevel, ProgressRecord};
use storage::repository::{NewChildRecord, Storage};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    history: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidHistory { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidHistory { raw } => write!(f, "invalid --history value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("LITERACY_DB_URL").unwrap_or_else(|_| "sqlite:literacy.sqlite3".into());
        let mut history = std::env::var("LITERACY_SEED_HISTORY")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(3);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--history" => {
                    let value = require_value(&mut args, "--history")?;
                    history = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidHistory { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            history,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:literacy.sqlite3)");
    eprintln!("  --history <n>             Progress records to append for the first child (default: 3)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  LITERACY_DB_URL, LITERACY_SEED_HISTORY");
}

const DEMO_CHILDREN: [(&str, u8, Avatar); 2] = [("Emma", 6, Avatar::Fox), ("Alex", 5, Avatar::Owl)];

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let activities = default_activities()?;
    for activity in &activities {
        storage.activities.upsert_activity(activity).await?;
    }
    tracing::info!(count = activities.len(), "catalog upserted");

    let existing = storage.children.list_children(u32::MAX).await?;
    let mut child_ids = Vec::with_capacity(DEMO_CHILDREN.len());
    for (name, age, avatar) in DEMO_CHILDREN {
        if let Some(child) = existing.iter().find(|c| c.name() == name) {
            child_ids.push(child.id());
            continue;
        }
        let draft = Child::new(ChildId::new(0), name, age, avatar, now)?;
        let id = storage
            .children
            .insert_new_child(NewChildRecord::from_child(&draft))
            .await?;
        tracing::info!(child_id = id.value(), name, "demo child created");
        child_ids.push(id);
    }

    let Some(first) = child_ids.first().copied() else {
        return Ok(());
    };
    let letter_ids = ["letter_a", "letter_b", "letter_c"];
    let scores = [100, 85, 60];
    for i in 0..args.history {
        let idx = (i as usize) % letter_ids.len();
        let completed_at = now - Duration::days(i64::from(i)) - Duration::minutes(10);
        let record = ProgressRecord::new(
            first,
            ActivityId::new(letter_ids[idx])?,
            completed_at,
            scores[idx],
            240 + u64::from(i) * 30,
            1,
            MasteryLevel::from_score_percent(scores[idx]),
        )?;
        storage.progress.append_progress(&record).await?;
    }

    println!(
        "Seeded {} activities, {} children and {} progress records into {}",
        activities.len(),
        child_ids.len(),
        args.history,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
