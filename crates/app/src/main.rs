use std::fmt;
use std::time::Duration;

use literacy_core::flow::{ActivityStep, QuizAnswer};
use literacy_core::model::{ActivityId, Avatar, Child, ChildId};
use services::{ActivityController, AppServices, Clock, LiteracyConfig};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidChildId { raw: String },
    InvalidActivity { raw: String },
    InvalidAge { raw: String },
    InvalidAvatar { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidChildId { raw } => write!(f, "invalid --child-id value: {raw}"),
            ArgsError::InvalidActivity { raw } => write!(f, "invalid --activity value: {raw}"),
            ArgsError::InvalidAge { raw } => write!(f, "invalid --age value: {raw}"),
            ArgsError::InvalidAvatar { raw } => write!(f, "invalid --avatar value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- play --child-id <id> --activity <slug> [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- children [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- add-child --name <name> --age <2-10> [--avatar <animal>] [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- report [--child-id <id>] [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://literacy.sqlite3");
    eprintln!("  --avatar bear");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LITERACY_DB_URL, LITERACY_ADVANCE_DELAY_MS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Children,
    AddChild,
    Report,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "children" => Some(Self::Children),
            "add-child" => Some(Self::AddChild),
            "report" => Some(Self::Report),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    db_url: Option<String>,
    child_id: Option<ChildId>,
    activity: Option<ActivityId>,
    name: Option<String>,
    age: Option<u8>,
    avatar: Avatar,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = Some(normalize_sqlite_url(value));
                }
                "--child-id" => {
                    let value = require_value(args, "--child-id")?;
                    let id = value
                        .parse::<ChildId>()
                        .map_err(|_| ArgsError::InvalidChildId { raw: value.clone() })?;
                    parsed.child_id = Some(id);
                }
                "--activity" => {
                    let value = require_value(args, "--activity")?;
                    let id = value
                        .parse::<ActivityId>()
                        .map_err(|_| ArgsError::InvalidActivity { raw: value.clone() })?;
                    parsed.activity = Some(id);
                }
                "--name" => {
                    parsed.name = Some(require_value(args, "--name")?);
                }
                "--age" => {
                    let value = require_value(args, "--age")?;
                    let age = value
                        .parse::<u8>()
                        .map_err(|_| ArgsError::InvalidAge { raw: value.clone() })?;
                    parsed.age = Some(age);
                }
                "--avatar" => {
                    let value = require_value(args, "--avatar")?;
                    parsed.avatar = value
                        .parse::<Avatar>()
                        .map_err(|_| ArgsError::InvalidAvatar { raw: value.clone() })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

type InputLines = Lines<BufReader<Stdin>>;

async fn prompt(lines: &mut InputLines, text: &str) -> Result<String, Box<dyn std::error::Error>> {
    println!("{text}");
    match lines.next_line().await? {
        Some(line) => Ok(line.trim().to_owned()),
        None => Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "input closed").into()),
    }
}

fn is_restart(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("r")
}

fn print_step(controller: &ActivityController) {
    let session = controller.snapshot();
    let progress = session.progress();
    let letter = session.letter();
    println!();
    println!("[Step {} of {}]", progress.step_number, progress.total);
    match progress.step {
        ActivityStep::Introduction => {
            println!("Hi {}! Today we are learning the letter {letter}.", session.child_name());
            println!("Big {} and little {}.", letter.upper(), letter.lower());
        }
        ActivityStep::SoundPractice => {
            println!("The letter {letter} says \"{}\". Say it with me!", letter.lower());
        }
        ActivityStep::WordExamples => {
            println!("Words that start with {letter}:");
            for word in session.example_words() {
                println!("  - {word}");
            }
        }
        ActivityStep::RecognitionQuiz => {
            println!("Which word starts with {letter}?");
            for option in session.quiz().options() {
                println!("  * {}", option.word);
            }
        }
        ActivityStep::Completion => {
            println!("Amazing work, {}! You learned the letter {letter}.", session.child_name());
        }
    }
}

async fn play(
    app: &AppServices,
    child: &Child,
    activity_id: &ActivityId,
) -> Result<(), Box<dyn std::error::Error>> {
    let controller = app.activities().start_activity(child, activity_id).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print_step(&controller);
        match controller.current_step() {
            ActivityStep::Completion => break,
            ActivityStep::RecognitionQuiz => {
                let word = prompt(&mut lines, "Type your answer (r to restart):").await?;
                if is_restart(&word) {
                    controller.restart();
                    continue;
                }
                match controller.submit_quiz_answer(&word) {
                    QuizAnswer::Correct => println!("Yes! {word} starts with {}.", controller.letter()),
                    QuizAnswer::Incorrect => println!("Good try! {word} is not one of our words."),
                    QuizAnswer::Ignored => {
                        println!("That answer was not counted. Only the first answer counts.");
                        continue;
                    }
                }
                while controller.current_step() == ActivityStep::RecognitionQuiz {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
            }
            _ => {
                let input = prompt(&mut lines, "Press Enter to continue (r to restart).").await?;
                if is_restart(&input) {
                    controller.restart();
                } else {
                    controller.advance();
                }
            }
        }
    }

    let receipt = app
        .activities()
        .finish(&controller, child.id(), activity_id)
        .await?;
    println!(
        "You earned {} points! Total {} points, level {}, {} day streak.",
        controller.complete().map_or(0, |c| c.points_awarded),
        receipt.total_points,
        receipt.current_level,
        receipt.daily_streak
    );
    if receipt.leveled_up {
        println!("Level up!");
    }
    Ok(())
}

async fn list_children(app: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let children = app.children().list_children(u32::MAX).await?;
    if children.is_empty() {
        println!("No children yet. Add one with `add-child`.");
    }
    for child in children {
        println!(
            "{:>3}  {:<20} age {:<2} {:<8} {:<24} level {:<3} {:>5} pts  streak {}",
            child.id(),
            child.name(),
            child.age(),
            child.avatar(),
            child.track().label(),
            child.current_level(),
            child.total_points(),
            child.daily_streak()
        );
    }
    Ok(())
}

async fn report(
    app: &AppServices,
    clock: Clock,
    child_id: Option<ChildId>,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(child_id) = child_id else {
        let overview = app.reports().overview(clock.today()).await?;
        println!("Children:         {}", overview.children);
        println!("Total points:     {}", overview.total_points);
        println!("Stars:            {}", overview.stars);
        println!("Average streak:   {}", overview.average_streak);
        println!("Active this week: {}", overview.active_learners);
        return Ok(());
    };

    let report = app.reports().child_report(child_id, 10).await?;
    println!("{} ({})", report.child.name(), report.child.track().label());
    println!("Activities:    {}", report.total_activities);
    println!("Average score: {}%", report.average_score);
    println!("Time spent:    {} min", report.total_minutes);
    println!(
        "Mastery:       {} mastered, {} proficient, {} developing",
        report.mastery.mastered, report.mastery.proficient, report.mastery.developing
    );
    for row in &report.recent {
        println!(
            "  {}  {:<14} {:>3}%  {}",
            row.record.completed_at().format("%Y-%m-%d %H:%M"),
            row.record.activity_id(),
            row.record.score_percent(),
            row.record.mastery()
        );
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let mut iter = argv.into_iter().skip(1);
    let args = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let mut config = LiteracyConfig::from_env()?;
    config.database_url = normalize_sqlite_url(config.database_url);
    if let Some(db_url) = args.db_url.clone() {
        config = config.with_database_url(db_url);
    }

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&config.database_url)?;
    let clock = Clock::default_clock();
    let app = AppServices::new_sqlite(&config, clock).await?;
    tracing::debug!(
        database_url = %config.database_url,
        advance_delay_ms = config.advance_delay.as_millis(),
        command = ?cmd,
        "services ready"
    );

    match cmd {
        Command::Play => {
            let child_id = args
                .child_id
                .ok_or(ArgsError::MissingFlag { flag: "--child-id" })?;
            let activity = args
                .activity
                .ok_or(ArgsError::MissingFlag { flag: "--activity" })?;
            let child = app
                .children()
                .get_child(child_id)
                .await?
                .ok_or_else(|| format!("child {child_id} not found"))?;
            play(&app, &child, &activity).await
        }
        Command::Children => list_children(&app).await,
        Command::AddChild => {
            let name = args.name.ok_or(ArgsError::MissingFlag { flag: "--name" })?;
            let age = args.age.ok_or(ArgsError::MissingFlag { flag: "--age" })?;
            let child = app.children().create_child(&name, age, args.avatar).await?;
            println!(
                "Added {} (id {}) on the {} track.",
                child.name(),
                child.id(),
                child.track().label()
            );
            Ok(())
        }
        Command::Report => report(&app, clock, args.child_id).await,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
