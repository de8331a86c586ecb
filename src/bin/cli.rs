use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use work_trace::{
    ArtifactLog, ArtifactTag, Clock, ClockTime, FileType, FixedClock, JsonSettingsStore, OffsetClock,
    ScheduleEngine, ScheduleType, SettingsStore, SystemClock, TimeSyncCheck, WorkSettings,
    calendar, load_settings_from_json, save_artifacts_to_csv, save_artifacts_to_json,
    save_settings_to_json, weekly_plan,
};

#[derive(Parser)]
#[command(name = "cli", about = "Interactive work schedule shell")]
struct Args {
    /// Settings JSON file loaded at startup when it exists.
    #[arg(long, env = "WORK_TRACE_SETTINGS")]
    settings: Option<PathBuf>,
    /// Pin the clock, e.g. "2025-03-03 08:00".
    #[arg(long, value_parser = parse_instant)]
    now: Option<NaiveDateTime>,
}

fn parse_instant(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S"))
        .map_err(|_| format!("invalid instant '{s}' (YYYY-MM-DD HH:MM)"))
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

fn parse_rest_days(s: &str) -> Result<Vec<u8>, String> {
    if s.trim().is_empty() || s.trim() == "none" {
        return Ok(Vec::new());
    }
    s.split(',')
        .map(|p| {
            p.trim()
                .parse::<u8>()
                .map_err(|_| format!("invalid weekday '{}'", p.trim()))
        })
        .collect()
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show                               Show current settings\n  types                              List schedule types\n  type <name>                        Set schedule type (double|single|alternating|custom)\n  longweek <true|false>              Set long week flag (alternating schedule)\n  rest <csv|none>                    Set custom rest days (1=Sunday..7=Saturday)\n  time <HH:MM> <HH:MM>               Set work start and end time\n  company <text...>                  Set company name (recorded artifacts follow)\n  workday [YYYY-MM-DD]               Is the date (default today) a workday\n  week [YYYY-MM-DD]                  Workdays in the 7 days starting at date\n  tag <HH:MM|YYYY-MM-DD HH:MM>       Classify an image captured at that time\n  next                               Next reminder instant\n  plan                               Weekly reminder plan\n  sync <YYYY-MM-DD HH:MM:SS>         Compare clock to a reference and correct it\n  capture <image|audio> [location...] Record an artifact at the current time\n  log                                List recorded artifacts\n  edit <id> <tag> [title...]         Retag an artifact, optionally with a custom title\n  delete <id>                        Remove an artifact\n  export <csv|json> <path>           Write artifact manifest\n  save <path>                        Save settings to JSON\n  load <path>                        Load settings from JSON\n  quit|exit                          Exit"
    );
}

fn print_settings(settings: &WorkSettings, today: NaiveDate) {
    let config = &settings.schedule;
    let rest_days = config
        .custom_rest_days
        .iter()
        .filter_map(calendar::weekday_name)
        .collect::<Vec<_>>()
        .join(", ");
    println!("Company            : {}", settings.company_name);
    println!("Schedule type      : {}", config.schedule_type);
    println!("Long week          : {}", settings.effective_long_week(today));
    println!("Custom rest days   : {}", rest_days);
    println!("Work time          : {} - {}", config.start_time, config.end_time);
}

fn describe_day(date: NaiveDate) -> String {
    let name = calendar::weekday_name(calendar::weekday_number(&date)).unwrap_or("?");
    format!("{date} ({name})")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let engine = ScheduleEngine::new();
    let base_clock: Arc<dyn Clock> = match args.now {
        Some(now) => Arc::new(FixedClock(now)),
        None => Arc::new(SystemClock),
    };
    let mut clock: Arc<dyn Clock> = base_clock.clone();
    let mut settings = match &args.settings {
        Some(path) => JsonSettingsStore::new(path).load_or_default()?,
        None => WorkSettings::default(),
    };
    let mut log = ArtifactLog::new();

    println!("Work Trace (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");
        let now = clock.now();
        let today = now.date();

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => print_settings(&settings, today),
            "types" => {
                println!("Available schedule types:");
                for (key, description) in ScheduleType::variants() {
                    println!("  {:<24} {}", key, description);
                }
            }
            "type" => match parts.next() {
                Some(name) => match name.parse::<ScheduleType>() {
                    Ok(schedule_type) => {
                        settings.set_schedule_type(schedule_type);
                        println!("Schedule type set to {schedule_type}.");
                    }
                    Err(e) => println!("Error: {e}"),
                },
                None => println!("Usage: type <double|single|alternating|custom>"),
            },
            "longweek" => match parts.next().map(|v| v.parse::<bool>()) {
                Some(Ok(value)) => {
                    settings.set_long_week(value, today);
                    println!("Long week set to {value}.");
                }
                _ => println!("Usage: longweek <true|false>"),
            },
            "rest" => {
                let csv = parts.collect::<Vec<_>>().join("");
                match parse_rest_days(&csv) {
                    Ok(days) => match settings.set_rest_days(days) {
                        Ok(()) => println!("Rest days updated."),
                        Err(e) => println!("Error: {e}"),
                    },
                    Err(e) => println!("Error: {e}"),
                }
            }
            "time" => {
                let start = parts.next().map(str::parse::<ClockTime>);
                let end = parts.next().map(str::parse::<ClockTime>);
                match (start, end) {
                    (Some(Ok(start)), Some(Ok(end))) => match settings.set_work_time(start, end) {
                        Ok(()) => println!("Work time set to {start} - {end}."),
                        Err(e) => println!("Error: {e}"),
                    },
                    (Some(Err(e)), _) | (_, Some(Err(e))) => println!("Error: {e}"),
                    _ => println!("Usage: time <HH:MM> <HH:MM>"),
                }
            }
            "company" => {
                let name = parts.collect::<Vec<_>>().join(" ");
                let previous = settings.company_name.clone();
                match settings.set_company_name(name) {
                    Ok(()) => {
                        println!("Company set to {}.", settings.company_name);
                        let renamed = log.rename_company(&previous, &settings.company_name);
                        if renamed > 0 {
                            println!("Updated {renamed} artifact(s).");
                        }
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            "workday" => {
                let date = match parts.next() {
                    Some(s) => match parse_date(s) {
                        Some(d) => d,
                        None => {
                            println!("Invalid date (YYYY-MM-DD)");
                            continue;
                        }
                    },
                    None => today,
                };
                if settings.is_workday(date) {
                    println!("{} is a workday", describe_day(date));
                } else {
                    println!("{} is a rest day", describe_day(date));
                }
            }
            "week" => {
                let start = match parts.next() {
                    Some(s) => match parse_date(s) {
                        Some(d) => d,
                        None => {
                            println!("Invalid date (YYYY-MM-DD)");
                            continue;
                        }
                    },
                    None => today,
                };
                let end = start + Duration::days(6);
                let days = settings.workdays_in_range(start, end);
                println!("{} workday(s) from {} to {}:", days.len(), start, end);
                for day in days {
                    println!("  {}", describe_day(day));
                }
            }
            "tag" => {
                let rest = parts.collect::<Vec<_>>().join(" ");
                let timestamp = match parse_instant(&rest) {
                    Ok(ts) => ts,
                    Err(_) => match NaiveTime::parse_from_str(rest.trim(), "%H:%M") {
                        Ok(t) => today.and_time(t),
                        Err(_) => {
                            println!("Usage: tag <HH:MM|YYYY-MM-DD HH:MM>");
                            continue;
                        }
                    },
                };
                let config = settings.resolved_config(timestamp.date());
                let tag = engine.classify_artifact_tag(&timestamp, &config);
                println!("Tag: {} ({})", tag, tag.label());
            }
            "next" => {
                match settings.next_reminder(now) {
                    Some(reminder) => println!(
                        "Next reminder: {} ({})",
                        reminder.at.format("%Y-%m-%d %H:%M"),
                        reminder.kind.title()
                    ),
                    None => println!("No reminder within the next 7 days"),
                }
            }
            "plan" => {
                let plan = weekly_plan(&settings.resolved_config(today));
                if plan.is_empty() {
                    println!("No reminders scheduled");
                }
                for slot in plan {
                    println!(
                        "  {:<14} {:<10} {}",
                        slot.identifier,
                        calendar::weekday_name(slot.weekday).unwrap_or("?"),
                        slot.time
                    );
                }
            }
            "sync" => {
                let rest = parts.collect::<Vec<_>>().join(" ");
                let reference = match parse_instant(&rest) {
                    Ok(ts) => ts,
                    Err(e) => {
                        println!("Error: {e}");
                        continue;
                    }
                };
                let report = TimeSyncCheck::default().evaluate(base_clock.now(), Some(reference));
                let drift = report.correction().num_seconds();
                if report.is_valid {
                    println!("Clock in sync (drift {drift}s)");
                } else {
                    println!("Clock out of sync (drift {drift}s), using reference time");
                }
                clock = Arc::new(OffsetClock::new(base_clock.clone(), report.correction()));
            }
            "capture" => {
                let file_type = match parts.next() {
                    Some("image") => FileType::Image,
                    Some("audio") => FileType::Audio,
                    _ => {
                        println!("Usage: capture <image|audio> [location...]");
                        continue;
                    }
                };
                let location = parts.collect::<Vec<_>>().join(" ");
                let location = (!location.is_empty()).then_some(location);
                let config = settings.resolved_config(today);
                match log.capture(
                    file_type,
                    now,
                    location,
                    settings.company_name.clone(),
                    &config,
                ) {
                    Ok(artifact) => println!("Captured #{}: {}", artifact.id, artifact.title()),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "edit" => {
                let id = parts.next().and_then(|s| s.trim_start_matches('#').parse::<u64>().ok());
                let tag = parts.next().map(str::parse::<ArtifactTag>);
                let title = parts.collect::<Vec<_>>().join(" ");
                match (id, tag) {
                    (Some(id), Some(Ok(tag))) => {
                        match log.edit(id, tag, (!title.is_empty()).then_some(title.as_str())) {
                            Ok(artifact) => println!("Edited #{}: {}", artifact.id, artifact.title()),
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    (_, Some(Err(e))) => println!("Error: {e}"),
                    _ => println!("Usage: edit <id> <tag> [title...]"),
                }
            }
            "delete" => match parts.next().and_then(|s| s.trim_start_matches('#').parse::<u64>().ok()) {
                Some(id) => match log.remove(id) {
                    Ok(artifact) => println!("Deleted #{}: {}", artifact.id, artifact.title()),
                    Err(e) => println!("Error: {e}"),
                },
                None => println!("Usage: delete <id>"),
            },
            "log" => {
                if log.is_empty() {
                    println!("No artifacts recorded");
                }
                for artifact in log.artifacts() {
                    println!(
                        "  #{:<4} {} {:<10} {:<20} {}",
                        artifact.id,
                        artifact.timestamp.format("%Y-%m-%d %H:%M"),
                        artifact.tag,
                        artifact.company_name,
                        artifact.title()
                    );
                }
            }
            "export" => {
                let fmt_s = parts.next();
                let path_s = parts.next();
                match (fmt_s, path_s) {
                    (Some("csv"), Some(path)) => match save_artifacts_to_csv(&log, path) {
                        Ok(()) => println!("Manifest written to {path}"),
                        Err(e) => println!("Export error: {e}"),
                    },
                    (Some("json"), Some(path)) => match save_artifacts_to_json(&log, path) {
                        Ok(()) => println!("Manifest written to {path}"),
                        Err(e) => println!("Export error: {e}"),
                    },
                    _ => println!("Usage: export <csv|json> <path>"),
                }
            }
            "save" => match parts.next() {
                Some(path) => match save_settings_to_json(&settings, path) {
                    Ok(()) => println!("Settings saved to {path}"),
                    Err(e) => println!("Save error: {e}"),
                },
                None => println!("Usage: save <path>"),
            },
            "load" => match parts.next() {
                Some(path) => match load_settings_from_json(path) {
                    Ok(loaded) => {
                        settings = loaded;
                        println!("Settings loaded from {path}");
                    }
                    Err(e) => println!("Load error: {e}"),
                },
                None => println!("Usage: load <path>"),
            },
            other => println!("Unknown command '{other}'. Type 'help'."),
        }
    }

    Ok(())
}
