//! Line-based commands of the terminal interface.
//!
//! Exercises and sets are addressed by their position, starting at 1.

use std::fmt::Write;

use fitjournal_app::{Event, Output};
use fitjournal_domain::{SetField, UserRecord, WorkoutSummary, format_clock};
use uuid::Uuid;

pub const HELP: &str = "\
commands:
  login <username> <password> [--remember]
  register <username> <password>
  logout
  start | resume-workout | pause | resume | finish
  name <workout name>
  add <exercise name>
  set <exercise> <set> weight|reps [value]
  add-set <exercise>
  remove-set <exercise> <set>
  save-template [name]
  start-template <id>
  delete-template <id>
  rest-timer on|off
  rest-duration <seconds>
  rest | stop-rest
  sync
  quit";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("invalid {0}: {1}")]
    InvalidArgument(&'static str, String),
}

/// Translates one input line into an event. Returns `None` for blank lines.
pub fn parse(line: &str) -> Result<Option<Event>, ParseError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let rest = || line.trim().strip_prefix(command).unwrap_or_default().trim();

    let event = match command {
        "login" => {
            let username = word(&mut words, "username")?;
            let password = word(&mut words, "password")?;
            let remember_me = match words.next() {
                None => false,
                Some("--remember") => true,
                Some(other) => return Err(ParseError::InvalidArgument("flag", other.to_string())),
            };
            Event::Login {
                username,
                password,
                remember_me,
            }
        }
        "register" => Event::Register {
            username: word(&mut words, "username")?,
            password: word(&mut words, "password")?,
        },
        "logout" => Event::Logout,
        "start" => Event::StartWorkout,
        "resume-workout" => Event::ResumeWorkout,
        "pause" => Event::Pause,
        "resume" => Event::Resume,
        "finish" => Event::FinishWorkout,
        "name" => Event::SetWorkoutName(rest().to_string()),
        "add" => match rest() {
            "" => return Err(ParseError::MissingArgument("exercise name")),
            name => Event::AddExercise(name.to_string()),
        },
        "set" => Event::UpdateSet {
            exercise_idx: position(&mut words, "exercise")?,
            set_idx: position(&mut words, "set")?,
            field: match words.next() {
                Some("weight") => SetField::Weight,
                Some("reps") => SetField::Reps,
                Some(other) => return Err(ParseError::InvalidArgument("field", other.to_string())),
                None => return Err(ParseError::MissingArgument("field")),
            },
            value: words.next().unwrap_or_default().to_string(),
        },
        "add-set" => Event::AddSet {
            exercise_idx: position(&mut words, "exercise")?,
        },
        "remove-set" => Event::RemoveSet {
            exercise_idx: position(&mut words, "exercise")?,
            set_idx: position(&mut words, "set")?,
        },
        "save-template" => Event::SaveTemplate(Some(rest().to_string()).filter(|n| !n.is_empty())),
        "start-template" => Event::StartFromTemplate(template_id(&mut words)?.into()),
        "delete-template" => Event::DeleteTemplate(template_id(&mut words)?.into()),
        "rest-timer" => match words.next() {
            Some("on") => Event::SetRestTimer(true),
            Some("off") => Event::SetRestTimer(false),
            Some(other) => return Err(ParseError::InvalidArgument("switch", other.to_string())),
            None => return Err(ParseError::MissingArgument("on|off")),
        },
        "rest-duration" => {
            let value = word(&mut words, "seconds")?;
            Event::SetRestDuration(
                value
                    .parse()
                    .map_err(|_| ParseError::InvalidArgument("seconds", value))?,
            )
        }
        "rest" => Event::StartRest,
        "stop-rest" => Event::StopRest,
        "sync" => Event::ConnectivityRestored,
        "quit" | "exit" => Event::Shutdown,
        _ => return Err(ParseError::UnknownCommand(command.to_string())),
    };

    Ok(Some(event))
}

fn word<'a>(
    words: &mut impl Iterator<Item = &'a str>,
    name: &'static str,
) -> Result<String, ParseError> {
    words
        .next()
        .map(str::to_string)
        .ok_or(ParseError::MissingArgument(name))
}

fn position<'a>(
    words: &mut impl Iterator<Item = &'a str>,
    name: &'static str,
) -> Result<usize, ParseError> {
    let value = word(words, name)?;
    match value.parse::<usize>() {
        Ok(position) if position > 0 => Ok(position - 1),
        _ => Err(ParseError::InvalidArgument(name, value)),
    }
}

fn template_id<'a>(words: &mut impl Iterator<Item = &'a str>) -> Result<Uuid, ParseError> {
    let value = word(words, "template id")?;
    Uuid::parse_str(&value).map_err(|_| ParseError::InvalidArgument("template id", value))
}

pub fn render(output: &Output) -> String {
    match output {
        Output::Record(None) => "not signed in".to_string(),
        Output::Record(Some(record)) => render_record(record),
        Output::WorkoutClock(clock) => format!("workout {clock}"),
        Output::RestClock(clock) => format!("rest {clock}"),
        Output::RestComplete => "rest complete".to_string(),
        Output::Summary(summary) => render_summary(summary),
        Output::Error(message) => format!("error: {message}"),
    }
}

fn render_record(record: &UserRecord) -> String {
    let mut text = String::new();

    match &record.active_workout {
        Some(workout) => {
            let name = if workout.name.is_empty() {
                "(unnamed)"
            } else {
                &workout.name
            };
            let state = if workout.is_paused { " [paused]" } else { "" };
            let _ = writeln!(text, "workout {name} on {}{state}", workout.date);
            for (i, exercise) in workout.exercises.iter().enumerate() {
                let _ = writeln!(text, "  {}. {}", i + 1, exercise.name);
                if let Some(previous) = &exercise.previous {
                    let _ = writeln!(text, "     previous: {previous}");
                }
                for (j, set) in exercise.sets.iter().enumerate() {
                    let done = if set.completed { "x" } else { " " };
                    let _ = writeln!(
                        text,
                        "     [{done}] {}. {} x {}",
                        j + 1,
                        or_dash(&set.weight),
                        or_dash(&set.reps)
                    );
                }
            }
        }
        None => {
            let _ = writeln!(text, "no active workout");
        }
    }

    let _ = write!(text, "{} saved workouts", record.workouts.len());
    for template in &record.templates {
        let _ = write!(text, "\ntemplate {} {}", template.id, template.name);
    }

    text
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

fn render_summary(summary: &WorkoutSummary) -> String {
    format!(
        "saved {} on {}: {}, {} exercises, {} sets",
        summary.name,
        summary.date,
        format_clock(summary.total_seconds),
        summary.exercises,
        summary.sets
    )
}
