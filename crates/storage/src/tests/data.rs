use chrono::NaiveDate;
use fitjournal_domain as domain;

pub static USERNAME: std::sync::LazyLock<domain::Username> =
    std::sync::LazyLock::new(|| domain::Username::new("alice").unwrap());

pub static WORKOUT: std::sync::LazyLock<domain::Workout> =
    std::sync::LazyLock::new(|| domain::Workout {
        id: 1.into(),
        name: "Legs".to_string(),
        date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        exercises: vec![domain::Exercise {
            id: 2.into(),
            name: domain::Name::new("Squat").unwrap(),
            sets: vec![domain::Set {
                weight: "100".to_string(),
                reps: "5".to_string(),
                completed: true,
            }],
            previous: Some("90 x 5".to_string()),
            notes: String::new(),
        }],
        start_time: None,
        elapsed_seconds: 2700,
        is_paused: true,
        use_rest_timer: true,
        rest_duration: 30,
    });

pub static USER_RECORD: std::sync::LazyLock<domain::UserRecord> =
    std::sync::LazyLock::new(|| domain::UserRecord {
        password_hash: "hash".to_string(),
        workouts: vec![WORKOUT.clone()],
        active_workout: None,
        exercise_history: [(
            domain::Name::new("Squat").unwrap(),
            domain::ExerciseHistory {
                last_sets: vec![domain::LastSet {
                    weight: "100".to_string(),
                    reps: "5".to_string(),
                }],
                last_performed: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            },
        )]
        .into(),
        exercise_library: [domain::Name::new("Squat").unwrap()].into_iter().collect(),
        templates: vec![domain::Template {
            id: 3.into(),
            name: domain::Name::new("Legs").unwrap(),
            exercises: vec![domain::TemplateExercise {
                name: domain::Name::new("Squat").unwrap(),
            }],
        }],
        updated_at: 1_709_282_700_000,
        version: 1,
    });

pub static USER_RECORD_2: std::sync::LazyLock<domain::UserRecord> =
    std::sync::LazyLock::new(|| {
        let mut record = domain::UserRecord::new("hash".to_string());
        record.exercise_library = [domain::Name::new("Row").unwrap()].into_iter().collect();
        record.updated_at = 1_709_290_000_000;
        record
    });
