//! Event loop between the user interface and the domain service.
//!
//! The user interface sends `Event`s into the loop and renders the returned `Output`s. All
//! events are applied one after another by a single task, tickers only enqueue events.

use fitjournal_domain::{
    AuthError, AuthRepository, Clock, FinishOutcome, LocalRepository, PersistenceError,
    RemoteRepository, RestTick, Service, SessionError, SessionState, SetField,
    SyncQueueRepository, TemplateID, UserRecord, WorkoutSummary, format_clock,
};
use log::{debug, error, info, warn};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::ticker::Ticker;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    StartWorkout,
    ResumeWorkout,
    AddExercise(String),
    UpdateSet {
        exercise_idx: usize,
        set_idx: usize,
        field: SetField,
        value: String,
    },
    AddSet {
        exercise_idx: usize,
    },
    RemoveSet {
        exercise_idx: usize,
        set_idx: usize,
    },
    Pause,
    Resume,
    FinishWorkout,
    SaveTemplate(Option<String>),
    StartFromTemplate(TemplateID),
    DeleteTemplate(TemplateID),
    Login {
        username: String,
        password: String,
        remember_me: bool,
    },
    Register {
        username: String,
        password: String,
    },
    Logout,
    SetWorkoutName(String),
    SetRestTimer(bool),
    SetRestDuration(u32),
    StartRest,
    StopRest,
    ConnectivityRestored,
    RestTick,
    WorkoutTick,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Record of the signed-in user, `None` if nobody is signed in.
    Record(Option<Box<UserRecord>>),
    WorkoutClock(String),
    RestClock(String),
    RestComplete,
    /// Totals of a workout that was just saved.
    Summary(WorkoutSummary),
    Error(String),
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("template {0} not found")]
    TemplateNotFound(TemplateID),
}

pub struct App<R, C> {
    service: Service<R, C>,
    sender: UnboundedSender<Event>,
    workout_ticker: Ticker,
    rest_ticker: Ticker,
}

impl<R, C> App<R, C>
where
    R: LocalRepository + SyncQueueRepository + RemoteRepository + AuthRepository,
    C: Clock,
{
    /// Tick events are sent to `sender`, which must feed the receiver passed to `run`.
    pub fn new(service: Service<R, C>, sender: UnboundedSender<Event>) -> Self {
        Self {
            service,
            sender,
            workout_ticker: Ticker::new(),
            rest_ticker: Ticker::new(),
        }
    }

    pub fn service(&self) -> &Service<R, C> {
        &self.service
    }

    /// Restores the session of a trusted user and delivers pending snapshots.
    pub async fn start(&mut self) -> Vec<Output> {
        let mut outputs = vec![];

        match self.service.restore_session() {
            Ok(Some(username)) => info!("restored session of {username}"),
            Ok(None) => {}
            Err(err) => {
                error!("failed to restore session: {err}");
                outputs.push(Output::Error(err.to_string()));
            }
        }

        match self.service.process_sync_queue().await {
            Ok(outcome) if outcome.pending > 0 => {
                debug!("{} snapshots pending after startup", outcome.pending);
            }
            Ok(_) => {}
            Err(err) => {
                error!("failed to process sync queue: {err}");
                outputs.push(Output::Error(err.to_string()));
            }
        }

        self.update_tickers();
        outputs.push(self.record());
        outputs.extend(self.workout_clock());
        outputs
    }

    /// Applies one event. A failed event results in a single `Output::Error`.
    pub async fn handle(&mut self, event: Event) -> Vec<Output> {
        let outputs = match self.apply(event).await {
            Ok(outputs) => outputs,
            Err(err) => {
                match &err {
                    Error::Persistence(_)
                    | Error::Session(SessionError::Persistence(_))
                    | Error::Auth(AuthError::Persistence(_)) => warn!("{err}"),
                    _ => debug!("{err}"),
                }
                vec![Output::Error(err.to_string())]
            }
        };
        self.update_tickers();
        outputs
    }

    /// Runs until `Event::Shutdown` is received or the output receiver is dropped.
    pub async fn run(
        &mut self,
        mut events: UnboundedReceiver<Event>,
        outputs: UnboundedSender<Output>,
    ) {
        let initial = self.start().await;
        if emit(&outputs, initial) {
            while let Some(event) = events.recv().await {
                if event == Event::Shutdown {
                    break;
                }
                let result = self.handle(event).await;
                if !emit(&outputs, result) {
                    break;
                }
            }
        }
        self.workout_ticker.stop();
        self.rest_ticker.stop();
    }

    async fn apply(&mut self, event: Event) -> Result<Vec<Output>, Error> {
        let mut outputs = vec![];

        match event {
            Event::StartWorkout => {
                self.service.start_workout().await?;
                self.start_workout_ticker();
                outputs.push(self.record());
                outputs.extend(self.workout_clock());
            }
            Event::ResumeWorkout => {
                self.service
                    .resume_workout()
                    .ok_or(SessionError::NoActiveWorkout)?;
                outputs.push(self.record());
                outputs.extend(self.workout_clock());
                outputs.extend(self.rest_clock());
            }
            Event::AddExercise(name) => {
                self.service.add_exercise(&name).await?;
                outputs.push(self.record());
            }
            Event::UpdateSet {
                exercise_idx,
                set_idx,
                field,
                value,
            } => {
                let update = self
                    .service
                    .update_set(exercise_idx, set_idx, field, &value)
                    .await?;
                outputs.push(self.record());
                if update.rest_started {
                    self.start_rest_ticker();
                    outputs.extend(self.rest_clock());
                }
            }
            Event::AddSet { exercise_idx } => {
                self.service.add_set(exercise_idx).await?;
                outputs.push(self.record());
            }
            Event::RemoveSet {
                exercise_idx,
                set_idx,
            } => {
                self.service.remove_set(exercise_idx, set_idx).await?;
                outputs.push(self.record());
            }
            Event::Pause => {
                self.service.pause().await?;
                outputs.push(self.record());
                outputs.extend(self.workout_clock());
            }
            Event::Resume => {
                self.service.resume().await?;
                outputs.push(self.record());
                outputs.extend(self.workout_clock());
            }
            Event::FinishWorkout => {
                let summary = self.service.workout_summary();
                let outcome = self.service.finish_workout().await?;
                outputs.push(self.record());
                if let (FinishOutcome::Saved(_), Some(summary)) = (outcome, summary) {
                    outputs.push(Output::Summary(summary));
                }
            }
            Event::SaveTemplate(name) => {
                self.service.save_template(name.as_deref()).await?;
                outputs.push(self.record());
            }
            Event::StartFromTemplate(template_id) => {
                self.service
                    .start_workout_from_template(template_id)
                    .await?
                    .ok_or(Error::TemplateNotFound(template_id))?;
                self.start_workout_ticker();
                outputs.push(self.record());
                outputs.extend(self.workout_clock());
            }
            Event::DeleteTemplate(template_id) => {
                if !self.service.delete_template(template_id).await? {
                    return Err(Error::TemplateNotFound(template_id));
                }
                outputs.push(self.record());
            }
            Event::Login {
                username,
                password,
                remember_me,
            } => {
                self.service.login(&username, &password, remember_me).await?;
                outputs.push(self.record());
                outputs.extend(self.workout_clock());
            }
            Event::Register { username, password } => {
                self.service.register(&username, &password).await?;
                outputs.push(self.record());
            }
            Event::Logout => {
                self.service.logout().await?;
                outputs.push(self.record());
            }
            Event::SetWorkoutName(name) => {
                self.service.rename_workout(&name).await?;
                outputs.push(self.record());
            }
            Event::SetRestTimer(enabled) => {
                self.service.set_rest_timer(enabled).await?;
                outputs.push(self.record());
            }
            Event::SetRestDuration(seconds) => {
                self.service.set_rest_duration(seconds).await?;
                self.start_rest_ticker();
                outputs.push(self.record());
                outputs.extend(self.rest_clock());
            }
            Event::StartRest => {
                self.service.start_rest()?;
                self.start_rest_ticker();
                outputs.extend(self.rest_clock());
            }
            Event::StopRest => {
                self.service.stop_rest();
            }
            Event::ConnectivityRestored => {
                let outcome = self.service.synchronize().await?;
                debug!(
                    "delivered {} snapshots, {} pending",
                    outcome.delivered, outcome.pending
                );
                outputs.push(self.record());
            }
            Event::RestTick => match self.service.tick_rest() {
                RestTick::Remaining(seconds) => {
                    outputs.push(Output::RestClock(format_clock(u64::from(seconds))));
                }
                RestTick::Complete => {
                    outputs.push(Output::RestClock(format_clock(0)));
                    outputs.push(Output::RestComplete);
                }
                RestTick::Idle => {}
            },
            Event::WorkoutTick => {
                outputs.extend(self.workout_clock());
            }
            Event::Shutdown => {}
        }

        Ok(outputs)
    }

    /// Keeps the tickers in line with the state after an event.
    fn update_tickers(&mut self) {
        if self.service.session_state() == SessionState::Running {
            if !self.workout_ticker.is_running() {
                self.start_workout_ticker();
            }
        } else {
            self.workout_ticker.stop();
        }

        if !self.service.rest_timer().is_active() {
            self.rest_ticker.stop();
        }
    }

    fn start_workout_ticker(&mut self) {
        self.workout_ticker
            .start(self.sender.clone(), Event::WorkoutTick);
    }

    fn start_rest_ticker(&mut self) {
        self.rest_ticker.start(self.sender.clone(), Event::RestTick);
    }

    fn record(&self) -> Output {
        Output::Record(self.service.record().cloned().map(Box::new))
    }

    fn workout_clock(&self) -> Option<Output> {
        Some(Output::WorkoutClock(format_clock(
            self.service.elapsed_seconds()?,
        )))
    }

    fn rest_clock(&self) -> Option<Output> {
        Some(Output::RestClock(format_clock(u64::from(
            self.service.rest_timer().remaining()?,
        ))))
    }
}

/// Returns false if nobody is receiving the outputs anymore.
fn emit(sender: &UnboundedSender<Output>, outputs: Vec<Output>) -> bool {
    outputs.into_iter().all(|output| sender.send(output).is_ok())
}
