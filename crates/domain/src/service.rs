use log::{debug, error, info};

use crate::{
    AuthError, AuthRepository, Clock, DrainOutcome, FinishOutcome, LocalRepository, LocalState,
    PersistenceError, Reconciliation, RecordSource, RemoteRepository, RestTick, RestTimer,
    SessionError, SessionState, SetField, StorageError, SyncOutcome, SyncQueue,
    SyncQueueRepository, TemplateID, UserRecord, Username, ValidationError, Workout, WorkoutID,
    WorkoutSummary, reconcile,
};

/// Result of editing a set through the controller.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SetUpdate {
    /// Both fields became filled with this edit.
    pub completed: bool,
    pub rest_started: bool,
}

/// Owns the local state of the device and drives all operations on it.
///
/// Every mutation of the signed-in user's record is stamped, written to the local
/// repository and then pushed through the sync queue, in this order.
pub struct Service<R, C> {
    repository: R,
    clock: C,
    state: LocalState,
    rest_timer: RestTimer,
}

macro_rules! log_on_error {
    ($func: expr, $error: ident, $action: literal, $entity: literal) => {{
        let result = $func;
        match result {
            Ok(_) => {}
            Err(ref err) => match err {
                $error::Storage(StorageError::NoConnection) => {
                    debug!("failed to {} {}: {err}", $action, $entity);
                }
                $error::InvalidCredentials | $error::AlreadyExists | $error::Validation(_) => {
                    info!("failed to {} {}: {err}", $action, $entity);
                }
                _ => {
                    error!("failed to {} {}: {err}", $action, $entity);
                }
            },
        }
        result
    }};
}

impl<R, C> Service<R, C>
where
    R: LocalRepository + SyncQueueRepository + RemoteRepository + AuthRepository,
    C: Clock,
{
    pub fn new(repository: R, clock: C) -> Self {
        Self {
            repository,
            clock,
            state: LocalState::default(),
            rest_timer: RestTimer::new(),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn state(&self) -> &LocalState {
        &self.state
    }

    pub fn current_user(&self) -> Option<&Username> {
        self.state.current_user.as_ref()
    }

    /// Record of the signed-in user.
    pub fn record(&self) -> Option<&UserRecord> {
        self.state.current_record()
    }

    pub fn session_state(&self) -> SessionState {
        self.record()
            .map_or(SessionState::NoActiveWorkout, UserRecord::session_state)
    }

    /// Returns the active workout without touching its timer.
    pub fn resume_workout(&self) -> Option<&Workout> {
        self.record()?.active_workout.as_ref()
    }

    /// Total unpaused time of the active workout.
    pub fn elapsed_seconds(&self) -> Option<u64> {
        Some(self.resume_workout()?.elapsed_seconds_at(self.clock.now()))
    }

    /// Totals of the active workout up to now.
    pub fn workout_summary(&self) -> Option<WorkoutSummary> {
        Some(self.resume_workout()?.summary(self.clock.now()))
    }

    pub fn rest_timer(&self) -> &RestTimer {
        &self.rest_timer
    }

    /// Loads the local state and re-opens the session of a trusted user.
    ///
    /// A session of a user who is not trusted on this device is closed.
    pub fn restore_session(&mut self) -> Result<Option<&Username>, PersistenceError> {
        self.state = self.repository.read_state()?;
        if self.state.current_user.is_some() && !self.state.is_restorable() {
            debug!("closing session of untrusted user");
            self.state.current_user = None;
            self.repository.write_state(&self.state)?;
        }
        Ok(self.state.current_user.as_ref())
    }

    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<RecordSource, AuthError> {
        let username = validate_credentials(username, password)?;
        let remote = log_on_error!(
            self.repository
                .verify_credentials(&username, password)
                .await,
            AuthError,
            "log in",
            "user"
        )?;

        let local = self.state.users.remove(&username);
        let reconciliation = reconcile(local, remote, self.clock.now_ms());
        let requires_push = reconciliation.requires_push();
        let Reconciliation { record, source } = reconciliation;

        self.open_session(&username, record, remember_me)?;
        info!("logged in as {username} using {source:?} record");

        if requires_push {
            self.push_best_effort().await;
        } else {
            self.discard_queued(&username)?;
        }

        Ok(source)
    }

    /// Creates a user and signs in on this device as a trusted user.
    pub async fn register(&mut self, username: &str, password: &str) -> Result<(), AuthError> {
        let username = validate_credentials(username, password)?;
        let mut record = log_on_error!(
            self.repository.register(&username, password).await,
            AuthError,
            "register",
            "user"
        )?;
        record.touch(self.clock.now_ms());

        self.open_session(&username, record, true)?;
        info!("registered {username}");

        Ok(())
    }

    /// Closes the session after a final push attempt.
    ///
    /// The cached record of the user is kept for the next login.
    pub async fn logout(&mut self) -> Result<(), PersistenceError> {
        let Some(username) = self.state.current_user.clone() else {
            return Ok(());
        };

        self.push_best_effort().await;
        self.rest_timer.stop();
        self.state.current_user = None;
        self.state.trusted_user = None;
        self.repository.write_state(&self.state)?;
        info!("logged out {username}");

        Ok(())
    }

    /// Reconciles the signed-in user's record with the remote copy.
    ///
    /// Returns `None` if the remote copy could not be read.
    pub async fn refresh(&mut self) -> Result<Option<RecordSource>, SessionError> {
        let username = self
            .state
            .current_user
            .clone()
            .ok_or(SessionError::NoSession)?;

        let remote = match self.repository.read_record(&username).await {
            Ok(Some(remote)) => remote,
            Ok(None) => {
                debug!("no remote record of {username}");
                return Ok(None);
            }
            Err(err) => {
                if err.is_transient() {
                    debug!("failed to refresh record of {username}: {err}");
                } else {
                    error!("failed to refresh record of {username}: {err}");
                }
                return Ok(None);
            }
        };

        let local = self.state.users.remove(&username);
        let Reconciliation { record, source } = reconcile(local, remote, self.clock.now_ms());
        if source == RecordSource::Remote && record.active_workout.is_none() {
            self.rest_timer.stop();
        }
        self.state.users.insert(username.clone(), record);
        self.repository.write_state(&self.state)?;

        match source {
            RecordSource::Local => self.push_best_effort().await,
            RecordSource::Remote => self.discard_queued(&username)?,
        }

        Ok(Some(source))
    }

    /// Drains the sync queue, e.g. at startup.
    pub async fn process_sync_queue(&self) -> Result<DrainOutcome, PersistenceError> {
        SyncQueue::new(&self.repository).drain().await
    }

    /// Delivers all pending snapshots and then refreshes the signed-in user's record.
    ///
    /// The refresh is skipped while snapshots are pending, as it could replace local changes
    /// that have not reached the remote store yet.
    pub async fn synchronize(&mut self) -> Result<DrainOutcome, SessionError> {
        let outcome = self.process_sync_queue().await?;
        if outcome.pending == 0 && self.state.current_user.is_some() {
            self.refresh().await?;
        }
        Ok(outcome)
    }

    pub async fn start_workout(&mut self) -> Result<WorkoutID, SessionError> {
        let now = self.clock.now();
        let id = self.record_mut()?.start_workout(now).id;
        self.rest_timer.stop();
        self.commit().await?;
        Ok(id)
    }

    /// Returns `None` if the template does not exist.
    pub async fn start_workout_from_template(
        &mut self,
        template_id: TemplateID,
    ) -> Result<Option<WorkoutID>, SessionError> {
        let now = self.clock.now();
        let Some(workout) = self
            .record_mut()?
            .start_workout_from_template(template_id, now)
        else {
            return Ok(None);
        };
        let id = workout.id;
        self.rest_timer.stop();
        self.commit().await?;
        Ok(Some(id))
    }

    pub async fn add_exercise(&mut self, name: &str) -> Result<(), SessionError> {
        if !self.record_mut()?.add_exercise_to_workout(name)? {
            return Err(SessionError::NoActiveWorkout);
        }
        self.commit().await
    }

    pub async fn add_set(&mut self, exercise_idx: usize) -> Result<(), SessionError> {
        self.active_workout_mut()?.add_set(exercise_idx);
        self.commit().await
    }

    pub async fn remove_set(
        &mut self,
        exercise_idx: usize,
        set_idx: usize,
    ) -> Result<(), SessionError> {
        self.active_workout_mut()?
            .remove_set(exercise_idx, set_idx);
        self.commit().await
    }

    /// Writes a set field and completes the set once both fields are filled.
    ///
    /// Completing a set starts a rest period if the rest timer is enabled. A set that is
    /// already completed does not start another one.
    pub async fn update_set(
        &mut self,
        exercise_idx: usize,
        set_idx: usize,
        field: SetField,
        value: &str,
    ) -> Result<SetUpdate, SessionError> {
        let (completed, rest_duration) = {
            let workout = self.active_workout_mut()?;
            workout.update_set(exercise_idx, set_idx, field, value);
            let completed = workout.exercises[exercise_idx].sets[set_idx].complete_if_filled();
            (
                completed,
                workout.use_rest_timer.then_some(workout.rest_duration),
            )
        };

        let rest_started = match rest_duration {
            Some(seconds) if completed => {
                self.rest_timer.start(seconds);
                true
            }
            _ => false,
        };

        self.commit().await?;

        Ok(SetUpdate {
            completed,
            rest_started,
        })
    }

    pub async fn rename_workout(&mut self, name: &str) -> Result<(), SessionError> {
        self.active_workout_mut()?.name = name.to_string();
        self.commit().await
    }

    pub async fn pause(&mut self) -> Result<(), SessionError> {
        let now = self.clock.now();
        if self.record_mut()?.pause_active_workout(now) {
            self.commit().await?;
        }
        Ok(())
    }

    pub async fn resume(&mut self) -> Result<(), SessionError> {
        let now = self.clock.now();
        if self.record_mut()?.resume_active_workout(now) {
            self.commit().await?;
        }
        Ok(())
    }

    pub async fn finish_workout(&mut self) -> Result<FinishOutcome, SessionError> {
        let now = self.clock.now();
        let outcome = self
            .record_mut()?
            .finish_workout(now)
            .ok_or(SessionError::NoActiveWorkout)?;
        self.rest_timer.stop();
        self.commit().await?;

        match outcome {
            FinishOutcome::Saved(id) => info!("saved workout {id}"),
            FinishOutcome::Discarded => info!("discarded workout without data"),
        }

        Ok(outcome)
    }

    pub async fn save_template(&mut self, name: Option<&str>) -> Result<TemplateID, SessionError> {
        let id = self
            .record_mut()?
            .save_template(name)
            .ok_or(SessionError::NoActiveWorkout)?;
        self.commit().await?;
        Ok(id)
    }

    /// Returns false if the template does not exist.
    pub async fn delete_template(&mut self, template_id: TemplateID) -> Result<bool, SessionError> {
        if !self.record_mut()?.delete_template(template_id) {
            return Ok(false);
        }
        self.commit().await?;
        Ok(true)
    }

    /// Disabling the rest timer cancels a running rest period.
    pub async fn set_rest_timer(&mut self, enabled: bool) -> Result<(), SessionError> {
        self.active_workout_mut()?.use_rest_timer = enabled;
        if !enabled {
            self.rest_timer.stop();
        }
        self.commit().await
    }

    /// Sets the rest duration, enables the rest timer and starts a rest period.
    pub async fn set_rest_duration(&mut self, seconds: u32) -> Result<(), SessionError> {
        let workout = self.active_workout_mut()?;
        workout.rest_duration = seconds;
        workout.use_rest_timer = true;
        self.rest_timer.start(seconds);
        self.commit().await
    }

    /// Starts a rest period of the active workout's rest duration.
    pub fn start_rest(&mut self) -> Result<u32, SessionError> {
        let seconds = self
            .resume_workout()
            .ok_or(SessionError::NoActiveWorkout)?
            .rest_duration;
        self.rest_timer.start(seconds);
        Ok(seconds)
    }

    pub fn stop_rest(&mut self) {
        self.rest_timer.stop();
    }

    pub fn tick_rest(&mut self) -> RestTick {
        self.rest_timer.tick()
    }

    fn record_mut(&mut self) -> Result<&mut UserRecord, SessionError> {
        self.state
            .current_record_mut()
            .ok_or(SessionError::NoSession)
    }

    fn active_workout_mut(&mut self) -> Result<&mut Workout, SessionError> {
        self.record_mut()?
            .active_workout
            .as_mut()
            .ok_or(SessionError::NoActiveWorkout)
    }

    fn open_session(
        &mut self,
        username: &Username,
        record: UserRecord,
        trusted: bool,
    ) -> Result<(), PersistenceError> {
        self.rest_timer.stop();
        self.state.users.insert(username.clone(), record);
        self.state.current_user = Some(username.clone());
        self.state.trusted_user = trusted.then(|| username.clone());
        self.repository.write_state(&self.state)
    }

    /// Stamps, persists and pushes the signed-in user's record.
    async fn commit(&mut self) -> Result<(), SessionError> {
        let now_ms = self.clock.now_ms();
        self.record_mut()?.touch(now_ms);

        if let Err(err) = self.repository.write_state(&self.state) {
            error!("{err}");
            return Err(err.into());
        }

        self.push().await?;
        Ok(())
    }

    async fn push(&self) -> Result<SyncOutcome, PersistenceError> {
        let (Some(username), Some(record)) = (self.current_user(), self.record()) else {
            return Ok(SyncOutcome::Delivered);
        };
        let outcome = SyncQueue::new(&self.repository)
            .push(username.clone(), record.clone())
            .await;
        match &outcome {
            Ok(SyncOutcome::Queued { pending }) => {
                debug!("record of {username} queued, {pending} pending");
            }
            Ok(SyncOutcome::Delivered) => {}
            Err(err) => error!("failed to queue record of {username}: {err}"),
        }
        outcome
    }

    async fn push_best_effort(&self) {
        let _ = self.push().await;
    }

    /// Drops queued snapshots that lost against the remote record.
    fn discard_queued(&self, username: &Username) -> Result<(), PersistenceError> {
        let discarded = SyncQueue::new(&self.repository).discard(username)?;
        if discarded > 0 {
            info!("discarded {discarded} outdated snapshots of {username}");
        }
        Ok(())
    }
}

fn validate_credentials(username: &str, password: &str) -> Result<Username, ValidationError> {
    let username = Username::new(username)?;
    if password.is_empty() {
        return Err(ValidationError::EmptyPassword);
    }
    Ok(username)
}
