use std::time::Duration;

use tokio::{
    sync::mpsc::UnboundedSender,
    task::JoinHandle,
    time::{Instant, interval_at},
};

use crate::app::Event;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Sends an event into the event loop once per period.
///
/// At most one instance is running per ticker. The first event is sent one period after the
/// start.
#[derive(Default)]
pub struct Ticker {
    task: Option<JoinHandle<()>>,
}

impl Ticker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts ticking, cancelling a previously started instance.
    pub fn start(&mut self, sender: UnboundedSender<Event>, event: Event) {
        self.stop();
        self.task = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
            loop {
                interval.tick().await;
                if sender.send(event.clone()).is_err() {
                    break;
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_period() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let mut ticker = Ticker::new();
        let start = Instant::now();

        ticker.start(sender, Event::WorkoutTick);
        assert!(ticker.is_running());

        for i in 1..=3_u32 {
            assert_eq!(receiver.recv().await, Some(Event::WorkoutTick));
            assert_eq!(start.elapsed(), TICK_PERIOD * i);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_cancels_previous_instance() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let mut ticker = Ticker::new();

        ticker.start(sender.clone(), Event::RestTick);
        ticker.start(sender, Event::WorkoutTick);

        assert_eq!(receiver.recv().await, Some(Event::WorkoutTick));
        assert_eq!(receiver.recv().await, Some(Event::WorkoutTick));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let mut ticker = Ticker::new();

        ticker.start(sender, Event::RestTick);
        assert_eq!(receiver.recv().await, Some(Event::RestTick));

        ticker.stop();
        ticker.stop();
        assert!(!ticker.is_running());
        assert_eq!(receiver.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_ticking() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        {
            let mut ticker = Ticker::new();
            ticker.start(sender, Event::RestTick);
        }
        assert_eq!(receiver.recv().await, None);
    }
}
