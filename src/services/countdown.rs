//! One-second countdown driving the game timer.
//!
//! The countdown task never touches the store. It posts [`TimerSignal`]s back to its owner, each
//! tagged with the generation it was started under, so the owner can drop signals from a
//! countdown it has already cancelled or replaced.

use std::time::Duration;

use tokio::{
    sync::mpsc::{UnboundedSender, WeakUnboundedSender},
    task::JoinHandle,
    time::{Instant, interval_at},
};
use tracing::debug;

const TICK: Duration = Duration::from_secs(1);

/// Message posted by a running countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSignal {
    /// One second elapsed; `remaining` seconds are left.
    Tick { generation: u64, remaining: u32 },
    /// The countdown reached zero. Always posted after the `remaining: 0` tick.
    Elapsed { generation: u64 },
}

impl TimerSignal {
    /// Generation of the countdown that produced this signal.
    pub fn generation(&self) -> u64 {
        match self {
            TimerSignal::Tick { generation, .. } | TimerSignal::Elapsed { generation } => {
                *generation
            }
        }
    }
}

/// At most one live countdown, reporting into the owner's inbox.
pub struct CountdownTimer<M> {
    inbox: WeakUnboundedSender<M>,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl<M> CountdownTimer<M>
where
    M: From<TimerSignal> + Send + 'static,
{
    /// Countdowns will post into `inbox` as long as the channel is open.
    pub fn new(inbox: WeakUnboundedSender<M>) -> Self {
        Self {
            inbox,
            generation: 0,
            task: None,
        }
    }

    /// Cancel whatever is running and start a fresh countdown. Returns its generation.
    pub fn start(&mut self, seconds: u32) -> u64 {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;

        match self.inbox.upgrade() {
            Some(sender) => {
                self.task = Some(tokio::spawn(run(sender, generation, seconds)));
                debug!(generation, seconds, "countdown started");
            }
            None => debug!(generation, "countdown not started; inbox closed"),
        }
        generation
    }

    /// Stop the running countdown. Calling it with nothing running does nothing.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(generation = self.generation, "countdown cancelled");
        }
    }

    /// Whether signals tagged with `generation` come from the running countdown.
    pub fn is_live(&self, generation: u64) -> bool {
        self.task.is_some() && generation == self.generation
    }

    /// Forget the countdown after its [`TimerSignal::Elapsed`] has been received.
    pub fn finish(&mut self) {
        self.task = None;
    }
}

impl<M> Drop for CountdownTimer<M> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run<M: From<TimerSignal>>(sender: UnboundedSender<M>, generation: u64, seconds: u32) {
    let mut ticks = interval_at(Instant::now() + TICK, TICK);
    let mut remaining = seconds;

    while remaining > 0 {
        ticks.tick().await;
        remaining -= 1;
        if sender
            .send(TimerSignal::Tick {
                generation,
                remaining,
            }
            .into())
            .is_err()
        {
            return;
        }
    }

    let _ = sender.send(TimerSignal::Elapsed { generation }.into());
}
