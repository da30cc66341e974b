//! Single-queue transition dispatch.
//!
//! The driver owns the [`TimerEngine`] and is the only thing that mutates
//! it. Clock ticks, lifecycle transitions, user commands and prompt answers
//! all arrive as [`Input`]s on one queue and are applied strictly in arrival
//! order by [`TimerDriver::dispatch`]. After every input the ticker is
//! started or stopped to match whether the engine is running.
//!
//! Records are appended to the session store inside the dispatch of the
//! input that ended the interval, before any follow-up prompt is presented.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, trace, warn};

use crate::events::Event;
use crate::lifecycle::LifecycleTransition;
use crate::ports::{CategorySource, PromptSurface, SessionStore, SettingsProvider};
use crate::session::SessionRecord;
use crate::ticker::Ticker;
use crate::timer::{DecisionToken, IssuedDecision, Mode, Resolution, TimerEngine};

/// User actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "arg", rename_all = "snake_case")]
pub enum Command {
    Start,
    Pause,
    /// Ask for confirmation, then stop and save.
    Stop,
    /// Stop and save without asking.
    StopNow,
    Reset,
    ResetCycle,
    SwitchMode(Mode),
    AdjustDuration(i64),
    Status,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    Lifecycle(LifecycleTransition),
    Decision {
        token: DecisionToken,
        choice: Option<usize>,
    },
    Tick {
        generation: u64,
    },
    Shutdown,
}

pub struct TimerDriver<S, C, D, P> {
    engine: TimerEngine,
    settings: S,
    categories: C,
    store: D,
    prompts: P,
    ticker: Ticker,
    queue: UnboundedSender<Input>,
    events: UnboundedSender<Event>,
}

impl<S, C, D, P> TimerDriver<S, C, D, P>
where
    S: SettingsProvider,
    C: CategorySource,
    D: SessionStore,
    P: PromptSurface,
{
    /// `queue` is the sending half of the inbox passed to [`run`](Self::run);
    /// the ticker feeds it.
    pub fn new(
        settings: S,
        categories: C,
        store: D,
        prompts: P,
        queue: UnboundedSender<Input>,
        events: UnboundedSender<Event>,
    ) -> Self {
        let engine = TimerEngine::new(&settings.snapshot());
        Self {
            engine,
            settings,
            categories,
            store,
            prompts,
            ticker: Ticker::default(),
            queue,
            events,
        }
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    pub fn prompts(&self) -> &P {
        &self.prompts
    }

    pub fn categories_mut(&mut self) -> &mut C {
        &mut self.categories
    }

    pub fn settings_mut(&mut self) -> &mut S {
        &mut self.settings
    }

    /// Generation of the ticks currently accepted.
    pub fn tick_generation(&self) -> u64 {
        self.ticker.generation()
    }

    pub fn ticker_active(&self) -> bool {
        self.ticker.is_active()
    }

    /// Drain `inbox` until it closes or a [`Input::Shutdown`] arrives.
    pub async fn run(mut self, mut inbox: UnboundedReceiver<Input>) -> Self {
        self.emit(self.engine.snapshot());
        while let Some(input) = inbox.recv().await {
            if !self.dispatch(input) {
                break;
            }
        }
        self.ticker.stop();
        debug!("timer driver stopped");
        self
    }

    /// Apply one input. Returns `false` once the driver should stop.
    ///
    /// Must be called from within a tokio runtime, since starting the ticker
    /// spawns a task.
    pub fn dispatch(&mut self, input: Input) -> bool {
        trace!(?input, "dispatch");
        match input {
            Input::Tick { generation } => self.on_tick(generation),
            Input::Command(command) => self.on_command(command),
            Input::Lifecycle(transition) => self.on_lifecycle(transition),
            Input::Decision { token, choice } => self.on_decision(token, choice),
            Input::Shutdown => {
                self.ticker.stop();
                return false;
            }
        }
        self.sync_ticker();
        true
    }

    fn on_tick(&mut self, generation: u64) {
        if !self.ticker.accepts(generation) {
            trace!(generation, "stale tick dropped");
            return;
        }
        if let Some(event) = self.engine.tick() {
            self.emit(event);
        }
        if self.engine.needs_completion() {
            self.finish_interval();
        }
    }

    fn on_command(&mut self, command: Command) {
        let event = match command {
            Command::Start => self.engine.start(),
            Command::Pause => self.engine.pause(),
            Command::Stop => {
                if let Some(decision) = self.engine.request_stop() {
                    self.present(decision);
                }
                None
            }
            Command::StopNow => {
                self.stop_now();
                None
            }
            Command::Reset => {
                let settings = self.settings.snapshot();
                Some(self.engine.reset_without_saving(&settings))
            }
            Command::ResetCycle => Some(self.engine.reset_cycle()),
            Command::SwitchMode(mode) => {
                let settings = self.settings.snapshot();
                self.engine.switch_mode(mode, &settings)
            }
            Command::AdjustDuration(delta) => self.engine.adjust_duration(delta),
            Command::Status => Some(self.engine.snapshot()),
        };
        match event {
            Some(event) => self.emit(event),
            None => trace!(?command, "command produced no event"),
        }
    }

    fn on_lifecycle(&mut self, transition: LifecycleTransition) {
        match transition {
            LifecycleTransition::BecameBackground => {
                if let Some(event) = self.engine.background() {
                    self.emit(event);
                }
            }
            LifecycleTransition::BecameForeground => {
                if let Some(decision) = self.engine.foreground() {
                    self.present(decision);
                }
            }
        }
    }

    fn on_decision(&mut self, token: DecisionToken, choice: Option<usize>) {
        let settings = self.settings.snapshot();
        let Some(resolved) = self.engine.resolve(token, choice, &settings) else {
            return;
        };
        debug!(%token, resolution = ?resolved.resolution, "decision resolved");
        if let Some(event) = resolved.event {
            self.emit(event);
        }
        if resolved.resolution == Resolution::StopConfirmed {
            self.stop_now();
        }
    }

    fn finish_interval(&mut self) {
        let settings = self.settings.snapshot();
        let category = self.categories.current();
        let Some(end) = self
            .engine
            .complete_interval(&settings, category.as_ref(), Utc::now())
        else {
            return;
        };
        info!(proposed = ?end.proposed, "interval complete");
        for event in end.events {
            self.emit(event);
        }
        if let Some(record) = end.record {
            self.persist(record);
        }
        if let Some(decision) = end.decision {
            self.present(decision);
        }
    }

    fn stop_now(&mut self) {
        let settings = self.settings.snapshot();
        let category = self.categories.current();
        let Some(stopped) = self
            .engine
            .stop_and_save(&settings, category.as_ref(), Utc::now())
        else {
            return;
        };
        self.emit(stopped.event);
        if let Some(record) = stopped.record {
            self.persist(record);
        }
    }

    fn persist(&mut self, record: SessionRecord) {
        match self.store.append(&record) {
            Ok(id) => {
                info!(id, minutes = record.duration_minutes, category = %record.category, "session saved");
                self.emit(Event::SessionSaved { id, record });
            }
            Err(err) => {
                warn!(error = %err, "session could not be saved");
                self.emit(Event::SessionSaveFailed {
                    message: err.to_string(),
                    record,
                });
            }
        }
    }

    fn present(&mut self, decision: IssuedDecision) {
        self.prompts.present(decision.token, &decision.prompt);
        self.emit(decision.to_event());
    }

    fn sync_ticker(&mut self) {
        match (self.engine.is_running(), self.ticker.is_active()) {
            (true, false) => self.ticker.start(self.queue.clone()),
            (false, true) => self.ticker.stop(),
            _ => {}
        }
    }

    fn emit(&self, event: Event) {
        if self.events.send(event).is_err() {
            trace!("event receiver gone");
        }
    }
}
