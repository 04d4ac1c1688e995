//! The kact aggregate: a validated act string and its replay.

use parking_lot::Mutex;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::act::{KeyAct, MAX_TOKENS, MIN_TOKENS};
use crate::config::ReplayConfig;
use crate::error::{KactError, Result};
use crate::replay::{
    ActNotice, QueueView, ReplayDispatcher, ReplayEvent, ReplaySession, ReplayTrace, Sleeper,
    ThreadSleeper, VirtualClock, WaitNotice,
};
use crate::sensor;
use crate::source::KactSource;
use crate::stats::{count_required_chars, count_submissions, KactSummary, Leftovers};

/// Split an act string into decoded acts.
///
/// All or nothing: one malformed segment rejects the whole string.
pub fn validate(act: &str) -> Result<Vec<KeyAct>> {
    if !sensor::is_well_formed(act) {
        return Err(KactError::Malformed);
    }

    act.split(';')
        .filter(|segment| !segment.is_empty())
        .enumerate()
        .map(|(segment, raw)| {
            let tokens: Vec<&str> = raw.split(',').filter(|t| !t.is_empty()).collect();
            if tokens.len() < MIN_TOKENS || tokens.len() > MAX_TOKENS {
                return Err(KactError::TokenCount {
                    segment,
                    count: tokens.len(),
                });
            }
            KeyAct::from_tokens(segment, &tokens)
        })
        .collect()
}

/// Check if `act` is a valid act string.
pub fn is_valid_kact(act: &str) -> bool {
    validate(act).is_ok()
}

fn trim_act(text: &str) -> &str {
    text.trim_matches(|c| matches!(c, '\r' | '\n' | ' ' | '\t'))
}

/// A parsed act string.
///
/// Construction never fails: invalid input yields an instance with no acts,
/// so callers check [`Kact::is_valid`] before replaying. [`Kact::parse`] is
/// the strict variant.
#[derive(Debug, Default)]
pub struct Kact {
    /// Trimmed act string the acts were parsed from.
    kact: String,
    /// Whole input when the act string came wrapped in a sensor payload.
    sensor_data: Option<String>,
    acts: Vec<KeyAct>,
    required_char_count: usize,
    submissions: usize,
    dispatcher: ReplayDispatcher,
    last_replay: Option<ReplaySession>,
}

impl Kact {
    /// Parse `input`, which may be a bare act string or a sensor payload.
    pub fn new(input: Option<&str>) -> Self {
        let mut kact = Self::default();
        match input {
            Some(input) => {
                if let Err(e) = kact.load(input) {
                    tracing::debug!("Rejected kact input: {}", e);
                }
            }
            None => tracing::debug!("Rejected kact input: absent"),
        }
        kact
    }

    /// Parse `input`, reporting why it was rejected.
    pub fn parse(input: &str) -> Result<Self> {
        let mut kact = Self::default();
        kact.load(input)?;
        Ok(kact)
    }

    /// Read and parse a kact from `source`.
    pub fn from_source(source: &KactSource) -> Result<Self> {
        Self::parse(&source.read()?)
    }

    /// Split and decode an act string without building an aggregate.
    pub fn validate(act: &str) -> Result<Vec<KeyAct>> {
        validate(act)
    }

    fn load(&mut self, input: &str) -> Result<()> {
        let mut text = input;
        if sensor::is_sensor_payload(input) {
            self.sensor_data = Some(input.to_string());
            text = sensor::extract(input).unwrap_or_default();
        }

        let text = trim_act(text);
        if text.chars().all(|c| c.is_whitespace() || c.is_control()) {
            return Err(KactError::EmptyInput);
        }

        let acts = validate(text)?;
        self.required_char_count = count_required_chars(&acts);
        self.submissions = count_submissions(&acts);
        self.kact = text.to_string();
        self.acts = acts;
        Ok(())
    }

    /// True when the input parsed into at least one act.
    pub fn is_valid(&self) -> bool {
        !self.acts.is_empty()
    }

    /// Parsed acts in temporal order.
    pub fn acts(&self) -> &[KeyAct] {
        &self.acts
    }

    /// The sensor payload the act string was extracted from, if any.
    pub fn sensor_data(&self) -> Option<&str> {
        self.sensor_data.as_deref()
    }

    /// Number of KeyPress acts, i.e. characters replay has to produce.
    pub fn required_char_count(&self) -> usize {
        self.required_char_count
    }

    /// Number of acts that trigger a submission, e.g. Enter.
    pub fn submissions(&self) -> usize {
        self.submissions
    }

    pub fn stats(&self) -> KactSummary {
        KactSummary {
            submissions: self.submissions,
            ..KactSummary::from_acts(&self.acts)
        }
    }

    /// Human readable summary of the act counts.
    pub fn summary(&self) -> String {
        self.stats().to_string()
    }

    /// Notification handlers for replays of this kact.
    pub fn dispatcher_mut(&mut self) -> &mut ReplayDispatcher {
        &mut self.dispatcher
    }

    pub fn on_wait<F>(&mut self, handler: F)
    where
        F: FnMut(&WaitNotice) + Send + 'static,
    {
        self.dispatcher.on_wait(handler);
    }

    pub fn on_key_down<F>(&mut self, handler: F)
    where
        F: FnMut(&ActNotice<'_>) + Send + 'static,
    {
        self.dispatcher.on_key_down(handler);
    }

    pub fn on_key_press<F>(&mut self, handler: F)
    where
        F: FnMut(&ActNotice<'_>) + Send + 'static,
    {
        self.dispatcher.on_key_press(handler);
    }

    pub fn on_key_up<F>(&mut self, handler: F)
    where
        F: FnMut(&ActNotice<'_>) + Send + 'static,
    {
        self.dispatcher.on_key_up(handler);
    }

    pub fn on_event<F>(&mut self, handler: F)
    where
        F: FnMut(ReplayEvent) + Send + 'static,
    {
        self.dispatcher.on_event(handler);
    }

    /// Replay the acts in real time on the calling thread.
    ///
    /// With `skip_wait` the acts are dispatched back to back and no wait
    /// notification fires. Replaying an invalid kact does nothing.
    pub fn play(&mut self, skip_wait: bool) {
        let config = ReplayConfig::default().with_skip_wait(skip_wait);
        self.play_with(&config, &mut ThreadSleeper);
    }

    /// Replay with an explicit config and time source.
    pub fn play_with(&mut self, config: &ReplayConfig, sleeper: &mut dyn Sleeper) {
        let session = ReplaySession::run(
            &mut self.acts,
            self.required_char_count,
            &mut self.dispatcher,
            config,
            sleeper,
        );
        self.finish(session);
    }

    /// Replay against a virtual clock and collect every notification.
    ///
    /// Handlers registered on this kact are not called.
    pub fn trace(&mut self, skip_wait: bool) -> ReplayTrace {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = ReplayDispatcher::new();
        let sink = events.clone();
        dispatcher.on_event(move |event| sink.lock().push(event));

        let config = ReplayConfig::default().with_skip_wait(skip_wait);
        let session = ReplaySession::run(
            &mut self.acts,
            self.required_char_count,
            &mut dispatcher,
            &config,
            &mut VirtualClock::new(),
        );
        self.finish(session);
        drop(dispatcher);

        let events = std::mem::take(&mut *events.lock());
        ReplayTrace { events }
    }

    fn finish(&mut self, session: ReplaySession) {
        let leftovers = session.leftovers(&self.acts);
        if !leftovers.is_clean() {
            tracing::warn!(
                "Replay left open key states: {} key presses, {} key ups",
                leftovers.key_press,
                leftovers.key_up
            );
        }
        if !session.unknown().is_empty() {
            tracing::warn!(
                "Replay met {} acts with unknown key codes",
                session.unknown().len()
            );
        }
        self.last_replay = Some(session);
    }

    /// Session state of the most recent replay.
    pub fn last_replay(&self) -> Option<&ReplaySession> {
        self.last_replay.as_ref()
    }

    /// Open key states after the most recent replay; zeros before any.
    pub fn leftover_counts(&self) -> Leftovers {
        self.last_replay
            .as_ref()
            .map(|session| session.leftovers(&self.acts))
            .unwrap_or_default()
    }

    /// Acts with unknown key codes met by the most recent replay.
    pub fn unknown_acts(&self) -> Vec<&KeyAct> {
        self.last_replay
            .as_ref()
            .map(|session| session.unknown().iter().map(|&i| &self.acts[i]).collect())
            .unwrap_or_default()
    }

    /// Press queue left by the most recent replay.
    pub fn press_queue(&self) -> Option<QueueView<'_>> {
        self.last_replay
            .as_ref()
            .map(|session| session.press_queue(&self.acts))
    }

    /// Up queue left by the most recent replay.
    pub fn up_queue(&self) -> Option<QueueView<'_>> {
        self.last_replay
            .as_ref()
            .map(|session| session.up_queue(&self.acts))
    }
}

impl fmt::Display for Kact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.kact)
    }
}

impl FromStr for Kact {
    type Err = KactError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
