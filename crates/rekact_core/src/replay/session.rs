//! Replay session: transient correlation state for one replay.
//!
//! KeyDowns enter two queues. A KeyPress consumes the KeyDown it continues
//! from the press queue, a KeyUp consumes it from the up queue, and both
//! inherit its character. The scan order below is the pairing contract:
//! outer and inner loops run from index 0 and the first match wins.

use super::clock::Sleeper;
use super::notify::{ActNotice, QueueView, ReplayDispatcher, WaitNotice};
use crate::act::KeyAct;
use crate::config::ReplayConfig;
use crate::key::{ActKind, KeyCode};
use crate::stats::Leftovers;

/// State owned by a single replay.
///
/// Queues hold positions into the replayed act slice.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplaySession {
    press_queue: Vec<usize>,
    up_queue: Vec<usize>,
    unknown: Vec<usize>,
    synthesized_chars: usize,
    required_chars: usize,
}

impl ReplaySession {
    /// Fresh session expecting `required_chars` character-producing acts.
    pub fn new(required_chars: usize) -> Self {
        Self {
            required_chars,
            ..Self::default()
        }
    }

    /// Replay `acts` in order, blocking between them on `sleeper`.
    ///
    /// Character payloads are reset to what the act string carried before
    /// the first act is dispatched, so repeated replays see the same input.
    pub fn run(
        acts: &mut [KeyAct],
        required_chars: usize,
        dispatcher: &mut ReplayDispatcher,
        config: &ReplayConfig,
        sleeper: &mut dyn Sleeper,
    ) -> Self {
        let mut session = Self::new(required_chars);
        for act in acts.iter_mut() {
            act.reset_char();
        }

        tracing::debug!(
            "Replay started: {} acts, skip_wait={}",
            acts.len(),
            config.skip_wait
        );

        for index in 0..acts.len() {
            if !config.skip_wait {
                let wait = wait_before(acts, index);
                if wait > 0 {
                    let wait_ms = u64::try_from(wait).unwrap_or(u64::MAX);
                    let notice = WaitNotice {
                        index,
                        wait_ms,
                        delay: config.scaled_delay(wait_ms),
                    };
                    dispatcher.emit_wait(&notice);
                    sleeper.sleep(notice.delay);
                }
            }

            session.dispatch(acts, index);

            let acts: &[KeyAct] = acts;
            dispatcher.emit_act(&ActNotice {
                index,
                act: &acts[index],
                press_queue: QueueView::new(acts, &session.press_queue),
                up_queue: QueueView::new(acts, &session.up_queue),
            });
        }

        tracing::debug!(
            "Replay finished: {} chars synthesized of {} required",
            session.synthesized_chars,
            session.required_chars
        );
        session
    }

    /// Correlate the act at `index` against the queues.
    ///
    /// Returns the position of the KeyDown the act was paired with, if any.
    pub fn dispatch(&mut self, acts: &mut [KeyAct], index: usize) -> Option<usize> {
        if acts[index].is_unknown() {
            self.unknown.push(index);
        }

        let matched = match acts[index].kind() {
            ActKind::KeyDown => {
                self.key_down(acts, index);
                None
            }
            ActKind::KeyPress => self.key_press(acts, index),
            ActKind::KeyUp => self.key_up(acts, index),
        };

        tracing::trace!(
            "{} {} at {} paired with {:?}",
            acts[index].kind(),
            acts[index].key_code(),
            index,
            matched
        );
        matched
    }

    fn key_down(&mut self, acts: &mut [KeyAct], index: usize) {
        let act = &mut acts[index];
        if act.key_code().is_char_sentinel() {
            if self.synthesized_chars < self.required_chars {
                let ch = act.resolve_char(true);
                act.set_char(ch);
                self.synthesized_chars += 1;
            } else {
                let ch = act.resolve_char(false);
                act.set_char(ch);
            }
        }

        if act.is_char_event() {
            self.press_queue.push(index);
        }
        self.up_queue.push(index);
    }

    fn key_press(&mut self, acts: &mut [KeyAct], index: usize) -> Option<usize> {
        if self.press_queue.is_empty() {
            return None;
        }

        let code = acts[index].key_code();
        let matched = self.take_not_yet_up(acts, code);
        inherit_char(acts, index, matched);
        matched
    }

    fn key_up(&mut self, acts: &mut [KeyAct], index: usize) -> Option<usize> {
        if self.up_queue.is_empty() {
            return None;
        }

        let code = acts[index].key_code();
        let matched = if code.is_negative() {
            self.take_already_pressed(acts, code)
        } else {
            Some(self.up_queue.remove(0))
        };
        inherit_char(acts, index, matched);
        matched
    }

    /// First press-queue KeyDown with `code` whose hash is shared by a
    /// character-producing entry of the up queue.
    fn take_not_yet_up(&mut self, acts: &[KeyAct], code: KeyCode) -> Option<usize> {
        let up_queue = &self.up_queue;
        let position = self.press_queue.iter().position(|&pressed| {
            acts[pressed].key_code() == code
                && up_queue.iter().any(|&held| {
                    acts[held].hash() == acts[pressed].hash() && acts[held].is_char_event()
                })
        })?;
        Some(self.press_queue.remove(position))
    }

    /// Up-queue KeyDown released by a KeyUp with the negative `code`.
    ///
    /// With nothing awaiting a KeyPress the first entry with `code` wins.
    /// Otherwise the first entry with `code` whose hash differs from some
    /// press-queue entry wins.
    fn take_already_pressed(&mut self, acts: &[KeyAct], code: KeyCode) -> Option<usize> {
        if self.press_queue.is_empty() {
            if let Some(position) = self
                .up_queue
                .iter()
                .position(|&held| acts[held].key_code() == code)
            {
                return Some(self.up_queue.remove(position));
            }
        }

        let press_queue = &self.press_queue;
        let position = self.up_queue.iter().position(|&held| {
            acts[held].key_code() == code
                && press_queue
                    .iter()
                    .any(|&pressed| acts[pressed].hash() != acts[held].hash())
        })?;
        Some(self.up_queue.remove(position))
    }

    /// Read view of the press queue over the replayed acts.
    pub fn press_queue<'a>(&'a self, acts: &'a [KeyAct]) -> QueueView<'a> {
        QueueView::new(acts, &self.press_queue)
    }

    /// Read view of the up queue over the replayed acts.
    pub fn up_queue<'a>(&'a self, acts: &'a [KeyAct]) -> QueueView<'a> {
        QueueView::new(acts, &self.up_queue)
    }

    /// Positions of acts with unresolvable key codes, in dispatch order.
    pub fn unknown(&self) -> &[usize] {
        &self.unknown
    }

    pub fn synthesized_chars(&self) -> usize {
        self.synthesized_chars
    }

    pub fn required_chars(&self) -> usize {
        self.required_chars
    }

    /// Open key states after the replay.
    pub fn leftovers(&self, acts: &[KeyAct]) -> Leftovers {
        Leftovers {
            key_press: self
                .press_queue
                .iter()
                .filter(|&&pressed| acts[pressed].key_code().is_char_sentinel())
                .count(),
            key_up: self.up_queue.len(),
        }
    }
}

/// Delay before the act at `index`, in milliseconds.
///
/// The first act waits its own `time`; later acts wait the difference of
/// consecutive `time` values. May be zero or negative, which means no wait.
pub fn wait_before(acts: &[KeyAct], index: usize) -> i128 {
    let current = i128::from(acts[index].time());
    if index == 0 {
        current
    } else {
        current - i128::from(acts[index - 1].time())
    }
}

fn inherit_char(acts: &mut [KeyAct], index: usize, matched: Option<usize>) {
    if let Some(down) = matched {
        if let Some(ch) = acts[down].char() {
            acts[index].set_char(Some(ch));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::clock::VirtualClock;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn acts(raw: &[&str]) -> Vec<KeyAct> {
        raw.iter()
            .enumerate()
            .map(|(i, s)| {
                let tokens: Vec<&str> = s.split(',').collect();
                KeyAct::from_tokens(i, &tokens).unwrap()
            })
            .collect()
    }

    fn run(acts: &mut [KeyAct], config: &ReplayConfig) -> (ReplaySession, VirtualClock) {
        let required = crate::stats::count_required_chars(acts);
        let mut clock = VirtualClock::new();
        let mut dispatcher = ReplayDispatcher::new();
        let session = ReplaySession::run(acts, required, &mut dispatcher, config, &mut clock);
        (session, clock)
    }

    #[test]
    fn test_down_press_up_share_synthesized_char() {
        let mut acts = acts(&["1,1,-2,0,abc,0,0", "1,3,-2,0,abc,0,0", "1,2,-2,0,abc,0,0"]);
        let (session, _) = run(&mut acts, &ReplayConfig::instant());

        let ch = acts[0].char();
        assert!(ch.is_some());
        assert_eq!(acts[1].char(), ch);
        assert_eq!(acts[2].char(), ch);
        assert_eq!(session.synthesized_chars(), 1);
        assert!(session.leftovers(&acts).is_clean());
    }

    #[test]
    fn test_synthesis_stops_at_required_count() {
        // Two masked KeyDowns but only one KeyPress
        let mut acts = acts(&[
            "0,1,-2,0,a,0,0",
            "1,3,-2,0,a,0,0",
            "2,1,-2,0,b,0,0",
            "3,2,-2,0,a,0,0",
            "4,2,-2,0,b,0,0",
        ]);
        let (session, _) = run(&mut acts, &ReplayConfig::instant());

        assert_eq!(session.synthesized_chars(), 1);
        assert!(acts[0].char().is_some());
        assert_eq!(acts[2].char(), None);
    }

    #[test]
    fn test_key_press_needs_char_event_with_shared_hash() {
        let mut acts = acts(&["0,1,-2,0,a,0,0", "1,3,-2,0,a,0,0"]);
        let mut session = ReplaySession::new(1);
        session.dispatch(&mut acts, 0);
        assert_eq!(session.press_queue.len(), 1);
        assert_eq!(session.up_queue.len(), 1);

        assert_eq!(session.dispatch(&mut acts, 1), Some(0));
        assert!(session.press_queue.is_empty());
        assert_eq!(session.up_queue, vec![0]);
    }

    #[test]
    fn test_key_press_without_matching_code_keeps_own_char() {
        let mut acts = acts(&["0,1,-2,0,a,0,0", "1,3,65,0,a,0,0,120"]);
        let mut session = ReplaySession::new(1);
        session.dispatch(&mut acts, 0);

        assert_eq!(session.dispatch(&mut acts, 1), None);
        assert_eq!(acts[1].char(), Some('x'));
        assert_eq!(session.press_queue, vec![0]);
    }

    #[test]
    fn test_key_press_picks_first_matching_press_entry() {
        let mut acts = acts(&[
            "0,1,-2,0,a,0,0",
            "1,1,-2,0,b,0,0",
            "2,3,-2,0,x,0,0",
            "3,3,-2,0,y,0,0",
        ]);
        let mut session = ReplaySession::new(2);
        session.dispatch(&mut acts, 0);
        session.dispatch(&mut acts, 1);

        assert_eq!(session.dispatch(&mut acts, 2), Some(0));
        assert_eq!(acts[2].char(), acts[0].char());
        assert_eq!(session.dispatch(&mut acts, 3), Some(1));
        assert_eq!(acts[3].char(), acts[1].char());
        assert!(session.press_queue.is_empty());
    }

    #[test]
    fn test_key_press_skips_press_entry_whose_hash_left_up_queue() {
        let mut acts = acts(&["0,1,-2,0,a,0,0", "1,1,-2,0,b,0,0", "2,3,-2,0,z,0,0"]);
        let mut session = ReplaySession::new(1);
        session.dispatch(&mut acts, 0);
        session.dispatch(&mut acts, 1);
        // Drop `a` from the up queue by hand
        session.up_queue.retain(|&i| i != 0);

        assert_eq!(session.dispatch(&mut acts, 2), Some(1));
        assert_eq!(session.press_queue, vec![0]);
    }

    #[test]
    fn test_key_up_non_negative_is_fifo() {
        let mut acts = acts(&["0,1,16,0,s,1,1", "1,1,65,0,k,1,0", "2,2,65,0,k,1,0"]);
        let mut session = ReplaySession::new(0);
        session.dispatch(&mut acts, 0);
        session.dispatch(&mut acts, 1);

        // Releasing `A` pairs with the oldest held key, which is Shift
        assert_eq!(session.dispatch(&mut acts, 2), Some(0));
        assert_eq!(session.up_queue, vec![1]);
    }

    #[test]
    fn test_key_up_negative_with_empty_press_queue_matches_code() {
        let mut acts = acts(&["0,1,16,0,s,1,1", "1,1,-2,0,a,0,0", "2,3,-2,0,a,0,0", "3,2,-2,0,a,0,0"]);
        let mut session = ReplaySession::new(1);
        for index in 0..3 {
            session.dispatch(&mut acts, index);
        }
        assert!(session.press_queue.is_empty());

        assert_eq!(session.dispatch(&mut acts, 3), Some(1));
        assert_eq!(acts[3].char(), acts[1].char());
        assert_eq!(session.up_queue, vec![0]);
    }

    #[test]
    fn test_key_up_negative_with_pending_press_needs_different_hash() {
        // `a` and `b` held; `b` still awaits its KeyPress
        let mut acts = acts(&[
            "0,1,-2,0,a,0,0",
            "1,3,-2,0,a,0,0",
            "2,1,-2,0,b,0,0",
            "3,2,-2,0,q,0,0",
        ]);
        let mut session = ReplaySession::new(2);
        for index in 0..3 {
            session.dispatch(&mut acts, index);
        }
        assert_eq!(session.press_queue, vec![2]);
        assert_eq!(session.up_queue, vec![0, 2]);

        // `a` differs from the pending `b`, so `a` is released
        assert_eq!(session.dispatch(&mut acts, 3), Some(0));
        assert_eq!(session.up_queue, vec![2]);
    }

    #[test]
    fn test_key_up_negative_same_hash_as_pending_press_is_skipped() {
        let mut acts = acts(&["0,1,-2,0,b,0,0", "1,2,-2,0,q,0,0"]);
        let mut session = ReplaySession::new(1);
        session.dispatch(&mut acts, 0);

        // Only entry shares its hash with the pending press entry
        assert_eq!(session.dispatch(&mut acts, 1), None);
        assert_eq!(session.up_queue, vec![0]);
        assert_eq!(acts[1].char(), None);
    }

    #[test]
    fn test_key_up_negative_no_code_match_with_empty_press_queue() {
        let mut acts = acts(&["0,1,16,0,s,1,1", "1,2,-5,0,z,0,0"]);
        let mut session = ReplaySession::new(0);
        session.dispatch(&mut acts, 0);

        assert_eq!(session.dispatch(&mut acts, 1), None);
        assert_eq!(session.up_queue, vec![0]);
        assert_eq!(session.unknown(), &[1]);
    }

    #[test]
    fn test_key_events_on_empty_queues() {
        let mut acts = acts(&["0,3,-2,0,a,0,0,104", "1,2,13,0,b,0,0"]);
        let mut session = ReplaySession::new(1);
        assert_eq!(session.dispatch(&mut acts, 0), None);
        assert_eq!(session.dispatch(&mut acts, 1), None);
        assert_eq!(acts[0].char(), Some('h'));
    }

    #[test]
    fn test_unknown_acts_are_recorded_and_replay_continues() {
        let mut acts = acts(&["0,1,-7,0,a,0,0", "1,1,999,0,b,0,0", "2,2,999,0,b,0,0"]);
        let (session, _) = run(&mut acts, &ReplayConfig::instant());
        assert_eq!(session.unknown(), &[0, 1, 2]);
        assert_eq!(session.leftovers(&acts).key_up, 1);
    }

    #[test]
    fn test_wait_arithmetic() {
        let acts = acts(&["0,1,-2,30,a,0,0", "1,3,-2,50,a,0,0", "2,2,-2,20,a,0,0"]);
        assert_eq!(wait_before(&acts, 0), 30);
        assert_eq!(wait_before(&acts, 1), 20);
        assert_eq!(wait_before(&acts, 2), -30);
    }

    #[test]
    fn test_run_waits_only_positive_delays() {
        let mut acts = acts(&["0,1,-2,30,a,0,0", "1,3,-2,50,a,0,0", "2,2,-2,20,a,0,0"]);
        let (_, clock) = run(&mut acts, &ReplayConfig::default());
        assert_eq!(
            clock.waits(),
            &[Duration::from_millis(30), Duration::from_millis(20)]
        );
    }

    #[test]
    fn test_run_skip_wait_never_sleeps() {
        let mut acts = acts(&["0,1,-2,30,a,0,0", "1,3,-2,50,a,0,0"]);
        let (_, clock) = run(&mut acts, &ReplayConfig::instant());
        assert!(clock.waits().is_empty());
    }

    #[test]
    fn test_run_resets_chars_between_replays() {
        let mut acts = acts(&["0,1,-2,0,a,0,0", "1,3,-2,0,a,0,0", "2,2,-2,0,a,0,0"]);
        let (first, _) = run(&mut acts, &ReplayConfig::instant());
        let chars: Vec<_> = acts.iter().map(KeyAct::char).collect();
        let (second, _) = run(&mut acts, &ReplayConfig::instant());

        assert_eq!(first, second);
        assert_eq!(acts.iter().map(KeyAct::char).collect::<Vec<_>>(), chars);
    }

    #[test]
    fn test_leftovers_count_masked_presses() {
        let mut acts = acts(&["0,1,-2,0,a,0,0", "1,1,65,0,b,0,0"]);
        let (session, _) = run(&mut acts, &ReplayConfig::instant());
        let leftovers = session.leftovers(&acts);
        assert_eq!(leftovers.key_press, 1);
        assert_eq!(leftovers.key_up, 2);
        assert!(!leftovers.is_clean());
    }
}
