//! Replay notifications.
//!
//! Listeners register per notification kind on a [`ReplayDispatcher`] and are
//! called synchronously, in registration order, while the replay runs.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::act::KeyAct;
use crate::error::Result;
use crate::key::ActKind;

/// Read-only view of a correlation queue at emission time.
#[derive(Clone, Copy)]
pub struct QueueView<'a> {
    acts: &'a [KeyAct],
    indices: &'a [usize],
}

impl<'a> QueueView<'a> {
    pub(crate) fn new(acts: &'a [KeyAct], indices: &'a [usize]) -> Self {
        Self { acts, indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Queue entry at `position` (0 = oldest).
    pub fn get(&self, position: usize) -> Option<&'a KeyAct> {
        self.indices.get(position).map(|&i| &self.acts[i])
    }

    /// Iterate entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &'a KeyAct> + 'a {
        let acts = self.acts;
        self.indices.iter().map(move |&i| &acts[i])
    }

    /// Positions of the queued acts in the parsed sequence.
    pub fn act_indices(&self) -> &'a [usize] {
        self.indices
    }

    pub fn to_vec(&self) -> Vec<KeyAct> {
        self.iter().cloned().collect()
    }
}

impl fmt::Debug for QueueView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Emitted before blocking for an inter-act delay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitNotice {
    /// Position of the act about to be dispatched.
    pub index: usize,
    /// Computed wait in milliseconds.
    pub wait_ms: u64,
    /// Real time the replay will block for (after speed scaling).
    pub delay: Duration,
}

/// Emitted after an act went through correlation.
#[derive(Clone, Copy, Debug)]
pub struct ActNotice<'a> {
    /// Position of the act in the parsed sequence.
    pub index: usize,
    pub act: &'a KeyAct,
    pub press_queue: QueueView<'a>,
    pub up_queue: QueueView<'a>,
}

impl ActNotice<'_> {
    /// Owned copy of this notice.
    pub fn to_event(&self) -> ReplayEvent {
        let snapshot = ActSnapshot {
            index: self.index,
            act: self.act.clone(),
            press_queue: self.press_queue.to_vec(),
            up_queue: self.up_queue.to_vec(),
        };
        match self.act.kind() {
            ActKind::KeyDown => ReplayEvent::KeyDown(snapshot),
            ActKind::KeyPress => ReplayEvent::KeyPress(snapshot),
            ActKind::KeyUp => ReplayEvent::KeyUp(snapshot),
        }
    }
}

/// Owned act notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActSnapshot {
    pub index: usize,
    pub act: KeyAct,
    pub press_queue: Vec<KeyAct>,
    pub up_queue: Vec<KeyAct>,
}

/// Owned replay notification, for consumers that collect or forward them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayEvent {
    Wait { index: usize, wait_ms: u64 },
    KeyDown(ActSnapshot),
    KeyPress(ActSnapshot),
    KeyUp(ActSnapshot),
}

impl ReplayEvent {
    /// The act snapshot, unless this is a wait.
    pub fn snapshot(&self) -> Option<&ActSnapshot> {
        match self {
            Self::Wait { .. } => None,
            Self::KeyDown(s) | Self::KeyPress(s) | Self::KeyUp(s) => Some(s),
        }
    }

    pub fn is_wait(&self) -> bool {
        matches!(self, Self::Wait { .. })
    }
}

impl From<&WaitNotice> for ReplayEvent {
    fn from(notice: &WaitNotice) -> Self {
        Self::Wait {
            index: notice.index,
            wait_ms: notice.wait_ms,
        }
    }
}

/// A collected sequence of replay notifications.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReplayTrace {
    pub events: Vec<ReplayEvent>,
}

impl ReplayTrace {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Characters surfaced by act notifications, in order, per kind.
    pub fn chars(&self, kind: ActKind) -> Vec<Option<char>> {
        self.events
            .iter()
            .filter_map(ReplayEvent::snapshot)
            .filter(|s| s.act.kind() == kind)
            .map(|s| s.act.char())
            .collect()
    }

    /// Export as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Wait notification handler
pub type WaitHandler = Box<dyn FnMut(&WaitNotice) + Send>;
/// Act notification handler
pub type ActHandler = Box<dyn FnMut(&ActNotice<'_>) + Send>;
/// Owned notification handler
pub type EventHandler = Box<dyn FnMut(ReplayEvent) + Send>;

/// Delivers replay notifications to registered handlers.
#[derive(Default)]
pub struct ReplayDispatcher {
    wait: Vec<WaitHandler>,
    key_down: Vec<ActHandler>,
    key_press: Vec<ActHandler>,
    key_up: Vec<ActHandler>,
    any: Vec<EventHandler>,
}

impl ReplayDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_wait<F>(&mut self, handler: F)
    where
        F: FnMut(&WaitNotice) + Send + 'static,
    {
        self.wait.push(Box::new(handler));
    }

    pub fn on_key_down<F>(&mut self, handler: F)
    where
        F: FnMut(&ActNotice<'_>) + Send + 'static,
    {
        self.key_down.push(Box::new(handler));
    }

    pub fn on_key_press<F>(&mut self, handler: F)
    where
        F: FnMut(&ActNotice<'_>) + Send + 'static,
    {
        self.key_press.push(Box::new(handler));
    }

    pub fn on_key_up<F>(&mut self, handler: F)
    where
        F: FnMut(&ActNotice<'_>) + Send + 'static,
    {
        self.key_up.push(Box::new(handler));
    }

    /// Receive every notification as an owned [`ReplayEvent`].
    pub fn on_event<F>(&mut self, handler: F)
    where
        F: FnMut(ReplayEvent) + Send + 'static,
    {
        self.any.push(Box::new(handler));
    }

    /// Drop every registered handler.
    pub fn clear(&mut self) {
        self.wait.clear();
        self.key_down.clear();
        self.key_press.clear();
        self.key_up.clear();
        self.any.clear();
    }

    pub fn handler_count(&self) -> usize {
        self.wait.len() + self.key_down.len() + self.key_press.len() + self.key_up.len() + self.any.len()
    }

    pub(crate) fn emit_wait(&mut self, notice: &WaitNotice) {
        for handler in &mut self.wait {
            handler(notice);
        }
        for handler in &mut self.any {
            handler(ReplayEvent::from(notice));
        }
    }

    pub(crate) fn emit_act(&mut self, notice: &ActNotice<'_>) {
        let handlers = match notice.act.kind() {
            ActKind::KeyDown => &mut self.key_down,
            ActKind::KeyPress => &mut self.key_press,
            ActKind::KeyUp => &mut self.key_up,
        };
        for handler in handlers.iter_mut() {
            handler(notice);
        }
        for handler in &mut self.any {
            handler(notice.to_event());
        }
    }
}

impl fmt::Debug for ReplayDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplayDispatcher")
            .field("wait", &self.wait.len())
            .field("key_down", &self.key_down.len())
            .field("key_press", &self.key_press.len())
            .field("key_up", &self.key_up.len())
            .field("any", &self.any.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn acts() -> Vec<KeyAct> {
        ["0,1,-2,0,a,0,0", "1,3,-2,0,a,0,0", "2,2,-2,0,a,0,0"]
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let tokens: Vec<&str> = s.split(',').collect();
                KeyAct::from_tokens(i, &tokens).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_queue_view() {
        let acts = acts();
        let indices = [2, 0];
        let view = QueueView::new(&acts, &indices);
        assert_eq!(view.len(), 2);
        assert_eq!(view.get(0).unwrap().kind(), ActKind::KeyUp);
        assert_eq!(view.get(1).unwrap().kind(), ActKind::KeyDown);
        assert!(view.get(2).is_none());
        assert_eq!(view.act_indices(), &[2, 0]);
    }

    #[test]
    fn test_dispatch_routes_by_kind() {
        let acts = acts();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = ReplayDispatcher::new();

        let down = seen.clone();
        dispatcher.on_key_down(move |n| down.lock().push(("down", n.index)));
        let up = seen.clone();
        dispatcher.on_key_up(move |n| up.lock().push(("up", n.index)));
        assert_eq!(dispatcher.handler_count(), 2);

        let empty: [usize; 0] = [];
        for (index, act) in acts.iter().enumerate() {
            dispatcher.emit_act(&ActNotice {
                index,
                act,
                press_queue: QueueView::new(&acts, &empty),
                up_queue: QueueView::new(&acts, &empty),
            });
        }

        assert_eq!(*seen.lock(), vec![("down", 0), ("up", 2)]);
    }

    #[test]
    fn test_owned_events() {
        let acts = acts();
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = ReplayDispatcher::new();
        let sink = events.clone();
        dispatcher.on_event(move |e| sink.lock().push(e));

        dispatcher.emit_wait(&WaitNotice {
            index: 0,
            wait_ms: 12,
            delay: Duration::from_millis(12),
        });
        let queued = [0];
        dispatcher.emit_act(&ActNotice {
            index: 1,
            act: &acts[1],
            press_queue: QueueView::new(&acts, &[]),
            up_queue: QueueView::new(&acts, &queued),
        });

        let events = events.lock();
        assert_eq!(events[0], ReplayEvent::Wait { index: 0, wait_ms: 12 });
        let snapshot = events[1].snapshot().unwrap();
        assert_eq!(snapshot.index, 1);
        assert_eq!(snapshot.up_queue, vec![acts[0].clone()]);
        assert!(matches!(events[1], ReplayEvent::KeyPress(_)));
    }

    #[test]
    fn test_trace_json_is_tagged() {
        let trace = ReplayTrace {
            events: vec![ReplayEvent::Wait { index: 0, wait_ms: 3 }],
        };
        let json = trace.to_json().unwrap();
        assert!(json.contains("\"type\": \"wait\""));
        assert!(json.contains("\"wait_ms\": 3"));
    }
}
