//! Consumers of [`OutputEvent`]s.

use std::sync::Arc;

use gowasm_types::OutputEvent;
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Receives the ordered events of a run.
pub trait EventSink: Send + Sync {
    fn send(&self, event: OutputEvent);
}

impl<T: EventSink + ?Sized> EventSink for &T {
    fn send(&self, event: OutputEvent) {
        (**self).send(event)
    }
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn send(&self, event: OutputEvent) {
        (**self).send(event)
    }
}

/// Callback sink.
pub struct FnSink<F>(pub F);

impl<F> EventSink for FnSink<F>
where
    F: Fn(OutputEvent) + Send + Sync,
{
    fn send(&self, event: OutputEvent) {
        (self.0)(event)
    }
}

/// Records every event in memory.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<OutputEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<OutputEvent> {
        self.events.lock().clone()
    }

    /// Concatenated bodies of every stdout event.
    pub fn stdout(&self) -> String {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                OutputEvent::Stdout(body) => Some(body.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Concatenated bodies of every stderr event.
    pub fn stderr(&self) -> String {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                OutputEvent::Stderr(body) => Some(body.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for EventLog {
    fn send(&self, event: OutputEvent) {
        self.events.lock().push(event);
    }
}

/// Forwards events over an unbounded tokio channel so a host can consume
/// them as a stream while the run progresses.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<OutputEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutputEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn send(&self, event: OutputEvent) {
        // A closed receiver means the host abandoned the run.
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_stream_views() {
        let log = EventLog::new();
        log.send(OutputEvent::Start);
        log.send(OutputEvent::Stdout("a".to_string()));
        log.send(OutputEvent::Stderr("b".to_string()));
        log.send(OutputEvent::Stdout("c".to_string()));
        log.send(OutputEvent::End(None));

        assert_eq!(log.stdout(), "ac");
        assert_eq!(log.stderr(), "b");
        assert_eq!(log.events().len(), 5);
    }

    #[tokio::test]
    async fn test_channel_sink_preserves_order() {
        let (sink, mut rx) = ChannelSink::new();
        sink.send(OutputEvent::Start);
        sink.send(OutputEvent::End(Some("status 1.".to_string())));
        drop(sink);

        assert_eq!(rx.recv().await, Some(OutputEvent::Start));
        assert_eq!(
            rx.recv().await,
            Some(OutputEvent::End(Some("status 1.".to_string())))
        );
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn test_closed_channel_is_ignored() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.send(OutputEvent::Start);
    }

    #[test]
    fn test_fn_sink_and_shared_sinks() {
        let log = Arc::new(EventLog::new());
        let forward = {
            let log = log.clone();
            FnSink(move |event| log.send(event))
        };
        forward.send(OutputEvent::Start);
        (&*log).send(OutputEvent::End(None));

        assert_eq!(
            log.events(),
            vec![OutputEvent::Start, OutputEvent::End(None)]
        );
    }
}
