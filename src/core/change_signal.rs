/*
 * A payload-free broadcast fired after every file-metadata write. Listeners only
 * learn that something changed and must reload from the store themselves.
 * Subscribers that have gone away are dropped on the next notification.
 */
use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Default)]
pub struct ChangeNotifier {
    subscribers: Vec<Sender<()>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<()> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn notify(&mut self) {
        self.subscribers.retain(|tx| tx.send(()).is_ok());
        log::trace!(
            "ChangeNotifier: Notified {} subscribers.",
            self.subscribers.len()
        );
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_subscriber_is_notified() {
        let mut notifier = ChangeNotifier::new();
        let a = notifier.subscribe();
        let b = notifier.subscribe();

        notifier.notify();

        assert!(a.try_recv().is_ok());
        assert!(b.try_recv().is_ok());
        assert!(a.try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let mut notifier = ChangeNotifier::new();
        let kept = notifier.subscribe();
        drop(notifier.subscribe());

        notifier.notify();

        assert_eq!(notifier.subscriber_count(), 1);
        assert!(kept.try_recv().is_ok());
    }
}
