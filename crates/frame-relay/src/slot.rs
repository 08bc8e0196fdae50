use std::sync::{Arc, Mutex};

/// Capacity-one hand-off between exactly one publishing thread and one
/// consuming thread.
///
/// Publishing replaces any unconsumed item: the consumer only ever sees the
/// freshest pending item and anything superseded is dropped on the spot.
/// Under a slow consumer the slot holds at most one item, never a queue.
pub struct LatestSlot<T> {
    inner: Arc<Mutex<Option<T>>>,
}

impl<T> Clone for LatestSlot<T> {
    fn clone(&self) -> Self {
        LatestSlot {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LatestSlot<T> {
    pub fn new() -> Self {
        LatestSlot {
            inner: Arc::new(Mutex::new(None)),
        }
    }

    /// Store `item`, unconditionally replacing any unread one. Returns true
    /// when a pending item was displaced, so callers can count shed work.
    pub fn publish(&self, item: T) -> bool {
        match self.inner.lock() {
            Ok(mut guard) => guard.replace(item).is_some(),
            Err(_) => false,
        }
    }

    /// Remove and return the pending item, if any. Never blocks on the
    /// producer, only on the brief critical section.
    pub fn try_take(&self) -> Option<T> {
        match self.inner.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn take_yields_the_latest_publish_only() {
        let slot = LatestSlot::new();
        assert!(!slot.publish("a"));
        assert!(slot.publish("b"));
        assert!(slot.publish("c"));
        assert_eq!(slot.try_take(), Some("c"));
        assert_eq!(slot.try_take(), None);
    }

    #[test]
    fn fast_publisher_slow_consumer_sheds_to_one_pending_item() {
        let slot = LatestSlot::new();
        let publisher_slot = slot.clone();
        let publisher = thread::spawn(move || {
            for value in 0u64..1000 {
                publisher_slot.publish(value);
            }
        });

        let mut last_seen = None;
        while !publisher.is_finished() {
            if let Some(value) = slot.try_take() {
                if let Some(previous) = last_seen {
                    assert!(value > previous, "took {value} after {previous}");
                }
                last_seen = Some(value);
            }
            thread::sleep(Duration::from_millis(1));
        }
        publisher.join().unwrap();
        // Whatever is left is the final value, not an intermediate one.
        if let Some(value) = slot.try_take() {
            assert_eq!(value, 999);
        }
        assert_eq!(slot.try_take(), None);
    }
}
