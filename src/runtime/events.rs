//! Subscriber lists for compositor notifications.

/// Terminal dimensions after a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeEvent {
    pub columns: u16,
    pub rows: u16,
}

/// Returned by `on_*` subscriptions; pass to `unsubscribe` to remove the listener.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SubscriptionId(u64);

type Listener<E> = Box<dyn FnMut(&E)>;

pub(crate) struct Listeners<E> {
    entries: Vec<(SubscriptionId, Listener<E>)>,
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<E> Listeners<E> {
    pub(crate) fn add(&mut self, id: SubscriptionId, listener: Listener<E>) {
        self.entries.push((id, listener));
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        before != self.entries.len()
    }

    pub(crate) fn emit(&mut self, event: &E) {
        for (_, listener) in self.entries.iter_mut() {
            listener(event);
        }
    }
}

/// Hands out subscription ids unique across all listener kinds.
#[derive(Debug, Default)]
pub(crate) struct SubscriptionIds {
    next: u64,
}

impl SubscriptionIds {
    pub(crate) fn next(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}
