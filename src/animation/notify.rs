use std::fmt;

/// What kind of mutation a notification reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CurveChange {
    /// Keyframes were added, updated, removed or moved.
    PointsChanged,
    /// The pre or post outside-curve behavior changed.
    MappingChanged,
    /// Only editor selection flags changed.
    SelectionChanged,
    /// Several mutations applied inside one batch.
    Batch,
}

/// Notification delivered to curve observers after a mutation has been fully applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurveEvent {
    /// Kind of mutation.
    pub change: CurveChange,
    /// Curve revision after the mutation.
    pub revision: u64,
}

/// Handle returned by `Curve::subscribe`, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn Fn(&CurveEvent) + Send + Sync>;

/// Observer list plus batch bookkeeping. Observers are tied to one curve instance and are
/// neither cloned nor serialized.
#[derive(Default)]
pub(crate) struct ChangeNotifier {
    observers: Vec<(SubscriptionId, Observer)>,
    next_id: u64,
    batch_depth: u32,
    pending: bool,
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("observers", &self.observers.len())
            .field("batch_depth", &self.batch_depth)
            .field("pending", &self.pending)
            .finish()
    }
}

impl ChangeNotifier {
    pub(crate) fn subscribe(&mut self, observer: Observer) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    pub(crate) fn emit(&mut self, change: CurveChange, revision: u64, enabled: bool) {
        if self.batch_depth > 0 {
            self.pending = true;
            return;
        }
        if enabled {
            self.dispatch(&CurveEvent { change, revision });
        }
    }

    pub(crate) fn begin_batch(&mut self) {
        self.batch_depth += 1;
    }

    pub(crate) fn end_batch(&mut self, revision: u64, enabled: bool) {
        self.batch_depth = self.batch_depth.saturating_sub(1);
        if self.batch_depth > 0 || !self.pending {
            return;
        }
        self.pending = false;
        if enabled {
            self.dispatch(&CurveEvent {
                change: CurveChange::Batch,
                revision,
            });
        }
    }

    fn dispatch(&self, event: &CurveEvent) {
        for (_, observer) in &self.observers {
            observer(event);
        }
    }
}
