//! Generic optimistic-mutation primitive
//!
//! Every optimistic flow in this crate follows the same protocol: capture
//! the pre-call state, apply the local delta immediately, issue the remote
//! call, then either confirm (drop the capture) or restore the capture.
//! Like toggling and follow toggling both run through these two types
//! instead of carrying their own rollback bookkeeping.

/// An entity that can be snapshotted and restored for one mutation dimension.
pub trait OptimisticTarget {
    type Snapshot;

    fn snapshot(&self) -> Self::Snapshot;
    fn restore(&mut self, snapshot: Self::Snapshot);
}

/// A captured pre-call state for an in-flight optimistic mutation.
///
/// Held inside the entity's `Pending` state while the remote call is in
/// flight, so the rollback data lives exactly as long as the mutation does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimisticMutation<S> {
    prior: S,
}

impl<S> OptimisticMutation<S> {
    /// Capture the target's state before the local delta is applied.
    pub fn begin<T: OptimisticTarget<Snapshot = S>>(target: &T) -> Self {
        Self {
            prior: target.snapshot(),
        }
    }

    /// The remote call succeeded; the applied delta stands.
    pub fn confirm(self) {}

    /// The remote call failed; restore the target to its pre-call state.
    pub fn roll_back<T: OptimisticTarget<Snapshot = S>>(self, target: &mut T) {
        target.restore(self.prior);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Counter {
        value: i64,
        flagged: bool,
    }

    impl OptimisticTarget for Counter {
        type Snapshot = (i64, bool);

        fn snapshot(&self) -> Self::Snapshot {
            (self.value, self.flagged)
        }

        fn restore(&mut self, snapshot: Self::Snapshot) {
            self.value = snapshot.0;
            self.flagged = snapshot.1;
        }
    }

    #[test]
    fn test_confirm_keeps_applied_delta() {
        let mut counter = Counter {
            value: 3,
            flagged: false,
        };
        let mutation = OptimisticMutation::begin(&counter);
        counter.value += 1;
        counter.flagged = true;

        mutation.confirm();
        assert_eq!(counter.value, 4);
        assert!(counter.flagged);
    }

    #[test]
    fn test_roll_back_restores_every_captured_field() {
        let mut counter = Counter {
            value: 3,
            flagged: false,
        };
        let mutation = OptimisticMutation::begin(&counter);
        counter.value += 1;
        counter.flagged = true;

        mutation.roll_back(&mut counter);
        assert_eq!(
            counter,
            Counter {
                value: 3,
                flagged: false
            }
        );
    }
}
