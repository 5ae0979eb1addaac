// PlastiWatch V2 - Gesture Listeners
//
// Observers are notified synchronously, in registration order. A listener
// that returns an error or panics is logged and skipped; the rest still run.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::events::GestureEvent;

/// Receives recognised gestures.
///
/// Every hook defaults to a no-op, so implementors only override the gestures
/// they care about. Hooks run on the thread that delivered the sample.
pub trait GestureListener: Send + Sync {
    /// Wrist rolled outwards (scroll down).
    fn on_wrist_out(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Wrist rolled inwards (scroll up).
    fn on_wrist_in(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Arm lowered (tap).
    fn on_arm_down(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Arm raised (back).
    fn on_arm_up(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Dispatch `event` to the matching hook.
    fn on_gesture(&self, event: GestureEvent) -> anyhow::Result<()> {
        match event {
            GestureEvent::WristOut => self.on_wrist_out(),
            GestureEvent::WristIn => self.on_wrist_in(),
            GestureEvent::ArmDown => self.on_arm_down(),
            GestureEvent::ArmUp => self.on_arm_up(),
        }
    }
}

impl<F> GestureListener for F
where
    F: Fn(GestureEvent) + Send + Sync,
{
    fn on_gesture(&self, event: GestureEvent) -> anyhow::Result<()> {
        self(event);
        Ok(())
    }
}

pub type SharedListener = Arc<dyn GestureListener>;

#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<Vec<SharedListener>>,
    failures: AtomicU64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SharedListener>> {
        // The list is only ever pushed/removed, a poisoned guard is still valid.
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a listener. Duplicates are kept, so this always returns `true`.
    pub fn add(&self, listener: SharedListener) -> bool {
        self.lock().push(listener);
        true
    }

    /// Remove the first registration of `listener` (compared by identity).
    pub fn remove(&self, listener: &SharedListener) -> bool {
        let mut listeners = self.lock();
        match listeners.iter().position(|l| same_listener(l, listener)) {
            Some(index) => {
                listeners.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of listener invocations that failed or panicked so far.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Notify every listener of `event`.
    ///
    /// Runs over a snapshot of the list, so listeners may (un)register from
    /// inside their callback. Returns how many listeners handled the event
    /// successfully.
    pub fn notify_all(&self, event: GestureEvent) -> usize {
        let snapshot: Vec<SharedListener> = self.lock().clone();
        let mut delivered = 0;

        for (index, listener) in snapshot.iter().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| listener.on_gesture(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    self.failures.fetch_add(1, Ordering::Relaxed);
                    log::error!("Listener #{} failed on {}: {:#}", index, event, e);
                }
                Err(_) => {
                    self.failures.fetch_add(1, Ordering::Relaxed);
                    log::error!("Listener #{} panicked on {}", index, event);
                }
            }
        }

        delivered
    }
}

fn same_listener(a: &SharedListener, b: &SharedListener) -> bool {
    // Compare data pointers only; vtable pointers may differ between codegen units.
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<GestureEvent>>,
    }

    impl Recorder {
        fn seen(&self) -> Vec<GestureEvent> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl GestureListener for Recorder {
        fn on_wrist_in(&self) -> anyhow::Result<()> {
            self.seen.lock().unwrap().push(GestureEvent::WristIn);
            Ok(())
        }

        fn on_arm_up(&self) -> anyhow::Result<()> {
            self.seen.lock().unwrap().push(GestureEvent::ArmUp);
            Ok(())
        }
    }

    struct Failing;

    impl GestureListener for Failing {
        fn on_gesture(&self, _event: GestureEvent) -> anyhow::Result<()> {
            anyhow::bail!("display unavailable")
        }
    }

    struct Panicking;

    impl GestureListener for Panicking {
        fn on_gesture(&self, _event: GestureEvent) -> anyhow::Result<()> {
            panic!("listener bug");
        }
    }

    #[test]
    fn test_hooks_dispatch_by_event() {
        let registry = ListenerRegistry::new();
        let recorder = Arc::new(Recorder::default());
        registry.add(recorder.clone());

        registry.notify_all(GestureEvent::WristIn);
        registry.notify_all(GestureEvent::WristOut); // default no-op hook
        registry.notify_all(GestureEvent::ArmUp);

        assert_eq!(recorder.seen(), vec![GestureEvent::WristIn, GestureEvent::ArmUp]);
    }

    #[test]
    fn test_notified_in_registration_order() {
        let registry = ListenerRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for id in 0..3 {
            let order = Arc::clone(&order);
            registry.add(Arc::new(move |_: GestureEvent| order.lock().unwrap().push(id)));
        }

        assert_eq!(registry.notify_all(GestureEvent::ArmDown), 3);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_duplicates_allowed_and_remove_drops_first() {
        let registry = ListenerRegistry::new();
        let recorder = Arc::new(Recorder::default());
        let listener: SharedListener = recorder.clone();

        assert!(registry.add(listener.clone()));
        assert!(registry.add(listener.clone()));
        assert_eq!(registry.len(), 2);

        assert!(registry.remove(&listener));
        assert_eq!(registry.len(), 1);
        registry.notify_all(GestureEvent::WristIn);
        assert_eq!(recorder.seen().len(), 1);

        assert!(registry.remove(&listener));
        assert!(!registry.remove(&listener));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_clear_then_notify_is_silent() {
        let registry = ListenerRegistry::new();
        let recorder = Arc::new(Recorder::default());
        registry.add(recorder.clone());
        registry.clear();

        assert_eq!(registry.notify_all(GestureEvent::WristIn), 0);
        assert!(recorder.seen().is_empty());
    }

    #[test]
    fn test_failing_listeners_do_not_stop_fan_out() {
        let registry = ListenerRegistry::new();
        let recorder = Arc::new(Recorder::default());
        registry.add(Arc::new(Failing));
        registry.add(Arc::new(Panicking));
        registry.add(recorder.clone());

        assert_eq!(registry.notify_all(GestureEvent::ArmUp), 1);
        assert_eq!(recorder.seen(), vec![GestureEvent::ArmUp]);
        assert_eq!(registry.failures(), 2);
    }
}
