//! Polling of the players online on a realm, reporting the ones that just
//! joined.

use std::collections::HashSet;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use log::{debug, info, warn};

use crate::error::Result;

/// Where the current presence set comes from.
pub trait PresenceSource {
    fn active_profiles(&mut self) -> Result<HashSet<String>>;
}

impl<F> PresenceSource for F
where
    F: FnMut() -> Result<HashSet<String>>,
{
    fn active_profiles(&mut self) -> Result<HashSet<String>> {
        self()
    }
}

/// Receives one call per newly present profile.
pub trait Notifier {
    fn notify(&mut self, profile_name: &str) -> Result<()>;
}

/// Cancellation flag shared between the poll loop and whoever stops it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (lock, cvar) = &*self.inner;
        if let Ok(mut cancelled) = lock.lock() {
            *cancelled = true;
        }
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        let (lock, _) = &*self.inner;
        lock.lock().map(|cancelled| *cancelled).unwrap_or(true)
    }

    /// Block for at most `timeout`, returning early with `true` if cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let guard = match lock.lock() {
            Ok(guard) => guard,
            Err(_) => return true,
        };
        match cvar.wait_timeout_while(guard, timeout, |cancelled| !*cancelled) {
            Ok((cancelled, _)) => *cancelled,
            Err(_) => true,
        }
    }
}

/// Profiles in `current` that were not in `previous`.
pub fn newly_present(previous: &HashSet<String>, current: &HashSet<String>) -> HashSet<String> {
    current.difference(previous).cloned().collect()
}

pub struct Poller<S, N> {
    source: S,
    notifier: N,
    interval: Duration,
    previous: Option<HashSet<String>>,
}

impl<S: PresenceSource, N: Notifier> Poller<S, N> {
    pub fn new(source: S, notifier: N, interval: Duration) -> Self {
        Self {
            source,
            notifier,
            interval,
            previous: None,
        }
    }

    /// The presence set of the last successful cycle, if any.
    pub fn previous(&self) -> Option<&HashSet<String>> {
        self.previous.as_ref()
    }

    /// Record the current presence set as baseline without notifying.
    pub fn seed(&mut self) -> Result<()> {
        let current = self.source.active_profiles()?;
        info!("Baseline of {} player(s) online", current.len());
        self.previous = Some(current);
        Ok(())
    }

    /// Run a single cycle and return the newly present profiles. Nothing is
    /// reported on the first cycle of an unseeded poller, and a failed query
    /// leaves the previous set untouched.
    pub fn poll_once(&mut self) -> Result<HashSet<String>> {
        let current = self.source.active_profiles()?;
        let newly = match &self.previous {
            Some(previous) => newly_present(previous, &current),
            None => {
                info!("Baseline of {} player(s) online", current.len());
                HashSet::new()
            }
        };
        debug!("Online: {:?}, newly online: {:?}", current, newly);
        self.previous = Some(current);

        for profile_name in &newly {
            info!("{} is now online", profile_name);
            if let Err(err) = self.notifier.notify(profile_name) {
                warn!("Notification for {} not sent: {}", profile_name, err);
            }
        }
        Ok(newly)
    }

    /// Poll until `cancel` is triggered. Cancellation is observed between
    /// cycles and during the wait, never in the middle of a cycle.
    pub fn run(&mut self, cancel: &CancelToken) {
        while !cancel.is_cancelled() {
            if let Err(err) = self.poll_once() {
                warn!("Poll cycle failed: {}", err);
            }
            if cancel.wait_timeout(self.interval) {
                break;
            }
        }
        info!("Stopped polling");
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::thread;
    use std::time::Instant;

    use super::*;
    use crate::error::{Error, RequestError};

    fn set(names: &[&str]) -> HashSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn query_failed() -> Error {
        Error::PresenceQueryFailed(RequestError::UnknownStatus(500))
    }

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl Notifier for Recorder {
        fn notify(&mut self, profile_name: &str) -> Result<()> {
            self.0.borrow_mut().push(profile_name.to_string());
            Ok(())
        }
    }

    fn scripted(
        cycles: Vec<Result<HashSet<String>>>,
    ) -> impl FnMut() -> Result<HashSet<String>> {
        let mut cycles = VecDeque::from(cycles);
        move || cycles.pop_front().unwrap_or_else(|| Ok(HashSet::new()))
    }

    #[test]
    fn diff() {
        assert!(newly_present(&set(&["A", "B"]), &set(&["A", "B"])).is_empty());
        assert_eq!(newly_present(&set(&["A"]), &set(&["A", "B", "C"])), set(&["B", "C"]));
        assert!(newly_present(&set(&["A", "B"]), &set(&["A"])).is_empty());
    }

    #[test]
    fn first_cycle_is_baseline() {
        let recorder = Recorder::default();
        let source = scripted(vec![Ok(set(&["A", "B"])), Ok(set(&["A", "B", "C"]))]);
        let mut poller = Poller::new(source, recorder.clone(), Duration::ZERO);

        assert!(poller.poll_once().unwrap().is_empty());
        assert!(recorder.0.borrow().is_empty());
        assert_eq!(poller.previous(), Some(&set(&["A", "B"])));

        assert_eq!(poller.poll_once().unwrap(), set(&["C"]));
        assert_eq!(*recorder.0.borrow(), ["C"]);
    }

    #[test]
    fn seeded_poller_notifies_once_per_arrival() {
        let recorder = Recorder::default();
        let source = scripted(vec![
            Ok(set(&["A"])),
            Ok(set(&["A", "B", "C"])),
            Ok(set(&["A", "B", "C"])),
        ]);
        let mut poller = Poller::new(source, recorder.clone(), Duration::ZERO);
        poller.seed().unwrap();

        assert_eq!(poller.poll_once().unwrap(), set(&["B", "C"]));
        assert!(poller.poll_once().unwrap().is_empty());

        let mut notified = recorder.0.borrow().clone();
        notified.sort();
        assert_eq!(notified, ["B", "C"]);
        assert_eq!(poller.previous(), Some(&set(&["A", "B", "C"])));
    }

    #[test]
    fn failed_cycle_keeps_baseline() {
        let recorder = Recorder::default();
        let source = scripted(vec![
            Ok(set(&["A", "B"])),
            Err(query_failed()),
            Ok(set(&["A", "B"])),
        ]);
        let mut poller = Poller::new(source, recorder.clone(), Duration::ZERO);
        poller.seed().unwrap();

        assert!(matches!(poller.poll_once(), Err(Error::PresenceQueryFailed(_))));
        assert_eq!(poller.previous(), Some(&set(&["A", "B"])));
        assert!(poller.poll_once().unwrap().is_empty());
        assert!(recorder.0.borrow().is_empty());
    }

    #[test]
    fn failing_notifier_does_not_stop_cycle() {
        struct Broken(Rc<Cell<u32>>);
        impl Notifier for Broken {
            fn notify(&mut self, _: &str) -> Result<()> {
                self.0.set(self.0.get() + 1);
                Err(Error::NotificationFailed(RequestError::UnknownStatus(404)))
            }
        }

        let attempts = Rc::new(Cell::new(0));
        let source = scripted(vec![Ok(set(&[])), Ok(set(&["A", "B"]))]);
        let mut poller = Poller::new(source, Broken(attempts.clone()), Duration::ZERO);
        poller.seed().unwrap();

        assert_eq!(poller.poll_once().unwrap(), set(&["A", "B"]));
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn run_stops_at_cycle_boundary() {
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let source = move || -> Result<HashSet<String>> {
            counter.set(counter.get() + 1);
            if counter.get() == 1 {
                return Ok(set(&["A"]));
            }
            trigger.cancel();
            Ok(set(&["A", "B"]))
        };
        let recorder = Recorder::default();
        let mut poller = Poller::new(source, recorder.clone(), Duration::from_millis(10));

        poller.run(&cancel);

        assert_eq!(calls.get(), 2);
        // The cycle that saw the cancellation still completes its dispatch.
        assert_eq!(*recorder.0.borrow(), ["B"]);
    }

    #[test]
    fn cancelled_before_run() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let source = move || -> Result<HashSet<String>> {
            counter.set(counter.get() + 1);
            Ok(HashSet::new())
        };
        let mut poller = Poller::new(source, Recorder::default(), Duration::from_secs(60));

        poller.run(&cancel);

        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn cancel_wakes_waiter() {
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let start = Instant::now();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            trigger.cancel();
        });

        assert!(cancel.wait_timeout(Duration::from_secs(60)));
        assert!(start.elapsed() < Duration::from_secs(30));
        handle.join().unwrap();
    }

    #[test]
    fn wait_times_out_without_cancel() {
        let cancel = CancelToken::new();
        assert!(!cancel.wait_timeout(Duration::from_millis(5)));
        assert!(!cancel.is_cancelled());
    }
}
