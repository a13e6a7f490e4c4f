use std::future::Future;
use tokio::task::JoinHandle;

/// Monotonic request numbering. Only the most recently issued number is
/// current; completions carrying an older one are stale.
#[derive(Debug, Default, Clone)]
pub struct Sequencer {
    latest: u64,
}

impl Sequencer {
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn is_latest(&self, seq: u64) -> bool {
        seq != 0 && seq == self.latest
    }

    /// Make every number issued so far stale
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }
}

/// Holds at most one background task; spawning a new one aborts the previous.
#[derive(Debug, Default)]
pub struct TaskSlot {
    handle: Option<JoinHandle<()>>,
}

impl TaskSlot {
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.handle = Some(tokio::spawn(task));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for TaskSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_only_latest_is_current() {
        let mut seq = Sequencer::default();
        assert!(!seq.is_latest(0));
        let a = seq.issue();
        let b = seq.issue();
        assert!(!seq.is_latest(a));
        assert!(seq.is_latest(b));
        seq.invalidate();
        assert!(!seq.is_latest(b));
    }

    #[tokio::test]
    async fn test_spawn_aborts_previous() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut slot = TaskSlot::default();

        let slow = tx.clone();
        slot.spawn(async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            let _ = slow.send("slow");
        });
        slot.spawn(async move {
            let _ = tx.send("fast");
        });

        assert_eq!(rx.recv().await, Some("fast"));
        // The aborted task dropped its sender, so the channel closes.
        assert_eq!(rx.recv().await, None);
    }
}
