use std::{
    result::Result,
    sync::{
        atomic::{AtomicI32, Ordering},
        mpsc::{Receiver, RecvError, SendError, Sender, TryRecvError},
        Arc,
    },
    thread::JoinHandle,
};

/// One worker thread fed through a channel.
/// Results come back in submission order and are picked up by the owner with `try_recv`,
/// so the owner never blocks its own loop while a job runs.
pub struct BackgroundTaskGuard<TaskItem, ResultItem> {
    task_sender: Option<Sender<TaskItem>>,
    result_receiver: Receiver<ResultItem>,
    worker: Option<JoinHandle<()>>,
    nb: Arc<AtomicI32>,
}

impl<TaskItem, ResultItem> BackgroundTaskGuard<TaskItem, ResultItem>
where
    TaskItem: Send + 'static,
    ResultItem: Send + 'static,
{
    pub fn new<F>(name: &str, f: F) -> Self
    where
        F: Fn(TaskItem) -> ResultItem + Send + 'static,
    {
        //https://doc.rust-lang.org/rust-by-example/std_misc/channels.html
        let (task_sender, th_task_receiver) = std::sync::mpsc::channel::<TaskItem>();
        let (th_result_sender, result_receiver) = std::sync::mpsc::channel();
        let nb = Arc::new(AtomicI32::new(0));
        let th_nb = Arc::clone(&nb);
        let worker = std::thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                while let Ok(elt) = th_task_receiver.recv() {
                    // released after the result is queued: a zero count read with Acquire
                    // guarantees every result is already waiting in the channel
                    let _guard = scopeguard::guard((), |_| {
                        th_nb.fetch_sub(1, Ordering::Release);
                    });
                    if th_result_sender.send(f(elt)).is_err() {
                        tracing::debug!("result receiver is gone, discarding late result");
                    }
                }
                tracing::trace!("background task channel closed");
            });
        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::error!(?e, "failed to spawn background task thread");
                None
            }
        };
        Self {
            task_sender: Some(task_sender),
            result_receiver,
            worker,
            nb,
        }
    }

    pub fn send(&self, value: TaskItem) -> Result<(), SendError<TaskItem>> {
        let Some(sender) = self.task_sender.as_ref().filter(|_| self.worker.is_some()) else {
            return Err(SendError(value));
        };
        self.nb.fetch_add(1, Ordering::Relaxed);
        sender.send(value).map_err(|e| {
            self.nb.fetch_sub(1, Ordering::Relaxed);
            e
        })
    }

    /// Non blocking, returns `None` when no result is ready yet.
    pub fn try_recv(&self) -> Option<ResultItem> {
        match self.result_receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn recv(&self) -> Result<ResultItem, RecvError> {
        self.result_receiver.recv()
    }

    /// Number of jobs queued or running.
    pub fn count(&self) -> i32 {
        self.nb.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.count() != 0
    }

    /// Closes the queue and waits for the job in progress, if any.
    pub fn shutdown(mut self) {
        self.task_sender = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("background task thread panicked");
            }
        }
    }
}
