//! Defines the servo-easing runtime task runner.
use std::future::Future;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;

use crate::errors::{Error, RuntimeError, Unknown};

/// Represents the result of a task.
/// A task may return either () or Result<(), Error>: both are converted to a TaskResult sent to the
/// runtime.
pub enum TaskResult {
    Ok,
    Err(Error),
}

/// Represents a handler to a running task.
pub type TaskHandler = JoinHandle<Result<(), Error>>;

/// Globally accessible runtime transmitter(TX)/receiver(RX) (not initialised yet).
pub static RUNTIME_TX: OnceCell<Mutex<Option<UnboundedSender<UnboundedReceiver<TaskResult>>>>> =
    OnceCell::const_new();
pub static RUNTIME_RX: OnceCell<Mutex<Option<UnboundedReceiver<UnboundedReceiver<TaskResult>>>>> =
    OnceCell::const_new();

impl From<Result<(), Error>> for TaskResult {
    fn from(result: Result<(), Error>) -> Self {
        match result {
            Ok(_) => TaskResult::Ok,
            Err(e) => TaskResult::Err(e),
        }
    }
}

impl From<()> for TaskResult {
    fn from(_: ()) -> Self {
        TaskResult::Ok
    }
}

/// Creates the runtime channel once: called by `#[servo_easing::runtime]` before the user code.
pub async fn init_task_channel() {
    RUNTIME_RX
        .get_or_init(|| async {
            let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<UnboundedReceiver<TaskResult>>();
            RUNTIME_TX
                .get_or_init(|| async { Mutex::new(Some(tx)) })
                .await;
            Mutex::new(Some(rx))
        })
        .await;
}

/// Runs a future as a tokio task while ensuring the function marked by `#[servo_easing::runtime]`
/// will not return before the task is done.
///
/// Each task gets its own result channel whose receiving side is handed to the runtime through the
/// globally accessible [`RUNTIME_TX`].
///
/// # Errors
/// * `RuntimeError`: called outside a tokio runtime, or before the runtime channel exists.
/// * `Unknown`: the runtime channel is closed.
pub fn run<F, T>(future: F) -> Result<TaskHandler, Error>
where
    F: Future<Output = T> + Send + 'static,
    T: Into<TaskResult> + Send + 'static,
{
    let runtime = Handle::try_current().map_err(|_| RuntimeError)?;
    let cell = RUNTIME_TX.get().ok_or(RuntimeError)?;

    let (task_tx, task_rx) = tokio::sync::mpsc::unbounded_channel();
    {
        let mut lock = cell.lock();
        let runtime_tx = lock.as_mut().ok_or(RuntimeError)?;
        runtime_tx.send(task_rx).map_err(|err| Unknown {
            info: err.to_string(),
        })?;
    }

    let handler = runtime.spawn(async move {
        let result = future.await.into();
        task_tx.send(result).map_err(|err| Unknown {
            info: err.to_string(),
        })?;
        Ok(())
    });

    Ok(handler)
}

#[macro_export]
macro_rules! pause {
    ($ms:expr) => {
        $crate::utils::tokio::time::sleep(std::time::Duration::from_millis($ms as u64)).await
    };
}

#[macro_export]
macro_rules! pause_sync {
    ($ms:expr) => {
        std::thread::sleep(std::time::Duration::from_millis($ms as u64))
    };
}
