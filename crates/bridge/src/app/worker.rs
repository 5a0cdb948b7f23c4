use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to spawn {name} thread: {source}")]
    SpawnThread {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Owns a background loop thread. Stopping (or dropping) the handle signals
/// the loop and joins it.
#[derive(Debug)]
pub struct WorkerHandle {
    name: &'static str,
    stop: Option<Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Disconnecting the channel is the stop signal.
        drop(self.stop.take());
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                warn!(worker = self.name, "worker_panicked");
            } else {
                debug!(worker = self.name, "worker_stopped");
            }
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Spawns a named thread running `body`. `body` must return once the stop
/// receiver it is given becomes ready.
pub(crate) fn spawn_worker<F>(name: &'static str, body: F) -> Result<WorkerHandle, BridgeError>
where
    F: FnOnce(Receiver<()>) + Send + 'static,
{
    let (stop_tx, stop_rx) = bounded::<()>(0);
    let join = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || body(stop_rx))
        .map_err(|source| BridgeError::SpawnThread { name, source })?;
    debug!(worker = name, "worker_started");
    Ok(WorkerHandle {
        name,
        stop: Some(stop_tx),
        join: Some(join),
    })
}
