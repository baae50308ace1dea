use std::sync::Arc;
use std::thread;

use crate::contracts::ShellCompletion;
use crate::contracts::ShellRequest;
use crate::executor::completion_text;
use crate::executor::ShellRunner;

/// Runs each request on its own thread so slow commands never block the UI.
#[derive(Clone)]
pub struct ShellDispatcher {
    runner: Arc<dyn ShellRunner>,
}

impl ShellDispatcher {
    pub fn new(runner: impl ShellRunner + 'static) -> Self {
        Self {
            runner: Arc::new(runner),
        }
    }

    pub fn dispatch<F>(&self, request: ShellRequest, callback: F)
    where
        F: FnOnce(ShellCompletion) + Send + 'static,
    {
        let runner = Arc::clone(&self.runner);
        thread::spawn(move || {
            tracing::debug!(request_id = request.request_id, "shell request started");
            let result = completion_text(runner.run(&request.command));
            if let Err(message) = &result {
                tracing::info!(request_id = request.request_id, %message, "shell request failed");
            }
            callback(ShellCompletion {
                request_id: request.request_id,
                result,
            });
        });
    }
}

impl std::fmt::Debug for ShellDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellDispatcher").finish_non_exhaustive()
    }
}
