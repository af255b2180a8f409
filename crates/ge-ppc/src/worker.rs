//! Background call worker
//!
//! One thread owns the [`Interpreter`] and polls a request channel. Callers
//! submit a call and block on a reply channel; a mutex keeps at most one call
//! in flight, and the request channel has room for exactly one request.
//! The stop flag is only looked at between requests, so shutdown waits for
//! any call already running to reach its terminal state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use ge_core::error::BridgeError;
use parking_lot::Mutex;

use crate::bridge::{CallListener, CallResult, FunctionCall};
use crate::context::InterpreterContext;
use crate::interpreter::Interpreter;

type Job = Box<dyn FnOnce(&mut Interpreter) + Send>;

enum Request {
    Evaluate {
        call: FunctionCall,
        reply: Sender<Result<CallResult, BridgeError>>,
    },
    Run(Job),
}

/// Handle to the interpreter thread
pub struct CallWorker {
    requests: Sender<Request>,
    /// Serializes callers: held from submit until the reply arrives
    in_flight: Mutex<()>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CallWorker {
    /// Start the worker thread with an interpreter built from `ctx`
    pub fn spawn(ctx: &InterpreterContext) -> Result<Self, BridgeError> {
        let (requests, receiver) = bounded(1);
        let running = Arc::new(AtomicBool::new(true));
        // A zero interval would spin
        let poll = Duration::from_millis(ctx.config.interpreter.poll_interval_ms.max(1));

        let interpreter = Interpreter::new(ctx);
        let running_clone = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name("ge-call-worker".to_string())
            .spawn(move || Self::worker_loop(interpreter, receiver, running_clone, poll))?;

        ge_core::bridge_debug!("Call worker started (poll every {:?})", poll);

        Ok(Self {
            requests,
            in_flight: Mutex::new(()),
            running,
            handle: Some(handle),
        })
    }

    fn worker_loop(
        mut interpreter: Interpreter,
        receiver: Receiver<Request>,
        running: Arc<AtomicBool>,
        poll: Duration,
    ) {
        while running.load(Ordering::Acquire) {
            match receiver.recv_timeout(poll) {
                Ok(Request::Evaluate { call, reply }) => {
                    let _ = reply.send(interpreter.evaluate(&call));
                }
                Ok(Request::Run(job)) => job(&mut interpreter),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        ge_core::bridge_debug!("Call worker exiting");
    }

    /// Call a guest function on the worker and wait for it to finish
    pub fn call(&self, call: &FunctionCall) -> Result<CallResult, BridgeError> {
        let _guard = self.in_flight.lock();
        let (reply, response) = bounded(1);
        self.submit(Request::Evaluate {
            call: call.clone(),
            reply,
        })?;
        response.recv().map_err(|_| BridgeError::WorkerStopped)?
    }

    /// Like [`call`](Self::call), then hand the outcome to `listener`
    pub fn call_with(
        &self,
        call: &FunctionCall,
        listener: &mut dyn CallListener,
    ) -> Result<CallResult, BridgeError> {
        let result = self.call(call)?;
        result.notify(listener);
        Ok(result)
    }

    /// Run `f` against the interpreter on the worker thread, between calls
    pub fn with_interpreter<F, R>(&self, f: F) -> Result<R, BridgeError>
    where
        F: FnOnce(&mut Interpreter) -> R + Send + 'static,
        R: Send + 'static,
    {
        let _guard = self.in_flight.lock();
        let (reply, response) = bounded(1);
        self.submit(Request::Run(Box::new(move |interpreter| {
            let _ = reply.send(f(interpreter));
        })))?;
        response.recv().map_err(|_| BridgeError::WorkerStopped)
    }

    fn submit(&self, request: Request) -> Result<(), BridgeError> {
        if !self.is_running() {
            return Err(BridgeError::WorkerStopped);
        }
        self.requests
            .send(request)
            .map_err(|_| BridgeError::WorkerStopped)
    }

    /// Whether the worker thread is still accepting requests
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
            && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the worker and wait for the thread to exit
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("Call worker panicked");
            }
        }
    }
}

impl Drop for CallWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
