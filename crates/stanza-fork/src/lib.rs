//! Worker pool: spawn N workers and divide up tasks between them.
//!
//! Each worker owns the write end of a dedicated OS pipe and streams framed
//! results back to the coordinator; the coordinator multiplexes all read
//! ends and dispatches frames as they arrive. Workers are threads with
//! isolated state rather than forked processes — the framing protocol and
//! ordering guarantees are the same either way: frames within one worker's
//! stream arrive in submission order, with that worker's single
//! process-done frame last; arrival order *across* workers is unspecified.
//!
//! There is no mid-flight cancellation: the pool runs to completion, and
//! unrecoverable spawn/pipe failures are fatal to the whole run. A worker
//! that panics (the thread-world analogue of dying from an unexpected
//! signal) sets the soft `did_have_error` flag instead of failing the
//! coordinator.

mod frames;
mod message;

pub use frames::{FrameError, FrameWriter, WRITE_BUFFER_LIMIT};
pub use message::{PoolMessage, PROTOCOL_VERSION};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{PipeReader, Read};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;

/// Fatal infrastructure failures. These abort the run; they are never
/// surfaced as analysis results.
#[derive(Debug, Error)]
pub enum ForkError {
    #[error("unable to create worker pipe: {0}")]
    Pipe(std::io::Error),

    #[error("unable to spawn worker thread: {0}")]
    Spawn(std::io::Error),
}

/// How a worker finished.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum WorkerExit {
    Success,
    Failure,
}

enum StreamEvent {
    Chunk(usize, Vec<u8>),
    Eof(usize),
    ReadError(usize),
}

pub struct Pool<T, A> {
    workers: Vec<JoinHandle<WorkerExit>>,
    read_streams: Vec<PipeReader>,
    task_done_callback: Option<Box<dyn FnMut(T)>>,
    did_have_error: bool,
    _aggregate: std::marker::PhantomData<A>,
}

impl<T, A> Pool<T, A>
where
    T: Serialize + DeserializeOwned + Send + 'static,
    A: Serialize + DeserializeOwned + Send + 'static,
{
    /// Spawn one worker per task batch.
    ///
    /// Each worker runs `startup` once, `task` per task in its batch
    /// (streaming each result back as a task-done frame), then `shutdown`,
    /// whose aggregate is sent as the final process-done frame.
    /// `task_done_callback` runs in the coordinator as task results arrive.
    pub fn new<Task, State>(
        process_task_batches: Vec<Vec<Task>>,
        startup: impl Fn() -> State + Send + Sync + 'static,
        task: impl Fn(&mut State, usize, Task) -> T + Send + Sync + 'static,
        shutdown: impl Fn(State) -> A + Send + Sync + 'static,
        task_done_callback: Option<Box<dyn FnMut(T)>>,
    ) -> Result<Self, ForkError>
    where
        Task: Send + 'static,
        State: 'static,
    {
        let startup = Arc::new(startup);
        let task = Arc::new(task);
        let shutdown = Arc::new(shutdown);

        let mut workers = Vec::with_capacity(process_task_batches.len());
        let mut read_streams = Vec::with_capacity(process_task_batches.len());

        for (worker_id, batch) in process_task_batches.into_iter().enumerate() {
            let (reader, writer) = std::io::pipe().map_err(ForkError::Pipe)?;
            read_streams.push(reader);

            let startup = Arc::clone(&startup);
            let task = Arc::clone(&task);
            let shutdown = Arc::clone(&shutdown);

            let handle = std::thread::Builder::new()
                .name(format!("stanza-worker-{worker_id}"))
                .spawn(move || {
                    let mut frame_writer = FrameWriter::new(writer);
                    let mut state = startup();

                    for (index, task_data) in batch.into_iter().enumerate() {
                        let result = task(&mut state, index, task_data);
                        let message: PoolMessage<T, A> = PoolMessage::task_done(result);
                        if frame_writer.buffer_frame(&message).is_err() {
                            return WorkerExit::Failure;
                        }
                    }

                    let aggregate = shutdown(state);
                    let message: PoolMessage<T, A> = PoolMessage::process_done(aggregate);
                    if frame_writer.buffer_frame(&message).is_err() {
                        return WorkerExit::Failure;
                    }
                    if frame_writer.flush_fully().is_err() {
                        return WorkerExit::Failure;
                    }

                    // Dropping the writer closes the worker's end of the pipe.
                    WorkerExit::Success
                })
                .map_err(ForkError::Spawn)?;

            workers.push(handle);
        }

        Ok(Self {
            workers,
            read_streams,
            task_done_callback,
            did_have_error: false,
            _aggregate: std::marker::PhantomData,
        })
    }

    /// Wait for all workers to complete and return their aggregates.
    ///
    /// The order of the returned aggregates is not significant; callers
    /// needing a stable order must sort by an embedded key.
    pub fn wait(&mut self) -> Vec<A> {
        let aggregates = self.read_results_from_workers();

        // Reap every worker; a panic is an abnormal death.
        for handle in std::mem::take(&mut self.workers) {
            match handle.join() {
                Ok(WorkerExit::Success) => {}
                Ok(WorkerExit::Failure) => {
                    tracing::error!("worker failed to write its results");
                    self.did_have_error = true;
                }
                Err(_) => {
                    tracing::error!("worker terminated abnormally");
                    self.did_have_error = true;
                }
            }
        }

        aggregates
    }

    /// Whether any worker misbehaved: truncated or foreign frames, write
    /// failures, or abnormal termination.
    pub fn did_have_error(&self) -> bool {
        self.did_have_error
    }

    fn read_results_from_workers(&mut self) -> Vec<A> {
        let read_streams = std::mem::take(&mut self.read_streams);
        let stream_count = read_streams.len();
        let mut buffers: Vec<Vec<u8>> = (0..stream_count).map(|_| Vec::new()).collect();
        let mut aggregates = Vec::new();

        // One reader per stream feeding a single channel: recv() is the
        // readiness wait, blocking until any stream has data. No timeout.
        let (sender, receiver) = mpsc::channel::<StreamEvent>();
        let mut reader_handles = Vec::with_capacity(stream_count);
        for (index, mut stream) in read_streams.into_iter().enumerate() {
            let sender = sender.clone();
            reader_handles.push(std::thread::spawn(move || {
                let mut chunk = [0u8; 1024];
                loop {
                    match stream.read(&mut chunk) {
                        Ok(0) => {
                            let _ = sender.send(StreamEvent::Eof(index));
                            return;
                        }
                        Ok(n) => {
                            if sender.send(StreamEvent::Chunk(index, chunk[..n].to_vec())).is_err() {
                                return;
                            }
                        }
                        Err(error) if error.kind() == std::io::ErrorKind::Interrupted => {}
                        Err(_) => {
                            let _ = sender.send(StreamEvent::ReadError(index));
                            return;
                        }
                    }
                }
            }));
        }
        drop(sender);

        let mut open_streams = stream_count;
        while open_streams > 0 {
            let Ok(event) = receiver.recv() else {
                break;
            };
            match event {
                StreamEvent::Chunk(index, bytes) => {
                    buffers[index].extend_from_slice(&bytes);
                    self.dispatch_complete_frames(&mut buffers[index], &mut aggregates);
                }
                StreamEvent::Eof(index) => {
                    if !buffers[index].is_empty() {
                        tracing::error!(
                            worker = index,
                            "worker did not send a full message before closing its stream"
                        );
                        self.did_have_error = true;
                    }
                    open_streams -= 1;
                }
                StreamEvent::ReadError(index) => {
                    tracing::error!(worker = index, "error reading worker stream");
                    self.did_have_error = true;
                    open_streams -= 1;
                }
            }
        }

        for handle in reader_handles {
            let _ = handle.join();
        }

        aggregates
    }

    /// Split complete newline-terminated frames off the front of `buffer`,
    /// retaining the trailing partial frame for the next read.
    fn dispatch_complete_frames(&mut self, buffer: &mut Vec<u8>, aggregates: &mut Vec<A>) {
        while let Some(newline_at) = buffer.iter().position(|&byte| byte == b'\n') {
            let frame: Vec<u8> = buffer.drain(..=newline_at).collect();
            let frame = &frame[..frame.len() - 1];

            match frames::decode_frame::<T, A>(frame) {
                Ok(PoolMessage::TaskDone { payload, .. }) => {
                    if let Some(callback) = &mut self.task_done_callback {
                        callback(payload);
                    }
                }
                Ok(PoolMessage::ProcessDone { payload, .. }) => {
                    aggregates.push(payload);
                }
                Err(error) => {
                    tracing::error!(%error, "worker sent an undecodable frame");
                    self.did_have_error = true;
                }
            }
        }
    }
}
