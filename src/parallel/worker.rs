//! A worker of the size-parallel search.  A worker waits for tasks from the master.  Each task
//! names one forest size; the worker runs a `ForestSearch` for exactly that size on its own copy of
//! the input trees and reports the forests it finds.  A `None` message makes the worker exit.
//!
//! A panic inside a search is caught at the task boundary and reported as a failed task, so the
//! worker stays available and the master's bookkeeping stays intact.

use super::SearchConfig;
use crate::forest::{CancelToken, Candidates, ForestSearch, Interrupted};
use crate::problem::Problem;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use tracing::{debug, error};

/// A search for forests of one size
#[derive(Clone, Debug)]
pub struct Task {

    /// The forest size to look for
    pub size: usize,

    /// Cancels this task only
    pub cancel: CancelToken,
}

/// What a task produced
#[derive(Debug)]
pub enum TaskResult {

    /// Forests of the requested size exist; here they are
    Found(Candidates),

    /// No forest of the requested size exists
    Empty,

    /// The search panicked
    Failed,

    /// The task was cancelled before it finished
    Cancelled,
}

/// The message a worker sends to the master after each task
#[derive(Debug)]
pub struct Report {

    /// The ID of the worker, which is idle again
    pub worker: usize,

    /// The size the task searched for
    pub size: usize,

    /// The outcome
    pub result: TaskResult,
}

/// The external interface of a worker used by the master
pub struct Worker {

    /// The worker's thread
    thread: thread::JoinHandle<()>,

    /// The worker's sending end of the task queue
    queue: Sender<Option<Task>>,
}

/// The internal state of a worker
struct WorkerState {

    /// The ID of this worker
    id: usize,

    /// The worker's copy of the input
    problem: Problem,

    /// How to search
    config: SearchConfig,

    /// The queue used to receive tasks from the master
    work: Receiver<Option<Task>>,

    /// The queue used to send results back to the master
    result: Sender<Report>,
}

impl Worker {

    /// Spawn a new worker
    pub fn new(id: usize, problem: Problem, config: SearchConfig, result: Sender<Report>)
        -> io::Result<Self> {
        let (queue, work) = channel();
        let worker_state  = WorkerState { id, problem, config, work, result };
        let thread        = thread::Builder::new()
            .name(format!("maaf-worker-{}", id))
            .spawn(move || worker_state.run())?;
        Ok(Worker { thread, queue })
    }

    /// Send a task to this worker.  Returns `false` if the worker has exited.
    pub fn work_on(&self, task: Task) -> bool {
        self.queue.send(Some(task)).is_ok()
    }

    /// Ask the worker to exit once its current task is done
    pub fn stop(&self) {
        let _ = self.queue.send(None);
    }

    /// Stop the worker and wait for its thread to exit
    pub fn quit(self) {
        self.stop();
        if self.thread.join().is_err() {
            error!("Worker thread exited abnormally");
        }
    }
}

impl WorkerState {

    /// Process tasks until told to quit
    fn run(self) {
        while let Ok(Some(task)) = self.work.recv() {
            let size   = task.size;
            let result = self.run_task(task);
            if self.result.send(Report { worker: self.id, size, result }).is_err() {
                return;
            }
        }
    }

    /// Run a task, turning a panic into a failed result
    fn run_task(&self, task: Task) -> TaskResult {
        debug!("Worker {} searching for forests of size {}", self.id, task.size);
        match panic::catch_unwind(AssertUnwindSafe(|| self.search(&task))) {
            Ok(Ok(candidates)) if candidates.is_empty() => TaskResult::Empty,
            Ok(Ok(candidates))                          => TaskResult::Found(candidates),
            Ok(Err(Interrupted))                        => TaskResult::Cancelled,
            Err(_)                                      => {
                error!("Search for forests of size {} panicked", task.size);
                TaskResult::Failed
            },
        }
    }

    /// Search fresh copies of the input trees for forests of the task's size
    fn search(&self, task: &Task) -> Result<Candidates, Interrupted> {
        let tree1 = self.problem.tree1().clone();
        let tree2 = self.problem.tree2().clone();
        let (candidates, stats) =
            ForestSearch::with_trees(&tree1, &tree2, self.problem.root_taxon(), self.config.mode)
                .range(task.size..=task.size)
                .use_cache(self.config.use_cache)
                .first_only(self.config.first_only())
                .cancel_token(task.cancel.clone())
                .run()?;
        debug!("Size {} done after {} calls: {} forests", task.size, stats.calls, candidates.len());
        Ok(candidates)
    }
}
