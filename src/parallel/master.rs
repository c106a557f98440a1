//! The master of the size-parallel search.  The master hands out one task per forest size, in
//! increasing order of size, to idle workers.  Each report from a worker resolves one size as
//! empty, found, or failed.  Once some size has been found, tasks for larger sizes are cancelled
//! and never started.  The search ends once the smallest size with forests has no unresolved size
//! below it.  If a time limit expires first, the master cancels all tasks and reports the sizes
//! ruled out so far together with the best forests found.

use super::worker::{Report, Task, TaskResult, Worker};
use super::{Outcome, Progress, SearchConfig};
use crate::error::{Error, Result};
use crate::forest::{CancelToken, Candidates};
use crate::problem::Problem;
use std::collections::BTreeMap;
use std::mem;
use std::ops::RangeInclusive;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::time::Instant;
use tracing::{debug, info, warn};

/// What is known about one forest size
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum SizeStatus {

    /// Not searched yet, or still being searched
    Unknown,

    /// No forest of this size exists
    Empty,

    /// Forests of this size exist
    Found,

    /// The search for this size failed
    Failed,
}

/// The master thread
pub struct Master {

    /// The worker threads controlled by this master
    workers: Vec<Worker>,

    /// The IDs of all idle workers
    waiting: Vec<usize>,

    /// The number of workers still accepting tasks
    live: usize,

    /// The queue used to receive reports from the workers
    queue: Receiver<Report>,

    /// The smallest size searched
    first: usize,

    /// The largest size searched
    last: usize,

    /// The next size to hand out
    next: usize,

    /// The status of every size, indexed from `first`
    status: Vec<SizeStatus>,

    /// The cancellation token of every size, indexed from `first`
    tokens: Vec<CancelToken>,

    /// The forests found, by size
    found: BTreeMap<usize, Candidates>,

    /// The configuration
    config: SearchConfig,
}

impl Master {

    /// Initialize the master and spawn `num_workers` workers, each with its own copy of `problem`
    pub fn new(problem: &Problem, config: &SearchConfig, sizes: RangeInclusive<usize>,
               num_workers: usize) -> Result<Self> {
        let (sender, receiver) = channel();
        let workers = (0..num_workers.max(1))
            .map(|i| Worker::new(i, problem.clone(), config.clone(), sender.clone()))
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(Error::Spawn)?;
        let (first, last) = (*sizes.start(), *sizes.end());
        let count         = (last + 1).saturating_sub(first);
        Ok(Master {
            waiting: (0..workers.len()).rev().collect(),
            live:    workers.len(),
            workers,
            queue:   receiver,
            first,
            last,
            next:    first,
            status:  vec![SizeStatus::Unknown; count],
            tokens:  (0..count).map(|_| CancelToken::new()).collect(),
            found:   BTreeMap::new(),
            config:  config.clone(),
        })
    }

    /// Run the master until the minimum size is known, the time limit expires, or all sizes fail
    pub fn run(mut self, progress: &dyn Progress) -> Result<Outcome> {
        let start    = Instant::now();
        let deadline = self.config.time_limit.map(|limit| start + limit);
        self.dispatch();

        let result = loop {
            if let Some(size) = self.winner() {
                info!("Minimum forest size {} after {:.2}s", size, start.elapsed().as_secs_f64());
                let forests = self.found.remove(&size)
                    .map(|candidates| candidates.forests(size).to_vec())
                    .unwrap_or_default();
                break Ok(Outcome::Exact { size, forests, networks: vec![] });
            }
            if self.waiting.len() == self.live && !self.can_dispatch() {
                break Err(Error::NoResult);
            }

            let report = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    let received = if now >= deadline {
                        Err(RecvTimeoutError::Timeout)
                    } else {
                        self.queue.recv_timeout(deadline - now)
                    };
                    match received {
                        Ok(report)                           => report,
                        Err(RecvTimeoutError::Timeout)       => break Ok(self.bounded()),
                        Err(RecvTimeoutError::Disconnected)  => break Err(Error::NoResult),
                    }
                },
                None => match self.queue.recv() {
                    Ok(report) => report,
                    Err(_)     => break Err(Error::NoResult),
                },
            };

            self.handle(report);
            progress.report(self.percent_done(), &format!(
                "{} ({:.1}s)", self.status_message(), start.elapsed().as_secs_f64()));
            self.dispatch();
        };

        self.stop_workers();
        result
    }

    /// Record a worker's report
    fn handle(&mut self, report: Report) {
        self.waiting.push(report.worker);
        let index = report.size - self.first;
        match report.result {
            TaskResult::Found(candidates) => {
                debug!("Found forests of size {}", report.size);
                self.status[index] = SizeStatus::Found;
                self.found.insert(report.size, candidates);
                for token in &self.tokens[index + 1..] {
                    token.cancel();
                }
            },
            TaskResult::Empty => {
                debug!("No forest of size {}", report.size);
                self.status[index] = SizeStatus::Empty;
            },
            TaskResult::Failed => {
                warn!("Treating size {} as empty after a failed search", report.size);
                self.status[index] = SizeStatus::Failed;
            },
            TaskResult::Cancelled => debug!("Search for size {} cancelled", report.size),
        }
    }

    /// Is there a size left worth handing out?
    fn can_dispatch(&self) -> bool {
        self.next <= self.last && self.best_found().map_or(true, |best| self.next < best)
    }

    /// Hand out sizes to idle workers
    fn dispatch(&mut self) {
        while self.can_dispatch() {
            let worker = match self.waiting.pop() {
                Some(worker) => worker,
                None         => return,
            };
            let size = self.next;
            let task = Task { size, cancel: self.tokens[size - self.first].clone() };
            if !self.workers[worker].work_on(task) {
                warn!("Worker {} is gone, size {} is rescheduled", worker, size);
                self.live -= 1;
                continue;
            }
            self.next += 1;
        }
    }

    /// The smallest size with forests, provided no smaller size is unresolved
    fn winner(&self) -> Option<usize> {
        for (i, status) in self.status.iter().enumerate() {
            match status {
                SizeStatus::Found                     => return Some(self.first + i),
                SizeStatus::Empty | SizeStatus::Failed => continue,
                SizeStatus::Unknown                   => return None,
            }
        }
        None
    }

    /// The smallest size with forests found so far
    fn best_found(&self) -> Option<usize> {
        self.found.keys().next().cloned()
    }

    /// The smallest size not yet ruled out
    fn lower_bound(&self) -> usize {
        self.first + self.status.iter()
            .take_while(|&&status| status == SizeStatus::Empty || status == SizeStatus::Failed)
            .count()
    }

    /// The result of a search stopped by the time limit
    fn bounded(&mut self) -> Outcome {
        for token in &self.tokens {
            token.cancel();
        }
        let lower_bound = self.lower_bound();
        let best = self.best_found().and_then(|size| {
            self.found.remove(&size).map(|candidates| (size, candidates.forests(size).to_vec()))
        });
        warn!("Time limit reached; the minimum forest size is at least {}", lower_bound);
        Outcome::Bounded { lower_bound, best }
    }

    /// The fraction of relevant sizes resolved, in percent
    fn percent_done(&self) -> f64 {
        let last     = self.best_found().unwrap_or(self.last);
        let relevant = &self.status[..=last - self.first];
        let resolved = relevant.iter().filter(|&&status| status != SizeStatus::Unknown).count();
        100.0 * resolved as f64 / relevant.len() as f64
    }

    /// A summary of the current state of the search
    fn status_message(&self) -> String {
        match self.best_found() {
            Some(best) => format!("forest size between {} and {}", self.lower_bound(), best),
            None       => format!("forest size at least {}", self.lower_bound()),
        }
    }

    /// Stop all workers
    fn stop_workers(&mut self) {
        for token in &self.tokens {
            token.cancel();
        }
        let workers = mem::replace(&mut self.workers, vec![]);
        for worker in &workers {
            worker.stop();
        }
        for worker in workers {
            worker.quit();
        }
    }
}
