//! Fan-out with partial tolerance
//!
//! Runs a batch of labelled tasks concurrently, each under its own timeout,
//! and collects whatever finishes before an overall deadline. Tasks still
//! running at the deadline are aborted.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::{timeout, timeout_at, Instant};

#[derive(Debug, Clone, Copy)]
pub struct GatherConfig {
    pub per_task_timeout: Duration,
    pub deadline: Duration,
    pub min_successes: usize,
}

impl Default for GatherConfig {
    fn default() -> Self {
        Self {
            per_task_timeout: Duration::from_secs(12),
            deadline: Duration::from_secs(20),
            min_successes: 1,
        }
    }
}

/// Why a task did not produce a value
#[derive(Debug)]
pub enum FailureReason<E> {
    Error(E),
    TimedOut,
    /// Still running when the overall deadline passed
    DeadlineExceeded,
    Panicked,
}

#[derive(Debug)]
pub struct TaskFailure<E> {
    pub label: String,
    pub reason: FailureReason<E>,
}

#[derive(Debug)]
pub struct GatherOutcome<T, E> {
    /// Successful values in completion order, with their labels
    pub successes: Vec<(String, T)>,
    pub failures: Vec<TaskFailure<E>>,
    pub deadline_hit: bool,
    min_successes: usize,
}

impl<T, E> GatherOutcome<T, E> {
    /// True when at least the configured minimum of tasks succeeded
    pub fn is_satisfied(&self) -> bool {
        self.successes.len() >= self.min_successes
    }
}

/// Run `tasks` concurrently and collect partial results.
pub async fn gather_partial<T, E, F>(
    tasks: Vec<(String, F)>,
    config: GatherConfig,
) -> GatherOutcome<T, E>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let deadline = Instant::now() + config.deadline;
    let mut pending: HashSet<String> = HashSet::with_capacity(tasks.len());
    let mut set = JoinSet::new();

    for (label, task) in tasks {
        pending.insert(label.clone());
        let per_task = config.per_task_timeout;
        set.spawn(async move { (label, timeout(per_task, task).await) });
    }

    let mut successes = Vec::new();
    let mut failures = Vec::new();
    let mut deadline_hit = false;

    loop {
        match timeout_at(deadline, set.join_next()).await {
            Ok(Some(Ok((label, result)))) => {
                pending.remove(&label);
                match result {
                    Ok(Ok(value)) => successes.push((label, value)),
                    Ok(Err(e)) => failures.push(TaskFailure {
                        label,
                        reason: FailureReason::Error(e),
                    }),
                    Err(_) => {
                        tracing::warn!(task = %label, timeout = ?config.per_task_timeout, "task timed out");
                        failures.push(TaskFailure {
                            label,
                            reason: FailureReason::TimedOut,
                        });
                    }
                }
            }
            Ok(Some(Err(join_err))) => {
                tracing::error!(error = %join_err, "gathered task panicked");
            }
            Ok(None) => break,
            Err(_) => {
                deadline_hit = true;
                set.abort_all();
                tracing::warn!(
                    remaining = pending.len(),
                    deadline = ?config.deadline,
                    "gather deadline reached, aborting remaining tasks"
                );
                break;
            }
        }
    }

    // Labels never reported back either panicked or were cut off
    let mut leftover: Vec<String> = pending.into_iter().collect();
    leftover.sort();
    for label in leftover {
        failures.push(TaskFailure {
            label,
            reason: if deadline_hit {
                FailureReason::DeadlineExceeded
            } else {
                FailureReason::Panicked
            },
        });
    }

    GatherOutcome {
        successes,
        failures,
        deadline_hit,
        min_successes: config.min_successes,
    }
}
