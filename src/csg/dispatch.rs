//! Offloading operations to workers.
//!
//! A job carries an operation descriptor whose leaves are encoded octrees, so
//! every worker decodes private copies. A worker answers with the flat
//! vertex and normal buffers of its result, or with the error it hit.
//! Results are sorted by job index and merged on the calling thread.

use super::BooleanOp;
use super::operation::{CsgOperation, Operand, OperationKind};
use crate::config::CsgOptions;
use crate::errors::CsgError;
use crate::octree::Octree;

#[derive(Debug, Clone)]
pub struct JobRequest {
    pub job_index: usize,
    pub operation: CsgOperation<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobResponse {
    Success {
        job_index: usize,
        vertices: Vec<f32>,
        normals: Vec<f32>,
    },
    Failure {
        job_index: usize,
        error: String,
    },
}

impl JobResponse {
    pub const fn job_index(&self) -> usize {
        match self {
            JobResponse::Success { job_index, .. } | JobResponse::Failure { job_index, .. } => *job_index,
        }
    }
}

/// Something that runs jobs and waits for all of them.
///
/// Returning [`CsgError::WorkerCreation`] means no job ran; the caller may
/// then run them itself. A job that ran and failed comes back as
/// [`JobResponse::Failure`].
pub trait Dispatcher: Sync {
    fn dispatch(&self, jobs: Vec<JobRequest>) -> Result<Vec<JobResponse>, CsgError>;
}

/// Run one job on the current thread.
pub fn run_job(request: JobRequest, options: &CsgOptions) -> JobResponse {
    let job_index = request.job_index;
    let outcome = request
        .operation
        .decode(options)
        .and_then(|operation| options.operation(operation));
    match outcome {
        Ok(octree) => {
            let (vertices, normals) = octree.to_buffers();
            JobResponse::Success {
                job_index,
                vertices,
                normals,
            }
        },
        Err(error) => JobResponse::Failure {
            job_index,
            error: error.to_string(),
        },
    }
}

impl CsgOptions {
    /// Resolve a descriptor, offloading work to `dispatcher` when one is given.
    ///
    /// A binary operation is shipped as a single job. Array operations are
    /// cut into jobs of `batch_size` operands whose partial results are
    /// combined here; for `SubtractArray` the head stays on this thread and
    /// the rest is unioned by the workers.
    pub fn operation_dispatched(
        &self,
        operation: CsgOperation,
        dispatcher: Option<&dyn Dispatcher>,
    ) -> Result<Octree, CsgError> {
        operation.validate()?;
        let Some(dispatcher) = dispatcher else {
            return self.operation(operation);
        };

        let kind = operation.kind;
        if kind.is_binary() {
            let job = JobRequest {
                job_index: 0,
                operation: operation.encode()?,
            };
            return self
                .dispatch_jobs(vec![job], dispatcher)?
                .pop()
                .ok_or_else(|| CsgError::Operation {
                    job_index: 0,
                    message: "dispatcher returned no response".to_string(),
                });
        }

        let mut operands = operation.operands.into_iter();
        let head = match kind {
            OperationKind::SubtractArray => operands
                .next()
                .map(|operand| self.resolve_operand(operand))
                .transpose()?,
            _ => None,
        };
        let batch_kind = match kind {
            OperationKind::IntersectArray => OperationKind::IntersectArray,
            _ => OperationKind::UnionArray,
        };

        let mut jobs = Vec::new();
        let mut pending = operands.peekable();
        while pending.peek().is_some() {
            let batch: Vec<Operand> = pending.by_ref().take(self.batch_size.max(1)).collect();
            jobs.push(JobRequest {
                job_index: jobs.len(),
                operation: CsgOperation::new(batch_kind, batch).encode()?,
            });
        }
        log::debug!("{kind:?}: dispatching {} jobs of up to {} operands", jobs.len(), self.batch_size);

        let partials = if jobs.is_empty() {
            Vec::new()
        } else {
            self.dispatch_jobs(jobs, dispatcher)?
        };
        match head {
            Some(head) if partials.is_empty() => Ok(head),
            Some(head) => {
                let cutter = self.reduce(BooleanOp::Union, partials)?;
                self.subtract(head, cutter)
            },
            None => self.reduce(kind.boolean(), partials),
        }
    }

    /// Run `jobs` through `dispatcher` and rebuild their results in job order.
    pub fn dispatch_jobs(
        &self,
        jobs: Vec<JobRequest>,
        dispatcher: &dyn Dispatcher,
    ) -> Result<Vec<Octree>, CsgError> {
        let fallback = self.sync_fallback.then(|| jobs.clone());
        let mut responses = match dispatcher.dispatch(jobs) {
            Ok(responses) => responses,
            Err(CsgError::WorkerCreation(reason)) => match fallback {
                Some(jobs) => {
                    log::warn!(
                        "worker creation failed ({reason}); running {} jobs on the calling thread",
                        jobs.len()
                    );
                    jobs.into_iter().map(|job| run_job(job, self)).collect()
                },
                None => return Err(CsgError::WorkerCreation(reason)),
            },
            Err(error) => return Err(error),
        };

        responses.sort_by_key(JobResponse::job_index);
        responses
            .into_iter()
            .map(|response| match response {
                JobResponse::Success {
                    vertices, normals, ..
                } => Octree::from_buffers(&vertices, &normals, self.octree),
                JobResponse::Failure { job_index, error } => Err(CsgError::Operation {
                    job_index,
                    message: error,
                }),
            })
            .collect()
    }
}

#[cfg(feature = "parallel")]
pub use pool::WorkerPool;

#[cfg(feature = "parallel")]
mod pool {
    use super::{Dispatcher, JobRequest, JobResponse, run_job};
    use crate::config::{CsgOptions, WorkerPoolConfig};
    use crate::errors::CsgError;
    use rayon::prelude::*;
    use std::sync::mpsc;
    use std::time::Instant;

    /// A rayon thread pool running jobs in parallel.
    pub struct WorkerPool {
        pool: rayon::ThreadPool,
        options: CsgOptions,
    }

    impl WorkerPool {
        /// Start the pool and wait until every worker has reported in.
        ///
        /// Fails with [`CsgError::WorkerCreation`] when the pool cannot be
        /// built or a worker has not started by `startup_timeout`.
        pub fn new(config: WorkerPoolConfig, options: CsgOptions) -> Result<Self, CsgError> {
            let (started, ready) = mpsc::channel();
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .thread_name(|i| format!("octree-csg-worker-{i}"))
                .start_handler(move |i| {
                    // the receiver is gone once startup timed out
                    let _ = started.send(i);
                })
                .build()
                .map_err(|e| CsgError::WorkerCreation(e.to_string()))?;

            let deadline = Instant::now() + config.startup_timeout;
            let threads = pool.current_num_threads();
            for reported in 0..threads {
                let left = deadline.saturating_duration_since(Instant::now());
                ready.recv_timeout(left).map_err(|_| {
                    CsgError::WorkerCreation(format!(
                        "{reported} of {threads} workers started within {:?}",
                        config.startup_timeout
                    ))
                })?;
            }
            log::debug!("worker pool ready with {threads} threads");
            Ok(Self { pool, options })
        }

        pub fn threads(&self) -> usize {
            self.pool.current_num_threads()
        }
    }

    impl Dispatcher for WorkerPool {
        fn dispatch(&self, jobs: Vec<JobRequest>) -> Result<Vec<JobResponse>, CsgError> {
            let options = self.options;
            Ok(self
                .pool
                .install(|| jobs.into_par_iter().map(|job| run_job(job, &options)).collect()))
        }
    }

    impl CsgOptions {
        /// Start a [`WorkerPool`] with these options.
        ///
        /// When it fails to start and `sync_fallback` is set, `Ok(None)` is
        /// returned so callers dispatch nothing and run synchronously.
        pub fn start_worker_pool(&self, config: WorkerPoolConfig) -> Result<Option<WorkerPool>, CsgError> {
            match WorkerPool::new(config, *self) {
                Ok(pool) => Ok(Some(pool)),
                Err(CsgError::WorkerCreation(reason)) if self.sync_fallback => {
                    log::warn!("worker pool unavailable ({reason}); operations will run synchronously");
                    Ok(None)
                },
                Err(error) => Err(error),
            }
        }
    }
}
