//! Handles for asynchronous deploy and retrieve jobs.
//!
//! Submitting a deploy or retrieve returns a job handle right away. The
//! handle can be checked once, polled to completion, or (for retrieves)
//! turned into a byte stream of the resulting archive.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, instrument, warn};

use crate::client::MetadataClient;
use crate::deploy::{CancelDeployResult, DeployResult};
use crate::error::{Error, ErrorKind, Result};
use crate::retrieve::{RetrieveResult, RetrieveStatus};

/// Chunk size used by [`RetrieveJob::stream`].
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Archive bytes of a finished retrieve.
///
/// Ends after the last chunk on success. On failure it yields exactly one
/// `Err` and then ends.
pub type ArchiveStream = BoxStream<'static, Result<Bytes>>;

/// How often and for how long to poll an asynchronous job.
///
/// A zero `interval` is rejected when polling starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(600),
        }
    }
}

impl PollOptions {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Call `check` until `is_done` holds or the timeout passes.
///
/// The first check happens immediately. Sleeps never run past the deadline.
/// A zero interval fails before the first check.
pub(crate) async fn poll_until_done<T, F, Fut>(
    options: PollOptions,
    job_id: &str,
    mut check: F,
    is_done: impl Fn(&T) -> bool,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if options.interval.is_zero() {
        return Err(Error::new(ErrorKind::InvalidRequest(
            "poll interval must be greater than zero".to_string(),
        )));
    }

    let start = tokio::time::Instant::now();
    let mut polls = 0u32;

    loop {
        let result = check().await?;
        polls += 1;

        if is_done(&result) {
            debug!(job_id, polls, "Async job finished");
            return Ok(result);
        }

        let elapsed = start.elapsed();
        if elapsed >= options.timeout {
            warn!(
                job_id,
                polls,
                timeout_secs = options.timeout.as_secs(),
                "Gave up waiting for async job"
            );
            return Err(Error::new(ErrorKind::Timeout));
        }

        tokio::time::sleep(options.interval.min(options.timeout - elapsed)).await;
    }
}

/// A submitted deployment.
#[derive(Debug, Clone)]
pub struct DeployJob {
    client: MetadataClient,
    id: String,
    poll: PollOptions,
}

impl DeployJob {
    pub(crate) fn new(client: MetadataClient, id: String) -> Self {
        let poll = client.poll_options();
        Self { client, id, poll }
    }

    /// Async process ID of the deployment.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn with_poll_options(mut self, poll: PollOptions) -> Self {
        self.poll = poll;
        self
    }

    /// Current status, including component and test details.
    pub async fn check(&self) -> Result<DeployResult> {
        self.client.check_deploy_status(&self.id, true).await
    }

    /// Poll until the deployment is done.
    ///
    /// A failed deployment is still a completed one: inspect `success` or use
    /// [`DeployResult::into_success`].
    #[instrument(skip(self), fields(deploy_id = %self.id))]
    pub async fn complete(&self) -> Result<DeployResult> {
        let result =
            poll_until_done(self.poll, &self.id, || self.check(), |r: &DeployResult| r.done)
                .await?;
        for failure in result.component_failures.iter().filter(|f| !f.is_warning()) {
            warn!(
                location = %failure.location(),
                problem = %failure.problem,
                "Component failed to deploy"
            );
        }
        Ok(result)
    }

    /// Request cancellation. The deployment keeps running until the service
    /// reports `Canceled`.
    pub async fn cancel(&self) -> Result<CancelDeployResult> {
        self.client.cancel_deploy(&self.id).await
    }
}

/// A submitted retrieve.
#[derive(Debug, Clone)]
pub struct RetrieveJob {
    client: MetadataClient,
    id: String,
    poll: PollOptions,
}

enum StreamState {
    Pending(RetrieveJob),
    Streaming(Bytes),
    Done,
}

impl RetrieveJob {
    pub(crate) fn new(client: MetadataClient, id: String) -> Self {
        let poll = client.poll_options();
        Self { client, id, poll }
    }

    /// Async process ID of the retrieve.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn with_poll_options(mut self, poll: PollOptions) -> Self {
        self.poll = poll;
        self
    }

    /// Current status, without the archive.
    pub async fn check(&self) -> Result<RetrieveResult> {
        self.client.check_retrieve_status(&self.id, false).await
    }

    /// Poll until the retrieve is done. The result carries the archive when
    /// the retrieve succeeded.
    ///
    /// Polls go out without the archive; it is fetched once, after the
    /// service reports success.
    #[instrument(skip(self), fields(retrieve_id = %self.id))]
    pub async fn complete(&self) -> Result<RetrieveResult> {
        let status =
            poll_until_done(self.poll, &self.id, || self.check(), |r: &RetrieveResult| r.done)
                .await?;
        if status.status != RetrieveStatus::Succeeded {
            return Ok(status);
        }
        self.client.check_retrieve_status(&self.id, true).await
    }

    /// Wait for the retrieve and stream its archive in 64 KiB chunks.
    pub fn stream(&self) -> ArchiveStream {
        self.stream_with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    pub fn stream_with_chunk_size(&self, chunk_size: usize) -> ArchiveStream {
        let chunk_size = chunk_size.max(1);
        stream::unfold(StreamState::Pending(self.clone()), move |state| async move {
            match state {
                StreamState::Pending(job) => {
                    match job.complete().await.and_then(RetrieveResult::into_archive) {
                        Ok(archive) => {
                            debug!(retrieve_id = %job.id, bytes = archive.len(), "Streaming archive");
                            next_chunk(archive, chunk_size)
                        }
                        Err(err) => Some((Err(err), StreamState::Done)),
                    }
                }
                StreamState::Streaming(rest) => next_chunk(rest, chunk_size),
                StreamState::Done => None,
            }
        })
        .boxed()
    }

    /// Drain the archive stream into `writer`. Returns the number of bytes
    /// written.
    pub async fn write_to<W>(&self, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let mut archive = self.stream();
        let mut written = 0u64;
        while let Some(chunk) = archive.next().await {
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;
        Ok(written)
    }
}

fn next_chunk(mut rest: Bytes, chunk_size: usize) -> Option<(Result<Bytes>, StreamState)> {
    if rest.is_empty() {
        return None;
    }
    let chunk = rest.split_to(chunk_size.min(rest.len()));
    Some((Ok(chunk), StreamState::Streaming(rest)))
}
