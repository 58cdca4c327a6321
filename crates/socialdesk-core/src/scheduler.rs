//! Background worker that publishes scheduled posts when they fall due.
//!
//! Runs inside `sdesk serve` or standalone via `sdesk worker`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use socialdesk_types::error::PostError;
use socialdesk_types::id::PostId;
use socialdesk_types::post::PostStatus;

use crate::platform::publisher::SocialPublisher;
use crate::repository::account::AccountRepository;
use crate::repository::brand::BrandRepository;
use crate::repository::post::PostRepository;
use crate::service::publish::PublishService;

/// Outcome of one scheduler tick.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickReport {
    pub due: usize,
    pub published: usize,
    pub partial: usize,
    pub failed: usize,
    /// Posts another worker was already publishing.
    pub skipped: usize,
    pub errors: Vec<(PostId, String)>,
}

pub struct ScheduledPublisher<P, A, B, S>
where
    P: PostRepository,
    A: AccountRepository,
    B: BrandRepository,
    S: SocialPublisher,
{
    publish: Arc<PublishService<P, A, B, S>>,
    tick: Duration,
    batch_size: i64,
}

impl<P, A, B, S> ScheduledPublisher<P, A, B, S>
where
    P: PostRepository,
    A: AccountRepository,
    B: BrandRepository,
    S: SocialPublisher,
{
    pub fn new(publish: Arc<PublishService<P, A, B, S>>, tick: Duration, batch_size: i64) -> Self {
        Self {
            publish,
            tick: tick.max(Duration::from_secs(1)),
            batch_size: batch_size.max(1),
        }
    }

    /// Publish every post due at `now`, up to one batch.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<TickReport, PostError> {
        let due = self
            .publish
            .posts()
            .list_due(now, self.batch_size)
            .await
            .map_err(|e| PostError::StorageError(e.to_string()))?;

        let mut report = TickReport {
            due: due.len(),
            ..Default::default()
        };
        for post in due {
            match self.publish.publish_post(&post.id).await {
                Ok(done) => match done.status {
                    PostStatus::Published => report.published += 1,
                    PostStatus::PartiallyPublished => report.partial += 1,
                    _ => report.failed += 1,
                },
                Err(PostError::AlreadyPublishing) => report.skipped += 1,
                Err(e) => {
                    tracing::error!(post_id = %post.id, error = %e, "scheduled publish failed");
                    report.failed += 1;
                    report.errors.push((post.id, e.to_string()));
                }
            }
        }
        if report.due > 0 {
            tracing::info!(
                due = report.due,
                published = report.published,
                partial = report.partial,
                failed = report.failed,
                skipped = report.skipped,
                "scheduler tick"
            );
        }
        Ok(report)
    }

    /// Tick until `cancel` fires. Errors are logged and never stop the loop.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(tick_secs = self.tick.as_secs(), batch = self.batch_size, "scheduler started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = self.run_once(Utc::now()).await {
                        tracing::error!(error = %e, "scheduler tick failed");
                    }
                }
            }
        }
        tracing::info!("scheduler stopped");
    }
}
