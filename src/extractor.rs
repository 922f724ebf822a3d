//! Playlist track id extraction.
//!
//! Walks a playlist's track listing page by page through a
//! [`PlaylistSource`], skipping entries whose track was removed from the
//! catalog, and returns the ids in listing order. Throttling and network
//! failures are retried per page with bounded exponential backoff; every
//! other failure ends the extraction. Partial results are never returned.

use std::time::Duration;

use futures::future::join_all;
use rand::Rng;
use tokio::{sync::Semaphore, time::sleep};

use crate::{
    config::Settings,
    error::ExtractError,
    spotify::PlaylistSource,
    types::{PlaylistReference, PlaylistTracksPage, TrackIdSequence, TrackObject},
    warning,
};

/// Largest page the playlist tracks endpoint hands out.
pub const PAGE_LIMIT: u32 = 100;

/// Bounded exponential backoff for retryable failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per page, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Upper bound for computed delays.
    pub max_delay: Duration,
    /// Longest `Retry-After` wait honoured; longer hints are clamped to it.
    pub max_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            max_retry_after: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            max_retry_after: settings.max_retry_wait,
            ..Self::default()
        }
    }

    /// Delay before the next attempt after `failures` failed ones, without
    /// jitter. `None` means the error should not be retried.
    pub fn backoff(&self, failures: u32, err: &ExtractError) -> Option<Duration> {
        if !err.is_retryable() || failures >= self.max_attempts {
            return None;
        }

        if let ExtractError::RateLimited {
            retry_after: Some(hint),
        } = err
        {
            return Some((*hint).min(self.max_retry_after));
        }

        let factor = 2u32.saturating_pow(failures.saturating_sub(1));
        Some(self.base_delay.saturating_mul(factor).min(self.max_delay))
    }
}

/// Collects the ids of every track in a playlist.
///
/// Pages of [`PAGE_LIMIT`] entries are requested until the API reports no
/// further page. Entries without a track (removed or delisted) and local
/// files are counted in [`TrackIdSequence::skipped`] and left out of the
/// ids.
///
/// # Errors
///
/// - [`ExtractError::NotFound`] for an unknown owner or playlist
/// - [`ExtractError::Authorization`] when the session may not read it
/// - [`ExtractError::RateLimited`] / [`ExtractError::TransientNetwork`]
///   once retries for a page are exhausted
/// - [`ExtractError::MalformedResponse`] for a track without an id, or a
///   page that promises more entries but carries none
///
/// # Example
///
/// ```
/// let reference = PlaylistReference::new("spotify", "37i9dQZF1DX4UtSsGT1Sbe")?;
/// let ids = extract_track_ids(&session, &reference, &RetryPolicy::default()).await?;
/// ```
pub async fn extract_track_ids<S>(
    session: &S,
    reference: &PlaylistReference,
    policy: &RetryPolicy,
) -> Result<TrackIdSequence, ExtractError>
where
    S: PlaylistSource + ?Sized,
{
    let mut sequence = TrackIdSequence::default();
    let mut offset: u32 = 0;

    loop {
        let page = fetch_with_retry(session, reference, offset, policy).await?;
        sequence.pages += 1;

        if let Some(total) = page.total {
            let remaining = (total as usize).saturating_sub(sequence.len() + sequence.skipped);
            sequence.track_ids.reserve(remaining);
        }

        let received = page.items.len() as u32;
        for (position, item) in page.items.into_iter().enumerate() {
            match item.track {
                None | Some(TrackObject { is_local: true, .. }) => sequence.skipped += 1,
                Some(TrackObject { id: Some(id), .. }) if !id.is_empty() => {
                    sequence.track_ids.push(id)
                }
                Some(_) => {
                    return Err(ExtractError::MalformedResponse(format!(
                        "track without id at position {} of {}",
                        offset as usize + position,
                        reference
                    )));
                }
            }
        }

        match page.next {
            None => break,
            Some(_) if received == 0 => {
                return Err(ExtractError::MalformedResponse(format!(
                    "empty page at offset {} of {} announced a next page",
                    offset, reference
                )));
            }
            Some(_) => offset += received,
        }
    }

    Ok(sequence)
}

async fn fetch_with_retry<S>(
    session: &S,
    reference: &PlaylistReference,
    offset: u32,
    policy: &RetryPolicy,
) -> Result<PlaylistTracksPage, ExtractError>
where
    S: PlaylistSource + ?Sized,
{
    let mut failures = 0;

    loop {
        match session.fetch_page(reference, offset, PAGE_LIMIT).await {
            Ok(page) => return Ok(page),
            Err(err) => {
                failures += 1;
                let Some(delay) = policy.backoff(failures, &err) else {
                    return Err(err);
                };

                let delay = delay + jitter(delay);
                warning!(
                    "{} (attempt {}/{} for {}), retrying in {:.1}s",
                    err,
                    failures,
                    policy.max_attempts,
                    reference,
                    delay.as_secs_f64()
                );
                sleep(delay).await;
            }
        }
    }
}

// up to 10% on top of the delay
fn jitter(delay: Duration) -> Duration {
    let max_ms = (delay.as_millis() / 10) as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=max_ms))
}

/// Extracts several playlists with at most `concurrency` in flight.
///
/// Results come back in the order of `references`. Each extraction is
/// independent, a failing playlist does not affect the others.
pub async fn extract_many<S>(
    session: &S,
    references: &[PlaylistReference],
    policy: &RetryPolicy,
    concurrency: usize,
) -> Vec<Result<TrackIdSequence, ExtractError>>
where
    S: PlaylistSource + ?Sized,
{
    let semaphore = Semaphore::new(concurrency.max(1));

    let tasks: Vec<_> = references
        .iter()
        .map(|reference| {
            let semaphore = &semaphore;
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|e| ExtractError::Config(e.to_string()))?;
                extract_track_ids(session, reference, policy).await
            }
        })
        .collect();

    join_all(tasks).await
}
