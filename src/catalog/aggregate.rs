//! Cross-theater movie catalog
//!
//! Session lookups for every visible theater run concurrently, bounded by a
//! semaphore. Results are funnelled through a channel to a single consumer
//! and merged in theater order, so the output does not depend on which
//! request finished first.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, info, warn};
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::api::{GatewayError, Movie, Session, SessionDay, Theater};

use super::distance::theater_distance_km;
use super::service::SessionSource;

pub const DEFAULT_CONCURRENCY: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionAtTheater {
    pub session: Session,
    pub theater: Theater,
    pub distance_km: Option<f64>,
}

/// A movie merged across theaters; `movie.rooms` is always empty
#[derive(Debug, Clone, PartialEq)]
pub struct MovieAggregate {
    pub movie: Movie,
    pub sessions: Vec<SessionAtTheater>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieCatalog {
    pub movies: Vec<MovieAggregate>,
    /// Theaters whose lookup failed for a reason other than not-found
    pub failed: usize,
    /// Theaters with no programme for the day (not found or empty)
    pub ignored: usize,
}

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("no visible theaters selected")]
    NoTheaters,

    #[error("no sessions found in visible theaters on {date}")]
    NoSessions {
        date: String,
        failed: usize,
        ignored: usize,
    },

    #[error("operation cancelled")]
    Cancelled,
}

pub struct AggregateRequest {
    pub city_id: String,
    pub theaters: Vec<Theater>,
    pub date: NaiveDate,
    /// `(lat, lng)` of the user, when known
    pub origin: Option<(f64, f64)>,
    pub concurrency: usize,
}

struct TheaterResult {
    index: usize,
    result: Result<Vec<SessionDay>, GatewayError>,
}

pub async fn aggregate(
    source: Arc<dyn SessionSource>,
    request: AggregateRequest,
    cancel: &CancellationToken,
) -> Result<MovieCatalog, AggregateError> {
    if request.theaters.is_empty() {
        return Err(AggregateError::NoTheaters);
    }
    if cancel.is_cancelled() {
        return Err(AggregateError::Cancelled);
    }

    let concurrency = request.concurrency.max(1);
    info!(
        "Aggregating sessions across {} theaters (concurrency {})",
        request.theaters.len(),
        concurrency
    );

    let semaphore = Arc::new(Semaphore::new(concurrency));
    let (tx, mut rx) = mpsc::channel::<TheaterResult>(request.theaters.len());

    for (index, theater) in request.theaters.iter().enumerate() {
        let tx = tx.clone();
        let source = source.clone();
        let semaphore = semaphore.clone();
        let cancel = cancel.child_token();
        let city_id = request.city_id.clone();
        let theater_id = theater.id.clone();
        let date = request.date;

        tokio::spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => source.sessions(&city_id, &theater_id, date, &cancel).await,
                Err(_) => Err(GatewayError::Cancelled),
            };
            let _ = tx.send(TheaterResult { index, result }).await;
        });
    }
    drop(tx);

    let mut results: Vec<Option<Result<Vec<SessionDay>, GatewayError>>> =
        (0..request.theaters.len()).map(|_| None).collect();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AggregateError::Cancelled),
            received = rx.recv() => match received {
                Some(TheaterResult { index, result }) => results[index] = Some(result),
                None => break,
            },
        }
    }

    let catalog = merge(&request, results)?;
    if catalog.movies.is_empty() {
        return Err(AggregateError::NoSessions {
            date: request.date.format("%Y-%m-%d").to_string(),
            failed: catalog.failed,
            ignored: catalog.ignored,
        });
    }

    info!(
        "Aggregated {} movies ({} theaters failed, {} ignored)",
        catalog.movies.len(),
        catalog.failed,
        catalog.ignored
    );
    Ok(catalog)
}

fn merge(
    request: &AggregateRequest,
    results: Vec<Option<Result<Vec<SessionDay>, GatewayError>>>,
) -> Result<MovieCatalog, AggregateError> {
    let mut catalog = MovieCatalog::default();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for (theater, result) in request.theaters.iter().zip(results) {
        let days = match result {
            Some(Ok(days)) => days,
            Some(Err(e)) if e.is_cancelled() => return Err(AggregateError::Cancelled),
            Some(Err(e)) if e.is_not_found() => {
                debug!("No programme for theater {}: {}", theater.id, e);
                catalog.ignored += 1;
                continue;
            }
            Some(Err(e)) => {
                warn!("Session lookup failed for theater {}: {}", theater.id, e);
                catalog.failed += 1;
                continue;
            }
            None => {
                catalog.failed += 1;
                continue;
            }
        };

        let Some(day) = select_day(&days, request.date) else {
            catalog.ignored += 1;
            continue;
        };
        if day.movies.is_empty() {
            catalog.ignored += 1;
            continue;
        }

        let distance_km = theater_distance_km(theater, request.origin);
        for movie in &day.movies {
            let slot = *by_key.entry(movie.merge_key()).or_insert_with(|| {
                catalog.movies.push(MovieAggregate {
                    movie: Movie {
                        rooms: Vec::new(),
                        ..movie.clone()
                    },
                    sessions: Vec::new(),
                });
                catalog.movies.len() - 1
            });

            catalog.movies[slot]
                .sessions
                .extend(movie.sessions().into_iter().map(|session| SessionAtTheater {
                    session,
                    theater: theater.clone(),
                    distance_km,
                }));
        }
    }

    catalog
        .movies
        .sort_by_key(|aggregate| aggregate.movie.title.to_lowercase());
    Ok(catalog)
}

/// The day matching `date`, else the first day returned
pub fn select_day(days: &[SessionDay], date: NaiveDate) -> Option<&SessionDay> {
    let target = date.format("%Y-%m-%d").to_string();
    days.iter().find(|day| day.date == target).or_else(|| days.first())
}
