use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    collections::{HashMap, VecDeque},
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::AppError;

/// How often idle client windows are dropped
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Request families that draw on separate budgets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    /// WebSocket upgrades; each one joins a room and receives full boards
    SocketUpgrade,
    /// Login, session lookup and sign-out
    Session,
    /// Avatar images, one per roster entry on the client
    Avatar,
    /// Everything else
    Api,
}

/// Budget of one route class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub requests: usize,
    pub window: Duration,
}

impl RouteClass {
    pub fn of(path: &str) -> Self {
        if path.starts_with("/api/game/board/size/") {
            RouteClass::SocketUpgrade
        } else if path.starts_with("/api/avatar/") {
            RouteClass::Avatar
        } else if path == "/api/session" || path == "/signout" {
            RouteClass::Session
        } else {
            RouteClass::Api
        }
    }

    pub fn quota(self) -> Quota {
        let (requests, window) = match self {
            RouteClass::SocketUpgrade => (10, Duration::from_secs(10)),
            RouteClass::Session => (20, Duration::from_secs(60)),
            RouteClass::Avatar => (100, Duration::from_secs(1)),
            RouteClass::Api => (30, Duration::from_secs(1)),
        };
        Quota { requests, window }
    }
}

#[derive(Debug)]
struct Windows {
    hits: HashMap<(IpAddr, RouteClass), VecDeque<Instant>>,
    last_prune: Instant,
}

/// Sliding-window request counter keyed by client address and route class
///
/// Owned by the application state, so every router instance counts on its
/// own. Timestamps come from the tokio clock.
#[derive(Debug)]
pub struct RateLimiter {
    windows: Mutex<Windows>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(Windows {
                hits: HashMap::new(),
                last_prune: Instant::now(),
            }),
        }
    }

    /// Count one request at `now`
    ///
    /// # Errors
    ///
    /// Returns how long until the oldest request in the window expires when
    /// the class budget for `ip` is spent. A refused request is not counted.
    pub async fn check(&self, ip: IpAddr, class: RouteClass, now: Instant) -> Result<(), Duration> {
        let quota = class.quota();
        let mut windows = self.windows.lock().await;

        if now.saturating_duration_since(windows.last_prune) >= PRUNE_INTERVAL {
            windows.prune(now);
        }

        let hits = windows.hits.entry((ip, class)).or_default();
        while hits
            .front()
            .is_some_and(|&at| now.saturating_duration_since(at) >= quota.window)
        {
            hits.pop_front();
        }

        if hits.len() >= quota.requests {
            let oldest = hits.front().copied().unwrap_or(now);
            return Err(quota.window.saturating_sub(now.saturating_duration_since(oldest)));
        }

        hits.push_back(now);
        Ok(())
    }

    /// Number of tracked (address, class) windows
    pub async fn tracked(&self) -> usize {
        self.windows.lock().await.hits.len()
    }
}

impl Windows {
    fn prune(&mut self, now: Instant) {
        self.hits.retain(|(_, class), hits| {
            hits.back()
                .is_some_and(|&at| now.saturating_duration_since(at) < class.quota().window)
        });
        self.last_prune = now;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Refuse requests over their class budget with 429 and `Retry-After`
///
/// Requests without connection info (in-process test servers) share the
/// unspecified address.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    let class = RouteClass::of(req.uri().path());

    if let Err(retry_after) = limiter.check(ip, class, Instant::now()).await {
        tracing::warn!("Rate limited {} on {:?}", ip, class);
        return AppError::RateLimited {
            retry_after_secs: retry_after.as_secs().max(1),
        }
        .into_response();
    }

    next.run(req).await
}
