//! Bounded connection pool.
//!
//! Capacity is a counting semaphore with `max` permits; every borrowed
//! connection holds one. Idle connections hold none, so a freed permit can be
//! served by an idle connection or by opening a new one without exceeding
//! `max` live connections.
//!
//! Bookkeeping lives behind one mutex that is never held across a driver
//! call, so state transitions are atomic with respect to coroutine
//! suspension.

use crate::config::{ConnectionConfig, PoolConfig};
use crate::connection::{self, ConnectionFactory, ImpalaConnection};
use crate::error::ImpalaError;
use crate::pool::types::{DrainReport, PoolStatus, PooledConnection};
use crate::pool::worker;
use may::sync::{Mutex, MutexGuard, Semphore};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

struct IdleConnection<C> {
    conn: C,
    idle_since: Instant,
}

struct PoolState<C> {
    idle: VecDeque<IdleConnection<C>>,
    /// Idle plus borrowed
    size: usize,
    borrowed: usize,
    closed: bool,
}

pub(crate) struct Shared<F: ConnectionFactory> {
    factory: F,
    connection_config: ConnectionConfig,
    config: PoolConfig,
    permits: Semphore,
    pending: AtomicUsize,
    state: Mutex<PoolState<F::Connection>>,
}

/// Pool of engine connections.
///
/// Construct once at startup, share by cloning (clones are handles to the
/// same pool), and call [`drain`](Self::drain) once at shutdown.
pub struct ConnectionPool<F: ConnectionFactory> {
    shared: Arc<Shared<F>>,
}

impl<F: ConnectionFactory> Clone for ConnectionPool<F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<F: ConnectionFactory> ConnectionPool<F> {
    /// Create the pool, open `min` connections and start the eviction worker.
    pub fn new(
        factory: F,
        connection_config: ConnectionConfig,
        config: PoolConfig,
    ) -> Result<Self, ImpalaError> {
        config.validate()?;
        connection::validate_connection_config(&connection_config)?;

        let shared = Arc::new(Shared {
            permits: Semphore::new(config.max),
            pending: AtomicUsize::new(0),
            state: Mutex::new(PoolState {
                idle: VecDeque::new(),
                size: 0,
                borrowed: 0,
                closed: false,
            }),
            factory,
            connection_config,
            config,
        });

        shared.ensure_minimum();
        if shared.config.eviction_run_interval_ms > 0 {
            worker::spawn_evictor(Arc::downgrade(&shared), shared.config.eviction_run_interval());
        }

        Ok(Self { shared })
    }

    /// Borrow a connection, waiting up to the acquire timeout.
    ///
    /// Prefers the longest-idle connection and opens a new one when none is
    /// idle. Failures are logged at warn.
    pub fn acquire(&self) -> Result<PooledConnection<F>, ImpalaError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::acquire_connection_span().entered();

        self.shared.acquire().map_err(|e| {
            log::warn!("Impala pool acquire error: {e}");
            e
        })
    }

    /// Return a connection. Never fails from the caller's point of view.
    pub fn release(&self, conn: PooledConnection<F>) {
        if let Err(e) = conn.release() {
            log::info!("Impala pool release error: {e}");
        }
    }

    /// Stop issuing connections, wait for borrowed ones, then close idle ones.
    ///
    /// Both phases are attempted even if the first fails; failures are
    /// logged and reported, never returned as errors.
    pub fn drain(&self) -> DrainReport {
        let report = DrainReport {
            drain: self.shared.wait_for_borrowed().err(),
            clear: self.shared.clear().err(),
        };
        if let Some(e) = &report.drain {
            log::info!("Impala pool drain error: {e}");
        }
        if let Some(e) = &report.clear {
            log::info!("Impala pool clear error: {e}");
        }
        report
    }

    pub fn status(&self) -> PoolStatus {
        self.shared.status()
    }

    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }

    /// Run one eviction pass now. Returns the number of connections closed.
    pub fn evict_idle(&self) -> usize {
        self.shared.evict_idle(Instant::now())
    }

    /// Open connections until `min` exist. The evictor also does this after
    /// every sweep.
    pub fn ensure_minimum(&self) {
        self.shared.ensure_minimum();
    }
}

impl<F: ConnectionFactory> Shared<F> {
    fn lock(&self) -> Result<MutexGuard<'_, PoolState<F::Connection>>, ImpalaError> {
        self.state
            .lock()
            .map_err(|_| ImpalaError::ReleaseFailed("pool state lock poisoned".to_string()))
    }

    fn acquire(self: &Arc<Self>) -> Result<PooledConnection<F>, ImpalaError> {
        if self.is_closed() {
            return Err(ImpalaError::PoolClosed);
        }

        let timeout = self.config.acquire_timeout();
        let start = Instant::now();
        self.pending.fetch_add(1, Ordering::SeqCst);
        let got_permit = self.permits.wait_timeout(timeout);
        self.pending.fetch_sub(1, Ordering::SeqCst);

        #[cfg(feature = "metrics")]
        METRICS.observe_acquire_wait(start.elapsed());

        if !got_permit {
            #[cfg(feature = "metrics")]
            METRICS.record_acquire_timeout();
            log::debug!("Acquire gave up after {:?}", start.elapsed());
            return Err(ImpalaError::AcquireTimeout(timeout));
        }

        let reused = {
            let mut state = match self.lock() {
                Ok(state) => state,
                Err(e) => {
                    self.permits.post();
                    return Err(e);
                }
            };
            if state.closed {
                drop(state);
                self.permits.post();
                return Err(ImpalaError::PoolClosed);
            }
            state.borrowed += 1;
            match state.idle.pop_front() {
                Some(idle) => Some(idle.conn),
                None => {
                    // Reserve the slot before connecting so concurrent callers see it
                    state.size += 1;
                    None
                }
            }
        };

        let conn = match reused {
            Some(conn) => conn,
            None => match connection::connect(&self.factory, &self.connection_config) {
                Ok(conn) => conn,
                Err(e) => {
                    if let Ok(mut state) = self.lock() {
                        state.size -= 1;
                        state.borrowed -= 1;
                    }
                    self.permits.post();
                    return Err(e);
                }
            },
        };

        Ok(PooledConnection {
            conn: Some(conn),
            shared: Arc::clone(self),
        })
    }

    pub(crate) fn release(&self, conn: F::Connection) -> Result<(), ImpalaError> {
        let result = match self.lock() {
            Ok(mut state) => {
                state.borrowed -= 1;
                if state.closed {
                    state.size -= 1;
                    drop(state);
                    destroy(conn);
                } else {
                    state.idle.push_back(IdleConnection {
                        conn,
                        idle_since: Instant::now(),
                    });
                }
                Ok(())
            }
            Err(e) => Err(e),
        };
        self.permits.post();
        result
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.lock().map(|state| state.closed).unwrap_or(true)
    }

    fn status(&self) -> PoolStatus {
        let pending = self.pending.load(Ordering::SeqCst);
        match self.lock() {
            Ok(state) => PoolStatus {
                size: state.size,
                idle: state.idle.len(),
                borrowed: state.borrowed,
                pending,
            },
            Err(_) => PoolStatus {
                pending,
                ..PoolStatus::default()
            },
        }
    }

    fn wait_for_borrowed(&self) -> Result<(), ImpalaError> {
        let drain_err = |e: ImpalaError| ImpalaError::DrainPartialFailure(e.to_string());
        {
            let mut state = self.lock().map_err(drain_err)?;
            state.closed = true;
        }

        let timeout = self.config.drain_timeout();
        let start = Instant::now();
        loop {
            let borrowed = self.lock().map_err(drain_err)?.borrowed;
            if borrowed == 0 {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(ImpalaError::DrainPartialFailure(format!(
                    "{borrowed} connection(s) still borrowed after {}ms",
                    timeout.as_millis()
                )));
            }
            may::coroutine::sleep(DRAIN_POLL_INTERVAL);
        }
    }

    fn clear(&self) -> Result<(), ImpalaError> {
        let idle: Vec<F::Connection> = {
            let mut state = self
                .lock()
                .map_err(|e| ImpalaError::DrainPartialFailure(e.to_string()))?;
            let drained: Vec<_> = state.idle.drain(..).map(|idle| idle.conn).collect();
            state.size -= drained.len();
            drained
        };

        let failures: Vec<String> = idle
            .into_iter()
            .filter_map(|mut conn| conn.close().err().map(|e| e.to_string()))
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ImpalaError::DrainPartialFailure(format!(
                "{} connection(s) failed to close: {}",
                failures.len(),
                failures.join("; ")
            )))
        }
    }

    /// Close idle connections past their idle window.
    ///
    /// At most `evictions_per_run` of the longest-idle connections are
    /// examined. A connection idle beyond `soft_idle_timeout` goes only while
    /// more than `min` stay idle; beyond `idle_timeout` it always goes.
    pub(crate) fn evict_idle(&self, now: Instant) -> usize {
        let soft = self.config.soft_idle_timeout();
        let hard = self.config.idle_timeout();

        let evicted: Vec<F::Connection> = {
            let Ok(mut state) = self.lock() else {
                return 0;
            };
            if state.closed {
                return 0;
            }
            let mut kept = VecDeque::with_capacity(state.idle.len());
            let mut evicted = Vec::new();
            let mut examined = 0;
            while let Some(idle) = state.idle.pop_front() {
                if examined >= self.config.evictions_per_run {
                    kept.push_back(idle);
                    continue;
                }
                examined += 1;
                let idle_for = now.saturating_duration_since(idle.idle_since);
                let available = state.idle.len() + kept.len() + 1;
                let soft_evict = soft > Duration::ZERO && idle_for > soft && self.config.min < available;
                if soft_evict || idle_for > hard {
                    evicted.push(idle.conn);
                } else {
                    kept.push_back(idle);
                }
            }
            state.idle = kept;
            state.size -= evicted.len();
            evicted
        };

        let count = evicted.len();
        evicted.into_iter().for_each(destroy);
        if count > 0 {
            log::info!("Impala pool evicted {count} idle connection(s)");
        }
        count
    }

    /// Open connections until `min` exist.
    ///
    /// Each refill holds a permit while it connects, exactly like an
    /// acquirer, so refills and acquires together never exceed `max` live
    /// connections. Stops early when no permit is free.
    pub(crate) fn ensure_minimum(&self) {
        loop {
            if !self.permits.try_wait() {
                return;
            }
            {
                let Ok(mut state) = self.lock() else {
                    self.permits.post();
                    return;
                };
                if state.closed || state.size >= self.config.min {
                    drop(state);
                    self.permits.post();
                    return;
                }
                state.size += 1;
            }
            let created = connection::connect(&self.factory, &self.connection_config);
            let parked = match created {
                Ok(conn) => match self.lock() {
                    Ok(mut state) if state.closed => {
                        state.size -= 1;
                        drop(state);
                        destroy(conn);
                        false
                    }
                    Ok(mut state) => {
                        state.idle.push_back(IdleConnection {
                            conn,
                            idle_since: Instant::now(),
                        });
                        true
                    }
                    Err(_) => {
                        destroy(conn);
                        false
                    }
                },
                Err(_) => {
                    if let Ok(mut state) = self.lock() {
                        state.size -= 1;
                    }
                    false
                }
            };
            self.permits.post();
            if !parked {
                return;
            }
        }
    }
}

fn destroy<C: ImpalaConnection>(mut conn: C) {
    if let Err(e) = conn.close() {
        log::warn!("Impala connection close error: {e}");
    }
}
