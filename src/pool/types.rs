use crate::connection::ConnectionFactory;
use crate::error::ImpalaError;
use crate::pool::manager::Shared;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Snapshot of pool bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStatus {
    /// Live connections, idle or borrowed
    pub size: usize,
    pub idle: usize,
    pub borrowed: usize,
    /// Callers waiting in `acquire`
    pub pending: usize,
}

/// Outcome of [`ConnectionPool::drain`](crate::pool::ConnectionPool::drain).
///
/// Both phases always run; each records its own failure.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrainReport {
    /// Waiting for borrowed connections to come back
    pub drain: Option<ImpalaError>,
    /// Closing idle connections
    pub clear: Option<ImpalaError>,
}

impl DrainReport {
    pub fn is_clean(&self) -> bool {
        self.drain.is_none() && self.clear.is_none()
    }
}

/// A borrowed connection.
///
/// Returned to the pool when dropped, so every exit path releases it.
/// Release failures are logged and never reach the holder.
pub struct PooledConnection<F: ConnectionFactory> {
    pub(crate) conn: Option<F::Connection>,
    pub(crate) shared: Arc<Shared<F>>,
}

impl<F: ConnectionFactory> PooledConnection<F> {
    /// Return the connection now, reporting failure.
    ///
    /// The result is informational; the connection is gone either way.
    pub fn release(mut self) -> Result<(), ImpalaError> {
        match self.conn.take() {
            Some(conn) => self.shared.release(conn),
            None => Ok(()),
        }
    }
}

impl<F: ConnectionFactory> Deref for PooledConnection<F> {
    type Target = F::Connection;

    fn deref(&self) -> &Self::Target {
        // Only `release` and `drop` take the connection, and both consume the guard.
        self.conn.as_ref().unwrap_or_else(|| unreachable!("connection already released"))
    }
}

impl<F: ConnectionFactory> DerefMut for PooledConnection<F> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn.as_mut().unwrap_or_else(|| unreachable!("connection already released"))
    }
}

impl<F: ConnectionFactory> Drop for PooledConnection<F> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = self.shared.release(conn) {
                log::info!("Impala connection release error: {e}");
            }
        }
    }
}
