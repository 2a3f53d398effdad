use crate::connection::ConnectionFactory;
use crate::pool::manager::Shared;
use std::sync::Weak;
use std::time::{Duration, Instant};

/// Spawn the idle-eviction coroutine.
///
/// The worker holds only a weak handle and exits on the first tick after
/// the pool is dropped or drained.
pub(crate) fn spawn_evictor<F: ConnectionFactory>(pool: Weak<Shared<F>>, interval: Duration) {
    may::go!(move || run_evictor_loop(pool, interval));
}

fn run_evictor_loop<F: ConnectionFactory>(pool: Weak<Shared<F>>, interval: Duration) {
    loop {
        may::coroutine::sleep(interval);
        let Some(shared) = pool.upgrade() else {
            break;
        };
        if shared.is_closed() {
            break;
        }
        shared.evict_idle(Instant::now());
        shared.ensure_minimum();
    }
    log::debug!("Impala pool evictor stopped");
}
