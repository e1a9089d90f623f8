use crate::common::MovePath;
use crate::controller::Controller;
use crate::error::SearchError;
use crate::solver::Solver;

use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tokio::time;
use tracing::warn;

/// Run `solver` on the blocking pool and give up after `limit`.
///
/// On expiry the solver is stopped cooperatively and `DeadlineElapsed` is
/// returned without waiting for it; the solve drains in the background. On
/// success the solver is handed back so its statistics can be read.
pub async fn solve_within<C, S>(
    mut solver: S,
    controller: Arc<C>,
    limit: Duration,
) -> Result<(S, Option<MovePath<C::Move>>), SearchError>
where
    C: Controller + Send + Sync + 'static,
    S: Solver<C> + Send + 'static,
{
    let stop = solver.stop_handle();
    let search = task::spawn_blocking(move || {
        let path = solver.solve(controller.as_ref());
        (solver, path)
    });

    match time::timeout(limit, search).await {
        Ok(Ok(solved)) => Ok(solved),
        Ok(Err(err)) => Err(SearchError::Panicked(err.to_string())),
        Err(_) => {
            warn!("search exceeded {limit:?}, stopping it");
            stop.stop();
            Err(SearchError::DeadlineElapsed(limit))
        }
    }
}
