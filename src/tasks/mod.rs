pub mod expirecases;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use log::{error, info};

/// A named background task run on a fixed interval
pub struct Task {
    pub name: &'static str,
    pub description: &'static str,
    pub enabled: bool,
    pub duration: std::time::Duration,
    pub run: Box<
        dyn Send + Sync + for<'a> Fn(&'a sqlx::SqlitePool) -> BoxFuture<'a, Result<(), crate::Error>>,
    >,
}

pub fn tasks() -> Vec<Task> {
    vec![Task {
        name: "expire_cases",
        description: "Closing temporary cases whose expiry has passed",
        enabled: true,
        duration: std::time::Duration::from_secs(60),
        run: Box::new(move |pool| crate::tasks::expirecases::expire_cases(pool).boxed()),
    }]
}

/// Spawns one interval loop per enabled task. Task failures are logged
/// and the loop keeps going.
pub async fn start(pool: sqlx::SqlitePool) {
    for task in tasks() {
        if !task.enabled {
            continue;
        }

        let pool = pool.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(task.duration);

            loop {
                interval.tick().await;

                info!("TASK: {} ({})", task.name, task.description);

                if let Err(e) = (task.run)(&pool).await {
                    error!("Error in task {}: {:?}", task.name, e);
                }
            }
        });
    }
}
