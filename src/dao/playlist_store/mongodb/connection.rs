use std::time::Duration;

use mongodb::{Client, Database, bson::doc, error::Error as MongoError};
use tokio::time::sleep;
use tracing::debug;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
};

const PING_ATTEMPTS: u32 = 10;
const FIRST_PING_DELAY: Duration = Duration::from_millis(250);
const MAX_PING_DELAY: Duration = Duration::from_secs(5);

/// Delays between ping attempts, doubling up to [`MAX_PING_DELAY`].
fn ping_delays() -> impl Iterator<Item = Duration> {
    std::iter::successors(Some(FIRST_PING_DELAY), |delay| {
        Some((*delay * 2).min(MAX_PING_DELAY))
    })
}

/// Run the `ping` admin command once.
pub async fn ping(database: &Database) -> Result<(), MongoError> {
    database.run_command(doc! { "ping": 1 }).await.map(|_| ())
}

/// Open the configured database once the server answers a ping.
pub async fn open_database(config: &MongoConfig) -> MongoResult<Database> {
    let client = Client::with_options(config.options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(&config.database_name);

    let mut delays = ping_delays();
    let mut attempt = 1;
    loop {
        let Err(source) = ping(&database).await else {
            debug!(attempt, database = %config.database_name, "mongodb answered");
            return Ok(database);
        };
        if attempt >= PING_ATTEMPTS {
            return Err(MongoDaoError::InitialPing {
                attempts: attempt,
                source,
            });
        }
        let delay = delays.next().unwrap_or(MAX_PING_DELAY);
        debug!(attempt, ?delay, error = %source, "mongodb ping failed; retrying");
        sleep(delay).await;
        attempt += 1;
    }
}
