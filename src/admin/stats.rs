use log::warn;

use crate::admin::model::{Stats, stats_from_document};
use crate::mongo::driver::AdminDriver;

pub fn fetch_stats(driver: &dyn AdminDriver, database: &str) -> Stats {
    match driver.stats_for(database) {
        Ok(document) => stats_from_document(document),
        Err(error) => {
            warn!("dbStats failed for {database}: {error}");
            Stats::new()
        }
    }
}
