use std::fmt;

use log::{info, warn};

use crate::admin::aggregate::collection_summaries;
use crate::admin::model::{CollectionEntity, DatabaseEntity, MutationResult};
use crate::admin::stats::fetch_stats;
use crate::mongo::driver::{AdminDriver, DriverError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    InvalidName(String),
    Driver(DriverError),
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationError::InvalidName(message) => f.write_str(message),
            MutationError::Driver(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for MutationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MutationError::InvalidName(_) => None,
            MutationError::Driver(error) => Some(error),
        }
    }
}

impl From<DriverError> for MutationError {
    fn from(error: DriverError) -> Self {
        MutationError::Driver(error)
    }
}

fn require_name<'a>(kind: &str, name: &'a str) -> Result<&'a str, MutationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(MutationError::InvalidName(format!("{kind} name is required")));
    }
    Ok(trimmed)
}

pub fn create_database(
    driver: &dyn AdminDriver,
    name: &str,
    bootstrap_collection: &str,
) -> Result<DatabaseEntity, MutationError> {
    let name = require_name("database", name)?;
    driver.create_bootstrap(name, bootstrap_collection)?;
    info!("created database {name} with placeholder collection {bootstrap_collection}");

    let mut index = 0;
    let mut found = false;
    for listed in driver.list_databases()? {
        index += 1;
        found |= listed == name;
    }
    // one past the listing, never an ordinal the client already holds
    index += 1;

    if !found {
        warn!("database {name} was created but is not listed yet");
    }

    Ok(DatabaseEntity {
        id: Some(index),
        name: name.to_string(),
        stats: fetch_stats(driver, name),
        collections: collection_summaries(driver, name),
    })
}

pub fn drop_databases(driver: &dyn AdminDriver, names: &[String]) -> Vec<MutationResult> {
    names
        .iter()
        .filter(|name| !name.is_empty())
        .map(|name| match driver.drop_database(name) {
            Ok(ack) => log_result(MutationResult::from_ack(name, &ack)),
            Err(error) => {
                warn!("dropDatabase {name} failed: {error}");
                MutationResult::failed(name.as_str())
            }
        })
        .collect()
}

pub fn create_collection(
    driver: &dyn AdminDriver,
    database: &str,
    name: &str,
) -> Result<CollectionEntity, MutationError> {
    let database = require_name("database", database)?;
    let name = require_name("collection", name)?;
    driver.create_collection(database, name)?;
    info!("created collection {database}.{name}");

    let collections = driver.list_collections(database)?;
    let id = collections.iter().position(|listed| listed == name).unwrap_or(collections.len());
    Ok(CollectionEntity::summary(id, name))
}

pub fn drop_collections(
    driver: &dyn AdminDriver,
    database: &str,
    names: &[String],
) -> Vec<MutationResult> {
    names
        .iter()
        .filter(|name| !name.is_empty())
        .map(|name| match driver.drop_collection(database, name) {
            Ok(ack) => log_result(MutationResult::from_ack(name, &ack)),
            Err(error) => {
                warn!("drop {database}.{name} failed: {error}");
                MutationResult::failed(name.as_str())
            }
        })
        .collect()
}

fn log_result(result: MutationResult) -> MutationResult {
    info!("drop {}: {}", result.name, result.outcome);
    result
}
