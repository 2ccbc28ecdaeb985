use std::collections::HashSet;
use std::time::Duration;

use mongodb::options::ClientOptions;
use mongodb::sync::Client;

use crate::mongo::driver::{AdminDriver, DriverError, DriverFactory, MongoDriver};
use crate::settings::AppSettings;

#[derive(Debug, Clone)]
pub struct MongoDriverFactory {
    uri: String,
    server_selection_timeout: Option<Duration>,
}

impl MongoDriverFactory {
    pub fn new(uri: impl Into<String>, server_selection_timeout: Option<Duration>) -> Self {
        Self { uri: uri.into(), server_selection_timeout }
    }

    pub fn from_settings(settings: &AppSettings) -> Self {
        Self::new(settings.mongo_uri.trim(), settings.server_selection_timeout())
    }
}

impl DriverFactory for MongoDriverFactory {
    fn connect(&self) -> Result<Box<dyn AdminDriver + Send>, DriverError> {
        if self.uri.is_empty() {
            return Err(DriverError::Connection("no MongoDB URI configured".to_string()));
        }

        let mut options = ClientOptions::parse(self.uri.as_str())
            .run()
            .map_err(|err| DriverError::Connection(err.to_string()))?;
        if let Some(timeout) = self.server_selection_timeout {
            options.server_selection_timeout = Some(timeout);
        }
        options.app_name.get_or_insert_with(|| "oxide_mongo_admin".to_string());

        let client =
            Client::with_options(options).map_err(|err| DriverError::Connection(err.to_string()))?;
        Ok(Box::new(MongoDriver::new(client)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseFilters {
    pub include: String,
    pub exclude: String,
}

impl DatabaseFilters {
    pub fn new(include: impl Into<String>, exclude: impl Into<String>) -> Self {
        Self { include: include.into(), exclude: exclude.into() }
    }

    pub fn from_settings(settings: &AppSettings) -> Self {
        Self::new(settings.include_filter.clone(), settings.exclude_filter.clone())
    }

    pub fn apply(&self, databases: Vec<String>) -> Vec<String> {
        filter_databases(databases, &self.include, &self.exclude)
    }
}

fn filter_databases(
    mut databases: Vec<String>,
    include_filter: &str,
    exclude_filter: &str,
) -> Vec<String> {
    let include_items: HashSet<_> = filter_lines(include_filter).collect();
    if !include_items.is_empty() {
        databases.retain(|db| include_items.contains(db.as_str()));
        return databases;
    }

    let exclude_items: HashSet<_> = filter_lines(exclude_filter).collect();
    if !exclude_items.is_empty() {
        databases.retain(|db| !exclude_items.contains(db.as_str()));
    }

    databases
}

fn filter_lines(filter: &str) -> impl Iterator<Item = &str> {
    filter.lines().map(str::trim).filter(|line| !line.is_empty())
}
