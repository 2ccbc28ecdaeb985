#![cfg(test)]

use std::sync::{Arc, Mutex};

use mongodb::bson::{Document, doc};

use crate::mongo::driver::{AdminDriver, DriverError, DriverFactory};

#[derive(Debug, Clone)]
pub struct FakeCollection {
    pub name: String,
    pub documents: Result<Vec<Document>, String>,
}

#[derive(Debug, Clone)]
pub struct FakeDatabase {
    pub name: String,
    pub stats: Result<Document, String>,
    pub collections: Result<Vec<FakeCollection>, String>,
    pub drop_ack: Option<Result<Document, String>>,
}

impl FakeDatabase {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            stats: Ok(doc! { "db": name, "collections": 0, "ok": 1.0 }),
            collections: Ok(Vec::new()),
            drop_ack: None,
        }
    }

    pub fn with_collection(mut self, name: &str, documents: Vec<Document>) -> Self {
        if let Ok(collections) = self.collections.as_mut() {
            collections.push(FakeCollection { name: name.to_string(), documents: Ok(documents) });
        }
        self
    }

    pub fn with_broken_collection(mut self, name: &str) -> Self {
        if let Ok(collections) = self.collections.as_mut() {
            collections.push(FakeCollection {
                name: name.to_string(),
                documents: Err("cursor killed".to_string()),
            });
        }
        self
    }

    pub fn with_failing_stats(mut self) -> Self {
        self.stats = Err("not authorized on this database".to_string());
        self
    }

    pub fn with_failing_collections(mut self) -> Self {
        self.collections = Err("listCollections denied".to_string());
        self
    }

    pub fn with_drop_ack(mut self, ack: Result<Document, String>) -> Self {
        self.drop_ack = Some(ack);
        self
    }
}

#[derive(Debug, Default)]
struct FakeState {
    databases: Vec<FakeDatabase>,
    listing_error: Option<String>,
    calls: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeDriver {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDriver {
    pub fn new(databases: Vec<FakeDatabase>) -> Self {
        let state = FakeState { databases, ..FakeState::default() };
        Self { state: Arc::new(Mutex::new(state)) }
    }

    pub fn failing_listing(message: &str) -> Self {
        let driver = Self::default();
        driver.state.lock().unwrap().listing_error = Some(message.to_string());
        driver
    }

    pub fn database_names(&self) -> Vec<String> {
        self.state.lock().unwrap().databases.iter().map(|db| db.name.clone()).collect()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn with_database<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut FakeDatabase) -> Result<T, DriverError>,
    ) -> Result<T, DriverError> {
        let mut state = self.state.lock().unwrap();
        match state.databases.iter_mut().find(|db| db.name == name) {
            Some(database) => f(database),
            None => Err(DriverError::Operation(format!("database {name} not found"))),
        }
    }
}

fn operation(message: &str) -> DriverError {
    DriverError::Operation(message.to_string())
}

impl AdminDriver for FakeDriver {
    fn list_databases(&self) -> Result<Vec<String>, DriverError> {
        self.record("listDatabases".to_string());
        let state = self.state.lock().unwrap();
        if let Some(message) = &state.listing_error {
            return Err(operation(message));
        }
        Ok(state.databases.iter().map(|db| db.name.clone()).collect())
    }

    fn stats_for(&self, database: &str) -> Result<Document, DriverError> {
        self.record(format!("dbStats {database}"));
        self.with_database(database, |db| db.stats.clone().map_err(|err| operation(&err)))
    }

    fn list_collections(&self, database: &str) -> Result<Vec<String>, DriverError> {
        self.record(format!("listCollections {database}"));
        self.with_database(database, |db| match &db.collections {
            Ok(collections) => Ok(collections.iter().map(|c| c.name.clone()).collect()),
            Err(err) => Err(operation(err)),
        })
    }

    fn find_documents(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<Vec<Document>, DriverError> {
        self.record(format!("find {database}.{collection}"));
        self.with_database(database, |db| {
            let collections = db.collections.as_ref().map_err(|err| operation(err))?;
            match collections.iter().find(|c| c.name == collection) {
                Some(found) => found.documents.clone().map_err(|err| operation(&err)),
                None => Ok(Vec::new()),
            }
        })
    }

    fn create_collection(&self, database: &str, collection: &str) -> Result<(), DriverError> {
        self.record(format!("create {database}.{collection}"));
        let mut state = self.state.lock().unwrap();
        if !state.databases.iter().any(|db| db.name == database) {
            state.databases.push(FakeDatabase::new(database));
        }
        let db = state
            .databases
            .iter_mut()
            .find(|db| db.name == database)
            .ok_or_else(|| operation("database vanished"))?;
        let collections = db.collections.as_mut().map_err(|err| operation(err))?;
        if collections.iter().any(|c| c.name == collection) {
            return Err(operation(&format!("Collection {database}.{collection} already exists.")));
        }
        collections.push(FakeCollection { name: collection.to_string(), documents: Ok(Vec::new()) });
        Ok(())
    }

    fn drop_database(&self, database: &str) -> Result<Document, DriverError> {
        self.record(format!("dropDatabase {database}"));
        let mut state = self.state.lock().unwrap();
        let position = state.databases.iter().position(|db| db.name == database);
        let Some(position) = position else {
            return Ok(doc! { "ok": 1.0 });
        };

        match state.databases[position].drop_ack.clone() {
            Some(Ok(ack)) => Ok(ack),
            Some(Err(message)) => Err(operation(&message)),
            None => {
                state.databases.remove(position);
                Ok(doc! { "dropped": database, "ok": 1.0 })
            }
        }
    }

    fn drop_collection(&self, database: &str, collection: &str) -> Result<Document, DriverError> {
        self.record(format!("drop {database}.{collection}"));
        self.with_database(database, |db| {
            let collections = db.collections.as_mut().map_err(|err| operation(err))?;
            let position = collections
                .iter()
                .position(|c| c.name == collection)
                .ok_or_else(|| operation("ns not found"))?;
            collections.remove(position);
            Ok(doc! { "dropped": collection, "ok": 1.0 })
        })
    }
}

#[derive(Debug, Clone)]
pub struct FakeFactory {
    pub driver: Option<FakeDriver>,
}

impl FakeFactory {
    pub fn new(driver: FakeDriver) -> Self {
        Self { driver: Some(driver) }
    }

    pub fn unreachable() -> Self {
        Self { driver: None }
    }
}

impl DriverFactory for FakeFactory {
    fn connect(&self) -> Result<Box<dyn AdminDriver + Send>, DriverError> {
        match &self.driver {
            Some(driver) => Ok(Box::new(driver.clone())),
            None => Err(DriverError::Connection("server selection timeout".to_string())),
        }
    }
}
