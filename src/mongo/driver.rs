use std::fmt;

use mongodb::bson::{Bson, Document, doc};
use mongodb::sync::Client;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    Connection(String),
    Operation(String),
}

impl DriverError {
    pub fn message(&self) -> &str {
        match self {
            DriverError::Connection(message) | DriverError::Operation(message) => message,
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::Connection(message) => write!(f, "connection error: {}", message),
            DriverError::Operation(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for DriverError {}

impl From<mongodb::error::Error> for DriverError {
    fn from(error: mongodb::error::Error) -> Self {
        DriverError::Operation(error.to_string())
    }
}

pub trait AdminDriver {
    fn list_databases(&self) -> Result<Vec<String>, DriverError>;

    fn stats_for(&self, database: &str) -> Result<Document, DriverError>;

    fn list_collections(&self, database: &str) -> Result<Vec<String>, DriverError>;

    fn find_documents(&self, database: &str, collection: &str)
    -> Result<Vec<Document>, DriverError>;

    fn create_collection(&self, database: &str, collection: &str) -> Result<(), DriverError>;

    /// A database only exists on the server once it holds a collection.
    fn create_bootstrap(&self, database: &str, placeholder: &str) -> Result<(), DriverError> {
        self.create_collection(database, placeholder)
    }

    fn drop_database(&self, database: &str) -> Result<Document, DriverError>;

    fn drop_collection(&self, database: &str, collection: &str) -> Result<Document, DriverError>;
}

pub trait DriverFactory: Send + Sync {
    fn connect(&self) -> Result<Box<dyn AdminDriver + Send>, DriverError>;
}

#[derive(Debug, Clone)]
pub struct MongoDriver {
    client: Client,
}

impl MongoDriver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl AdminDriver for MongoDriver {
    fn list_databases(&self) -> Result<Vec<String>, DriverError> {
        Ok(self.client.list_database_names().run()?)
    }

    fn stats_for(&self, database: &str) -> Result<Document, DriverError> {
        Ok(self.client.database(database).run_command(doc! { "dbStats": 1 }).run()?)
    }

    fn list_collections(&self, database: &str) -> Result<Vec<String>, DriverError> {
        Ok(self.client.database(database).list_collection_names().run()?)
    }

    fn find_documents(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<Vec<Document>, DriverError> {
        let cursor =
            self.client.database(database).collection::<Document>(collection).find(doc! {}).run()?;

        let mut documents = Vec::new();
        for result in cursor {
            documents.push(result?);
        }
        Ok(documents)
    }

    fn create_collection(&self, database: &str, collection: &str) -> Result<(), DriverError> {
        self.client.database(database).create_collection(collection).run()?;
        Ok(())
    }

    fn drop_database(&self, database: &str) -> Result<Document, DriverError> {
        Ok(self.client.database(database).run_command(doc! { "dropDatabase": 1 }).run()?)
    }

    fn drop_collection(&self, database: &str, collection: &str) -> Result<Document, DriverError> {
        let reply =
            self.client.database(database).run_command(doc! { "drop": collection }).run()?;
        Ok(collection_drop_ack(database, reply))
    }
}

fn collection_drop_ack(database: &str, mut reply: Document) -> Document {
    if reply.contains_key("dropped") {
        return reply;
    }

    let prefix = format!("{database}.");
    let dropped = reply
        .get_str("ns")
        .ok()
        .and_then(|ns| ns.strip_prefix(prefix.as_str()))
        .map(str::to_owned);

    if let Some(name) = dropped {
        reply.insert("dropped", Bson::String(name));
    }
    reply
}
