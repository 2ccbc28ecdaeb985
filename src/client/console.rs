use log::debug;

use crate::admin::model::{CollectionEntity, DatabaseEntity};
use crate::client::api::{CollectionApi, DatabaseApi, Exchange};
use crate::client::store::{
    CollectionStore, DatabaseStore, Message, Notification, Request, perform,
};

pub const DEFAULT_DATABASE: &str = "admin";

#[derive(Debug, Clone)]
pub enum ConsoleMessage {
    Database(Message<DatabaseEntity>),
    Collection(Message<CollectionEntity>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleRequest {
    Database(Request),
    Collection { database: String, request: Request },
}

#[derive(Debug, Clone)]
pub struct Console {
    pub databases: DatabaseStore,
    pub collections: CollectionStore,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    pub fn new() -> Self {
        Self { databases: DatabaseStore::databases(), collections: CollectionStore::collections() }
    }

    pub fn current_database(&self) -> &str {
        self.databases.active_name().unwrap_or(DEFAULT_DATABASE)
    }

    pub fn update(&mut self, message: ConsoleMessage) -> Option<ConsoleRequest> {
        match message {
            ConsoleMessage::Database(message) => self.update_databases(message),
            ConsoleMessage::Collection(message) => {
                let database = self.current_database().to_string();
                self.update_collections(message)
                    .map(|request| ConsoleRequest::Collection { database, request })
            }
        }
    }

    fn update_databases(&mut self, message: Message<DatabaseEntity>) -> Option<ConsoleRequest> {
        let switching = match &message {
            Message::LoadItem(name) => self.databases.active_name() != Some(name.as_str()),
            _ => false,
        };
        let cascade = match &message {
            Message::ItemLoaded { result: Ok(database), .. }
                if self.databases.would_accept(&message) =>
            {
                Some(database.collections.clone())
            }
            _ => None,
        };
        let dropping_current = match &message {
            Message::Deleted { result: Ok(results), .. } if self.databases.would_accept(&message) => {
                self.databases.active_name().is_some_and(|active| {
                    results.iter().any(|result| result.is_success() && result.name == active)
                })
            }
            _ => false,
        };

        let request = self.databases.update(message);

        if switching {
            self.collections.update(Message::ClearItem);
        }
        if let Some(collections) = cascade {
            debug!("showing {} collections of {}", collections.len(), self.current_database());
            self.collections.replace_items(collections);
        }
        if dropping_current {
            self.collections.replace_items(Vec::new());
            self.collections.update(Message::ClearItem);
        }
        request.map(ConsoleRequest::Database)
    }

    fn update_collections(&mut self, message: Message<CollectionEntity>) -> Option<Request> {
        if !self.collections.would_accept(&message) {
            return self.collections.update(message);
        }

        match &message {
            Message::Created { result: Ok(collection), .. } => {
                let summary = CollectionEntity::summary(collection.id, collection.name.clone());
                self.databases.update_active_item(|database| database.collections.push(summary));
            }
            Message::Deleted { result: Ok(results), .. } => {
                self.databases.update_active_item(|database| {
                    database.collections.retain(|collection| {
                        !results
                            .iter()
                            .any(|result| result.is_success() && result.name == collection.name)
                    });
                });
            }
            _ => {}
        }
        self.collections.update(message)
    }

    pub fn perform<X: Exchange + Clone>(exchange: &X, request: ConsoleRequest) -> ConsoleMessage {
        match request {
            ConsoleRequest::Database(request) => {
                ConsoleMessage::Database(perform(&DatabaseApi::new(exchange.clone()), request))
            }
            ConsoleRequest::Collection { database, request } => {
                let api = CollectionApi::new(exchange.clone(), database);
                ConsoleMessage::Collection(perform(&api, request))
            }
        }
    }

    pub fn dispatch<X: Exchange + Clone>(&mut self, exchange: &X, message: ConsoleMessage) {
        let mut next = Some(message);
        while let Some(message) = next.take() {
            next = self.update(message).map(|request| Self::perform(exchange, request));
        }
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        let mut notifications = self.databases.take_notifications();
        notifications.extend(self.collections.take_notifications());
        notifications
    }
}
