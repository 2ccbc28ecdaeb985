use std::collections::HashSet;
use std::fmt;
use std::mem;

use log::debug;

use crate::admin::model::{CollectionEntity, DatabaseEntity, Entity, MutationResult, Stats};
use crate::client::api::{ApiError, EntityApi};
use crate::client::status::{LoadStatus, RequestId, Slot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Database,
    Collection,
}

impl EntityKind {
    pub const fn singular(self) -> &'static str {
        match self {
            EntityKind::Database => "database",
            EntityKind::Collection => "collection",
        }
    }

    pub const fn plural(self) -> &'static str {
        match self {
            EntityKind::Database => "databases",
            EntityKind::Collection => "collections",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.singular())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryFormat {
    #[default]
    Json,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: EntityKind,
    pub message: String,
}

impl Notification {
    fn no_results(kind: EntityKind, plural: bool) -> Self {
        let message = if plural {
            format!("No {} were returned from the api - please try again later", kind.plural())
        } else {
            format!("No {} was returned from the api - please try again later", kind.singular())
        };
        Self { kind, message }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    List(RequestId),
    Item(RequestId, String),
    Create(RequestId, String),
    Delete(RequestId, Vec<String>),
}

#[derive(Debug, Clone)]
pub enum Message<E> {
    LoadList,
    ListLoaded { request: RequestId, result: Result<Vec<E>, ApiError> },
    LoadItem(String),
    ItemLoaded { request: RequestId, result: Result<E, ApiError> },
    Create(String),
    Created { request: RequestId, result: Result<E, ApiError> },
    Delete(Vec<String>),
    Deleted { request: RequestId, result: Result<Vec<MutationResult>, ApiError> },
    SetActive(String),
    ClearItem,
}

pub fn perform<E, A: EntityApi<E> + ?Sized>(api: &A, request: Request) -> Message<E> {
    match request {
        Request::List(request) => Message::ListLoaded { request, result: api.fetch_list() },
        Request::Item(request, name) => {
            Message::ItemLoaded { request, result: api.fetch_item(&name) }
        }
        Request::Create(request, name) => Message::Created { request, result: api.create(&name) },
        Request::Delete(request, names) => Message::Deleted { request, result: api.delete(&names) },
    }
}

#[derive(Debug, Clone)]
pub struct EntityStore<E> {
    kind: EntityKind,
    items: Vec<E>,
    list: Slot,
    active: Option<String>,
    item: Option<E>,
    item_slot: Slot,
    create: Slot,
    delete: Slot,
    last_error: Option<ApiError>,
    format: EntryFormat,
    notifications: Vec<Notification>,
    next_request: u64,
}

pub type DatabaseStore = EntityStore<DatabaseEntity>;
pub type CollectionStore = EntityStore<CollectionEntity>;

impl<E: Entity> EntityStore<E> {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
            list: Slot::default(),
            active: None,
            item: None,
            item_slot: Slot::default(),
            create: Slot::default(),
            delete: Slot::default(),
            last_error: None,
            format: EntryFormat::default(),
            notifications: Vec::new(),
            next_request: 0,
        }
    }

    fn issue(&mut self) -> RequestId {
        self.next_request += 1;
        RequestId(self.next_request)
    }

    fn slot_for(&self, message: &Message<E>) -> Option<(&Slot, RequestId)> {
        match message {
            Message::ListLoaded { request, .. } => Some((&self.list, *request)),
            Message::ItemLoaded { request, .. } => Some((&self.item_slot, *request)),
            Message::Created { request, .. } => Some((&self.create, *request)),
            Message::Deleted { request, .. } => Some((&self.delete, *request)),
            _ => None,
        }
    }

    pub fn would_accept(&self, message: &Message<E>) -> bool {
        self.slot_for(message).is_none_or(|(slot, request)| slot.accepts(request))
    }

    pub fn update(&mut self, message: Message<E>) -> Option<Request> {
        if !self.would_accept(&message) {
            debug!("discarding stale {} response", self.kind);
            return None;
        }

        match message {
            Message::LoadList => {
                let request = self.issue();
                self.list.begin(request);
                Some(Request::List(request))
            }
            Message::ListLoaded { result, .. } => {
                match result {
                    Ok(items) => {
                        self.items = items;
                        self.list.finish(LoadStatus::Loaded);
                    }
                    Err(error) => {
                        self.items.clear();
                        self.list.finish(LoadStatus::Failed);
                        self.last_error = Some(error);
                        self.notifications.push(Notification::no_results(self.kind, true));
                    }
                }
                None
            }
            Message::LoadItem(name) => {
                let request = self.issue();
                self.item = None;
                self.active = Some(name.clone());
                self.item_slot.begin(request);
                Some(Request::Item(request, name))
            }
            Message::ItemLoaded { result, .. } => {
                match result {
                    Ok(item) => {
                        self.item = Some(item);
                        self.item_slot.finish(LoadStatus::Loaded);
                    }
                    Err(error) => {
                        self.item = None;
                        self.item_slot.finish(LoadStatus::Failed);
                        self.last_error = Some(error);
                        self.notifications.push(Notification::no_results(self.kind, false));
                    }
                }
                None
            }
            Message::Create(name) => {
                let request = self.issue();
                self.create.begin(request);
                Some(Request::Create(request, name))
            }
            Message::Created { result, .. } => {
                match result {
                    Ok(entity) => {
                        self.items.push(entity);
                        self.create.finish(LoadStatus::Loaded);
                    }
                    Err(error) => {
                        self.create.finish(LoadStatus::Failed);
                        self.last_error = Some(error);
                    }
                }
                None
            }
            Message::Delete(names) => {
                let request = self.issue();
                self.delete.begin(request);
                Some(Request::Delete(request, names))
            }
            Message::Deleted { result, .. } => {
                match result {
                    Ok(results) => {
                        self.remove_dropped(&results);
                        self.delete.finish(LoadStatus::Loaded);
                    }
                    Err(error) => {
                        self.delete.finish(LoadStatus::Failed);
                        self.last_error = Some(error);
                    }
                }
                None
            }
            Message::SetActive(name) => {
                self.active = Some(name);
                None
            }
            Message::ClearItem => {
                self.item = None;
                self.item_slot.settle(LoadStatus::Idle);
                None
            }
        }
    }

    pub fn dispatch<A: EntityApi<E> + ?Sized>(&mut self, api: &A, message: Message<E>) {
        let mut next = Some(message);
        while let Some(message) = next.take() {
            next = self.update(message).map(|request| perform(api, request));
        }
    }

    fn remove_dropped(&mut self, results: &[MutationResult]) {
        let dropped: HashSet<&str> = results
            .iter()
            .filter(|result| result.is_success())
            .map(|result| result.name.as_str())
            .collect();

        self.items.retain(|entity| !dropped.contains(entity.name()));

        if self.active.as_deref().is_some_and(|name| dropped.contains(name)) {
            self.active = None;
            self.item = None;
            self.item_slot.settle(LoadStatus::Idle);
        }
    }

    pub fn replace_items(&mut self, items: Vec<E>) {
        self.items = items;
        self.list.settle(LoadStatus::Loaded);
    }

    pub fn update_active_item(&mut self, edit: impl FnOnce(&mut E)) {
        if self.item_slot.status() == LoadStatus::Loaded {
            if let Some(item) = self.item.as_mut() {
                edit(item);
            }
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn items(&self) -> &[E] {
        &self.items
    }

    pub fn list_status(&self) -> LoadStatus {
        self.list.status()
    }

    pub fn item_status(&self) -> LoadStatus {
        self.item_slot.status()
    }

    pub fn create_status(&self) -> LoadStatus {
        self.create.status()
    }

    pub fn delete_status(&self) -> LoadStatus {
        self.delete.status()
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_item(&self) -> Option<&E> {
        match self.item_slot.status() {
            LoadStatus::Loaded => self.item.as_ref(),
            _ => None,
        }
    }

    pub fn display_item(&self, id: usize) -> Option<&E> {
        let listed = self.items.iter().find(|entity| entity.id() == Some(id));
        match (self.active_item(), listed) {
            (Some(active), Some(listed)) if active.name() != listed.name() => Some(listed),
            (Some(active), _) => Some(active),
            (None, listed) => listed,
        }
    }

    pub fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        mem::take(&mut self.notifications)
    }
}

impl EntityStore<DatabaseEntity> {
    pub fn databases() -> Self {
        Self::new(EntityKind::Database)
    }

    pub fn stats(&self) -> Option<&Stats> {
        self.active_item().map(|database| &database.stats)
    }
}

impl EntityStore<CollectionEntity> {
    pub fn collections() -> Self {
        Self::new(EntityKind::Collection)
    }

    pub fn format(&self) -> EntryFormat {
        self.format
    }

    pub fn set_format(&mut self, format: EntryFormat) {
        self.format = format;
    }
}
