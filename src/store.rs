//! Generic document store actor.
//!
//! One tokio task per collection owns the documents and serves typed
//! CRUD, query, and live-subscription requests over mpsc/oneshot
//! channels. This is the process-local stand-in for the managed
//! document database: per-document writes are atomic because the actor
//! applies them one at a time, and every successful mutation pushes the
//! full matching result set to every registered subscriber.

use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// Trait a domain type must implement to live in a [`StoreActor`]
/// collection.
///
/// The lifecycle hooks run inside the actor, so their checks hold for
/// every writer: a rejected create never lands in the collection and a
/// rejected patch leaves the stored document untouched.
pub trait Document: Clone + Send + Sync + 'static {
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;
    type CreatePayload: Send + Sync + Debug;
    type Patch: Send + Sync + Debug;
    /// Live-query filter. Every subscriber and query carries one.
    type Filter: Clone + Send + Sync + Debug;
    /// Query results are sorted descending by this key.
    type SortKey: Ord;
    /// Domain error produced by the lifecycle hooks.
    type Error: std::error::Error + Clone + Send + Sync + 'static;

    /// Collection name, used for logging.
    const COLLECTION: &'static str;

    fn id(&self) -> &Self::Id;

    /// Constructs the stored document. `id` is store-assigned; an
    /// implementation may substitute its own (profiles use the identity
    /// provider's uid) since the actor keys the entry by [`Self::id`].
    fn from_create(id: Self::Id, payload: Self::CreatePayload) -> Result<Self, Self::Error>;

    fn on_update(&mut self, patch: Self::Patch) -> Result<(), Self::Error>;

    fn on_delete(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn matches(&self, filter: &Self::Filter) -> bool;

    fn sort_key(&self) -> Self::SortKey;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError<E: std::error::Error> {
    #[error("document not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Rejected(E),
    #[error("store channel closed")]
    Closed,
}

#[derive(Debug)]
pub enum StoreRequest<T: Document> {
    Create {
        payload: T::CreatePayload,
        respond_to: oneshot::Sender<Result<T, StoreError<T::Error>>>,
    },
    Get {
        id: T::Id,
        respond_to: oneshot::Sender<Result<Option<T>, StoreError<T::Error>>>,
    },
    Update {
        id: T::Id,
        patch: T::Patch,
        respond_to: oneshot::Sender<Result<T, StoreError<T::Error>>>,
    },
    Delete {
        id: T::Id,
        respond_to: oneshot::Sender<Result<(), StoreError<T::Error>>>,
    },
    Query {
        filter: T::Filter,
        respond_to: oneshot::Sender<Result<Vec<T>, StoreError<T::Error>>>,
    },
    Subscribe {
        filter: T::Filter,
        sender: mpsc::UnboundedSender<Vec<T>>,
        respond_to: oneshot::Sender<Result<u64, StoreError<T::Error>>>,
    },
    Unsubscribe {
        id: u64,
    },
}

struct Subscriber<T: Document> {
    filter: T::Filter,
    sender: mpsc::UnboundedSender<Vec<T>>,
}

/// The actor owning one collection.
pub struct StoreActor<T: Document> {
    receiver: mpsc::Receiver<StoreRequest<T>>,
    documents: HashMap<T::Id, T>,
    subscribers: HashMap<u64, Subscriber<T>>,
    next_id_fn: Box<dyn Fn() -> T::Id + Send + Sync>,
    next_subscriber_id: u64,
}

impl<T: Document> StoreActor<T> {
    pub fn new(
        buffer_size: usize,
        next_id_fn: impl Fn() -> T::Id + Send + Sync + 'static,
    ) -> (Self, StoreClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            documents: HashMap::new(),
            subscribers: HashMap::new(),
            next_id_fn: Box::new(next_id_fn),
            next_subscriber_id: 1,
        };
        (actor, StoreClient { sender })
    }

    pub async fn run(mut self) {
        info!(collection = T::COLLECTION, "document store starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Create { payload, respond_to } => {
                    let id = (self.next_id_fn)();
                    match T::from_create(id, payload) {
                        Ok(doc) => {
                            self.documents.insert(doc.id().clone(), doc.clone());
                            self.notify_subscribers();
                            let _ = respond_to.send(Ok(doc));
                        }
                        Err(e) => {
                            let _ = respond_to.send(Err(StoreError::Rejected(e)));
                        }
                    }
                }
                StoreRequest::Get { id, respond_to } => {
                    let _ = respond_to.send(Ok(self.documents.get(&id).cloned()));
                }
                StoreRequest::Update {
                    id,
                    patch,
                    respond_to,
                } => {
                    let result = match self.documents.get(&id) {
                        Some(existing) => {
                            // Clone-validate-commit: a rejected patch must
                            // not leave a half-applied document behind.
                            let mut updated = existing.clone();
                            match updated.on_update(patch) {
                                Ok(()) => {
                                    self.documents.insert(id, updated.clone());
                                    self.notify_subscribers();
                                    Ok(updated)
                                }
                                Err(e) => Err(StoreError::Rejected(e)),
                            }
                        }
                        None => Err(StoreError::NotFound(id.to_string())),
                    };
                    let _ = respond_to.send(result);
                }
                StoreRequest::Delete { id, respond_to } => {
                    // Deleting a missing document is not an error: the
                    // purge job and the expiry timer may race on the
                    // same id.
                    let result = match self.documents.remove(&id) {
                        Some(doc) => match doc.on_delete() {
                            Ok(()) => {
                                self.notify_subscribers();
                                Ok(())
                            }
                            Err(e) => {
                                self.documents.insert(id, doc);
                                Err(StoreError::Rejected(e))
                            }
                        },
                        None => Ok(()),
                    };
                    let _ = respond_to.send(result);
                }
                StoreRequest::Query { filter, respond_to } => {
                    let _ = respond_to.send(Ok(Self::collect(&self.documents, &filter)));
                }
                StoreRequest::Subscribe {
                    filter,
                    sender,
                    respond_to,
                } => {
                    let id = self.next_subscriber_id;
                    self.next_subscriber_id += 1;
                    // First delivery happens right away with the current
                    // matching set, before any change lands.
                    let _ = sender.send(Self::collect(&self.documents, &filter));
                    self.subscribers.insert(id, Subscriber { filter, sender });
                    debug!(
                        collection = T::COLLECTION,
                        subscriber = id,
                        "subscription registered"
                    );
                    let _ = respond_to.send(Ok(id));
                }
                StoreRequest::Unsubscribe { id } => {
                    if self.subscribers.remove(&id).is_some() {
                        debug!(
                            collection = T::COLLECTION,
                            subscriber = id,
                            "subscription detached"
                        );
                    }
                }
            }
        }
        info!(collection = T::COLLECTION, "document store stopped");
    }

    fn collect(documents: &HashMap<T::Id, T>, filter: &T::Filter) -> Vec<T> {
        let mut matching: Vec<T> = documents
            .values()
            .filter(|doc| doc.matches(filter))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
        matching
    }

    /// Pushes a fresh snapshot to every subscriber whose channel is
    /// still open; dead channels are reaped on the spot.
    fn notify_subscribers(&mut self) {
        let mut dead = Vec::new();
        for (id, subscriber) in &self.subscribers {
            let snapshot = Self::collect(&self.documents, &subscriber.filter);
            if subscriber.sender.send(snapshot).is_err() {
                dead.push(*id);
            }
        }
        for id in dead {
            self.subscribers.remove(&id);
            debug!(
                collection = T::COLLECTION,
                subscriber = id,
                "subscriber channel dropped, reaping"
            );
        }
    }
}

/// Cloneable handle for talking to a [`StoreActor`].
#[derive(Clone)]
pub struct StoreClient<T: Document> {
    sender: mpsc::Sender<StoreRequest<T>>,
}

impl<T: Document> StoreClient<T> {
    pub fn new(sender: mpsc::Sender<StoreRequest<T>>) -> Self {
        Self { sender }
    }

    pub async fn create(&self, payload: T::CreatePayload) -> Result<T, StoreError<T::Error>> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Create { payload, respond_to })
            .await
            .map_err(|_| StoreError::Closed)?;
        response.await.map_err(|_| StoreError::Closed)?
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, StoreError<T::Error>> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Get { id, respond_to })
            .await
            .map_err(|_| StoreError::Closed)?;
        response.await.map_err(|_| StoreError::Closed)?
    }

    pub async fn update(&self, id: T::Id, patch: T::Patch) -> Result<T, StoreError<T::Error>> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Update {
                id,
                patch,
                respond_to,
            })
            .await
            .map_err(|_| StoreError::Closed)?;
        response.await.map_err(|_| StoreError::Closed)?
    }

    pub async fn delete(&self, id: T::Id) -> Result<(), StoreError<T::Error>> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Delete { id, respond_to })
            .await
            .map_err(|_| StoreError::Closed)?;
        response.await.map_err(|_| StoreError::Closed)?
    }

    pub async fn query(&self, filter: T::Filter) -> Result<Vec<T>, StoreError<T::Error>> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Query { filter, respond_to })
            .await
            .map_err(|_| StoreError::Closed)?;
        response.await.map_err(|_| StoreError::Closed)?
    }

    /// Registers a live query. The returned subscription receives the
    /// entire current matching set immediately, then a fresh full set
    /// after every qualifying change. Independent subscriptions over
    /// overlapping filters receive independent, uncoordinated streams.
    pub async fn subscribe(
        &self,
        filter: T::Filter,
    ) -> Result<Subscription<T>, StoreError<T::Error>> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Subscribe {
                filter,
                sender,
                respond_to,
            })
            .await
            .map_err(|_| StoreError::Closed)?;
        let id = response.await.map_err(|_| StoreError::Closed)??;
        Ok(Subscription {
            id,
            receiver,
            control: self.sender.clone(),
        })
    }
}

/// A live query handle. Each received value is a full replacement of
/// the matching result set, never a diff; consumers that care about
/// "new since last time" must diff against their own previous snapshot.
pub struct Subscription<T: Document> {
    id: u64,
    receiver: mpsc::UnboundedReceiver<Vec<T>>,
    control: mpsc::Sender<StoreRequest<T>>,
}

impl<T: Document> Subscription<T> {
    /// Waits for the next snapshot. `None` once detached or the store
    /// is gone.
    pub async fn recv(&mut self) -> Option<Vec<T>> {
        self.receiver.recv().await
    }

    /// Detaches the listener. Dropping the subscription without calling
    /// this also stops delivery eventually: the store reaps the dead
    /// channel on its next push.
    pub async fn unsubscribe(self) {
        let _ = self
            .control
            .send(StoreRequest::Unsubscribe { id: self.id })
            .await;
    }
}
