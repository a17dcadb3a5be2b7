//! # Mock Framework
//!
//! Utilities for testing clients in isolation.
//!
//! Use [`create_mock_store`] to get a store client and a receiver.
//! Then use helpers like [`expect_create`] or [`expect_update`] to
//! assert behavior.

use tokio::sync::{mpsc, oneshot};

use crate::store::{Document, StoreClient, StoreError, StoreRequest};

type Reply<R, T> = oneshot::Sender<Result<R, StoreError<<T as Document>::Error>>>;

/// Creates a mock store client and a receiver for asserting requests.
///
/// # Testing Strategy
/// In client tests we don't want to spin up a full `StoreActor` if we
/// are just testing the *client* logic (e.g., `OrderClient`). Instead
/// the client sends its requests to a channel we control; the test
/// inspects the messages arriving there and plays the actor's side
/// (success, failure, delays) deterministically.
pub fn create_mock_store<T: Document>(
    buffer_size: usize,
) -> (StoreClient<T>, mpsc::Receiver<StoreRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (StoreClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Create request
pub async fn expect_create<T: Document>(
    receiver: &mut mpsc::Receiver<StoreRequest<T>>,
) -> Option<(T::CreatePayload, Reply<T, T>)> {
    match receiver.recv().await {
        Some(StoreRequest::Create { payload, respond_to }) => Some((payload, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get<T: Document>(
    receiver: &mut mpsc::Receiver<StoreRequest<T>>,
) -> Option<(T::Id, Reply<Option<T>, T>)> {
    match receiver.recv().await {
        Some(StoreRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Update request
pub async fn expect_update<T: Document>(
    receiver: &mut mpsc::Receiver<StoreRequest<T>>,
) -> Option<(T::Id, T::Patch, Reply<T, T>)> {
    match receiver.recv().await {
        Some(StoreRequest::Update {
            id,
            patch,
            respond_to,
        }) => Some((id, patch, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Delete request
pub async fn expect_delete<T: Document>(
    receiver: &mut mpsc::Receiver<StoreRequest<T>>,
) -> Option<(T::Id, Reply<(), T>)> {
    match receiver.recv().await {
        Some(StoreRequest::Delete { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Query request
pub async fn expect_query<T: Document>(
    receiver: &mut mpsc::Receiver<StoreRequest<T>>,
) -> Option<(T::Filter, Reply<Vec<T>, T>)> {
    match receiver.recv().await {
        Some(StoreRequest::Query { filter, respond_to }) => Some((filter, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeliveryDetails, LineItem, Order, OrderCreate};

    #[tokio::test]
    async fn mock_store_roundtrip() {
        let (client, mut receiver) = create_mock_store::<Order>(10);

        let create_task = tokio::spawn(async move {
            client
                .create(OrderCreate::guest(
                    vec![LineItem::new("Coke", 40, 1)],
                    DeliveryDetails {
                        name: "Test".into(),
                        phone: "1234567890".into(),
                        address: "somewhere".into(),
                        instructions: None,
                        university_gate: None,
                    },
                ))
                .await
        });

        let (payload, responder) = expect_create(&mut receiver)
            .await
            .expect("Expected Create request");
        assert_eq!(payload.items.len(), 1);

        let order = Order::from_create("order_1".into(), payload).unwrap();
        responder.send(Ok(order.clone())).unwrap();

        let result = create_task.await.unwrap();
        assert_eq!(result, Ok(order));
    }

    #[tokio::test]
    async fn mock_store_answers_get_query_and_delete() {
        let (client, mut receiver) = create_mock_store::<Order>(10);

        let task = tokio::spawn(async move {
            let missing = client.get("order_9".into()).await.unwrap();
            let all = client.query(Default::default()).await.unwrap();
            client.delete("order_9".into()).await.unwrap();
            (missing, all)
        });

        let (id, responder) = expect_get(&mut receiver).await.expect("Expected Get");
        assert_eq!(id, "order_9");
        responder.send(Ok(None)).unwrap();

        let (_, responder) = expect_query(&mut receiver).await.expect("Expected Query");
        responder.send(Ok(Vec::new())).unwrap();

        let (id, responder) = expect_delete(&mut receiver).await.expect("Expected Delete");
        assert_eq!(id, "order_9");
        responder.send(Ok(())).unwrap();

        let (missing, all) = task.await.unwrap();
        assert!(missing.is_none());
        assert!(all.is_empty());
    }
}
