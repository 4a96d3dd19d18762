use super::connection::Connection;
use crate::utils::error::SendFailure;
use tokio::sync::mpsc;
use tungstenite::protocol::Message as WsMessage;

#[test]
fn test_connection_new() {
    let (tx, _) = mpsc::channel::<WsMessage>(8);
    let connection = Connection::new(tx);
    assert!(connection.id.starts_with("conn-"));
}

#[test]
fn test_connection_ids_are_unique() {
    let (tx, _rx) = mpsc::channel::<WsMessage>(8);
    let a = Connection::new(tx.clone());
    let b = Connection::new(tx);
    assert_ne!(a.id, b.id);
}

#[test]
fn test_send_reaches_receiver() {
    let (tx, mut rx) = mpsc::channel::<WsMessage>(8);
    let connection = Connection::with_id("c1", tx);

    connection.send(WsMessage::text("hello")).unwrap();

    let received = rx.try_recv().unwrap();
    assert_eq!(received.to_text().unwrap(), "hello");
}

#[test]
fn test_send_after_receiver_dropped_fails() {
    let (tx, rx) = mpsc::channel::<WsMessage>(8);
    let connection = Connection::with_id("c1", tx);
    drop(rx);

    let err = connection.send(WsMessage::text("hello")).unwrap_err();
    assert_eq!(err.connection_id, "c1");
    assert_eq!(err.cause, SendFailure::Closed);
}

#[test]
fn test_send_to_full_queue_fails() {
    let (tx, mut rx) = mpsc::channel::<WsMessage>(2);
    let connection = Connection::with_id("c1", tx);

    connection.send(WsMessage::text("one")).unwrap();
    connection.send(WsMessage::text("two")).unwrap();
    let err = connection.send(WsMessage::text("three")).unwrap_err();
    assert_eq!(err.cause, SendFailure::QueueFull);

    // nothing queued before the overflow was lost
    assert_eq!(rx.try_recv().unwrap().to_text().unwrap(), "one");
    assert_eq!(rx.try_recv().unwrap().to_text().unwrap(), "two");
}
