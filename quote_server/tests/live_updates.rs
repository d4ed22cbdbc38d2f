use std::sync::Arc;
use std::thread;
use std::time::Duration;

use quote_common::{
    BroadcastMessage, CompanyId, Insertion, MessageKind, QuoteChanges, QuoteError, QuoteId,
    ValidationError,
};
use quote_server::{Broadcaster, BroadcasterConfig, DeliveryMode, QuoteStore, Subscription};

fn setup(delivery: DeliveryMode) -> (QuoteStore, Subscription, CompanyId) {
    let broadcaster = Arc::new(Broadcaster::new(BroadcasterConfig {
        delivery,
        ..BroadcasterConfig::default()
    }));
    let rx = broadcaster.subscribe("quotes").unwrap();
    let store = QuoteStore::new(broadcaster);
    let company = store.create_company("KPMG").unwrap();
    (store, rx, company.id)
}

fn rename(name: &str) -> QuoteChanges {
    QuoteChanges {
        name: Some(name.to_string()),
        company_id: None,
    }
}

#[test]
fn create_broadcasts_prepend() {
    let (store, rx, company) = setup(DeliveryMode::Inline);

    let quote = store.create("A", company).unwrap();
    assert_eq!(quote.id, QuoteId(1));

    let msg = rx.try_recv().unwrap();
    assert_eq!(msg.kind, MessageKind::Created);
    assert_eq!(msg.target_id, "1");
    assert_eq!(msg.insertion, Insertion::Prepend);
    assert!(msg.html_fragment.unwrap().contains(r#"id="quote_1""#));
    assert!(rx.try_recv().is_err());
}

#[test]
fn blank_name_is_rejected_without_broadcast() {
    let (store, rx, company) = setup(DeliveryMode::Inline);

    let err = store.create("", company).unwrap_err();
    assert!(matches!(err, QuoteError::Validation(ValidationError::BlankName)));
    assert!(rx.try_recv().is_err());
    assert!(store.list_ordered().unwrap().is_empty());
}

#[test]
fn listing_is_newest_first_and_idempotent() {
    let (store, _rx, company) = setup(DeliveryMode::Inline);
    store.create("A", company).unwrap();
    store.create("B", company).unwrap();

    let ids: Vec<QuoteId> = store.list_ordered().unwrap().iter().map(|q| q.id).collect();
    assert_eq!(ids, vec![QuoteId(2), QuoteId(1)]);
    assert_eq!(store.list_ordered().unwrap(), store.list_ordered().unwrap());
}

#[test]
fn update_broadcasts_replace() {
    let (store, rx, company) = setup(DeliveryMode::Inline);
    let quote = store.create("A", company).unwrap();
    rx.try_recv().unwrap();

    let updated = store.update(quote.id, &rename("B")).unwrap();
    assert_eq!(updated.name, "B");

    let msg = rx.try_recv().unwrap();
    assert_eq!(msg.kind, MessageKind::Updated);
    assert_eq!(msg.target_id, "1");
    assert_eq!(msg.insertion, Insertion::Replace);
    assert!(msg.html_fragment.unwrap().contains(">B</a>"));
    assert!(rx.try_recv().is_err());
}

#[test]
fn blank_update_is_rejected_without_broadcast() {
    let (store, rx, company) = setup(DeliveryMode::Inline);
    let quote = store.create("A", company).unwrap();
    rx.try_recv().unwrap();

    assert!(store.update(quote.id, &rename("")).is_err());
    assert!(rx.try_recv().is_err());
    assert_eq!(store.find(quote.id).unwrap().unwrap().name, "A");
}

#[test]
fn delete_broadcasts_remove_and_hides_quote() {
    let (store, rx, company) = setup(DeliveryMode::Inline);
    let quote = store.create("A", company).unwrap();
    rx.try_recv().unwrap();

    store.delete(quote.id).unwrap();

    let msg = rx.try_recv().unwrap();
    assert_eq!(msg.kind, MessageKind::Deleted);
    assert_eq!(msg.target_id, "1");
    assert_eq!(msg.insertion, Insertion::Remove);
    assert_eq!(msg.html_fragment, None);
    assert!(store.list_ordered().unwrap().iter().all(|q| q.id != quote.id));
}

#[test]
fn missing_quote_is_not_found_without_broadcast() {
    let (store, rx, _) = setup(DeliveryMode::Inline);
    assert!(matches!(store.delete(QuoteId(1)), Err(QuoteError::NotFound(_))));
    assert!(matches!(
        store.update(QuoteId(1), &rename("B")),
        Err(QuoteError::NotFound(_))
    ));
    assert!(rx.try_recv().is_err());
}

#[test]
fn deferred_delivery_preserves_commit_order() {
    let (store, rx, company) = setup(DeliveryMode::Deferred);
    let a = store.create("A", company).unwrap();
    let b = store.create("B", company).unwrap();
    store.update(a.id, &rename("A2")).unwrap();
    store.delete(b.id).unwrap();
    store.delete(a.id).unwrap();

    let timeout = Duration::from_secs(5);
    let got: Vec<(MessageKind, String)> = (0..5)
        .map(|_| {
            let msg = rx.recv_timeout(timeout).unwrap();
            (msg.kind, msg.target_id)
        })
        .collect();
    assert_eq!(
        got,
        vec![
            (MessageKind::Created, "1".to_string()),
            (MessageKind::Created, "2".to_string()),
            (MessageKind::Updated, "1".to_string()),
            (MessageKind::Deleted, "2".to_string()),
            (MessageKind::Deleted, "1".to_string()),
        ]
    );
}

#[test]
fn concurrent_writers_produce_one_message_per_commit() {
    let broadcaster = Arc::new(Broadcaster::new(BroadcasterConfig::default()));
    let rx = broadcaster.subscribe("quotes").unwrap();
    let store = Arc::new(QuoteStore::new(broadcaster));
    let company = store.create_company("KPMG").unwrap().id;

    let handles: Vec<_> = (0..4)
        .map(|w| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..25 {
                    let quote = store.create(&format!("w{}-{}", w, i), company).unwrap();
                    store.update(quote.id, &rename("edited")).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let messages: Vec<BroadcastMessage> = rx.try_iter().collect();
    assert_eq!(messages.len(), 200);
    // Per quote, `created` must arrive before its `updated`.
    for id in 1..=100u64 {
        let target = id.to_string();
        let kinds: Vec<MessageKind> = messages
            .iter()
            .filter(|m| m.target_id == target)
            .map(|m| m.kind)
            .collect();
        assert_eq!(kinds, vec![MessageKind::Created, MessageKind::Updated]);
    }
}

#[test]
fn late_subscriber_only_sees_later_commits() {
    let broadcaster = Arc::new(Broadcaster::new(BroadcasterConfig::default()));
    let store = QuoteStore::new(broadcaster.clone());
    let company = store.create_company("KPMG").unwrap().id;
    store.create("before", company).unwrap();

    let rx = broadcaster.subscribe("quotes").unwrap();
    store.create("after", company).unwrap();

    let got: Vec<String> = rx.try_iter().map(|m| m.target_id).collect();
    assert_eq!(got, vec!["2".to_string()]);
    assert_eq!(store.list_ordered().unwrap().len(), 2);
}
