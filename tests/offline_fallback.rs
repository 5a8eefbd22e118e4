//! End-to-end behavior when the network is fully unavailable: the client
//! keeps the UI populated from the local store instead of surfacing errors.

mod support;

use autonorte_client::models::{
    CreateCarData, ImageUpload, Message, Session, Role, SendMessageData,
};
use autonorte_client::normalize::PLACEHOLDER_IMAGE;
use autonorte_client::store::keys;
use support::{client_with, StubTransport};

fn seeded_message(id: &str, read: bool) -> Message {
    Message {
        id: id.to_string(),
        from_user_id: 99,
        to_user_id: 1,
        from_user_name: None,
        to_user_name: None,
        car_id: "5".to_string(),
        subject: "Consulta".to_string(),
        content: "¿Sigue disponible?".to_string(),
        timestamp: 1_700_000_000_000,
        read,
    }
}

#[tokio::test]
async fn created_listing_is_visible_offline() {
    let (client, _transport, _store, _dir) = client_with(StubTransport::offline());

    let result = client
        .cars
        .create_car(CreateCarData {
            title: "Test Car".to_string(),
            description: "A reliable test vehicle".to_string(),
            price: 500_000,
            location: "Salta".to_string(),
            images: vec![ImageUpload { filename: "a.jpg".to_string(), bytes: vec![1, 2, 3] }],
            ..Default::default()
        })
        .await
        .expect("offline create still succeeds");

    assert!(result.id > 0);
    assert_eq!(result.image_failures, 0);

    let cars = client.cars.get_all_cars().await;
    let created = cars.iter().find(|c| c.id == result.id).expect("listing present");
    assert!(created.is_approved());
    assert_eq!(created.title, "Test Car");
    assert_eq!(created.images, vec![PLACEHOLDER_IMAGE]);
    assert!(created.created_at_timestamp.is_some());
}

#[tokio::test]
async fn create_rejects_invalid_input_before_any_request() {
    let (client, transport, _store, _dir) = client_with(StubTransport::offline());

    let err = client
        .cars
        .create_car(CreateCarData {
            title: "Bad".to_string(),
            description: "Too short title above".to_string(),
            price: 500_000,
            location: "Salta".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, autonorte_client::error::Error::Validation(_)));
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn mark_as_read_survives_failed_read_receipt() {
    let (client, _transport, store, _dir) = client_with(StubTransport::offline());
    store.set(keys::MESSAGES, &vec![seeded_message("42", false)]);

    client.messages.mark_as_read("42").await;

    let messages = client.messages.get_messages().await;
    let msg = messages.iter().find(|m| m.id == "42").unwrap();
    assert!(msg.read);
}

#[tokio::test]
async fn sent_and_received_views_sort_newest_first() {
    let (client, _transport, _store, _dir) = client_with(StubTransport::offline());

    let first = client
        .messages
        .send_message(
            1,
            SendMessageData {
                to_user_id: 2,
                car_id: "5".to_string(),
                subject: "Oferta".to_string(),
                content: "Le ofrezco 800000".to_string(),
            },
        )
        .await;
    let second = client
        .messages
        .send_message(
            1,
            SendMessageData {
                to_user_id: 2,
                car_id: "5".to_string(),
                subject: "Oferta 2".to_string(),
                content: "Mejoro a 850000".to_string(),
            },
        )
        .await;
    assert!(!first.read);

    let received = client.messages.get_received_messages(2).await;
    assert_eq!(received.len(), 2);
    assert!(received[0].timestamp >= received[1].timestamp);

    let sent = client.messages.get_sent_messages(1).await;
    assert_eq!(sent.len(), 2);

    client.messages.delete_message(&second.id);
    assert_eq!(client.messages.get_messages().await.len(), 1);
}

#[tokio::test]
async fn review_upsert_keeps_one_record_per_user_and_car() {
    let (client, _transport, store, _dir) = client_with(StubTransport::offline());
    store.set(
        keys::SESSION,
        &Session {
            id: 7,
            username: "carlos".to_string(),
            email: "c@x.com".to_string(),
            role: Role::User,
            token: None,
        },
    );

    client.reviews.create_or_update_review(3, 4, None).await.unwrap();
    client
        .reviews
        .create_or_update_review(3, 2, Some("cambió de opinión".to_string()))
        .await
        .unwrap();

    let response = client.reviews.get_car_reviews(3, true).await;
    assert_eq!(response.reviews.len(), 1);
    assert_eq!(response.reviews[0].rating, 2);
    assert_eq!(response.reviews[0].user_id, 7);
    assert_eq!(response.summary.avg_rating, Some(2.0));
    assert_eq!(response.summary.score_10, Some(4.0));
    assert_eq!(response.summary.total, 1);
}

#[tokio::test]
async fn rating_out_of_range_is_a_validation_error() {
    let (client, _transport, _store, _dir) = client_with(StubTransport::offline());
    assert!(client.reviews.create_or_update_review(3, 6, None).await.is_err());
    assert!(client.reviews.create_or_update_review(3, 0, None).await.is_err());
}

#[tokio::test]
async fn flagging_twice_keeps_one_record_with_latest_reason() {
    let (client, _transport, _store, _dir) = client_with(StubTransport::offline());

    client.admin.flag_user(5, Some("spam".to_string())).await;
    let first = client.admin.get_flag_for_user(5).unwrap();
    client.admin.flag_user(5, Some("fraude".to_string())).await;
    let second = client.admin.get_flag_for_user(5).unwrap();

    assert_eq!(second.reason.as_deref(), Some("fraude"));
    assert!(second.at >= first.at);

    // Still exactly one record
    client.admin.unflag_user(5).await;
    assert!(client.admin.get_flag_for_user(5).is_none());
}

#[tokio::test]
async fn block_and_unblock_fall_back_to_local_list() {
    let (client, _transport, _store, _dir) = client_with(StubTransport::offline());

    client.admin.block_user(9).await;
    client.admin.block_user(9).await;
    assert_eq!(client.admin.blocked_users(), vec![9]);

    client.admin.unblock_user(9).await;
    assert!(client.admin.blocked_users().is_empty());
}

#[tokio::test]
async fn destructive_actions_fail_rather_than_pretend() {
    let (client, _transport, _store, _dir) = client_with(StubTransport::offline());

    assert!(client.cars.delete_car(1).await.is_err());
    assert!(client.admin.approve_car(1).await.is_err());
    assert!(client.admin.reject_car(1).await.is_err());
    assert!(client.admin.delete_user(1).await.is_err());
    assert!(client.reviews.delete_review(1).await.is_err());
}

#[tokio::test]
async fn logout_clears_session_even_when_backend_is_down() {
    let (client, _transport, store, _dir) = client_with(StubTransport::offline());
    store.set(
        keys::SESSION,
        &Session {
            id: 1,
            username: "admin".to_string(),
            email: "admin@admin.com".to_string(),
            role: Role::Admin,
            token: Some("tok".to_string()),
        },
    );

    assert!(client.auth.current_session().is_some());
    client.auth.logout().await;
    assert!(client.auth.current_session().is_none());
}
