//! End-to-end service flow over an in-memory database: roles, signup,
//! rooms, message composition, partial updates, and deletes.

use palaver::auth::Hasher;
use palaver::error::AppError;
use palaver::model::{MessagePatch, NewMessage, NewPerson, NewRoom, PersonPatch, Role};
use palaver::patch::{PatchContext, apply_patch};
use palaver::store::{
    Gateway, MessageStore, PersonStore, RoleStore, RoomStore, delete_required, find_required,
};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    sqlx::migrate!().run(&pool).await.expect("migrations");
    pool
}

#[tokio::test]
async fn chat_lifecycle() {
    let pool = memory_pool().await;
    let hasher = Hasher;

    // Roles and signup.
    let role = RoleStore::new(&pool).save(Role::of("user")).await.unwrap();
    let alice = palaver::users::sign_up_person(
        &pool,
        &hasher,
        role.id,
        NewPerson {
            username: Some("alice".into()),
            password: Some("wonder".into()),
        },
    )
    .await
    .unwrap();
    assert!(hasher.verify("wonder", &alice.password).unwrap());

    // Room creation honors the stop-word rule.
    let err = palaver::rooms::create_room(
        &pool,
        "stop-word",
        NewRoom {
            name: Some("a-stop-word-room".into()),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));

    let room = palaver::rooms::create_room(
        &pool,
        "stop-word",
        NewRoom {
            name: Some("general".into()),
        },
    )
    .await
    .unwrap();

    // Message composition resolves room and author.
    let message = palaver::messages::compose_message(
        &pool,
        room.id,
        "alice",
        NewMessage {
            text: Some("first!".into()),
        },
    )
    .await
    .unwrap();
    assert_eq!(message.person_id, alice.id);

    // Partial update: text changes, created refreshes, references stay.
    let before = message.created;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    apply_patch(
        &MessageStore::new(&pool),
        message.id,
        MessagePatch {
            id: Some(message.id),
            text: Some("edited".into()),
            created: None,
        },
        &PatchContext::new(&hasher),
    )
    .await
    .unwrap();

    let edited = find_required(&MessageStore::new(&pool), message.id)
        .await
        .unwrap();
    assert_eq!(edited.text, "edited");
    assert_eq!(edited.room_id, room.id);
    assert_eq!(edited.person_id, alice.id);
    assert!(edited.created > before);

    // Password update is re-hashed.
    apply_patch(
        &PersonStore::new(&pool),
        alice.id,
        PersonPatch {
            id: Some(alice.id),
            username: None,
            password: Some("rabbit".into()),
        },
        &PatchContext::new(&hasher),
    )
    .await
    .unwrap();
    let alice = find_required(&PersonStore::new(&pool), alice.id).await.unwrap();
    assert_ne!(alice.password, "rabbit");
    assert!(hasher.verify("rabbit", &alice.password).unwrap());

    // Deletes: present succeeds, absent is not-found.
    delete_required(&MessageStore::new(&pool), edited.id)
        .await
        .unwrap();
    let err = delete_required(&MessageStore::new(&pool), edited.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { entity: "message", .. }));

    assert!(
        MessageStore::new(&pool)
            .find_all_by_person_id(alice.id)
            .await
            .unwrap()
            .is_empty()
    );

    delete_required(&RoomStore::new(&pool), room.id).await.unwrap();
    delete_required(&PersonStore::new(&pool), alice.id)
        .await
        .unwrap();
    delete_required(&RoleStore::new(&pool), role.id).await.unwrap();
}
