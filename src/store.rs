//! Persistence gateway: per-entity CRUD over the sqlite pool.
//!
//! `save` inserts when the identity is zero and updates otherwise, returning
//! the entity with its assigned id. `delete` reports whether a row was
//! actually removed so callers can distinguish not-found from success.

use std::future::Future;

use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::model::{Message, Person, Role, Room};

pub trait Gateway: Sync {
    type Entity: Send;

    /// Entity name used in not-found and schema-defect reports.
    const ENTITY: &'static str;

    fn find_all(&self) -> impl Future<Output = Result<Vec<Self::Entity>, sqlx::Error>> + Send;
    fn find_by_id(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<Self::Entity>, sqlx::Error>> + Send;
    fn save(
        &self,
        entity: Self::Entity,
    ) -> impl Future<Output = Result<Self::Entity, sqlx::Error>> + Send;
    fn delete(&self, id: i64) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;
}

/// Fetch by id, mapping absence to the caller-facing not-found outcome.
pub async fn find_required<G: Gateway>(gateway: &G, id: i64) -> AppResult<G::Entity> {
    gateway
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(G::ENTITY, id))
}

/// Delete by id; absence is a distinct, user-visible outcome, never a
/// silent success.
pub async fn delete_required<G: Gateway>(gateway: &G, id: i64) -> AppResult<()> {
    if !gateway.delete(id).await? {
        return Err(AppError::not_found(G::ENTITY, id));
    }
    Ok(())
}

pub struct RoleStore<'a> {
    pool: &'a SqlitePool,
}

impl<'a> RoleStore<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }
}

impl Gateway for RoleStore<'_> {
    type Entity = Role;
    const ENTITY: &'static str = "role";

    async fn find_all(&self) -> Result<Vec<Role>, sqlx::Error> {
        sqlx::query_as("SELECT id, name FROM roles ORDER BY id")
            .fetch_all(self.pool)
            .await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Role>, sqlx::Error> {
        sqlx::query_as("SELECT id, name FROM roles WHERE id=?")
            .bind(id)
            .fetch_optional(self.pool)
            .await
    }

    async fn save(&self, role: Role) -> Result<Role, sqlx::Error> {
        if role.id == 0 {
            let id = sqlx::query("INSERT INTO roles (name) VALUES (?)")
                .bind(&role.name)
                .execute(self.pool)
                .await?
                .last_insert_rowid();
            Ok(Role { id, ..role })
        } else {
            sqlx::query("UPDATE roles SET name=? WHERE id=?")
                .bind(&role.name)
                .bind(role.id)
                .execute(self.pool)
                .await?;
            Ok(role)
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let done = sqlx::query("DELETE FROM roles WHERE id=?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }
}

pub struct RoomStore<'a> {
    pool: &'a SqlitePool,
}

impl<'a> RoomStore<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }
}

impl Gateway for RoomStore<'_> {
    type Entity = Room;
    const ENTITY: &'static str = "room";

    async fn find_all(&self) -> Result<Vec<Room>, sqlx::Error> {
        sqlx::query_as("SELECT id, name FROM rooms ORDER BY id")
            .fetch_all(self.pool)
            .await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Room>, sqlx::Error> {
        sqlx::query_as("SELECT id, name FROM rooms WHERE id=?")
            .bind(id)
            .fetch_optional(self.pool)
            .await
    }

    async fn save(&self, room: Room) -> Result<Room, sqlx::Error> {
        if room.id == 0 {
            let id = sqlx::query("INSERT INTO rooms (name) VALUES (?)")
                .bind(&room.name)
                .execute(self.pool)
                .await?
                .last_insert_rowid();
            Ok(Room { id, ..room })
        } else {
            sqlx::query("UPDATE rooms SET name=? WHERE id=?")
                .bind(&room.name)
                .bind(room.id)
                .execute(self.pool)
                .await?;
            Ok(room)
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let done = sqlx::query("DELETE FROM rooms WHERE id=?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }
}

pub struct PersonStore<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PersonStore<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Person>, sqlx::Error> {
        sqlx::query_as("SELECT id, username, password, role_id FROM persons WHERE username=?")
            .bind(username)
            .fetch_optional(self.pool)
            .await
    }
}

impl Gateway for PersonStore<'_> {
    type Entity = Person;
    const ENTITY: &'static str = "person";

    async fn find_all(&self) -> Result<Vec<Person>, sqlx::Error> {
        sqlx::query_as("SELECT id, username, password, role_id FROM persons ORDER BY id")
            .fetch_all(self.pool)
            .await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Person>, sqlx::Error> {
        sqlx::query_as("SELECT id, username, password, role_id FROM persons WHERE id=?")
            .bind(id)
            .fetch_optional(self.pool)
            .await
    }

    async fn save(&self, person: Person) -> Result<Person, sqlx::Error> {
        if person.id == 0 {
            let id = sqlx::query("INSERT INTO persons (username, password, role_id) VALUES (?,?,?)")
                .bind(&person.username)
                .bind(&person.password)
                .bind(person.role_id)
                .execute(self.pool)
                .await?
                .last_insert_rowid();
            Ok(Person { id, ..person })
        } else {
            sqlx::query("UPDATE persons SET username=?, password=?, role_id=? WHERE id=?")
                .bind(&person.username)
                .bind(&person.password)
                .bind(person.role_id)
                .bind(person.id)
                .execute(self.pool)
                .await?;
            Ok(person)
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let done = sqlx::query("DELETE FROM persons WHERE id=?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }
}

pub struct MessageStore<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MessageStore<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Zero messages is an empty list, not an error.
    pub async fn find_all_by_person_id(&self, person_id: i64) -> Result<Vec<Message>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, text, created, room_id, person_id FROM messages \
             WHERE person_id=? ORDER BY id",
        )
        .bind(person_id)
        .fetch_all(self.pool)
        .await
    }
}

impl Gateway for MessageStore<'_> {
    type Entity = Message;
    const ENTITY: &'static str = "message";

    async fn find_all(&self) -> Result<Vec<Message>, sqlx::Error> {
        sqlx::query_as("SELECT id, text, created, room_id, person_id FROM messages ORDER BY id")
            .fetch_all(self.pool)
            .await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, sqlx::Error> {
        sqlx::query_as("SELECT id, text, created, room_id, person_id FROM messages WHERE id=?")
            .bind(id)
            .fetch_optional(self.pool)
            .await
    }

    async fn save(&self, message: Message) -> Result<Message, sqlx::Error> {
        if message.id == 0 {
            let id = sqlx::query(
                "INSERT INTO messages (text, created, room_id, person_id) VALUES (?,?,?,?)",
            )
            .bind(&message.text)
            .bind(message.created)
            .bind(message.room_id)
            .bind(message.person_id)
            .execute(self.pool)
            .await?
            .last_insert_rowid();
            Ok(Message { id, ..message })
        } else {
            sqlx::query("UPDATE messages SET text=?, created=?, room_id=?, person_id=? WHERE id=?")
                .bind(&message.text)
                .bind(message.created)
                .bind(message.room_id)
                .bind(message.person_id)
                .bind(message.id)
                .execute(self.pool)
                .await?;
            Ok(message)
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let done = sqlx::query("DELETE FROM messages WHERE id=?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    pub(crate) async fn memory_pool() -> SqlitePool {
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
    async fn save_assigns_identity_and_refetch_matches() {
        let pool = memory_pool().await;
        let store = RoleStore::new(&pool);

        let saved = store.save(crate::model::Role::of("admin")).await.unwrap();
        assert!(saved.id > 0);

        let fetched = store.find_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "admin");
    }

    #[tokio::test]
    async fn resave_of_fetched_entity_changes_nothing() {
        let pool = memory_pool().await;
        let store = RoomStore::new(&pool);

        let saved = store.save(crate::model::Room::of("general")).await.unwrap();
        let fetched = store.find_by_id(saved.id).await.unwrap().unwrap();
        store.save(fetched).await.unwrap();

        let again = store.find_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(again.id, saved.id);
        assert_eq!(again.name, "general");
        assert_eq!(store.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_of_absent_id_reports_not_found() {
        let pool = memory_pool().await;
        let store = RoomStore::new(&pool);

        assert!(!store.delete(999).await.unwrap());
        let err = delete_required(&store, 999).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: "room", .. }));
    }

    #[tokio::test]
    async fn person_lookup_by_username() {
        let pool = memory_pool().await;
        let roles = RoleStore::new(&pool);
        let persons = PersonStore::new(&pool);

        let role = roles.save(crate::model::Role::of("user")).await.unwrap();
        persons
            .save(crate::model::Person::of("alice", "hash", role.id))
            .await
            .unwrap();

        assert!(persons.find_by_username("alice").await.unwrap().is_some());
        assert!(persons.find_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn messages_by_person_with_none_is_empty() {
        let pool = memory_pool().await;
        let messages = MessageStore::new(&pool);

        let found = messages.find_all_by_person_id(42).await.unwrap();
        assert!(found.is_empty());
    }
}
