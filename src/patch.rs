//! Partial-update engine: PATCH semantics over a field-descriptor table.
//!
//! Each patch type enumerates its fields as named operations. An absent
//! field is a [`FieldOp::Skip`] (omit = unchanged); a present field becomes
//! a [`FieldOp::Set`] closure carrying the incoming value, already
//! transformed where the entity demands it (Person passwords are hashed,
//! Message.created is forced to "now"). [`FieldOp::Unpaired`] marks a
//! readable field with no mutator; hitting one is a schema defect, not a
//! client error.

use time::OffsetDateTime;

use crate::auth::Hasher;
use crate::error::{AppError, AppResult};
use crate::model::{MessagePatch, PersonPatch, RolePatch, RoomPatch};
use crate::store::Gateway;

pub struct PatchContext<'a> {
    pub now: OffsetDateTime,
    pub hasher: &'a Hasher,
}

impl<'a> PatchContext<'a> {
    pub fn new(hasher: &'a Hasher) -> Self {
        Self {
            now: OffsetDateTime::now_utc(),
            hasher,
        }
    }
}

pub enum FieldOp<E> {
    Skip,
    Set(Box<dyn FnOnce(&mut E) + Send>),
    Unpaired,
}

pub struct PatchField<E> {
    pub name: &'static str,
    pub op: FieldOp<E>,
}

impl<E> PatchField<E> {
    fn skip(name: &'static str) -> Self {
        Self {
            name,
            op: FieldOp::Skip,
        }
    }

    fn set(name: &'static str, set: impl FnOnce(&mut E) + Send + 'static) -> Self {
        Self {
            name,
            op: FieldOp::Set(Box::new(set)),
        }
    }

    fn optional(name: &'static str, value: Option<impl FnOnce(&mut E) + Send + 'static>) -> Self {
        match value {
            Some(set) => Self::set(name, set),
            None => Self::skip(name),
        }
    }
}

/// A partial representation of an entity, expressed as field operations.
pub trait EntityPatch {
    type Entity;

    fn fields(self, ctx: &PatchContext<'_>) -> AppResult<Vec<PatchField<Self::Entity>>>;
}

/// Fetch the stored entity, merge the non-absent fields onto it, persist.
///
/// Fails with `NotFound` when the identity is unknown and with
/// `InvalidProperties` when the patch exposes an unpaired field.
pub async fn apply_patch<G, P>(
    gateway: &G,
    id: i64,
    patch: P,
    ctx: &PatchContext<'_>,
) -> AppResult<()>
where
    G: Gateway,
    P: EntityPatch<Entity = G::Entity>,
{
    let mut current = gateway
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(G::ENTITY, id))?;

    for field in patch.fields(ctx)? {
        match field.op {
            FieldOp::Skip => {}
            FieldOp::Set(set) => set(&mut current),
            FieldOp::Unpaired => {
                return Err(AppError::InvalidProperties {
                    entity: G::ENTITY,
                    field: field.name,
                });
            }
        }
    }

    gateway.save(current).await?;
    Ok(())
}

impl EntityPatch for RolePatch {
    type Entity = crate::model::Role;

    fn fields(self, _ctx: &PatchContext<'_>) -> AppResult<Vec<PatchField<Self::Entity>>> {
        Ok(vec![PatchField::optional(
            "name",
            self.name.map(|name| move |r: &mut Self::Entity| r.name = name),
        )])
    }
}

impl EntityPatch for RoomPatch {
    type Entity = crate::model::Room;

    fn fields(self, _ctx: &PatchContext<'_>) -> AppResult<Vec<PatchField<Self::Entity>>> {
        Ok(vec![PatchField::optional(
            "name",
            self.name.map(|name| move |r: &mut Self::Entity| r.name = name),
        )])
    }
}

impl EntityPatch for PersonPatch {
    type Entity = crate::model::Person;

    fn fields(self, ctx: &PatchContext<'_>) -> AppResult<Vec<PatchField<Self::Entity>>> {
        // The password override: re-hash before the value is written.
        let password = match self.password {
            Some(plaintext) => Some(ctx.hasher.hash(&plaintext)?),
            None => None,
        };
        Ok(vec![
            PatchField::optional(
                "username",
                self.username
                    .map(|username| move |p: &mut Self::Entity| p.username = username),
            ),
            PatchField::optional(
                "password",
                password.map(|hash| move |p: &mut Self::Entity| p.password = hash),
            ),
        ])
    }
}

impl EntityPatch for MessagePatch {
    type Entity = crate::model::Message;

    fn fields(self, ctx: &PatchContext<'_>) -> AppResult<Vec<PatchField<Self::Entity>>> {
        let now = ctx.now;
        Ok(vec![
            PatchField::optional(
                "text",
                self.text.map(|text| move |m: &mut Self::Entity| m.text = text),
            ),
            // Unconditionally refreshed; any incoming value is discarded.
            PatchField::set("created", move |m: &mut Self::Entity| m.created = now),
        ])
    }
}
