//! Application-level user profiles.
//!
//! A profile is distinct from the authentication identity: the identity
//! provider owns credentials, the engine owns exactly one `Profile` per
//! identity (`user_id`).

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    util::{parse_optional_uuid, parse_uuid},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub id: Uuid,
    /// Owning identity, unique across profiles.
    pub user_id: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub color: Option<String>,
    /// Couple this profile belongs to. May point to a couple that no longer
    /// exists; read it through the engine, which resolves that case to
    /// "unpaired".
    pub couple_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(
        user_id: String,
        name: String,
        avatar_url: Option<String>,
        color: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            avatar_url,
            color,
            couple_id: None,
            created_at: Utc::now(),
        }
    }
}

/// Partial update of a profile; `None` leaves the field untouched, a blank
/// `avatar_url` or `color` clears it.
#[derive(Clone, Debug, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub color: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub user_id: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub color: Option<String>,
    pub couple_id: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Profile {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "profile")?,
            couple_id: parse_optional_uuid(model.couple_id.as_deref(), "couple")?,
            user_id: model.user_id,
            name: model.name,
            avatar_url: model.avatar_url,
            color: model.color,
            created_at: model.created_at,
        })
    }
}

impl From<&Profile> for ActiveModel {
    fn from(profile: &Profile) -> Self {
        Self {
            id: ActiveValue::Set(profile.id.to_string()),
            user_id: ActiveValue::Set(profile.user_id.clone()),
            name: ActiveValue::Set(profile.name.clone()),
            avatar_url: ActiveValue::Set(profile.avatar_url.clone()),
            color: ActiveValue::Set(profile.color.clone()),
            couple_id: ActiveValue::Set(profile.couple_id.map(|id| id.to_string())),
            created_at: ActiveValue::Set(profile.created_at),
        }
    }
}
