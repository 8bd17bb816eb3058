//! A confirmed pairing of exactly two profiles.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, Profile, ResultEngine, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Couple {
    pub id: Uuid,
    /// Profile that sent the accepted invitation.
    pub member_a: Uuid,
    /// Profile that accepted it.
    pub member_b: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Couple {
    pub(crate) fn new(member_a: Uuid, member_b: Uuid) -> ResultEngine<Self> {
        if member_a == member_b {
            return Err(EngineError::InvalidField(
                "a couple needs two distinct profiles".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            member_a,
            member_b,
            created_at: Utc::now(),
        })
    }

    pub fn has_member(&self, profile_id: Uuid) -> bool {
        self.member_a == profile_id || self.member_b == profile_id
    }

    /// The other member, if `profile_id` belongs to this couple.
    pub fn partner_of(&self, profile_id: Uuid) -> Option<Uuid> {
        if self.member_a == profile_id {
            Some(self.member_b)
        } else if self.member_b == profile_id {
            Some(self.member_a)
        } else {
            None
        }
    }
}

/// A couple together with both member profiles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CoupleView {
    pub couple: Couple,
    pub me: Profile,
    pub partner: Profile,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "couples")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub member_a: String,
    pub member_b: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Couple {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "couple")?,
            member_a: parse_uuid(&model.member_a, "profile")?,
            member_b: parse_uuid(&model.member_b, "profile")?,
            created_at: model.created_at,
        })
    }
}

impl From<&Couple> for ActiveModel {
    fn from(couple: &Couple) -> Self {
        Self {
            id: ActiveValue::Set(couple.id.to_string()),
            member_a: ActiveValue::Set(couple.member_a.to_string()),
            member_b: ActiveValue::Set(couple.member_b.to_string()),
            created_at: ActiveValue::Set(couple.created_at),
        }
    }
}
