use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{Couple, EngineError, Identity, Profile, ResultEngine, couples, profiles};

use super::Engine;

impl Engine {
    pub(super) async fn find_profile(
        &self,
        db: &DatabaseTransaction,
        identity: &Identity,
    ) -> ResultEngine<Option<Profile>> {
        profiles::Entity::find()
            .filter(profiles::Column::UserId.eq(identity.user_id.as_str()))
            .one(db)
            .await?
            .map(Profile::try_from)
            .transpose()
    }

    /// The caller's profile; `KeyNotFound` until onboarding is done.
    pub(super) async fn require_profile(
        &self,
        db: &DatabaseTransaction,
        identity: &Identity,
    ) -> ResultEngine<Profile> {
        self.find_profile(db, identity)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("profile not exists".to_string()))
    }

    pub(super) async fn profile_by_id(
        &self,
        db: &DatabaseTransaction,
        profile_id: Uuid,
    ) -> ResultEngine<Option<Profile>> {
        profiles::Entity::find_by_id(profile_id.to_string())
            .one(db)
            .await?
            .map(Profile::try_from)
            .transpose()
    }

    /// Resolves the couple a profile points to.
    ///
    /// A `couple_id` whose row is gone (or whose row does not list the
    /// profile) reads as unpaired.
    pub(super) async fn resolve_couple(
        &self,
        db: &DatabaseTransaction,
        profile: &Profile,
    ) -> ResultEngine<Option<Couple>> {
        let Some(couple_id) = profile.couple_id else {
            return Ok(None);
        };
        let couple = couples::Entity::find_by_id(couple_id.to_string())
            .one(db)
            .await?
            .map(Couple::try_from)
            .transpose()?;
        match couple {
            Some(couple) if couple.has_member(profile.id) => Ok(Some(couple)),
            _ => {
                tracing::warn!(
                    "profile {} references missing couple {couple_id}, treating as unpaired",
                    profile.id
                );
                Ok(None)
            }
        }
    }

    pub(super) async fn require_couple(
        &self,
        db: &DatabaseTransaction,
        profile: &Profile,
    ) -> ResultEngine<Couple> {
        self.resolve_couple(db, profile)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("couple not exists".to_string()))
    }

    /// Loads the partner of `me` inside `couple`.
    pub(super) async fn require_partner(
        &self,
        db: &DatabaseTransaction,
        couple: &Couple,
        me: &Profile,
    ) -> ResultEngine<Profile> {
        let partner_id = couple
            .partner_of(me.id)
            .ok_or_else(|| EngineError::KeyNotFound("couple not exists".to_string()))?;
        self.profile_by_id(db, partner_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("partner profile not exists".to_string()))
    }
}
