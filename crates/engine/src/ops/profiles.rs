use sea_orm::{ActiveValue, prelude::*};

use crate::{
    EngineError, Identity, Profile, ProfileUpdate, ResultEngine, profiles,
    util::{normalize_optional_text, normalize_required_text},
};

use super::{Engine, with_tx};

impl Engine {
    fn ensure_email_allowed(&self, identity: &Identity) -> ResultEngine<()> {
        let Some(allowed) = &self.allowed_emails else {
            return Ok(());
        };
        match identity.email.as_deref() {
            Some(email) if allowed.iter().any(|a| a == email) => Ok(()),
            _ => Err(EngineError::Forbidden(
                "email not authorized to register".to_string(),
            )),
        }
    }

    /// Creates the caller's profile (onboarding). One profile per identity.
    pub async fn create_profile(
        &self,
        name: &str,
        avatar_url: Option<&str>,
        color: Option<&str>,
        identity: &Identity,
    ) -> ResultEngine<Profile> {
        self.ensure_email_allowed(identity)?;
        let profile = Profile::new(
            identity.user_id.clone(),
            normalize_required_text(name, "name")?,
            normalize_optional_text(avatar_url),
            normalize_optional_text(color),
        );

        with_tx!(self, |db_tx| {
            if self.find_profile(&db_tx, identity).await?.is_some() {
                return Err(EngineError::ExistingKey(identity.user_id.clone()));
            }
            profiles::ActiveModel::from(&profile).insert(&db_tx).await?;
            tracing::info!("created profile {} for {}", profile.id, identity.user_id);
            Ok(profile)
        })
    }

    /// The caller's profile.
    pub async fn profile(&self, identity: &Identity) -> ResultEngine<Profile> {
        with_tx!(self, |db_tx| {
            let mut profile = self.require_profile(&db_tx, identity).await?;
            if self.resolve_couple(&db_tx, &profile).await?.is_none() {
                profile.couple_id = None;
            }
            Ok(profile)
        })
    }

    pub async fn has_profile(&self, identity: &Identity) -> ResultEngine<bool> {
        with_tx!(self, |db_tx| {
            Ok(self.find_profile(&db_tx, identity).await?.is_some())
        })
    }

    pub async fn update_profile(
        &self,
        update: ProfileUpdate,
        identity: &Identity,
    ) -> ResultEngine<Profile> {
        let name = update
            .name
            .as_deref()
            .map(|n| normalize_required_text(n, "name"))
            .transpose()?;

        with_tx!(self, |db_tx| {
            let mut profile = self.require_profile(&db_tx, identity).await?;
            let mut active = profiles::ActiveModel {
                id: ActiveValue::Unchanged(profile.id.to_string()),
                ..Default::default()
            };
            if let Some(name) = name {
                active.name = ActiveValue::Set(name.clone());
                profile.name = name;
            }
            if let Some(avatar_url) = update.avatar_url.as_deref() {
                profile.avatar_url = normalize_optional_text(Some(avatar_url));
                active.avatar_url = ActiveValue::Set(profile.avatar_url.clone());
            }
            if let Some(color) = update.color.as_deref() {
                profile.color = normalize_optional_text(Some(color));
                active.color = ActiveValue::Set(profile.color.clone());
            }
            if active.is_changed() {
                active.update(&db_tx).await?;
            }
            Ok(profile)
        })
    }

    /// Uploads a new avatar and points the caller's profile at it.
    ///
    /// The object is keyed by profile id plus the given file name, so two
    /// users uploading `me.png` do not overwrite each other.
    pub async fn upload_avatar(
        &self,
        filename: &str,
        bytes: &[u8],
        identity: &Identity,
    ) -> ResultEngine<Profile> {
        if bytes.is_empty() {
            return Err(EngineError::InvalidField("avatar is empty".to_string()));
        }
        let profile = self.profile(identity).await?;
        let key = format!("{}-{}", profile.id, crate::sanitize_filename(filename)?);
        let url = self.avatars.put(&key, bytes).await?;

        self.update_profile(
            ProfileUpdate {
                avatar_url: Some(url),
                ..Default::default()
            },
            identity,
        )
        .await
    }
}
