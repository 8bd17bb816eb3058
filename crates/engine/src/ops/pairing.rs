//! Couple formation: invitations, acceptance and dissolution.
//!
//! Per profile the pairing goes `Unpaired` → `InvitationSent` /
//! `InvitationReceived` → `Paired`. `Paired` is left only when one of the two
//! profiles is deleted, which returns the partner to `Unpaired`.

use chrono::{DateTime, Utc};
use sea_orm::{
    Condition, DatabaseTransaction, QueryFilter, QueryOrder,
    prelude::*,
    sea_query::{Expr, Query},
};
use uuid::Uuid;

use crate::{
    Couple, CoupleView, EngineError, Identity, Invitation, InvitationRecipient, Profile,
    ResultEngine, couples, expenses,
    invitations::{self, generate_code, normalize_code},
    profiles,
    util::normalize_email,
};

use super::{Engine, with_tx};

/// How many fresh codes are tried before giving up on a collision streak.
const MAX_CODE_ATTEMPTS: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PairingState {
    Unpaired,
    InvitationSent,
    InvitationReceived,
    Paired { couple_id: Uuid },
}

enum InvitationKey {
    Id(Uuid),
    Code(String),
}

impl InvitationKey {
    fn condition(&self) -> Condition {
        match self {
            Self::Id(id) => Condition::all().add(invitations::Column::Id.eq(id.to_string())),
            Self::Code(code) => Condition::all().add(invitations::Column::Code.eq(code.as_str())),
        }
    }
}

/// Matches profiles that are not in a couple, counting a reference to a
/// couple row that no longer exists as "not in a couple".
fn unpaired_profiles() -> Condition {
    Condition::any()
        .add(profiles::Column::CoupleId.is_null())
        .add(
            profiles::Column::CoupleId.not_in_subquery(
                Query::select()
                    .column(couples::Column::Id)
                    .from(couples::Entity)
                    .to_owned(),
            ),
        )
}

impl Engine {
    async fn find_invitation(
        &self,
        db: &DatabaseTransaction,
        key: &InvitationKey,
    ) -> ResultEngine<Option<Invitation>> {
        invitations::Entity::find()
            .filter(key.condition())
            .one(db)
            .await?
            .map(Invitation::try_from)
            .transpose()
    }

    async fn unique_code(&self, db: &DatabaseTransaction) -> ResultEngine<String> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_code();
            let taken = invitations::Entity::find()
                .filter(invitations::Column::Code.eq(code.as_str()))
                .one(db)
                .await?
                .is_some();
            if !taken {
                return Ok(code);
            }
            tracing::warn!("invitation code collision, regenerating");
        }
        Err(EngineError::Storage(
            "could not generate a unique invitation code".to_string(),
        ))
    }

    async fn pending_where(
        &self,
        db: &DatabaseTransaction,
        condition: Condition,
        now: DateTime<Utc>,
    ) -> ResultEngine<Vec<Invitation>> {
        let rows = invitations::Entity::find()
            .filter(condition)
            .filter(invitations::Column::Accepted.eq(false))
            .order_by_desc(invitations::Column::CreatedAt)
            .all(db)
            .await?;
        let mut pending = Vec::with_capacity(rows.len());
        for row in rows {
            let invitation = Invitation::try_from(row)?;
            if invitation.is_pending_at(now) {
                pending.push(invitation);
            }
        }
        Ok(pending)
    }

    fn received_condition(profile: &Profile, identity: &Identity) -> Condition {
        let mut condition =
            Condition::any().add(invitations::Column::RecipientId.eq(profile.id.to_string()));
        if let Some(email) = identity.email.as_deref() {
            condition = condition.add(invitations::Column::RecipientEmail.eq(email.to_lowercase()));
        }
        condition
    }

    /// Invites a partner, by profile or by e-mail.
    ///
    /// The sender must not be in a couple. When the recipient is a profile it
    /// must exist and be unpaired too; both are checked again on acceptance.
    pub async fn create_invitation(
        &self,
        recipient: InvitationRecipient,
        identity: &Identity,
    ) -> ResultEngine<Invitation> {
        let recipient = match recipient {
            InvitationRecipient::Email(email) => InvitationRecipient::Email(normalize_email(&email)?),
            other => other,
        };

        with_tx!(self, |db_tx| {
            let sender = self.require_profile(&db_tx, identity).await?;
            if self.resolve_couple(&db_tx, &sender).await?.is_some() {
                return Err(EngineError::AlreadyPaired(
                    "you already belong to a couple".to_string(),
                ));
            }

            match &recipient {
                InvitationRecipient::Profile(recipient_id) => {
                    if *recipient_id == sender.id {
                        return Err(EngineError::InvalidField(
                            "cannot invite yourself".to_string(),
                        ));
                    }
                    let partner = self
                        .profile_by_id(&db_tx, *recipient_id)
                        .await?
                        .ok_or_else(|| {
                            EngineError::KeyNotFound("recipient profile not exists".to_string())
                        })?;
                    if self.resolve_couple(&db_tx, &partner).await?.is_some() {
                        return Err(EngineError::AlreadyPaired(format!(
                            "{} already belongs to a couple",
                            partner.name
                        )));
                    }
                }
                InvitationRecipient::Email(email) => {
                    if identity.email.as_deref() == Some(email.as_str()) {
                        return Err(EngineError::InvalidField(
                            "cannot invite yourself".to_string(),
                        ));
                    }
                }
            }

            let code = self.unique_code(&db_tx).await?;
            let invitation = Invitation::new(sender.id, recipient, code, self.invitation_ttl)?;
            invitations::ActiveModel::from(&invitation)
                .insert(&db_tx)
                .await?;
            tracing::info!(
                "profile {} sent invitation {} (expires {})",
                sender.id,
                invitation.id,
                invitation.expires_at
            );
            Ok(invitation)
        })
    }

    /// Accepts an invitation by id and forms the couple.
    pub async fn accept_invitation(
        &self,
        invitation_id: Uuid,
        identity: &Identity,
    ) -> ResultEngine<Couple> {
        self.accept(InvitationKey::Id(invitation_id), identity)
            .await
    }

    /// Accepts an invitation by its code and forms the couple.
    pub async fn accept_invitation_by_code(
        &self,
        code: &str,
        identity: &Identity,
    ) -> ResultEngine<Couple> {
        let code = normalize_code(code)?;
        self.accept(InvitationKey::Code(code), identity).await
    }

    /// Consumes the invitation, creates the couple and links both profiles
    /// in one transaction.
    ///
    /// The invitation is consumed first, with a conditional update on
    /// `accepted = false`: of two concurrent acceptances only one can match
    /// the row, the other sees it already accepted. Every later failure
    /// (expiry, wrong recipient, a member already paired) rolls the whole
    /// unit back, consumption included.
    async fn accept(&self, key: InvitationKey, identity: &Identity) -> ResultEngine<Couple> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let consumed = invitations::Entity::update_many()
                .col_expr(invitations::Column::Accepted, Expr::value(true))
                .col_expr(invitations::Column::AcceptedAt, Expr::value(now))
                .filter(key.condition())
                .filter(invitations::Column::Accepted.eq(false))
                .exec(&db_tx)
                .await?;

            let invitation = self
                .find_invitation(&db_tx, &key)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("invitation not exists".to_string()))?;
            if consumed.rows_affected == 0 {
                invitation.ensure_acceptable_at(now)?;
                return Err(EngineError::InvitationAlreadyAccepted(invitation.code));
            }
            if invitation.is_expired_at(now) {
                return Err(EngineError::InvitationExpired(invitation.code));
            }

            let recipient = self.require_profile(&db_tx, identity).await?;
            if invitation.sender_id == recipient.id {
                return Err(EngineError::InvalidField(
                    "cannot accept your own invitation".to_string(),
                ));
            }
            if let Some(expected) = invitation.recipient_id
                && expected != recipient.id
            {
                return Err(EngineError::KeyNotFound("invitation not exists".to_string()));
            }
            if self
                .profile_by_id(&db_tx, invitation.sender_id)
                .await?
                .is_none()
            {
                return Err(EngineError::KeyNotFound(
                    "sender profile not exists".to_string(),
                ));
            }

            let couple = Couple::new(invitation.sender_id, recipient.id)?;
            couples::ActiveModel::from(&couple).insert(&db_tx).await?;

            // Both members must still be unpaired at this point; anything
            // else means one of them paired with someone else meanwhile.
            let linked = profiles::Entity::update_many()
                .col_expr(profiles::Column::CoupleId, Expr::value(couple.id.to_string()))
                .filter(profiles::Column::Id.is_in([
                    couple.member_a.to_string(),
                    couple.member_b.to_string(),
                ]))
                .filter(unpaired_profiles())
                .exec(&db_tx)
                .await?;
            if linked.rows_affected != 2 {
                return Err(EngineError::AlreadyPaired(
                    "a member already belongs to a couple".to_string(),
                ));
            }

            tracing::info!(
                "couple {} formed by {} and {} (invitation {})",
                couple.id,
                couple.member_a,
                couple.member_b,
                invitation.id
            );
            Ok(couple)
        })
    }

    /// Invitations waiting for the caller: addressed to the caller's profile
    /// or e-mail, not accepted and not expired.
    pub async fn pending_invitations(&self, identity: &Identity) -> ResultEngine<Vec<Invitation>> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let profile = self.require_profile(&db_tx, identity).await?;
            let condition = Self::received_condition(&profile, identity);
            let pending = self.pending_where(&db_tx, condition, now).await?;
            let email = identity.email.as_deref();
            Ok(pending
                .into_iter()
                .filter(|i| i.sender_id != profile.id && i.is_addressed_to(profile.id, email))
                .collect())
        })
    }

    /// Invitations the caller sent that are still open.
    pub async fn sent_invitations(&self, identity: &Identity) -> ResultEngine<Vec<Invitation>> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let profile = self.require_profile(&db_tx, identity).await?;
            let condition =
                Condition::all().add(invitations::Column::SenderId.eq(profile.id.to_string()));
            self.pending_where(&db_tx, condition, now).await
        })
    }

    /// Looks an invitation up by code.
    ///
    /// Unknown, accepted and expired codes are three distinct errors.
    pub async fn invitation_by_code(&self, code: &str) -> ResultEngine<Invitation> {
        let key = InvitationKey::Code(normalize_code(code)?);
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let invitation = self
                .find_invitation(&db_tx, &key)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("invitation not exists".to_string()))?;
            invitation.ensure_acceptable_at(now)?;
            Ok(invitation)
        })
    }

    /// Profiles the caller could invite: everyone else who is unpaired.
    pub async fn available_partners(&self, identity: &Identity) -> ResultEngine<Vec<Profile>> {
        with_tx!(self, |db_tx| {
            let me = self.require_profile(&db_tx, identity).await?;
            let rows = profiles::Entity::find()
                .filter(profiles::Column::Id.ne(me.id.to_string()))
                .filter(unpaired_profiles())
                .order_by_asc(profiles::Column::Name)
                .all(&db_tx)
                .await?;
            let mut partners = Vec::with_capacity(rows.len());
            for row in rows {
                let mut profile = Profile::try_from(row)?;
                profile.couple_id = None;
                partners.push(profile);
            }
            Ok(partners)
        })
    }

    /// The caller's couple with both member profiles.
    pub async fn couple(&self, identity: &Identity) -> ResultEngine<CoupleView> {
        with_tx!(self, |db_tx| {
            let me = self.require_profile(&db_tx, identity).await?;
            let couple = self.require_couple(&db_tx, &me).await?;
            let partner = self.require_partner(&db_tx, &couple, &me).await?;
            Ok(CoupleView {
                couple,
                me,
                partner,
            })
        })
    }

    pub async fn pairing_state(&self, identity: &Identity) -> ResultEngine<PairingState> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let profile = self.require_profile(&db_tx, identity).await?;
            if let Some(couple) = self.resolve_couple(&db_tx, &profile).await? {
                return Ok(PairingState::Paired {
                    couple_id: couple.id,
                });
            }
            let received = self
                .pending_where(&db_tx, Self::received_condition(&profile, identity), now)
                .await?;
            if received.iter().any(|i| i.sender_id != profile.id) {
                return Ok(PairingState::InvitationReceived);
            }
            let sent = self
                .pending_where(
                    &db_tx,
                    Condition::all()
                        .add(invitations::Column::SenderId.eq(profile.id.to_string())),
                    now,
                )
                .await?;
            if !sent.is_empty() {
                return Ok(PairingState::InvitationSent);
            }
            Ok(PairingState::Unpaired)
        })
    }

    /// Deletes the caller's profile and everything hanging off it.
    ///
    /// In one transaction: the profile's expenses and invitations are
    /// deleted, its couple is dissolved (the partner's `couple_id` cleared,
    /// the partner's expenses detached from the couple), then the profile
    /// itself is removed.
    pub async fn delete_profile(&self, identity: &Identity) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let profile = self.require_profile(&db_tx, identity).await?;
            let profile_id = profile.id.to_string();

            expenses::Entity::delete_many()
                .filter(expenses::Column::PaidBy.eq(profile_id.as_str()))
                .exec(&db_tx)
                .await?;

            invitations::Entity::delete_many()
                .filter(
                    Condition::any()
                        .add(invitations::Column::SenderId.eq(profile_id.as_str()))
                        .add(invitations::Column::RecipientId.eq(profile_id.as_str())),
                )
                .exec(&db_tx)
                .await?;

            let owned_couples = couples::Entity::find()
                .filter(
                    Condition::any()
                        .add(couples::Column::MemberA.eq(profile_id.as_str()))
                        .add(couples::Column::MemberB.eq(profile_id.as_str())),
                )
                .all(&db_tx)
                .await?;
            for couple in owned_couples {
                expenses::Entity::update_many()
                    .col_expr(expenses::Column::CoupleId, Expr::value(Option::<String>::None))
                    .filter(expenses::Column::CoupleId.eq(couple.id.as_str()))
                    .exec(&db_tx)
                    .await?;
                profiles::Entity::update_many()
                    .col_expr(profiles::Column::CoupleId, Expr::value(Option::<String>::None))
                    .filter(profiles::Column::CoupleId.eq(couple.id.as_str()))
                    .exec(&db_tx)
                    .await?;
                couples::Entity::delete_by_id(couple.id.clone())
                    .exec(&db_tx)
                    .await?;
                tracing::info!("couple {} dissolved", couple.id);
            }

            profiles::Entity::delete_by_id(profile_id.clone())
                .exec(&db_tx)
                .await?;
            tracing::info!("deleted profile {profile_id}");
            Ok(())
        })
    }
}
