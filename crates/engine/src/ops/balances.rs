use crate::{Balance, Identity, ResultEngine, compute_balance};

use super::{Engine, with_tx};

impl Engine {
    /// Balance of the caller's couple under the configured settlement mode.
    ///
    /// `member_a` of the result is the couple's first member, not
    /// necessarily the caller.
    pub async fn balance(&self, identity: &Identity) -> ResultEngine<Balance> {
        with_tx!(self, |db_tx| {
            let me = self.require_profile(&db_tx, identity).await?;
            let couple = self.require_couple(&db_tx, &me).await?;
            let partner = self.require_partner(&db_tx, &couple, &me).await?;
            let (member_a, member_b) = if couple.member_a == me.id {
                (me, partner)
            } else {
                (partner, me)
            };
            let expenses = self.couple_expenses(&db_tx, &couple).await?;
            compute_balance(&expenses, &member_a, &member_b, self.settlement_mode)
        })
    }
}
