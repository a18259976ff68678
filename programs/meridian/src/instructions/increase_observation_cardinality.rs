use crate::constants::oracle::OBSERVATION_SLOTS;
use crate::errors::MeridianError;
use crate::events::ObservationCardinalityIncreased;
use crate::state::Pool;
use anchor_lang::prelude::*;

/// Raise the target capacity of a pool's oracle ring. The actual cardinality
/// grows lazily as writes land past the old capacity; shrinking is not
/// supported.
#[derive(Accounts)]
pub struct IncreaseObservationCardinality<'info> {
    #[account(mut)]
    pub pool: AccountLoader<'info, Pool>,

    /// Anyone may pay to extend a pool's oracle
    pub payer: Signer<'info>,
}

pub fn handler(
    ctx: Context<IncreaseObservationCardinality>,
    observation_cardinality_next: u16,
) -> Result<()> {
    let mut pool = ctx.accounts.pool.load_mut()?;
    require!(pool.is_unlocked(), MeridianError::PoolLocked);

    require!(
        observation_cardinality_next > pool.observation_cardinality_next
            && observation_cardinality_next as usize <= OBSERVATION_SLOTS,
        MeridianError::OracleCardinalityTooSmall
    );

    let cardinality_next_old = pool.observation_cardinality_next;
    pool.observation_cardinality_next = observation_cardinality_next;

    emit!(ObservationCardinalityIncreased {
        pool: ctx.accounts.pool.key(),
        cardinality_next_old,
        cardinality_next_new: observation_cardinality_next,
    });

    Ok(())
}
