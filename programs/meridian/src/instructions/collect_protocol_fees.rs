use crate::constants::seeds;
use crate::errors::MeridianError;
use crate::events::CollectProtocolEvent;
use crate::state::{MeridianConfig, Pool};
use anchor_lang::prelude::*;
use anchor_spl::token_interface::{
    transfer_checked, Mint, TokenAccount, TokenInterface, TransferChecked,
};

/// Withdraw accrued protocol fees from a pool. Fee-authority only.
#[derive(Accounts)]
pub struct CollectProtocolFees<'info> {
    /// The global config
    #[account(
        seeds = [seeds::CONFIG_SEED],
        bump = config.bump,
    )]
    pub config: Account<'info, MeridianConfig>,

    /// The pool to collect from (zero-copy)
    #[account(mut)]
    pub pool: AccountLoader<'info, Pool>,

    /// Token 0 mint
    pub token_mint_0: InterfaceAccount<'info, Mint>,

    /// Token 1 mint
    pub token_mint_1: InterfaceAccount<'info, Mint>,

    /// Pool vault for token 0
    #[account(mut)]
    pub token_vault_0: InterfaceAccount<'info, TokenAccount>,

    /// Pool vault for token 1
    #[account(mut)]
    pub token_vault_1: InterfaceAccount<'info, TokenAccount>,

    /// Recipient token 0 account
    #[account(mut)]
    pub recipient_token_0: InterfaceAccount<'info, TokenAccount>,

    /// Recipient token 1 account
    #[account(mut)]
    pub recipient_token_1: InterfaceAccount<'info, TokenAccount>,

    /// Fee authority
    pub authority: Signer<'info>,

    /// Token program
    pub token_program: Interface<'info, TokenInterface>,
}

pub fn handler(
    ctx: Context<CollectProtocolFees>,
    amount_0_requested: u64,
    amount_1_requested: u64,
) -> Result<()> {
    require!(
        ctx.accounts
            .config
            .is_fee_authority(&ctx.accounts.authority.key()),
        MeridianError::NotFeeAuthority
    );

    let mut pool = ctx.accounts.pool.load_mut()?;
    require!(pool.is_unlocked(), MeridianError::PoolLocked);
    pool.unlocked = 0;
    require!(
        pool.token_mint_0 == ctx.accounts.token_mint_0.key().to_bytes()
            && pool.token_mint_1 == ctx.accounts.token_mint_1.key().to_bytes(),
        MeridianError::InvalidTokenMint
    );
    require!(
        pool.token_vault_0 == ctx.accounts.token_vault_0.key().to_bytes()
            && pool.token_vault_1 == ctx.accounts.token_vault_1.key().to_bytes(),
        MeridianError::InvalidVault
    );

    let amount_0 = amount_0_requested.min(pool.protocol_fees_0);
    let amount_1 = amount_1_requested.min(pool.protocol_fees_1);
    pool.protocol_fees_0 -= amount_0;
    pool.protocol_fees_1 -= amount_1;

    let token_mint_0_bytes = pool.token_mint_0;
    let token_mint_1_bytes = pool.token_mint_1;
    let fee_rate = pool.fee_rate;
    let pool_bump = pool.bump;
    drop(pool);

    let pool_seeds: &[&[u8]] = &[
        seeds::POOL_SEED,
        &token_mint_0_bytes,
        &token_mint_1_bytes,
        &fee_rate.to_le_bytes(),
        &[pool_bump],
    ];

    if amount_0 > 0 {
        transfer_checked(
            CpiContext::new_with_signer(
                ctx.accounts.token_program.to_account_info(),
                TransferChecked {
                    from: ctx.accounts.token_vault_0.to_account_info(),
                    mint: ctx.accounts.token_mint_0.to_account_info(),
                    to: ctx.accounts.recipient_token_0.to_account_info(),
                    authority: ctx.accounts.pool.to_account_info(),
                },
                &[pool_seeds],
            ),
            amount_0,
            ctx.accounts.token_mint_0.decimals,
        )?;
    }
    if amount_1 > 0 {
        transfer_checked(
            CpiContext::new_with_signer(
                ctx.accounts.token_program.to_account_info(),
                TransferChecked {
                    from: ctx.accounts.token_vault_1.to_account_info(),
                    mint: ctx.accounts.token_mint_1.to_account_info(),
                    to: ctx.accounts.recipient_token_1.to_account_info(),
                    authority: ctx.accounts.pool.to_account_info(),
                },
                &[pool_seeds],
            ),
            amount_1,
            ctx.accounts.token_mint_1.decimals,
        )?;
    }

    emit!(CollectProtocolEvent {
        pool: ctx.accounts.pool.key(),
        recipient: ctx.accounts.recipient_token_0.key(),
        amount_0,
        amount_1,
    });

    ctx.accounts.pool.load_mut()?.unlocked = 1;
    Ok(())
}
