use crate::constants::seeds;
use crate::errors::MeridianError;
use crate::state::{tick_bitmap, Pool, TickBitmapState};
use anchor_lang::prelude::*;

/// Create the zeroed bitmap word covering 256 consecutive tick-spacing
/// multiples at a signed word position.
#[derive(Accounts)]
#[instruction(word_pos: i16)]
pub struct InitializeBitmap<'info> {
    /// The pool this bitmap word belongs to (zero-copy)
    pub pool: AccountLoader<'info, Pool>,

    /// The bitmap account to initialize (zero-copy)
    #[account(
        init,
        payer = payer,
        space = TickBitmapState::LEN,
        seeds = [
            seeds::BITMAP_SEED,
            pool.key().as_ref(),
            &word_pos.to_le_bytes()
        ],
        bump
    )]
    pub bitmap: AccountLoader<'info, TickBitmapState>,

    /// The payer for account creation
    #[account(mut)]
    pub payer: Signer<'info>,

    /// System program
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<InitializeBitmap>, word_pos: i16) -> Result<()> {
    let pool = ctx.accounts.pool.load()?;
    require!(
        word_pos >= tick_bitmap::min_word_pos(pool.tick_spacing)
            && word_pos <= tick_bitmap::max_word_pos(pool.tick_spacing),
        MeridianError::BitmapWordOutOfBounds
    );
    drop(pool);

    let mut bitmap = ctx.accounts.bitmap.load_init()?;
    bitmap.pool = ctx.accounts.pool.key().to_bytes();
    bitmap.word_pos = word_pos;
    bitmap.bump = ctx.bumps.bitmap;

    Ok(())
}
