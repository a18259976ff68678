pub mod close_position;
pub mod collect_fees;
pub mod collect_protocol_fees;
pub mod decrease_liquidity;
pub mod increase_liquidity;
pub mod increase_observation_cardinality;
pub mod initialize_bitmap;
pub mod initialize_config;
pub mod initialize_fee_tier;
pub mod initialize_pool;
pub mod initialize_tick;
pub mod open_position;
pub mod set_config_authority;
pub mod set_protocol_fee;
pub mod swap;
pub mod tokenized;

pub use close_position::*;
pub use collect_fees::*;
pub use collect_protocol_fees::*;
pub use decrease_liquidity::*;
pub use increase_liquidity::*;
pub use increase_observation_cardinality::*;
pub use initialize_bitmap::*;
pub use initialize_config::*;
pub use initialize_fee_tier::*;
pub use initialize_pool::*;
pub use initialize_tick::*;
pub use open_position::*;
pub use set_config_authority::*;
pub use set_protocol_fee::*;
pub use swap::*;
pub use tokenized::*;
