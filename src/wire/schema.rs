//! Static account-ordering schema for pump.fun instructions, mirroring the
//! program IDL. Used to find the mint account position for a given
//! instruction discriminator without hand-coding the index at every call
//! site.

use crate::wire::discriminator;

const CREATE_ACCOUNTS: &[&str] = &[
    "mint",
    "mint_authority",
    "bonding_curve",
    "associated_bonding_curve",
    "global",
    "mpl_token_metadata",
    "metadata",
    "user",
    "system_program",
    "token_program",
    "associated_token_program",
    "rent",
    "event_authority",
    "program",
];

const BUY_ACCOUNTS: &[&str] = &[
    "global",
    "fee_recipient",
    "mint",
    "bonding_curve",
    "associated_bonding_curve",
    "associated_user",
    "user",
    "system_program",
    "token_program",
    "rent",
    "event_authority",
    "program",
];

const SELL_ACCOUNTS: &[&str] = &[
    "global",
    "fee_recipient",
    "mint",
    "bonding_curve",
    "associated_bonding_curve",
    "associated_user",
    "user",
    "system_program",
    "associated_token_program",
    "event_authority",
    "program",
];

/// Index of the `mint` account within an instruction's account list, keyed
/// by the instruction's discriminator. `None` for discriminators we don't
/// route (anything other than create/buy/sell).
pub fn mint_index_for(discriminator: u64) -> Option<usize> {
    let accounts = match discriminator {
        d if d == self::discriminator::CREATE => CREATE_ACCOUNTS,
        d if d == self::discriminator::BUY => BUY_ACCOUNTS,
        d if d == self::discriminator::SELL => SELL_ACCOUNTS,
        _ => return None,
    };
    accounts.iter().position(|&name| name == "mint")
}

/// Index of the `user` account — the trade actor — for buy/sell instructions.
pub fn user_index_for(discriminator: u64) -> Option<usize> {
    let accounts = match discriminator {
        d if d == self::discriminator::BUY => BUY_ACCOUNTS,
        d if d == self::discriminator::SELL => SELL_ACCOUNTS,
        _ => return None,
    };
    accounts.iter().position(|&name| name == "user")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_and_sell_share_the_same_mint_position() {
        let buy = mint_index_for(discriminator::BUY).unwrap();
        let sell = mint_index_for(discriminator::SELL).unwrap();
        assert_eq!(buy, sell);
        assert_eq!(buy, 2);
    }

    #[test]
    fn unknown_discriminator_has_no_mint_position() {
        assert_eq!(mint_index_for(0), None);
    }
}
