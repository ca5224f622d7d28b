//! Binary wire decoding: Anchor discriminators, versioned transactions,
//! instruction payloads, and the bonding curve account layout.

pub mod bonding_curve;
pub mod discriminator;
pub mod instruction;
pub mod schema;
pub mod transaction;
