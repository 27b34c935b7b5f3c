//! Domain types shared by every flow: keypad amounts, simulation tokens,
//! payment wire types, transactions, navigation events, and the gateway port.

pub mod amount;
pub mod navigation;
pub mod payment;
pub mod ports;
pub mod simulation;
pub mod transaction;
