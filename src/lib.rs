pub mod core;
pub mod crypto;
pub mod miner;
pub mod pow;
