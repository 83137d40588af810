pub mod polymarket;

pub use polymarket::PolymarketDataClient;
