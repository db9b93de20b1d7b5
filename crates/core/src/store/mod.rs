pub mod arena;
pub mod watchlist_store;
