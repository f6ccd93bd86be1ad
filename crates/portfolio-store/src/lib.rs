pub mod activity;
pub mod db;
pub mod models;
pub mod positions;
pub mod prices;
pub mod sessions;
pub mod symbols;
pub mod users;
pub mod watchlist;

pub use db::PortfolioDb;
pub use models::*;
pub use positions::PositionStore;
pub use prices::PriceStore;
pub use sessions::SessionStore;
pub use symbols::SymbolStore;
pub use users::UserStore;
pub use watchlist::WatchlistStore;
