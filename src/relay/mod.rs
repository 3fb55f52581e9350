//! Token exchange relay: HTTP surface

pub mod exchange;
pub mod origin;
mod router;
mod server;

pub use exchange::{ExchangeRequest, MISSING_CODE};
pub use origin::{OriginPolicy, origin_guard};
pub use router::{AppState, TOKEN_EXCHANGE_PATH, create_router};
pub use server::RelayServer;
