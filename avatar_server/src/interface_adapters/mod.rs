// Interface adapters: HTTP gateway, upstream client, registry, bot and speech stub.

pub mod bot;
pub mod clients;
pub mod handlers;
pub mod protocol;
pub mod routes;
pub mod speech;
pub mod state;
