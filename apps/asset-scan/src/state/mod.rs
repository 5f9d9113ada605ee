//! # State Module
//!
//! Objects built once at startup and handed to every command.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │   run() ── builds ──┬──────────────────────┐                           │
//! │                     ▼                      ▼                           │
//! │            ┌──────────────────┐   ┌──────────────────┐                 │
//! │            │   StoreState     │   │   ConfigState    │                 │
//! │            │                  │   │                  │                 │
//! │            │  InventoryStore  │   │  AppConfig       │                 │
//! │            │  (lazy connect,  │   │  (read-only)     │                 │
//! │            │   read cache)    │   │                  │                 │
//! │            └──────────────────┘   └──────────────────┘                 │
//! │                     │                      │                           │
//! │                     └──────► dispatch(command, &store, &config, out)   │
//! │                                                                         │
//! │  The store is never a global: tests build their own StoreState on the  │
//! │  in-memory backend.                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod store;

pub use config::ConfigState;
pub use store::StoreState;
