//! # bus-harvest
//!
//! Polls a service bus, discovers what each service advertises, fetches
//! every advertised capability, normalizes the payloads into one record
//! schema, and serves the accumulated records over a small HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌───────────┐   ┌─────────┐   ┌───────────┐   ┌─────────┐
//! │ Scheduler │──▶│ Discovery │──▶│  Fetch  │──▶│ Normalize │──▶│  Store  │
//! │  (tick)   │   │  (pass)   │   │ (HTTP)  │   │  (pure)   │   │ (RwLock)│
//! └───────────┘   └───────────┘   └─────────┘   └───────────┘   └────┬────┘
//!                                                                    │
//!                                                              ┌─────▼─────┐
//!                                                              │  Server   │
//!                                                              │  (/data)  │
//!                                                              └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! harvest mock-bus                   # demo bus on 127.0.0.1:8001
//! harvest serve                      # poll it, serve on 127.0.0.1:8000
//! curl 'localhost:8000/data?kind=telemetry'
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Record and bus protocol types |
//! | [`normalize`] | Payload → record mapping |
//! | [`fetch`] | Bounded-timeout JSON fetcher |
//! | [`discovery`] | One discovery pass over the bus |
//! | [`scheduler`] | Fixed-delay polling loop |
//! | [`store`] | Shared in-memory record store |
//! | [`server`] | Query HTTP server |
//! | [`mock_bus`] | Demo bus for local trials and tests |

pub mod config;
pub mod discovery;
pub mod fetch;
pub mod mock_bus;
pub mod models;
pub mod normalize;
pub mod scheduler;
pub mod server;
pub mod store;
