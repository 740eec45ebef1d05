//! # Blueprint Architecture
//!
//! Blueprintapp is a **UI-agnostic library** for blueprint courses: a master
//! course whose content is copied into subscribed child courses. It decides
//! which attributes of those copies the child may edit, remembers which ones
//! it did edit, and tells the next sync what it may overwrite.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands, owns store + registry         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - template, sync, lock, edit, status, preview, ...         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Engine (restrictor/, lifecycle.rs, preload.rs)             │
//! │  - Validation, downstream tracking, import reconciliation   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - ContentTagStore trait                                    │
//! │  - FileStore (production), InMemoryStore (testing)          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine works on any record implementing
//! [`restrictor::Restrictable`]; hosts with their own models implement that
//! trait and drive [`lifecycle::Lifecycle`] from their persistence hooks.
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! Nothing in this crate prints, reads stdin, or exits. Storage I/O goes
//! through the store; everything else returns Rust values.
//!
//! ## Testing Strategy
//!
//! 1. **Engine and store** modules: unit tests against `InMemoryStore` and the
//!    `StoreFixture` builder.
//! 2. **Commands**: unit tests asserting on `CmdResult`.
//! 3. **Integration** (`tests/`): the file store across handles and threads,
//!    and full sync scenarios.

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod init;
pub mod lifecycle;
pub mod model;
pub mod preload;
pub mod restrictor;
pub mod schema;
pub mod store;
pub mod summary;
pub mod tags;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
