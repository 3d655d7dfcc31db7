//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points in the hexagonal architecture.
//! They are traits that adapters implement to integrate with the
//! persistence backend.
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │        CLI / caller     │
//!                    └────────────┬────────────┘
//!                                 │
//!                    ┌────────────▼────────────┐
//!                    │     Domain + Port       │
//!                    └────────────┬────────────┘
//!                                 │
//!        ┌────────────────────────┼────────────────────────┐
//!        ▼                        ▼                        ▼
//! ┌─────────────┐         ┌──────────────┐         ┌──────────────┐
//! │ Entity      │         │  Retention   │         │  Timeline /  │
//! │ stores      │         │  engine      │         │  reports     │
//! └─────────────┘         └──────────────┘         └──────────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`outbound::store`] - Session, position, order and event persistence
//! - [`outbound::retention`] - Cascading purge policies
//! - [`outbound::report`] - Timeline projection and session reports

pub mod outbound;
