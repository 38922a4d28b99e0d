//! Agora: task lifecycle orchestration for a decentralized freelance-task
//! marketplace.
//!
//! All durable marketplace state lives on an external ledger (smart
//! contract). This crate is the client-side core that defines the legal
//! state transitions a task can undergo, maps the ledger's asynchronous
//! operations onto those transitions, reconciles cached task state with
//! the ledger after every mutation, and derives the single action the
//! current viewer may take on a task.
//!
//! # Architecture
//!
//! Agora follows hexagonal architecture principles:
//!
//! - **Domain**: Pure task model, transition guards, and view projection
//!   with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for the ledger, the wallet, and
//!   blob storage
//! - **Adapters**: Concrete implementations of ports (contract client,
//!   in-memory ledger, content-addressed blob store)
//! - **Services**: Orchestration of transitions and cache reconciliation
//!
//! The ledger stays authoritative throughout: cached state never advances
//! ahead of a confirmed transaction, and every transition is permission
//! checked locally before a single byte goes over the wire.

pub mod task;
