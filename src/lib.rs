//! # Selly relay
//!
//! Thin HTTP front end for a hosted multi-agent briefing pipeline.
//!
//! ## Architecture
//!
//! ```text
//!   frontend ──POST /generate_report──▶ relay ──threads/messages/runs──▶ agents service
//!                                                                         │
//!                                          SellyOrchestrator ◀────────────┘
//!                                            ├── SellyCRM
//!                                            ├── SellyWebCrawler
//!                                            └── SellyBriefing
//! ```
//!
//! ## Request Flow
//! 1. Open a fresh thread on the agents service
//! 2. Post the company name as a user message
//! 3. Run the orchestrator and wait for a terminal status
//! 4. Return the last assistant text, or the run's error
//!
//! ## Modules
//! - `agents`: agents service client
//! - `provision`: orchestrator resolution and topology provisioning
//! - `relay`: report generation
//! - `api`: HTTP routes

pub mod agents;
pub mod api;
pub mod config;
pub mod provision;
pub mod relay;

pub use config::Config;
