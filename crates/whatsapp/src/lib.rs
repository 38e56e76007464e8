//! WhatsApp Integration - webhook-driven bot interface
//!
//! This crate provides the messaging interface for aurum:
//! - **Inbound** (`inbound`) - delivery model and owner-number matching
//! - **Idempotency** (`dedupe`) - bounded-window duplicate-delivery filter
//! - **Turn Router** (`router`) - one webhook turn end to end: dedupe, owner
//!   commands, the handoff gate, the state machine, effect execution
//! - **Owner Desk** (`owner`) - chat commands the store owner sends from
//!   their own number (`reply`, `approve`, `set gold`, ...)
//! - **Handoff** (`handoff`) - bot/agent mode switching + owner alerts
//! - **Approvals** (`approvals`) - pricing-approval workflow
//! - **Ledger** (`ledger`) - fail-safe activity log and inbox metadata
//! - **Provider** (`provider`) - REST channel implementation
//!
//! # Architecture
//!
//! ```text
//! Webhook → Deduper → TurnSerializer → TurnRouter → Flow Engine (core)
//!                                          ↓
//!            Session/Inbox/Approval stores + Rate Source + Channel
//! ```
//!
//! The provider wire format stays opaque: everything below the webhook
//! handler works in terms of `InboundDelivery` and `OutboundMessage`.

pub mod approvals;
pub mod dedupe;
pub mod handoff;
pub mod inbound;
pub mod ledger;
pub mod notify;
pub mod owner;
pub mod provider;
pub mod queue;
pub mod router;

#[cfg(test)]
pub(crate) mod testing;
