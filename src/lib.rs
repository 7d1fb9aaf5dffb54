//! Life-event driven financial planning: event tracking, goal selection and
//! SIP sizing, backed by a remote statement-analysis and recommendation
//! service.

pub mod backend;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod domain;
pub mod error;
pub mod journal;
pub mod monitoring;
pub mod plan;
pub mod reconcile;
pub mod selection;
pub mod sip;
pub mod state;
pub mod time;
