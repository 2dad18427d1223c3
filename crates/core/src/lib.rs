//! # fhirlite Core
//!
//! Core data-access and validation logic for the fhirlite record server.
//!
//! This crate contains everything that touches the relational store:
//! - Schema provisioning (idempotent, run once at process start)
//! - Patient and Observation repositories (one transaction per operation)
//! - The append-only audit log
//! - Pure payload validation, run before any repository call
//!
//! **No API concerns**: authentication, HTTP routing and response shaping
//! belong in `api-rest`.

#![warn(rust_2018_idioms)]

pub mod db;
pub mod error;
pub mod model;
pub mod repository;
pub mod validation;

pub use error::{RecordError, RecordResult};
pub use model::{
    AuditAction, Gender, LogEntry, Observation, ObservationDraft, ObservationPayload, Patient,
    PatientDraft, PatientPage, PatientPatch, PatientPayload, PatientUpdatePayload, ResourceKind,
};
pub use repository::audit::AuditLog;
pub use repository::observation::ObservationRepository;
pub use repository::patient::{PatientRepository, MAX_PAGE_SIZE};
