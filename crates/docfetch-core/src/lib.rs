//! docfetch core: fetch a batch of documents referenced by a tabular dataset,
//! with bounded concurrency, and reconcile the results into a status report and
//! a persistent metadata store.
//!
//! Pipeline: [`dataset`] → [`queue`] (entry filter, batch selector) →
//! [`scheduler`] (driving [`worker`]s) → [`reconcile`] → [`report`] + [`metadata`].
//! [`run`] wires the stages together.

pub mod config;
pub mod dataset;
pub mod error;
pub mod fetch;
pub mod identifier;
pub mod logging;
pub mod metadata;
pub mod queue;
pub mod reconcile;
pub mod report;
pub mod run;
pub mod scheduler;
pub mod storage;
pub mod table;
pub mod worker;
