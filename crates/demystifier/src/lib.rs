//! Backend for the legal document demystifier.
//!
//! A client uploads a contract to object storage through a signed URL, the
//! service indexes it into a managed RAG corpus, and the model's free-text
//! output is coerced into an auditable [`pipeline::DocumentSummary`] with
//! clause-level risk annotations. Follow-up questions are answered with
//! citations back to the source text.
//!
//! The trustworthy part of the pipeline lives in [`pipeline`]: recovering a
//! JSON object from arbitrary model prose and blending the model's risk
//! estimate with a deterministic keyword score. Everything else is
//! integration glue behind the [`rag`] and [`storage`] traits.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod rag;
pub mod storage;
pub mod telemetry;
