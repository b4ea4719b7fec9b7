//! The stanza type-checking engine.
//!
//! This crate is organized into several submodules:
//! - `control_flow` - Final-control-action classification over statement lists
//! - `expression` - Expression type inference
//! - `body` - Function-body walking and return/yield part collection
//! - `return_type` - The return-type verification engine
//! - `manipulation` - Pending signature-edit buffer for auto-fixes
//! - `analyzer` - Per-file analysis coordination

pub mod analyzer;
pub mod body;
pub mod control_flow;
pub mod expression;
pub mod manipulation;
pub mod return_type;

pub use analyzer::{AnalysisResult, FileAnalyzer};
pub use body::CollectedReturns;
pub use control_flow::ControlAction;
pub use expression::InferenceScope;
pub use manipulation::{ManipulationBuffer, SignatureEdit};
pub use return_type::{FunctionLikeNode, ReturnTypeVerifier, Verdict};
