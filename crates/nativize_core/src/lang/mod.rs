//! Target language vocabulary registries.
//!
//! Callers work with **stable IDs** (e.g. `PrimitiveId`, `BinaryOpId`) and look up spellings and metadata via
//! registry tables instead of scattering string comparisons across the backend.
//!
//! ## Notes
//! - Registries are intentionally **pure**: no model types, no IO, no side effects.
//!
//! ## Examples
//! ```rust
//! use nativize_core::lang::primitives::{self, PrimitiveId};
//!
//! assert_eq!(primitives::from_dotnet_name("System.Int32"), Some(PrimitiveId::Int32));
//! assert_eq!(primitives::info_for(PrimitiveId::Int32).cpp_name, "::System::Int32");
//! ```

pub mod cpp_keywords;
pub mod operators;
pub mod primitives;
pub mod runtime;
