//! Contract interface handling for the document notary.
//!
//! Turns a function name and a flat list of textual arguments into
//! calldata, and return data back into dynamic values. Interface
//! descriptions are parsed by `alloy-json-abi` (modern and legacy solc
//! forms); encoding and decoding go through `alloy-dyn-abi`.
//!
//! - [`FunctionRegistry`]: name and arity lookup, argument coercion
//! - [`PreparedCall`]: calldata paired with the declaration that decodes its output

pub mod error;
pub mod registry;

pub use alloy_dyn_abi::{DynSolType, DynSolValue};
pub use alloy_json_abi::{Function, JsonAbi, StateMutability};
pub use error::{AbiError, AbiResult};
pub use registry::{is_read_only, FunctionRegistry, PreparedCall};
