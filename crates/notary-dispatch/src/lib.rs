//! Action dispatch for the document notary.
//!
//! Turns `(user, hashes, action)` into contract calls and classifies the
//! outcome for the caller:
//!
//! | action | calls | result kind |
//! |---|---|---|
//! | `addDocument` | one `mutate("addDocument", [user, hashes[0]])` | `add` |
//! | `addMultiple` | one `mutate` per hash, in order; receipts collected | `add` |
//! | `validateOne` | one `read("validateOne", [user, hashes[0]])` | `validate` |
//! | `validateMultiple` | one `read` per hash, in order; results collected | `validate` |
//!
//! Anything else is an error result without touching the ledger.

pub mod action;
pub mod connector;
pub mod dispatcher;
pub mod error;
pub mod result;

pub use action::{Action, ActionRequest, ADD_DOCUMENT, VALIDATE_ONE};
pub use connector::{Connector, ContractBackend, LedgerConnector};
pub use dispatcher::Dispatcher;
pub use error::{DispatchError, DispatchResult};
pub use result::{ActionResult, Envelope, ResultKind, Status, STATUS_ERROR, STATUS_OK, UNEXPECTED_ACTION};
