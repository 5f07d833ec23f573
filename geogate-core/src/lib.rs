//! geogate decision core: country code in, lookup payload out, remote decision in, target URL out.
//! Host-driven: no I/O; host passes events and receives actions.

pub mod boundaries;
pub mod country;
pub mod decision;
pub mod payload;

pub use boundaries::{BoundaryError, BoundaryTable};
pub use country::{Coordinate, CountryCode, CountryCodeError, CountryLookup};
pub use decision::{parse_decision, DecisionError, RemoteDecision};
pub use payload::{build_query, LookupPayload, DEFAULT_APPCODE, DEFAULT_PANEL};
pub use crate::core::{Action, Event, NavigationState, Phase, RedirectCore};

pub mod core;
pub mod ffi;
