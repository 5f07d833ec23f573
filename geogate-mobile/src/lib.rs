//! geogate host runtime: permission prompt, one position fix, country lookup, remote decision,
//! and the NavigationState the display layer follows.
//!
//! Platform capabilities (permission dialogs, location, webviews) come in through traits; the
//! decision state machine itself lives in geogate-core.

pub mod client;
pub mod config;
pub mod controller;
pub mod display;
pub mod geo;
pub mod location;
pub mod permission;

pub use client::{ClientError, ConfigClient, DecisionSource};
pub use config::Config;
pub use controller::{RedirectController, WarmupSignal};
pub use display::DisplaySurface;
pub use geo::{CountryResolver, GeoResolver, ResolveError};
pub use location::{LocationError, PositionOptions, PositionProvider};
pub use permission::{LocationPermissionProvider, Platform, PlatformPermission};
