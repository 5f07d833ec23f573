//! GeoResolver: permission → one position fix → country code.

use std::future::Future;

use geogate_core::{Coordinate, CountryCode, CountryLookup};
use tracing::{debug, info, warn};

use crate::location::{LocationError, PositionOptions, PositionProvider};
use crate::permission::{LocationPermissionProvider, PermissionError};

/// Why no country was produced. Never fatal; the resolver logs these and yields `None`.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("permission request failed: {0}")]
    Permission(#[from] PermissionError),
    #[error("location unavailable: {0}")]
    LocationUnavailable(#[from] LocationError),
    #[error("no territory at lon {}, lat {}", .0.longitude, .0.latitude)]
    CountryLookupMiss(Coordinate),
}

/// Something that produces the device country once. The controller depends on this seam.
pub trait CountryResolver: Send + Sync {
    fn resolve(&self) -> impl Future<Output = Option<CountryCode>> + Send;
}

pub struct GeoResolver<P, L, C> {
    permission: P,
    position: L,
    lookup: C,
    options: PositionOptions,
}

impl<P, L, C> GeoResolver<P, L, C>
where
    P: LocationPermissionProvider,
    L: PositionProvider,
    C: CountryLookup + Send + Sync,
{
    pub fn new(permission: P, position: L, lookup: C) -> Self {
        Self {
            permission,
            position,
            lookup,
            options: PositionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PositionOptions) -> Self {
        self.options = options;
        self
    }

    /// Same pipeline as `resolve`, keeping the failure reason.
    pub async fn try_resolve(&self) -> Result<CountryCode, ResolveError> {
        if !self.permission.request().await? {
            return Err(ResolveError::PermissionDenied);
        }
        let coordinate = self.position.current_position(self.options).await?;
        debug!(
            longitude = coordinate.longitude,
            latitude = coordinate.latitude,
            "position fix"
        );
        self.lookup
            .lookup(coordinate)
            .ok_or(ResolveError::CountryLookupMiss(coordinate))
    }
}

impl<P, L, C> CountryResolver for GeoResolver<P, L, C>
where
    P: LocationPermissionProvider,
    L: PositionProvider,
    C: CountryLookup + Send + Sync,
{
    async fn resolve(&self) -> Option<CountryCode> {
        match self.try_resolve().await {
            Ok(country) => {
                info!(%country, "country resolved");
                Some(country)
            }
            Err(ResolveError::PermissionDenied) => {
                info!("location permission not granted; country unset");
                None
            }
            Err(e) => {
                warn!(error = %e, "country unresolved");
                None
            }
        }
    }
}
