//! Coarse-location permission: one provider trait, one strategy per platform flow.
//!
//! Both flows collapse to granted / not granted. The host picks the strategy once, at
//! composition time, from [`Platform`].

use std::future::Future;

use serde::Deserialize;
use tracing::debug;

/// Which permission flow the host platform uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Authorization prompt with a usage scope (iOS style).
    WhenInUse,
    /// Runtime permission request by permission id (Android style).
    #[default]
    Runtime,
}

#[derive(Debug, thiserror::Error)]
pub enum PermissionError {
    #[error("platform permission request failed: {0}")]
    Platform(String),
}

/// Grants location access or not. Exactly one platform prompt per call.
pub trait LocationPermissionProvider: Send + Sync {
    fn request(&self) -> impl Future<Output = Result<bool, PermissionError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationScope {
    WhenInUse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    Granted,
    Denied,
    Disabled,
    Restricted,
}

/// Platform capability behind the authorization-prompt flow.
pub trait AuthorizationApi: Send + Sync {
    fn request_authorization(
        &self,
        scope: AuthorizationScope,
    ) -> impl Future<Output = Result<AuthorizationStatus, PermissionError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    AccessCoarseLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    NeverAskAgain,
}

/// Platform capability behind the runtime-permission flow.
pub trait RuntimePermissionApi: Send + Sync {
    fn request_permission(
        &self,
        permission: Permission,
    ) -> impl Future<Output = Result<PermissionStatus, PermissionError>> + Send;
}

/// Asks for when-in-use authorization; only `Granted` counts.
pub struct WhenInUseAuthorization<A>(pub A);

impl<A: AuthorizationApi> LocationPermissionProvider for WhenInUseAuthorization<A> {
    async fn request(&self) -> Result<bool, PermissionError> {
        let status = self.0.request_authorization(AuthorizationScope::WhenInUse).await?;
        debug!(?status, "location authorization");
        Ok(status == AuthorizationStatus::Granted)
    }
}

/// Requests the coarse-location runtime permission; only `Granted` counts.
pub struct RuntimePermission<R>(pub R);

impl<R: RuntimePermissionApi> LocationPermissionProvider for RuntimePermission<R> {
    async fn request(&self) -> Result<bool, PermissionError> {
        let status = self
            .0
            .request_permission(Permission::AccessCoarseLocation)
            .await?;
        debug!(?status, "location permission");
        Ok(status == PermissionStatus::Granted)
    }
}

/// Strategy chosen by platform.
pub enum PlatformPermission<A, R> {
    WhenInUse(WhenInUseAuthorization<A>),
    Runtime(RuntimePermission<R>),
}

impl<B> PlatformPermission<B, B>
where
    B: AuthorizationApi + RuntimePermissionApi,
{
    /// Wrap a bridge that exposes both flows in the strategy for `platform`.
    pub fn select(platform: Platform, bridge: B) -> Self {
        match platform {
            Platform::WhenInUse => Self::WhenInUse(WhenInUseAuthorization(bridge)),
            Platform::Runtime => Self::Runtime(RuntimePermission(bridge)),
        }
    }
}

impl<A: AuthorizationApi, R: RuntimePermissionApi> LocationPermissionProvider
    for PlatformPermission<A, R>
{
    async fn request(&self) -> Result<bool, PermissionError> {
        match self {
            Self::WhenInUse(p) => p.request().await,
            Self::Runtime(p) => p.request().await,
        }
    }
}
