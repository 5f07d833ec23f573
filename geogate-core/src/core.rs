//! Host-driven API: RedirectCore receives events from the host and returns actions.
//!
//! The core owns NavigationState. Hosts perform the I/O an action names and report the
//! outcome back as the next event.

use crate::country::CountryCode;
use crate::decision::RemoteDecision;
use crate::payload::{LookupPayload, DEFAULT_APPCODE, DEFAULT_PANEL};

/// Pipeline phase. Once `Decided` nothing moves it again for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ResolvingCountry,
    CountryResolved(CountryCode),
    FetchingDecision(CountryCode),
    Decided,
}

impl Phase {
    /// Stable numeric tag for the C ABI.
    pub fn as_u8(&self) -> u8 {
        match self {
            Phase::Idle => 0,
            Phase::ResolvingCountry => 1,
            Phase::CountryResolved(_) => 2,
            Phase::FetchingDecision(_) => 3,
            Phase::Decided => 4,
        }
    }
}

/// What the display layer reads. Written only by RedirectCore.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationState {
    /// Empty until a decision asks for navigation.
    pub target_url: String,
    pub warmup_loaded: bool,
}

/// Events the host reports.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Start,
    CountryResolved(CountryCode),
    /// Permission denied, no fix, or no territory matched.
    CountryUnresolved,
    /// Host has issued the request named by `Action::FetchDecision`.
    FetchStarted,
    DecisionReceived(RemoteDecision),
    /// Network failure or malformed response.
    DecisionFailed,
    WarmupLoaded,
}

/// Action for host to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ResolveCountry,
    FetchDecision(LookupPayload),
    /// target_url changed; display should load it.
    Navigate(String),
}

/// Redirect decision state machine.
pub struct RedirectCore {
    phase: Phase,
    nav: NavigationState,
    appcode: String,
    panel: String,
    fetches_issued: u32,
}

impl RedirectCore {
    pub fn new() -> Self {
        Self::with_payload_constants(DEFAULT_APPCODE, DEFAULT_PANEL)
    }

    /// Use host-provided appcode and panel in the lookup payload.
    pub fn with_payload_constants(appcode: impl Into<String>, panel: impl Into<String>) -> Self {
        Self {
            phase: Phase::Idle,
            nav: NavigationState::default(),
            appcode: appcode.into(),
            panel: panel.into(),
            fetches_issued: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.nav
    }

    /// Payload for the country being looked up, while a decision is pending.
    pub fn pending_payload(&self) -> Option<LookupPayload> {
        match self.phase {
            Phase::CountryResolved(country) | Phase::FetchingDecision(country) => Some(
                LookupPayload::new(country, self.appcode.clone(), self.panel.clone()),
            ),
            _ => None,
        }
    }

    /// Number of FetchDecision actions emitted so far (0 or 1).
    pub fn fetches_issued(&self) -> u32 {
        self.fetches_issued
    }

    /// Apply one event. Events that do not fit the current phase are ignored.
    pub fn handle(&mut self, event: Event) -> Option<Action> {
        match (self.phase, event) {
            (_, Event::WarmupLoaded) => {
                self.nav.warmup_loaded = true;
                None
            }
            (Phase::Idle, Event::Start) => {
                self.phase = Phase::ResolvingCountry;
                Some(Action::ResolveCountry)
            }
            (Phase::ResolvingCountry, Event::CountryResolved(country)) => {
                self.phase = Phase::CountryResolved(country);
                if self.fetches_issued > 0 {
                    return None;
                }
                self.fetches_issued += 1;
                self.pending_payload().map(Action::FetchDecision)
            }
            // Stall: no fallback country, no retry.
            (Phase::ResolvingCountry, Event::CountryUnresolved) => None,
            (Phase::CountryResolved(country), Event::FetchStarted) => {
                self.phase = Phase::FetchingDecision(country);
                None
            }
            (
                Phase::CountryResolved(_) | Phase::FetchingDecision(_),
                Event::DecisionReceived(decision),
            ) => {
                self.phase = Phase::Decided;
                self.apply_decision(&decision)
            }
            (Phase::CountryResolved(_) | Phase::FetchingDecision(_), Event::DecisionFailed) => {
                self.phase = Phase::Decided;
                None
            }
            _ => None,
        }
    }

    fn apply_decision(&mut self, decision: &RemoteDecision) -> Option<Action> {
        let url = decision.navigation_target()?;
        if !self.nav.target_url.is_empty() {
            return None;
        }
        self.nav.target_url = url.to_string();
        Some(Action::Navigate(self.nav.target_url.clone()))
    }
}

impl Default for RedirectCore {
    fn default() -> Self {
        Self::new()
    }
}
