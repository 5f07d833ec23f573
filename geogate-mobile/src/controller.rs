//! RedirectController: drives RedirectCore through GeoResolver and ConfigClient, publishing
//! NavigationState to the display layer.

use std::sync::Arc;

use geogate_core::{Action, Event, NavigationState, Phase, RedirectCore};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::client::DecisionSource;
use crate::geo::CountryResolver;

/// Core plus the channel its state is published on. Every write goes through the core.
struct Shared {
    core: Mutex<RedirectCore>,
    tx: watch::Sender<NavigationState>,
}

impl Shared {
    async fn apply(&self, event: Event) -> (Option<Action>, Phase) {
        let mut core = self.core.lock().await;
        let action = core.handle(event);
        let nav = core.navigation();
        self.tx.send_if_modified(|current| {
            if *current == *nav {
                return false;
            }
            *current = nav.clone();
            true
        });
        (action, core.phase())
    }
}

pub struct RedirectController<G, D> {
    resolver: G,
    source: D,
    shared: Arc<Shared>,
}

impl<G: CountryResolver, D: DecisionSource> RedirectController<G, D> {
    pub fn new(resolver: G, source: D) -> Self {
        Self::with_core(resolver, source, RedirectCore::new())
    }

    /// Use a preconfigured core (custom appcode / panel).
    pub fn with_core(resolver: G, source: D, core: RedirectCore) -> Self {
        let (tx, _) = watch::channel(core.navigation().clone());
        Self {
            resolver,
            source,
            shared: Arc::new(Shared {
                core: Mutex::new(core),
                tx,
            }),
        }
    }

    /// Receiver for the display layer. Any number may be taken.
    pub fn subscribe(&self) -> watch::Receiver<NavigationState> {
        self.shared.tx.subscribe()
    }

    /// Handle the display uses to report that the warm-up surface finished loading.
    pub fn warmup_signal(&self) -> WarmupSignal {
        WarmupSignal {
            shared: self.shared.clone(),
        }
    }

    pub async fn phase(&self) -> Phase {
        self.shared.core.lock().await.phase()
    }

    pub async fn navigation(&self) -> NavigationState {
        self.shared.core.lock().await.navigation().clone()
    }

    /// One pass of the pipeline. Returns the phase it ended in: `Decided`, or
    /// `ResolvingCountry` when no country could be resolved. Later calls do nothing.
    pub async fn run(&self) -> Phase {
        let (action, phase) = self.shared.apply(Event::Start).await;
        if action != Some(Action::ResolveCountry) {
            debug!(?phase, "already started");
            return phase;
        }

        let event = match self.resolver.resolve().await {
            Some(country) => Event::CountryResolved(country),
            None => Event::CountryUnresolved,
        };
        let (action, phase) = self.shared.apply(event).await;
        let Some(Action::FetchDecision(payload)) = action else {
            info!("no country; keeping current target");
            return phase;
        };

        self.shared.apply(Event::FetchStarted).await;
        let country = payload.country();
        let event = match self.source.fetch_decision(payload).await {
            Ok(decision) => {
                debug!(%country, display = decision.display, home_url = ?decision.home_url, "decision");
                Event::DecisionReceived(decision)
            }
            Err(e) => {
                warn!(%country, error = %e, "get home url failed; keeping current target");
                Event::DecisionFailed
            }
        };
        let (action, phase) = self.shared.apply(event).await;
        if let Some(Action::Navigate(url)) = action {
            info!(%url, "navigating");
        }
        phase
    }
}

/// Cloneable onLoad hook for the warm-up surface.
#[derive(Clone)]
pub struct WarmupSignal {
    shared: Arc<Shared>,
}

impl WarmupSignal {
    pub async fn loaded(&self) {
        self.shared.apply(Event::WarmupLoaded).await;
    }
}
