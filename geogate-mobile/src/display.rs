//! Display-side contract: a warm-up surface plus a navigable surface following target_url.

use geogate_core::NavigationState;
use tokio::sync::watch;
use tracing::debug;

/// Platform webview pair. Rendering internals are the platform's business.
pub trait DisplaySurface {
    /// Point the navigable surface at `url`. Empty is a legal, inert target.
    fn navigate(&mut self, url: &str);
    /// Remove the warm-up surface once it has loaded.
    fn dismiss_warmup(&mut self);
}

/// Render the current state, then follow every update until the controller goes away.
pub async fn follow<S: DisplaySurface>(mut rx: watch::Receiver<NavigationState>, surface: &mut S) {
    let mut shown = Rendered::default();
    loop {
        let state = rx.borrow_and_update().clone();
        shown.apply(&state, surface);
        if rx.changed().await.is_err() {
            // Sender dropped: pick up a final value published just before.
            let state = rx.borrow().clone();
            shown.apply(&state, surface);
            break;
        }
    }
}

/// What the surface has been told so far, so each change is forwarded once.
#[derive(Default)]
struct Rendered {
    target: Option<String>,
    warmup_dismissed: bool,
}

impl Rendered {
    fn apply<S: DisplaySurface>(&mut self, state: &NavigationState, surface: &mut S) {
        if self.target.as_deref() != Some(state.target_url.as_str()) {
            debug!(url = %state.target_url, "display navigate");
            surface.navigate(&state.target_url);
            self.target = Some(state.target_url.clone());
        }
        if state.warmup_loaded && !self.warmup_dismissed {
            surface.dismiss_warmup();
            self.warmup_dismissed = true;
        }
    }
}
