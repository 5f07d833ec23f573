// geogate probe: run the redirect pipeline once on a desktop, with a fixed coordinate standing
// in for the device fix.

use anyhow::{bail, Context};
use geogate_core::{BoundaryTable, Coordinate, RedirectCore};
use geogate_mobile::config;
use geogate_mobile::display::{self, DisplaySurface};
use geogate_mobile::location::{CallbackPositionProvider, PositionCallback, PositionOptions};
use geogate_mobile::permission::{
    AuthorizationApi, AuthorizationScope, AuthorizationStatus, Permission, PermissionError,
    PermissionStatus, RuntimePermissionApi,
};
use geogate_mobile::{ConfigClient, GeoResolver, PlatformPermission, RedirectController};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const USAGE: &str = "usage: geogate-probe --lon <deg> --lat <deg> [--deny]";

struct Args {
    coordinate: Coordinate,
    deny: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Option<Args>> {
    let mut lon = None;
    let mut lat = None;
    let mut deny = false;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return Ok(None),
            "--lon" => lon = Some(next_f64(&mut args, "--lon")?),
            "--lat" => lat = Some(next_f64(&mut args, "--lat")?),
            "--deny" => deny = true,
            other => bail!("unknown argument {other}\n{USAGE}"),
        }
    }
    let (Some(lon), Some(lat)) = (lon, lat) else {
        bail!(USAGE);
    };
    Ok(Some(Args {
        coordinate: Coordinate::new(lon, lat),
        deny,
    }))
}

fn next_f64(args: &mut impl Iterator<Item = String>, flag: &str) -> anyhow::Result<f64> {
    let v = args.next().with_context(|| format!("{flag} needs a value"))?;
    v.parse().with_context(|| format!("{flag}: not a number: {v}"))
}

/// Desktop stand-in for the platform permission dialogs: answers both flows the same way.
struct DesktopBridge {
    granted: bool,
}

impl AuthorizationApi for DesktopBridge {
    async fn request_authorization(
        &self,
        _scope: AuthorizationScope,
    ) -> Result<AuthorizationStatus, PermissionError> {
        Ok(if self.granted {
            AuthorizationStatus::Granted
        } else {
            AuthorizationStatus::Denied
        })
    }
}

impl RuntimePermissionApi for DesktopBridge {
    async fn request_permission(
        &self,
        _permission: Permission,
    ) -> Result<PermissionStatus, PermissionError> {
        Ok(if self.granted {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        })
    }
}

/// Prints what a webview pair would show.
struct StdoutSurface;

impl DisplaySurface for StdoutSurface {
    fn navigate(&mut self, url: &str) {
        if url.is_empty() {
            println!("target: (blank)");
        } else {
            println!("target: {}", url);
        }
    }

    fn dismiss_warmup(&mut self) {
        println!("warm-up surface loaded");
    }
}

fn main() -> anyhow::Result<()> {
    let Some(args) = parse_args(std::env::args().skip(1))? else {
        println!("geogate-probe {}", VERSION);
        return Ok(());
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = config::load()?;
    let Some(path) = cfg.boundaries_path.as_ref() else {
        bail!("no boundary data: set boundaries_path in config.toml or GEOGATE_BOUNDARIES");
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading boundaries {}", path.display()))?;
    let table = BoundaryTable::from_geojson(&text)?;
    tracing::info!(territories = table.len(), "boundaries loaded");

    let permission = PlatformPermission::select(
        cfg.platform,
        DesktopBridge {
            granted: !args.deny,
        },
    );
    let coordinate = args.coordinate;
    let position = CallbackPositionProvider::new(move |_: PositionOptions, cb: PositionCallback| {
        cb.succeed(coordinate)
    });
    let resolver =
        GeoResolver::new(permission, position, table).with_options(cfg.position_options());
    let client = ConfigClient::from_config(&cfg)?;
    let controller = RedirectController::with_core(
        resolver,
        client,
        RedirectCore::with_payload_constants(cfg.appcode.clone(), cfg.panel.clone()),
    );

    // Single-threaded: every step suspends only at I/O.
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let phase = rt.block_on(async move {
        let rx = controller.subscribe();
        let warmup = controller.warmup_signal();
        let pipeline = async move {
            warmup.loaded().await;
            controller.run().await
        };
        let mut surface = StdoutSurface;
        let (phase, ()) = tokio::join!(pipeline, display::follow(rx, &mut surface));
        phase
    });
    println!("finished in {:?}", phase);
    Ok(())
}
