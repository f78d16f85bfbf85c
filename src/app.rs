use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::core::alerts::{
    AlertButton, AlertHandle, AlertModalProps, AlertRequest, AlertService, AlertTypes, AlertView,
    GlobalAlert, P,
};
use crate::core::config::ConfigManager;

/// Directory holding `alerts.json`.
const CONFIG_DIR_ENV: &str = "GLOBAL_ALERT_CONFIG_DIR";
/// How long the simulated user looks at an alert before pressing.
const PRESS_INTERVAL: Duration = Duration::from_millis(300);
/// Give up pressing after this many rounds.
const MAX_PRESSES: usize = 32;

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

type Screen = Arc<Mutex<Option<AlertView>>>;

/// Prints every slot change and remembers the alert on screen.
fn console_renderer(screen: Screen) -> impl FnMut(AlertModalProps) + Send + 'static {
    move |props: AlertModalProps| {
        let mut current = screen.lock().unwrap_or_else(PoisonError::into_inner);
        match props.data.filter(|_| props.visible) {
            Some(view) => {
                let buttons: Vec<String> = view
                    .effective_buttons()
                    .iter()
                    .map(|button| button.title.clone().unwrap_or_default())
                    .collect();
                println!(
                    "[{:?}] {} {}: {} {:?}",
                    view.priority,
                    view.variant.as_deref().unwrap_or(AlertTypes::INFO),
                    view.title.as_deref().unwrap_or("(untitled)"),
                    view.message.as_deref().unwrap_or(""),
                    buttons
                );
                *current = Some(view);
            }
            None => {
                println!("(alert hidden)");
                *current = None;
            }
        }
    }
}

fn sample_alerts() -> Vec<AlertRequest> {
    vec![
        AlertRequest::new()
            .title("Welcome")
            .message("Alerts are served one at a time.")
            .variant(AlertTypes::INFO)
            .priority(P::L),
        AlertRequest::new()
            .title("Unsaved changes")
            .message("Your draft has not been saved.")
            .variant(AlertTypes::WARNING)
            .priority(P::H)
            .button(AlertButton::new("Save").variant(AlertTypes::SUCCESS).on_press(|| {
                log::info!("Draft saved");
            }))
            .button(AlertButton::new("Discard"))
            .on_close(|| log::info!("Unsaved changes alert closed")),
        AlertRequest::new()
            .title("Tip")
            .message("Low priority alerts give way to newer ones.")
            .variant(AlertTypes::TIP)
            .priority(P::L),
        AlertRequest::new()
            .title("Connection lost")
            .message("Retrying in the background.")
            .variant(AlertTypes::ERROR)
            .priority(P::H)
            .extra("retry_in_secs", 5)
            .on_close(|| log::info!("Connection alert closed")),
    ]
}

async fn drive(handle: AlertHandle, screen: Screen) {
    for alert in sample_alerts() {
        GlobalAlert::show(alert);
    }

    for _ in 0..MAX_PRESSES {
        tokio::time::sleep(PRESS_INTERVAL).await;
        match handle.snapshot().await {
            Ok(snapshot) if snapshot.is_idle() && snapshot.queued.is_empty() => {
                log::info!("All alerts handled");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                log::error!("Alert service unavailable: {}", e);
                return;
            }
        }

        let visible = screen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(view) = visible {
            if let Err(e) = view.press(0) {
                log::warn!("Pressing the first button of {} failed: {}", view.id, e);
            }
        }
    }
    log::warn!("Gave up after {} presses", MAX_PRESSES);
}

/// Console walkthrough: starts a service, queues a few alerts through
/// `GlobalAlert` and acknowledges each one until the queue drains.
pub fn run() {
    init_logging();

    let config_dir = std::env::var_os(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let config_manager = ConfigManager::new(config_dir);
    let settings = config_manager.load();
    log::info!("Alert settings from {:?}: {:?}", config_manager.path(), settings);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to start the async runtime: {}", e);
            return;
        }
    };

    runtime.block_on(async move {
        let screen: Screen = Arc::new(Mutex::new(None));
        let service = match AlertService::builder()
            .renderer(console_renderer(screen.clone()))
            .settings(&settings)
            .spawn()
        {
            Ok(service) => service,
            Err(e) => {
                log::error!("Failed to start the alert service: {}", e);
                return;
            }
        };

        drive(service.handle(), screen).await;
        service.shutdown().await;
    });
}
