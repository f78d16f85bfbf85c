// End-to-end scenarios against a running service, on tokio's paused clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use super::error::AlertError;
use super::model::{AlertButton, AlertRequest};
use super::service::AlertService;
use super::testing::Recorder;

fn spawn(ignore_priority: bool) -> (AlertService, Recorder) {
    let recorder = Recorder::default();
    let service = AlertService::builder()
        .renderer(recorder.renderer())
        .ignore_priority(ignore_priority)
        .detached()
        .spawn()
        .unwrap();
    (service, recorder)
}

fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

fn bump(counter: &Arc<AtomicUsize>) -> impl FnOnce() + Send + 'static {
    let counter = counter.clone();
    move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test(start_paused = true)]
async fn auto_dismiss_fires_once() {
    let (service, recorder) = spawn(false);
    let handle = service.handle();
    let closes = counter();

    handle.show(
        AlertRequest::new()
            .title("saved")
            .dismiss_after(Duration::from_millis(50))
            .on_close(bump(&closes)),
    );
    sleep(Duration::from_millis(20)).await;
    assert_eq!(
        handle.snapshot().await.unwrap().current_title.as_deref(),
        Some("saved")
    );

    sleep(Duration::from_millis(40)).await;
    let snapshot = handle.snapshot().await.unwrap();
    assert!(snapshot.is_idle());
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert!(recorder.current_view().is_none());

    sleep(Duration::from_millis(500)).await;
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn second_submit_cancels_first_timer() {
    let (service, recorder) = spawn(false);
    let handle = service.handle();
    let first_closes = counter();

    handle.show(
        AlertRequest::new()
            .title("first")
            .high()
            .dismiss_after(Duration::from_millis(50))
            .on_close(bump(&first_closes)),
    );
    sleep(Duration::from_millis(30)).await;
    handle.show(AlertRequest::new().title("second"));

    // Past the first alert's deadline: the second must still be up
    sleep(Duration::from_millis(100)).await;
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.current_title.as_deref(), Some("second"));
    assert_eq!(snapshot.queued, vec!["first".to_string()]);
    assert_eq!(first_closes.load(Ordering::SeqCst), 0);

    // Closing the second re-shows the first with a fresh timer
    recorder.current_view().unwrap().close();
    sleep(Duration::from_millis(60)).await;
    assert_eq!(
        handle.snapshot().await.unwrap().current_title.as_deref(),
        Some("first")
    );
    sleep(Duration::from_millis(60)).await;
    assert!(handle.snapshot().await.unwrap().is_idle());
    assert_eq!(first_closes.load(Ordering::SeqCst), 1);
    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn high_survives_low_churn() {
    let (service, recorder) = spawn(false);
    let handle = service.handle();

    handle.show(AlertRequest::new().title("A").high());
    handle.show(AlertRequest::new().title("B"));
    handle.show(AlertRequest::new().title("C"));
    assert_eq!(
        handle.snapshot().await.unwrap().current_title.as_deref(),
        Some("C")
    );

    recorder.current_view().unwrap().close();
    sleep(Duration::from_millis(60)).await;
    assert_eq!(
        handle.snapshot().await.unwrap().current_title.as_deref(),
        Some("A")
    );
    assert_eq!(recorder.shown_titles(), vec!["A", "B", "C", "A"]);
    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn ignore_priority_resumes_preempted() {
    let (service, recorder) = spawn(true);
    let handle = service.handle();

    handle.show(AlertRequest::new().title("A"));
    handle.show(AlertRequest::new().title("B").high());
    assert_eq!(
        handle.snapshot().await.unwrap().current_title.as_deref(),
        Some("B")
    );

    recorder.current_view().unwrap().close();
    // Requeue is deferred, not immediate
    assert!(handle.snapshot().await.unwrap().is_idle());
    sleep(Duration::from_millis(60)).await;
    assert_eq!(
        handle.snapshot().await.unwrap().current_title.as_deref(),
        Some("A")
    );
    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn show_multiple_with_ignore_priority_presents_newest_first() {
    let (service, recorder) = spawn(true);
    let handle = service.handle();

    handle.show_multiple(["X", "Y", "Z"].map(|t| AlertRequest::new().title(t)));
    handle.snapshot().await.unwrap();
    let mut order = Vec::new();
    for _ in 0..3 {
        let view = recorder.current_view().unwrap();
        order.push(view.title.clone().unwrap());
        view.close();
        sleep(Duration::from_millis(60)).await;
    }
    assert_eq!(order, vec!["Z", "Y", "X"]);
    assert!(handle.snapshot().await.unwrap().is_idle());
    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn reentrant_submit_from_on_close() {
    let (service, recorder) = spawn(false);
    let handle = service.handle();
    let inner = handle.clone();

    handle.show(
        AlertRequest::new()
            .title("first")
            .on_close(move || inner.show(AlertRequest::new().title("follow-up"))),
    );
    handle.snapshot().await.unwrap();
    recorder.current_view().unwrap().close();

    sleep(Duration::from_millis(100)).await;
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.current_title.as_deref(), Some("follow-up"));
    assert!(snapshot.queued.is_empty());
    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn button_press_then_close() {
    let (service, recorder) = spawn(false);
    let handle = service.handle();
    let presses = Arc::new(AtomicUsize::new(0));
    let press_count = presses.clone();
    let inner = handle.clone();

    handle.show(
        AlertRequest::new()
            .title("confirm")
            .button(AlertButton::new("Details").keep_open().on_press(move || {
                press_count.fetch_add(1, Ordering::SeqCst);
            }))
            .button(AlertButton::new("Retry").on_press(move || inner.hide())),
    );
    handle.snapshot().await.unwrap();

    let view = recorder.current_view().unwrap();
    view.press(0).unwrap();
    view.press(0).unwrap();
    assert_eq!(presses.load(Ordering::SeqCst), 2);
    assert!(!handle.snapshot().await.unwrap().is_idle());

    // Handler hides, then the button closes the same presentation: the close is stale
    view.press(1).unwrap();
    sleep(Duration::from_millis(60)).await;
    assert!(handle.snapshot().await.unwrap().is_idle());
    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn close_and_wait_reports_callback_fault() {
    let (service, recorder) = spawn(false);
    let handle = service.handle();

    handle.show(AlertRequest::new().title("next").high());
    handle.show(
        AlertRequest::new()
            .title("faulty")
            .high()
            .on_close(|| panic!("close handler failed")),
    );
    handle.snapshot().await.unwrap();

    let view = recorder.current_view().unwrap();
    let result = view.close.close_and_wait().await;
    assert!(matches!(
        result,
        Err(AlertError::CallbackPanicked {
            callback: "on_close",
            ..
        })
    ));

    // Cleanup ran anyway
    sleep(Duration::from_millis(60)).await;
    assert_eq!(
        handle.snapshot().await.unwrap().current_title.as_deref(),
        Some("next")
    );

    // The faulty presentation is gone: waiting on it again is a stale no-op
    assert_eq!(view.close.close_and_wait().await, Ok(()));
    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn clear_all_aborts_silently() {
    let (service, recorder) = spawn(false);
    let handle = service.handle();
    let closes = counter();

    for title in ["q1", "q2", "q3", "visible"] {
        handle.show(
            AlertRequest::new()
                .title(title)
                .high()
                .dismiss_after(Duration::from_millis(200))
                .on_close(bump(&closes)),
        );
    }
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.current_title.as_deref(), Some("visible"));
    assert_eq!(snapshot.queued.len(), 3);

    handle.clear_all();
    sleep(Duration::from_secs(1)).await;
    let snapshot = handle.snapshot().await.unwrap();
    assert!(snapshot.is_idle());
    assert!(snapshot.queued.is_empty());
    assert!(recorder.current_view().is_none());
    assert_eq!(closes.load(Ordering::SeqCst), 0);
    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_drops_everything_without_callbacks() {
    let (service, recorder) = spawn(false);
    let handle = service.handle();
    let closes = counter();

    handle.show(AlertRequest::new().title("a").high().on_close(bump(&closes)));
    handle.show(
        AlertRequest::new()
            .title("b")
            .high()
            .dismiss_after(Duration::from_millis(10))
            .on_close(bump(&closes)),
    );
    handle.snapshot().await.unwrap();

    service.shutdown().await;
    sleep(Duration::from_millis(100)).await;
    assert_eq!(closes.load(Ordering::SeqCst), 0);
    assert!(recorder.current_view().is_none());
    assert!(handle.is_closed());
}

#[tokio::test(start_paused = true)]
async fn hide_skips_on_close() {
    let (service, recorder) = spawn(false);
    let handle = service.handle();
    let closes = counter();

    handle.show(AlertRequest::new().title("kept").high());
    handle.show(AlertRequest::new().title("hidden").high().on_close(bump(&closes)));
    handle.hide();
    sleep(Duration::from_millis(60)).await;

    assert_eq!(closes.load(Ordering::SeqCst), 0);
    assert_eq!(
        recorder.current_view().and_then(|view| view.title).as_deref(),
        Some("kept")
    );
    service.shutdown().await;
}
