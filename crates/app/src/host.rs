//! Desktop implementation of the overlay host

use crate::tagger::TagPipeline;
use anyhow::Context;
use capture::{crop_region, CaptureProvider, CaptureTarget, CropPolicy, Rect, SourceImage};
use image::{DynamicImage, RgbaImage};
use overlay::{OverlayHost, OverlayRegistry};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Callback for user-facing messages
pub type AlertFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Native message dialogs shown from background threads
///
/// Dialogs must not block the overlay event loop, but the process should not
/// exit while one is still on screen; `wait` joins them.
#[derive(Default)]
pub struct Dialogs {
    open: Mutex<Vec<JoinHandle<()>>>,
}

impl Dialogs {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn show(&self, level: rfd::MessageLevel, title: &str, message: &str) {
        let title = title.to_string();
        let message = message.to_string();
        let spawned = thread::Builder::new().name("dialog".into()).spawn(move || {
            rfd::MessageDialog::new()
                .set_level(level)
                .set_title(&title)
                .set_description(&message)
                .set_buttons(rfd::MessageButtons::Ok)
                .show();
        });

        match spawned {
            Ok(handle) => self.open.lock().push(handle),
            Err(e) => log::error!("Failed to show dialog: {}", e),
        }
    }

    /// Error dialogs as an alert callback
    pub fn alert_fn(self: &Arc<Self>) -> AlertFn {
        let dialogs = Arc::clone(self);
        Arc::new(move |message: &str| dialogs.show(rfd::MessageLevel::Error, "SnapTag", message))
    }

    /// Block until every dialog shown so far is dismissed
    pub fn wait(&self) {
        let handles: Vec<_> = self.open.lock().drain(..).collect();
        for handle in handles {
            if handle.join().is_err() {
                log::warn!("Dialog thread panicked");
            }
        }
    }
}

/// Serves monitor captures to overlays and tags the regions they confirm
///
/// Every capture handed to an overlay is kept, so the confirmed region is
/// cropped out of exactly the pixels the user saw.
pub struct TaggerHost {
    provider: Arc<dyn CaptureProvider>,
    pipeline: TagPipeline,
    crop_policy: CropPolicy,
    registry: Arc<OverlayRegistry>,
    captures: Mutex<HashMap<Option<usize>, Arc<RgbaImage>>>,
    alert: AlertFn,
}

impl TaggerHost {
    pub fn new(
        provider: Arc<dyn CaptureProvider>,
        pipeline: TagPipeline,
        crop_policy: CropPolicy,
        registry: Arc<OverlayRegistry>,
        alert: AlertFn,
    ) -> Self {
        Self {
            provider,
            pipeline,
            crop_policy,
            registry,
            captures: Mutex::new(HashMap::new()),
            alert,
        }
    }

    pub fn registry(&self) -> &Arc<OverlayRegistry> {
        &self.registry
    }

    pub fn screen_count(&self) -> anyhow::Result<usize> {
        Ok(self.provider.screen_count()?)
    }

    fn capture(&self, target: CaptureTarget) -> anyhow::Result<SourceImage> {
        let image = self
            .provider
            .capture(target)
            .with_context(|| format!("Failed to capture {:?}", target))?;
        self.captures
            .lock()
            .insert(target.screen_index(), Arc::clone(image.pixels()));
        Ok(image)
    }

    /// Drop stored captures once every overlay is gone
    pub fn release_captures(&self) {
        self.captures.lock().clear();
    }
}

impl OverlayHost for TaggerHost {
    fn get_overlay_image(&self, screen_index: usize) -> anyhow::Result<SourceImage> {
        self.capture(CaptureTarget::Screen(screen_index))
    }

    fn capture_screen(&self) -> anyhow::Result<SourceImage> {
        self.capture(CaptureTarget::Primary)
    }

    fn close_all_overlays(&self) -> anyhow::Result<()> {
        self.registry.close_all();
        Ok(())
    }

    fn process_selection(&self, screen_index: Option<usize>, region: Rect) -> anyhow::Result<String> {
        let pixels = self
            .captures
            .lock()
            .get(&screen_index)
            .cloned()
            .with_context(|| format!("No capture for screen {:?}", screen_index))?;

        let cropped = crop_region(&pixels, region, self.crop_policy)?;
        log::debug!(
            "Cropped {:?} to {}x{} from screen {:?}",
            region,
            cropped.width(),
            cropped.height(),
            screen_index
        );
        self.pipeline.tag(&DynamicImage::ImageRgba8(cropped))
    }

    fn alert(&self, message: &str) {
        (self.alert)(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::AppConfig;
    use crate::tagger::Tagger;
    use capture::MemoryProvider;
    use image::Rgba;

    /// Reports the size of the image it was given as a tag
    struct SizeTagger;

    impl Tagger for SizeTagger {
        fn infer(&self, image: &DynamicImage, _threshold: f32) -> anyhow::Result<Vec<(String, f32)>> {
            Ok(vec![(format!("{}x{}", image.width(), image.height()), 1.0)])
        }
    }

    fn host(policy: CropPolicy) -> (TaggerHost, Arc<Mutex<Vec<String>>>) {
        let provider = MemoryProvider::new(vec![
            RgbaImage::from_pixel(100, 50, Rgba([255, 0, 0, 255])),
            RgbaImage::from_pixel(40, 40, Rgba([0, 255, 0, 255])),
        ]);
        let alerts = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&alerts);
        let host = TaggerHost::new(
            Arc::new(provider),
            TagPipeline::new(Arc::new(SizeTagger), &AppConfig::default()),
            policy,
            OverlayRegistry::new(),
            Arc::new(move |m: &str| sink.lock().push(m.to_string())),
        );
        (host, alerts)
    }

    #[test]
    fn crops_the_screen_it_served() {
        let (host, _) = host(CropPolicy::Clamp);
        host.get_overlay_image(1).unwrap();
        let tags = host.process_selection(Some(1), Rect::new(10, 10, 20, 15)).unwrap();
        assert_eq!(tags, "20x15");
    }

    #[test]
    fn overflowing_region_is_clamped() {
        let (host, _) = host(CropPolicy::Clamp);
        host.capture_screen().unwrap();
        let tags = host.process_selection(None, Rect::new(90, 40, 30, 30)).unwrap();
        assert_eq!(tags, "10x10");
    }

    #[test]
    fn overflowing_region_is_rejected_by_policy() {
        let (host, _) = host(CropPolicy::Reject);
        host.capture_screen().unwrap();
        assert!(host.process_selection(None, Rect::new(90, 40, 30, 30)).is_err());
    }

    #[test]
    fn selection_without_capture_fails() {
        let (host, _) = host(CropPolicy::Clamp);
        assert!(host.process_selection(Some(0), Rect::new(0, 0, 5, 5)).is_err());

        host.get_overlay_image(0).unwrap();
        host.release_captures();
        assert!(host.process_selection(Some(0), Rect::new(0, 0, 5, 5)).is_err());
    }

    #[test]
    fn missing_screen_is_an_error() {
        let (host, _) = host(CropPolicy::Clamp);
        assert!(host.get_overlay_image(7).is_err());
    }

    #[test]
    fn alerts_go_to_the_callback() {
        let (host, alerts) = host(CropPolicy::Clamp);
        host.alert("nothing selected");
        assert_eq!(alerts.lock().as_slice(), ["nothing selected".to_string()]);
    }

    #[test]
    fn confirming_one_overlay_closes_the_rest() {
        use overlay::{
            Container, EngineConfig, Key, Point, PointerButton, PointerEvent, SelectionOutcome,
            SessionEvent, SessionStatus,
        };
        use std::time::Duration;

        let (host, _) = host(CropPolicy::Clamp);
        let host = Arc::new(host);
        let registry = Arc::clone(host.registry());
        let mut sessions = registry.open_all(host.clone(), EngineConfig::full().per_monitor(), 2);
        assert_eq!(registry.len(), 2);

        for session in sessions.iter_mut() {
            session.set_container(Container::new(0.0, 0.0, 100.0, 50.0));
            while session.status() == SessionStatus::Loading {
                assert!(session.wait(Duration::from_secs(5)));
            }
        }

        // Screen 0 is 100x50, shown 1:1
        let first = &mut sessions[0];
        for event in [
            PointerEvent::Down { pos: Point::new(10.0, 10.0), button: PointerButton::Primary },
            PointerEvent::Move { pos: Point::new(40.0, 30.0) },
            PointerEvent::Up { pos: Point::new(40.0, 30.0) },
        ] {
            first.handle(SessionEvent::Pointer(event));
        }
        first.handle(SessionEvent::Key(Key::Enter));
        while !first.is_closed() {
            assert!(first.wait(Duration::from_secs(5)));
        }
        assert_eq!(
            first.outcome(),
            Some(&SelectionOutcome::Confirmed {
                region: Rect::new(10, 10, 30, 20),
                tags: "30x20".into(),
            })
        );

        let second = &mut sessions[1];
        second.pump();
        assert_eq!(second.outcome(), Some(&SelectionOutcome::Cancelled));
        assert!(registry.is_empty());
    }
}
