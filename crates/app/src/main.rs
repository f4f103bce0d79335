//! SnapTag - select a screen region and copy its tags

mod cli;
mod host;
mod screens;
mod settings;
mod state;
mod tagger;
mod ui_egui;

use crate::cli::Invocation;
use crate::host::{Dialogs, TaggerHost};
use crate::screens::XcapProvider;
use crate::settings::AppConfig;
use crate::tagger::{CommandTagger, TagPipeline};
use crate::ui_egui::{OutcomeSlot, OverlayApp, OverlayView};
use anyhow::{anyhow, Context};
use overlay::{OverlayRegistry, SelectionOutcome};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let invocation = cli::parse(std::env::args().skip(1))?;
    if invocation == Invocation::Help {
        println!("{}", cli::USAGE);
        return Ok(());
    }

    let settings = AppConfig::load();
    let pipeline = TagPipeline::new(Arc::new(CommandTagger::from_config(&settings)), &settings);
    let dialogs = Dialogs::new();

    let result = match invocation {
        Invocation::Overlay { screen } => run_overlay(&settings, pipeline, &dialogs, screen),
        Invocation::ProcessFile { path, delete_after } => {
            let result = tag_file(&pipeline, &path);
            if delete_after {
                if let Err(e) = std::fs::remove_file(&path) {
                    log::warn!("Failed to delete {:?}: {}", path, e);
                }
            }
            result.map(Some)
        }
        Invocation::ProcessUrl(url) => tag_url(&pipeline, &url).map(Some),
        Invocation::WriteConfig => settings.save().map(|()| {
            println!("{}", AppConfig::default_path().display());
            None
        }),
        Invocation::Help => Ok(None),
    };

    match &result {
        Ok(Some(tags)) => deliver(&settings, &dialogs, tags),
        Ok(None) => {}
        Err(e) => {
            log::error!("{:#}", e);
            dialogs.show(rfd::MessageLevel::Error, "SnapTag", &format!("Processing failed: {:#}", e));
        }
    }

    dialogs.wait();
    result.map(|_| ())
}

fn tag_file(pipeline: &TagPipeline, path: &Path) -> anyhow::Result<String> {
    log::info!("Tagging file {:?}", path);
    let image = image::open(path).with_context(|| format!("Failed to open image {:?}", path))?;
    pipeline.tag(&image)
}

fn tag_url(pipeline: &TagPipeline, url: &str) -> anyhow::Result<String> {
    log::info!("Tagging {}", url);
    let image = delivery::fetch_image(url).with_context(|| format!("Failed to load image from {}", url))?;
    pipeline.tag(&image)
}

/// Hand the tags to the user: clipboard, stdout and a notification
fn deliver(settings: &AppConfig, dialogs: &Dialogs, tags: &str) {
    println!("{}", tags);

    if tags.is_empty() {
        dialogs.show(rfd::MessageLevel::Info, "SnapTag", "No tags above the threshold");
        return;
    }

    if settings.copy_to_clipboard {
        match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(tags.to_string())) {
            Ok(()) => {
                log::info!("Copied {} bytes of tags to the clipboard", tags.len());
                // The dialog keeps the process, and so the clipboard owner, alive
                dialogs.show(rfd::MessageLevel::Info, "Tags Copied!", tags);
            }
            Err(e) => {
                log::error!("Failed to set clipboard text: {}", e);
                dialogs.show(rfd::MessageLevel::Warning, "SnapTag", &format!("Clipboard unavailable: {}", e));
            }
        }
    } else {
        dialogs.show(rfd::MessageLevel::Info, "Tags", tags);
    }
}

/// Open the overlays, wait for them to close and return the confirmed tags
fn run_overlay(
    settings: &AppConfig,
    pipeline: TagPipeline,
    dialogs: &Arc<Dialogs>,
    screen: Option<usize>,
) -> anyhow::Result<Option<String>> {
    let provider = Arc::new(XcapProvider::new());
    let registry = OverlayRegistry::new();
    let host = Arc::new(TaggerHost::new(
        provider.clone(),
        pipeline,
        settings.crop_policy(),
        registry.clone(),
        dialogs.alert_fn(),
    ));

    let engine = settings.engine();
    let sessions = match screen {
        // An explicit monitor always needs its index
        Some(index) => vec![registry.open_session(host.clone(), engine.per_monitor(), index)],
        None => {
            let count = host.screen_count().context("Failed to enumerate monitors")?;
            registry.open_all(host.clone(), engine, count)
        }
    };

    let views: Vec<OverlayView> = sessions
        .into_iter()
        .map(|session| {
            let origin = session.target().screen_index().and_then(|i| provider.monitor_origin(i));
            OverlayView::new(session, origin)
        })
        .collect();

    let root = views
        .first()
        .map(|view| view.viewport_builder())
        .ok_or_else(|| anyhow!("No overlay to show"))?;
    let native_options = eframe::NativeOptions {
        viewport: root,
        ..Default::default()
    };

    let outcome: OutcomeSlot = Arc::new(Mutex::new(None));
    let slot = outcome.clone();
    eframe::run_native(
        "SnapTag",
        native_options,
        Box::new(move |cc| Ok(Box::new(OverlayApp::new(cc, views, slot)))),
    )
    .map_err(|e| anyhow!("Overlay window failed: {}", e))?;

    host.release_captures();
    host.registry().close_all();

    let outcome = outcome.lock().take().unwrap_or(SelectionOutcome::Cancelled);
    match outcome {
        SelectionOutcome::Confirmed { region, tags } => {
            log::info!("Tagged region {:?}", region);
            Ok(Some(tags))
        }
        SelectionOutcome::Cancelled => {
            log::info!("Selection cancelled");
            Ok(None)
        }
        // Already reported to the user by the session
        SelectionOutcome::Failed(e) => {
            log::error!("Overlay failed: {}", e);
            Ok(None)
        }
    }
}
