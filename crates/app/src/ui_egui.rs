//! Overlay front-end using egui
//!
//! Every overlay session gets its own viewport: the first one lives in the
//! root window, the others in immediate viewports placed on their monitors.
//! The front-end only translates egui input into session events and paints
//! whatever the session reports back.

use crate::state::{merge_outcomes, AppState};
use eframe::egui;
use overlay::{
    Container, DisplayRect, Handle, Hit, Mode, ModeKind, OverlaySession, Point, PointerButton,
    PointerEvent, SelectionOutcome, SessionEvent, SessionStatus,
};
use parking_lot::Mutex;
use std::sync::Arc;

const ACCENT: egui::Color32 = egui::Color32::from_rgb(0, 136, 255);

/// Result slot filled when the last overlay closes
pub type OutcomeSlot = Arc<Mutex<Option<SelectionOutcome>>>;

fn to_egui(rect: DisplayRect) -> egui::Rect {
    egui::Rect::from_min_size(egui::pos2(rect.x, rect.y), egui::vec2(rect.w, rect.h))
}

fn to_point(pos: egui::Pos2) -> Point {
    Point::new(pos.x, pos.y)
}

fn map_button(button: egui::PointerButton) -> Option<PointerButton> {
    match button {
        egui::PointerButton::Primary => Some(PointerButton::Primary),
        egui::PointerButton::Secondary => Some(PointerButton::Secondary),
        egui::PointerButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

fn handle_cursor(handle: Handle) -> egui::CursorIcon {
    match handle {
        Handle::N => egui::CursorIcon::ResizeNorth,
        Handle::S => egui::CursorIcon::ResizeSouth,
        Handle::E => egui::CursorIcon::ResizeEast,
        Handle::W => egui::CursorIcon::ResizeWest,
        Handle::NE => egui::CursorIcon::ResizeNorthEast,
        Handle::NW => egui::CursorIcon::ResizeNorthWest,
        Handle::SE => egui::CursorIcon::ResizeSouthEast,
        Handle::SW => egui::CursorIcon::ResizeSouthWest,
    }
}

/// One session plus the egui resources drawn for it
pub struct OverlayView {
    session: OverlaySession,
    position: Option<egui::Pos2>,
    texture: Option<egui::TextureHandle>,
    /// Toolbar area from the last frame; presses on it are not selections
    toolbar: Option<egui::Rect>,
}

impl OverlayView {
    /// `position` is the monitor origin in logical points
    pub fn new(session: OverlaySession, position: Option<(f32, f32)>) -> Self {
        Self {
            session,
            position: position.map(|(x, y)| egui::pos2(x, y)),
            texture: None,
            toolbar: None,
        }
    }

    pub fn viewport_builder(&self) -> egui::ViewportBuilder {
        let builder = egui::ViewportBuilder::default()
            .with_title(format!("SnapTag {}", self.session.id()))
            .with_decorations(false)
            .with_always_on_top()
            .with_fullscreen(true);
        match self.position {
            Some(pos) => builder.with_position(pos),
            None => builder,
        }
    }

    fn viewport_id(&self) -> egui::ViewportId {
        egui::ViewportId::from_hash_of(self.session.id())
    }

    fn show(&mut self, ctx: &egui::Context, state: AppState) {
        if ctx.input(|i| i.viewport().close_requested()) {
            self.session.close();
        }
        // Same box the frameless central panel draws into
        let full = ctx.screen_rect();
        self.session
            .set_container(Container::new(full.left(), full.top(), full.width(), full.height()));
        self.handle_input(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                let full = ui.max_rect();
                self.ensure_texture(ctx);

                let painter = ui.painter();
                if let (Ok(fit), Some(texture)) = (self.session.fit(), &self.texture) {
                    painter.image(
                        texture.id(),
                        to_egui(fit.displayed_area()),
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        egui::Color32::WHITE,
                    );
                }
                self.paint_selection(painter, full);

                painter.text(
                    full.left_top() + egui::vec2(16.0, 16.0),
                    egui::Align2::LEFT_TOP,
                    state.display_text(),
                    egui::FontId::proportional(16.0),
                    egui::Color32::WHITE,
                );
            });

        self.toolbar = self.show_toolbar(ctx);
        ctx.set_cursor_icon(self.cursor(ctx));
    }

    fn ensure_texture(&mut self, ctx: &egui::Context) {
        if self.texture.is_some() {
            return;
        }
        let Some(pixels) = self.session.source().map(|s| s.pixels()) else {
            return;
        };

        let size = [pixels.width() as usize, pixels.height() as usize];
        let image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_raw());
        self.texture = Some(ctx.load_texture(
            format!("capture-{}", self.session.id()),
            image,
            egui::TextureOptions::LINEAR,
        ));
    }

    fn handle_input(&mut self, ctx: &egui::Context) {
        let events = ctx.input(|i| i.events.clone());

        for event in events {
            let mapped = match event {
                egui::Event::PointerMoved(pos) => Some(SessionEvent::Pointer(PointerEvent::Move { pos: to_point(pos) })),
                egui::Event::PointerButton {
                    pos,
                    button,
                    pressed: true,
                    ..
                } => {
                    if self.toolbar.is_some_and(|r| r.contains(pos)) {
                        None
                    } else {
                        map_button(button).map(|button| {
                            SessionEvent::Pointer(PointerEvent::Down {
                                pos: to_point(pos),
                                button,
                            })
                        })
                    }
                }
                egui::Event::PointerButton {
                    pos,
                    button: egui::PointerButton::Primary,
                    pressed: false,
                    ..
                } => Some(SessionEvent::Pointer(PointerEvent::Up { pos: to_point(pos) })),
                egui::Event::Key {
                    key: egui::Key::Escape,
                    pressed: true,
                    ..
                } => Some(SessionEvent::Key(overlay::Key::Escape)),
                egui::Event::Key {
                    key: egui::Key::Enter,
                    pressed: true,
                    repeat: false,
                    ..
                } => Some(SessionEvent::Key(overlay::Key::Enter)),
                _ => None,
            };

            if let Some(event) = mapped {
                self.session.handle(event);
            }
        }
    }

    fn paint_selection(&self, painter: &egui::Painter, full: egui::Rect) {
        let dim = egui::Color32::from_black_alpha(110);
        let Some(rect) = self.session.selection() else {
            painter.rect_filled(full, 0.0, dim);
            return;
        };

        let sel = to_egui(rect).intersect(full);
        for band in [
            egui::Rect::from_min_max(full.min, egui::pos2(full.max.x, sel.min.y)),
            egui::Rect::from_min_max(egui::pos2(full.min.x, sel.max.y), full.max),
            egui::Rect::from_min_max(egui::pos2(full.min.x, sel.min.y), egui::pos2(sel.min.x, sel.max.y)),
            egui::Rect::from_min_max(egui::pos2(sel.max.x, sel.min.y), egui::pos2(full.max.x, sel.max.y)),
        ] {
            if band.is_positive() {
                painter.rect_filled(band, 0.0, dim);
            }
        }
        painter.rect_stroke(to_egui(rect), 0.0, egui::Stroke::new(2.0, ACCENT));

        if let Ok(fit) = self.session.fit() {
            let native = fit.to_native(&rect);
            painter.text(
                egui::pos2(rect.x, rect.y - 4.0),
                egui::Align2::LEFT_BOTTOM,
                format!("{} x {}", native.width, native.height),
                egui::FontId::monospace(13.0),
                egui::Color32::WHITE,
            );
        }

        let config = self.session.config();
        if config.resize_handles && self.session.mode().kind() == ModeKind::Selected {
            for handle in Handle::ALL {
                let knob = to_egui(handle.hit_box(&rect, config.handle_size * 0.75));
                painter.rect_filled(knob, 2.0, egui::Color32::WHITE);
                painter.rect_stroke(knob, 2.0, egui::Stroke::new(1.0, ACCENT));
            }
        }

        if self.session.status() == SessionStatus::Processing {
            painter.rect_filled(to_egui(rect), 0.0, egui::Color32::from_black_alpha(120));
            painter.text(
                to_egui(rect).center(),
                egui::Align2::CENTER_CENTER,
                "Tagging...",
                egui::FontId::proportional(20.0),
                egui::Color32::WHITE,
            );
        }
    }

    /// Cancel and Tag buttons under a committed selection
    fn show_toolbar(&mut self, ctx: &egui::Context) -> Option<egui::Rect> {
        let Mode::Selected { rect } = *self.session.mode() else {
            return None;
        };
        let busy = self.session.status() == SessionStatus::Processing;

        let screen = ctx.screen_rect();
        let below = rect.bottom() + 8.0;
        let y = if below + 40.0 > screen.bottom() {
            (rect.y - 48.0).max(screen.top())
        } else {
            below
        };

        let mut clear = false;
        let mut confirm = false;
        let response = egui::Area::new(egui::Id::new(("snaptag-toolbar", self.session.id())))
            .fixed_pos(egui::pos2(rect.x, y))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        clear = ui.add_enabled(!busy, egui::Button::new("Cancel")).clicked();
                        confirm = ui
                            .add_enabled(!busy, egui::Button::new(egui::RichText::new("Tag").strong()))
                            .clicked();
                    });
                });
            })
            .response;

        if clear {
            self.session.handle(SessionEvent::Clear);
        }
        if confirm {
            self.session.handle(SessionEvent::Confirm);
        }
        Some(response.rect)
    }

    fn cursor(&self, ctx: &egui::Context) -> egui::CursorIcon {
        match self.session.status() {
            SessionStatus::Loading | SessionStatus::Processing => return egui::CursorIcon::Progress,
            SessionStatus::Closed => return egui::CursorIcon::Default,
            SessionStatus::Interactive => {}
        }

        let mode = self.session.mode();
        if let Some(handle) = mode.handle() {
            return handle_cursor(handle);
        }
        match mode.kind() {
            ModeKind::Moving => egui::CursorIcon::Grabbing,
            ModeKind::Selecting => egui::CursorIcon::Crosshair,
            ModeKind::None | ModeKind::Selected | ModeKind::Resizing => {
                let Some(pos) = ctx.pointer_hover_pos() else {
                    return egui::CursorIcon::Crosshair;
                };
                if self.toolbar.is_some_and(|r| r.contains(pos)) {
                    return egui::CursorIcon::PointingHand;
                }
                match self.session.hit_test(to_point(pos)) {
                    Hit::Handle(handle) => handle_cursor(handle),
                    Hit::Inside if self.session.config().movable => egui::CursorIcon::Grab,
                    Hit::Inside | Hit::Outside => egui::CursorIcon::Crosshair,
                }
            }
        }
    }
}

/// Runs every overlay until the last one closes
pub struct OverlayApp {
    views: Vec<OverlayView>,
    outcome: OutcomeSlot,
}

impl OverlayApp {
    pub fn new(cc: &eframe::CreationContext<'_>, views: Vec<OverlayView>, outcome: OutcomeSlot) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        Self { views, outcome }
    }
}

impl eframe::App for OverlayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let statuses: Vec<_> = self.views.iter_mut().map(|v| v.session.pump()).collect();
        let state = AppState::from_sessions(&statuses);

        if state.is_finished() {
            let merged = merge_outcomes(self.views.iter().filter_map(|v| v.session.outcome()));
            log::info!("All overlays closed: {:?}", merged);
            *self.outcome.lock() = Some(merged);
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        let Some((first, rest)) = self.views.split_first_mut() else {
            return;
        };

        if first.session.is_closed() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Visible(false));
        } else {
            first.show(ctx, state);
        }

        for view in rest.iter_mut().filter(|v| !v.session.is_closed()) {
            let builder = view.viewport_builder();
            ctx.show_viewport_immediate(view.viewport_id(), builder, |ctx, _class| {
                view.show(ctx, state);
            });
        }

        // Capture and dispatch results arrive from worker threads
        ctx.request_repaint();
    }
}
