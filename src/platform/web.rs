//! Browser host
//!
//! HUD messages, banners and popups are DOM elements; the maze is drawn as
//! a top-down map on a 2D canvas.

use std::collections::BTreeMap;

use glam::Vec3;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlElement};

use super::{AudioOutput, Host, Messages, Visuals, popup_text};
use crate::audio::{AudioManager, MusicTrack, SoundEffect};
use crate::settings::Settings;
use crate::sim::{Aabb, Popup, VisualId, VisualKind, VisualProperty};

/// Pixels per world unit on the map
const MAP_SCALE: f64 = 12.0;

/// A scene object as last described by the simulation
#[derive(Debug, Clone)]
struct SceneObject {
    kind: VisualKind,
    bounds: Aabb,
    position: Option<Vec3>,
    raised: bool,
    visible: bool,
    open: bool,
    glow: f32,
}

impl SceneObject {
    fn new(kind: VisualKind, bounds: Aabb) -> Self {
        Self {
            kind,
            bounds,
            position: None,
            raised: false,
            visible: true,
            open: false,
            glow: 1.0,
        }
    }

    fn fill(&self) -> String {
        match self.kind {
            VisualKind::Floor => "#2e7d32".to_string(),
            VisualKind::Wall => "#1b5e20".to_string(),
            VisualKind::Goal => {
                let alpha = (self.glow / 1.3).clamp(0.3, 1.0);
                format!("rgba(255, 215, 0, {alpha:.2})")
            }
            VisualKind::Spikes if self.raised => "#b0bec5".to_string(),
            VisualKind::Spikes => "#546e7a".to_string(),
            VisualKind::Trapdoor if self.open => "#000000".to_string(),
            VisualKind::Trapdoor => "#33691e".to_string(),
            VisualKind::SpeedBoost => "#1e88e5".to_string(),
            VisualKind::Monster => "#4a148c".to_string(),
            VisualKind::ReturnPortal => "#7e57c2".to_string(),
        }
    }
}

/// DOM + canvas + audio host
pub struct WebHost {
    document: Document,
    ctx: Option<CanvasRenderingContext2d>,
    canvas: HtmlCanvasElement,
    objects: BTreeMap<VisualId, SceneObject>,
    sky: String,
    popup: Option<Popup>,
    message_seq: u32,
    pub audio: AudioManager,
    pub settings: Settings,
}

impl WebHost {
    pub fn new(document: Document, canvas: HtmlCanvasElement, settings: Settings) -> Self {
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok());
        if ctx.is_none() {
            log::warn!("No 2D canvas context - map disabled");
        }
        let mut audio = AudioManager::new();
        audio.configure(&settings);
        Self {
            document,
            ctx,
            canvas,
            objects: BTreeMap::new(),
            sky: "#87CEEB".to_string(),
            popup: None,
            message_seq: 0,
            audio,
            settings,
        }
    }

    /// Popup currently on screen
    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    fn element(&self, id: &str) -> Option<HtmlElement> {
        self.document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    }

    fn set_hidden(&self, id: &str, hidden: bool) {
        if let Some(el) = self.document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if hidden { "hidden" } else { "" });
        }
    }

    fn set_text(&self, id: &str, text: &str) {
        if let Some(el) = self.document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    /// Hide an element after `duration_ms` unless something newer replaced it
    fn hide_later(&self, id: &'static str, duration_ms: f64, seq: u32) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = wasm_bindgen::closure::Closure::once(move || {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            if let Some(el) = document.get_element_by_id(id) {
                if el.get_attribute("data-seq").as_deref() == Some(seq.to_string().as_str()) {
                    let _ = el.set_attribute("class", "hidden");
                }
            }
        });
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            duration_ms as i32,
        );
        closure.forget();
    }

    /// Draw the map with the player on it
    pub fn render(&self, player: Vec3, angle: f32) {
        let Some(ctx) = &self.ctx else {
            return;
        };
        let w = self.canvas.width() as f64;
        let h = self.canvas.height() as f64;
        ctx.set_fill_style_str(&self.sky);
        ctx.fill_rect(0.0, 0.0, w, h);

        let to_screen = |x: f32, z: f32| {
            (
                w / 2.0 + (x - player.x) as f64 * MAP_SCALE,
                h / 2.0 + (z - player.z) as f64 * MAP_SCALE,
            )
        };

        for object in self.objects.values() {
            if !object.visible {
                continue;
            }
            let bounds = match object.position {
                Some(p) => Aabb::from_center_size(p, object.bounds.size()),
                None => object.bounds,
            };
            let (x0, z0) = to_screen(bounds.min.x, bounds.min.z);
            let (x1, z1) = to_screen(bounds.max.x, bounds.max.z);
            ctx.set_fill_style_str(&object.fill());
            ctx.fill_rect(x0, z0, (x1 - x0).max(2.0), (z1 - z0).max(2.0));
        }

        // Player arrow; forward is (-sin, -cos) on the ground plane
        let (px, pz) = (w / 2.0, h / 2.0);
        let (fx, fz) = (-(angle.sin()) as f64, -(angle.cos()) as f64);
        ctx.set_fill_style_str("#ffffff");
        ctx.begin_path();
        ctx.move_to(px + fx * 10.0, pz + fz * 10.0);
        ctx.line_to(px - fz * 5.0, pz + fx * 5.0);
        ctx.line_to(px + fz * 5.0, pz - fx * 5.0);
        ctx.close_path();
        ctx.fill();
    }
}

impl AudioOutput for WebHost {
    fn play_music(&mut self, track: MusicTrack) {
        self.audio.play_music(track);
    }

    fn play_sound(&mut self, effect: SoundEffect) {
        self.audio.play_sound(effect);
    }

    fn stop_all(&mut self) {
        self.audio.stop_all();
    }

    fn set_playback_rate(&mut self, rate: f32) {
        self.audio.set_playback_rate(rate);
    }
}

impl Visuals for WebHost {
    fn set_sky(&mut self, color: &str) {
        self.sky = color.to_string();
    }

    fn spawn_visual(&mut self, id: VisualId, kind: VisualKind, bounds: Aabb) {
        self.objects.insert(id, SceneObject::new(kind, bounds));
    }

    fn remove_visual(&mut self, id: VisualId) {
        self.objects.remove(&id);
    }

    fn set_visual_property(&mut self, id: VisualId, property: VisualProperty) {
        let Some(object) = self.objects.get_mut(&id) else {
            log::debug!("Property for unknown visual {id}");
            return;
        };
        match property {
            VisualProperty::Raised(raised) => object.raised = raised,
            VisualProperty::Visible(visible) => object.visible = visible,
            VisualProperty::Open(open) => object.open = open,
            VisualProperty::Position(p) => object.position = Some(p),
            // Height bob has no top-down equivalent
            VisualProperty::HoverOffset(_) => {}
            VisualProperty::LightIntensity(i) => object.glow = i,
        }
    }
}

impl Messages for WebHost {
    fn show_message(&mut self, text: &str, color: &str, duration_ms: f64) {
        self.message_seq += 1;
        if let Some(el) = self.element("message") {
            el.set_text_content(Some(text));
            let _ = el.style().set_property("color", color);
            let _ = el.set_attribute("data-seq", &self.message_seq.to_string());
            let _ = el.set_attribute("class", "");
        }
        self.hide_later("message", duration_ms, self.message_seq);
    }

    fn show_level_banner(&mut self, name: &str, duration_ms: f64) {
        self.message_seq += 1;
        if let Some(el) = self.element("level-banner") {
            el.set_text_content(Some(name));
            let _ = el.set_attribute("data-seq", &self.message_seq.to_string());
            let _ = el.set_attribute("class", "");
        }
        self.hide_later("level-banner", duration_ms, self.message_seq);
    }

    fn show_popup(&mut self, popup: &Popup) {
        let (title, body, button, _) = popup_text(popup);
        self.set_text("popup-title", &title);
        self.set_text("popup-body", &body);
        self.set_text("popup-button", button);
        self.set_hidden("popup", false);
        self.popup = Some(popup.clone());
    }

    fn hide_popup(&mut self) {
        self.set_hidden("popup", true);
        self.set_hidden("portal-confirm", true);
        self.popup = None;
    }

    fn show_confirmation(&mut self, text: &str) {
        self.set_text("portal-text", text);
        self.set_hidden("portal-confirm", false);
    }
}

impl Host for WebHost {
    fn tutorial_dismissed(&mut self) {
        self.settings.tutorial_seen = true;
        self.settings.save();
    }

    fn navigate_to(&mut self, url: &str) {
        if let Some(window) = web_sys::window() {
            if window.location().set_href(url).is_err() {
                log::error!("Could not navigate to {url}");
            }
        }
    }

    fn session_complete(&mut self) {
        log::info!("All levels complete");
    }
}
