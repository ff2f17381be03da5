//! Triwizard Maze entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent};

    use triwizard_maze::Settings;
    use triwizard_maze::consts::*;
    use triwizard_maze::platform::{dispatch, web::WebHost};
    use triwizard_maze::sim::{
        GameSession, InputEvent, InputState, LevelSet, Popup, SessionConfig, UiResponse, tick,
    };

    /// Game instance holding all state
    struct Game {
        session: GameSession,
        host: WebHost,
        input: InputState,
        accumulator: f64,
        last_time: f64,
    }

    impl Game {
        /// Run simulation ticks
        fn update(&mut self, dt_ms: f64) {
            self.accumulator += dt_ms.min(100.0);

            let mut substeps = 0;
            while self.accumulator >= SIM_DT_MS && substeps < MAX_SUBSTEPS {
                let input = self.input.take_tick_input();
                tick(&mut self.session, &input, SIM_DT_MS);
                self.accumulator -= SIM_DT_MS;
                substeps += 1;
            }

            dispatch(self.session.drain_events(), &mut self.host);
        }

        fn render(&self) {
            let player = &self.session.player;
            self.host.render(player.position, player.angle);
        }
    }

    /// `?portal=true&ref=<url>` marks a visitor who arrived through a portal
    fn referrer_from_url() -> Option<String> {
        let href = web_sys::window()?.location().href().ok()?;
        let url = web_sys::Url::new(&href).ok()?;
        let params = url.search_params();
        if params.get("portal").as_deref() != Some("true") {
            return None;
        }
        params.get("ref").filter(|r| !r.is_empty())
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Triwizard Maze starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");
        let dpr = window.device_pixel_ratio();
        canvas.set_width((canvas.client_width() as f64 * dpr) as u32);
        canvas.set_height((canvas.client_height() as f64 * dpr) as u32);

        let levels = match LevelSet::builtin() {
            Ok(levels) => levels,
            Err(e) => {
                log::error!("Built-in levels are broken: {e}");
                return;
            }
        };

        let settings = Settings::load();
        let referrer = referrer_from_url();
        if let Some(url) = &referrer {
            log::info!("Arrived through a portal from {url}");
        }
        let config = SessionConfig {
            controls: settings.controls.clone(),
            tutorial_seen: settings.tutorial_seen,
            referrer,
            ..Default::default()
        };

        let mut session = GameSession::new(levels, config);
        if let Err(e) = session.start() {
            log::error!("Could not start: {e}");
            return;
        }

        let mut host = WebHost::new(document.clone(), canvas, settings);
        dispatch(session.drain_events(), &mut host);

        let game = Rc::new(RefCell::new(Game {
            session,
            host,
            input: InputState::new(),
            accumulator: 0.0,
            last_time: 0.0,
        }));

        setup_keyboard(game.clone());
        setup_buttons(&document, game.clone());
        setup_visibility(&document, game.clone());

        request_animation_frame(game);

        log::info!("Triwizard Maze running!");
    }

    fn setup_keyboard(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                g.host.audio.resume();
                let mapped = match event.key().as_str() {
                    "ArrowLeft" | "a" | "A" => Some(InputEvent::TurnLeft),
                    "ArrowRight" | "d" | "D" => Some(InputEvent::TurnRight),
                    "ArrowUp" | "w" | "W" => Some(InputEvent::MoveForward),
                    "ArrowDown" | "s" | "S" => Some(InputEvent::MoveBackward),
                    "+" | "=" => {
                        g.input.request_skip_level(); // Debug: skip to next level
                        None
                    }
                    _ => None,
                };
                if let Some(input) = mapped {
                    event.prevent_default();
                    g.input.apply(input);
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "ArrowLeft" | "ArrowRight" | "a" | "A" | "d" | "D" => {
                        g.input.apply(InputEvent::EndTurn)
                    }
                    "ArrowUp" | "ArrowDown" | "w" | "W" | "s" | "S" => {
                        g.input.apply(InputEvent::Stop)
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn on_click(document: &Document, id: &str, handler: impl FnMut(web_sys::MouseEvent) + 'static) {
        let Some(btn) = document.get_element_by_id(id) else {
            log::warn!("Missing #{id}");
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(handler);
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        {
            let game = game.clone();
            on_click(document, "popup-button", move |_| {
                let mut g = game.borrow_mut();
                g.host.audio.resume();
                let Some(popup) = g.host.popup().cloned() else {
                    return;
                };
                if popup == Popup::Victory {
                    if let Some(window) = web_sys::window() {
                        let _ = window.location().reload();
                    }
                    return;
                }
                let (_, _, _, response) = triwizard_maze::platform::popup_text(&popup);
                g.input.respond(response);
            });
        }

        {
            let game = game.clone();
            on_click(document, "portal-yes", move |_| {
                game.borrow_mut().input.respond(UiResponse::PortalYes);
            });
        }

        on_click(document, "portal-no", move |_| {
            game.borrow_mut().input.respond(UiResponse::PortalNo);
        });
    }

    fn setup_visibility(document: &Document, game: Rc<RefCell<Game>>) {
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut g = game.borrow_mut();
            let hidden = document_clone.visibility_state() == web_sys::VisibilityState::Hidden;
            if hidden {
                // Keys released while hidden never send keyup
                g.input.release_all();
                log::info!("Tab hidden, input released");
            }
            let muted = hidden || g.host.settings.muted;
            g.host.audio.set_muted(muted);
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            let dt_ms = if g.last_time > 0.0 {
                time - g.last_time
            } else {
                SIM_DT_MS
            };
            g.last_time = time;

            g.update(dt_ms);
            g.render();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Triwizard Maze (native) starting...");
    log::info!("Native mode is headless - run with `trunk serve` for the web version");

    if let Err(e) = run_headless() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Walk the first corridor of level 1 and report what a frontend would see
#[cfg(not(target_arch = "wasm32"))]
fn run_headless() -> Result<(), triwizard_maze::sim::LevelError> {
    use triwizard_maze::consts::SIM_DT_MS;
    use triwizard_maze::platform::{LogHost, dispatch};
    use triwizard_maze::sim::{
        GameSession, InputEvent, InputState, LevelSet, SessionConfig, UiResponse, tick,
    };

    let settings = triwizard_maze::Settings::load();
    let mut session = GameSession::new(
        LevelSet::builtin()?,
        SessionConfig {
            controls: settings.controls.clone(),
            tutorial_seen: settings.tutorial_seen,
            ..Default::default()
        },
    );
    session.start()?;

    let mut host = LogHost::new();
    let mut input = InputState::new();
    dispatch(session.drain_events(), &mut host);
    if host.popup.is_some() {
        input.respond(UiResponse::DismissTutorial);
    }

    input.apply(InputEvent::MoveForward);
    for _ in 0..300 {
        let tick_input = input.take_tick_input();
        tick(&mut session, &tick_input, SIM_DT_MS);
        dispatch(session.drain_events(), &mut host);
    }

    let p = session.player.position;
    log::info!(
        "After {:.1} s: level {}, phase {:?}, player at ({:.2}, {:.2}, {:.2}), {} visuals",
        session.clock_ms / 1000.0,
        session.current_level,
        session.phase,
        p.x,
        p.y,
        p.z,
        host.visuals
    );
    Ok(())
}
