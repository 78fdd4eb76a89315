//! Piston Runner entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, PointerEvent};

    use piston_runner::consts::SIM_DT_MS;
    use piston_runner::sim::{GameState, Key, ObstacleState, RawInput};
    use piston_runner::{HudSnapshot, Scene, SceneEvent, SceneKind, Session, Tuning};

    /// Game instance holding all state
    struct Game {
        session: Session,
        ctx: CanvasRenderingContext2d,
        last_time: f64,
    }

    impl Game {
        /// Render the current frame
        fn render(&self) {
            let tuning = self.session.director().tuning();
            let (w, h) = (tuning.viewport_width as f64, tuning.viewport_height as f64);
            let ctx = &self.ctx;

            ctx.set_fill_style_str("#87ceeb");
            ctx.fill_rect(0.0, 0.0, w, h);

            match self.session.director().scene() {
                Scene::Splash => {
                    draw_banner(ctx, w, h, "PISTON RUNNER", "Tap or press any key to start");
                }
                Scene::Playing(state) => draw_world(ctx, state),
                Scene::Won(score) => {
                    draw_banner(ctx, w, h, "YOU WIN!", &format!("Final score: {}", score.total));
                }
                Scene::Lost(score) => {
                    draw_banner(ctx, w, h, "GAME OVER", &format!("Final score: {}", score.total));
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let window = web_sys::window().unwrap();
            let document = window.document().unwrap();

            let hud = self.session.hud();
            if let Some(el) = document.get_element_by_id("hud") {
                let _ = el.set_attribute("class", if hud.is_some() { "" } else { "hidden" });
            }
            let Some(hud) = hud else {
                return;
            };

            set_text(&document, "#hud-score .hud-value", &hud.score.to_string());
            set_text(&document, "#hud-lives .hud-value", &hud.lives.to_string());
            set_text(&document, "#hud-timer .hud-value", &hud.timer_text);

            if let Some(el) = document.get_element_by_id("hud-timer") {
                let class = if hud.low_time { "low-time" } else { "" };
                let _ = el.set_attribute("class", class);
                let _ = el.set_attribute("style", &format!("transform: scale({:.3})", hud.timer_pulse));
            }

            if let Some(el) = document.get_element_by_id("hud-superstar") {
                match hud.superstar_seconds {
                    Some(secs) => {
                        el.set_text_content(Some(&format!("SUPERSTAR MODE! {}s", secs)));
                        let _ = el.set_attribute("class", "");
                    }
                    None => {
                        let _ = el.set_attribute("class", "hidden");
                    }
                }
            }

            set_text(&document, "#hud-jumps", &jump_icons(&hud));
        }
    }

    fn set_text(document: &web_sys::Document, selector: &str, text: &str) {
        if let Some(el) = document.query_selector(selector).ok().flatten() {
            el.set_text_content(Some(text));
        }
    }

    /// Filled star per usable charge, hollow per spent one
    fn jump_icons(hud: &HudSnapshot) -> String {
        hud.jump_icons
            .iter()
            .map(|&ready| if ready { '\u{2605}' } else { '\u{2606}' })
            .collect()
    }

    fn draw_banner(ctx: &CanvasRenderingContext2d, w: f64, h: f64, title: &str, subtitle: &str) {
        ctx.set_fill_style_str("rgba(0, 0, 0, 0.5)");
        ctx.fill_rect(0.0, 0.0, w, h);
        ctx.set_fill_style_str("#ffffff");
        ctx.set_text_align("center");
        ctx.set_font("bold 48px sans-serif");
        let _ = ctx.fill_text(title, w / 2.0, h / 2.0 - 20.0);
        ctx.set_font("24px sans-serif");
        let _ = ctx.fill_text(subtitle, w / 2.0, h / 2.0 + 30.0);
    }

    fn fill_box(ctx: &CanvasRenderingContext2d, center: Vec2, size: Vec2) {
        let min = center - size / 2.0;
        ctx.fill_rect(min.x as f64, min.y as f64, size.x as f64, size.y as f64);
    }

    fn draw_world(ctx: &CanvasRenderingContext2d, state: &GameState) {
        ctx.save();
        let _ = ctx.translate(-(state.camera_scroll_x as f64), 0.0);

        ctx.set_fill_style_str("#5d4037");
        for segment in &state.segments {
            fill_box(ctx, segment.center, Vec2::new(segment.width, segment.height));
        }

        for obstacle in &state.obstacles {
            let color = match obstacle.state {
                ObstacleState::Alive => "#eeeeee",
                ObstacleState::Defeated { .. } => "rgba(238, 238, 238, 0.4)",
            };
            ctx.set_fill_style_str(color);
            fill_box(ctx, obstacle.pos, Vec2::splat(obstacle.size));
        }

        for powerup in state.powerups.iter().filter(|p| !p.collected) {
            ctx.set_fill_style_str("#ffd700");
            fill_box(ctx, powerup.pos, Vec2::splat(powerup.size));
        }

        let player = &state.player;
        ctx.set_fill_style_str(if state.is_powered() { "#ff4081" } else { "#1e88e5" });
        fill_box(ctx, player.pos, player.size);

        ctx.set_fill_style_str("#ffeb3b");
        ctx.set_text_align("center");
        ctx.set_font("bold 24px sans-serif");
        for popup in &state.popups {
            let _ = ctx.fill_text(&popup.text, popup.pos.x as f64, popup.pos.y as f64);
        }

        ctx.restore();
    }

    /// Tuning from an inline `<script id="tuning" type="application/json">`
    fn load_tuning(document: &web_sys::Document) -> Tuning {
        let Some(text) = document.get_element_by_id("tuning").and_then(|el| el.text_content()) else {
            return Tuning::default();
        };
        match Tuning::from_json(&text) {
            Ok(tuning) => {
                log::info!("Loaded tuning overrides");
                tuning
            }
            Err(err) => {
                log::warn!("Ignoring tuning overrides: {}", err);
                Tuning::default()
            }
        }
    }

    fn map_key(key: &str) -> Key {
        match key {
            "ArrowUp" => Key::Up,
            " " => Key::Space,
            "Shift" => Key::Shift,
            _ => Key::Other,
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Piston Runner starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let tuning = load_tuning(&document);
        canvas.set_width(tuning.viewport_width as u32);
        canvas.set_height(tuning.viewport_height as u32);

        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .expect("no 2d context")
            .dyn_into()
            .expect("not a 2d context");

        let seed = js_sys::Date::now() as u64;
        let mut session = Session::new(tuning, seed);
        session.subscribe(on_scene_event);
        log::info!("Game initialized with seed: {}", seed);

        let game = Rc::new(RefCell::new(Game {
            session,
            ctx,
            last_time: 0.0,
        }));

        setup_input_handlers(&canvas, game.clone());
        request_animation_frame(game);

        log::info!("Piston Runner running!");
    }

    /// Show or hide the overlays for each scene
    fn on_scene_event(event: &SceneEvent) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        match event {
            SceneEvent::Ready(kind) => {
                let splash = if *kind == SceneKind::Splash { "" } else { "hidden" };
                if let Some(el) = document.get_element_by_id("splash") {
                    let _ = el.set_attribute("class", splash);
                }
                let ended = matches!(kind, SceneKind::Won | SceneKind::Lost);
                if let Some(el) = document.get_element_by_id("end-screen") {
                    let _ = el.set_attribute("class", if ended { "" } else { "hidden" });
                }
            }
            SceneEvent::RunStarted(handoff) => {
                log::info!("Run started with {} lives", handoff.lives);
            }
            SceneEvent::RunEnded { score, won } => {
                set_text(&document, "#end-title", if *won { "YOU WIN!" } else { "GAME OVER" });
                set_text(
                    &document,
                    "#end-score",
                    &format!(
                        "Score {} + Distance {} + Lives {} = {}",
                        score.base, score.distance_bonus, score.life_bonus, score.total
                    ),
                );
            }
        }
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Pointer events (mouse and touch)
        let pointer_events: [(&str, fn(u32, Vec2) -> RawInput); 3] = [
            ("pointerdown", |id, pos| RawInput::PointerDown { id, pos }),
            ("pointermove", |id, pos| RawInput::PointerMove { id, pos }),
            ("pointerup", |id, pos| RawInput::PointerUp { id, pos }),
        ];
        for (name, make) in pointer_events {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.prevent_default();
                let pos = Vec2::new(event.offset_x() as f32, event.offset_y() as f32);
                game.borrow_mut()
                    .session
                    .handle_input(make(event.pointer_id() as u32, pos));
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        for name in ["pointercancel", "pointerleave"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let id = event.pointer_id() as u32;
                game.borrow_mut().session.handle_input(RawInput::PointerCancel { id });
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        let window = web_sys::window().unwrap();
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                let key = event.key();
                if key == "i" || key == "I" {
                    let enabled = !g.session.autopilot();
                    g.session.set_autopilot(enabled);
                    return;
                }
                if key == " " || key == "ArrowUp" {
                    event.prevent_default();
                }
                g.session.handle_input(RawInput::KeyDown(map_key(&key)));
            });
            let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = map_key(&event.key());
                game.borrow_mut().session.handle_input(RawInput::KeyUp(key));
            });
            let _ = window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt_ms = if g.last_time > 0.0 {
                (time - g.last_time) as f32
            } else {
                SIM_DT_MS
            };
            g.last_time = time;

            g.session.frame(dt_ms);
            g.render();
            g.update_hud();
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
fn main() -> std::process::ExitCode {
    use piston_runner::consts::SIM_DT_MS;
    use piston_runner::{SceneEvent, SceneKind, Session, Tuning};

    env_logger::init();
    log::info!("Piston Runner (native) starting...");
    log::info!("Native mode runs a headless autopilot game - run with `trunk serve` to play");

    // Usage: piston-runner [seed] [tuning.json]
    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
    let tuning = match args.next() {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|err| err.to_string())
            .and_then(|json| Tuning::from_json(&json).map_err(|err| err.to_string()))
        {
            Ok(tuning) => tuning,
            Err(err) => {
                log::error!("Failed to load tuning from {}: {}", path, err);
                return std::process::ExitCode::FAILURE;
            }
        },
        None => Tuning::default(),
    };

    let mut session = Session::new(tuning, seed);
    session.subscribe(|event| {
        if let SceneEvent::RunEnded { score, won } = event {
            println!(
                "{}: base {} + distance {} + lives {} = {}",
                if *won { "WIN" } else { "LOSE" },
                score.base,
                score.distance_bonus,
                score.life_bonus,
                score.total
            );
        }
    });
    session.set_autopilot(true);
    session.director_mut().start_game();

    // Generous cap: the countdown ends every run well before this
    let max_frames = 200_000;
    for _ in 0..max_frames {
        session.frame(SIM_DT_MS * 2.0);
        if matches!(session.director().scene_kind(), SceneKind::Won | SceneKind::Lost) {
            return std::process::ExitCode::SUCCESS;
        }
    }
    log::error!("Run did not finish within {} frames", max_frames);
    std::process::ExitCode::FAILURE
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
