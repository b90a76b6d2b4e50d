//! Cat Treat entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, HtmlButtonElement, HtmlElement, HtmlImageElement};

    use cat_treat::audio::AudioManager;
    use cat_treat::consts::*;
    use cat_treat::feedback::burst_particles;
    use cat_treat::platform::{Microphone, PlatformError};
    use cat_treat::settings::Settings;
    use cat_treat::sim::{CatPose, Command, GamePhase, Layout, SeededDice, Session, Target};

    /// Game instance holding all state
    struct Game {
        session: Session<SeededDice>,
        audio: AudioManager,
        settings: Settings,
        mic: Option<Microphone>,
        last_time: f64,
        /// Flying treat sprite while the tween runs
        treat_el: Option<HtmlElement>,
        /// Cosmetic randomness (particle layout)
        fx_rng: Pcg32,
    }

    impl Game {
        fn new(seed: u64, settings: Settings) -> Self {
            let mut audio = AudioManager::new();
            audio.set_master_volume(settings.master_volume);
            audio.set_sfx_volume(settings.sfx_volume);
            audio.set_muted(settings.muted);
            Self {
                session: Session::seeded(seed, settings.timings, settings.muted),
                audio,
                settings,
                mic: None,
                last_time: 0.0,
                treat_el: None,
                fx_rng: Pcg32::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15),
            }
        }

        /// Advance timers and carry out whatever the sequencer asked for
        fn update(&mut self, dt: f64) {
            self.session.advance(dt);
            self.flush();
        }

        /// Execute pending commands against the DOM and audio
        fn flush(&mut self) {
            let Some(document) = document() else { return };
            for emitted in self.session.take_commands() {
                self.apply(&document, emitted.command);
            }
            self.update_treat_sprite();
        }

        fn apply(&mut self, document: &Document, command: Command) {
            match command {
                Command::PlaySound(key) => self.audio.play(key),
                Command::FlyTreat { from, .. } => {
                    self.treat_el = spawn_treat(document, from);
                }
                Command::Burst { at, count } => {
                    for p in burst_particles(at, count, &mut self.fx_rng) {
                        spawn_particle(document, p.origin, p.offset, p.glyph, p.font_px);
                    }
                }
                Command::FloatingText { at, glyph, style } => {
                    spawn_floating_text(document, at, glyph, style.class());
                }
                Command::HighlightTarget(target) => highlight_items(document, target),
                Command::SetStatus(status) => {
                    if let Some(el) = document.get_element_by_id("statusText") {
                        el.set_text_content(Some(status.text()));
                    }
                }
                Command::SetFeedEnabled(enabled) => {
                    if let Some(btn) = element_as::<HtmlButtonElement>(document, "treatBtn") {
                        btn.set_disabled(!enabled);
                    }
                }
                Command::SetCatPose(pose) => set_cat_pose(document, pose),
                Command::SetSwayDuration(secs) => {
                    if let Some(img) = element_as::<HtmlImageElement>(document, "catImage") {
                        let _ = img.style().set_property("animation-duration", &format!("{}s", secs));
                    }
                }
                Command::SetRecording(recording) => {
                    for id in ["micBtn", "audioVisualizer"] {
                        if let Some(el) = document.get_element_by_id(id) {
                            let class = if id == "micBtn" { "recording" } else { "active" };
                            toggle_class(&el, class, recording);
                        }
                    }
                }
                Command::MuteChanged(muted) => {
                    self.audio.set_muted(muted);
                    self.settings.muted = muted;
                    self.settings.save();
                    update_mute_button(document, muted);
                }
            }
        }

        /// Move the treat sprite along the tween, remove it on landing
        fn update_treat_sprite(&mut self) {
            match self.session.treat_sprite() {
                Some((pos, rotation)) => {
                    if let Some(el) = &self.treat_el {
                        let style = el.style();
                        let _ = style.set_property("left", &format!("{}px", pos.x - 15.0));
                        let _ = style.set_property("top", &format!("{}px", pos.y - 15.0));
                        let _ = style.set_property("transform", &format!("rotate({}deg)", rotation));
                    }
                }
                None => {
                    if let Some(el) = self.treat_el.take() {
                        el.remove();
                    }
                }
            }
        }

        /// Read treat button and cat geometry from the DOM
        fn refresh_layout(&mut self, document: &Document) {
            let (Some(btn), Some(cat)) = (
                document.get_element_by_id("treatBtn"),
                document.get_element_by_id("cat"),
            ) else {
                return;
            };
            let b = btn.get_bounding_client_rect();
            let c = cat.get_bounding_client_rect();
            self.session.set_layout(Layout {
                treat_button: Vec2::new(
                    (b.left() + b.width() / 2.0) as f32,
                    (b.top() + b.height() / 2.0) as f32,
                ),
                cat_origin: Vec2::new(c.left() as f32, c.top() as f32),
                cat_size: Vec2::new(c.width() as f32, c.height() as f32),
            });
        }
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn element_as<T: JsCast>(document: &Document, id: &str) -> Option<T> {
        document.get_element_by_id(id)?.dyn_into::<T>().ok()
    }

    fn toggle_class(el: &Element, class: &str, on: bool) {
        let list = el.class_list();
        let _ = if on { list.add_1(class) } else { list.remove_1(class) };
    }

    fn alert(message: &str) {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }

    fn set_cat_pose(document: &Document, pose: CatPose) {
        if let Some(img) = element_as::<HtmlImageElement>(document, "catImage") {
            img.set_src(pose.image());
            img.set_class_name(pose.image_class());
            if !pose.is_pointing() {
                let _ = img.style().remove_property("animation-duration");
            }
        }
        if let Some(cat) = document.get_element_by_id("cat") {
            toggle_class(&cat, "confirming", pose.container_class() == Some("confirming"));
            toggle_class(&cat, "happy", pose.container_class() == Some("happy"));
        }
    }

    fn highlight_items(document: &Document, target: Option<Target>) {
        let Ok(items) = document.query_selector_all(".item") else { return };
        for i in 0..items.length() {
            let Some(el) = items.get(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            let item = el.get_attribute("data-type").and_then(|k| Target::from_key(&k));
            toggle_class(&el, "highlighted", item.is_some() && item == target);
        }
    }

    fn update_mute_button(document: &Document, muted: bool) {
        if let Some(btn) = document.get_element_by_id("muteBtn") {
            btn.set_text_content(Some(if muted { "🔇" } else { "🔊" }));
            toggle_class(&btn, "muted", muted);
        }
    }

    /// Create a fixed-position div and append it to `parent`
    fn spawn_div(document: &Document, parent: &Element, class: &str, text: &str, at: Vec2) -> Option<HtmlElement> {
        let el: HtmlElement = document.create_element("div").ok()?.dyn_into().ok()?;
        el.set_class_name(class);
        el.set_text_content(Some(text));
        let style = el.style();
        let _ = style.set_property("left", &format!("{}px", at.x));
        let _ = style.set_property("top", &format!("{}px", at.y));
        parent.append_child(&el).ok()?;
        Some(el)
    }

    fn spawn_treat(document: &Document, from: Vec2) -> Option<HtmlElement> {
        let body = document.body()?;
        let el = spawn_div(document, &body, "flying-treat", "✨", from - Vec2::splat(15.0))?;
        let style = el.style();
        let _ = style.set_property("position", "fixed");
        let _ = style.set_property("font-size", "30px");
        let _ = style.set_property("pointer-events", "none");
        let _ = style.set_property("z-index", "50");
        Some(el)
    }

    fn spawn_particle(document: &Document, at: Vec2, offset: Vec2, glyph: &str, font_px: f32) {
        let Some(container) = document.get_element_by_id("feedbackContainer") else { return };
        let Some(el) = spawn_div(document, &container, "particle", glyph, at) else { return };
        let style = el.style();
        let _ = style.set_property("font-size", &format!("{}px", font_px));
        let _ = style.set_property("--tx", &format!("{}px", offset.x));
        let _ = style.set_property("--ty", &format!("{}px", offset.y));
        remove_later(el, PARTICLE_LIFETIME_SECS);
    }

    fn spawn_floating_text(document: &Document, at: Vec2, glyph: &str, class: &str) {
        let Some(container) = document.get_element_by_id("feedbackContainer") else { return };
        let class = format!("floating-text {}", class);
        if let Some(el) = spawn_div(document, &container, &class, glyph, at) {
            remove_later(el, FLOATING_TEXT_LIFETIME_SECS);
        }
    }

    /// Remove a feedback node once its CSS animation is over
    fn remove_later(el: HtmlElement, secs: f64) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once_into_js(move || el.remove());
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.unchecked_ref(),
            (secs * 1000.0) as i32,
        );
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            return;
        }

        log::info!("Cat Treat starting...");

        let Some(document) = document() else {
            log::error!("{}", PlatformError::NoWindow);
            return;
        };

        let settings = Settings::load();
        let seed = js_sys::Date::now() as u64;
        let muted = settings.muted;
        let game = Rc::new(RefCell::new(Game::new(seed, settings)));
        update_mute_button(&document, muted);

        log::info!("Game initialized with seed: {}", seed);

        setup_start_button(game.clone());
        setup_mute_button(game.clone());
        setup_mic_button(game.clone());
        setup_treat_button(game.clone());
        setup_teardown(game.clone());

        if let Some(loading) = document.get_element_by_id("loadingScreen") {
            let _ = loading.set_attribute("style", "display: none");
        }

        // Start game loop
        request_animation_frame(game);

        log::info!("Cat Treat running!");
    }

    fn on_click<E: wasm_bindgen::convert::FromWasmAbi + 'static>(id: &str, event: &str, mut f: impl FnMut(E) + 'static) {
        let Some(el) = document().and_then(|d| d.get_element_by_id(id)) else {
            log::warn!("Missing element #{}", id);
            return;
        };
        let closure = Closure::<dyn FnMut(E)>::new(move |e: E| f(e));
        let _ = el.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_start_button(game: Rc<RefCell<Game>>) {
        on_click("startBtn", "click", move |event: web_sys::MouseEvent| {
            event.prevent_default();
            let game = game.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match Microphone::open().await {
                    Ok(mic) => {
                        let mut g = game.borrow_mut();
                        g.mic = Some(mic);
                        g.audio.unlock();
                    }
                    Err(e) => {
                        log::error!("Microphone init failed: {}", e);
                        alert(e.user_message());
                        return;
                    }
                }
                let Some(document) = document() else { return };
                if let Some(el) = document.get_element_by_id("startScreen") {
                    let _ = el.set_attribute("style", "display: none");
                }
                if let Some(el) = document.get_element_by_id("gameScreen") {
                    let _ = el.set_attribute("style", "display: flex");
                }
                log::info!("Game started");
            });
        });
    }

    fn setup_mute_button(game: Rc<RefCell<Game>>) {
        on_click("muteBtn", "click", move |event: web_sys::MouseEvent| {
            event.prevent_default();
            let mut g = game.borrow_mut();
            g.session.toggle_muted();
            g.flush();
        });
    }

    fn setup_mic_button(game: Rc<RefCell<Game>>) {
        let game_outer = game.clone();
        on_click("micBtn", "pointerdown", move |event: web_sys::PointerEvent| {
            event.prevent_default();
            let mut g = game_outer.borrow_mut();
            g.audio.unlock();

            if g.session.state().is_recording {
                if let Some(mic) = g.mic.as_mut() {
                    if let Err(e) = mic.stop() {
                        log::warn!("{}", e);
                    }
                }
                g.session.stop_recording();
            } else if g.session.state().phase == GamePhase::Idle && !g.session.state().is_animating {
                let game = game.clone();
                let started = match g.mic.as_mut() {
                    Some(mic) => mic.start(move || {
                        let mut g = game.borrow_mut();
                        g.session.recording_complete();
                        g.flush();
                    }),
                    None => Err(PlatformError::MicrophoneUnavailable),
                };
                match started {
                    Ok(()) => {
                        g.session.start_recording();
                    }
                    Err(e) => {
                        log::error!("Cannot record: {}", e);
                        alert(e.user_message());
                    }
                }
            }
            g.flush();
        });
    }

    fn setup_treat_button(game: Rc<RefCell<Game>>) {
        on_click("treatBtn", "pointerdown", move |event: web_sys::PointerEvent| {
            let mut g = game.borrow_mut();
            if g.session.state().phase != GamePhase::AwaitingFeed {
                return;
            }
            event.prevent_default();
            if let Some(document) = document() {
                g.refresh_layout(&document);
            }
            g.session.feed();
            g.flush();
        });
    }

    /// Cancel any in-flight round when the page goes away
    fn setup_teardown(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| {
            if let Ok(mut g) = game.try_borrow_mut() {
                if let Some(mic) = g.mic.as_mut() {
                    mic.cancel();
                }
                g.session.teardown();
                g.flush();
            }
        });
        let _ = window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        if let Ok(mut g) = game.try_borrow_mut() {
            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                (time - g.last_time) / 1000.0
            } else {
                0.0
            };
            g.last_time = time;
            g.update(dt);
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use cat_treat::Settings;
    use cat_treat::sim::{Command, Session};

    env_logger::init();
    log::info!("Cat Treat (native) starting...");
    log::info!("Native mode plays simulated rounds - run with `trunk serve` for the web version");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(42);
    let settings = Settings::load();
    let mut session = Session::seeded(seed, settings.timings, settings.muted);

    for _ in 0..3 {
        session.start_recording();
        session.stop_recording();
        session.recording_complete();
        session.run_until_settled(10.0);
        session.feed();
        session.run_until_settled(10.0);
    }

    for emitted in session.take_commands() {
        match emitted.command {
            Command::SetStatus(status) => println!("{:>7.3}s  {}", emitted.at, status.text()),
            Command::PlaySound(key) => println!("{:>7.3}s  ♪ {}", emitted.at, key.as_str()),
            Command::SetCatPose(pose) => println!("{:>7.3}s  cat: {:?}", emitted.at, pose),
            Command::SetSwayDuration(secs) => println!("{:>7.3}s  sway {:.2}s", emitted.at, secs),
            _ => {}
        }
    }
    log::info!("Played 3 rounds with seed {}", seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
