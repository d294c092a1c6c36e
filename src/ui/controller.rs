// GUI Controller - wires the Slint window to the presentation binder
//
// Slint callbacks call into the PresentationBinder on the event-loop thread.
// Count and settings changes come back as StateChange events on a listener
// thread and are rendered through the UiBridge.

use crate::models::{AppConfig, Rgb, Settings};
use crate::platform::DesktopPlatform;
use crate::state::{StateChange, StateManager};
use crate::ui::binder::{Feedback, PanelState, PresentationBinder, ViewModel, sound_glyph};
use crate::ui::bridge::UiBridge;
use anyhow::{Context, Result};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

// Include the generated Slint code
slint::include_modules!();

type Binder = PresentationBinder<DesktopPlatform>;

/// GUI Controller that wires up the Slint UI with the presentation binder
///
/// # Example
/// ```ignore
/// let state_manager = StateManager::new(store);
/// state_manager.load()?;
/// let controller = GuiController::new(state_manager, &app_config, runtime.handle().clone())?;
/// controller.run()?;  // Blocks until window is closed
/// ```
pub struct GuiController {
    ui: MainWindow,
    _bridge: UiBridge<MainWindow>,
    _binder: Rc<RefCell<Binder>>,
}

impl GuiController {
    /// Create the window, bind its callbacks and start listening for state changes
    ///
    /// # Arguments
    /// * `state_manager` - Loaded counter state
    /// * `app_config` - Feedback tuning
    /// * `tokio_handle` - Runtime for share dialogs and tone playback
    pub fn new(
        state_manager: StateManager,
        app_config: &AppConfig,
        tokio_handle: tokio::runtime::Handle,
    ) -> Result<Self> {
        let ui = MainWindow::new().context("Failed to create Slint UI")?;

        let bridge = UiBridge::new(&ui, Arc::clone(state_manager.metrics()));

        let platform = DesktopPlatform::new(tokio_handle, crate::APP_TITLE);
        let mut binder = PresentationBinder::new(
            state_manager.clone(),
            platform,
            Feedback::from_config(app_config),
        );
        if !crate::HOMEPAGE.is_empty() {
            binder = binder.with_share_url(crate::HOMEPAGE);
        }
        let binder = Rc::new(RefCell::new(binder));

        Self::render(&ui, &binder.borrow().view());
        Self::setup_callbacks(&ui, &binder, &state_manager);
        Self::setup_state_subscription(&bridge, &state_manager);

        tracing::info!("GUI controller initialized");

        Ok(Self {
            ui,
            _bridge: bridge,
            _binder: binder,
        })
    }

    /// Run the GUI (blocks until window is closed)
    pub fn run(self) -> Result<(), slint::PlatformError> {
        tracing::info!("Starting GUI event loop");
        self.ui.run()
    }

    /// Push a full view model into the window
    fn render(ui: &MainWindow, view: &ViewModel) {
        ui.set_count_text(view.count_text.clone().into());
        ui.set_surface_color(to_slint_color(view.background));
        ui.set_ink_color(to_slint_color(view.foreground));
        ui.set_sound_glyph(view.sound_glyph.into());
        ui.set_panel_open(view.panel_open);

        ui.set_background_field(view.background_field.clone().into());
        ui.set_text_color_field(view.text_color_field.clone().into());
        ui.set_increment_field(view.increment_field.clone().into());
        ui.set_limit_field(view.limit_field.clone().into());
        ui.set_vibration_field(view.vibration_field);
    }

    fn render_settings(ui: &MainWindow, settings: &Settings) {
        ui.set_surface_color(to_slint_color(settings.background_rgb()));
        ui.set_ink_color(to_slint_color(settings.text_rgb()));
        ui.set_sound_glyph(sound_glyph(settings.sound_enabled).into());
    }

    /// Run `action` against the binder unless it is already in use.
    ///
    /// Native dialogs can pump the event loop while the binder is borrowed;
    /// callbacks arriving in that window are dropped.
    fn with_binder<R>(binder: &Rc<RefCell<Binder>>, action: impl FnOnce(&mut Binder) -> R) -> Option<R> {
        match binder.try_borrow_mut() {
            Ok(mut binder) => Some(action(&mut binder)),
            Err(_) => {
                tracing::debug!("Binder busy, dropping UI event");
                None
            }
        }
    }

    fn sync_panel(ui_weak: &slint::Weak<MainWindow>, binder: &Rc<RefCell<Binder>>) {
        let Some(ui) = ui_weak.upgrade() else {
            return;
        };
        if let Ok(binder) = binder.try_borrow() {
            ui.set_panel_open(binder.panel() == PanelState::SettingsOpen);
        }
    }

    /// Set up Slint UI callbacks
    fn setup_callbacks(
        ui: &MainWindow,
        binder: &Rc<RefCell<Binder>>,
        state_manager: &StateManager,
    ) {
        let b = Rc::clone(binder);
        ui.on_surface_tapped(move || {
            if let Some(outcome) = Self::with_binder(&b, |b| b.tap()) {
                tracing::trace!("Tap: {:?}", outcome);
            }
        });

        let b = Rc::clone(binder);
        let ui_weak = ui.as_weak();
        ui.on_open_settings(move || {
            let view = Self::with_binder(&b, |b| {
                b.open_settings();
                b.view()
            });
            if let (Some(view), Some(ui)) = (view, ui_weak.upgrade()) {
                ui.set_set_value_field("".into());
                Self::render(&ui, &view);
            }
        });

        let b = Rc::clone(binder);
        let ui_weak = ui.as_weak();
        ui.on_close_settings(move || {
            let Some(ui) = ui_weak.upgrade() else {
                return;
            };
            // Number fields commit on Enter; pick up anything typed without it
            let increment = ui.get_increment_field();
            let limit = ui.get_limit_field();
            Self::with_binder(&b, |b| {
                b.commit_increment(&increment);
                b.commit_limit(&limit);
                b.close_settings();
            });
            Self::sync_panel(&ui_weak, &b);
        });

        let b = Rc::clone(binder);
        ui.on_toggle_sound(move || {
            Self::with_binder(&b, |b| b.toggle_sound());
        });

        let b = Rc::clone(binder);
        ui.on_share(move || {
            Self::with_binder(&b, |b| b.share());
        });

        let b = Rc::clone(binder);
        ui.on_about(move || {
            tracing::debug!("Showing about dialog");
            Self::with_binder(&b, |b| b.about());
        });

        let b = Rc::clone(binder);
        ui.on_background_edited(move |text| {
            Self::with_binder(&b, |b| b.edit_background_color(&text));
        });

        let b = Rc::clone(binder);
        ui.on_text_color_edited(move |text| {
            Self::with_binder(&b, |b| b.edit_text_color(&text));
        });

        let b = Rc::clone(binder);
        ui.on_increment_committed(move |text| {
            Self::with_binder(&b, |b| b.commit_increment(&text));
        });

        let b = Rc::clone(binder);
        ui.on_limit_committed(move |text| {
            Self::with_binder(&b, |b| b.commit_limit(&text));
        });

        let b = Rc::clone(binder);
        ui.on_vibration_changed(move |enabled| {
            Self::with_binder(&b, |b| b.set_vibration(enabled));
        });

        let b = Rc::clone(binder);
        let ui_weak = ui.as_weak();
        ui.on_apply_set_value(move |text| {
            let applied = Self::with_binder(&b, |b| b.apply_set_value(&text));
            if applied == Some(true) {
                if let Some(ui) = ui_weak.upgrade() {
                    ui.set_set_value_field("".into());
                }
            }
            Self::sync_panel(&ui_weak, &b);
        });

        let b = Rc::clone(binder);
        let ui_weak = ui.as_weak();
        ui.on_reset_requested(move || {
            Self::with_binder(&b, |b| b.reset());
            Self::sync_panel(&ui_weak, &b);
        });

        // Final save on close; every change is already persisted, this only
        // reports a store that went away mid-session
        let state = state_manager.clone();
        ui.window().on_close_requested(move || {
            tracing::info!("Close requested - saving counter");
            if let Err(e) = state.save() {
                tracing::error!("Final save failed: {}", e);
            }
            slint::CloseRequestResponse::HideWindow
        });

        tracing::debug!("UI callbacks configured");
    }

    /// Subscribe to state changes and update the UI through the bridge
    ///
    /// The thread ends when the last StateManager is dropped.
    fn setup_state_subscription(bridge: &UiBridge<MainWindow>, state_manager: &StateManager) {
        let bridge = bridge.clone();
        let reader = state_manager.reader();
        let mut rx = state_manager.subscribe();

        let spawned = std::thread::Builder::new()
            .name("state-listener".to_string())
            .spawn(move || {
                tracing::debug!("State subscription thread started");

                loop {
                    match rx.blocking_recv() {
                        Ok(StateChange::CountChanged { count }) => {
                            bridge.update_ui(move |ui| ui.set_count_text(count.to_string().into()));
                        }
                        Ok(StateChange::SettingsChanged { settings }) => {
                            bridge.update_ui(move |ui| Self::render_settings(ui, &settings));
                        }
                        Ok(StateChange::Loaded { count, settings }) => {
                            bridge.update_ui(move |ui| {
                                ui.set_count_text(count.to_string().into());
                                Self::render_settings(ui, &settings);
                            });
                        }
                        Ok(StateChange::LimitReached { count, limit }) => {
                            tracing::trace!("Limit {} reached at {}", limit, count);
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!("State listener lagged by {} events, resyncing", skipped);
                            let session = reader.snapshot();
                            bridge.update_ui(move |ui| {
                                ui.set_count_text(session.count().to_string().into());
                                Self::render_settings(ui, &session.settings);
                            });
                        }
                        Err(RecvError::Closed) => break,
                    }
                }

                tracing::debug!("State subscription thread terminated");
            });

        if let Err(e) = spawned {
            tracing::error!("Failed to start state listener: {}", e);
        }
    }
}

fn to_slint_color(rgb: Rgb) -> slint::Color {
    slint::Color::from_rgb_u8(rgb.red, rgb.green, rgb.blue)
}
