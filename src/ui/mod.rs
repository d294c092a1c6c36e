// UI module - presentation logic and Slint wiring
//
// This module contains:
// - PresentationBinder: Toolkit-independent event handling for the counter screen
// - UiBridge: Delivers UI updates from background threads to the Slint event loop
// - GuiController: Main controller that wires up the Slint window with the binder

pub mod binder;
pub mod bridge;
pub mod controller;

pub use binder::{Feedback, PanelState, PresentationBinder, TapOutcome, ViewModel};
pub use bridge::UiBridge;
pub use controller::GuiController;
