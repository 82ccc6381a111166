//! UI collaborator hooks
//!
//! The display and menu system live outside the weld core. The core only
//! nudges them through this small set of named operations; everything else
//! is pulled by the UI through the query methods on [`crate::Welder`].

use crate::safety::Fault;

/// Notifications from the weld core to the UI
pub trait UiHooks {
    /// Ask for the status screen to be redrawn
    fn request_redraw(&mut self);

    /// Drop any pending redraw hint (called when a weld cycle starts)
    fn clear_redraw_hint(&mut self);

    /// Restart the UI inactivity timeout
    fn reset_activity(&mut self) {}

    /// Whether the operator has interacted recently
    ///
    /// While this returns false the trigger system stays locked out.
    fn is_active(&self) -> bool {
        true
    }

    /// Show a persistent fault indication
    fn show_fault(&mut self, fault: Fault);

    /// Remove the fault indication
    fn clear_fault(&mut self);
}
