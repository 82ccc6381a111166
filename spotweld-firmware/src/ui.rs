//! UI bridge
//!
//! There is no display on this board; weld core notifications are logged.

use defmt::*;
use spotweld_core::safety::Fault;
use spotweld_core::traits::UiHooks;

/// UI hooks that report over defmt
#[derive(Default)]
pub struct LogUi {
    redraw_pending: bool,
    fault: Option<Fault>,
}

impl LogUi {
    pub const fn new() -> Self {
        Self {
            redraw_pending: false,
            fault: None,
        }
    }

    /// Take the pending redraw request
    pub fn take_redraw(&mut self) -> bool {
        core::mem::take(&mut self.redraw_pending)
    }

    pub fn fault(&self) -> Option<Fault> {
        self.fault
    }
}

impl UiHooks for LogUi {
    fn request_redraw(&mut self) {
        self.redraw_pending = true;
    }

    fn clear_redraw_hint(&mut self) {
        self.redraw_pending = false;
    }

    fn show_fault(&mut self, fault: Fault) {
        error!("FAULT: {}", fault);
        self.fault = Some(fault);
    }

    fn clear_fault(&mut self) {
        if let Some(fault) = self.fault.take() {
            info!("Fault cleared: {}", fault);
        }
    }
}
