use std::time::Duration;

/// User-visible message channel of the host page
pub trait Notifier {
    /// Blocking alert, e.g. a failed upload
    fn alert(&self, message: &str);

    /// Inline validation message next to a form field
    fn validation(&self, message: &str);

    /// Error panel under the live preview (contract violations, load errors)
    fn contract_error(&self, message: &str);

    /// Clear the error panel once a generation starts cleanly
    fn clear_contract_error(&self) {}
}

/// Page navigation
pub trait Navigator {
    /// Show the gallery once `after` has elapsed
    fn navigate_to_gallery(&self, after: Duration);
}

/// Notifier that only logs, for headless hosts
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&self, message: &str) {
        log::warn!("alert: {message}");
    }

    fn validation(&self, message: &str) {
        log::info!("validation: {message}");
    }

    fn contract_error(&self, message: &str) {
        log::error!("{message}");
    }
}
