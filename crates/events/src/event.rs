use chrono::{DateTime, Utc};

/// A notification published after a committed console change.
///
/// Subscribers only ever see changes that are already persisted, so an event
/// is never retracted.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted name, e.g. `console.user.created`.
    fn event_type(&self) -> &'static str;

    /// Payload shape version; bump when fields change.
    fn version(&self) -> u32;

    /// Time of the change the event reports.
    fn occurred_at(&self) -> DateTime<Utc>;
}
