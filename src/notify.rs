use std::io::{self, Write};
use strum_macros::Display;

/// Events the engine reports to whatever plays sounds or flashes the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Notification {
    Start,
    End,
    KeypressError,
}

pub trait Notifier {
    fn notify(&self, notification: Notification);
}

impl<F> Notifier for F
where
    F: Fn(Notification),
{
    fn notify(&self, notification: Notification) {
        (self)(notification)
    }
}

/// Forwards notifications to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        tracing::debug!(%notification, "notification");
    }
}

/// Rings the terminal bell on mistyped keys
#[derive(Debug, Clone, Copy, Default)]
pub struct BellNotifier;

impl Notifier for BellNotifier {
    fn notify(&self, notification: Notification) {
        if notification == Notification::KeypressError {
            let mut out = io::stdout();
            let _ = out.write_all(b"\x07").and_then(|_| out.flush());
        }
        LogNotifier.notify(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn closures_are_notifiers() {
        let seen = RefCell::new(Vec::new());
        let notifier = |n: Notification| seen.borrow_mut().push(n);
        notifier.notify(Notification::Start);
        notifier.notify(Notification::KeypressError);

        assert_eq!(*seen.borrow(), vec![Notification::Start, Notification::KeypressError]);
    }

    #[test]
    fn names_are_kebab_case() {
        assert_eq!(Notification::KeypressError.to_string(), "keypress-error");
        assert_eq!(Notification::End.to_string(), "end");
    }
}
