use hibari_config::toast;
use hibari_prefs::ToastPreferences;
use hibari_type::{Notification, NotificationId};
use std::time::Duration;
use tokio::time::Instant;

/// Lifecycle of a single toast
///
/// `Entering` on creation, `Visible` after the entry delay, `Exiting` once
/// dismissed (manually or by timer). The exit animation window is fixed;
/// when it elapses the toast leaves the backing list.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ToastStage {
    Entering,
    Visible,
    Exiting,
}

#[derive(Clone, Debug)]
pub struct Toast {
    pub notification: Notification,
    pub stage: ToastStage,
    stage_ends_at: Instant,
}

impl Toast {
    #[must_use]
    pub fn is_alive(&self) -> bool {
        matches!(self.stage, ToastStage::Entering | ToastStage::Visible)
    }
}

/// Bounded queue of transient toasts
///
/// All transitions are deadline-driven and synchronous; the owning driver
/// sleeps until [`ToastQueue::next_deadline`] and calls
/// [`ToastQueue::advance`]. That keeps the state machine testable under a
/// paused clock.
pub struct ToastQueue {
    toasts: Vec<Toast>,
    entry_delay: Duration,
    duration: Duration,
    exit_animation: Duration,
    max_visible: usize,
}

impl ToastQueue {
    #[must_use]
    pub fn new(config: &toast::Configuration) -> Self {
        Self {
            toasts: Vec::new(),
            entry_delay: Duration::from_millis(config.entry_delay_ms),
            duration: Duration::from_millis(config.duration_ms),
            exit_animation: Duration::from_millis(config.exit_animation_ms),
            max_visible: config.max_visible,
        }
    }

    /// Override duration and cap with the user's display preferences
    pub fn apply_preferences(&mut self, preferences: &ToastPreferences) {
        self.duration = Duration::from_millis(preferences.duration_ms);
        self.max_visible = preferences.max_visible;
    }

    #[must_use]
    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.toasts.iter().filter(|toast| toast.is_alive()).count()
    }

    /// Enqueue a toast and schedule its auto-dismiss
    ///
    /// Beyond the visible cap the oldest alive toast is dismissed first.
    pub fn show(&mut self, notification: Notification, now: Instant) {
        self.toasts.push(Toast {
            notification,
            stage: ToastStage::Entering,
            stage_ends_at: now + self.entry_delay,
        });

        while self.alive_count() > self.max_visible {
            let Some(oldest) = self.toasts.iter_mut().find(|toast| toast.is_alive()) else {
                break;
            };
            oldest.stage = ToastStage::Exiting;
            oldest.stage_ends_at = now + self.exit_animation;
        }
    }

    /// Begin dismissing a specific toast
    pub fn hide(&mut self, id: &NotificationId, now: Instant) {
        if let Some(toast) = self
            .toasts
            .iter_mut()
            .find(|toast| toast.is_alive() && toast.notification.id == *id)
        {
            toast.stage = ToastStage::Exiting;
            toast.stage_ends_at = now + self.exit_animation;
        }
    }

    /// Begin dismissing every toast
    pub fn clear(&mut self, now: Instant) {
        for toast in self.toasts.iter_mut().filter(|toast| toast.is_alive()) {
            toast.stage = ToastStage::Exiting;
            toast.stage_ends_at = now + self.exit_animation;
        }
    }

    /// Earliest pending deadline, if any toast still has one
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.toasts.iter().map(|toast| toast.stage_ends_at).min()
    }

    /// Run every transition whose deadline has passed
    ///
    /// Toasts whose exit animation finished are removed from the backing
    /// list.
    pub fn advance(&mut self, now: Instant) {
        for toast in &mut self.toasts {
            if toast.stage == ToastStage::Entering && now >= toast.stage_ends_at {
                toast.stage = ToastStage::Visible;
                toast.stage_ends_at += self.duration;
            }
            if toast.stage == ToastStage::Visible && now >= toast.stage_ends_at {
                toast.stage = ToastStage::Exiting;
                toast.stage_ends_at = now + self.exit_animation;
            }
        }

        self.toasts
            .retain(|toast| !(toast.stage == ToastStage::Exiting && now >= toast.stage_ends_at));
    }
}

#[cfg(test)]
mod test {
    use super::{ToastQueue, ToastStage};
    use hibari_config::toast;
    use hibari_type::Notification;
    use std::time::Duration;
    use tokio::time::Instant;

    fn config() -> toast::Configuration {
        toast::Configuration {
            duration_ms: 5000,
            entry_delay_ms: 50,
            exit_animation_ms: 200,
            max_visible: 5,
        }
    }

    fn notification(id: &str) -> Notification {
        Notification::builder()
            .id(id)
            .user_id("user-1")
            .title(id)
            .build()
    }

    #[tokio::test(start_paused = true)]
    async fn lifecycle_follows_the_deadlines() {
        let mut queue = ToastQueue::new(&config());
        let start = Instant::now();

        queue.show(notification("n1"), start);
        assert_eq!(queue.toasts()[0].stage, ToastStage::Entering);

        // Entry delay elapses
        queue.advance(start + Duration::from_millis(50));
        assert_eq!(queue.toasts()[0].stage, ToastStage::Visible);

        // Still visible right before the dismiss deadline
        queue.advance(start + Duration::from_millis(5049));
        assert_eq!(queue.toasts()[0].stage, ToastStage::Visible);

        // Auto-dismiss kicks in, exit animation runs
        queue.advance(start + Duration::from_millis(5050));
        assert_eq!(queue.toasts()[0].stage, ToastStage::Exiting);

        // Gone only after the animation window
        queue.advance(start + Duration::from_millis(5250));
        assert!(queue.toasts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cap_dismisses_the_oldest_first() {
        let mut queue = ToastQueue::new(&config());
        let now = Instant::now();

        for i in 0..6 {
            queue.show(notification(&format!("n{i}")), now);
        }

        assert_eq!(queue.alive_count(), 5);
        let exiting: Vec<_> = queue
            .toasts()
            .iter()
            .filter(|toast| toast.stage == ToastStage::Exiting)
            .map(|toast| toast.notification.id.as_str().to_owned())
            .collect();
        assert_eq!(exiting, ["n0"]);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_hide_and_clear() {
        let mut queue = ToastQueue::new(&config());
        let now = Instant::now();

        queue.show(notification("n1"), now);
        queue.show(notification("n2"), now);

        queue.hide(&"n1".into(), now);
        assert_eq!(queue.alive_count(), 1);

        queue.clear(now);
        assert_eq!(queue.alive_count(), 0);

        queue.advance(now + Duration::from_millis(200));
        assert!(queue.toasts().is_empty());
    }
}
