use crate::LimitContext;
use garde::Validate;
use hibari_type::{Category, Notification};
use typed_builder::TypedBuilder;

/// Filtered read over the merged feed
#[derive(Clone, TypedBuilder, Validate)]
#[garde(context(LimitContext as ctx))]
pub struct GetNotifications {
    /// Included notification categories
    #[builder(default)]
    #[garde(skip)]
    pub included_categories: Vec<Category>,

    /// Excluded notification categories
    #[builder(default)]
    #[garde(skip)]
    pub excluded_categories: Vec<Category>,

    /// Only return notifications that have not been read yet
    #[builder(default)]
    #[garde(skip)]
    pub unread_only: bool,

    /// Limit of returned notifications
    #[garde(range(max = ctx.limit))]
    pub limit: usize,
}

impl GetNotifications {
    pub(crate) fn matches(&self, notification: &Notification) -> bool {
        let category = notification.payload.category();

        if self.excluded_categories.contains(&category) {
            return false;
        }
        if !self.included_categories.is_empty() && !self.included_categories.contains(&category) {
            return false;
        }
        if self.unread_only && notification.status.is_read() {
            return false;
        }

        true
    }
}
