//! Notification and calendar bridges.
//!
//! The platform shell owns reminders and calendar entries; this crate only
//! tells it when to create or drop them.

use crate::error::AppError;
use crate::models::Activity;
use crate::time_utils::format_utc_rfc3339;

/// Reminder scheduling, driven by the sync engine on join/leave/create/delete.
pub trait NotificationBridge: Send + Sync {
    fn schedule_reminders(&self, activity: &Activity);
    fn cancel_reminders(&self, activity: &Activity);
}

/// Calendar entries, driven only by explicit user actions.
pub trait CalendarBridge: Send + Sync {
    fn add_event(&self, activity: &Activity) -> Result<(), AppError>;
    fn remove_event(&self, activity: &Activity) -> Result<(), AppError>;
}

/// Bridge that only logs; used when no platform shell is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingBridge;

impl NotificationBridge for TracingBridge {
    fn schedule_reminders(&self, activity: &Activity) {
        tracing::info!(
            activity_id = %activity.id,
            scheduled_at = %format_utc_rfc3339(activity.scheduled_at),
            "Scheduling reminders"
        );
    }

    fn cancel_reminders(&self, activity: &Activity) {
        tracing::info!(activity_id = %activity.id, "Cancelling reminders");
    }
}

impl CalendarBridge for TracingBridge {
    fn add_event(&self, activity: &Activity) -> Result<(), AppError> {
        tracing::info!(activity_id = %activity.id, title = %activity.title, "Adding calendar event");
        Ok(())
    }

    fn remove_event(&self, activity: &Activity) -> Result<(), AppError> {
        tracing::info!(activity_id = %activity.id, "Removing calendar event");
        Ok(())
    }
}
