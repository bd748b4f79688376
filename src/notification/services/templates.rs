//! Notification text rendered from `minijinja` templates.

use crate::notification::domain::{NotificationKind, NotificationPayload};
use minijinja::{Environment, Value, context};
use thiserror::Error;

/// Who a rendered payload is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// The people the event is about or who must act on it.
    Primary,
    /// Admins kept informed about someone else's approval.
    Observer,
}

/// Values available to every template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateContext<'a> {
    /// Task title.
    pub task_title: &'a str,
    /// Display name of the user who acted, when relevant.
    pub actor_name: Option<&'a str>,
    /// Assignee the event concerns, when relevant.
    pub assignee: Option<&'a str>,
    /// Due-soon window in hours.
    pub window_hours: i64,
}

impl<'a> TemplateContext<'a> {
    /// Creates a context for `task_title` with no actor or assignee.
    #[must_use]
    pub const fn new(task_title: &'a str) -> Self {
        Self {
            task_title,
            actor_name: None,
            assignee: None,
            window_hours: 24,
        }
    }

    /// Sets the acting user's display name.
    #[must_use]
    pub const fn with_actor_name(mut self, actor_name: &'a str) -> Self {
        self.actor_name = Some(actor_name);
        self
    }

    /// Sets the assignee.
    #[must_use]
    pub const fn with_assignee(mut self, assignee: &'a str) -> Self {
        self.assignee = Some(assignee);
        self
    }

    /// Sets the due-soon window.
    #[must_use]
    pub const fn with_window_hours(mut self, window_hours: i64) -> Self {
        self.window_hours = window_hours;
        self
    }

    fn to_value(self) -> Value {
        context! {
            task_title => self.task_title,
            actor_name => self.actor_name,
            assignee => self.assignee,
            window_hours => self.window_hours,
        }
    }
}

/// Error raised when a template fails to render.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to render {kind} template: {reason}")]
pub struct TemplateError {
    /// Notification category being rendered.
    pub kind: NotificationKind,
    /// Renderer message.
    pub reason: String,
}

struct MessageTemplate {
    title: &'static str,
    body: &'static str,
}

const TASK_CREATED: MessageTemplate = MessageTemplate {
    title: "New task assigned",
    body: "You have been assigned: {{ task_title }}",
};

const TASK_REQUEST_DONE: MessageTemplate = MessageTemplate {
    title: "Completion requested",
    body: "{{ actor_name }} requested completion of: {{ task_title }}",
};

const TASK_APPROVED: MessageTemplate = MessageTemplate {
    title: "Task APPROVED",
    body: "Your task \"{{ task_title }}\" was approved by a manager.",
};

const TASK_APPROVED_OBSERVER: MessageTemplate = MessageTemplate {
    title: "Task approved",
    body: "Task \"{{ task_title }}\" of {{ assignee }} was approved.",
};

const TASK_REJECTED: MessageTemplate = MessageTemplate {
    title: "Task REJECTED",
    body: "Your completion request for \"{{ task_title }}\" was rejected.",
};

const TASK_DUE_SOON: MessageTemplate = MessageTemplate {
    title: "Due soon",
    body: "Task \"{{ task_title }}\" is due in less than {{ window_hours }} hours.",
};

const fn template_for(kind: NotificationKind, audience: Audience) -> &'static MessageTemplate {
    match (kind, audience) {
        (NotificationKind::TaskCreated, _) => &TASK_CREATED,
        (NotificationKind::TaskRequestDone, _) => &TASK_REQUEST_DONE,
        (NotificationKind::TaskApproved, Audience::Primary) => &TASK_APPROVED,
        (NotificationKind::TaskApproved, Audience::Observer) => &TASK_APPROVED_OBSERVER,
        (NotificationKind::TaskRejected, _) => &TASK_REJECTED,
        (NotificationKind::TaskDueSoon, _) => &TASK_DUE_SOON,
    }
}

/// Renders the payload for `kind` addressed to `audience`.
///
/// # Errors
///
/// Returns [`TemplateError`] when rendering fails.
pub fn render_payload(
    kind: NotificationKind,
    audience: Audience,
    context: TemplateContext<'_>,
) -> Result<NotificationPayload, TemplateError> {
    let template = template_for(kind, audience);
    let environment = Environment::new();
    let values = context.to_value();
    let render = |source: &str| {
        environment
            .render_str(source, &values)
            .map_err(|error| TemplateError {
                kind,
                reason: error.to_string(),
            })
    };
    Ok(NotificationPayload::new(
        kind,
        render(template.title)?,
        render(template.body)?,
    ))
}
