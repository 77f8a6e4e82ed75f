use shared::domain::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

// `ListUpdated` fires after every committed fetch so views re-render
// from a fresh snapshot.
#[derive(Debug, Clone)]
pub enum UiEvent {
    Notice { level: NoticeLevel, text: String },
    ListUpdated { entity: EntityKind },
}
