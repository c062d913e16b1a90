//! Per-session conversation state: registration, page, and history.

use serde::Serialize;
use tracing::{debug, info};
use vendai_core::{ConversationTurn, Page, UserInfo};

/// Flash shown once on the chat page after registering.
pub const REGISTRATION_SUCCESS: &str = "Registration successful!";

/// Warning when the chat page is requested before registering.
pub const REGISTER_FIRST_WARNING: &str = "Please register first!";

/// Outcome of a page change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub page: Page,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
}

/// One user's session. Owned by the caller; nothing here is global.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    current_page: Page,
    user_info: Option<UserInfo>,
    messages: Vec<ConversationTurn>,
    show_success: bool,
}

/// Serializable snapshot of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub current_page: Page,
    pub user_info: Option<UserInfo>,
    /// "Welcome {name}!" once registered.
    pub greeting: Option<String>,
    pub notice: Option<&'static str>,
    pub messages: Vec<ConversationTurn>,
}

impl Conversation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn current_page(&self) -> Page {
        self.current_page
    }

    #[must_use]
    pub const fn user_info(&self) -> Option<&UserInfo> {
        self.user_info.as_ref()
    }

    #[must_use]
    pub fn user_name(&self) -> Option<&str> {
        self.user_info.as_ref().map(|u| u.name.as_str())
    }

    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.user_info.is_some()
    }

    #[must_use]
    pub fn messages(&self) -> &[ConversationTurn] {
        &self.messages
    }

    /// Store registration details and move to the chat page. Registering
    /// again replaces the details and keeps the history.
    pub fn register(&mut self, user: UserInfo) {
        info!(age = user.age, "User registered");
        self.user_info = Some(user);
        self.current_page = Page::Chat;
        self.show_success = true;
    }

    /// Switch pages. The chat page needs a registration; without one the
    /// session stays on (or returns to) the register page with a warning.
    pub fn navigate(&mut self, page: Page) -> Navigation {
        if page == Page::Chat && !self.is_registered() {
            debug!("Chat requested before registration");
            self.current_page = Page::Register;
            return Navigation {
                page: Page::Register,
                warning: Some(REGISTER_FIRST_WARNING),
            };
        }
        self.current_page = page;
        Navigation {
            page,
            warning: None,
        }
    }

    /// Append one completed interaction: the user's message and exactly one
    /// assistant reply.
    pub fn record_exchange(&mut self, user_message: &str, reply: impl Into<String>) {
        self.messages.push(ConversationTurn::user(user_message));
        self.messages.push(ConversationTurn::assistant(reply));
    }

    /// Snapshot for rendering that consumes the registration flash. The
    /// flash is shown once, on the chat page.
    pub fn view(&mut self) -> SessionView {
        let view = self.snapshot();
        if view.notice.is_some() {
            self.show_success = false;
        }
        view
    }

    /// Snapshot for rendering that leaves a pending flash in place.
    #[must_use]
    pub fn snapshot(&self) -> SessionView {
        let notice = (self.current_page == Page::Chat && self.show_success)
            .then_some(REGISTRATION_SUCCESS);

        SessionView {
            current_page: self.current_page,
            user_info: self.user_info.clone(),
            greeting: self.user_info.as_ref().map(UserInfo::greeting),
            notice,
            messages: self.messages.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use vendai_core::ChatRole;

    use super::*;

    fn ada() -> UserInfo {
        UserInfo::new("Ada", "ada@vendease.com", 36).expect("valid user")
    }

    #[test]
    fn test_new_session_starts_on_register() {
        let conversation = Conversation::new();
        assert_eq!(conversation.current_page(), Page::Register);
        assert!(!conversation.is_registered());
        assert!(conversation.messages().is_empty());
    }

    #[test]
    fn test_chat_requires_registration() {
        let mut conversation = Conversation::new();
        let nav = conversation.navigate(Page::Chat);
        assert_eq!(nav.page, Page::Register);
        assert_eq!(nav.warning, Some(REGISTER_FIRST_WARNING));
        assert_eq!(conversation.current_page(), Page::Register);
    }

    #[test]
    fn test_register_moves_to_chat_with_flash_once() {
        let mut conversation = Conversation::new();
        conversation.register(ada());
        assert_eq!(conversation.current_page(), Page::Chat);

        let first = conversation.view();
        assert_eq!(first.notice, Some(REGISTRATION_SUCCESS));
        assert_eq!(first.greeting.as_deref(), Some("Welcome Ada!"));

        assert_eq!(conversation.view().notice, None);
    }

    #[test]
    fn test_snapshot_keeps_flash_pending() {
        let mut conversation = Conversation::new();
        conversation.register(ada());

        assert_eq!(conversation.snapshot().notice, Some(REGISTRATION_SUCCESS));
        assert_eq!(conversation.snapshot().notice, Some(REGISTRATION_SUCCESS));
        assert_eq!(conversation.view().notice, Some(REGISTRATION_SUCCESS));
        assert_eq!(conversation.snapshot().notice, None);
    }

    #[test]
    fn test_navigation_after_registration() {
        let mut conversation = Conversation::new();
        conversation.register(ada());
        assert_eq!(conversation.navigate(Page::Register).page, Page::Register);
        let nav = conversation.navigate(Page::Chat);
        assert_eq!(nav.page, Page::Chat);
        assert!(nav.warning.is_none());
    }

    #[test]
    fn test_record_exchange_appends_pair() {
        let mut conversation = Conversation::new();
        conversation.record_exchange("hi", "Hello Ada!");
        conversation.record_exchange("bye", "Goodbye!");

        let roles: Vec<ChatRole> = conversation.messages().iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![ChatRole::User, ChatRole::Assistant, ChatRole::User, ChatRole::Assistant]
        );
        assert_eq!(conversation.messages()[3].content, "Goodbye!");
    }

    #[test]
    fn test_reregister_keeps_history() {
        let mut conversation = Conversation::new();
        conversation.register(ada());
        conversation.record_exchange("hi", "hello");
        conversation.register(UserInfo::new("Grace", "grace@vendease.com", 40).expect("valid"));
        assert_eq!(conversation.user_name(), Some("Grace"));
        assert_eq!(conversation.messages().len(), 2);
    }
}
