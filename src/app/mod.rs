//! Application state types and entry glue.
//!
//! [`AppState`] owns the directory engine, the detail-view state and the
//! session for the lifetime of the terminal UI, and carries the small amount
//! of view state (route, selection, dialog) around them.
//!
pub mod keymap;
pub mod theme;
pub mod update;

use crate::auth::AuthSession;
use crate::config::Settings;
use crate::detail::UserDetail;
use crate::directory::DirectoryState;
use crate::model::User;
use crate::store::KeyValueStore;

pub use keymap::Keymap;
pub use theme::Theme;

pub type SessionStore = Box<dyn KeyValueStore + Send>;

/// Which of the two views is shown.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Route {
    /// The listing, `/`.
    Users,
    /// The detail view, `/user/:id`.
    UserProfile(u64),
}

impl Route {
    pub fn path(self) -> String {
        match self {
            Route::Users => "/".to_string(),
            Route::UserProfile(id) => format!("/user/{id}"),
        }
    }
}

/// Current input mode for key handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Modal,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
}

/// Dialogs drawn over the current view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModalState {
    Login {
        field: LoginField,
        email: String,
        password: String,
        error: Option<String>,
    },
    CityFilter {
        selected: usize,
    },
    CompanyFilter {
        selected: usize,
    },
    SortMenu {
        selected: usize,
    },
    DeleteConfirm {
        selected: usize,
        id: u64,
    },
    Info {
        message: String,
    },
}

impl ModalState {
    pub fn login() -> Self {
        ModalState::Login { field: LoginField::Email, email: String::new(), password: String::new(), error: None }
    }
}

pub struct AppState {
    pub settings: Settings,
    pub theme: Theme,
    pub keymap: Keymap,
    pub directory: DirectoryState,
    pub detail: UserDetail,
    pub auth: AuthSession<SessionStore>,
    pub route: Route,
    pub input_mode: InputMode,
    pub selected_index: usize,
    pub rows_per_page: usize,
    pub modal: Option<ModalState>,
    pub status: Option<String>,
}

impl AppState {
    /// Build the state and restore a stored session. Without one the login
    /// dialog is opened, since the views are only reachable when signed in.
    pub fn new(settings: Settings, store: SessionStore, theme: Theme, keymap: Keymap) -> Self {
        let directory = DirectoryState::new(settings.page_size).with_load_more_delay(settings.load_more_delay);
        let mut auth = AuthSession::new(store);
        auth.initialize();
        let (modal, input_mode) = if auth.is_authenticated() {
            (None, InputMode::Normal)
        } else {
            (Some(ModalState::login()), InputMode::Modal)
        };
        Self {
            settings,
            theme,
            keymap,
            directory,
            detail: UserDetail::new(),
            auth,
            route: Route::Users,
            input_mode,
            selected_index: 0,
            rows_per_page: 10,
            modal,
            status: None,
        }
    }

    /// The user under the cursor in the listing.
    pub fn selected_user(&self) -> Option<&User> {
        self.directory.view().users.get(self.selected_index).copied()
    }

    /// Keep the cursor inside the displayed slice.
    pub fn clamp_selection(&mut self) {
        let len = self.directory.view().users.len();
        self.selected_index = self.selected_index.min(len.saturating_sub(1));
    }

    pub fn open_modal(&mut self, modal: ModalState) {
        self.modal = Some(modal);
        self.input_mode = InputMode::Modal;
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
        self.input_mode = InputMode::Normal;
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;
