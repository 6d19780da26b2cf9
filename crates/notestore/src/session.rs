/// Who is using the app. Guests keep notes locally only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Guest,
    Account { user_id: String },
}

impl Session {
    pub fn account(user_id: impl Into<String>) -> Self {
        Session::Account {
            user_id: user_id.into(),
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Session::Guest)
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Session::Account { user_id } => Some(user_id),
            Session::Guest => None,
        }
    }
}
