//! Dashboard panel selection and the mobile navigation drawer.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashboardView {
    #[default]
    Home,
    Encrypt,
    Decrypt,
}

impl DashboardView {
    pub const ALL: [DashboardView; 3] = [Self::Home, Self::Encrypt, Self::Decrypt];

    pub fn label(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Encrypt => "Encrypt File",
            Self::Decrypt => "Decrypt File",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "home" => Some(Self::Home),
            "encrypt" => Some(Self::Encrypt),
            "decrypt" => Some(Self::Decrypt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewState {
    pub current: DashboardView,
    pub mobile_menu_open: bool,
}

impl ViewState {
    pub fn navigate(&mut self, view: DashboardView) {
        self.current = view;
    }

    /// Picking an entry from the mobile drawer also closes it.
    pub fn navigate_from_menu(&mut self, view: DashboardView) {
        self.current = view;
        self.mobile_menu_open = false;
    }

    pub fn open_menu(&mut self) {
        self.mobile_menu_open = true;
    }

    pub fn close_menu(&mut self) {
        self.mobile_menu_open = false;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
