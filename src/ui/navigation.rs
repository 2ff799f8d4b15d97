use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The two screens. The picture id is the only thing passed between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Details { picture_id: i64 },
}

impl Route {
    pub const HOME: &'static str = "home";
    pub const DETAILS: &'static str = "details";
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => f.write_str(Route::HOME),
            Route::Details { picture_id } => write!(f, "{}/{}", Route::DETAILS, picture_id),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("unknown route: {0}")]
    Unknown(String),
    #[error("invalid picture id in route: {0}")]
    InvalidId(String),
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            None if s == Route::HOME => Ok(Route::Home),
            Some((Route::DETAILS, id)) => id
                .parse()
                .map(|picture_id| Route::Details { picture_id })
                .map_err(|_| RouteError::InvalidId(id.to_string())),
            _ => Err(RouteError::Unknown(s.to_string())),
        }
    }
}

/// Back stack rooted at the list screen: one push to a detail screen, one pop back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    stack: Vec<Route>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self {
            stack: vec![Route::Home],
        }
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Route {
        self.stack.last().copied().unwrap_or(Route::Home)
    }

    /// Push the detail screen. Only allowed from the list screen.
    pub fn navigate_to_details(&mut self, picture_id: i64) -> bool {
        if self.current() != Route::Home {
            return false;
        }
        self.stack.push(Route::Details { picture_id });
        true
    }

    /// Pop back to the list screen. Returns false at the root.
    pub fn navigate_back(&mut self) -> bool {
        if self.stack.len() <= 1 {
            return false;
        }
        self.stack.pop();
        true
    }
}
