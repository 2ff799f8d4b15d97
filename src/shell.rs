//! Composition shell: keeps the navigator and the live screen controllers in
//! step and turns typed commands into controller actions.

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{debug, instrument};

use crate::repository::AppContainer;
use crate::ui::render::{render_details, render_home};
use crate::ui::{
    DetailsController, DetailsState, HomeController, HomeNetworkState, HomeOfflineState,
    Navigator, Route,
};

#[derive(Debug, Parser)]
#[command(no_binary_name = true, name = "my-pictures", disable_version_flag = true)]
struct CommandLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ShellCommand {
    /// Open the detail screen for a picture
    Show { id: i64 },
    /// Save a picture from the network list
    Save { id: i64 },
    /// Remove a saved picture
    Delete { id: i64 },
    /// Reload the current screen
    Retry,
    /// Return to the picture list
    Back,
    /// Go to a screen by route: `home` or `details/<id>`
    Open { route: Route },
    /// Exit
    Quit,
}

pub fn parse_command(line: &str) -> Result<ShellCommand, clap::Error> {
    CommandLine::try_parse_from(line.split_whitespace()).map(|cli| cli.command)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
    Continue,
    Notice(String),
    Quit,
}

struct DetailsScreen {
    controller: DetailsController,
    state: watch::Receiver<DetailsState>,
}

pub struct PicturesApp {
    container: AppContainer,
    navigator: Navigator,
    home: HomeController,
    home_network: watch::Receiver<HomeNetworkState>,
    home_offline: watch::Receiver<HomeOfflineState>,
    details: Option<DetailsScreen>,
}

impl PicturesApp {
    /// Open the list screen. Must be called from within a Tokio runtime.
    pub fn new(container: AppContainer) -> Self {
        let home = HomeController::new(&container);
        let home_network = home.network_state();
        let home_offline = home.offline_state();
        Self {
            container,
            navigator: Navigator::new(),
            home,
            home_network,
            home_offline,
            details: None,
        }
    }

    pub fn route(&self) -> Route {
        self.navigator.current()
    }

    pub fn home(&self) -> &HomeController {
        &self.home
    }

    pub fn details(&self) -> Option<&DetailsController> {
        self.details.as_ref().map(|screen| &screen.controller)
    }

    #[instrument(skip(self))]
    pub fn handle(&mut self, command: ShellCommand) -> Handled {
        match (command, self.navigator.current()) {
            (ShellCommand::Quit, _) => Handled::Quit,
            (ShellCommand::Show { id }, Route::Home) => {
                self.navigator.navigate_to_details(id);
                let controller = DetailsController::new(self.container.network.clone(), id);
                let state = controller.state();
                self.details = Some(DetailsScreen { controller, state });
                debug!(route = %self.navigator.current(), "navigated");
                Handled::Continue
            }
            (ShellCommand::Save { id }, Route::Home) => match self.home.remote_picture(id) {
                Some(picture) => {
                    self.home.save(&picture);
                    Handled::Continue
                }
                None => Handled::Notice(format!("picture {id} is not in the network list")),
            },
            (ShellCommand::Delete { id }, Route::Home) => match self.home.saved_picture(id) {
                Some(picture) => {
                    self.home.delete(&picture);
                    Handled::Continue
                }
                None => Handled::Notice(format!("picture {id} is not saved")),
            },
            (ShellCommand::Retry, Route::Home) => {
                self.home.refresh();
                Handled::Continue
            }
            (ShellCommand::Retry, Route::Details { .. }) => {
                if let Some(screen) = &self.details {
                    screen.controller.retry();
                }
                Handled::Continue
            }
            (ShellCommand::Back, _) => {
                if self.navigator.navigate_back() {
                    // Dropping the controller cancels its pending fetch.
                    self.details = None;
                    debug!(route = %self.navigator.current(), "navigated");
                    Handled::Continue
                } else {
                    Handled::Notice("already at the picture list".into())
                }
            }
            (ShellCommand::Open { route }, current) if route == current => Handled::Continue,
            (ShellCommand::Open { route: Route::Home }, _) => self.handle(ShellCommand::Back),
            (ShellCommand::Open { route: Route::Details { picture_id } }, _) => {
                self.handle(ShellCommand::Show { id: picture_id })
            }
            (command, route) => {
                Handled::Notice(format!("`{command:?}` is not available on {route}"))
            }
        }
    }

    /// Close the app once the pending saves and deletes have reached the store.
    pub async fn shutdown(self) {
        self.home.flush().await;
        debug!("pending writes flushed");
    }

    pub fn render(&self) -> String {
        match (self.navigator.current(), &self.details) {
            (Route::Details { picture_id }, Some(screen)) => {
                render_details(picture_id, &screen.state.borrow())
            }
            _ => render_home(&self.home_network.borrow(), &self.home_offline.borrow()),
        }
    }

    /// Resolve once the current screen's state has changed since the last call.
    pub async fn updated(&mut self) {
        let changed = match (self.navigator.current(), self.details.as_mut()) {
            (Route::Details { .. }, Some(screen)) => screen.state.changed().await,
            _ => tokio::select! {
                res = self.home_network.changed() => res,
                res = self.home_offline.changed() => res,
            },
        };
        if changed.is_err() {
            // The screen's state can no longer change.
            std::future::pending::<()>().await;
        }
    }
}
