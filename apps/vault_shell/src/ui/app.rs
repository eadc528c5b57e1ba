use std::io::Write;

use crossbeam_channel::{select, Receiver, Sender};
use tracing::{debug, info};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{UiEvent, UserAction},
    orchestration::dispatch_backend_commands,
    reducer::{apply_action, apply_event},
    state::AppState,
};
use crate::ui::console::{self, ConsoleInput};

pub struct ShellApp<W: Write> {
    state: AppState,
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    input_rx: Receiver<ConsoleInput>,
    out: W,
}

impl<W: Write> ShellApp<W> {
    pub fn new(
        state: AppState,
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        input_rx: Receiver<ConsoleInput>,
        out: W,
    ) -> Self {
        Self {
            state,
            cmd_tx,
            ui_rx,
            input_rx,
            out,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Runs until the user quits or the input source closes.
    pub fn run(&mut self) -> anyhow::Result<()> {
        self.render()?;
        loop {
            select! {
                recv(self.input_rx) -> input => {
                    let Ok(input) = input else { break };
                    if !self.handle_input(input)? {
                        break;
                    }
                }
                recv(self.ui_rx) -> event => {
                    let Ok(event) = event else {
                        info!("backend event channel closed");
                        break;
                    };
                    self.handle_event(event);
                    self.process_ui_events();
                    self.render()?;
                }
            }
        }
        info!("console shell exiting");
        Ok(())
    }

    /// Returns false once the user asked to quit.
    pub fn handle_input(&mut self, input: ConsoleInput) -> anyhow::Result<bool> {
        match input {
            ConsoleInput::Quit => return Ok(false),
            ConsoleInput::Empty => {}
            ConsoleInput::Help => writeln!(self.out, "{}", console::HELP)?,
            ConsoleInput::Invalid(message) => writeln!(self.out, "{message}")?,
            ConsoleInput::Actions(actions) => {
                for action in actions {
                    self.handle_action(action);
                }
            }
        }
        self.render()?;
        Ok(true)
    }

    pub fn handle_action(&mut self, action: UserAction) {
        let commands = apply_action(&mut self.state, action);
        self.dispatch(commands);
    }

    pub fn handle_event(&mut self, event: UiEvent) {
        debug!(event = event.name(), "applying backend event");
        let commands = apply_event(&mut self.state, event);
        self.dispatch(commands);
    }

    /// Drains whatever else the backend has already produced.
    pub fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            self.handle_event(event);
        }
    }

    // Commands that could not be queued come back as failure completions,
    // which may produce further commands of their own.
    fn dispatch(&mut self, commands: Vec<BackendCommand>) {
        let mut pending = dispatch_backend_commands(&self.cmd_tx, commands);
        while let Some(event) = pending.pop() {
            let commands = apply_event(&mut self.state, event);
            pending.extend(dispatch_backend_commands(&self.cmd_tx, commands));
        }
    }

    fn render(&mut self) -> anyhow::Result<()> {
        write!(self.out, "\n{}", console::render(&self.state))?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use shared::domain::TransferRole;
    use std::path::PathBuf;

    use crate::controller::{reducer::CONNECTION_FAILED, state::Page};

    type TestShell = ShellApp<Vec<u8>>;

    fn shell(capacity: usize) -> (TestShell, Receiver<BackendCommand>, Sender<UiEvent>) {
        let (cmd_tx, cmd_rx) = bounded(capacity);
        let (ui_tx, ui_rx) = bounded(16);
        let (_input_tx, input_rx) = bounded(1);
        let app = ShellApp::new(AppState::default(), cmd_tx, ui_rx, input_rx, Vec::new());
        (app, cmd_rx, ui_tx)
    }

    fn login_action() -> UserAction {
        UserAction::SubmitLogin {
            username: "alice".to_string(),
            password: "pw".to_string(),
        }
    }

    #[test]
    fn login_is_queued_and_completion_opens_dashboard() {
        let (mut app, cmd_rx, ui_tx) = shell(8);
        app.handle_action(login_action());

        let BackendCommand::Login { request, .. } = cmd_rx.try_recv().expect("login queued")
        else {
            panic!("expected login command");
        };
        ui_tx
            .send(UiEvent::LoginCompleted {
                request,
                result: Ok("alice".to_string()),
            })
            .expect("send completion");
        app.process_ui_events();

        assert_eq!(app.state().session.page(), Page::Dashboard);
        assert!(matches!(
            cmd_rx.try_recv(),
            Ok(BackendCommand::FetchFiles { username, .. }) if username == "alice"
        ));
    }

    #[test]
    fn disconnected_backend_fails_login_instead_of_hanging() {
        let (mut app, cmd_rx, _ui_tx) = shell(8);
        drop(cmd_rx);

        app.handle_action(login_action());

        assert!(!app.state().login_form.is_loading());
        assert_eq!(
            app.state().login_form.error.as_deref(),
            Some(CONNECTION_FAILED)
        );
    }

    #[test]
    fn full_queue_releases_transfer_slot() {
        let (mut app, cmd_rx, ui_tx) = shell(1);
        app.handle_action(login_action());
        let Ok(BackendCommand::Login { request, .. }) = cmd_rx.try_recv() else {
            panic!("expected login command");
        };
        ui_tx
            .send(UiEvent::LoginCompleted {
                request,
                result: Ok("alice".to_string()),
            })
            .expect("send completion");
        app.process_ui_events();
        // The files refresh occupies the only slot in the queue.
        app.handle_action(UserAction::StageFile {
            role: TransferRole::Encrypt,
            path: PathBuf::from("/tmp/report.pdf"),
        });
        app.handle_action(UserAction::TriggerTransfer {
            role: TransferRole::Encrypt,
        });

        assert!(app.state().encrypt.in_flight.is_none());
        assert!(app.state().encrypt.staged.is_some());
        assert!(app.state().notifications.current().is_some());
    }

    #[test]
    fn help_and_invalid_input_are_written_out() {
        let (mut app, _cmd_rx, _ui_tx) = shell(8);
        assert!(app.handle_input(ConsoleInput::Help).expect("help"));
        assert!(app
            .handle_input(ConsoleInput::Invalid("usage: goto home".to_string()))
            .expect("invalid"));
        assert!(!app.handle_input(ConsoleInput::Quit).expect("quit"));

        let written = String::from_utf8(app.out.clone()).expect("utf8");
        assert!(written.contains("Commands:"));
        assert!(written.contains("usage: goto home"));
        assert!(written.contains("Sign in"));
    }
}
