//! Line-oriented console front end: command parsing, prompts, and screen rendering.

use std::{
    fmt::Write as _,
    io::{self, BufRead},
    path::PathBuf,
    thread,
};

use crossbeam_channel::Sender;
use shared::domain::{FileKind, TransferRole};
use tracing::debug;

use crate::controller::{
    events::UserAction,
    notification::NotificationKind,
    router::DashboardView,
    state::{AppState, FormState, Page, TransferPhase, TransferSlot},
};

pub const HELP: &str = "\
Commands:
  login [user] [password]     sign in (password is prompted when omitted)
  register [user]             create an account (passwords are prompted)
  logout                      sign out and clear the session
  goto home|encrypt|decrypt   switch dashboard panel
  menu open|close             toggle the navigation drawer
  menu goto <view>            pick a panel from the drawer
  stage encrypt|decrypt <path>  choose a local file
  unstage encrypt|decrypt     forget the chosen file
  owner <name>                username that encrypted the file to decrypt
  encrypt | decrypt           send the staged file
  refresh                     reload the file list
  dismiss                     hide the current notification
  help | quit";

pub enum ConsoleInput {
    Actions(Vec<UserAction>),
    Help,
    Quit,
    Invalid(String),
    Empty,
}

/// Parses one input line. `prompt` asks for secrets that were not typed inline;
/// it returns `None` when the terminal cannot be read.
pub fn parse_line(line: &str, prompt: &mut dyn FnMut(&str) -> Option<String>) -> ConsoleInput {
    let line = line.trim();
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command.to_ascii_lowercase().as_str() {
        "" => ConsoleInput::Empty,
        "help" | "?" => ConsoleInput::Help,
        "quit" | "exit" => ConsoleInput::Quit,
        "login" => parse_login(rest, prompt),
        "register" => parse_register(rest, prompt),
        "logout" => single(UserAction::Logout),
        "goto" => match DashboardView::parse(rest) {
            Some(view) => single(UserAction::Navigate(view)),
            None => invalid("usage: goto home|encrypt|decrypt"),
        },
        "menu" => parse_menu(rest),
        "stage" => {
            let Some((role, path)) = rest.split_once(char::is_whitespace) else {
                return invalid("usage: stage encrypt|decrypt <path>");
            };
            match parse_role(role) {
                Some(role) => single(UserAction::StageFile {
                    role,
                    path: PathBuf::from(path.trim()),
                }),
                None => invalid("usage: stage encrypt|decrypt <path>"),
            }
        }
        "unstage" => match parse_role(rest) {
            Some(role) => single(UserAction::ClearStagedFile { role }),
            None => invalid("usage: unstage encrypt|decrypt"),
        },
        "owner" => single(UserAction::SetDecryptOwner(rest.to_string())),
        "encrypt" => single(UserAction::TriggerTransfer {
            role: TransferRole::Encrypt,
        }),
        "decrypt" => single(UserAction::TriggerTransfer {
            role: TransferRole::Decrypt,
        }),
        "refresh" => single(UserAction::RefreshFiles),
        "dismiss" => single(UserAction::DismissNotification),
        other => invalid(format!("unknown command '{other}'; type 'help'")),
    }
}

fn single(action: UserAction) -> ConsoleInput {
    ConsoleInput::Actions(vec![action])
}

fn invalid(message: impl Into<String>) -> ConsoleInput {
    ConsoleInput::Invalid(message.into())
}

fn parse_role(raw: &str) -> Option<TransferRole> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "encrypt" => Some(TransferRole::Encrypt),
        "decrypt" => Some(TransferRole::Decrypt),
        _ => None,
    }
}

fn parse_login(rest: &str, prompt: &mut dyn FnMut(&str) -> Option<String>) -> ConsoleInput {
    let mut parts = rest.split_whitespace();
    let Some(username) = parts.next() else {
        return single(UserAction::ShowLogin);
    };
    let password = match parts.next() {
        Some(password) => password.to_string(),
        None => match prompt("Password: ") {
            Some(password) => password,
            None => return invalid("could not read password"),
        },
    };
    ConsoleInput::Actions(vec![
        UserAction::ShowLogin,
        UserAction::SubmitLogin {
            username: username.to_string(),
            password,
        },
    ])
}

fn parse_register(rest: &str, prompt: &mut dyn FnMut(&str) -> Option<String>) -> ConsoleInput {
    let username = rest.split_whitespace().next();
    let Some(username) = username else {
        return single(UserAction::ShowRegister);
    };
    let (Some(password), Some(confirm_password)) =
        (prompt("Password: "), prompt("Confirm password: "))
    else {
        return invalid("could not read password");
    };
    ConsoleInput::Actions(vec![
        UserAction::ShowRegister,
        UserAction::SubmitRegister {
            username: username.to_string(),
            password,
            confirm_password,
        },
    ])
}

fn parse_menu(rest: &str) -> ConsoleInput {
    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("open"), None) => single(UserAction::OpenMobileMenu),
        (Some("close"), None) => single(UserAction::CloseMobileMenu),
        (Some("goto"), Some(view)) => match DashboardView::parse(view) {
            Some(view) => single(UserAction::NavigateFromMenu(view)),
            None => invalid("usage: menu goto home|encrypt|decrypt"),
        },
        _ => invalid("usage: menu open|close|goto <view>"),
    }
}

/// Reads stdin on its own thread. Sends `Quit` at end of input.
pub fn spawn_stdin_reader(input_tx: Sender<ConsoleInput>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let stdin = io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => {
                    let _ = input_tx.send(ConsoleInput::Quit);
                    return;
                }
                Ok(_) => {}
            }
            let mut prompt = |label: &str| rpassword::prompt_password(label).ok();
            let input = parse_line(&line, &mut prompt);
            let quit = matches!(input, ConsoleInput::Quit);
            if input_tx.send(input).is_err() || quit {
                debug!("console input reader stopping");
                return;
            }
        }
    })
}

pub fn render(state: &AppState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "==================== File Vault ====================");

    match state.session.page() {
        Page::Login => render_form(&mut out, "Sign in", &state.login_form, "Signing in..."),
        Page::Register => render_form(
            &mut out,
            "Create account",
            &state.register_form,
            "Creating account...",
        ),
        Page::Dashboard => render_dashboard(&mut out, state),
    }

    if let Some(notification) = state.notifications.current() {
        let marker = match notification.kind {
            NotificationKind::Success => "OK",
            NotificationKind::Error => "!!",
        };
        let _ = writeln!(out, "[{marker}] {}", notification.message);
    }
    if let Some(status) = &state.status {
        let _ = writeln!(out, "status: {status}");
    }
    out.push_str("> ");
    out
}

fn render_form(out: &mut String, title: &str, form: &FormState, loading: &str) {
    let _ = writeln!(out, "{title}");
    if form.is_loading() {
        let _ = writeln!(out, "  {loading}");
    }
    if let Some(error) = &form.error {
        let _ = writeln!(out, "  error: {error}");
    }
    let hint = if title == "Sign in" {
        "login <user> | register"
    } else {
        "register <user> | login"
    };
    let _ = writeln!(out, "  ({hint})");
}

fn render_dashboard(out: &mut String, state: &AppState) {
    let username = state.session.username().unwrap_or_default();
    let _ = writeln!(out, "Signed in as {username}");

    let tabs = DashboardView::ALL
        .iter()
        .map(|view| {
            if *view == state.view.current {
                format!("[{}]", view.label())
            } else {
                view.label().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("  ");
    let _ = writeln!(out, "{tabs}");
    if state.view.mobile_menu_open {
        let _ = writeln!(out, "menu:");
        for view in DashboardView::ALL {
            let _ = writeln!(out, "  - {}", view.label());
        }
    }
    let _ = writeln!(out, "----------------------------------------------------");

    match state.view.current {
        DashboardView::Home => render_files(out, state),
        DashboardView::Encrypt => render_transfer(out, &state.encrypt, TransferRole::Encrypt),
        DashboardView::Decrypt => {
            render_transfer(out, &state.decrypt, TransferRole::Decrypt);
            let owner = if state.decrypt_owner.trim().is_empty() {
                "(not set)"
            } else {
                state.decrypt_owner.as_str()
            };
            let _ = writeln!(out, "owner: {owner}");
        }
    }

    if let Some(path) = &state.last_download {
        let _ = writeln!(out, "last download: {}", path.display());
    }
}

fn render_files(out: &mut String, state: &AppState) {
    let refreshing = if state.files.is_refreshing() {
        " (refreshing)"
    } else {
        ""
    };
    let _ = writeln!(out, "Your files{refreshing}");
    if state.files.records.is_empty() {
        let _ = writeln!(out, "  no files yet");
        return;
    }
    for record in &state.files.records {
        let tag = match record.kind {
            FileKind::Encrypted => "locked",
            FileKind::Decrypted => "open",
        };
        let _ = writeln!(out, "  {:<7} {}", tag, record.name);
    }
}

fn render_transfer(out: &mut String, slot: &TransferSlot, role: TransferRole) {
    let accepted = role
        .accepted_extensions()
        .iter()
        .map(|extension| format!(".{extension}"))
        .collect::<Vec<_>>()
        .join(" ");
    let _ = writeln!(out, "{} a file (accepts {accepted})", capitalize(role.as_str()));
    let staged = slot
        .staged
        .as_ref()
        .map(|file| file.name.as_str())
        .unwrap_or("no file selected");
    let phase = match slot.phase() {
        TransferPhase::Idle => "",
        TransferPhase::Staged => " - ready",
        TransferPhase::InFlight => " - working...",
    };
    let _ = writeln!(out, "file: {staged}{phase}");
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
