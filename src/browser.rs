//! Hands generated image URLs to the operating system's URL handler.

use std::io;
use std::process::{Command, Stdio};
use std::thread;

use crate::error::{Error, Result};
use crate::observability::{BROWSER_OPEN_ERRORS, BROWSER_OPENS};

/// Something that can show a URL to the user.
pub trait UrlOpener: Send {
    /// Opens `url`.  Returns once the handler has been launched, not when it
    /// exits.
    fn open(&mut self, url: &str) -> Result<()>;
}

/// Opens URLs with the platform's default handler (`open`,
/// `url.dll,FileProtocolHandler` or `xdg-open`).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl SystemBrowser {
    fn command(url: &str) -> Command {
        #[cfg(target_os = "macos")]
        {
            let mut command = Command::new("open");
            command.arg(url);
            command
        }

        // Not `cmd /C start`: cmd.exe would parse `&`, `|` and `^` in the URL.
        #[cfg(target_os = "windows")]
        {
            let mut command = Command::new("rundll32");
            command.args(["url.dll,FileProtocolHandler", url]);
            command
        }

        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            let mut command = Command::new("xdg-open");
            command.arg(url);
            command
        }
    }
}

impl UrlOpener for SystemBrowser {
    fn open(&mut self, url: &str) -> Result<()> {
        launch(Self::command(url)).map(drop).map_err(|err| {
            Error::io(format!("failed to open {url} in a browser"), err)
        })
    }
}

/// Spawns `command` detached from the terminal and reaps it in the
/// background.  The handlers exit as soon as they have handed the URL off.
fn launch(mut command: Command) -> io::Result<thread::JoinHandle<()>> {
    let spawned = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    match spawned {
        Ok(mut child) => {
            BROWSER_OPENS.click();
            Ok(thread::spawn(move || {
                let _ = child.wait();
            }))
        }
        Err(err) => {
            BROWSER_OPEN_ERRORS.click();
            Err(err)
        }
    }
}

/// An opener that does nothing, for `--no-browser` and headless sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBrowser;

impl UrlOpener for NoBrowser {
    fn open(&mut self, _url: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_browser_accepts_anything() {
        let mut opener = NoBrowser;
        assert!(opener.open("https://img.example/1.png").is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn launched_handler_is_reaped() {
        let reaper = launch(Command::new("true")).unwrap();
        reaper.join().unwrap();
    }

    #[test]
    fn missing_handler_is_an_error() {
        let err = launch(Command::new("friday-no-such-url-handler")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn query_string_reaches_handler_as_one_argument() {
        let url = "https://img.example/y.png?a=1&b=2|c^d";
        let command = SystemBrowser::command(url);
        let args: Vec<_> = command.get_args().filter_map(|a| a.to_str()).collect();
        assert_eq!(args.last(), Some(&url));
        assert_eq!(args.iter().filter(|a| a.contains("a=1")).count(), 1);
    }

    #[cfg(windows)]
    #[test]
    fn windows_opens_without_a_shell() {
        let url = "https://img.example/y.png?a=1&b=2";
        let command = SystemBrowser::command(url);
        assert_eq!(command.get_program(), "rundll32");
        let args: Vec<_> = command.get_args().filter_map(|a| a.to_str()).collect();
        assert_eq!(args, vec!["url.dll,FileProtocolHandler", url]);
    }

    #[test]
    fn system_browser_passes_url_as_argument() {
        let command = SystemBrowser::command("https://img.example/a b.png");
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(
            args.last().and_then(|a| a.to_str()),
            Some("https://img.example/a b.png")
        );
    }
}
