//! Interactive session.
//!
//! The controller lives on the calling thread. Input lines and request
//! completions both arrive on one channel, so every state change happens in
//! order on that thread while the HTTP call runs on a worker.

use anyhow::{anyhow, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;

use crate::controller::{AppController, Completion, RequestTicket};
use crate::detect::{DetectionResponse, DetectionService};
use crate::report;
use crate::ui::{StageGuard, Ui};
use crate::upload::UploadSurface;
use crate::view::PageView;

pub const HELP: &str = "\
commands:
  open <path>          choose an image file
  drop <path> [mime]   drop an image file, optionally with its declared type
  detect               send the selected image for detection
  reset                back to the upload prompt
  status               show the page
  html <path>          write the page as a standalone HTML file
  help                 this text
  quit                 leave";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShellCommand {
    Open(PathBuf),
    Drop(PathBuf, Option<String>),
    Detect,
    Reset,
    Status,
    Html(PathBuf),
    Help,
    Quit,
}

/// Parse one input line. Blank lines and `#` comments yield `None`.
pub fn parse_command(line: &str) -> Result<Option<ShellCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let command = match verb.to_ascii_lowercase().as_str() {
        "open" | "choose" => ShellCommand::Open(required_path(verb, rest)?),
        "drop" => {
            let (path, mime) = match rest.rsplit_once(char::is_whitespace) {
                Some((path, mime)) if mime.contains('/') => {
                    (path.trim(), Some(mime.to_string()))
                }
                _ => (rest, None),
            };
            ShellCommand::Drop(required_path(verb, path)?, mime)
        }
        "detect" => ShellCommand::Detect,
        "reset" => ShellCommand::Reset,
        "status" => ShellCommand::Status,
        "html" => ShellCommand::Html(required_path(verb, rest)?),
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(anyhow!("unknown command '{}'; try 'help'", other)),
    };
    Ok(Some(command))
}

fn required_path(verb: &str, rest: &str) -> Result<PathBuf> {
    if rest.is_empty() {
        return Err(anyhow!("'{}' needs a file path", verb));
    }
    Ok(PathBuf::from(rest))
}

enum Event {
    Line(String),
    InputClosed,
    Completed(RequestTicket, Result<DetectionResponse>),
}

pub struct Shell {
    controller: AppController,
    upload: UploadSurface,
    service: Arc<dyn DetectionService>,
    ui: Ui,
    pending: Option<StageGuard>,
}

impl Shell {
    pub fn new(controller: AppController, service: Arc<dyn DetectionService>, ui: Ui) -> Self {
        Self {
            controller,
            upload: UploadSurface::new(),
            service,
            ui,
            pending: None,
        }
    }

    pub fn controller(&self) -> &AppController {
        &self.controller
    }

    /// Run until `quit`, or until input ends and no request is in flight.
    pub fn run<R, W>(&mut self, input: R, out: &mut W) -> Result<()>
    where
        R: BufRead + Send + 'static,
        W: Write,
    {
        let (tx, rx) = mpsc::channel();
        let input_tx = tx.clone();
        std::thread::spawn(move || {
            for line in input.lines() {
                match line {
                    Ok(line) => {
                        if input_tx.send(Event::Line(line)).is_err() {
                            return;
                        }
                    }
                    Err(err) => {
                        log::warn!("stopped reading input: {}", err);
                        break;
                    }
                }
            }
            let _ = input_tx.send(Event::InputClosed);
        });

        let mut input_open = true;
        writeln!(out, "{}", PageView::from_controller(&self.controller))?;
        while let Ok(event) = rx.recv() {
            match event {
                Event::Line(line) => {
                    if !self.handle_line(&line, &tx, out)? {
                        break;
                    }
                }
                Event::InputClosed => input_open = false,
                Event::Completed(ticket, outcome) => self.handle_completion(ticket, outcome, out)?,
            }
            if !input_open && !self.controller.is_loading() {
                break;
            }
        }
        self.pending = None;
        Ok(())
    }

    /// Returns `false` when the session should end.
    fn handle_line<W: Write>(
        &mut self,
        line: &str,
        tx: &mpsc::Sender<Event>,
        out: &mut W,
    ) -> Result<bool> {
        let command = match parse_command(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(true),
            Err(err) => {
                writeln!(out, "{}", err)?;
                return Ok(true);
            }
        };

        self.upload.set_disabled(self.controller.is_loading());
        match command {
            ShellCommand::Open(path) => {
                let selected = self.upload.choose_file(&path);
                self.select(selected, out)?;
            }
            ShellCommand::Drop(path, mime) => {
                let selected = self.upload.drop_file(&path, mime.as_deref());
                self.select(selected, out)?;
            }
            ShellCommand::Detect => self.start_detection(tx, out)?,
            ShellCommand::Reset => {
                if self.controller.is_loading() {
                    log::info!("reset while a detection is in flight; its result will be discarded");
                }
                if let Some(mut stage) = self.pending.take() {
                    stage.fail("reset");
                }
                self.controller.reset();
                writeln!(out, "{}", PageView::from_controller(&self.controller))?;
            }
            ShellCommand::Status => {
                writeln!(out, "{}", PageView::from_controller(&self.controller))?;
            }
            ShellCommand::Html(path) => match report::write_html(&self.controller, &path) {
                Ok(()) => writeln!(out, "wrote {}", path.display())?,
                Err(err) => writeln!(out, "{:#}", err)?,
            },
            ShellCommand::Help => writeln!(out, "{}", HELP)?,
            ShellCommand::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn select<W: Write>(
        &mut self,
        selected: Result<crate::upload::SelectedFile>,
        out: &mut W,
    ) -> Result<()> {
        match selected.and_then(|file| self.controller.select_file(file)) {
            Ok(()) => {
                if let Some(mut stage) = self.pending.take() {
                    stage.fail("superseded by a new selection");
                }
                writeln!(out, "{}", PageView::from_controller(&self.controller))?;
            }
            Err(err) => writeln!(out, "{:#}", err)?,
        }
        Ok(())
    }

    fn start_detection<W: Write>(&mut self, tx: &mpsc::Sender<Event>, out: &mut W) -> Result<()> {
        let Some(request) = self.controller.begin_detection() else {
            if self.controller.is_loading() {
                writeln!(out, "a detection is already in progress")?;
            } else {
                writeln!(out, "no image selected; use 'open <path>' first")?;
            }
            return Ok(());
        };

        self.pending = Some(self.ui.stage("Detecting objects"));
        let service = Arc::clone(&self.service);
        let tx = tx.clone();
        std::thread::spawn(move || {
            let outcome = service.detect_image(&request.file);
            let _ = tx.send(Event::Completed(request.ticket, outcome));
        });
        writeln!(out, "{}", PageView::from_controller(&self.controller))?;
        Ok(())
    }

    fn handle_completion<W: Write>(
        &mut self,
        ticket: RequestTicket,
        outcome: Result<DetectionResponse>,
        out: &mut W,
    ) -> Result<()> {
        match self.controller.complete_detection(ticket, outcome) {
            Completion::Applied => {
                if let Some(mut stage) = self.pending.take() {
                    if let Some(error) = self.controller.error() {
                        stage.fail(error);
                    }
                }
                writeln!(out, "{}", PageView::from_controller(&self.controller))?;
            }
            Completion::Stale => {
                writeln!(out, "(discarded a detection result for an earlier selection)")?;
            }
        }
        Ok(())
    }
}
