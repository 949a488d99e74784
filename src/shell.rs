//! Line-oriented interactive prompt
//!
//! The shell alternates between two prompts: choosing a state, and choosing
//! a site from that state's listing to search for nearby places. It reads
//! from any tokio `AsyncBufRead` and writes to any `Write` so sessions can be
//! replayed in tests.

use std::io::{self, Write};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::cache::CacheStore;
use crate::data::{get_nearby_places, get_sites_for_state, NationalSite, StateIndex};
use crate::fetch::Fetcher;

/// Where the shell is in the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellState {
    /// Waiting for a state name
    ChooseState,
    /// Showing the sites of a state, waiting for a selection
    ChooseSite {
        /// Dash line framing the listing headers
        rule: String,
        sites: Vec<NationalSite>,
    },
    /// Session is over
    Exit,
}

/// A parsed reply at the site prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteCommand {
    Exit,
    Back,
    /// Zero-based index into the listing
    Select(usize),
    Invalid,
}

impl SiteCommand {
    /// Parses a reply given `count` listed sites; numbers are 1-based
    pub fn parse(input: &str, count: usize) -> Self {
        match input {
            "exit" => SiteCommand::Exit,
            "back" => SiteCommand::Back,
            _ if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) => {
                match input.parse::<usize>() {
                    Ok(n) if (1..=count).contains(&n) => SiteCommand::Select(n - 1),
                    _ => SiteCommand::Invalid,
                }
            }
            _ => SiteCommand::Invalid,
        }
    }
}

/// Interactive session over a shared response cache
pub struct Shell<'a, F> {
    store: &'a mut CacheStore<F>,
    states: StateIndex,
    api_key: Option<String>,
    state: ShellState,
}

impl<'a, F: Fetcher> Shell<'a, F> {
    /// Creates a shell that looks states up in `states`
    pub fn new(store: &'a mut CacheStore<F>, states: StateIndex, api_key: Option<String>) -> Self {
        Self {
            store,
            states,
            api_key,
            state: ShellState::ChooseState,
        }
    }

    pub fn state(&self) -> &ShellState {
        &self.state
    }

    /// Runs until `exit` or end of input
    ///
    /// Waiting for input yields to the runtime instead of blocking it.
    pub async fn run<R, W>(&mut self, mut input: R, output: &mut W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        while self.state != ShellState::Exit {
            let prompt = match self.state {
                ShellState::ChooseSite { .. } => {
                    "Choose the number for detail search or \"exit\" or \"back\""
                }
                _ => "Enter a state name (e.g. Michigan, michigan) or \"exit\"",
            };
            writeln!(output, "{prompt}")?;
            write!(output, ": ")?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line).await? == 0 {
                tracing::debug!("end of input");
                self.state = ShellState::Exit;
                break;
            }

            self.handle_line(line.trim(), output).await?;
        }
        Ok(())
    }

    /// Applies one line of input to the current state
    pub async fn handle_line<W: Write>(&mut self, line: &str, output: &mut W) -> io::Result<()> {
        match std::mem::replace(&mut self.state, ShellState::Exit) {
            ShellState::ChooseState => self.handle_state_name(line, output).await,
            ShellState::ChooseSite { rule, sites } => {
                self.handle_site_choice(line, rule, sites, output).await
            }
            ShellState::Exit => Ok(()),
        }
    }

    async fn handle_state_name<W: Write>(&mut self, line: &str, output: &mut W) -> io::Result<()> {
        if line == "exit" {
            return Ok(());
        }

        let Some(state_url) = self.states.get(&line.to_lowercase()).cloned() else {
            writeln!(output, "[Error] Enter proper state name\n")?;
            self.state = ShellState::ChooseState;
            return Ok(());
        };

        let sites = match get_sites_for_state(self.store, &state_url).await {
            Ok(sites) => sites,
            Err(e) => {
                tracing::warn!(state_url = %state_url, "failed to list sites: {e}");
                writeln!(output, "[Error] {e}\n")?;
                self.state = ShellState::ChooseState;
                return Ok(());
            }
        };

        let title = format!("List of national sites in {line}");
        let rule = "-".repeat(title.chars().count());
        writeln!(output, "{rule}\n{title}\n{rule}")?;
        for (i, site) in sites.iter().enumerate() {
            writeln!(output, "[{}] {}", i + 1, site.info())?;
        }

        self.state = ShellState::ChooseSite { rule, sites };
        Ok(())
    }

    async fn handle_site_choice<W: Write>(
        &mut self,
        line: &str,
        rule: String,
        sites: Vec<NationalSite>,
        output: &mut W,
    ) -> io::Result<()> {
        match SiteCommand::parse(line, sites.len()) {
            SiteCommand::Exit => return Ok(()),
            SiteCommand::Back => {
                self.state = ShellState::ChooseState;
                return Ok(());
            }
            SiteCommand::Select(index) => {
                let site = &sites[index];
                writeln!(output, "{rule}\nPlaces near {}\n{rule}", site.name)?;
                match get_nearby_places(self.store, site, self.api_key.as_deref()).await {
                    Ok(Some(places)) => {
                        for place in places {
                            writeln!(output, "{place}")?;
                        }
                    }
                    Ok(None) => writeln!(output, "No zip code")?,
                    Err(e) => {
                        tracing::warn!(site = %site.name, "nearby search failed: {e}");
                        writeln!(output, "[Error] {e}")?;
                    }
                }
            }
            SiteCommand::Invalid => {
                writeln!(output, "[Error] Invalid input\n{rule}")?;
            }
        }

        self.state = ShellState::ChooseSite { rule, sites };
        Ok(())
    }
}
