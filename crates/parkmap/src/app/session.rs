use std::io::{BufRead, Write};
use std::str::FromStr;
use std::sync::{MutexGuard, PoisonError};

use miette::{IntoDiagnostic, Result};
use parkmap_core::LatLon;
use parkmap_marker_models::{IconDescriptor, LeafletMap, MarkerColor, MarkerMap, SharedMap};
use parkmap_ownership::OwnershipLookupPanel;
use tracing::{info_span, trace, warn};

/// One line typed by the user.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Click(usize),
    Add { position: LatLon, name: String },
    Lookup(usize),
    Show,
    Wait,
    Help,
    Quit,
}

impl FromStr for SessionCommand {
    type Err = String;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let index = |word: Option<&str>| -> std::result::Result<usize, String> {
            word.ok_or("missing marker index")?
                .parse()
                .map_err(|e| format!("bad marker index: {e}"))
        };
        let float = |word: Option<&str>, what: &str| -> std::result::Result<f64, String> {
            word.ok_or(format!("missing {what}"))?
                .parse()
                .map_err(|e| format!("bad {what}: {e}"))
        };
        match words.next() {
            Some("click") => Ok(Self::Click(index(words.next())?)),
            Some("lookup") => Ok(Self::Lookup(index(words.next())?)),
            Some("add") => {
                let lat = float(words.next(), "latitude")?;
                let lon = float(words.next(), "longitude")?;
                let name = words.collect::<Vec<_>>().join(" ");
                Ok(Self::Add {
                    position: LatLon::new(lat, lon),
                    name: if name.is_empty() { "Unnamed".to_string() } else { name },
                })
            }
            Some("show") => Ok(Self::Show),
            Some("wait") => Ok(Self::Wait),
            Some("help") | Some("?") => Ok(Self::Help),
            Some("quit") | Some("exit") => Ok(Self::Quit),
            Some(other) => Err(format!("unknown command `{other}`, try `help`")),
            None => Err("empty line".to_string()),
        }
    }
}

const HELP: &str = "commands: click N | add LAT LON NAME | lookup N | show | wait | quit";

/// Drives a published map and its ownership panel from text commands,
/// the way the page would from clicks.
pub struct Session {
    map: SharedMap,
    panel: OwnershipLookupPanel,
}

impl Session {
    pub fn new(map: SharedMap, panel: OwnershipLookupPanel) -> Self {
        Self { map, panel }
    }

    fn map(&self) -> MutexGuard<'_, LeafletMap> {
        self.map.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn run(mut self, input: impl BufRead, mut output: impl Write) -> Result<()> {
        let _span_guard = info_span!("session loop").entered();
        writeln!(output, "{HELP}").into_diagnostic()?;
        for line in input.lines() {
            let line = line.into_diagnostic()?;
            if line.trim().is_empty() {
                continue;
            }
            self.panel.flush_all_messages();
            match line.parse::<SessionCommand>() {
                Ok(command) => {
                    if !self.execute(command, &mut output)? {
                        break;
                    }
                }
                Err(e) => writeln!(output, "{e}").into_diagnostic()?,
            }
        }
        self.panel.close();
        Ok(())
    }

    /// Returns false once the session should end.
    pub fn execute(&mut self, command: SessionCommand, output: &mut impl Write) -> Result<bool> {
        trace!(?command, "session command");
        match command {
            SessionCommand::Click(index) => {
                let mut map = self.map();
                match map.nth_marker(index) {
                    Some(guid) => {
                        map.click(guid);
                    }
                    None => writeln!(output, "no marker #{index}").into_diagnostic()?,
                }
            }
            SessionCommand::Add { position, name } => {
                // added after the wiring pass: this marker never reacts to clicks
                let mut map = self.map();
                map.add_marker(position, Some(IconDescriptor::awesome(MarkerColor::Red)), name);
                let index = map.markers().count() - 1;
                writeln!(output, "added marker #{index}").into_diagnostic()?;
            }
            SessionCommand::Lookup(index) => match self.panel.lots().get(index) {
                Some(lot) => self.panel.lookup_ownership(lot.lat, lot.lon),
                None => writeln!(output, "no lot #{index}").into_diagnostic()?,
            },
            SessionCommand::Show => self.show(output)?,
            SessionCommand::Wait => {
                while self.panel.pending() != 0 {
                    self.panel.flush_all_messages();
                    std::thread::sleep(std::time::Duration::from_millis(10));
                }
                self.panel.flush_all_messages();
            }
            SessionCommand::Help => writeln!(output, "{HELP}").into_diagnostic()?,
            SessionCommand::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn show(&self, output: &mut impl Write) -> Result<()> {
        let popups = self.panel.render();
        let map = self.map();
        for (index, marker) in map.markers().enumerate() {
            let icon = match marker.icon() {
                Some(IconDescriptor::Awesome { color, .. }) => color.to_string(),
                Some(IconDescriptor::Image { url, .. }) => format!("image {url}"),
                None => "no icon".to_string(),
            };
            writeln!(
                output,
                "#{index} {} {icon} handlers={}",
                marker.position(),
                marker.handler_count()
            )
            .into_diagnostic()?;
            match popups.get(index) {
                Some(popup) if popup.key == marker.position().key() => {
                    writeln!(output, "  {popup}").into_diagnostic()?;
                }
                Some(_) => warn!(index, "popup and marker are out of step"),
                None => {}
            }
        }
        Ok(())
    }
}
