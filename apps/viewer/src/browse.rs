//! Line-oriented tour browsing: one command per input line, answers on `out`.

use std::{
    io::{BufRead, Write},
    str::FromStr,
};

use navigation::{SceneRenderer, Viewer, ViewerEvent};
use thiserror::Error;

use crate::renderer::describe_hotspot;

pub const HELP: &str = "commands: hotspots | go <n> | open <image> | images | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Hotspots,
    Go(usize),
    Open(String),
    Images,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),
    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),
    #[error("'{0}' is not a hotspot number")]
    BadIndex(String),
}

impl FromStr for BrowseCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(word, rest)| (word, rest.trim()))
            .unwrap_or((line, ""));

        match word.to_ascii_lowercase().as_str() {
            "hotspots" | "h" => Ok(Self::Hotspots),
            "images" | "i" => Ok(Self::Images),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            "go" | "g" => {
                if rest.is_empty() {
                    return Err(CommandError::MissingArgument("go"));
                }
                rest.parse()
                    .map(Self::Go)
                    .map_err(|_| CommandError::BadIndex(rest.to_string()))
            }
            "open" | "o" => {
                if rest.is_empty() {
                    return Err(CommandError::MissingArgument("open"));
                }
                Ok(Self::Open(rest.to_string()))
            }
            _ => Err(CommandError::Unknown(word.to_string())),
        }
    }
}

/// Runs commands until `quit` or end of input.
pub fn run<R: SceneRenderer>(
    viewer: &mut Viewer<R>,
    input: impl BufRead,
    mut out: impl Write,
) -> anyhow::Result<()> {
    writeln!(out, "{HELP}")?;
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<BrowseCommand>() {
            Ok(command) => command,
            Err(error) => {
                writeln!(out, "{error}")?;
                continue;
            }
        };

        match command {
            BrowseCommand::Quit => break,
            BrowseCommand::Help => writeln!(out, "{HELP}")?,
            BrowseCommand::Hotspots => {
                let hotspots = viewer.current_hotspots();
                if hotspots.is_empty() {
                    writeln!(out, "no hotspots on {}", viewer.current_image().name)?;
                }
                for (index, hotspot) in hotspots.iter().enumerate() {
                    writeln!(out, "{}", describe_hotspot(index, hotspot))?;
                }
            }
            BrowseCommand::Images => {
                let current = &viewer.current_image().name;
                for image in viewer.graph().images() {
                    let marker = if &image.name == current { '*' } else { ' ' };
                    writeln!(out, "{marker} {}", image.name)?;
                }
            }
            BrowseCommand::Go(index) => {
                let event = viewer.click_hotspot(index)?;
                report(&mut out, &event, &viewer.current_image().name)?;
            }
            BrowseCommand::Open(name) => {
                let event = viewer.select_image(&name)?;
                report(&mut out, &event, &viewer.current_image().name)?;
            }
        }
        out.flush()?;
    }
    Ok(())
}

fn report(out: &mut impl Write, event: &ViewerEvent, current: &str) -> std::io::Result<()> {
    match event {
        ViewerEvent::CurrentImageChanged { to, .. } => writeln!(out, "now viewing {to}"),
        ViewerEvent::Unchanged => writeln!(out, "still viewing {current}"),
    }
}

#[cfg(test)]
#[path = "tests/browse_tests.rs"]
mod tests;
