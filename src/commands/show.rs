//! `tapedeck show` command.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::cassette::format::{Cassette, FtpInteraction, Interaction, SourceType};
use crate::cassette::store::{self, FileFormat};
use crate::error::RecorderError;
use crate::time::TravelSpec;

/// Execute the `show` command.
///
/// # Errors
///
/// Returns an error string if the file cannot be read or is not a cassette.
pub fn run(path: &Path) -> Result<(), String> {
    print!("{}", summarize(path).map_err(|e| e.to_string())?);
    Ok(())
}

/// Renders a summary of a cassette or record file.
///
/// YAML files are HTTP/cURL or FTP cassettes; JSON files are a travel
/// destination or a list of verification values.
///
/// # Errors
///
/// Returns the load error of the last format tried.
pub fn summarize(path: &Path) -> Result<String, RecorderError> {
    let summary = match FileFormat::for_path(path) {
        FileFormat::Yaml => match store::load::<Cassette<Interaction>>(path) {
            Ok(cassette) => Summary::Http(cassette),
            Err(RecorderError::Yaml { .. }) => Summary::Ftp(store::load(path)?),
            Err(e) => return Err(e),
        },
        FileFormat::Json => match store::load::<TravelSpec>(path) {
            Ok(travel) => Summary::Travel(travel),
            Err(RecorderError::Json { .. }) => Summary::Values(store::load(path)?),
            Err(e) => return Err(e),
        },
    };
    Ok(Rendered { path, summary: &summary }.to_string())
}

enum Summary {
    Http(Cassette<Interaction>),
    Ftp(Cassette<FtpInteraction>),
    Travel(TravelSpec),
    Values(Vec<String>),
}

struct Rendered<'a> {
    path: &'a Path,
    summary: &'a Summary,
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.summary {
            Summary::Http(cassette) => {
                cassette_header(f, self.path, cassette.recorded_at, cassette.interactions.len())?;
                for (i, interaction) in cassette.interactions.iter().enumerate() {
                    writeln!(
                        f,
                        "  {}. {} {} -> {} {} [{}]",
                        i + 1,
                        interaction.request.method,
                        interaction.request.uri,
                        interaction.response.status.code,
                        interaction.response.status.message,
                        source_label(interaction.source_type)
                    )?;
                }
                Ok(())
            }
            Summary::Ftp(cassette) => {
                cassette_header(f, self.path, cassette.recorded_at, cassette.interactions.len())?;
                for (i, entry) in cassette.interactions.iter().enumerate() {
                    let target = entry.url.clone().unwrap_or_else(|| entry.args.join(" "));
                    let outcome = entry
                        .error
                        .as_deref()
                        .map(|e| format!("error: {e}"))
                        .or_else(|| entry.response.clone())
                        .unwrap_or_default();
                    writeln!(f, "  {}. {} {} -> {}", i + 1, entry.command, target, outcome)?;
                }
                Ok(())
            }
            Summary::Travel(travel) => {
                writeln!(f, "Record: {}", self.path.display())?;
                writeln!(
                    f,
                    "Travel: {} ({})",
                    travel.instant.to_rfc3339(),
                    if travel.tick { "ticking" } else { "frozen" }
                )
            }
            Summary::Values(values) => {
                writeln!(f, "Record: {}", self.path.display())?;
                writeln!(f, "Values: {}", values.len())?;
                for (i, value) in values.iter().enumerate() {
                    writeln!(f, "  {i}: {value}")?;
                }
                Ok(())
            }
        }
    }
}

fn cassette_header(
    f: &mut fmt::Formatter<'_>,
    path: &Path,
    recorded_at: Option<DateTime<Utc>>,
    count: usize,
) -> fmt::Result {
    writeln!(f, "Cassette: {}", path.display())?;
    if let Some(at) = recorded_at {
        writeln!(f, "Recorded: {}", at.to_rfc3339())?;
    }
    writeln!(f, "Interactions: {count}")
}

fn source_label(source: SourceType) -> &'static str {
    match source {
        SourceType::Http => "http",
        SourceType::CurlSession => "curl_session",
        SourceType::CurlAsync => "curl_async",
        SourceType::CurlEasy => "curl_easy",
    }
}
