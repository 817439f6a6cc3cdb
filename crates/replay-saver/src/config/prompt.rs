//! First-run console prompt for settings that are not in the file yet.

use crate::{
    AppError, AppResult, HotkeyHandler,
    config::{Config, DEFAULT_OBS_PORT},
};

use std::{
    io::{self, BufRead, IsTerminal, Write},
    panic::Location,
    path::Path,
};

use error_location::ErrorLocation;
use tracing::{info, instrument};

/// Make sure every required setting is present.
///
/// Asks for missing values on the console when one is attached and saves
/// the result. Without a console, fails with a message pointing at the file.
#[track_caller]
#[instrument(skip(config))]
pub(crate) fn ensure_complete(config: &mut Config) -> AppResult<()> {
    if config.missing_fields().is_empty() {
        return Ok(());
    }

    let path = Config::config_path()?;
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let stdout = io::stdout();

    complete_settings(config, &path, interactive, &mut stdin.lock(), &mut stdout.lock())
}

/// Fill in missing settings from `input` and save them to `path`.
///
/// When `interactive` is false nothing is asked and the error names the
/// file the user has to edit.
#[track_caller]
pub(crate) fn complete_settings<R, W>(
    config: &mut Config,
    path: &Path,
    interactive: bool,
    input: &mut R,
    output: &mut W,
) -> AppResult<()>
where
    R: BufRead,
    W: Write,
{
    let missing = config.missing_fields();
    if missing.is_empty() {
        return Ok(());
    }

    if !interactive {
        return Err(AppError::ConfigError {
            reason: format!(
                "Missing settings ({}). Edit {} or start the app from a terminal",
                missing.join(", "),
                path.display()
            ),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    info!(missing = ?missing, "Prompting for missing settings");

    prompt_missing(config, input, output)?;
    config.save_to(path)
}

/// Ask for each missing setting on `input`, echoing prompts to `output`.
///
/// Returns whether anything was filled in.
#[track_caller]
pub(crate) fn prompt_missing<R, W>(config: &mut Config, input: &mut R, output: &mut W) -> AppResult<bool>
where
    R: BufRead,
    W: Write,
{
    let missing = config.missing_fields();

    for field in &missing {
        match *field {
            "host" => {
                let host = ask_until(input, output, "Enter OBS host/IP: ", |line| {
                    (!line.is_empty()).then(|| line.to_string())
                })?;
                config.obs.host = Some(host);
            }
            "port" => {
                let prompt = format!("Enter OBS port [{}]: ", DEFAULT_OBS_PORT);
                let port = ask_until(input, output, &prompt, |line| {
                    if line.is_empty() {
                        Some(DEFAULT_OBS_PORT)
                    } else {
                        line.parse::<u16>().ok().filter(|p| *p != 0)
                    }
                })?;
                config.obs.port = Some(port);
            }
            "password" => {
                let password = ask_raw(input, output, "Enter OBS password (leave blank if none): ")?;
                config.obs.password = Some(password);
            }
            "hotkey" => {
                let hotkey = ask_until(input, output, "Enter hotkey (e.g. ctrl+alt+s): ", |line| {
                    HotkeyHandler::parse_binding(line)
                        .ok()
                        .map(|_| line.to_string())
                })?;
                config.hotkey.save = Some(hotkey);
            }
            _ => {}
        }
    }

    Ok(!missing.is_empty())
}

/// Ask until `parse` accepts the trimmed answer.
#[track_caller]
fn ask_until<R, W, T>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> AppResult<T>
where
    R: BufRead,
    W: Write,
{
    loop {
        let answer = ask_raw(input, output, prompt)?;
        if let Some(value) = parse(answer.trim()) {
            return Ok(value);
        }
        writeln!(output, "Invalid value, please try again.")?;
    }
}

/// Ask once and return the answer without its line ending.
#[track_caller]
fn ask_raw<R, W>(input: &mut R, output: &mut W, prompt: &str) -> AppResult<String>
where
    R: BufRead,
    W: Write,
{
    write!(output, "{}", prompt)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(AppError::ConfigError {
            reason: "Input closed before all settings were entered".to_string(),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
