//! Run command - interactive session driven from stdin

use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;
use stickercam_core::{
    artifact::Download,
    filter::FilterKind,
    scheduler::FrameClock,
    session::{Session, UiEvent},
    source::VideoDevice,
    types::CaptureMode,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{debug, info};

use super::{load_config, save_download, CaptureOptions};

/// Arguments for the run command
#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    options: CaptureOptions,

    /// Start in continuous (video) mode
    #[arg(long)]
    video: bool,

    /// Enable the source right away
    #[arg(long)]
    enable: bool,

    /// Print the session status as JSON after every command
    #[arg(long)]
    json: bool,
}

/// One line of input
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Event(UiEvent),
    Status,
    Help,
    Quit,
}

fn parse_command(line: &str) -> std::result::Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err("empty command".to_string());
    };
    let arg = words.next();

    let event = match verb.to_lowercase().as_str() {
        "enable" | "on" => UiEvent::EnableSource,
        "disable" | "off" => UiEvent::DisableSource,
        "filter" => {
            let kind: FilterKind = arg.ok_or("usage: filter <kind>")?.parse()?;
            UiEvent::SetFilter(kind)
        }
        "mode" => {
            let mode: CaptureMode = arg.ok_or("usage: mode <still|continuous>")?.parse()?;
            UiEvent::SetMode(mode)
        }
        "sticker" => UiEvent::SelectSticker(arg.ok_or("usage: sticker <id>")?.to_string()),
        "place" => {
            let x = arg.ok_or("usage: place <x> <y>")?;
            let y = words.next().ok_or("usage: place <x> <y>")?;
            UiEvent::PlaceOverlay {
                x: x.parse().map_err(|_| format!("invalid x '{}'", x))?,
                y: y.parse().map_err(|_| format!("invalid y '{}'", y))?,
            }
        }
        "capture" | "c" => UiEvent::CaptureOrToggleRecording,
        "clear" => UiEvent::Clear,
        "download" | "save" => UiEvent::Download,
        "status" => return Ok(Command::Status),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" | "q" => return Ok(Command::Quit),
        other => return Err(format!("unknown command '{}', try 'help'", other)),
    };
    Ok(Command::Event(event))
}

fn print_help() {
    println!("Commands:");
    println!("  enable | disable          turn the camera on or off");
    println!("  filter <kind>             none, grayscale, sepia, invert");
    println!("  mode <still|continuous>   switch capture mode");
    println!("  sticker <id>              cool, joy, heart, mind-blown");
    println!("  place <x> <y>             place the selected sticker");
    println!("  capture                   take a photo / start or stop recording");
    println!("  clear                     remove stickers and the capture");
    println!("  download                  write the capture to the output directory");
    println!("  status                    show session status");
    println!("  quit");
}

fn print_status<D: VideoDevice>(session: &Session<D>, json: bool) -> Result<()> {
    if json {
        let status = serde_json::json!({
            "status": session.status(),
            "affordances": session.affordances(),
        });
        println!("{}", serde_json::to_string(&status)?);
    } else {
        println!("{}", session.status());
        let a = session.affordances();
        println!(
            "  [{}] enable [{}] disable [{}] {} [{}] clear [{}] download",
            mark(a.enable),
            mark(a.disable),
            mark(a.capture),
            a.capture_label,
            mark(a.clear),
            mark(a.download)
        );
    }
    Ok(())
}

fn mark(enabled: bool) -> char {
    if enabled { 'x' } else { ' ' }
}

/// Publish a clip that finished since the last check
fn publish_finished<D: VideoDevice>(session: &mut Session<D>) {
    if session.poll_finalized() {
        println!("{}", session.feedback());
    }
}

/// Apply one event on top of every finished clip
async fn handle_event<D: VideoDevice>(
    session: &mut Session<D>,
    event: UiEvent,
) -> Option<Download> {
    publish_finished(session);
    session.dispatch(event).await
}

/// Run an interactive session until `quit` or end of input
pub async fn run(args: RunArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path, &args.options)?;
    if args.video {
        config = config.with_mode(CaptureMode::Continuous);
    }
    let output_dir = config.output_dir.clone();
    let fps = config.fps;

    let mut session = Session::from_config(config);
    println!("Stickercam - {} ('help' for commands)", session.device().name());

    if args.enable {
        session.dispatch(UiEvent::EnableSource).await;
        println!("{}", session.feedback());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut clock = FrameClock::new(fps);

    loop {
        // Keep ticking until the last clip is published
        let ticking = session.is_recording() || session.capture_stats().pending_finalizations > 0;

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    debug!("End of input");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                match parse_command(&line) {
                    Ok(Command::Event(event)) => {
                        if let Some(download) = handle_event(&mut session, event).await {
                            let path = save_download(&output_dir, &download)?;
                            println!("Saved {}", path.display());
                        }
                        println!("{}", session.feedback());
                        if args.json {
                            print_status(&session, true)?;
                        }
                    }
                    Ok(Command::Status) => {
                        publish_finished(&mut session);
                        print_status(&session, args.json)?
                    }
                    Ok(Command::Help) => print_help(),
                    Ok(Command::Quit) => break,
                    Err(e) => println!("{}", e),
                }
            }
            _ = clock.tick(), if ticking => {
                if session.is_recording() {
                    session.render_tick();
                }
            }
            _ = signal::ctrl_c() => {
                println!();
                break;
            }
        }

        publish_finished(&mut session);
    }

    session.stop_recording();
    if session.capture_stats().pending_finalizations > 0 {
        info!("Waiting for the last recording to finalize");
        session.wait_finalized().await;
    }
    session.disable_source();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stickercam_core::config::{CaptureConfig, SourceConfig};

    #[test]
    fn test_parse_events() {
        assert_eq!(parse_command("on"), Ok(Command::Event(UiEvent::EnableSource)));
        assert_eq!(
            parse_command("filter sepia"),
            Ok(Command::Event(UiEvent::SetFilter(FilterKind::Sepia)))
        );
        assert_eq!(
            parse_command("place 10 20.5"),
            Ok(Command::Event(UiEvent::PlaceOverlay { x: 10.0, y: 20.5 }))
        );
        assert_eq!(parse_command("q"), Ok(Command::Quit));
    }

    #[tokio::test]
    async fn test_finished_clip_is_downloadable() {
        let config = CaptureConfig::default()
            .with_size(32, 24)
            .with_glyph_size(8)
            .with_mode(CaptureMode::Continuous)
            .with_source(SourceConfig::TestPattern {
                width: 32,
                height: 24,
                fps: 30,
            });
        let mut session = Session::from_config(config);

        handle_event(&mut session, UiEvent::EnableSource).await;
        handle_event(&mut session, UiEvent::CaptureOrToggleRecording).await;
        session.render_tick();
        session.render_tick();
        handle_event(&mut session, UiEvent::CaptureOrToggleRecording).await;
        assert_eq!(session.feedback(), "recording stopped");

        // Encoder thread finalizes in the background, no command in between
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;

        let download = handle_event(&mut session, UiEvent::Download).await.unwrap();
        assert_eq!(download.file_name, "video.mjpeg");
        assert_eq!(session.feedback(), "download ready: video.mjpeg");
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("filter").is_err());
        assert!(parse_command("filter blur").is_err());
        assert!(parse_command("place 1").is_err());
        assert!(parse_command("dance").is_err());
    }
}
