// src/main.rs

use std::io::{stdout, Write};
use std::time::Duration;

use anyhow::Context;
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
        KeyModifiers, MouseButton, MouseEventKind,
    },
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, Clear, ClearType},
};

use trackwave::render::terminal::{format_time, render_rows};
use trackwave::render::{seek_time, RenderOptions};
use trackwave::{decoder, intake, IntakeResult, Notice, PreviewPlayer, Transport};

const WAVE_HEIGHT: usize = 9;

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();
    let path = std::env::args()
        .nth(1)
        .context("usage: player <audio-file>")?;

    println!("🎧 Loading {path} ...");

    let (result, audio) = match decoder::decode_file(&path) {
        Ok(audio) => (intake::analyze_decoded(&audio), Some(audio)),
        Err(e) => {
            log::warn!("decode failed: {e}");
            let mut fallback = IntakeResult::no_source();
            fallback.notice = Some(Notice::DecodeFailed);
            (fallback, None)
        }
    };

    // Playback is best-effort: with no device (or no decodable audio) the
    // waveform still renders, just without a moving playhead.
    let player = match audio.as_ref() {
        Some(a) => match PreviewPlayer::new(a) {
            Ok(p) => Some(p),
            Err(e) => {
                log::warn!("no playback: {e}");
                None
            }
        },
        None => None,
    };

    let duration = player
        .as_ref()
        .map(|p| p.duration().as_secs_f64())
        .unwrap_or(result.analysis.duration_seconds);
    let mut transport = Transport::new(duration);
    let opts = RenderOptions::default();

    enable_raw_mode()?;
    execute!(stdout(), EnableMouseCapture, cursor::Hide)?;
    let outcome = run_ui(&path, &result, player.as_ref(), &mut transport, &opts);
    execute!(stdout(), DisableMouseCapture, cursor::Show)?;
    disable_raw_mode()?;

    println!("\n👋 Done.");
    outcome
}

fn run_ui(
    path: &str,
    result: &IntakeResult,
    player: Option<&PreviewPlayer>,
    transport: &mut Transport,
    opts: &RenderOptions,
) -> Result<(), anyhow::Error> {
    let frame_time = Duration::from_millis(50);
    let mut out = stdout();

    loop {
        let (cols, _) = terminal::size()?;
        let cols = cols.max(20) as usize;

        if event::poll(frame_time)? {
            match event::read()? {
                Event::Key(ev) if ev.kind == KeyEventKind::Press => {
                    match ev.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::Char('c')
                            if ev.modifiers.contains(KeyModifiers::CONTROL) =>
                        {
                            break
                        }
                        KeyCode::Char(' ') => {
                            transport.toggle();
                            sync_player(player, transport);
                        }
                        KeyCode::Left => nudge(player, transport, -5.0),
                        KeyCode::Right => nudge(player, transport, 5.0),
                        KeyCode::Up => {
                            if let Some(p) = player {
                                p.set_volume(p.volume() + 0.1);
                            }
                        }
                        KeyCode::Down => {
                            if let Some(p) = player {
                                p.set_volume(p.volume() - 0.1);
                            }
                        }
                        _ => {}
                    }
                }
                Event::Mouse(ev) => {
                    if let MouseEventKind::Down(MouseButton::Left) = ev.kind {
                        let target = seek_time(
                            ev.column as f32,
                            cols as f32,
                            transport.cursor().duration,
                        );
                        let outcome = transport.click(target);
                        if let Some(p) = player {
                            p.seek(Duration::from_secs_f64(outcome.seek_to));
                            if outcome.resumed {
                                p.play();
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        // Let the audio clock drive the perceived position.
        if let Some(p) = player {
            if transport.is_playing() {
                let ended = transport.set_position(p.position().as_secs_f64());
                if ended {
                    p.pause();
                    p.seek(Duration::ZERO);
                }
            }
        }

        draw(&mut out, path, result, transport, cols, opts)?;
    }

    Ok(())
}

fn sync_player(player: Option<&PreviewPlayer>, transport: &Transport) {
    if let Some(p) = player {
        if transport.is_playing() {
            p.play();
        } else {
            p.pause();
        }
    }
}

fn nudge(player: Option<&PreviewPlayer>, transport: &mut Transport, delta: f64) {
    let target = transport.cursor().current_time + delta;
    transport.seek(target);
    if let Some(p) = player {
        p.seek(Duration::from_secs_f64(transport.cursor().current_time));
    }
}

fn draw(
    out: &mut impl Write,
    path: &str,
    result: &IntakeResult,
    transport: &Transport,
    cols: usize,
    opts: &RenderOptions,
) -> Result<(), anyhow::Error> {
    execute!(out, cursor::MoveTo(0, 0), Clear(ClearType::All))?;

    let bpm = result
        .analysis
        .bpm
        .map(|b| b.to_string())
        .unwrap_or_else(|| "--".to_string());
    let state = if transport.is_playing() { "▶" } else { "⏸" };
    writeln!(out, "{path}  |  bpm: {bpm}\r")?;
    if let Some(notice) = result.notice {
        writeln!(out, "note: {}\r", notice.message())?;
    }
    writeln!(out, "\r")?;

    let cursor = transport.cursor();
    for row in render_rows(&result.envelope, &cursor, cols, WAVE_HEIGHT, opts) {
        writeln!(out, "{row}\r")?;
    }

    writeln!(
        out,
        "\r\n{state}  {} / {}   [space] play/pause  [←/→] seek  [↑/↓] volume  [click] scrub  [q] quit\r",
        format_time(cursor.current_time),
        format_time(cursor.duration),
    )?;
    out.flush()?;
    Ok(())
}
