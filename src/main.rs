use std::env;
use std::fs;
use std::path::Path;
use std::process;

use accomp::playback::{
    create_playable_sequence_with, parse_chord, voice_chord, AudioEngine, OfflineBackend,
    PlaybackEvent, PlaybackScheduler,
};
use accomp::{import_progression, EngineConfig};

const USAGE: &[&str] = &[
    "Usage: accomp [--config FILE] <progression.json> [output.json]",
    "       accomp [--config FILE] --schedule [LOOPS] <progression.json>",
    "       accomp --transpose SEMITONES <progression.json> [output.json]",
    "       accomp --chord SYMBOL",
];

fn usage() -> ! {
    for line in USAGE {
        eprintln!("{}", line);
    }
    process::exit(1);
}

fn read_file(path: &str) -> String {
    match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path, e);
            process::exit(1);
        }
    }
}

fn write_output(output_path: Option<&String>, content: &str, what: &str) {
    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(path, content) {
                eprintln!("Error writing to '{}': {}", path, e);
                process::exit(1);
            }
            eprintln!("Wrote {} to {}", what, path);
        }
        None => {
            println!("{}", content);
        }
    }
}

fn print_chord(symbol: &str, config: &EngineConfig) {
    let Some(chord) = parse_chord(symbol) else {
        eprintln!("Cannot parse chord '{}'", symbol);
        process::exit(1);
    };
    let voicing: Vec<String> = voice_chord(&chord, config.arrangement.piano_lowest_octave)
        .iter()
        .map(|pitch| pitch.to_string())
        .collect();
    println!("{}: {}", symbol, chord.names().join(" "));
    println!("voicing: {}", voicing.join(" "));
}

fn transpose(semitones: &str, input_path: &str, output_path: Option<&String>) {
    let semitones: i32 = match semitones.parse() {
        Ok(n) => n,
        Err(_) => {
            eprintln!("Semitones must be an integer, got '{}'", semitones);
            process::exit(1);
        }
    };
    match accomp::transpose_file(&read_file(input_path), semitones) {
        Ok(json) => write_output(output_path, &json, "transposed progression"),
        Err(e) => {
            eprintln!("Transposition error: {}", e);
            process::exit(1);
        }
    }
}

/// Dry-run playback against the offline backend and print the timeline.
fn schedule(loops: Option<&String>, input_path: &str, config: &EngineConfig) {
    let loop_count = match loops {
        None => config.loop_count,
        Some(loops) => match loops.parse::<u32>() {
            Ok(n) => n,
            Err(_) => {
                eprintln!("Loop count must be a positive integer, got '{}'", loops);
                process::exit(1);
            }
        },
    };
    let outcome = match import_progression(&read_file(input_path)) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Import error: {}", e);
            process::exit(1);
        }
    };
    let sequence = create_playable_sequence_with(&outcome.progression, &config.arrangement);

    let mut engine = AudioEngine::new();
    engine.set_master_volume(config.master_volume);
    let mut scheduler = PlaybackScheduler::new(config.scheduler);
    if let Err(e) = engine.init(|| Ok(OfflineBackend::new())) {
        eprintln!("Audio error: {}", e);
        process::exit(1);
    }
    if let Err(e) = scheduler.play(&mut engine, &sequence, loop_count) {
        eprintln!("Playback error: {}", e);
        process::exit(1);
    }

    let Some(backend) = engine.backend() else {
        eprintln!("Playback error: audio backend missing");
        process::exit(1);
    };
    let mut triggers: Vec<_> = backend.triggers().to_vec();
    triggers.sort_by(|a, b| a.at.total_cmp(&b.at));
    for trigger in &triggers {
        let pitch = trigger.pitch.map(|p| p.to_string()).unwrap_or_default();
        println!("{:>9.3}  {:<10} {}", trigger.at, trigger.instrument, pitch);
    }

    while let Some(due) = scheduler.next_due() {
        for event in scheduler.poll(due) {
            match event {
                PlaybackEvent::MeasureChanged { index } => {
                    println!("{:>9.3}  measure {}", due, index + 1)
                }
                PlaybackEvent::Finished => println!("{:>9.3}  finished", due),
            }
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let mut rest: &[String] = args.get(1..).unwrap_or_default();

    let mut config = EngineConfig::default();
    if rest.first().map(String::as_str) == Some("--config") {
        let Some(path) = rest.get(1) else { usage() };
        config = match EngineConfig::load(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}", e);
                process::exit(1);
            }
        };
        rest = &rest[2..];
    }

    match rest {
        [flag, symbol] if flag == "--chord" => print_chord(symbol, &config),
        [flag, semitones, input, output @ ..] if flag == "--transpose" && output.len() <= 1 => {
            transpose(semitones, input, output.first())
        }
        [flag, loops, input] if flag == "--schedule" => schedule(Some(loops), input, &config),
        [flag, input] if flag == "--schedule" => schedule(None, input, &config),
        [input, output @ ..] if !input.starts_with("--") && output.len() <= 1 => {
            match accomp::arrange_with(&read_file(input), &config) {
                Ok(json) => write_output(output.first(), &json, "playable sequence"),
                Err(e) => {
                    eprintln!("Arrangement error: {}", e);
                    process::exit(1);
                }
            }
        }
        _ => usage(),
    }
}
