use super::*;
use crate::error::AccompError;
use crate::progression::{ChordProgression, Measure};

fn measure(chords: &[&str]) -> Measure {
    Measure::new(chords.len() as u32, 4, chords.iter().map(|c| c.to_string()).collect()).unwrap()
}

fn c_to_g7() -> ChordProgression {
    ChordProgression::new(
        "C to G7",
        120.0,
        vec![measure(&["C", "", "", ""]), measure(&["G7", "", "", ""])],
    )
    .unwrap()
}

fn ready_engine() -> AudioEngine<OfflineBackend> {
    let mut engine = AudioEngine::new();
    engine.init(|| Ok(OfflineBackend::new())).unwrap();
    engine
}

fn pitch_names(track: &Track) -> Vec<String> {
    track
        .notes
        .iter()
        .filter_map(|note| note.pitch.map(|p| p.to_string()))
        .collect()
}

#[test]
fn test_arrangement_c_to_g7() {
    let sequence = create_playable_sequence(&c_to_g7());
    let main = &sequence.main_loop_data;

    assert_eq!(main.tempo, 120.0);
    assert_eq!(main.duration, 4.0);
    let timings: Vec<(usize, f64)> = main.measure_timings.iter().map(|t| (t.index, t.start_time)).collect();
    assert_eq!(timings, vec![(0, 0.0), (1, 2.0)]);

    let count_in = sequence.count_in_data.as_ref().unwrap();
    assert_eq!(count_in.duration, 2.0);
    assert_eq!(count_in.tracks[0].notes.len(), 4);

    let bass = main.track(Instrument::Bass).unwrap();
    let first_run: Vec<f64> = bass.notes[..4].iter().map(|n| n.start_time).collect();
    assert_eq!(first_run, vec![0.0, 0.5, 1.0, 1.5]);
    assert_eq!(pitch_names(bass)[..4], ["C2", "E2", "G2", "G2"]);

    let piano = main.track(Instrument::Piano).unwrap();
    assert_eq!(pitch_names(piano), vec!["C3", "E3", "G3", "G3", "B3", "D4", "F4"]);
    assert_eq!(piano.notes[3].start_time, 2.0);

    assert_eq!(main.track(Instrument::HiHat).unwrap().notes.len(), 8);
    assert_eq!(main.track(Instrument::BassDrum).unwrap().notes.len(), 2);
    assert_eq!(main.track(Instrument::SnareDrum).unwrap().notes.len(), 2);
    assert_eq!(main.track(Instrument::Cymbal).unwrap().notes.len(), 4);
    assert_eq!(main.note_count(), 31);
}

#[test]
fn test_arrangement_four_bar_snare_fill() {
    let progression = ChordProgression::new(
        "Fill",
        90.0,
        vec![
            measure(&["C", "", "", ""]),
            measure(&["Am", "", "", ""]),
            measure(&["F", "", "", ""]),
            measure(&["G", "", "", ""]),
        ],
    )
    .unwrap();
    let sequence = create_playable_sequence(&progression);
    let snare = sequence.main_loop_data.track(Instrument::SnareDrum).unwrap();
    assert_eq!(snare.notes.len(), 5);
    let beat = 60.0 / 90.0;
    assert!((snare.notes[3].start_time - 15.0 * beat).abs() < 1e-9);
    assert!((snare.notes[4].duration - beat / 3.0).abs() < 1e-9);
}

#[test]
fn test_arrangement_survives_garbage_chords() {
    let progression = ChordProgression::new(
        "Garbage",
        100.0,
        vec![measure(&["Q7", "", "Cfoo", ""]), measure(&["", "D/Z", "", ""])],
    )
    .unwrap();
    let sequence = create_playable_sequence(&progression);
    let main = &sequence.main_loop_data;
    assert!(main.track(Instrument::Piano).unwrap().notes.is_empty());
    assert!(main.track(Instrument::Bass).unwrap().notes.is_empty());
    assert_eq!(main.track(Instrument::HiHat).unwrap().notes.len(), 8);
}

#[test]
fn test_play_schedules_absolute_times() {
    let sequence = create_playable_sequence(&c_to_g7());
    let mut engine = ready_engine();
    engine.backend_mut().unwrap().set_time(10.0);
    let mut scheduler = PlaybackScheduler::default();

    scheduler.play(&mut engine, &sequence, 2).unwrap();
    assert!(scheduler.is_playing());
    assert_eq!(scheduler.current_measure_index(), None);
    assert_eq!(scheduler.active_voice_count(), 4 + 31 * 2);

    let triggers = engine.backend().unwrap().triggers();
    let clicks: Vec<f64> = triggers
        .iter()
        .filter(|t| t.instrument == Instrument::CountIn)
        .map(|t| t.at)
        .collect();
    assert_eq!(clicks.len(), 4);
    assert!((clicks[0] - 10.1).abs() < 1e-9);
    assert!((clicks[3] - 11.6).abs() < 1e-9);

    let kicks: Vec<f64> = triggers
        .iter()
        .filter(|t| t.instrument == Instrument::BassDrum)
        .map(|t| t.at)
        .collect();
    let expected = [12.1, 14.1, 16.1, 18.1];
    assert_eq!(kicks.len(), expected.len());
    for (actual, expected) in kicks.iter().zip(expected) {
        assert!((actual - expected).abs() < 1e-9, "{} != {}", actual, expected);
    }
}

#[test]
fn test_poll_reports_measures_then_finish() {
    let sequence = create_playable_sequence(&c_to_g7());
    let mut engine = ready_engine();
    let mut scheduler = PlaybackScheduler::default();
    scheduler.play(&mut engine, &sequence, 2).unwrap();

    // Measure cues at 2.1, 4.1, 6.1, 8.1; finish at 0.1 + 10 + 0.2
    assert_eq!(scheduler.pending_cue_count(), 5);
    assert!(scheduler.poll(2.0).is_empty());
    assert_eq!(scheduler.poll(2.2), vec![PlaybackEvent::MeasureChanged { index: 0 }]);
    assert_eq!(scheduler.current_measure_index(), Some(0));

    assert_eq!(
        scheduler.poll(6.5),
        vec![
            PlaybackEvent::MeasureChanged { index: 1 },
            PlaybackEvent::MeasureChanged { index: 0 },
        ]
    );
    assert_eq!(scheduler.poll(8.2), vec![PlaybackEvent::MeasureChanged { index: 1 }]);
    assert!(scheduler.poll(10.25).is_empty());
    assert!(scheduler.is_playing());

    assert_eq!(scheduler.poll(10.35), vec![PlaybackEvent::Finished]);
    assert!(!scheduler.is_playing());
    assert_eq!(scheduler.current_measure_index(), None);
    assert_eq!(scheduler.next_due(), None);
}

#[test]
fn test_play_twice_leaves_one_active_set() {
    let sequence = create_playable_sequence(&c_to_g7());
    let mut engine = ready_engine();
    let mut scheduler = PlaybackScheduler::default();

    scheduler.play(&mut engine, &sequence, 1).unwrap();
    scheduler.play(&mut engine, &sequence, 1).unwrap();

    let backend = engine.backend().unwrap();
    assert_eq!(backend.triggers().len(), 35 * 2);
    assert!(backend.triggers()[..35].iter().all(|t| t.is_cancelled()));
    assert_eq!(backend.active_triggers().count(), 35);
    assert_eq!(scheduler.active_voice_count(), 35);
    // One measure cue per measure plus the finish cue
    assert_eq!(scheduler.pending_cue_count(), 3);
}

#[test]
fn test_stop_cancels_everything() {
    let sequence = create_playable_sequence(&c_to_g7());
    let mut engine = ready_engine();
    let mut scheduler = PlaybackScheduler::default();
    scheduler.play(&mut engine, &sequence, 3).unwrap();
    scheduler.poll(2.2);

    scheduler.stop();
    assert!(!scheduler.is_playing());
    assert_eq!(scheduler.current_measure_index(), None);
    assert_eq!(scheduler.active_voice_count(), 0);
    assert_eq!(scheduler.pending_cue_count(), 0);
    assert_eq!(engine.backend().unwrap().active_triggers().count(), 0);
    assert!(scheduler.poll(100.0).is_empty());

    // Re-entrant
    scheduler.stop();
    assert!(!scheduler.is_playing());
}

#[test]
fn test_stop_after_completion_is_noop() {
    let sequence = create_playable_sequence(&c_to_g7());
    let mut engine = ready_engine();
    let mut scheduler = PlaybackScheduler::default();
    scheduler.play(&mut engine, &sequence, 1).unwrap();
    assert_eq!(scheduler.poll(60.0).last(), Some(&PlaybackEvent::Finished));

    scheduler.stop();
    assert!(!scheduler.is_playing());
    // Played-out voices are left alone
    assert_eq!(engine.backend().unwrap().active_triggers().count(), 35);
}

#[test]
fn test_play_requires_ready_audio() {
    let sequence = create_playable_sequence(&c_to_g7());
    let mut engine: AudioEngine<OfflineBackend> = AudioEngine::new();
    let mut scheduler = PlaybackScheduler::default();

    assert_eq!(scheduler.play(&mut engine, &sequence, 1), Err(AccompError::AudioNotReady));
    assert!(!scheduler.is_playing());
    assert_eq!(scheduler.active_voice_count(), 0);
    assert_eq!(scheduler.pending_cue_count(), 0);
}

#[test]
fn test_play_after_dispose_stops_previous_playback() {
    let sequence = create_playable_sequence(&c_to_g7());
    let mut engine = ready_engine();
    let mut scheduler = PlaybackScheduler::default();
    scheduler.play(&mut engine, &sequence, 1).unwrap();

    engine.dispose();
    assert_eq!(scheduler.play(&mut engine, &sequence, 1), Err(AccompError::AudioNotReady));
    assert!(!scheduler.is_playing());
    assert_eq!(scheduler.active_voice_count(), 0);
}

#[test]
fn test_zero_loops_rejected() {
    let sequence = create_playable_sequence(&c_to_g7());
    let mut engine = ready_engine();
    let mut scheduler = PlaybackScheduler::default();
    assert_eq!(scheduler.play(&mut engine, &sequence, 0), Err(AccompError::InvalidLoopCount));
    assert!(engine.backend().unwrap().triggers().is_empty());
}

#[test]
fn test_missing_sound_source_is_skipped() {
    let sequence = create_playable_sequence(&c_to_g7());
    let mut engine = AudioEngine::new();
    engine
        .init(|| Ok(OfflineBackend::new().without_instrument(Instrument::Cymbal)))
        .unwrap();
    let mut scheduler = PlaybackScheduler::default();
    scheduler.play(&mut engine, &sequence, 1).unwrap();
    assert_eq!(scheduler.active_voice_count(), 35 - 4);
}

#[test]
fn test_negative_lead_in_starts_immediately() {
    let progression = c_to_g7();
    let options = ArrangementOptions { count_in: false, ..Default::default() };
    let sequence = create_playable_sequence_with(&progression, &options);
    let mut engine = ready_engine();
    engine.backend_mut().unwrap().set_time(5.0);
    let mut scheduler = PlaybackScheduler::new(SchedulerOptions {
        lead_in: -1.0,
        completion_grace: DEFAULT_COMPLETION_GRACE,
    });
    scheduler.play(&mut engine, &sequence, 1).unwrap();
    assert_eq!(scheduler.next_due(), Some(5.0));
    assert_eq!(scheduler.poll(5.0), vec![PlaybackEvent::MeasureChanged { index: 0 }]);
    let earliest = engine
        .backend()
        .unwrap()
        .triggers()
        .iter()
        .map(|t| t.at)
        .fold(f64::MAX, f64::min);
    assert_eq!(earliest, 5.0);
}

#[test]
fn test_long_lead_in_finishes_after_last_note() {
    let sequence = create_playable_sequence(&c_to_g7());
    let mut engine = ready_engine();
    let mut scheduler = PlaybackScheduler::new(SchedulerOptions {
        lead_in: 3.0,
        completion_grace: 0.2,
    });
    scheduler.play(&mut engine, &sequence, 1).unwrap();

    let last_note = engine
        .backend()
        .unwrap()
        .triggers()
        .iter()
        .map(|t| t.at)
        .fold(f64::MIN, f64::max);
    assert_eq!(last_note, 8.5);

    // Count-in runs 3.0..5.0, measures start at 5.0 and 7.0, finish at 9.2
    assert_eq!(scheduler.poll(6.5), vec![PlaybackEvent::MeasureChanged { index: 0 }]);
    assert!(scheduler.is_playing());
    assert_eq!(scheduler.poll(7.5), vec![PlaybackEvent::MeasureChanged { index: 1 }]);
    assert_eq!(scheduler.current_measure_index(), Some(1));
    assert!(scheduler.poll(9.1).is_empty());
    assert!(scheduler.is_playing());
    assert_eq!(scheduler.poll(9.3), vec![PlaybackEvent::Finished]);
    assert_eq!(scheduler.current_measure_index(), None);
    assert_eq!(scheduler.pending_cue_count(), 0);
}

#[test]
fn test_stop_during_long_lead_in_cancels_pending_notes() {
    let sequence = create_playable_sequence(&c_to_g7());
    let mut engine = ready_engine();
    let mut scheduler = PlaybackScheduler::new(SchedulerOptions {
        lead_in: 3.0,
        completion_grace: 0.2,
    });
    scheduler.play(&mut engine, &sequence, 1).unwrap();
    scheduler.poll(6.5);

    scheduler.stop();
    assert_eq!(engine.backend().unwrap().active_triggers().count(), 0);
    assert!(scheduler.poll(20.0).is_empty());
    assert_eq!(scheduler.current_measure_index(), None);
}

#[test]
fn test_notes_start_inside_their_section() {
    let progression = ChordProgression::new(
        "Mixed Meters",
        137.0,
        vec![
            Measure::new(3, 4, vec!["".into(), "Xyz".into(), "C".into()]).unwrap(),
            measure(&["Am7", "", "Q", ""]),
            measure(&["F", "", "", "G7(b9)", ""]),
            Measure::new(6, 8, ["C/E", "", "", "D/Z", "", ""].iter().map(|c| c.to_string()).collect())
                .unwrap(),
        ],
    )
    .unwrap();
    let sequence = create_playable_sequence(&progression);

    let main = &sequence.main_loop_data;
    let count_in = sequence.count_in_data.as_ref().unwrap();
    for section in [main, count_in] {
        assert!(section.note_count() > 0);
        for track in &section.tracks {
            for note in &track.notes {
                assert!(
                    note.start_time >= 0.0 && note.start_time < section.duration,
                    "{} note at {} outside 0..{}",
                    track.instrument,
                    note.start_time,
                    section.duration
                );
            }
        }
    }

    // Measure 4 is in an even meter, so its last beat is the snare fill
    assert_eq!(main.track(Instrument::SnareDrum).unwrap().notes.len(), 5);
    // Bass plays every beat except the leading rest and the Xyz, Q and D/Z runs
    let beat = 60.0 / 137.0;
    let bass = main.track(Instrument::Bass).unwrap();
    assert_eq!(bass.notes.len(), 18 - 1 - 1 - 2 - 3);
    assert!((bass.notes[0].start_time - 2.0 * beat).abs() < 1e-9);
}

#[test]
fn test_empty_progression_finishes_after_grace() {
    let progression = ChordProgression::new("Empty", 120.0, Vec::new()).unwrap();
    let sequence = create_playable_sequence(&progression);
    let mut engine = ready_engine();
    let mut scheduler = PlaybackScheduler::default();
    scheduler.play(&mut engine, &sequence, 4).unwrap();
    assert_eq!(scheduler.active_voice_count(), 0);
    assert_eq!(scheduler.pending_cue_count(), 1);
    assert!(scheduler.poll(0.25).is_empty());
    assert_eq!(scheduler.poll(0.35), vec![PlaybackEvent::Finished]);
}
