use std::path::PathBuf;
use std::time::Instant;

use espeak_bridge::{
    engines::espeak::EspeakEngine, Bridge, BridgeConfig, Parameter, SynthesisResult,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    espeak_bridge::logging::init();

    let data_path = std::env::args().nth(1);
    let bridge: Bridge<EspeakEngine> =
        Bridge::with_config(EspeakEngine::new(), BridgeConfig::default());

    let init_start = Instant::now();
    let handle = bridge.create((), data_path.as_deref())?;
    println!(
        "eSpeak {} initialized in {:.2?}",
        bridge.version().trim(),
        init_start.elapsed()
    );

    let voices = bridge.available_voices();
    println!("{} voices available", voices.len());
    for voice in voices.iter().take(5) {
        let gender = voice
            .gender()
            .map_or_else(|| voice.gender.to_string(), |g| format!("{g:?}"));
        println!(
            "  {:<10} {:<20} gender={} age={}",
            voice.language, voice.identifier, gender, voice.age
        );
    }

    bridge.set_voice_by_name("en")?;
    bridge.set_parameter(Parameter::Rate, 160)?;

    let text = "Hello! This is eSpeak, speaking through the native bridge. \
                Audio arrives in chunks while the synthesis call is running.";

    let mut result = SynthesisResult::new(bridge.sample_rate(handle)? as u32);
    let synth_start = Instant::now();
    bridge.synthesize(handle, text, false, &mut result)?;
    let synth_dur = synth_start.elapsed();

    println!(
        "Synthesized {:.2}s audio in {} chunks, {:.2?} ({:.1}x real-time)",
        result.duration_secs(),
        result.chunks,
        synth_dur,
        result.duration_secs() / synth_dur.as_secs_f64()
    );

    result.write_wav(&PathBuf::from("output.wav"))?;
    println!("Saved to output.wav");

    bridge.destroy(handle)?;
    Ok(())
}
