//! Walks through one effect session against simulated hardware
//!
//! Run with: cargo run --package mixfx_core --example session_demo

use std::sync::Arc;
use std::time::Duration;

use mixfx_core::{
    ChainConfig, EffectBackend, EffectChain, JsonFileStore, MemoryBackend, SpectrumCapture,
    PRESETS,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mixfx=debug,info")),
        )
        .init();

    println!("=== mixfx Session Demo ===\n");

    let settings_dir = tempfile::tempdir()?;
    let settings_path = settings_dir.path().join("settings.json");

    let device = MemoryBackend::default();
    let backend: Arc<dyn EffectBackend> = Arc::new(device.clone());
    let config = ChainConfig::default();

    // 1. Attach
    println!("1. Attaching effect chain...");
    let mut chain = EffectChain::new(
        Arc::clone(&backend),
        Box::new(JsonFileStore::open(&settings_path)?),
        config.clone(),
    )?;
    chain.attach();
    println!("   ✓ Available: {:?}", chain.available_effects());
    println!("   ✓ {} bands, range {:?}", chain.band_count(), chain.band_level_range());

    // 2. Presets
    println!("\n2. Applying presets with auto-headroom...");
    chain.set_auto_headroom(true);
    for (name, _) in PRESETS.iter() {
        chain.apply_preset(name);
        println!(
            "   {:<10} {:?}  pre-gain {:+.1} dB",
            name,
            chain.band_levels(),
            chain.preamp_db()
        );
    }

    // 3. Other modules
    println!("\n3. Tuning the rest of the chain...");
    chain.set_bass_strength(400);
    chain.set_virtualizer_strength(250);
    chain.set_loudness_gain_mb(600);
    chain.set_limiter_post_gain_db(2.0);
    println!(
        "   ✓ bass {}, virtualizer {}, loudness {} mB, post-gain {:+.1} dB",
        chain.bass_strength(),
        chain.virtualizer_strength(),
        chain.loudness_gain_mb(),
        chain.limiter_post_gain_db()
    );

    // 4. Spectrum
    println!("\n4. Capturing spectrum frames...");
    let capture = SpectrumCapture::new(Arc::clone(&backend), &config)?;
    capture.start(|frame| {
        println!(
            "   frame #{:<3} {} bins, peak {:.1}",
            frame.sequence,
            frame.len(),
            frame.peak()
        );
    });

    for step in 0..5i32 {
        let fft: Vec<u8> = (0..32).map(|i| ((i * step) % 128) as u8).collect();
        device.emit_fft(&fft);
        std::thread::sleep(Duration::from_millis(20));
    }
    capture.stop();
    println!(
        "   ✓ delivered {}, dropped {}",
        capture.frames_delivered(),
        capture.frames_dropped()
    );

    // 5. Routes and teardown
    println!("\n5. Output routes:\n{}", chain.output_routes());
    chain.detach();
    println!("\n✓ Settings written to {}", settings_path.display());
    println!("{}", std::fs::read_to_string(&settings_path)?);

    Ok(())
}
