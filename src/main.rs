use anyhow::{anyhow, Context};
use log::info;
use pixel_dreamcast_rust::*;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use pixel_dreamcast_rust::hw::headless::HeadlessMachine;

/// Options de la ligne de commande
struct Options {
    config: Option<PathBuf>,
    bios_dir: PathBuf,
    frames: u32,
    threaded: bool,
    scan: bool,
    content: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Options> {
    let args: Vec<String> = env::args().collect();
    let mut options = Options {
        config: None,
        bios_dir: PathBuf::from("./data"),
        frames: 60,
        threaded: false,
        scan: false,
        content: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                options.config = Some(PathBuf::from(&args[i + 1]));
                i += 1;
            }
            "--bios-dir" if i + 1 < args.len() => {
                options.bios_dir = PathBuf::from(&args[i + 1]);
                i += 1;
            }
            "--frames" if i + 1 < args.len() => {
                options.frames = args[i + 1]
                    .parse()
                    .with_context(|| format!("nombre d'images invalide: {}", args[i + 1]))?;
                i += 1;
            }
            "--threaded" => options.threaded = true,
            "--scan" => options.scan = true,
            arg if arg.starts_with("--") => return Err(anyhow!("option inconnue: {}", arg)),
            arg => options.content = Some(PathBuf::from(arg)),
        }
        i += 1;
    }
    Ok(options)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let options = parse_args()?;

    println!("🎮 Pixel Dreamcast v{}", VERSION);
    println!("================================");

    let store = Arc::new(match &options.config {
        Some(path) => SettingsStore::with_file(path),
        None => SettingsStore::new(),
    });
    store.load(false)?;
    let table = Arc::new(ArcadeRomTable::new());

    if options.scan {
        let scanner = GameScanner::new(store.clone(), table);
        scanner.fetch_game_list();
        scanner.wait();
        if scanner.content_path_looks_incorrect() {
            println!("⚠️  Aucun jeu trouvé : vérifiez les répertoires de contenu");
        }
        for game in scanner.game_list().iter() {
            println!("  {} -> {}", game.name, game.path.display());
        }
        return Ok(());
    }

    if options.threaded {
        store.config_mut().threaded_rendering.set(true);
    }

    let hardware = HeadlessMachine::new(&options.bios_dir, table);
    let events = Arc::new(EventBus::new());
    let emu = Emulator::new(hardware.machine(), store.clone(), events);
    hardware.set_vblank_hook(emu.vblank_hook());

    emu.load_game(options.content.as_deref(), None)
        .context("chargement du contenu impossible")?;
    let settings = store.settings().clone();
    info!(
        "Contenu chargé: {} [{}]",
        settings.platform.map(|p| p.system.name()).unwrap_or("?"),
        settings.content.game_id
    );

    emu.start()?;
    let mut frames = 0;
    let mut timeouts = 0;
    while frames < options.frames {
        if emu.render()? {
            frames += 1;
        } else if emu.is_running() {
            timeouts += 1;
        } else {
            break;
        }
    }
    emu.stop();
    emu.unload_game();
    emu.term();

    println!("✅ {} image(s) rendue(s), {} hors délai", frames, timeouts);
    println!("   - Cycles SH4: {}", hardware.clock.now());
    println!("   - Images présentées: {}", hardware.rasterizer.frame_count());
    Ok(())
}
