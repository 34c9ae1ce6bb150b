//! Coordinateur du cycle de vie de la machine
//!
//! Orchestre le démarrage, le chargement d'un contenu, l'exécution, l'arrêt,
//! la réinitialisation et le déchargement. Les sous-systèmes matériels ne
//! sont vus qu'au travers des capacités de [`Machine`].
//!
//! ```text
//! Uninitialized --init--> Init --load_game--> Loaded --start--> Running
//!                          ^                    ^                  |
//!                          +---unload_game------+------stop--------+
//! ```

mod frame;

pub use frame::FRAME_TIMEOUT_CYCLES;

use crossbeam::atomic::AtomicCell;
use log::{debug, error, info, warn};
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;

use crate::bios::IpMeta;
use crate::config::{RenderType, SettingsStore};
use crate::error::{EmulatorError, Result};
use crate::events::{Event, EventBus};
use crate::hw::{LoadProgress, Machine, Sh4Executor, StateSlot};
use crate::overrides;
use crate::platform::{classify_content, file_extension, Platform, PlatformProfile};

/// Étirement horizontal appliqué par la triche écran large (4:3 -> 16:9)
const WIDESCREEN_STRETCHING: i32 = 134;

/// État du coordinateur
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmuState {
    Uninitialized,
    Init,
    Loaded,
    Running,
    Error,
    Terminated,
}

/// Coordinateur, partagé entre le thread hôte et le thread d'émulation
pub struct Emulator {
    this: Weak<Emulator>,
    machine: Machine,
    store: Arc<SettingsStore>,
    events: Arc<EventBus>,
    state: AtomicCell<EmuState>,
    /// Cœur SH4 sélectionné
    cpu: RwLock<Arc<dyn Sh4Executor>>,
    /// Mode de rendu retenu au dernier `start`
    threaded: AtomicBool,
    start_time: AtomicU64,
    render_timeout: AtomicBool,
    single_step: AtomicBool,
    step_range: Mutex<Option<(u32, u32)>>,
    reset_requested: AtomicBool,
    stop_requested: AtomicBool,
    emu_thread: Mutex<Option<JoinHandle<Result<()>>>>,
}

impl Emulator {
    pub fn new(machine: Machine, store: Arc<SettingsStore>, events: Arc<EventBus>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            cpu: RwLock::new(machine.cpu.interpreter.clone()),
            machine,
            store,
            events,
            state: AtomicCell::new(EmuState::Uninitialized),
            threaded: AtomicBool::new(false),
            start_time: AtomicU64::new(0),
            render_timeout: AtomicBool::new(false),
            single_step: AtomicBool::new(false),
            step_range: Mutex::new(None),
            reset_requested: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            emu_thread: Mutex::new(None),
        })
    }

    pub fn state(&self) -> EmuState {
        self.state.load()
    }

    pub fn is_running(&self) -> bool {
        self.state() == EmuState::Running
    }

    pub fn settings_store(&self) -> &Arc<SettingsStore> {
        &self.store
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    fn set_state(&self, state: EmuState) {
        let previous = self.state.swap(state);
        if previous != state {
            debug!("État: {:?} -> {:?}", previous, state);
        }
    }

    fn cpu(&self) -> Arc<dyn Sh4Executor> {
        self.cpu.read().clone()
    }

    /// Signal vsync à confier au CPU ou au PowerVR
    ///
    /// Ne retient qu'une référence faible : le signal devient inerte une
    /// fois le coordinateur libéré.
    pub fn vblank_hook(&self) -> Arc<dyn Fn() + Send + Sync> {
        let this = self.this.clone();
        Arc::new(move || {
            if let Some(emu) = this.upgrade() {
                emu.vblank();
            }
        })
    }

    /// Initialise les sous-systèmes matériels
    ///
    /// Sans effet si la machine est déjà initialisée.
    pub fn init(&self) -> Result<()> {
        match self.state() {
            EmuState::Uninitialized => {}
            EmuState::Init => return Ok(()),
            state => {
                return Err(EmulatorError::Runtime(format!(
                    "initialisation impossible dans l'état {:?}",
                    state
                )))
            }
        }

        self.set_platform(Platform::Dreamcast);

        self.machine.rasterizer.init()?;
        self.machine.sound.init()?;
        self.machine.sound.arm_init();
        self.machine.memory.init()?;
        self.machine.bios.init_hle()?;

        // Le recompilateur a besoin d'une machine complète
        let cores = &self.machine.cpu;
        cores.interpreter.init()?;
        if let Some(recompiler) = &cores.recompiler {
            recompiler.init()?;
        }
        let cpu = cores.select(self.store.config().dynarec_enabled.get());
        info!("Cœur SH4: {}", cpu.name());
        *self.cpu.write() = cpu;

        self.set_state(EmuState::Init);
        Ok(())
    }

    /// Programme le profil mémoire de la plateforme
    pub fn set_platform(&self, platform: Platform) {
        let profile = *PlatformProfile::for_platform(platform);
        let previous = self.store.settings_mut().platform.replace(profile);
        if let Some(previous) = previous {
            self.machine.memory.unprotect_vram(0, previous.vram_size);
        }
        self.machine.memory.init_mappings(&profile);
        debug!("Plateforme {}", platform);
    }

    /// Réinitialise la machine ; une réinitialisation à chaud conserve la
    /// surveillance mémoire
    pub fn dc_reset(&self, hard: bool) {
        self.machine.network.handshake_term();
        if hard {
            self.machine.memory.watch_unprotect();
            self.machine.memory.watch_reset();
        }
        self.machine.scheduler.reset(hard);
        self.machine.rasterizer.reset(hard);
        self.machine.sound.reset(hard);
        self.machine.sound.arm_reset();
        self.cpu().reset(true);
        self.machine.memory.reset(hard);
    }

    /// Charge un contenu ; `None` démarre sur le BIOS Dreamcast
    ///
    /// `progress`, s'il est fourni, reçoit l'avancement et le libellé à
    /// afficher. En cas d'échec la machine passe dans l'état `Error` et
    /// reste adressable : l'appelant doit décharger le jeu.
    pub fn load_game(&self, path: Option<&Path>, progress: Option<&LoadProgress>) -> Result<()> {
        self.init()?;
        match self.load_content(path, progress) {
            Ok(()) => {
                self.set_state(EmuState::Loaded);
                Ok(())
            }
            Err(err) => {
                error!("Chargement impossible: {}", err);
                self.set_state(EmuState::Error);
                Err(err)
            }
        }
    }

    fn load_content(&self, path: Option<&Path>, progress: Option<&LoadProgress>) -> Result<()> {
        debug!(
            "Chargement de {}",
            path.map(|p| p.display().to_string()).unwrap_or_else(|| "(BIOS)".to_string())
        );
        self.store.settings_mut().content.path = path.map(Path::to_path_buf);

        let platform = classify_content(path, &self.machine)?;
        self.set_platform(platform);
        self.machine.memory.map_default();

        self.store.reset();
        self.store.load(false)?;
        self.dc_reset(true);
        self.store.settings_mut().network.md5 = [0; 16];

        if platform.is_naomi2() && self.store.config().renderer_type.get() == RenderType::DirectX9 {
            return Err(EmulatorError::RendererIncompatible(
                "DirectX 9 ne supporte pas les jeux NAOMI 2, choisissez une autre API graphique"
                    .to_string(),
            ));
        }

        let profile = *PlatformProfile::for_platform(platform);
        if platform.is_console() {
            self.load_console_content(path, &profile)?;
            if let Some(progress) = progress {
                progress.set_progress(1.0);
            }
        } else {
            let path = path.ok_or_else(|| {
                EmulatorError::Content("aucune ROM arcade fournie".to_string())
            })?;
            if !self.machine.bios.load_rom_files(&profile) {
                warn!("BIOS arcade introuvable, utilisation de celui de la ROM");
            }
            self.machine.cart.load_rom(path, progress)?;
            if let Some(md5) = self.machine.cart.content_md5() {
                self.store.settings_mut().network.md5 = md5;
            }
            self.load_game_specific_settings()?;
            // Une région propre au jeu peut changer le BIOS
            self.machine.cart.load_bios(path)?;
        }

        let jamma_setup = self.store.settings().input.jamma_setup;
        self.machine.maple.destroy_devices();
        self.machine.maple.create_devices(jamma_setup);
        if platform.is_naomi() {
            // L'EEPROM n'est accessible qu'une fois les périphériques créés
            self.machine.cart.configure_eeprom();
        }

        let game_id = self.store.settings().content.game_id.clone();
        self.machine.cheats.reset(&game_id);
        if self.machine.cheats.is_widescreen() {
            info!("Triche écran large activée");
            self.store
                .config_mut()
                .screen_stretching
                .override_with(WIDESCREEN_STRETCHING);
        }

        // Second passage : les réglages par titre peuvent eux-mêmes être surchargés
        self.load_game_specific_settings()?;

        self.machine.network.handshake_init()?;
        self.store.settings_mut().network.fast_forward_mode = false;
        self.auto_load_state();

        self.events.broadcast(Event::Start);
        if let Some(progress) = progress {
            progress.set_label("Démarrage...");
        }
        Ok(())
    }

    fn load_console_content(&self, path: Option<&Path>, profile: &PlatformProfile) -> Result<()> {
        let bios = &self.machine.bios;
        let path = match path {
            Some(p) => p,
            None => {
                if !bios.load_rom_files(profile) {
                    return Err(EmulatorError::BiosMissing(
                        bios.flash_save_path().display().to_string(),
                    ));
                }
                bios.init_drive(None);
                return Ok(());
            }
        };

        if file_extension(path) == "elf" {
            // Les exécutables ELF ne démarrent qu'avec le BIOS HLE
            bios.load_hle();
            return Ok(());
        }

        if !bios.init_drive(Some(path)) {
            warn!("Média illisible, démarrage sur le BIOS");
            self.store.settings_mut().content.path = None;
            if !bios.load_rom_files(profile) {
                return Err(EmulatorError::Content(format!(
                    "ce média ne peut pas être chargé: {}",
                    path.display()
                )));
            }
            bios.init_drive(None);
            return Ok(());
        }

        self.load_game_specific_settings()?;
        let use_reios = self.store.config().use_reios.get();
        if use_reios || !bios.load_rom_files(profile) {
            bios.load_hle();
            info!("BIOS non chargé, utilisation du BIOS HLE");
            let config = self.store.config();
            if !config.use_reios.get() && config.use_reios.is_read_only() {
                warn!("Ce jeu nécessite un BIOS réel");
            }
        }
        Ok(())
    }

    /// Identifie le titre puis applique ses réglages
    ///
    /// Les règles de compatibilité passent avant la section du titre dans
    /// le fichier de configuration ; un titre forcé en Windows CE reçoit
    /// ensuite à nouveau ses surcharges.
    pub fn load_game_specific_settings(&self) -> Result<()> {
        let platform = self
            .store
            .settings()
            .platform
            .map(|p| p.system)
            .unwrap_or(Platform::Dreamcast);

        let (game_id, header) = if platform.is_console() {
            let header = self.machine.bios.disk_id();
            (header.game_id(), header)
        } else {
            (self.machine.cart.game_id(), IpMeta::default())
        };
        self.store.settings_mut().content.game_id = game_id.clone();
        if platform.is_console() && game_id.is_empty() {
            return Ok(());
        }

        {
            let mut config = self.store.config_mut();
            let mut settings = self.store.settings_mut();
            overrides::apply_special_settings(
                &game_id,
                platform,
                &header,
                &mut config,
                &mut settings.input,
            );
        }

        self.store.set_game_id(&game_id);
        self.store.load(true)?;

        let mut config = self.store.config_mut();
        if config.force_windows_ce.get() {
            overrides::apply_windows_ce_settings(&mut config);
        }
        Ok(())
    }

    fn auto_load_state(&self) {
        if self.store.settings().content.path.is_none() {
            return;
        }
        let (ggpo, auto_load, slot) = {
            let config = self.store.config();
            (
                config.ggpo_enable.get(),
                config.auto_load_state.get(),
                config.savestate_slot.get(),
            )
        };
        let slot = if ggpo {
            StateSlot::Rollback
        } else if auto_load && !self.machine.cart.network_supported() {
            StateSlot::Slot(slot)
        } else {
            return;
        };
        if let Err(err) = self.load_state(slot) {
            warn!("Chargement automatique de l'état {:?} impossible: {}", slot, err);
        }
    }

    /// Lance l'exécution
    pub fn start(&self) -> Result<()> {
        match self.state() {
            EmuState::Running => return Ok(()),
            EmuState::Loaded => {}
            state => {
                return Err(EmulatorError::Runtime(format!(
                    "démarrage impossible dans l'état {:?}",
                    state
                )))
            }
        }
        self.set_state(EmuState::Running);
        self.machine.memory.set_memory_handlers();

        let (ggpo, threaded, dynarec) = {
            let config = self.store.config();
            (
                config.ggpo_enable.get(),
                config.threaded_rendering.get(),
                config.dynarec_enabled.get(),
            )
        };
        if ggpo && threaded {
            // Incompatible avec le rollback
            self.store.config_mut().emulate_framebuffer.override_with(false);
        }
        let cpu = self.machine.cpu.select(dynarec);
        info!("Cœur SH4: {}", cpu.name());
        *self.cpu.write() = cpu;

        self.machine.memory.watch_protect();

        self.threaded.store(threaded, Ordering::SeqCst);
        if threaded {
            if let Err(err) = self.spawn_emulation_thread() {
                error!("Démarrage impossible: {}", err);
                self.set_state(EmuState::Loaded);
                return Err(err);
            }
        } else {
            self.stop_requested.store(false, Ordering::SeqCst);
            self.machine.audio.init();
        }

        self.events.broadcast(Event::Resume);
        Ok(())
    }

    /// Arrête l'exécution
    ///
    /// En mode non threadé l'arrêt de l'audio est différé jusqu'à la fin
    /// de l'image en cours (voir `render`).
    pub fn stop(&self) {
        if self.state() != EmuState::Running {
            return;
        }
        if self.store.config().ggpo_enable.get() {
            self.machine.network.handshake_term();
        }
        // Après l'arrêt du rollback, qui peut encore exécuter des images
        self.set_state(EmuState::Loaded);
        self.cpu().stop();

        if self.threaded.load(Ordering::SeqCst) {
            self.machine.rasterizer.cancel_emu_wait();
            self.join_emulation_thread();
            self.save_rom_files();
            self.events.broadcast(Event::Pause);
        } else {
            self.stop_requested.store(true, Ordering::SeqCst);
        }
    }

    /// Demande une réinitialisation à chaud, traitée par la boucle d'exécution
    pub fn request_reset(&self) {
        self.reset_requested.store(true, Ordering::SeqCst);
        if self.store.config().ggpo_enable.get() {
            self.machine.network.handshake_term();
        }
        self.cpu().stop();
    }

    /// Exécute une seule instruction
    pub fn step(&self) -> Result<()> {
        self.single_step.store(true, Ordering::SeqCst);
        self.run_debug_step()
    }

    /// Exécute tant que le compteur programme reste dans `[from, to]`
    pub fn step_range(&self, from: u32, to: u32) -> Result<()> {
        *self.step_range.lock() = Some((from, to));
        self.run_debug_step()
    }

    fn run_debug_step(&self) -> Result<()> {
        self.start()?;
        if !self.threaded.load(Ordering::SeqCst) {
            self.run()?;
        }
        self.stop();
        self.drain_stop_request();
        Ok(())
    }

    /// Décharge le contenu et revient à l'état `Init`
    pub fn unload_game(&self) {
        self.stop();
        self.drain_stop_request();
        self.join_emulation_thread();

        let state = self.state();
        if state != EmuState::Loaded && state != EmuState::Error {
            return;
        }

        let has_content = self.store.settings().content.path.is_some();
        let (auto_save, slot) = {
            let config = self.store.config();
            (config.auto_save_state.get(), config.savestate_slot.get())
        };
        if state == EmuState::Loaded && auto_save && has_content {
            if let Err(err) = self.save_state(StateSlot::Slot(slot)) {
                warn!("Sauvegarde automatique impossible: {}", err);
            }
        }
        self.dc_reset(true);

        self.store.reset();
        if let Err(err) = self.store.load(false) {
            warn!("Rechargement de la configuration impossible: {}", err);
        }
        {
            let mut settings = self.store.settings_mut();
            settings.content.path = None;
            settings.content.game_id.clear();
        }
        self.set_state(EmuState::Init);
        self.events.broadcast(Event::Terminate);
    }

    /// Libère tous les sous-systèmes
    pub fn term(&self) {
        self.unload_game();
        if self.state() != EmuState::Init {
            return;
        }
        self.machine.debugger.term();
        self.cpu().term();
        self.machine.textures.terminate();
        self.machine.bios.term_hle();
        self.machine.sound.term();
        self.machine.rasterizer.term();
        self.machine.memory.term();
        self.machine.memory.release();
        self.set_state(EmuState::Terminated);
    }

    pub fn save_state(&self, slot: StateSlot) -> Result<()> {
        self.machine.states.save(slot)?;
        info!("État sauvegardé ({:?})", slot);
        Ok(())
    }

    /// Restaure un état sauvegardé
    ///
    /// Les caches dépendant du contenu mémoire sont vidés avant la
    /// désérialisation.
    pub fn load_state(&self, slot: StateSlot) -> Result<()> {
        self.machine.textures.terminate();
        self.machine.sound.flush_arm_recompiler();
        self.machine.memory.mmu_flush_table();
        self.machine.memory.block_cache_reset();

        self.machine.states.restore(slot)?;

        self.machine.memory.mmu_set_state();
        self.cpu().reset_cache();
        info!("État restauré ({:?})", slot);
        self.events.broadcast(Event::LoadState);
        Ok(())
    }

    pub fn set_network_state(&self, online: bool) {
        let mut settings = self.store.settings_mut();
        if settings.network.online != online {
            debug!("État réseau: {}", if online { "en ligne" } else { "hors ligne" });
        }
        settings.network.online = online;
        settings.network.fast_forward_mode &= !online;
    }

    fn save_rom_files(&self) {
        if let Err(err) = self.machine.bios.save_rom_files() {
            warn!("Sauvegarde des fichiers ROM impossible: {}", err);
        }
    }

    /// Chemin du contenu chargé
    pub fn content_path(&self) -> Option<PathBuf> {
        self.store.settings().content.path.clone()
    }
}

impl std::fmt::Debug for Emulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emulator")
            .field("state", &self.state())
            .field("machine", &self.machine)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw::headless::HeadlessMachine;
    use crate::rom::ArcadeRomTable;

    /// Test d'un échec de lancement du thread d'émulation
    #[test]
    fn test_start_failure_restores_loaded() -> Result<()> {
        let hw = HeadlessMachine::new(std::env::temp_dir(), Arc::new(ArcadeRomTable::new()));
        let store = Arc::new(SettingsStore::new());
        store.config_mut().threaded_rendering.set(true);
        let events = Arc::new(EventBus::new());
        let resumed = Arc::new(AtomicBool::new(false));
        let flag = resumed.clone();
        events.register(
            Event::Resume,
            Arc::new(move |_: Event| flag.store(true, Ordering::SeqCst)),
        );

        let emu = Emulator::new(hw.machine(), store, events);
        emu.init()?;
        emu.set_state(EmuState::Loaded);
        // Un thread encore attaché empêche d'en lancer un second
        *emu.emu_thread.lock() = Some(std::thread::spawn(|| Ok(())));

        assert!(matches!(emu.start(), Err(EmulatorError::Runtime(_))));
        assert_eq!(emu.state(), EmuState::Loaded);
        assert!(!resumed.load(Ordering::SeqCst));
        Ok(())
    }
}
