//! Machine sans affichage ni son
//!
//! Implémentations en mémoire de toutes les capacités : le CPU fait
//! avancer l'horloge de l'ordonnanceur d'une image à chaque `run`, le BIOS
//! lit ses fichiers dans un répertoire et l'en-tête IP.BIN au début du
//! contenu. Chaque appel notable est consigné dans un `CallLog` partagé.

use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::error::EmulatorError;
use crate::rom::ArcadeRomTable;

/// Cycles SH4 par image à 60Hz (200MHz / 60)
pub const CYCLES_PER_FRAME: u64 = crate::SH4_FREQUENCY / 60;

/// Adresse d'entrée du BIOS
const BOOT_PC: u32 = 0xA000_0000;

/// Journal des appels, partagé par tous les composants
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn record(&self, call: &str) {
        self.calls.lock().push(call.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.as_str() == call).count()
    }

    pub fn contains(&self, call: &str) -> bool {
        self.count(call) > 0
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

/// Horloge de l'ordonnanceur, en cycles SH4
#[derive(Debug, Default)]
pub struct HeadlessScheduler {
    cycles: AtomicU64,
}

impl HeadlessScheduler {
    pub fn advance(&self, cycles: u64) {
        self.cycles.fetch_add(cycles, Ordering::SeqCst);
    }
}

impl Scheduler for HeadlessScheduler {
    fn now(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }

    fn reset(&self, hard: bool) {
        if hard {
            self.cycles.store(0, Ordering::SeqCst);
        }
    }
}

/// Rappel déclenché à chaque retour de balayage vertical
pub type VBlankHook = Arc<dyn Fn() + Send + Sync>;

/// CPU cadencé : chaque `run` émule une image complète
pub struct HeadlessCpu {
    name: &'static str,
    clock: Arc<HeadlessScheduler>,
    log: CallLog,
    pc: AtomicU32,
    running: AtomicBool,
    cycles_per_frame: AtomicU64,
    frame_pacing: RwLock<Option<Duration>>,
    vblank: RwLock<Option<VBlankHook>>,
    pending_fault: Mutex<Option<String>>,
    runs: AtomicU64,
}

impl HeadlessCpu {
    pub fn new(name: &'static str, clock: Arc<HeadlessScheduler>, log: CallLog) -> Self {
        Self {
            name,
            clock,
            log,
            pc: AtomicU32::new(BOOT_PC),
            running: AtomicBool::new(false),
            cycles_per_frame: AtomicU64::new(CYCLES_PER_FRAME),
            frame_pacing: RwLock::new(None),
            vblank: RwLock::new(None),
            pending_fault: Mutex::new(None),
            runs: AtomicU64::new(0),
        }
    }

    pub fn set_vblank_hook(&self, hook: VBlankHook) {
        *self.vblank.write() = Some(hook);
    }

    /// Durée d'une image émulée, pour ne pas saturer un cœur en mode threadé
    pub fn set_frame_pacing(&self, pacing: Option<Duration>) {
        *self.frame_pacing.write() = pacing;
    }

    pub fn set_cycles_per_frame(&self, cycles: u64) {
        self.cycles_per_frame.store(cycles, Ordering::SeqCst);
    }

    pub fn set_pc(&self, pc: u32) {
        self.pc.store(pc, Ordering::SeqCst);
    }

    /// Le prochain `run` échouera avec ce message
    pub fn inject_fault(&self, message: &str) {
        *self.pending_fault.lock() = Some(message.to_string());
    }

    pub fn run_count(&self) -> u64 {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Sh4Executor for HeadlessCpu {
    fn name(&self) -> &'static str {
        self.name
    }

    fn init(&self) -> Result<()> {
        self.log.record("cpu.init");
        Ok(())
    }

    fn run(&self) -> Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.pending_fault.lock().take() {
            return Err(EmulatorError::Runtime(message));
        }
        self.running.store(true, Ordering::SeqCst);

        let cycles = self.cycles_per_frame.load(Ordering::SeqCst);
        self.clock.advance(cycles);
        self.pc.fetch_add((cycles as u32).wrapping_mul(2), Ordering::SeqCst);

        let pacing = *self.frame_pacing.read();
        if let Some(pacing) = pacing {
            std::thread::sleep(pacing);
        }
        let hook = self.vblank.read().clone();
        if let Some(hook) = hook {
            hook();
        }

        // Fin d'image : le rendu arrête le CPU
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn step(&self) -> Result<()> {
        self.clock.advance(1);
        self.pc.fetch_add(2, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.log.record("cpu.stop");
    }

    fn term(&self) {
        self.log.record("cpu.term");
    }

    fn reset(&self, hard: bool) {
        self.pc.store(BOOT_PC, Ordering::SeqCst);
        self.log.record(if hard { "cpu.reset.hard" } else { "cpu.reset.soft" });
    }

    fn reset_cache(&self) {
        self.log.record("cpu.reset_cache");
    }

    fn pc(&self) -> u32 {
        self.pc.load(Ordering::SeqCst)
    }
}

/// Rasteriseur qui compte les images présentées
#[derive(Debug, Default)]
pub struct HeadlessRasterizer {
    log: CallLog,
    frames: AtomicU64,
}

impl HeadlessRasterizer {
    pub fn frame_count(&self) -> u64 {
        self.frames.load(Ordering::SeqCst)
    }
}

impl Rasterizer for HeadlessRasterizer {
    fn init(&self) -> Result<()> {
        self.log.record("pvr.init");
        Ok(())
    }

    fn reset(&self, _hard: bool) {
        self.log.record("pvr.reset");
    }

    fn term(&self) {
        self.log.record("pvr.term");
    }

    fn render_single_frame(&self, _blocking: bool) -> bool {
        self.frames.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn cancel_emu_wait(&self) {
        self.log.record("pvr.cancel_emu_wait");
    }
}

#[derive(Debug, Default)]
pub struct HeadlessSound {
    log: CallLog,
}

impl SoundProcessor for HeadlessSound {
    fn init(&self) -> Result<()> {
        self.log.record("aica.init");
        Ok(())
    }

    fn reset(&self, _hard: bool) {
        self.log.record("aica.reset");
    }

    fn term(&self) {
        self.log.record("aica.term");
    }

    fn arm_init(&self) {
        self.log.record("arm.init");
    }

    fn arm_reset(&self) {
        self.log.record("arm.reset");
    }

    fn flush_arm_recompiler(&self) {
        self.log.record("arm.flush_recompiler");
    }
}

/// Mémoire : conserve le profil mappé et l'état de protection
#[derive(Debug, Default)]
pub struct HeadlessMemory {
    log: CallLog,
    mapped: Mutex<Option<PlatformProfile>>,
    watch_protected: AtomicBool,
}

impl HeadlessMemory {
    pub fn mapped_profile(&self) -> Option<PlatformProfile> {
        *self.mapped.lock()
    }

    pub fn is_watch_protected(&self) -> bool {
        self.watch_protected.load(Ordering::SeqCst)
    }
}

impl MemorySystem for HeadlessMemory {
    fn init(&self) -> Result<()> {
        self.log.record("mem.init");
        Ok(())
    }

    fn reset(&self, hard: bool) {
        self.log.record(if hard { "mem.reset.hard" } else { "mem.reset.soft" });
    }

    fn term(&self) {
        self.log.record("mem.term");
    }

    fn init_mappings(&self, profile: &PlatformProfile) {
        *self.mapped.lock() = Some(*profile);
        self.log.record("vmem.init_mappings");
    }

    fn release(&self) {
        *self.mapped.lock() = None;
        self.log.record("vmem.release");
    }

    fn unprotect_vram(&self, _offset: u32, size: u32) {
        self.log.record(&format!("vmem.unprotect_vram {:#x}", size));
    }

    fn map_default(&self) {
        self.log.record("mem.map_default");
    }

    fn set_memory_handlers(&self) {
        self.log.record("mem.set_handlers");
    }

    fn mmu_flush_table(&self) {
        self.log.record("mmu.flush_table");
    }

    fn mmu_set_state(&self) {
        self.log.record("mmu.set_state");
    }

    fn block_cache_reset(&self) {
        self.log.record("bm.reset");
    }

    fn watch_protect(&self) {
        self.watch_protected.store(true, Ordering::SeqCst);
        self.log.record("memwatch.protect");
    }

    fn watch_unprotect(&self) {
        self.watch_protected.store(false, Ordering::SeqCst);
        self.log.record("memwatch.unprotect");
    }

    fn watch_reset(&self) {
        self.log.record("memwatch.reset");
    }
}

/// Nom du fichier BIOS attendu pour chaque plateforme
fn bios_file(platform: Platform) -> Option<&'static str> {
    match platform {
        Platform::Dreamcast => Some("dc_boot.bin"),
        _ => None,
    }
}

fn flash_file(platform: Platform) -> &'static str {
    match platform {
        Platform::Dreamcast => "dc_flash.bin",
        Platform::Naomi | Platform::Naomi2 => "naomi_nvmem.bin",
        Platform::Atomiswave => "aw_sram.bin",
    }
}

/// BIOS et lecteur GD-ROM adossés à un répertoire
#[derive(Debug)]
pub struct HeadlessBios {
    flash_dir: PathBuf,
    log: CallLog,
    flash: Mutex<Option<(PathBuf, Vec<u8>)>>,
    disc: Mutex<IpMeta>,
    hle_loaded: AtomicBool,
}

impl HeadlessBios {
    pub fn new<P: AsRef<Path>>(flash_dir: P, log: CallLog) -> Self {
        Self {
            flash_dir: flash_dir.as_ref().to_path_buf(),
            log,
            flash: Mutex::new(None),
            disc: Mutex::new(IpMeta::default()),
            hle_loaded: AtomicBool::new(false),
        }
    }

    pub fn is_hle_loaded(&self) -> bool {
        self.hle_loaded.load(Ordering::SeqCst)
    }
}

impl BiosLoader for HeadlessBios {
    fn init_hle(&self) -> Result<()> {
        self.log.record("reios.init");
        Ok(())
    }

    fn term_hle(&self) {
        self.log.record("reios.term");
    }

    fn load_rom_files(&self, profile: &PlatformProfile) -> bool {
        self.log.record("bios.load_rom_files");
        self.hle_loaded.store(false, Ordering::SeqCst);
        if let Some(name) = bios_file(profile.system) {
            let path = self.flash_dir.join(name);
            if !path.is_file() {
                warn!("BIOS introuvable: {}", path.display());
                return false;
            }
        }
        let flash_path = self.flash_dir.join(flash_file(profile.system));
        let mut data = fs::read(&flash_path).unwrap_or_default();
        data.resize(profile.flash_size as usize, 0xFF);
        *self.flash.lock() = Some((flash_path, data));
        true
    }

    fn save_rom_files(&self) -> Result<()> {
        self.log.record("bios.save_rom_files");
        if let Some((path, data)) = self.flash.lock().as_ref() {
            fs::write(path, data).map_err(|e| {
                EmulatorError::Content(format!("écriture de {} impossible: {}", path.display(), e))
            })?;
        }
        Ok(())
    }

    fn load_hle(&self) {
        self.hle_loaded.store(true, Ordering::SeqCst);
        self.log.record("reios.load");
    }

    fn init_drive(&self, path: Option<&Path>) -> bool {
        self.log.record("gdrom.init_drive");
        let path = match path {
            Some(p) => p,
            None => {
                *self.disc.lock() = IpMeta::default();
                return true;
            }
        };
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                warn!("Impossible d'ouvrir {}: {}", path.display(), e);
                return false;
            }
        };
        let meta = IpMeta::parse(&data).filter(IpMeta::is_valid).unwrap_or_default();
        debug!("Disque monté: {} [{}]", path.display(), meta.game_id());
        *self.disc.lock() = meta;
        true
    }

    fn disk_id(&self) -> IpMeta {
        self.disc.lock().clone()
    }

    fn flash_save_path(&self) -> PathBuf {
        self.flash_dir.clone()
    }
}

/// Cartouche arcade : plateforme tirée de la table, nom de jeu de l'en-tête
#[derive(Debug)]
pub struct HeadlessCart {
    table: Arc<ArcadeRomTable>,
    log: CallLog,
    game_id: Mutex<String>,
    md5: Mutex<Option<[u8; 16]>>,
}

impl HeadlessCart {
    pub fn new(table: Arc<ArcadeRomTable>, log: CallLog) -> Self {
        Self {
            table,
            log,
            game_id: Mutex::new(String::new()),
            md5: Mutex::new(None),
        }
    }
}

fn basename(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default()
}

impl ArcadePlatformProbe for HeadlessCart {
    fn platform_of(&self, path: &Path) -> Result<Platform> {
        let name = basename(path);
        self.table
            .find(&name)
            .map(|game| game.platform)
            .ok_or_else(|| EmulatorError::Content(format!("jeu arcade inconnu: {}", name)))
    }
}

impl NaomiCart for HeadlessCart {
    fn load_rom(&self, path: &Path, progress: Option<&LoadProgress>) -> Result<()> {
        self.log.record("naomi.load_rom");
        if let Some(progress) = progress {
            progress.set_label(&format!("Chargement de {}...", basename(path)));
            progress.set_progress(0.0);
            progress.check_cancelled()?;
        }
        let data = fs::read(path)
            .map_err(|e| EmulatorError::Content(format!("{}: {}", path.display(), e)))?;
        if let Some(progress) = progress {
            progress.check_cancelled()?;
            progress.set_progress(1.0);
        }

        // En-tête NAOMI : nom du jeu sur 32 octets à 0x30
        let game_id = if data.len() >= 0x50 && data.starts_with(b"NAOMI") {
            let name: String = data[0x30..0x50].iter().map(|&b| b as char).collect();
            name.trim_end().to_string()
        } else {
            basename(path).to_uppercase()
        };
        info!("ROM arcade chargée: {} [{}]", path.display(), game_id);

        *self.game_id.lock() = game_id;
        *self.md5.lock() = Some(md5::compute(&data).0);
        Ok(())
    }

    fn load_bios(&self, _path: &Path) -> Result<()> {
        self.log.record("naomi.load_bios");
        Ok(())
    }

    fn configure_eeprom(&self) {
        self.log.record("naomi.configure_eeprom");
    }

    fn game_id(&self) -> String {
        self.game_id.lock().clone()
    }

    fn content_md5(&self) -> Option<[u8; 16]> {
        *self.md5.lock()
    }

    fn network_supported(&self) -> bool {
        false
    }
}

#[derive(Debug, Default)]
pub struct HeadlessMaple {
    log: CallLog,
    jamma_setup: Mutex<Option<JammaSetup>>,
}

impl HeadlessMaple {
    pub fn jamma_setup(&self) -> Option<JammaSetup> {
        *self.jamma_setup.lock()
    }
}

impl MapleBus for HeadlessMaple {
    fn destroy_devices(&self) {
        *self.jamma_setup.lock() = None;
        self.log.record("maple.destroy_devices");
    }

    fn create_devices(&self, jamma_setup: JammaSetup) {
        *self.jamma_setup.lock() = Some(jamma_setup);
        self.log.record("maple.create_devices");
    }
}

/// Réseau local : rollback activable, négociation qui peut échouer
#[derive(Debug, Default)]
pub struct HeadlessNetwork {
    log: CallLog,
    rollback: AtomicBool,
    fail_handshake: AtomicBool,
    frames: AtomicUsize,
}

impl HeadlessNetwork {
    pub fn set_rollback_active(&self, active: bool) {
        self.rollback.store(active, Ordering::SeqCst);
    }

    pub fn set_fail_handshake(&self, fail: bool) {
        self.fail_handshake.store(fail, Ordering::SeqCst);
    }

    pub fn rollback_frames(&self) -> usize {
        self.frames.load(Ordering::SeqCst)
    }
}

impl NetworkLayer for HeadlessNetwork {
    fn handshake_init(&self) -> Result<()> {
        self.log.record("net.handshake_init");
        if self.fail_handshake.load(Ordering::SeqCst) {
            return Err(EmulatorError::Network("pair injoignable".to_string()));
        }
        Ok(())
    }

    fn handshake_term(&self) {
        self.log.record("net.handshake_term");
    }

    fn rollback_active(&self) -> bool {
        self.rollback.load(Ordering::SeqCst)
    }

    fn next_frame(&self) -> bool {
        if self.rollback_active() {
            self.frames.fetch_add(1, Ordering::SeqCst);
        }
        true
    }

    fn end_of_frame(&self) {
        self.log.record("net.end_of_frame");
    }
}

#[derive(Debug, Default)]
pub struct HeadlessCheats {
    log: CallLog,
    widescreen: AtomicBool,
    game_id: Mutex<String>,
}

impl HeadlessCheats {
    pub fn set_widescreen(&self, enabled: bool) {
        self.widescreen.store(enabled, Ordering::SeqCst);
    }

    pub fn game_id(&self) -> String {
        self.game_id.lock().clone()
    }
}

impl CheatEngine for HeadlessCheats {
    fn reset(&self, game_id: &str) {
        *self.game_id.lock() = game_id.to_string();
        self.log.record("cheats.reset");
    }

    fn is_widescreen(&self) -> bool {
        self.widescreen.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct HeadlessAudio {
    log: CallLog,
    active: AtomicBool,
}

impl HeadlessAudio {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl AudioStream for HeadlessAudio {
    fn init(&self) {
        self.active.store(true, Ordering::SeqCst);
        self.log.record("audio.init");
    }

    fn term(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.log.record("audio.term");
    }
}

/// Sauvegardes d'état en mémoire : l'état retenu est l'horloge
#[derive(Debug)]
pub struct HeadlessStates {
    log: CallLog,
    clock: Arc<HeadlessScheduler>,
    slots: Mutex<HashMap<StateSlot, u64>>,
}

impl HeadlessStates {
    pub fn new(clock: Arc<HeadlessScheduler>, log: CallLog) -> Self {
        Self {
            log,
            clock,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn has_slot(&self, slot: StateSlot) -> bool {
        self.slots.lock().contains_key(&slot)
    }
}

impl StateSerializer for HeadlessStates {
    fn save(&self, slot: StateSlot) -> Result<()> {
        self.slots.lock().insert(slot, self.clock.now());
        self.log.record("state.save");
        Ok(())
    }

    fn restore(&self, slot: StateSlot) -> Result<()> {
        self.log.record("state.restore");
        let cycles = self
            .slots
            .lock()
            .get(&slot)
            .copied()
            .ok_or_else(|| EmulatorError::Content(format!("aucun état dans {:?}", slot)))?;
        self.clock.cycles.store(cycles, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct HeadlessServices {
    log: CallLog,
}

impl Debugger for HeadlessServices {
    fn term(&self) {
        self.log.record("debugger.term");
    }
}

impl TextureCache for HeadlessServices {
    fn terminate(&self) {
        self.log.record("custom_texture.terminate");
    }
}

/// Tous les composants sans affichage, accessibles individuellement
pub struct HeadlessMachine {
    pub log: CallLog,
    pub clock: Arc<HeadlessScheduler>,
    pub interpreter: Arc<HeadlessCpu>,
    pub recompiler: Arc<HeadlessCpu>,
    pub rasterizer: Arc<HeadlessRasterizer>,
    pub sound: Arc<HeadlessSound>,
    pub memory: Arc<HeadlessMemory>,
    pub bios: Arc<HeadlessBios>,
    pub cart: Arc<HeadlessCart>,
    pub maple: Arc<HeadlessMaple>,
    pub network: Arc<HeadlessNetwork>,
    pub cheats: Arc<HeadlessCheats>,
    pub audio: Arc<HeadlessAudio>,
    pub states: Arc<HeadlessStates>,
    pub services: Arc<HeadlessServices>,
}

impl HeadlessMachine {
    pub fn new<P: AsRef<Path>>(flash_dir: P, table: Arc<ArcadeRomTable>) -> Self {
        let log = CallLog::default();
        let clock = Arc::new(HeadlessScheduler::default());
        Self {
            interpreter: Arc::new(HeadlessCpu::new("interpréteur", clock.clone(), log.clone())),
            recompiler: Arc::new(HeadlessCpu::new("recompilateur", clock.clone(), log.clone())),
            rasterizer: Arc::new(HeadlessRasterizer { log: log.clone(), ..Default::default() }),
            sound: Arc::new(HeadlessSound { log: log.clone() }),
            memory: Arc::new(HeadlessMemory { log: log.clone(), ..Default::default() }),
            bios: Arc::new(HeadlessBios::new(flash_dir, log.clone())),
            cart: Arc::new(HeadlessCart::new(table, log.clone())),
            maple: Arc::new(HeadlessMaple { log: log.clone(), ..Default::default() }),
            network: Arc::new(HeadlessNetwork { log: log.clone(), ..Default::default() }),
            cheats: Arc::new(HeadlessCheats { log: log.clone(), ..Default::default() }),
            audio: Arc::new(HeadlessAudio { log: log.clone(), ..Default::default() }),
            states: Arc::new(HeadlessStates::new(clock.clone(), log.clone())),
            services: Arc::new(HeadlessServices { log: log.clone() }),
            clock,
            log,
        }
    }

    /// Vue en objets de capacité, à confier au coordinateur
    pub fn machine(&self) -> Machine {
        Machine {
            cpu: CpuCores {
                interpreter: self.interpreter.clone(),
                recompiler: Some(self.recompiler.clone()),
            },
            scheduler: self.clock.clone(),
            rasterizer: self.rasterizer.clone(),
            sound: self.sound.clone(),
            memory: self.memory.clone(),
            bios: self.bios.clone(),
            cart: self.cart.clone(),
            maple: self.maple.clone(),
            network: self.network.clone(),
            cheats: self.cheats.clone(),
            audio: self.audio.clone(),
            states: self.states.clone(),
            debugger: self.services.clone(),
            textures: self.services.clone(),
        }
    }

    /// Branche le signal vsync des deux cœurs
    pub fn set_vblank_hook(&self, hook: VBlankHook) {
        self.interpreter.set_vblank_hook(hook.clone());
        self.recompiler.set_vblank_hook(hook);
    }

    pub fn set_frame_pacing(&self, pacing: Option<Duration>) {
        self.interpreter.set_frame_pacing(pacing);
        self.recompiler.set_frame_pacing(pacing);
    }

    pub fn set_cycles_per_frame(&self, cycles: u64) {
        self.interpreter.set_cycles_per_frame(cycles);
        self.recompiler.set_cycles_per_frame(cycles);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bios::Peripherals;
    use tempfile::TempDir;

    /// Test de l'avance de l'horloge par image
    #[test]
    fn test_cpu_run_advances_clock() -> Result<()> {
        let log = CallLog::default();
        let clock = Arc::new(HeadlessScheduler::default());
        let cpu = HeadlessCpu::new("test", clock.clone(), log);

        cpu.run()?;
        assert_eq!(clock.now(), CYCLES_PER_FRAME);
        assert_eq!(cpu.run_count(), 1);

        cpu.inject_fault("accès invalide");
        assert!(matches!(cpu.run(), Err(EmulatorError::Runtime(_))));
        Ok(())
    }

    /// Test du BIOS Dreamcast obligatoire
    #[test]
    fn test_bios_requires_boot_rom() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let bios = HeadlessBios::new(temp_dir.path(), CallLog::default());
        let dc = PlatformProfile::for_platform(Platform::Dreamcast);

        assert!(!bios.load_rom_files(dc));
        fs::write(temp_dir.path().join("dc_boot.bin"), vec![0u8; 16])?;
        assert!(bios.load_rom_files(dc));

        // Les bornes chargent leur BIOS via la cartouche
        let empty_dir = TempDir::new()?;
        let arcade = HeadlessBios::new(empty_dir.path(), CallLog::default());
        assert!(arcade.load_rom_files(PlatformProfile::for_platform(Platform::Naomi)));
        Ok(())
    }

    /// Test de la lecture de l'en-tête du disque
    #[test]
    fn test_drive_reads_ip_header() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let disc = temp_dir.path().join("disc.gdi");
        let meta = IpMeta::for_product("MK-51052", "JUE", Peripherals::VGA);
        fs::write(&disc, meta.to_bytes())?;

        let bios = HeadlessBios::new(temp_dir.path(), CallLog::default());
        assert!(bios.init_drive(Some(&disc)));
        assert_eq!(bios.disk_id().game_id(), "MK-51052");
        assert!(!bios.init_drive(Some(&temp_dir.path().join("absent.cdi"))));
        Ok(())
    }

    /// Test de la lecture de l'en-tête NAOMI
    #[test]
    fn test_cart_reads_naomi_header() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let rom = temp_dir.path().join("outtrigr.bin");
        let mut data = vec![b' '; 0x100];
        data[..5].copy_from_slice(b"NAOMI");
        data[0x30..0x44].copy_from_slice(b"OUTTRIGGER     JAPAN");
        fs::write(&rom, &data)?;

        let cart = HeadlessCart::new(Arc::new(ArcadeRomTable::new()), CallLog::default());
        cart.load_rom(&rom, None)?;
        assert_eq!(cart.game_id(), "OUTTRIGGER     JAPAN");
        assert!(cart.content_md5().is_some());
        assert_eq!(cart.platform_of(Path::new("kofnw.zip"))?, Platform::Atomiswave);
        assert!(cart.platform_of(Path::new("nothing.zip")).is_err());
        Ok(())
    }
}
