//! Capacités matérielles pilotées par le coordinateur
//!
//! Chaque sous-système (CPU SH4, PowerVR, AICA/ARM7, mémoire, BIOS,
//! cartouche arcade, réseau...) n'est vu qu'au travers de la capacité
//! étroite dont le cycle de vie a besoin. Toutes les méthodes prennent
//! `&self` : `stop` est appelé depuis un autre thread pendant `run`.

pub mod headless;
pub mod progress;

pub use progress::*;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::bios::IpMeta;
use crate::config::JammaSetup;
use crate::error::Result;
use crate::platform::{ArcadePlatformProbe, Platform, PlatformProfile};

/// Cœur SH4 (interpréteur ou recompilateur dynamique)
pub trait Sh4Executor: Send + Sync {
    fn name(&self) -> &'static str;
    fn init(&self) -> Result<()>;
    /// Bloque jusqu'à ce que le CPU soit arrêté
    fn run(&self) -> Result<()>;
    /// Exécute une seule instruction
    fn step(&self) -> Result<()>;
    fn stop(&self);
    fn term(&self);
    fn reset(&self, hard: bool);
    fn reset_cache(&self);
    /// Compteur programme courant
    fn pc(&self) -> u32;
}

/// Ordonnanceur SH4 et son horloge monotone en cycles
pub trait Scheduler: Send + Sync {
    fn now(&self) -> u64;
    fn reset(&self, hard: bool);
}

/// Rasteriseur PowerVR
pub trait Rasterizer: Send + Sync {
    fn init(&self) -> Result<()>;
    fn reset(&self, hard: bool);
    fn term(&self);
    /// Présente une image ; `false` si aucune image n'était prête
    fn render_single_frame(&self, blocking: bool) -> bool;
    /// Débloque le thread d'émulation en attente du rendu
    fn cancel_emu_wait(&self);
}

/// DSP AICA et son sous-processeur ARM7
pub trait SoundProcessor: Send + Sync {
    fn init(&self) -> Result<()>;
    fn reset(&self, hard: bool);
    fn term(&self);
    fn arm_init(&self);
    fn arm_reset(&self);
    /// Vide le cache du recompilateur ARM7 avant une restauration d'état
    fn flush_arm_recompiler(&self);
}

/// Sous-système mémoire, MMU et surveillance de pages
pub trait MemorySystem: Send + Sync {
    fn init(&self) -> Result<()>;
    fn reset(&self, hard: bool);
    fn term(&self);
    fn init_mappings(&self, profile: &PlatformProfile);
    fn release(&self);
    fn unprotect_vram(&self, offset: u32, size: u32);
    fn map_default(&self);
    fn set_memory_handlers(&self);
    fn mmu_flush_table(&self);
    fn mmu_set_state(&self);
    /// Vide le cache de blocs du recompilateur
    fn block_cache_reset(&self);
    fn watch_protect(&self);
    fn watch_unprotect(&self);
    fn watch_reset(&self);
}

/// Chargeur BIOS/flash, lecteur GD-ROM et BIOS HLE
pub trait BiosLoader: Send + Sync {
    fn init_hle(&self) -> Result<()>;
    fn term_hle(&self);
    /// Charge BIOS et flash ; `false` si le BIOS est introuvable
    fn load_rom_files(&self, profile: &PlatformProfile) -> bool;
    fn save_rom_files(&self) -> Result<()>;
    /// Installe le BIOS HLE
    fn load_hle(&self);
    /// Monte un disque ; `None` démarre avec le lecteur vide
    fn init_drive(&self, path: Option<&Path>) -> bool;
    /// Lit l'en-tête IP.BIN du disque monté
    fn disk_id(&self) -> IpMeta;
    /// Répertoire où les images BIOS et flash sont attendues
    fn flash_save_path(&self) -> PathBuf;
}

/// Cartouche NAOMI / Atomiswave
pub trait NaomiCart: ArcadePlatformProbe + Send + Sync {
    /// Charge la ROM ; `progress` suit l'avancement et l'annulation
    fn load_rom(&self, path: &Path, progress: Option<&LoadProgress>) -> Result<()>;
    fn load_bios(&self, path: &Path) -> Result<()>;
    fn configure_eeprom(&self);
    /// Nom de jeu lu dans l'en-tête de la ROM
    fn game_id(&self) -> String;
    /// Empreinte du contenu chargé
    fn content_md5(&self) -> Option<[u8; 16]>;
    /// Vrai si le titre utilise le réseau NAOMI
    fn network_supported(&self) -> bool;
}

/// Bus maple (manettes, cartes E/S JVS)
pub trait MapleBus: Send + Sync {
    fn destroy_devices(&self);
    fn create_devices(&self, jamma_setup: JammaSetup);
}

/// Négociation réseau et couche rollback
pub trait NetworkLayer: Send + Sync {
    fn handshake_init(&self) -> Result<()>;
    fn handshake_term(&self);
    fn rollback_active(&self) -> bool;
    /// Prépare l'image suivante ; `false` demande l'arrêt du thread d'émulation
    fn next_frame(&self) -> bool;
    fn end_of_frame(&self);
}

pub trait CheatEngine: Send + Sync {
    fn reset(&self, game_id: &str);
    fn is_widescreen(&self) -> bool;
}

pub trait AudioStream: Send + Sync {
    fn init(&self);
    fn term(&self);
}

/// Emplacement de sauvegarde d'état
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateSlot {
    /// État partagé par les pairs rollback
    Rollback,
    Slot(u32),
}

/// Format de sauvegarde d'état (défini hors du coordinateur)
pub trait StateSerializer: Send + Sync {
    fn save(&self, slot: StateSlot) -> Result<()>;
    /// Désérialise l'état ; les caches ont déjà été vidés
    fn restore(&self, slot: StateSlot) -> Result<()>;
}

pub trait Debugger: Send + Sync {
    fn term(&self);
}

/// Cache des textures personnalisées
pub trait TextureCache: Send + Sync {
    fn terminate(&self);
}

/// Les deux implémentations du cœur SH4
#[derive(Clone)]
pub struct CpuCores {
    pub interpreter: Arc<dyn Sh4Executor>,
    /// Absent si le recompilateur n'est pas disponible sur cette cible
    pub recompiler: Option<Arc<dyn Sh4Executor>>,
}

impl CpuCores {
    /// Sélectionne le cœur selon le réglage du recompilateur
    pub fn select(&self, dynarec_enabled: bool) -> Arc<dyn Sh4Executor> {
        match &self.recompiler {
            Some(rec) if dynarec_enabled => rec.clone(),
            _ => self.interpreter.clone(),
        }
    }
}

/// Ensemble des collaborateurs d'une machine
#[derive(Clone)]
pub struct Machine {
    pub cpu: CpuCores,
    pub scheduler: Arc<dyn Scheduler>,
    pub rasterizer: Arc<dyn Rasterizer>,
    pub sound: Arc<dyn SoundProcessor>,
    pub memory: Arc<dyn MemorySystem>,
    pub bios: Arc<dyn BiosLoader>,
    pub cart: Arc<dyn NaomiCart>,
    pub maple: Arc<dyn MapleBus>,
    pub network: Arc<dyn NetworkLayer>,
    pub cheats: Arc<dyn CheatEngine>,
    pub audio: Arc<dyn AudioStream>,
    pub states: Arc<dyn StateSerializer>,
    pub debugger: Arc<dyn Debugger>,
    pub textures: Arc<dyn TextureCache>,
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("interpreter", &self.cpu.interpreter.name())
            .field("recompiler", &self.cpu.recompiler.as_ref().map(|c| c.name()))
            .finish_non_exhaustive()
    }
}

/// Plateforme d'une archive arcade, via la cartouche
impl ArcadePlatformProbe for Machine {
    fn platform_of(&self, path: &Path) -> Result<Platform> {
        self.cart.platform_of(path)
    }
}
