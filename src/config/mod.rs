//! Configuration de l'émulateur
//!
//! Deux niveaux : les cellules réglables (`Config`), persistées dans un
//! fichier TOML et surchargeables titre par titre, et l'enregistrement de
//! session (`Settings`) décrivant la plateforme et le contenu chargés.

pub mod option;
pub mod settings;

use log::{debug, info};
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use option::*;
pub use settings::*;

use crate::error::Result;

/// Section principale du fichier de configuration
const CONFIG_SECTION: &str = "config";

/// Table des sections par titre
const GAME_SECTION: &str = "game";

const CELL_COUNT: usize = 21;

/// Région de la console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Japan = 0,
    Usa = 1,
    Europe = 2,
    Default = 3,
}

/// Câble vidéo branché
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cable {
    Vga = 0,
    VgaAlt = 1,
    Rgb = 2,
    Composite = 3,
}

impl Cable {
    pub fn is_vga(self) -> bool {
        matches!(self, Cable::Vga | Cable::VgaAlt)
    }
}

/// Standard de diffusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Broadcast {
    Ntsc = 0,
    Pal = 1,
    PalM = 2,
    PalN = 3,
    Default = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderType {
    OpenGl,
    Vulkan,
    DirectX9,
    DirectX11,
}

/// Cellules réglables par l'utilisateur
#[derive(Debug, Clone)]
pub struct Config {
    pub region: OptionCell<Region>,
    pub cable: OptionCell<Cable>,
    pub broadcast: OptionCell<Broadcast>,
    /// BIOS HLE (reios) au lieu de l'image réelle
    pub use_reios: OptionCell<bool>,
    pub force_windows_ce: OptionCell<bool>,
    pub full_mmu: OptionCell<bool>,
    pub extra_depth_scale: OptionCell<f32>,
    pub render_to_texture_buffer: OptionCell<bool>,
    pub translucent_polygon_depth_mask: OptionCell<bool>,
    pub emulate_framebuffer: OptionCell<bool>,
    /// Étirement horizontal en pourcents
    pub screen_stretching: OptionCell<i32>,
    pub dynarec_enabled: OptionCell<bool>,
    pub threaded_rendering: OptionCell<bool>,
    pub renderer_type: OptionCell<RenderType>,
    pub ggpo_enable: OptionCell<bool>,
    pub auto_load_state: OptionCell<bool>,
    pub auto_save_state: OptionCell<bool>,
    pub savestate_slot: OptionCell<u32>,
    pub force_free_play: OptionCell<bool>,
    pub hide_legacy_naomi_roms: OptionCell<bool>,
    pub content_path: OptionCell<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: OptionCell::new("region", Region::Default),
            cable: OptionCell::new("cable", Cable::Composite),
            broadcast: OptionCell::new("broadcast", Broadcast::Default),
            use_reios: OptionCell::new("use_reios", false),
            force_windows_ce: OptionCell::new("force_windows_ce", false),
            full_mmu: OptionCell::new("full_mmu", false),
            extra_depth_scale: OptionCell::new("extra_depth_scale", 1.0),
            render_to_texture_buffer: OptionCell::new("render_to_texture_buffer", false),
            translucent_polygon_depth_mask: OptionCell::new("translucent_polygon_depth_mask", false),
            emulate_framebuffer: OptionCell::new("emulate_framebuffer", false),
            screen_stretching: OptionCell::new("screen_stretching", 100),
            dynarec_enabled: OptionCell::new("dynarec_enabled", true),
            threaded_rendering: OptionCell::new("threaded_rendering", false),
            renderer_type: OptionCell::new("renderer_type", RenderType::OpenGl),
            ggpo_enable: OptionCell::new("ggpo_enable", false),
            auto_load_state: OptionCell::new("auto_load_state", false),
            auto_save_state: OptionCell::new("auto_save_state", false),
            savestate_slot: OptionCell::new("savestate_slot", 0),
            force_free_play: OptionCell::new("force_free_play", true),
            hide_legacy_naomi_roms: OptionCell::new("hide_legacy_naomi_roms", true),
            content_path: OptionCell::new("content_path", Vec::new()),
        }
    }
}

impl Config {
    pub fn cells(&self) -> [&dyn ConfigCell; CELL_COUNT] {
        [
            &self.region,
            &self.cable,
            &self.broadcast,
            &self.use_reios,
            &self.force_windows_ce,
            &self.full_mmu,
            &self.extra_depth_scale,
            &self.render_to_texture_buffer,
            &self.translucent_polygon_depth_mask,
            &self.emulate_framebuffer,
            &self.screen_stretching,
            &self.dynarec_enabled,
            &self.threaded_rendering,
            &self.renderer_type,
            &self.ggpo_enable,
            &self.auto_load_state,
            &self.auto_save_state,
            &self.savestate_slot,
            &self.force_free_play,
            &self.hide_legacy_naomi_roms,
            &self.content_path,
        ]
    }

    pub fn cells_mut(&mut self) -> [&mut dyn ConfigCell; CELL_COUNT] {
        [
            &mut self.region,
            &mut self.cable,
            &mut self.broadcast,
            &mut self.use_reios,
            &mut self.force_windows_ce,
            &mut self.full_mmu,
            &mut self.extra_depth_scale,
            &mut self.render_to_texture_buffer,
            &mut self.translucent_polygon_depth_mask,
            &mut self.emulate_framebuffer,
            &mut self.screen_stretching,
            &mut self.dynarec_enabled,
            &mut self.threaded_rendering,
            &mut self.renderer_type,
            &mut self.ggpo_enable,
            &mut self.auto_load_state,
            &mut self.auto_save_state,
            &mut self.savestate_slot,
            &mut self.force_free_play,
            &mut self.hide_legacy_naomi_roms,
            &mut self.content_path,
        ]
    }

    /// Nombre de surcharges transitoires actives
    pub fn override_count(&self) -> usize {
        self.cells().iter().filter(|c| c.is_overridden()).count()
    }

    fn apply_section(&mut self, section: &toml::Table) -> Result<()> {
        for cell in self.cells_mut() {
            if let Some(value) = section.get(cell.key()) {
                cell.load_value(value)?;
            }
        }
        Ok(())
    }

    fn apply_game_section(&mut self, section: &toml::Table) -> Result<()> {
        for cell in self.cells_mut() {
            cell.clear_game_value();
            if let Some(value) = section.get(cell.key()) {
                cell.load_game_value(value)?;
            }
        }
        Ok(())
    }
}

/// Origine des valeurs persistantes
#[derive(Debug)]
enum ConfigSource {
    /// Aucun stockage : valeurs par défaut
    None,
    /// Fichier TOML sur disque
    File(PathBuf),
    /// Document en mémoire (tests, frontaux embarqués)
    Memory,
}

/// Magasin de configuration partagé entre les threads
///
/// Les surcharges transitoires vivent le temps d'un titre : seul
/// `reset` les retire. `load` recharge les valeurs persistantes depuis le
/// stockage hôte, en superposant la section du titre courant si demandé.
/// Les valeurs du titre restent séparées des valeurs globales.
#[derive(Debug)]
pub struct SettingsStore {
    source: ConfigSource,
    document: Mutex<toml::Table>,
    game_id: RwLock<String>,
    config: RwLock<Config>,
    settings: RwLock<Settings>,
}

impl SettingsStore {
    /// Magasin sans stockage persistant
    pub fn new() -> Self {
        Self::with_source(ConfigSource::None, toml::Table::new())
    }

    /// Magasin adossé à un fichier TOML (créé à la première sauvegarde)
    pub fn with_file<P: AsRef<Path>>(path: P) -> Self {
        Self::with_source(ConfigSource::File(path.as_ref().to_path_buf()), toml::Table::new())
    }

    /// Magasin adossé à un document TOML en mémoire
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let document = contents.parse::<toml::Table>()?;
        Ok(Self::with_source(ConfigSource::Memory, document))
    }

    fn with_source(source: ConfigSource, document: toml::Table) -> Self {
        Self {
            source,
            document: Mutex::new(document),
            game_id: RwLock::new(String::new()),
            config: RwLock::new(Config::default()),
            settings: RwLock::new(Settings::default()),
        }
    }

    pub fn config(&self) -> RwLockReadGuard<'_, Config> {
        self.config.read()
    }

    pub fn config_mut(&self) -> RwLockWriteGuard<'_, Config> {
        self.config.write()
    }

    pub fn settings(&self) -> RwLockReadGuard<'_, Settings> {
        self.settings.read()
    }

    pub fn settings_mut(&self) -> RwLockWriteGuard<'_, Settings> {
        self.settings.write()
    }

    /// Retire toutes les surcharges transitoires
    pub fn reset(&self) {
        let mut config = self.config.write();
        for cell in config.cells_mut() {
            cell.reset_override();
        }
    }

    /// Désigne la section utilisée par `load(true)`
    pub fn set_game_id(&self, id: &str) {
        *self.game_id.write() = id.to_string();
    }

    pub fn game_id(&self) -> String {
        self.game_id.read().clone()
    }

    /// Recharge les valeurs persistantes depuis le stockage hôte
    pub fn load(&self, per_game: bool) -> Result<()> {
        let document = self.read_document()?;
        let mut config = self.config.write();

        if !per_game {
            for cell in config.cells_mut() {
                cell.restore_default();
            }
            if let Some(section) = document.get(CONFIG_SECTION).and_then(|v| v.as_table()) {
                config.apply_section(section)?;
            }
            debug!("Configuration rechargée");
            return Ok(());
        }

        let game_id = self.game_id.read().clone();
        if game_id.is_empty() {
            return Ok(());
        }
        let section = document
            .get(GAME_SECTION)
            .and_then(|v| v.as_table())
            .and_then(|games| games.get(&game_id))
            .and_then(|v| v.as_table());
        match section {
            Some(section) => {
                info!("Paramètres spécifiques chargés pour {}", game_id);
                config.apply_game_section(section)?;
            }
            None => {
                for cell in config.cells_mut() {
                    cell.clear_game_value();
                }
            }
        }
        Ok(())
    }

    /// Écrit les valeurs persistantes
    ///
    /// Les valeurs globales vont dans `[config]`, celles du titre courant
    /// dans sa section `[game."<id>"]`.
    pub fn save(&self) -> Result<()> {
        let game_id = self.game_id();
        let mut section = toml::Table::new();
        let mut game_values = toml::Table::new();
        for cell in self.config.read().cells() {
            section.insert(cell.key().to_string(), cell.to_value()?);
            if let Some(value) = cell.game_to_value()? {
                game_values.insert(cell.key().to_string(), value);
            }
        }

        let mut document = match self.source {
            ConfigSource::File(_) => self.read_document()?,
            _ => self.document.lock().clone(),
        };
        document.insert(CONFIG_SECTION.to_string(), toml::Value::Table(section));
        if !game_id.is_empty() && !game_values.is_empty() {
            let games = document
                .entry(GAME_SECTION)
                .or_insert_with(|| toml::Value::Table(toml::Table::new()));
            if let toml::Value::Table(games) = games {
                let game = games
                    .entry(game_id.as_str())
                    .or_insert_with(|| toml::Value::Table(toml::Table::new()));
                if let toml::Value::Table(game) = game {
                    for (key, value) in game_values {
                        game.insert(key, value);
                    }
                }
            }
        }

        if let ConfigSource::File(path) = &self.source {
            fs::write(path, toml::to_string_pretty(&document)?)?;
            debug!("Configuration enregistrée dans {}", path.display());
        }
        *self.document.lock() = document;
        Ok(())
    }

    fn read_document(&self) -> Result<toml::Table> {
        match &self.source {
            ConfigSource::File(path) => {
                if !path.exists() {
                    info!("Fichier de configuration {} absent, valeurs par défaut", path.display());
                    return Ok(toml::Table::new());
                }
                let contents = fs::read_to_string(path)?;
                Ok(contents.parse::<toml::Table>()?)
            }
            ConfigSource::Memory | ConfigSource::None => Ok(self.document.lock().clone()),
        }
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmulatorError;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[config]
region = "japan"
cable = "vga"
extra_depth_scale = 2.5
content_path = ["/games"]

[game."MK-51052"]
render_to_texture_buffer = true
region = "usa"
"#;

    /// Test du chargement de la section principale
    #[test]
    fn test_load_persistent_section() -> Result<()> {
        let store = SettingsStore::from_toml_str(SAMPLE)?;
        store.load(false)?;

        let config = store.config();
        assert_eq!(config.region.get(), Region::Japan);
        assert_eq!(config.cable.get(), Cable::Vga);
        assert_eq!(config.extra_depth_scale.get(), 2.5);
        assert_eq!(config.content_path.get(), vec!["/games".to_string()]);
        Ok(())
    }

    /// Test de la superposition de la section du titre
    #[test]
    fn test_per_game_layering() -> Result<()> {
        let store = SettingsStore::from_toml_str(SAMPLE)?;
        store.load(false)?;
        store.set_game_id("MK-51052");
        store.load(true)?;

        let config = store.config();
        assert!(config.render_to_texture_buffer.get());
        assert_eq!(config.region.get(), Region::Usa);
        // Non présent dans la section du titre
        assert_eq!(config.cable.get(), Cable::Vga);
        Ok(())
    }

    /// Test du retrait des surcharges
    #[test]
    fn test_reset_drops_overrides() -> Result<()> {
        let store = SettingsStore::from_toml_str(SAMPLE)?;
        store.load(false)?;
        {
            let mut config = store.config_mut();
            config.full_mmu.override_with(true);
            config.extra_depth_scale.override_with(0.1);
        }
        assert_eq!(store.config().override_count(), 2);

        store.reset();
        let config = store.config();
        assert_eq!(config.override_count(), 0);
        assert!(!config.full_mmu.get());
        assert_eq!(config.extra_depth_scale.get(), 2.5);
        Ok(())
    }

    /// Test du rechargement avec surcharges actives
    #[test]
    fn test_load_keeps_overrides() -> Result<()> {
        let store = SettingsStore::from_toml_str(SAMPLE)?;
        store.config_mut().cable.override_with(Cable::Composite);
        store.load(false)?;
        assert_eq!(store.config().cable.get(), Cable::Composite);
        assert_eq!(*store.config().cable.persistent(), Cable::Vga);
        Ok(())
    }

    /// Test du retour aux valeurs par défaut
    #[test]
    fn test_reload_restores_defaults() -> Result<()> {
        let store = SettingsStore::from_toml_str("[config]\n")?;
        store.config_mut().screen_stretching.set(150);
        store.load(false)?;
        assert_eq!(store.config().screen_stretching.get(), 100);
        Ok(())
    }

    /// Test de l'aller-retour par fichier
    #[test]
    fn test_file_round_trip() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("emu.toml");

        let store = SettingsStore::with_file(&path);
        store.load(false)?;
        store.config_mut().region.set(Region::Europe);
        store.config_mut().threaded_rendering.set(true);
        store.save()?;

        let reloaded = SettingsStore::with_file(&path);
        reloaded.load(false)?;
        assert_eq!(reloaded.config().region.get(), Region::Europe);
        assert!(reloaded.config().threaded_rendering.get());
        Ok(())
    }

    /// Test de la sauvegarde avec un titre chargé
    #[test]
    fn test_save_keeps_game_values_out_of_global_section() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("emu.toml");
        fs::write(&path, SAMPLE)?;

        let store = SettingsStore::with_file(&path);
        store.load(false)?;
        store.set_game_id("MK-51052");
        store.load(true)?;
        store.config_mut().threaded_rendering.set(true);
        store.config_mut().region.set(Region::Europe);
        store.save()?;

        let reloaded = SettingsStore::with_file(&path);
        reloaded.load(false)?;
        {
            let config = reloaded.config();
            assert_eq!(config.region.get(), Region::Japan);
            assert!(!config.render_to_texture_buffer.get());
            assert!(config.threaded_rendering.get());
        }

        // La section du titre reçoit la modification
        reloaded.set_game_id("MK-51052");
        reloaded.load(true)?;
        let config = reloaded.config();
        assert_eq!(config.region.get(), Region::Europe);
        assert!(config.render_to_texture_buffer.get());
        Ok(())
    }

    /// Test du passage d'un titre à un autre
    #[test]
    fn test_game_values_do_not_leak() -> Result<()> {
        let store = SettingsStore::from_toml_str(SAMPLE)?;
        store.load(false)?;
        store.set_game_id("MK-51052");
        store.load(true)?;
        assert_eq!(store.config().region.get(), Region::Usa);

        store.set_game_id("T-8109N");
        store.load(true)?;
        assert_eq!(store.config().region.get(), Region::Japan);
        assert!(!store.config().render_to_texture_buffer.get());
        Ok(())
    }

    /// Test d'un document invalide
    #[test]
    fn test_invalid_document() {
        assert!(matches!(
            SettingsStore::from_toml_str("[config\nregion ="),
            Err(EmulatorError::Config(_))
        ));
    }
}
