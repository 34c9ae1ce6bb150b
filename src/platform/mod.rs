//! Profils matériels des quatre variantes de la machine
//!
//! La Dreamcast et ses trois déclinaisons arcade partagent le même SH4 et
//! le même PowerVR, mais diffèrent par la taille de leurs mémoires :
//! - Dreamcast : 16MB RAM, 8MB VRAM, 2MB RAM audio
//! - NAOMI : 32MB RAM, 16MB VRAM, 8MB RAM audio
//! - NAOMI 2 : comme NAOMI, plus 32MB de RAM étendue (Elan)
//! - Atomiswave : comme la Dreamcast, BIOS de 128KB

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

const KB: u32 = 1024;
const MB: u32 = 1024 * 1024;

/// Variante de machine émulée
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Dreamcast,
    Naomi,
    Naomi2,
    Atomiswave,
}

impl Platform {
    /// Convertit un identifiant système numérique
    pub fn from_system_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(Platform::Dreamcast),
            1 => Some(Platform::Naomi),
            2 => Some(Platform::Naomi2),
            3 => Some(Platform::Atomiswave),
            _ => None,
        }
    }

    pub fn system_id(self) -> u32 {
        match self {
            Platform::Dreamcast => 0,
            Platform::Naomi => 1,
            Platform::Naomi2 => 2,
            Platform::Atomiswave => 3,
        }
    }

    /// Console de salon (Dreamcast uniquement)
    pub fn is_console(self) -> bool {
        self == Platform::Dreamcast
    }

    /// Système d'arcade (NAOMI, NAOMI 2, Atomiswave)
    pub fn is_arcade(self) -> bool {
        !self.is_console()
    }

    pub fn is_naomi(self) -> bool {
        matches!(self, Platform::Naomi | Platform::Naomi2)
    }

    pub fn is_naomi2(self) -> bool {
        self == Platform::Naomi2
    }

    pub fn is_atomiswave(self) -> bool {
        self == Platform::Atomiswave
    }

    pub fn name(self) -> &'static str {
        match self {
            Platform::Dreamcast => "Dreamcast",
            Platform::Naomi => "NAOMI",
            Platform::Naomi2 => "NAOMI 2",
            Platform::Atomiswave => "Atomiswave",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Descripteur immuable des tailles mémoire d'une variante
///
/// Toutes les tailles sont des puissances de deux ; les masques
/// d'adressage valent `taille - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformProfile {
    pub system: Platform,
    pub ram_size: u32,
    pub vram_size: u32,
    pub aram_size: u32,
    pub bios_size: u32,
    pub flash_size: u32,
    /// RAM étendue (NAOMI 2 uniquement, 0 ailleurs)
    pub eram_size: u32,
}

static DREAMCAST: PlatformProfile = PlatformProfile {
    system: Platform::Dreamcast,
    ram_size: 16 * MB,
    vram_size: 8 * MB,
    aram_size: 2 * MB,
    bios_size: 2 * MB,
    flash_size: 128 * KB,
    eram_size: 0,
};

static NAOMI: PlatformProfile = PlatformProfile {
    system: Platform::Naomi,
    ram_size: 32 * MB,
    vram_size: 16 * MB,
    aram_size: 8 * MB,
    bios_size: 2 * MB,
    // RAM sauvegardée par pile
    flash_size: 32 * KB,
    eram_size: 0,
};

static NAOMI2: PlatformProfile = PlatformProfile {
    system: Platform::Naomi2,
    ram_size: 32 * MB,
    // 2x16MB sur la carte, seuls 16MB sont émulés
    vram_size: 16 * MB,
    aram_size: 8 * MB,
    bios_size: 2 * MB,
    flash_size: 32 * KB,
    eram_size: 32 * MB,
};

static ATOMISWAVE: PlatformProfile = PlatformProfile {
    system: Platform::Atomiswave,
    ram_size: 16 * MB,
    vram_size: 8 * MB,
    aram_size: 2 * MB,
    bios_size: 128 * KB,
    // SRAM
    flash_size: 128 * KB,
    eram_size: 0,
};

impl PlatformProfile {
    /// Table constante variante -> profil
    pub fn for_platform(platform: Platform) -> &'static PlatformProfile {
        match platform {
            Platform::Dreamcast => &DREAMCAST,
            Platform::Naomi => &NAOMI,
            Platform::Naomi2 => &NAOMI2,
            Platform::Atomiswave => &ATOMISWAVE,
        }
    }

    pub fn all() -> [&'static PlatformProfile; 4] {
        [&DREAMCAST, &NAOMI, &NAOMI2, &ATOMISWAVE]
    }

    pub const fn ram_mask(&self) -> u32 {
        self.ram_size - 1
    }

    pub const fn vram_mask(&self) -> u32 {
        self.vram_size - 1
    }

    pub const fn aram_mask(&self) -> u32 {
        self.aram_size - 1
    }

    pub const fn bios_mask(&self) -> u32 {
        self.bios_size - 1
    }

    pub const fn flash_mask(&self) -> u32 {
        self.flash_size - 1
    }

    pub fn is_console(&self) -> bool {
        self.system.is_console()
    }

    pub fn is_arcade(&self) -> bool {
        self.system.is_arcade()
    }
}

/// Capacité de la cartouche arcade utilisée pour classer les archives
pub trait ArcadePlatformProbe {
    /// Détermine la variante arcade d'une archive `.zip`/`.7z`
    fn platform_of(&self, path: &Path) -> Result<Platform>;
}

/// Extension en minuscules, sans le point
pub fn file_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Classe un contenu selon son extension
///
/// Aucun chemin signifie un démarrage sur le BIOS Dreamcast.
pub fn classify_content(path: Option<&Path>, probe: &dyn ArcadePlatformProbe) -> Result<Platform> {
    let path = match path {
        Some(p) => p,
        None => return Ok(Platform::Dreamcast),
    };
    match file_extension(path).as_str() {
        "" => Ok(Platform::Dreamcast),
        "zip" | "7z" => probe.platform_of(path),
        "bin" | "dat" | "lst" => Ok(Platform::Naomi),
        _ => Ok(Platform::Dreamcast),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct FixedProbe(Platform);

    impl ArcadePlatformProbe for FixedProbe {
        fn platform_of(&self, _path: &Path) -> Result<Platform> {
            Ok(self.0)
        }
    }

    /// Test des masques d'adresse
    #[test]
    fn test_profile_masks() {
        for profile in PlatformProfile::all() {
            assert!(profile.ram_size.is_power_of_two());
            assert!(profile.vram_size.is_power_of_two());
            assert!(profile.aram_size.is_power_of_two());
            assert!(profile.bios_size.is_power_of_two());
            assert!(profile.flash_size.is_power_of_two());
            assert_eq!(profile.ram_mask(), profile.ram_size - 1);
            assert_eq!(profile.vram_mask(), profile.vram_size - 1);
            assert_eq!(profile.aram_mask(), profile.aram_size - 1);
        }
    }

    /// Test des tailles mémoire par plateforme
    #[test]
    fn test_profile_sizes() {
        let dc = PlatformProfile::for_platform(Platform::Dreamcast);
        assert_eq!(dc.ram_size, 16 * MB);
        assert_eq!(dc.flash_size, 128 * KB);

        let n2 = PlatformProfile::for_platform(Platform::Naomi2);
        assert_eq!(n2.eram_size, 32 * MB);
        assert_eq!(PlatformProfile::for_platform(Platform::Naomi).eram_size, 0);

        let aw = PlatformProfile::for_platform(Platform::Atomiswave);
        assert_eq!(aw.bios_size, 128 * KB);
    }

    /// Test des prédicats de plateforme
    #[test]
    fn test_predicates() {
        assert!(Platform::Dreamcast.is_console());
        assert!(!Platform::Dreamcast.is_arcade());
        for p in [Platform::Naomi, Platform::Naomi2, Platform::Atomiswave] {
            assert!(p.is_arcade());
        }
        assert!(Platform::Naomi2.is_naomi());
        assert!(!Platform::Atomiswave.is_naomi());
        assert_eq!(Platform::from_system_id(3), Some(Platform::Atomiswave));
        assert_eq!(Platform::from_system_id(7), None);
    }

    /// Test de la détection de plateforme
    #[test]
    fn test_classify_content() -> Result<()> {
        let probe = FixedProbe(Platform::Atomiswave);
        assert_eq!(classify_content(None, &probe)?, Platform::Dreamcast);
        assert_eq!(classify_content(Some(&PathBuf::from("game")), &probe)?, Platform::Dreamcast);
        assert_eq!(classify_content(Some(&PathBuf::from("kofnw.zip")), &probe)?, Platform::Atomiswave);
        assert_eq!(classify_content(Some(&PathBuf::from("x.7Z")), &probe)?, Platform::Atomiswave);
        assert_eq!(classify_content(Some(&PathBuf::from("game.bin")), &probe)?, Platform::Naomi);
        assert_eq!(classify_content(Some(&PathBuf::from("game.LST")), &probe)?, Platform::Naomi);
        assert_eq!(classify_content(Some(&PathBuf::from("disc.gdi")), &probe)?, Platform::Dreamcast);
        Ok(())
    }
}
