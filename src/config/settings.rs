//! Enregistrement global de l'état de session

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::platform::PlatformProfile;

/// Personnalité du bus d'entrée JVS des bornes d'arcade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum JammaSetup {
    #[default]
    Default,
    RotaryEncoders,
    FourPlayers,
    SegaMarineFishing,
    DualIOBoards4P,
    LightGun,
    Mazan,
    GunSurvivor,
    WorldKicks,
    WorldKicksPCB,
    Keyboard,
    OutTrigger,
    LightGunAsAnalog,
    WaveRunnerGP,
    EighteenWheeler,
    DogWalking,
    TouchDeUno,
}

/// Contenu chargé
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentInfo {
    /// Chemin du contenu ; `None` pour un démarrage sur le BIOS
    pub path: Option<PathBuf>,
    /// Identifiant produit (console) ou nom normalisé (arcade)
    pub game_id: String,
}

/// État réseau
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkInfo {
    pub online: bool,
    /// Empreinte du contenu, échangée lors de la négociation
    pub md5: [u8; 16],
    pub fast_forward_mode: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputInfo {
    pub jamma_setup: JammaSetup,
}

/// Enregistrement partagé par les collaborateurs
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Profil actif, absent tant qu'aucune plateforme n'a été programmée
    pub platform: Option<PlatformProfile>,
    pub content: ContentInfo,
    pub network: NetworkInfo,
    pub input: InputInfo,
}

impl Settings {
    pub fn is_console(&self) -> bool {
        self.platform.map(|p| p.is_console()).unwrap_or(false)
    }

    pub fn is_arcade(&self) -> bool {
        self.platform.map(|p| p.is_arcade()).unwrap_or(false)
    }

    pub fn is_naomi(&self) -> bool {
        self.platform.map(|p| p.system.is_naomi()).unwrap_or(false)
    }

    pub fn is_naomi2(&self) -> bool {
        self.platform.map(|p| p.system.is_naomi2()).unwrap_or(false)
    }
}
