//! Pixel Dreamcast Rust - Coordinateur Dreamcast / NAOMI / NAOMI 2 / Atomiswave
//!
//! Cette bibliothèque fournit le cycle de vie de la machine (chargement,
//! exécution, arrêt, réinitialisation), la configuration, le bus
//! d'événements, les réglages de compatibilité par titre et le catalogue
//! des jeux. Les composants matériels sont vus au travers de capacités.

pub mod bios;
pub mod config;
pub mod emulator;
pub mod error;
pub mod events;
pub mod hw;
pub mod overrides;
pub mod platform;
pub mod rom;

pub use bios::*;
pub use config::*;
pub use emulator::*;
pub use error::*;
pub use events::*;
pub use hw::*;
pub use platform::*;
pub use rom::*;

/// Version de l'émulateur
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fréquence du SH4 en Hz
pub const SH4_FREQUENCY: u64 = 200_000_000; // 200MHz
