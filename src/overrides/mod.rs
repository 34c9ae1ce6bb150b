//! Réglages de compatibilité par titre
//!
//! Certains jeux ont besoin de réglages précis pour fonctionner (MMU
//! complète, échelle de profondeur, copie RTT...). Les règles ne posent que
//! des surcharges transitoires : les valeurs persistantes de l'utilisateur
//! ne sont jamais modifiées.

pub mod table;

use log::{info, warn};

pub use table::*;

use crate::bios::IpMeta;
use crate::config::{Cable, Config, InputInfo, JammaSetup, Region};
use crate::platform::Platform;

/// Échelle de profondeur des titres Windows CE
const WINDOWS_CE_DEPTH_SCALE: f32 = 0.1;

/// Applique les réglages spécifiques au titre identifié par `game_id`
///
/// `header` est l'en-tête IP.BIN du disque monté ; il est ignoré pour les
/// bornes d'arcade.
pub fn apply_special_settings(
    game_id: &str,
    platform: Platform,
    header: &IpMeta,
    config: &mut Config,
    input: &mut InputInfo,
) {
    info!("Identifiant du jeu: [{}]", game_id);
    if platform.is_console() {
        apply_console_settings(game_id, header, config);
    } else {
        apply_arcade_settings(game_id, config);
        input.jamma_setup = jamma_setup_for(game_id);
        if input.jamma_setup != JammaSetup::Default {
            info!("Configuration JVS {:?} pour {}", input.jamma_setup, game_id);
        }
    }
}

/// MMU complète et échelle de profondeur réduite
pub fn apply_windows_ce_settings(config: &mut Config) {
    config.extra_depth_scale.override_with(WINDOWS_CE_DEPTH_SCALE);
    config.full_mmu.override_with(true);
}

fn apply_console_settings(game_id: &str, header: &IpMeta, config: &mut Config) {
    if header.is_windows_ce() || config.force_windows_ce.get() || WINDOWS_CE_IDS.contains(&game_id) {
        info!("MMU complète et échelle de profondeur activées pour un jeu Windows CE");
        apply_windows_ce_settings(config);
        if !config.force_windows_ce.get() {
            config.force_windows_ce.override_with(true);
        }
    }

    apply_rules(CONSOLE_RULES, game_id, config);

    if let Some(region) = reconcile_region(config.region.get(), header) {
        config.region.override_with(region);
    }

    if config.cable.get().is_vga() && !header.supports_vga() {
        info!("VGA non supporté par le jeu, sortie composite");
        config.cable.override_with(Cable::Composite);
    }
    if config.cable.get() == Cable::Rgb && RGB_BLACKLIST.matches(game_id) {
        info!("{} pour {}", RGB_BLACKLIST.reason, game_id);
        RGB_BLACKLIST.edit.apply(config);
    }
}

fn apply_arcade_settings(game_id: &str, config: &mut Config) {
    apply_rules(ARCADE_RULES, game_id, config);
}

fn apply_rules(rules: &[TitleRule], game_id: &str, config: &mut Config) {
    for rule in rules.iter().filter(|r| r.matches(game_id)) {
        info!("{} pour {}", rule.reason, game_id);
        rule.edit.apply(config);
    }
}

/// Profil JVS d'un jeu arcade, `Default` si le titre n'est pas répertorié
pub fn jamma_setup_for(game_id: &str) -> JammaSetup {
    JVS_PROFILES
        .iter()
        .find(|p| p.matches(game_id))
        .map(|p| p.setup)
        .unwrap_or_default()
}

/// Région à utiliser quand le disque ne supporte pas celle choisie
///
/// `None` si aucune surcharge n'est nécessaire.
pub fn reconcile_region(selected: Region, header: &IpMeta) -> Option<Region> {
    let usa = header.supports_usa();
    let europe = header.supports_europe();
    let japan = header.supports_japan();
    if !(usa || europe || japan) {
        warn!("Aucune région déclarée dans l'IP.BIN");
        return None;
    }

    let region = match selected {
        Region::Japan if !japan => {
            if usa {
                Region::Usa
            } else {
                Region::Europe
            }
        }
        Region::Usa if !usa => {
            if europe {
                Region::Europe
            } else {
                Region::Japan
            }
        }
        Region::Europe if !europe => {
            if usa {
                Region::Usa
            } else {
                Region::Japan
            }
        }
        Region::Default => {
            if usa {
                Region::Usa
            } else if europe {
                Region::Europe
            } else {
                Region::Japan
            }
        }
        _ => return None,
    };
    if selected != Region::Default {
        info!("Région {:?} non supportée, utilisation de {:?}", selected, region);
    }
    Some(region)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bios::Peripherals;
    use crate::config::Broadcast;

    fn console(game_id: &str, areas: &str, peripherals: Peripherals, config: &mut Config) {
        let header = IpMeta::for_product(game_id, areas, peripherals);
        let mut input = InputInfo::default();
        apply_special_settings(&header.game_id(), Platform::Dreamcast, &header, config, &mut input);
    }

    fn arcade(game_id: &str, config: &mut Config) -> JammaSetup {
        let mut input = InputInfo::default();
        apply_special_settings(game_id, Platform::Naomi, &IpMeta::default(), config, &mut input);
        input.jamma_setup
    }

    /// Test d'un titre RTT sans support VGA
    #[test]
    fn test_rtt_title_without_vga() {
        let mut config = Config::default();
        config.cable.set(Cable::Vga);
        console("T13008D 05", "U", Peripherals::empty(), &mut config);

        assert!(config.render_to_texture_buffer.get());
        assert_eq!(config.cable.get(), Cable::Composite);
        // La valeur persistante reste celle de l'utilisateur
        assert_eq!(*config.cable.persistent(), Cable::Vga);
    }

    /// Test d'un en-tête Windows CE
    #[test]
    fn test_windows_ce_header() {
        let mut config = Config::default();
        console("T40203N", "U", Peripherals::WINDOWS_CE, &mut config);

        assert!(config.full_mmu.get());
        assert_eq!(config.extra_depth_scale.get(), 0.1);
        assert!(config.force_windows_ce.get());
    }

    /// Test d'un titre Windows CE reconnu par identifiant
    #[test]
    fn test_windows_ce_by_id() {
        let mut config = Config::default();
        console("T26702N", "U", Peripherals::VGA, &mut config);
        assert!(config.full_mmu.get());
    }

    /// Test de la table d'échelle de profondeur
    #[test]
    fn test_depth_scale_table() {
        let cases = [
            ("MK-51182", 1_000_000.0),
            ("T-8109N", 100.0),
            ("T0002M", 1e26),
            ("T15105D 50", 0.1),
            ("T-8112D-50", 1000.0),
        ];
        for (game_id, scale) in cases {
            let mut config = Config::default();
            console(game_id, "JUE", Peripherals::VGA, &mut config);
            assert_eq!(config.extra_depth_scale.get(), scale, "{}", game_id);
        }
    }

    /// Test du remplacement de région
    #[test]
    fn test_region_remap() {
        let mut config = Config::default();
        config.region.set(Region::Japan);
        console("T9999N", "E", Peripherals::VGA, &mut config);
        assert_eq!(config.region.get(), Region::Europe);
        assert_eq!(config.region.get() as i32, 2);
    }

    /// Test de l'ordre de priorité des régions
    #[test]
    fn test_region_priority_order() {
        let usa_japan = IpMeta::for_product("X", "JU", Peripherals::empty());
        let japan_only = IpMeta::for_product("X", "J", Peripherals::empty());
        let europe_only = IpMeta::for_product("X", "E", Peripherals::empty());

        assert_eq!(reconcile_region(Region::Europe, &usa_japan), Some(Region::Usa));
        assert_eq!(reconcile_region(Region::Usa, &japan_only), Some(Region::Japan));
        assert_eq!(reconcile_region(Region::Default, &europe_only), Some(Region::Europe));
        assert_eq!(reconcile_region(Region::Default, &usa_japan), Some(Region::Usa));
        assert_eq!(reconcile_region(Region::Japan, &usa_japan), None);
        assert_eq!(reconcile_region(Region::Japan, &IpMeta::default()), None);
    }

    /// Test de la liste des titres incompatibles RGB
    #[test]
    fn test_rgb_blacklist() {
        let mut config = Config::default();
        config.cable.set(Cable::Rgb);
        console("T1203N", "U", Peripherals::VGA, &mut config);
        assert_eq!(config.cable.get(), Cable::Composite);

        let mut config = Config::default();
        config.cable.set(Cable::Rgb);
        console("MK-51058", "U", Peripherals::VGA, &mut config);
        assert_eq!(config.cable.get(), Cable::Rgb);
    }

    /// Test des règles BIOS, diffusion et framebuffer
    #[test]
    fn test_bios_and_broadcast_rules() {
        let mut config = Config::default();
        config.use_reios.set(true);
        console("T18702M", "J", Peripherals::VGA, &mut config);
        assert!(!config.use_reios.get());
        // Miss Moonlight est aussi un titre RTT
        assert!(config.render_to_texture_buffer.get());

        let mut config = Config::default();
        console("T-9709D-50", "E", Peripherals::VGA, &mut config);
        assert_eq!(config.broadcast.get(), Broadcast::Pal);

        let mut config = Config::default();
        console("T1102M", "J", Peripherals::VGA, &mut config);
        assert!(config.emulate_framebuffer.get());
    }

    /// Test d'un titre absent des tables
    #[test]
    fn test_unknown_title_untouched() {
        let mut config = Config::default();
        console("T99999N", "JUE", Peripherals::VGA, &mut config);
        assert_eq!(config.override_count(), 0);

        let mut config = Config::default();
        console("T40205N", "JUE", Peripherals::VGA, &mut config);
        assert!(config.render_to_texture_buffer.get());
    }

    /// Test des profils JVS
    #[test]
    fn test_jvs_profiles() {
        let mut config = Config::default();
        assert_eq!(arcade("DRIVE", &mut config), JammaSetup::RotaryEncoders);
        assert_eq!(arcade("OUTTRIGGER     JAPAN", &mut config), JammaSetup::OutTrigger);
        assert_eq!(arcade("hotd2o", &mut config), JammaSetup::LightGunAsAnalog);
        assert_eq!(arcade("  18WHEELER", &mut config), JammaSetup::EighteenWheeler);
        assert_eq!(arcade("MARVEL VS. CAPCOM 2", &mut config), JammaSetup::Default);
        // Le préfixe hotd2 respecte la casse
        assert_eq!(arcade("THE HOUSE OF THE DEAD 2", &mut config), JammaSetup::Default);
        assert_eq!(config.override_count(), 0);
    }

    /// Test des règles arcade
    #[test]
    fn test_arcade_rules() {
        let mut config = Config::default();
        arcade("RADIRGY NOA", &mut config);
        assert!(!config.force_free_play.get());

        let mut config = Config::default();
        arcade("BEACH SPIKERS JAPAN", &mut config);
        assert!(config.render_to_texture_buffer.get());

        // Les identifiants console n'ont pas d'effet en arcade
        let mut config = Config::default();
        arcade("MK-51052", &mut config);
        assert!(!config.render_to_texture_buffer.get());
    }
}
