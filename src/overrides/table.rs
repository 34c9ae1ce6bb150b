//! Tables de compatibilité par titre
//!
//! Identifiants produit des disques (10 octets, espaces de fin retirés) et
//! noms de jeux arcade tels qu'ils figurent dans l'en-tête de la ROM.

use crate::config::{Broadcast, Cable, Config, JammaSetup};

/// Modification d'une cellule, posée en surcharge transitoire
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellEdit {
    ExtraDepthScale(f32),
    FullMmu(bool),
    RenderToTextureBuffer(bool),
    TranslucentPolygonDepthMask(bool),
    UseReios(bool),
    Broadcast(Broadcast),
    EmulateFramebuffer(bool),
    ForceFreePlay(bool),
    Cable(Cable),
}

impl CellEdit {
    pub fn apply(self, config: &mut Config) {
        match self {
            CellEdit::ExtraDepthScale(v) => config.extra_depth_scale.override_with(v),
            CellEdit::FullMmu(v) => config.full_mmu.override_with(v),
            CellEdit::RenderToTextureBuffer(v) => config.render_to_texture_buffer.override_with(v),
            CellEdit::TranslucentPolygonDepthMask(v) => {
                config.translucent_polygon_depth_mask.override_with(v)
            }
            CellEdit::UseReios(v) => config.use_reios.override_with(v),
            CellEdit::Broadcast(v) => config.broadcast.override_with(v),
            CellEdit::EmulateFramebuffer(v) => config.emulate_framebuffer.override_with(v),
            CellEdit::ForceFreePlay(v) => config.force_free_play.override_with(v),
            CellEdit::Cable(v) => config.cable.override_with(v),
        }
    }
}

/// Règle : un ensemble d'identifiants et la modification associée
#[derive(Debug)]
pub struct TitleRule {
    pub ids: &'static [&'static str],
    pub edit: CellEdit,
    /// Message de journal
    pub reason: &'static str,
}

impl TitleRule {
    pub fn matches(&self, game_id: &str) -> bool {
        self.ids.contains(&game_id)
    }
}

/// PBA Tour Bowling 2001 tourne sous Windows CE sans le déclarer
pub const WINDOWS_CE_IDS: &[&str] = &["T26702N"];

/// Règles console, appliquées dans l'ordre
pub static CONSOLE_RULES: &[TitleRule] = &[
    TitleRule {
        ids: &[
            "T13008D 05", // Tony Hawk's Pro Skater 2
            "T13006N",
            "T40205N",    // Tony Hawk's Pro Skater 1
            "T40204D 50", // Tony Hawk's Skateboarding
            "MK-51052",   // Skies of Arcadia
            "HDR-0076",   // Eternal Arcadia
            "MK-51007",   // Flag to Flag
            "HDR-0013",   // Super Speed Racing
            "6108099",    // Yu Suzuki Game Works Vol. 1
            "T2106M",     // L.O.L
            "T18702M",    // Miss Moonlight
            "T40401N",    // Rainbow Six
            "T-45001D05", // Rainbow Six + Eagle Watch
            "MK-51058",   // Jet Grind Radio
            "HDR-0078",   // Jet Set Radio (JP)
            "MK-5105850", // Jet Set Radio (EU)
            "T7016D  50", // Worms World Party
        ],
        edit: CellEdit::RenderToTextureBuffer(true),
        reason: "copie RTT vers la VRAM",
    },
    // Cosmic Smash
    TitleRule {
        ids: &["HDR-0176", "RDC-0057"],
        edit: CellEdit::TranslucentPolygonDepthMask(true),
        reason: "multipasse de profondeur translucide",
    },
    TitleRule {
        ids: &["MK-51182"], // NHL 2K2
        edit: CellEdit::ExtraDepthScale(1_000_000.0),
        reason: "échelle de profondeur",
    },
    TitleRule {
        ids: &["T-8109N", "T8107D  50"], // Re-Volt
        edit: CellEdit::ExtraDepthScale(100.0),
        reason: "échelle de profondeur",
    },
    TitleRule {
        ids: &["T0002M"], // Samurai Shodown 6
        edit: CellEdit::ExtraDepthScale(1e26),
        reason: "échelle de profondeur",
    },
    TitleRule {
        ids: &["T15110N", "T15105D 50"], // Test Drive V-Rally
        edit: CellEdit::ExtraDepthScale(0.1),
        reason: "échelle de profondeur",
    },
    TitleRule {
        ids: &["T-8116N", "T-8112D-50"], // South Park Rally
        edit: CellEdit::ExtraDepthScale(1000.0),
        reason: "échelle de profondeur",
    },
    TitleRule {
        ids: &[
            "T7001D  50", // Jimmy White's 2 Cueball
            "T40505D 50", // Railroad Tycoon 2
            "T18702M",    // Miss Moonlight
            "T0019M",     // KenJu
            "T0020M",     // Force Five
            "HDR-0187",   // Fuurai no Shiren Gaiden
            "T15104D 50", // Slave Zero
        ],
        edit: CellEdit::UseReios(false),
        reason: "BIOS réel obligatoire",
    },
    TitleRule {
        ids: &[
            "T-9707N",    // San Francisco Rush 2049 (US)
            "MK-51146",   // Sega Smash Pack Volume 1
            "T-9702D-50", // Hydro Thunder (PAL)
            "T41601N",    // Elemental Gimmick Gear
        ],
        edit: CellEdit::Broadcast(Broadcast::Ntsc),
        reason: "diffusion NTSC forcée",
    },
    TitleRule {
        ids: &["T-9709D-50"], // San Francisco Rush 2049 (EU)
        edit: CellEdit::Broadcast(Broadcast::Pal),
        reason: "diffusion PAL forcée",
    },
    TitleRule {
        ids: &[
            "T1102M",     // Densha de Go! 2
            "T00000A",    // The Ring of the Nibelungen
            "T15124N 00", // Worms Pinball
        ],
        edit: CellEdit::EmulateFramebuffer(true),
        reason: "émulation complète du framebuffer",
    },
];

/// Titres incompatibles avec la sortie RGB
pub static RGB_BLACKLIST: TitleRule = TitleRule {
    ids: &[
        "T40602N",  // Centipede
        "T9710N",   // Gauntlet Legends
        "MK-51152", // World Series Baseball 2K2
        "T-9701N",  // Mortal Kombat Gold
        "T1203N",   // Street Fighter Alpha 3
        "T1203M",   // Street Fighter Zero 3
        "T13002N",  // Vigilante 8
        "T13003N",  // Toy Story 2
        "T1209N",   // Gigawing (US)
        "T1208M",   // Gigawing (JP)
        "T1235M",   // Vampire Chronicle for Matching Service
        "T22901N",  // Roadsters
    ],
    edit: CellEdit::Cable(Cable::Composite),
    reason: "RGB non supporté, sortie composite",
};

/// Règles arcade, appliquées dans l'ordre
pub static ARCADE_RULES: &[TitleRule] = &[
    TitleRule {
        ids: &["SAMURAI SPIRITS 6"],
        edit: CellEdit::ExtraDepthScale(1e26),
        reason: "échelle de profondeur",
    },
    TitleRule {
        ids: &["COSMIC SMASH IN JAPAN"],
        edit: CellEdit::TranslucentPolygonDepthMask(true),
        reason: "multipasse de profondeur translucide",
    },
    TitleRule {
        ids: &["BEACH SPIKERS JAPAN"],
        edit: CellEdit::RenderToTextureBuffer(true),
        reason: "copie RTT vers la VRAM",
    },
    TitleRule {
        ids: &["RADIRGY NOA"],
        edit: CellEdit::ForceFreePlay(false),
        reason: "jeu libre désactivé",
    },
];

/// Personnalité JVS d'un groupe de titres arcade
#[derive(Debug)]
pub struct JvsProfile {
    pub ids: &'static [&'static str],
    /// Préfixes reconnus en plus des noms exacts
    pub prefixes: &'static [&'static str],
    pub setup: JammaSetup,
}

impl JvsProfile {
    pub fn matches(&self, game_id: &str) -> bool {
        self.ids.contains(&game_id) || self.prefixes.iter().any(|p| game_id.starts_with(p))
    }
}

/// Le premier profil reconnu l'emporte
pub static JVS_PROFILES: &[JvsProfile] = &[
    JvsProfile {
        ids: &[
            "DYNAMIC GOLF",
            "SHOOTOUT POOL",
            "SHOOTOUT POOL MEDAL",
            "CRACKIN'DJ  ver JAPAN",
            "CRACKIN'DJ PART2  ver JAPAN",
            "KICK '4' CASH",
            "DRIVE", // Waiwai Drive
        ],
        prefixes: &[],
        setup: JammaSetup::RotaryEncoders,
    },
    JvsProfile {
        ids: &["POWER STONE 2 JAPAN", "GUILTY GEAR isuka"],
        prefixes: &[],
        setup: JammaSetup::FourPlayers,
    },
    JvsProfile {
        ids: &["SEGA MARINE FISHING JAPAN", "BASS FISHING SIMULATOR VER.A"],
        prefixes: &[],
        setup: JammaSetup::SegaMarineFishing,
    },
    JvsProfile {
        ids: &["RINGOUT 4X4 JAPAN", "VIRTUA ATHLETE"],
        prefixes: &[],
        setup: JammaSetup::DualIOBoards4P,
    },
    JvsProfile {
        ids: &[
            "NINJA ASSAULT",
            "Sports Shooting USA",
            "SEGA CLAY CHALLENGE",
            "RANGER MISSION",
            "EXTREME HUNTING",
            "Fixed BOOT strapper", // Extreme Hunting 2
        ],
        prefixes: &[],
        setup: JammaSetup::LightGun,
    },
    JvsProfile {
        ids: &["MAZAN"],
        prefixes: &[],
        setup: JammaSetup::Mazan,
    },
    JvsProfile {
        ids: &[" BIOHAZARD  GUN SURVIVOR2"],
        prefixes: &[],
        setup: JammaSetup::GunSurvivor,
    },
    JvsProfile {
        ids: &["WORLD KICKS"],
        prefixes: &[],
        setup: JammaSetup::WorldKicks,
    },
    JvsProfile {
        ids: &["WORLD KICKS PCB"],
        prefixes: &[],
        setup: JammaSetup::WorldKicksPCB,
    },
    JvsProfile {
        ids: &[
            "THE TYPING OF THE DEAD",
            " LUPIN THE THIRD  -THE TYPING-",
            "------La Keyboardxyu------",
        ],
        prefixes: &[],
        setup: JammaSetup::Keyboard,
    },
    JvsProfile {
        ids: &["OUTTRIGGER     JAPAN"],
        prefixes: &[],
        setup: JammaSetup::OutTrigger,
    },
    JvsProfile {
        ids: &[
            "THE MAZE OF THE KINGS",
            " CONFIDENTIAL MISSION ---------",
            "DEATH CRIMSON OX",
            "LUPIN THE THIRD  -THE SHOOTING-",
        ],
        // The House of the Dead 2 et ses révisions
        prefixes: &["hotd2"],
        setup: JammaSetup::LightGunAsAnalog,
    },
    JvsProfile {
        ids: &["WAVE RUNNER GP"],
        prefixes: &[],
        setup: JammaSetup::WaveRunnerGP,
    },
    JvsProfile {
        ids: &["  18WHEELER"],
        prefixes: &[],
        setup: JammaSetup::EighteenWheeler,
    },
    JvsProfile {
        ids: &["INU NO OSANPO"],
        prefixes: &[],
        setup: JammaSetup::DogWalking,
    },
    JvsProfile {
        ids: &[" TOUCH DE UNOH -------------", "POKASUKA GHOST (JAPANESE)"],
        prefixes: &[],
        setup: JammaSetup::TouchDeUno,
    },
];
