//! Table des jeux d'arcade connus (NAOMI, NAOMI 2, Atomiswave)

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::platform::Platform;

/// Entrée de la table des ROMs arcade
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArcadeGame {
    /// Nom court (nom de l'archive sans extension)
    pub name: String,

    /// Titre complet affiché dans le catalogue
    pub description: String,

    /// Système cible
    pub platform: Platform,

    /// Image GD-ROM associée, le cas échéant
    #[serde(default)]
    pub gdrom_name: Option<String>,
}

/// Jeux intégrés : (nom, description, plateforme, GD-ROM)
const KNOWN_GAMES: &[(&str, &str, Platform, Option<&str>)] = &[
    // NAOMI
    ("18wheelr", "18 Wheeler: American Pro Trucker", Platform::Naomi, None),
    ("capsnk", "Capcom Vs. SNK Millennium Fight 2000", Platform::Naomi, None),
    ("crzytaxi", "Crazy Taxi", Platform::Naomi, None),
    ("cspike", "Cannon Spike / Gun Spike", Platform::Naomi, None),
    ("doa2", "Dead or Alive 2", Platform::Naomi, None),
    ("ggx", "Guilty Gear X", Platform::Naomi, None),
    ("hotd2", "The House of the Dead 2", Platform::Naomi, None),
    ("inunoos", "Inu No Osanpo / Dog Walking", Platform::Naomi, None),
    ("kick4csh", "Kick '4' Cash", Platform::Naomi, None),
    ("mazan", "Mazan: Flash of the Blade", Platform::Naomi, None),
    ("mvsc2", "Marvel Vs. Capcom 2 New Age of Heroes", Platform::Naomi, None),
    ("ninjaslt", "Ninja Assault", Platform::Naomi, None),
    ("pstone2", "Power Stone 2", Platform::Naomi, None),
    ("shootopl", "Shootout Pool", Platform::Naomi, None),
    ("smarinef", "Sega Marine Fishing", Platform::Naomi, None),
    ("tduno", "Touch de Uno!", Platform::Naomi, None),
    ("wldkicks", "World Kicks", Platform::Naomi, None),
    ("wrungp", "Wave Runner GP", Platform::Naomi, None),
    ("wwfroyal", "WWF Royal Rumble", Platform::Naomi, None),
    // NAOMI GD-ROM
    ("ikaruga", "Ikaruga (GDL-0010)", Platform::Naomi, Some("gdl-0010")),
    ("ggxx", "Guilty Gear XX (GDL-0011)", Platform::Naomi, Some("gdl-0011")),
    ("trizeal", "Trizeal (GDL-0026)", Platform::Naomi, Some("gdl-0026")),
    ("meltyb", "Melty Blood Act Cadenza (GDL-0028)", Platform::Naomi, Some("gdl-0028")),
    ("radirgy", "Radirgy (GDL-0032)", Platform::Naomi, Some("gdl-0032")),
    // NAOMI 2
    ("beachspi", "Beach Spikers (GDS-0014)", Platform::Naomi2, Some("gds-0014")),
    ("clubkrt", "Club Kart: European Session", Platform::Naomi2, None),
    ("initd", "Initial D Arcade Stage (GDS-0020)", Platform::Naomi2, Some("gds-0020")),
    ("vf4", "Virtua Fighter 4 (GDS-0012)", Platform::Naomi2, Some("gds-0012")),
    ("vstrik3", "Virtua Striker 3", Platform::Naomi2, None),
    // Atomiswave
    ("dolphin", "Dolphin Blue", Platform::Atomiswave, None),
    ("ftspeed", "Faster Than Speed", Platform::Atomiswave, None),
    ("ggisuka", "Guilty Gear Isuka", Platform::Atomiswave, None),
    ("kofnw", "The King of Fighters Neowave", Platform::Atomiswave, None),
    ("kov7sprt", "Knights of Valour - The Seven Spirits", Platform::Atomiswave, None),
    ("mslug6", "Metal Slug 6", Platform::Atomiswave, None),
    ("ngbc", "NeoGeo Battle Coliseum", Platform::Atomiswave, None),
    ("rumblef", "The Rumble Fish", Platform::Atomiswave, None),
    ("samsptk", "Samurai Spirits Tenkaichi Kenkakuden", Platform::Atomiswave, None),
    ("sprtshot", "Sports Shooting USA", Platform::Atomiswave, None),
    ("xtrmhunt", "Extreme Hunting", Platform::Atomiswave, None),
];

/// Table indexée par nom court en minuscules
#[derive(Debug, Clone, Default)]
pub struct ArcadeRomTable {
    games: HashMap<String, ArcadeGame>,
    gdroms: HashSet<String>,
}

impl ArcadeRomTable {
    /// Table contenant les jeux intégrés
    pub fn new() -> Self {
        let mut table = Self::empty();
        for &(name, description, platform, gdrom_name) in KNOWN_GAMES {
            table.add_game(ArcadeGame {
                name: name.to_string(),
                description: description.to_string(),
                platform,
                gdrom_name: gdrom_name.map(str::to_string),
            });
        }
        table
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn add_game(&mut self, game: ArcadeGame) {
        if let Some(gdrom) = &game.gdrom_name {
            self.gdroms.insert(gdrom.to_lowercase());
        }
        self.games.insert(game.name.to_lowercase(), game);
    }

    /// Recherche par nom de fichier sans extension, casse ignorée
    pub fn find(&self, basename: &str) -> Option<&ArcadeGame> {
        self.games.get(&basename.to_lowercase())
    }

    /// Vrai si ce nom désigne l'image GD-ROM d'un jeu arcade
    pub fn is_gdrom(&self, basename: &str) -> bool {
        self.gdroms.contains(&basename.to_lowercase())
    }

    pub fn list_games(&self) -> Vec<&ArcadeGame> {
        self.games.values().collect()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Complète la table depuis un fichier JSON (liste d'entrées)
    pub fn load_from_file(&mut self, path: &str) -> anyhow::Result<()> {
        let content = std::fs::read_to_string(path)?;
        let games: Vec<ArcadeGame> = serde_json::from_str(&content)?;

        for game in games {
            self.add_game(game);
        }

        Ok(())
    }

    /// Sauvegarde la table dans un fichier JSON
    pub fn save_to_file(&self, path: &str) -> anyhow::Result<()> {
        let mut games: Vec<&ArcadeGame> = self.games.values().collect();
        games.sort_by(|a, b| a.name.cmp(&b.name));
        let content = serde_json::to_string_pretty(&games)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Test de la table intégrée
    #[test]
    fn test_builtin_table() {
        let table = ArcadeRomTable::new();
        assert!(table.len() >= 30);

        let game = table.find("MVSC2").unwrap();
        assert_eq!(game.platform, Platform::Naomi);
        assert_eq!(table.find("kofnw").unwrap().platform, Platform::Atomiswave);
        assert!(table.find("unknown_game").is_none());
    }

    /// Test de l'index des images GD-ROM
    #[test]
    fn test_gdrom_index() {
        let table = ArcadeRomTable::new();
        assert!(table.is_gdrom("gdl-0010"));
        assert!(table.is_gdrom("GDS-0012"));
        assert!(!table.is_gdrom("ikaruga"));
    }

    /// Test de l'aller-retour JSON
    #[test]
    fn test_json_round_trip() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("arcade.json");
        let path = path.to_string_lossy().to_string();

        let mut custom = ArcadeRomTable::empty();
        custom.add_game(ArcadeGame {
            name: "homebrew".to_string(),
            description: "Homebrew Test".to_string(),
            platform: Platform::Naomi2,
            gdrom_name: Some("gdx-9999".to_string()),
        });
        custom.save_to_file(&path)?;

        let mut table = ArcadeRomTable::new();
        let before = table.len();
        table.load_from_file(&path)?;
        assert_eq!(table.len(), before + 1);
        assert_eq!(table.find("homebrew").unwrap().platform, Platform::Naomi2);
        assert!(table.is_gdrom("gdx-9999"));
        Ok(())
    }
}
