//! Catalogue des jeux présents dans les répertoires de contenu
//!
//! Le parcours tourne dans un thread dédié et peut être interrompu à tout
//! moment. Les jeux console apparaissent au fil du parcours, les jeux
//! arcade sont ajoutés à la fin.

use log::{debug, error, info, warn};
use parking_lot::{Mutex, MutexGuard};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use walkdir::WalkDir;

use super::ArcadeRomTable;
use crate::config::SettingsStore;
use crate::platform::file_extension;

/// Au-delà de ce nombre de répertoires sans jeu, le chemin semble erroné
const MAX_EMPTY_FOLDERS: u32 = 1000;

/// Entrée du catalogue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameMedia {
    /// Nom affiché
    pub name: String,
    pub path: PathBuf,
    /// Titre du jeu (description de la table arcade, sinon nom du fichier)
    pub game_name: String,
}

/// Insertion triée par nom affiché, après les entrées de même nom
fn insert_sorted(list: &mut Vec<GameMedia>, game: GameMedia) {
    let pos = list.partition_point(|g| g.name <= game.name);
    list.insert(pos, game);
}

enum MediaKind {
    Console,
    Arcade,
    Ignored,
}

struct ScanState {
    store: Arc<SettingsStore>,
    table: Arc<ArcadeRomTable>,
    game_list: Mutex<Vec<GameMedia>>,
    running: AtomicBool,
    scan_done: AtomicBool,
    empty_folders_scanned: AtomicU32,
    content_path_looks_incorrect: AtomicBool,
}

impl ScanState {
    fn scan(&self) {
        let (content_paths, hide_legacy) = {
            let config = self.store.config();
            (config.content_path.get(), config.hide_legacy_naomi_roms.get())
        };

        self.game_list.lock().clear();
        let mut arcade_games = Vec::new();
        for path in &content_paths {
            self.add_game_directory(Path::new(path), hide_legacy, &mut arcade_games);
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
        }

        let mut game_list = self.game_list.lock();
        game_list.extend(arcade_games);
        info!("{} jeu(x) trouvé(s)", game_list.len());
        drop(game_list);

        if self.running.load(Ordering::SeqCst) {
            self.scan_done.store(true, Ordering::SeqCst);
        }
        self.running.store(false, Ordering::SeqCst);
    }

    fn add_game_directory(&self, root: &Path, hide_legacy: bool, arcade_games: &mut Vec<GameMedia>) {
        debug!("Parcours de {}", root.display());
        let mut last_folder: Option<PathBuf> = None;

        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Erreur de lecture: {}", e);
                    continue;
                }
            };

            let folder = if entry.file_type().is_dir() {
                entry.path()
            } else {
                entry.path().parent().unwrap_or(root)
            };
            if self.game_list.lock().is_empty() && arcade_games.is_empty() {
                if last_folder.as_deref() != Some(folder) {
                    last_folder = Some(folder.to_path_buf());
                    let scanned = self.empty_folders_scanned.fetch_add(1, Ordering::SeqCst) + 1;
                    if scanned > MAX_EMPTY_FOLDERS {
                        self.content_path_looks_incorrect.store(true, Ordering::SeqCst);
                    }
                }
            } else {
                self.content_path_looks_incorrect.store(false, Ordering::SeqCst);
            }

            if !entry.file_type().is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().to_string();
            // Fichiers de ressources macOS
            if file_name.starts_with("._") {
                continue;
            }
            let path = entry.path();
            let basename = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();

            match self.classify(&file_name, &basename, hide_legacy) {
                (MediaKind::Console, _) => {
                    insert_sorted(
                        &mut self.game_list.lock(),
                        GameMedia {
                            name: file_name,
                            path: path.to_path_buf(),
                            game_name: basename,
                        },
                    );
                }
                (MediaKind::Arcade, Some(description)) => {
                    insert_sorted(
                        arcade_games,
                        GameMedia {
                            name: format!("{} ({})", file_name, description),
                            path: path.to_path_buf(),
                            game_name: description,
                        },
                    );
                }
                (MediaKind::Arcade, None) => {
                    insert_sorted(
                        arcade_games,
                        GameMedia {
                            name: file_name,
                            path: path.to_path_buf(),
                            game_name: basename,
                        },
                    );
                }
                (MediaKind::Ignored, _) => {}
            }
        }
    }

    /// Type de média et, pour les archives arcade, titre du jeu
    fn classify(&self, file_name: &str, basename: &str, hide_legacy: bool) -> (MediaKind, Option<String>) {
        match file_extension(Path::new(file_name)).as_str() {
            "zip" | "7z" => match self.table.find(basename) {
                Some(game) => (MediaKind::Arcade, Some(game.description.clone())),
                None => (MediaKind::Ignored, None),
            },
            "bin" | "lst" | "dat" if hide_legacy => (MediaKind::Ignored, None),
            "bin" | "lst" | "dat" => (MediaKind::Arcade, None),
            // Images GD-ROM des bornes NAOMI
            "chd" | "gdi" if self.table.is_gdrom(basename) => (MediaKind::Ignored, None),
            "chd" | "gdi" | "cdi" | "cue" => (MediaKind::Console, None),
            _ => (MediaKind::Ignored, None),
        }
    }
}

/// Parcours asynchrone des répertoires de contenu
pub struct GameScanner {
    state: Arc<ScanState>,
    scan_thread: Mutex<Option<JoinHandle<()>>>,
}

impl GameScanner {
    pub fn new(store: Arc<SettingsStore>, table: Arc<ArcadeRomTable>) -> Self {
        Self {
            state: Arc::new(ScanState {
                store,
                table,
                game_list: Mutex::new(Vec::new()),
                running: AtomicBool::new(false),
                scan_done: AtomicBool::new(false),
                empty_folders_scanned: AtomicU32::new(0),
                content_path_looks_incorrect: AtomicBool::new(false),
            }),
            scan_thread: Mutex::new(None),
        }
    }

    /// Lance le parcours s'il n'est ni en cours ni déjà terminé
    pub fn fetch_game_list(&self) {
        let mut scan_thread = self.scan_thread.lock();
        if self.state.scan_done.load(Ordering::SeqCst) || self.state.running.load(Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = scan_thread.take() {
            let _ = handle.join();
        }

        self.state.running.store(true, Ordering::SeqCst);
        let state = self.state.clone();
        match thread::Builder::new()
            .name("game-scanner".to_string())
            .spawn(move || state.scan())
        {
            Ok(handle) => *scan_thread = Some(handle),
            Err(e) => {
                error!("Impossible de lancer le parcours des jeux: {}", e);
                self.state.running.store(false, Ordering::SeqCst);
            }
        }
    }

    /// Interrompt le parcours et attend la fin du thread
    pub fn stop(&self) {
        let mut scan_thread = self.scan_thread.lock();
        self.state.running.store(false, Ordering::SeqCst);
        self.state.empty_folders_scanned.store(0, Ordering::SeqCst);
        self.state.content_path_looks_incorrect.store(false, Ordering::SeqCst);
        if let Some(handle) = scan_thread.take() {
            let _ = handle.join();
        }
    }

    /// Abandonne le catalogue courant pour permettre un nouveau parcours
    pub fn refresh(&self) {
        self.stop();
        self.state.scan_done.store(false, Ordering::SeqCst);
    }

    /// Attend la fin du parcours en cours sans l'interrompre
    pub fn wait(&self) {
        let handle = self.scan_thread.lock().take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    /// Catalogue courant : jeux console puis jeux arcade
    ///
    /// Le verrou reste pris tant que la garde est vivante.
    pub fn game_list(&self) -> MutexGuard<'_, Vec<GameMedia>> {
        self.state.game_list.lock()
    }

    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::SeqCst)
    }

    pub fn is_scan_done(&self) -> bool {
        self.state.scan_done.load(Ordering::SeqCst)
    }

    pub fn empty_folders_scanned(&self) -> u32 {
        self.state.empty_folders_scanned.load(Ordering::SeqCst)
    }

    pub fn content_path_looks_incorrect(&self) -> bool {
        self.state.content_path_looks_incorrect.load(Ordering::SeqCst)
    }
}

impl Drop for GameScanner {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(name: &str) -> GameMedia {
        GameMedia {
            name: name.to_string(),
            path: PathBuf::from(name),
            game_name: String::new(),
        }
    }

    /// Test de l'insertion triée
    #[test]
    fn test_insert_sorted() {
        let mut list = Vec::new();
        for name in ["b.cdi", "a.gdi", "c.cue", "a.gdi"] {
            insert_sorted(&mut list, media(name));
        }
        let names: Vec<&str> = list.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["a.gdi", "a.gdi", "b.cdi", "c.cue"]);
    }

    /// Test du classement des fichiers
    #[test]
    fn test_classify() {
        let state = ScanState {
            store: Arc::new(SettingsStore::new()),
            table: Arc::new(ArcadeRomTable::new()),
            game_list: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
            scan_done: AtomicBool::new(false),
            empty_folders_scanned: AtomicU32::new(0),
            content_path_looks_incorrect: AtomicBool::new(false),
        };

        assert!(matches!(state.classify("mvsc2.zip", "mvsc2", true), (MediaKind::Arcade, Some(_))));
        assert!(matches!(state.classify("nope.zip", "nope", true), (MediaKind::Ignored, None)));
        assert!(matches!(state.classify("game.bin", "game", true), (MediaKind::Ignored, None)));
        assert!(matches!(state.classify("game.bin", "game", false), (MediaKind::Arcade, None)));
        assert!(matches!(state.classify("gdl-0010.gdi", "gdl-0010", true), (MediaKind::Ignored, None)));
        assert!(matches!(state.classify("sonic.GDI", "sonic", true), (MediaKind::Console, None)));
        assert!(matches!(state.classify("readme.txt", "readme", true), (MediaKind::Ignored, None)));
    }
}
