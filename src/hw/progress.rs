//! Avancement d'un chargement, lu par le frontal pendant `load_game`

use crossbeam::atomic::AtomicCell;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{EmulatorError, Result};

/// Avancement partagé entre le thread de chargement et l'interface
#[derive(Debug, Default)]
pub struct LoadProgress {
    progress: AtomicCell<f32>,
    label: Mutex<String>,
    cancel_requested: AtomicBool,
}

impl LoadProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction chargée, entre 0 et 1
    pub fn progress(&self) -> f32 {
        self.progress.load()
    }

    pub fn set_progress(&self, progress: f32) {
        self.progress.store(progress.clamp(0.0, 1.0));
    }

    pub fn label(&self) -> String {
        self.label.lock().clone()
    }

    pub fn set_label(&self, label: &str) {
        *self.label.lock() = label.to_string();
    }

    /// Demande l'abandon du chargement en cours
    pub fn cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    /// Erreur si l'utilisateur a abandonné le chargement
    pub fn check_cancelled(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(EmulatorError::Content("chargement annulé".to_string()));
        }
        Ok(())
    }
}
