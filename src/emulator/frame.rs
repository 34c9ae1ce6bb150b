//! Pilotage image par image et chien de garde
//!
//! En mode non threadé l'hôte appelle `render` à chaque image ; en mode
//! threadé un thread d'émulation exécute le SH4 en boucle et l'hôte se
//! contente de présenter les images et de surveiller ce thread.

use log::{error, warn};
use std::sync::atomic::Ordering;
use std::thread;

use super::{EmuState, Emulator};
use crate::error::{EmulatorError, Result};
use crate::events::Event;

/// Délai au-delà duquel une image est déclarée bloquée (≈ 50ms à 200MHz)
pub const FRAME_TIMEOUT_CYCLES: u64 = 10_000_000;

impl Emulator {
    /// Exécute une image
    ///
    /// Toute erreur fait passer la machine en `Error` et diffuse `Pause`
    /// avant d'être remontée.
    pub fn run(&self) -> Result<()> {
        if self.state() != EmuState::Running {
            return Err(EmulatorError::Runtime(format!(
                "exécution impossible dans l'état {:?}",
                self.state()
            )));
        }
        self.begin_frame();
        match self.run_internal() {
            Ok(()) => {
                if self.machine.network.rollback_active() {
                    self.machine.network.next_frame();
                }
                Ok(())
            }
            Err(err) => {
                error!("Erreur d'exécution: {}", err);
                self.set_network_state(false);
                self.set_state(EmuState::Error);
                self.cpu().stop();
                self.events.broadcast(Event::Pause);
                Err(err)
            }
        }
    }

    fn begin_frame(&self) {
        self.start_time
            .store(self.machine.scheduler.now(), Ordering::SeqCst);
        self.render_timeout.store(false, Ordering::SeqCst);
    }

    fn run_internal(&self) -> Result<()> {
        let cpu = self.cpu();

        if self.single_step.load(Ordering::SeqCst) {
            cpu.step()?;
            self.single_step.store(false, Ordering::SeqCst);
            return Ok(());
        }

        let range = *self.step_range.lock();
        if let Some((from, to)) = range {
            while (from..=to).contains(&cpu.pc()) {
                cpu.step()?;
            }
            *self.step_range.lock() = None;
            return Ok(());
        }

        // Une réinitialisation demandée pendant l'image est traitée au
        // retour du CPU, puis l'exécution reprend
        loop {
            cpu.run()?;
            if !self.reset_requested.swap(false, Ordering::SeqCst) {
                return Ok(());
            }
            self.save_rom_files();
            self.dc_reset(false);
        }
    }

    /// Produit une image
    ///
    /// Renvoie `false` si aucune image n'a été produite (machine arrêtée,
    /// image hors délai, thread d'émulation terminé).
    pub fn render(&self) -> Result<bool> {
        if !self.threaded.load(Ordering::SeqCst) {
            if self.state() != EmuState::Running {
                self.drain_stop_request();
                return Ok(false);
            }
            self.run()?;
            self.drain_stop_request();
            return Ok(!self.render_timeout.load(Ordering::SeqCst));
        }
        if !self.check_status()? {
            return Ok(false);
        }
        if self.state() != EmuState::Running {
            return Ok(false);
        }
        Ok(self.machine.rasterizer.render_single_frame(true))
    }

    /// Retour de balayage vertical
    ///
    /// Diffuse `VBlank` puis applique le chien de garde : passé le délai,
    /// l'image est déclarée hors délai et le CPU rend la main.
    pub fn vblank(&self) {
        self.events.broadcast(Event::VBlank);

        let elapsed = self
            .machine
            .scheduler
            .now()
            .saturating_sub(self.start_time.load(Ordering::SeqCst));
        if elapsed <= FRAME_TIMEOUT_CYCLES {
            return;
        }
        self.render_timeout.store(true, Ordering::SeqCst);
        if self.machine.network.rollback_active() {
            self.machine.network.end_of_frame();
        } else if !self.threaded.load(Ordering::SeqCst) {
            self.cpu().stop();
        }
    }

    /// Vrai si la dernière image a dépassé le délai
    pub fn render_timed_out(&self) -> bool {
        self.render_timeout.load(Ordering::SeqCst)
    }

    /// Interroge le thread d'émulation sans bloquer
    ///
    /// Renvoie `true` tant qu'il tourne ; son erreur éventuelle est
    /// remontée après diffusion de `Pause`.
    pub fn check_status(&self) -> Result<bool> {
        let handle = {
            let mut emu_thread = self.emu_thread.lock();
            let finished = match emu_thread.as_ref() {
                None => return Ok(false),
                Some(handle) => handle.is_finished(),
            };
            if !finished {
                return Ok(true);
            }
            emu_thread.take()
        };
        let result = match handle {
            Some(handle) => join_result(handle),
            None => Ok(()),
        };
        if let Err(err) = result {
            self.events.broadcast(Event::Pause);
            return Err(err);
        }
        Ok(false)
    }

    pub(super) fn spawn_emulation_thread(&self) -> Result<()> {
        let mut emu_thread = self.emu_thread.lock();
        if emu_thread.is_some() {
            return Err(EmulatorError::Runtime("thread d'émulation déjà actif".to_string()));
        }
        let emu = self
            .this
            .upgrade()
            .ok_or_else(|| EmulatorError::Runtime("coordinateur libéré".to_string()))?;
        let handle = thread::Builder::new()
            .name("sh4".to_string())
            .spawn(move || emu.emulation_loop())
            .map_err(|e| EmulatorError::HardwareInit(format!("thread d'émulation: {}", e)))?;
        *emu_thread = Some(handle);
        Ok(())
    }

    /// Attend la fin du thread d'émulation ; son erreur n'est que journalisée
    pub(super) fn join_emulation_thread(&self) {
        let handle = self.emu_thread.lock().take();
        if let Some(handle) = handle {
            if let Err(err) = join_result(handle) {
                warn!("{}", err);
            }
        }
    }

    fn emulation_loop(&self) -> Result<()> {
        self.machine.audio.init();

        match self.emulate_frames() {
            Ok(()) => {
                self.machine.audio.term();
                Ok(())
            }
            Err(err) => {
                error!("Erreur dans le thread d'émulation: {}", err);
                self.set_network_state(false);
                self.set_state(EmuState::Error);
                self.cpu().stop();
                self.machine.audio.term();
                Err(err)
            }
        }
    }

    fn emulate_frames(&self) -> Result<()> {
        while self.state() == EmuState::Running
            || self.single_step.load(Ordering::SeqCst)
            || self.step_range.lock().is_some()
        {
            self.begin_frame();
            self.run_internal()?;
            if !self.machine.network.next_frame() {
                break;
            }
        }
        Ok(())
    }

    /// Termine un arrêt différé : coupe l'audio et diffuse `Pause`
    pub(super) fn drain_stop_request(&self) {
        if self.stop_requested.swap(false, Ordering::SeqCst) {
            self.machine.audio.term();
            self.save_rom_files();
            self.events.broadcast(Event::Pause);
        }
    }
}

fn join_result(handle: thread::JoinHandle<Result<()>>) -> Result<()> {
    handle
        .join()
        .unwrap_or_else(|_| Err(EmulatorError::Runtime("le thread d'émulation a paniqué".to_string())))
}
