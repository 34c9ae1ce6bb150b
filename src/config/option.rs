//! Cellules d'option : valeur globale, valeur du titre, surcharge transitoire

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{EmulatorError, Result};

/// Valeur de configuration réglable
///
/// La lecture renvoie la surcharge transitoire si elle existe, sinon la
/// valeur propre au titre chargé, sinon la valeur globale. Une cellule
/// verrouillée par l'utilisateur (`lock`) n'est plus rechargée depuis le
/// stockage.
#[derive(Debug, Clone)]
pub struct OptionCell<T> {
    key: &'static str,
    default: T,
    value: T,
    /// Valeur de la section `[game."<id>"]`
    game_value: Option<T>,
    transient: Option<T>,
    read_only: bool,
}

impl<T: Clone + PartialEq> OptionCell<T> {
    pub fn new(key: &'static str, default: T) -> Self {
        Self {
            key,
            value: default.clone(),
            default,
            game_value: None,
            transient: None,
            read_only: false,
        }
    }

    /// Valeur effective
    pub fn get(&self) -> T {
        self.transient.as_ref().unwrap_or_else(|| self.persistent()).clone()
    }

    /// Valeur persistante, surcharge ignorée
    pub fn persistent(&self) -> &T {
        self.game_value.as_ref().unwrap_or(&self.value)
    }

    /// Valeur globale, hors section du titre
    pub fn global(&self) -> &T {
        &self.value
    }

    /// Modifie la valeur persistante
    ///
    /// Une cellule réglée par la section du titre reste propre au titre.
    pub fn set(&mut self, value: T) {
        match &mut self.game_value {
            Some(game_value) => *game_value = value,
            None => self.value = value,
        }
    }

    /// Vrai si la section du titre chargé fixe cette cellule
    pub fn is_per_game(&self) -> bool {
        self.game_value.is_some()
    }

    /// Pose une surcharge transitoire, valable pour le titre en cours
    pub fn override_with(&mut self, value: T) {
        self.transient = Some(value);
    }

    pub fn reset_override(&mut self) {
        self.transient = None;
    }

    pub fn is_overridden(&self) -> bool {
        self.transient.is_some()
    }

    /// Fixe la valeur persistante et la protège des rechargements
    pub fn lock(&mut self, value: T) {
        self.value = value;
        self.game_value = None;
        self.read_only = true;
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }
}

impl<T: Clone + PartialEq> PartialEq<T> for OptionCell<T> {
    fn eq(&self, other: &T) -> bool {
        self.get() == *other
    }
}

/// Vue homogène sur les cellules, quel que soit leur type
pub trait ConfigCell {
    /// Clé dans le fichier de configuration
    fn key(&self) -> &'static str;

    fn reset_override(&mut self);

    fn is_overridden(&self) -> bool;

    fn is_read_only(&self) -> bool;

    /// Revient à la valeur par défaut (sauf cellule verrouillée) et oublie
    /// la valeur du titre
    fn restore_default(&mut self);

    fn clear_game_value(&mut self);

    /// Charge la valeur globale depuis une valeur TOML
    fn load_value(&mut self, value: &toml::Value) -> Result<()>;

    /// Charge la valeur propre au titre depuis une valeur TOML
    fn load_game_value(&mut self, value: &toml::Value) -> Result<()>;

    /// Valeur globale sous forme TOML
    fn to_value(&self) -> Result<toml::Value>;

    /// Valeur propre au titre sous forme TOML, si elle existe
    fn game_to_value(&self) -> Result<Option<toml::Value>>;
}

impl<T> ConfigCell for OptionCell<T>
where
    T: Clone + PartialEq + Serialize + DeserializeOwned,
{
    fn key(&self) -> &'static str {
        self.key
    }

    fn reset_override(&mut self) {
        self.transient = None;
    }

    fn is_overridden(&self) -> bool {
        self.transient.is_some()
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn restore_default(&mut self) {
        self.game_value = None;
        if !self.read_only {
            self.value = self.default.clone();
        }
    }

    fn clear_game_value(&mut self) {
        self.game_value = None;
    }

    fn load_value(&mut self, value: &toml::Value) -> Result<()> {
        if self.read_only {
            return Ok(());
        }
        self.value = self.parse(value)?;
        Ok(())
    }

    fn load_game_value(&mut self, value: &toml::Value) -> Result<()> {
        if self.read_only {
            return Ok(());
        }
        self.game_value = Some(self.parse(value)?);
        Ok(())
    }

    fn to_value(&self) -> Result<toml::Value> {
        self.serialize(&self.value)
    }

    fn game_to_value(&self) -> Result<Option<toml::Value>> {
        self.game_value.as_ref().map(|v| self.serialize(v)).transpose()
    }
}

impl<T> OptionCell<T>
where
    T: Clone + PartialEq + Serialize + DeserializeOwned,
{
    fn parse(&self, value: &toml::Value) -> Result<T> {
        value
            .clone()
            .try_into::<T>()
            .map_err(|e| EmulatorError::Config(format!("{}: {}", self.key, e)))
    }

    fn serialize(&self, value: &T) -> Result<toml::Value> {
        toml::Value::try_from(value).map_err(|e| EmulatorError::Config(format!("{}: {}", self.key, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test de la surcharge transitoire
    #[test]
    fn test_override_shadows_persistent() {
        let mut cell = OptionCell::new("full_mmu", false);
        assert!(!cell.get());

        cell.override_with(true);
        assert!(cell.get());
        assert!(!*cell.persistent());
        assert!(cell.is_overridden());

        cell.reset_override();
        assert!(!cell.get());
    }

    /// Test de la superposition de la valeur du titre
    #[test]
    fn test_game_value_layer() -> Result<()> {
        let mut cell = OptionCell::new("region", 1u32);
        cell.load_game_value(&toml::Value::Integer(2))?;
        assert_eq!(cell.get(), 2);
        assert_eq!(*cell.global(), 1);

        // Une modification reste propre au titre
        cell.set(3);
        assert_eq!(cell.get(), 3);
        assert_eq!(*cell.global(), 1);
        assert_eq!(cell.game_to_value()?, Some(toml::Value::Integer(3)));

        cell.clear_game_value();
        assert_eq!(cell.get(), 1);
        assert_eq!(cell.game_to_value()?, None);
        Ok(())
    }

    /// Test d'une cellule verrouillée
    #[test]
    fn test_locked_cell_ignores_storage() -> Result<()> {
        let mut cell = OptionCell::new("use_reios", true);
        cell.lock(false);
        cell.load_value(&toml::Value::Boolean(true))?;
        cell.restore_default();
        assert!(!cell.get());
        assert!(cell.is_read_only());
        Ok(())
    }

    /// Test d'une valeur TOML du mauvais type
    #[test]
    fn test_load_value_type_mismatch() {
        let mut cell = OptionCell::new("extra_depth_scale", 1.0f32);
        let result = cell.load_value(&toml::Value::String("beaucoup".to_string()));
        assert!(matches!(result, Err(EmulatorError::Config(_))));
        assert_eq!(cell.get(), 1.0);
    }
}
