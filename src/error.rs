//! Taxonomie des erreurs remontées au frontal

use thiserror::Error;

/// Erreur unique de l'émulateur, portant un message destiné à l'utilisateur
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EmulatorError {
    /// Le contenu fourni ne correspond à aucun format connu
    #[error("contenu non chargeable: {0}")]
    Content(String),

    /// Aucune image BIOS trouvée dans le répertoire de sauvegarde flash
    #[error("aucun fichier BIOS trouvé dans {0}")]
    BiosMissing(String),

    /// Le moteur de rendu choisi ne sait pas émuler la plateforme choisie
    #[error("moteur de rendu incompatible: {0}")]
    RendererIncompatible(String),

    /// Un composant matériel (CPU, mémoire, DSP, rasteriseur) a refusé de s'initialiser
    #[error("échec d'initialisation matérielle: {0}")]
    HardwareInit(String),

    /// Erreur levée depuis la boucle d'exécution SH4
    #[error("erreur d'exécution: {0}")]
    Runtime(String),

    /// Échec de la couche rollback ou de la négociation réseau
    #[error("erreur réseau: {0}")]
    Network(String),

    /// Stockage de configuration illisible ou invalide
    #[error("configuration invalide: {0}")]
    Config(String),
}

impl From<std::io::Error> for EmulatorError {
    fn from(err: std::io::Error) -> Self {
        EmulatorError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for EmulatorError {
    fn from(err: toml::de::Error) -> Self {
        EmulatorError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for EmulatorError {
    fn from(err: toml::ser::Error) -> Self {
        EmulatorError::Config(err.to_string())
    }
}

/// Résultat spécialisé de la crate
pub type Result<T> = std::result::Result<T, EmulatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    /// Test des messages d'erreur
    #[test]
    fn test_error_messages() {
        let err = EmulatorError::BiosMissing("/data".to_string());
        assert!(err.to_string().contains("/data"));

        let err: EmulatorError = std::io::Error::new(std::io::ErrorKind::NotFound, "absent").into();
        assert!(matches!(err, EmulatorError::Config(_)));
    }
}
