//! En-tête d'amorçage IP.BIN des disques Dreamcast
//!
//! Les 256 premiers octets de la piste de données décrivent le titre :
//! identifiant produit, régions supportées, périphériques et capacités
//! matérielles (VGA, Windows CE).

use bitflags::bitflags;

/// Taille de l'en-tête IP.BIN
pub const IP_HEADER_SIZE: usize = 0x100;

/// Signature attendue en tête de disque
pub const HARDWARE_ID: &str = "SEGA SEGAKATANA";

/// Fichier d'amorçage des titres Windows CE
const WINCE_BOOT_FILE: &str = "0WINCEOS.BIN";

bitflags! {
    /// Champ périphériques (7 chiffres hexadécimaux)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Peripherals: u32 {
        const WINDOWS_CE = 1 << 0;
        const VGA = 1 << 4;
        const OTHER_EXPANSIONS = 1 << 8;
        const PURU_PURU = 1 << 9;
        const MICROPHONE = 1 << 10;
        const MEMORY_CARD = 1 << 11;
        const START_A_B_DIR = 1 << 12;
        const C_BUTTON = 1 << 13;
        const D_BUTTON = 1 << 14;
        const X_BUTTON = 1 << 15;
        const Y_BUTTON = 1 << 16;
        const Z_BUTTON = 1 << 17;
        const EXPANDED_DIR = 1 << 18;
        const ANALOG_R = 1 << 19;
        const ANALOG_L = 1 << 20;
        const ANALOG_H = 1 << 21;
        const ANALOG_V = 1 << 22;
        const EXPANDED_ANALOG = 1 << 23;
        const GUN = 1 << 24;
        const KEYBOARD = 1 << 25;
        const MOUSE = 1 << 26;
    }
}

/// Métadonnées extraites de l'en-tête
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpMeta {
    pub hardware_id: String,
    pub maker_id: String,
    pub device_info: String,
    /// Symboles de région (`J`, `U`, `E`)
    pub area_symbols: String,
    pub peripherals: Peripherals,
    /// Identifiant produit sur 10 octets, espaces conservés
    pub product_number: String,
    pub product_version: String,
    pub release_date: String,
    pub boot_filename: String,
    pub software_company: String,
    pub software_name: String,
}

fn field(data: &[u8], offset: usize, len: usize) -> String {
    data[offset..offset + len].iter().map(|&b| b as char).collect()
}

impl IpMeta {
    /// Décode un en-tête brut ; `None` si le tampon est trop court
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < IP_HEADER_SIZE {
            return None;
        }
        let peripherals = u32::from_str_radix(field(data, 0x38, 7).trim(), 16).unwrap_or(0);
        Some(Self {
            hardware_id: field(data, 0x00, 16),
            maker_id: field(data, 0x10, 16),
            device_info: field(data, 0x20, 16),
            area_symbols: field(data, 0x30, 8),
            peripherals: Peripherals::from_bits_truncate(peripherals),
            product_number: field(data, 0x40, 10),
            product_version: field(data, 0x4A, 6),
            release_date: field(data, 0x50, 16),
            boot_filename: field(data, 0x60, 16),
            software_company: field(data, 0x70, 16),
            software_name: field(data, 0x80, 128),
        })
    }

    /// Vrai si l'en-tête porte la signature Dreamcast
    pub fn is_valid(&self) -> bool {
        self.hardware_id.starts_with(HARDWARE_ID)
    }

    /// Identifiant produit sans les espaces de fin
    pub fn game_id(&self) -> String {
        self.product_number.trim_end().to_string()
    }

    pub fn is_windows_ce(&self) -> bool {
        self.boot_filename.starts_with(WINCE_BOOT_FILE)
            || self.peripherals.contains(Peripherals::WINDOWS_CE)
    }

    pub fn supports_vga(&self) -> bool {
        self.peripherals.contains(Peripherals::VGA)
    }

    pub fn supports_japan(&self) -> bool {
        self.area_symbols.contains('J')
    }

    pub fn supports_usa(&self) -> bool {
        self.area_symbols.contains('U')
    }

    pub fn supports_europe(&self) -> bool {
        self.area_symbols.contains('E')
    }

    /// Construit un en-tête brut, utile pour les images de test
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = vec![b' '; IP_HEADER_SIZE];
        let mut put = |offset: usize, len: usize, value: &str| {
            for (i, b) in value.bytes().take(len).enumerate() {
                data[offset + i] = b;
            }
        };
        put(0x00, 16, &self.hardware_id);
        put(0x10, 16, &self.maker_id);
        put(0x20, 16, &self.device_info);
        put(0x30, 8, &self.area_symbols);
        put(0x38, 8, &format!("{:07X}", self.peripherals.bits()));
        put(0x40, 10, &self.product_number);
        put(0x4A, 6, &self.product_version);
        put(0x50, 16, &self.release_date);
        put(0x60, 16, &self.boot_filename);
        put(0x70, 16, &self.software_company);
        put(0x80, 128, &self.software_name);
        data
    }

    /// En-tête minimal pour un identifiant et des régions donnés
    pub fn for_product(product_number: &str, area_symbols: &str, peripherals: Peripherals) -> Self {
        Self {
            hardware_id: HARDWARE_ID.to_string(),
            maker_id: "SEGA ENTERPRISES".to_string(),
            area_symbols: area_symbols.to_string(),
            peripherals,
            product_number: format!("{:<10}", product_number),
            boot_filename: "1ST_READ.BIN".to_string(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test du décodage de l'en-tête IP.BIN
    #[test]
    fn test_parse_header() {
        let mut raw = vec![b' '; IP_HEADER_SIZE];
        raw[..15].copy_from_slice(b"SEGA SEGAKATANA");
        raw[0x30..0x33].copy_from_slice(b"JUE");
        raw[0x38..0x3F].copy_from_slice(b"E000F10");
        raw[0x40..0x4A].copy_from_slice(b"T13008D 05");
        raw[0x60..0x6C].copy_from_slice(b"1ST_READ.BIN");

        let meta = IpMeta::parse(&raw).unwrap();
        assert!(meta.is_valid());
        assert_eq!(meta.game_id(), "T13008D 05");
        assert!(meta.supports_vga());
        assert!(!meta.is_windows_ce());
        assert!(meta.supports_japan() && meta.supports_usa() && meta.supports_europe());
    }

    /// Test de l'identifiant sans espaces finaux
    #[test]
    fn test_trailing_spaces_trimmed() {
        let meta = IpMeta::for_product("T7016D  50", "E", Peripherals::empty());
        assert_eq!(meta.product_number.len(), 10);
        assert_eq!(meta.game_id(), "T7016D  50");

        let meta = IpMeta::for_product("MK-51058", "U", Peripherals::empty());
        assert_eq!(meta.game_id(), "MK-51058");
    }

    /// Test de la détection Windows CE par fichier d'amorçage
    #[test]
    fn test_windows_ce_boot_file() {
        let mut meta = IpMeta::for_product("T40203N", "U", Peripherals::empty());
        meta.boot_filename = "0WINCEOS.BIN".to_string();
        let parsed = IpMeta::parse(&meta.to_bytes()).unwrap();
        assert!(parsed.is_windows_ce());
        assert!(!parsed.supports_vga());
    }

    /// Test d'un en-tête tronqué
    #[test]
    fn test_short_buffer() {
        assert!(IpMeta::parse(&[0u8; 16]).is_none());
    }
}
