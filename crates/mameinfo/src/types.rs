//! Enumerations stored as single bytes in the database.
//!
//! Each enum knows its `-listxml` attribute spelling and its on-disk byte.

/// Byte-sized enum with a fixed on-disk value per variant.
pub trait WireEnum: Copy + Into<u8> {
    /// Decode from the stored byte.
    fn from_u8(value: u8) -> Option<Self>;
}

macro_rules! attribute_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal => $text:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value, )+
        }

        impl $name {
            /// Parse the `-listxml` attribute spelling.
            pub fn from_attr(text: &str) -> Option<Self> {
                match text {
                    $( $text => Some(Self::$variant), )+
                    _ => None,
                }
            }

            /// Get the `-listxml` attribute spelling.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $text, )+
                }
            }
        }

        impl WireEnum for $name {
            fn from_u8(value: u8) -> Option<Self> {
                match value {
                    $( $value => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value as u8
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

attribute_enum! {
    /// Dump status of a ROM or disk.
    pub enum DumpStatus {
        Good = 0 => "good",
        BadDump = 1 => "baddump",
        NoDump = 2 => "nodump",
    }
}

attribute_enum! {
    /// Whether a software list is native to a machine or merely compatible.
    pub enum SoftwareListStatus {
        Original = 0 => "original",
        Compatible = 1 => "compatible",
    }
}

attribute_enum! {
    /// Comparison used by a configuration condition.
    pub enum Relation {
        Eq = 0 => "eq",
        Ne = 1 => "ne",
        Gt = 2 => "gt",
        Le = 3 => "le",
        Lt = 4 => "lt",
        Ge = 5 => "ge",
    }
}

attribute_enum! {
    /// Emulated feature category.
    pub enum FeatureType {
        Unknown = 0 => "unknown",
        Protection = 1 => "protection",
        Timing = 2 => "timing",
        Graphics = 3 => "graphics",
        Palette = 4 => "palette",
        Sound = 5 => "sound",
        Capture = 6 => "capture",
        Camera = 7 => "camera",
        Microphone = 8 => "microphone",
        Controls = 9 => "controls",
        Keyboard = 10 => "keyboard",
        Mouse = 11 => "mouse",
        Media = 12 => "media",
        Disk = 13 => "disk",
        Printer = 14 => "printer",
        Tape = 15 => "tape",
        Punch = 16 => "punch",
        Drum = 17 => "drum",
        Rom = 18 => "rom",
        Comms = 19 => "comms",
        Lan = 20 => "lan",
        Wan = 21 => "wan",
    }
}

attribute_enum! {
    /// How well a feature is emulated.
    pub enum FeatureQuality {
        Unknown = 0 => "unknown",
        Unemulated = 1 => "unemulated",
        Imperfect = 2 => "imperfect",
    }
}

attribute_enum! {
    /// Chip category.
    pub enum ChipType {
        Cpu = 0 => "cpu",
        Audio = 1 => "audio",
    }
}

attribute_enum! {
    /// Display technology.
    pub enum DisplayType {
        Unknown = 0 => "unknown",
        Raster = 1 => "raster",
        Vector = 2 => "vector",
        Lcd = 3 => "lcd",
        Svg = 4 => "svg",
    }
}

attribute_enum! {
    /// Display rotation in degrees.
    pub enum Rotation {
        Rot0 = 0 => "0",
        Rot90 = 1 => "90",
        Rot180 = 2 => "180",
        Rot270 = 3 => "270",
    }
}

attribute_enum! {
    /// Driver quality rating from the `<driver>` element.
    pub enum DriverQuality {
        Unknown = 0 => "unknown",
        Good = 1 => "good",
        Imperfect = 2 => "imperfect",
        Preliminary = 3 => "preliminary",
    }
}

/// Parse the `savestate` attribute of `<driver>`.
pub fn parse_supported(text: &str) -> Option<bool> {
    match text {
        "supported" => Some(true),
        "unsupported" => Some(false),
        _ => None,
    }
}
