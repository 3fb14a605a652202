//! Color themes.
//!
//! A color is either `@N` (ANSI index 0-17, with 10-17 the bright variants)
//! or a raw SGR parameter tail (`5;N` for 256-color, `2;R;G;B` for direct
//! color, optionally ending in `;1` or `;4` for bold/underline). The
//! terminal layer translates these when emitting.

use crate::buffer::SyntaxClass;
use crate::config::Config;

/// Every color slot the renderer uses.
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: &'static str,
    pub fg: &'static str,
    pub bg: &'static str,
    pub alt_fg: &'static str,
    pub alt_bg: &'static str,
    pub number_fg: &'static str,
    pub number_bg: &'static str,
    pub status_fg: &'static str,
    pub status_bg: &'static str,
    pub tabbar_bg: &'static str,
    pub tab_bg: &'static str,
    pub keyword: &'static str,
    pub string: &'static str,
    pub comment: &'static str,
    pub type_: &'static str,
    pub pragma: &'static str,
    pub numeral: &'static str,
    pub error_fg: &'static str,
    pub error_bg: &'static str,
    pub search_fg: &'static str,
    pub search_bg: &'static str,
    pub select_fg: &'static str,
    pub select_bg: &'static str,
    pub red: &'static str,
    pub green: &'static str,
    pub bold: &'static str,
    pub link: &'static str,
    pub escape: &'static str,
}

/// Theme names, in `:theme` completion order.
pub const THEME_NAMES: &[&str] = &[
    "wombat",
    "citylights",
    "solarized-dark",
    "ansi",
    "sunsmoke",
    "sunsmoke256",
];

impl Theme {
    /// The 16-color default.
    pub fn ansi(config: &Config) -> Self {
        let bright = config.can_bright;
        Self {
            name: "ansi",
            fg: if bright { "@17" } else { "@7" },
            bg: if bright { "@9" } else { "@0" },
            alt_fg: if bright { "@10" } else { "@5" },
            alt_bg: "@9",
            number_fg: "@3",
            number_bg: "@9",
            status_fg: if bright { "@17" } else { "@7" },
            status_bg: "@4",
            tabbar_bg: "@4",
            tab_bg: "@4",
            keyword: if bright { "@14" } else { "@4" },
            string: "@2",
            comment: if bright { "@10" } else { "@5" },
            type_: "@3",
            pragma: "@1",
            numeral: "@1",
            error_fg: if bright { "@17" } else { "@7" },
            error_bg: "@1",
            search_fg: "@0",
            search_bg: if bright { "@13" } else { "@3" },
            select_fg: "@0",
            select_bg: if bright { "@17" } else { "@7" },
            red: "@1",
            green: "@2",
            bold: if bright { "@17" } else { "@7" },
            link: if bright { "@14" } else { "@4" },
            escape: if bright { "@12" } else { "@2" },
        }
    }

    /// Based on the wombat256 vim scheme; needs 256 colors.
    pub fn wombat(config: &Config) -> Option<Self> {
        if !config.can_256color {
            return None;
        }
        Some(Self {
            name: "wombat",
            fg: "5;230",
            bg: "5;235",
            alt_fg: "5;244",
            alt_bg: "5;236",
            number_fg: "5;101",
            number_bg: "5;232",
            status_fg: "5;230",
            status_bg: "5;238",
            tabbar_bg: "5;230",
            tab_bg: "5;248",
            keyword: "5;117",
            string: "5;113",
            comment: if config.can_italic { "5;102;3" } else { "5;102" },
            type_: "5;186",
            pragma: "5;173",
            numeral: "5;173",
            error_fg: "5;15",
            error_bg: "5;196",
            search_fg: "5;234",
            search_bg: "5;226",
            select_fg: "5;235",
            select_bg: "5;230",
            red: "@1",
            green: "@2",
            bold: "5;230;1",
            link: "5;117;4",
            escape: "5;194",
        })
    }

    /// Based on citylights.xyz; needs 24-bit color.
    pub fn citylights(config: &Config) -> Option<Self> {
        if !config.can_24bit {
            return None;
        }
        Some(Self {
            name: "citylights",
            fg: "2;151;178;198",
            bg: "2;29;37;44",
            alt_fg: "2;45;55;65",
            alt_bg: "2;33;42;50",
            number_fg: "2;71;89;103",
            number_bg: "2;37;47;56",
            status_fg: "2;116;144;166",
            status_bg: "2;53;67;78",
            tabbar_bg: "2;37;47;56",
            tab_bg: "2;29;37;44",
            keyword: "2;94;196;255",
            string: "2;83;154;252",
            comment: "2;107;133;153;3",
            type_: "2;139;212;156",
            pragma: "2;0;139;148",
            numeral: "2;207;118;132",
            error_fg: "5;15",
            error_bg: "5;196",
            search_fg: "5;234",
            search_bg: "5;226",
            select_fg: "2;29;37;44",
            select_bg: "2;151;178;198",
            red: "2;222;53;53",
            green: "2;55;167;0",
            bold: "2;151;178;198;1",
            link: "2;94;196;255;4",
            escape: "2;133;182;249",
        })
    }

    /// Solarized Dark; needs 24-bit color.
    pub fn solarized_dark(config: &Config) -> Option<Self> {
        if !config.can_24bit {
            return None;
        }
        Some(Self {
            name: "solarized-dark",
            fg: "2;147;161;161",
            bg: "2;0;43;54",
            alt_fg: "2;147;161;161",
            alt_bg: "2;7;54;66",
            number_fg: "2;131;148;149",
            number_bg: "2;7;54;66",
            status_fg: "2;131;148;150",
            status_bg: "2;7;54;66",
            tabbar_bg: "2;7;54;66",
            tab_bg: "2;131;148;150",
            keyword: "2;133;153;0",
            string: "2;42;161;152",
            comment: "2;101;123;131",
            type_: "2;181;137;0",
            pragma: "2;203;75;22",
            numeral: "2;220;50;47",
            error_fg: "5;15",
            error_bg: "5;196",
            search_fg: "5;234",
            search_bg: "5;226",
            select_fg: "2;0;43;54",
            select_bg: "2;147;161;161",
            red: "2;222;53;53",
            green: "2;55;167;0",
            bold: "2;147;161;161;1",
            link: "2;42;161;152;4",
            escape: "2;133;153;0",
        })
    }

    /// The 256-color rendition of sunsmoke.
    pub fn sunsmoke256(config: &Config) -> Option<Self> {
        if !config.can_256color {
            return None;
        }
        Some(Self {
            name: "sunsmoke256",
            fg: "5;188",
            bg: "5;234",
            alt_fg: "5;244",
            alt_bg: "5;236",
            number_fg: "5;101",
            number_bg: "5;232",
            status_fg: "5;188",
            status_bg: "5;59",
            tabbar_bg: "5;59",
            tab_bg: "5;59",
            keyword: "5;74",
            string: "5;71",
            comment: if config.can_italic { "5;102;3" } else { "5;102" },
            type_: "5;221",
            pragma: "5;160",
            numeral: "5;161",
            error_fg: "5;15",
            error_bg: "5;196",
            search_fg: "5;234",
            search_bg: "5;226",
            select_fg: "5;17",
            select_bg: "5;109",
            red: "@1",
            green: "@2",
            bold: "5;188;1",
            link: "5;74;4",
            escape: "5;79",
        })
    }

    /// The 24-bit house theme; falls back to the 256-color rendition.
    pub fn sunsmoke(config: &Config) -> Option<Self> {
        if !config.can_24bit {
            return Self::sunsmoke256(config);
        }
        Some(Self {
            name: "sunsmoke",
            fg: "2;230;230;230",
            bg: "2;31;31;31",
            alt_fg: "2;122;122;122",
            alt_bg: "2;46;43;46",
            number_fg: "2;150;139;57",
            number_bg: "2;0;0;0",
            status_fg: "2;230;230;230",
            status_bg: "2;71;64;58",
            tabbar_bg: "2;71;64;58",
            tab_bg: "2;71;64;58",
            keyword: "2;51;162;230",
            string: "2;72;176;72",
            comment: "2;158;153;129;3",
            type_: "2;230;206;110",
            pragma: "2;194;70;54",
            numeral: "2;230;43;127",
            error_fg: "5;15",
            error_bg: "5;196",
            search_fg: "5;234",
            search_bg: "5;226",
            select_fg: "2;0;43;54",
            select_bg: "2;147;161;161",
            red: "2;222;53;53",
            green: "2;55;167;0",
            bold: "2;230;230;230;1",
            link: "2;51;162;230;4",
            escape: "2;113;203;173",
        })
    }

    /// Load a theme by name, honoring capability gates.
    pub fn by_name(name: &str, config: &Config) -> Option<Self> {
        match name {
            "ansi" => Some(Self::ansi(config)),
            "wombat" => Self::wombat(config),
            "citylights" => Self::citylights(config),
            "solarized-dark" => Self::solarized_dark(config),
            "sunsmoke" => Self::sunsmoke(config),
            "sunsmoke256" => Self::sunsmoke256(config),
            _ => None,
        }
    }

    /// Foreground color for a syntax class.
    pub fn class_color(&self, class: SyntaxClass) -> &'static str {
        match class {
            SyntaxClass::Keyword => self.keyword,
            SyntaxClass::String | SyntaxClass::String2 => self.string,
            SyntaxClass::Comment => self.comment,
            SyntaxClass::Type => self.type_,
            SyntaxClass::Pragma => self.pragma,
            SyntaxClass::Numeral => self.numeral,
            SyntaxClass::DiffPlus => self.green,
            SyntaxClass::DiffMinus => self.red,
            SyntaxClass::Bold => self.bold,
            SyntaxClass::Link => self.link,
            SyntaxClass::Escape => self.escape,
            SyntaxClass::Notice | SyntaxClass::None => self.fg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_gates() {
        let mut config = Config::default();
        config.can_24bit = false;
        assert!(Theme::citylights(&config).is_none());
        // sunsmoke degrades instead of refusing.
        assert_eq!(Theme::sunsmoke(&config).unwrap().name, "sunsmoke256");
        config.can_256color = false;
        assert!(Theme::sunsmoke(&config).is_none());
    }

    #[test]
    fn test_by_name() {
        let config = Config::default();
        assert_eq!(Theme::by_name("ansi", &config).unwrap().name, "ansi");
        assert!(Theme::by_name("nope", &config).is_none());
        for name in THEME_NAMES {
            assert!(Theme::by_name(name, &config).is_some());
        }
    }
}
