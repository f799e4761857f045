// ABOUTME: Closed set of inline image protocols the engine can emit
// ABOUTME: Parses user-facing protocol names into a typed variant

use crate::error::TermImgError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// iTerm2 inline file (`OSC 1337;File=`)
    Iterm,
    /// Kitty graphics protocol; `extended` means the terminal accepts JPEG as-is
    Kitty { extended: bool },
    /// DEC sixel graphics
    Sixel,
}

impl Protocol {
    pub const KITTY: Protocol = Protocol::Kitty { extended: false };
    pub const KITTY_EXTENDED: Protocol = Protocol::Kitty { extended: true };

    pub fn name(&self) -> &'static str {
        match self {
            Protocol::Iterm => "iterm",
            Protocol::Kitty { extended: false } => "kitty",
            Protocol::Kitty { extended: true } => "kitty+",
            Protocol::Sixel => "sixel",
        }
    }

    /// Parse a protocol name where `none` (and friends) mean "no protocol".
    pub fn parse_optional(name: &str) -> Result<Option<Protocol>, TermImgError> {
        match name.trim().to_lowercase().as_str() {
            "none" | "disable" | "disabled" => Ok(None),
            other => other.parse().map(Some),
        }
    }
}

impl FromStr for Protocol {
    type Err = TermImgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "iterm" | "iterm2" => Ok(Protocol::Iterm),
            "kitty" => Ok(Protocol::KITTY),
            "kitty+" | "kitty-extended" => Ok(Protocol::KITTY_EXTENDED),
            "sixel" => Ok(Protocol::Sixel),
            _ => Err(TermImgError::UnknownProtocol(s.to_string())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        assert_eq!("kitty".parse::<Protocol>().unwrap(), Protocol::KITTY);
        assert_eq!(
            "kitty+".parse::<Protocol>().unwrap(),
            Protocol::KITTY_EXTENDED
        );
        assert_eq!(
            "Kitty-Extended".parse::<Protocol>().unwrap(),
            Protocol::KITTY_EXTENDED
        );
        assert_eq!("iterm2".parse::<Protocol>().unwrap(), Protocol::Iterm);
        assert_eq!(" sixel ".parse::<Protocol>().unwrap(), Protocol::Sixel);
    }

    #[test]
    fn test_parse_unknown_name() {
        let err = "foobar".parse::<Protocol>().unwrap_err();
        assert!(matches!(err, TermImgError::UnknownProtocol(name) if name == "foobar"));
    }

    #[test]
    fn test_parse_optional() {
        assert_eq!(Protocol::parse_optional("none").unwrap(), None);
        assert_eq!(Protocol::parse_optional("disabled").unwrap(), None);
        assert_eq!(
            Protocol::parse_optional("iterm").unwrap(),
            Some(Protocol::Iterm)
        );
        assert!(Protocol::parse_optional("auto").is_err());
    }

    #[test]
    fn test_display_round_trips_names() {
        for protocol in [
            Protocol::Iterm,
            Protocol::KITTY,
            Protocol::KITTY_EXTENDED,
            Protocol::Sixel,
        ] {
            assert_eq!(protocol.to_string().parse::<Protocol>().unwrap(), protocol);
        }
    }
}
